//! Small persistent key/value store for UI flags.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};

/// Key/value storage exposed through the `store:*` commands.
pub trait KeyValueStore: Send + Sync {
	fn get(&self, key: &str) -> Result<Option<Value>>;
	fn set(&self, key: &str, value: Value) -> Result<()>;
	fn remove(&self, key: &str) -> Result<()>;
	fn clear(&self) -> Result<()>;
}

/// Store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
	entries: Mutex<BTreeMap<String, Value>>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}
}

impl KeyValueStore for MemoryStore {
	fn get(&self, key: &str) -> Result<Option<Value>> {
		Ok(self.entries.lock().get(key).cloned())
	}

	fn set(&self, key: &str, value: Value) -> Result<()> {
		self.entries.lock().insert(key.to_string(), value);
		Ok(())
	}

	fn remove(&self, key: &str) -> Result<()> {
		self.entries.lock().remove(key);
		Ok(())
	}

	fn clear(&self) -> Result<()> {
		self.entries.lock().clear();
		Ok(())
	}
}

/// Store persisted as one JSON object, rewritten atomically on each mutation.
#[derive(Debug)]
pub struct JsonFileStore {
	path: PathBuf,
	entries: Mutex<BTreeMap<String, Value>>,
}

impl JsonFileStore {
	/// Opens the store at `path`. A missing file is an empty store.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
		let path = path.into();
		let entries = match fs::read_to_string(&path) {
			Ok(content) => serde_json::from_str(&content)
				.map_err(|e| Error::Store(format!("{}: {e}", path.display())))?,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
			Err(e) => return Err(e.into()),
		};
		debug!(path = %path.display(), "Opened key/value store");
		Ok(Self {
			path,
			entries: Mutex::new(entries),
		})
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	fn persist(&self, entries: &BTreeMap<String, Value>) -> Result<()> {
		if let Some(parent) = self.path.parent() {
			fs::create_dir_all(parent)?;
		}
		let tmp = self.path.with_extension("json.tmp");
		fs::write(&tmp, serde_json::to_string_pretty(entries)?)?;
		fs::rename(&tmp, &self.path)?;
		Ok(())
	}

	fn mutate(&self, f: impl FnOnce(&mut BTreeMap<String, Value>)) -> Result<()> {
		let mut entries = self.entries.lock();
		f(&mut entries);
		self.persist(&entries)
	}
}

impl KeyValueStore for JsonFileStore {
	fn get(&self, key: &str) -> Result<Option<Value>> {
		Ok(self.entries.lock().get(key).cloned())
	}

	fn set(&self, key: &str, value: Value) -> Result<()> {
		self.mutate(|entries| {
			entries.insert(key.to_string(), value);
		})
	}

	fn remove(&self, key: &str) -> Result<()> {
		self.mutate(|entries| {
			entries.remove(key);
		})
	}

	fn clear(&self) -> Result<()> {
		self.mutate(BTreeMap::clear)
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;
	use tempfile::TempDir;

	use super::*;

	#[test]
	fn test_file_store_persists_across_opens() {
		let tmp = TempDir::new().unwrap();
		let path = tmp.path().join("store.json");

		let store = JsonFileStore::open(&path).unwrap();
		store.set("dontAskOnClose", json!(true)).unwrap();
		store.set("zoom", json!(1.25)).unwrap();
		store.remove("zoom").unwrap();

		let reopened = JsonFileStore::open(&path).unwrap();
		assert_eq!(reopened.get("dontAskOnClose").unwrap(), Some(json!(true)));
		assert_eq!(reopened.get("zoom").unwrap(), None);
	}

	#[test]
	fn test_file_store_clear() {
		let tmp = TempDir::new().unwrap();
		let store = JsonFileStore::open(tmp.path().join("nested/store.json")).unwrap();
		store.set("a", json!(1)).unwrap();
		store.clear().unwrap();
		assert_eq!(store.get("a").unwrap(), None);
		assert!(store.path().exists());
	}

	#[test]
	fn test_corrupt_file_is_store_error() {
		let tmp = TempDir::new().unwrap();
		let path = tmp.path().join("store.json");
		fs::write(&path, "[1, 2").unwrap();
		assert!(matches!(JsonFileStore::open(&path), Err(Error::Store(_))));
	}

	#[test]
	fn test_memory_store() {
		let store = MemoryStore::new();
		store.set("k", json!("v")).unwrap();
		assert_eq!(store.get("k").unwrap(), Some(json!("v")));
		store.clear().unwrap();
		assert_eq!(store.get("k").unwrap(), None);
	}
}
