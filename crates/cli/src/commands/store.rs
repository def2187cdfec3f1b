use serde_json::{Value, json};
use tabwright::{JsonFileStore, KeyValueStore};
use tracing::info;

use crate::cli::{StoreAction, StoreArgs};
use crate::context::CommandContext;
use crate::error::Result;
use crate::output::{self, CommandResult, OutputFormat};

pub fn execute(args: StoreArgs, ctx: &CommandContext, format: OutputFormat) -> Result<()> {
	let path = args.file.unwrap_or_else(|| ctx.store_path());
	let store = JsonFileStore::open(&path)?;
	let (command, data) = apply(&store, args.action)?;
	output::print_result(&CommandResult::success(command, data), format);
	Ok(())
}

/// Applies one store action and returns the envelope name and data.
pub fn apply(store: &dyn KeyValueStore, action: StoreAction) -> Result<(&'static str, Value)> {
	Ok(match action {
		StoreAction::Get { key } => {
			let value = store.get(&key)?.unwrap_or(Value::Null);
			("store.get", value)
		}
		StoreAction::Set { key, value } => {
			let value = parse_value(value);
			store.set(&key, value.clone())?;
			info!(key = %key, "Stored value");
			("store.set", json!({ "key": key, "value": value }))
		}
		StoreAction::Remove { key } => {
			store.remove(&key)?;
			("store.remove", json!({ "key": key }))
		}
		StoreAction::Clear => {
			store.clear()?;
			("store.clear", Value::Null)
		}
	})
}

/// Parses `raw` as JSON, keeping it as a plain string when it is not.
fn parse_value(raw: String) -> Value {
	serde_json::from_str(&raw).unwrap_or(Value::String(raw))
}
