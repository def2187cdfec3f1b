//! Network session cache.
//!
//! Tabs share one native session per proxy mode. Each session is configured
//! once (user agent, permission whitelist, response header rewriting and the
//! `local-resource` protocol); later acquisitions return the cached handle
//! untouched.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tabwright_runtime::{
	Engine, NetworkSession, RequestDetails, ResourceType, ResponseHeaders, Result,
};
use tracing::{debug, warn};

/// Desktop user agent applied to every tab session.
pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Permissions granted to pages. Everything else is denied.
pub const ALLOWED_PERMISSIONS: &[&str] = &[
	"clipboard-read",
	"clipboard-write",
	"fullscreen",
	"media",
	"mediaKeySystem",
	"geolocation",
	"notifications",
	"pointerLock",
	"local-fonts",
];

/// Scheme serving files from the configured resource root.
pub const LOCAL_RESOURCE_SCHEME: &str = "local-resource";

/// Which of the two tab sessions a tab uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PartitionKey {
	Proxy,
	Default,
}

impl PartitionKey {
	pub fn for_proxy(use_proxy: bool) -> Self {
		if use_proxy { Self::Proxy } else { Self::Default }
	}

	/// Engine partition name.
	pub fn partition(self) -> &'static str {
		match self {
			Self::Proxy => "persist:tab_proxy",
			Self::Default => "persist:tab_default",
		}
	}
}

impl fmt::Display for PartitionKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Proxy => f.write_str("proxy"),
			Self::Default => f.write_str("default"),
		}
	}
}

struct Partition {
	session: Arc<dyn NetworkSession>,
	configured: bool,
}

/// Creates, configures and caches tab sessions.
pub struct SessionRegistry {
	engine: Arc<dyn Engine>,
	resource_root: Option<PathBuf>,
	partitions: HashMap<PartitionKey, Partition>,
}

impl SessionRegistry {
	pub fn new(engine: Arc<dyn Engine>, resource_root: Option<PathBuf>) -> Self {
		Self {
			engine,
			resource_root,
			partitions: HashMap::new(),
		}
	}

	/// Returns the session for the proxy mode, creating and configuring it on first use.
	pub fn acquire(&mut self, use_proxy: bool) -> Arc<dyn NetworkSession> {
		let key = PartitionKey::for_proxy(use_proxy);
		if !self.partitions.contains_key(&key) {
			let session = self.engine.session(key.partition());
			self.partitions.insert(
				key,
				Partition {
					session,
					configured: false,
				},
			);
		}
		self.configure(key);
		match self.partitions.get(&key) {
			Some(partition) => partition.session.clone(),
			None => self.engine.session(key.partition()),
		}
	}

	/// Applies one-time configuration. Returns false if the partition is
	/// unknown or was already configured.
	pub fn configure(&mut self, key: PartitionKey) -> bool {
		let resource_root = self.resource_root.clone();
		let Some(partition) = self.partitions.get_mut(&key) else {
			return false;
		};
		if partition.configured {
			return false;
		}

		let session = &partition.session;
		debug!(partition = session.partition(), "Configuring session");
		session.set_user_agent(USER_AGENT);
		session.set_permission_handler(Arc::new(|permission: &str| {
			ALLOWED_PERMISSIONS.contains(&permission)
		}));
		session.set_response_header_rewriter(Some(Arc::new(rewrite_response_headers)));
		if let Some(root) = resource_root {
			if let Err(e) = session.register_file_protocol(LOCAL_RESOURCE_SCHEME, root) {
				warn!(partition = session.partition(), error = %e, "Failed to register local resources");
			}
		}

		partition.configured = true;
		true
	}

	pub fn is_configured(&self, key: PartitionKey) -> bool {
		self.partitions.get(&key).is_some_and(|p| p.configured)
	}

	/// Live session for `key`, if it was acquired.
	pub fn get(&self, key: PartitionKey) -> Option<Arc<dyn NetworkSession>> {
		self.partitions.get(&key).map(|p| p.session.clone())
	}

	/// Clears cache and storage of a live partition. Returns false if it was never acquired.
	pub async fn clear(&self, key: PartitionKey) -> Result<bool> {
		let Some(session) = self.get(key) else {
			return Ok(false);
		};
		session.clear_storage().await?;
		debug!(partition = key.partition(), "Cleared session storage");
		Ok(true)
	}

	/// Drops every cached session.
	pub fn dispose(&mut self) {
		self.partitions.clear();
	}
}

/// Long-lived caching and open CORS for the local control UI; permissive
/// CORS for images and fonts everywhere.
pub(crate) fn rewrite_response_headers(details: &RequestDetails, headers: &mut ResponseHeaders) {
	let is_localhost = url::Url::parse(&details.url)
		.ok()
		.is_some_and(|u| u.host_str() == Some("localhost"));
	if is_localhost {
		headers.insert(
			"Cache-Control".to_string(),
			vec!["public, max-age=31536000".to_string()],
		);
		headers.insert("Access-Control-Allow-Origin".to_string(), vec!["*".to_string()]);
	}

	if matches!(details.resource_type, ResourceType::Image | ResourceType::Font) {
		headers.insert("Access-Control-Allow-Origin".to_string(), vec!["*".to_string()]);
		headers.insert("Access-Control-Allow-Headers".to_string(), vec!["*".to_string()]);
		headers.insert("Access-Control-Allow-Methods".to_string(), vec!["GET".to_string()]);
	}
}
