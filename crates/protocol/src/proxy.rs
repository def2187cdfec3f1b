//! Proxy configuration snapshot.

use serde::{Deserialize, Deserializer, Serialize};

/// Default proxy host when none is configured.
pub const DEFAULT_PROXY_HOST: &str = "localhost";

/// Default proxy port when none is configured.
pub const DEFAULT_PROXY_PORT: u16 = 7890;

/// Proxy configuration as read from the configuration provider.
///
/// `Debug` masks credentials; it is safe to log.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProxyConfig {
	pub enabled: bool,
	pub host: String,
	#[serde(deserialize_with = "port_from_string_or_number")]
	pub port: u16,
	pub username: String,
	pub password: String,
}

impl Default for ProxyConfig {
	fn default() -> Self {
		Self {
			enabled: false,
			host: DEFAULT_PROXY_HOST.to_string(),
			port: DEFAULT_PROXY_PORT,
			username: String::new(),
			password: String::new(),
		}
	}
}

impl ProxyConfig {
	/// Returns true if both username and password are set.
	pub fn has_credentials(&self) -> bool {
		!self.username.is_empty() && !self.password.is_empty()
	}

	/// Returns `host:port`.
	pub fn server(&self) -> String {
		format!("{}:{}", self.host, self.port)
	}

	/// Returns the username reduced to its first character followed by `***`.
	pub fn masked_username(&self) -> String {
		match self.username.chars().next() {
			Some(first) => format!("{first}***"),
			None => String::new(),
		}
	}
}

impl std::fmt::Debug for ProxyConfig {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ProxyConfig")
			.field("enabled", &self.enabled)
			.field("host", &self.host)
			.field("port", &self.port)
			.field("username", &self.masked_username())
			.field("password", &if self.password.is_empty() { "" } else { "****" })
			.finish()
	}
}

fn port_from_string_or_number<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
	D: Deserializer<'de>,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum Port {
		Number(u16),
		Text(String),
	}

	match Port::deserialize(deserializer)? {
		Port::Number(port) => Ok(port),
		Port::Text(text) if text.trim().is_empty() => Ok(DEFAULT_PROXY_PORT),
		Port::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
	}
}
