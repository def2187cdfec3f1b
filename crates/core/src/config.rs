//! System configuration.
//!
//! Configuration is one JSON document per environment
//! (`system.dev.json`, `system.prod.json`, `system.test.json`) stored under
//! `$XDG_CONFIG_HOME/tabwright`. A missing file is created from defaults;
//! fields present in the file overlay the defaults.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tabwright_protocol::ProxyConfig;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Base URL of the bundled control UI.
pub const DEFAULT_BASE_URL: &str = "http://localhost:59001";

/// Environment variable selecting the configuration environment.
pub const ENV_VAR: &str = "TABWRIGHT_ENV";

/// Runtime environment selecting which configuration file is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Env {
	Development,
	#[default]
	Production,
	Test,
}

impl Env {
	/// Reads [`ENV_VAR`], falling back to [`Env::Production`].
	pub fn from_env() -> Self {
		std::env::var(ENV_VAR)
			.ok()
			.and_then(|v| v.parse().ok())
			.unwrap_or_default()
	}

	/// File name of this environment's configuration.
	pub fn file_name(self) -> &'static str {
		match self {
			Env::Development => "system.dev.json",
			Env::Production => "system.prod.json",
			Env::Test => "system.test.json",
		}
	}
}

impl FromStr for Env {
	type Err = String;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"dev" | "development" => Ok(Env::Development),
			"prod" | "production" => Ok(Env::Production),
			"test" => Ok(Env::Test),
			other => Err(format!("unknown environment '{other}'")),
		}
	}
}

impl fmt::Display for Env {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Env::Development => f.write_str("development"),
			Env::Production => f.write_str("production"),
			Env::Test => f.write_str("test"),
		}
	}
}

/// Geometry constants of the shell chrome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutConfig {
	/// Height reserved above standard tabs for the control surface.
	pub toolbar_height: u32,
	/// Height removed from the toolbar for home and app surfaces.
	pub home_offset: u32,
	pub menu_width: u32,
	pub menu_height: u32,
	pub panel_width: u32,
}

impl Default for LayoutConfig {
	fn default() -> Self {
		Self {
			toolbar_height: 72,
			home_offset: 40,
			menu_width: 320,
			menu_height: 420,
			panel_width: 360,
		}
	}
}

/// Top-level system configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SystemConfig {
	pub base_url: String,
	pub proxy: ProxyConfig,
	/// URL loaded into the control surface. Defaults to `{baseUrl}/desktop`.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub control_url: Option<String>,
	/// Root served through the `local-resource` protocol.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub local_resource_root: Option<PathBuf>,
	pub layout: LayoutConfig,
}

impl Default for SystemConfig {
	fn default() -> Self {
		Self {
			base_url: DEFAULT_BASE_URL.to_string(),
			proxy: ProxyConfig::default(),
			control_url: None,
			local_resource_root: None,
			layout: LayoutConfig::default(),
		}
	}
}

impl SystemConfig {
	/// URL of the control surface.
	pub fn control_url(&self) -> String {
		self.control_url
			.clone()
			.unwrap_or_else(|| format!("{}/desktop", self.base_url.trim_end_matches('/')))
	}

	/// Loads `path`, writing defaults there first if it does not exist.
	pub fn load_or_init(path: &Path) -> Result<Self> {
		if !path.exists() {
			info!(path = %path.display(), "No configuration file found, writing defaults");
			let config = Self::default();
			config.save(path)?;
			return Ok(config);
		}

		let content = fs::read_to_string(path)?;
		let config = serde_json::from_str(&content).map_err(|e| Error::Config {
			path: path.to_path_buf(),
			message: e.to_string(),
		})?;
		debug!(path = %path.display(), "Loaded configuration");
		Ok(config)
	}

	/// Loads the configuration of `env` from `dir`.
	pub fn load_env(dir: &Path, env: Env) -> Result<Self> {
		Self::load_or_init(&dir.join(env.file_name()))
	}

	pub fn save(&self, path: &Path) -> Result<()> {
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent)?;
		}
		fs::write(path, serde_json::to_string_pretty(self)?)?;
		Ok(())
	}
}

/// Default configuration directory (`$XDG_CONFIG_HOME/tabwright`).
pub fn config_dir() -> PathBuf {
	dirs::config_dir()
		.unwrap_or_else(|| PathBuf::from("."))
		.join("tabwright")
}

/// Source of configuration consulted by the orchestrator.
///
/// The proxy configuration is read on every proxied tab creation so edits
/// take effect without restarting.
pub trait ConfigProvider: Send + Sync {
	fn base_url(&self) -> String;
	fn proxy_config(&self) -> ProxyConfig;
}

impl ConfigProvider for SystemConfig {
	fn base_url(&self) -> String {
		self.base_url.clone()
	}

	fn proxy_config(&self) -> ProxyConfig {
		self.proxy.clone()
	}
}
