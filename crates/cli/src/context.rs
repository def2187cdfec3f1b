//! Resolution of the configuration directory and environment shared by all
//! commands.

use std::path::{Path, PathBuf};

use tabwright::config::{self, Env, SystemConfig};
use tracing::debug;

use crate::cli::Cli;
use crate::error::Result;

/// Store file name inside the configuration directory.
pub const STORE_FILE: &str = "store.json";

#[derive(Debug, Clone)]
pub struct CommandContext {
	config_dir: PathBuf,
	env: Env,
}

impl CommandContext {
	pub fn new(config_dir: PathBuf, env: Env) -> Self {
		Self { config_dir, env }
	}

	/// Flags override `$TABWRIGHT_ENV` and the platform configuration directory.
	pub fn from_cli(cli: &Cli) -> Self {
		let config_dir = cli.config_dir.clone().unwrap_or_else(config::config_dir);
		let env = cli.env.unwrap_or_else(Env::from_env);
		debug!(dir = %config_dir.display(), %env, "Resolved command context");
		Self::new(config_dir, env)
	}

	pub fn config_dir(&self) -> &Path {
		&self.config_dir
	}

	pub fn env(&self) -> Env {
		self.env
	}

	pub fn config_path(&self) -> PathBuf {
		self.config_dir.join(self.env.file_name())
	}

	/// Loads the environment's configuration, writing defaults on first use.
	pub fn load_config(&self) -> Result<SystemConfig> {
		Ok(SystemConfig::load_env(&self.config_dir, self.env)?)
	}

	pub fn store_path(&self) -> PathBuf {
		self.config_dir.join(STORE_FILE)
	}
}
