//! Error types for the orchestration layer.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for orchestration operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced to callers of the orchestrator and shell.
///
/// Navigation and load failures never appear here; they are classified and
/// recorded on the tab's state instead.
#[derive(Debug, Error)]
pub enum Error {
	/// The underlying engine failed.
	#[error(transparent)]
	Engine(#[from] tabwright_runtime::Error),

	/// No tab with this id exists.
	#[error("Unknown tab: {0}")]
	UnknownTab(String),

	/// A command carried arguments that cannot be acted on.
	#[error("Invalid command '{channel}': {reason}")]
	InvalidCommand { channel: String, reason: String },

	/// `show-tabs-menu` without a menu URL.
	#[error("Menu URL is required")]
	MissingMenuUrl,

	/// Configuration file could not be read or parsed.
	#[error("Invalid configuration at {path}: {message}")]
	Config { path: PathBuf, message: String },

	/// Key/value store failure.
	#[error("Store error: {0}")]
	Store(String),

	/// The control loop is gone.
	#[error("Control loop has shut down")]
	ShutDown,

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),
}

impl Error {
	pub(crate) fn invalid(channel: impl Into<String>, reason: impl Into<String>) -> Self {
		Self::InvalidCommand {
			channel: channel.into(),
			reason: reason.into(),
		}
	}
}
