//! Error types for the engine capability layer.

use thiserror::Error;

use crate::engine::SurfaceId;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported by an engine or one of its surfaces and sessions.
#[derive(Debug, Error)]
pub enum Error {
	/// The engine refused to create a rendering surface.
	#[error("Failed to create surface: {0}")]
	SurfaceCreation(String),

	/// Operation on a surface that was already destroyed.
	#[error("Surface {0} is destroyed")]
	SurfaceDestroyed(SurfaceId),

	/// The load call for a URL was rejected by the engine.
	#[error("Failed to load '{url}': {message}")]
	Load { url: String, message: String },

	/// Script execution inside a surface failed.
	#[error("Script execution failed: {0}")]
	Script(String),

	/// A network session operation failed.
	#[error("Session '{partition}' error: {message}")]
	Session { partition: String, message: String },

	/// Timeout waiting for an engine operation.
	#[error("Timeout: {0}")]
	Timeout(String),

	/// Channel closed unexpectedly.
	#[error("Channel closed unexpectedly")]
	ChannelClosed,

	/// I/O error.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// JSON serialization/deserialization error.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

impl Error {
	/// Returns true if this is a timeout error.
	pub fn is_timeout(&self) -> bool {
		matches!(self, Error::Timeout(_))
	}

	/// Returns true if the target surface is gone.
	pub fn is_destroyed(&self) -> bool {
		matches!(self, Error::SurfaceDestroyed(_))
	}
}
