use std::path::PathBuf;

use thiserror::Error;

use crate::output::{CommandError, ErrorCode};

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
	/// A script line could not be parsed.
	#[error("{}:{line}: {message}", path.display())]
	Script {
		path: PathBuf,
		line: usize,
		message: String,
	},

	#[error(transparent)]
	Core(#[from] tabwright::Error),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),

	#[error(transparent)]
	Anyhow(#[from] anyhow::Error),
}

impl CliError {
	/// Converts this error to a structured error for output envelopes.
	pub fn to_command_error(&self) -> CommandError {
		let code = match self {
			CliError::Script { .. } => ErrorCode::ScriptError,
			CliError::Core(err) => match err {
				tabwright::Error::Config { .. } => ErrorCode::ConfigError,
				tabwright::Error::Store(_) => ErrorCode::StoreError,
				tabwright::Error::InvalidCommand { .. }
				| tabwright::Error::MissingMenuUrl
				| tabwright::Error::UnknownTab(_) => ErrorCode::InvalidInput,
				tabwright::Error::Engine(_) => ErrorCode::EngineError,
				tabwright::Error::Io(_) => ErrorCode::IoError,
				_ => ErrorCode::InternalError,
			},
			CliError::Io(_) => ErrorCode::IoError,
			CliError::Json(_) => ErrorCode::InvalidInput,
			CliError::Anyhow(err) if err.downcast_ref::<std::io::Error>().is_some() => ErrorCode::IoError,
			CliError::Anyhow(_) => ErrorCode::InternalError,
		};
		CommandError {
			code,
			message: format!("{self:#}"),
		}
	}
}
