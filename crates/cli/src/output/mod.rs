//! Result envelopes printed by every command.
//!
//! ```json
//! { "ok": true, "command": "store.get", "data": { "key": "theme", "value": "dark" } }
//! ```
//!
//! On failure `data` is replaced by `error: { code, message }`.

#[cfg(test)]
mod tests;

use std::io::{self, Write};

use serde::Serialize;

/// Output format for command results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text
	#[default]
	Text,
	/// Pretty-printed JSON
	Json,
	/// Newline-delimited JSON (streaming)
	Ndjson,
}

impl std::fmt::Display for OutputFormat {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			OutputFormat::Text => write!(f, "text"),
			OutputFormat::Json => write!(f, "json"),
			OutputFormat::Ndjson => write!(f, "ndjson"),
		}
	}
}

/// Result envelope of one command.
#[derive(Debug, Serialize)]
pub struct CommandResult<T: Serialize> {
	pub ok: bool,
	pub command: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<T>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<CommandError>,
}

impl<T: Serialize> CommandResult<T> {
	pub fn success(command: impl Into<String>, data: T) -> Self {
		Self {
			ok: true,
			command: command.into(),
			data: Some(data),
			error: None,
		}
	}

	pub fn failed(command: impl Into<String>, error: CommandError) -> Self {
		Self {
			ok: false,
			command: command.into(),
			data: None,
			error: Some(error),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandError {
	pub code: ErrorCode,
	pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
	InvalidInput,
	ScriptError,
	ConfigError,
	StoreError,
	EngineError,
	IoError,
	InternalError,
}

impl std::fmt::Display for ErrorCode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let name = match self {
			ErrorCode::InvalidInput => "INVALID_INPUT",
			ErrorCode::ScriptError => "SCRIPT_ERROR",
			ErrorCode::ConfigError => "CONFIG_ERROR",
			ErrorCode::StoreError => "STORE_ERROR",
			ErrorCode::EngineError => "ENGINE_ERROR",
			ErrorCode::IoError => "IO_ERROR",
			ErrorCode::InternalError => "INTERNAL_ERROR",
		};
		f.write_str(name)
	}
}

/// Renders `result` in `format`. Text output prints the data alone: strings
/// verbatim, anything else as pretty JSON.
pub fn render<T: Serialize>(result: &CommandResult<T>, format: OutputFormat) -> String {
	let rendered = match format {
		OutputFormat::Json => serde_json::to_string_pretty(result),
		OutputFormat::Ndjson => serde_json::to_string(result),
		OutputFormat::Text => match (&result.data, &result.error) {
			(_, Some(error)) => Ok(format!("error[{}]: {}", error.code, error.message)),
			(Some(data), None) => match serde_json::to_value(data) {
				Ok(serde_json::Value::String(s)) => Ok(s),
				Ok(serde_json::Value::Null) => Ok(String::new()),
				Ok(value) => serde_json::to_string_pretty(&value),
				Err(e) => Err(e),
			},
			(None, None) => Ok(String::new()),
		},
	};
	rendered.unwrap_or_else(|e| format!("{{\"ok\":false,\"error\":\"failed to encode output: {e}\"}}"))
}

pub fn print_result<T: Serialize>(result: &CommandResult<T>, format: OutputFormat) {
	let rendered = render(result, format);
	if rendered.is_empty() {
		return;
	}
	let mut stdout = io::stdout().lock();
	let _ = writeln!(stdout, "{rendered}");
}

/// Writes one already rendered line to stdout.
pub fn print_line(line: &str) {
	let mut stdout = io::stdout().lock();
	let _ = writeln!(stdout, "{line}");
}

pub fn print_error_stderr(error: &CommandError) {
	eprintln!("error[{}]: {}", error.code, error.message);
}
