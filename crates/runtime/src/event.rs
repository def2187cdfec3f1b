//! Events surfaces emit, and the request types passed to surface handlers.

use tabwright_protocol::HttpStatus;

/// Lifecycle and failure events emitted by a surface.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
	/// The surface began loading a document.
	StartLoading,
	/// The surface stopped loading, successfully or not.
	StopLoading,
	/// The main document and its subresources finished loading.
	FinishLoad,
	/// A main frame navigation committed.
	Navigated { url: String, http_status: Option<HttpStatus> },
	/// The document title changed.
	TitleUpdated { title: String },
	/// A navigation failed.
	LoadFailed(LoadFailure),
	/// The renderer process crashed or was killed.
	RendererGone { reason: String },
	/// A popup surface lost keyboard focus.
	FocusLost,
}

/// Details of a failed navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
	pub url: String,
	/// Engine error string, e.g. `net::ERR_NAME_NOT_RESOLVED`.
	pub error: String,
	pub error_code: Option<i32>,
	pub description: String,
	pub is_main_frame: bool,
}

impl LoadFailure {
	pub fn main_frame(url: impl Into<String>, error: impl Into<String>, error_code: i32) -> Self {
		let error = error.into();
		Self {
			url: url.into(),
			description: error.clone(),
			error,
			error_code: Some(error_code),
			is_main_frame: true,
		}
	}

	pub fn with_description(mut self, description: impl Into<String>) -> Self {
		self.description = description.into();
		self
	}

	pub fn sub_frame(mut self) -> Self {
		self.is_main_frame = false;
		self
	}
}

/// How a page asked for a new window to be opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowDisposition {
	#[default]
	ForegroundTab,
	BackgroundTab,
	NewWindow,
	Other,
}

/// A page's request to open a new window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowOpenRequest {
	pub url: String,
	pub disposition: WindowDisposition,
}

/// Answer to a [`WindowOpenRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowOpenAction {
	Allow,
	Deny,
}

/// An HTTP authentication challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRequest {
	pub url: String,
	pub is_proxy: bool,
	pub host: String,
	pub port: u16,
	pub realm: Option<String>,
}

/// Username and password answering a login challenge.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
	pub username: String,
	pub password: String,
}

impl Credentials {
	pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
		Self {
			username: username.into(),
			password: password.into(),
		}
	}
}

impl std::fmt::Debug for Credentials {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Credentials")
			.field("username", &self.username)
			.field("password", &"****")
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn credentials_debug_hides_password() {
		let creds = Credentials::new("alice", "hunter2");
		let rendered = format!("{creds:?}");
		assert!(rendered.contains("alice"));
		assert!(!rendered.contains("hunter2"));
	}

	#[test]
	fn main_frame_failure_defaults_description_to_error() {
		let failure = LoadFailure::main_frame("https://x.test", "net::ERR_TIMED_OUT", -7);
		assert_eq!(failure.description, "net::ERR_TIMED_OUT");
		assert!(failure.is_main_frame);
		assert!(!failure.clone().sub_frame().is_main_frame);
	}
}
