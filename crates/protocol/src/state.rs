//! Per-tab state snapshot and the error taxonomy carried inside it.

use serde::{Deserialize, Serialize};

use crate::types::{HttpStatus, TabId};

/// Canonical state snapshot of one tab, as published to the control surface.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabState {
	pub id: TabId,
	/// Current URL. Always empty while [`navigating`](Self::navigating) is set.
	pub url: String,
	pub title: String,
	pub loading: bool,
	/// The tab is a navigation placeholder whose destination is not chosen yet.
	pub navigating: bool,
	pub use_proxy: bool,
	pub is_home: bool,
	pub error: Option<ErrorInfo>,
	pub favicon: Option<String>,
	pub meta_data: Option<PageMeta>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub icons: Vec<IconLink>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub http_status: Option<HttpStatus>,
	/// Unix epoch milliseconds of the last merge.
	pub last_updated: u64,
}

impl TabState {
	/// Creates an empty snapshot for `id`.
	pub fn new(id: impl Into<TabId>) -> Self {
		Self {
			id: id.into(),
			..Default::default()
		}
	}

	/// Returns true if an error is recorded.
	pub fn has_error(&self) -> bool {
		self.error.is_some()
	}
}

/// Partial update merged onto a [`TabState`].
///
/// `None` leaves a field untouched. Nullable fields use a nested option so
/// a patch can clear them: `Some(None)` resets the field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TabStatePatch {
	pub url: Option<String>,
	pub title: Option<String>,
	pub loading: Option<bool>,
	pub navigating: Option<bool>,
	pub use_proxy: Option<bool>,
	pub is_home: Option<bool>,
	pub error: Option<Option<ErrorInfo>>,
	pub favicon: Option<Option<String>>,
	pub meta_data: Option<Option<PageMeta>>,
	pub icons: Option<Vec<IconLink>>,
	pub http_status: Option<Option<HttpStatus>>,
}

impl TabStatePatch {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn url(mut self, url: impl Into<String>) -> Self {
		self.url = Some(url.into());
		self
	}

	pub fn title(mut self, title: impl Into<String>) -> Self {
		self.title = Some(title.into());
		self
	}

	pub fn loading(mut self, loading: bool) -> Self {
		self.loading = Some(loading);
		self
	}

	pub fn navigating(mut self, navigating: bool) -> Self {
		self.navigating = Some(navigating);
		self
	}

	pub fn use_proxy(mut self, use_proxy: bool) -> Self {
		self.use_proxy = Some(use_proxy);
		self
	}

	pub fn is_home(mut self, is_home: bool) -> Self {
		self.is_home = Some(is_home);
		self
	}

	pub fn error(mut self, error: ErrorInfo) -> Self {
		self.error = Some(Some(error));
		self
	}

	pub fn clear_error(mut self) -> Self {
		self.error = Some(None);
		self
	}

	pub fn favicon(mut self, favicon: Option<String>) -> Self {
		self.favicon = Some(favicon);
		self
	}

	pub fn meta_data(mut self, meta: PageMeta) -> Self {
		self.meta_data = Some(Some(meta));
		self
	}

	pub fn icons(mut self, icons: Vec<IconLink>) -> Self {
		self.icons = Some(icons);
		self
	}

	pub fn http_status(mut self, status: Option<HttpStatus>) -> Self {
		self.http_status = Some(status);
		self
	}

	/// Shallow merge: every field set on the patch overwrites `state`.
	pub fn apply_to(self, state: &mut TabState) {
		if let Some(url) = self.url {
			state.url = url;
		}
		if let Some(title) = self.title {
			state.title = title;
		}
		if let Some(loading) = self.loading {
			state.loading = loading;
		}
		if let Some(navigating) = self.navigating {
			state.navigating = navigating;
		}
		if let Some(use_proxy) = self.use_proxy {
			state.use_proxy = use_proxy;
		}
		if let Some(is_home) = self.is_home {
			state.is_home = is_home;
		}
		if let Some(error) = self.error {
			state.error = error;
		}
		if let Some(favicon) = self.favicon {
			state.favicon = favicon;
		}
		if let Some(meta) = self.meta_data {
			state.meta_data = meta;
		}
		if let Some(icons) = self.icons {
			state.icons = icons;
		}
		if let Some(status) = self.http_status {
			state.http_status = status;
		}
	}
}

/// Metadata bundle extracted from a loaded page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageMeta {
	pub description: String,
	pub keywords: String,
	pub favicon: Option<String>,
	pub og_title: Option<String>,
	pub og_description: Option<String>,
	pub og_image: Option<String>,
	pub icons: Vec<IconLink>,
	/// Unix epoch milliseconds of extraction.
	pub timestamp: u64,
}

/// A `<link rel*=icon>` entry discovered on a page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IconLink {
	pub href: String,
	pub rel: String,
	pub sizes: String,
}

/// Top-level error category written into [`TabState::error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
	/// Failure attributable to the proxy (`ERR_PROXY_*`, `ERR_TUNNEL_*`).
	ProxyError,
	/// Any other engine-reported network or content failure.
	BrowserError,
	/// The load call itself was rejected.
	LoadError,
	/// Page metadata extraction failed after a successful load.
	MetaFetchError,
}

impl std::fmt::Display for ErrorKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::ProxyError => write!(f, "PROXY_ERROR"),
			Self::BrowserError => write!(f, "BROWSER_ERROR"),
			Self::LoadError => write!(f, "LOAD_ERROR"),
			Self::MetaFetchError => write!(f, "META_FETCH_ERROR"),
		}
	}
}

/// Proxy failure subtypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProxyErrorType {
	ConnectionFailed,
	TunnelFailed,
	AuthFailed,
	Unknown,
}

/// Browser failure subtypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BrowserErrorType {
	Timeout,
	ConnectionRefused,
	ConnectionReset,
	DnsFailed,
	CertificateError,
	SslError,
	NotFound,
	Aborted,
	Unknown,
}

/// Subtype of a classified engine error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorType {
	Proxy(ProxyErrorType),
	Browser(BrowserErrorType),
}

/// Structured record of the failing request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetails {
	pub url: String,
	/// Engine-provided error code, e.g. `net::ERR_TUNNEL_CONNECTION_FAILED`.
	pub error: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error_code: Option<i32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error_description: Option<String>,
	/// Unix epoch milliseconds.
	pub timestamp: u64,
}

/// Error recorded on a tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorInfo {
	#[serde(rename = "type")]
	pub kind: ErrorKind,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error_type: Option<ErrorType>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub details: Option<ErrorDetails>,
}

impl ErrorInfo {
	/// Creates an error of `kind` with only a description.
	pub fn described(kind: ErrorKind, description: impl Into<String>) -> Self {
		Self {
			kind,
			error_type: None,
			description: Some(description.into()),
			details: None,
		}
	}

	/// Returns the proxy subtype, if this is a proxy error.
	pub fn proxy_type(&self) -> Option<ProxyErrorType> {
		match self.error_type {
			Some(ErrorType::Proxy(t)) => Some(t),
			_ => None,
		}
	}

	/// Returns the browser subtype, if this is a browser error.
	pub fn browser_type(&self) -> Option<BrowserErrorType> {
		match self.error_type {
			Some(ErrorType::Browser(t)) => Some(t),
			_ => None,
		}
	}
}
