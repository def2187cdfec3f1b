//! Geometry, surface classification, and tab creation options.

use serde::{Deserialize, Serialize};

/// Opaque tab identifier.
pub type TabId = String;

/// Axis-aligned rectangle in window coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
	pub x: i32,
	pub y: i32,
	pub width: u32,
	pub height: u32,
}

impl Rect {
	/// Zero-sized rectangle at the origin.
	pub const ZERO: Rect = Rect::new(0, 0, 0, 0);

	pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
		Self { x, y, width, height }
	}

	/// Returns the x coordinate of the right edge.
	pub fn right(&self) -> i32 {
		self.x.saturating_add(self.width as i32)
	}
}

/// Point in window coordinates, used as an anchor offset for popups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
	pub x: i32,
	pub y: i32,
}

impl Point {
	pub const fn new(x: i32, y: i32) -> Self {
		Self { x, y }
	}
}

/// Classification of a tab surface, replacing the `isHome`/`isApp`/`navigate` flags.
///
/// Each kind maps to one row of the layout table in `tabwright::layout`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SurfaceKind {
	/// Ordinary web content.
	#[default]
	Standard,
	/// The home page served by the shell itself.
	Home,
	/// An installed web app surface.
	App,
	/// A shell-internal page whose destination is chosen later (navigation placeholder).
	ChromeInternal,
}

impl SurfaceKind {
	/// Derives the kind from creation options. `isApp` wins over `isHome`, which wins over `navigate`.
	pub fn from_options(options: &CreateTabOptions) -> Self {
		if options.is_app {
			Self::App
		} else if options.is_home {
			Self::Home
		} else if options.navigate {
			Self::ChromeInternal
		} else {
			Self::Standard
		}
	}

	/// Returns true for surfaces rendered by the shell itself.
	///
	/// Page metadata is never extracted from these.
	pub fn is_shell_owned(&self) -> bool {
		matches!(self, Self::Home | Self::ChromeInternal)
	}
}

impl std::fmt::Display for SurfaceKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Standard => write!(f, "standard"),
			Self::Home => write!(f, "home"),
			Self::App => write!(f, "app"),
			Self::ChromeInternal => write!(f, "chrome-internal"),
		}
	}
}

/// Options recognized by `create-tab`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateTabOptions {
	/// Route the tab through the proxied network partition.
	pub use_proxy: bool,
	/// Open a navigation placeholder instead of loading `url`.
	pub navigate: bool,
	/// The tab hosts the shell home page.
	pub is_home: bool,
	/// The tab hosts an installed app.
	pub is_app: bool,
	/// Caller-chosen tab id; generated when absent.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub tab_id: Option<TabId>,
}

impl CreateTabOptions {
	/// Creates default options.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the proxy flag.
	pub fn use_proxy(mut self, use_proxy: bool) -> Self {
		self.use_proxy = use_proxy;
		self
	}

	/// Sets the navigation placeholder flag.
	pub fn navigate(mut self, navigate: bool) -> Self {
		self.navigate = navigate;
		self
	}

	/// Sets the home flag.
	pub fn home(mut self, is_home: bool) -> Self {
		self.is_home = is_home;
		self
	}

	/// Sets the app flag.
	pub fn app(mut self, is_app: bool) -> Self {
		self.is_app = is_app;
		self
	}

	/// Sets an explicit tab id.
	pub fn tab_id(mut self, tab_id: impl Into<TabId>) -> Self {
		self.tab_id = Some(tab_id.into());
		self
	}
}

/// HTTP status of the last committed main-frame navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpStatus {
	pub code: u16,
	pub text: String,
}

impl HttpStatus {
	pub fn new(code: u16, text: impl Into<String>) -> Self {
		Self {
			code,
			text: text.into(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn surface_kind_precedence() {
		let opts = CreateTabOptions::new().home(true).navigate(true);
		assert_eq!(SurfaceKind::from_options(&opts), SurfaceKind::Home);

		let opts = CreateTabOptions::new().app(true).home(true);
		assert_eq!(SurfaceKind::from_options(&opts), SurfaceKind::App);

		let opts = CreateTabOptions::new().navigate(true);
		assert_eq!(SurfaceKind::from_options(&opts), SurfaceKind::ChromeInternal);

		assert_eq!(SurfaceKind::from_options(&CreateTabOptions::new()), SurfaceKind::Standard);
	}

	#[test]
	fn options_deserialize_from_camel_case() {
		let opts: CreateTabOptions =
			serde_json::from_str(r#"{"useProxy":true,"isHome":true,"tabId":"t1"}"#).unwrap();
		assert!(opts.use_proxy);
		assert!(opts.is_home);
		assert!(!opts.navigate);
		assert_eq!(opts.tab_id.as_deref(), Some("t1"));
	}
}
