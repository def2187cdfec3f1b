//! Capability interface of a multi-surface browser engine.
//!
//! The orchestrator never renders anything itself. It drives an [`Engine`]
//! that creates [`Surface`]s bound to [`NetworkSession`]s, and a [`Host`]
//! window whose visible container holds the attached surfaces. Everything
//! here is object-safe so embedders can plug in any engine behind
//! `Arc<dyn Engine>`.
//!
//! Surfaces report back exclusively through their [`EventSink`]; no method
//! on these traits blocks waiting on a surface workload.

use std::collections::BTreeMap;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;
use tabwright_protocol::Rect;

use crate::Result;
use crate::event::{Credentials, EngineEvent, LoginRequest, WindowOpenAction, WindowOpenRequest};

/// Boxed future returned by asynchronous engine operations.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// Identifier the engine assigns to every surface it creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u64);

impl std::fmt::Display for SurfaceId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "surface#{}", self.0)
	}
}

/// Callback through which a surface delivers its events.
///
/// The orchestrator builds one per surface, tagging events with the owning
/// tab or satellite before they enter the control queue.
#[derive(Clone)]
pub struct EventSink(Arc<dyn Fn(EngineEvent) + Send + Sync>);

impl EventSink {
	pub fn new<F>(f: F) -> Self
	where
		F: Fn(EngineEvent) + Send + Sync + 'static,
	{
		Self(Arc::new(f))
	}

	/// A sink that drops every event.
	pub fn discard() -> Self {
		Self::new(|_| {})
	}

	pub fn emit(&self, event: EngineEvent) {
		(self.0)(event)
	}
}

impl std::fmt::Debug for EventSink {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str("EventSink")
	}
}

/// Parameters for creating a tab surface.
#[derive(Clone)]
pub struct SurfaceSpec {
	/// Diagnostic label, usually the tab id.
	pub label: String,
	/// Session the surface performs its network requests through.
	pub session: Arc<dyn NetworkSession>,
	/// Shell-owned pages get the SDK preload and context isolation.
	pub preload: bool,
	/// Appended to the session user agent for this surface only.
	pub user_agent_suffix: Option<String>,
	pub events: EventSink,
}

/// Parameters for creating a satellite popup surface.
#[derive(Debug, Clone)]
pub struct PopupSpec {
	pub label: String,
	pub frameless: bool,
	pub transparent: bool,
	/// Parent the popup to the main window so it moves and minimizes with it.
	pub parented: bool,
	/// Initial visibility.
	pub visible: bool,
	pub events: EventSink,
}

/// Private memory sample of a surface's execution context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryInfo {
	pub private_bytes: u64,
	pub shared_bytes: u64,
}

/// Decides whether a surface may open a native window.
pub type WindowOpenHandler = Arc<dyn Fn(&WindowOpenRequest) -> WindowOpenAction + Send + Sync>;

/// Answers HTTP authentication challenges raised inside a surface.
pub type LoginHandler = Arc<dyn Fn(&LoginRequest) -> Option<Credentials> + Send + Sync>;

/// An independently rendered browsing context.
pub trait Surface: Send + Sync {
	fn id(&self) -> SurfaceId;

	/// Starts loading `url`. Completion is reported through events; the future
	/// resolves once the engine accepted or rejected the request.
	fn load_url(&self, url: &str) -> BoxFuture<Result<()>>;

	/// Current committed URL.
	fn url(&self) -> String;

	/// Current document title.
	fn title(&self) -> String;

	fn can_go_back(&self) -> bool;
	fn can_go_forward(&self) -> bool;
	fn go_back(&self);
	fn go_forward(&self);
	fn reload(&self);

	fn set_bounds(&self, bounds: Rect);
	fn bounds(&self) -> Rect;

	/// Shows or hides a popup surface. Tab surfaces are shown by attaching them instead.
	fn set_visible(&self, visible: bool);
	fn is_visible(&self) -> bool;

	fn focus(&self);

	/// Evaluates `script` in the page and returns its JSON result.
	fn execute_script(&self, script: &str) -> BoxFuture<Result<Value>>;

	/// Samples memory of the surface's execution context.
	fn memory_info(&self) -> BoxFuture<Result<MemoryInfo>>;

	/// Posts an IPC message into the page.
	fn send(&self, channel: &str, payload: Value);

	/// Replaces the new-window handler.
	fn set_window_open_handler(&self, handler: WindowOpenHandler);

	/// Replaces the authentication challenge handler.
	fn set_login_handler(&self, handler: LoginHandler);

	/// Tears down the surface. Further calls become no-ops or return
	/// [`Error::SurfaceDestroyed`](crate::Error::SurfaceDestroyed).
	fn destroy(&self);
	fn is_destroyed(&self) -> bool;
}

/// Type of the resource a request fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
	MainFrame,
	SubFrame,
	Stylesheet,
	Script,
	Image,
	Font,
	Xhr,
	Media,
	Other,
}

/// Request seen by a session-level interceptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDetails {
	pub url: String,
	pub resource_type: ResourceType,
}

/// Outgoing request headers.
pub type RequestHeaders = BTreeMap<String, String>;

/// Incoming response headers (multi-valued).
pub type ResponseHeaders = BTreeMap<String, Vec<String>>;

/// Rewrites outgoing request headers in place.
pub type RequestHeaderInterceptor = Arc<dyn Fn(&RequestDetails, &mut RequestHeaders) + Send + Sync>;

/// Rewrites incoming response headers in place.
pub type ResponseHeaderRewriter = Arc<dyn Fn(&RequestDetails, &mut ResponseHeaders) + Send + Sync>;

/// Grants or denies a permission by name (e.g. `"geolocation"`).
pub type PermissionHandler = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Proxy mode of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyMode {
	Direct,
	FixedServers,
}

/// Proxy rule set applied to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRules {
	pub mode: ProxyMode,
	/// e.g. `http://localhost:7890`; empty in direct mode.
	pub proxy_rules: String,
	/// Semicolon separated bypass list, e.g. `<local>;localhost`.
	pub bypass_rules: String,
}

impl ProxyRules {
	/// Direct connections, bypassing local addresses.
	pub fn direct() -> Self {
		Self {
			mode: ProxyMode::Direct,
			proxy_rules: String::new(),
			bypass_rules: "<local>".to_string(),
		}
	}
}

/// An isolated network and storage identity shared by the surfaces bound to it.
pub trait NetworkSession: Send + Sync {
	/// Partition name, e.g. `persist:tab_proxy`.
	fn partition(&self) -> &str;

	fn set_user_agent(&self, user_agent: &str);
	fn user_agent(&self) -> String;

	/// Replaces the permission request handler.
	fn set_permission_handler(&self, handler: PermissionHandler);

	/// Replaces the outgoing header interceptor; `None` removes it.
	fn set_request_header_interceptor(&self, interceptor: Option<RequestHeaderInterceptor>);

	/// Replaces the response header rewriter; `None` removes it.
	fn set_response_header_rewriter(&self, rewriter: Option<ResponseHeaderRewriter>);

	/// Serves `scheme://path` from files under `root`.
	fn register_file_protocol(&self, scheme: &str, root: PathBuf) -> Result<()>;

	/// Applies proxy rules, replacing any previous set.
	fn set_proxy(&self, rules: ProxyRules) -> BoxFuture<Result<()>>;

	/// Clears HTTP cache and persistent storage.
	fn clear_storage(&self) -> BoxFuture<Result<()>>;
}

/// The main window: its geometry and the visible container for tab surfaces.
pub trait Host: Send + Sync {
	/// Window bounds in screen coordinates.
	fn bounds(&self) -> Rect;

	/// Adds a surface to the visible container. Attaching twice is a no-op.
	fn attach(&self, surface: SurfaceId);

	/// Removes a surface from the visible container. Detaching an absent surface is a no-op.
	fn detach(&self, surface: SurfaceId);

	/// Surfaces currently in the visible container.
	fn attached(&self) -> Vec<SurfaceId>;
}

/// Factory for sessions and surfaces.
pub trait Engine: Send + Sync {
	/// Returns the session for `partition`, creating it on first use.
	fn session(&self, partition: &str) -> Arc<dyn NetworkSession>;

	/// Creates a tab surface. The surface starts detached and blank.
	fn create_surface(&self, spec: SurfaceSpec) -> Result<Arc<dyn Surface>>;

	/// Creates a popup surface parented to the main window.
	fn create_popup(&self, spec: PopupSpec) -> Result<Arc<dyn Surface>>;
}
