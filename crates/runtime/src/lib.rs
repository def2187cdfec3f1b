//! Engine capability layer for tabwright.
//!
//! The orchestrator drives browser engines exclusively through the traits in
//! [`engine`]: an [`Engine`] factory, [`Surface`]s, [`NetworkSession`]s and
//! the main window [`Host`]. Surfaces report back through [`EngineEvent`]s
//! delivered to an [`EventSink`].
//!
//! The [`headless`] module provides a deterministic in-memory engine used by
//! tests and the command-line driver.

pub mod engine;
pub mod error;
pub mod event;
pub mod headless;

pub use engine::{
	BoxFuture, Engine, EventSink, Host, LoginHandler, MemoryInfo, NetworkSession,
	PermissionHandler, PopupSpec, ProxyMode, ProxyRules, RequestDetails, RequestHeaderInterceptor,
	RequestHeaders, ResourceType, ResponseHeaderRewriter, ResponseHeaders, Surface, SurfaceId,
	SurfaceSpec, WindowOpenHandler,
};
pub use error::{Error, Result};
pub use event::{
	Credentials, EngineEvent, LoadFailure, LoginRequest, WindowDisposition, WindowOpenAction,
	WindowOpenRequest,
};
