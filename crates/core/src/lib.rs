//! tabwright: multi-surface tab orchestration for desktop browser shells.
//!
//! This crate creates, composites and tears down tab surfaces, isolates
//! their network identity (plain or proxied partitions), keeps a canonical
//! per-tab state in sync with the control surface that renders the tab
//! strip, and manages the satellite popups (tab menu, side panel) whose
//! geometry follows the main window.
//!
//! Engines are consumed through the traits of `tabwright-runtime`; the wire
//! types exchanged with the control surface live in `tabwright-protocol`.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use tabwright::{Command, Shell, ShellOptions, SystemConfig};
//! use tabwright_runtime::headless::{HeadlessEngine, HeadlessHost};
//!
//! #[tokio::main]
//! async fn main() -> tabwright::Result<()> {
//!     let options = ShellOptions::new(
//!         Arc::new(HeadlessEngine::new()),
//!         Arc::new(HeadlessHost::default()),
//!         SystemConfig::default(),
//!     );
//!     let mut shell = Shell::new(options)?;
//!     let _sub = shell.on_notification(|envelope| println!("{}", envelope.kind));
//!
//!     let tab_id = shell.execute(Command::create_tab("example.com"))?;
//!     shell.run_until_idle().await;
//!     println!("{tab_id}: {:?}", shell.orchestrator().get_tab_info(tab_id.as_str().unwrap_or_default()));
//!     Ok(())
//! }
//! ```
//!
//! # Threading
//!
//! All orchestration state is owned by the [`Shell`] and mutated only from
//! its control loop. Engine callbacks and asynchronous completions are posted
//! as [`ControlEvent`]s; completions are checked against the tab they were
//! started for before they are applied, so work finishing after a tab closed
//! is dropped.

pub mod bridge;
pub mod config;
pub mod control;
pub mod entitlement;
pub mod error;
pub mod layout;
pub mod listeners;
pub mod orchestrator;
pub mod proxy;
pub mod satellite;
pub mod session;
pub mod shell;
pub mod state;
pub mod store;
pub mod url;

pub use bridge::{NavigationBridge, Phase};
pub use config::{ConfigProvider, Env, LayoutConfig, SystemConfig};
pub use control::{ControlEvent, ControlSender, WindowEvent};
pub use entitlement::{GateDecision, PermissionGate, StaticSubscription, SubscriptionProvider};
pub use error::{Error, Result};
pub use listeners::Subscription;
pub use orchestrator::{TabOrchestrator, TabSummary};
pub use proxy::ProxyResolver;
pub use satellite::{SatelliteKind, SatelliteSurfaceManager};
pub use session::{PartitionKey, SessionRegistry};
pub use shell::{ControlHandle, Shell, ShellOptions};
pub use state::TabStateStore;
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
pub use tabwright_protocol::{
	Command, CreateTabOptions, Envelope, ErrorInfo, ErrorKind, MessageType, SurfaceKind, TabId,
	TabState,
};
