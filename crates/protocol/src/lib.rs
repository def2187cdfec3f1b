//! Wire types shared by the tab orchestrator and its control surface.
//!
//! This crate contains the serde-serializable shapes exchanged between the
//! orchestrator (`tabwright`) and the control UI that renders the tab strip:
//! commands flowing in, state envelopes flowing out, and the per-tab state
//! snapshot carried inside them.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! - **Pure data**: No behavior beyond serialization and small accessors
//! - **Wire-stable**: Channel and message names match what the control UI sends and listens for
//! - **Engine-agnostic**: Nothing here knows how a surface is rendered
//!
//! Orchestration logic lives in `tabwright`; engine capabilities in `tabwright-runtime`.

pub mod command;
pub mod message;
pub mod proxy;
pub mod state;
pub mod types;

pub use command::*;
pub use message::*;
pub use proxy::*;
pub use state::*;
pub use types::*;
