//! Command-line driver for tabwright.
//!
//! Replays command scripts against the headless engine, shows the resolved
//! system configuration and edits the key/value store.

pub mod cli;
pub mod commands;
pub mod context;
pub mod error;
pub mod logging;
pub mod output;
