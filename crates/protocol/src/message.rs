//! Notification envelopes published to the control surface.

use serde::{Deserialize, Serialize};

use crate::state::TabState;
use crate::types::TabId;

/// IPC channel the control surface listens on for [`Envelope`]s.
pub const NOTIFY_CHANNEL: &str = "ipc-msg";

/// IPC channel the control surface listens on for re-issued commands.
pub const COMMAND_CHANNEL: &str = "tab-command";

/// IPC channel satellites listen on for tab-list data.
pub const TAB_LIST_CHANNEL: &str = "tab-list";

/// Notification type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageType {
	TabCreated,
	TabTitleUpdated,
	TabUrlUpdated,
	TabLoadingState,
	TabStateChanged,
	TabViewState,
	TabRequestError,
	TabMenuState,
	SidebarState,
}

impl MessageType {
	/// Returns the wire name.
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::TabCreated => "tab-created",
			Self::TabTitleUpdated => "tab-title-updated",
			Self::TabUrlUpdated => "tab-url-updated",
			Self::TabLoadingState => "tab-loading-state",
			Self::TabStateChanged => "tab-state-changed",
			Self::TabViewState => "tab-view-state",
			Self::TabRequestError => "tab-request-error",
			Self::TabMenuState => "tab-menu-state",
			Self::SidebarState => "sidebar-state",
		}
	}
}

impl std::fmt::Display for MessageType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Visibility flag of a satellite surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visibility {
	pub visible: bool,
}

/// Envelope payload: a tab snapshot or a satellite visibility flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
	Tab(Box<TabState>),
	Visibility(Visibility),
}

/// The single typed notification published to the control surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
	#[serde(rename = "type")]
	pub kind: MessageType,
	pub payload: Payload,
}

impl Envelope {
	/// Wraps a tab snapshot.
	pub fn tab(kind: MessageType, state: TabState) -> Self {
		Self {
			kind,
			payload: Payload::Tab(Box::new(state)),
		}
	}

	/// Wraps a satellite visibility flag.
	pub fn visibility(kind: MessageType, visible: bool) -> Self {
		Self {
			kind,
			payload: Payload::Visibility(Visibility { visible }),
		}
	}

	/// Returns the tab id if the payload is a tab snapshot.
	pub fn tab_id(&self) -> Option<&TabId> {
		match &self.payload {
			Payload::Tab(state) => Some(&state.id),
			Payload::Visibility(_) => None,
		}
	}

	/// Returns the tab snapshot, if any.
	pub fn tab_state(&self) -> Option<&TabState> {
		match &self.payload {
			Payload::Tab(state) => Some(state.as_ref()),
			Payload::Visibility(_) => None,
		}
	}
}
