//! Commands sent by the control surface.
//!
//! Each variant corresponds to one IPC channel. On the wire a command is an
//! adjacently tagged object:
//!
//! ```json
//! { "channel": "create-tab", "args": { "url": "example.com", "options": { "useProxy": true } } }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{CreateTabOptions, Point, TabId};

/// Options for `popup:show`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PanelOptions {
	/// Panel width in pixels; the configured default is used when absent.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub width: Option<u32>,
}

/// A command from the control surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "channel", content = "args", rename_all_fields = "camelCase")]
pub enum Command {
	#[serde(rename = "create-tab")]
	CreateTab {
		#[serde(default)]
		url: String,
		#[serde(default)]
		options: CreateTabOptions,
	},
	#[serde(rename = "switch-tab")]
	SwitchTab { tab_id: TabId },
	#[serde(rename = "close-tab")]
	CloseTab { tab_id: TabId },
	#[serde(rename = "navigate-back")]
	NavigateBack,
	#[serde(rename = "navigate-forward")]
	NavigateForward,
	#[serde(rename = "navigate-reload")]
	NavigateReload,
	#[serde(rename = "navigate-to-url")]
	NavigateToUrl { url: String },
	#[serde(rename = "get-tab-info")]
	GetTabInfo { tab_id: TabId },
	#[serde(rename = "show-tabs-menu")]
	ShowTabsMenu {
		#[serde(alias = "postion")]
		position: Point,
		#[serde(default)]
		menu_url: String,
		#[serde(default)]
		payload: Value,
	},
	#[serde(rename = "menu-close")]
	MenuClose,
	#[serde(rename = "popup:show")]
	PopupShow {
		url: String,
		#[serde(default)]
		options: PanelOptions,
	},
	#[serde(rename = "popup:close")]
	PopupClose,
	#[serde(rename = "popup:resize")]
	PopupResize { width: u32 },
	#[serde(rename = "store:get")]
	StoreGet { key: String },
	#[serde(rename = "store:set")]
	StoreSet { key: String, value: Value },
	#[serde(rename = "store:remove")]
	StoreRemove { key: String },
	#[serde(rename = "store:clear")]
	StoreClear,
}

impl Command {
	/// Returns the IPC channel name of this command.
	pub fn channel(&self) -> &'static str {
		match self {
			Self::CreateTab { .. } => "create-tab",
			Self::SwitchTab { .. } => "switch-tab",
			Self::CloseTab { .. } => "close-tab",
			Self::NavigateBack => "navigate-back",
			Self::NavigateForward => "navigate-forward",
			Self::NavigateReload => "navigate-reload",
			Self::NavigateToUrl { .. } => "navigate-to-url",
			Self::GetTabInfo { .. } => "get-tab-info",
			Self::ShowTabsMenu { .. } => "show-tabs-menu",
			Self::MenuClose => "menu-close",
			Self::PopupShow { .. } => "popup:show",
			Self::PopupClose => "popup:close",
			Self::PopupResize { .. } => "popup:resize",
			Self::StoreGet { .. } => "store:get",
			Self::StoreSet { .. } => "store:set",
			Self::StoreRemove { .. } => "store:remove",
			Self::StoreClear => "store:clear",
		}
	}

	/// Shorthand for a `create-tab` command with default options.
	pub fn create_tab(url: impl Into<String>) -> Self {
		Self::CreateTab {
			url: url.into(),
			options: CreateTabOptions::default(),
		}
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn create_tab_round_trips_through_wire_shape() {
		let cmd: Command = serde_json::from_value(json!({
			"channel": "create-tab",
			"args": { "url": "example.com", "options": { "useProxy": true } }
		}))
		.unwrap();
		match &cmd {
			Command::CreateTab { url, options } => {
				assert_eq!(url, "example.com");
				assert!(options.use_proxy);
			}
			other => panic!("unexpected command: {other:?}"),
		}
		assert_eq!(cmd.channel(), "create-tab");
	}

	#[test]
	fn unit_commands_need_no_args() {
		let cmd: Command = serde_json::from_value(json!({ "channel": "navigate-reload" })).unwrap();
		assert_eq!(cmd, Command::NavigateReload);
	}

	#[test]
	fn tabs_menu_accepts_legacy_position_key() {
		let cmd: Command = serde_json::from_value(json!({
			"channel": "show-tabs-menu",
			"args": { "postion": { "x": 10, "y": 4 }, "menuUrl": "http://localhost/menu" }
		}))
		.unwrap();
		assert_eq!(
			cmd,
			Command::ShowTabsMenu {
				position: Point::new(10, 4),
				menu_url: "http://localhost/menu".into(),
				payload: Value::Null,
			}
		);
	}

	#[test]
	fn field_names_are_camel_case() {
		let value = serde_json::to_value(Command::SwitchTab { tab_id: "t2".into() }).unwrap();
		assert_eq!(value, json!({ "channel": "switch-tab", "args": { "tabId": "t2" } }));
	}
}
