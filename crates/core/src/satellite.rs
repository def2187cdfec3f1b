//! Satellite popups: the tab switcher menu and the side panel.
//!
//! Each satellite surface is created on first show and then only hidden and
//! re-shown; it is destroyed when the manager is disposed. Bounds are derived
//! from the main window on every show and, while visible, on every window
//! resize or move.

use std::sync::Arc;

use serde_json::Value;
use tabwright_protocol::{Envelope, MessageType, Point, TAB_LIST_CHANNEL};
use tabwright_runtime::{Engine, Host, PopupSpec, Surface};
use tracing::{debug, warn};

use crate::config::LayoutConfig;
use crate::control::ControlSender;
use crate::error::Result;
use crate::layout::{menu_bounds, panel_bounds};

/// Which satellite a surface event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SatelliteKind {
	Menu,
	Panel,
}

impl SatelliteKind {
	fn label(self) -> &'static str {
		match self {
			Self::Menu => "tab-menu",
			Self::Panel => "side-panel",
		}
	}

	fn message_type(self) -> MessageType {
		match self {
			Self::Menu => MessageType::TabMenuState,
			Self::Panel => MessageType::SidebarState,
		}
	}
}

struct Satellite {
	surface: Arc<dyn Surface>,
	url: String,
	visible: bool,
}

pub struct SatelliteSurfaceManager {
	engine: Arc<dyn Engine>,
	host: Arc<dyn Host>,
	layout: LayoutConfig,
	control: ControlSender,
	menu: Option<Satellite>,
	menu_anchor: Point,
	panel: Option<Satellite>,
	panel_width: u32,
	outbox: Vec<Envelope>,
}

impl SatelliteSurfaceManager {
	pub fn new(
		engine: Arc<dyn Engine>,
		host: Arc<dyn Host>,
		layout: LayoutConfig,
		control: ControlSender,
	) -> Self {
		Self {
			engine,
			host,
			layout,
			control,
			menu: None,
			menu_anchor: Point::default(),
			panel: None,
			panel_width: layout.panel_width,
			outbox: Vec::new(),
		}
	}

	/// Shows the tab menu at `anchor` (relative to the window origin) and
	/// pushes `payload` into it.
	pub fn show_menu(&mut self, anchor: Point, url: &str, payload: Value) -> Result<()> {
		self.menu_anchor = anchor;
		let bounds = menu_bounds(self.host.bounds(), anchor, &self.layout);
		let menu = Self::ensure(&mut self.menu, SatelliteKind::Menu, url, &self.engine, &self.control)?;
		menu.surface.set_bounds(bounds);
		menu.surface.send(TAB_LIST_CHANNEL, payload);
		menu.surface.set_visible(true);
		menu.surface.focus();
		menu.visible = true;
		debug!(?bounds, "Showing tab menu");
		self.outbox.push(Envelope::visibility(MessageType::TabMenuState, true));
		Ok(())
	}

	pub fn hide_menu(&mut self) {
		self.hide(SatelliteKind::Menu);
	}

	/// Shows the side panel docked to the right edge. `width` falls back to
	/// the last used width.
	pub fn show_panel(&mut self, url: &str, width: Option<u32>) -> Result<()> {
		if let Some(width) = width {
			self.panel_width = width;
		}
		let bounds = panel_bounds(self.host.bounds(), self.panel_width, &self.layout);
		let panel = Self::ensure(&mut self.panel, SatelliteKind::Panel, url, &self.engine, &self.control)?;
		panel.surface.set_bounds(bounds);
		panel.surface.set_visible(true);
		panel.visible = true;
		debug!(?bounds, "Showing side panel");
		self.outbox.push(Envelope::visibility(MessageType::SidebarState, true));
		Ok(())
	}

	pub fn hide_panel(&mut self) {
		self.hide(SatelliteKind::Panel);
	}

	/// Changes the panel width, re-deriving its bounds if it is showing.
	pub fn resize_panel(&mut self, width: u32) {
		self.panel_width = width;
		if self.is_visible(SatelliteKind::Panel) {
			self.reposition();
		}
	}

	/// Re-derives the bounds of every visible satellite from the window.
	pub fn reposition(&mut self) {
		let window = self.host.bounds();
		if let Some(menu) = self.menu.as_ref().filter(|m| m.visible) {
			menu.surface.set_bounds(menu_bounds(window, self.menu_anchor, &self.layout));
		}
		if let Some(panel) = self.panel.as_ref().filter(|p| p.visible) {
			panel.surface.set_bounds(panel_bounds(window, self.panel_width, &self.layout));
		}
	}

	/// Handles a focus loss on `kind`. Returns true if the menu was hidden,
	/// in which case the caller refocuses the active tab.
	pub fn on_focus_lost(&mut self, kind: SatelliteKind) -> bool {
		if kind == SatelliteKind::Menu && self.is_visible(kind) {
			self.hide(kind);
			return true;
		}
		false
	}

	pub fn is_visible(&self, kind: SatelliteKind) -> bool {
		self.slot(kind).is_some_and(|s| s.visible)
	}

	/// The satellite's surface, if it was ever shown.
	pub fn surface(&self, kind: SatelliteKind) -> Option<Arc<dyn Surface>> {
		self.slot(kind).map(|s| s.surface.clone())
	}

	pub fn panel_width(&self) -> u32 {
		self.panel_width
	}

	/// Takes the queued visibility notifications.
	pub fn drain_notifications(&mut self) -> Vec<Envelope> {
		std::mem::take(&mut self.outbox)
	}

	/// Destroys both satellites.
	pub fn dispose(&mut self) {
		for satellite in [self.menu.take(), self.panel.take()].into_iter().flatten() {
			satellite.surface.destroy();
		}
		self.outbox.clear();
	}

	fn slot(&self, kind: SatelliteKind) -> Option<&Satellite> {
		match kind {
			SatelliteKind::Menu => self.menu.as_ref(),
			SatelliteKind::Panel => self.panel.as_ref(),
		}
	}

	fn hide(&mut self, kind: SatelliteKind) {
		let slot = match kind {
			SatelliteKind::Menu => self.menu.as_mut(),
			SatelliteKind::Panel => self.panel.as_mut(),
		};
		let Some(satellite) = slot.filter(|s| s.visible) else {
			return;
		};
		satellite.surface.set_visible(false);
		satellite.visible = false;
		debug!(kind = kind.label(), "Hiding satellite");
		self.outbox.push(Envelope::visibility(kind.message_type(), false));
	}

	/// Creates the satellite on first use and loads `url` when it changed.
	fn ensure<'a>(
		slot: &'a mut Option<Satellite>,
		kind: SatelliteKind,
		url: &str,
		engine: &Arc<dyn Engine>,
		control: &ControlSender,
	) -> Result<&'a mut Satellite> {
		let satellite = match slot.take() {
			Some(satellite) => satellite,
			None => {
				let surface = engine.create_popup(PopupSpec {
					label: kind.label().to_string(),
					frameless: true,
					transparent: kind == SatelliteKind::Menu,
					parented: true,
					visible: false,
					events: control.satellite_sink(kind),
				})?;
				debug!(kind = kind.label(), id = %surface.id(), "Created satellite surface");
				Satellite {
					surface,
					url: String::new(),
					visible: false,
				}
			}
		};
		let satellite = slot.insert(satellite);

		if satellite.url != url {
			satellite.url = url.to_string();
			let load = satellite.surface.load_url(url);
			let url = url.to_string();
			control.spawn(async move {
				if let Err(e) = load.await {
					warn!(kind = kind.label(), url = %url, error = %e, "Satellite load failed");
				}
				None
			});
		}
		Ok(satellite)
	}
}
