//! Geometry policy.
//!
//! Tab and control surfaces are positioned in window-content coordinates;
//! satellites are top-level popups positioned in screen coordinates.

use tabwright_protocol::{Point, Rect, SurfaceKind};

use crate::config::LayoutConfig;

/// Chrome geometry derived for the active surface kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
	pub toolbar_height: u32,
	/// Height reserved above the active tab for the control surface.
	pub top_view_height: u32,
	pub home_offset: u32,
}

impl Layout {
	pub fn compute(kind: SurfaceKind, config: &LayoutConfig) -> Self {
		let top_view_height = match kind {
			SurfaceKind::Standard | SurfaceKind::ChromeInternal => config.toolbar_height,
			SurfaceKind::Home | SurfaceKind::App => {
				config.toolbar_height.saturating_sub(config.home_offset)
			}
		};
		Self {
			toolbar_height: config.toolbar_height,
			top_view_height,
			home_offset: config.home_offset,
		}
	}

	/// Bounds of the active tab inside a window of `window` size.
	pub fn tab_bounds(&self, window: Rect) -> Rect {
		Rect::new(
			0,
			self.top_view_height as i32,
			window.width,
			window.height.saturating_sub(self.top_view_height),
		)
	}

	/// Bounds of the control surface.
	pub fn control_bounds(&self, window: Rect) -> Rect {
		Rect::new(0, 0, window.width, self.top_view_height.min(window.height))
	}
}

/// Screen bounds of the tab menu anchored at `anchor`, relative to the window origin.
pub fn menu_bounds(window: Rect, anchor: Point, config: &LayoutConfig) -> Rect {
	Rect::new(
		window.x + anchor.x,
		window.y + anchor.y,
		config.menu_width,
		config.menu_height,
	)
}

/// Screen bounds of the side panel, docked to the window's right edge below the toolbar.
pub fn panel_bounds(window: Rect, width: u32, config: &LayoutConfig) -> Rect {
	let width = width.min(window.width);
	Rect::new(
		window.right() - width as i32,
		window.y + config.toolbar_height as i32,
		width,
		window.height.saturating_sub(config.toolbar_height),
	)
}
