use parking_lot::Mutex;
use tabwright_protocol::Rect;

use crate::engine::{Host, SurfaceId};

struct HostState {
	bounds: Rect,
	attached: Vec<SurfaceId>,
}

/// Main window of the headless engine.
pub struct HeadlessHost {
	state: Mutex<HostState>,
}

impl HeadlessHost {
	pub fn new(bounds: Rect) -> Self {
		Self {
			state: Mutex::new(HostState {
				bounds,
				attached: Vec::new(),
			}),
		}
	}

	/// Moves or resizes the window. The caller is responsible for posting the
	/// matching window event.
	pub fn set_bounds(&self, bounds: Rect) {
		self.state.lock().bounds = bounds;
	}
}

impl Default for HeadlessHost {
	fn default() -> Self {
		Self::new(Rect::new(0, 0, 1280, 800))
	}
}

impl Host for HeadlessHost {
	fn bounds(&self) -> Rect {
		self.state.lock().bounds
	}

	fn attach(&self, surface: SurfaceId) {
		let mut state = self.state.lock();
		if !state.attached.contains(&surface) {
			state.attached.push(surface);
		}
	}

	fn detach(&self, surface: SurfaceId) {
		self.state.lock().attached.retain(|s| *s != surface);
	}

	fn attached(&self) -> Vec<SurfaceId> {
		self.state.lock().attached.clone()
	}
}
