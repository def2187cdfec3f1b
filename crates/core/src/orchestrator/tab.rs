use std::sync::Arc;

use serde::Serialize;
use tabwright_protocol::{SurfaceKind, TabId};
use tabwright_runtime::{Host, Surface};
use tracing::debug;

use crate::bridge::NavigationBridge;
use crate::bridge::monitor::MemoryMonitor;
use crate::session::PartitionKey;

/// A live tab: its surface, its event bridge and its memory monitor.
///
/// Dropping a tab detaches its surface from the window, destroys it and
/// stops memory sampling.
pub(crate) struct Tab {
	pub(crate) id: TabId,
	/// Distinguishes this tab from an earlier one that reused its id.
	pub(crate) instance: u64,
	pub(crate) kind: SurfaceKind,
	pub(crate) partition: PartitionKey,
	pub(crate) surface: Arc<dyn Surface>,
	pub(crate) bridge: NavigationBridge,
	host: Arc<dyn Host>,
	_monitor: MemoryMonitor,
}

impl Tab {
	pub(crate) fn new(
		id: TabId,
		instance: u64,
		kind: SurfaceKind,
		partition: PartitionKey,
		surface: Arc<dyn Surface>,
		host: Arc<dyn Host>,
	) -> Self {
		let monitor = MemoryMonitor::start(id.clone(), &surface);
		Self {
			bridge: NavigationBridge::new(id.clone(), instance, kind),
			id,
			instance,
			kind,
			partition,
			surface,
			host,
			_monitor: monitor,
		}
	}

	pub(crate) fn attach(&self) {
		self.host.attach(self.surface.id());
	}

	pub(crate) fn detach(&self) {
		self.host.detach(self.surface.id());
	}
}

impl Drop for Tab {
	fn drop(&mut self) {
		self.detach();
		self.surface.destroy();
		debug!(tab_id = %self.id, surface = %self.surface.id(), "Tab surface destroyed");
	}
}

/// Listing entry returned by [`TabOrchestrator::tabs`](super::TabOrchestrator::tabs).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TabSummary {
	pub id: TabId,
	pub is_active: bool,
	pub kind: SurfaceKind,
	pub partition: PartitionKey,
}
