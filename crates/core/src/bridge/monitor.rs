//! Periodic memory sampling of tab surfaces.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tabwright_runtime::Surface;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{error, warn};

/// Interval between memory samples.
pub const SAMPLE_INTERVAL: Duration = Duration::from_secs(30);

/// Private memory above which a warning is logged.
pub const HIGH_WATER_BYTES: u64 = 500 * 1024 * 1024;

/// Samples a surface's private memory until dropped.
///
/// Sampling stops on its own when the surface is gone or a sample fails.
#[derive(Debug)]
pub struct MemoryMonitor {
	handle: JoinHandle<()>,
}

impl MemoryMonitor {
	pub fn start(tab_id: String, surface: &Arc<dyn Surface>) -> Self {
		Self::with_limits(tab_id, surface, SAMPLE_INTERVAL, HIGH_WATER_BYTES)
	}

	pub fn with_limits(
		tab_id: String,
		surface: &Arc<dyn Surface>,
		period: Duration,
		high_water: u64,
	) -> Self {
		let surface: Weak<dyn Surface> = Arc::downgrade(surface);
		let handle = tokio::spawn(async move {
			let mut ticks = interval_at(Instant::now() + period, period);
			ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
			loop {
				ticks.tick().await;
				let sample = match surface.upgrade() {
					Some(surface) if !surface.is_destroyed() => surface.memory_info(),
					_ => break,
				};
				match sample.await {
					Ok(info) if info.private_bytes > high_water => {
						warn!(tab_id = %tab_id, private_bytes = info.private_bytes, "Tab memory usage high");
					}
					Ok(_) => {}
					Err(e) => {
						error!(tab_id = %tab_id, error = %e, "Failed to sample tab memory");
						break;
					}
				}
			}
		});
		Self { handle }
	}

	/// Returns true once sampling has stopped.
	pub fn is_finished(&self) -> bool {
		self.handle.is_finished()
	}
}

impl Drop for MemoryMonitor {
	fn drop(&mut self) {
		self.handle.abort();
	}
}
