//! Deterministic in-memory engine.
//!
//! Every capability of [`Engine`] is implemented without rendering anything:
//! loads commit immediately and emit the same event sequence a real engine
//! produces (`StartLoading`, `Navigated`, `TitleUpdated`, `FinishLoad`,
//! `StopLoading`). Failures, rejections, script results and memory samples
//! are scripted per URL through [`HeadlessEngine`]'s configuration methods.

mod host;
mod session;
mod surface;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

pub use host::HeadlessHost;
use parking_lot::Mutex;
use serde_json::Value;
pub use session::HeadlessSession;
pub use surface::HeadlessSurface;
use tracing::debug;

use crate::engine::{Engine, NetworkSession, PopupSpec, Surface, SurfaceId, SurfaceSpec};
use crate::error::{Error, Result};
use crate::event::LoadFailure;

/// Scripted outcomes shared by every surface of one engine.
#[derive(Debug, Default)]
pub(crate) struct Behavior {
	failures: HashMap<String, LoadFailure>,
	rejections: HashSet<String>,
	titles: HashMap<String, String>,
	pages: HashMap<String, Value>,
	script_failures: HashSet<String>,
	script_delay: Option<Duration>,
	memory_bytes: u64,
	memory_failure: bool,
	refuse_surfaces: bool,
}

impl Behavior {
	pub(crate) fn failure(&self, url: &str) -> Option<LoadFailure> {
		self.failures.get(url).cloned()
	}

	pub(crate) fn rejects(&self, url: &str) -> bool {
		self.rejections.contains(url)
	}

	pub(crate) fn title(&self, url: &str) -> Option<String> {
		self.titles.get(url).cloned()
	}

	pub(crate) fn page(&self, url: &str) -> Option<Value> {
		self.pages.get(url).cloned()
	}

	pub(crate) fn script_fails(&self, url: &str) -> bool {
		self.script_failures.contains(url)
	}

	pub(crate) fn script_delay(&self) -> Option<Duration> {
		self.script_delay
	}

	pub(crate) fn memory(&self) -> Option<u64> {
		(!self.memory_failure).then_some(self.memory_bytes)
	}
}

#[derive(Default)]
struct Registry {
	sessions: HashMap<String, Arc<HeadlessSession>>,
	surfaces: Vec<Arc<HeadlessSurface>>,
	popups: Vec<Arc<HeadlessSurface>>,
}

/// Engine whose surfaces live entirely in memory.
#[derive(Clone, Default)]
pub struct HeadlessEngine {
	behavior: Arc<Mutex<Behavior>>,
	registry: Arc<Mutex<Registry>>,
	next_id: Arc<AtomicU64>,
}

impl HeadlessEngine {
	pub fn new() -> Self {
		Self::default()
	}

	/// Loads of `url` fail with `failure` after starting.
	pub fn fail_url(&self, url: impl Into<String>, failure: LoadFailure) {
		self.behavior.lock().failures.insert(url.into(), failure);
	}

	/// Load calls for `url` are rejected outright.
	pub fn reject_url(&self, url: impl Into<String>) {
		self.behavior.lock().rejections.insert(url.into());
	}

	/// Title reported once `url` commits. Defaults to the URL host.
	pub fn set_title(&self, url: impl Into<String>, title: impl Into<String>) {
		self.behavior.lock().titles.insert(url.into(), title.into());
	}

	/// JSON returned by script execution while `url` is committed.
	pub fn set_page(&self, url: impl Into<String>, page: Value) {
		self.behavior.lock().pages.insert(url.into(), page);
	}

	/// Script execution fails while `url` is committed.
	pub fn fail_script(&self, url: impl Into<String>) {
		self.behavior.lock().script_failures.insert(url.into());
	}

	/// Delays every script result by `delay`.
	pub fn delay_scripts(&self, delay: Duration) {
		self.behavior.lock().script_delay = Some(delay);
	}

	/// Private bytes reported by memory sampling.
	pub fn set_memory(&self, bytes: u64) {
		let mut behavior = self.behavior.lock();
		behavior.memory_bytes = bytes;
		behavior.memory_failure = false;
	}

	/// Memory sampling fails from now on.
	pub fn fail_memory(&self) {
		self.behavior.lock().memory_failure = true;
	}

	/// Makes surface creation fail.
	pub fn refuse_surfaces(&self, refuse: bool) {
		self.behavior.lock().refuse_surfaces = refuse;
	}

	/// Live or destroyed tab surface by id.
	pub fn surface(&self, id: SurfaceId) -> Option<Arc<HeadlessSurface>> {
		let registry = self.registry.lock();
		registry
			.surfaces
			.iter()
			.chain(registry.popups.iter())
			.find(|s| s.id() == id)
			.cloned()
	}

	/// Every tab surface created so far, in creation order.
	pub fn surfaces(&self) -> Vec<Arc<HeadlessSurface>> {
		self.registry.lock().surfaces.clone()
	}

	/// Every popup surface created so far, in creation order.
	pub fn popups(&self) -> Vec<Arc<HeadlessSurface>> {
		self.registry.lock().popups.clone()
	}

	/// Session for `partition` if one was created.
	pub fn headless_session(&self, partition: &str) -> Option<Arc<HeadlessSession>> {
		self.registry.lock().sessions.get(partition).cloned()
	}

	fn allocate_id(&self) -> SurfaceId {
		SurfaceId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
	}
}

impl Engine for HeadlessEngine {
	fn session(&self, partition: &str) -> Arc<dyn NetworkSession> {
		let mut registry = self.registry.lock();
		let session = registry
			.sessions
			.entry(partition.to_string())
			.or_insert_with(|| {
				debug!(partition, "Creating headless session");
				Arc::new(HeadlessSession::new(partition))
			})
			.clone();
		session
	}

	fn create_surface(&self, spec: SurfaceSpec) -> Result<Arc<dyn Surface>> {
		if self.behavior.lock().refuse_surfaces {
			return Err(Error::SurfaceCreation(format!("refused to create '{}'", spec.label)));
		}
		let id = self.allocate_id();
		let surface = Arc::new(HeadlessSurface::tab(id, spec, self.behavior.clone()));
		debug!(%id, label = surface.label(), "Created headless surface");
		self.registry.lock().surfaces.push(surface.clone());
		Ok(surface)
	}

	fn create_popup(&self, spec: PopupSpec) -> Result<Arc<dyn Surface>> {
		if self.behavior.lock().refuse_surfaces {
			return Err(Error::SurfaceCreation(format!("refused to create '{}'", spec.label)));
		}
		let id = self.allocate_id();
		let surface = Arc::new(HeadlessSurface::popup(id, spec, self.behavior.clone()));
		debug!(%id, label = surface.label(), "Created headless popup");
		self.registry.lock().popups.push(surface.clone());
		Ok(surface)
	}
}
