//! The tab collection and its command surface.
//!
//! [`TabOrchestrator`] owns every [`Tab`], the active-tab pointer and the
//! shared [`TabStateStore`]. It composes the [`SessionRegistry`], the
//! [`ProxyResolver`] and one [`NavigationBridge`](crate::bridge::NavigationBridge) per tab. All methods run on
//! the control loop; completions of asynchronous work come back through
//! [`ControlEvent`]s and are matched against the tab's id and instance before
//! they touch any state.
//!
//! Visibility is exclusive: exactly the active tab's surface is attached to
//! the window.

mod tab;

use std::path::PathBuf;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;
use tabwright_protocol::{
	COMMAND_CHANNEL, Command, CreateTabOptions, Envelope, MessageType, SurfaceKind, TabId,
	TabState, TabStatePatch,
};
use tabwright_runtime::{BoxFuture, Engine, EngineEvent, Host, Surface, SurfaceSpec};
use tracing::{debug, info, warn};

pub use self::tab::TabSummary;
use self::tab::Tab;
use crate::config::{ConfigProvider, LayoutConfig};
use crate::control::{ControlEvent, ControlSender};
use crate::entitlement::{GateDecision, PermissionGate};
use crate::error::Result;
use crate::layout::Layout;
use crate::proxy::ProxyResolver;
use crate::session::{PartitionKey, SessionRegistry};
use crate::state::TabStateStore;
use crate::url::{BLANK, normalize};

/// Product token appended to each tab surface's user agent.
pub const USER_AGENT_SUFFIX: &str = " Tabwright";

const NEW_TAB_TITLE: &str = "New Tab";

pub struct TabOrchestrator {
	engine: Arc<dyn Engine>,
	host: Arc<dyn Host>,
	config: Arc<dyn ConfigProvider>,
	control: ControlSender,
	control_surface: Option<Arc<dyn Surface>>,
	sessions: SessionRegistry,
	proxy: ProxyResolver,
	gate: PermissionGate,
	layout: LayoutConfig,
	store: TabStateStore,
	tabs: IndexMap<TabId, Tab>,
	active: Option<TabId>,
	next_tab: u64,
	next_instance: u64,
}

impl TabOrchestrator {
	pub fn new(
		engine: Arc<dyn Engine>,
		host: Arc<dyn Host>,
		config: Arc<dyn ConfigProvider>,
		control: ControlSender,
	) -> Self {
		Self {
			sessions: SessionRegistry::new(Arc::clone(&engine), None),
			proxy: ProxyResolver::new(Arc::clone(&config)),
			engine,
			host,
			config,
			control,
			control_surface: None,
			gate: PermissionGate::default(),
			layout: LayoutConfig::default(),
			store: TabStateStore::new(),
			tabs: IndexMap::new(),
			active: None,
			next_tab: 0,
			next_instance: 0,
		}
	}

	pub fn with_gate(mut self, gate: PermissionGate) -> Self {
		self.gate = gate;
		self
	}

	pub fn with_layout(mut self, layout: LayoutConfig) -> Self {
		self.layout = layout;
		self
	}

	/// Serves `root` through the `local-resource` protocol in tab sessions.
	pub fn with_resource_root(mut self, root: Option<PathBuf>) -> Self {
		self.sessions = SessionRegistry::new(Arc::clone(&self.engine), root);
		self
	}

	/// Sets the surface that receives re-issued commands and is laid out above the active tab.
	pub fn set_control_surface(&mut self, surface: Arc<dyn Surface>) {
		self.control_surface = Some(surface);
		self.update_view_bounds();
	}

	/// Creates a tab, makes it the only visible surface and starts loading.
	///
	/// A proxied tab without entitlement is replaced by a plain tab at the
	/// gate's redirect path; the id of that tab is returned instead.
	pub fn create_tab(&mut self, url: &str, options: CreateTabOptions) -> Result<TabId> {
		if options.use_proxy {
			if let GateDecision::Redirect(path) = self.gate.check() {
				info!(requested = url, redirect = %path, "Proxy tab replaced by entitlement redirect");
				return self.create_tab(&path, CreateTabOptions::default());
			}
		}

		let url = normalize(url, &self.config.base_url());
		let kind = SurfaceKind::from_options(&options);
		let tab_id = match options.tab_id.clone() {
			Some(id) => id,
			None => self.generate_tab_id(),
		};
		if self.tabs.contains_key(&tab_id) {
			debug!(tab_id = %tab_id, "Replacing tab with the same id");
			self.close_tab(&tab_id);
		}

		let session = self.sessions.acquire(options.use_proxy);
		let proxy_rules = if options.use_proxy {
			self.proxy.configure(session.as_ref())
		} else {
			None
		};
		let partition = session.partition().to_string();

		self.next_instance += 1;
		let instance = self.next_instance;
		let surface = self.engine.create_surface(SurfaceSpec {
			label: tab_id.clone(),
			session,
			preload: kind.is_shell_owned(),
			user_agent_suffix: Some(USER_AGENT_SUFFIX.to_string()),
			events: self.control.tab_sink(&tab_id, instance),
		})?;

		let tab = Tab::new(
			tab_id.clone(),
			instance,
			kind,
			PartitionKey::for_proxy(options.use_proxy),
			surface.clone(),
			Arc::clone(&self.host),
		);
		tab.bridge.wire(surface.as_ref(), &self.control, &self.proxy);

		for other in self.tabs.values() {
			other.detach();
		}
		tab.attach();
		self.tabs.insert(tab_id.clone(), tab);
		self.active = Some(tab_id.clone());

		let (seed_url, title) = if options.navigate {
			(BLANK, BLANK)
		} else {
			(url.as_str(), NEW_TAB_TITLE)
		};
		self.store.seed(
			&tab_id,
			TabStatePatch::new()
				.use_proxy(options.use_proxy)
				.url(seed_url)
				.title(title)
				.navigating(options.navigate)
				.is_home(options.is_home),
			MessageType::TabCreated,
		);
		self.update_view_bounds();
		info!(tab_id = %tab_id, %kind, url = %url, use_proxy = options.use_proxy, "Tab created");

		match (options.navigate, proxy_rules) {
			(false, None) => self.start_load(&tab_id, instance, &surface, url),
			(false, Some(apply)) => {
				let surface = surface.clone();
				let tab_id = tab_id.clone();
				self.control.spawn(async move {
					apply_proxy_rules(&partition, apply).await;
					let load = surface.load_url(&url);
					load_outcome(tab_id, instance, url, load.await)
				});
			}
			(true, Some(apply)) => {
				self.control.spawn(async move {
					apply_proxy_rules(&partition, apply).await;
					None
				});
			}
			(true, None) => {}
		}
		Ok(tab_id)
	}

	/// Closes a tab. The most recently created remaining tab becomes active
	/// if the closed one was. Returns false for an unknown id.
	pub fn close_tab(&mut self, tab_id: &str) -> bool {
		let Some(tab) = self.tabs.shift_remove(tab_id) else {
			debug!(tab_id, "Close of unknown tab ignored");
			return false;
		};
		self.store.remove(tab_id);
		drop(tab);
		info!(tab_id, "Tab closed");

		if self.active.as_deref() == Some(tab_id) {
			self.active = None;
			if let Some(last) = self.tabs.keys().last().cloned() {
				self.switch_tab(&last);
			}
		}
		true
	}

	/// Makes `tab_id` the visible tab. An unknown id clears the active tab and
	/// detaches every surface.
	pub fn switch_tab(&mut self, tab_id: &str) -> bool {
		let Some(target) = self.tabs.get(tab_id) else {
			debug!(tab_id, "Switch to unknown tab clears the active tab");
			self.active = None;
			for tab in self.tabs.values() {
				tab.detach();
			}
			return false;
		};

		for tab in self.tabs.values().filter(|t| t.id != tab_id) {
			tab.detach();
		}
		target.attach();
		target.surface.focus();
		self.active = Some(tab_id.to_string());
		self.update_view_bounds();
		self.store
			.update(tab_id, TabStatePatch::new(), MessageType::TabViewState);
		true
	}

	/// Lays out the active tab and the control surface for the current window
	/// bounds. Does nothing without an active tab.
	pub fn update_view_bounds(&self) {
		let Some(tab) = self.active_tab() else {
			return;
		};
		let layout = Layout::compute(tab.kind, &self.layout);
		let window = self.host.bounds();
		tab.surface.set_bounds(layout.tab_bounds(window));
		if let Some(control) = &self.control_surface {
			control.set_bounds(layout.control_bounds(window));
		}
	}

	pub fn go_back(&self) -> bool {
		match self.active_tab() {
			Some(tab) if tab.surface.can_go_back() => {
				tab.surface.go_back();
				true
			}
			_ => false,
		}
	}

	pub fn go_forward(&self) -> bool {
		match self.active_tab() {
			Some(tab) if tab.surface.can_go_forward() => {
				tab.surface.go_forward();
				true
			}
			_ => false,
		}
	}

	pub fn reload(&self) -> bool {
		let Some(tab) = self.active_tab() else {
			return false;
		};
		tab.surface.reload();
		true
	}

	/// Loads `url` into the active tab. A navigation placeholder becomes a
	/// regular tab showing its destination.
	pub fn load_url(&mut self, url: &str) -> bool {
		let url = normalize(url, &self.config.base_url());
		let Some(tab) = self.active.as_ref().and_then(|id| self.tabs.get_mut(id)) else {
			return false;
		};
		let (tab_id, instance, surface) = (tab.id.clone(), tab.instance, tab.surface.clone());

		if self.store.get(&tab_id).is_some_and(|s| s.navigating) {
			if tab.kind == SurfaceKind::ChromeInternal {
				tab.kind = SurfaceKind::Standard;
				tab.bridge.set_kind(SurfaceKind::Standard);
			}
			self.store.update(
				&tab_id,
				TabStatePatch::new().navigating(false).url(url.as_str()),
				MessageType::TabStateChanged,
			);
		}
		self.start_load(&tab_id, instance, &surface, url);
		true
	}

	fn start_load(&self, tab_id: &str, instance: u64, surface: &Arc<dyn Surface>, url: String) {
		let load = surface.load_url(&url);
		let tab_id = tab_id.to_string();
		self.control
			.spawn(async move { load_outcome(tab_id, instance, url, load.await) });
	}

	pub fn get_tab_info(&self, tab_id: &str) -> Option<TabState> {
		self.store.get(tab_id).cloned()
	}

	/// Every tab's state in creation order.
	pub fn get_all_tab_info(&self) -> Vec<TabState> {
		self.store.get_all()
	}

	/// Tab listing in creation order.
	pub fn tabs(&self) -> Vec<TabSummary> {
		self.tabs
			.values()
			.map(|tab| TabSummary {
				id: tab.id.clone(),
				is_active: self.active.as_deref() == Some(tab.id.as_str()),
				kind: tab.kind,
				partition: tab.partition,
			})
			.collect()
	}

	pub fn len(&self) -> usize {
		self.tabs.len()
	}

	pub fn is_empty(&self) -> bool {
		self.tabs.is_empty()
	}

	pub fn active_tab_id(&self) -> Option<&str> {
		self.active.as_deref()
	}

	/// Surface of a live tab.
	pub fn surface(&self, tab_id: &str) -> Option<Arc<dyn Surface>> {
		self.tabs.get(tab_id).map(|tab| tab.surface.clone())
	}

	/// Returns focus to the active tab, if any.
	pub fn focus_active(&self) {
		if let Some(tab) = self.active_tab() {
			tab.surface.focus();
		}
	}

	pub fn sessions(&self) -> &SessionRegistry {
		&self.sessions
	}

	/// Takes the queued tab notifications.
	pub fn drain_notifications(&mut self) -> Vec<Envelope> {
		self.store.drain_notifications()
	}

	/// Applies an engine event raised by a tab surface.
	pub fn on_tab_event(&mut self, tab_id: &str, instance: u64, event: EngineEvent) {
		let Some(tab) = live_tab(&mut self.tabs, tab_id, instance) else {
			debug!(tab_id, instance, ?event, "Dropping event for closed tab");
			return;
		};
		tab.bridge
			.on_event(event, &tab.surface, &mut self.store, &self.control);
	}

	pub fn on_load_rejected(&mut self, tab_id: &str, instance: u64, url: &str, message: &str) {
		if let Some(tab) = live_tab(&mut self.tabs, tab_id, instance) {
			tab.bridge.on_load_rejected(url, message, &mut self.store);
		}
	}

	pub fn on_meta(
		&mut self,
		tab_id: &str,
		instance: u64,
		url: &str,
		result: std::result::Result<Value, String>,
	) {
		let Some(tab) = live_tab(&mut self.tabs, tab_id, instance) else {
			debug!(tab_id, url, "Dropping page metadata for closed tab");
			return;
		};
		tab.bridge.on_meta(url, result, &tab.surface, &mut self.store);
	}

	/// Re-issues a denied new-window request as a `create-tab` command to the
	/// control surface.
	pub fn on_window_open_denied(&self, tab_id: &str, url: &str) -> Result<()> {
		if !self.tabs.contains_key(tab_id) {
			return Ok(());
		}
		let Some(control) = &self.control_surface else {
			warn!(tab_id, url, "No control surface to re-issue new window request");
			return Ok(());
		};
		let command = serde_json::to_value(Command::create_tab(url))?;
		control.send(COMMAND_CHANNEL, command);
		Ok(())
	}

	/// Closes every tab and drops all state and sessions.
	pub fn dispose(&mut self) {
		self.active = None;
		self.tabs.clear();
		self.store.clear();
		self.sessions.dispose();
		info!("Orchestrator disposed");
	}

	fn active_tab(&self) -> Option<&Tab> {
		self.active.as_ref().and_then(|id| self.tabs.get(id))
	}

	fn generate_tab_id(&mut self) -> TabId {
		loop {
			self.next_tab += 1;
			let id = format!("tab-{}", self.next_tab);
			if !self.tabs.contains_key(&id) {
				return id;
			}
		}
	}
}

/// The tab, if it is still the same instance that raised the event.
fn live_tab<'a>(tabs: &'a mut IndexMap<TabId, Tab>, tab_id: &str, instance: u64) -> Option<&'a mut Tab> {
	tabs.get_mut(tab_id).filter(|tab| tab.instance == instance)
}

async fn apply_proxy_rules(partition: &str, apply: BoxFuture<tabwright_runtime::Result<()>>) {
	match apply.await {
		Ok(()) => debug!(partition, "Proxy rules applied"),
		Err(e) => warn!(partition, error = %e, "Failed to apply proxy rules"),
	}
}

fn load_outcome(
	tab_id: TabId,
	instance: u64,
	url: String,
	outcome: tabwright_runtime::Result<()>,
) -> Option<ControlEvent> {
	outcome.err().map(|e| ControlEvent::LoadRejected {
		tab_id,
		instance,
		url,
		message: e.to_string(),
	})
}

impl std::fmt::Debug for TabOrchestrator {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("TabOrchestrator")
			.field("tabs", &self.tabs.keys().collect::<Vec<_>>())
			.field("active", &self.active)
			.finish()
	}
}

#[cfg(test)]
mod tests;
