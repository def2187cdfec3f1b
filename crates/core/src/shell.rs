//! Composition root and control loop.
//!
//! A [`Shell`] owns the control surface, the [`TabOrchestrator`] and the
//! [`SatelliteSurfaceManager`], and applies [`ControlEvent`]s one at a time.
//! After every event the notifications queued by the tab state store and the
//! satellites are sent to the control surface on [`NOTIFY_CHANNEL`] and
//! handed to notification listeners.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tabwright_protocol::{Command, Envelope, NOTIFY_CHANNEL};
use tabwright_runtime::{Engine, EngineEvent, EventSink, Host, Surface, SurfaceSpec};
use tokio::sync::oneshot;
use tracing::{debug, info, trace, warn};

use crate::config::SystemConfig;
use crate::control::{self, ControlEvent, ControlReceiver, ControlSender, WindowEvent};
use crate::entitlement::{PermissionGate, StaticSubscription, SubscriptionProvider};
use crate::error::{Error, Result};
use crate::listeners::{Listeners, Subscription};
use crate::orchestrator::TabOrchestrator;
use crate::satellite::{SatelliteKind, SatelliteSurfaceManager};
use crate::store::{KeyValueStore, MemoryStore};

/// Engine partition of the control surface.
pub const CONTROL_PARTITION: &str = "persist:shell";

/// How long an idle control loop waits for in-flight work before polling again.
const IDLE_POLL: Duration = Duration::from_millis(5);

/// Everything a [`Shell`] is built from.
pub struct ShellOptions {
	pub engine: Arc<dyn Engine>,
	pub host: Arc<dyn Host>,
	pub config: SystemConfig,
	pub subscription: Arc<dyn SubscriptionProvider>,
	pub store: Arc<dyn KeyValueStore>,
}

impl ShellOptions {
	/// Options with an entitled subscription and an in-memory store.
	pub fn new(engine: Arc<dyn Engine>, host: Arc<dyn Host>, config: SystemConfig) -> Self {
		Self {
			engine,
			host,
			config,
			subscription: Arc::new(StaticSubscription::entitled()),
			store: Arc::new(MemoryStore::new()),
		}
	}

	pub fn subscription(mut self, subscription: Arc<dyn SubscriptionProvider>) -> Self {
		self.subscription = subscription;
		self
	}

	pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
		self.store = store;
		self
	}
}

/// Cloneable handle for sending commands into a running [`Shell`].
#[derive(Clone, Debug)]
pub struct ControlHandle {
	sender: ControlSender,
}

impl ControlHandle {
	/// Sends `command` and waits for the control loop to answer it.
	pub async fn invoke(&self, command: Command) -> Result<Value> {
		let (reply, answer) = oneshot::channel();
		if !self.sender.post(ControlEvent::Command {
			command,
			reply: Some(reply),
		}) {
			return Err(Error::ShutDown);
		}
		answer.await.map_err(|_| Error::ShutDown)?
	}

	pub fn post_window_event(&self, event: WindowEvent) {
		self.sender.post(ControlEvent::Window(event));
	}
}

pub struct Shell {
	tabs: TabOrchestrator,
	satellites: SatelliteSurfaceManager,
	store: Arc<dyn KeyValueStore>,
	control_surface: Arc<dyn Surface>,
	sender: ControlSender,
	receiver: ControlReceiver,
	listeners: Listeners<Envelope>,
}

impl Shell {
	/// Creates the control surface, starts loading the control UI and wires
	/// the orchestrator and satellites to one control queue.
	///
	/// Must be called inside a Tokio runtime.
	pub fn new(options: ShellOptions) -> Result<Self> {
		let ShellOptions {
			engine,
			host,
			config,
			subscription,
			store,
		} = options;
		let (sender, receiver) = control::channel();

		let control_surface = engine.create_surface(SurfaceSpec {
			label: "control".to_string(),
			session: engine.session(CONTROL_PARTITION),
			preload: true,
			user_agent_suffix: None,
			events: EventSink::discard(),
		})?;
		let control_url = config.control_url();
		let load = control_surface.load_url(&control_url);
		sender.spawn(async move {
			if let Err(e) = load.await {
				warn!(url = %control_url, error = %e, "Failed to load control surface");
			}
			None
		});

		let mut tabs = TabOrchestrator::new(
			Arc::clone(&engine),
			Arc::clone(&host),
			Arc::new(config.clone()),
			sender.clone(),
		)
		.with_gate(PermissionGate::new(subscription))
		.with_layout(config.layout)
		.with_resource_root(config.local_resource_root.clone());
		tabs.set_control_surface(Arc::clone(&control_surface));

		let satellites = SatelliteSurfaceManager::new(engine, host, config.layout, sender.clone());
		info!(base_url = %config.base_url, "Shell started");

		Ok(Self {
			tabs,
			satellites,
			store,
			control_surface,
			sender,
			receiver,
			listeners: Listeners::new(),
		})
	}

	pub fn handle(&self) -> ControlHandle {
		ControlHandle {
			sender: self.sender.clone(),
		}
	}

	pub fn sender(&self) -> ControlSender {
		self.sender.clone()
	}

	pub fn orchestrator(&self) -> &TabOrchestrator {
		&self.tabs
	}

	pub fn satellites(&self) -> &SatelliteSurfaceManager {
		&self.satellites
	}

	pub fn control_surface(&self) -> &Arc<dyn Surface> {
		&self.control_surface
	}

	/// Registers a listener for every published notification.
	pub fn on_notification<F>(&self, listener: F) -> Subscription
	where
		F: Fn(&Envelope) + Send + Sync + 'static,
	{
		self.listeners.add(listener)
	}

	pub fn post_window_event(&self, event: WindowEvent) {
		self.sender.post(ControlEvent::Window(event));
	}

	/// Executes one command immediately and publishes its notifications.
	pub fn execute(&mut self, command: Command) -> Result<Value> {
		let result = self.dispatch(command);
		self.flush();
		result
	}

	fn dispatch(&mut self, command: Command) -> Result<Value> {
		debug!(channel = command.channel(), "Command");
		match command {
			Command::CreateTab { url, options } => {
				let tab_id = self.tabs.create_tab(&url, options)?;
				Ok(Value::String(tab_id))
			}
			Command::SwitchTab { tab_id } => Ok(Value::Bool(self.tabs.switch_tab(&tab_id))),
			Command::CloseTab { tab_id } => Ok(Value::Bool(self.tabs.close_tab(&tab_id))),
			Command::NavigateBack => Ok(Value::Bool(self.tabs.go_back())),
			Command::NavigateForward => Ok(Value::Bool(self.tabs.go_forward())),
			Command::NavigateReload => Ok(Value::Bool(self.tabs.reload())),
			Command::NavigateToUrl { url } => Ok(Value::Bool(self.tabs.load_url(&url))),
			Command::GetTabInfo { tab_id } => Ok(serde_json::to_value(self.tabs.get_tab_info(&tab_id))?),
			Command::ShowTabsMenu {
				position,
				menu_url,
				payload,
			} => {
				if menu_url.is_empty() {
					return Err(Error::MissingMenuUrl);
				}
				let payload = match payload {
					Value::Null => serde_json::to_value(self.tabs.get_all_tab_info())?,
					payload => payload,
				};
				self.satellites.show_menu(position, &menu_url, payload)?;
				Ok(Value::Null)
			}
			Command::MenuClose => {
				self.satellites.hide_menu();
				Ok(Value::Null)
			}
			Command::PopupShow { url, options } => {
				if url.is_empty() {
					return Err(Error::invalid("popup:show", "url is required"));
				}
				self.satellites.show_panel(&url, options.width)?;
				Ok(Value::Null)
			}
			Command::PopupClose => {
				self.satellites.hide_panel();
				Ok(Value::Null)
			}
			Command::PopupResize { width } => {
				if width == 0 {
					return Err(Error::invalid("popup:resize", "width must be positive"));
				}
				self.satellites.resize_panel(width);
				Ok(Value::Null)
			}
			Command::StoreGet { key } => Ok(self.store.get(&key)?.unwrap_or(Value::Null)),
			Command::StoreSet { key, value } => {
				self.store.set(&key, value)?;
				Ok(Value::Null)
			}
			Command::StoreRemove { key } => {
				self.store.remove(&key)?;
				Ok(Value::Null)
			}
			Command::StoreClear => {
				self.store.clear()?;
				Ok(Value::Null)
			}
		}
	}

	/// Applies one control event and publishes the resulting notifications.
	pub fn handle_event(&mut self, event: ControlEvent) {
		match event {
			ControlEvent::Command { command, reply } => {
				let channel = command.channel();
				let result = self.dispatch(command);
				if let Err(e) = &result {
					warn!(channel, error = %e, "Command failed");
				}
				if let Some(reply) = reply {
					let _ = reply.send(result);
				}
			}
			ControlEvent::Tab {
				tab_id,
				instance,
				event,
			} => self.tabs.on_tab_event(&tab_id, instance, event),
			ControlEvent::Satellite { kind, event } => self.on_satellite_event(kind, event),
			ControlEvent::Window(event) => {
				trace!(?event, "Window geometry changed");
				self.tabs.update_view_bounds();
				self.satellites.reposition();
			}
			ControlEvent::LoadRejected {
				tab_id,
				instance,
				url,
				message,
			} => self.tabs.on_load_rejected(&tab_id, instance, &url, &message),
			ControlEvent::MetaExtracted {
				tab_id,
				instance,
				url,
				result,
			} => self.tabs.on_meta(&tab_id, instance, &url, result),
			ControlEvent::WindowOpenDenied { tab_id, url } => {
				if let Err(e) = self.tabs.on_window_open_denied(&tab_id, &url) {
					warn!(tab_id = %tab_id, url = %url, error = %e, "Failed to re-issue new window request");
				}
			}
		}
		self.flush();
	}

	fn on_satellite_event(&mut self, kind: SatelliteKind, event: EngineEvent) {
		match event {
			EngineEvent::FocusLost => {
				if self.satellites.on_focus_lost(kind) {
					self.tabs.focus_active();
				}
			}
			EngineEvent::RendererGone { reason } => {
				warn!(?kind, reason = %reason, "Satellite renderer gone");
			}
			event => trace!(?kind, ?event, "Satellite event"),
		}
	}

	fn flush(&mut self) {
		let mut envelopes = self.tabs.drain_notifications();
		envelopes.extend(self.satellites.drain_notifications());
		for envelope in envelopes {
			match serde_json::to_value(&envelope) {
				Ok(value) => self.control_surface.send(NOTIFY_CHANNEL, value),
				Err(e) => warn!(kind = %envelope.kind, error = %e, "Failed to encode notification"),
			}
			self.listeners.emit(&envelope);
		}
	}

	/// Waits for the next control event and applies it.
	pub async fn step(&mut self) {
		if let Some(event) = self.receiver.recv().await {
			self.handle_event(event);
		}
	}

	/// Applies queued events until the queue is empty and no background work
	/// is in flight.
	pub async fn run_until_idle(&mut self) {
		loop {
			if let Some(event) = self.receiver.try_recv() {
				self.handle_event(event);
				continue;
			}
			if self.sender.in_flight() == 0 {
				// Completions are posted before their task is counted out.
				match self.receiver.try_recv() {
					Some(event) => self.handle_event(event),
					None => return,
				}
				continue;
			}
			tokio::select! {
				event = self.receiver.recv() => {
					if let Some(event) = event {
						self.handle_event(event);
					}
				}
				_ = tokio::time::sleep(IDLE_POLL) => {}
			}
		}
	}

	/// Closes every tab and destroys the satellites and the control surface.
	pub fn dispose(&mut self) {
		self.tabs.dispose();
		self.satellites.dispose();
		self.control_surface.destroy();
		while self.receiver.try_recv().is_some() {}
		info!("Shell disposed");
	}
}
