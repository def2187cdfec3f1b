//! Shared harness: a [`Shell`] over the headless engine that records every
//! published notification.

#![allow(dead_code)]

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tabwright::{
	Command, Envelope, MessageType, Shell, ShellOptions, StaticSubscription, Subscription,
	SystemConfig, TabState,
};
use tabwright_protocol::{Payload, Rect};
use tabwright_runtime::headless::{HeadlessEngine, HeadlessHost, HeadlessSurface};
use tabwright_runtime::{Host, Surface};

pub const WINDOW: Rect = Rect::new(0, 0, 1280, 800);

pub struct TestShell {
	pub engine: HeadlessEngine,
	pub host: Arc<HeadlessHost>,
	pub shell: Shell,
	published: Arc<Mutex<Vec<Envelope>>>,
	_subscription: Subscription,
}

impl TestShell {
	pub fn new() -> Self {
		Self::build(SystemConfig::default(), StaticSubscription::entitled())
	}

	pub fn build(config: SystemConfig, subscription: StaticSubscription) -> Self {
		let engine = HeadlessEngine::new();
		let host = Arc::new(HeadlessHost::new(WINDOW));
		let options = ShellOptions::new(Arc::new(engine.clone()), host.clone(), config)
			.subscription(Arc::new(subscription));
		let shell = Shell::new(options).expect("Failed to start shell");

		let published = Arc::new(Mutex::new(Vec::new()));
		let sink = Arc::clone(&published);
		let subscription = shell.on_notification(move |envelope: &Envelope| {
			sink.lock().push(envelope.clone());
		});

		Self {
			engine,
			host,
			shell,
			published,
			_subscription: subscription,
		}
	}

	/// Runs `command`, then lets every resulting event and completion settle.
	pub async fn invoke(&mut self, command: Command) -> tabwright::Result<Value> {
		let result = self.shell.execute(command);
		self.shell.run_until_idle().await;
		result
	}

	/// Creates a tab and returns its id.
	pub async fn create(&mut self, url: &str) -> String {
		let value = self
			.invoke(Command::create_tab(url))
			.await
			.expect("Failed to create tab");
		value.as_str().expect("tab id").to_string()
	}

	pub fn info(&self, tab_id: &str) -> TabState {
		self.shell
			.orchestrator()
			.get_tab_info(tab_id)
			.expect("tab state")
	}

	/// Headless view of a tab's surface.
	pub fn tab_surface(&self, tab_id: &str) -> Arc<HeadlessSurface> {
		let surface = self.shell.orchestrator().surface(tab_id).expect("live tab");
		self.engine.surface(surface.id()).expect("headless surface")
	}

	pub fn control(&self) -> Arc<HeadlessSurface> {
		self.engine
			.surface(self.shell.control_surface().id())
			.expect("control surface")
	}

	/// Ids of tabs whose surface is attached to the window.
	pub fn attached_tabs(&self) -> Vec<String> {
		let attached = self.host.attached();
		self.shell
			.orchestrator()
			.tabs()
			.into_iter()
			.filter(|t| {
				let surface = self.shell.orchestrator().surface(&t.id).expect("live tab");
				attached.contains(&surface.id())
			})
			.map(|t| t.id)
			.collect()
	}

	/// Takes every notification published so far.
	pub fn take_published(&self) -> Vec<Envelope> {
		std::mem::take(&mut *self.published.lock())
	}

	/// Tab snapshots published for `tab_id`, with their message types.
	pub fn published_for(&self, tab_id: &str) -> Vec<(MessageType, TabState)> {
		self.published
			.lock()
			.iter()
			.filter_map(|e| match &e.payload {
				Payload::Tab(state) if state.id == tab_id => Some((e.kind, (**state).clone())),
				_ => None,
			})
			.collect()
	}

	/// Checks that at most one tab is active, exactly one when any exist,
	/// and that only the active tab's surface is attached.
	pub fn assert_active_invariant(&self) {
		let orchestrator = self.shell.orchestrator();
		let active: Vec<_> = orchestrator.tabs().into_iter().filter(|t| t.is_active).collect();
		if orchestrator.is_empty() {
			assert!(active.is_empty(), "no tab may be active in an empty set");
			assert!(orchestrator.active_tab_id().is_none());
		} else {
			assert_eq!(active.len(), 1, "exactly one tab must be active");
			assert_eq!(orchestrator.active_tab_id(), Some(active[0].id.as_str()));
			assert_eq!(self.attached_tabs(), vec![active[0].id.clone()]);
		}
	}
}
