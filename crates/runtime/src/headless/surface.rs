use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{Value, json};
use tabwright_protocol::{HttpStatus, Rect};
use tracing::trace;

use super::Behavior;
use crate::engine::{
	BoxFuture, EventSink, LoginHandler, MemoryInfo, PopupSpec, Surface, SurfaceId, SurfaceSpec,
	WindowOpenHandler,
};
use crate::error::{Error, Result};
use crate::event::{
	Credentials, EngineEvent, LoadFailure, LoginRequest, WindowDisposition, WindowOpenAction,
	WindowOpenRequest,
};

#[derive(Default)]
struct SurfaceState {
	history: Vec<String>,
	index: usize,
	title: String,
	bounds: Rect,
	visible: bool,
	focus_count: usize,
	destroyed: bool,
	loads: Vec<String>,
	sent: Vec<(String, Value)>,
	scripts_run: usize,
	memory_samples: usize,
	window_open_handler: Option<WindowOpenHandler>,
	login_handler: Option<LoginHandler>,
}

impl SurfaceState {
	fn current_url(&self) -> String {
		self.history.get(self.index).cloned().unwrap_or_default()
	}
}

/// In-memory surface created by [`HeadlessEngine`](super::HeadlessEngine).
pub struct HeadlessSurface {
	id: SurfaceId,
	label: String,
	partition: Option<String>,
	user_agent: String,
	preload: bool,
	events: EventSink,
	behavior: Arc<Mutex<Behavior>>,
	state: Mutex<SurfaceState>,
}

impl HeadlessSurface {
	pub(crate) fn tab(id: SurfaceId, spec: SurfaceSpec, behavior: Arc<Mutex<Behavior>>) -> Self {
		let mut user_agent = spec.session.user_agent();
		if let Some(suffix) = &spec.user_agent_suffix {
			user_agent.push_str(suffix);
		}
		Self {
			id,
			label: spec.label,
			partition: Some(spec.session.partition().to_string()),
			user_agent,
			preload: spec.preload,
			events: spec.events,
			behavior,
			state: Mutex::new(SurfaceState::default()),
		}
	}

	pub(crate) fn popup(id: SurfaceId, spec: PopupSpec, behavior: Arc<Mutex<Behavior>>) -> Self {
		Self {
			id,
			label: spec.label,
			partition: None,
			user_agent: String::new(),
			preload: false,
			events: spec.events,
			behavior,
			state: Mutex::new(SurfaceState {
				visible: spec.visible,
				..Default::default()
			}),
		}
	}

	pub fn label(&self) -> &str {
		&self.label
	}

	/// Partition of the session the surface was bound to. `None` for popups.
	pub fn partition(&self) -> Option<&str> {
		self.partition.as_deref()
	}

	/// Effective user agent including the per-surface suffix.
	pub fn user_agent(&self) -> &str {
		&self.user_agent
	}

	pub fn has_preload(&self) -> bool {
		self.preload
	}

	/// Every URL passed to [`Surface::load_url`], in call order.
	pub fn loads(&self) -> Vec<String> {
		self.state.lock().loads.clone()
	}

	/// Every IPC message sent into the page, in call order.
	pub fn sent(&self) -> Vec<(String, Value)> {
		self.state.lock().sent.clone()
	}

	pub fn scripts_run(&self) -> usize {
		self.state.lock().scripts_run
	}

	/// Number of memory samples taken, including failed ones.
	pub fn memory_samples(&self) -> usize {
		self.state.lock().memory_samples
	}

	pub fn focus_count(&self) -> usize {
		self.state.lock().focus_count
	}

	/// Emits `event` as if the engine raised it.
	pub fn emit(&self, event: EngineEvent) {
		self.events.emit(event);
	}

	/// Simulates the page calling `window.open(url)`.
	///
	/// Returns `None` if no handler is installed.
	pub fn request_window_open(
		&self,
		url: &str,
		disposition: WindowDisposition,
	) -> Option<WindowOpenAction> {
		let handler = self.state.lock().window_open_handler.clone()?;
		Some(handler(&WindowOpenRequest {
			url: url.to_string(),
			disposition,
		}))
	}

	/// Simulates an authentication challenge.
	///
	/// Returns `None` if no handler is installed or the handler declined.
	pub fn request_login(&self, request: &LoginRequest) -> Option<Credentials> {
		let handler = self.state.lock().login_handler.clone()?;
		handler(request)
	}

	fn commit(&self, url: &str) {
		let title = self
			.behavior
			.lock()
			.title(url)
			.unwrap_or_else(|| default_title(url));
		self.state.lock().title = title.clone();

		self.events.emit(EngineEvent::StartLoading);
		self.events.emit(EngineEvent::Navigated {
			url: url.to_string(),
			http_status: Some(HttpStatus::new(200, "OK")),
		});
		self.events.emit(EngineEvent::TitleUpdated { title });
		self.events.emit(EngineEvent::FinishLoad);
		self.events.emit(EngineEvent::StopLoading);
	}

	fn navigate_history(&self, step: isize) {
		let url = {
			let mut state = self.state.lock();
			if state.destroyed {
				return;
			}
			let Some(index) = state.index.checked_add_signed(step) else {
				return;
			};
			if index >= state.history.len() {
				return;
			}
			state.index = index;
			state.current_url()
		};
		self.commit(&url);
	}
}

fn default_title(url: &str) -> String {
	url::Url::parse(url)
		.ok()
		.and_then(|u| u.host_str().map(str::to_string))
		.unwrap_or_else(|| url.to_string())
}

fn ready<T: Send + 'static>(value: T) -> BoxFuture<T> {
	Box::pin(std::future::ready(value))
}

impl Surface for HeadlessSurface {
	fn id(&self) -> SurfaceId {
		self.id
	}

	fn load_url(&self, url: &str) -> BoxFuture<Result<()>> {
		{
			let mut state = self.state.lock();
			if state.destroyed {
				return ready(Err(Error::SurfaceDestroyed(self.id)));
			}
			state.loads.push(url.to_string());
		}
		trace!(id = %self.id, url, "load_url");

		let (rejected, failure) = {
			let behavior = self.behavior.lock();
			(behavior.rejects(url), behavior.failure(url))
		};
		if rejected {
			return ready(Err(Error::Load {
				url: url.to_string(),
				message: "navigation rejected".to_string(),
			}));
		}
		if let Some(failure) = failure {
			self.events.emit(EngineEvent::StartLoading);
			self.events.emit(EngineEvent::LoadFailed(LoadFailure {
				url: url.to_string(),
				..failure
			}));
			self.events.emit(EngineEvent::StopLoading);
			return ready(Ok(()));
		}

		{
			let mut state = self.state.lock();
			let keep = if state.history.is_empty() { 0 } else { state.index + 1 };
			state.history.truncate(keep);
			state.history.push(url.to_string());
			state.index = state.history.len() - 1;
		}
		self.commit(url);
		ready(Ok(()))
	}

	fn url(&self) -> String {
		self.state.lock().current_url()
	}

	fn title(&self) -> String {
		self.state.lock().title.clone()
	}

	fn can_go_back(&self) -> bool {
		let state = self.state.lock();
		!state.history.is_empty() && state.index > 0
	}

	fn can_go_forward(&self) -> bool {
		let state = self.state.lock();
		state.index + 1 < state.history.len()
	}

	fn go_back(&self) {
		self.navigate_history(-1);
	}

	fn go_forward(&self) {
		self.navigate_history(1);
	}

	fn reload(&self) {
		let url = {
			let state = self.state.lock();
			if state.destroyed || state.history.is_empty() {
				return;
			}
			state.current_url()
		};
		self.commit(&url);
	}

	fn set_bounds(&self, bounds: Rect) {
		self.state.lock().bounds = bounds;
	}

	fn bounds(&self) -> Rect {
		self.state.lock().bounds
	}

	fn set_visible(&self, visible: bool) {
		self.state.lock().visible = visible;
	}

	fn is_visible(&self) -> bool {
		self.state.lock().visible
	}

	fn focus(&self) {
		self.state.lock().focus_count += 1;
	}

	fn execute_script(&self, _script: &str) -> BoxFuture<Result<Value>> {
		let (url, title) = {
			let mut state = self.state.lock();
			if state.destroyed {
				return ready(Err(Error::SurfaceDestroyed(self.id)));
			}
			state.scripts_run += 1;
			(state.current_url(), state.title.clone())
		};
		let (result, delay) = {
			let behavior = self.behavior.lock();
			let result = if behavior.script_fails(&url) {
				Err(Error::Script(format!("script failed on {url}")))
			} else {
				Ok(behavior.page(&url).unwrap_or_else(|| {
					json!({
						"title": title,
						"url": url,
						"description": "",
						"keywords": "",
						"favicon": null,
						"icons": [],
					})
				}))
			};
			(result, behavior.script_delay())
		};
		match delay {
			Some(delay) => Box::pin(async move {
				tokio::time::sleep(delay).await;
				result
			}),
			None => ready(result),
		}
	}

	fn memory_info(&self) -> BoxFuture<Result<MemoryInfo>> {
		{
			let mut state = self.state.lock();
			state.memory_samples += 1;
			if state.destroyed {
				return ready(Err(Error::SurfaceDestroyed(self.id)));
			}
		}
		let sample = self.behavior.lock().memory();
		ready(match sample {
			Some(bytes) => Ok(MemoryInfo {
				private_bytes: bytes,
				shared_bytes: 0,
			}),
			None => Err(Error::Script("process metrics unavailable".to_string())),
		})
	}

	fn send(&self, channel: &str, payload: Value) {
		let mut state = self.state.lock();
		if !state.destroyed {
			state.sent.push((channel.to_string(), payload));
		}
	}

	fn set_window_open_handler(&self, handler: WindowOpenHandler) {
		self.state.lock().window_open_handler = Some(handler);
	}

	fn set_login_handler(&self, handler: LoginHandler) {
		self.state.lock().login_handler = Some(handler);
	}

	fn destroy(&self) {
		let mut state = self.state.lock();
		state.destroyed = true;
		state.visible = false;
		state.window_open_handler = None;
		state.login_handler = None;
	}

	fn is_destroyed(&self) -> bool {
		self.state.lock().destroyed
	}
}
