//! Engine events to tab state.
//!
//! Each tab owns a [`NavigationBridge`]: a small state machine
//! (`Idle -> Loading -> Ready | Error`) that turns the surface's lifecycle
//! events into [`TabStateStore`] updates, classifies failures, starts
//! metadata extraction after a load, and redirects new-window requests into
//! the tab model.

pub mod classify;
pub mod meta;
pub mod monitor;

use std::sync::Arc;

use serde_json::Value;
use tabwright_protocol::{
	ErrorDetails, ErrorInfo, ErrorKind, MessageType, SurfaceKind, TabId, TabStatePatch,
};
use tabwright_runtime::{
	EngineEvent, LoadFailure, Surface, WindowDisposition, WindowOpenAction, WindowOpenRequest,
};
use tracing::{debug, trace, warn};

use crate::control::{ControlEvent, ControlSender};
use crate::proxy::ProxyResolver;
use crate::state::{TabStateStore, now_millis};
use crate::url::BLANK;

/// Load phase of a tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
	#[default]
	Idle,
	Loading,
	Ready,
	Error,
}

/// Per-tab event translator.
#[derive(Debug)]
pub struct NavigationBridge {
	tab_id: TabId,
	instance: u64,
	kind: SurfaceKind,
	phase: Phase,
	/// A main-frame navigation has committed; the surface shows content.
	committed: bool,
	pending_error: bool,
}

impl NavigationBridge {
	pub fn new(tab_id: impl Into<TabId>, instance: u64, kind: SurfaceKind) -> Self {
		Self {
			tab_id: tab_id.into(),
			instance,
			kind,
			phase: Phase::Idle,
			committed: false,
			pending_error: false,
		}
	}

	pub fn phase(&self) -> Phase {
		self.phase
	}

	pub fn kind(&self) -> SurfaceKind {
		self.kind
	}

	/// Changes the surface kind used to decide metadata extraction.
	pub fn set_kind(&mut self, kind: SurfaceKind) {
		self.kind = kind;
	}

	/// Installs the surface handlers: new-window interception and proxy login.
	pub fn wire(&self, surface: &dyn Surface, control: &ControlSender, proxy: &ProxyResolver) {
		let control = control.clone();
		let tab_id = self.tab_id.clone();
		surface.set_window_open_handler(Arc::new(move |request: &WindowOpenRequest| {
			if request.url == BLANK || request.disposition != WindowDisposition::ForegroundTab {
				return WindowOpenAction::Allow;
			}
			debug!(tab_id = %tab_id, url = %request.url, "Redirecting new window into a tab");
			control.post(ControlEvent::WindowOpenDenied {
				tab_id: tab_id.clone(),
				url: request.url.clone(),
			});
			WindowOpenAction::Deny
		}));
		surface.set_login_handler(proxy.login_handler());
	}

	/// Applies one engine event.
	pub fn on_event(
		&mut self,
		event: EngineEvent,
		surface: &Arc<dyn Surface>,
		store: &mut TabStateStore,
		control: &ControlSender,
	) {
		trace!(tab_id = %self.tab_id, ?event, phase = ?self.phase, "Tab event");
		match event {
			EngineEvent::StartLoading => {
				self.phase = Phase::Loading;
				self.pending_error = false;
				store.update(
					&self.tab_id,
					TabStatePatch::new().loading(true).clear_error(),
					MessageType::TabLoadingState,
				);
			}
			EngineEvent::StopLoading => {
				let patch = if self.pending_error {
					self.phase = Phase::Error;
					TabStatePatch::new().loading(false)
				} else {
					self.phase = Phase::Ready;
					TabStatePatch::new().loading(false).clear_error()
				};
				store.update(&self.tab_id, patch, MessageType::TabLoadingState);
			}
			EngineEvent::Navigated { url, http_status } => {
				self.committed = true;
				store.update(
					&self.tab_id,
					TabStatePatch::new().url(url).http_status(http_status),
					MessageType::TabUrlUpdated,
				);
			}
			EngineEvent::TitleUpdated { title } => {
				store.update(
					&self.tab_id,
					TabStatePatch::new().title(title),
					MessageType::TabTitleUpdated,
				);
			}
			EngineEvent::FinishLoad => {
				if !self.kind.is_shell_owned() {
					self.extract_meta(surface, control);
				}
			}
			EngineEvent::LoadFailed(failure) => self.on_load_failed(&failure, store),
			EngineEvent::RendererGone { reason } => {
				warn!(tab_id = %self.tab_id, reason = %reason, "Renderer gone");
				self.fail(classify::renderer_gone(&reason, &surface.url()), store);
			}
			EngineEvent::FocusLost => {}
		}
	}

	fn on_load_failed(&mut self, failure: &LoadFailure, store: &mut TabStateStore) {
		if !failure.is_main_frame {
			trace!(tab_id = %self.tab_id, url = %failure.url, "Ignoring sub-frame failure");
			return;
		}
		if self.committed && classify::is_abort(&failure.error) {
			debug!(tab_id = %self.tab_id, url = %failure.url, "Ignoring aborted load over visible content");
			return;
		}
		let info = classify::classify(failure);
		warn!(
			tab_id = %self.tab_id,
			kind = %info.kind,
			code = %failure.error,
			url = %failure.url,
			"Load failed"
		);
		self.fail(info, store);
	}

	fn fail(&mut self, info: ErrorInfo, store: &mut TabStateStore) {
		self.phase = Phase::Error;
		self.pending_error = true;
		store.update(
			&self.tab_id,
			TabStatePatch::new().error(info).loading(false),
			MessageType::TabRequestError,
		);
	}

	fn extract_meta(&self, surface: &Arc<dyn Surface>, control: &ControlSender) {
		let url = surface.url();
		let script = surface.execute_script(meta::META_SCRIPT);
		let tab_id = self.tab_id.clone();
		let instance = self.instance;
		control.spawn(async move {
			let result = script.await.map_err(|e| e.to_string());
			Some(ControlEvent::MetaExtracted {
				tab_id,
				instance,
				url,
				result,
			})
		});
	}

	/// Applies a finished metadata extraction started for `url`.
	///
	/// Results for a URL the surface has since navigated away from are dropped.
	pub fn on_meta(
		&mut self,
		url: &str,
		result: std::result::Result<Value, String>,
		surface: &Arc<dyn Surface>,
		store: &mut TabStateStore,
	) {
		if surface.url() != url {
			debug!(tab_id = %self.tab_id, url, "Dropping stale page metadata");
			return;
		}
		let patch = result.and_then(|value| meta::page_patch(value, url));
		let patch = match patch {
			Ok(patch) => patch,
			Err(message) => {
				warn!(tab_id = %self.tab_id, url, error = %message, "Page metadata extraction failed");
				TabStatePatch::new()
					.error(ErrorInfo::described(ErrorKind::MetaFetchError, message))
					.loading(false)
			}
		};
		store.update(&self.tab_id, patch, MessageType::TabStateChanged);
	}

	/// Applies a rejected load call.
	pub fn on_load_rejected(&mut self, url: &str, message: &str, store: &mut TabStateStore) {
		if self.committed {
			debug!(tab_id = %self.tab_id, url, error = message, "Ignoring rejected load over visible content");
			return;
		}
		warn!(tab_id = %self.tab_id, url, error = message, "Load rejected");
		let info = ErrorInfo {
			kind: ErrorKind::LoadError,
			error_type: None,
			description: Some(message.to_string()),
			details: Some(ErrorDetails {
				url: url.to_string(),
				error: message.to_string(),
				error_code: None,
				error_description: None,
				timestamp: now_millis(),
			}),
		};
		self.phase = Phase::Error;
		self.pending_error = true;
		store.update(
			&self.tab_id,
			TabStatePatch::new().error(info).loading(false),
			MessageType::TabStateChanged,
		);
	}
}
