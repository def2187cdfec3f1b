//! The single-threaded control queue.
//!
//! Engine callbacks, window events, commands and asynchronous completions
//! are all posted as [`ControlEvent`]s and applied one at a time by the
//! [`Shell`](crate::Shell). Asynchronous work is started with
//! [`ControlSender::spawn`], whose completion is posted back as another
//! event; the shell checks that the target tab still exists before
//! applying it.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::Value;
use tabwright_protocol::{Command, TabId};
use tabwright_runtime::{EngineEvent, EventSink};
use tokio::sync::{mpsc, oneshot};

use crate::error::Result;
use crate::satellite::SatelliteKind;

/// Main window geometry change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEvent {
	Resized,
	Moved,
}

/// Reply channel of a command.
pub type Reply = oneshot::Sender<Result<Value>>;

/// Everything the control loop reacts to.
#[derive(Debug)]
pub enum ControlEvent {
	/// A command from the control surface.
	Command { command: Command, reply: Option<Reply> },
	/// An engine event raised by a tab surface.
	Tab { tab_id: TabId, instance: u64, event: EngineEvent },
	/// An engine event raised by a satellite surface.
	Satellite { kind: SatelliteKind, event: EngineEvent },
	Window(WindowEvent),
	/// The engine rejected a load call.
	LoadRejected { tab_id: TabId, instance: u64, url: String, message: String },
	/// Metadata extraction finished.
	MetaExtracted {
		tab_id: TabId,
		instance: u64,
		url: String,
		result: std::result::Result<Value, String>,
	},
	/// A page asked to open a foreground window; it was denied and should
	/// become a tab instead.
	WindowOpenDenied { tab_id: TabId, url: String },
}

/// Decrements the in-flight counter even if the task panics or is cancelled.
struct InFlight(Arc<AtomicUsize>);

impl InFlight {
	fn enter(counter: &Arc<AtomicUsize>) -> Self {
		counter.fetch_add(1, Ordering::SeqCst);
		Self(Arc::clone(counter))
	}
}

impl Drop for InFlight {
	fn drop(&mut self) {
		self.0.fetch_sub(1, Ordering::SeqCst);
	}
}

/// Cloneable handle posting into the control queue.
#[derive(Clone, Debug)]
pub struct ControlSender {
	tx: mpsc::UnboundedSender<ControlEvent>,
	in_flight: Arc<AtomicUsize>,
}

impl ControlSender {
	/// Posts `event`. Returns false if the control loop is gone.
	pub fn post(&self, event: ControlEvent) -> bool {
		self.tx.send(event).is_ok()
	}

	/// Runs `task` in the background and posts its result, if any.
	pub fn spawn<F>(&self, task: F)
	where
		F: Future<Output = Option<ControlEvent>> + Send + 'static,
	{
		let guard = InFlight::enter(&self.in_flight);
		let sender = self.clone();
		tokio::spawn(async move {
			if let Some(event) = task.await {
				sender.post(event);
			}
			drop(guard);
		});
	}

	/// Number of spawned tasks that have not completed.
	pub fn in_flight(&self) -> usize {
		self.in_flight.load(Ordering::SeqCst)
	}

	/// Sink tagging a tab surface's events with its owner.
	pub fn tab_sink(&self, tab_id: &str, instance: u64) -> EventSink {
		let sender = self.clone();
		let tab_id = tab_id.to_string();
		EventSink::new(move |event| {
			sender.post(ControlEvent::Tab {
				tab_id: tab_id.clone(),
				instance,
				event,
			});
		})
	}

	/// Sink tagging a satellite surface's events with its kind.
	pub fn satellite_sink(&self, kind: SatelliteKind) -> EventSink {
		let sender = self.clone();
		EventSink::new(move |event| {
			sender.post(ControlEvent::Satellite { kind, event });
		})
	}
}

/// Receiving half of the control queue.
#[derive(Debug)]
pub struct ControlReceiver {
	rx: mpsc::UnboundedReceiver<ControlEvent>,
}

impl ControlReceiver {
	pub async fn recv(&mut self) -> Option<ControlEvent> {
		self.rx.recv().await
	}

	pub fn try_recv(&mut self) -> Option<ControlEvent> {
		self.rx.try_recv().ok()
	}
}

/// Creates a control queue.
pub fn channel() -> (ControlSender, ControlReceiver) {
	let (tx, rx) = mpsc::unbounded_channel();
	(
		ControlSender {
			tx,
			in_flight: Arc::new(AtomicUsize::new(0)),
		},
		ControlReceiver { rx },
	)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_spawn_posts_result_and_tracks_in_flight() {
		let (sender, mut receiver) = channel();
		let (release, wait) = oneshot::channel::<()>();

		sender.spawn(async move {
			let _ = wait.await;
			Some(ControlEvent::Window(WindowEvent::Moved))
		});
		assert_eq!(sender.in_flight(), 1);

		release.send(()).unwrap();
		let event = receiver.recv().await.unwrap();
		assert!(matches!(event, ControlEvent::Window(WindowEvent::Moved)));
		while sender.in_flight() > 0 {
			tokio::task::yield_now().await;
		}
	}

	#[test]
	fn test_tab_sink_tags_events() {
		let (sender, mut receiver) = channel();
		sender.tab_sink("tab-1", 7).emit(EngineEvent::StartLoading);

		match receiver.try_recv() {
			Some(ControlEvent::Tab { tab_id, instance, event }) => {
				assert_eq!(tab_id, "tab-1");
				assert_eq!(instance, 7);
				assert_eq!(event, EngineEvent::StartLoading);
			}
			other => panic!("unexpected {other:?}"),
		}
	}
}
