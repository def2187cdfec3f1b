//! Canonical per-tab state.
//!
//! Every mutation goes through [`TabStateStore::update`], which merges a
//! [`TabStatePatch`], stamps the snapshot and queues an [`Envelope`] for the
//! control surface. Queued envelopes are drained by the shell after each
//! control event. Removing a tab discards its queued envelopes, and updates
//! for unknown tabs are dropped, so nothing is ever published for a closed tab.

use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};

use indexmap::IndexMap;
use tabwright_protocol::{Envelope, MessageType, TabId, TabState, TabStatePatch};
use tracing::trace;

/// Current Unix time in milliseconds.
pub fn now_millis() -> u64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map(|d| d.as_millis() as u64)
		.unwrap_or_default()
}

#[derive(Debug, Default)]
pub struct TabStateStore {
	states: IndexMap<TabId, TabState>,
	outbox: VecDeque<Envelope>,
}

impl TabStateStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates the snapshot for a new tab and publishes it as `kind`.
	///
	/// An existing snapshot with the same id is replaced.
	pub fn seed(&mut self, tab_id: &str, patch: TabStatePatch, kind: MessageType) -> &TabState {
		self.states.shift_remove(tab_id);
		self.states.insert(tab_id.to_string(), TabState::new(tab_id));
		self.merge(tab_id, patch, kind)
			.expect("snapshot inserted above")
	}

	/// Merges `patch` onto the tab's snapshot and publishes it as `kind`.
	///
	/// Returns `None` without publishing if the tab is unknown.
	pub fn update(
		&mut self,
		tab_id: &str,
		patch: TabStatePatch,
		kind: MessageType,
	) -> Option<&TabState> {
		if !self.states.contains_key(tab_id) {
			trace!(tab_id, %kind, "Dropping update for unknown tab");
			return None;
		}
		self.merge(tab_id, patch, kind)
	}

	fn merge(&mut self, tab_id: &str, patch: TabStatePatch, kind: MessageType) -> Option<&TabState> {
		let state = self.states.get_mut(tab_id)?;
		patch.apply_to(state);
		if state.navigating {
			state.url.clear();
		}
		state.last_updated = now_millis().max(state.last_updated);
		self.outbox.push_back(Envelope::tab(kind, state.clone()));
		Some(state)
	}

	pub fn get(&self, tab_id: &str) -> Option<&TabState> {
		self.states.get(tab_id)
	}

	/// All snapshots in creation order.
	pub fn get_all(&self) -> Vec<TabState> {
		self.states.values().cloned().collect()
	}

	/// Removes the snapshot and cancels its pending notifications.
	pub fn remove(&mut self, tab_id: &str) -> Option<TabState> {
		self.outbox.retain(|env| env.tab_id().is_none_or(|id| id != tab_id));
		self.states.shift_remove(tab_id)
	}

	pub fn contains(&self, tab_id: &str) -> bool {
		self.states.contains_key(tab_id)
	}

	pub fn len(&self) -> usize {
		self.states.len()
	}

	pub fn is_empty(&self) -> bool {
		self.states.is_empty()
	}

	/// Queues a notification that does not carry a tab snapshot.
	pub fn publish(&mut self, envelope: Envelope) {
		self.outbox.push_back(envelope);
	}

	/// Takes every queued notification in publication order.
	pub fn drain_notifications(&mut self) -> Vec<Envelope> {
		self.outbox.drain(..).collect()
	}

	/// Drops all snapshots and pending notifications.
	pub fn clear(&mut self) {
		self.states.clear();
		self.outbox.clear();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_update_merges_and_publishes() {
		let mut store = TabStateStore::new();
		store.seed(
			"t1",
			TabStatePatch::new().url("https://a.test/").title("New Tab"),
			MessageType::TabCreated,
		);
		let state = store
			.update("t1", TabStatePatch::new().title("A"), MessageType::TabTitleUpdated)
			.unwrap();
		assert_eq!(state.url, "https://a.test/");
		assert_eq!(state.title, "A");
		assert!(state.last_updated > 0);

		let sent = store.drain_notifications();
		assert_eq!(sent.len(), 2);
		assert_eq!(sent[0].kind, MessageType::TabCreated);
		assert_eq!(sent[1].kind, MessageType::TabTitleUpdated);
		assert_eq!(sent[1].tab_state().unwrap().title, "A");
		assert!(store.drain_notifications().is_empty());
	}

	#[test]
	fn test_navigating_forces_empty_url() {
		let mut store = TabStateStore::new();
		let state = store.seed(
			"nav",
			TabStatePatch::new().url("about:blank").navigating(true),
			MessageType::TabCreated,
		);
		assert_eq!(state.url, "");

		let state = store
			.update("nav", TabStatePatch::new().url("https://b.test/"), MessageType::TabUrlUpdated)
			.unwrap();
		assert_eq!(state.url, "");
	}

	#[test]
	fn test_remove_cancels_pending_notifications() {
		let mut store = TabStateStore::new();
		store.seed("a", TabStatePatch::new(), MessageType::TabCreated);
		store.seed("b", TabStatePatch::new(), MessageType::TabCreated);

		store.remove("a");
		let sent = store.drain_notifications();
		assert_eq!(sent.len(), 1);
		assert_eq!(sent[0].tab_id().map(String::as_str), Some("b"));
	}

	#[test]
	fn test_update_after_remove_is_dropped() {
		let mut store = TabStateStore::new();
		store.seed("a", TabStatePatch::new(), MessageType::TabCreated);
		store.remove("a");

		assert!(store.update("a", TabStatePatch::new().loading(true), MessageType::TabLoadingState).is_none());
		assert!(store.drain_notifications().is_empty());
		assert!(!store.contains("a"));
	}

	#[test]
	fn test_get_all_in_creation_order() {
		let mut store = TabStateStore::new();
		for id in ["x", "y", "z"] {
			store.seed(id, TabStatePatch::new(), MessageType::TabCreated);
		}
		store.remove("y");
		let ids: Vec<_> = store.get_all().into_iter().map(|s| s.id).collect();
		assert_eq!(ids, vec!["x", "z"]);
	}
}
