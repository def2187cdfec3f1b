//! Proxy entitlement gate.

use std::sync::Arc;

use tracing::info;

/// Path the gate redirects to when no entitlement is configured.
pub const DEFAULT_REDIRECT_PATH: &str = "/upgrade";

/// External source of proxy entitlement.
pub trait SubscriptionProvider: Send + Sync {
	/// Whether the user currently holds a valid proxy entitlement.
	fn has_valid_proxy_entitlement(&self) -> bool;

	/// Path, relative to the base URL, opened instead of a denied proxy tab.
	fn redirect_path(&self) -> String {
		DEFAULT_REDIRECT_PATH.to_string()
	}
}

/// Fixed entitlement answer.
#[derive(Debug, Clone)]
pub struct StaticSubscription {
	entitled: bool,
	redirect_path: String,
}

impl StaticSubscription {
	pub fn entitled() -> Self {
		Self {
			entitled: true,
			redirect_path: DEFAULT_REDIRECT_PATH.to_string(),
		}
	}

	/// Denies proxy tabs and redirects to `path`.
	pub fn denied(path: impl Into<String>) -> Self {
		Self {
			entitled: false,
			redirect_path: path.into(),
		}
	}
}

impl Default for StaticSubscription {
	fn default() -> Self {
		Self::entitled()
	}
}

impl SubscriptionProvider for StaticSubscription {
	fn has_valid_proxy_entitlement(&self) -> bool {
		self.entitled
	}

	fn redirect_path(&self) -> String {
		self.redirect_path.clone()
	}
}

/// Outcome of an entitlement check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
	Allowed,
	/// Open this path instead of the requested proxy tab.
	Redirect(String),
}

/// Checks proxy entitlement before a proxied tab is created.
#[derive(Clone)]
pub struct PermissionGate {
	provider: Arc<dyn SubscriptionProvider>,
}

impl PermissionGate {
	pub fn new(provider: Arc<dyn SubscriptionProvider>) -> Self {
		Self { provider }
	}

	pub fn check(&self) -> GateDecision {
		if self.provider.has_valid_proxy_entitlement() {
			GateDecision::Allowed
		} else {
			let path = self.provider.redirect_path();
			info!(redirect = %path, "Proxy entitlement missing");
			GateDecision::Redirect(path)
		}
	}
}

impl Default for PermissionGate {
	fn default() -> Self {
		Self::new(Arc::new(StaticSubscription::entitled()))
	}
}
