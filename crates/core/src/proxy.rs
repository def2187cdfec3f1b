//! Proxy configuration of tab sessions.
//!
//! [`ProxyResolver`] reads the current [`ProxyConfig`] from the
//! configuration provider and applies it to a session: fixed-server rules,
//! a bypass list for local addresses, and a request interceptor injecting
//! `Proxy-Authorization` when credentials are configured.

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use tabwright_protocol::ProxyConfig;
use tabwright_runtime::{
	BoxFuture, Credentials, LoginHandler, LoginRequest, NetworkSession, ProxyMode, ProxyRules,
	RequestDetails, RequestHeaders, Result,
};
use tracing::{debug, info};

use crate::config::ConfigProvider;

/// Hosts that never go through the proxy.
pub const BYPASS_RULES: &str = "<local>;localhost;127.0.0.1;*.local";

/// Header carrying proxy credentials.
pub const PROXY_AUTHORIZATION: &str = "Proxy-Authorization";

/// Compiled proxy bypass list.
///
/// `<local>` matches plain hostnames without a dot; other entries are glob
/// patterns over the host. Invalid patterns fall back to exact matching.
#[derive(Debug, Clone)]
pub struct BypassList {
	local: bool,
	patterns: Vec<glob::Pattern>,
}

impl BypassList {
	pub fn parse(rules: &str) -> Self {
		let mut local = false;
		let mut patterns = Vec::new();
		for rule in rules.split(';').map(str::trim).filter(|r| !r.is_empty()) {
			if rule == "<local>" {
				local = true;
				continue;
			}
			let pattern = glob::Pattern::new(rule)
				.or_else(|_| glob::Pattern::new(&glob::Pattern::escape(rule)));
			if let Ok(pattern) = pattern {
				patterns.push(pattern);
			}
		}
		Self { local, patterns }
	}

	pub fn matches_host(&self, host: &str) -> bool {
		let host = host.trim_start_matches('[').trim_end_matches(']');
		(self.local && !host.contains('.') && !host.contains(':'))
			|| self.patterns.iter().any(|p| p.matches(host))
	}

	/// Returns true if requests to `url` bypass the proxy. Unparseable URLs never do.
	pub fn matches_url(&self, url: &str) -> bool {
		url::Url::parse(url)
			.ok()
			.and_then(|u| u.host_str().map(|h| self.matches_host(h)))
			.unwrap_or(false)
	}
}

impl Default for BypassList {
	fn default() -> Self {
		Self::parse(BYPASS_RULES)
	}
}

/// `Basic` credentials value for `Proxy-Authorization`.
pub fn basic_auth(username: &str, password: &str) -> String {
	format!("Basic {}", BASE64.encode(format!("{username}:{password}")))
}

/// Applies proxy configuration to sessions.
#[derive(Clone)]
pub struct ProxyResolver {
	config: Arc<dyn ConfigProvider>,
}

impl ProxyResolver {
	pub fn new(config: Arc<dyn ConfigProvider>) -> Self {
		Self { config }
	}

	/// Current proxy configuration snapshot.
	pub fn current(&self) -> ProxyConfig {
		self.config.proxy_config()
	}

	/// Applies the current configuration to `session`.
	///
	/// Returns `None` when the proxy is disabled. Otherwise returns the
	/// pending rule application; the interceptor is already installed,
	/// replacing any previous one.
	pub fn configure(&self, session: &dyn NetworkSession) -> Option<BoxFuture<Result<()>>> {
		let config = self.current();
		if !config.enabled {
			debug!(partition = session.partition(), "Proxy is disabled");
			return None;
		}

		let rules = ProxyRules {
			mode: ProxyMode::FixedServers,
			proxy_rules: format!("http://{}", config.server()),
			bypass_rules: BYPASS_RULES.to_string(),
		};
		info!(
			partition = session.partition(),
			server = %config.server(),
			username = %config.masked_username(),
			"Applying proxy configuration"
		);

		let header = config
			.has_credentials()
			.then(|| basic_auth(&config.username, &config.password));
		let bypass = BypassList::default();
		session.set_request_header_interceptor(Some(Arc::new(
			move |details: &RequestDetails, headers: &mut RequestHeaders| {
				if let Some(value) = &header {
					if !bypass.matches_url(&details.url) {
						headers.insert(PROXY_AUTHORIZATION.to_string(), value.clone());
					}
				}
			},
		)));

		Some(session.set_proxy(rules))
	}

	/// Restores direct connections and removes the credentials interceptor.
	pub fn disable(&self, session: &dyn NetworkSession) -> BoxFuture<Result<()>> {
		info!(partition = session.partition(), "Disabling proxy");
		session.set_request_header_interceptor(None);
		session.set_proxy(ProxyRules::direct())
	}

	/// Handler answering proxy authentication challenges with the configured
	/// credentials. Other challenges are left to the engine.
	pub fn login_handler(&self) -> LoginHandler {
		let config = Arc::clone(&self.config);
		Arc::new(move |request: &LoginRequest| {
			if !request.is_proxy {
				return None;
			}
			let proxy = config.proxy_config();
			if !proxy.has_credentials() {
				return None;
			}
			debug!(host = %request.host, username = %proxy.masked_username(), "Answering proxy login");
			Some(Credentials::new(proxy.username, proxy.password))
		})
	}
}
