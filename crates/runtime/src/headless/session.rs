use std::path::PathBuf;

use parking_lot::Mutex;

use crate::engine::{
	BoxFuture, NetworkSession, PermissionHandler, ProxyRules, RequestDetails,
	RequestHeaderInterceptor, RequestHeaders, ResourceType, ResponseHeaderRewriter,
	ResponseHeaders,
};
use crate::error::Result;

#[derive(Default)]
struct SessionState {
	user_agent: String,
	permission_handler: Option<PermissionHandler>,
	request_interceptor: Option<RequestHeaderInterceptor>,
	response_rewriter: Option<ResponseHeaderRewriter>,
	protocols: Vec<(String, PathBuf)>,
	proxy: Option<ProxyRules>,
	user_agent_writes: usize,
	proxy_writes: usize,
	clears: usize,
}

/// In-memory network session. Handlers are stored and can be driven by tests.
pub struct HeadlessSession {
	partition: String,
	state: Mutex<SessionState>,
}

impl HeadlessSession {
	pub(crate) fn new(partition: &str) -> Self {
		Self {
			partition: partition.to_string(),
			state: Mutex::new(SessionState::default()),
		}
	}

	/// Runs the permission handler. Without a handler every request is granted.
	pub fn check_permission(&self, permission: &str) -> bool {
		let handler = self.state.lock().permission_handler.clone();
		handler.is_none_or(|h| h(permission))
	}

	/// Runs the request interceptor over an empty header set for `url`.
	pub fn intercept_request(&self, url: &str, resource_type: ResourceType) -> RequestHeaders {
		let interceptor = self.state.lock().request_interceptor.clone();
		let mut headers = RequestHeaders::new();
		if let Some(interceptor) = interceptor {
			let details = RequestDetails {
				url: url.to_string(),
				resource_type,
			};
			interceptor(&details, &mut headers);
		}
		headers
	}

	/// Runs the response rewriter over `headers` for `url`.
	pub fn rewrite_response(
		&self,
		url: &str,
		resource_type: ResourceType,
		mut headers: ResponseHeaders,
	) -> ResponseHeaders {
		let rewriter = self.state.lock().response_rewriter.clone();
		if let Some(rewriter) = rewriter {
			let details = RequestDetails {
				url: url.to_string(),
				resource_type,
			};
			rewriter(&details, &mut headers);
		}
		headers
	}

	pub fn has_request_interceptor(&self) -> bool {
		self.state.lock().request_interceptor.is_some()
	}

	pub fn proxy(&self) -> Option<ProxyRules> {
		self.state.lock().proxy.clone()
	}

	pub fn protocols(&self) -> Vec<(String, PathBuf)> {
		self.state.lock().protocols.clone()
	}

	/// Number of times the user agent was written.
	pub fn user_agent_writes(&self) -> usize {
		self.state.lock().user_agent_writes
	}

	pub fn proxy_writes(&self) -> usize {
		self.state.lock().proxy_writes
	}

	pub fn clears(&self) -> usize {
		self.state.lock().clears
	}
}

impl NetworkSession for HeadlessSession {
	fn partition(&self) -> &str {
		&self.partition
	}

	fn set_user_agent(&self, user_agent: &str) {
		let mut state = self.state.lock();
		state.user_agent = user_agent.to_string();
		state.user_agent_writes += 1;
	}

	fn user_agent(&self) -> String {
		self.state.lock().user_agent.clone()
	}

	fn set_permission_handler(&self, handler: PermissionHandler) {
		self.state.lock().permission_handler = Some(handler);
	}

	fn set_request_header_interceptor(&self, interceptor: Option<RequestHeaderInterceptor>) {
		self.state.lock().request_interceptor = interceptor;
	}

	fn set_response_header_rewriter(&self, rewriter: Option<ResponseHeaderRewriter>) {
		self.state.lock().response_rewriter = rewriter;
	}

	fn register_file_protocol(&self, scheme: &str, root: PathBuf) -> Result<()> {
		let mut state = self.state.lock();
		state.protocols.retain(|(s, _)| s != scheme);
		state.protocols.push((scheme.to_string(), root));
		Ok(())
	}

	fn set_proxy(&self, rules: ProxyRules) -> BoxFuture<Result<()>> {
		let mut state = self.state.lock();
		state.proxy = Some(rules);
		state.proxy_writes += 1;
		Box::pin(std::future::ready(Ok(())))
	}

	fn clear_storage(&self) -> BoxFuture<Result<()>> {
		self.state.lock().clears += 1;
		Box::pin(std::future::ready(Ok(())))
	}
}
