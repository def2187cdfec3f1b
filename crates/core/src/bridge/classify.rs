//! Classification of engine error codes.

use tabwright_protocol::{
	BrowserErrorType, ErrorDetails, ErrorInfo, ErrorKind, ErrorType, ProxyErrorType,
};
use tabwright_runtime::LoadFailure;

use crate::state::now_millis;

/// Returns true for failures attributable to the proxy.
pub fn is_proxy_error(code: &str) -> bool {
	code.contains("ERR_PROXY_") || code.contains("ERR_TUNNEL_")
}

/// Returns true for cancelled navigations.
pub fn is_abort(code: &str) -> bool {
	code.contains("ERR_ABORTED")
}

pub fn proxy_error_type(code: &str) -> ProxyErrorType {
	if code.contains("ERR_PROXY_CONNECTION_FAILED") {
		ProxyErrorType::ConnectionFailed
	} else if code.contains("ERR_TUNNEL_CONNECTION_FAILED") {
		ProxyErrorType::TunnelFailed
	} else if code.contains("ERR_PROXY_AUTH_FAILED") {
		ProxyErrorType::AuthFailed
	} else {
		ProxyErrorType::Unknown
	}
}

pub fn browser_error_type(code: &str) -> BrowserErrorType {
	const TABLE: &[(&str, BrowserErrorType)] = &[
		("TIMED_OUT", BrowserErrorType::Timeout),
		("REFUSED", BrowserErrorType::ConnectionRefused),
		("RESET", BrowserErrorType::ConnectionReset),
		("NAME_NOT_RESOLVED", BrowserErrorType::DnsFailed),
		("CERT_", BrowserErrorType::CertificateError),
		("SSL_", BrowserErrorType::SslError),
		("FILE_NOT_FOUND", BrowserErrorType::NotFound),
		("ABORTED", BrowserErrorType::Aborted),
	];
	TABLE
		.iter()
		.find(|(needle, _)| code.contains(needle))
		.map(|(_, kind)| *kind)
		.unwrap_or(BrowserErrorType::Unknown)
}

/// Builds the error record for a failed main-frame load.
pub fn classify(failure: &LoadFailure) -> ErrorInfo {
	let (kind, error_type) = if is_proxy_error(&failure.error) {
		(ErrorKind::ProxyError, ErrorType::Proxy(proxy_error_type(&failure.error)))
	} else {
		(ErrorKind::BrowserError, ErrorType::Browser(browser_error_type(&failure.error)))
	};
	let description = (!failure.description.is_empty()).then(|| failure.description.clone());
	ErrorInfo {
		kind,
		error_type: Some(error_type),
		description: description.clone(),
		details: Some(ErrorDetails {
			url: failure.url.clone(),
			error: failure.error.clone(),
			error_code: failure.error_code,
			error_description: description,
			timestamp: now_millis(),
		}),
	}
}

/// Builds the error record for a crashed renderer.
pub fn renderer_gone(reason: &str, url: &str) -> ErrorInfo {
	ErrorInfo {
		kind: ErrorKind::BrowserError,
		error_type: Some(ErrorType::Browser(BrowserErrorType::Unknown)),
		description: Some(reason.to_string()),
		details: Some(ErrorDetails {
			url: url.to_string(),
			error: "RENDERER_GONE".to_string(),
			error_code: None,
			error_description: Some(reason.to_string()),
			timestamp: now_millis(),
		}),
	}
}
