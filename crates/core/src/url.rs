//! Normalization of user-entered tab URLs.

/// Placeholder loaded for empty input and deferred navigations.
pub const BLANK: &str = "about:blank";

/// Normalizes `input` into a loadable URL.
///
/// - empty input becomes `about:blank`
/// - absolute URLs are kept as-is
/// - paths starting with `/` are resolved against `base_url`
/// - anything else containing `://` is kept; bare hosts get `https://`
pub fn normalize(input: &str, base_url: &str) -> String {
	let input = input.trim();
	if input.is_empty() {
		return BLANK.to_string();
	}
	if url::Url::parse(input).is_ok() {
		return input.to_string();
	}
	if input.starts_with('/') {
		return format!("{}{input}", base_url.trim_end_matches('/'));
	}
	if input.contains("://") {
		input.to_string()
	} else {
		format!("https://{input}")
	}
}
