//! Page metadata extraction.

use serde::Deserialize;
use serde_json::Value;
use tabwright_protocol::{PageMeta, TabStatePatch};

use crate::state::now_millis;

/// Script evaluated in the page after it finishes loading.
pub const META_SCRIPT: &str = r#"(() => {
	const content = (selector) => document.querySelector(selector)?.content;
	const href = (selector) => document.querySelector(selector)?.href;
	return {
		title: document.title,
		url: window.location.href,
		description: content('meta[name="description"]') || '',
		keywords: content('meta[name="keywords"]') || '',
		favicon: href('link[rel="icon"]')
			|| href('link[rel="shortcut icon"]')
			|| href('link[rel="apple-touch-icon"]')
			|| window.location.origin + '/favicon.ico',
		ogTitle: content('meta[property="og:title"]'),
		ogDescription: content('meta[property="og:description"]'),
		ogImage: content('meta[property="og:image"]'),
		icons: Array.from(document.querySelectorAll('link[rel*="icon"]')).map((link) => ({
			href: link.href,
			rel: link.rel,
			sizes: link.sizes?.value || '',
		})),
	};
})()"#;

#[derive(Debug, Deserialize)]
struct ExtractedPage {
	#[serde(default)]
	title: Option<String>,
	#[serde(default)]
	url: Option<String>,
	#[serde(flatten)]
	meta: PageMeta,
}

/// Turns a script result into a state patch.
///
/// `fallback_url` is the committed URL, used when the result carries none.
/// A missing favicon falls back to `/favicon.ico` on the page origin.
pub fn page_patch(value: Value, fallback_url: &str) -> Result<TabStatePatch, String> {
	let page: ExtractedPage =
		serde_json::from_value(value).map_err(|e| format!("malformed page metadata: {e}"))?;
	let url = page
		.url
		.filter(|u| !u.is_empty())
		.unwrap_or_else(|| fallback_url.to_string());

	let mut meta = page.meta;
	if meta.favicon.as_deref().is_none_or(str::is_empty) {
		meta.favicon = origin_favicon(&url);
	}
	meta.timestamp = now_millis();

	let mut patch = TabStatePatch::new()
		.url(url)
		.loading(false)
		.favicon(meta.favicon.clone())
		.icons(meta.icons.clone());
	if let Some(title) = page.title.filter(|t| !t.is_empty()) {
		patch = patch.title(title);
	}
	Ok(patch.meta_data(meta))
}

fn origin_favicon(url: &str) -> Option<String> {
	let origin = url::Url::parse(url).ok()?.origin();
	origin
		.is_tuple()
		.then(|| format!("{}/favicon.ico", origin.ascii_serialization()))
}
