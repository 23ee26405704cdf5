use std::sync::LazyLock;

use regex::Regex;

use crate::model::Link;

pub const OTHERS: &str = "others";

const PROVIDER_PATTERNS: [(&str, &str); 16] = [
	("baidu", r"(?i)^https?://(pan|yun)\.baidu\.com/"),
	("aliyun", r"(?i)^https?://(www\.)?(aliyundrive|alipan)\.com/"),
	("quark", r"(?i)^https?://pan\.quark\.cn/"),
	("tianyi", r"(?i)^https?://cloud\.189\.cn/"),
	("uc", r"(?i)^https?://drive\.uc\.cn/"),
	("mobile", r"(?i)^https?://(caiyun|yun)\.139\.com/"),
	("115", r"(?i)^https?://(www\.)?(115|115cdn|anxia)\.com/"),
	("pikpak", r"(?i)^https?://(www\.)?mypikpak\.com/"),
	("xunlei", r"(?i)^https?://pan\.xunlei\.com/"),
	("123", r"(?i)^https?://(www\.)?(123pan|123684|123865|123912)\.(com|cn)/"),
	("mega", r"(?i)^https?://(www\.)?mega\.(nz|io)/"),
	("gdrive", r"(?i)^https?://drive\.google\.com/"),
	("onedrive", r"(?i)^https?://(1drv\.ms|onedrive\.live\.com)/"),
	("dropbox", r"(?i)^https?://(www\.)?dropbox\.com/"),
	("magnet", r"(?i)^magnet:\?"),
	("ed2k", r"(?i)^ed2k://"),
];

static PROVIDERS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
	PROVIDER_PATTERNS
		.iter()
		.filter_map(|(kind, pattern)| Regex::new(pattern).ok().map(|re| (*kind, re)))
		.collect()
});

/// Provider tag for a bare URL, or [`OTHERS`] when no known provider matches.
pub fn classify_url(url: &str) -> &'static str {
	let url = url.trim();

	PROVIDERS.iter().find(|(_, re)| re.is_match(url)).map(|(kind, _)| *kind).unwrap_or(OTHERS)
}

/// The source's own tag wins; otherwise the URL decides.
pub fn link_kind(link: &Link) -> String {
	match link.kind.as_deref().map(str::trim) {
		Some(kind) if !kind.is_empty() => kind.to_lowercase(),
		_ => classify_url(&link.url).to_string(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn every_pattern_compiles() {
		assert_eq!(PROVIDERS.len(), PROVIDER_PATTERNS.len());
	}

	#[test]
	fn classifies_known_providers() {
		assert_eq!(classify_url("https://pan.quark.cn/s/abc"), "quark");
		assert_eq!(classify_url("https://www.alipan.com/s/xyz"), "aliyun");
		assert_eq!(classify_url("magnet:?xt=urn:btih:abc"), "magnet");
		assert_eq!(classify_url("https://example.com/file"), OTHERS);
	}

	#[test]
	fn explicit_tag_overrides_url() {
		let link = Link::tagged("https://pan.quark.cn/s/abc", " Alpha ");

		assert_eq!(link_kind(&link), "alpha");
	}
}
