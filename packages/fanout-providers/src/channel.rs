use serde_json::Value;

use fanout_config::ChannelsConfig;
use fanout_domain::{Deadline, SearchResult, Source};

use crate::Result;

/// Queries one channel archive with `GET {api_base}{path}?channel=..&keyword=..`.
pub async fn search(
	cfg: &ChannelsConfig,
	keyword: &str,
	channel: &str,
	deadline: Deadline,
) -> Result<Vec<SearchResult>> {
	let client = crate::client_for(cfg.timeout_ms, deadline)?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let res = client
		.get(url)
		.headers(crate::request_headers(&cfg.default_headers)?)
		.query(&[("channel", channel), ("keyword", keyword)])
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	crate::parse_results(json, &Source::channel(channel))
}
