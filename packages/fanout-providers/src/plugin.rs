use serde_json::{Map, Value};

use fanout_config::PluginConfig;
use fanout_domain::{Deadline, SearchResult, Source};

use crate::Result;

/// POSTs `{"keyword", "ext"}` to the plugin endpoint.
pub async fn search(
	cfg: &PluginConfig,
	keyword: &str,
	ext: &Map<String, Value>,
	deadline: Deadline,
) -> Result<Vec<SearchResult>> {
	let client = crate::client_for(cfg.timeout_ms, deadline)?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"keyword": keyword,
		"ext": ext,
	});
	let res = client
		.post(url)
		.headers(crate::request_headers(&cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	crate::parse_results(json, &Source::plugin(cfg.name.as_str()))
}
