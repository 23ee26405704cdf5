//! HTTP adapters for channel archives and search plugins.
//!
//! Both speak the same response format: `{"results": [ ... ]}` where each entry carries a title
//! and optional id, content, datetime, links, and tags. The adapter stamps the source itself.

pub mod channel;
pub mod plugin;

mod error;

pub use error::{Error, Result};

use std::time::Duration;

use reqwest::{
	Client,
	header::{HeaderMap, HeaderName},
};
use serde::Deserialize;
use serde_json::{Map, Value};
use time::OffsetDateTime;

use fanout_domain::{Deadline, Link, SearchResult, Source};

#[derive(Debug, Deserialize)]
struct WireResponse {
	#[serde(default)]
	results: Vec<WireResult>,
}

#[derive(Debug, Deserialize)]
struct WireResult {
	#[serde(default)]
	id: Option<String>,
	title: String,
	#[serde(default)]
	content: Option<String>,
	#[serde(default, with = "fanout_domain::time_serde::option")]
	datetime: Option<OffsetDateTime>,
	#[serde(default)]
	links: Vec<Link>,
	#[serde(default)]
	tags: Vec<String>,
}

pub fn request_headers(default_headers: &Map<String, Value>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(Error::InvalidConfig {
				message: format!("Default header {key} must be a string."),
			});
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}

fn client_for(timeout_ms: u64, deadline: Deadline) -> Result<Client> {
	if deadline.is_expired() {
		return Err(Error::Timeout);
	}

	let timeout = deadline.clamp(Duration::from_millis(timeout_ms));

	if timeout.is_zero() {
		return Err(Error::Timeout);
	}

	Ok(Client::builder().timeout(timeout).build()?)
}

fn parse_results(json: Value, source: &Source) -> Result<Vec<SearchResult>> {
	if !json.get("results").map(Value::is_array).unwrap_or(false) {
		return Err(Error::InvalidResponse {
			message: format!("Response from {source} is missing results array."),
		});
	}

	let response: WireResponse = serde_json::from_value(json)?;
	let results = response
		.results
		.into_iter()
		.filter(|item| !item.title.trim().is_empty())
		.map(|item| SearchResult {
			id: item.id,
			title: item.title,
			content: item.content,
			datetime: item.datetime,
			source: source.clone(),
			links: item.links.into_iter().filter(|link| !link.url.trim().is_empty()).collect(),
			tags: item.tags,
		})
		.collect();

	Ok(results)
}

#[cfg(test)]
mod tests {
	use time::macros::datetime;

	use super::*;

	#[test]
	fn stamps_source_and_drops_blank_entries() {
		let json = serde_json::json!({
			"results": [
				{
					"id": "7",
					"title": "foo release",
					"datetime": "2024-02-01T08:00:00Z",
					"links": [
						{ "url": "https://pan.quark.cn/s/1", "password": "ab12" },
						{ "url": "  " }
					]
				},
				{ "title": "   " },
				{ "title": "bar", "datetime": "" }
			]
		});
		let results =
			parse_results(json, &Source::plugin("alpha")).expect("Failed to parse results.");

		assert_eq!(results.len(), 2);
		assert_eq!(results[0].source, Source::plugin("alpha"));
		assert_eq!(results[0].datetime, Some(datetime!(2024-02-01 8:00 UTC)));
		assert_eq!(results[0].links.len(), 1);
		assert_eq!(results[0].links[0].password.as_deref(), Some("ab12"));
		assert_eq!(results[1].datetime, None);
	}

	#[test]
	fn rejects_response_without_results() {
		let err = parse_results(serde_json::json!({ "data": [] }), &Source::channel("c"))
			.expect_err("Expected invalid response.");

		assert!(matches!(err, Error::InvalidResponse { .. }));
	}

	#[test]
	fn expired_deadline_is_a_timeout() {
		let deadline = Deadline::after(Duration::ZERO);
		let err = client_for(1_000, deadline).expect_err("Expected timeout.");

		assert!(err.is_timeout());
	}
}
