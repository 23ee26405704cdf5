use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Where a result came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum Source {
	Channel(String),
	Plugin(String),
}
impl Source {
	pub fn channel(name: impl Into<String>) -> Self {
		Self::Channel(name.into())
	}

	pub fn plugin(name: impl Into<String>) -> Self {
		Self::Plugin(name.into())
	}

	pub fn name(&self) -> &str {
		match self {
			Self::Channel(name) | Self::Plugin(name) => name,
		}
	}
}
impl fmt::Display for Source {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Channel(name) => write!(f, "tg:{name}"),
			Self::Plugin(name) => write!(f, "plugin:{name}"),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
	pub url: String,
	/// Provider-type tag supplied by the source. Classified from the URL when absent.
	#[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
	pub kind: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub password: Option<String>,
}
impl Link {
	pub fn new(url: impl Into<String>) -> Self {
		Self { url: url.into(), kind: None, password: None }
	}

	pub fn tagged(url: impl Into<String>, kind: impl Into<String>) -> Self {
		Self { url: url.into(), kind: Some(kind.into()), password: None }
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
	/// Source-local identifier, e.g. a message id inside a channel.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<String>,
	pub title: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub content: Option<String>,
	#[serde(default, with = "crate::time_serde::option")]
	pub datetime: Option<OffsetDateTime>,
	pub source: Source,
	#[serde(default)]
	pub links: Vec<Link>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub tags: Vec<String>,
}
impl SearchResult {
	pub fn new(title: impl Into<String>, source: Source) -> Self {
		Self {
			id: None,
			title: title.into(),
			content: None,
			datetime: None,
			source,
			links: Vec::new(),
			tags: Vec::new(),
		}
	}

	pub fn with_datetime(mut self, datetime: OffsetDateTime) -> Self {
		self.datetime = Some(datetime);

		self
	}

	pub fn with_link(mut self, link: Link) -> Self {
		self.links.push(link);

		self
	}

	pub fn with_id(mut self, id: impl Into<String>) -> Self {
		self.id = Some(id.into());

		self
	}

	/// The Unix epoch is what sources without a timestamp tend to emit, so it counts as unknown.
	pub fn known_datetime(&self) -> Option<OffsetDateTime> {
		self.datetime.filter(|value| *value != OffsetDateTime::UNIX_EPOCH)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedLink {
	pub url: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub password: Option<String>,
	pub note: String,
	#[serde(default, with = "crate::time_serde::option")]
	pub datetime: Option<OffsetDateTime>,
	pub source: Source,
}

pub type MergedByType = BTreeMap<String, Vec<MergedLink>>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponse {
	pub total: usize,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub results: Vec<SearchResult>,
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub merged_by_type: MergedByType,
	pub has_more: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultType {
	All,
	Results,
	#[default]
	MergedByType,
}
impl ResultType {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::All => "all",
			Self::Results => "results",
			Self::MergedByType => "merged_by_type",
		}
	}
}
impl FromStr for ResultType {
	type Err = String;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		match raw.trim() {
			"" | "merged_by_type" => Ok(Self::MergedByType),
			"results" => Ok(Self::Results),
			"all" => Ok(Self::All),
			other => Err(format!(
				"result_type must be one of all, results, or merged_by_type, got {other}."
			)),
		}
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
	#[default]
	All,
	Tg,
	Plugin,
}
impl SourceType {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::All => "all",
			Self::Tg => "tg",
			Self::Plugin => "plugin",
		}
	}

	pub fn includes_channels(self) -> bool {
		matches!(self, Self::All | Self::Tg)
	}

	pub fn includes_plugins(self) -> bool {
		matches!(self, Self::All | Self::Plugin)
	}
}
impl FromStr for SourceType {
	type Err = String;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		match raw.trim() {
			"" | "all" => Ok(Self::All),
			"tg" => Ok(Self::Tg),
			"plugin" => Ok(Self::Plugin),
			other => Err(format!("source_type must be one of all, tg, or plugin, got {other}.")),
		}
	}
}
