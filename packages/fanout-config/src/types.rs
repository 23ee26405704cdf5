use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub search: Search,
	pub cache: Cache,
	pub channels: Option<ChannelsConfig>,
	#[serde(default)]
	pub plugins: Vec<PluginConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Search {
	/// Used whenever a request omits concurrency or passes a non-positive value.
	pub default_concurrency: u32,
	#[serde(default)]
	pub default_channels: Vec<String>,
	pub plugins_enabled: bool,
	#[serde(default = "default_quick_timeout_ms")]
	pub quick_timeout_ms: u64,
	#[serde(default = "default_medium_timeout_ms")]
	pub medium_timeout_ms: u64,
	/// Ceiling for a single full-phase batch. Sources normally finish far sooner.
	#[serde(default = "default_full_timeout_ms")]
	pub full_timeout_ms: u64,
	/// Total channels searched by the medium phase, including the quick-phase channel.
	#[serde(default = "default_medium_max_channels")]
	pub medium_max_channels: u32,
	/// Highest plugin priority still considered fast enough for the medium phase.
	#[serde(default = "default_high_priority_max")]
	pub high_priority_max: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Cache {
	pub enabled: bool,
	pub ttl_minutes: u64,
	#[serde(default = "default_cache_max_entries")]
	pub max_entries: usize,
	/// Optional. Without it only the in-memory tier is used.
	pub durable_dir: Option<PathBuf>,
	#[serde(default = "default_sweep_interval_secs")]
	pub sweep_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelsConfig {
	pub api_base: String,
	pub path: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PluginConfig {
	pub name: String,
	pub priority: u8,
	pub api_base: String,
	pub path: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

fn default_quick_timeout_ms() -> u64 {
	3_000
}

fn default_medium_timeout_ms() -> u64 {
	6_000
}

fn default_full_timeout_ms() -> u64 {
	30_000
}

fn default_medium_max_channels() -> u32 {
	3
}

fn default_high_priority_max() -> u8 {
	2
}

fn default_cache_max_entries() -> usize {
	10_000
}

fn default_sweep_interval_secs() -> u64 {
	300
}
