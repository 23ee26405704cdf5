//! Fake sources and a small configuration for exercising the search service without a network.

use std::{
	collections::{HashMap, HashSet},
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration,
};

use serde_json::{Map, Value};

use fanout_config::{Cache, Config, Search, Service};
use fanout_domain::{Deadline, SearchResult, Source};
use fanout_service::{
	BoxFuture, ChannelSearcher, FanoutService, PluginRegistry, Result, SearchPlugin, SourceError,
	SourceResult, TwoTierCache,
};

/// Short phase budgets so deadline tests stay fast. Plugins enabled, in-memory cache only.
pub fn test_config() -> Config {
	Config {
		service: Service { http_bind: "127.0.0.1:0".to_string(), log_level: "info".to_string() },
		search: Search {
			default_concurrency: 4,
			default_channels: vec![
				"alpha_share".to_string(),
				"beta_share".to_string(),
				"gamma_share".to_string(),
				"delta_share".to_string(),
			],
			plugins_enabled: true,
			quick_timeout_ms: 200,
			medium_timeout_ms: 400,
			full_timeout_ms: 1_000,
			medium_max_channels: 3,
			high_priority_max: 2,
		},
		cache: Cache {
			enabled: true,
			ttl_minutes: 10,
			max_entries: 1_000,
			durable_dir: None,
			sweep_interval_secs: 300,
		},
		channels: None,
		plugins: Vec::new(),
	}
}

/// Wires fakes into a service the same way startup wires the HTTP adapters.
pub fn build_service(
	cfg: Config,
	plugins: Vec<Arc<dyn SearchPlugin>>,
	channels: Arc<dyn ChannelSearcher>,
) -> Result<FanoutService> {
	let mut registry = PluginRegistry::new();

	for plugin in plugins {
		registry.register(plugin)?;
	}

	let cache = if cfg.cache.enabled {
		TwoTierCache::new(
			Duration::from_secs(cfg.cache.ttl_minutes * 60),
			cfg.cache.max_entries,
			None,
		)
	} else {
		TwoTierCache::disabled()
	};

	Ok(FanoutService::new(cfg, Arc::new(registry), channels, Arc::new(cache)))
}

/// Returns fixed results, optionally after a delay, and counts its calls.
pub struct StaticPlugin {
	name: String,
	priority: u8,
	results: Vec<SearchResult>,
	delay: Duration,
	calls: Arc<AtomicUsize>,
}
impl StaticPlugin {
	/// Results are re-stamped with this plugin as their source.
	pub fn new(name: &str, priority: u8, results: Vec<SearchResult>) -> Self {
		let results = results
			.into_iter()
			.map(|result| SearchResult { source: Source::plugin(name), ..result })
			.collect();

		Self {
			name: name.to_string(),
			priority,
			results,
			delay: Duration::ZERO,
			calls: Arc::new(AtomicUsize::new(0)),
		}
	}

	pub fn with_delay(mut self, delay: Duration) -> Self {
		self.delay = delay;

		self
	}

	pub fn call_counter(&self) -> Arc<AtomicUsize> {
		self.calls.clone()
	}
}
impl SearchPlugin for StaticPlugin {
	fn name(&self) -> &str {
		&self.name
	}

	fn priority(&self) -> u8 {
		self.priority
	}

	fn search<'a>(
		&'a self,
		_keyword: &'a str,
		_ext: &'a Map<String, Value>,
		_deadline: Deadline,
	) -> BoxFuture<'a, SourceResult> {
		Box::pin(async move {
			self.calls.fetch_add(1, Ordering::SeqCst);

			if !self.delay.is_zero() {
				tokio::time::sleep(self.delay).await;
			}

			Ok::<_, SourceError>(self.results.clone())
		})
	}
}

/// Always fails with the given message.
pub struct FailingPlugin {
	name: String,
	priority: u8,
	message: String,
}
impl FailingPlugin {
	pub fn new(name: &str, priority: u8, message: &str) -> Self {
		Self { name: name.to_string(), priority, message: message.to_string() }
	}
}
impl SearchPlugin for FailingPlugin {
	fn name(&self) -> &str {
		&self.name
	}

	fn priority(&self) -> u8 {
		self.priority
	}

	fn search<'a>(
		&'a self,
		_keyword: &'a str,
		_ext: &'a Map<String, Value>,
		_deadline: Deadline,
	) -> BoxFuture<'a, SourceResult> {
		let outcome: SourceResult = Err(SourceError::failed(self.message.as_str()));

		Box::pin(async move { outcome })
	}
}

/// Channel archive backed by a map. Unknown channels return nothing.
#[derive(Default)]
pub struct FakeChannels {
	results: HashMap<String, Vec<SearchResult>>,
	delays: HashMap<String, Duration>,
	failing: HashSet<String>,
	calls: Arc<AtomicUsize>,
}
impl FakeChannels {
	pub fn new() -> Self {
		Self::default()
	}

	/// Results are re-stamped with the channel as their source.
	pub fn with_results(mut self, channel: &str, results: Vec<SearchResult>) -> Self {
		let results = results
			.into_iter()
			.map(|result| SearchResult { source: Source::channel(channel), ..result })
			.collect();

		self.results.insert(channel.to_string(), results);

		self
	}

	pub fn with_delay(mut self, channel: &str, delay: Duration) -> Self {
		self.delays.insert(channel.to_string(), delay);

		self
	}

	pub fn failing(mut self, channel: &str) -> Self {
		self.failing.insert(channel.to_string());

		self
	}

	pub fn call_counter(&self) -> Arc<AtomicUsize> {
		self.calls.clone()
	}
}
impl ChannelSearcher for FakeChannels {
	fn search_channel<'a>(
		&'a self,
		_keyword: &'a str,
		channel: &'a str,
		_deadline: Deadline,
	) -> BoxFuture<'a, SourceResult> {
		Box::pin(async move {
			self.calls.fetch_add(1, Ordering::SeqCst);

			if let Some(delay) = self.delays.get(channel) {
				tokio::time::sleep(*delay).await;
			}
			if self.failing.contains(channel) {
				return Err(SourceError::failed(format!("Channel {channel} is unavailable.")));
			}

			Ok(self.results.get(channel).cloned().unwrap_or_default())
		})
	}
}
