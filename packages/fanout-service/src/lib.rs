pub mod cache;
pub mod executor;
pub mod registry;
pub mod search;
pub mod status;

mod error;

pub use cache::{Coverage, JsonSerializer, ResultSerializer, TwoTierCache};
pub use error::{Error, Result, SourceError};
pub use registry::{PluginFilter, PluginRegistry};
pub use search::{Phase, SearchRequest};
pub use status::StatusResponse;

use std::{future::Future, pin::Pin, sync::Arc};

use serde_json::{Map, Value};

use fanout_config::{ChannelsConfig, Config, PluginConfig};
use fanout_domain::{Deadline, SearchResult};
use fanout_providers as providers;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub type SourceResult = std::result::Result<Vec<SearchResult>, SourceError>;

/// A third-party search backend.
pub trait SearchPlugin
where
	Self: Send + Sync,
{
	fn name(&self) -> &str;

	/// 1 and 2 are fast and reliable; 3 and above are best-effort.
	fn priority(&self) -> u8;

	fn search<'a>(
		&'a self,
		keyword: &'a str,
		ext: &'a Map<String, Value>,
		deadline: Deadline,
	) -> BoxFuture<'a, SourceResult>;
}

/// Searches a single message-channel archive.
pub trait ChannelSearcher
where
	Self: Send + Sync,
{
	fn search_channel<'a>(
		&'a self,
		keyword: &'a str,
		channel: &'a str,
		deadline: Deadline,
	) -> BoxFuture<'a, SourceResult>;
}

pub struct HttpPlugin {
	cfg: PluginConfig,
}
impl HttpPlugin {
	pub fn new(cfg: PluginConfig) -> Self {
		Self { cfg }
	}
}
impl SearchPlugin for HttpPlugin {
	fn name(&self) -> &str {
		&self.cfg.name
	}

	fn priority(&self) -> u8 {
		self.cfg.priority
	}

	fn search<'a>(
		&'a self,
		keyword: &'a str,
		ext: &'a Map<String, Value>,
		deadline: Deadline,
	) -> BoxFuture<'a, SourceResult> {
		Box::pin(async move {
			providers::plugin::search(&self.cfg, keyword, ext, deadline)
				.await
				.map_err(SourceError::from)
		})
	}
}

pub struct HttpChannelSearcher {
	cfg: ChannelsConfig,
}
impl HttpChannelSearcher {
	pub fn new(cfg: ChannelsConfig) -> Self {
		Self { cfg }
	}
}
impl ChannelSearcher for HttpChannelSearcher {
	fn search_channel<'a>(
		&'a self,
		keyword: &'a str,
		channel: &'a str,
		deadline: Deadline,
	) -> BoxFuture<'a, SourceResult> {
		Box::pin(async move {
			providers::channel::search(&self.cfg, keyword, channel, deadline)
				.await
				.map_err(SourceError::from)
		})
	}
}

/// Used when no channel archive is configured. Every channel comes back empty.
pub struct NoChannels;
impl ChannelSearcher for NoChannels {
	fn search_channel<'a>(
		&'a self,
		_keyword: &'a str,
		_channel: &'a str,
		_deadline: Deadline,
	) -> BoxFuture<'a, SourceResult> {
		let outcome: SourceResult = Ok(Vec::new());

		Box::pin(async move { outcome })
	}
}

pub struct FanoutService {
	pub cfg: Config,
	pub registry: Arc<PluginRegistry>,
	pub channels: Arc<dyn ChannelSearcher>,
	pub cache: Arc<TwoTierCache>,
}
impl FanoutService {
	pub fn new(
		cfg: Config,
		registry: Arc<PluginRegistry>,
		channels: Arc<dyn ChannelSearcher>,
		cache: Arc<TwoTierCache>,
	) -> Self {
		Self { cfg, registry, channels, cache }
	}

	/// Builds the HTTP adapters, the registry, and the cache described by `cfg`.
	pub async fn from_config(cfg: Config) -> Result<Self> {
		let mut registry = PluginRegistry::new();

		for plugin_cfg in &cfg.plugins {
			registry.register(Arc::new(HttpPlugin::new(plugin_cfg.clone())))?;
		}

		let channels: Arc<dyn ChannelSearcher> = match cfg.channels.clone() {
			Some(channels_cfg) => Arc::new(HttpChannelSearcher::new(channels_cfg)),
			None => Arc::new(NoChannels),
		};
		let cache = Arc::new(TwoTierCache::from_config(&cfg.cache).await?);

		Ok(Self::new(cfg, Arc::new(registry), channels, cache))
	}
}
