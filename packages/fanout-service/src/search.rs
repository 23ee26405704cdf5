use std::{sync::Arc, time::Duration};

use serde::Deserialize;
use serde_json::{Map, Value};

use fanout_domain::{
	Deadline, ResultType, SearchResponse, SearchResult, Source, SourceType, merge_results,
	process, shape_response,
};

use crate::{
	BoxFuture, Error, FanoutService, PluginFilter, Result, SearchPlugin, SourceError,
	SourceResult,
	cache::{self, Coverage, cache_key_prefix},
	executor,
};

const CHANNEL_CACHE_KIND: &str = "channel";
const PLUGIN_CACHE_KIND: &str = "plugin";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
	Quick,
	Medium,
	Full,
}
impl Phase {
	/// 0 is quick and 1 is medium. Anything else, including no phase at all, is full.
	pub fn from_number(number: Option<u32>) -> Self {
		match number {
			Some(0) => Self::Quick,
			Some(1) => Self::Medium,
			_ => Self::Full,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Quick => "quick",
			Self::Medium => "medium",
			Self::Full => "full",
		}
	}

	pub fn has_more(self) -> bool {
		!matches!(self, Self::Full)
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SearchRequest {
	pub keyword: String,
	pub channels: Vec<String>,
	/// Non-positive or missing means the configured default.
	pub concurrency: Option<i64>,
	pub force_refresh: bool,
	pub result_type: String,
	pub source_type: String,
	pub plugins: Vec<String>,
	pub cloud_types: Vec<String>,
	pub ext: Map<String, Value>,
	pub phase: Option<u32>,
}

struct Query {
	keyword: String,
	channels: Vec<String>,
	concurrency: usize,
	force_refresh: bool,
	result_type: ResultType,
	source_type: SourceType,
	plugin_filter: PluginFilter,
	cloud_types: Vec<String>,
	ext: Arc<Map<String, Value>>,
	phase: Phase,
}

type Outcomes = Vec<(Source, Option<SourceResult>)>;

impl FanoutService {
	pub async fn search(&self, req: SearchRequest) -> Result<SearchResponse> {
		let query = self.prepare(req)?;
		let started = std::time::Instant::now();
		let results = match query.phase {
			Phase::Quick => self.quick_results(&query, Deadline::after(self.quick_timeout())).await,
			Phase::Medium => self.medium_results(&query).await,
			Phase::Full => self.full_results(&query).await?,
		};
		let processed =
			process(results, &query.keyword, &query.cloud_types, self.registry.as_ref());
		let response = shape_response(processed, query.result_type, query.phase.has_more());

		tracing::info!(
			phase = query.phase.as_str(),
			result_type = query.result_type.as_str(),
			source_type = query.source_type.as_str(),
			total = response.total,
			elapsed_ms = started.elapsed().as_millis() as u64,
			"Search completed."
		);

		Ok(response)
	}

	fn prepare(&self, req: SearchRequest) -> Result<Query> {
		let keyword = req.keyword.trim().to_string();

		if keyword.is_empty() {
			return Err(Error::InvalidRequest { message: "keyword must be non-empty.".to_string() });
		}

		let result_type: ResultType =
			req.result_type.parse().map_err(|message| Error::InvalidRequest { message })?;
		let source_type: SourceType =
			req.source_type.parse().map_err(|message| Error::InvalidRequest { message })?;
		let mut channels: Vec<String> = Vec::with_capacity(req.channels.len());

		for channel in &req.channels {
			let channel = channel.trim();

			if !channel.is_empty() && !channels.iter().any(|seen| seen == channel) {
				channels.push(channel.to_string());
			}
		}

		if channels.is_empty() {
			channels = self.cfg.search.default_channels.clone();
		}

		let concurrency = match req.concurrency {
			Some(value) if value > 0 => usize::try_from(value).unwrap_or(usize::MAX),
			_ => self.cfg.search.default_concurrency as usize,
		};
		let plugin_filter = if source_type.includes_plugins() {
			self.registry.resolve_filter(&req.plugins)
		} else {
			PluginFilter::All
		};
		let cloud_types = req
			.cloud_types
			.iter()
			.map(|kind| kind.trim().to_lowercase())
			.filter(|kind| !kind.is_empty())
			.collect();

		Ok(Query {
			keyword,
			channels,
			concurrency,
			force_refresh: req.force_refresh,
			result_type,
			source_type,
			plugin_filter,
			cloud_types,
			ext: Arc::new(req.ext),
			phase: Phase::from_number(req.phase),
		})
	}

	/// Cached channel results, or the first channel alone.
	async fn quick_results(&self, query: &Query, deadline: Deadline) -> Vec<SearchResult> {
		if !query.source_type.includes_channels() {
			return Vec::new();
		}

		let Some(first) = query.channels.first() else {
			return Vec::new();
		};
		let first_only = std::slice::from_ref(first);
		let quick_key = self.channel_key(query, first_only, Coverage::Quick);

		if self.reads_cache(query) {
			let full_key = self.channel_key(query, &query.channels, Coverage::Full);

			for key in [full_key.as_deref(), quick_key.as_deref()].into_iter().flatten() {
				if let Some(results) = self.cached(key, CHANNEL_CACHE_KIND).await {
					return results;
				}
			}
		}

		let outcomes = self.search_channels(query, first_only, deadline).await;
		let results = tolerate(outcomes, query.phase);

		if let Some(key) = quick_key.as_deref()
			&& !results.is_empty()
		{
			self.store(key, CHANNEL_CACHE_KIND, &results);
		}

		results
	}

	/// The quick step plus fast plugins and a few more channels, all under one deadline.
	async fn medium_results(&self, query: &Query) -> Vec<SearchResult> {
		let deadline = Deadline::after(self.medium_timeout());
		let quick_deadline = Deadline::after(self.quick_timeout()).min(deadline);
		let extra_channels: &[String] = if query.source_type.includes_channels() {
			let end = query.channels.len().min(self.cfg.search.medium_max_channels as usize);

			query.channels.get(1..end).unwrap_or(&[])
		} else {
			&[]
		};
		let plugins = if self.plugins_permitted(query) {
			self.registry.select(&query.plugin_filter, Some(self.cfg.search.high_priority_max))
		} else {
			Vec::new()
		};
		let (baseline, plugin_outcomes, channel_outcomes) = tokio::join!(
			self.quick_results(query, quick_deadline),
			self.search_plugins(query, &plugins, deadline),
			self.search_channels(query, extra_channels, deadline),
		);
		let merged = merge_results(baseline, tolerate(plugin_outcomes, query.phase));

		merge_results(merged, tolerate(channel_outcomes, query.phase))
	}

	/// Every channel and every selected plugin. A failing source fails the whole call.
	async fn full_results(&self, query: &Query) -> Result<Vec<SearchResult>> {
		let deadline = Deadline::after(Duration::from_millis(self.cfg.search.full_timeout_ms));
		let (channel_results, plugin_results) = tokio::try_join!(
			self.full_channel_results(query, deadline),
			self.full_plugin_results(query, deadline),
		)?;

		Ok(merge_results(channel_results, plugin_results))
	}

	async fn full_channel_results(
		&self,
		query: &Query,
		deadline: Deadline,
	) -> Result<Vec<SearchResult>> {
		if !query.source_type.includes_channels() || query.channels.is_empty() {
			return Ok(Vec::new());
		}

		let key = self.channel_key(query, &query.channels, Coverage::Full);

		if self.reads_cache(query)
			&& let Some(key) = key.as_deref()
			&& let Some(results) = self.cached(key, CHANNEL_CACHE_KIND).await
		{
			return Ok(results);
		}

		let results = require_all(self.search_channels(query, &query.channels, deadline).await)?;

		if let Some(key) = key.as_deref()
			&& !results.is_empty()
		{
			self.store(key, CHANNEL_CACHE_KIND, &results);
		}

		Ok(results)
	}

	async fn full_plugin_results(
		&self,
		query: &Query,
		deadline: Deadline,
	) -> Result<Vec<SearchResult>> {
		if !self.plugins_permitted(query) {
			return Ok(Vec::new());
		}

		let plugins = self.registry.select(&query.plugin_filter, None);

		require_all(self.search_plugins(query, &plugins, deadline).await)
	}

	async fn search_channels(
		&self,
		query: &Query,
		channels: &[String],
		deadline: Deadline,
	) -> Outcomes {
		let tasks: Vec<BoxFuture<'static, SourceResult>> = channels
			.iter()
			.map(|channel| {
				let searcher = self.channels.clone();
				let keyword = query.keyword.clone();
				let channel = channel.clone();

				Box::pin(async move { searcher.search_channel(&keyword, &channel, deadline).await })
					as BoxFuture<'static, SourceResult>
			})
			.collect();
		let outcomes =
			executor::execute_batch(tasks, query.concurrency, self.batch_timeout(deadline)).await;

		channels.iter().map(Source::channel).zip(outcomes).collect()
	}

	async fn search_plugins(
		&self,
		query: &Query,
		plugins: &[Arc<dyn SearchPlugin>],
		deadline: Deadline,
	) -> Outcomes {
		let tasks = plugins.iter().map(|plugin| self.plugin_task(plugin.clone(), query, deadline));
		let outcomes = executor::execute_batch(
			tasks.collect(),
			query.concurrency,
			self.batch_timeout(deadline),
		)
		.await;

		plugins.iter().map(|plugin| Source::plugin(plugin.name())).zip(outcomes).collect()
	}

	/// One plugin call behind its own cache entry, shared by the medium and full phases.
	fn plugin_task(
		&self,
		plugin: Arc<dyn SearchPlugin>,
		query: &Query,
		deadline: Deadline,
	) -> BoxFuture<'static, SourceResult> {
		let cache = self.cache.clone();
		let keyword = query.keyword.clone();
		let ext = query.ext.clone();
		let reads_cache = self.reads_cache(query);
		let key = if cache.is_enabled() {
			match cache::plugin_cache_key(plugin.name(), &keyword, &ext) {
				Ok(key) => Some(key),
				Err(err) => {
					tracing::warn!(
						error = %err,
						cache_kind = PLUGIN_CACHE_KIND,
						"Cache key build failed."
					);

					None
				},
			}
		} else {
			None
		};

		Box::pin(async move {
			if reads_cache
				&& let Some(key) = key.as_deref()
				&& let Some(results) = cache.get_results(key).await
			{
				tracing::info!(
					cache_kind = PLUGIN_CACHE_KIND,
					cache_key_prefix = cache_key_prefix(key),
					hit = true,
					plugin = plugin.name(),
					"Cache hit."
				);

				return Ok(results);
			}

			let results = plugin.search(&keyword, &ext, deadline).await?;

			if let Some(key) = key.as_deref()
				&& !results.is_empty()
			{
				cache.set_results(key, &results);
			}

			Ok::<_, SourceError>(results)
		})
	}

	fn channel_key(&self, query: &Query, channels: &[String], coverage: Coverage) -> Option<String> {
		if !self.cache.is_enabled() {
			return None;
		}

		match cache::channel_cache_key(&query.keyword, channels, coverage) {
			Ok(key) => Some(key),
			Err(err) => {
				tracing::warn!(
					error = %err,
					cache_kind = CHANNEL_CACHE_KIND,
					"Cache key build failed."
				);

				None
			},
		}
	}

	async fn cached(&self, key: &str, cache_kind: &'static str) -> Option<Vec<SearchResult>> {
		let cached = self.cache.get_results(key).await;

		match cached.as_ref() {
			Some(results) => tracing::info!(
				cache_kind,
				cache_key_prefix = cache_key_prefix(key),
				hit = true,
				payload_size = results.len(),
				"Cache hit."
			),
			None => tracing::info!(
				cache_kind,
				cache_key_prefix = cache_key_prefix(key),
				hit = false,
				payload_size = 0_usize,
				"Cache miss."
			),
		}

		cached
	}

	fn store(&self, key: &str, cache_kind: &'static str, results: &[SearchResult]) {
		self.cache.set_results(key, results);

		tracing::info!(
			cache_kind,
			cache_key_prefix = cache_key_prefix(key),
			payload_size = results.len(),
			ttl_minutes = self.cfg.cache.ttl_minutes,
			"Cache stored."
		);
	}

	fn reads_cache(&self, query: &Query) -> bool {
		self.cache.is_enabled() && !query.force_refresh
	}

	fn plugins_permitted(&self, query: &Query) -> bool {
		self.cfg.search.plugins_enabled && query.source_type.includes_plugins()
	}

	fn quick_timeout(&self) -> Duration {
		Duration::from_millis(self.cfg.search.quick_timeout_ms)
	}

	fn medium_timeout(&self) -> Duration {
		Duration::from_millis(self.cfg.search.medium_timeout_ms)
	}

	fn batch_timeout(&self, deadline: Deadline) -> Duration {
		deadline
			.remaining()
			.unwrap_or_else(|| Duration::from_millis(self.cfg.search.full_timeout_ms))
	}
}

/// Keeps what arrived. Failures and timeouts only drop their source.
fn tolerate(outcomes: Outcomes, phase: Phase) -> Vec<SearchResult> {
	let mut merged = Vec::new();

	for (source, outcome) in outcomes {
		match outcome {
			Some(Ok(results)) => merged = merge_results(merged, results),
			Some(Err(SourceError::Failed { message })) => tracing::warn!(
				phase = phase.as_str(),
				source = %source,
				error = %message,
				"Source search failed."
			),
			Some(Err(SourceError::Timeout)) | None => tracing::debug!(
				phase = phase.as_str(),
				source = %source,
				"Source timed out."
			),
		}
	}

	merged
}

/// Like `tolerate`, but the first failed source, in input order, fails the batch.
fn require_all(outcomes: Outcomes) -> Result<Vec<SearchResult>> {
	let mut merged = Vec::new();

	for (source, outcome) in outcomes {
		match outcome {
			Some(Ok(results)) => merged = merge_results(merged, results),
			Some(Err(err @ SourceError::Failed { .. })) => {
				tracing::warn!(source = %source, error = %err, "Source search failed.");

				return Err(err.into_error(source.to_string()));
			},
			Some(Err(SourceError::Timeout)) | None => {
				tracing::debug!(phase = Phase::Full.as_str(), source = %source, "Source timed out.");
			},
		}
	}

	Ok(merged)
}
