use std::{
	num::NonZeroUsize,
	sync::{Arc, Mutex, MutexGuard, OnceLock, Weak},
	time::Duration,
};

use lru::LruCache;
use serde_json::Value;
use time::{OffsetDateTime, macros::datetime};
use tokio::{
	runtime::Handle,
	sync::{mpsc, oneshot},
	task::JoinHandle,
};

use fanout_config::Cache as CacheConfig;
use fanout_domain::{SearchResult, keyword};
use fanout_storage::DiskStore;

use crate::{Error, Result};

const CHANNEL_CACHE_SCHEMA_VERSION: i32 = 1;
const PLUGIN_CACHE_SCHEMA_VERSION: i32 = 1;

/// Latest expiry any entry can carry, however long the TTL.
pub const MAX_EXPIRY: OffsetDateTime = datetime!(9999-12-31 23:59:59 UTC);

/// How much of the channel list a cached channel result set covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coverage {
	/// Only the first channel, as searched by the quick phase.
	Quick,
	/// Every requested channel.
	Full,
}
impl Coverage {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Quick => "quick",
			Self::Full => "full",
		}
	}
}

/// Encodes result sequences for storage in the cache.
pub trait ResultSerializer
where
	Self: Send + Sync,
{
	fn serialize(&self, results: &[SearchResult]) -> Result<Vec<u8>>;

	fn deserialize(&self, payload: &[u8]) -> Result<Vec<SearchResult>>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;
impl ResultSerializer for JsonSerializer {
	fn serialize(&self, results: &[SearchResult]) -> Result<Vec<u8>> {
		serde_json::to_vec(results)
			.map_err(|err| Error::Cache { message: format!("Failed to encode results: {err}") })
	}

	fn deserialize(&self, payload: &[u8]) -> Result<Vec<SearchResult>> {
		serde_json::from_slice(payload)
			.map_err(|err| Error::Cache { message: format!("Failed to decode results: {err}") })
	}
}

#[derive(Debug, Clone)]
struct FastEntry {
	payload: Vec<u8>,
	expires_at: OffsetDateTime,
}

enum DurableCommand {
	Write { key: String, payload: Vec<u8>, expires_at: OffsetDateTime },
	Remove { key: String, done: oneshot::Sender<()> },
	Flush(oneshot::Sender<()>),
}

/// The on-disk store plus the single task that applies writes to it in submission order.
struct DurableTier {
	store: Arc<DiskStore>,
	writer: OnceLock<mpsc::UnboundedSender<DurableCommand>>,
}
impl DurableTier {
	fn new(store: DiskStore) -> Self {
		Self { store: Arc::new(store), writer: OnceLock::new() }
	}

	/// Starts the writer on first use. `None` outside a Tokio runtime.
	fn writer(&self) -> Option<&mpsc::UnboundedSender<DurableCommand>> {
		if let Some(writer) = self.writer.get() {
			return Some(writer);
		}

		let handle = Handle::try_current().ok()?;

		Some(self.writer.get_or_init(|| {
			let (tx, rx) = mpsc::unbounded_channel();

			handle.spawn(run_durable_writer(self.store.clone(), rx));

			tx
		}))
	}

	fn submit(&self, command: DurableCommand) -> bool {
		self.writer().map(|writer| writer.send(command).is_ok()).unwrap_or(false)
	}
}

async fn run_durable_writer(
	store: Arc<DiskStore>,
	mut commands: mpsc::UnboundedReceiver<DurableCommand>,
) {
	while let Some(command) = commands.recv().await {
		match command {
			DurableCommand::Write { key, payload, expires_at } =>
				match store.write(&key, &payload, expires_at).await {
					Ok(payload_size) => tracing::debug!(
						cache_key_prefix = cache_key_prefix(&key),
						payload_size,
						"Cache durable write stored."
					),
					Err(err) => tracing::warn!(
						error = %err,
						cache_key_prefix = cache_key_prefix(&key),
						"Cache write failed."
					),
				},
			DurableCommand::Remove { key, done } => {
				if let Err(err) = store.remove(&key).await {
					tracing::warn!(
						error = %err,
						cache_key_prefix = cache_key_prefix(&key),
						"Cache invalidation failed."
					);
				}

				let _ = done.send(());
			},
			DurableCommand::Flush(done) => {
				let _ = done.send(());
			},
		}
	}
}

/// In-memory LRU in front of an optional on-disk store.
///
/// Reads are answered from memory when possible and never wait on a disk write. Writes land in
/// memory immediately; the disk copy is applied by a background writer in submission order and
/// its outcome is only logged.
pub struct TwoTierCache {
	enabled: bool,
	ttl: Duration,
	fast: Mutex<LruCache<String, FastEntry>>,
	durable: Option<DurableTier>,
	serializer: Box<dyn ResultSerializer>,
}
impl TwoTierCache {
	pub fn new(ttl: Duration, max_entries: usize, durable: Option<DiskStore>) -> Self {
		let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);

		Self {
			enabled: true,
			ttl,
			fast: Mutex::new(LruCache::new(capacity)),
			durable: durable.map(DurableTier::new),
			serializer: Box::new(JsonSerializer),
		}
	}

	/// Every lookup misses and every write is dropped.
	pub fn disabled() -> Self {
		Self { enabled: false, ..Self::new(Duration::ZERO, 1, None) }
	}

	pub async fn from_config(cfg: &CacheConfig) -> Result<Self> {
		if !cfg.enabled {
			return Ok(Self::disabled());
		}

		let durable = match cfg.durable_dir.as_ref() {
			Some(dir) => Some(DiskStore::open(dir).await?),
			None => None,
		};
		let ttl = Duration::from_secs(cfg.ttl_minutes.saturating_mul(60));

		Ok(Self::new(ttl, cfg.max_entries, durable))
	}

	pub fn with_serializer(mut self, serializer: Box<dyn ResultSerializer>) -> Self {
		self.serializer = serializer;

		self
	}

	pub fn is_enabled(&self) -> bool {
		self.enabled
	}

	pub fn ttl(&self) -> Duration {
		self.ttl
	}

	pub fn len(&self) -> usize {
		self.fast().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
		if !self.enabled {
			return None;
		}

		let now = OffsetDateTime::now_utc();
		let cached = {
			let mut fast = self.fast();

			match fast.peek(key).map(|entry| entry.expires_at > now) {
				Some(true) => fast.get(key).map(|entry| entry.payload.clone()),
				Some(false) => {
					fast.pop(key);

					None
				},
				None => None,
			}
		};

		if cached.is_some() {
			return cached;
		}

		let durable = self.durable.as_ref()?;
		let entry = match durable.store.read(key, now).await {
			Ok(Some(entry)) => entry,
			Ok(None) => return None,
			Err(err) => {
				tracing::warn!(
					error = %err,
					cache_key_prefix = cache_key_prefix(key),
					"Cache durable read failed."
				);

				return None;
			},
		};

		self.fast().put(
			key.to_string(),
			FastEntry { payload: entry.payload.clone(), expires_at: entry.expires_at },
		);
		tracing::debug!(cache_key_prefix = cache_key_prefix(key), "Cache entry promoted.");

		Some(entry.payload)
	}

	/// Last writer wins in both tiers.
	pub fn set(&self, key: &str, payload: Vec<u8>, ttl: Duration) {
		if !self.enabled {
			return;
		}

		let expires_at = expiry_after(OffsetDateTime::now_utc(), ttl);

		if let Some(durable) = self.durable.as_ref() {
			let command = DurableCommand::Write {
				key: key.to_string(),
				payload: payload.clone(),
				expires_at,
			};

			if !durable.submit(command) {
				tracing::warn!(
					cache_key_prefix = cache_key_prefix(key),
					"Cache durable write skipped outside a runtime."
				);
			}
		}

		self.fast().put(key.to_string(), FastEntry { payload, expires_at });
	}

	pub async fn invalidate(&self, key: &str) {
		self.fast().pop(key);

		let Some(durable) = self.durable.as_ref() else {
			return;
		};
		let (done, removed) = oneshot::channel();

		if durable.submit(DurableCommand::Remove { key: key.to_string(), done }) {
			let _ = removed.await;
		} else if let Err(err) = durable.store.remove(key).await {
			tracing::warn!(
				error = %err,
				cache_key_prefix = cache_key_prefix(key),
				"Cache invalidation failed."
			);
		}
	}

	/// Waits until every durable write submitted so far has been applied.
	pub async fn flush(&self) {
		let Some(durable) = self.durable.as_ref() else {
			return;
		};
		let (done, flushed) = oneshot::channel();

		if durable.submit(DurableCommand::Flush(done)) {
			let _ = flushed.await;
		}
	}

	/// A payload that no longer decodes counts as a miss.
	pub async fn get_results(&self, key: &str) -> Option<Vec<SearchResult>> {
		let payload = self.get(key).await?;

		match self.serializer.deserialize(&payload) {
			Ok(results) => Some(results),
			Err(err) => {
				tracing::warn!(
					error = %err,
					cache_key_prefix = cache_key_prefix(key),
					"Cache payload decode failed."
				);

				None
			},
		}
	}

	pub fn set_results(&self, key: &str, results: &[SearchResult]) {
		if !self.enabled {
			return;
		}

		match self.serializer.serialize(results) {
			Ok(payload) => self.set(key, payload, self.ttl),
			Err(err) => tracing::warn!(
				error = %err,
				cache_key_prefix = cache_key_prefix(key),
				"Cache payload encode failed."
			),
		}
	}

	/// Drops expired entries from both tiers. Returns how many were removed.
	pub async fn sweep(&self) -> u64 {
		let now = OffsetDateTime::now_utc();
		let mut removed = {
			let mut fast = self.fast();
			let expired: Vec<String> = fast
				.iter()
				.filter(|(_, entry)| entry.expires_at <= now)
				.map(|(key, _)| key.clone())
				.collect();

			for key in &expired {
				fast.pop(key);
			}

			expired.len() as u64
		};

		if let Some(durable) = self.durable.as_ref() {
			match durable.store.purge_expired(now).await {
				Ok(purged) => removed += purged,
				Err(err) => tracing::warn!(error = %err, "Cache durable sweep failed."),
			}
		}

		removed
	}

	/// Sweeps every `interval` until the cache is dropped.
	pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
		let cache: Weak<Self> = Arc::downgrade(self);

		tokio::spawn(async move {
			let mut ticker = tokio::time::interval(interval);

			ticker.tick().await;

			loop {
				ticker.tick().await;

				let Some(cache) = cache.upgrade() else {
					break;
				};
				let removed = cache.sweep().await;

				if removed > 0 {
					tracing::info!(removed, "Cache sweep removed expired entries.");
				}
			}
		})
	}

	fn fast(&self) -> MutexGuard<'_, LruCache<String, FastEntry>> {
		self.fast.lock().unwrap_or_else(|err| err.into_inner())
	}
}

/// `now + ttl`, saturating at [`MAX_EXPIRY`].
fn expiry_after(now: OffsetDateTime, ttl: Duration) -> OffsetDateTime {
	time::Duration::try_from(ttl)
		.ok()
		.and_then(|ttl| now.checked_add(ttl))
		.map_or(MAX_EXPIRY, |expires_at| expires_at.min(MAX_EXPIRY))
}

pub fn hash_cache_key(payload: &Value) -> Result<String> {
	let raw = serde_json::to_vec(payload).map_err(|err| Error::Cache {
		message: format!("Failed to encode cache key payload: {err}"),
	})?;

	Ok(blake3::hash(&raw).to_hex().to_string())
}

pub fn cache_key_prefix(key: &str) -> &str {
	let len = key.len().min(12);

	&key[..len]
}

pub fn channel_cache_key(keyword: &str, channels: &[String], coverage: Coverage) -> Result<String> {
	let mut channels: Vec<&str> = channels.iter().map(|channel| channel.trim()).collect();

	channels.sort_unstable();
	channels.dedup();

	let payload = serde_json::json!({
		"kind": "channel",
		"schema_version": CHANNEL_CACHE_SCHEMA_VERSION,
		"keyword": keyword::normalize(keyword),
		"channels": channels,
		"coverage": coverage.as_str(),
	});

	hash_cache_key(&payload)
}

pub fn plugin_cache_key(
	plugin: &str,
	keyword: &str,
	ext: &serde_json::Map<String, Value>,
) -> Result<String> {
	let payload = serde_json::json!({
		"kind": "plugin",
		"schema_version": PLUGIN_CACHE_SCHEMA_VERSION,
		"plugin": plugin.trim().to_lowercase(),
		"keyword": keyword::normalize(keyword),
		"ext": ext,
	});

	hash_cache_key(&payload)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn channel_key_ignores_order_and_case_of_keyword() {
		let a = channel_cache_key(
			"Foo  Bar",
			&["b".to_string(), "a".to_string()],
			Coverage::Full,
		)
		.expect("Failed to build key.");
		let b = channel_cache_key("foo bar", &["a".to_string(), "b".to_string()], Coverage::Full)
			.expect("Failed to build key.");
		let quick = channel_cache_key("foo bar", &["a".to_string(), "b".to_string()], Coverage::Quick)
			.expect("Failed to build key.");

		assert_eq!(a, b);
		assert_ne!(a, quick);
		assert_eq!(cache_key_prefix(&a).len(), 12);
	}

	#[test]
	fn plugin_key_depends_on_ext() {
		let mut ext = serde_json::Map::new();
		let plain = plugin_cache_key("Alpha", "foo", &ext).expect("Failed to build key.");

		ext.insert("page".to_string(), Value::from(2));

		let paged = plugin_cache_key("alpha", "foo", &ext).expect("Failed to build key.");

		assert_ne!(plain, paged);
		assert_eq!(
			plain,
			plugin_cache_key("ALPHA", "foo", &serde_json::Map::new()).expect("Failed to build key.")
		);
	}

	#[test]
	fn overflow_evicts_least_recently_used() {
		let cache = TwoTierCache::new(Duration::from_secs(60), 2, None);

		cache.set("a", b"1".to_vec(), Duration::from_secs(60));
		cache.set("b", b"2".to_vec(), Duration::from_secs(60));

		let touched = cache.fast().get("a").is_some();

		assert!(touched);

		cache.set("c", b"3".to_vec(), Duration::from_secs(60));

		let fast = cache.fast();

		assert_eq!(fast.len(), 2);
		assert!(fast.contains("a"));
		assert!(!fast.contains("b"));
		assert!(fast.contains("c"));
	}

	#[test]
	fn expiry_saturates_instead_of_overflowing() {
		let now = OffsetDateTime::now_utc();

		assert_eq!(expiry_after(now, Duration::from_secs(u64::MAX)), MAX_EXPIRY);
		assert_eq!(expiry_after(now, Duration::from_secs(60)), now + time::Duration::minutes(1));
	}
}
