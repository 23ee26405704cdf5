use std::{
	env,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::Duration,
};

use time::OffsetDateTime;

use fanout_domain::{Link, SearchResult, Source};
use fanout_service::{Error, Result, ResultSerializer, TwoTierCache};
use fanout_storage::DiskStore;

fn temp_dir() -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);

	env::temp_dir().join(format!("fanout_cache_test_{nanos}_{}_{ordinal}", std::process::id()))
}

/// Stores one title per line and nothing else.
struct TitlesOnly;
impl ResultSerializer for TitlesOnly {
	fn serialize(&self, results: &[SearchResult]) -> Result<Vec<u8>> {
		let titles: Vec<&str> = results.iter().map(|result| result.title.as_str()).collect();

		Ok(titles.join("\n").into_bytes())
	}

	fn deserialize(&self, payload: &[u8]) -> Result<Vec<SearchResult>> {
		let text = std::str::from_utf8(payload)
			.map_err(|err| Error::Cache { message: format!("Payload is not UTF-8: {err}") })?;

		Ok(text.lines().map(|title| SearchResult::new(title, Source::plugin("cached"))).collect())
	}
}

fn sample() -> Vec<SearchResult> {
	vec![
		SearchResult::new("foo", Source::plugin("alpha"))
			.with_link(Link::new("https://pan.quark.cn/s/1")),
	]
}

#[tokio::test]
async fn entries_expire_after_their_ttl() {
	let cache = TwoTierCache::new(Duration::from_secs(60), 16, None);

	cache.set("short", b"payload".to_vec(), Duration::from_millis(50));

	assert_eq!(cache.get("short").await, Some(b"payload".to_vec()));

	tokio::time::sleep(Duration::from_millis(100)).await;

	assert_eq!(cache.get("short").await, None);
	assert_eq!(cache.sweep().await, 1);
	assert!(cache.is_empty());
}

#[tokio::test]
async fn disabled_cache_never_hits() {
	let cache = TwoTierCache::disabled();

	cache.set_results("key", &sample());

	assert!(!cache.is_enabled());
	assert_eq!(cache.get_results("key").await, None);
}

#[tokio::test]
async fn undecodable_payload_is_a_miss() {
	let cache = TwoTierCache::new(Duration::from_secs(60), 16, None);

	cache.set("key", b"{not json".to_vec(), Duration::from_secs(60));

	assert!(cache.get("key").await.is_some());
	assert_eq!(cache.get_results("key").await, None);
}

#[tokio::test]
async fn results_round_trip_and_invalidate() {
	let cache = TwoTierCache::new(Duration::from_secs(60), 16, None);

	cache.set_results("key", &sample());

	assert_eq!(cache.get_results("key").await, Some(sample()));

	cache.invalidate("key").await;

	assert_eq!(cache.get_results("key").await, None);
}

#[tokio::test]
async fn durable_entries_are_promoted_into_memory() {
	let dir = temp_dir();
	let store = DiskStore::open(&dir).await.expect("Failed to open disk store.");
	let expires_at = OffsetDateTime::now_utc() + time::Duration::minutes(5);

	store.write("warm", b"from disk", expires_at).await.expect("Write must succeed.");

	let durable = DiskStore::open(&dir).await.expect("Failed to open disk store.");
	let cache = TwoTierCache::new(Duration::from_secs(60), 16, Some(durable));

	assert!(cache.is_empty());
	assert_eq!(cache.get("warm").await, Some(b"from disk".to_vec()));
	assert_eq!(cache.len(), 1);

	store.remove("warm").await.expect("Remove must succeed.");

	assert_eq!(cache.get("warm").await, Some(b"from disk".to_vec()));

	let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn writes_reach_the_durable_tier_in_the_background() {
	let dir = temp_dir();
	let durable = DiskStore::open(&dir).await.expect("Failed to open disk store.");
	let cache = TwoTierCache::new(Duration::from_secs(60), 16, Some(durable));
	let reader = DiskStore::open(&dir).await.expect("Failed to open disk store.");

	cache.set("key", b"payload".to_vec(), Duration::from_secs(60));

	let mut stored = None;

	for _ in 0..50 {
		stored = reader.read("key", OffsetDateTime::now_utc()).await.ok().flatten();

		if stored.is_some() {
			break;
		}

		tokio::time::sleep(Duration::from_millis(20)).await;
	}

	assert_eq!(stored.map(|entry| entry.payload), Some(b"payload".to_vec()));

	let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn back_to_back_writes_leave_the_latest_payload_on_disk() {
	let dir = temp_dir();
	let durable = DiskStore::open(&dir).await.expect("Failed to open disk store.");
	let cache = TwoTierCache::new(Duration::from_secs(60), 16, Some(durable));

	for round in 0..20_u8 {
		cache.set("key", vec![round], Duration::from_secs(60));
	}

	cache.flush().await;

	let reader = DiskStore::open(&dir).await.expect("Failed to open disk store.");
	let stored = reader.read("key", OffsetDateTime::now_utc()).await.expect("Read must succeed.");

	assert_eq!(stored.map(|entry| entry.payload), Some(vec![19]));

	let restarted = TwoTierCache::new(
		Duration::from_secs(60),
		16,
		Some(DiskStore::open(&dir).await.expect("Failed to open disk store.")),
	);

	assert_eq!(restarted.get("key").await, Some(vec![19]));

	let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn invalidate_is_ordered_after_pending_writes() {
	let dir = temp_dir();
	let durable = DiskStore::open(&dir).await.expect("Failed to open disk store.");
	let cache = TwoTierCache::new(Duration::from_secs(60), 16, Some(durable));

	cache.set("key", b"payload".to_vec(), Duration::from_secs(60));
	cache.invalidate("key").await;
	cache.flush().await;

	let reader = DiskStore::open(&dir).await.expect("Failed to open disk store.");

	assert_eq!(cache.get("key").await, None);
	assert_eq!(reader.read("key", OffsetDateTime::now_utc()).await.expect("Read must succeed."), None);

	let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn oversized_ttl_still_stores_the_entry() {
	let cache = TwoTierCache::new(Duration::from_secs(u64::MAX), 16, None);

	cache.set("key", b"payload".to_vec(), cache.ttl());

	assert_eq!(cache.get("key").await, Some(b"payload".to_vec()));
}

#[tokio::test]
async fn custom_serializer_controls_the_stored_payload() {
	let cache =
		TwoTierCache::new(Duration::from_secs(60), 16, None).with_serializer(Box::new(TitlesOnly));

	cache.set_results("key", &sample());

	assert_eq!(cache.get("key").await, Some(b"foo".to_vec()));

	let restored = cache.get_results("key").await.expect("Entry must be cached.");

	assert_eq!(restored.len(), 1);
	assert_eq!(restored[0].title, "foo");
	assert_eq!(restored[0].source, Source::plugin("cached"));
}
