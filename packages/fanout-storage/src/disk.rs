use std::{
	io::ErrorKind,
	path::{Path, PathBuf},
	sync::atomic::{AtomicU64, Ordering},
};

use time::{Duration, OffsetDateTime};
use tokio::fs;

use crate::{Result, frame};

const RECORD_EXTENSION: &str = "bin";
const TEMP_EXTENSION: &str = "tmp";
const TEMP_GRACE: Duration = Duration::minutes(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEntry {
	pub payload: Vec<u8>,
	pub expires_at: OffsetDateTime,
}

#[derive(Debug)]
pub struct DiskStore {
	dir: PathBuf,
	temp_counter: AtomicU64,
}
impl DiskStore {
	pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
		let dir = dir.into();

		fs::create_dir_all(&dir).await?;

		Ok(Self { dir, temp_counter: AtomicU64::new(0) })
	}

	pub fn dir(&self) -> &Path {
		&self.dir
	}

	/// `None` for missing, expired, or foreign records. Never deletes anything.
	pub async fn read(&self, key: &str, now: OffsetDateTime) -> Result<Option<StoredEntry>> {
		let raw = match fs::read(self.record_path(key)).await {
			Ok(raw) => raw,
			Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
			Err(err) => return Err(err.into()),
		};
		let record = frame::decode(&raw)?;

		if record.key != key || record.expires_at <= now {
			return Ok(None);
		}

		Ok(Some(StoredEntry { payload: record.payload, expires_at: record.expires_at }))
	}

	/// Writes through a temp file and a rename so readers never see a torn record.
	pub async fn write(&self, key: &str, payload: &[u8], expires_at: OffsetDateTime) -> Result<u64> {
		let raw = frame::encode(key, expires_at, payload)?;
		let path = self.record_path(key);
		let ordinal = self.temp_counter.fetch_add(1, Ordering::Relaxed);
		let temp = path.with_extension(format!("{}.{ordinal}.{TEMP_EXTENSION}", std::process::id()));

		if let Err(err) = fs::write(&temp, &raw).await {
			let _ = fs::remove_file(&temp).await;

			return Err(err.into());
		}
		if let Err(err) = fs::rename(&temp, &path).await {
			let _ = fs::remove_file(&temp).await;

			return Err(err.into());
		}

		Ok(raw.len() as u64)
	}

	pub async fn remove(&self, key: &str) -> Result<bool> {
		match fs::remove_file(self.record_path(key)).await {
			Ok(()) => Ok(true),
			Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
			Err(err) => Err(err.into()),
		}
	}

	/// Deletes expired and unreadable records, plus temp files left behind by interrupted writes.
	/// Returns how many files were removed.
	pub async fn purge_expired(&self, now: OffsetDateTime) -> Result<u64> {
		let mut entries = fs::read_dir(&self.dir).await?;
		let mut removed = 0;

		while let Some(entry) = entries.next_entry().await? {
			let path = entry.path();
			let stale = match path.extension().and_then(|ext| ext.to_str()) {
				Some(RECORD_EXTENSION) => match fs::read(&path).await {
					Ok(raw) =>
						frame::decode(&raw).map(|record| record.expires_at <= now).unwrap_or(true),
					Err(err) if err.kind() == ErrorKind::NotFound => false,
					Err(err) => return Err(err.into()),
				},
				Some(TEMP_EXTENSION) => match entry.metadata().await.and_then(|meta| meta.modified()) {
					Ok(modified) => OffsetDateTime::from(modified) + TEMP_GRACE <= now,
					Err(err) if err.kind() == ErrorKind::NotFound => false,
					Err(err) => return Err(err.into()),
				},
				_ => false,
			};

			if !stale {
				continue;
			}

			match fs::remove_file(&path).await {
				Ok(()) => removed += 1,
				Err(err) if err.kind() == ErrorKind::NotFound => {},
				Err(err) => {
					tracing::warn!(error = %err, path = %path.display(), "Cache record removal failed.");
				},
			}
		}

		Ok(removed)
	}

	fn record_path(&self, key: &str) -> PathBuf {
		let name = blake3::hash(key.as_bytes()).to_hex();

		self.dir.join(format!("{name}.{RECORD_EXTENSION}"))
	}
}
