use time::OffsetDateTime;

use crate::{Error, Result};

pub const MAGIC: &[u8; 4] = b"FOC1";

const EXPIRY_LEN: usize = 16;
const KEY_LEN_LEN: usize = 4;
const HEADER_LEN: usize = MAGIC.len() + EXPIRY_LEN + KEY_LEN_LEN;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
	pub key: String,
	pub expires_at: OffsetDateTime,
	pub payload: Vec<u8>,
}

/// `MAGIC | expires_at (i128 unix nanos, BE) | key length (u32, BE) | key | payload`
pub fn encode(key: &str, expires_at: OffsetDateTime, payload: &[u8]) -> Result<Vec<u8>> {
	let key_len = u32::try_from(key.len())
		.map_err(|_| Error::InvalidArgument("Cache key is too long.".to_string()))?;
	let mut out = Vec::with_capacity(HEADER_LEN + key.len() + payload.len());

	out.extend_from_slice(MAGIC);
	out.extend_from_slice(&expires_at.unix_timestamp_nanos().to_be_bytes());
	out.extend_from_slice(&key_len.to_be_bytes());
	out.extend_from_slice(key.as_bytes());
	out.extend_from_slice(payload);

	Ok(out)
}

pub fn decode(raw: &[u8]) -> Result<Record> {
	if raw.len() < HEADER_LEN {
		return Err(Error::Corrupt("Record is shorter than its header.".to_string()));
	}
	if &raw[..MAGIC.len()] != MAGIC {
		return Err(Error::Corrupt("Record magic mismatch.".to_string()));
	}

	let mut expiry = [0_u8; EXPIRY_LEN];

	expiry.copy_from_slice(&raw[MAGIC.len()..MAGIC.len() + EXPIRY_LEN]);

	let expires_at = OffsetDateTime::from_unix_timestamp_nanos(i128::from_be_bytes(expiry))
		.map_err(|err| Error::Corrupt(format!("Record expiry is out of range: {err}.")))?;
	let mut key_len = [0_u8; KEY_LEN_LEN];

	key_len.copy_from_slice(&raw[MAGIC.len() + EXPIRY_LEN..HEADER_LEN]);

	let key_end = HEADER_LEN + u32::from_be_bytes(key_len) as usize;

	if raw.len() < key_end {
		return Err(Error::Corrupt("Record key is truncated.".to_string()));
	}

	let key = std::str::from_utf8(&raw[HEADER_LEN..key_end])
		.map_err(|err| Error::Corrupt(format!("Record key is not UTF-8: {err}.")))?
		.to_string();

	Ok(Record { key, expires_at, payload: raw[key_end..].to_vec() })
}
