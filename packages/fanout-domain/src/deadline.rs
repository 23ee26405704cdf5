use std::time::{Duration, Instant};

/// Point in time by which a source call should give up.
///
/// Adapters check it cooperatively; the executor enforces it regardless.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
	at: Option<Instant>,
}
impl Deadline {
	pub fn after(timeout: Duration) -> Self {
		Self { at: Instant::now().checked_add(timeout) }
	}

	pub fn unbounded() -> Self {
		Self { at: None }
	}

	/// `None` when the deadline is unbounded.
	pub fn remaining(&self) -> Option<Duration> {
		self.at.map(|at| at.saturating_duration_since(Instant::now()))
	}

	pub fn is_expired(&self) -> bool {
		self.at.map(|at| Instant::now() >= at).unwrap_or(false)
	}

	/// The earlier of the two deadlines.
	pub fn min(self, other: Self) -> Self {
		match (self.at, other.at) {
			(Some(a), Some(b)) => Self { at: Some(a.min(b)) },
			(Some(a), None) => Self { at: Some(a) },
			(None, b) => Self { at: b },
		}
	}

	/// Caps `timeout` by the time left before the deadline.
	pub fn clamp(&self, timeout: Duration) -> Duration {
		match self.remaining() {
			Some(remaining) => timeout.min(remaining),
			None => timeout,
		}
	}
}
