use std::{sync::Arc, time::Duration};

use tokio::{
	sync::{Semaphore, mpsc},
	time::{self, Instant},
};

use crate::BoxFuture;

/// Runs `tasks` with at most `concurrency_limit` in flight and returns one slot per task, in
/// input order.
///
/// The call returns no later than `timeout` after it starts. A task that has not finished by
/// then yields `None`; its spawned runner is dropped at the deadline and never joined. Queued
/// tasks that only get a permit after the deadline are not started.
pub async fn execute_batch<T>(
	tasks: Vec<BoxFuture<'static, T>>,
	concurrency_limit: usize,
	timeout: Duration,
) -> Vec<Option<T>>
where
	T: Send + 'static,
{
	let deadline = Instant::now() + timeout;
	let total = tasks.len();
	let mut slots: Vec<Option<T>> = (0..total).map(|_| None).collect();

	if total == 0 {
		return slots;
	}

	let semaphore = Arc::new(Semaphore::new(concurrency_limit.clamp(1, total)));
	let (tx, mut rx) = mpsc::channel(total);

	for (idx, task) in tasks.into_iter().enumerate() {
		let semaphore = semaphore.clone();
		let tx = tx.clone();

		tokio::spawn(async move {
			let Ok(Ok(_permit)) = time::timeout_at(deadline, semaphore.acquire_owned()).await else {
				return;
			};

			if Instant::now() >= deadline {
				return;
			}
			if let Ok(value) = time::timeout_at(deadline, task).await {
				let _ = tx.send((idx, value)).await;
			}
		});
	}

	drop(tx);

	let mut pending = total;

	while pending > 0 {
		match time::timeout_at(deadline, rx.recv()).await {
			Ok(Some((idx, value))) => {
				slots[idx] = Some(value);
				pending -= 1;
			},
			Ok(None) | Err(_) => break,
		}
	}

	slots
}
