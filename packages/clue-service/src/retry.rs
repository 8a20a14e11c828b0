use std::{future::Future, time::Duration};

use tokio::time::{self, Instant};

use crate::{Error, Result};

#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
	pub max_attempts: u32,
	pub base_backoff_ms: u64,
	pub max_backoff_ms: u64,
}
impl RetryPolicy {
	pub fn from_config(cfg: &clue_config::Retry) -> Self {
		Self {
			max_attempts: cfg.max_attempts.max(1),
			base_backoff_ms: cfg.base_backoff_ms,
			max_backoff_ms: cfg.max_backoff_ms,
		}
	}

	/// `base * 2^(attempt - 1)`, capped at `max_backoff_ms`.
	pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
		let exp = attempt.max(1).saturating_sub(1).min(16);
		let raw = self.base_backoff_ms.saturating_mul(1_u64 << exp);

		Duration::from_millis(raw.min(self.max_backoff_ms))
	}
}

/// Runs `call` until it succeeds, fails permanently, or runs out of attempts.
///
/// Every attempt and every backoff sleep is cut at `deadline`; nothing starts once it has passed.
pub(crate) async fn with_retry<T, F, Fut>(
	policy: &RetryPolicy,
	deadline: Instant,
	step: &str,
	mut call: F,
) -> Result<T>
where
	F: FnMut() -> Fut,
	Fut: Future<Output = Result<T>>,
{
	let mut attempt = 1;

	loop {
		if Instant::now() >= deadline {
			return Err(deadline_exceeded(step));
		}

		let err = match time::timeout_at(deadline, call()).await {
			Ok(Ok(value)) => return Ok(value),
			Ok(Err(err)) => err,
			Err(_) => return Err(deadline_exceeded(step)),
		};

		if !err.is_retryable() || attempt >= policy.max_attempts {
			return Err(err);
		}

		let backoff = policy.backoff_for_attempt(attempt);

		tracing::warn!(
			step,
			attempt,
			backoff_ms = backoff.as_millis() as u64,
			error = %err,
			"Transient upstream failure. Retrying."
		);

		if time::timeout_at(deadline, time::sleep(backoff)).await.is_err() {
			return Err(deadline_exceeded(step));
		}

		attempt += 1;
	}
}

fn deadline_exceeded(step: &str) -> Error {
	Error::DeadlineExceeded { step: step.to_string() }
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicU32, Ordering};

	use super::*;

	fn policy() -> RetryPolicy {
		RetryPolicy { max_attempts: 3, base_backoff_ms: 200, max_backoff_ms: 500 }
	}

	#[test]
	fn backoff_doubles_and_caps() {
		let policy = policy();

		assert_eq!(policy.backoff_for_attempt(1), Duration::from_millis(200));
		assert_eq!(policy.backoff_for_attempt(2), Duration::from_millis(400));
		assert_eq!(policy.backoff_for_attempt(3), Duration::from_millis(500));
		assert_eq!(policy.backoff_for_attempt(0), Duration::from_millis(200));
	}

	#[tokio::test(start_paused = true)]
	async fn retries_transient_failures_until_success() {
		let calls = AtomicU32::new(0);
		let deadline = Instant::now() + Duration::from_secs(10);
		let value = with_retry(&policy(), deadline, "fetch", || {
			let call = calls.fetch_add(1, Ordering::SeqCst);

			async move {
				if call < 2 {
					Err(Error::UpstreamUnavailable { message: "503".to_string() })
				} else {
					Ok(7)
				}
			}
		})
		.await
		.expect("Third attempt must succeed.");

		assert_eq!(value, 7);
		assert_eq!(calls.load(Ordering::SeqCst), 3);
	}

	#[tokio::test(start_paused = true)]
	async fn permanent_failures_are_not_retried() {
		let calls = AtomicU32::new(0);
		let deadline = Instant::now() + Duration::from_secs(10);
		let result: Result<()> = with_retry(&policy(), deadline, "fetch", || {
			calls.fetch_add(1, Ordering::SeqCst);

			async { Err(Error::NotFound { message: "case".to_string() }) }
		})
		.await;

		assert!(matches!(result, Err(Error::NotFound { .. })));
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test(start_paused = true)]
	async fn backoff_sleep_stops_at_deadline() {
		let deadline = Instant::now() + Duration::from_millis(100);
		let result: Result<()> = with_retry(&policy(), deadline, "fetch", || async {
			Err(Error::UpstreamUnavailable { message: "timeout".to_string() })
		})
		.await;

		assert!(matches!(result, Err(Error::DeadlineExceeded { .. })));
	}
}
