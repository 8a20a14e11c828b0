use std::sync::Arc;

use tokio::{sync::Semaphore, task::JoinSet, time::Instant};

use clue_config::ProviderConfig;
use clue_domain::{
	event::LogEvent,
	filter,
	log_group::LogContainer,
	query::{self, EventQuery},
	strategy::{SearchCandidate, TierKind},
	window::SearchWindow,
};

use crate::{
	ClueService, Error, LogStore, Result, SearchResult, SkippedStep,
	report::BROAD_MATCH_CAVEAT,
	retry::{self, RetryPolicy},
};

/// What to look for in one container.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Probe {
	pub tier: Option<TierKind>,
	pub pattern: String,
	pub request_id: Option<String>,
	pub worker: Option<String>,
}

/// Results of one batch of container queries, in container order.
#[derive(Debug, Default)]
pub(crate) struct BatchOutcome {
	pub(crate) results: Vec<SearchResult>,
	pub(crate) skipped: Vec<SkippedStep>,
	pub(crate) deadline_hit: bool,
}

/// Issues container queries against one log store under a shared deadline and concurrency limit.
#[derive(Clone)]
pub(crate) struct Searcher {
	logs: Arc<dyn LogStore>,
	provider: Arc<ProviderConfig>,
	retry: RetryPolicy,
	deadline: Instant,
	permits: Arc<Semaphore>,
}

impl Probe {
	pub fn unanchored(pattern: &str) -> Self {
		Self { tier: None, pattern: pattern.to_string(), request_id: None, worker: None }
	}

	fn requires_error_mention(&self) -> bool {
		self.tier.is_some_and(TierKind::requires_error_mention)
	}

	fn carries_caveat(&self) -> bool {
		self.tier.is_some_and(TierKind::carries_caveat)
	}
}

impl From<&SearchCandidate> for Probe {
	fn from(candidate: &SearchCandidate) -> Self {
		Self {
			tier: Some(candidate.tier),
			pattern: candidate.pattern.clone(),
			request_id: candidate.request_id.clone(),
			worker: candidate.worker.clone(),
		}
	}
}

impl Searcher {
	pub(crate) fn new(
		logs: Arc<dyn LogStore>,
		provider: ProviderConfig,
		retry: RetryPolicy,
		deadline: Instant,
		max_concurrent_queries: u32,
	) -> Self {
		Self {
			logs,
			provider: Arc::new(provider),
			retry,
			deadline,
			permits: Arc::new(Semaphore::new(max_concurrent_queries.max(1) as usize)),
		}
	}

	pub(crate) fn deadline(&self) -> Instant {
		self.deadline
	}

	pub(crate) async fn search(
		&self,
		container: &str,
		probe: &Probe,
		window: SearchWindow,
		max_events: u32,
	) -> Result<SearchResult> {
		let query = EventQuery {
			container: container.to_string(),
			filter: query::build_filter_pattern(&probe.pattern, probe.request_id.as_deref()),
			start: window.start,
			end: window.end,
			limit: query::raw_query_limit(&probe.pattern, max_events),
		};
		let raw = retry::with_retry(&self.retry, self.deadline, "query_events", || {
			self.logs.query_events(&self.provider, &query)
		})
		.await?;
		let raw_count = raw.len();
		let events = keep_events(raw, probe, max_events);

		tracing::debug!(
			container,
			filter = %query.filter,
			raw = raw_count,
			kept = events.len(),
			"Container query finished."
		);

		Ok(SearchResult {
			container: container.to_string(),
			tier: probe.tier,
			worker: probe.worker.clone(),
			pattern_used: query.filter,
			caveat: probe.carries_caveat().then_some(BROAD_MATCH_CAVEAT),
			events,
		})
	}

	/// Queries every container concurrently, bounded by the shared permit pool.
	///
	/// A failed container is recorded as skipped; the others still report.
	pub(crate) async fn search_batch(
		&self,
		containers: &[LogContainer],
		probe: &Probe,
		window: SearchWindow,
		max_events: u32,
	) -> BatchOutcome {
		let mut tasks = JoinSet::new();

		for (index, container) in containers.iter().enumerate() {
			let searcher = self.clone();
			let probe = probe.clone();
			let name = container.name.clone();

			tasks.spawn(async move {
				let _permit = searcher.permits.clone().acquire_owned().await.ok();
				let result = searcher.search(&name, &probe, window, max_events).await;

				(index, name, result)
			});
		}

		let mut finished = Vec::with_capacity(containers.len());
		let mut outcome = BatchOutcome::default();

		while let Some(joined) = tasks.join_next().await {
			match joined {
				Ok(done) => finished.push(done),
				Err(err) => {
					tracing::error!(error = %err, "Container query task failed.");
					outcome.skipped.push(SkippedStep::new("query_events", &err));
				},
			}
		}

		finished.sort_by_key(|(index, _, _)| *index);

		for (_, name, result) in finished {
			match result {
				Ok(result) => outcome.results.push(result),
				Err(err) => {
					if matches!(err, Error::DeadlineExceeded { .. }) {
						outcome.deadline_hit = true;
					} else {
						tracing::warn!(container = %name, error = %err, "Skipping container.");
					}

					outcome.skipped.push(SkippedStep::for_target("query_events", &name, &err));
				},
			}
		}

		outcome
	}
}

impl ClueService {
	/// Runs one bounded query for `candidate` in `container` and filters the raw events.
	pub async fn search_container(
		&self,
		container: &str,
		candidate: &SearchCandidate,
		window: SearchWindow,
		max_events: u32,
		deadline: Instant,
	) -> Result<SearchResult> {
		self.searcher(deadline)
			.search(container, &Probe::from(candidate), window, max_events)
			.await
	}

	pub(crate) fn searcher(&self, deadline: Instant) -> Searcher {
		Searcher::new(
			self.stores.logs.clone(),
			self.cfg.providers.logs.clone(),
			self.retry_policy(),
			deadline,
			self.cfg.search.max_concurrent_queries,
		)
	}
}

fn keep_events(raw: Vec<LogEvent>, probe: &Probe, max_events: u32) -> Vec<LogEvent> {
	let require_error = probe.requires_error_mention();
	let caveat = probe.carries_caveat();

	raw.into_iter()
		.filter(|event| !filter::should_exclude(&event.message, &probe.pattern))
		.filter(|event| !require_error || filter::mentions_error(&event.message))
		.take(max_events as usize)
		.map(|mut event| {
			event.caveat = caveat;

			event
		})
		.collect()
}
