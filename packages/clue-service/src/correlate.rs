use std::time::Duration;

use serde::Deserialize;
use time::OffsetDateTime;
use tokio::time::Instant;

use clue_config::{MAX_LOG_EVENTS_LIMIT, MAX_LOG_GROUPS_LIMIT};
use clue_domain::{
	case::CaseRecord,
	strategy::{self, StrategyInput},
	trace::TraceMap,
	window,
};

use crate::{
	ClueService, CorrelationReport, Error, Outcome, Result, SkippedStep,
	cascade::{Cascade, CascadeRun, CascadeState, ContainerLimits},
	report,
};

#[derive(Clone, Debug, Default, Deserialize)]
pub struct CorrelateRequest {
	pub case_id: String,
	#[serde(default)]
	pub error_pattern: Option<String>,
	#[serde(default)]
	pub max_log_events: Option<u32>,
	#[serde(default)]
	pub max_log_groups: Option<u32>,
	#[serde(default)]
	pub deadline_ms: Option<u64>,
}

/// Request values after defaults and clamping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct SearchParams {
	pub(crate) error_pattern: String,
	pub(crate) max_log_events: u32,
	pub(crate) max_log_groups: u32,
	pub(crate) deadline: Duration,
}

impl ClueService {
	/// Correlates one case with the log records that explain it.
	///
	/// Only an invalid request is an error. Upstream failures degrade into `skipped_steps`, an
	/// unknown case yields a `not_found` report, and an expired deadline yields a partial report.
	pub async fn correlate_case(&self, req: CorrelateRequest) -> Result<CorrelationReport> {
		let case_id = req.case_id.trim().to_string();

		if case_id.is_empty() {
			return Err(Error::InvalidRequest { message: "case_id must be non-empty.".to_string() });
		}

		let params = self.search_params(
			req.error_pattern.as_deref(),
			req.max_log_events,
			req.max_log_groups,
			req.deadline_ms,
		)?;
		let deadline = Instant::now() + params.deadline;
		let mut skipped = Vec::new();
		let mut incomplete = false;
		let case = match self.resolve_case(&case_id, deadline).await {
			Ok(case) => case,
			Err(Error::NotFound { .. }) => {
				tracing::info!(case_id = %case_id, "Case not found in tracking store.");

				return Ok(CorrelationReport::not_found(&case_id));
			},
			Err(err) => {
				incomplete |= matches!(err, Error::DeadlineExceeded { .. });

				tracing::warn!(
					case_id = %case_id,
					error = %err,
					"Tracking store unavailable. Continuing without a case record."
				);
				skipped.push(SkippedStep::for_target("resolve_case", &case_id, &err));

				CaseRecord::unknown(&case_id)
			},
		};
		let (trace, groups) = tokio::join!(
			self.correlate_trace(case.trace_id.as_deref(), deadline),
			self.resolve_log_groups(&self.cfg.deployment.name, params.max_log_groups, deadline),
		);
		let trace = match trace {
			Ok(trace) => trace,
			Err(err) => {
				incomplete |= matches!(err, Error::DeadlineExceeded { .. });

				tracing::warn!(
					case_id = %case_id,
					error = %err,
					"Trace store unavailable. Continuing with an empty trace map."
				);
				skipped.push(SkippedStep::for_target(
					"correlate_trace",
					case.trace_id.as_deref().unwrap_or_default(),
					&err,
				));

				TraceMap::default()
			},
		};

		skipped.extend(groups.skipped);
		incomplete |= groups.deadline_hit;

		let search_window = window::search_window(
			case.start,
			case.end,
			self.cfg.search.lookback_hours,
			OffsetDateTime::now_utc(),
		);
		let strategy = strategy::build_strategy(
			StrategyInput {
				case: &case,
				trace: &trace,
				error_pattern: &params.error_pattern,
				failure_statuses: &self.cfg.search.failure_statuses,
				max_other_workers: self.cfg.search.max_other_workers as usize,
			},
			self.attribution.as_ref(),
		);
		let run = if incomplete || groups.containers.is_empty() {
			CascadeRun::without_containers(&strategy, incomplete)
		} else {
			let searcher = self.searcher(deadline);
			let cascade = Cascade::new(
				&searcher,
				search_window,
				params.max_log_events,
				self.cfg.search.max_concurrent_queries,
				ContainerLimits::from_config(&self.cfg.search),
			);

			cascade.run(&strategy, &groups.containers).await
		};

		skipped.extend(run.skipped);

		let outcome = match run.state {
			CascadeState::Found(_) => Outcome::Found,
			_ => Outcome::Exhausted,
		};
		let report = CorrelationReport {
			case_id: case.case_id.clone(),
			case_status: case.status.clone(),
			execution_ref: case.execution_ref.clone(),
			trace_id: case.trace_id.clone(),
			outcome,
			error: None,
			window: Some(search_window),
			primary_failed_worker: strategy.primary_failed_worker.clone(),
			attribution_policy: Some(strategy.attribution_policy),
			worker_request_ids: trace,
			strategy: report::tier_reports(&strategy, &run.reached, &run.statuses),
			total_events: report::total_events(&run.results),
			containers_searched: run.containers_searched.len(),
			containers_with_events: run.results.len(),
			error_keywords: report::error_keywords(&run.results),
			results: run.results,
			skipped_steps: skipped,
			incomplete: run.incomplete,
		};

		tracing::info!(
			case_id = %report.case_id,
			outcome = ?report.outcome,
			total_events = report.total_events,
			containers_searched = report.containers_searched,
			incomplete = report.incomplete,
			"Case correlation finished."
		);

		Ok(report)
	}

	pub(crate) fn search_params(
		&self,
		error_pattern: Option<&str>,
		max_log_events: Option<u32>,
		max_log_groups: Option<u32>,
		deadline_ms: Option<u64>,
	) -> Result<SearchParams> {
		let search = &self.cfg.search;

		if deadline_ms == Some(0) {
			return Err(Error::InvalidRequest {
				message: "deadline_ms must be greater than zero.".to_string(),
			});
		}

		let error_pattern = error_pattern
			.map(str::trim)
			.filter(|pattern| !pattern.is_empty())
			.unwrap_or(&search.error_pattern)
			.to_string();

		Ok(SearchParams {
			error_pattern,
			max_log_events: max_log_events
				.unwrap_or(search.max_log_events)
				.clamp(1, MAX_LOG_EVENTS_LIMIT),
			max_log_groups: max_log_groups
				.unwrap_or(search.max_log_groups)
				.clamp(1, MAX_LOG_GROUPS_LIMIT),
			deadline: Duration::from_millis(deadline_ms.unwrap_or(search.deadline_ms)),
		})
	}
}
