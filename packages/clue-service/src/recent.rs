use serde::Deserialize;
use time::OffsetDateTime;
use tokio::time::Instant;

use clue_config::{MAX_LOG_GROUPS_LIMIT, MAX_LOOKBACK_HOURS};
use clue_domain::window;

use crate::{
	ClueService, Error, RecentErrorsReport, Result, SkippedStep, log_search::Probe, report,
};

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RecentErrorsRequest {
	#[serde(default)]
	pub error_pattern: Option<String>,
	#[serde(default)]
	pub lookback_hours: Option<u32>,
	#[serde(default)]
	pub max_log_events: Option<u32>,
	#[serde(default)]
	pub max_log_groups: Option<u32>,
	#[serde(default)]
	pub deadline_ms: Option<u64>,
}

impl ClueService {
	/// Sweeps every container of the configured deployment for recent errors.
	///
	/// Unlike case correlation there is no anchor and no short-circuit: each container is queried
	/// once over `[now - lookback, now]`. A full listing page is fetched so the report can show how
	/// many containers exist beside how many were searched.
	pub async fn recent_errors(&self, req: RecentErrorsRequest) -> Result<RecentErrorsReport> {
		let params = self.search_params(
			req.error_pattern.as_deref(),
			req.max_log_events,
			req.max_log_groups,
			req.deadline_ms,
		)?;
		let lookback_hours =
			req.lookback_hours.unwrap_or(self.cfg.search.lookback_hours).clamp(1, MAX_LOOKBACK_HOURS);
		let deadline = Instant::now() + params.deadline;
		let deployment = self.cfg.deployment.name.as_str();
		let search_window = window::lookback_window(lookback_hours, OffsetDateTime::now_utc());
		let mut skipped = Vec::new();
		let mut incomplete = false;
		let prefix = match self.log_group_prefix(deployment, deadline).await {
			Ok((prefix, step)) => {
				skipped.extend(step);

				prefix
			},
			Err(err) => {
				incomplete = true;

				skipped.push(SkippedStep::for_target("deployment_outputs", deployment, &err));

				clue_domain::log_group::generic_prefix(deployment, &self.cfg.log_groups)
			},
		};
		let containers = if incomplete {
			Vec::new()
		} else {
			match self.list_log_groups(&prefix.prefix, MAX_LOG_GROUPS_LIMIT, deadline).await {
				Ok(containers) => containers,
				Err(err) => {
					incomplete |= matches!(err, Error::DeadlineExceeded { .. });

					tracing::warn!(prefix = %prefix.prefix, error = %err, "Log group resolution failed.");
					skipped.push(SkippedStep::for_target("list_log_groups", &prefix.prefix, &err));

					Vec::new()
				},
			}
		};
		let selected = &containers[..containers.len().min(params.max_log_groups as usize)];
		let probe = Probe::unanchored(&params.error_pattern);
		let batch = self
			.searcher(deadline)
			.search_batch(selected, &probe, search_window, params.max_log_events)
			.await;
		let containers_searched = batch.results.len();
		let results: Vec<_> =
			batch.results.into_iter().filter(|result| !result.events.is_empty()).collect();

		skipped.extend(batch.skipped);
		incomplete |= batch.deadline_hit;

		let report = RecentErrorsReport {
			deployment: deployment.to_string(),
			prefix: prefix.prefix,
			prefix_kind: prefix.kind,
			error_pattern: params.error_pattern,
			window: search_window,
			containers_found: containers.len(),
			containers_searched,
			containers_with_events: results.len(),
			total_events: report::total_events(&results),
			error_keywords: report::error_keywords(&results),
			results,
			skipped_steps: skipped,
			incomplete,
		};

		tracing::info!(
			deployment,
			containers_found = report.containers_found,
			total_events = report.total_events,
			incomplete = report.incomplete,
			"Recent error sweep finished."
		);

		Ok(report)
	}
}
