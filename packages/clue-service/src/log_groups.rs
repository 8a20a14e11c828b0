use tokio::time::Instant;

use clue_domain::log_group::{self, LogContainer, LogGroupPrefix};

use crate::{ClueService, Error, Result, SkippedStep, retry};

/// Containers discovered for one deployment plus the steps that degraded along the way.
#[derive(Clone, Debug)]
pub struct ResolvedGroups {
	pub prefix: LogGroupPrefix,
	pub containers: Vec<LogContainer>,
	pub skipped: Vec<SkippedStep>,
	pub deadline_hit: bool,
}

impl ClueService {
	/// Picks the container prefix for `deployment`.
	///
	/// A deployment-catalog failure degrades to the generic prefix and is returned as a skipped step.
	pub async fn log_group_prefix(
		&self,
		deployment: &str,
		deadline: Instant,
	) -> Result<(LogGroupPrefix, Option<SkippedStep>)> {
		let cfg = &self.cfg;
		let outputs = retry::with_retry(&self.retry_policy(), deadline, "deployment_outputs", || {
			self.stores.deployments.fetch_outputs(&cfg.providers.deployments, deployment)
		})
		.await;

		match outputs {
			Ok(outputs) => Ok((
				log_group::derive_prefix(
					deployment,
					&outputs,
					&cfg.deployment.workflow_output_key,
					&cfg.log_groups,
				),
				None,
			)),
			Err(err @ Error::DeadlineExceeded { .. }) => Err(err),
			Err(err) => {
				tracing::warn!(
					deployment,
					error = %err,
					"Deployment outputs unavailable. Falling back to the generic prefix."
				);

				Ok((
					log_group::generic_prefix(deployment, &cfg.log_groups),
					Some(SkippedStep::for_target("deployment_outputs", deployment, &err)),
				))
			},
		}
	}

	/// Lists containers under `prefix`, at most `max` of them.
	///
	/// Prefixes too short to be selective are rejected before the log store is contacted.
	pub async fn list_log_groups(
		&self,
		prefix: &str,
		max: u32,
		deadline: Instant,
	) -> Result<Vec<LogContainer>> {
		let min_len = self.cfg.log_groups.min_prefix_len;

		if !log_group::is_enumerable_prefix(prefix, min_len) {
			return Err(Error::InvalidPrefix { prefix: prefix.to_string(), min_len });
		}

		let cfg = &self.cfg.providers.logs;
		let mut containers =
			retry::with_retry(&self.retry_policy(), deadline, "list_log_groups", || {
				self.stores.logs.list_containers(cfg, prefix, max)
			})
			.await?;

		containers.truncate(max as usize);

		Ok(containers)
	}

	/// Prefix derivation plus container listing. Failures become skipped steps and leave the
	/// container list empty.
	pub async fn resolve_log_groups(
		&self,
		deployment: &str,
		max: u32,
		deadline: Instant,
	) -> ResolvedGroups {
		let (prefix, mut skipped) = match self.log_group_prefix(deployment, deadline).await {
			Ok((prefix, skipped)) => (prefix, skipped.into_iter().collect::<Vec<_>>()),
			Err(err) =>
				return ResolvedGroups {
					prefix: log_group::generic_prefix(deployment, &self.cfg.log_groups),
					containers: Vec::new(),
					skipped: vec![SkippedStep::for_target("deployment_outputs", deployment, &err)],
					deadline_hit: true,
				},
		};
		let mut deadline_hit = false;
		let containers = match self.list_log_groups(&prefix.prefix, max, deadline).await {
			Ok(containers) => containers,
			Err(err) => {
				deadline_hit = matches!(err, Error::DeadlineExceeded { .. });

				tracing::warn!(prefix = %prefix.prefix, error = %err, "Log group resolution failed.");
				skipped.push(SkippedStep::for_target("list_log_groups", &prefix.prefix, &err));

				Vec::new()
			},
		};

		tracing::debug!(
			deployment,
			prefix = %prefix.prefix,
			kind = ?prefix.kind,
			containers = containers.len(),
			"Resolved log groups."
		);

		ResolvedGroups { prefix, containers, skipped, deadline_hit }
	}
}
