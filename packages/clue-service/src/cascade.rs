//! Tier-by-tier search driver.
//!
//! Tiers run strictly in priority order. The first tier that yields an event ends the search;
//! within a tier each candidate queries its containers in fixed chunks so reports are reproducible.

use std::collections::BTreeSet;

use tokio::time::Instant;

use clue_config::Search;
use clue_domain::{
	log_group::LogContainer,
	strategy::{SearchCandidate, Strategy, Tier, TierKind},
	window::SearchWindow,
};

use crate::{
	SearchResult, SkippedStep, TierStatus,
	log_search::{Probe, Searcher},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CascadeState {
	Pending,
	Searching(TierKind),
	Found(TierKind),
	Exhausted,
}

/// Container limits applied to the unanchored tiers.
#[derive(Clone, Copy, Debug)]
pub struct ContainerLimits {
	pub case_identifier: usize,
	pub broad_fallback: usize,
}

/// One tier as handed to the controller, with the containers it may query.
#[derive(Clone, Copy, Debug)]
pub struct TierStep<'a> {
	pub tier: TierKind,
	pub candidates: &'a [SearchCandidate],
	pub containers: &'a [LogContainer],
}

/// Yields the strategy's tiers lazily, in priority order.
pub struct TierSteps<'a> {
	tiers: std::slice::Iter<'a, Tier>,
	containers: &'a [LogContainer],
	limits: ContainerLimits,
}

#[derive(Debug)]
pub(crate) struct CascadeRun {
	pub(crate) state: CascadeState,
	pub(crate) reached: Vec<bool>,
	pub(crate) statuses: Vec<TierStatus>,
	/// Only results that carry at least one event.
	pub(crate) results: Vec<SearchResult>,
	pub(crate) containers_searched: BTreeSet<String>,
	pub(crate) skipped: Vec<SkippedStep>,
	pub(crate) incomplete: bool,
}

pub(crate) struct Cascade<'a> {
	searcher: &'a Searcher,
	window: SearchWindow,
	max_events: u32,
	chunk_size: usize,
	limits: ContainerLimits,
}

impl ContainerLimits {
	pub fn from_config(cfg: &Search) -> Self {
		Self {
			case_identifier: cfg.case_identifier_containers as usize,
			broad_fallback: cfg.broad_fallback_containers as usize,
		}
	}

	fn for_tier(&self, tier: TierKind) -> Option<usize> {
		match tier {
			TierKind::CaseIdentifier => Some(self.case_identifier),
			TierKind::BroadFallback => Some(self.broad_fallback),
			_ => None,
		}
	}
}

impl<'a> TierSteps<'a> {
	pub fn new(
		strategy: &'a Strategy,
		containers: &'a [LogContainer],
		limits: ContainerLimits,
	) -> Self {
		Self { tiers: strategy.tiers.iter(), containers, limits }
	}
}

impl<'a> Iterator for TierSteps<'a> {
	type Item = TierStep<'a>;

	fn next(&mut self) -> Option<Self::Item> {
		let tier = self.tiers.next()?;
		let cap = self.limits.for_tier(tier.kind).unwrap_or(self.containers.len());
		let containers = &self.containers[..cap.min(self.containers.len())];

		Some(TierStep { tier: tier.kind, candidates: &tier.candidates, containers })
	}
}

impl CascadeRun {
	fn new(tiers: usize) -> Self {
		Self {
			state: CascadeState::Pending,
			reached: vec![false; tiers],
			statuses: vec![TierStatus::NotReached; tiers],
			results: Vec::new(),
			containers_searched: BTreeSet::new(),
			skipped: Vec::new(),
			incomplete: false,
		}
	}

	/// Runs with no containers: every tier stays unreached.
	pub(crate) fn without_containers(strategy: &Strategy, incomplete: bool) -> Self {
		let mut run = Self::new(strategy.tiers.len());

		for (index, tier) in strategy.tiers.iter().enumerate() {
			if tier.is_empty() {
				run.statuses[index] = TierStatus::NoCandidates;
			}
		}

		run.state = CascadeState::Exhausted;
		run.incomplete = incomplete;

		run
	}
}

impl<'a> Cascade<'a> {
	pub(crate) fn new(
		searcher: &'a Searcher,
		window: SearchWindow,
		max_events: u32,
		chunk_size: u32,
		limits: ContainerLimits,
	) -> Self {
		Self { searcher, window, max_events, chunk_size: chunk_size.max(1) as usize, limits }
	}

	pub(crate) async fn run(&self, strategy: &Strategy, containers: &[LogContainer]) -> CascadeRun {
		let mut run = CascadeRun::new(strategy.tiers.len());

		for (index, step) in TierSteps::new(strategy, containers, self.limits).enumerate() {
			if step.candidates.is_empty() {
				run.statuses[index] = TierStatus::NoCandidates;

				continue;
			}
			if step.containers.is_empty() {
				continue;
			}
			if Instant::now() >= self.searcher.deadline() {
				run.incomplete = true;

				break;
			}

			run.state = CascadeState::Searching(step.tier);
			run.reached[index] = true;

			tracing::debug!(
				tier = step.tier.label(),
				candidates = step.candidates.len(),
				containers = step.containers.len(),
				"Entering tier."
			);

			let found = self.run_tier(step, &mut run).await;

			if found {
				run.statuses[index] = TierStatus::Found;
				run.state = CascadeState::Found(step.tier);

				break;
			}
			if run.incomplete {
				run.statuses[index] = TierStatus::Incomplete;

				break;
			}

			run.statuses[index] = TierStatus::Exhausted;
		}

		if !matches!(run.state, CascadeState::Found(_)) {
			run.state = CascadeState::Exhausted;
		}

		run
	}

	/// Returns `true` once any chunk produced an event.
	async fn run_tier(&self, step: TierStep<'_>, run: &mut CascadeRun) -> bool {
		for candidate in step.candidates {
			let probe = Probe::from(candidate);

			for chunk in step.containers.chunks(self.chunk_size) {
				if Instant::now() >= self.searcher.deadline() {
					run.incomplete = true;

					return false;
				}

				let batch =
					self.searcher.search_batch(chunk, &probe, self.window, self.max_events).await;
				let mut found = false;

				for result in batch.results {
					run.containers_searched.insert(result.container.clone());

					if !result.events.is_empty() {
						found = true;

						run.results.push(result);
					}
				}

				run.skipped.extend(batch.skipped);
				run.incomplete |= batch.deadline_hit;

				if found {
					return true;
				}
				if run.incomplete {
					return false;
				}
			}
		}

		false
	}
}
