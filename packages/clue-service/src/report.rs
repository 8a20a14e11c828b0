use std::collections::BTreeMap;

use serde::Serialize;

use clue_domain::{
	event::LogEvent,
	log_group::PrefixKind,
	strategy::{Strategy, TierKind},
	trace::TraceMap,
	window::SearchWindow,
};

pub const BROAD_MATCH_CAVEAT: &str = "May belong to a concurrent, unrelated case.";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
	Found,
	Exhausted,
	NotFound,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TierStatus {
	Found,
	Exhausted,
	NoCandidates,
	NotReached,
	Incomplete,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TierReport {
	pub tier: TierKind,
	pub ordinal: u8,
	pub pattern: Option<String>,
	pub anchors: Vec<String>,
	pub candidates: usize,
	pub reached: bool,
	pub status: TierStatus,
}

/// Events one query produced in one container.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SearchResult {
	pub container: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub tier: Option<TierKind>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub worker: Option<String>,
	pub pattern_used: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub caveat: Option<&'static str>,
	pub events: Vec<LogEvent>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SkippedStep {
	pub step: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub target: Option<String>,
	pub reason: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CorrelationReport {
	pub case_id: String,
	pub case_status: Option<String>,
	pub execution_ref: Option<String>,
	pub trace_id: Option<String>,
	pub outcome: Outcome,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub window: Option<SearchWindow>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub primary_failed_worker: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub attribution_policy: Option<&'static str>,
	pub worker_request_ids: TraceMap,
	pub strategy: Vec<TierReport>,
	pub total_events: usize,
	pub containers_searched: usize,
	pub containers_with_events: usize,
	pub results: Vec<SearchResult>,
	pub error_keywords: BTreeMap<String, usize>,
	pub skipped_steps: Vec<SkippedStep>,
	pub incomplete: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RecentErrorsReport {
	pub deployment: String,
	pub prefix: String,
	pub prefix_kind: PrefixKind,
	pub error_pattern: String,
	pub window: SearchWindow,
	pub containers_found: usize,
	pub containers_searched: usize,
	pub containers_with_events: usize,
	pub total_events: usize,
	pub results: Vec<SearchResult>,
	pub error_keywords: BTreeMap<String, usize>,
	pub skipped_steps: Vec<SkippedStep>,
	pub incomplete: bool,
}

impl SkippedStep {
	pub fn new(step: &str, reason: impl ToString) -> Self {
		Self { step: step.to_string(), target: None, reason: reason.to_string() }
	}

	pub fn for_target(step: &str, target: &str, reason: impl ToString) -> Self {
		Self { step: step.to_string(), target: Some(target.to_string()), reason: reason.to_string() }
	}
}

impl CorrelationReport {
	/// Report for a case the tracking store does not know. No search was attempted.
	pub fn not_found(case_id: &str) -> Self {
		Self {
			case_id: case_id.to_string(),
			case_status: None,
			execution_ref: None,
			trace_id: None,
			outcome: Outcome::NotFound,
			error: Some("not found".to_string()),
			window: None,
			primary_failed_worker: None,
			attribution_policy: None,
			worker_request_ids: TraceMap::default(),
			strategy: Vec::new(),
			total_events: 0,
			containers_searched: 0,
			containers_with_events: 0,
			results: Vec::new(),
			error_keywords: BTreeMap::new(),
			skipped_steps: Vec::new(),
			incomplete: false,
		}
	}
}

pub(crate) fn tier_reports(
	strategy: &Strategy,
	reached: &[bool],
	statuses: &[TierStatus],
) -> Vec<TierReport> {
	strategy
		.tiers
		.iter()
		.enumerate()
		.map(|(index, tier)| TierReport {
			tier: tier.kind,
			ordinal: tier.kind.ordinal(),
			pattern: tier.pattern().map(str::to_string),
			anchors: tier.anchors(),
			candidates: tier.candidates.len(),
			reached: reached.get(index).copied().unwrap_or(false),
			status: statuses.get(index).copied().unwrap_or(TierStatus::NotReached),
		})
		.collect()
}

pub(crate) fn error_keywords(results: &[SearchResult]) -> BTreeMap<String, usize> {
	clue_domain::filter::error_keyword_counts(
		results.iter().flat_map(|result| result.events.iter().map(|event| event.message.as_str())),
	)
}

pub(crate) fn total_events(results: &[SearchResult]) -> usize {
	results.iter().map(|result| result.events.len()).sum()
}
