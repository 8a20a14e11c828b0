//! Priority-ordered search tiers derived from a case record and its trace.

use std::collections::HashSet;

use serde::Serialize;

use crate::{
	case::CaseRecord,
	trace::{TraceEntry, TraceMap},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TierKind {
	PrimaryFailure,
	OtherWorker,
	ExecutionReference,
	CaseIdentifier,
	BroadFallback,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SearchCandidate {
	pub tier: TierKind,
	/// Base pattern handed to the store and to the event filter.
	pub pattern: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub request_id: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub worker: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub execution_ref: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tier {
	pub kind: TierKind,
	pub candidates: Vec<SearchCandidate>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Strategy {
	pub tiers: Vec<Tier>,
	pub primary_failed_worker: Option<String>,
	pub attribution_policy: &'static str,
}

pub struct StrategyInput<'a> {
	pub case: &'a CaseRecord,
	pub trace: &'a TraceMap,
	pub error_pattern: &'a str,
	pub failure_statuses: &'a [String],
	pub max_other_workers: usize,
}

/// Picks the worker invocation most likely responsible for a failed case.
///
/// Implementations only guess; the cascade treats the answer as a search hint.
pub trait FailureAttribution
where
	Self: Send + Sync,
{
	fn name(&self) -> &'static str;

	fn primary_failure<'a>(
		&self,
		case: &CaseRecord,
		trace: &'a TraceMap,
	) -> Option<&'a TraceEntry>;
}

/// Heuristic: the last worker in trace discovery order is assumed to be the one that failed.
///
/// Nothing in the trace proves this; it only reflects that a failing step usually ends the run.
#[derive(Clone, Copy, Debug, Default)]
pub struct LastDiscoveredWorker;

impl TierKind {
	pub const ALL: [Self; 5] = [
		Self::PrimaryFailure,
		Self::OtherWorker,
		Self::ExecutionReference,
		Self::CaseIdentifier,
		Self::BroadFallback,
	];

	pub fn ordinal(self) -> u8 {
		match self {
			Self::PrimaryFailure => 1,
			Self::OtherWorker => 2,
			Self::ExecutionReference => 3,
			Self::CaseIdentifier => 4,
			Self::BroadFallback => 5,
		}
	}

	pub fn label(self) -> &'static str {
		match self {
			Self::PrimaryFailure => "primary_failure",
			Self::OtherWorker => "other_worker",
			Self::ExecutionReference => "execution_reference",
			Self::CaseIdentifier => "case_identifier",
			Self::BroadFallback => "broad_fallback",
		}
	}

	/// Unanchored tier whose matches must also name an error explicitly.
	pub fn requires_error_mention(self) -> bool {
		matches!(self, Self::CaseIdentifier)
	}

	/// Matches may come from a concurrent, unrelated case.
	pub fn carries_caveat(self) -> bool {
		matches!(self, Self::BroadFallback)
	}
}

impl SearchCandidate {
	pub fn anchor(&self) -> Option<&str> {
		self.request_id.as_deref().or(self.execution_ref.as_deref())
	}
}

impl Tier {
	pub fn is_empty(&self) -> bool {
		self.candidates.is_empty()
	}

	/// The pattern reported for the whole tier.
	pub fn pattern(&self) -> Option<&str> {
		self.candidates.first().map(|candidate| candidate.pattern.as_str())
	}

	pub fn anchors(&self) -> Vec<String> {
		self.candidates.iter().filter_map(|c| c.anchor().map(str::to_string)).collect()
	}
}

impl FailureAttribution for LastDiscoveredWorker {
	fn name(&self) -> &'static str {
		"last_discovered_worker"
	}

	fn primary_failure<'a>(
		&self,
		_case: &CaseRecord,
		trace: &'a TraceMap,
	) -> Option<&'a TraceEntry> {
		trace.entries().last()
	}
}

pub fn build_strategy(input: StrategyInput<'_>, attribution: &dyn FailureAttribution) -> Strategy {
	let StrategyInput { case, trace, error_pattern, failure_statuses, max_other_workers } = input;
	let mut used: HashSet<&str> = HashSet::new();
	let mut primary = Vec::new();
	let mut primary_failed_worker = None;

	if case.is_terminal_failure(failure_statuses)
		&& let Some(entry) = attribution.primary_failure(case, trace)
	{
		used.insert(entry.request_id.as_str());
		primary_failed_worker = Some(entry.worker.clone());
		primary.push(request_candidate(TierKind::PrimaryFailure, error_pattern, entry));
	}

	let mut others = Vec::new();

	for entry in trace.entries() {
		if others.len() >= max_other_workers {
			break;
		}
		if used.insert(entry.request_id.as_str()) {
			others.push(request_candidate(TierKind::OtherWorker, error_pattern, entry));
		}
	}

	let mut execution = Vec::new();

	if trace.is_empty()
		&& let Some(token) = case.execution_ref.as_deref().and_then(execution_token)
	{
		execution.push(SearchCandidate {
			tier: TierKind::ExecutionReference,
			pattern: token.clone(),
			request_id: None,
			worker: None,
			execution_ref: Some(token),
		});
	}

	let mut case_identifier = Vec::new();
	let identifier = case_identifier_pattern(&case.case_id);

	if !identifier.is_empty() {
		case_identifier.push(unanchored(TierKind::CaseIdentifier, identifier));
	}

	let broad = vec![unanchored(TierKind::BroadFallback, error_pattern.to_string())];

	let tiers = [primary, others, execution, case_identifier, broad]
		.into_iter()
		.zip(TierKind::ALL)
		.map(|(candidates, kind)| Tier { kind, candidates })
		.collect();

	Strategy { tiers, primary_failed_worker, attribution_policy: attribution.name() }
}

/// Coarse token for an execution reference: the segment after the last `:`.
pub fn execution_token(execution_ref: &str) -> Option<String> {
	let token = execution_ref.rsplit(':').next().unwrap_or_default().trim();

	(!token.is_empty()).then(|| token.to_string())
}

/// Derives a searchable token from a case id: the file extension is dropped and separator runs
/// become `-`.
pub fn case_identifier_pattern(case_id: &str) -> String {
	let trimmed = case_id.trim();
	let stem = match trimmed.rsplit_once('.') {
		Some((stem, ext))
			if !stem.is_empty()
				&& !ext.is_empty()
				&& ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
			stem,
		_ => trimmed,
	};
	let joined = stem
		.split(|c: char| matches!(c, '.' | '/' | '\\') || c.is_whitespace())
		.filter(|part| !part.is_empty())
		.collect::<Vec<_>>()
		.join("-");

	joined.trim_matches('-').to_string()
}

fn request_candidate(tier: TierKind, error_pattern: &str, entry: &TraceEntry) -> SearchCandidate {
	SearchCandidate {
		tier,
		pattern: error_pattern.to_string(),
		request_id: Some(entry.request_id.clone()),
		worker: Some(entry.worker.clone()),
		execution_ref: None,
	}
}

fn unanchored(tier: TierKind, pattern: String) -> SearchCandidate {
	SearchCandidate { tier, pattern, request_id: None, worker: None, execution_ref: None }
}
