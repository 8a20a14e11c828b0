use time::macros::datetime;

use clue_domain::{
	case::CaseRecord,
	filter,
	strategy::{
		self, FailureAttribution, LastDiscoveredWorker, StrategyInput, TierKind,
	},
	trace::{TraceEntry, TraceMap},
	window::{self, WindowSource},
};

fn failure_statuses() -> Vec<String> {
	vec!["FAILED".to_string()]
}

fn case(status: &str) -> CaseRecord {
	CaseRecord {
		case_id: "lending_package.pdf".to_string(),
		status: Some(status.to_string()),
		start: Some(datetime!(2025-03-01 10:00:00 UTC)),
		end: Some(datetime!(2025-03-01 10:20:00 UTC)),
		trace_id: Some("1-abc".to_string()),
		execution_ref: Some("arn:aws:states:us-east-1:1:execution:wf:run-42".to_string()),
	}
}

fn entry(worker: &str, request_id: &str) -> TraceEntry {
	TraceEntry { worker: worker.to_string(), request_id: request_id.to_string(), started_at: None }
}

fn build(case: &CaseRecord, trace: &TraceMap) -> strategy::Strategy {
	let statuses = failure_statuses();

	strategy::build_strategy(
		StrategyInput {
			case,
			trace,
			error_pattern: "ERROR",
			failure_statuses: &statuses,
			max_other_workers: 3,
		},
		&LastDiscoveredWorker,
	)
}

#[test]
fn failed_case_targets_last_discovered_worker() {
	let trace = TraceMap::from_entries(vec![entry("workerA", "req1"), entry("workerB", "req2")]);
	let strategy = build(&case("FAILED"), &trace);
	let kinds: Vec<TierKind> = strategy.tiers.iter().map(|tier| tier.kind).collect();

	assert_eq!(kinds, TierKind::ALL.to_vec());
	assert_eq!(strategy.primary_failed_worker.as_deref(), Some("workerB"));
	assert_eq!(strategy.tiers[0].anchors(), vec!["req2".to_string()]);
	assert_eq!(strategy.tiers[1].anchors(), vec!["req1".to_string()]);
	assert!(strategy.tiers[2].is_empty(), "request ids exist, execution tier must be empty");
	assert_eq!(strategy.tiers[3].pattern(), Some("lending_package"));
	assert_eq!(strategy.tiers[4].pattern(), Some("ERROR"));
	assert_eq!(strategy.attribution_policy, "last_discovered_worker");
}

#[test]
fn successful_case_has_no_primary_tier() {
	let trace = TraceMap::from_entries(vec![entry("workerA", "req1"), entry("workerB", "req2")]);
	let strategy = build(&case("COMPLETED"), &trace);

	assert!(strategy.tiers[0].is_empty());
	assert_eq!(strategy.primary_failed_worker, None);
	assert_eq!(strategy.tiers[1].anchors(), vec!["req1".to_string(), "req2".to_string()]);
}

#[test]
fn other_worker_tier_is_capped_and_deduplicated() {
	let trace = TraceMap::from_entries(vec![
		entry("a", "req1"),
		entry("b", "req1"),
		entry("c", "req3"),
		entry("d", "req4"),
		entry("e", "req5"),
		entry("f", "req6"),
	]);
	let strategy = build(&case("FAILED"), &trace);

	assert_eq!(strategy.tiers[0].anchors(), vec!["req6".to_string()]);
	assert_eq!(
		strategy.tiers[1].anchors(),
		vec!["req1".to_string(), "req3".to_string(), "req4".to_string()]
	);
	assert_eq!(strategy.tiers[1].candidates[0].worker.as_deref(), Some("a"));
}

#[test]
fn empty_trace_falls_back_to_execution_reference() {
	let strategy = build(&case("FAILED"), &TraceMap::default());

	assert!(strategy.tiers[0].is_empty());
	assert!(strategy.tiers[1].is_empty());
	assert_eq!(strategy.tiers[2].anchors(), vec!["run-42".to_string()]);
	assert_eq!(strategy.tiers[2].pattern(), Some("run-42"));
}

#[test]
fn empty_trace_without_execution_reference_starts_at_case_identifier() {
	let mut record = case("FAILED");

	record.trace_id = None;
	record.execution_ref = None;

	let strategy = build(&record, &TraceMap::default());
	let first_populated = strategy.tiers.iter().find(|tier| !tier.is_empty()).map(|tier| tier.kind);

	assert_eq!(first_populated, Some(TierKind::CaseIdentifier));
}

#[test]
fn attribution_policy_is_replaceable() {
	struct FirstWorker;

	impl FailureAttribution for FirstWorker {
		fn name(&self) -> &'static str {
			"first_worker"
		}

		fn primary_failure<'a>(
			&self,
			_case: &CaseRecord,
			trace: &'a TraceMap,
		) -> Option<&'a TraceEntry> {
			trace.entries().first()
		}
	}

	let trace = TraceMap::from_entries(vec![entry("workerA", "req1"), entry("workerB", "req2")]);
	let statuses = failure_statuses();
	let strategy = strategy::build_strategy(
		StrategyInput {
			case: &case("FAILED"),
			trace: &trace,
			error_pattern: "ERROR",
			failure_statuses: &statuses,
			max_other_workers: 3,
		},
		&FirstWorker,
	);

	assert_eq!(strategy.tiers[0].anchors(), vec!["req1".to_string()]);
	assert_eq!(strategy.tiers[1].anchors(), vec!["req2".to_string()]);
	assert_eq!(strategy.attribution_policy, "first_worker");
}

#[test]
fn window_pads_twenty_minute_case_by_two_minutes() {
	let record = case("FAILED");
	let window = window::search_window(record.start, record.end, 24, datetime!(2025-03-02 0:00 UTC));

	assert_eq!(window.start, datetime!(2025-03-01 09:58:00 UTC));
	assert_eq!(window.end, datetime!(2025-03-01 10:22:00 UTC));
	assert_eq!(window.source, WindowSource::CaseBounds);
}

#[test]
fn filter_keeps_errors_and_drops_bookkeeping() {
	assert!(filter::should_exclude("REPORT RequestId: 1 Duration: 3 ms", "[ERROR]"));
	assert!(!filter::should_exclude("[ERROR] KeyError: 'pages'", "[ERROR]"));
	assert!(filter::should_exclude(&"a".repeat(1_001), "anything"));
}
