use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

pub use crate::instant::RawInstant;

/// Tracking-store record as delivered on the wire.
///
/// Accepts both the boundary field names and the pipeline's native attribute names.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawCaseRecord {
	#[serde(default, alias = "Status")]
	pub status: Option<String>,
	#[serde(default, alias = "InitialEventTime")]
	pub start: Option<RawInstant>,
	#[serde(default, alias = "CompletionTime")]
	pub end: Option<RawInstant>,
	#[serde(default, alias = "XRayTraceId")]
	pub trace_id: Option<String>,
	#[serde(default, rename = "TraceId")]
	pub legacy_trace_id: Option<String>,
	#[serde(default, alias = "ExecutionArn")]
	pub execution_ref: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CaseRecord {
	pub case_id: String,
	pub status: Option<String>,
	#[serde(with = "crate::instant::option")]
	pub start: Option<OffsetDateTime>,
	#[serde(with = "crate::instant::option")]
	pub end: Option<OffsetDateTime>,
	pub trace_id: Option<String>,
	pub execution_ref: Option<String>,
}

/// A field that was present but could not be interpreted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MalformedField {
	pub field: &'static str,
	pub raw: String,
}

impl CaseRecord {
	/// Builds a record, treating unparseable or blank fields as absent.
	pub fn from_raw(case_id: &str, raw: RawCaseRecord) -> (Self, Vec<MalformedField>) {
		let mut malformed = Vec::new();
		let mut parse_instant = |field: &'static str, value: Option<RawInstant>| {
			let value = value?;
			let parsed = value.parse();

			if parsed.is_none() {
				malformed.push(MalformedField { field, raw: value.describe() });
			}

			parsed
		};
		let start = parse_instant("start", raw.start);
		let end = parse_instant("end", raw.end);
		let record = Self {
			case_id: case_id.to_string(),
			status: non_blank(raw.status),
			start,
			end,
			trace_id: non_blank(raw.trace_id).or_else(|| non_blank(raw.legacy_trace_id)),
			execution_ref: non_blank(raw.execution_ref),
		};

		(record, malformed)
	}

	/// A record carrying only the identifier, used when the tracking store is unreachable.
	pub fn unknown(case_id: &str) -> Self {
		Self {
			case_id: case_id.to_string(),
			status: None,
			start: None,
			end: None,
			trace_id: None,
			execution_ref: None,
		}
	}

	pub fn is_terminal_failure(&self, failure_statuses: &[String]) -> bool {
		let Some(status) = self.status.as_deref() else {
			return false;
		};

		failure_statuses.iter().any(|candidate| candidate.trim().eq_ignore_ascii_case(status.trim()))
	}
}

fn non_blank(value: Option<String>) -> Option<String> {
	value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
	use time::macros::datetime;

	use super::*;

	#[test]
	fn accepts_native_attribute_names() {
		let raw: RawCaseRecord = serde_json::from_value(serde_json::json!({
			"Status": "FAILED",
			"InitialEventTime": "2025-03-01T10:00:00Z",
			"CompletionTime": 1740823800000_i64,
			"TraceId": "1-abc-def",
			"ExecutionArn": "arn:aws:states:us-east-1:1:execution:wf:run-42"
		}))
		.expect("Failed to decode raw record.");
		let (record, malformed) = CaseRecord::from_raw("doc.pdf", raw);

		assert!(malformed.is_empty());
		assert_eq!(record.status.as_deref(), Some("FAILED"));
		assert_eq!(record.start, Some(datetime!(2025-03-01 10:00:00 UTC)));
		assert_eq!(record.end, Some(datetime!(2025-03-01 10:10:00 UTC)));
		assert_eq!(record.trace_id.as_deref(), Some("1-abc-def"));
	}

	#[test]
	fn malformed_instants_are_reported_and_dropped() {
		let raw = RawCaseRecord {
			status: Some("FAILED".to_string()),
			start: Some(RawInstant::Text("not a time".to_string())),
			end: None,
			..Default::default()
		};
		let (record, malformed) = CaseRecord::from_raw("doc.pdf", raw);

		assert_eq!(record.start, None);
		assert_eq!(malformed, vec![MalformedField { field: "start", raw: "not a time".to_string() }]);
	}

	#[test]
	fn wrongly_typed_instants_do_not_lose_the_record() {
		let raw: RawCaseRecord = serde_json::from_value(serde_json::json!({
			"Status": "FAILED",
			"InitialEventTime": [2025, 3, 1],
			"CompletionTime": 1740823800.25,
			"XRayTraceId": "1-abc"
		}))
		.expect("Failed to decode raw record.");
		let (record, malformed) = CaseRecord::from_raw("doc.pdf", raw);

		assert_eq!(record.status.as_deref(), Some("FAILED"));
		assert_eq!(record.trace_id.as_deref(), Some("1-abc"));
		assert_eq!(record.start, None);
		assert_eq!(record.end, Some(datetime!(2025-03-01 10:10:00.25 UTC)));
		assert_eq!(malformed, vec![MalformedField { field: "start", raw: "[2025,3,1]".to_string() }]);
	}

	#[test]
	fn failure_status_matches_case_insensitively() {
		let mut record = CaseRecord::unknown("doc.pdf");

		assert!(!record.is_terminal_failure(&["FAILED".to_string()]));

		record.status = Some("failed".to_string());

		assert!(record.is_terminal_failure(&["FAILED".to_string()]));
	}
}
