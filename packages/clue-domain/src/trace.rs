use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::instant::RawInstant;

/// One span as returned by the trace store.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Span {
	#[serde(default)]
	pub worker_name: Option<String>,
	#[serde(default)]
	pub request_id: Option<String>,
	#[serde(default, alias = "start_time")]
	pub start: Option<RawInstant>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TraceEntry {
	pub worker: String,
	pub request_id: String,
	#[serde(with = "crate::instant::option", skip_serializing_if = "Option::is_none")]
	pub started_at: Option<OffsetDateTime>,
}

/// Worker invocations under one trace, in discovery order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TraceMap {
	entries: Vec<TraceEntry>,
}

impl TraceMap {
	/// Orders spans by start instant. The sort is stable, and spans without a usable start keep
	/// store order after the timed ones. Spans lacking a worker or request id are dropped.
	pub fn from_spans(spans: Vec<Span>) -> Self {
		let mut entries: Vec<TraceEntry> = spans
			.into_iter()
			.filter_map(|span| {
				let worker = span.worker_name.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())?;
				let request_id =
					span.request_id.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())?;
				let started_at = span.start.as_ref().and_then(RawInstant::parse);

				Some(TraceEntry { worker, request_id, started_at })
			})
			.collect();

		entries.sort_by_key(|entry| (entry.started_at.is_none(), entry.started_at));

		Self { entries }
	}

	pub fn from_entries(entries: Vec<TraceEntry>) -> Self {
		Self { entries }
	}

	pub fn entries(&self) -> &[TraceEntry] {
		&self.entries
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn request_ids(&self) -> impl Iterator<Item = &str> {
		self.entries.iter().map(|entry| entry.request_id.as_str())
	}

	pub fn worker_for(&self, request_id: &str) -> Option<&str> {
		self.entries
			.iter()
			.find(|entry| entry.request_id == request_id)
			.map(|entry| entry.worker.as_str())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn span(worker: &str, request_id: &str, start: Option<&str>) -> Span {
		Span {
			worker_name: Some(worker.to_string()),
			request_id: Some(request_id.to_string()),
			start: start.map(|s| RawInstant::Text(s.to_string())),
		}
	}

	#[test]
	fn orders_by_start_and_keeps_untimed_spans_last() {
		let map = TraceMap::from_spans(vec![
			span("untimed", "req-0", None),
			span("classify", "req-2", Some("2025-03-01T10:00:05Z")),
			span("ocr", "req-1", Some("2025-03-01T10:00:01Z")),
		]);
		let workers: Vec<&str> = map.entries().iter().map(|e| e.worker.as_str()).collect();

		assert_eq!(workers, vec!["ocr", "classify", "untimed"]);
	}

	#[test]
	fn repeated_workers_are_kept_as_separate_entries() {
		let map = TraceMap::from_spans(vec![
			span("ocr", "req-1", Some("2025-03-01T10:00:01Z")),
			span("ocr", "req-2", Some("2025-03-01T10:00:02Z")),
		]);

		assert_eq!(map.len(), 2);
		assert_eq!(map.request_ids().collect::<Vec<_>>(), vec!["req-1", "req-2"]);
	}

	#[test]
	fn numeric_and_odd_starts_keep_the_span() {
		let spans: Vec<Span> = serde_json::from_value(serde_json::json!([
			{ "worker_name": "classify", "request_id": "req-2", "start_time": 1740823200.9 },
			{ "worker_name": "ocr", "request_id": "req-1", "start_time": 1740823200.1 },
			{ "worker_name": "late", "request_id": "req-3", "start_time": true }
		]))
		.expect("Failed to decode spans.");
		let map = TraceMap::from_spans(spans);

		assert_eq!(map.request_ids().collect::<Vec<_>>(), vec!["req-1", "req-2", "req-3"]);
		assert_eq!(map.entries()[2].started_at, None);
	}

	#[test]
	fn drops_spans_without_request_id() {
		let map = TraceMap::from_spans(vec![Span {
			worker_name: Some("ocr".to_string()),
			request_id: None,
			start: None,
		}]);

		assert!(map.is_empty());
	}
}
