use time::OffsetDateTime;

use crate::filter;

/// One bounded log-store query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventQuery {
	pub container: String,
	/// Store-side filter expression; empty matches everything.
	pub filter: String,
	pub start: OffsetDateTime,
	pub end: OffsetDateTime,
	pub limit: u32,
}

/// Builds the store-side filter expression for one query.
///
/// An anchor and a base pattern combine into a conjunctive term list so only the anchored
/// invocation's error lines match.
pub fn build_filter_pattern(base_pattern: &str, request_id: Option<&str>) -> String {
	let base = base_pattern.trim();
	let request_id = request_id.map(str::trim).filter(|id| !id.is_empty());

	match (request_id, base.is_empty()) {
		(Some(request_id), false) => format!("[{request_id}, {}]", sanitize_term(base)),
		(Some(request_id), true) => request_id.to_string(),
		(None, false) => sanitize_term(base),
		(None, true) => String::new(),
	}
}

/// Number of raw events to request so that `max_events` survive filtering.
pub fn raw_query_limit(base_pattern: &str, max_events: u32) -> u32 {
	if filter::is_high_noise_marker(base_pattern) {
		max_events.saturating_mul(filter::HIGH_NOISE_OVERFETCH)
	} else {
		max_events
	}
}

fn sanitize_term(term: &str) -> String {
	term.replace(':', "")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn combines_request_id_with_pattern() {
		assert_eq!(build_filter_pattern("ERROR:", Some("req-9")), "[req-9, ERROR]");
	}

	#[test]
	fn single_component_is_used_alone() {
		assert_eq!(build_filter_pattern("", Some("req-9")), "req-9");
		assert_eq!(build_filter_pattern("WARN:", None), "WARN");
		assert_eq!(build_filter_pattern("  ", Some("  ")), "");
	}

	#[test]
	fn overfetches_only_for_noisy_markers() {
		assert_eq!(raw_query_limit("[ERROR]", 10), 50);
		assert_eq!(raw_query_limit("Exception", 4), 20);
		assert_eq!(raw_query_limit("ERROR", 10), 10);
		assert_eq!(raw_query_limit("report-7", 10), 10);
	}
}
