use serde::Serialize;
use time::{Duration, OffsetDateTime};

const MAX_BUFFER: Duration = Duration::minutes(2);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowSource {
	CaseBounds,
	Lookback,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SearchWindow {
	#[serde(with = "crate::instant")]
	pub start: OffsetDateTime,
	#[serde(with = "crate::instant")]
	pub end: OffsetDateTime,
	pub source: WindowSource,
	pub buffer_seconds: f64,
}

/// Derives the query range for one case.
///
/// With both bounds the range is padded by `min(2 minutes, 10% of the duration)` on each side,
/// which keeps neighbouring cases in the same containers out of the result. Otherwise it falls back
/// to `[now - lookback_hours, now]`.
pub fn search_window(
	start: Option<OffsetDateTime>,
	end: Option<OffsetDateTime>,
	lookback_hours: u32,
	now: OffsetDateTime,
) -> SearchWindow {
	if let (Some(start), Some(end)) = (start, end) {
		let duration = (end - start).max(Duration::ZERO);
		let buffer = (duration / 10_i32).min(MAX_BUFFER);

		return SearchWindow {
			start: start - buffer,
			end: end.max(start) + buffer,
			source: WindowSource::CaseBounds,
			buffer_seconds: buffer.as_seconds_f64(),
		};
	}

	lookback_window(lookback_hours, now)
}

pub fn lookback_window(lookback_hours: u32, now: OffsetDateTime) -> SearchWindow {
	SearchWindow {
		start: now - Duration::hours(i64::from(lookback_hours)),
		end: now,
		source: WindowSource::Lookback,
		buffer_seconds: 0.0,
	}
}

#[cfg(test)]
mod tests {
	use time::macros::datetime;

	use super::*;

	#[test]
	fn twenty_minute_case_gets_two_minute_buffer() {
		let start = datetime!(2025-03-01 10:00:00 UTC);
		let end = datetime!(2025-03-01 10:20:00 UTC);
		let window = search_window(Some(start), Some(end), 24, end);

		assert_eq!(window.start, datetime!(2025-03-01 09:58:00 UTC));
		assert_eq!(window.end, datetime!(2025-03-01 10:22:00 UTC));
		assert_eq!(window.buffer_seconds, 120.0);
		assert_eq!(window.source, WindowSource::CaseBounds);
	}

	#[test]
	fn short_case_gets_proportional_buffer() {
		let start = datetime!(2025-03-01 10:00:00 UTC);
		let end = datetime!(2025-03-01 10:05:00 UTC);
		let window = search_window(Some(start), Some(end), 24, end);

		assert_eq!(window.buffer_seconds, 30.0);
		assert_eq!(window.start, datetime!(2025-03-01 09:59:30 UTC));
	}

	#[test]
	fn long_case_buffer_is_capped() {
		let start = datetime!(2025-03-01 10:00:00 UTC);
		let end = datetime!(2025-03-01 14:00:00 UTC);
		let window = search_window(Some(start), Some(end), 24, end);

		assert_eq!(window.buffer_seconds, 120.0);
	}

	#[test]
	fn missing_bound_uses_lookback() {
		let now = datetime!(2025-03-02 00:00:00 UTC);
		let window = search_window(Some(datetime!(2025-03-01 10:00:00 UTC)), None, 6, now);

		assert_eq!(window.start, datetime!(2025-03-01 18:00:00 UTC));
		assert_eq!(window.end, now);
		assert_eq!(window.buffer_seconds, 0.0);
		assert_eq!(window.source, WindowSource::Lookback);
	}

	#[test]
	fn inverted_bounds_never_produce_inverted_window() {
		let start = datetime!(2025-03-01 10:00:00 UTC);
		let end = datetime!(2025-03-01 09:00:00 UTC);
		let window = search_window(Some(start), Some(end), 24, start);

		assert!(window.end >= window.start);
	}
}
