//! Instant parsing and RFC 3339 serialization shared by records, events, and reports.

pub mod option;

use serde::{Deserialize, Deserializer, Serializer};
use serde_json::Value;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// An instant as an upstream store sent it, before interpretation.
///
/// Integers are epoch milliseconds and floats are epoch seconds. Any other JSON value is kept so
/// the field can be reported as malformed without failing the surrounding record.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RawInstant {
	Millis(i64),
	Seconds(f64),
	Text(String),
	Other(Value),
}

impl RawInstant {
	pub fn parse(&self) -> Option<OffsetDateTime> {
		match self {
			Self::Millis(millis) => from_epoch_millis(*millis),
			Self::Seconds(seconds) => from_epoch_seconds(*seconds),
			Self::Text(text) => parse(text),
			Self::Other(_) => None,
		}
	}

	pub fn describe(&self) -> String {
		match self {
			Self::Millis(millis) => millis.to_string(),
			Self::Seconds(seconds) => seconds.to_string(),
			Self::Text(text) => text.clone(),
			Self::Other(value) => value.to_string(),
		}
	}
}

pub fn serialize<S>(value: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	let formatted = value.format(&Rfc3339).map_err(serde::ser::Error::custom)?;

	serializer.serialize_str(&formatted)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
where
	D: Deserializer<'de>,
{
	let raw = String::deserialize(deserializer)?;

	parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("Invalid instant {raw:?}.")))
}

/// Accepts RFC 3339 text or a bare count of epoch milliseconds.
pub fn parse(raw: &str) -> Option<OffsetDateTime> {
	let trimmed = raw.trim();

	if trimmed.is_empty() {
		return None;
	}
	if trimmed.bytes().all(|b| b.is_ascii_digit()) {
		return trimmed.parse::<i64>().ok().and_then(from_epoch_millis);
	}

	OffsetDateTime::parse(trimmed, &Rfc3339).ok()
}

pub fn from_epoch_millis(millis: i64) -> Option<OffsetDateTime> {
	OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000).ok()
}

pub fn from_epoch_seconds(seconds: f64) -> Option<OffsetDateTime> {
	if !seconds.is_finite() {
		return None;
	}

	let whole = seconds.trunc();
	let nanos = ((seconds - whole) * 1e9).round() as i64;

	OffsetDateTime::from_unix_timestamp(whole as i64)
		.ok()?
		.checked_add(time::Duration::nanoseconds(nanos))
}

pub fn to_epoch_millis(value: OffsetDateTime) -> i64 {
	(value.unix_timestamp_nanos() / 1_000_000) as i64
}

#[cfg(test)]
mod tests {
	use time::macros::datetime;

	use super::*;

	#[test]
	fn parses_rfc3339_with_zulu_suffix() {
		assert_eq!(parse("2025-03-01T10:00:00Z"), Some(datetime!(2025-03-01 10:00:00 UTC)));
	}

	#[test]
	fn parses_epoch_millis() {
		assert_eq!(parse("1740823200000"), Some(datetime!(2025-03-01 10:00:00 UTC)));
		assert_eq!(to_epoch_millis(datetime!(2025-03-01 10:00:00 UTC)), 1_740_823_200_000);
	}

	#[test]
	fn raw_instants_accept_fractional_seconds() {
		let raw: RawInstant =
			serde_json::from_value(serde_json::json!(1740823200.5)).expect("Failed to decode.");

		assert_eq!(raw.parse(), Some(datetime!(2025-03-01 10:00:00.5 UTC)));
	}

	#[test]
	fn raw_instants_keep_unexpected_values() {
		let raw: RawInstant =
			serde_json::from_value(serde_json::json!({ "at": 1 })).expect("Failed to decode.");

		assert_eq!(raw.parse(), None);
		assert_eq!(raw.describe(), r#"{"at":1}"#);
	}

	#[test]
	fn rejects_garbage() {
		assert_eq!(parse(""), None);
		assert_eq!(parse("yesterday"), None);
	}
}
