use serde::Serialize;
use time::OffsetDateTime;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LogEvent {
	#[serde(with = "crate::instant")]
	pub instant: OffsetDateTime,
	pub message: String,
	pub stream: String,
	/// Set for unanchored matches that may belong to a concurrent, unrelated case.
	#[serde(skip_serializing_if = "std::ops::Not::not")]
	pub caveat: bool,
}
