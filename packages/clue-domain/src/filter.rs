use std::collections::BTreeMap;

/// Error markers whose matches are dominated by benign records and need client-side filtering.
pub const HIGH_NOISE_MARKERS: [&str; 6] = ["[ERROR]", "[WARN]", "ERROR:", "WARN:", "Exception", "Failed"];
/// Raw over-fetch factor applied to high-noise markers.
pub const HIGH_NOISE_OVERFETCH: u32 = 5;
pub const MAX_MESSAGE_CHARS: usize = 1_000;

const INFO_PREFIX: &str = "[INFO]";
const LIFECYCLE_PREFIXES: [&str; 4] = ["INIT_START", "START", "END", "REPORT"];
const DENYLIST: [&str; 7] = [
	"Config:",
	"\"sample_json\"",
	"Processing event:",
	"Initialized",
	"Starting",
	"Debug:",
	"Trace:",
];
const EXPLICIT_ERROR_TERMS: [&str; 4] = ["ERROR", "EXCEPTION", "FAILED", "TIMEOUT"];
const ERROR_KEYWORDS: [&str; 12] = [
	"error",
	"exception",
	"failed",
	"failure",
	"timeout",
	"fatal",
	"critical",
	"panic",
	"abort",
	"crash",
	"denied",
	"refused",
];
const MAX_KEYWORDS: usize = 10;

pub fn is_high_noise_marker(pattern: &str) -> bool {
	HIGH_NOISE_MARKERS.contains(&pattern)
}

/// Returns `true` when a message adds nothing to a failure diagnosis.
pub fn should_exclude(message: &str, pattern_used: &str) -> bool {
	if is_high_noise_marker(pattern_used) {
		let trimmed = message.trim();

		if trimmed.starts_with(INFO_PREFIX) {
			return true;
		}
		if LIFECYCLE_PREFIXES.iter().any(|prefix| trimmed.starts_with(prefix)) {
			return true;
		}
	}
	if DENYLIST.iter().any(|needle| message.contains(needle)) {
		return true;
	}

	message.chars().count() > MAX_MESSAGE_CHARS
}

/// Unanchored matches must name an error explicitly to count as evidence.
pub fn mentions_error(message: &str) -> bool {
	let upper = message.to_uppercase();

	EXPLICIT_ERROR_TERMS.iter().any(|term| upper.contains(term))
}

/// Counts, per keyword, how many messages mention it. Keeps the ten most frequent; ties resolve
/// alphabetically.
pub fn error_keyword_counts<'a, I>(messages: I) -> BTreeMap<String, usize>
where
	I: IntoIterator<Item = &'a str>,
{
	let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();

	for message in messages {
		let lower = message.to_lowercase();

		for keyword in ERROR_KEYWORDS {
			if lower.contains(keyword) {
				*counts.entry(keyword).or_default() += 1;
			}
		}
	}

	let mut ranked: Vec<(&'static str, usize)> = counts.into_iter().collect();

	ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
	ranked.truncate(MAX_KEYWORDS);

	ranked.into_iter().map(|(keyword, count)| (keyword.to_string(), count)).collect()
}
