use serde_json::Value;

use clue_config::ProviderConfig;
use clue_domain::case::RawCaseRecord;

use crate::{Error, Result};

pub async fn fetch_case(cfg: &ProviderConfig, case_id: &str) -> Result<RawCaseRecord> {
	let client = crate::client(cfg)?;
	let url = crate::endpoint(cfg, ["cases", case_id])?;
	let json = crate::send_json(client.get(url), &format!("Case {case_id:?}")).await?;

	parse_case_response(json)
}

fn parse_case_response(json: Value) -> Result<RawCaseRecord> {
	let record = match json {
		Value::Object(mut map) => match map.remove("case") {
			Some(inner @ Value::Object(_)) => inner,
			Some(_) =>
				return Err(Error::InvalidResponse {
					message: "Case response field case must be an object.".to_string(),
				}),
			None => Value::Object(map),
		},
		_ =>
			return Err(Error::InvalidResponse {
				message: "Case response must be a JSON object.".to_string(),
			}),
	};

	Ok(serde_json::from_value(record)?)
}

#[cfg(test)]
mod tests {
	use clue_domain::case::RawInstant;

	use super::*;

	#[test]
	fn parses_bare_record() {
		let json = serde_json::json!({
			"status": "FAILED",
			"start": "2025-03-01T10:00:00Z",
			"end": 1740823800000_i64,
			"trace_id": "1-abc"
		});
		let record = parse_case_response(json).expect("parse failed");

		assert_eq!(record.status.as_deref(), Some("FAILED"));
		assert_eq!(record.start, Some(RawInstant::Text("2025-03-01T10:00:00Z".to_string())));
		assert_eq!(record.end, Some(RawInstant::Millis(1_740_823_800_000)));
	}

	#[test]
	fn parses_wrapped_record() {
		let json = serde_json::json!({ "case": { "Status": "COMPLETED" } });
		let record = parse_case_response(json).expect("parse failed");

		assert_eq!(record.status.as_deref(), Some("COMPLETED"));
	}

	#[test]
	fn rejects_non_object() {
		assert!(parse_case_response(serde_json::json!(["FAILED"])).is_err());
	}
}
