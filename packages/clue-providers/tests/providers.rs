use reqwest::header::AUTHORIZATION;
use serde_json::Map;

use clue_config::ProviderConfig;
use clue_providers::Error;

fn provider(api_base: &str) -> ProviderConfig {
	ProviderConfig {
		api_base: api_base.to_string(),
		api_key: "secret".to_string(),
		timeout_ms: 1_000,
		default_headers: Map::new(),
	}
}

#[test]
fn builds_bearer_auth_header() {
	let headers =
		clue_providers::auth_headers("secret", &Map::new()).expect("Failed to build headers.");
	let value = headers.get(AUTHORIZATION).expect("Missing authorization header.");

	assert_eq!(value, "Bearer secret");
}

#[test]
fn rejects_non_string_default_header() {
	let mut extra = Map::new();

	extra.insert("x-tenant".to_string(), serde_json::json!(7));

	assert!(matches!(
		clue_providers::auth_headers("secret", &extra),
		Err(Error::InvalidConfig { .. })
	));
}

#[test]
fn endpoint_encodes_case_identifiers() {
	let url = clue_providers::endpoint(&provider("https://tracking.internal/api"), [
		"cases",
		"batch/2025 report.pdf",
	])
	.expect("Failed to build endpoint.");

	assert_eq!(url.as_str(), "https://tracking.internal/api/cases/batch%2F2025%20report.pdf");
}

#[test]
fn endpoint_rejects_invalid_base() {
	assert!(clue_providers::endpoint(&provider("not a url"), ["cases"]).is_err());
}

#[test]
fn throttling_and_server_errors_are_transient() {
	let status = |status| Error::Status { status, resource: "Case \"a\"".to_string() };

	assert!(status(429).is_transient());
	assert!(status(503).is_transient());
	assert!(!status(403).is_transient());
	assert!(!Error::NotFound { resource: "Case \"a\"".to_string() }.is_transient());
}
