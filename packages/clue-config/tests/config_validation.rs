use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use clue_config::{Config, Error};

const SAMPLE_CONFIG_TOML: &str = include_str!("fixtures/sample_config.toml");

fn write_temp_config(payload: String) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("clue_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn base_config() -> Config {
	toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse test config.")
}

fn sample_toml_without(section: &str) -> String {
	let mut value: Value =
		toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse sample config.");
	let root = value.as_table_mut().expect("Sample config must be a table.");

	root.remove(section);

	toml::to_string(&value).expect("Failed to render sample config.")
}

#[test]
fn loads_sample_config_and_trims_api_base() {
	let path = write_temp_config(SAMPLE_CONFIG_TOML.to_string());
	let result = clue_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let cfg = result.expect("Sample config must load.");

	assert_eq!(cfg.deployment.name, "idp-prod");
	assert_eq!(cfg.providers.tracking.api_base, "http://127.0.0.1:9101");
	assert_eq!(
		cfg.providers.tracking.default_headers.get("x-tenant").and_then(|v| v.as_str()),
		Some("acme")
	);
}

#[test]
fn optional_sections_fall_back_to_defaults() {
	let mut payload = sample_toml_without("search");

	payload = {
		let mut value: Value = toml::from_str(&payload).expect("Failed to parse payload.");
		let root = value.as_table_mut().expect("Payload must be a table.");

		root.remove("log_groups");
		root.remove("retry");

		toml::to_string(&value).expect("Failed to render payload.")
	};

	let path = write_temp_config(payload);
	let result = clue_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let cfg = result.expect("Config without optional sections must load.");

	assert_eq!(cfg.search.error_pattern, "ERROR");
	assert_eq!(cfg.search.max_log_events, 10);
	assert_eq!(cfg.search.max_log_groups, 20);
	assert_eq!(cfg.search.lookback_hours, 24);
	assert_eq!(cfg.search.max_other_workers, 3);
	assert_eq!(cfg.search.failure_statuses, vec!["FAILED".to_string()]);
	assert_eq!(cfg.log_groups.min_prefix_len, 5);
	assert_eq!(cfg.log_groups.generic_prefix, "/aws/lambda/{deployment}");
	assert_eq!(cfg.retry.max_attempts, 3);
}

#[test]
fn missing_file_reports_read_error() {
	let path = env::temp_dir().join("clue_config_test_definitely_missing.toml");
	let err = clue_config::load(&path).expect_err("Expected read error.");

	assert!(matches!(err, Error::ReadConfig { .. }), "Unexpected error: {err}");
}

#[test]
fn deployment_section_is_required() {
	let path = write_temp_config(sample_toml_without("deployment"));
	let result = clue_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let err = result.expect_err("Expected parse error.");

	assert!(matches!(err, Error::ParseConfig { .. }), "Unexpected error: {err}");
}

#[test]
fn max_log_events_is_bounded() {
	let mut cfg = base_config();

	cfg.search.max_log_events = 51;

	let err = clue_config::validate(&cfg).expect_err("Expected max_log_events validation error.");

	assert!(
		err.to_string().contains("search.max_log_events must be in the range 1-50."),
		"Unexpected error: {err}"
	);
}

#[test]
fn lookback_hours_must_be_positive() {
	let mut cfg = base_config();

	cfg.search.lookback_hours = 0;

	let err = clue_config::validate(&cfg).expect_err("Expected lookback validation error.");

	assert!(
		err.to_string().contains("search.lookback_hours must be in the range 1-168."),
		"Unexpected error: {err}"
	);
}

#[test]
fn pattern_prefix_requires_name_placeholder() {
	let mut cfg = base_config();

	cfg.log_groups.pattern_prefix = "/static/lambda".to_string();

	let err = clue_config::validate(&cfg).expect_err("Expected pattern prefix validation error.");

	assert!(err.to_string().contains("log_groups.pattern_prefix must contain {name}."));
}

#[test]
fn provider_api_key_must_be_non_empty() {
	let mut cfg = base_config();

	cfg.providers.logs.api_key = "  ".to_string();

	let err = clue_config::validate(&cfg).expect_err("Expected api_key validation error.");

	assert!(
		err.to_string().contains("Provider logs api_key must be non-empty."),
		"Unexpected error: {err}"
	);
}

#[test]
fn backoff_bounds_must_be_ordered() {
	let mut cfg = base_config();

	cfg.retry.base_backoff_ms = 10_000;
	cfg.retry.max_backoff_ms = 500;

	assert!(clue_config::validate(&cfg).is_err());
}
