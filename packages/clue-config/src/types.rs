use serde::Deserialize;
use serde_json::{Map, Value};

pub const MAX_LOG_EVENTS_LIMIT: u32 = 50;
pub const MAX_LOG_GROUPS_LIMIT: u32 = 50;
pub const MAX_LOOKBACK_HOURS: u32 = 168;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub deployment: Deployment,
	#[serde(default)]
	pub search: Search,
	#[serde(default)]
	pub log_groups: LogGroups,
	#[serde(default)]
	pub retry: Retry,
	pub providers: Providers,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Deployment {
	pub name: String,
	/// Deployment output that holds the workflow reference used to derive container prefixes.
	#[serde(default = "default_workflow_output_key")]
	pub workflow_output_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Search {
	#[serde(default = "default_error_pattern")]
	pub error_pattern: String,
	#[serde(default = "default_max_log_events")]
	pub max_log_events: u32,
	#[serde(default = "default_max_log_groups")]
	pub max_log_groups: u32,
	#[serde(default = "default_lookback_hours")]
	pub lookback_hours: u32,
	#[serde(default = "default_max_concurrent_queries")]
	pub max_concurrent_queries: u32,
	#[serde(default = "default_deadline_ms")]
	pub deadline_ms: u64,
	#[serde(default = "default_max_other_workers")]
	pub max_other_workers: u32,
	#[serde(default = "default_case_identifier_containers")]
	pub case_identifier_containers: u32,
	#[serde(default = "default_broad_fallback_containers")]
	pub broad_fallback_containers: u32,
	/// Case statuses treated as terminal failures. Compared case-insensitively.
	#[serde(default = "default_failure_statuses")]
	pub failure_statuses: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogGroups {
	#[serde(default = "default_min_prefix_len")]
	pub min_prefix_len: usize,
	#[serde(default = "default_workflow_marker")]
	pub workflow_marker: String,
	#[serde(default = "default_workflow_suffix")]
	pub workflow_suffix: String,
	/// Must contain `{name}`.
	#[serde(default = "default_pattern_prefix")]
	pub pattern_prefix: String,
	/// Must contain `{deployment}`.
	#[serde(default = "default_generic_prefix")]
	pub generic_prefix: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Retry {
	#[serde(default = "default_max_attempts")]
	pub max_attempts: u32,
	#[serde(default = "default_base_backoff_ms")]
	pub base_backoff_ms: u64,
	#[serde(default = "default_max_backoff_ms")]
	pub max_backoff_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Providers {
	pub tracking: ProviderConfig,
	pub traces: ProviderConfig,
	pub logs: ProviderConfig,
	pub deployments: ProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
	pub api_base: String,
	pub api_key: String,
	#[serde(default = "default_timeout_ms")]
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

impl Default for Search {
	fn default() -> Self {
		Self {
			error_pattern: default_error_pattern(),
			max_log_events: default_max_log_events(),
			max_log_groups: default_max_log_groups(),
			lookback_hours: default_lookback_hours(),
			max_concurrent_queries: default_max_concurrent_queries(),
			deadline_ms: default_deadline_ms(),
			max_other_workers: default_max_other_workers(),
			case_identifier_containers: default_case_identifier_containers(),
			broad_fallback_containers: default_broad_fallback_containers(),
			failure_statuses: default_failure_statuses(),
		}
	}
}

impl Default for LogGroups {
	fn default() -> Self {
		Self {
			min_prefix_len: default_min_prefix_len(),
			workflow_marker: default_workflow_marker(),
			workflow_suffix: default_workflow_suffix(),
			pattern_prefix: default_pattern_prefix(),
			generic_prefix: default_generic_prefix(),
		}
	}
}

impl Default for Retry {
	fn default() -> Self {
		Self {
			max_attempts: default_max_attempts(),
			base_backoff_ms: default_base_backoff_ms(),
			max_backoff_ms: default_max_backoff_ms(),
		}
	}
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_workflow_output_key() -> String {
	"StateMachineArn".to_string()
}

fn default_error_pattern() -> String {
	"ERROR".to_string()
}

fn default_max_log_events() -> u32 {
	10
}

fn default_max_log_groups() -> u32 {
	20
}

fn default_lookback_hours() -> u32 {
	24
}

fn default_max_concurrent_queries() -> u32 {
	4
}

fn default_deadline_ms() -> u64 {
	30_000
}

fn default_max_other_workers() -> u32 {
	3
}

fn default_case_identifier_containers() -> u32 {
	3
}

fn default_broad_fallback_containers() -> u32 {
	2
}

fn default_failure_statuses() -> Vec<String> {
	vec!["FAILED".to_string()]
}

fn default_min_prefix_len() -> usize {
	5
}

fn default_workflow_marker() -> String {
	":stateMachine:".to_string()
}

fn default_workflow_suffix() -> String {
	"-DocumentProcessingWorkflow".to_string()
}

fn default_pattern_prefix() -> String {
	"/{name}/lambda".to_string()
}

fn default_generic_prefix() -> String {
	"/aws/lambda/{deployment}".to_string()
}

fn default_max_attempts() -> u32 {
	3
}

fn default_base_backoff_ms() -> u64 {
	200
}

fn default_max_backoff_ms() -> u64 {
	5_000
}

fn default_timeout_ms() -> u64 {
	10_000
}
