use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use clue_config::LogGroups;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LogContainer {
	pub name: String,
	#[serde(with = "crate::instant::option")]
	pub created_at: Option<OffsetDateTime>,
	/// `None` means records never expire.
	pub retention_days: Option<u32>,
	pub stored_bytes: u64,
}

/// One key/value output published by a deployment.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct DeploymentOutput {
	#[serde(alias = "OutputKey")]
	pub key: String,
	#[serde(alias = "OutputValue")]
	pub value: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrefixKind {
	/// Derived from the workflow reference naming convention.
	Pattern,
	/// Built from the deployment name alone.
	Generic,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LogGroupPrefix {
	pub prefix: String,
	pub kind: PrefixKind,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub workflow_name: Option<String>,
}

/// Chooses the container-name prefix for a deployment.
///
/// The workflow reference output wins when it follows the naming convention; anything else falls
/// back to the generic template.
pub fn derive_prefix(
	deployment: &str,
	outputs: &[DeploymentOutput],
	workflow_output_key: &str,
	cfg: &LogGroups,
) -> LogGroupPrefix {
	let workflow_name = outputs
		.iter()
		.filter(|output| output.key == workflow_output_key)
		.find_map(|output| workflow_name(&output.value, &cfg.workflow_marker, &cfg.workflow_suffix));

	match workflow_name {
		Some(name) => LogGroupPrefix {
			prefix: cfg.pattern_prefix.replace("{name}", &name),
			kind: PrefixKind::Pattern,
			workflow_name: Some(name),
		},
		None => generic_prefix(deployment, cfg),
	}
}

pub fn generic_prefix(deployment: &str, cfg: &LogGroups) -> LogGroupPrefix {
	LogGroupPrefix {
		prefix: cfg.generic_prefix.replace("{deployment}", deployment.trim()),
		kind: PrefixKind::Generic,
		workflow_name: None,
	}
}

/// Extracts the nested deployment name from a workflow reference such as
/// `arn:aws:states:us-east-1:123:stateMachine:idp-main-DocumentProcessingWorkflow`.
pub fn workflow_name(reference: &str, marker: &str, suffix: &str) -> Option<String> {
	let (_, name) = reference.rsplit_once(marker)?;
	let name = name.trim();

	if !suffix.is_empty()
		&& let Some(stripped) = name.strip_suffix(suffix)
	{
		return (!stripped.is_empty()).then(|| stripped.to_string());
	}

	let (head, _) = name.rsplit_once('-')?;

	(!head.is_empty()).then(|| head.to_string())
}

/// Empty or very short prefixes would enumerate the whole store.
pub fn is_enumerable_prefix(prefix: &str, min_len: usize) -> bool {
	let trimmed = prefix.trim();

	!trimmed.is_empty() && trimmed.chars().count() >= min_len
}
