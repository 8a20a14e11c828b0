use serde_json::Value;

use clue_config::ProviderConfig;
use clue_domain::log_group::DeploymentOutput;

use crate::Result;

pub async fn fetch_outputs(
	cfg: &ProviderConfig,
	deployment: &str,
) -> Result<Vec<DeploymentOutput>> {
	let client = crate::client(cfg)?;
	let url = crate::endpoint(cfg, ["deployments", deployment, "outputs"])?;
	let json = crate::send_json(client.get(url), &format!("Deployment {deployment:?}")).await?;

	parse_outputs_response(json)
}

fn parse_outputs_response(json: Value) -> Result<Vec<DeploymentOutput>> {
	let items = crate::unwrap_array(json, &["outputs", "Outputs"], "Deployment outputs")?;

	items.into_iter().map(|item| Ok(serde_json::from_value(item)?)).collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_native_output_names() {
		let json = serde_json::json!({
			"Outputs": [
				{ "OutputKey": "StateMachineArn", "OutputValue": "arn:aws:states:r:1:stateMachine:x-y" }
			]
		});
		let outputs = parse_outputs_response(json).expect("parse failed");

		assert_eq!(outputs[0].key, "StateMachineArn");
		assert_eq!(outputs[0].value, "arn:aws:states:r:1:stateMachine:x-y");
	}

	#[test]
	fn rejects_output_without_value() {
		let json = serde_json::json!([{ "key": "StateMachineArn" }]);

		assert!(parse_outputs_response(json).is_err());
	}
}
