use serde::Deserialize;
use serde_json::Value;

use clue_config::ProviderConfig;
use clue_domain::{event::LogEvent, instant, log_group::LogContainer, query::EventQuery};

use crate::{Error, Result};

#[derive(Debug, Deserialize)]
struct WireContainer {
	#[serde(alias = "logGroupName")]
	name: String,
	#[serde(default, alias = "creationTime")]
	created_ms: Option<i64>,
	#[serde(default, alias = "retentionInDays")]
	retention_days: Option<u32>,
	#[serde(default, alias = "storedBytes")]
	stored_bytes: u64,
}

#[derive(Debug, Deserialize)]
struct WireEvent {
	#[serde(alias = "timestamp")]
	timestamp_ms: i64,
	#[serde(default)]
	message: String,
	#[serde(default, alias = "logStreamName")]
	stream: String,
}

pub async fn list_containers(
	cfg: &ProviderConfig,
	prefix: &str,
	limit: u32,
) -> Result<Vec<LogContainer>> {
	let client = crate::client(cfg)?;
	let mut url = crate::endpoint(cfg, ["containers"])?;

	url.query_pairs_mut().append_pair("prefix", prefix).append_pair("limit", &limit.to_string());

	let json = crate::send_json(client.get(url), &format!("Containers under {prefix:?}")).await?;

	parse_containers_response(json)
}

pub async fn query_events(cfg: &ProviderConfig, query: &EventQuery) -> Result<Vec<LogEvent>> {
	let client = crate::client(cfg)?;
	let url = crate::endpoint(cfg, ["containers", &query.container, "events:filter"])?;
	let body = serde_json::json!({
		"filter": query.filter,
		"start_ms": instant::to_epoch_millis(query.start),
		"end_ms": instant::to_epoch_millis(query.end),
		"limit": query.limit,
	});
	let json =
		crate::send_json(client.post(url).json(&body), &format!("Container {:?}", query.container))
			.await?;

	parse_events_response(json)
}

fn parse_containers_response(json: Value) -> Result<Vec<LogContainer>> {
	let items = crate::unwrap_array(json, &["containers", "logGroups"], "Containers")?;

	items
		.into_iter()
		.map(|item| {
			let wire: WireContainer = serde_json::from_value(item)?;

			Ok(LogContainer {
				name: wire.name,
				created_at: wire.created_ms.and_then(instant::from_epoch_millis),
				retention_days: wire.retention_days,
				stored_bytes: wire.stored_bytes,
			})
		})
		.collect()
}

fn parse_events_response(json: Value) -> Result<Vec<LogEvent>> {
	let items = crate::unwrap_array(json, &["events"], "Events")?;

	items
		.into_iter()
		.map(|item| {
			let wire: WireEvent = serde_json::from_value(item)?;
			let instant = instant::from_epoch_millis(wire.timestamp_ms).ok_or_else(|| {
				Error::InvalidResponse {
					message: format!("Event timestamp {} is out of range.", wire.timestamp_ms),
				}
			})?;

			Ok(LogEvent { instant, message: wire.message, stream: wire.stream, caveat: false })
		})
		.collect()
}
