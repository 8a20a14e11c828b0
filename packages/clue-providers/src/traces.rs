use serde_json::Value;

use clue_config::ProviderConfig;
use clue_domain::trace::Span;

use crate::Result;

pub async fn fetch_spans(cfg: &ProviderConfig, trace_id: &str) -> Result<Vec<Span>> {
	let client = crate::client(cfg)?;
	let url = crate::endpoint(cfg, ["traces", trace_id, "spans"])?;
	let json = crate::send_json(client.get(url), &format!("Trace {trace_id:?}")).await?;

	parse_spans_response(json)
}

/// Spans that fail to decode are skipped rather than failing the whole trace.
fn parse_spans_response(json: Value) -> Result<Vec<Span>> {
	let items = crate::unwrap_array(json, &["spans", "segments"], "Trace")?;

	Ok(items.into_iter().filter_map(|item| serde_json::from_value(item).ok()).collect())
}
