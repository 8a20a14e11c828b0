use tokio::time::Instant;

use clue_domain::trace::TraceMap;

use crate::{ClueService, Result, retry};

impl ClueService {
	/// Builds the worker/request-id map for a trace. Without a trace id the map is empty.
	pub async fn correlate_trace(
		&self,
		trace_id: Option<&str>,
		deadline: Instant,
	) -> Result<TraceMap> {
		let Some(trace_id) = trace_id.map(str::trim).filter(|id| !id.is_empty()) else {
			return Ok(TraceMap::default());
		};
		let cfg = &self.cfg.providers.traces;
		let spans = retry::with_retry(&self.retry_policy(), deadline, "correlate_trace", || {
			self.stores.traces.fetch_spans(cfg, trace_id)
		})
		.await?;
		let span_count = spans.len();
		let map = TraceMap::from_spans(spans);

		if map.len() < span_count {
			tracing::debug!(
				trace_id,
				dropped = span_count - map.len(),
				"Dropped spans without a worker name or request id."
			);
		}

		Ok(map)
	}
}
