use tokio::time::Instant;

use clue_domain::case::CaseRecord;

use crate::{ClueService, Result, retry};

impl ClueService {
	/// Fetches the tracking record for one case.
	///
	/// Fields that cannot be interpreted are logged and treated as absent. `NotFound` is returned
	/// unchanged so callers can stop before touching any log container.
	pub async fn resolve_case(&self, case_id: &str, deadline: Instant) -> Result<CaseRecord> {
		let cfg = &self.cfg.providers.tracking;
		let raw = retry::with_retry(&self.retry_policy(), deadline, "resolve_case", || {
			self.stores.tracking.fetch_case(cfg, case_id)
		})
		.await?;
		let (record, malformed) = CaseRecord::from_raw(case_id, raw);

		for field in malformed {
			tracing::warn!(
				case_id,
				field = field.field,
				raw = %field.raw,
				"Malformed case record field. Treating it as absent."
			);
		}

		Ok(record)
	}
}
