use std::sync::Arc;

use clue_service::ClueService;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<ClueService>,
}
impl AppState {
	/// Service backed by the HTTP stores named in `config`.
	pub fn new(config: clue_config::Config) -> Self {
		Self::with_service(ClueService::new(config))
	}

	pub fn with_service(service: ClueService) -> Self {
		Self { service: Arc::new(service) }
	}
}
