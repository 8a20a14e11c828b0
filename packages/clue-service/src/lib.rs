pub mod cascade;
pub mod context;
pub mod correlate;
pub mod log_groups;
pub mod log_search;
pub mod recent;
pub mod report;
pub mod retry;
pub mod traces;

mod error;

pub use correlate::CorrelateRequest;
pub use error::{Error, Result};
pub use log_groups::ResolvedGroups;
pub use recent::RecentErrorsRequest;
pub use report::{
	CorrelationReport, Outcome, RecentErrorsReport, SearchResult, SkippedStep, TierReport,
	TierStatus,
};
pub use retry::RetryPolicy;

use std::{future::Future, pin::Pin, sync::Arc};

use clue_config::{Config, ProviderConfig};
use clue_domain::{
	case::RawCaseRecord,
	event::LogEvent,
	log_group::{DeploymentOutput, LogContainer},
	query::EventQuery,
	strategy::{FailureAttribution, LastDiscoveredWorker},
	trace::Span,
};
use clue_providers::{deployments, logs, traces as trace_store, tracking};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait TrackingStore
where
	Self: Send + Sync,
{
	fn fetch_case<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		case_id: &'a str,
	) -> BoxFuture<'a, Result<RawCaseRecord>>;
}

pub trait TraceStore
where
	Self: Send + Sync,
{
	fn fetch_spans<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		trace_id: &'a str,
	) -> BoxFuture<'a, Result<Vec<Span>>>;
}

pub trait LogStore
where
	Self: Send + Sync,
{
	fn list_containers<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		prefix: &'a str,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<LogContainer>>>;

	fn query_events<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		query: &'a EventQuery,
	) -> BoxFuture<'a, Result<Vec<LogEvent>>>;
}

pub trait DeploymentCatalog
where
	Self: Send + Sync,
{
	fn fetch_outputs<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		deployment: &'a str,
	) -> BoxFuture<'a, Result<Vec<DeploymentOutput>>>;
}

#[derive(Clone)]
pub struct Stores {
	pub tracking: Arc<dyn TrackingStore>,
	pub traces: Arc<dyn TraceStore>,
	pub logs: Arc<dyn LogStore>,
	pub deployments: Arc<dyn DeploymentCatalog>,
}

pub struct ClueService {
	pub cfg: Config,
	pub stores: Stores,
	pub attribution: Arc<dyn FailureAttribution>,
}

struct HttpStores;

impl TrackingStore for HttpStores {
	fn fetch_case<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		case_id: &'a str,
	) -> BoxFuture<'a, Result<RawCaseRecord>> {
		Box::pin(async move { Ok(tracking::fetch_case(cfg, case_id).await?) })
	}
}

impl TraceStore for HttpStores {
	fn fetch_spans<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		trace_id: &'a str,
	) -> BoxFuture<'a, Result<Vec<Span>>> {
		Box::pin(async move { Ok(trace_store::fetch_spans(cfg, trace_id).await?) })
	}
}

impl LogStore for HttpStores {
	fn list_containers<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		prefix: &'a str,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<LogContainer>>> {
		Box::pin(async move { Ok(logs::list_containers(cfg, prefix, limit).await?) })
	}

	fn query_events<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		query: &'a EventQuery,
	) -> BoxFuture<'a, Result<Vec<LogEvent>>> {
		Box::pin(async move { Ok(logs::query_events(cfg, query).await?) })
	}
}

impl DeploymentCatalog for HttpStores {
	fn fetch_outputs<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		deployment: &'a str,
	) -> BoxFuture<'a, Result<Vec<DeploymentOutput>>> {
		Box::pin(async move { Ok(deployments::fetch_outputs(cfg, deployment).await?) })
	}
}

impl Stores {
	pub fn new(
		tracking: Arc<dyn TrackingStore>,
		traces: Arc<dyn TraceStore>,
		logs: Arc<dyn LogStore>,
		deployments: Arc<dyn DeploymentCatalog>,
	) -> Self {
		Self { tracking, traces, logs, deployments }
	}
}

impl Default for Stores {
	fn default() -> Self {
		let stores = Arc::new(HttpStores);

		Self {
			tracking: stores.clone(),
			traces: stores.clone(),
			logs: stores.clone(),
			deployments: stores,
		}
	}
}

impl ClueService {
	pub fn new(cfg: Config) -> Self {
		Self::with_stores(cfg, Stores::default())
	}

	pub fn with_stores(cfg: Config, stores: Stores) -> Self {
		Self { cfg, stores, attribution: Arc::new(LastDiscoveredWorker) }
	}

	/// Swaps the heuristic that names the primary failed worker.
	pub fn with_attribution(mut self, attribution: Arc<dyn FailureAttribution>) -> Self {
		self.attribution = attribution;

		self
	}

	pub(crate) fn retry_policy(&self) -> RetryPolicy {
		RetryPolicy::from_config(&self.cfg.retry)
	}
}
