//! In-memory stores and a ready-made config for exercising `clue-service` without a network.

use std::{
	collections::{HashMap, HashSet},
	sync::{
		Arc, Mutex,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration,
};

use serde_json::Map;
use time::OffsetDateTime;

use clue_config::{
	Config, Deployment, LogGroups, ProviderConfig, Providers, Retry, Search, Service,
};
use clue_domain::{
	case::RawCaseRecord,
	instant::RawInstant,
	event::LogEvent,
	log_group::{DeploymentOutput, LogContainer},
	query::EventQuery,
	trace::Span,
};
use clue_service::{
	BoxFuture, DeploymentCatalog, Error, LogStore, Result, Stores, TraceStore, TrackingStore,
};

pub const DEPLOYMENT: &str = "idp-prod";

#[derive(Default)]
pub struct FakeTracking {
	records: HashMap<String, RawCaseRecord>,
	unavailable: bool,
	delay: Option<Duration>,
	transient_failures: AtomicUsize,
	calls: AtomicUsize,
}

#[derive(Default)]
pub struct FakeTraces {
	spans: HashMap<String, Vec<Span>>,
	unavailable: bool,
	calls: AtomicUsize,
}

#[derive(Default)]
pub struct FakeLogs {
	containers: Vec<LogContainer>,
	events: HashMap<String, Vec<LogEvent>>,
	failing: HashSet<String>,
	delay: Option<Duration>,
	list_calls: AtomicUsize,
	queries: Mutex<Vec<EventQuery>>,
}

#[derive(Default)]
pub struct FakeDeployments {
	outputs: Vec<DeploymentOutput>,
	unavailable: bool,
	calls: AtomicUsize,
}

/// Fakes kept behind `Arc`s so tests can inspect call logs after handing `Stores` to a service.
#[derive(Clone)]
pub struct FakeStores {
	pub tracking: Arc<FakeTracking>,
	pub traces: Arc<FakeTraces>,
	pub logs: Arc<FakeLogs>,
	pub deployments: Arc<FakeDeployments>,
}

impl FakeTracking {
	pub fn with_case(mut self, case_id: &str, record: RawCaseRecord) -> Self {
		self.records.insert(case_id.to_string(), record);

		self
	}

	pub fn unavailable(mut self) -> Self {
		self.unavailable = true;

		self
	}

	/// Every lookup sleeps this long before answering.
	pub fn with_delay(mut self, delay: Duration) -> Self {
		self.delay = Some(delay);

		self
	}

	/// The next `count` calls fail with a transient error before the store recovers.
	pub fn failing_first(self, count: usize) -> Self {
		self.transient_failures.store(count, Ordering::SeqCst);

		self
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}

impl TrackingStore for FakeTracking {
	fn fetch_case<'a>(
		&'a self,
		_cfg: &'a ProviderConfig,
		case_id: &'a str,
	) -> BoxFuture<'a, Result<RawCaseRecord>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let transient = self
			.transient_failures
			.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
			.is_ok();

		Box::pin(async move {
			if let Some(delay) = self.delay {
				tokio::time::sleep(delay).await;
			}
			if transient || self.unavailable {
				return Err(unavailable("tracking store"));
			}

			self.records
				.get(case_id)
				.cloned()
				.ok_or_else(|| Error::NotFound { message: format!("Case {case_id:?}") })
		})
	}
}

impl FakeTraces {
	pub fn with_trace(mut self, trace_id: &str, spans: Vec<Span>) -> Self {
		self.spans.insert(trace_id.to_string(), spans);

		self
	}

	pub fn unavailable(mut self) -> Self {
		self.unavailable = true;

		self
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}

impl TraceStore for FakeTraces {
	fn fetch_spans<'a>(
		&'a self,
		_cfg: &'a ProviderConfig,
		trace_id: &'a str,
	) -> BoxFuture<'a, Result<Vec<Span>>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		Box::pin(async move {
			if self.unavailable {
				return Err(unavailable("trace store"));
			}

			Ok(self.spans.get(trace_id).cloned().unwrap_or_default())
		})
	}
}

impl FakeLogs {
	pub fn with_container(mut self, name: &str) -> Self {
		self.containers.push(LogContainer {
			name: name.to_string(),
			created_at: None,
			retention_days: Some(30),
			stored_bytes: 1_024,
		});

		self
	}

	pub fn with_event(mut self, container: &str, at: OffsetDateTime, message: &str) -> Self {
		self.events.entry(container.to_string()).or_default().push(LogEvent {
			instant: at,
			message: message.to_string(),
			stream: format!("{container}/stream"),
			caveat: false,
		});

		self
	}

	/// Queries against `container` fail with a transient error on every attempt.
	pub fn failing_container(mut self, container: &str) -> Self {
		self.failing.insert(container.to_string());

		self
	}

	/// Every event query sleeps this long before answering.
	pub fn with_delay(mut self, delay: Duration) -> Self {
		self.delay = Some(delay);

		self
	}

	pub fn list_calls(&self) -> usize {
		self.list_calls.load(Ordering::SeqCst)
	}

	pub fn queries(&self) -> Vec<EventQuery> {
		self.queries.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}
}

impl LogStore for FakeLogs {
	fn list_containers<'a>(
		&'a self,
		_cfg: &'a ProviderConfig,
		prefix: &'a str,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<LogContainer>>> {
		self.list_calls.fetch_add(1, Ordering::SeqCst);

		let containers = self
			.containers
			.iter()
			.filter(|container| container.name.starts_with(prefix))
			.take(limit as usize)
			.cloned()
			.collect();

		Box::pin(async move { Ok(containers) })
	}

	fn query_events<'a>(
		&'a self,
		_cfg: &'a ProviderConfig,
		query: &'a EventQuery,
	) -> BoxFuture<'a, Result<Vec<LogEvent>>> {
		self.queries.lock().unwrap_or_else(|err| err.into_inner()).push(query.clone());

		Box::pin(async move {
			if let Some(delay) = self.delay {
				tokio::time::sleep(delay).await;
			}
			if self.failing.contains(&query.container) {
				return Err(unavailable("log store"));
			}

			let terms = filter_terms(&query.filter);
			let matched = self
				.events
				.get(&query.container)
				.into_iter()
				.flatten()
				.filter(|event| event.instant >= query.start && event.instant <= query.end)
				.filter(|event| terms.iter().all(|term| event.message.contains(term.as_str())))
				.take(query.limit as usize)
				.cloned()
				.collect();

			Ok(matched)
		})
	}
}

impl FakeDeployments {
	pub fn with_output(mut self, key: &str, value: &str) -> Self {
		self.outputs.push(DeploymentOutput { key: key.to_string(), value: value.to_string() });

		self
	}

	pub fn unavailable(mut self) -> Self {
		self.unavailable = true;

		self
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}

impl DeploymentCatalog for FakeDeployments {
	fn fetch_outputs<'a>(
		&'a self,
		_cfg: &'a ProviderConfig,
		_deployment: &'a str,
	) -> BoxFuture<'a, Result<Vec<DeploymentOutput>>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		Box::pin(async move {
			if self.unavailable {
				return Err(unavailable("deployment catalog"));
			}

			Ok(self.outputs.clone())
		})
	}
}

impl FakeStores {
	pub fn new(
		tracking: FakeTracking,
		traces: FakeTraces,
		logs: FakeLogs,
		deployments: FakeDeployments,
	) -> Self {
		Self {
			tracking: Arc::new(tracking),
			traces: Arc::new(traces),
			logs: Arc::new(logs),
			deployments: Arc::new(deployments),
		}
	}

	pub fn stores(&self) -> Stores {
		Stores::new(
			self.tracking.clone(),
			self.traces.clone(),
			self.logs.clone(),
			self.deployments.clone(),
		)
	}
}

pub fn test_config() -> Config {
	Config {
		service: Service { http_bind: "127.0.0.1:0".to_string(), log_level: "info".to_string() },
		deployment: Deployment {
			name: DEPLOYMENT.to_string(),
			workflow_output_key: "StateMachineArn".to_string(),
		},
		search: Search::default(),
		log_groups: LogGroups::default(),
		retry: Retry { max_attempts: 3, base_backoff_ms: 50, max_backoff_ms: 200 },
		providers: Providers {
			tracking: test_provider("tracking"),
			traces: test_provider("traces"),
			logs: test_provider("logs"),
			deployments: test_provider("deployments"),
		},
	}
}

pub fn test_provider(name: &str) -> ProviderConfig {
	ProviderConfig {
		api_base: format!("http://{name}.test"),
		api_key: format!("{name}-key"),
		timeout_ms: 1_000,
		default_headers: Map::new(),
	}
}

pub fn span(worker: &str, request_id: &str, start: &str) -> Span {
	Span {
		worker_name: Some(worker.to_string()),
		request_id: Some(request_id.to_string()),
		start: Some(RawInstant::Text(start.to_string())),
	}
}

/// Splits a store filter into the terms an event must contain.
fn filter_terms(filter: &str) -> Vec<String> {
	let trimmed = filter.trim();

	if let Some(inner) = trimmed.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
		return inner
			.split(',')
			.map(str::trim)
			.filter(|term| !term.is_empty())
			.map(str::to_string)
			.collect();
	}
	if trimmed.is_empty() {
		return Vec::new();
	}

	vec![trimmed.to_string()]
}

fn unavailable(store: &str) -> Error {
	Error::UpstreamUnavailable { message: format!("{store} returned HTTP 503.") }
}
