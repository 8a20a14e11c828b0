use axum::{
	Json, Router,
	extract::{State, rejection::JsonRejection},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;

use clue_service::{
	CorrelateRequest, CorrelationReport, Error, RecentErrorsReport, RecentErrorsRequest,
};

use crate::state::AppState;

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}
impl ApiError {
	fn new(
		status: StatusCode,
		error_code: impl Into<String>,
		message: impl Into<String>,
		fields: Option<Vec<String>>,
	) -> Self {
		Self { status, error_code: error_code.into(), message: message.into(), fields }
	}
}

impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		match err {
			Error::InvalidRequest { message } =>
				json_error(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message, None),
			Error::InvalidPrefix { .. } =>
				json_error(StatusCode::BAD_REQUEST, "INVALID_PREFIX", err.to_string(), None),
			Error::NotFound { message } =>
				json_error(StatusCode::NOT_FOUND, "NOT_FOUND", message, None),
			Error::DeadlineExceeded { .. } =>
				json_error(StatusCode::GATEWAY_TIMEOUT, "DEADLINE_EXCEEDED", err.to_string(), None),
			Error::UpstreamUnavailable { .. } | Error::MalformedRecord { .. } | Error::Provider { .. } =>
				json_error(StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", err.to_string(), None),
		}
	}
}

impl From<JsonRejection> for ApiError {
	fn from(rejection: JsonRejection) -> Self {
		json_error(StatusCode::BAD_REQUEST, "INVALID_REQUEST", rejection.body_text(), None)
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body =
			ErrorBody { error_code: self.error_code, message: self.message, fields: self.fields };

		(self.status, Json(body)).into_response()
	}
}

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/cases/correlate", post(correlate_case))
		.route("/v1/logs/recent", post(recent_errors))
		.with_state(state)
}

pub fn json_error(
	status: StatusCode,
	code: &str,
	message: impl Into<String>,
	fields: Option<Vec<String>>,
) -> ApiError {
	ApiError::new(status, code, message, fields)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn correlate_case(
	State(state): State<AppState>,
	payload: Result<Json<CorrelateRequest>, JsonRejection>,
) -> Result<Json<CorrelationReport>, ApiError> {
	let Json(payload) = payload?;

	if payload.case_id.trim().is_empty() {
		return Err(json_error(
			StatusCode::BAD_REQUEST,
			"INVALID_REQUEST",
			"case_id must be non-empty.",
			Some(vec!["$.case_id".to_string()]),
		));
	}

	let response = state.service.correlate_case(payload).await?;

	Ok(Json(response))
}

async fn recent_errors(
	State(state): State<AppState>,
	payload: Result<Json<RecentErrorsRequest>, JsonRejection>,
) -> Result<Json<RecentErrorsReport>, ApiError> {
	let Json(payload) = payload?;
	let response = state.service.recent_errors(payload).await?;

	Ok(Json(response))
}
