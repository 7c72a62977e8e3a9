use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use weld_service::{Error as ServiceError, IdentifyRequest, IdentifyResponse};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/identify", post(identify))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn identify(
	State(state): State<AppState>,
	Json(payload): Json<IdentifyRequest>,
) -> Result<Json<IdentifyResponse>, ApiError> {
	let response = state.service.identify(payload).await?;
	Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}

impl ApiError {
	fn new(status: StatusCode, error_code: impl Into<String>, message: impl Into<String>) -> Self {
		Self { status, error_code: error_code.into(), message: message.into() }
	}
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::InvalidRequest { message } => {
				ApiError::new(StatusCode::BAD_REQUEST, "invalid_request", message)
			},
			ServiceError::Storage { message } => {
				// The detail stays in the log; callers get a generic failure.
				tracing::error!(%message, "Identify failed in storage.");

				ApiError::new(
					StatusCode::INTERNAL_SERVER_ERROR,
					"internal_error",
					"Internal server error.",
				)
			},
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}
