use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use agora_domain::Scope;
use agora_service::{BrowsePage, BrowseRequest, Error as ServiceError};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/listings", get(listings))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn listings(
	State(state): State<AppState>,
	Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<BrowsePage>, ApiError> {
	let scope = Scope::from_query_pairs(&pairs);
	let page = parse_param(&pairs, "page")?.unwrap_or(1);
	let page_size = parse_param(&pairs, "limit")?;
	let response = state.service.browse(BrowseRequest { scope, page, page_size, sort: None }).await?;

	Ok(Json(response))
}

fn parse_param(pairs: &[(String, String)], name: &str) -> Result<Option<u32>, ApiError> {
	let Some((_, raw)) = pairs.iter().rev().find(|(key, _)| key == name) else {
		return Ok(None);
	};

	raw.parse::<u32>().map(Some).map_err(|_| {
		json_error(
			StatusCode::BAD_REQUEST,
			"invalid_request",
			format!("{name} must be a positive integer."),
		)
	})
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

pub fn json_error(status: StatusCode, code: &str, message: impl Into<String>) -> ApiError {
	ApiError { status, error_code: code.to_string(), message: message.into() }
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::InvalidRequest { message } =>
				json_error(StatusCode::BAD_REQUEST, "invalid_request", message),
			ServiceError::Catalog { message } =>
				json_error(StatusCode::BAD_GATEWAY, "catalog_unavailable", message),
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}
