use axum::{
	Json, Router,
	extract::{Query, State},
	http::{StatusCode, Uri},
	response::{IntoResponse, Response},
	routing::get,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use fanout_domain::SearchResponse;
use fanout_service::{Error, SearchRequest, StatusResponse};

use crate::state::AppState;

const ENDPOINTS: [&str; 3] = ["GET /api/health", "GET /api/search", "POST /api/search"];

/// Query-string form of [`SearchRequest`]. List fields are comma separated and `ext` is a JSON
/// object.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchQuery {
	pub keyword: String,
	pub channels: Option<String>,
	pub concurrency: Option<i64>,
	pub force_refresh: bool,
	pub result_type: String,
	pub source_type: String,
	pub plugins: Option<String>,
	pub cloud_types: Option<String>,
	pub ext: Option<String>,
	pub phase: Option<u32>,
}
impl SearchQuery {
	pub fn into_request(self) -> Result<SearchRequest, ApiError> {
		let ext = match self.ext.as_deref().map(str::trim) {
			Some(raw) if !raw.is_empty() => serde_json::from_str::<Map<String, Value>>(raw)
				.map_err(|err| {
					json_error(
						StatusCode::BAD_REQUEST,
						"INVALID_REQUEST",
						format!("ext must be a JSON object: {err}"),
					)
				})?,
			_ => Map::new(),
		};

		Ok(SearchRequest {
			keyword: self.keyword,
			channels: split_list(self.channels),
			concurrency: self.concurrency,
			force_refresh: self.force_refresh,
			result_type: self.result_type,
			source_type: self.source_type,
			plugins: split_list(self.plugins),
			cloud_types: split_list(self.cloud_types),
			ext,
			phase: self.phase,
		})
	}
}

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/api/health", get(health))
		.route("/api/search", get(search_query).post(search_body))
		.fallback(not_found)
		.with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<StatusResponse> {
	Json(state.service.status())
}

async fn search_query(
	State(state): State<AppState>,
	Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, ApiError> {
	let response = state.service.search(query.into_request()?).await?;

	Ok(Json(response))
}

async fn search_body(
	State(state): State<AppState>,
	Json(payload): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
	let response = state.service.search(payload).await?;

	Ok(Json(response))
}

async fn not_found(uri: Uri) -> ApiError {
	json_error(
		StatusCode::NOT_FOUND,
		"NOT_FOUND",
		format!("No endpoint at {}. Available: {}.", uri.path(), ENDPOINTS.join(", ")),
	)
}

fn split_list(raw: Option<String>) -> Vec<String> {
	raw.map(|raw| {
		raw.split(',')
			.map(str::trim)
			.filter(|item| !item.is_empty())
			.map(str::to_string)
			.collect()
	})
	.unwrap_or_default()
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

impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		match err {
			Error::InvalidRequest { message } =>
				json_error(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message),
			err @ Error::Source { .. } => {
				tracing::warn!(error = %err, "Search failed on a source.");

				json_error(StatusCode::BAD_GATEWAY, "SOURCE_ERROR", err.to_string())
			},
			err @ (Error::Config { .. } | Error::Cache { .. }) => {
				tracing::error!(error = %err, "Search failed.");

				json_error(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", err.to_string())
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

pub fn json_error(status: StatusCode, code: &str, message: impl Into<String>) -> ApiError {
	ApiError::new(status, code, message)
}
