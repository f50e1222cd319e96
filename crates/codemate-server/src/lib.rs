//! HTTP front end: single-tool lookup, comparison, and the tool list.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;

use codemate_core::boundary::parse_tool_list;
use codemate_core::{resolve_many, CodemateError, Resolver, ToolRecord};

/// Error body is always `{ "message": ... }`; internals never leak.
pub struct ApiError(CodemateError);

impl From<CodemateError> for ApiError {
    fn from(e: CodemateError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let message = match &self.0 {
            CodemateError::Validation(_)
            | CodemateError::NotFound(_)
            | CodemateError::Unavailable(_) => self.0.to_string(),
            other => {
                tracing::error!(error = %other, "internal error");
                "Internal server error.".to_string()
            }
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}

pub fn router(resolver: Resolver) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/tools", get(list_tools))
        .route("/api/tool/:tool_name", get(get_tool))
        .route("/api/compare", get(compare))
        .layer(TraceLayer::new_for_http())
        .with_state(resolver)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn list_tools(State(resolver): State<Resolver>) -> Json<Vec<String>> {
    Json(
        resolver
            .catalog()
            .tool_ids()
            .into_iter()
            .map(String::from)
            .collect(),
    )
}

async fn get_tool(
    State(resolver): State<Resolver>,
    Path(tool_name): Path<String>,
) -> Result<Json<ToolRecord>, ApiError> {
    let resolved = resolver.resolve(&tool_name).await?;
    Ok(Json(resolved.record))
}

#[derive(Debug, Deserialize)]
struct CompareParams {
    tools: Option<String>,
}

async fn compare(
    State(resolver): State<Resolver>,
    Query(params): Query<CompareParams>,
) -> Result<Json<Vec<ToolRecord>>, ApiError> {
    let names = parse_tool_list(params.tools.as_deref().unwrap_or(""))?;
    let comparison = resolve_many(&resolver, &names).await?;
    Ok(Json(
        comparison.found.into_iter().map(|r| r.record).collect(),
    ))
}
