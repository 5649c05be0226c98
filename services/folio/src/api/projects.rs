//! Project data handlers.
//!
//! # Purpose
//! Serves upstream project listings and project details through the resolver,
//! which answers from cache when it can and fetches otherwise. Any upstream
//! failure surfaces as a 404.
use crate::api::error::{ApiError, api_not_found};
use crate::app::AppState;
use axum::Json;
use axum::extract::{Path, State};
use serde_json::Value;

#[utoipa::path(
    get,
    path = "/api/artstation/{username}",
    tag = "projects",
    params(
        ("username" = String, Path, description = "Upstream username")
    ),
    responses(
        (status = 200, description = "Upstream project listing, passed through unchanged"),
        (status = 404, description = "Projects not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn user_projects(
    Path(username): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    state
        .resolver
        .user_projects(&username)
        .await
        .map(Json)
        .ok_or_else(|| api_not_found("Projects not found"))
}

#[utoipa::path(
    get,
    path = "/api/project/{project_id}",
    tag = "projects",
    params(
        ("project_id" = String, Path, description = "Upstream project hash id")
    ),
    responses(
        (status = 200, description = "Project details with embedded players replaced by direct video URLs"),
        (status = 404, description = "Project details not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn project_details(
    Path(project_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    state
        .resolver
        .project_details(&project_id)
        .await
        .map(Json)
        .ok_or_else(|| api_not_found("Project details not found"))
}
