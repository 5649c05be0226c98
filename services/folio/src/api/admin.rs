//! Cache maintenance handlers.
use crate::api::types::{MessageResponse, UpdateProjectsResponse};
use crate::app::AppState;
use axum::Json;
use axum::extract::State;

#[utoipa::path(
    get,
    path = "/api/update-projects",
    tag = "admin",
    responses(
        (status = 200, description = "Refresh finished; per-cache counts in the report", body = UpdateProjectsResponse)
    )
)]
/// Re-fetch every cached listing and the details of every project in them.
///
/// Entries whose refresh fails keep their previous value. When another refresh
/// is already running the report is marked `skipped`.
pub(crate) async fn update_projects(State(state): State<AppState>) -> Json<UpdateProjectsResponse> {
    let report = state.refresher.refresh_all().await;
    Json(UpdateProjectsResponse {
        message: "Projects and project details updated successfully".to_string(),
        report,
    })
}

#[utoipa::path(
    get,
    path = "/api/clear-cache",
    tag = "admin",
    responses(
        (status = 200, description = "All caches reset", body = MessageResponse)
    )
)]
pub(crate) async fn clear_cache(State(state): State<AppState>) -> Json<MessageResponse> {
    state.caches.clear_all().await;
    Json(MessageResponse {
        message: "All caches cleared successfully".to_string(),
    })
}
