//! Page-load logging handlers.
use crate::api::error::{ApiError, api_internal};
use crate::api::types::{LoadQuery, LoadResponse};
use crate::app::AppState;
use crate::visits::{Visit, client_ip};
use axum::Json;
use axum::extract::{ConnectInfo, Query, State};
use axum::http::HeaderMap;
use axum::http::header::USER_AGENT;
use serde_json::Value;
use std::net::SocketAddr;

#[utoipa::path(
    get,
    path = "/api/load",
    tag = "visits",
    params(
        ("page" = Option<String>, Query, description = "Path of the page being viewed")
    ),
    responses(
        (status = 200, description = "Visit recorded", body = LoadResponse),
        (status = 500, description = "Visit log unavailable", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn record_load(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Query(query): Query<LoadQuery>,
) -> Result<Json<LoadResponse>, ApiError> {
    let forwarded_for = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok());
    let visit = Visit {
        ip: client_ip(forwarded_for, peer.map(|ConnectInfo(addr)| addr.ip())),
        user_agent: headers
            .get(USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string(),
        page: query.page.unwrap_or_else(|| "unknown".to_string()),
    };
    let record = state
        .visits
        .record(visit)
        .await
        .map_err(|err| api_internal("Failed to process load request", &err))?;
    Ok(Json(LoadResponse {
        message: "Load endpoint data logged successfully".to_string(),
        ip: record.ip,
        device: record.device,
        browser: record.browser,
        page: record.page_accessed,
        location: record.location,
    }))
}

#[utoipa::path(
    get,
    path = "/api/logs",
    tag = "visits",
    responses(
        (status = 200, description = "All recorded visits, oldest first"),
        (status = 500, description = "Visit log unreadable", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn list_loads(State(state): State<AppState>) -> Result<Json<Vec<Value>>, ApiError> {
    state
        .visits
        .read_all()
        .await
        .map(Json)
        .map_err(|err| api_internal("Failed to read load logs", &err))
}
