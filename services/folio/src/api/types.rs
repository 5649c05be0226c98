//! HTTP API request/response types.
//!
//! # Purpose
//! Payload shapes for the portfolio REST API and its OpenAPI schema. Upstream
//! project payloads pass through as raw JSON and have no schema here.
use crate::scheduler::FullRefreshReport;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable message.
    pub error: String,
    /// Stable machine-readable code.
    pub code: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct HealthStatus {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UpdateProjectsResponse {
    pub message: String,
    pub report: FullRefreshReport,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DirectMessageRequest {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoadQuery {
    pub page: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoadResponse {
    pub message: String,
    pub ip: String,
    pub device: String,
    pub browser: String,
    pub page: String,
    #[schema(value_type = Object)]
    pub location: Option<Value>,
}
