//! OpenAPI schema aggregation for the portfolio API.
use crate::api::{
    admin, discord, projects, system,
    types::{
        DirectMessageRequest, ErrorResponse, HealthStatus, LoadResponse, MessageResponse,
        UpdateProjectsResponse,
    },
    visits,
};
use crate::scheduler::{FullRefreshReport, RefreshReport};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "folio",
        version = "v1",
        description = "Portfolio data service HTTP API"
    ),
    paths(
        system::health,
        projects::user_projects,
        projects::project_details,
        admin::update_projects,
        admin::clear_cache,
        discord::send_direct_message,
        visits::record_load,
        visits::list_loads
    ),
    components(schemas(
        ErrorResponse,
        HealthStatus,
        MessageResponse,
        UpdateProjectsResponse,
        FullRefreshReport,
        RefreshReport,
        DirectMessageRequest,
        LoadResponse
    )),
    tags(
        (name = "system", description = "Health and discovery"),
        (name = "projects", description = "Portfolio project data"),
        (name = "admin", description = "Cache maintenance"),
        (name = "contact", description = "Contact-form relay"),
        (name = "visits", description = "Page-load logging")
    )
)]
pub struct ApiDoc;
