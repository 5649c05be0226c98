//! HTTP application wiring.
//!
//! # Purpose
//! Builds the Axum router, configures middleware, and defines the shared
//! application state injected into handlers.
//!
//! # Notes
//! Every shared component is constructed by the composition root in `main`
//! (or by a test) and handed in here; nothing is reached through globals.
use crate::api;
use crate::api::openapi::ApiDoc;
use crate::observability;
use crate::relay::MessageRelay;
use crate::resolver::ProjectResolver;
use crate::scheduler::Refresher;
use crate::scrape::{Fetcher, UpstreamUrls};
use crate::store::Caches;
use crate::visits::VisitLog;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_opentelemetry::OpenTelemetrySpanExt;
use utoipa::OpenApi;

#[derive(Clone)]
pub struct AppState {
    pub caches: Arc<Caches>,
    pub resolver: Arc<ProjectResolver>,
    pub refresher: Arc<Refresher>,
    pub relay: Arc<dyn MessageRelay>,
    pub visits: Arc<VisitLog>,
}

impl AppState {
    /// Wire the resolver and refresher over `caches` and `fetcher`.
    pub fn new(
        caches: Arc<Caches>,
        fetcher: Fetcher,
        urls: UpstreamUrls,
        relay: Arc<dyn MessageRelay>,
        visits: Arc<VisitLog>,
    ) -> Self {
        let resolver = Arc::new(ProjectResolver::new(fetcher, urls, Arc::clone(&caches)));
        let refresher = Arc::new(Refresher::new(Arc::clone(&resolver)));
        Self {
            caches,
            resolver,
            refresher,
            relay,
            visits,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer =
        TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            let parent = observability::trace_context_from_headers(request.headers());
            let span = tracing::info_span!(
                "http.request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version()
            );
            span.set_parent(parent);
            span
        });

    Router::new()
        .route("/api/health", get(api::system::health))
        .route("/api/artstation/:username", get(api::projects::user_projects))
        .route("/api/project/:project_id", get(api::projects::project_details))
        .route("/api/update-projects", get(api::admin::update_projects))
        .route("/api/clear-cache", get(api::admin::clear_cache))
        .route("/api/discord/dm", post(api::discord::send_direct_message))
        .route("/api/load", get(api::visits::record_load))
        .route("/api/logs", get(api::visits::list_loads))
        .route(
            "/api/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .layer(CorsLayer::permissive())
        .layer(trace_layer)
        .with_state(state)
}
