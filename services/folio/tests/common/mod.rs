#![allow(dead_code)]

use async_trait::async_trait;
use folio::app::{AppState, build_router};
use folio::relay::{DisabledRelay, MessageRelay};
use folio::scrape::{FetchError, FetchResult, Fetcher, PageRenderer, RenderedPage, UpstreamUrls};
use folio::store::Caches;
use folio::visits::VisitLog;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const UPSTREAM: &str = "https://upstream.test";

pub fn user_projects_url(username: &str) -> String {
    format!("{UPSTREAM}/users/{username}/projects.json")
}

pub fn project_url(project_id: &str) -> String {
    format!("{UPSTREAM}/projects/{project_id}.json")
}

pub async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

pub fn read_file_json(path: impl Into<PathBuf>) -> Value {
    let bytes = std::fs::read(path.into()).expect("read file");
    serde_json::from_slice(&bytes).expect("file json")
}

/// Stands in for the headless browser: serves canned pages by URL and counts
/// renders.
#[derive(Default)]
pub struct ScriptedRenderer {
    pages: Mutex<HashMap<String, String>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedRenderer {
    /// Serve `body` the way a browser shows a raw JSON response.
    pub fn json(&self, url: &str, body: Value) {
        let text = body
            .to_string()
            .replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;");
        self.pages.lock().unwrap().insert(
            url.to_string(),
            format!("<html><head></head><body><pre>{text}</pre></body></html>"),
        );
    }

    /// Serve a player page whose `<video>` plays `src`.
    pub fn video(&self, url: &str, src: &str) {
        self.pages.lock().unwrap().insert(
            url.to_string(),
            format!("<html><body><video controls><source src=\"{src}\" type=\"video/mp4\"></video></body></html>"),
        );
    }

    pub fn remove(&self, url: &str) {
        self.pages.lock().unwrap().remove(url);
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|call| *call == url).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl PageRenderer for ScriptedRenderer {
    async fn render(&self, url: &str) -> FetchResult<RenderedPage> {
        self.calls.lock().unwrap().push(url.to_string());
        let html = self.pages.lock().unwrap().get(url).cloned();
        html.map(|html| RenderedPage {
            url: url.to_string(),
            html,
        })
        .ok_or_else(|| FetchError::UpstreamUnavailable {
            url: url.to_string(),
            reason: "net::ERR_NAME_NOT_RESOLVED".to_string(),
        })
    }
}

pub struct TestApp {
    pub app: axum::routing::RouterIntoService<axum::body::Body, ()>,
    pub state: AppState,
    pub renderer: Arc<ScriptedRenderer>,
    pub dir: TempDir,
}

impl TestApp {
    pub fn cache_file(&self, name: &str) -> Value {
        read_file_json(self.dir.path().join(name))
    }
}

pub async fn test_app() -> TestApp {
    TestAppBuilder::default().build().await
}

#[derive(Default)]
pub struct TestAppBuilder {
    relay: Option<Arc<dyn MessageRelay>>,
    visit_log: Option<PathBuf>,
}

impl TestAppBuilder {
    pub fn relay(mut self, relay: Arc<dyn MessageRelay>) -> Self {
        self.relay = Some(relay);
        self
    }

    pub fn visit_log(mut self, path: PathBuf) -> Self {
        self.visit_log = Some(path);
        self
    }

    pub async fn build(self) -> TestApp {
        let dir = tempfile::tempdir().expect("tempdir");
        let renderer = Arc::new(ScriptedRenderer::default());
        let caches = Arc::new(Caches::load(dir.path()).await);
        let visit_log = self
            .visit_log
            .unwrap_or_else(|| dir.path().join("loadLogs.json"));
        let state = AppState::new(
            caches,
            Fetcher::new(renderer.clone()),
            UpstreamUrls::new(UPSTREAM).expect("upstream"),
            self.relay.unwrap_or_else(|| Arc::new(DisabledRelay)),
            Arc::new(VisitLog::new(visit_log, None)),
        );
        TestApp {
            app: build_router(state.clone()).into_service(),
            state,
            renderer,
            dir,
        }
    }
}
