//! folio HTTP service entry point.
//!
//! # Purpose
//! Reads configuration, builds the caches, headless-browser fetcher, relay and
//! visit log, then serves the API until shutdown while the refresh scheduler
//! and the metrics listener run alongside.
//!
//! # Notes
//! The `build_state` helper keeps wiring testable and minimizes main setup logic.
use anyhow::Context;
use folio::app::{AppState, build_router};
use folio::config::FolioConfig;
use folio::observability;
use folio::relay::{DisabledRelay, DiscordRelay, MessageRelay};
use folio::scheduler::RefreshScheduler;
use folio::scrape::{ChromiumRenderer, Fetcher, RendererConfig, UpstreamUrls};
use folio::store::Caches;
use folio::visits::{GeoLocator, VisitLog};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = FolioConfig::from_env_or_yaml().context("folio config")?;
    run_with_shutdown(config, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

async fn run_with_shutdown<F>(config: FolioConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let metrics_handle = observability::init_observability("folio");
    let state = build_state(&config).await?;

    let (metrics_stop, metrics_stopped) = oneshot::channel::<()>();
    let metrics_bind = config.metrics_bind;
    let metrics_task = tokio::spawn(async move {
        let stopped = async move {
            let _ = metrics_stopped.await;
        };
        if let Err(err) = observability::serve_metrics(metrics_handle, metrics_bind, stopped).await
        {
            tracing::warn!(addr = %metrics_bind, error = %err, "metrics listener failed");
        }
    });

    let scheduler = RefreshScheduler::spawn(Arc::clone(&state.refresher), config.refresh_interval());

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("bind {}", config.bind_addr))?;
    tracing::info!(addr = %listener.local_addr()?, "folio listening");
    let served = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await;

    tracing::info!("shutting down");
    if let Some(scheduler) = scheduler {
        scheduler.shutdown().await;
    }
    let _ = metrics_stop.send(());
    let _ = metrics_task.await;
    served.context("serve http")
}

async fn build_state(config: &FolioConfig) -> anyhow::Result<AppState> {
    let caches = Arc::new(Caches::load(&config.cache_dir).await);
    let urls = UpstreamUrls::new(&config.upstream_url)
        .with_context(|| format!("parse upstream url {}", config.upstream_url))?;
    let renderer = ChromiumRenderer::new(RendererConfig {
        chrome_executable: config.chrome_path.clone(),
        navigation_timeout: config.navigation_timeout(),
    });

    let relay: Arc<dyn MessageRelay> = match config.discord() {
        Some(discord) => Arc::new(DiscordRelay::new(discord)),
        None => {
            tracing::warn!("discord credentials not set, contact relay disabled");
            Arc::new(DisabledRelay)
        }
    };

    let geo = config
        .geoip_url
        .as_deref()
        .map(GeoLocator::new)
        .transpose()
        .context("build geolocation client")?;
    let visits = Arc::new(VisitLog::new(config.visit_log_path(), geo));

    Ok(AppState::new(
        caches,
        Fetcher::new(Arc::new(renderer)),
        urls,
        relay,
        visits,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::path::Path;

    fn test_config(dir: &Path) -> FolioConfig {
        FolioConfig {
            bind_addr: "127.0.0.1:0".parse().expect("bind"),
            metrics_bind: "127.0.0.1:0".parse().expect("metrics"),
            cache_dir: dir.to_path_buf(),
            upstream_url: "https://upstream.test".to_string(),
            refresh_interval_secs: 3600,
            navigation_timeout_ms: 1000,
            chrome_path: None,
            visit_log: None,
            geoip_url: None,
            discord_bot_token: None,
            discord_recipient_id: None,
            discord_api_url: "http://127.0.0.1:1".to_string(),
        }
    }

    #[tokio::test]
    async fn build_state_creates_cache_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = build_state(&test_config(dir.path())).await.expect("state");
        assert!(state.caches.user_projects.is_empty().await);
        assert!(dir.path().join("userProjectsCache.json").exists());
        assert!(dir.path().join("projectDetailsCache.json").exists());
        assert!(dir.path().join("videoLinkCache.json").exists());
        assert_eq!(state.visits.path(), dir.path().join("loadLogs.json"));
    }

    #[tokio::test]
    async fn build_state_rejects_bad_upstream_url() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = test_config(dir.path());
        config.upstream_url = "not a url".to_string();
        let err = build_state(&config).await.err().expect("bad url");
        assert!(err.to_string().contains("parse upstream url"));
    }

    #[tokio::test]
    async fn build_state_without_discord_uses_disabled_relay() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = build_state(&test_config(dir.path())).await.expect("state");
        let err = state.relay.send("hi").await.unwrap_err();
        assert!(matches!(err, folio::relay::RelayError::NotConfigured));
    }

    #[tokio::test]
    #[serial]
    async fn run_with_shutdown_starts_and_stops() {
        let dir = tempfile::tempdir().expect("tempdir");
        run_with_shutdown(test_config(dir.path()), async {
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        })
        .await
        .expect("run should stop cleanly");
    }
}
