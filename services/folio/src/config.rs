use crate::relay::DiscordConfig;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_UPSTREAM_URL: &str = "https://www.artstation.com";
pub const DEFAULT_GEOIP_URL: &str = "http://ip-api.com/json";
pub const DEFAULT_DISCORD_API_URL: &str = "https://discord.com/api/v10";
const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 3600;
const DEFAULT_NAVIGATION_TIMEOUT_MS: u64 = 30_000;
const VISIT_LOG_FILE: &str = "loadLogs.json";

// Service configuration sourced from environment variables.
#[derive(Debug, Clone)]
pub struct FolioConfig {
    pub bind_addr: SocketAddr,
    pub metrics_bind: SocketAddr,
    pub cache_dir: PathBuf,
    pub upstream_url: String,
    /// `0` disables the refresh scheduler.
    pub refresh_interval_secs: u64,
    pub navigation_timeout_ms: u64,
    pub chrome_path: Option<PathBuf>,
    /// Defaults to `loadLogs.json` inside `cache_dir`.
    pub visit_log: Option<PathBuf>,
    /// `None` disables geolocation of visits.
    pub geoip_url: Option<String>,
    pub discord_bot_token: Option<String>,
    pub discord_recipient_id: Option<String>,
    pub discord_api_url: String,
}

#[derive(Debug, Deserialize)]
struct FolioConfigOverride {
    bind_addr: Option<String>,
    metrics_bind: Option<String>,
    cache_dir: Option<PathBuf>,
    upstream_url: Option<String>,
    refresh_interval_secs: Option<u64>,
    navigation_timeout_ms: Option<u64>,
    chrome_path: Option<PathBuf>,
    visit_log: Option<PathBuf>,
    geoip_url: Option<String>,
    discord_recipient_id: Option<String>,
    discord_api_url: Option<String>,
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl FolioConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr = match (non_empty_var("FOLIO_BIND"), non_empty_var("PORT")) {
            (Some(bind), _) => bind.parse().with_context(|| "parse FOLIO_BIND")?,
            (None, Some(port)) => format!("0.0.0.0:{port}")
                .parse()
                .with_context(|| "parse PORT")?,
            (None, None) => "0.0.0.0:3005".parse().with_context(|| "parse default bind")?,
        };
        let metrics_bind = std::env::var("FOLIO_METRICS_BIND")
            .unwrap_or_else(|_| "0.0.0.0:9090".to_string())
            .parse()
            .with_context(|| "parse FOLIO_METRICS_BIND")?;
        let cache_dir = non_empty_var("FOLIO_CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let upstream_url =
            non_empty_var("FOLIO_UPSTREAM_URL").unwrap_or_else(|| DEFAULT_UPSTREAM_URL.to_string());
        let refresh_interval_secs = std::env::var("FOLIO_REFRESH_INTERVAL_SECS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(DEFAULT_REFRESH_INTERVAL_SECS);
        let navigation_timeout_ms = std::env::var("FOLIO_NAVIGATION_TIMEOUT_MS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(DEFAULT_NAVIGATION_TIMEOUT_MS);
        // An explicitly empty FOLIO_GEOIP_URL turns lookups off.
        let geoip_url = match std::env::var("FOLIO_GEOIP_URL") {
            Ok(value) if value.trim().is_empty() => None,
            Ok(value) => Some(value.trim().to_string()),
            Err(_) => Some(DEFAULT_GEOIP_URL.to_string()),
        };
        Ok(Self {
            bind_addr,
            metrics_bind,
            cache_dir,
            upstream_url,
            refresh_interval_secs,
            navigation_timeout_ms,
            chrome_path: non_empty_var("FOLIO_CHROME_PATH").map(PathBuf::from),
            visit_log: non_empty_var("FOLIO_VISIT_LOG").map(PathBuf::from),
            geoip_url,
            discord_bot_token: non_empty_var("DISCORD_BOT_TOKEN"),
            discord_recipient_id: non_empty_var("DISCORD_RECIPIENT_ID"),
            discord_api_url: non_empty_var("DISCORD_API_URL")
                .unwrap_or_else(|| DEFAULT_DISCORD_API_URL.to_string()),
        })
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Ok(path) = std::env::var("FOLIO_CONFIG") {
            let contents =
                fs::read_to_string(&path).with_context(|| format!("read FOLIO_CONFIG: {path}"))?;
            let override_cfg: FolioConfigOverride =
                serde_yaml::from_str(&contents).with_context(|| "parse folio config yaml")?;
            config.apply(override_cfg)?;
        }
        Ok(config)
    }

    // The bot token only comes from the environment.
    fn apply(&mut self, override_cfg: FolioConfigOverride) -> Result<()> {
        if let Some(value) = override_cfg.bind_addr {
            self.bind_addr = value.parse().with_context(|| "parse bind_addr")?;
        }
        if let Some(value) = override_cfg.metrics_bind {
            self.metrics_bind = value.parse().with_context(|| "parse metrics_bind")?;
        }
        if let Some(value) = override_cfg.cache_dir {
            self.cache_dir = value;
        }
        if let Some(value) = override_cfg.upstream_url {
            self.upstream_url = value;
        }
        if let Some(value) = override_cfg.refresh_interval_secs {
            self.refresh_interval_secs = value;
        }
        if let Some(value) = override_cfg.navigation_timeout_ms.filter(|value| *value > 0) {
            self.navigation_timeout_ms = value;
        }
        if let Some(value) = override_cfg.chrome_path {
            self.chrome_path = Some(value);
        }
        if let Some(value) = override_cfg.visit_log {
            self.visit_log = Some(value);
        }
        if let Some(value) = override_cfg.geoip_url {
            self.geoip_url = Some(value).filter(|value| !value.trim().is_empty());
        }
        if let Some(value) = override_cfg.discord_recipient_id {
            self.discord_recipient_id = Some(value);
        }
        if let Some(value) = override_cfg.discord_api_url {
            self.discord_api_url = value;
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn visit_log_path(&self) -> PathBuf {
        self.visit_log
            .clone()
            .unwrap_or_else(|| self.cache_dir.join(VISIT_LOG_FILE))
    }

    /// Discord relay settings, present only when both credentials are set.
    pub fn discord(&self) -> Option<DiscordConfig> {
        Some(DiscordConfig {
            api_base: self.discord_api_url.clone(),
            bot_token: self.discord_bot_token.clone()?,
            recipient_id: self.discord_recipient_id.clone()?,
        })
    }
}
