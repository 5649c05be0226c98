//! Outbound contact messages.
//!
//! The contact form posts a preformatted message; a [`MessageRelay`] delivers
//! it to the site owner. [`DiscordRelay`] is the production implementation.
use async_trait::async_trait;
use thiserror::Error;

pub mod discord;

pub use discord::{DiscordConfig, DiscordRelay};

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("message relay is not configured")]
    NotConfigured,
    #[error("recipient not found")]
    RecipientNotFound,
    #[error("recipient does not accept direct messages")]
    CannotMessage,
    #[error("relay upstream error: {0}")]
    Upstream(String),
}

impl From<reqwest::Error> for RelayError {
    fn from(err: reqwest::Error) -> Self {
        RelayError::Upstream(err.to_string())
    }
}

#[async_trait]
pub trait MessageRelay: Send + Sync {
    async fn send(&self, message: &str) -> Result<(), RelayError>;
}

/// Relay used when no bot credentials are configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledRelay;

#[async_trait]
impl MessageRelay for DisabledRelay {
    async fn send(&self, _message: &str) -> Result<(), RelayError> {
        Err(RelayError::NotConfigured)
    }
}
