//! Discord direct-message relay.
//!
//! # Overview
//! Delivery is two REST calls against the bot API:
//! 1. `POST /users/@me/channels` with the recipient id opens (or returns the
//!    existing) DM channel;
//! 2. `POST /channels/{channel_id}/messages` posts the content.
//!
//! Both carry `Authorization: Bot <token>`.
//!
//! # Errors
//! Discord reports failures as `{ "code": <int>, "message": "…" }`. Code
//! `10013` (unknown user) becomes [`RelayError::RecipientNotFound`] and
//! `50007` (cannot send messages to this user) becomes
//! [`RelayError::CannotMessage`]. Everything else is
//! [`RelayError::Upstream`].
use super::{MessageRelay, RelayError};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

const UNKNOWN_USER: u64 = 10013;
const CANNOT_MESSAGE_USER: u64 = 50007;

#[derive(Debug, Clone)]
pub struct DiscordConfig {
    pub api_base: String,
    pub bot_token: String,
    pub recipient_id: String,
}

pub struct DiscordRelay {
    client: reqwest::Client,
    config: DiscordConfig,
}

#[derive(Serialize)]
struct OpenChannel<'a> {
    recipient_id: &'a str,
}

#[derive(Deserialize)]
struct Channel {
    id: String,
}

#[derive(Serialize)]
struct CreateMessage<'a> {
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct DiscordErrorBody {
    #[serde(default)]
    code: u64,
    #[serde(default)]
    message: String,
}

impl DiscordRelay {
    pub fn new(config: DiscordConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base.trim_end_matches('/'), path)
    }

    fn authorization(&self) -> String {
        format!("Bot {}", self.config.bot_token)
    }

    async fn open_dm_channel(&self) -> Result<String, RelayError> {
        let response = self
            .client
            .post(self.url("/users/@me/channels"))
            .header(reqwest::header::AUTHORIZATION, self.authorization())
            .json(&OpenChannel {
                recipient_id: &self.config.recipient_id,
            })
            .send()
            .await?;
        let response = check(response).await?;
        let channel: Channel = response.json().await?;
        Ok(channel.id)
    }

    async fn post_message(&self, channel_id: &str, content: &str) -> Result<(), RelayError> {
        let response = self
            .client
            .post(self.url(&format!("/channels/{channel_id}/messages")))
            .header(reqwest::header::AUTHORIZATION, self.authorization())
            .json(&CreateMessage { content })
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }
}

#[async_trait]
impl MessageRelay for DiscordRelay {
    async fn send(&self, message: &str) -> Result<(), RelayError> {
        let channel_id = self.open_dm_channel().await?;
        self.post_message(&channel_id, message).await?;
        tracing::info!(channel_id = %channel_id, bytes = message.len(), "discord message sent");
        Ok(())
    }
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response, RelayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(classify(status, &body))
}

fn classify(status: StatusCode, body: &str) -> RelayError {
    match serde_json::from_str::<DiscordErrorBody>(body) {
        Ok(err) if err.code == UNKNOWN_USER => RelayError::RecipientNotFound,
        Ok(err) if err.code == CANNOT_MESSAGE_USER => RelayError::CannotMessage,
        Ok(err) if !err.message.is_empty() => {
            RelayError::Upstream(format!("{status}: {} ({})", err.message, err.code))
        }
        _ => RelayError::Upstream(status.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, State};
    use axum::http::{HeaderMap, StatusCode as AxumStatus};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{Value, json};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Stub {
        open_failure: Option<(u16, Value)>,
        seen: Arc<Mutex<Vec<(String, String, Value)>>>,
    }

    async fn open_channel(
        State(stub): State<Stub>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> (AxumStatus, Json<Value>) {
        record(&stub, "open", &headers, body);
        if let Some((status, body)) = stub.open_failure.clone() {
            return (AxumStatus::from_u16(status).unwrap(), Json(body));
        }
        (AxumStatus::OK, Json(json!({ "id": "chan-1" })))
    }

    async fn create_message(
        State(stub): State<Stub>,
        Path(channel_id): Path<String>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> (AxumStatus, Json<Value>) {
        record(&stub, &format!("message:{channel_id}"), &headers, body);
        (AxumStatus::OK, Json(json!({ "id": "msg-1" })))
    }

    fn record(stub: &Stub, call: &str, headers: &HeaderMap, body: Value) {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        stub.seen.lock().unwrap().push((call.to_string(), auth, body));
    }

    async fn serve(stub: Stub) -> String {
        let app = Router::new()
            .route("/users/@me/channels", post(open_channel))
            .route("/channels/:channel_id/messages", post(create_message))
            .with_state(stub);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn relay(api_base: String) -> DiscordRelay {
        DiscordRelay::new(DiscordConfig {
            api_base,
            bot_token: "secret".to_string(),
            recipient_id: "42".to_string(),
        })
    }

    #[tokio::test]
    async fn send_opens_channel_then_posts_message() {
        let stub = Stub::default();
        let base = serve(stub.clone()).await;
        relay(base).send("hello there").await.expect("send");

        let seen = stub.seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].0, "open");
        assert_eq!(seen[0].1, "Bot secret");
        assert_eq!(seen[0].2, json!({ "recipient_id": "42" }));
        assert_eq!(seen[1].0, "message:chan-1");
        assert_eq!(seen[1].2, json!({ "content": "hello there" }));
    }

    #[tokio::test]
    async fn unknown_user_maps_to_recipient_not_found() {
        let stub = Stub {
            open_failure: Some((404, json!({ "code": 10013, "message": "Unknown User" }))),
            ..Stub::default()
        };
        let base = serve(stub.clone()).await;
        let err = relay(base).send("hi").await.unwrap_err();
        assert!(matches!(err, RelayError::RecipientNotFound));
        assert_eq!(stub.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn closed_dms_map_to_cannot_message() {
        let stub = Stub {
            open_failure: Some((
                403,
                json!({ "code": 50007, "message": "Cannot send messages to this user" }),
            )),
            ..Stub::default()
        };
        let base = serve(stub).await;
        let err = relay(base).send("hi").await.unwrap_err();
        assert!(matches!(err, RelayError::CannotMessage));
    }

    #[test]
    fn other_failures_are_upstream_errors() {
        let err = classify(StatusCode::UNAUTHORIZED, r#"{"code":0,"message":"401: Unauthorized"}"#);
        assert!(matches!(err, RelayError::Upstream(msg) if msg.contains("Unauthorized")));
        let err = classify(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        assert!(matches!(err, RelayError::Upstream(msg) if msg.contains("502")));
    }

    #[tokio::test]
    async fn unreachable_api_is_upstream_error() {
        let err = relay("http://127.0.0.1:1".to_string())
            .send("hi")
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Upstream(_)));
    }
}
