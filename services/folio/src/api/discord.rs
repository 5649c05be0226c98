//! Contact-form relay handler.
use crate::api::error::{ApiError, api_bad_request, api_forbidden, api_internal, api_not_found};
use crate::api::types::{DirectMessageRequest, MessageResponse};
use crate::app::AppState;
use crate::relay::RelayError;
use axum::Json;
use axum::extract::State;

#[utoipa::path(
    post,
    path = "/api/discord/dm",
    tag = "contact",
    request_body = DirectMessageRequest,
    responses(
        (status = 200, description = "Message delivered", body = MessageResponse),
        (status = 400, description = "Message missing or blank", body = crate::api::types::ErrorResponse),
        (status = 403, description = "Recipient does not accept direct messages", body = crate::api::types::ErrorResponse),
        (status = 404, description = "Recipient not found", body = crate::api::types::ErrorResponse),
        (status = 500, description = "Relay unavailable", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn send_direct_message(
    State(state): State<AppState>,
    body: Option<Json<DirectMessageRequest>>,
) -> Result<Json<MessageResponse>, ApiError> {
    let message = body
        .and_then(|Json(body)| body.message)
        .filter(|message| !message.trim().is_empty())
        .ok_or_else(|| api_bad_request("Message is required"))?;

    match state.relay.send(&message).await {
        Ok(()) => Ok(Json(MessageResponse {
            message: "Message sent".to_string(),
        })),
        Err(RelayError::RecipientNotFound) => Err(api_not_found("Recipient not found")),
        Err(RelayError::CannotMessage) => {
            Err(api_forbidden("Cannot send messages to this user"))
        }
        Err(err) => Err(api_internal("Failed to send message", &err)),
    }
}
