use crate::schemas::{dispatch_error, ApiError, ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::{DateTime, Utc};
use model::entities::message;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct SendMessageRequest {
    pub rider_id: i32,
    pub driver_id: i32,
    #[validate(length(min = 1, max = 1000))]
    pub text: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ConversationQuery {
    pub rider_id: i32,
    pub driver_id: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub id: i32,
    pub rider_id: i32,
    pub driver_id: i32,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

impl From<message::Model> for MessageResponse {
    fn from(model: message::Model) -> Self {
        Self {
            id: model.id,
            rider_id: model.rider_id,
            driver_id: model.driver_id,
            text: model.text,
            sent_at: model.sent_at,
        }
    }
}

/// Send a message from a rider to a driver
#[utoipa::path(
    post,
    path = "/api/v1/messages",
    tag = "messages",
    request_body = SendMessageRequest,
    responses(
        (status = 201, description = "Message sent", body = ApiResponse<MessageResponse>),
        (status = 400, description = "Invalid request or wrong roles", body = ErrorResponse),
        (status = 404, description = "Rider or driver not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(request))]
pub async fn send_message(
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<SendMessageRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<MessageResponse>>), ApiError> {
    let sent = state
        .dispatch
        .messages
        .send(request.rider_id, request.driver_id, &request.text)
        .await
        .map_err(dispatch_error)?;

    info!("Message {} sent from rider {} to driver {}", sent.id, sent.rider_id, sent.driver_id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(MessageResponse::from(sent), "Message sent")),
    ))
}

/// Messages between a rider and a driver, oldest first
#[utoipa::path(
    get,
    path = "/api/v1/messages",
    tag = "messages",
    params(ConversationQuery),
    responses(
        (status = 200, description = "Conversation retrieved successfully", body = ApiResponse<Vec<MessageResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_conversation(
    Query(query): Query<ConversationQuery>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<MessageResponse>>>, ApiError> {
    let messages = state
        .dispatch
        .messages
        .conversation(query.rider_id, query.driver_id)
        .await
        .map_err(dispatch_error)?;

    debug!("Retrieved {} messages", messages.len());
    Ok(Json(ApiResponse::ok(
        messages.into_iter().map(MessageResponse::from).collect(),
        "Conversation retrieved successfully",
    )))
}
