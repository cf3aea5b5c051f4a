use crate::schemas::{dispatch_error, ApiError, ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::{DateTime, Utc};
use model::entities::notification;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateNotificationRequest {
    pub rider_id: i32,
    #[validate(length(min = 1, max = 1000))]
    pub text: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct NotificationQuery {
    pub rider_id: Option<i32>,
}

/// Notifications are only readable by the rider they were sent to.
#[derive(Debug, Deserialize, IntoParams)]
pub struct NotificationOwnerQuery {
    pub rider_id: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NotificationResponse {
    pub id: i32,
    pub rider_id: i32,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl From<notification::Model> for NotificationResponse {
    fn from(model: notification::Model) -> Self {
        Self {
            id: model.id,
            rider_id: model.rider_id,
            text: model.text,
            created_at: model.created_at,
        }
    }
}

/// Notify a rider
#[utoipa::path(
    post,
    path = "/api/v1/notifications",
    tag = "notifications",
    request_body = CreateNotificationRequest,
    responses(
        (status = 201, description = "Notification created", body = ApiResponse<NotificationResponse>),
        (status = 400, description = "Invalid request or user is not a rider", body = ErrorResponse),
        (status = 404, description = "Rider not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn create_notification(
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<CreateNotificationRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<NotificationResponse>>), ApiError> {
    let created = state
        .dispatch
        .notifications
        .create(request.rider_id, &request.text)
        .await
        .map_err(dispatch_error)?;

    info!("Notification {} created for rider {}", created.id, created.rider_id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            NotificationResponse::from(created),
            "Notification created successfully",
        )),
    ))
}

/// List notifications, newest first
#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    tag = "notifications",
    params(NotificationQuery),
    responses(
        (status = 200, description = "Notifications retrieved successfully", body = ApiResponse<Vec<NotificationResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_notifications(
    Query(query): Query<NotificationQuery>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<NotificationResponse>>>, ApiError> {
    let notifications = match query.rider_id {
        Some(rider_id) => state.dispatch.notifications.for_rider(rider_id).await,
        None => state.dispatch.notifications.get_all().await,
    }
    .map_err(dispatch_error)?;

    debug!("Retrieved {} notifications", notifications.len());
    Ok(Json(ApiResponse::ok(
        notifications.into_iter().map(NotificationResponse::from).collect(),
        "Notifications retrieved successfully",
    )))
}

/// Get one notification addressed to a rider
#[utoipa::path(
    get,
    path = "/api/v1/notifications/{notification_id}",
    tag = "notifications",
    params(
        ("notification_id" = i32, Path, description = "Notification id"),
        NotificationOwnerQuery
    ),
    responses(
        (status = 200, description = "Notification retrieved successfully", body = ApiResponse<NotificationResponse>),
        (status = 400, description = "Missing rider_id", body = ErrorResponse),
        (status = 404, description = "Notification not found for this rider", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_notification(
    Path(notification_id): Path<i32>,
    Query(query): Query<NotificationOwnerQuery>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<NotificationResponse>>, ApiError> {
    let found = state
        .dispatch
        .notifications
        .get(notification_id, query.rider_id)
        .await
        .map_err(dispatch_error)?;

    debug!("Notification {} read by rider {}", found.id, query.rider_id);
    Ok(Json(ApiResponse::ok(
        NotificationResponse::from(found),
        "Notification retrieved successfully",
    )))
}
