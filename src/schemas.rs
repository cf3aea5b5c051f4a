use axum::{http::StatusCode, response::Json};
use dispatch::{Dispatch, DispatchError, RetryPolicy};
use moka::future::Cache;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi, ToSchema,
};

use crate::config::Settings;
use crate::handlers::{
    auth::{LoginRequest, LoginResponse},
    messages::{MessageResponse, SendMessageRequest},
    notifications::{CreateNotificationRequest, NotificationResponse},
    reports::{CreateReportRequest, ReportResponse},
    rides::{CreateRideRequest, QueuePositionResponse, RideResponse, UpdateRideRequest},
    users::{ConfirmPasswordRequest, CreateUserRequest, UpdateUserRequest, UserResponse},
    vans::{CreateVanRequest, UpdateVanRequest, VanResponse},
};

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Domain managers sharing the connection pool
    pub dispatch: Dispatch,
    pub settings: Arc<Settings>,
    /// Ids of logged out tokens, kept until the token would have expired anyway
    pub revoked_tokens: Cache<String, ()>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, settings: Settings) -> Self {
        let dispatch = Dispatch::new(db.clone(), settings.password_hash_cost);
        let revoked_tokens = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(settings.token_ttl())
            .build();

        Self {
            db,
            dispatch,
            settings: Arc::new(settings),
            revoked_tokens,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.settings.retry_policy()
    }
}

/// API response wrapper
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success status
    pub success: bool,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
            success: true,
        }
    }
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

/// Health check response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// Error half of every handler result.
pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn api_error(status: StatusCode, code: &str, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.to_string(),
            success: false,
        }),
    )
}

/// Map a dispatch failure to its HTTP status and error body.
///
/// Internal failures are logged here and reported to the client without
/// their details.
pub fn dispatch_error(err: DispatchError) -> ApiError {
    let status = match &err {
        DispatchError::Validation(_) | DispatchError::InvalidRole { .. } => StatusCode::BAD_REQUEST,
        DispatchError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        DispatchError::NotFound { .. } | DispatchError::NoPendingRide(_) => StatusCode::NOT_FOUND,
        DispatchError::DuplicateUsername(_)
        | DispatchError::DuplicateEmail(_)
        | DispatchError::DuplicateVanNumber(_)
        | DispatchError::DriverAlreadyHasVan(_)
        | DispatchError::InvalidTransition { .. }
        | DispatchError::AlreadyAssigned(_)
        | DispatchError::RideChanged(_) => StatusCode::CONFLICT,
        DispatchError::NoDriverAvailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        DispatchError::Database(_) | DispatchError::PasswordHash(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!("Internal error: {}", err);
        "Internal server error".to_string()
    } else {
        err.to_string()
    };

    api_error(status, err.code(), message)
}

/// Registers the bearer token scheme used by the auth endpoints.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::auth::register,
        crate::handlers::auth::login,
        crate::handlers::auth::logout,
        crate::handlers::auth::me,
        crate::handlers::users::get_users,
        crate::handlers::users::get_user,
        crate::handlers::users::update_user,
        crate::handlers::users::delete_user,
        crate::handlers::drivers::get_available_drivers,
        crate::handlers::drivers::get_unassigned_drivers,
        crate::handlers::drivers::get_driver_van,
        crate::handlers::rides::create_ride,
        crate::handlers::rides::get_rides,
        crate::handlers::rides::get_ride,
        crate::handlers::rides::update_ride,
        crate::handlers::rides::delete_ride,
        crate::handlers::rides::assign_ride,
        crate::handlers::rides::get_queue_position,
        crate::handlers::vans::create_van,
        crate::handlers::vans::get_vans,
        crate::handlers::vans::get_van,
        crate::handlers::vans::get_van_by_id,
        crate::handlers::vans::update_van,
        crate::handlers::vans::delete_van,
        crate::handlers::reports::create_report,
        crate::handlers::reports::get_reports,
        crate::handlers::reports::get_report,
        crate::handlers::messages::send_message,
        crate::handlers::messages::get_conversation,
        crate::handlers::notifications::create_notification,
        crate::handlers::notifications::get_notifications,
        crate::handlers::notifications::get_notification,
    ),
    components(
        schemas(
            ApiResponse<UserResponse>,
            ApiResponse<Vec<UserResponse>>,
            ApiResponse<VanResponse>,
            ApiResponse<RideResponse>,
            ApiResponse<LoginResponse>,
            ErrorResponse,
            HealthResponse,
            CreateUserRequest,
            UpdateUserRequest,
            ConfirmPasswordRequest,
            UserResponse,
            LoginRequest,
            LoginResponse,
            CreateVanRequest,
            UpdateVanRequest,
            VanResponse,
            CreateRideRequest,
            UpdateRideRequest,
            RideResponse,
            QueuePositionResponse,
            CreateReportRequest,
            ReportResponse,
            SendMessageRequest,
            MessageResponse,
            CreateNotificationRequest,
            NotificationResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Registration, login and bearer tokens"),
        (name = "users", description = "User account management"),
        (name = "drivers", description = "Driver availability and vans"),
        (name = "rides", description = "Ride requests, assignment and queue"),
        (name = "vans", description = "Fleet management"),
        (name = "reports", description = "Incident and feedback reports"),
        (name = "messages", description = "Rider to driver messages"),
        (name = "notifications", description = "Rider notifications"),
    ),
    info(
        title = "BOSS API",
        description = "Campus safe-ride dispatch: riders request rides, drivers are matched to them with their vans, supervisors manage the fleet",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
