use crate::auth::AuthenticatedUser;
use crate::schemas::{api_error, dispatch_error, ApiError, ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use dispatch::{UserChanges, UserLookup};
use model::entities::user::{self, UserType};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Request body for registering a new user
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateUserRequest {
    /// Username (must be unique)
    #[validate(length(min = 1, max = 25))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1, max = 15))]
    pub phone_number: String,
    #[validate(length(min = 1))]
    pub address: String,
    /// Email (must be unique)
    #[validate(email)]
    pub email: String,
    /// `S`, `D`, `R`, `A` or the full role name
    pub user_type: String,
}

/// Request body for editing a user.
///
/// Edits must either carry the user's current password or set `bypass`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema, Validate)]
pub struct UpdateUserRequest {
    pub current_password: Option<String>,
    /// Skip the password check. Requires a supervisor or admin bearer token.
    #[serde(default)]
    pub bypass: bool,
    /// New password
    #[validate(length(min = 1))]
    pub password: Option<String>,
    #[validate(length(min = 1))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 15))]
    pub phone_number: Option<String>,
    #[validate(length(min = 1))]
    pub address: Option<String>,
    pub user_type: Option<String>,
}

/// Confirmation required to delete a user
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct ConfirmPasswordRequest {
    pub current_password: Option<String>,
    /// Skip the password check. Requires a supervisor or admin bearer token.
    #[serde(default)]
    pub bypass: bool,
}

/// Search parameters for listing users
#[derive(Debug, Deserialize, IntoParams)]
pub struct UserSearchQuery {
    /// One of username, name, email, address, phone_number, user_type
    pub field: Option<String>,
    pub value: Option<String>,
}

/// User response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
    pub name: String,
    pub phone_number: String,
    pub address: String,
    pub email: String,
    pub user_type: String,
    /// Driver availability, only set for drivers
    pub status: Option<String>,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            name: model.name,
            phone_number: model.phone_number,
            address: model.address,
            email: model.email,
            user_type: model.user_type.code().to_string(),
            status: model.status.map(|s| s.to_string()),
        }
    }
}

pub(crate) fn parse_user_type(value: &str) -> Result<UserType, ApiError> {
    UserType::from_str(value).map_err(|e| {
        warn!("{}", e);
        api_error(StatusCode::BAD_REQUEST, "INVALID_USER_TYPE", e)
    })
}

/// Check the caller may change `username`: either a staff caller set
/// `bypass` or the current password matches.
async fn confirm_password(
    state: &AppState,
    username: &str,
    current_password: Option<&str>,
    bypass: bool,
    caller: Option<&AuthenticatedUser>,
) -> Result<(), ApiError> {
    if bypass {
        let staff = caller.is_some_and(|caller| {
            UserType::from_str(&caller.claims.role).is_ok_and(|role| role.is_staff())
        });
        if !staff {
            warn!("Password bypass for user '{}' refused to non-staff caller", username);
            return Err(api_error(
                StatusCode::FORBIDDEN,
                "BYPASS_NOT_ALLOWED",
                "Only supervisors and admins may skip the password check",
            ));
        }
        debug!("Password check bypassed for user '{}'", username);
        return Ok(());
    }

    let Some(password) = current_password else {
        warn!("No current password given for changes to user '{}'", username);
        return Err(api_error(
            StatusCode::FORBIDDEN,
            "INVALID_PASSWORD",
            "Current password is required",
        ));
    };

    let valid = state
        .dispatch
        .users
        .verify_password(username, password)
        .await
        .map_err(dispatch_error)?;
    if !valid {
        warn!("Wrong current password for user '{}'", username);
        return Err(api_error(
            StatusCode::FORBIDDEN,
            "INVALID_PASSWORD",
            "Current password is incorrect",
        ));
    }
    Ok(())
}

/// List users, optionally filtered by one field
#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "users",
    params(UserSearchQuery),
    responses(
        (status = 200, description = "Users retrieved successfully", body = ApiResponse<Vec<UserResponse>>),
        (status = 400, description = "Unknown search field", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_users(
    Query(query): Query<UserSearchQuery>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<UserResponse>>>, ApiError> {
    trace!("Entering get_users function");

    let users = match (query.field.as_deref(), query.value.as_deref()) {
        (Some(field), Some(value)) => {
            debug!("Searching users where {} = {}", field, value);
            let lookup = UserLookup::from_str(field).map_err(|e| {
                warn!("{}", e);
                api_error(StatusCode::BAD_REQUEST, "INVALID_SEARCH_FIELD", e)
            })?;
            state.dispatch.users.find(lookup, value).await
        }
        _ => {
            debug!("Fetching all users");
            state.dispatch.users.get_all().await
        }
    }
    .map_err(dispatch_error)?;

    info!("Successfully retrieved {} users", users.len());
    Ok(Json(ApiResponse::ok(
        users.into_iter().map(UserResponse::from).collect(),
        "Users retrieved successfully",
    )))
}

/// Get a user by username
#[utoipa::path(
    get,
    path = "/api/v1/users/{username}",
    tag = "users",
    params(
        ("username" = String, Path, description = "Username"),
    ),
    responses(
        (status = 200, description = "User retrieved successfully", body = ApiResponse<UserResponse>),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_user(
    Path(username): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    trace!("Entering get_user function for username: {}", username);

    match state.dispatch.users.require_by_username(&username).await {
        Ok(user_model) => {
            info!("Successfully retrieved user with ID: {}, username: {}", user_model.id, user_model.username);
            Ok(Json(ApiResponse::ok(
                UserResponse::from(user_model),
                "User retrieved successfully",
            )))
        }
        Err(e) => Err(dispatch_error(e)),
    }
}

/// Update a user
#[utoipa::path(
    put,
    path = "/api/v1/users/{username}",
    tag = "users",
    params(
        ("username" = String, Path, description = "Username"),
    ),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated successfully", body = ApiResponse<UserResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Current password missing or wrong, or bypass without a staff token", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "Email already in use", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security((), ("bearer_auth" = []))
)]
#[instrument(skip(request))]
pub async fn update_user(
    Path(username): Path<String>,
    State(state): State<AppState>,
    caller: Option<AuthenticatedUser>,
    Valid(Json(request)): Valid<Json<UpdateUserRequest>>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    trace!("Entering update_user function for username: {}", username);

    // Missing users are a 404 even when the password check is bypassed
    state
        .dispatch
        .users
        .require_by_username(&username)
        .await
        .map_err(dispatch_error)?;
    confirm_password(
        &state,
        &username,
        request.current_password.as_deref(),
        request.bypass,
        caller.as_ref(),
    )
    .await?;

    let user_type = match request.user_type.as_deref() {
        Some(value) => Some(parse_user_type(value)?),
        None => None,
    };
    let changes = UserChanges {
        password: request.password,
        name: request.name,
        email: request.email,
        phone_number: request.phone_number,
        address: request.address,
        user_type,
    };
    if changes.is_empty() {
        debug!("No fields to update for user '{}'", username);
    }

    match state.dispatch.users.edit(&username, changes).await {
        Ok(updated_user) => {
            info!("User '{}' updated successfully", username);
            Ok(Json(ApiResponse::ok(
                UserResponse::from(updated_user),
                "User updated successfully",
            )))
        }
        Err(e) => {
            error!("Failed to update user '{}': {}", username, e);
            Err(dispatch_error(e))
        }
    }
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/api/v1/users/{username}",
    tag = "users",
    params(
        ("username" = String, Path, description = "Username"),
    ),
    request_body = ConfirmPasswordRequest,
    responses(
        (status = 200, description = "User deleted successfully", body = ApiResponse<String>),
        (status = 403, description = "Current password missing or wrong, or bypass without a staff token", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security((), ("bearer_auth" = []))
)]
#[instrument(skip(request))]
pub async fn delete_user(
    Path(username): Path<String>,
    State(state): State<AppState>,
    caller: Option<AuthenticatedUser>,
    Json(request): Json<ConfirmPasswordRequest>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    trace!("Entering delete_user function for username: {}", username);

    state
        .dispatch
        .users
        .require_by_username(&username)
        .await
        .map_err(dispatch_error)?;
    confirm_password(
        &state,
        &username,
        request.current_password.as_deref(),
        request.bypass,
        caller.as_ref(),
    )
    .await?;

    state
        .dispatch
        .users
        .delete(&username)
        .await
        .map_err(dispatch_error)?;

    info!("User '{}' deleted successfully", username);
    Ok(Json(ApiResponse::ok(
        format!("User {} deleted", username),
        "User deleted successfully",
    )))
}
