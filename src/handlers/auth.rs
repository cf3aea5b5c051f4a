use crate::auth::{issue_token, AuthenticatedUser};
use crate::handlers::users::{parse_user_type, CreateUserRequest, UserResponse};
use crate::schemas::{api_error, dispatch_error, ApiError, ApiResponse, AppState, ErrorResponse};
use axum::{extract::State, http::StatusCode, response::Json};
use axum_valid::Valid;
use dispatch::{DispatchError, NewUser};
use model::entities::user::UserType;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    /// Seconds until the token expires
    pub expires_in: u64,
    pub user_type: String,
    /// Landing page for the user's role
    pub homepage: String,
    pub user: UserResponse,
}

/// Landing page for each role.
pub fn homepage(user_type: UserType) -> &'static str {
    match user_type {
        UserType::Supervisor => "/supervisor/home",
        UserType::Driver => "/driver/home",
        UserType::Rider => "/rider/home",
        UserType::Admin => "/admin/home",
    }
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "auth",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User registered successfully", body = ApiResponse<UserResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Username or email already exists", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(request), fields(username = %request.username))]
pub async fn register(
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<CreateUserRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>), ApiError> {
    trace!("Entering register function");
    let user_type = parse_user_type(&request.user_type)?;
    debug!("Registering '{}' as {}", request.username, user_type);

    let new_user = NewUser {
        username: request.username,
        password: request.password,
        name: request.name,
        phone_number: request.phone_number,
        address: request.address,
        email: request.email,
        user_type,
    };

    match state.dispatch.users.create(new_user).await {
        Ok(user_model) => {
            info!("User created successfully with ID: {}, username: {}", user_model.id, user_model.username);
            Ok((
                StatusCode::CREATED,
                Json(ApiResponse::ok(
                    UserResponse::from(user_model),
                    "User created successfully",
                )),
            ))
        }
        Err(e) => {
            warn!("Failed to register user: {}", e);
            Err(dispatch_error(e))
        }
    }
}

/// Log in and receive a bearer token
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Invalid username or password", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(request), fields(username = %request.username))]
pub async fn login(
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<LoginRequest>>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    trace!("Entering login function");

    let user_model = state
        .dispatch
        .users
        .authenticate(&request.username, &request.password)
        .await
        .map_err(dispatch_error)?
        .ok_or_else(|| dispatch_error(DispatchError::InvalidCredentials))?;

    let (token, _claims) = issue_token(&state.settings, &user_model).map_err(|e| {
        error!("Failed to sign token for '{}': {}", user_model.username, e);
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "TOKEN_ERROR",
            "Failed to issue token",
        )
    })?;

    let user_type = user_model.user_type;
    info!("User '{}' logged in as {}", user_model.username, user_type);
    Ok(Json(ApiResponse::ok(
        LoginResponse {
            token,
            token_type: "Bearer".to_string(),
            expires_in: state.settings.token_ttl_secs,
            user_type: user_type.code().to_string(),
            homepage: homepage(user_type).to_string(),
            user: UserResponse::from(user_model),
        },
        format!("Logged in as {:?}", user_type),
    )))
}

/// Revoke the presented bearer token
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Logged out", body = ApiResponse<String>),
        (status = 401, description = "Missing, invalid or revoked token", body = ErrorResponse)
    )
)]
#[instrument(skip(state, auth))]
pub async fn logout(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    trace!("Entering logout function");
    state
        .revoked_tokens
        .insert(auth.claims.jti.clone(), ())
        .await;

    info!("User '{}' logged out", auth.claims.sub);
    Ok(Json(ApiResponse::ok(
        auth.claims.sub,
        "Logged out successfully",
    )))
}

/// The user the presented bearer token belongs to
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = ApiResponse<UserResponse>),
        (status = 401, description = "Missing, invalid or revoked token", body = ErrorResponse),
        (status = 404, description = "User no longer exists", body = ErrorResponse)
    )
)]
#[instrument(skip(state, auth))]
pub async fn me(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let user_model = state
        .dispatch
        .users
        .get_by_id(auth.claims.uid)
        .await
        .map_err(dispatch_error)?;

    Ok(Json(ApiResponse::ok(
        UserResponse::from(user_model),
        "User retrieved successfully",
    )))
}
