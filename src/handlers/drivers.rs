use crate::handlers::users::UserResponse;
use crate::handlers::vans::VanResponse;
use crate::schemas::{dispatch_error, ApiError, ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, State},
    response::Json,
};
use tracing::{debug, info, instrument, trace};

/// Drivers free to take a ride right now
#[utoipa::path(
    get,
    path = "/api/v1/drivers/available",
    tag = "drivers",
    responses(
        (status = 200, description = "Available drivers retrieved successfully", body = ApiResponse<Vec<UserResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_available_drivers(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<UserResponse>>>, ApiError> {
    trace!("Entering get_available_drivers function");
    let drivers = state
        .dispatch
        .users
        .available_drivers()
        .await
        .map_err(dispatch_error)?;

    info!("{} drivers available", drivers.len());
    Ok(Json(ApiResponse::ok(
        drivers.into_iter().map(UserResponse::from).collect(),
        "Available drivers retrieved successfully",
    )))
}

/// Drivers that do not operate a van yet
#[utoipa::path(
    get,
    path = "/api/v1/drivers/unassigned",
    tag = "drivers",
    responses(
        (status = 200, description = "Drivers without a van retrieved successfully", body = ApiResponse<Vec<UserResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_unassigned_drivers(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<UserResponse>>>, ApiError> {
    let drivers = state
        .dispatch
        .users
        .unassigned_drivers()
        .await
        .map_err(dispatch_error)?;

    debug!("{} drivers without a van", drivers.len());
    Ok(Json(ApiResponse::ok(
        drivers.into_iter().map(UserResponse::from).collect(),
        "Drivers without a van retrieved successfully",
    )))
}

/// The van a driver operates
#[utoipa::path(
    get,
    path = "/api/v1/drivers/{username}/van",
    tag = "drivers",
    params(
        ("username" = String, Path, description = "Driver username"),
    ),
    responses(
        (status = 200, description = "Van retrieved successfully", body = ApiResponse<VanResponse>),
        (status = 404, description = "Driver or van not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_driver_van(
    Path(username): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<VanResponse>>, ApiError> {
    trace!("Entering get_driver_van function for driver: {}", username);
    let van = state
        .dispatch
        .vans
        .get_by_driver(&username)
        .await
        .map_err(dispatch_error)?;

    info!("Driver '{}' operates van '{}'", username, van.van_number);
    Ok(Json(ApiResponse::ok(
        VanResponse::from(van),
        "Van retrieved successfully",
    )))
}
