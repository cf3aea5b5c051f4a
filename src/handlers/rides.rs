use crate::schemas::{api_error, dispatch_error, ApiError, ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::{DateTime, Utc};
use dispatch::{NewRide, QueuePosition, RideChanges, RideFilter};
use model::entities::ride::{self, RideStatus};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Request body for requesting a ride
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateRideRequest {
    pub rider_id: i32,
    #[validate(length(min = 1))]
    pub pickup_location: String,
    #[validate(length(min = 1))]
    pub dropoff_location: String,
    /// Defaults to 1
    #[validate(range(min = 1, max = 50))]
    pub num_passengers: Option<i32>,
    /// Needs a wheelchair accessible van
    #[serde(default)]
    pub ada_required: bool,
    pub pickup_time: Option<DateTime<Utc>>,
}

/// Request body for updating a ride
#[derive(Debug, Default, Deserialize, Serialize, ToSchema, Validate)]
pub struct UpdateRideRequest {
    #[validate(length(min = 1))]
    pub pickup_location: Option<String>,
    #[validate(length(min = 1))]
    pub dropoff_location: Option<String>,
    #[validate(range(min = 1, max = 50))]
    pub num_passengers: Option<i32>,
    pub ada_required: Option<bool>,
    pub pickup_time: Option<DateTime<Utc>>,
    /// New lifecycle status, e.g. `in_progress`, `completed`, `cancelled`
    pub status: Option<String>,
}

/// Filters for listing rides
#[derive(Debug, Deserialize, IntoParams)]
pub struct RideListQuery {
    /// Comma separated statuses, e.g. `pending,assigned`
    pub status: Option<String>,
    pub rider_id: Option<i32>,
    pub driver_id: Option<i32>,
    pub van_id: Option<i32>,
}

/// Ride response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RideResponse {
    pub id: i32,
    pub rider_id: i32,
    pub driver_id: Option<i32>,
    pub van_id: Option<i32>,
    pub pickup_location: String,
    pub dropoff_location: String,
    pub num_passengers: i32,
    pub ada_required: bool,
    pub status: String,
    pub pickup_time: Option<DateTime<Utc>>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<ride::Model> for RideResponse {
    fn from(model: ride::Model) -> Self {
        Self {
            id: model.id,
            rider_id: model.rider_id,
            driver_id: model.driver_id,
            van_id: model.van_id,
            pickup_location: model.pickup_location,
            dropoff_location: model.dropoff_location,
            num_passengers: model.num_passengers,
            ada_required: model.ada_required,
            status: model.status.to_string(),
            pickup_time: model.pickup_time,
            assigned_at: model.assigned_at,
            created_at: model.created_at,
        }
    }
}

/// A rider's place in the pending queue
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct QueuePositionResponse {
    pub rider_id: i32,
    pub ride_id: i32,
    /// 1-based place in line
    pub position: u64,
    pub rides_ahead: u64,
    pub pending_total: u64,
}

impl QueuePositionResponse {
    fn new(rider_id: i32, queue: QueuePosition) -> Self {
        Self {
            rider_id,
            ride_id: queue.ride_id,
            position: queue.position,
            rides_ahead: queue.rides_ahead,
            pending_total: queue.pending_total,
        }
    }
}

fn parse_status(value: &str) -> Result<RideStatus, ApiError> {
    RideStatus::from_str(value).map_err(|e| {
        warn!("{}", e);
        api_error(StatusCode::BAD_REQUEST, "INVALID_STATUS", e)
    })
}

/// Parse a comma separated status list; blank entries are ignored.
fn parse_statuses(value: &str) -> Result<Vec<RideStatus>, ApiError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse_status)
        .collect()
}

/// Request a ride
///
/// The ride is queued as pending and immediately offered to the first free
/// driver; when nobody is free it stays in the queue.
#[utoipa::path(
    post,
    path = "/api/v1/rides",
    tag = "rides",
    request_body = CreateRideRequest,
    responses(
        (status = 201, description = "Ride created", body = ApiResponse<RideResponse>),
        (status = 400, description = "Invalid request or requester is not a rider", body = ErrorResponse),
        (status = 404, description = "Rider not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn create_ride(
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<CreateRideRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<RideResponse>>), ApiError> {
    trace!("Entering create_ride function");
    debug!("Rider {} requests a ride from '{}' to '{}'", request.rider_id, request.pickup_location, request.dropoff_location);

    let new_ride = NewRide {
        pickup_location: request.pickup_location,
        dropoff_location: request.dropoff_location,
        num_passengers: request.num_passengers.unwrap_or(1),
        ada_required: request.ada_required,
        pickup_time: request.pickup_time,
    };

    match state.dispatch.rides.create(request.rider_id, new_ride).await {
        Ok(ride_model) => {
            let message = match ride_model.status {
                RideStatus::Assigned => "Ride created and assigned to a driver",
                _ => "Ride created and queued",
            };
            info!("Ride {} created with status {}", ride_model.id, ride_model.status);
            Ok((
                StatusCode::CREATED,
                Json(ApiResponse::ok(RideResponse::from(ride_model), message)),
            ))
        }
        Err(e) => {
            warn!("Failed to create ride for rider {}: {}", request.rider_id, e);
            Err(dispatch_error(e))
        }
    }
}

/// List rides
#[utoipa::path(
    get,
    path = "/api/v1/rides",
    tag = "rides",
    params(RideListQuery),
    responses(
        (status = 200, description = "Rides retrieved successfully", body = ApiResponse<Vec<RideResponse>>),
        (status = 400, description = "Unknown status", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_rides(
    Query(query): Query<RideListQuery>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<RideResponse>>>, ApiError> {
    trace!("Entering get_rides function");

    let statuses = match query.status.as_deref() {
        Some(value) => parse_statuses(value)?,
        None => Vec::new(),
    };
    let filter = RideFilter {
        rider_id: query.rider_id,
        driver_id: query.driver_id,
        van_id: query.van_id,
        statuses,
    };

    let rides = state.dispatch.rides.find(filter).await.map_err(dispatch_error)?;

    info!("Successfully retrieved {} rides", rides.len());
    Ok(Json(ApiResponse::ok(
        rides.into_iter().map(RideResponse::from).collect(),
        "Rides retrieved successfully",
    )))
}

/// Get a ride
#[utoipa::path(
    get,
    path = "/api/v1/rides/{ride_id}",
    tag = "rides",
    params(
        ("ride_id" = i32, Path, description = "Ride ID"),
    ),
    responses(
        (status = 200, description = "Ride retrieved successfully", body = ApiResponse<RideResponse>),
        (status = 404, description = "Ride not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_ride(
    Path(ride_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<RideResponse>>, ApiError> {
    let ride_model = state.dispatch.rides.get(ride_id).await.map_err(dispatch_error)?;

    Ok(Json(ApiResponse::ok(
        RideResponse::from(ride_model),
        "Ride retrieved successfully",
    )))
}

/// Update a ride
///
/// Status changes follow the ride lifecycle; completing or cancelling a ride
/// frees its driver.
#[utoipa::path(
    put,
    path = "/api/v1/rides/{ride_id}",
    tag = "rides",
    params(
        ("ride_id" = i32, Path, description = "Ride ID"),
    ),
    request_body = UpdateRideRequest,
    responses(
        (status = 200, description = "Ride updated successfully", body = ApiResponse<RideResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Ride not found", body = ErrorResponse),
        (status = 409, description = "Status change not allowed", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn update_ride(
    Path(ride_id): Path<i32>,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<UpdateRideRequest>>,
) -> Result<Json<ApiResponse<RideResponse>>, ApiError> {
    trace!("Entering update_ride function for ride_id: {}", ride_id);

    let status = match request.status.as_deref() {
        Some(value) => Some(parse_status(value)?),
        None => None,
    };
    let changes = RideChanges {
        pickup_location: request.pickup_location,
        dropoff_location: request.dropoff_location,
        num_passengers: request.num_passengers,
        ada_required: request.ada_required,
        pickup_time: request.pickup_time,
        status,
    };

    match state.dispatch.rides.edit(ride_id, changes).await {
        Ok(updated) => {
            info!("Ride {} updated successfully", ride_id);
            Ok(Json(ApiResponse::ok(
                RideResponse::from(updated),
                "Ride updated successfully",
            )))
        }
        Err(e) => {
            error!("Failed to update ride {}: {}", ride_id, e);
            Err(dispatch_error(e))
        }
    }
}

/// Delete a ride
#[utoipa::path(
    delete,
    path = "/api/v1/rides/{ride_id}",
    tag = "rides",
    params(
        ("ride_id" = i32, Path, description = "Ride ID"),
    ),
    responses(
        (status = 200, description = "Ride deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Ride not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn delete_ride(
    Path(ride_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    state.dispatch.rides.delete(ride_id).await.map_err(dispatch_error)?;

    info!("Ride {} deleted successfully", ride_id);
    Ok(Json(ApiResponse::ok(
        format!("Ride {} deleted", ride_id),
        "Ride deleted successfully",
    )))
}

/// Assign a driver to a pending ride, retrying while nobody is free
#[utoipa::path(
    post,
    path = "/api/v1/rides/{ride_id}/assign",
    tag = "rides",
    params(
        ("ride_id" = i32, Path, description = "Ride ID"),
    ),
    responses(
        (status = 200, description = "Driver assigned", body = ApiResponse<RideResponse>),
        (status = 404, description = "Ride not found", body = ErrorResponse),
        (status = 409, description = "Ride already assigned or no longer pending", body = ErrorResponse),
        (status = 503, description = "No driver became available", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn assign_ride(
    Path(ride_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<RideResponse>>, ApiError> {
    trace!("Entering assign_ride function for ride_id: {}", ride_id);
    let policy = state.retry_policy();
    debug!("Assigning ride {} with {:?}", ride_id, policy);

    let assigned = state
        .dispatch
        .rides
        .assign_with_retry(ride_id, policy)
        .await
        .map_err(dispatch_error)?;

    info!("Ride {} assigned to driver {:?}", ride_id, assigned.driver_id);
    Ok(Json(ApiResponse::ok(
        RideResponse::from(assigned),
        "Driver assigned successfully",
    )))
}

/// Where a rider's pending ride sits in the queue
#[utoipa::path(
    get,
    path = "/api/v1/riders/{rider_id}/queue-position",
    tag = "rides",
    params(
        ("rider_id" = i32, Path, description = "Rider ID"),
    ),
    responses(
        (status = 200, description = "Queue position retrieved successfully", body = ApiResponse<QueuePositionResponse>),
        (status = 404, description = "Rider has no pending ride", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_queue_position(
    Path(rider_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<QueuePositionResponse>>, ApiError> {
    let queue = state
        .dispatch
        .rides
        .queue_position(rider_id)
        .await
        .map_err(dispatch_error)?;

    debug!("Rider {} is number {} in the queue", rider_id, queue.position);
    Ok(Json(ApiResponse::ok(
        QueuePositionResponse::new(rider_id, queue),
        "Queue position retrieved successfully",
    )))
}
