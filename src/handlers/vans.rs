use crate::schemas::{api_error, dispatch_error, ApiError, ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use dispatch::{NewVan, VanChanges};
use model::entities::van;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::Validate;

/// Request body for adding a van to the fleet
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateVanRequest {
    #[validate(length(min = 1, max = 15))]
    pub van_number: String,
    /// Wheelchair accessible
    #[serde(default)]
    pub ada: bool,
    /// Username of the driver operating the van
    pub driver: Option<String>,
}

/// Request body for updating a van
#[derive(Debug, Default, Deserialize, Serialize, ToSchema, Validate)]
pub struct UpdateVanRequest {
    #[validate(length(min = 1, max = 15))]
    pub van_number: Option<String>,
    pub ada: Option<bool>,
    /// Hand the van to this driver
    pub driver: Option<String>,
    /// Take the van away from its driver
    #[serde(default)]
    pub remove_driver: bool,
}

/// Van response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VanResponse {
    pub id: i32,
    pub van_number: String,
    pub ada: bool,
    pub driver_id: Option<i32>,
}

impl From<van::Model> for VanResponse {
    fn from(model: van::Model) -> Self {
        Self {
            id: model.id,
            van_number: model.van_number,
            ada: model.ada,
            driver_id: model.driver_id,
        }
    }
}

/// Add a van
#[utoipa::path(
    post,
    path = "/api/v1/vans",
    tag = "vans",
    request_body = CreateVanRequest,
    responses(
        (status = 201, description = "Van created successfully", body = ApiResponse<VanResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Driver not found", body = ErrorResponse),
        (status = 409, description = "Van number taken or driver already has a van", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn create_van(
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<CreateVanRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<VanResponse>>), ApiError> {
    trace!("Entering create_van function");
    debug!("Creating van '{}' (ada: {}, driver: {:?})", request.van_number, request.ada, request.driver);

    let new_van = NewVan {
        van_number: request.van_number,
        ada: request.ada,
        driver: request.driver,
    };

    match state.dispatch.vans.create(new_van).await {
        Ok(van_model) => {
            info!("Van created successfully with ID: {}", van_model.id);
            Ok((
                StatusCode::CREATED,
                Json(ApiResponse::ok(
                    VanResponse::from(van_model),
                    "Van created successfully",
                )),
            ))
        }
        Err(e) => {
            warn!("Failed to create van: {}", e);
            Err(dispatch_error(e))
        }
    }
}

/// List all vans
#[utoipa::path(
    get,
    path = "/api/v1/vans",
    tag = "vans",
    responses(
        (status = 200, description = "Vans retrieved successfully", body = ApiResponse<Vec<VanResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_vans(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<VanResponse>>>, ApiError> {
    let vans = state.dispatch.vans.get_all().await.map_err(dispatch_error)?;

    info!("Successfully retrieved {} vans", vans.len());
    Ok(Json(ApiResponse::ok(
        vans.into_iter().map(VanResponse::from).collect(),
        "Vans retrieved successfully",
    )))
}

/// Get a van by number
#[utoipa::path(
    get,
    path = "/api/v1/vans/{van_number}",
    tag = "vans",
    params(
        ("van_number" = String, Path, description = "Van number"),
    ),
    responses(
        (status = 200, description = "Van retrieved successfully", body = ApiResponse<VanResponse>),
        (status = 404, description = "Van not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_van(
    Path(van_number): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<VanResponse>>, ApiError> {
    let van_model = state
        .dispatch
        .vans
        .get_by_number(&van_number)
        .await
        .map_err(dispatch_error)?;

    Ok(Json(ApiResponse::ok(
        VanResponse::from(van_model),
        "Van retrieved successfully",
    )))
}

/// Get a van by its database id
#[utoipa::path(
    get,
    path = "/api/v1/vans/by-id/{van_id}",
    tag = "vans",
    params(
        ("van_id" = i32, Path, description = "Van id"),
    ),
    responses(
        (status = 200, description = "Van retrieved successfully", body = ApiResponse<VanResponse>),
        (status = 404, description = "Van not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_van_by_id(
    Path(van_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<VanResponse>>, ApiError> {
    let van_model = state
        .dispatch
        .vans
        .get_by_id(van_id)
        .await
        .map_err(dispatch_error)?;

    Ok(Json(ApiResponse::ok(
        VanResponse::from(van_model),
        "Van retrieved successfully",
    )))
}

/// Update a van
#[utoipa::path(
    put,
    path = "/api/v1/vans/{van_number}",
    tag = "vans",
    params(
        ("van_number" = String, Path, description = "Van number"),
    ),
    request_body = UpdateVanRequest,
    responses(
        (status = 200, description = "Van updated successfully", body = ApiResponse<VanResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Van or driver not found", body = ErrorResponse),
        (status = 409, description = "Van number taken or driver already has a van", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn update_van(
    Path(van_number): Path<String>,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<UpdateVanRequest>>,
) -> Result<Json<ApiResponse<VanResponse>>, ApiError> {
    trace!("Entering update_van function for van: {}", van_number);

    let driver = match (request.driver, request.remove_driver) {
        (Some(_), true) => {
            return Err(api_error(
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                "driver and remove_driver cannot be combined",
            ));
        }
        (Some(username), false) => Some(Some(username)),
        (None, true) => Some(None),
        (None, false) => None,
    };
    let changes = VanChanges {
        van_number: request.van_number,
        ada: request.ada,
        driver,
    };

    match state.dispatch.vans.edit(&van_number, changes).await {
        Ok(updated) => {
            info!("Van '{}' updated successfully", van_number);
            Ok(Json(ApiResponse::ok(
                VanResponse::from(updated),
                "Van updated successfully",
            )))
        }
        Err(e) => {
            error!("Failed to update van '{}': {}", van_number, e);
            Err(dispatch_error(e))
        }
    }
}

/// Remove a van from the fleet
#[utoipa::path(
    delete,
    path = "/api/v1/vans/{van_number}",
    tag = "vans",
    params(
        ("van_number" = String, Path, description = "Van number"),
    ),
    responses(
        (status = 200, description = "Van deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Van not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn delete_van(
    Path(van_number): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    state
        .dispatch
        .vans
        .delete(&van_number)
        .await
        .map_err(dispatch_error)?;

    info!("Van '{}' deleted successfully", van_number);
    Ok(Json(ApiResponse::ok(
        format!("Van {} deleted", van_number),
        "Van deleted successfully",
    )))
}
