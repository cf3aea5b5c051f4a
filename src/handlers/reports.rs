use crate::schemas::{api_error, dispatch_error, ApiError, ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::{DateTime, Utc};
use dispatch::NewReport;
use model::entities::report::{self, ReportType};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, info, instrument, trace, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Request body for filing a report
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateReportRequest {
    /// Rider or driver filing the report; omit to file anonymously
    pub reporter_id: Option<i32>,
    /// One of safety, service, delay, vehicle, other
    pub report_type: String,
    #[validate(length(min = 1, max = 5000))]
    pub context: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ReportQuery {
    pub reporter_id: Option<i32>,
}

/// Report response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReportResponse {
    pub id: i32,
    pub reporter_id: Option<i32>,
    pub report_type: String,
    /// Human readable report type
    pub report_type_label: String,
    pub context: String,
    pub created_at: DateTime<Utc>,
}

impl From<report::Model> for ReportResponse {
    fn from(model: report::Model) -> Self {
        Self {
            id: model.id,
            reporter_id: model.reporter_id,
            report_type: model.report_type.to_string(),
            report_type_label: model.report_type.label().to_string(),
            context: model.context,
            created_at: model.created_at,
        }
    }
}

/// File a report
#[utoipa::path(
    post,
    path = "/api/v1/reports",
    tag = "reports",
    request_body = CreateReportRequest,
    responses(
        (status = 201, description = "Report created successfully", body = ApiResponse<ReportResponse>),
        (status = 400, description = "Invalid request or reporter role", body = ErrorResponse),
        (status = 404, description = "Reporter not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn create_report(
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<CreateReportRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<ReportResponse>>), ApiError> {
    trace!("Entering create_report function");

    let report_type = ReportType::from_str(&request.report_type).map_err(|e| {
        warn!("{}", e);
        api_error(StatusCode::BAD_REQUEST, "INVALID_REPORT_TYPE", e)
    })?;

    let created = state
        .dispatch
        .reports
        .create(NewReport {
            reporter_id: request.reporter_id,
            report_type,
            context: request.context,
        })
        .await
        .map_err(dispatch_error)?;

    info!("Report created successfully with ID: {}", created.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            ReportResponse::from(created),
            "Report created successfully",
        )),
    ))
}

/// List reports, newest first
#[utoipa::path(
    get,
    path = "/api/v1/reports",
    tag = "reports",
    params(ReportQuery),
    responses(
        (status = 200, description = "Reports retrieved successfully", body = ApiResponse<Vec<ReportResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_reports(
    Query(query): Query<ReportQuery>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ReportResponse>>>, ApiError> {
    let reports = match query.reporter_id {
        Some(reporter_id) => state.dispatch.reports.for_reporter(reporter_id).await,
        None => state.dispatch.reports.get_all().await,
    }
    .map_err(dispatch_error)?;

    debug!("Retrieved {} reports", reports.len());
    Ok(Json(ApiResponse::ok(
        reports.into_iter().map(ReportResponse::from).collect(),
        "Reports retrieved successfully",
    )))
}

/// Get a report
#[utoipa::path(
    get,
    path = "/api/v1/reports/{report_id}",
    tag = "reports",
    params(
        ("report_id" = i32, Path, description = "Report ID"),
        ReportQuery,
    ),
    responses(
        (status = 200, description = "Report retrieved successfully", body = ApiResponse<ReportResponse>),
        (status = 404, description = "Report not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_report(
    Path(report_id): Path<i32>,
    Query(query): Query<ReportQuery>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ReportResponse>>, ApiError> {
    let report_model = state
        .dispatch
        .reports
        .get(report_id, query.reporter_id)
        .await
        .map_err(dispatch_error)?;

    Ok(Json(ApiResponse::ok(
        ReportResponse::from(report_model),
        "Report retrieved successfully",
    )))
}
