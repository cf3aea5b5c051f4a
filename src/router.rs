use crate::handlers::{
    auth::{login, logout, me, register},
    drivers::{get_available_drivers, get_driver_van, get_unassigned_drivers},
    health::health_check,
    messages::{get_conversation, send_message},
    notifications::{create_notification, get_notification, get_notifications},
    reports::{create_report, get_report, get_reports},
    rides::{
        assign_ride, create_ride, delete_ride, get_queue_position, get_ride, get_rides, update_ride,
    },
    users::{delete_user, get_user, get_users, update_user},
    vans::{create_van, delete_van, get_van, get_van_by_id, get_vans, update_van},
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    // Must outlast the retry loop behind the assign endpoint
    let timeout = state.settings.request_timeout();

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Authentication
        .route("/api/v1/auth/register", post(register))
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/auth/logout", post(logout))
        .route("/api/v1/auth/me", get(me))
        // Users
        .route("/api/v1/users", get(get_users))
        .route(
            "/api/v1/users/:username",
            get(get_user).put(update_user).delete(delete_user),
        )
        // Drivers
        .route("/api/v1/drivers/available", get(get_available_drivers))
        .route("/api/v1/drivers/unassigned", get(get_unassigned_drivers))
        .route("/api/v1/drivers/:username/van", get(get_driver_van))
        // Rides and the pending queue
        .route("/api/v1/rides", post(create_ride).get(get_rides))
        .route(
            "/api/v1/rides/:ride_id",
            get(get_ride).put(update_ride).delete(delete_ride),
        )
        .route("/api/v1/rides/:ride_id/assign", post(assign_ride))
        .route(
            "/api/v1/riders/:rider_id/queue-position",
            get(get_queue_position),
        )
        // Fleet
        .route("/api/v1/vans", post(create_van).get(get_vans))
        .route(
            "/api/v1/vans/:van_number",
            get(get_van).put(update_van).delete(delete_van),
        )
        .route("/api/v1/vans/by-id/:van_id", get(get_van_by_id))
        // Reports, messages and notifications
        .route("/api/v1/reports", post(create_report).get(get_reports))
        .route("/api/v1/reports/:report_id", get(get_report))
        .route("/api/v1/messages", post(send_message).get(get_conversation))
        .route(
            "/api/v1/notifications",
            post(create_notification).get(get_notifications),
        )
        .route(
            "/api/v1/notifications/:notification_id",
            get(get_notification),
        )
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(timeout))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
