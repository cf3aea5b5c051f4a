#[cfg(test)]
pub mod test_utils {
    use crate::config::Settings;
    use crate::router::create_router;
    use crate::schemas::AppState;
    use axum::Router;
    use axum_test::TestServer;
    use migration::{Migrator, MigratorTrait};
    use model::entities::user::{self, DriverStatus, UserType};
    use model::entities::van;
    use sea_orm::{ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, Set};
    use serde_json::{json, Value};
    use tracing::Level;
    use tracing_subscriber::FmtSubscriber;

    /// Create an in-memory SQLite database for testing
    pub async fn setup_test_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to connect to in-memory database");

        db.execute_unprepared("PRAGMA foreign_keys = ON;")
            .await
            .expect("Failed to enable foreign keys");

        // Run migrations
        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        db
    }

    /// Settings for tests: cheap hashing and no waiting between assignment attempts.
    pub fn test_settings() -> Settings {
        Settings {
            database_url: "sqlite::memory:".to_string(),
            bind_address: "127.0.0.1:0".to_string(),
            jwt_secret: "test-secret".to_string(),
            token_ttl_secs: 3600,
            assign_max_attempts: 3,
            assign_retry_delay_ms: 0,
            password_hash_cost: 4,
            request_timeout_secs: 30,
        }
    }

    /// Create AppState for testing
    pub async fn setup_test_app_state() -> AppState {
        let db = setup_test_db().await;
        AppState::new(db, test_settings())
    }

    /// Initialize tracing for tests with output to STDERR.
    ///
    /// The log level is taken from RUST_LOG and defaults to WARN. The guard
    /// keeps the subscriber installed until dropped.
    fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
        let log_level = std::env::var("RUST_LOG")
            .ok()
            .and_then(|level| match level.to_uppercase().as_str() {
                "ERROR" => Some(Level::ERROR),
                "WARN" => Some(Level::WARN),
                "INFO" => Some(Level::INFO),
                "DEBUG" => Some(Level::DEBUG),
                "TRACE" => Some(Level::TRACE),
                _ => None,
            })
            .unwrap_or(Level::WARN);

        let subscriber = FmtSubscriber::builder()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    /// Create axum app for testing
    pub async fn setup_test_app() -> Router {
        let _guard = init_test_tracing();
        let state = setup_test_app_state().await;
        create_router(state)
    }

    /// Test server plus the state behind it, for tests that seed rows directly.
    pub async fn setup_test_server() -> (TestServer, AppState) {
        let _guard = init_test_tracing();
        let state = setup_test_app_state().await;
        let server = TestServer::new(create_router(state.clone())).expect("Failed to start test server");
        (server, state)
    }

    /// JSON body for registering a user through the API.
    pub fn register_body(username: &str, user_type: &str) -> Value {
        json!({
            "username": username,
            "password": "password123",
            "name": format!("{} name", username),
            "phone_number": "4145550100",
            "address": "3200 N Cramer St",
            "email": format!("{}@uwm.edu", username),
            "user_type": user_type,
        })
    }

    /// Register a user through the API and return its id.
    pub async fn register_user(server: &TestServer, username: &str, user_type: &str) -> i32 {
        let response = server
            .post("/api/v1/auth/register")
            .json(&register_body(username, user_type))
            .await;
        let body: Value = response.json();
        body["data"]["id"].as_i64().expect("registered user id") as i32
    }

    /// Insert a driver that owns a van, bypassing the API.
    pub async fn seed_driver_with_van(
        db: &DatabaseConnection,
        username: &str,
        van_number: &str,
        ada: bool,
    ) -> (user::Model, van::Model) {
        let driver = user::ActiveModel {
            username: Set(username.to_string()),
            password_hash: Set("not-a-real-hash".to_string()),
            name: Set(format!("{} name", username)),
            phone_number: Set("4145550100".to_string()),
            address: Set("3200 N Cramer St".to_string()),
            email: Set(format!("{}@uwm.edu", username)),
            user_type: Set(UserType::Driver),
            status: Set(Some(DriverStatus::Available)),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to seed driver");

        let van = van::ActiveModel {
            van_number: Set(van_number.to_string()),
            ada: Set(ada),
            driver_id: Set(Some(driver.id)),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to seed van");

        (driver, van)
    }
}
