use anyhow::Result;
use ::config::{Config, Environment};
use dispatch::{users::DEFAULT_HASH_COST, RetryPolicy};
use sea_orm::Database;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::schemas::AppState;

pub const DEFAULT_JWT_SECRET: &str = "change-me-in-production";

/// Runtime settings, read from defaults overlaid with `BOSS_*` environment variables.
#[derive(Clone, Deserialize)]
pub struct Settings {
    pub database_url: String,
    pub bind_address: String,
    pub jwt_secret: String,
    /// Lifetime of issued bearer tokens.
    pub token_ttl_secs: u64,
    /// Attempts made by the assign endpoint before giving up.
    pub assign_max_attempts: u32,
    pub assign_retry_delay_ms: u64,
    pub password_hash_cost: u32,
    pub request_timeout_secs: u64,
}

impl Settings {
    /// Load settings from `.env`, the process environment and built-in defaults.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let settings: Settings = Config::builder()
            .set_default("database_url", "sqlite://boss.db?mode=rwc")?
            .set_default("bind_address", "0.0.0.0:3000")?
            .set_default("jwt_secret", DEFAULT_JWT_SECRET)?
            .set_default("token_ttl_secs", 8_i64 * 60 * 60)?
            .set_default("assign_max_attempts", 10_i64)?
            .set_default("assign_retry_delay_ms", 3_000_i64)?
            .set_default("password_hash_cost", i64::from(DEFAULT_HASH_COST))?
            .set_default("request_timeout_secs", 60_i64)?
            .add_source(Environment::with_prefix("BOSS").try_parsing(true))
            .build()?
            .try_deserialize()?;

        if settings.jwt_secret == DEFAULT_JWT_SECRET {
            warn!("BOSS_JWT_SECRET is not set, using the built-in development secret");
        }
        debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.assign_max_attempts,
            Duration::from_millis(self.assign_retry_delay_ms),
        )
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("database_url", &self.database_url)
            .field("bind_address", &self.bind_address)
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("assign_max_attempts", &self.assign_max_attempts)
            .field("assign_retry_delay_ms", &self.assign_retry_delay_ms)
            .field("password_hash_cost", &self.password_hash_cost)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

/// Connect to the database and build the shared application state.
pub async fn initialize_app_state(settings: Settings) -> Result<AppState> {
    info!("Connecting to database: {}", settings.database_url);
    let db = Database::connect(&settings.database_url).await?;
    debug!("Database connection established");

    Ok(AppState::new(db, settings))
}
