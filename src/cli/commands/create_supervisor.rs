use anyhow::{Context, Result};
use dispatch::{NewUser, UserManager};
use model::entities::user::UserType;
use sea_orm::Database;
use tracing::{error, info, trace};

use crate::config::Settings;

/// Account details for a new supervisor.
pub struct SupervisorAccount {
    pub username: String,
    pub password: String,
    pub email: String,
    pub name: String,
    pub phone_number: String,
    pub address: String,
}

/// Seed a supervisor account directly in the database.
pub async fn create_supervisor(settings: &Settings, account: SupervisorAccount) -> Result<()> {
    trace!("Entering create_supervisor function");

    let db = Database::connect(&settings.database_url)
        .await
        .with_context(|| format!("Failed to connect to database '{}'", settings.database_url))?;
    let users = UserManager::with_hash_cost(db, settings.password_hash_cost);

    let username = account.username.clone();
    let created = users
        .create(NewUser {
            username: account.username,
            password: account.password,
            name: account.name,
            phone_number: account.phone_number,
            address: account.address,
            email: account.email,
            user_type: UserType::Supervisor,
        })
        .await
        .map_err(|e| {
            error!("Failed to create supervisor '{}': {}", username, e);
            e
        })?;

    info!("Supervisor '{}' created with ID: {}", created.username, created.id);
    Ok(())
}
