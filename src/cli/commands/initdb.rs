use anyhow::{Context, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::Database;
use tracing::{debug, info, trace};

/// Connect to `database_url` and apply every pending migration.
pub async fn init_database(database_url: &str) -> Result<()> {
    trace!("Entering init_database function");
    debug!("Database URL: {}", database_url);

    let db = Database::connect(database_url)
        .await
        .with_context(|| format!("Failed to connect to database '{}'", database_url))?;

    let pending = Migrator::get_pending_migrations(&db)
        .await
        .context("Failed to read migration state")?;
    if pending.is_empty() {
        info!("Database schema is already up to date");
        return Ok(());
    }

    for migration in &pending {
        debug!("Pending migration: {}", migration.name());
    }
    info!("Applying {} pending migrations", pending.len());

    Migrator::up(&db, None)
        .await
        .context("Failed to run database migrations")?;

    info!("Database initialization completed");
    Ok(())
}
