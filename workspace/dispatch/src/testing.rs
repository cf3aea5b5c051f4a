//! Shared fixtures for the manager tests.

use chrono::Utc;
use migration::{Migrator, MigratorTrait};
use model::entities::{
    ride::{self, RideStatus},
    user::{self, DriverStatus, UserType},
    van,
};
use sea_orm::{ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait, Set};

use crate::users::UserManager;

/// Cheapest cost bcrypt accepts.
pub const TEST_HASH_COST: u32 = 4;

pub async fn setup_db() -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect("sqlite::memory:").await?;
    db.execute_unprepared("PRAGMA foreign_keys = ON;").await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

/// A manager hashing with the cheapest bcrypt cost so tests stay fast.
pub fn user_manager(db: &DatabaseConnection) -> UserManager {
    UserManager::with_hash_cost(db.clone(), TEST_HASH_COST)
}

pub async fn new_user(
    db: &DatabaseConnection,
    username: &str,
    user_type: UserType,
) -> Result<user::Model, DbErr> {
    let status = match user_type {
        UserType::Driver => Some(DriverStatus::Available),
        _ => None,
    };
    user::ActiveModel {
        username: Set(username.to_string()),
        password_hash: Set("not-a-real-hash".to_string()),
        name: Set(format!("{} name", username)),
        phone_number: Set("4145550100".to_string()),
        address: Set("3200 N Cramer St".to_string()),
        email: Set(format!("{}@uwm.edu", username)),
        user_type: Set(user_type),
        status: Set(status),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn new_rider(db: &DatabaseConnection, username: &str) -> Result<user::Model, DbErr> {
    new_user(db, username, UserType::Rider).await
}

pub async fn new_driver(db: &DatabaseConnection, username: &str) -> Result<user::Model, DbErr> {
    new_user(db, username, UserType::Driver).await
}

pub async fn new_van(
    db: &DatabaseConnection,
    van_number: &str,
    driver_id: Option<i32>,
    ada: bool,
) -> Result<van::Model, DbErr> {
    van::ActiveModel {
        van_number: Set(van_number.to_string()),
        ada: Set(ada),
        driver_id: Set(driver_id),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Insert a pending ride directly, skipping the assignment attempt made by
/// `RideManager::create`.
pub async fn new_pending_ride(
    db: &DatabaseConnection,
    rider_id: i32,
    ada_required: bool,
) -> Result<ride::Model, DbErr> {
    ride::ActiveModel {
        rider_id: Set(rider_id),
        driver_id: Set(None),
        van_id: Set(None),
        pickup_location: Set("Union".to_string()),
        dropoff_location: Set("Sandburg Hall".to_string()),
        num_passengers: Set(1),
        ada_required: Set(ada_required),
        status: Set(RideStatus::Pending),
        pickup_time: Set(None),
        assigned_at: Set(None),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn driver_status(db: &DatabaseConnection, driver_id: i32) -> Option<DriverStatus> {
    user::Entity::find_by_id(driver_id)
        .one(db)
        .await
        .ok()
        .flatten()
        .and_then(|driver| driver.status)
}
