//! This file serves as the root for all SeaORM entity modules.
//! The data model covers accounts (riders, drivers, supervisors), the van
//! fleet, ride requests and the free-text records attached to them.

pub mod message;
pub mod notification;
pub mod report;
pub mod ride;
pub mod user;
pub mod van;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::message::Entity as Message;
    pub use super::notification::Entity as Notification;
    pub use super::report::Entity as Report;
    pub use super::ride::Entity as Ride;
    pub use super::user::Entity as User;
    pub use super::van::Entity as Van;
}

#[cfg(test)]
mod test {
    use chrono::Utc;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{
        ActiveModelTrait, ColumnTrait, ConnectionTrait, Database, DatabaseConnection, DbErr,
        EntityTrait, ModelTrait, QueryFilter, Set,
    };

    use super::*;
    use prelude::*;

    async fn setup_db() -> Result<DatabaseConnection, DbErr> {
        // Connect to the SQLite database
        let db = Database::connect("sqlite::memory:").await?;

        // Enable foreign keys
        db.execute_unprepared("PRAGMA foreign_keys = ON;").await?;

        Migrator::up(&db, None).await.expect("Migrations failed.");
        Ok(db)
    }

    fn new_user(username: &str, user_type: user::UserType) -> user::ActiveModel {
        let status = match user_type {
            user::UserType::Driver => Some(user::DriverStatus::Available),
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
    }

    #[tokio::test]
    async fn test_entity_integration() -> Result<(), DbErr> {
        let db = setup_db().await?;

        let rider = new_user("rider1", user::UserType::Rider).insert(&db).await?;
        let driver = new_user("driver1", user::UserType::Driver).insert(&db).await?;
        new_user("boss", user::UserType::Supervisor).insert(&db).await?;

        let van = van::ActiveModel {
            van_number: Set("UWM-01".to_string()),
            ada: Set(true),
            driver_id: Set(Some(driver.id)),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let ride = ride::ActiveModel {
            rider_id: Set(rider.id),
            driver_id: Set(Some(driver.id)),
            van_id: Set(Some(van.id)),
            pickup_location: Set("Union".to_string()),
            dropoff_location: Set("Sandburg Hall".to_string()),
            num_passengers: Set(2),
            ada_required: Set(true),
            status: Set(ride::RideStatus::Assigned),
            pickup_time: Set(None),
            assigned_at: Set(Some(Utc::now())),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        report::ActiveModel {
            reporter_id: Set(Some(rider.id)),
            report_type: Set(report::ReportType::Delay),
            context: Set("Driver was 20 minutes late".to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        message::ActiveModel {
            rider_id: Set(rider.id),
            driver_id: Set(driver.id),
            text: Set("I'm by the north entrance".to_string()),
            sent_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        notification::ActiveModel {
            rider_id: Set(rider.id),
            text: Set("Your driver is on the way".to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        // Read back and verify data
        let users = User::find().all(&db).await?;
        assert_eq!(users.len(), 3);
        let stored_driver = users.iter().find(|u| u.username == "driver1").unwrap();
        assert_eq!(stored_driver.user_type, user::UserType::Driver);
        assert_eq!(stored_driver.status, Some(user::DriverStatus::Available));

        let rides = Ride::find()
            .filter(ride::Column::Status.eq(ride::RideStatus::Assigned))
            .all(&db)
            .await?;
        assert_eq!(rides.len(), 1);
        assert_eq!(rides[0].id, ride.id);
        assert_eq!(rides[0].van_id, Some(van.id));

        // Van is reachable from its driver
        let driver_vans = driver.find_related(Van).all(&db).await?;
        assert_eq!(driver_vans.len(), 1);
        assert_eq!(driver_vans[0].van_number, "UWM-01");

        // Van number is unique
        let duplicate_van = van::ActiveModel {
            van_number: Set("UWM-01".to_string()),
            ada: Set(false),
            driver_id: Set(None),
            ..Default::default()
        }
        .insert(&db)
        .await;
        assert!(duplicate_van.is_err());

        assert_eq!(Report::find().all(&db).await?.len(), 1);
        assert_eq!(Message::find().all(&db).await?.len(), 1);
        assert_eq!(Notification::find().all(&db).await?.len(), 1);

        // Deleting the rider cascades to their rides and notifications
        User::delete_by_id(rider.id).exec(&db).await?;
        assert!(Ride::find().all(&db).await?.is_empty());
        assert!(Notification::find().all(&db).await?.is_empty());

        // Deleting the driver frees the van instead of removing it
        User::delete_by_id(driver.id).exec(&db).await?;
        let orphan_van = Van::find_by_id(van.id).one(&db).await?.unwrap();
        assert_eq!(orphan_van.driver_id, None);

        Ok(())
    }
}
