use std::time::Duration;

use chrono::Utc;
use model::entities::{
    notification,
    ride::{self, RideStatus},
    user::{self, DriverStatus, UserType},
    van,
};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tracing::{debug, info, instrument, trace, warn};

use crate::error::{DispatchError, Result};
use crate::rides::RideManager;

/// How often to retry assignment while no driver is free.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            delay: Duration::from_secs(3),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Retry without sleeping between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO)
    }
}

impl RideManager {
    /// Hand a pending ride to the first available driver with a van.
    ///
    /// Drivers are tried in id order. ADA rides only go to ADA vans. Both
    /// the driver and the ride are claimed with conditional updates so two
    /// concurrent assignments can never share a driver or a ride. On
    /// success the rider gets a notification.
    #[instrument(skip(self))]
    pub async fn assign_driver(&self, ride_id: i32) -> Result<ride::Model> {
        trace!("Entering RideManager::assign_driver");
        let txn = self.db.begin().await?;

        let ride = ride::Entity::find_by_id(ride_id)
            .one(&txn)
            .await?
            .ok_or_else(|| DispatchError::not_found("Ride", ride_id))?;

        if ride.driver_id.is_some() {
            debug!("Ride {} already has driver {:?}", ride_id, ride.driver_id);
            return Err(DispatchError::AlreadyAssigned(ride_id));
        }
        if ride.status != RideStatus::Pending {
            return Err(DispatchError::InvalidTransition {
                ride_id,
                from: ride.status,
                to: RideStatus::Assigned,
            });
        }

        let mut candidates = user::Entity::find()
            .find_also_related(van::Entity)
            .filter(user::Column::UserType.eq(UserType::Driver))
            .filter(user::Column::Status.eq(DriverStatus::Available))
            .filter(van::Column::Id.is_not_null());
        if ride.ada_required {
            candidates = candidates.filter(van::Column::Ada.eq(true));
        }
        let candidates = candidates
            .order_by_asc(user::Column::Id)
            .all(&txn)
            .await?;
        debug!(
            "{} candidate drivers for ride {} (ada: {})",
            candidates.len(),
            ride_id,
            ride.ada_required
        );

        for (driver, van) in candidates {
            let Some(van) = van else { continue };

            let claimed = user::Entity::update_many()
                .col_expr(user::Column::Status, Expr::value(DriverStatus::Assigned))
                .filter(user::Column::Id.eq(driver.id))
                .filter(user::Column::Status.eq(DriverStatus::Available))
                .exec(&txn)
                .await?;
            if claimed.rows_affected == 0 {
                debug!("Driver {} was taken in the meantime", driver.id);
                continue;
            }

            let bound = ride::Entity::update_many()
                .col_expr(ride::Column::DriverId, Expr::value(driver.id))
                .col_expr(ride::Column::VanId, Expr::value(van.id))
                .col_expr(ride::Column::Status, Expr::value(RideStatus::Assigned))
                .col_expr(ride::Column::AssignedAt, Expr::value(Utc::now()))
                .filter(ride::Column::Id.eq(ride_id))
                .filter(ride::Column::Status.eq(RideStatus::Pending))
                .filter(ride::Column::DriverId.is_null())
                .filter(ride::Column::AdaRequired.eq(ride.ada_required))
                .exec(&txn)
                .await?;
            if bound.rows_affected == 0 {
                warn!("Ride {} was assigned concurrently", ride_id);
                txn.rollback().await?;
                return Err(DispatchError::AlreadyAssigned(ride_id));
            }

            notification::ActiveModel {
                rider_id: Set(ride.rider_id),
                text: Set(format!(
                    "Driver {} is on the way in van {}.",
                    driver.name, van.van_number
                )),
                created_at: Set(Utc::now()),
                ..Default::default()
            }
            .insert(&txn)
            .await?;

            let assigned = ride::Entity::find_by_id(ride_id)
                .one(&txn)
                .await?
                .ok_or_else(|| DispatchError::not_found("Ride", ride_id))?;
            txn.commit().await?;

            info!(
                "Ride {} assigned to driver {} in van {}",
                ride_id, driver.id, van.van_number
            );
            return Ok(assigned);
        }

        txn.rollback().await?;
        info!("No driver available for ride {}", ride_id);
        Err(DispatchError::NoDriverAvailable(ride_id))
    }

    /// Keep calling [`RideManager::assign_driver`] while no driver is free.
    ///
    /// Any other outcome, success or error, ends the loop immediately.
    #[instrument(skip(self))]
    pub async fn assign_with_retry(&self, ride_id: i32, policy: RetryPolicy) -> Result<ride::Model> {
        let max_attempts = policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.assign_driver(ride_id).await {
                Err(DispatchError::NoDriverAvailable(_)) if attempt < max_attempts => {
                    debug!(
                        "Attempt {}/{} for ride {} found no driver, retrying in {:?}",
                        attempt, max_attempts, ride_id, policy.delay
                    );
                    if !policy.delay.is_zero() {
                        tokio::time::sleep(policy.delay).await;
                    }
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rides::RideChanges;
    use crate::testing::{driver_status, new_driver, new_pending_ride, new_rider, new_van, setup_db};

    #[tokio::test]
    async fn test_assign_first_available_driver() {
        let db = setup_db().await.unwrap();
        let rider = new_rider(&db, "rider").await.unwrap();
        let first = new_driver(&db, "first").await.unwrap();
        let second = new_driver(&db, "second").await.unwrap();
        let van_one = new_van(&db, "1", Some(first.id), false).await.unwrap();
        new_van(&db, "2", Some(second.id), false).await.unwrap();
        let rides = RideManager::new(db.clone());

        let ride = new_pending_ride(&db, rider.id, false).await.unwrap();
        let assigned = rides.assign_driver(ride.id).await.unwrap();

        assert_eq!(assigned.status, RideStatus::Assigned);
        assert_eq!(assigned.driver_id, Some(first.id));
        assert_eq!(assigned.van_id, Some(van_one.id));
        assert!(assigned.assigned_at.is_some());
        assert_eq!(driver_status(&db, first.id).await, Some(DriverStatus::Assigned));
        assert_eq!(driver_status(&db, second.id).await, Some(DriverStatus::Available));

        let notifications = notification::Entity::find()
            .filter(notification::Column::RiderId.eq(rider.id))
            .all(&db)
            .await
            .unwrap();
        assert_eq!(notifications.len(), 1);
        assert!(notifications[0].text.contains("van 1"));
    }

    #[tokio::test]
    async fn test_assign_skips_driver_without_van() {
        let db = setup_db().await.unwrap();
        let rider = new_rider(&db, "rider").await.unwrap();
        new_driver(&db, "no_van").await.unwrap();
        let with_van = new_driver(&db, "with_van").await.unwrap();
        new_van(&db, "7", Some(with_van.id), false).await.unwrap();
        let rides = RideManager::new(db.clone());

        let ride = new_pending_ride(&db, rider.id, false).await.unwrap();
        let assigned = rides.assign_driver(ride.id).await.unwrap();
        assert_eq!(assigned.driver_id, Some(with_van.id));
    }

    #[tokio::test]
    async fn test_assign_ada_ride_needs_ada_van() {
        let db = setup_db().await.unwrap();
        let rider = new_rider(&db, "rider").await.unwrap();
        let plain = new_driver(&db, "plain").await.unwrap();
        new_van(&db, "1", Some(plain.id), false).await.unwrap();
        let rides = RideManager::new(db.clone());

        let ride = new_pending_ride(&db, rider.id, true).await.unwrap();
        let result = rides.assign_driver(ride.id).await;
        assert!(matches!(result, Err(DispatchError::NoDriverAvailable(id)) if id == ride.id));
        assert_eq!(driver_status(&db, plain.id).await, Some(DriverStatus::Available));

        let accessible = new_driver(&db, "accessible").await.unwrap();
        new_van(&db, "2", Some(accessible.id), true).await.unwrap();
        let assigned = rides.assign_driver(ride.id).await.unwrap();
        assert_eq!(assigned.driver_id, Some(accessible.id));
    }

    #[tokio::test]
    async fn test_assign_is_one_ride_per_driver() {
        let db = setup_db().await.unwrap();
        let rider = new_rider(&db, "rider").await.unwrap();
        let driver = new_driver(&db, "driver").await.unwrap();
        new_van(&db, "1", Some(driver.id), false).await.unwrap();
        let rides = RideManager::new(db.clone());

        let first = new_pending_ride(&db, rider.id, false).await.unwrap();
        let second = new_pending_ride(&db, rider.id, false).await.unwrap();

        rides.assign_driver(first.id).await.unwrap();
        let result = rides.assign_driver(second.id).await;
        assert!(matches!(result, Err(DispatchError::NoDriverAvailable(_))));
        assert_eq!(rides.get(second.id).await.unwrap().status, RideStatus::Pending);

        // Assigning again never steals or double-books
        let again = rides.assign_driver(first.id).await;
        assert!(matches!(again, Err(DispatchError::AlreadyAssigned(_))));
    }

    #[tokio::test]
    async fn test_assign_rejects_closed_and_missing_rides() {
        let db = setup_db().await.unwrap();
        let rider = new_rider(&db, "rider").await.unwrap();
        let rides = RideManager::new(db.clone());

        let ride = new_pending_ride(&db, rider.id, false).await.unwrap();
        rides
            .edit(
                ride.id,
                RideChanges {
                    status: Some(RideStatus::Cancelled),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let result = rides.assign_driver(ride.id).await;
        assert!(matches!(result, Err(DispatchError::InvalidTransition { .. })));

        let missing = rides.assign_driver(999).await;
        assert!(matches!(missing, Err(DispatchError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_concurrent_assignment_never_double_books() {
        let db = setup_db().await.unwrap();
        let rider = new_rider(&db, "rider").await.unwrap();
        let driver = new_driver(&db, "driver").await.unwrap();
        new_van(&db, "1", Some(driver.id), false).await.unwrap();
        let rides = RideManager::new(db.clone());

        let first = new_pending_ride(&db, rider.id, false).await.unwrap();
        let second = new_pending_ride(&db, rider.id, false).await.unwrap();

        let (a, b) = tokio::join!(rides.assign_driver(first.id), rides.assign_driver(second.id));
        let successes = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
        assert_eq!(successes, 1);

        let busy = crate::rides::RideFilter::for_driver(driver.id);
        assert_eq!(rides.find(busy).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_released_driver_takes_next_ride() {
        let db = setup_db().await.unwrap();
        let rider = new_rider(&db, "rider").await.unwrap();
        let driver = new_driver(&db, "driver").await.unwrap();
        new_van(&db, "1", Some(driver.id), false).await.unwrap();
        let rides = RideManager::new(db.clone());

        let first = new_pending_ride(&db, rider.id, false).await.unwrap();
        let second = new_pending_ride(&db, rider.id, false).await.unwrap();
        rides.assign_driver(first.id).await.unwrap();

        rides
            .edit(
                first.id,
                RideChanges {
                    status: Some(RideStatus::Completed),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let assigned = rides.assign_driver(second.id).await.unwrap();
        assert_eq!(assigned.driver_id, Some(driver.id));
    }

    #[tokio::test]
    async fn test_assign_with_retry_gives_up() {
        let db = setup_db().await.unwrap();
        let rider = new_rider(&db, "rider").await.unwrap();
        let rides = RideManager::new(db.clone());

        let ride = new_pending_ride(&db, rider.id, false).await.unwrap();
        let result = rides
            .assign_with_retry(ride.id, RetryPolicy::immediate(3))
            .await;
        assert!(matches!(result, Err(DispatchError::NoDriverAvailable(_))));
        assert_eq!(rides.get(ride.id).await.unwrap().status, RideStatus::Pending);
    }

    #[tokio::test]
    async fn test_assign_with_retry_picks_up_late_driver() {
        let db = setup_db().await.unwrap();
        let rider = new_rider(&db, "rider").await.unwrap();
        let rides = RideManager::new(db.clone());
        let ride = new_pending_ride(&db, rider.id, false).await.unwrap();

        let late_db = db.clone();
        let late_driver = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            let driver = new_driver(&late_db, "late").await.unwrap();
            new_van(&late_db, "9", Some(driver.id), false).await.unwrap();
            driver
        });

        let assigned = rides
            .assign_with_retry(ride.id, RetryPolicy::new(50, Duration::from_millis(10)))
            .await
            .unwrap();
        let driver = late_driver.await.unwrap();
        assert_eq!(assigned.driver_id, Some(driver.id));
    }

    #[tokio::test]
    async fn test_assign_with_retry_does_not_retry_other_errors() {
        let db = setup_db().await.unwrap();
        let rides = RideManager::new(db.clone());

        let result = rides
            .assign_with_retry(42, RetryPolicy::new(5, Duration::from_secs(60)))
            .await;
        assert!(matches!(result, Err(DispatchError::NotFound { .. })));
    }

    #[test]
    fn test_retry_policy_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 10);
        assert_eq!(RetryPolicy::immediate(4).delay, Duration::ZERO);
    }
}
