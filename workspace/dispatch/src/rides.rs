use chrono::{DateTime, Utc};
use model::entities::{
    ride::{self, RideStatus},
    user::{self, DriverStatus, UserType},
    van,
};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::{debug, info, instrument, trace, warn};

use crate::error::{require_text, DispatchError, Result};

/// A rider's request for a ride.
#[derive(Debug, Clone)]
pub struct NewRide {
    pub pickup_location: String,
    pub dropoff_location: String,
    pub num_passengers: i32,
    pub ada_required: bool,
    pub pickup_time: Option<DateTime<Utc>>,
}

impl NewRide {
    pub fn new(pickup_location: impl Into<String>, dropoff_location: impl Into<String>) -> Self {
        Self {
            pickup_location: pickup_location.into(),
            dropoff_location: dropoff_location.into(),
            num_passengers: 1,
            ada_required: false,
            pickup_time: None,
        }
    }
}

/// Partial update of a ride.
#[derive(Debug, Clone, Default)]
pub struct RideChanges {
    pub pickup_location: Option<String>,
    pub dropoff_location: Option<String>,
    pub num_passengers: Option<i32>,
    pub ada_required: Option<bool>,
    pub pickup_time: Option<DateTime<Utc>>,
    pub status: Option<RideStatus>,
}

/// Which rides to list. Empty `statuses` means any status.
#[derive(Debug, Clone, Default)]
pub struct RideFilter {
    pub rider_id: Option<i32>,
    pub driver_id: Option<i32>,
    pub van_id: Option<i32>,
    pub statuses: Vec<RideStatus>,
}

impl RideFilter {
    pub fn for_rider(rider_id: i32) -> Self {
        Self {
            rider_id: Some(rider_id),
            ..Default::default()
        }
    }

    pub fn for_driver(driver_id: i32) -> Self {
        Self {
            driver_id: Some(driver_id),
            ..Default::default()
        }
    }

    pub fn for_van(van_id: i32) -> Self {
        Self {
            van_id: Some(van_id),
            ..Default::default()
        }
    }

    pub fn with_statuses(mut self, statuses: impl IntoIterator<Item = RideStatus>) -> Self {
        self.statuses = statuses.into_iter().collect();
        self
    }
}

/// Ride requests, their lifecycle and driver assignment.
///
/// Assignment lives in `assignment.rs` and queue reporting in `queue.rs`.
#[derive(Debug, Clone)]
pub struct RideManager {
    pub(crate) db: DatabaseConnection,
}

impl RideManager {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Store a pending ride and try to hand it to a driver straight away.
    ///
    /// When nobody is free the ride simply stays pending in the queue.
    #[instrument(skip(self))]
    pub async fn create(&self, rider_id: i32, new_ride: NewRide) -> Result<ride::Model> {
        trace!("Entering RideManager::create");

        let rider = user::Entity::find_by_id(rider_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| DispatchError::not_found("Rider", rider_id))?;
        if rider.user_type != UserType::Rider {
            warn!("User {} requested a ride but is a {}", rider_id, rider.user_type);
            return Err(DispatchError::InvalidRole {
                user_id: rider_id,
                expected: UserType::Rider,
                actual: rider.user_type,
            });
        }

        require_text("pickup_location", &new_ride.pickup_location)?;
        require_text("dropoff_location", &new_ride.dropoff_location)?;
        validate_passengers(new_ride.num_passengers)?;

        let ride = ride::ActiveModel {
            rider_id: Set(rider_id),
            driver_id: Set(None),
            van_id: Set(None),
            pickup_location: Set(new_ride.pickup_location),
            dropoff_location: Set(new_ride.dropoff_location),
            num_passengers: Set(new_ride.num_passengers),
            ada_required: Set(new_ride.ada_required),
            status: Set(RideStatus::Pending),
            pickup_time: Set(new_ride.pickup_time),
            assigned_at: Set(None),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;
        info!("Ride {} created for rider {}", ride.id, rider_id);

        match self.assign_driver(ride.id).await {
            Ok(assigned) => Ok(assigned),
            Err(DispatchError::NoDriverAvailable(_)) => {
                info!("No driver free, ride {} queued", ride.id);
                Ok(ride)
            }
            Err(e) => Err(e),
        }
    }

    /// Apply `changes` to a ride.
    ///
    /// The write only lands if the ride still has the status and driver it
    /// was read with; otherwise the ride is re-read and the edit re-checked
    /// against its new state.
    #[instrument(skip(self))]
    pub async fn edit(&self, ride_id: i32, changes: RideChanges) -> Result<ride::Model> {
        trace!("Entering RideManager::edit");

        for attempt in 1..=EDIT_ATTEMPTS {
            let txn = self.db.begin().await?;
            let existing = ride::Entity::find_by_id(ride_id)
                .one(&txn)
                .await?
                .ok_or_else(|| DispatchError::not_found("Ride", ride_id))?;

            match apply_changes(&txn, &existing, &changes).await? {
                Some(updated) => {
                    txn.commit().await?;
                    info!("Ride {} updated, status: {}", ride_id, updated.status);
                    return Ok(updated);
                }
                None => {
                    txn.rollback().await?;
                    debug!("Ride {} changed during edit (attempt {})", ride_id, attempt);
                }
            }
        }

        warn!("Ride {} kept changing, giving up on edit", ride_id);
        Err(DispatchError::RideChanged(ride_id))
    }

    /// Remove a ride. A driver still holding it becomes available again.
    #[instrument(skip(self))]
    pub async fn delete(&self, ride_id: i32) -> Result<()> {
        let txn = self.db.begin().await?;

        let existing = ride::Entity::find_by_id(ride_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                warn!("Ride {} not found for deletion", ride_id);
                DispatchError::not_found("Ride", ride_id)
            })?;

        if existing.status.is_active() {
            if let Some(driver_id) = existing.driver_id {
                release_driver(&txn, driver_id).await?;
            }
        }

        ride::Entity::delete_by_id(ride_id).exec(&txn).await?;
        txn.commit().await?;

        info!("Ride {} deleted", ride_id);
        Ok(())
    }

    pub async fn get(&self, ride_id: i32) -> Result<ride::Model> {
        ride::Entity::find_by_id(ride_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| DispatchError::not_found("Ride", ride_id))
    }

    /// Rides matching every set field of the filter, oldest first.
    #[instrument(skip(self))]
    pub async fn find(&self, filter: RideFilter) -> Result<Vec<ride::Model>> {
        let mut query = ride::Entity::find();

        if let Some(rider_id) = filter.rider_id {
            query = query.filter(ride::Column::RiderId.eq(rider_id));
        }
        if let Some(driver_id) = filter.driver_id {
            query = query.filter(ride::Column::DriverId.eq(driver_id));
        }
        if let Some(van_id) = filter.van_id {
            query = query.filter(ride::Column::VanId.eq(van_id));
        }
        if !filter.statuses.is_empty() {
            query = query.filter(ride::Column::Status.is_in(filter.statuses));
        }

        let rides = query.order_by_asc(ride::Column::Id).all(&self.db).await?;
        debug!("Found {} rides", rides.len());
        Ok(rides)
    }

    pub async fn get_all(&self, statuses: &[RideStatus]) -> Result<Vec<ride::Model>> {
        self.find(RideFilter::default().with_statuses(statuses.iter().copied()))
            .await
    }
}

/// Attempts made by `RideManager::edit` when the ride changes underneath it.
const EDIT_ATTEMPTS: u32 = 3;

/// Validate `changes` against `existing` and write them, guarded on the ride
/// still having the status and driver `existing` was read with.
///
/// Returns `None` when that guard no longer holds and nothing was written.
async fn apply_changes<C: ConnectionTrait>(
    conn: &C,
    existing: &ride::Model,
    changes: &RideChanges,
) -> Result<Option<ride::Model>> {
    let ride_id = existing.id;
    let current = existing.status;
    if current.is_terminal() {
        return Err(DispatchError::InvalidTransition {
            ride_id,
            from: current,
            to: changes.status.unwrap_or(current),
        });
    }

    let mut update = ride::Entity::update_many()
        .filter(ride::Column::Id.eq(ride_id))
        .filter(ride::Column::Status.eq(current));
    update = match existing.driver_id {
        Some(driver_id) => update.filter(ride::Column::DriverId.eq(driver_id)),
        None => update.filter(ride::Column::DriverId.is_null()),
    };
    let mut changed = false;

    if let Some(pickup) = &changes.pickup_location {
        require_text("pickup_location", pickup)?;
        update = update.col_expr(ride::Column::PickupLocation, Expr::value(pickup.clone()));
        changed = true;
    }
    if let Some(dropoff) = &changes.dropoff_location {
        require_text("dropoff_location", dropoff)?;
        update = update.col_expr(ride::Column::DropoffLocation, Expr::value(dropoff.clone()));
        changed = true;
    }
    if let Some(passengers) = changes.num_passengers {
        validate_passengers(passengers)?;
        update = update.col_expr(ride::Column::NumPassengers, Expr::value(passengers));
        changed = true;
    }
    if let Some(ada_required) = changes.ada_required {
        if ada_required && !existing.ada_required && current.is_active() {
            require_ada_van(conn, existing).await?;
        }
        update = update.col_expr(ride::Column::AdaRequired, Expr::value(ada_required));
        changed = true;
    }
    if let Some(pickup_time) = changes.pickup_time {
        update = update.col_expr(ride::Column::PickupTime, Expr::value(pickup_time));
        changed = true;
    }
    if let Some(next) = changes.status {
        if !current.can_transition_to(next) {
            warn!("Ride {} cannot move from {} to {}", ride_id, current, next);
            return Err(DispatchError::InvalidTransition {
                ride_id,
                from: current,
                to: next,
            });
        }
        debug!("Ride {} moving from {} to {}", ride_id, current, next);
        update = update.col_expr(ride::Column::Status, Expr::value(next));
        changed = true;
    }

    if !changed {
        debug!("No fields to update for ride {}", ride_id);
        return Ok(Some(existing.clone()));
    }

    let result = update.exec(conn).await?;
    if result.rows_affected == 0 {
        return Ok(None);
    }

    if let (Some(next), Some(driver_id)) = (changes.status, existing.driver_id) {
        if next.is_terminal() {
            release_driver(conn, driver_id).await?;
        }
    }

    let updated = ride::Entity::find_by_id(ride_id)
        .one(conn)
        .await?
        .ok_or_else(|| DispatchError::not_found("Ride", ride_id))?;
    Ok(Some(updated))
}

/// A ride already holding a van may only become ADA-required if that van is
/// accessible.
async fn require_ada_van<C: ConnectionTrait>(conn: &C, existing: &ride::Model) -> Result<()> {
    let Some(van_id) = existing.van_id else {
        return Ok(());
    };
    let accessible = van::Entity::find_by_id(van_id)
        .one(conn)
        .await?
        .is_some_and(|van| van.ada);
    if !accessible {
        warn!("Ride {} is in van {} which is not ADA accessible", existing.id, van_id);
        return Err(DispatchError::Validation(format!(
            "ride {} is already in van {} which is not ADA accessible",
            existing.id, van_id
        )));
    }
    Ok(())
}

fn validate_passengers(num_passengers: i32) -> Result<()> {
    if num_passengers < 1 {
        return Err(DispatchError::Validation(
            "num_passengers must be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// Put a driver back into the pool of available drivers.
pub(crate) async fn release_driver<C: ConnectionTrait>(conn: &C, driver_id: i32) -> Result<()> {
    let result = user::Entity::update_many()
        .col_expr(user::Column::Status, Expr::value(DriverStatus::Available))
        .filter(user::Column::Id.eq(driver_id))
        .filter(user::Column::UserType.eq(UserType::Driver))
        .exec(conn)
        .await?;
    debug!(
        "Released driver {} ({} rows affected)",
        driver_id, result.rows_affected
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        driver_status, new_driver, new_pending_ride, new_rider, new_van, setup_db,
    };

    fn sample_ride() -> NewRide {
        NewRide {
            num_passengers: 3,
            ada_required: true,
            ..NewRide::new("123 main ST", "123 test ST")
        }
    }

    #[tokio::test]
    async fn test_create_ride_success() {
        let db = setup_db().await.unwrap();
        let rider = new_rider(&db, "test_rider").await.unwrap();
        let rides = RideManager::new(db.clone());

        let ride = rides.create(rider.id, sample_ride()).await.unwrap();
        assert_eq!(ride.rider_id, rider.id);
        assert_eq!(ride.num_passengers, 3);
        // Nobody to assign, so the ride waits in the queue
        assert_eq!(ride.status, RideStatus::Pending);
        assert_eq!(ride.driver_id, None);
        assert_eq!(ride.van_id, None);
    }

    #[tokio::test]
    async fn test_create_ride_assigns_free_driver() {
        let db = setup_db().await.unwrap();
        let rider = new_rider(&db, "test_rider").await.unwrap();
        let driver = new_driver(&db, "test_driver").await.unwrap();
        let van = new_van(&db, "1234 QWERTY", Some(driver.id), true).await.unwrap();
        let rides = RideManager::new(db.clone());

        let ride = rides.create(rider.id, sample_ride()).await.unwrap();
        assert_eq!(ride.status, RideStatus::Assigned);
        assert_eq!(ride.driver_id, Some(driver.id));
        assert_eq!(ride.van_id, Some(van.id));
        assert!(ride.assigned_at.is_some());
        assert_eq!(driver_status(&db, driver.id).await, Some(DriverStatus::Assigned));
    }

    #[tokio::test]
    async fn test_create_ride_wrong_user() {
        let db = setup_db().await.unwrap();
        let driver = new_driver(&db, "test_driver").await.unwrap();
        let rides = RideManager::new(db.clone());

        let result = rides.create(driver.id, sample_ride()).await;
        assert!(matches!(result, Err(DispatchError::InvalidRole { .. })));
    }

    #[tokio::test]
    async fn test_create_ride_no_pickup() {
        let db = setup_db().await.unwrap();
        let rider = new_rider(&db, "test_rider").await.unwrap();
        let rides = RideManager::new(db.clone());

        let result = rides
            .create(
                rider.id,
                NewRide {
                    pickup_location: "".to_string(),
                    ..sample_ride()
                },
            )
            .await;
        assert!(matches!(result, Err(DispatchError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_ride_no_dropoff() {
        let db = setup_db().await.unwrap();
        let rider = new_rider(&db, "test_rider").await.unwrap();
        let rides = RideManager::new(db.clone());

        let result = rides
            .create(
                rider.id,
                NewRide {
                    dropoff_location: "".to_string(),
                    ..sample_ride()
                },
            )
            .await;
        assert!(matches!(result, Err(DispatchError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_ride_zero_passengers() {
        let db = setup_db().await.unwrap();
        let rider = new_rider(&db, "test_rider").await.unwrap();
        let rides = RideManager::new(db.clone());

        let result = rides
            .create(
                rider.id,
                NewRide {
                    num_passengers: 0,
                    ..sample_ride()
                },
            )
            .await;
        assert!(matches!(result, Err(DispatchError::Validation(_))));
    }

    #[tokio::test]
    async fn test_find_rides_by_rider_driver_and_van() {
        let db = setup_db().await.unwrap();
        let rider = new_rider(&db, "test_rider").await.unwrap();
        let driver = new_driver(&db, "test_driver").await.unwrap();
        let van = new_van(&db, "1234 QWERTY", Some(driver.id), true).await.unwrap();
        let rides = RideManager::new(db.clone());

        let assigned = rides.create(rider.id, sample_ride()).await.unwrap();
        let queued = rides.create(rider.id, sample_ride()).await.unwrap();

        let for_rider = rides.find(RideFilter::for_rider(rider.id)).await.unwrap();
        assert_eq!(for_rider.len(), 2);

        let for_driver = rides.find(RideFilter::for_driver(driver.id)).await.unwrap();
        assert_eq!(for_driver.len(), 1);
        assert_eq!(for_driver[0].id, assigned.id);

        let for_van = rides.find(RideFilter::for_van(van.id)).await.unwrap();
        assert_eq!(for_van.len(), 1);
        assert_eq!(for_van[0].van_id, Some(van.id));

        let pending = rides
            .find(RideFilter::for_rider(rider.id).with_statuses([RideStatus::Pending]))
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, queued.id);

        let finished = rides
            .get_all(&[RideStatus::Completed, RideStatus::Cancelled])
            .await
            .unwrap();
        assert!(finished.is_empty());
        assert_eq!(rides.get_all(&[]).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_edit_ride_locations() {
        let db = setup_db().await.unwrap();
        let rider = new_rider(&db, "test_rider").await.unwrap();
        let rides = RideManager::new(db.clone());
        let ride = rides.create(rider.id, sample_ride()).await.unwrap();

        let updated = rides
            .edit(
                ride.id,
                RideChanges {
                    dropoff_location: Some("Golda Meir Library".to_string()),
                    num_passengers: Some(1),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.dropoff_location, "Golda Meir Library");
        assert_eq!(updated.num_passengers, 1);
        assert_eq!(updated.status, RideStatus::Pending);
    }

    #[tokio::test]
    async fn test_edit_ride_non_existent() {
        let db = setup_db().await.unwrap();
        let rides = RideManager::new(db.clone());

        let result = rides.edit(999, RideChanges::default()).await;
        assert!(matches!(result, Err(DispatchError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_complete_ride_releases_driver() {
        let db = setup_db().await.unwrap();
        let rider = new_rider(&db, "test_rider").await.unwrap();
        let driver = new_driver(&db, "test_driver").await.unwrap();
        new_van(&db, "1234 QWERTY", Some(driver.id), false).await.unwrap();
        let rides = RideManager::new(db.clone());
        let ride = rides.create(rider.id, NewRide::new("here", "there")).await.unwrap();
        assert_eq!(driver_status(&db, driver.id).await, Some(DriverStatus::Assigned));

        let started = rides
            .edit(
                ride.id,
                RideChanges {
                    status: Some(RideStatus::InProgress),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(started.status, RideStatus::InProgress);
        assert_eq!(driver_status(&db, driver.id).await, Some(DriverStatus::Assigned));

        let completed = rides
            .edit(
                ride.id,
                RideChanges {
                    status: Some(RideStatus::Completed),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(completed.status, RideStatus::Completed);
        // Driver and van stay on the record for history
        assert_eq!(completed.driver_id, Some(driver.id));
        assert_eq!(driver_status(&db, driver.id).await, Some(DriverStatus::Available));

        // Completed rides are closed
        let reopened = rides
            .edit(
                ride.id,
                RideChanges {
                    status: Some(RideStatus::Pending),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(reopened, Err(DispatchError::InvalidTransition { .. })));
    }

    #[tokio::test]
    async fn test_edit_cannot_skip_assignment() {
        let db = setup_db().await.unwrap();
        let rider = new_rider(&db, "test_rider").await.unwrap();
        let rides = RideManager::new(db.clone());
        let ride = rides.create(rider.id, sample_ride()).await.unwrap();

        let result = rides
            .edit(
                ride.id,
                RideChanges {
                    status: Some(RideStatus::InProgress),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(DispatchError::InvalidTransition { .. })));
        assert_eq!(rides.get(ride.id).await.unwrap().status, RideStatus::Pending);
    }

    #[tokio::test]
    async fn test_delete_ride() {
        let db = setup_db().await.unwrap();
        let rider = new_rider(&db, "test_rider").await.unwrap();
        let driver = new_driver(&db, "test_driver").await.unwrap();
        new_van(&db, "1234 QWERTY", Some(driver.id), true).await.unwrap();
        let rides = RideManager::new(db.clone());

        let ride = rides.create(rider.id, sample_ride()).await.unwrap();
        assert_eq!(ride.driver_id, Some(driver.id));

        rides.delete(ride.id).await.unwrap();
        assert!(matches!(
            rides.get(ride.id).await,
            Err(DispatchError::NotFound { .. })
        ));
        assert_eq!(driver_status(&db, driver.id).await, Some(DriverStatus::Available));
    }

    #[tokio::test]
    async fn test_delete_pending_ride_and_missing_ride() {
        let db = setup_db().await.unwrap();
        let rider = new_rider(&db, "test_rider").await.unwrap();
        let rides = RideManager::new(db.clone());

        // A pending ride has no driver to release
        let ride = rides.create(rider.id, sample_ride()).await.unwrap();
        rides.delete(ride.id).await.unwrap();

        let result = rides.delete(ride.id).await;
        assert!(matches!(result, Err(DispatchError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_assigned_ride_cannot_require_ada_in_plain_van() {
        let db = setup_db().await.unwrap();
        let rider = new_rider(&db, "test_rider").await.unwrap();
        let driver = new_driver(&db, "test_driver").await.unwrap();
        new_van(&db, "PLAIN", Some(driver.id), false).await.unwrap();
        let rides = RideManager::new(db.clone());

        let ride = rides.create(rider.id, NewRide::new("here", "there")).await.unwrap();
        assert_eq!(ride.status, RideStatus::Assigned);

        let result = rides
            .edit(
                ride.id,
                RideChanges {
                    ada_required: Some(true),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(DispatchError::Validation(_))));
        assert!(!rides.get(ride.id).await.unwrap().ada_required);
    }

    #[tokio::test]
    async fn test_ada_flag_can_change_while_pending_or_in_ada_van() {
        let db = setup_db().await.unwrap();
        let rider = new_rider(&db, "test_rider").await.unwrap();
        let rides = RideManager::new(db.clone());

        let pending = rides.create(rider.id, NewRide::new("here", "there")).await.unwrap();
        let pending = rides
            .edit(
                pending.id,
                RideChanges {
                    ada_required: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(pending.ada_required);

        let driver = new_driver(&db, "test_driver").await.unwrap();
        new_van(&db, "ADA-1", Some(driver.id), true).await.unwrap();
        let other = rides.create(rider.id, NewRide::new("a", "b")).await.unwrap();
        assert_eq!(other.status, RideStatus::Assigned);
        let other = rides
            .edit(
                other.id,
                RideChanges {
                    ada_required: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(other.ada_required);
    }

    #[tokio::test]
    async fn test_stale_edit_does_not_overwrite_assignment() {
        let db = setup_db().await.unwrap();
        let rider = new_rider(&db, "test_rider").await.unwrap();
        let rides = RideManager::new(db.clone());
        let stale = new_pending_ride(&db, rider.id, false).await.unwrap();

        // A driver is assigned after the edit read the ride
        let driver = new_driver(&db, "test_driver").await.unwrap();
        new_van(&db, "1234 QWERTY", Some(driver.id), false).await.unwrap();
        rides.assign_driver(stale.id).await.unwrap();

        let cancel = RideChanges {
            status: Some(RideStatus::Cancelled),
            ..Default::default()
        };
        let written = apply_changes(&db, &stale, &cancel).await.unwrap();
        assert!(written.is_none());
        let current = rides.get(stale.id).await.unwrap();
        assert_eq!(current.status, RideStatus::Assigned);
        assert_eq!(driver_status(&db, driver.id).await, Some(DriverStatus::Assigned));

        // Re-read and re-checked, the cancel frees the driver
        let cancelled = rides.edit(stale.id, cancel).await.unwrap();
        assert_eq!(cancelled.status, RideStatus::Cancelled);
        assert_eq!(driver_status(&db, driver.id).await, Some(DriverStatus::Available));
    }

    #[tokio::test]
    async fn test_edit_without_changes_returns_ride() {
        let db = setup_db().await.unwrap();
        let rider = new_rider(&db, "test_rider").await.unwrap();
        let rides = RideManager::new(db.clone());
        let ride = new_pending_ride(&db, rider.id, false).await.unwrap();

        let unchanged = rides.edit(ride.id, RideChanges::default()).await.unwrap();
        assert_eq!(unchanged.id, ride.id);
        assert_eq!(unchanged.status, RideStatus::Pending);
        assert_eq!(unchanged.pickup_location, ride.pickup_location);
    }
}
