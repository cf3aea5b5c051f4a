use model::entities::ride::{self, RideStatus};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use tracing::{debug, instrument};

use crate::error::{DispatchError, Result};
use crate::rides::RideManager;

/// Where a rider's oldest pending ride sits in the first-come queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueuePosition {
    pub ride_id: i32,
    /// 1-based place in line.
    pub position: u64,
    pub rides_ahead: u64,
    pub pending_total: u64,
}

impl RideManager {
    #[instrument(skip(self))]
    pub async fn queue_position(&self, rider_id: i32) -> Result<QueuePosition> {
        let ride = ride::Entity::find()
            .filter(ride::Column::RiderId.eq(rider_id))
            .filter(ride::Column::Status.eq(RideStatus::Pending))
            .order_by_asc(ride::Column::Id)
            .one(&self.db)
            .await?
            .ok_or(DispatchError::NoPendingRide(rider_id))?;

        let rides_ahead = ride::Entity::find()
            .filter(ride::Column::Status.eq(RideStatus::Pending))
            .filter(ride::Column::Id.lt(ride.id))
            .count(&self.db)
            .await?;
        let pending_total = ride::Entity::find()
            .filter(ride::Column::Status.eq(RideStatus::Pending))
            .count(&self.db)
            .await?;

        debug!(
            "Rider {} ride {} has {} rides ahead of {} pending",
            rider_id, ride.id, rides_ahead, pending_total
        );
        Ok(QueuePosition {
            ride_id: ride.id,
            position: rides_ahead + 1,
            rides_ahead,
            pending_total,
        })
    }
}
