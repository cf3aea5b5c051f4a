pub mod assignment;
pub mod error;
pub mod messages;
pub mod notifications;
pub mod queue;
pub mod reports;
pub mod rides;
pub mod users;
pub mod vans;

#[cfg(test)]
mod testing;

pub use assignment::RetryPolicy;
pub use error::{DispatchError, Result};
pub use messages::MessageManager;
pub use notifications::NotificationManager;
pub use queue::QueuePosition;
pub use reports::{NewReport, ReportManager};
pub use rides::{NewRide, RideChanges, RideFilter, RideManager};
pub use users::{NewUser, UserChanges, UserLookup, UserManager};
pub use vans::{NewVan, VanChanges, VanManager};

use sea_orm::DatabaseConnection;

/// Every manager wired to the same database pool.
///
/// This is what the HTTP layer keeps in its state; each manager is cheap to
/// clone since it only holds the pool handle.
#[derive(Debug, Clone)]
pub struct Dispatch {
    pub users: UserManager,
    pub vans: VanManager,
    pub rides: RideManager,
    pub reports: ReportManager,
    pub messages: MessageManager,
    pub notifications: NotificationManager,
}

impl Dispatch {
    pub fn new(db: DatabaseConnection, password_hash_cost: u32) -> Self {
        Self {
            users: UserManager::with_hash_cost(db.clone(), password_hash_cost),
            vans: VanManager::new(db.clone()),
            rides: RideManager::new(db.clone()),
            reports: ReportManager::new(db.clone()),
            messages: MessageManager::new(db.clone()),
            notifications: NotificationManager::new(db),
        }
    }
}
