use chrono::Utc;
use model::entities::{message, user::UserType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::{debug, instrument};

use crate::error::{require_text, Result};
use crate::users::require_role;

/// Rider to driver messaging.
#[derive(Debug, Clone)]
pub struct MessageManager {
    db: DatabaseConnection,
}

impl MessageManager {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, text))]
    pub async fn send(&self, rider_id: i32, driver_id: i32, text: &str) -> Result<message::Model> {
        require_text("text", text)?;
        require_role(&self.db, "Rider", rider_id, &[UserType::Rider]).await?;
        require_role(&self.db, "Driver", driver_id, &[UserType::Driver]).await?;

        let sent = message::ActiveModel {
            rider_id: Set(rider_id),
            driver_id: Set(driver_id),
            text: Set(text.to_string()),
            sent_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;
        debug!("Message {} sent", sent.id);
        Ok(sent)
    }

    /// Messages between a rider and a driver in the order they were sent.
    pub async fn conversation(&self, rider_id: i32, driver_id: i32) -> Result<Vec<message::Model>> {
        Ok(message::Entity::find()
            .filter(message::Column::RiderId.eq(rider_id))
            .filter(message::Column::DriverId.eq(driver_id))
            .order_by_asc(message::Column::SentAt)
            .order_by_asc(message::Column::Id)
            .all(&self.db)
            .await?)
    }
}
