use chrono::Utc;
use model::entities::{notification, user::UserType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::{info, instrument};

use crate::error::{require_text, DispatchError, Result};
use crate::users::require_role;

/// Notices shown to riders, e.g. when a driver has been assigned.
#[derive(Debug, Clone)]
pub struct NotificationManager {
    db: DatabaseConnection,
}

impl NotificationManager {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn create(&self, rider_id: i32, text: &str) -> Result<notification::Model> {
        require_text("text", text)?;
        require_role(&self.db, "Rider", rider_id, &[UserType::Rider]).await?;

        let created = notification::ActiveModel {
            rider_id: Set(rider_id),
            text: Set(text.to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;
        info!("Notification {} created for rider {}", created.id, rider_id);
        Ok(created)
    }

    /// A notification belonging to `rider_id`.
    pub async fn get(&self, notification_id: i32, rider_id: i32) -> Result<notification::Model> {
        notification::Entity::find_by_id(notification_id)
            .filter(notification::Column::RiderId.eq(rider_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| DispatchError::not_found("Notification", notification_id))
    }

    pub async fn get_all(&self) -> Result<Vec<notification::Model>> {
        Ok(notification::Entity::find()
            .order_by_desc(notification::Column::CreatedAt)
            .order_by_desc(notification::Column::Id)
            .all(&self.db)
            .await?)
    }

    /// A rider's notifications, newest first.
    pub async fn for_rider(&self, rider_id: i32) -> Result<Vec<notification::Model>> {
        Ok(notification::Entity::find()
            .filter(notification::Column::RiderId.eq(rider_id))
            .order_by_desc(notification::Column::CreatedAt)
            .order_by_desc(notification::Column::Id)
            .all(&self.db)
            .await?)
    }
}
