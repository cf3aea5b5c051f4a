use model::entities::{
    user::{self, UserType},
    van,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set, SqlErr,
};
use tracing::{debug, info, instrument, trace, warn};

use crate::error::{require_text, DispatchError, Result};

#[derive(Debug, Clone)]
pub struct NewVan {
    pub van_number: String,
    pub ada: bool,
    /// Username of the driver operating the van, if any.
    pub driver: Option<String>,
}

/// Partial update of a van.
///
/// `driver` is tri-state: `None` keeps the current driver, `Some(None)`
/// removes it, `Some(Some(username))` hands the van to another driver.
#[derive(Debug, Clone, Default)]
pub struct VanChanges {
    pub van_number: Option<String>,
    pub ada: Option<bool>,
    pub driver: Option<Option<String>>,
}

/// Fleet management.
#[derive(Debug, Clone)]
pub struct VanManager {
    db: DatabaseConnection,
}

impl VanManager {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn create(&self, new_van: NewVan) -> Result<van::Model> {
        trace!("Entering VanManager::create");
        require_text("van_number", &new_van.van_number)?;

        if self.find_by_number(&new_van.van_number).await?.is_some() {
            warn!("Van '{}' already exists", new_van.van_number);
            return Err(DispatchError::DuplicateVanNumber(new_van.van_number));
        }

        let driver_id = match &new_van.driver {
            Some(username) => Some(self.resolve_driver(username, None).await?.id),
            None => None,
        };

        let created = van::ActiveModel {
            van_number: Set(new_van.van_number.clone()),
            ada: Set(new_van.ada),
            driver_id: Set(driver_id),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(|err| duplicate_van(err, &new_van.van_number, new_van.driver.as_deref()))?;

        info!("Van '{}' created with ID: {}", created.van_number, created.id);
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_all(&self) -> Result<Vec<van::Model>> {
        let vans = van::Entity::find()
            .order_by_asc(van::Column::VanNumber)
            .all(&self.db)
            .await?;
        debug!("Retrieved {} vans", vans.len());
        Ok(vans)
    }

    pub async fn get_by_id(&self, van_id: i32) -> Result<van::Model> {
        van::Entity::find_by_id(van_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| DispatchError::not_found("Van", van_id))
    }

    pub async fn get_by_number(&self, van_number: &str) -> Result<van::Model> {
        self.find_by_number(van_number).await?.ok_or_else(|| {
            warn!("Van '{}' not found", van_number);
            DispatchError::not_found("Van", van_number)
        })
    }

    /// The van operated by the driver with the given username.
    #[instrument(skip(self))]
    pub async fn get_by_driver(&self, username: &str) -> Result<van::Model> {
        let driver = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await?
            .ok_or_else(|| DispatchError::not_found("Driver", username))?;

        van::Entity::find()
            .filter(van::Column::DriverId.eq(driver.id))
            .one(&self.db)
            .await?
            .ok_or_else(|| {
                debug!("Driver '{}' has no van", username);
                DispatchError::not_found("Van", format!("driven by {}", username))
            })
    }

    #[instrument(skip(self))]
    pub async fn edit(&self, van_number: &str, changes: VanChanges) -> Result<van::Model> {
        trace!("Entering VanManager::edit");
        let existing = self.get_by_number(van_number).await?;
        let van_id = existing.id;
        let final_number = changes
            .van_number
            .clone()
            .unwrap_or_else(|| existing.van_number.clone());
        let new_driver = changes.driver.clone().flatten();
        let mut active: van::ActiveModel = existing.into();

        if let Some(new_number) = changes.van_number {
            require_text("van_number", &new_number)?;
            if new_number != van_number && self.find_by_number(&new_number).await?.is_some() {
                return Err(DispatchError::DuplicateVanNumber(new_number));
            }
            active.van_number = Set(new_number);
        }
        if let Some(ada) = changes.ada {
            active.ada = Set(ada);
        }
        match changes.driver {
            Some(Some(username)) => {
                let driver = self.resolve_driver(&username, Some(van_id)).await?;
                active.driver_id = Set(Some(driver.id));
            }
            Some(None) => active.driver_id = Set(None),
            None => {}
        }

        let updated = active
            .update(&self.db)
            .await
            .map_err(|err| duplicate_van(err, &final_number, new_driver.as_deref()))?;
        info!("Van '{}' updated", updated.van_number);
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, van_number: &str) -> Result<()> {
        let result = van::Entity::delete_many()
            .filter(van::Column::VanNumber.eq(van_number))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            warn!("Van '{}' not found for deletion", van_number);
            return Err(DispatchError::not_found("Van", van_number));
        }
        info!("Van '{}' deleted", van_number);
        Ok(())
    }

    async fn find_by_number(&self, van_number: &str) -> Result<Option<van::Model>> {
        Ok(van::Entity::find()
            .filter(van::Column::VanNumber.eq(van_number))
            .one(&self.db)
            .await?)
    }

    /// Look up a driver by username and make sure they are free to take
    /// `for_van` (or any new van when `None`).
    async fn resolve_driver(&self, username: &str, for_van: Option<i32>) -> Result<user::Model> {
        let driver = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await?
            .ok_or_else(|| DispatchError::not_found("Driver", username))?;

        if driver.user_type != UserType::Driver {
            return Err(DispatchError::InvalidRole {
                user_id: driver.id,
                expected: UserType::Driver,
                actual: driver.user_type,
            });
        }

        let current_van = van::Entity::find()
            .filter(van::Column::DriverId.eq(driver.id))
            .one(&self.db)
            .await?;
        if let Some(current_van) = current_van {
            if Some(current_van.id) != for_van {
                warn!(
                    "Driver '{}' already operates van '{}'",
                    username, current_van.van_number
                );
                return Err(DispatchError::DriverAlreadyHasVan(username.to_string()));
            }
        }

        Ok(driver)
    }
}

/// Map a unique index violation onto the matching duplicate error.
fn duplicate_van(err: DbErr, van_number: &str, driver: Option<&str>) -> DispatchError {
    match (err.sql_err(), driver) {
        (Some(SqlErr::UniqueConstraintViolation(detail)), Some(driver))
            if detail.contains("driver_id") =>
        {
            warn!("Driver '{}' was given a second van", driver);
            DispatchError::DriverAlreadyHasVan(driver.to_string())
        }
        (Some(SqlErr::UniqueConstraintViolation(detail)), _) => {
            warn!("Unique constraint violated: {}", detail);
            DispatchError::DuplicateVanNumber(van_number.to_string())
        }
        _ => DispatchError::Database(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{new_driver, new_rider, setup_db};

    fn sample_van(driver: Option<&str>) -> NewVan {
        NewVan {
            van_number: "1".to_string(),
            ada: true,
            driver: driver.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_create_van_success() {
        let db = setup_db().await.unwrap();
        let driver = new_driver(&db, "test_driver").await.unwrap();
        let vans = VanManager::new(db.clone());

        let van = vans.create(sample_van(Some("test_driver"))).await.unwrap();
        assert_eq!(van.van_number, "1");
        assert!(van.ada);
        assert_eq!(van.driver_id, Some(driver.id));
    }

    #[tokio::test]
    async fn test_create_van_duplicate_van_number() {
        let db = setup_db().await.unwrap();
        let vans = VanManager::new(db.clone());

        vans.create(sample_van(None)).await.unwrap();
        let result = vans.create(sample_van(None)).await;
        assert!(matches!(result, Err(DispatchError::DuplicateVanNumber(_))));
    }

    #[tokio::test]
    async fn test_create_van_without_driver() {
        let db = setup_db().await.unwrap();
        let vans = VanManager::new(db.clone());

        vans.create(NewVan {
            van_number: "2".to_string(),
            ada: false,
            driver: None,
        })
        .await
        .unwrap();
        let van = vans.get_by_number("2").await.unwrap();
        assert_eq!(van.driver_id, None);
        assert!(!van.ada);
    }

    #[tokio::test]
    async fn test_create_van_driver_must_be_driver() {
        let db = setup_db().await.unwrap();
        new_rider(&db, "just_a_rider").await.unwrap();
        let vans = VanManager::new(db.clone());

        let result = vans.create(sample_van(Some("just_a_rider"))).await;
        assert!(matches!(result, Err(DispatchError::InvalidRole { .. })));
    }

    #[tokio::test]
    async fn test_driver_operates_one_van() {
        let db = setup_db().await.unwrap();
        new_driver(&db, "test_driver").await.unwrap();
        let vans = VanManager::new(db.clone());

        vans.create(sample_van(Some("test_driver"))).await.unwrap();
        let result = vans
            .create(NewVan {
                van_number: "2".to_string(),
                ada: false,
                driver: Some("test_driver".to_string()),
            })
            .await;
        assert!(matches!(result, Err(DispatchError::DriverAlreadyHasVan(_))));
    }

    #[tokio::test]
    async fn test_edit_van_success() {
        let db = setup_db().await.unwrap();
        new_driver(&db, "test_driver").await.unwrap();
        let vans = VanManager::new(db.clone());
        vans.create(sample_van(Some("test_driver"))).await.unwrap();

        let updated = vans
            .edit(
                "1",
                VanChanges {
                    ada: Some(false),
                    driver: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(!updated.ada);
        assert_eq!(updated.driver_id, None);
    }

    #[tokio::test]
    async fn test_edit_van_keeps_own_driver() {
        let db = setup_db().await.unwrap();
        let driver = new_driver(&db, "test_driver").await.unwrap();
        let vans = VanManager::new(db.clone());
        vans.create(sample_van(Some("test_driver"))).await.unwrap();

        // Re-assigning the same driver to the same van is not a conflict
        let updated = vans
            .edit(
                "1",
                VanChanges {
                    driver: Some(Some("test_driver".to_string())),
                    van_number: Some("1A".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.driver_id, Some(driver.id));
        assert_eq!(updated.van_number, "1A");
    }

    #[tokio::test]
    async fn test_edit_van_non_existent() {
        let db = setup_db().await.unwrap();
        let vans = VanManager::new(db.clone());

        let result = vans
            .edit(
                "999",
                VanChanges {
                    ada: Some(false),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(DispatchError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_van() {
        let db = setup_db().await.unwrap();
        let vans = VanManager::new(db.clone());
        vans.create(sample_van(None)).await.unwrap();

        vans.delete("1").await.unwrap();
        assert!(matches!(
            vans.get_by_number("1").await,
            Err(DispatchError::NotFound { .. })
        ));
        assert!(matches!(
            vans.delete("999").await,
            Err(DispatchError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_get_van_by_driver_and_all() {
        let db = setup_db().await.unwrap();
        new_driver(&db, "test_driver").await.unwrap();
        let vans = VanManager::new(db.clone());
        let first = vans.create(sample_van(Some("test_driver"))).await.unwrap();
        vans.create(NewVan {
            van_number: "2".to_string(),
            ada: false,
            driver: None,
        })
        .await
        .unwrap();

        let by_driver = vans.get_by_driver("test_driver").await.unwrap();
        assert_eq!(by_driver.id, first.id);
        assert_eq!(vans.get_by_id(first.id).await.unwrap().van_number, "1");

        let all = vans.get_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().any(|v| v.van_number == "1"));
        assert!(all.iter().any(|v| v.van_number == "2"));
    }

    fn raw_van(van_number: &str, driver_id: Option<i32>) -> van::ActiveModel {
        van::ActiveModel {
            van_number: Set(van_number.to_string()),
            ada: Set(false),
            driver_id: Set(driver_id),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_unique_index_violations_map_to_duplicates() {
        let db = setup_db().await.unwrap();
        let driver = new_driver(&db, "test_driver").await.unwrap();
        raw_van("1", Some(driver.id)).insert(&db).await.unwrap();

        let err = raw_van("1", None).insert(&db).await.unwrap_err();
        assert!(matches!(
            duplicate_van(err, "1", None),
            DispatchError::DuplicateVanNumber(number) if number == "1"
        ));

        let err = raw_van("2", Some(driver.id)).insert(&db).await.unwrap_err();
        assert!(matches!(
            duplicate_van(err, "2", Some("test_driver")),
            DispatchError::DriverAlreadyHasVan(name) if name == "test_driver"
        ));
    }
}
