use chrono::Utc;
use model::entities::{
    report::{self, ReportType},
    user::UserType,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::{debug, info, instrument, trace};

use crate::error::{require_text, DispatchError, Result};
use crate::users::require_role;

#[derive(Debug, Clone)]
pub struct NewReport {
    /// Rider or driver filing the report; `None` files it anonymously.
    pub reporter_id: Option<i32>,
    pub report_type: ReportType,
    pub context: String,
}

/// Incident and feedback reports reviewed by supervisors.
#[derive(Debug, Clone)]
pub struct ReportManager {
    db: DatabaseConnection,
}

impl ReportManager {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn create(&self, new_report: NewReport) -> Result<report::Model> {
        trace!("Entering ReportManager::create");
        require_text("context", &new_report.context)?;

        if let Some(reporter_id) = new_report.reporter_id {
            require_role(
                &self.db,
                "User",
                reporter_id,
                &[UserType::Rider, UserType::Driver],
            )
            .await?;
        }

        let created = report::ActiveModel {
            reporter_id: Set(new_report.reporter_id),
            report_type: Set(new_report.report_type),
            context: Set(new_report.context),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        info!(
            "{} report {} filed by {:?}",
            created.report_type.label(),
            created.id,
            created.reporter_id
        );
        Ok(created)
    }

    /// Fetch one report. With `reporter_id` set, a report filed by someone
    /// else is reported as missing.
    pub async fn get(&self, report_id: i32, reporter_id: Option<i32>) -> Result<report::Model> {
        let mut query = report::Entity::find_by_id(report_id);
        if let Some(reporter_id) = reporter_id {
            query = query.filter(report::Column::ReporterId.eq(reporter_id));
        }
        query
            .one(&self.db)
            .await?
            .ok_or_else(|| DispatchError::not_found("Report", report_id))
    }

    /// All reports, newest first.
    pub async fn get_all(&self) -> Result<Vec<report::Model>> {
        let reports = report::Entity::find()
            .order_by_desc(report::Column::CreatedAt)
            .order_by_desc(report::Column::Id)
            .all(&self.db)
            .await?;
        debug!("Retrieved {} reports", reports.len());
        Ok(reports)
    }

    pub async fn for_reporter(&self, user_id: i32) -> Result<Vec<report::Model>> {
        Ok(report::Entity::find()
            .filter(report::Column::ReporterId.eq(user_id))
            .order_by_desc(report::Column::CreatedAt)
            .order_by_desc(report::Column::Id)
            .all(&self.db)
            .await?)
    }
}
