use std::fmt;
use std::str::FromStr;

use sea_orm::entity::prelude::*;

/// Category picked by the person filing a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum ReportType {
    #[sea_orm(string_value = "safety")]
    Safety,
    #[sea_orm(string_value = "service")]
    Service,
    #[sea_orm(string_value = "delay")]
    Delay,
    #[sea_orm(string_value = "vehicle")]
    Vehicle,
    #[sea_orm(string_value = "other")]
    Other,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::Safety => "safety",
            ReportType::Service => "service",
            ReportType::Delay => "delay",
            ReportType::Vehicle => "vehicle",
            ReportType::Other => "other",
        }
    }

    /// Human readable label shown to supervisors.
    pub fn label(&self) -> &'static str {
        match self {
            ReportType::Safety => "Safety Issue",
            ReportType::Service => "Service Issue",
            ReportType::Delay => "Delay",
            ReportType::Vehicle => "Vehicle Condition",
            ReportType::Other => "Other",
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "safety" => Ok(ReportType::Safety),
            "service" => Ok(ReportType::Service),
            "delay" => Ok(ReportType::Delay),
            "vehicle" => Ok(ReportType::Vehicle),
            "other" => Ok(ReportType::Other),
            _ => Err(format!("Invalid report type: {}", s)),
        }
    }
}

/// A free-text incident or feedback report.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "reports")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Rider or driver who filed it; `None` for anonymous reports.
    pub reporter_id: Option<i32>,
    pub report_type: ReportType,
    #[sea_orm(column_type = "Text")]
    pub context: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ReporterId",
        to = "super::user::Column::Id"
    )]
    Reporter,
}

impl ActiveModelBehavior for ActiveModel {}
