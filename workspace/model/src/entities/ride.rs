use std::fmt;
use std::str::FromStr;

use sea_orm::entity::prelude::*;

/// Lifecycle of a ride request.
///
/// `Pending -> Assigned -> InProgress -> Completed`, and any non-terminal
/// state may move to `Cancelled`. `Completed` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum RideStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "assigned")]
    Assigned,
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl RideStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RideStatus::Pending => "pending",
            RideStatus::Assigned => "assigned",
            RideStatus::InProgress => "in_progress",
            RideStatus::Completed => "completed",
            RideStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RideStatus::Completed | RideStatus::Cancelled)
    }

    /// A ride in one of these states holds a driver.
    pub fn is_active(&self) -> bool {
        matches!(self, RideStatus::Assigned | RideStatus::InProgress)
    }

    /// Whether an edit may move a ride from `self` to `next`.
    ///
    /// `Pending -> Assigned` is absent: binding a driver goes
    /// through the assignment path, never through a plain edit.
    pub fn can_transition_to(&self, next: RideStatus) -> bool {
        use RideStatus::*;
        match (*self, next) {
            (current, next) if current == next => !current.is_terminal(),
            (Assigned, InProgress) => true,
            (InProgress, Completed) | (Assigned, Completed) => true,
            (Pending | Assigned | InProgress, Cancelled) => true,
            _ => false,
        }
    }
}

impl fmt::Display for RideStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RideStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "pending" => Ok(RideStatus::Pending),
            "assigned" => Ok(RideStatus::Assigned),
            "in_progress" | "inprogress" => Ok(RideStatus::InProgress),
            "completed" => Ok(RideStatus::Completed),
            "cancelled" | "canceled" => Ok(RideStatus::Cancelled),
            _ => Err(format!("Invalid ride status: {}", s)),
        }
    }
}

/// A ride request and, once assigned, its driver and van.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "rides")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub rider_id: i32,
    pub driver_id: Option<i32>,
    pub van_id: Option<i32>,
    pub pickup_location: String,
    pub dropoff_location: String,
    #[sea_orm(default_value = "1")]
    pub num_passengers: i32,
    #[sea_orm(default_value = "false")]
    pub ada_required: bool,
    pub status: RideStatus,
    /// Requested pickup time, if the rider asked for one.
    pub pickup_time: Option<DateTimeUtc>,
    pub assigned_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::RiderId",
        to = "super::user::Column::Id"
    )]
    Rider,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::DriverId",
        to = "super::user::Column::Id"
    )]
    Driver,
    #[sea_orm(
        belongs_to = "super::van::Entity",
        from = "Column::VanId",
        to = "super::van::Column::Id"
    )]
    Van,
}

impl Related<super::van::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Van.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
