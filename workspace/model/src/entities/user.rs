use std::fmt;
use std::str::FromStr;

use sea_orm::entity::prelude::*;

/// Role of an account in the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(1))")]
pub enum UserType {
    #[sea_orm(string_value = "S")]
    Supervisor,
    #[sea_orm(string_value = "D")]
    Driver,
    #[sea_orm(string_value = "R")]
    Rider,
    #[sea_orm(string_value = "A")]
    Admin,
}

impl UserType {
    /// Single letter code used on the wire and in the database.
    pub fn code(&self) -> &'static str {
        match self {
            UserType::Supervisor => "S",
            UserType::Driver => "D",
            UserType::Rider => "R",
            UserType::Admin => "A",
        }
    }

    /// Staff accounts are hidden from the regular user listing.
    pub fn is_staff(&self) -> bool {
        matches!(self, UserType::Supervisor | UserType::Admin)
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for UserType {
    type Err = String;

    /// Accepts either the letter code or the full role name, in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "s" | "supervisor" => Ok(UserType::Supervisor),
            "d" | "driver" => Ok(UserType::Driver),
            "r" | "rider" => Ok(UserType::Rider),
            "a" | "admin" => Ok(UserType::Admin),
            _ => Err(format!("Invalid user type: {}", s)),
        }
    }
}

/// Whether a driver currently holds an active ride.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum DriverStatus {
    #[sea_orm(string_value = "available")]
    Available,
    #[sea_orm(string_value = "assigned")]
    Assigned,
}

impl DriverStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DriverStatus::Available => "available",
            DriverStatus::Assigned => "assigned",
        }
    }
}

impl fmt::Display for DriverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DriverStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "available" => Ok(DriverStatus::Available),
            "assigned" => Ok(DriverStatus::Assigned),
            _ => Err(format!("Invalid driver status: {}", s)),
        }
    }
}

/// A rider, driver, supervisor or admin account.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub username: String,
    /// bcrypt hash, never the plain password.
    pub password_hash: String,
    pub name: String,
    pub phone_number: String,
    pub address: String,
    #[sea_orm(unique)]
    pub email: String,
    pub user_type: UserType,
    /// Only drivers carry an availability status.
    pub status: Option<DriverStatus>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// A driver owns at most one van, but the relation is one-to-many on the schema level.
    #[sea_orm(has_many = "super::van::Entity")]
    Van,
}

impl Related<super::van::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Van.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
