use model::entities::{ride::RideStatus, user::UserType};
use thiserror::Error;

/// Error types for the dispatch module
#[derive(Error, Debug)]
pub enum DispatchError {
    /// Error from the database operations
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Error while hashing or verifying a password
    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    /// Input failed a business rule (empty field, bad count, ...)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Referenced record does not exist
    #[error("{entity} '{key}' not found")]
    NotFound { entity: &'static str, key: String },

    #[error("Username '{0}' already exists")]
    DuplicateUsername(String),

    #[error("Email '{0}' already exists")]
    DuplicateEmail(String),

    #[error("Van '{0}' already exists")]
    DuplicateVanNumber(String),

    #[error("Driver '{0}' already has a van")]
    DriverAlreadyHasVan(String),

    /// A user was used in a role they do not hold
    #[error("User {user_id} must be a {expected:?}, found {actual:?}")]
    InvalidRole {
        user_id: i32,
        expected: UserType,
        actual: UserType,
    },

    /// Username/password pair does not match
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Ride status change not allowed by the lifecycle
    #[error("Ride {ride_id} cannot move from {from} to {to}")]
    InvalidTransition {
        ride_id: i32,
        from: RideStatus,
        to: RideStatus,
    },

    #[error("Ride {0} already has a driver")]
    AlreadyAssigned(i32),

    #[error("No driver is available for ride {0}")]
    NoDriverAvailable(i32),

    #[error("Rider {0} has no pending ride")]
    NoPendingRide(i32),

    /// The ride kept changing while an edit was being applied
    #[error("Ride {0} was modified concurrently, try again")]
    RideChanged(i32),
}

impl DispatchError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        DispatchError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Stable machine-readable code for API clients.
    pub fn code(&self) -> &'static str {
        match self {
            DispatchError::Database(_) => "DATABASE_ERROR",
            DispatchError::PasswordHash(_) => "PASSWORD_HASH_ERROR",
            DispatchError::Validation(_) => "VALIDATION_ERROR",
            DispatchError::NotFound { entity, .. } => match *entity {
                "User" => "USER_NOT_FOUND",
                "Driver" => "DRIVER_NOT_FOUND",
                "Rider" => "RIDER_NOT_FOUND",
                "Van" => "VAN_NOT_FOUND",
                "Ride" => "RIDE_NOT_FOUND",
                "Report" => "REPORT_NOT_FOUND",
                "Notification" => "NOTIFICATION_NOT_FOUND",
                _ => "NOT_FOUND",
            },
            DispatchError::DuplicateUsername(_) => "USERNAME_ALREADY_EXISTS",
            DispatchError::DuplicateEmail(_) => "EMAIL_ALREADY_EXISTS",
            DispatchError::DuplicateVanNumber(_) => "VAN_ALREADY_EXISTS",
            DispatchError::DriverAlreadyHasVan(_) => "DRIVER_ALREADY_HAS_VAN",
            DispatchError::InvalidRole { .. } => "INVALID_ROLE",
            DispatchError::InvalidCredentials => "INVALID_CREDENTIALS",
            DispatchError::InvalidTransition { .. } => "INVALID_STATUS_TRANSITION",
            DispatchError::AlreadyAssigned(_) => "RIDE_ALREADY_ASSIGNED",
            DispatchError::NoDriverAvailable(_) => "NO_DRIVER_AVAILABLE",
            DispatchError::NoPendingRide(_) => "NO_PENDING_RIDE",
            DispatchError::RideChanged(_) => "RIDE_MODIFIED",
        }
    }
}

/// Type alias for Result with DispatchError
pub type Result<T> = std::result::Result<T, DispatchError>;

/// Reject blank strings for required text fields.
pub(crate) fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DispatchError::Validation(format!("{} must not be empty", field)));
    }
    Ok(())
}
