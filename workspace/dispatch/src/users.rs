use std::str::FromStr;

use model::entities::{
    user::{self, DriverStatus, UserType},
    van,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set, SqlErr,
};
use tracing::{debug, info, instrument, trace, warn};

use crate::error::{require_text, DispatchError, Result};

/// Data required to register a new account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub name: String,
    pub phone_number: String,
    pub address: String,
    pub email: String,
    pub user_type: UserType,
}

/// Partial update of an account. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub password: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub user_type: Option<UserType>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.password.is_none()
            && self.name.is_none()
            && self.email.is_none()
            && self.phone_number.is_none()
            && self.address.is_none()
            && self.user_type.is_none()
    }
}

/// Field a user search matches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserLookup {
    Username,
    Name,
    Email,
    Address,
    PhoneNumber,
    UserType,
}

impl FromStr for UserLookup {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "username" => Ok(UserLookup::Username),
            "name" => Ok(UserLookup::Name),
            "email" => Ok(UserLookup::Email),
            "address" => Ok(UserLookup::Address),
            "phone_number" => Ok(UserLookup::PhoneNumber),
            "user_type" => Ok(UserLookup::UserType),
            _ => Err(format!("Cannot search users by '{}'", s)),
        }
    }
}

/// bcrypt work factor used unless configured otherwise.
pub const DEFAULT_HASH_COST: u32 = bcrypt::DEFAULT_COST;

/// Account management: registration, edits, lookups and credential checks.
#[derive(Debug, Clone)]
pub struct UserManager {
    db: DatabaseConnection,
    hash_cost: u32,
}

impl UserManager {
    pub fn new(db: DatabaseConnection) -> Self {
        Self::with_hash_cost(db, DEFAULT_HASH_COST)
    }

    /// Use a custom bcrypt cost. Low costs are only meant for tests.
    pub fn with_hash_cost(db: DatabaseConnection, hash_cost: u32) -> Self {
        Self { db, hash_cost }
    }

    #[instrument(skip(self, new_user), fields(username = %new_user.username))]
    pub async fn create(&self, new_user: NewUser) -> Result<user::Model> {
        trace!("Entering UserManager::create");

        require_text("username", &new_user.username)?;
        require_text("password", &new_user.password)?;
        require_text("name", &new_user.name)?;
        require_text("phone_number", &new_user.phone_number)?;
        require_text("address", &new_user.address)?;
        require_text("email", &new_user.email)?;

        if self.find_by_username(&new_user.username).await?.is_some() {
            warn!("Username '{}' is already taken", new_user.username);
            return Err(DispatchError::DuplicateUsername(new_user.username));
        }
        if self.find_by_email(&new_user.email).await?.is_some() {
            warn!("Email '{}' is already registered", new_user.email);
            return Err(DispatchError::DuplicateEmail(new_user.email));
        }

        let password_hash = bcrypt::hash(&new_user.password, self.hash_cost)?;
        let status = initial_status(new_user.user_type);
        let username = new_user.username.clone();
        let email = new_user.email.clone();

        let created = user::ActiveModel {
            username: Set(new_user.username),
            password_hash: Set(password_hash),
            name: Set(new_user.name),
            phone_number: Set(new_user.phone_number),
            address: Set(new_user.address),
            email: Set(new_user.email),
            user_type: Set(new_user.user_type),
            status: Set(status),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(|err| duplicate_user(err, &username, &email))?;

        info!(
            "User created with ID: {}, username: {}, type: {}",
            created.id, created.username, created.user_type
        );
        Ok(created)
    }

    #[instrument(skip(self, changes))]
    pub async fn edit(&self, username: &str, changes: UserChanges) -> Result<user::Model> {
        trace!("Entering UserManager::edit");

        let existing = self.require_by_username(username).await?;
        if changes.is_empty() {
            debug!("No fields to update for user {}", username);
            return Ok(existing);
        }

        if let Some(email) = &changes.email {
            require_text("email", email)?;
            if let Some(other) = self.find_by_email(email).await? {
                if other.id != existing.id {
                    warn!("Email '{}' already belongs to user {}", email, other.id);
                    return Err(DispatchError::DuplicateEmail(email.clone()));
                }
            }
        }

        let current_type = existing.user_type;
        let current_username = existing.username.clone();
        let new_email = changes.email.clone().unwrap_or_else(|| existing.email.clone());
        let mut active: user::ActiveModel = existing.into();

        if let Some(password) = changes.password {
            require_text("password", &password)?;
            active.password_hash = Set(bcrypt::hash(&password, self.hash_cost)?);
        }
        if let Some(name) = changes.name {
            require_text("name", &name)?;
            active.name = Set(name);
        }
        if let Some(email) = changes.email {
            active.email = Set(email);
        }
        if let Some(phone_number) = changes.phone_number {
            require_text("phone_number", &phone_number)?;
            active.phone_number = Set(phone_number);
        }
        if let Some(address) = changes.address {
            require_text("address", &address)?;
            active.address = Set(address);
        }
        if let Some(user_type) = changes.user_type {
            if user_type != current_type {
                debug!("Changing user type from {} to {}", current_type, user_type);
                active.status = Set(initial_status(user_type));
            }
            active.user_type = Set(user_type);
        }

        let updated = active
            .update(&self.db)
            .await
            .map_err(|err| duplicate_user(err, &current_username, &new_email))?;
        info!("User {} updated", updated.username);
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, username: &str) -> Result<()> {
        trace!("Entering UserManager::delete");

        let result = user::Entity::delete_many()
            .filter(user::Column::Username.eq(username))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            warn!("User '{}' not found for deletion", username);
            return Err(DispatchError::not_found("User", username));
        }

        info!("User '{}' deleted", username);
        Ok(())
    }

    /// Exact-match search on a single field. Unknown values yield an empty list.
    #[instrument(skip(self))]
    pub async fn find(&self, lookup: UserLookup, value: &str) -> Result<Vec<user::Model>> {
        let query = user::Entity::find();
        let query = match lookup {
            UserLookup::Username => query.filter(user::Column::Username.eq(value)),
            UserLookup::Name => query.filter(user::Column::Name.eq(value)),
            UserLookup::Email => query.filter(user::Column::Email.eq(value)),
            UserLookup::Address => query.filter(user::Column::Address.eq(value)),
            UserLookup::PhoneNumber => query.filter(user::Column::PhoneNumber.eq(value)),
            UserLookup::UserType => match value.parse::<UserType>() {
                Ok(user_type) => query.filter(user::Column::UserType.eq(user_type)),
                Err(e) => {
                    debug!("{}", e);
                    return Ok(Vec::new());
                }
            },
        };

        let users = query.order_by_asc(user::Column::Id).all(&self.db).await?;
        debug!("Found {} users matching {:?} = {}", users.len(), lookup, value);
        Ok(users)
    }

    /// All riders and drivers. Supervisors and admins are not listed.
    #[instrument(skip(self))]
    pub async fn get_all(&self) -> Result<Vec<user::Model>> {
        let users = user::Entity::find()
            .filter(user::Column::UserType.is_not_in([UserType::Supervisor, UserType::Admin]))
            .order_by_asc(user::Column::Id)
            .all(&self.db)
            .await?;
        debug!("Retrieved {} users", users.len());
        Ok(users)
    }

    pub async fn get_by_id(&self, user_id: i32) -> Result<user::Model> {
        user::Entity::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| DispatchError::not_found("User", user_id))
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<user::Model>> {
        Ok(user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await?)
    }

    pub async fn require_by_username(&self, username: &str) -> Result<user::Model> {
        self.find_by_username(username).await?.ok_or_else(|| {
            warn!("User '{}' not found", username);
            DispatchError::not_found("User", username)
        })
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>> {
        Ok(user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await?)
    }

    /// Returns the user when the password matches, `None` otherwise.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Option<user::Model>> {
        let Some(user) = self.find_by_username(username).await? else {
            debug!("Login attempt for unknown user '{}'", username);
            return Ok(None);
        };

        if bcrypt::verify(password, &user.password_hash)? {
            info!("User '{}' authenticated", username);
            Ok(Some(user))
        } else {
            warn!("Wrong password for user '{}'", username);
            Ok(None)
        }
    }

    /// Whether `password` is the current password of `username`.
    pub async fn verify_password(&self, username: &str, password: &str) -> Result<bool> {
        let user = self.require_by_username(username).await?;
        Ok(bcrypt::verify(password, &user.password_hash)?)
    }

    /// Drivers free to take a ride right now.
    #[instrument(skip(self))]
    pub async fn available_drivers(&self) -> Result<Vec<user::Model>> {
        Ok(user::Entity::find()
            .filter(user::Column::UserType.eq(UserType::Driver))
            .filter(user::Column::Status.eq(DriverStatus::Available))
            .order_by_asc(user::Column::Id)
            .all(&self.db)
            .await?)
    }

    /// Drivers that do not operate any van yet.
    #[instrument(skip(self))]
    pub async fn unassigned_drivers(&self) -> Result<Vec<user::Model>> {
        let drivers = user::Entity::find()
            .filter(user::Column::UserType.eq(UserType::Driver))
            .find_with_related(van::Entity)
            .order_by_asc(user::Column::Id)
            .all(&self.db)
            .await?;

        Ok(drivers
            .into_iter()
            .filter(|(_, vans)| vans.is_empty())
            .map(|(driver, _)| driver)
            .collect())
    }
}

/// Map a unique index violation onto the matching duplicate error.
fn duplicate_user(err: DbErr, username: &str, email: &str) -> DispatchError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            warn!("Unique constraint violated: {}", detail);
            if detail.contains("email") {
                DispatchError::DuplicateEmail(email.to_string())
            } else {
                DispatchError::DuplicateUsername(username.to_string())
            }
        }
        _ => DispatchError::Database(err),
    }
}

fn initial_status(user_type: UserType) -> Option<DriverStatus> {
    match user_type {
        UserType::Driver => Some(DriverStatus::Available),
        _ => None,
    }
}

/// Load a user and check they hold one of the `allowed` roles.
///
/// `entity` names the missing record in the resulting `NotFound` error.
pub(crate) async fn require_role(
    db: &DatabaseConnection,
    entity: &'static str,
    user_id: i32,
    allowed: &[UserType],
) -> Result<user::Model> {
    let user = user::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| DispatchError::not_found(entity, user_id))?;

    if !allowed.contains(&user.user_type) {
        warn!("User {} is a {}, expected one of {:?}", user_id, user.user_type, allowed);
        return Err(DispatchError::InvalidRole {
            user_id,
            expected: allowed.first().copied().unwrap_or(user.user_type),
            actual: user.user_type,
        });
    }
    Ok(user)
}
