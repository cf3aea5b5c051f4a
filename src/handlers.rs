pub mod auth;
pub mod drivers;
pub mod health;
pub mod messages;
pub mod notifications;
pub mod reports;
pub mod rides;
pub mod users;
pub mod vans;
