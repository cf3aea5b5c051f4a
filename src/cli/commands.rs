pub mod create_supervisor;
pub mod initdb;
pub mod migrate_and_serve;
pub mod serve;

pub use create_supervisor::{create_supervisor, SupervisorAccount};
pub use initdb::init_database;
pub use migrate_and_serve::migrate_and_serve;
pub use serve::serve;
