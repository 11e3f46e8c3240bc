//! SQLite storage for locally queued health reports.

pub mod db;
pub mod errors;
pub mod reports;
pub mod schema;

pub use db::{create_pool, get_connection, init, run_migrations, spawn_writer, DbPool, WriteHandle};
pub use errors::StorageError;
pub use reports::OfflineReportRepository;
