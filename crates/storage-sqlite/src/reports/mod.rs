//! SQLite persistence for the offline report queue.

mod model;
mod repository;

pub use model::{NewOfflineReportDB, OfflineReportDB};
pub use repository::OfflineReportRepository;
