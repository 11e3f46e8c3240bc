//! Report sync engine: controller, status broadcasting and triggers.

mod connectivity;
mod report_sync_engine;
mod report_sync_model;
mod report_sync_scheduler;
mod report_sync_service;
mod status_broadcaster;

pub use connectivity::*;
pub use report_sync_engine::*;
pub use report_sync_model::*;
pub use report_sync_scheduler::*;
pub use report_sync_service::*;
pub use status_broadcaster::*;
