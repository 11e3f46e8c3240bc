//! Offline report models and the ports the sync engine runs against.

mod reports_model;
mod reports_traits;

pub use reports_model::*;
pub use reports_traits::*;
