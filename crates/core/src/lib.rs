//! Domain core for the Nirogya offline report sync engine.

pub mod errors;
pub mod reports;
pub mod sync;

pub use errors::{Error, Result};
