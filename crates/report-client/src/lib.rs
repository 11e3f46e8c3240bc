//! Client for the remote report collector.
//!
//! Submits queued field reports over HTTP and probes collector reachability.

pub mod client;
pub mod error;
pub mod types;

pub use client::ReportSubmissionClient;
pub use error::{ReportClientError, Result};
pub use types::ReportClientConfig;
