//! Request handlers for the relay endpoints.
//!
//! Handlers validate the query string, build a per-request
//! [`tailboard_jenkins::JenkinsApi`] from the shared HTTP client, and map
//! failures via [`crate::error::AppError`].

pub mod builds;
pub mod params;
pub mod relay;
