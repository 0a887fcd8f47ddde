//! REST client for the Jenkins endpoints the dashboard relays.
//!
//! Wraps the progressive console log and the build lifecycle endpoints
//! (trigger, queue lookup, status, stop) using [`reqwest`]. Credentials
//! are attached as HTTP basic auth on every request.

pub mod api;

pub use api::{BuildInfo, JenkinsApi, JenkinsError, ProgressiveResponse};
