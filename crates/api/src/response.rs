//! Shared response envelope types for API handlers.
//!
//! JSON responses use a `{ "data": ... }` envelope. The progressive-log
//! relay is the exception: it answers with the runner's raw text.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
