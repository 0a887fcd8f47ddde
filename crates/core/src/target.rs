//! Coordinates of a build log on the job runner, plus the credentials used
//! to read it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The build whose console log is being tailed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TailTarget {
    /// Base address of the job runner, e.g. `http://localhost:8080`.
    pub endpoint: String,
    /// Job name as shown by the runner (may contain spaces or slashes).
    pub job_name: String,
    /// Build number within the job.
    pub build_number: u64,
}

impl TailTarget {
    pub fn new(endpoint: impl Into<String>, job_name: impl Into<String>, build_number: u64) -> Self {
        Self {
            endpoint: endpoint.into(),
            job_name: job_name.into(),
            build_number,
        }
    }
}

impl fmt::Display for TailTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{}", self.job_name, self.build_number)
    }
}

/// Username / API token pair injected by the relay as basic auth.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub api_token: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            api_token: api_token.into(),
        }
    }
}

// Tokens end up in tracing spans through `?target`-style fields; keep them out.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("api_token", &"***")
            .finish()
    }
}
