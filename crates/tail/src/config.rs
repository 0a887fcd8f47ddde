use std::str::FromStr;
use std::time::Duration;

use tailboard_core::buffer::{DEFAULT_MAX_LINES, DEFAULT_VISIBLE_LINES};
use tailboard_core::target::Credentials;
use tailboard_core::throttle::DEFAULT_RENDER_INTERVAL;

/// Timing and sizing knobs of a [`crate::tailer::Tailer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailerSettings {
    /// Fixed spacing between poll attempts.
    pub poll_interval: Duration,
    /// Minimum spacing between two paints of the visible window.
    pub render_interval: Duration,
    /// Cap on retained lines.
    pub max_lines: usize,
    /// Number of most recent lines painted.
    pub visible_lines: usize,
    /// Deadline for one relay call.
    pub poll_timeout: Duration,
    /// How long an error message stays visible.
    pub error_dismiss: Duration,
}

impl Default for TailerSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            render_interval: DEFAULT_RENDER_INTERVAL,
            max_lines: DEFAULT_MAX_LINES,
            visible_lines: DEFAULT_VISIBLE_LINES,
            poll_timeout: Duration::from_secs(10),
            error_dismiss: Duration::from_secs(5),
        }
    }
}

/// Configuration of the `tailboard-tail` binary.
#[derive(Debug, Clone)]
pub struct TailConfig {
    /// Base URL of the relay server.
    pub relay_url: String,
    /// Base URL of the job runner, passed through the relay.
    pub jenkins_url: String,
    pub job_name: String,
    /// Build to tail. `None` only when `trigger` is set.
    pub build_number: Option<u64>,
    pub credentials: Credentials,
    /// Queue a new build and tail it instead of an existing one.
    pub trigger: bool,
    /// How long to wait for a queued build to get a number.
    pub queue_wait: Duration,
    pub settings: TailerSettings,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value:?}")]
    Invalid { name: &'static str, value: String },
}

impl TailConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var              | Default                  |
    /// |----------------------|--------------------------|
    /// | `RELAY_URL`          | `http://localhost:3000`  |
    /// | `JENKINS_URL`        | `http://localhost:8080`  |
    /// | `JOB_NAME`           | required                 |
    /// | `BUILD_NUMBER`       | required unless trigger  |
    /// | `JENKINS_USER`       | required                 |
    /// | `JENKINS_API_TOKEN`  | required                 |
    /// | `TAIL_TRIGGER`       | `false`                  |
    /// | `QUEUE_WAIT_SECS`    | `30`                     |
    /// | `POLL_INTERVAL_MS`   | `1000`                   |
    /// | `RENDER_INTERVAL_MS` | `500`                    |
    /// | `MAX_LINES`          | `3000`                   |
    /// | `VISIBLE_LINES`      | `1000`                   |
    /// | `POLL_TIMEOUT_SECS`  | `10`                     |
    /// | `ERROR_DISMISS_SECS` | `5`                      |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &'static str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &'static str| var(key).ok_or(ConfigError::Missing(key));

        let trigger = parse_or(&var, "TAIL_TRIGGER", false)?;
        let build_number = match var("BUILD_NUMBER") {
            Some(raw) => Some(parse(&raw, "BUILD_NUMBER")?),
            None if trigger => None,
            None => return Err(ConfigError::Missing("BUILD_NUMBER")),
        };

        let defaults = TailerSettings::default();
        let settings = TailerSettings {
            poll_interval: Duration::from_millis(parse_or(&var, "POLL_INTERVAL_MS", 1000)?),
            render_interval: Duration::from_millis(parse_or(
                &var,
                "RENDER_INTERVAL_MS",
                defaults.render_interval.as_millis() as u64,
            )?),
            max_lines: parse_or(&var, "MAX_LINES", defaults.max_lines)?,
            visible_lines: parse_or(&var, "VISIBLE_LINES", defaults.visible_lines)?,
            poll_timeout: Duration::from_secs(parse_or(&var, "POLL_TIMEOUT_SECS", 10)?),
            error_dismiss: Duration::from_secs(parse_or(&var, "ERROR_DISMISS_SECS", 5)?),
        };
        if settings.poll_interval.is_zero() {
            return Err(ConfigError::Invalid {
                name: "POLL_INTERVAL_MS",
                value: "0".into(),
            });
        }

        Ok(Self {
            relay_url: var("RELAY_URL").unwrap_or_else(|| "http://localhost:3000".into()),
            jenkins_url: var("JENKINS_URL").unwrap_or_else(|| "http://localhost:8080".into()),
            job_name: required("JOB_NAME")?,
            build_number,
            credentials: Credentials::new(required("JENKINS_USER")?, required("JENKINS_API_TOKEN")?),
            trigger,
            queue_wait: Duration::from_secs(parse_or(&var, "QUEUE_WAIT_SECS", 30)?),
            settings,
        })
    }
}

fn parse<T: FromStr>(raw: &str, name: &'static str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        value: raw.to_string(),
    })
}

fn parse_or<T: FromStr>(
    var: &impl Fn(&'static str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match var(name) {
        Some(raw) => parse(&raw, name),
        None => Ok(default),
    }
}
