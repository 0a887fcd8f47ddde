//! Paint-rate limiting for the visible window.
//!
//! Polls mutate the buffer as fast as they arrive; only the projection that
//! gets painted goes through [`RenderThrottle`].

use std::time::{Duration, Instant};

/// Default minimum spacing between two paints.
pub const DEFAULT_RENDER_INTERVAL: Duration = Duration::from_millis(500);

/// Tracks when the window was last painted and suppresses paints that fall
/// inside the cooldown.
#[derive(Debug, Clone)]
pub struct RenderThrottle {
    min_interval: Duration,
    last_render: Option<Instant>,
}

impl RenderThrottle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_render: None,
        }
    }

    /// Check if a paint is allowed at `now` and record it if so.
    ///
    /// The first paint after construction or [`reset`](Self::reset) is
    /// always allowed.
    pub fn should_render(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last_render {
            if now.saturating_duration_since(last) < self.min_interval {
                return false;
            }
        }
        self.last_render = Some(now);
        true
    }

    /// Record an unconditional paint (state transitions bypass the cooldown).
    pub fn mark_rendered(&mut self, now: Instant) {
        self.last_render = Some(now);
    }

    pub fn reset(&mut self) {
        self.last_render = None;
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }
}

impl Default for RenderThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_RENDER_INTERVAL)
    }
}
