//! Async driver around [`Session`].
//!
//! A [`Tailer`] owns one session at a time. Starting a session spawns a
//! poll loop that fires every `poll_interval`; each tick asks the session
//! for a [`PollTicket`](tailboard_core::session::PollTicket), so a slow
//! request simply causes later ticks to be skipped instead of stacking up.
//! Results are folded back in under the same lock and the visible window is
//! published on a `watch` channel, rate-limited by a [`RenderThrottle`].
//! State transitions always publish. The loop only holds a weak reference,
//! so it winds down once every [`Tailer`] handle is gone.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use tailboard_core::buffer::render_window;
use tailboard_core::error::CoreError;
use tailboard_core::session::{PollOutcome, Session, SessionState};
use tailboard_core::target::TailTarget;
use tailboard_core::throttle::RenderThrottle;

use crate::config::TailerSettings;
use crate::source::LogSource;

/// What a front end paints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    pub generation: u64,
    pub state: SessionState,
    /// Bytes consumed so far; `None` once the session has stopped.
    pub offset: Option<u64>,
    /// The visible window, newline-joined.
    pub text: String,
    pub error: Option<String>,
}

impl View {
    fn capture(session: &Session, visible_lines: usize) -> Self {
        Self {
            generation: session.generation(),
            state: session.state(),
            offset: session.offset(),
            text: render_window(session.buffer(), visible_lines),
            error: session.error().map(|e| e.message.clone()),
        }
    }
}

impl Default for View {
    fn default() -> Self {
        Self {
            generation: 0,
            state: SessionState::Idle,
            offset: None,
            text: String::new(),
            error: None,
        }
    }
}

struct Inner {
    session: Session,
    throttle: RenderThrottle,
    poller: Option<CancellationToken>,
}

struct Shared {
    source: Arc<dyn LogSource>,
    settings: TailerSettings,
    inner: Mutex<Inner>,
    view: watch::Sender<View>,
}

/// Handle to a tailing session. Cheap to clone.
#[derive(Clone)]
pub struct Tailer {
    shared: Arc<Shared>,
}

impl Tailer {
    pub fn new(source: Arc<dyn LogSource>, settings: TailerSettings) -> Self {
        let (view, _) = watch::channel(View::default());
        let inner = Inner {
            session: Session::new(settings.max_lines),
            throttle: RenderThrottle::new(settings.render_interval),
            poller: None,
        };
        Self {
            shared: Arc::new(Shared {
                source,
                settings,
                inner: Mutex::new(inner),
                view,
            }),
        }
    }

    /// Start tailing `target`, replacing whatever session was running.
    ///
    /// Returns the new session generation.
    pub async fn start_session(&self, target: TailTarget) -> u64 {
        let mut inner = self.shared.inner.lock().await;
        if let Some(previous) = inner.poller.take() {
            previous.cancel();
        }

        let generation = inner.session.start(target.clone());
        inner.throttle.reset();
        let cancel = CancellationToken::new();
        inner.poller = Some(cancel.clone());
        self.shared.publish(&mut inner, true);
        drop(inner);

        tracing::info!(
            build = %target,
            endpoint = %target.endpoint,
            generation,
            poll_interval_ms = self.shared.settings.poll_interval.as_millis() as u64,
            "Tail session started"
        );
        tokio::spawn(run_poll_loop(
            Arc::downgrade(&self.shared),
            self.shared.settings.poll_interval,
            generation,
            cancel,
        ));
        generation
    }

    /// Stop the running session. Returns `false` when nothing was polling.
    pub async fn stop_session(&self) -> bool {
        let mut inner = self.shared.inner.lock().await;
        if !inner.session.stop() {
            return false;
        }
        if let Some(cancel) = inner.poller.take() {
            cancel.cancel();
        }
        self.shared.publish(&mut inner, true);
        tracing::info!(generation = inner.session.generation(), "Tail session stopped");
        true
    }

    /// Run one poll of the current session right away.
    ///
    /// Returns `None` when no poll was issued (not polling, or a poll is
    /// already in flight). The poll runs as its own task, so dropping this
    /// future does not abandon it half way.
    pub async fn poll(&self) -> Option<PollOutcome> {
        let shared = Arc::clone(&self.shared);
        let generation = shared.inner.lock().await.session.generation();
        tokio::spawn(async move { shared.poll_once(generation).await })
            .await
            .ok()
            .flatten()
    }

    /// Empty the buffer; the session keeps polling from its cursor.
    pub async fn clear_logs(&self) {
        let mut inner = self.shared.inner.lock().await;
        inner.session.clear_logs();
        self.shared.publish(&mut inner, true);
    }

    /// Receive every published [`View`].
    pub fn subscribe(&self) -> watch::Receiver<View> {
        self.shared.view.subscribe()
    }

    /// The last published view.
    pub fn view(&self) -> View {
        self.shared.view.borrow().clone()
    }

    pub async fn state(&self) -> SessionState {
        self.shared.inner.lock().await.session.state()
    }

    pub async fn offset(&self) -> Option<u64> {
        self.shared.inner.lock().await.session.offset()
    }

    /// Every retained line, including those outside the visible window.
    pub async fn buffered_lines(&self) -> Vec<String> {
        let inner = self.shared.inner.lock().await;
        inner.session.buffer().lines().map(str::to_owned).collect()
    }
}

impl Shared {
    /// Publish the current view. Unforced publishes go through the throttle.
    fn publish(&self, inner: &mut Inner, force: bool) {
        if !force {
            let now = tokio::time::Instant::now().into_std();
            if !inner.throttle.should_render(now) {
                return;
            }
        }
        self.view
            .send_replace(View::capture(&inner.session, self.settings.visible_lines));
    }

    async fn poll_once(self: &Arc<Self>, generation: u64) -> Option<PollOutcome> {
        let ticket = self.inner.lock().await.session.begin_poll(generation)?;

        // A panicking source surfaces as a `JoinError`; the ticket is still
        // applied so the in-flight mark is cleared.
        let source = Arc::clone(&self.source);
        let (target, offset) = (ticket.target.clone(), ticket.offset);
        let mut fetch = tokio::spawn(async move { source.fetch(&target, offset).await });

        let result = match tokio::time::timeout(self.settings.poll_timeout, &mut fetch).await {
            Ok(Ok(result)) => result,
            Ok(Err(err)) => {
                tracing::error!(build = %ticket.target, error = %err, "Log source task failed");
                Err(CoreError::Protocol(format!("log source failed: {err}")))
            }
            Err(_) => {
                fetch.abort();
                Err(CoreError::UpstreamUnavailable(format!(
                    "no response within {}s",
                    self.settings.poll_timeout.as_secs_f32()
                )))
            }
        };

        let mut inner = self.inner.lock().await;
        let outcome = inner.session.apply(&ticket, result);
        match &outcome {
            PollOutcome::Stale => {
                tracing::debug!(generation, "Discarding result of a replaced session");
            }
            PollOutcome::Appended { lines_dropped } => {
                if *lines_dropped > 0 {
                    tracing::trace!(lines_dropped, "Buffer truncated");
                }
                self.publish(&mut inner, false);
            }
            PollOutcome::Complete => {
                tracing::info!(build = %ticket.target, "Build log complete");
                if let Some(cancel) = inner.poller.take() {
                    cancel.cancel();
                }
                self.publish(&mut inner, true);
            }
            PollOutcome::Failed(err) => {
                tracing::warn!(build = %ticket.target, error = %err, "Poll failed, session stopped");
                if let Some(cancel) = inner.poller.take() {
                    cancel.cancel();
                }
                self.publish(&mut inner, true);
                if let Some(notice) = inner.session.error() {
                    self.schedule_dismiss(notice.id);
                }
            }
        }
        Some(outcome)
    }

    fn schedule_dismiss(self: &Arc<Self>, id: u64) {
        let shared = Arc::clone(self);
        let delay = self.settings.error_dismiss;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut inner = shared.inner.lock().await;
            if inner.session.dismiss_error(id) {
                shared.publish(&mut inner, true);
            }
        });
    }
}

async fn run_poll_loop(
    weak: Weak<Shared>,
    poll_interval: Duration,
    generation: u64,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!(generation, "Poll loop stopping");
                break;
            }
            _ = ticker.tick() => {
                let Some(shared) = weak.upgrade() else {
                    tracing::debug!(generation, "Tailer dropped, poll loop stopping");
                    break;
                };
                tokio::spawn(async move {
                    shared.poll_once(generation).await;
                });
            }
        }
    }
}
