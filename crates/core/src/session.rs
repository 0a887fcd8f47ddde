//! Tail session state machine.
//!
//! ```text
//! Idle --start--> Polling --(more-data = false)--> Stopped(Complete)
//!                 Polling --(poll error)---------> Stopped(Error)
//!                 Polling --stop-----------------> Stopped(Manual)
//! Stopped(*) --start--> Polling   (buffer and cursor reset)
//! ```
//!
//! [`Session`] is plain data with no I/O. The async driver asks it for a
//! [`PollTicket`], performs the request, then hands the result back through
//! [`Session::apply`]. Each ticket carries the generation it was issued
//! under, so results that arrive after a stop or restart are discarded
//! instead of corrupting the new session.

use serde::Serialize;

use crate::buffer::LogBuffer;
use crate::error::CoreError;
use crate::progressive::ProgressiveChunk;
use crate::target::TailTarget;

/// Why a session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Manual,
    Complete,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Polling,
    Stopped(StopReason),
}

impl SessionState {
    pub fn is_polling(self) -> bool {
        matches!(self, SessionState::Polling)
    }
}

/// Byte position up to which the target's log has been consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailCursor {
    pub target: TailTarget,
    pub offset: u64,
}

impl TailCursor {
    pub fn new(target: TailTarget) -> Self {
        Self { target, offset: 0 }
    }

    /// Move to the server-reported next offset. The offset never goes
    /// backwards.
    pub fn advance(&mut self, next_offset: u64) -> Result<(), CoreError> {
        if next_offset < self.offset {
            return Err(CoreError::OffsetRegressed {
                current: self.offset,
                reported: next_offset,
            });
        }
        self.offset = next_offset;
        Ok(())
    }
}

/// Permission to run exactly one poll request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollTicket {
    pub generation: u64,
    pub target: TailTarget,
    pub offset: u64,
}

/// What [`Session::apply`] did with a poll result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The ticket belongs to a stopped or replaced session; nothing changed.
    Stale,
    /// Text appended, session still polling.
    Appended { lines_dropped: usize },
    /// The upstream reported no more data; session is `Stopped(Complete)`.
    Complete,
    /// The poll failed; session is `Stopped(Error)`.
    Failed(CoreError),
}

/// A user-visible error message, tagged so a delayed dismissal only clears
/// the message it was scheduled for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorNotice {
    pub id: u64,
    pub message: String,
}

#[derive(Debug)]
pub struct Session {
    generation: u64,
    state: SessionState,
    cursor: Option<TailCursor>,
    buffer: LogBuffer,
    in_flight: bool,
    error: Option<ErrorNotice>,
    next_error_id: u64,
}

impl Session {
    pub fn new(max_lines: usize) -> Self {
        Self {
            generation: 0,
            state: SessionState::Idle,
            cursor: None,
            buffer: LogBuffer::new(max_lines),
            in_flight: false,
            error: None,
            next_error_id: 0,
        }
    }

    /// Begin a new session on `target`, whatever the current state.
    ///
    /// Clears the buffer, the cursor and any displayed error, and returns
    /// the new generation.
    pub fn start(&mut self, target: TailTarget) -> u64 {
        self.generation += 1;
        self.state = SessionState::Polling;
        self.cursor = Some(TailCursor::new(target));
        self.buffer.clear();
        self.in_flight = false;
        self.error = None;
        self.generation
    }

    /// Stop a polling session. Returns `false` (and changes nothing) when
    /// no session is polling.
    pub fn stop(&mut self) -> bool {
        if !self.state.is_polling() {
            return false;
        }
        self.finish(StopReason::Manual);
        true
    }

    /// Issue a ticket for the next poll of `generation`.
    ///
    /// Returns `None` if the generation is stale, the session is not
    /// polling, or a previous poll has not been applied yet.
    pub fn begin_poll(&mut self, generation: u64) -> Option<PollTicket> {
        if generation != self.generation || !self.state.is_polling() || self.in_flight {
            return None;
        }
        let cursor = self.cursor.as_ref()?;
        self.in_flight = true;
        Some(PollTicket {
            generation,
            target: cursor.target.clone(),
            offset: cursor.offset,
        })
    }

    /// Fold the result of a poll into the session.
    pub fn apply(
        &mut self,
        ticket: &PollTicket,
        result: Result<ProgressiveChunk, CoreError>,
    ) -> PollOutcome {
        if ticket.generation != self.generation || !self.state.is_polling() {
            return PollOutcome::Stale;
        }
        self.in_flight = false;

        let chunk = match result {
            Ok(chunk) => chunk,
            Err(err) => return self.fail(err),
        };

        if let Some(cursor) = self.cursor.as_mut() {
            if let Err(err) = cursor.advance(chunk.next_offset) {
                return self.fail(err);
            }
        }

        let lines_dropped = self.buffer.append_text(&chunk.text);

        if chunk.more_data {
            PollOutcome::Appended { lines_dropped }
        } else {
            self.finish(StopReason::Complete);
            PollOutcome::Complete
        }
    }

    /// Clear the error message if it is still the one identified by `id`.
    pub fn dismiss_error(&mut self, id: u64) -> bool {
        if self.error.as_ref().is_some_and(|e| e.id == id) {
            self.error = None;
            return true;
        }
        false
    }

    /// Empty the buffer without touching the session state or cursor.
    pub fn clear_logs(&mut self) {
        self.buffer.clear();
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn cursor(&self) -> Option<&TailCursor> {
        self.cursor.as_ref()
    }

    pub fn offset(&self) -> Option<u64> {
        self.cursor.as_ref().map(|c| c.offset)
    }

    pub fn buffer(&self) -> &LogBuffer {
        &self.buffer
    }

    pub fn error(&self) -> Option<&ErrorNotice> {
        self.error.as_ref()
    }

    fn fail(&mut self, err: CoreError) -> PollOutcome {
        self.next_error_id += 1;
        self.error = Some(ErrorNotice {
            id: self.next_error_id,
            message: format!("Error fetching logs: {err}"),
        });
        self.finish(StopReason::Error);
        PollOutcome::Failed(err)
    }

    fn finish(&mut self, reason: StopReason) {
        self.state = SessionState::Stopped(reason);
        self.cursor = None;
        self.in_flight = false;
    }
}
