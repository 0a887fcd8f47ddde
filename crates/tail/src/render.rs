//! Terminal painting of a [`View`].

use std::io::{self, Write};

use tailboard_core::session::{SessionState, StopReason};

use crate::tailer::View;

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Short label for the status line.
pub fn status_label(state: SessionState) -> &'static str {
    match state {
        SessionState::Idle => "idle",
        SessionState::Polling => "tailing",
        SessionState::Stopped(StopReason::Manual) => "stopped",
        SessionState::Stopped(StopReason::Complete) => "finished",
        SessionState::Stopped(StopReason::Error) => "failed",
    }
}

/// Repaint the whole screen: log window, then a status line and the error
/// message if one is showing.
pub fn paint(out: &mut impl Write, view: &View, title: &str) -> io::Result<()> {
    write!(out, "{CLEAR_SCREEN}")?;
    if !view.text.is_empty() {
        writeln!(out, "{}", view.text)?;
    }
    write!(out, "-- {title} [{}]", status_label(view.state))?;
    if let Some(offset) = view.offset {
        write!(out, " {offset} bytes")?;
    }
    writeln!(out)?;
    if let Some(error) = &view.error {
        writeln!(out, "!! {error}")?;
    }
    out.flush()
}
