//! Bounded in-memory line buffer and the visible-window projection.

use std::collections::VecDeque;

/// Default cap on retained lines.
pub const DEFAULT_MAX_LINES: usize = 3000;

/// Default size of the visible window.
pub const DEFAULT_VISIBLE_LINES: usize = 1000;

/// Ordered log lines with a hard cap. When the cap is exceeded the oldest
/// lines are dropped first; the relative order of the rest never changes.
#[derive(Debug, Clone)]
pub struct LogBuffer {
    lines: VecDeque<String>,
    max_lines: usize,
}

impl LogBuffer {
    pub fn new(max_lines: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            max_lines,
        }
    }

    /// Split `text` on `\n` and append every piece, then truncate.
    ///
    /// A trailing newline yields a trailing empty line, matching how the
    /// runner's chunks are stitched together on screen. Empty text is a
    /// no-op. Returns the number of lines dropped by truncation.
    pub fn append_text(&mut self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        self.lines.extend(text.split('\n').map(str::to_owned));
        self.truncate()
    }

    fn truncate(&mut self) -> usize {
        let excess = self.lines.len().saturating_sub(self.max_lines);
        self.lines.drain(..excess);
        excess
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn max_lines(&self) -> usize {
        self.max_lines
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINES)
    }
}

/// The last `n` lines of `buffer`, oldest first.
pub fn visible_window(buffer: &LogBuffer, n: usize) -> Vec<&str> {
    let skip = buffer.len().saturating_sub(n);
    buffer.lines().skip(skip).collect()
}

/// [`visible_window`] joined with newlines, ready to paint.
pub fn render_window(buffer: &LogBuffer, n: usize) -> String {
    visible_window(buffer, n).join("\n")
}
