//! Control signals of the progressive-log protocol.
//!
//! The job runner answers `logText/progressiveText?start=N` with the text
//! appended since byte `N` and two headers: `x-more-data` (the build is
//! still writing) and `x-text-size` (the offset to ask for next). The relay
//! forwards both untouched; the client decodes them into a
//! [`ProgressiveChunk`] so that "absent" and "false" are decided in one place.

use crate::error::CoreError;

/// Header carrying the "more data available" flag.
pub const HEADER_MORE_DATA: &str = "x-more-data";

/// Header carrying the next byte offset.
pub const HEADER_TEXT_SIZE: &str = "x-text-size";

/// One successful poll, decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressiveChunk {
    /// Raw text appended since the requested offset.
    pub text: String,
    /// Whether the upstream is still producing output.
    pub more_data: bool,
    /// Byte offset to request on the next poll.
    pub next_offset: u64,
}

impl ProgressiveChunk {
    /// Decode a chunk from the raw body and header values of a response.
    ///
    /// `more_data` is only true for a `true` value (any case); an absent
    /// header means the log is complete. A missing `x-text-size` falls back
    /// to `offset` plus the raw body length in bytes, an unparsable one is a
    /// protocol error. Invalid UTF-8 is replaced for display only; it never
    /// moves the cursor.
    pub fn from_headers(
        body: &[u8],
        offset: u64,
        more_data: Option<&str>,
        text_size: Option<&str>,
    ) -> Result<Self, CoreError> {
        let more_data = more_data
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let next_offset = match text_size {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                CoreError::Protocol(format!("invalid {HEADER_TEXT_SIZE} header: {raw:?}"))
            })?,
            None => offset.checked_add(body.len() as u64).ok_or_else(|| {
                CoreError::Protocol(format!(
                    "offset {offset} overflows after a {} byte chunk",
                    body.len()
                ))
            })?,
        };

        Ok(Self {
            text: String::from_utf8_lossy(body).into_owned(),
            more_data,
            next_offset,
        })
    }
}
