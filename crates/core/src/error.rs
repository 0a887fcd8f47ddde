/// Failure kinds shared by the relay and the tailing client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// A required request parameter is missing or malformed.
    #[error("{0}")]
    BadRequest(String),

    /// The job runner (or the relay) could not be reached: network error,
    /// DNS failure or an expired deadline.
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// A non-2xx status surfaced to the client.
    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    /// The control headers of a progressive-log response could not be decoded.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The server reported a next offset behind the one already consumed.
    #[error("Offset regressed from {current} to {reported}")]
    OffsetRegressed { current: u64, reported: u64 },
}
