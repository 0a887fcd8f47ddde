//! Domain types for tailing a job runner's progressive console log.
//!
//! Everything here is synchronous and I/O free: the relay server and the
//! tailing client share the error taxonomy and the protocol signals, and
//! the client drives [`session::Session`] from its poll loop.

pub mod buffer;
pub mod error;
pub mod progressive;
pub mod session;
pub mod target;
pub mod throttle;
