//! Client that tails a build's console log through the tailboard relay.
//!
//! [`tailer::Tailer`] drives a [`tailboard_core::session::Session`] from a
//! fixed-interval poll loop and publishes what should be painted; the
//! `tailboard-tail` binary renders that to a terminal.

pub mod config;
pub mod relay;
pub mod render;
pub mod source;
pub mod tailer;
