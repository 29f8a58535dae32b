//! Audio transport: owns the decoded source and the play/pause/seek/scrub
//! state machine, plus the periodic position poll.
//!
//! The transport is cooperative: it never spawns timers. Polling is a due
//! instant checked by [`Transport::tick`], which the runtime loop drives with
//! the real clock and tests drive with a simulated one.

mod engine;
mod rodio_backend;
mod source;

pub use engine::Transport;
pub use rodio_backend::RodioOpener;
pub use source::{LoadError, PlaybackSource, SourceOpener};

#[cfg(test)]
mod tests;
