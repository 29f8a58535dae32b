//! Seams to the decode/playback capability.
//!
//! The transport only ever talks to the audio backend through these traits;
//! the rodio implementation lives in `rodio_backend`, tests plug in a fake
//! with a hand-advanced position.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    /// The file could not be opened or decoded.
    #[error("cannot open or decode audio source {uri}")]
    Unreadable { uri: String },
}

/// A decoded, playable audio source bound to one file.
pub trait PlaybackSource {
    /// Total length of the source, fixed at open time.
    fn duration(&self) -> Duration;
    /// Start or resume playback at the current position.
    fn play(&mut self);
    /// Stop playback, keeping the current position.
    fn pause(&mut self);
    /// Jump to `offset`. The caller clamps; implementations may assume
    /// `offset <= duration`.
    fn seek(&mut self, offset: Duration);
    /// The source's true playback position.
    fn position(&self) -> Duration;
}

/// Opens URIs into playable sources.
pub trait SourceOpener {
    fn open(&self, uri: &str) -> Result<Box<dyn PlaybackSource>, LoadError>;
}
