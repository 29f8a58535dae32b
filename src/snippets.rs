//! Snippet domain: the track/snippet model and the controller that realizes
//! "play just this range" on top of the transport.

mod controller;
mod model;

pub use controller::{Boundary, SnippetController};
pub use model::{Snippet, SnippetError, SnippetId, Track, TrackId, ValidationError};
