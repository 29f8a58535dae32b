//! File import: scanning a directory for audio files the picker can offer.
//!
//! Once a file is picked it becomes a track; all the controller ever needs
//! from here is a stable URI string and a display name.

mod model;
mod scan;

pub use model::AudioFile;
pub use scan::scan;

#[cfg(test)]
mod tests;
