use std::path::PathBuf;
use std::time::Duration;

/// An importable audio file found on disk.
#[derive(Clone)]
pub struct AudioFile {
    pub path: PathBuf,
    pub display: String,
    pub duration: Option<Duration>,
}

impl AudioFile {
    /// The URI string a track created from this file is keyed by.
    pub fn uri(&self) -> String {
        self.path.display().to_string()
    }
}
