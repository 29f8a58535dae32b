use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Stable identity for a track, derived from its source URI.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackId(blake3::Hash);

impl TrackId {
    pub fn from_source(uri: &str) -> Self {
        Self(blake3::hash(uri.as_bytes()))
    }

    pub fn to_hex(&self) -> String {
        self.0.to_hex().to_string()
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_hex())
    }
}

/// Identity of a snippet, unique within its track.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SnippetId(pub u64);

impl fmt::Display for SnippetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named time range within a track.
///
/// Valid snippets satisfy `0 <= start < end <= track duration`; the
/// controller refuses to create or persist one that doesn't. `is_playing`
/// is runtime state and never persisted.
#[derive(Debug, Clone)]
pub struct Snippet {
    pub id: SnippetId,
    pub start: Duration,
    pub end: Duration,
    pub name: String,
    pub note: String,
    pub image_ref: Option<String>,
    pub is_playing: bool,
}

/// One imported audio file plus its snippets, in insertion order.
#[derive(Debug, Clone)]
pub struct Track {
    pub id: TrackId,
    pub source: String,
    pub name: String,
    pub snippets: Vec<Snippet>,
    next_snippet_id: u64,
}

impl Track {
    pub fn new(source: impl Into<String>, name: impl Into<String>) -> Self {
        let source = source.into();
        Self {
            id: TrackId::from_source(&source),
            source,
            name: name.into(),
            snippets: Vec::new(),
            next_snippet_id: 1,
        }
    }

    /// Rebuild a track from persisted parts, resuming the id counter past
    /// the highest persisted snippet id.
    pub fn from_parts(source: String, name: String, snippets: Vec<Snippet>) -> Self {
        let next = snippets.iter().map(|s| s.id.0 + 1).max().unwrap_or(1);
        Self {
            id: TrackId::from_source(&source),
            source,
            name,
            snippets,
            next_snippet_id: next,
        }
    }

    pub fn snippet(&self, id: SnippetId) -> Option<&Snippet> {
        self.snippets.iter().find(|s| s.id == id)
    }

    pub(crate) fn snippet_mut(&mut self, id: SnippetId) -> Option<&mut Snippet> {
        self.snippets.iter_mut().find(|s| s.id == id)
    }

    pub(crate) fn allocate_snippet_id(&mut self) -> SnippetId {
        let id = SnippetId(self.next_snippet_id);
        self.next_snippet_id += 1;
        id
    }

    /// The snippet currently driving playback, if any.
    pub fn playing_snippet(&self) -> Option<&Snippet> {
        self.snippets.iter().find(|s| s.is_playing)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Empty or inverted range, or an end past the track's duration.
    #[error("snippet range is empty, inverted or past the end of the track")]
    InvalidRange,
}

#[derive(Debug, Error)]
pub enum SnippetError {
    #[error("no snippet with id {0}")]
    NotFound(SnippetId),

    #[error(transparent)]
    Load(#[from] crate::transport::LoadError),
}
