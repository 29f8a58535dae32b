//! Wire schema for persisted tracks.
//!
//! `{track_id, name, source_ref, snippets: [{id, start_secs, end_secs,
//! name, note, image_ref}]}`, offsets as seconds, runtime flags omitted.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::snippets::{Snippet, SnippetId, Track};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackDocument {
    pub track_id: String,
    pub name: String,
    pub source_ref: String,
    pub snippets: Vec<SnippetDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnippetDocument {
    pub id: u64,
    pub start_secs: f64,
    pub end_secs: f64,
    pub name: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub image_ref: Option<String>,
}

impl TrackDocument {
    pub fn from_track(track: &Track) -> Self {
        Self {
            track_id: track.id.to_hex(),
            name: track.name.clone(),
            source_ref: track.source.clone(),
            snippets: track
                .snippets
                .iter()
                .map(|s| SnippetDocument {
                    id: s.id.0,
                    start_secs: s.start.as_secs_f64(),
                    end_secs: s.end.as_secs_f64(),
                    name: s.name.clone(),
                    note: s.note.clone(),
                    image_ref: s.image_ref.clone(),
                })
                .collect(),
        }
    }

    /// Rebuild a track from a document. Snippets violating the range
    /// invariant (hand-edited files, older writers) are dropped with a
    /// warning rather than let into the controller.
    pub fn into_track(self) -> Track {
        let snippets = self
            .snippets
            .into_iter()
            .filter_map(|s| {
                if !s.start_secs.is_finite()
                    || !s.end_secs.is_finite()
                    || s.start_secs < 0.0
                    || s.start_secs >= s.end_secs
                {
                    log::warn!(
                        "dropping invalid persisted snippet {} ({} .. {})",
                        s.id,
                        s.start_secs,
                        s.end_secs
                    );
                    return None;
                }
                Some(Snippet {
                    id: SnippetId(s.id),
                    start: Duration::from_secs_f64(s.start_secs),
                    end: Duration::from_secs_f64(s.end_secs),
                    name: s.name,
                    note: s.note,
                    image_ref: s.image_ref,
                    is_playing: false,
                })
            })
            .collect();

        Track::from_parts(self.source_ref, self.name, snippets)
    }
}
