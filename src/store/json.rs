//! Filesystem-backed document store: one JSON file per track under
//! `<root>/<user>/<track_id>.json`.

use std::fs;
use std::path::{Path, PathBuf};

use super::document::TrackDocument;
use super::session::SessionToken;
use super::{StoreError, TrackStore};

pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn user_dir(&self, session: &SessionToken) -> PathBuf {
        // Keep user ids path-safe; store keys are not trusted filenames.
        let safe: String = session
            .user()
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' { c } else { '_' })
            .collect();
        self.root.join(safe)
    }

    fn doc_path(&self, session: &SessionToken, track_id: &str) -> PathBuf {
        self.user_dir(session).join(format!("{track_id}.json"))
    }
}

impl TrackStore for JsonFileStore {
    fn save(&self, session: &SessionToken, doc: &TrackDocument) -> Result<(), StoreError> {
        let dir = self.user_dir(session);
        fs::create_dir_all(&dir)?;

        // Write-then-rename so a crash mid-write never truncates a document.
        let path = self.doc_path(session, &doc.track_id);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(doc)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn delete(&self, session: &SessionToken, track_id: &str) -> Result<(), StoreError> {
        let path = self.doc_path(session, track_id);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn load_all(&self, session: &SessionToken) -> Result<Vec<TrackDocument>, StoreError> {
        let dir = self.user_dir(session);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut docs = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match read_doc(&path) {
                Ok(doc) => docs.push(doc),
                // A single corrupt document should not take down the whole
                // account; skip it and keep loading.
                Err(e) => log::warn!("skipping unreadable document {:?}: {e}", path),
            }
        }
        docs.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(docs)
    }
}

fn read_doc(path: &Path) -> Result<TrackDocument, StoreError> {
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}
