use std::path::Path;
use std::time::Duration;

use lofty::file::{AudioFile as _, TaggedFileExt};
use lofty::tag::ItemKey;
use walkdir::WalkDir;

use crate::config::LibrarySettings;

use super::model::AudioFile;

pub(super) fn is_audio_file(path: &Path, settings: &LibrarySettings) -> bool {
    let exts: Vec<String> = settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Display name: tagged title when present, filename stem otherwise.
fn display_name(path: &Path) -> (String, Option<Duration>) {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("UNKNOWN")
        .to_string();

    match lofty::read_from_path(path) {
        Ok(tagged) => {
            let duration = Some(tagged.properties().duration());
            let title = tagged
                .primary_tag()
                .or_else(|| tagged.first_tag())
                .and_then(|tag| tag.get_string(&ItemKey::TrackTitle).map(str::trim).map(String::from))
                .filter(|t| !t.is_empty());
            (title.unwrap_or(stem), duration)
        }
        Err(_) => (stem, None),
    }
}

/// Walk `dir` for importable audio files, honoring the library settings.
pub fn scan(dir: &Path, settings: &LibrarySettings) -> Vec<AudioFile> {
    let mut files: Vec<AudioFile> = Vec::new();

    let mut walker = WalkDir::new(dir).follow_links(settings.follow_links);

    // Non-recursive = only the root directory.
    let depth_cap = if settings.recursive {
        settings.max_depth
    } else {
        Some(1)
    };
    if let Some(d) = depth_cap {
        walker = walker.max_depth(d);
    }

    for entry in walker
        .into_iter()
        .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
        .filter_map(Result::ok)
    {
        let path = entry.path();
        if path.is_file()
            && (settings.include_hidden || !is_hidden(path))
            && is_audio_file(path, settings)
        {
            let (display, duration) = display_name(path);
            files.push(AudioFile {
                path: path.to_path_buf(),
                display,
                duration,
            });
        }
    }

    files.sort_by(|a, b| a.display.to_lowercase().cmp(&b.display.to_lowercase()));
    files
}
