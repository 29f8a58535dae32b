use std::path::PathBuf;

use serde::Deserialize;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/ritaglio/config.toml` or
/// `~/.config/ritaglio/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `RITAGLIO__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub transport: TransportSettings,
    pub snippets: SnippetSettings,
    pub store: StoreSettings,
    pub library: LibrarySettings,
    pub ui: UiSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            transport: TransportSettings::default(),
            snippets: SnippetSettings::default(),
            store: StoreSettings::default(),
            library: LibrarySettings::default(),
            ui: UiSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TransportSettings {
    /// Interval of the position poll while playing (milliseconds).
    pub poll_interval_ms: u64,
    /// Number of seconds a relative seek jumps.
    pub seek_seconds: u64,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            seek_seconds: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SnippetSettings {
    /// How far the opposite boundary is nudged when a range edit would
    /// invert it (milliseconds).
    pub boundary_epsilon_ms: u64,
}

impl Default for SnippetSettings {
    fn default() -> Self {
        Self {
            boundary_epsilon_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Root directory of the document store. Defaults to
    /// `$XDG_DATA_HOME/ritaglio` (or `~/.local/share/ritaglio`).
    pub root: Option<PathBuf>,
    /// Account the documents are keyed by.
    pub user: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            root: None,
            user: "local".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// File extensions to treat as audio (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether to follow symlinks during scanning.
    pub follow_links: bool,
    /// Whether to include hidden files/directories (dotfiles).
    pub include_hidden: bool,
    /// Whether to recurse into subdirectories.
    pub recursive: bool,
    /// Optional cap on directory recursion depth.
    pub max_depth: Option<usize>,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            extensions: vec!["mp3".into(), "flac".into(), "wav".into(), "ogg".into()],
            follow_links: true,
            include_hidden: true,
            recursive: true,
            max_depth: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// The text rendered inside the top header box.
    pub header_text: String,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            header_text: " ~ ritaglio: mark it, keep it ~ ".to_string(),
        }
    }
}
