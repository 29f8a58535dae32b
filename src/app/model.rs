//! Application model types: `App`, `Screen` and the text-input prompt.
//!
//! The `App` struct holds the current screen, list selections, pending
//! range marks and status text used by the UI and runtime. Playback and
//! snippet state live in the controller; this is only what the terminal
//! needs to draw.

use std::time::Duration;

use crate::library::AudioFile;
use crate::snippets::SnippetId;

/// Which screen the terminal is showing.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Screen {
    Picker,
    Player,
}

impl Default for Screen {
    fn default() -> Self {
        Self::Picker
    }
}

/// What a text prompt is collecting input for.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PromptKind {
    SnippetName,
    TrackName,
    Note(SnippetId),
}

/// An in-progress line of text input shown at the bottom of the player.
pub struct Prompt {
    pub kind: PromptKind,
    pub buffer: String,
}

/// The main application model.
pub struct App {
    pub files: Vec<AudioFile>,
    pub selected_file: usize,

    pub screen: Screen,
    pub selected_snippet: usize,

    pub status: String,

    pub mark_start: Option<Duration>,
    pub mark_end: Option<Duration>,

    pub prompt: Option<Prompt>,
}

impl App {
    /// Create a new `App` offering the provided list of `files`.
    pub fn new(files: Vec<AudioFile>) -> Self {
        Self {
            files,
            selected_file: 0,
            screen: Screen::Picker,
            selected_snippet: 0,
            status: String::new(),
            mark_start: None,
            mark_end: None,
            prompt: None,
        }
    }

    /// Return true if the picker has any files to offer.
    pub fn has_files(&self) -> bool {
        !self.files.is_empty()
    }

    /// The file currently under the picker cursor, if any.
    pub fn picked_file(&self) -> Option<&AudioFile> {
        self.files.get(self.selected_file)
    }

    /// Move the picker cursor to the next file, wrapping around.
    pub fn next_file(&mut self) {
        if !self.files.is_empty() {
            self.selected_file = (self.selected_file + 1) % self.files.len();
        }
    }

    /// Move the picker cursor to the previous file, wrapping around.
    pub fn prev_file(&mut self) {
        if !self.files.is_empty() {
            self.selected_file = self
                .selected_file
                .checked_sub(1)
                .unwrap_or(self.files.len() - 1);
        }
    }

    /// Switch to the player screen with a fresh per-track UI state.
    pub fn enter_player(&mut self) {
        self.screen = Screen::Player;
        self.selected_snippet = 0;
        self.clear_marks();
        self.prompt = None;
    }

    /// Return to the picker, dropping all per-track UI state.
    pub fn back_to_picker(&mut self) {
        self.screen = Screen::Picker;
        self.selected_snippet = 0;
        self.clear_marks();
        self.prompt = None;
    }

    /// Move the snippet cursor down within a list of `count` snippets,
    /// wrapping around.
    pub fn next_snippet(&mut self, count: usize) {
        if count > 0 {
            self.selected_snippet = (self.selected_snippet + 1) % count;
        }
    }

    /// Move the snippet cursor up within a list of `count` snippets,
    /// wrapping around.
    pub fn prev_snippet(&mut self, count: usize) {
        if count > 0 {
            self.selected_snippet = self
                .selected_snippet
                .checked_sub(1)
                .unwrap_or(count - 1);
        }
    }

    /// Keep the snippet cursor inside a list that may have shrunk.
    pub fn clamp_snippet_selection(&mut self, count: usize) {
        if count == 0 {
            self.selected_snippet = 0;
        } else if self.selected_snippet >= count {
            self.selected_snippet = count - 1;
        }
    }

    /// Replace the status line text.
    pub fn set_status(&mut self, text: impl Into<String>) {
        self.status = text.into();
    }

    /// Record the pending snippet start mark.
    pub fn set_mark_start(&mut self, at: Duration) {
        self.mark_start = Some(at);
    }

    /// Record the pending snippet end mark.
    pub fn set_mark_end(&mut self, at: Duration) {
        self.mark_end = Some(at);
    }

    /// Drop both pending marks.
    pub fn clear_marks(&mut self) {
        self.mark_start = None;
        self.mark_end = None;
    }

    /// Both marks, when both are set. Range validity is the controller's call.
    pub fn pending_range(&self) -> Option<(Duration, Duration)> {
        Some((self.mark_start?, self.mark_end?))
    }

    /// Open a text prompt of the given kind, seeded with `initial` text.
    pub fn begin_prompt(&mut self, kind: PromptKind, initial: &str) {
        self.prompt = Some(Prompt {
            kind,
            buffer: initial.to_string(),
        });
    }

    /// Return true while a text prompt is capturing keystrokes.
    pub fn is_prompting(&self) -> bool {
        self.prompt.is_some()
    }

    /// Append a character to the open prompt, if any.
    pub fn push_prompt_char(&mut self, c: char) {
        if let Some(p) = self.prompt.as_mut() {
            p.buffer.push(c);
        }
    }

    /// Remove the last character from the open prompt, if any.
    pub fn pop_prompt_char(&mut self) {
        if let Some(p) = self.prompt.as_mut() {
            p.buffer.pop();
        }
    }

    /// Close the prompt without taking its text.
    pub fn cancel_prompt(&mut self) {
        self.prompt = None;
    }

    /// Close the prompt and hand back what it collected.
    pub fn finish_prompt(&mut self) -> Option<(PromptKind, String)> {
        self.prompt.take().map(|p| (p.kind, p.buffer))
    }
}
