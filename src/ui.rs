//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`:
//! a file picker screen and a player screen with the snippet list.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Modifier, Style},
    widgets::{Block, Borders, List, ListItem, Padding, Paragraph, Wrap},
};
use std::time::Duration;

use crate::app::{App, PromptKind, Screen};
use crate::config::UiSettings;
use crate::snippets::SnippetController;

/// Render the picker controls help text.
fn picker_controls_text() -> String {
    "[j/k] up/down | [enter] open file | [x] forget saved snippets | [q] quit".to_string()
}

/// Render the player controls help text, incorporating seek seconds.
fn player_controls_text(seek_seconds: u64) -> String {
    format!(
        "[space] play/pause | [h/l] seek -/+{}s | [H/L] scrub | [[/]] mark start/end \
         | [s] save snippet | [j/k] snippet up/down | [enter] play/stop snippet | [r] restart \
         | [,/.] start/end to playhead | [e] edit note | [n] rename track | [d] delete \
         | [q/esc] back",
        seek_seconds
    )
}

/// Format a `Duration` as `MM:SS`.
fn format_mmss(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// One line of the snippet list: play marker, name, range, note hint.
fn snippet_line(s: &crate::snippets::Snippet) -> String {
    let marker = if s.is_playing { ">" } else { " " };
    let note = if s.note.trim().is_empty() { "" } else { " *" };
    format!(
        "{} {} [{} - {}]{}",
        marker,
        s.name,
        format_mmss(s.start),
        format_mmss(s.end),
        note
    )
}

fn bordered(title: &'static str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .padding(Padding {
            left: 1,
            right: 0,
            top: 0,
            bottom: 0,
        })
}

/// Render the entire UI into the provided `frame` using `app` state.
///
/// `controller` is present only while a track is open on the player screen.
pub fn draw(
    frame: &mut Frame,
    app: &App,
    controller: Option<&SnippetController>,
    ui_settings: &UiSettings,
    seek_seconds: u64,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Min(1),
            Constraint::Length(4),
        ])
        .split(frame.area());

    // Header
    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" ritaglio ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    // Status box
    let status = match (app.screen, controller) {
        (Screen::Player, Some(ctl)) => {
            let mut parts: Vec<String> = Vec::new();

            parts.push(format!("Track: {}", ctl.track().name));

            let position = format_mmss(ctl.transport().position());
            match ctl.transport().duration() {
                Some(total) => parts.push(format!("{} / {}", position, format_mmss(total))),
                None => parts.push(position),
            }
            parts.push(if ctl.transport().is_playing() {
                "Playing".to_string()
            } else {
                "Paused".to_string()
            });

            if let Some(start) = app.mark_start {
                parts.push(format!("Mark in: {}", format_mmss(start)));
            }
            if let Some(end) = app.mark_end {
                parts.push(format!("Mark out: {}", format_mmss(end)));
            }

            if !app.status.is_empty() {
                parts.push(app.status.clone());
            }
            parts.join(" • ")
        }
        _ => {
            let mut parts: Vec<String> = Vec::new();
            parts.push(format!("{} file(s)", app.files.len()));
            if !app.status.is_empty() {
                parts.push(app.status.clone());
            }
            parts.join(" • ")
        }
    };
    let status_par = Paragraph::new(status)
        .block(bordered(" status "))
        .wrap(Wrap { trim: true });
    frame.render_widget(status_par, chunks[1]);

    // Main list
    match (app.screen, controller) {
        (Screen::Player, Some(ctl)) => {
            let items: Vec<ListItem> = ctl
                .track()
                .snippets
                .iter()
                .map(|s| ListItem::new(snippet_line(s)))
                .collect();
            let empty = items.is_empty();

            let list = List::new(items)
                .block(bordered(" snippets "))
                .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
                .highlight_symbol("> ");
            let mut state = ratatui::widgets::ListState::default();
            if !empty {
                state.select(Some(app.selected_snippet));
            }
            frame.render_stateful_widget(list, chunks[2], &mut state);
        }
        _ => {
            let items: Vec<ListItem> = app
                .files
                .iter()
                .map(|file| match file.duration {
                    Some(d) => ListItem::new(format!("{} ({})", file.display, format_mmss(d))),
                    None => ListItem::new(file.display.clone()),
                })
                .collect();

            let list = List::new(items)
                .block(bordered(" files "))
                .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
                .highlight_symbol("> ");
            let mut state = ratatui::widgets::ListState::default();
            if app.has_files() {
                state.select(Some(app.selected_file));
            }
            frame.render_stateful_widget(list, chunks[2], &mut state);
        }
    }

    // Footer: an open prompt replaces the controls help.
    let footer_text = match app.prompt.as_ref() {
        Some(p) => {
            let label = match p.kind {
                PromptKind::SnippetName => "snippet name",
                PromptKind::TrackName => "track name",
                PromptKind::Note(_) => "note",
            };
            format!("{}: {}_ (enter accepts, esc cancels)", label, p.buffer)
        }
        None => match app.screen {
            Screen::Picker => picker_controls_text(),
            Screen::Player => player_controls_text(seek_seconds),
        },
    };
    let footer = Paragraph::new(footer_text)
        .block(bordered(" controls "))
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[3]);
}
