use std::collections::HashMap;
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::{App, PromptKind, Screen};
use crate::config;
use crate::snippets::{Boundary, SnippetController, SnippetId, Track};
use crate::store::{Persister, SessionToken, StoreEvent, TrackDocument};
use crate::transport::Transport;
use crate::ui;

/// State tracked by the runtime event loop across iterations.
///
/// Exactly one of `transport` / `controller` is populated: the transport is
/// parked here while the picker is showing and moves into the controller
/// while a track is open.
pub struct EventLoopState {
    transport: Option<Transport>,
    controller: Option<SnippetController>,
    /// Persisted documents by track id, refreshed whenever a track closes,
    /// so reopening a track restores its snippets without rereading disk.
    docs: HashMap<String, TrackDocument>,
}

impl EventLoopState {
    pub fn new(transport: Transport, docs: HashMap<String, TrackDocument>) -> Self {
        Self {
            transport: Some(transport),
            controller: None,
            docs,
        }
    }
}

/// Main terminal event loop: drives the controller clock, handles input and
/// store events, and draws. Returns `Ok(())` when shutdown is requested.
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    app: &mut App,
    state: &mut EventLoopState,
    persister: &Persister,
    session: &SessionToken,
    store_events: &Receiver<StoreEvent>,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        // The controller's poll and auto-stop both run off this clock.
        if let Some(ctl) = state.controller.as_mut() {
            ctl.tick(Instant::now());
            app.clamp_snippet_selection(ctl.track().snippets.len());
        }

        while let Ok(ev) = store_events.try_recv() {
            match ev {
                StoreEvent::Saved { .. } => app.set_status("saved"),
                StoreEvent::Deleted { .. } => app.set_status("deleted"),
                StoreEvent::Failed { error, .. } => {
                    app.set_status(format!("save failed: {error}"))
                }
            }
        }

        terminal.draw(|f| {
            ui::draw(
                f,
                app,
                state.controller.as_ref(),
                &settings.ui,
                settings.transport.seek_seconds,
            )
        })?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key_event(key, settings, app, state, persister, session) {
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Dispatch one key press. Returns true when the app should quit.
fn handle_key_event(
    key: KeyEvent,
    settings: &config::Settings,
    app: &mut App,
    state: &mut EventLoopState,
    persister: &Persister,
    session: &SessionToken,
) -> bool {
    if app.is_prompting() {
        handle_prompt_key(key, app, state);
        return false;
    }

    match app.screen {
        Screen::Picker => handle_picker_key(key, app, state, settings, persister, session),
        Screen::Player => {
            handle_player_key(key, app, state, settings);
            false
        }
    }
}

fn handle_prompt_key(key: KeyEvent, app: &mut App, state: &mut EventLoopState) {
    match key.code {
        KeyCode::Esc => app.cancel_prompt(),
        KeyCode::Backspace => app.pop_prompt_char(),
        KeyCode::Enter => {
            let Some((kind, text)) = app.finish_prompt() else {
                return;
            };
            let Some(ctl) = state.controller.as_mut() else {
                return;
            };
            match kind {
                PromptKind::SnippetName => {
                    let Some((start, end)) = app.pending_range() else {
                        app.set_status("set both marks first ([ and ])");
                        return;
                    };
                    let name = if text.trim().is_empty() {
                        "snippet".to_string()
                    } else {
                        text
                    };
                    match ctl.add_snippet(start, end, &name) {
                        Ok(_) => {
                            app.clear_marks();
                            app.set_status(format!("snippet '{name}' added"));
                        }
                        Err(e) => app.set_status(e.to_string()),
                    }
                }
                PromptKind::TrackName => {
                    if !text.trim().is_empty() {
                        ctl.rename_track(text.trim());
                    }
                }
                PromptKind::Note(id) => ctl.edit_note(id, &text),
            }
        }
        KeyCode::Char(c) => {
            if !c.is_control() {
                app.push_prompt_char(c);
            }
        }
        _ => {}
    }
}

fn handle_picker_key(
    key: KeyEvent,
    app: &mut App,
    state: &mut EventLoopState,
    settings: &config::Settings,
    persister: &Persister,
    session: &SessionToken,
) -> bool {
    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('j') | KeyCode::Down => app.next_file(),
        KeyCode::Char('k') | KeyCode::Up => app.prev_file(),
        KeyCode::Enter => open_track(app, state, settings, persister, session),
        KeyCode::Char('x') => {
            if let Some(file) = app.picked_file() {
                let track_id = crate::snippets::TrackId::from_source(&file.uri()).to_hex();
                state.docs.remove(&track_id);
                persister.queue_delete(session, track_id);
                app.set_status("forgot saved snippets for this file");
            }
        }
        _ => {}
    }
    false
}

fn handle_player_key(
    key: KeyEvent,
    app: &mut App,
    state: &mut EventLoopState,
    settings: &config::Settings,
) {
    let Some(ctl) = state.controller.as_mut() else {
        return;
    };
    let now = Instant::now();
    let seek = settings.transport.seek_seconds;

    // Any key that is not another scrub step commits the scrub.
    if ctl.transport().is_scrubbing()
        && !matches!(key.code, KeyCode::Char('H') | KeyCode::Char('L'))
    {
        ctl.end_scrub(true, now);
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => close_track(app, state),

        KeyCode::Char(' ') => {
            if let Err(e) = ctl.toggle_playback(now) {
                app.set_status(e.to_string());
            }
        }
        KeyCode::Char('h') => ctl.seek_by(-(seek.min(i64::MAX as u64) as i64)),
        KeyCode::Char('l') => ctl.seek_by(seek.min(i64::MAX as u64) as i64),
        KeyCode::Char('H') => {
            if !ctl.transport().is_scrubbing() {
                ctl.begin_scrub();
            }
            let to = ctl
                .transport()
                .position()
                .saturating_sub(Duration::from_secs(seek));
            ctl.scrub_to(to);
        }
        KeyCode::Char('L') => {
            if !ctl.transport().is_scrubbing() {
                ctl.begin_scrub();
            }
            ctl.scrub_to(ctl.transport().position() + Duration::from_secs(seek));
        }

        KeyCode::Char('[') => {
            let at = ctl.transport().position();
            app.set_mark_start(at);
        }
        KeyCode::Char(']') => {
            let at = ctl.transport().position();
            app.set_mark_end(at);
        }
        KeyCode::Char('s') => {
            if app.pending_range().is_some() {
                app.begin_prompt(PromptKind::SnippetName, "");
            } else {
                app.set_status("set both marks first ([ and ])");
            }
        }

        KeyCode::Char('j') | KeyCode::Down => app.next_snippet(ctl.track().snippets.len()),
        KeyCode::Char('k') | KeyCode::Up => app.prev_snippet(ctl.track().snippets.len()),
        KeyCode::Enter => {
            if let Some(id) = selected_snippet_id(app, ctl) {
                if let Err(e) = ctl.toggle_snippet_playback(id, now) {
                    app.set_status(e.to_string());
                }
            }
        }
        KeyCode::Char('r') => {
            if let Some(id) = selected_snippet_id(app, ctl) {
                if let Err(e) = ctl.restart_snippet(id, now) {
                    app.set_status(e.to_string());
                }
            }
        }
        KeyCode::Char('d') => {
            if let Some(id) = selected_snippet_id(app, ctl) {
                ctl.delete_snippet(id);
                app.clamp_snippet_selection(ctl.track().snippets.len());
            }
        }
        KeyCode::Char(',') => {
            if let Some(id) = selected_snippet_id(app, ctl) {
                let at = ctl.transport().position();
                ctl.adjust_boundary(id, Boundary::Start, at);
            }
        }
        KeyCode::Char('.') => {
            if let Some(id) = selected_snippet_id(app, ctl) {
                let at = ctl.transport().position();
                ctl.adjust_boundary(id, Boundary::End, at);
            }
        }
        KeyCode::Char('e') => {
            if let Some(id) = selected_snippet_id(app, ctl) {
                let note = ctl
                    .track()
                    .snippet(id)
                    .map(|s| s.note.clone())
                    .unwrap_or_default();
                app.begin_prompt(PromptKind::Note(id), &note);
            }
        }
        KeyCode::Char('n') => {
            let name = ctl.track().name.clone();
            app.begin_prompt(PromptKind::TrackName, &name);
        }
        _ => {}
    }
}

fn selected_snippet_id(app: &App, ctl: &SnippetController) -> Option<SnippetId> {
    ctl.track().snippets.get(app.selected_snippet).map(|s| s.id)
}

/// Open the file under the picker cursor: restore its persisted snippets if
/// any, move the transport into a fresh controller and switch screens.
fn open_track(
    app: &mut App,
    state: &mut EventLoopState,
    settings: &config::Settings,
    persister: &Persister,
    session: &SessionToken,
) {
    let Some(file) = app.picked_file() else {
        return;
    };
    let uri = file.uri();
    let display = file.display.clone();

    let Some(transport) = state.transport.take() else {
        log::error!("transport missing while opening {uri}");
        return;
    };

    let track = match state.docs.remove(&crate::snippets::TrackId::from_source(&uri).to_hex()) {
        Some(doc) => doc.into_track(),
        None => Track::new(uri, display),
    };

    let mut ctl = SnippetController::new(
        track,
        transport,
        persister.clone(),
        session.clone(),
        Duration::from_millis(settings.snippets.boundary_epsilon_ms),
    );

    app.enter_player();
    // Snippets stay editable on a track whose audio is missing; playback
    // operations will keep reporting the error.
    if let Err(e) = ctl.ensure_loaded() {
        app.set_status(e.to_string());
    }
    state.controller = Some(ctl);
}

/// Leave the player: shut the controller down, cache the final document for
/// reopening and park the transport for the next track.
fn close_track(app: &mut App, state: &mut EventLoopState) {
    if let Some(ctl) = state.controller.take() {
        let (track, transport) = ctl.close();
        state
            .docs
            .insert(track.id.to_hex(), TrackDocument::from_track(&track));
        state.transport = Some(transport);
    }
    app.back_to_picker();
}
