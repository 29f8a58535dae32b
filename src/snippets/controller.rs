use std::time::{Duration, Instant};

use crate::store::{Persister, SessionToken, TrackDocument};
use crate::transport::Transport;

use super::model::{Snippet, SnippetError, SnippetId, Track, ValidationError};

/// Which end of a snippet's range a boundary edit targets.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Boundary {
    Start,
    End,
}

/// One-shot auto-stop, armed when a snippet starts playing.
///
/// The (snippet, generation) pair is the cancellation token: a deadline that
/// outlives its snippet or its transport binding is dropped, never fired.
#[derive(Debug, Copy, Clone)]
struct StopDeadline {
    snippet: SnippetId,
    fire_at: Instant,
    generation: u64,
}

/// Owns a track's snippet list and drives the transport to realize
/// "play just this range" semantics.
///
/// All mutation happens on the caller's thread; the only timers are the
/// transport poll and the [`StopDeadline`], both plain due-instants checked
/// by [`SnippetController::tick`]. Cancelling is clearing the field, done
/// synchronously inside whichever operation supersedes the deadline, so a
/// user pause/seek/delete always wins over an in-flight timer.
pub struct SnippetController {
    track: Track,
    transport: Transport,
    persister: Persister,
    session: SessionToken,
    epsilon: Duration,
    armed: Option<StopDeadline>,
}

impl SnippetController {
    pub fn new(
        track: Track,
        transport: Transport,
        persister: Persister,
        session: SessionToken,
        epsilon: Duration,
    ) -> Self {
        Self {
            track,
            transport,
            persister,
            session,
            epsilon,
            armed: None,
        }
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Add a snippet covering `[start, end)`. Insertion order is kept.
    /// The list is untouched on failure.
    pub fn add_snippet(
        &mut self,
        start: Duration,
        end: Duration,
        name: &str,
    ) -> Result<SnippetId, ValidationError> {
        if start >= end {
            return Err(ValidationError::InvalidRange);
        }
        if let Some(duration) = self.transport.duration() {
            if end > duration {
                return Err(ValidationError::InvalidRange);
            }
        }

        let id = self.track.allocate_snippet_id();
        self.track.snippets.push(Snippet {
            id,
            start,
            end,
            name: name.to_string(),
            note: String::new(),
            image_ref: None,
            is_playing: false,
        });
        self.persist();
        Ok(id)
    }

    /// Remove a snippet. If it is driving playback, the transport is paused
    /// and its deadline disarmed before the removal. Unknown ids are a
    /// logged no-op.
    pub fn delete_snippet(&mut self, id: SnippetId) {
        let Some(pos) = self.track.snippets.iter().position(|s| s.id == id) else {
            log::warn!("delete for unknown snippet {id}");
            return;
        };

        if self.track.snippets[pos].is_playing {
            self.transport.pause();
        }
        if self.armed.is_some_and(|d| d.snippet == id) {
            self.armed = None;
        }
        self.track.snippets.remove(pos);
        self.persist();
    }

    pub fn rename_track(&mut self, name: &str) {
        self.track.name = name.to_string();
        self.persist();
    }

    pub fn edit_note(&mut self, id: SnippetId, text: &str) {
        let Some(s) = self.track.snippet_mut(id) else {
            log::warn!("note edit for unknown snippet {id}");
            return;
        };
        s.note = text.to_string();
        self.persist();
    }

    pub fn set_image(&mut self, id: SnippetId, image_ref: Option<String>) {
        let Some(s) = self.track.snippet_mut(id) else {
            log::warn!("image edit for unknown snippet {id}");
            return;
        };
        s.image_ref = image_ref;
        self.persist();
    }

    /// Play exactly this snippet's range: seek to its start when the current
    /// position is outside it, make it the sole playing snippet, start the
    /// transport and arm the auto-stop at `end - current position` (not the
    /// range length, so resuming mid-range still stops on time).
    pub fn play_snippet_range(&mut self, id: SnippetId, now: Instant) -> Result<(), SnippetError> {
        let (start, end) = self.resolve_range(id)?;

        // Arming below replaces any previous deadline; clear it first so a
        // failed load doesn't leave a stale one armed.
        self.armed = None;
        self.ensure_loaded()?;

        let position = self.transport.position();
        if position < start || position > end {
            self.transport.seek(start);
        }
        self.begin_range(id, end, now);
        Ok(())
    }

    /// Toggle: pause and clear when the snippet is the one playing (no
    /// rescheduling), otherwise behave as [`Self::play_snippet_range`].
    pub fn toggle_snippet_playback(
        &mut self,
        id: SnippetId,
        now: Instant,
    ) -> Result<(), SnippetError> {
        let playing = self
            .track
            .snippet(id)
            .ok_or(SnippetError::NotFound(id))?
            .is_playing;

        if playing {
            self.transport.pause();
            self.armed = None;
            self.set_sole_playing(None);
            Ok(())
        } else {
            self.play_snippet_range(id, now)
        }
    }

    /// Restart always starts over: unconditional seek to the snippet's start,
    /// then play. Never gated on current player state.
    pub fn restart_snippet(&mut self, id: SnippetId, now: Instant) -> Result<(), SnippetError> {
        let (start, end) = self.resolve_range(id)?;

        self.armed = None;
        self.ensure_loaded()?;
        self.transport.seek(start);
        self.begin_range(id, end, now);
        Ok(())
    }

    /// Move one boundary of a snippet. An edit that would invert the range
    /// nudges the other boundary by the configured epsilon instead of
    /// failing, mirroring how range sliders behave.
    pub fn adjust_boundary(&mut self, id: SnippetId, which: Boundary, value: Duration) {
        let duration = self.transport.duration();
        let epsilon = self.epsilon;
        let clamp = |d: Duration| duration.map(|max| d.min(max)).unwrap_or(d);

        let Some(s) = self.track.snippet_mut(id) else {
            log::warn!("boundary edit for unknown snippet {id}");
            return;
        };

        match which {
            Boundary::Start => {
                s.start = clamp(value);
                if s.start >= s.end {
                    s.end = clamp(s.start + epsilon);
                    if s.end <= s.start {
                        // Start was pushed to the very end of the track.
                        s.start = s.end.saturating_sub(epsilon);
                    }
                }
            }
            Boundary::End => {
                s.end = clamp(value);
                if s.end <= s.start {
                    s.start = s.end.saturating_sub(epsilon);
                    if s.end <= s.start {
                        // End was dragged to zero.
                        s.end = clamp(epsilon);
                    }
                }
            }
        }
        self.persist();
    }

    /// Whole-track play/pause. Pausing supersedes any armed deadline; playing
    /// plain (outside a snippet) never arms one.
    pub fn toggle_playback(&mut self, now: Instant) -> Result<(), SnippetError> {
        if self.transport.is_playing() {
            self.transport.pause();
            self.armed = None;
            self.set_sole_playing(None);
        } else {
            self.ensure_loaded()?;
            self.transport.play(now);
        }
        Ok(())
    }

    /// Manual seek supersedes an active snippet session: the deadline is
    /// disarmed and playing flags cleared before the transport moves.
    pub fn seek_by(&mut self, delta_secs: i64) {
        if self.armed.is_some() {
            self.armed = None;
            self.set_sole_playing(None);
        }
        self.transport.seek_by(delta_secs);
    }

    /// The user taking manual control of the position cancels any snippet
    /// session the same way a seek does.
    pub fn begin_scrub(&mut self) {
        if self.armed.is_some() {
            self.armed = None;
            self.set_sole_playing(None);
        }
        self.transport.begin_scrub();
    }

    pub fn scrub_to(&mut self, offset: Duration) {
        self.transport.scrub_to(offset);
    }

    pub fn end_scrub(&mut self, resume_if_was_playing: bool, now: Instant) {
        self.transport.end_scrub(resume_if_was_playing, now);
    }

    /// Drive the transport poll, then fire the auto-stop if it is due and
    /// still belongs to the current binding and the still-playing snippet.
    /// A stale deadline is a no-op, never an error.
    pub fn tick(&mut self, now: Instant) {
        self.transport.tick(now);

        let Some(deadline) = self.armed else {
            return;
        };
        if now < deadline.fire_at {
            return;
        }
        self.armed = None;

        if deadline.generation != self.transport.generation() {
            log::debug!("dropping auto-stop from a previous transport binding");
            return;
        }
        let still_active = self
            .track
            .snippet(deadline.snippet)
            .is_some_and(|s| s.is_playing);
        if !still_active {
            return;
        }

        self.transport.pause();
        self.set_sole_playing(None);
        log::debug!("auto-stop fired for snippet {}", deadline.snippet);
    }

    /// Leave the player: disarm, clear flags, release the transport and
    /// queue a final persist. Safe to call repeatedly.
    pub fn deactivate(&mut self) {
        self.armed = None;
        self.transport.pause();
        self.set_sole_playing(None);
        self.transport.release();
        self.persist();
    }

    /// Deactivate and hand the track and transport back to the caller, for
    /// reuse with the next track.
    pub fn close(mut self) -> (Track, Transport) {
        self.deactivate();
        (self.track, self.transport)
    }

    /// Lazily load this track's source into the transport.
    pub fn ensure_loaded(&mut self) -> Result<(), SnippetError> {
        if self.transport.is_loaded() {
            return Ok(());
        }
        self.transport.load(&self.track.source)?;
        Ok(())
    }

    fn resolve_range(&self, id: SnippetId) -> Result<(Duration, Duration), SnippetError> {
        let s = self.track.snippet(id).ok_or(SnippetError::NotFound(id))?;
        Ok((s.start, s.end))
    }

    /// Shared tail of play/restart: mutual exclusion of playing flags, start
    /// the transport, arm the deadline for the remaining range.
    fn begin_range(&mut self, id: SnippetId, end: Duration, now: Instant) {
        self.set_sole_playing(Some(id));
        self.transport.play(now);

        let remaining = end.saturating_sub(self.transport.position());
        self.armed = Some(StopDeadline {
            snippet: id,
            fire_at: now + remaining,
            generation: self.transport.generation(),
        });
    }

    /// At most one snippet is ever playing: setting one clears all others.
    fn set_sole_playing(&mut self, id: Option<SnippetId>) {
        for s in &mut self.track.snippets {
            s.is_playing = Some(s.id) == id;
        }
    }

    /// Queue an asynchronous save of the current track state. Local state is
    /// authoritative; a store failure is surfaced elsewhere and never rolls
    /// this back.
    fn persist(&self) {
        self.persister
            .queue_save(&self.session, TrackDocument::from_track(&self.track));
    }
}
