use std::time::{Duration, Instant};

use super::source::{LoadError, PlaybackSource, SourceOpener};

/// Everything tied to one loaded source. Dropped as a unit on release, so a
/// stale poll can never observe a half-torn-down binding.
struct Loaded {
    uri: String,
    source: Box<dyn PlaybackSource>,
    duration: Duration,
    position: Duration,
    playing: bool,
    scrubbing: bool,
    resume_after_scrub: bool,
    next_poll: Option<Instant>,
}

/// The playback transport: at most one loaded source, explicit position and
/// scrub state, and a poll schedule evaluated by [`Transport::tick`].
///
/// `position` is the single source of truth other components read. It only
/// moves via `seek`, `scrub_to` and due poll ticks; while scrubbing, the
/// user's position wins and polls are suppressed.
pub struct Transport {
    opener: Box<dyn SourceOpener>,
    poll_interval: Duration,
    loaded: Option<Loaded>,
    generation: u64,
}

impl Transport {
    pub fn new(opener: Box<dyn SourceOpener>, poll_interval: Duration) -> Self {
        Self {
            opener,
            poll_interval,
            loaded: None,
            generation: 0,
        }
    }

    /// Bind a decoded source to `uri`, releasing any prior binding first
    /// (on the error path too, so a failed load never leaves the old handle
    /// half-alive).
    pub fn load(&mut self, uri: &str) -> Result<Duration, LoadError> {
        self.release();
        let source = self.opener.open(uri)?;
        let duration = source.duration();
        self.loaded = Some(Loaded {
            uri: uri.to_string(),
            source,
            duration,
            position: Duration::ZERO,
            playing: false,
            scrubbing: false,
            resume_after_scrub: false,
            next_poll: None,
        });
        log::debug!("transport: loaded {uri} ({}s)", duration.as_secs());
        Ok(duration)
    }

    /// Start (or resume) playback from the current position. No-op when
    /// already playing or when nothing is loaded.
    pub fn play(&mut self, now: Instant) {
        let interval = self.poll_interval;
        let Some(l) = self.loaded.as_mut() else {
            return;
        };
        if l.playing {
            return;
        }
        l.source.play();
        l.playing = true;
        l.next_poll = Some(now + interval);
    }

    /// Stop playback and keep the position. The poll schedule is cleared
    /// synchronously: no tick issued before this call can advance position
    /// afterwards.
    pub fn pause(&mut self) {
        let Some(l) = self.loaded.as_mut() else {
            return;
        };
        if !l.playing {
            return;
        }
        l.source.pause();
        l.playing = false;
        l.next_poll = None;
    }

    /// Jump to `offset`, clamped to `[0, duration]`. Playback, if active,
    /// continues from the new position.
    pub fn seek(&mut self, offset: Duration) {
        let Some(l) = self.loaded.as_mut() else {
            return;
        };
        let clamped = offset.min(l.duration);
        l.source.seek(clamped);
        l.position = clamped;
    }

    /// Seek relative to the current position; negative deltas clamp at zero,
    /// positive ones at the duration.
    pub fn seek_by(&mut self, delta_secs: i64) {
        let Some(l) = self.loaded.as_ref() else {
            return;
        };
        let target = if delta_secs < 0 {
            l.position
                .saturating_sub(Duration::from_secs(delta_secs.unsigned_abs()))
        } else {
            l.position + Duration::from_secs(delta_secs as u64)
        };
        self.seek(target);
    }

    /// Enter scrub mode: playback is paused under the user's finger and the
    /// poll stops overwriting `position` until `end_scrub`.
    pub fn begin_scrub(&mut self) {
        let Some(l) = self.loaded.as_mut() else {
            return;
        };
        if l.scrubbing {
            return;
        }
        l.scrubbing = true;
        l.resume_after_scrub = l.playing;
        if l.playing {
            l.source.pause();
            l.playing = false;
        }
        l.next_poll = None;
    }

    /// Move the scrub position. Only meaningful while scrubbing.
    pub fn scrub_to(&mut self, offset: Duration) {
        let Some(l) = self.loaded.as_mut() else {
            return;
        };
        if !l.scrubbing {
            return;
        }
        let clamped = offset.min(l.duration);
        l.source.seek(clamped);
        l.position = clamped;
    }

    /// Leave scrub mode. Playback resumes from the scrub-set position only
    /// when the caller asks for it and it was active when scrubbing began.
    pub fn end_scrub(&mut self, resume_if_was_playing: bool, now: Instant) {
        let interval = self.poll_interval;
        let Some(l) = self.loaded.as_mut() else {
            return;
        };
        if !l.scrubbing {
            return;
        }
        l.scrubbing = false;
        let resume = resume_if_was_playing && l.resume_after_scrub;
        l.resume_after_scrub = false;
        if resume {
            l.source.play();
            l.playing = true;
            l.next_poll = Some(now + interval);
        }
    }

    /// Sample the source's true position into `position` when a poll is due.
    /// Suppressed while paused or scrubbing.
    pub fn tick(&mut self, now: Instant) {
        let interval = self.poll_interval;
        let Some(l) = self.loaded.as_mut() else {
            return;
        };
        if !l.playing || l.scrubbing {
            return;
        }
        let Some(due) = l.next_poll else {
            return;
        };
        if now < due {
            return;
        }
        l.position = l.source.position().min(l.duration);
        l.next_poll = Some(now + interval);
    }

    /// Tear down the current binding: stop playback, clear the poll schedule
    /// and drop the source handle. Idempotent.
    pub fn release(&mut self) {
        if let Some(mut l) = self.loaded.take() {
            if l.playing {
                l.source.pause();
            }
            self.generation = self.generation.wrapping_add(1);
            log::debug!("transport: released {}", l.uri);
        }
    }

    /// Bumped on every release, so deadlines scheduled under an older
    /// binding can be recognized and dropped.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    pub fn loaded_uri(&self) -> Option<&str> {
        self.loaded.as_ref().map(|l| l.uri.as_str())
    }

    pub fn duration(&self) -> Option<Duration> {
        self.loaded.as_ref().map(|l| l.duration)
    }

    /// Current playback offset; zero when nothing is loaded.
    pub fn position(&self) -> Duration {
        self.loaded
            .as_ref()
            .map(|l| l.position)
            .unwrap_or(Duration::ZERO)
    }

    pub fn is_playing(&self) -> bool {
        self.loaded.as_ref().map(|l| l.playing).unwrap_or(false)
    }

    pub fn is_scrubbing(&self) -> bool {
        self.loaded.as_ref().map(|l| l.scrubbing).unwrap_or(false)
    }
}
