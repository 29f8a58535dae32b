//! rodio-backed implementation of the playback seams.
//!
//! Seeking rebuilds the sink with `Source::skip_duration` (works for common
//! formats); the reported position is accumulated play time plus the time
//! since the last unpause, since rodio does not expose one directly.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use lofty::file::AudioFile;
use rodio::mixer::Mixer;
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};

use super::source::{LoadError, PlaybackSource, SourceOpener};

pub struct RodioOpener {
    stream: OutputStream,
}

impl RodioOpener {
    pub fn new() -> Result<Self, rodio::StreamError> {
        let mut stream = OutputStreamBuilder::open_default_stream()?;
        // rodio logs to stderr when OutputStream is dropped. That's useful in
        // debugging, but noisy for a TUI app.
        stream.log_on_drop(false);
        Ok(Self { stream })
    }
}

impl SourceOpener for RodioOpener {
    fn open(&self, uri: &str) -> Result<Box<dyn PlaybackSource>, LoadError> {
        let unreadable = || LoadError::Unreadable {
            uri: uri.to_string(),
        };

        let path = PathBuf::from(uri);
        let duration = probe_duration(&path).ok_or_else(unreadable)?;
        let mixer = self.stream.mixer().clone();
        let sink = build_sink_at(&mixer, &path, Duration::ZERO).ok_or_else(unreadable)?;

        Ok(Box::new(RodioSource {
            mixer,
            path,
            duration,
            sink,
            accumulated: Duration::ZERO,
            started_at: None,
        }))
    }
}

/// The decoder's own duration is unreliable for some formats, so read it
/// from the file's properties instead.
fn probe_duration(path: &Path) -> Option<Duration> {
    lofty::read_from_path(path)
        .ok()
        .map(|tagged| tagged.properties().duration())
}

/// Create a paused `Sink` for `path` that starts playback at `start_at`.
fn build_sink_at(mixer: &Mixer, path: &Path, start_at: Duration) -> Option<Sink> {
    let file = File::open(path).ok()?;
    let source = Decoder::new(BufReader::new(file))
        .ok()?
        // `skip_duration` is our seeking primitive; even Duration::ZERO is fine.
        .skip_duration(start_at);

    let sink = Sink::connect_new(mixer);
    sink.append(source);
    sink.pause();
    Some(sink)
}

struct RodioSource {
    mixer: Mixer,
    path: PathBuf,
    duration: Duration,
    sink: Sink,
    // Accumulated play time before the current run, and when that run started.
    accumulated: Duration,
    started_at: Option<Instant>,
}

impl PlaybackSource for RodioSource {
    fn duration(&self) -> Duration {
        self.duration
    }

    fn play(&mut self) {
        self.sink.play();
        if self.started_at.is_none() {
            self.started_at = Some(Instant::now());
        }
    }

    fn pause(&mut self) {
        if let Some(started) = self.started_at.take() {
            self.accumulated += started.elapsed();
        }
        self.sink.pause();
    }

    fn seek(&mut self, offset: Duration) {
        let was_playing = self.started_at.is_some();
        self.sink.stop();

        match build_sink_at(&self.mixer, &self.path, offset) {
            Some(sink) => {
                self.sink = sink;
                self.accumulated = offset;
                if was_playing {
                    self.sink.play();
                    self.started_at = Some(Instant::now());
                } else {
                    self.started_at = None;
                }
            }
            None => {
                // The file decoded once already, so this is rare (file moved
                // or truncated mid-session). Keep the old position.
                log::error!("failed to rebuild sink for {:?}", self.path);
                self.started_at = None;
            }
        }
    }

    fn position(&self) -> Duration {
        self.accumulated + self.started_at.map_or(Duration::ZERO, |s| s.elapsed())
    }
}
