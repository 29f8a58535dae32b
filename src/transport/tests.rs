use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use super::*;

const POLL: Duration = Duration::from_millis(100);

#[derive(Default)]
struct FakeState {
    playing: bool,
    position: Duration,
    seeks: Vec<Duration>,
}

/// Playback source with a hand-advanced position, shared with the test
/// through an `Rc` so it can be inspected after the box is handed over.
struct FakeSource {
    duration: Duration,
    state: Rc<RefCell<FakeState>>,
}

impl PlaybackSource for FakeSource {
    fn duration(&self) -> Duration {
        self.duration
    }
    fn play(&mut self) {
        self.state.borrow_mut().playing = true;
    }
    fn pause(&mut self) {
        self.state.borrow_mut().playing = false;
    }
    fn seek(&mut self, offset: Duration) {
        let mut s = self.state.borrow_mut();
        s.position = offset;
        s.seeks.push(offset);
    }
    fn position(&self) -> Duration {
        self.state.borrow().position
    }
}

struct FakeOpener {
    duration: Duration,
    state: Rc<RefCell<FakeState>>,
    fail: bool,
}

impl SourceOpener for FakeOpener {
    fn open(&self, uri: &str) -> Result<Box<dyn PlaybackSource>, LoadError> {
        if self.fail {
            return Err(LoadError::Unreadable {
                uri: uri.to_string(),
            });
        }
        Ok(Box::new(FakeSource {
            duration: self.duration,
            state: self.state.clone(),
        }))
    }
}

fn transport_secs(duration_secs: u64) -> (Transport, Rc<RefCell<FakeState>>) {
    let state = Rc::new(RefCell::new(FakeState::default()));
    let opener = FakeOpener {
        duration: Duration::from_secs(duration_secs),
        state: state.clone(),
        fail: false,
    };
    (Transport::new(Box::new(opener), POLL), state)
}

fn secs(s: u64) -> Duration {
    Duration::from_secs(s)
}

#[test]
fn load_reports_duration() {
    let (mut tr, _state) = transport_secs(200);
    assert_eq!(tr.load("a.mp3").unwrap(), secs(200));
    assert!(tr.is_loaded());
    assert_eq!(tr.loaded_uri(), Some("a.mp3"));
    assert_eq!(tr.duration(), Some(secs(200)));
}

#[test]
fn failed_load_is_unreadable_and_releases_prior_source() {
    let state = Rc::new(RefCell::new(FakeState::default()));
    let mut tr = Transport::new(
        Box::new(FakeOpener {
            duration: secs(10),
            state: state.clone(),
            fail: true,
        }),
        POLL,
    );
    assert!(matches!(
        tr.load("bad.mp3"),
        Err(LoadError::Unreadable { .. })
    ));
    assert!(!tr.is_loaded());
}

#[test]
fn play_without_load_is_noop() {
    let (mut tr, state) = transport_secs(10);
    tr.play(Instant::now());
    assert!(!tr.is_playing());
    assert!(!state.borrow().playing);
}

#[test]
fn play_twice_is_noop() {
    let (mut tr, state) = transport_secs(10);
    tr.load("a.mp3").unwrap();
    let t0 = Instant::now();
    tr.play(t0);
    tr.play(t0 + secs(1));
    assert!(tr.is_playing());
    assert!(state.borrow().playing);
}

#[test]
fn seek_clamps_to_duration() {
    let (mut tr, state) = transport_secs(200);
    tr.load("a.mp3").unwrap();
    tr.seek(secs(250));
    assert_eq!(tr.position(), secs(200));
    assert_eq!(state.borrow().seeks.last(), Some(&secs(200)));
}

#[test]
fn seek_by_clamps_at_zero() {
    let (mut tr, _state) = transport_secs(200);
    tr.load("a.mp3").unwrap();
    tr.seek_by(-5);
    assert_eq!(tr.position(), secs(0));
    tr.seek(secs(10));
    tr.seek_by(-5);
    assert_eq!(tr.position(), secs(5));
    tr.seek_by(1000);
    assert_eq!(tr.position(), secs(200));
}

#[test]
fn poll_samples_position_only_when_due() {
    let (mut tr, state) = transport_secs(200);
    tr.load("a.mp3").unwrap();
    let t0 = Instant::now();
    tr.play(t0);

    state.borrow_mut().position = secs(1);
    tr.tick(t0 + Duration::from_millis(50));
    assert_eq!(tr.position(), secs(0));

    tr.tick(t0 + Duration::from_millis(100));
    assert_eq!(tr.position(), secs(1));
}

#[test]
fn pause_stops_polling_immediately() {
    let (mut tr, state) = transport_secs(200);
    tr.load("a.mp3").unwrap();
    let t0 = Instant::now();
    tr.play(t0);
    tr.pause();
    assert!(!state.borrow().playing);

    // A tick scheduled before the pause must not move the position.
    state.borrow_mut().position = secs(5);
    tr.tick(t0 + POLL);
    assert_eq!(tr.position(), secs(0));
}

#[test]
fn scrub_suppresses_polls_and_user_position_wins() {
    let (mut tr, state) = transport_secs(200);
    tr.load("a.mp3").unwrap();
    let t0 = Instant::now();
    tr.play(t0);

    tr.begin_scrub();
    assert!(tr.is_scrubbing());
    assert!(!state.borrow().playing);

    tr.scrub_to(secs(30));
    assert_eq!(tr.position(), secs(30));

    state.borrow_mut().position = secs(99);
    tr.tick(t0 + POLL);
    assert_eq!(tr.position(), secs(30));
}

#[test]
fn end_scrub_resumes_only_if_it_was_playing() {
    let (mut tr, state) = transport_secs(200);
    tr.load("a.mp3").unwrap();
    let t0 = Instant::now();
    tr.play(t0);

    tr.begin_scrub();
    tr.scrub_to(secs(30));
    tr.end_scrub(true, t0 + secs(1));
    assert!(tr.is_playing());
    assert!(state.borrow().playing);
    assert_eq!(tr.position(), secs(30));

    // Paused before scrubbing: resume flag alone is not enough.
    tr.pause();
    tr.begin_scrub();
    tr.end_scrub(true, t0 + secs(2));
    assert!(!tr.is_playing());
}

#[test]
fn end_scrub_can_decline_resume() {
    let (mut tr, _state) = transport_secs(200);
    tr.load("a.mp3").unwrap();
    tr.play(Instant::now());
    tr.begin_scrub();
    tr.end_scrub(false, Instant::now());
    assert!(!tr.is_playing());
}

#[test]
fn release_is_idempotent_and_bumps_generation() {
    let (mut tr, state) = transport_secs(200);
    tr.load("a.mp3").unwrap();
    tr.play(Instant::now());
    let before = tr.generation();

    tr.release();
    assert!(!tr.is_loaded());
    assert!(!state.borrow().playing);
    assert_eq!(tr.generation(), before + 1);

    tr.release();
    assert_eq!(tr.generation(), before + 1);
}

#[test]
fn reload_bumps_generation() {
    let (mut tr, _state) = transport_secs(200);
    tr.load("a.mp3").unwrap();
    let before = tr.generation();
    tr.load("b.mp3").unwrap();
    assert_eq!(tr.generation(), before + 1);
    assert_eq!(tr.loaded_uri(), Some("b.mp3"));
    assert_eq!(tr.position(), Duration::ZERO);
}
