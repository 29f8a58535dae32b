//! Background writer: serializes store writes off the UI thread.
//!
//! Saves are fire-and-forget for the caller. The writer drains its queue
//! before each write and keeps only the newest command per track, so at most
//! one write per track is ever in flight and a newer mutation supersedes a
//! pending one instead of racing it. Outcomes come back as [`StoreEvent`]s
//! on a channel the runtime loop polls; the worker never mutates app state.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;
use std::thread::{self, JoinHandle};

use super::document::TrackDocument;
use super::session::SessionToken;
use super::TrackStore;

#[derive(Debug)]
pub enum StoreEvent {
    Saved { track_id: String },
    Deleted { track_id: String },
    Failed { track_id: String, error: String },
}

pub(crate) enum WriteCmd {
    Save {
        session: SessionToken,
        doc: TrackDocument,
    },
    Delete {
        session: SessionToken,
        track_id: String,
    },
    Quit,
}

/// Reduce a drained batch to the newest command per user+track. Returns the
/// surviving commands in arrival order of their last occurrence, and whether
/// a quit was seen.
pub(crate) fn coalesce(batch: Vec<WriteCmd>) -> (Vec<WriteCmd>, bool) {
    let mut quit = false;
    let mut latest: Vec<WriteCmd> = Vec::new();
    for cmd in batch {
        match cmd.key() {
            Some(key) => {
                latest.retain(|c| c.key().as_ref() != Some(&key));
                latest.push(cmd);
            }
            None => quit = true,
        }
    }
    (latest, quit)
}

impl WriteCmd {
    /// Coalescing key: a later save or delete for the same user+track
    /// replaces anything still queued for it.
    fn key(&self) -> Option<(String, String)> {
        match self {
            WriteCmd::Save { session, doc } => {
                Some((session.user().to_string(), doc.track_id.clone()))
            }
            WriteCmd::Delete { session, track_id } => {
                Some((session.user().to_string(), track_id.clone()))
            }
            WriteCmd::Quit => None,
        }
    }
}

/// Cheap handle for queueing writes; cloned into whoever mutates tracks.
#[derive(Clone)]
pub struct Persister {
    tx: Sender<WriteCmd>,
}

impl Persister {
    pub fn queue_save(&self, session: &SessionToken, doc: TrackDocument) {
        let _ = self.tx.send(WriteCmd::Save {
            session: session.clone(),
            doc,
        });
    }

    pub fn queue_delete(&self, session: &SessionToken, track_id: String) {
        let _ = self.tx.send(WriteCmd::Delete {
            session: session.clone(),
            track_id,
        });
    }
}

#[cfg(test)]
impl Persister {
    /// Queue handle whose writes go nowhere.
    pub(crate) fn discard() -> Self {
        let (tx, _rx) = mpsc::channel();
        Self { tx }
    }
}

/// Owns the writer thread; kept by the runtime for shutdown.
pub struct StoreWriter {
    tx: Sender<WriteCmd>,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl StoreWriter {
    /// Spawn the writer around `store`. Returns the writer, a queue handle
    /// and the event channel for the runtime loop.
    pub fn spawn(store: Box<dyn TrackStore>) -> (Self, Persister, Receiver<StoreEvent>) {
        let (tx, rx) = mpsc::channel::<WriteCmd>();
        let (event_tx, event_rx) = mpsc::channel::<StoreEvent>();

        let join = thread::spawn(move || writer_loop(store, rx, event_tx));

        let writer = Self {
            tx: tx.clone(),
            join: Mutex::new(Some(join)),
        };
        (writer, Persister { tx }, event_rx)
    }

    /// Flush pending writes and stop the thread.
    pub fn shutdown(&self) {
        let _ = self.tx.send(WriteCmd::Quit);
        if let Ok(mut j) = self.join.lock() {
            if let Some(h) = j.take() {
                let _ = h.join();
            }
        }
    }
}

fn writer_loop(store: Box<dyn TrackStore>, rx: Receiver<WriteCmd>, events: Sender<StoreEvent>) {
    let mut quit = false;
    while !quit {
        let first = match rx.recv() {
            Ok(cmd) => cmd,
            Err(_) => break,
        };

        // Drain whatever queued up while the last write ran, keeping only
        // the newest command per track.
        let mut batch: Vec<WriteCmd> = vec![first];
        while let Ok(next) = rx.try_recv() {
            batch.push(next);
        }

        let (latest, saw_quit) = coalesce(batch);
        quit = saw_quit;

        for cmd in latest {
            run_cmd(store.as_ref(), cmd, &events);
        }
    }
}

fn run_cmd(store: &dyn TrackStore, cmd: WriteCmd, events: &Sender<StoreEvent>) {
    let event = match cmd {
        WriteCmd::Save { session, doc } => {
            let track_id = doc.track_id.clone();
            match store.save(&session, &doc) {
                Ok(()) => StoreEvent::Saved { track_id },
                Err(e) => {
                    log::warn!("save failed for track {track_id}: {e}");
                    StoreEvent::Failed {
                        track_id,
                        error: e.to_string(),
                    }
                }
            }
        }
        WriteCmd::Delete { session, track_id } => match store.delete(&session, &track_id) {
            Ok(()) => StoreEvent::Deleted { track_id },
            Err(e) => {
                log::warn!("delete failed for track {track_id}: {e}");
                StoreEvent::Failed {
                    track_id,
                    error: e.to_string(),
                }
            }
        },
        WriteCmd::Quit => return,
    };
    let _ = events.send(event);
}
