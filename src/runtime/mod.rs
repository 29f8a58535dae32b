use std::collections::HashMap;
use std::env;
use std::path::Path;
use std::time::Duration;

use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::App;
use crate::config;
use crate::library::scan;
use crate::store::{JsonFileStore, SessionToken, StoreWriter, TrackDocument, TrackStore};
use crate::transport::{RodioOpener, Transport};

mod event_loop;
mod settings;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = settings::load_settings();

    let dir = env::args().nth(1).unwrap_or_else(|| {
        std::env::current_dir()
            .ok()
            .and_then(|p| p.to_str().map(|s| s.to_string()))
            .unwrap_or_else(|| "Music".to_string())
    });

    let files = scan(Path::new(&dir), &settings.library);

    let store_root = match settings.store.root.clone() {
        Some(root) => root,
        None => config::default_store_root()
            .ok_or("could not resolve a data directory for the snippet store")?,
    };
    let session = SessionToken::new(settings.store.user.clone());
    let store = JsonFileStore::new(store_root);

    // Documents loaded up front are the reopening cache; the writer thread
    // owns the store from here on.
    let mut docs: HashMap<String, TrackDocument> = HashMap::new();
    match store.load_all(&session) {
        Ok(loaded) => {
            for doc in loaded {
                docs.insert(doc.track_id.clone(), doc);
            }
        }
        Err(e) => log::warn!("could not load saved tracks: {e}"),
    }
    let (writer, persister, store_events) = StoreWriter::spawn(Box::new(store));

    let opener = RodioOpener::new()?;
    let transport = Transport::new(
        Box::new(opener),
        Duration::from_millis(settings.transport.poll_interval_ms),
    );

    let mut app = App::new(files);

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result: Result<(), Box<dyn std::error::Error>> = (|| {
        let mut state = event_loop::EventLoopState::new(transport, docs);
        event_loop::run(
            &mut terminal,
            &settings,
            &mut app,
            &mut state,
            &persister,
            &session,
            &store_events,
        )
    })();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    writer.shutdown();

    run_result
}
