mod app;
mod config;
mod library;
mod runtime;
mod snippets;
mod store;
mod transport;
mod ui;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    runtime::run()
}
