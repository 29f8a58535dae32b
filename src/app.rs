//! Application module: exposes the view-model used by the TUI and runtime.
//!
//! The `App` model lives in `app::model` and holds screen state, list
//! selections, pending range marks and the text-input prompt.

mod model;

pub use model::*;
