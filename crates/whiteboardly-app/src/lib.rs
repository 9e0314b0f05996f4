//! Whiteboardly Application
//!
//! Headless host that opens a whiteboard from storage, replays scripted
//! input through a session, saves it back and exports the rendered bitmap.

mod app;
mod cli;
mod script;

pub use app::{App, AppConfig, AppError, RunSummary};
pub use cli::CliArgs;
pub use script::{Script, ScriptStep};
