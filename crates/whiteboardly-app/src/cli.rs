//! Command-line arguments.

use clap::{CommandFactory, FromArgMatches, Parser};
use std::path::PathBuf;
use whiteboardly_core::{ShortcutRegistry, ToolKind};

#[derive(Parser, Debug, Default)]
#[command(
    name = "whiteboardly",
    about = "Replay whiteboard input against a saved board",
    long_about = "Open a whiteboard from local storage (blank if it has no saved content),\n\
                  replay a JSON script of pointer, key and tool steps, save the result\n\
                  with a thumbnail, and optionally export the rendered surface as PNG."
)]
pub struct CliArgs {
    /// Whiteboard ID. A new whiteboard is created when omitted.
    #[arg(short, long, value_name = "ID")]
    pub board: Option<String>,

    /// Name for a new whiteboard, or new name for an existing one.
    #[arg(short, long, value_name = "NAME")]
    pub name: Option<String>,

    /// List saved whiteboards, newest first, and exit.
    #[arg(short, long)]
    pub list: bool,

    /// JSON script of steps to replay.
    #[arg(short, long, value_name = "SCRIPT.json")]
    pub script: Option<PathBuf>,

    /// Write the rendered surface to this PNG file.
    #[arg(short, long, value_name = "FILE.png")]
    pub export: Option<PathBuf>,

    /// Directory holding saved whiteboards.
    #[arg(long, value_name = "DIR")]
    pub storage_dir: Option<PathBuf>,

    /// Directory for the local fallback copy of every save.
    #[arg(long, value_name = "DIR")]
    pub fallback_dir: Option<PathBuf>,

    /// Engine configuration (JSON).
    #[arg(short, long, value_name = "CONFIG.json")]
    pub config: Option<PathBuf>,
}

impl CliArgs {
    /// The clap command with the tool and shortcut reference appended to `--help`.
    pub fn command_with_reference() -> clap::Command {
        Self::command().after_long_help(reference())
    }

    /// Parse the process arguments, exiting on `--help` or bad input.
    pub fn parse_with_reference() -> Self {
        let matches = Self::command_with_reference().get_matches();
        Self::from_arg_matches(&matches).unwrap_or_else(|e| e.exit())
    }
}

/// Script tool names and keyboard shortcuts.
fn reference() -> String {
    let names = |filter: fn(&ToolKind) -> bool| {
        ToolKind::ALL
            .iter()
            .filter(|t| filter(*t))
            .map(|t| t.name())
            .collect::<Vec<_>>()
            .join(", ")
    };

    let mut out = String::from("Tools:\n");
    out.push_str(&format!("  freehand: {}\n", names(|t| t.is_freehand())));
    out.push_str(&format!("  shapes:   {}\n", names(|t| t.is_shape())));
    out.push_str(&format!("  other:    {}\n", names(|t| !t.is_freehand() && !t.is_shape())));
    out.push_str("\nShortcuts:\n");
    for shortcut in ShortcutRegistry::all() {
        out.push_str(&format!("  {:<8} {}\n", shortcut.format(), shortcut.description));
    }
    out
}
