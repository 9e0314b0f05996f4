//! Scripted input replay.

use serde::{Deserialize, Serialize};
use whiteboardly_core::{EngineResult, KeyEvent, PointerEvent, ToolKind, WhiteboardSession};

/// One step of a replay script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScriptStep {
    Pointer { event: PointerEvent },
    Key { event: KeyEvent },
    Tool { tool: ToolKind },
    Color { hex: String },
    Thickness { value: f64 },
    Undo,
    Redo,
    Clear,
    Resize { width: u32, height: u32 },
    ResetView,
    /// Same as pressing Ctrl+S.
    Save,
}

impl ScriptStep {
    /// Apply this step to a session.
    pub fn apply(&self, session: &mut WhiteboardSession) -> EngineResult<()> {
        match self {
            ScriptStep::Pointer { event } => session.handle_pointer(event.clone()),
            ScriptStep::Key { event } => session.handle_key(event.clone()),
            ScriptStep::Tool { tool } => session.set_tool(*tool),
            ScriptStep::Color { hex } => session.select_color_hex(hex),
            ScriptStep::Thickness { value } => {
                session.set_thickness(*value);
                Ok(())
            }
            ScriptStep::Undo => {
                session.undo();
                Ok(())
            }
            ScriptStep::Redo => {
                session.redo();
                Ok(())
            }
            ScriptStep::Clear => session.clear(),
            ScriptStep::Resize { width, height } => session.resize(*width, *height),
            ScriptStep::ResetView => {
                session.reset_view();
                Ok(())
            }
            ScriptStep::Save => session.handle_key(KeyEvent::ctrl('s')),
        }
    }
}

/// An ordered list of steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Script {
    pub steps: Vec<ScriptStep>,
}

impl Script {
    /// Parse a script from a JSON array of steps.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
