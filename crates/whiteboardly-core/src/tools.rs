//! Tool selection and in-flight interaction state.

use crate::config::EngineConfig;
use crate::style::{SerializableColor, StrokeStyle};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    #[default]
    Pen,
    Eraser,
    Rectangle,
    Circle,
    Line,
    Text,
    Pan,
}

impl ToolKind {
    /// All tools in toolbar order.
    pub const ALL: [ToolKind; 7] = [
        ToolKind::Pen,
        ToolKind::Eraser,
        ToolKind::Rectangle,
        ToolKind::Circle,
        ToolKind::Line,
        ToolKind::Text,
        ToolKind::Pan,
    ];

    /// Pen and eraser paint continuously while dragging.
    pub fn is_freehand(self) -> bool {
        matches!(self, ToolKind::Pen | ToolKind::Eraser)
    }

    /// Rectangle, circle and line preview while dragging.
    pub fn is_shape(self) -> bool {
        matches!(self, ToolKind::Rectangle | ToolKind::Circle | ToolKind::Line)
    }

    /// Serialized name, as used in scripts and config.
    pub fn name(self) -> &'static str {
        match self {
            ToolKind::Pen => "pen",
            ToolKind::Eraser => "eraser",
            ToolKind::Rectangle => "rectangle",
            ToolKind::Circle => "circle",
            ToolKind::Line => "line",
            ToolKind::Text => "text",
            ToolKind::Pan => "pan",
        }
    }
}

/// An open text-entry overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct TextEditBox {
    /// Placement point in logical coordinates.
    pub anchor: Point,
    /// Where the host should draw the overlay, in screen coordinates.
    pub screen_position: Point,
    /// Font size in logical units.
    pub font_size: f64,
    /// Scale the host applies to the overlay so it matches the surface.
    pub display_scale: f64,
    /// Text typed so far.
    pub content: String,
}

/// The single interaction a session can have in flight.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Interaction {
    #[default]
    Idle,
    /// Freehand stroke; `last` is the previous logical point.
    Drawing { last: Point },
    /// Shape drag between two logical points.
    ShapeDragging { start: Point, current: Point },
    /// Text overlay capturing keystrokes.
    TextEditing(TextEditBox),
    /// View drag; `last` is the previous screen point (or touch centroid).
    Panning { last: Point },
}

impl Interaction {
    pub fn is_idle(&self) -> bool {
        matches!(self, Interaction::Idle)
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Interaction::Idle => "idle",
            Interaction::Drawing { .. } => "drawing",
            Interaction::ShapeDragging { .. } => "shape-dragging",
            Interaction::TextEditing(_) => "text-editing",
            Interaction::Panning { .. } => "panning",
        }
    }
}

/// Manages the current tool, its style and the in-flight interaction.
#[derive(Debug, Clone, Default)]
pub struct ToolManager {
    /// Currently selected tool.
    pub current_tool: ToolKind,
    /// Style applied to new strokes, shapes and text.
    pub style: StrokeStyle,
    /// Interaction in progress.
    pub interaction: Interaction,
}

impl ToolManager {
    /// Create a tool manager with default pen settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a tool manager using the default color and thickness from a config.
    pub fn from_config(config: &EngineConfig) -> Self {
        let color = SerializableColor::from_hex(&config.default_color).unwrap_or_else(|| {
            log::warn!("Invalid default color {:?}, using black", config.default_color);
            SerializableColor::black()
        });
        Self {
            current_tool: ToolKind::default(),
            style: StrokeStyle::new(color, config.default_thickness),
            interaction: Interaction::Idle,
        }
    }

    /// Take the current interaction, leaving `Idle` behind.
    pub fn take_interaction(&mut self) -> Interaction {
        std::mem::take(&mut self.interaction)
    }

    /// Check if an interaction is in flight.
    pub fn is_active(&self) -> bool {
        !self.interaction.is_idle()
    }

    /// The open text box, if editing text.
    pub fn text_box(&self) -> Option<&TextEditBox> {
        match &self.interaction {
            Interaction::TextEditing(text_box) => Some(text_box),
            _ => None,
        }
    }

    fn text_box_mut(&mut self) -> Option<&mut TextEditBox> {
        match &mut self.interaction {
            Interaction::TextEditing(text_box) => Some(text_box),
            _ => None,
        }
    }

    /// Append a typed character to the open text box.
    pub fn push_text(&mut self, ch: char) -> bool {
        match self.text_box_mut() {
            Some(text_box) => {
                text_box.content.push(ch);
                true
            }
            None => false,
        }
    }

    /// Delete the last character of the open text box.
    pub fn pop_text(&mut self) -> bool {
        match self.text_box_mut() {
            Some(text_box) => text_box.content.pop().is_some(),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tool_is_pen() {
        let tm = ToolManager::new();
        assert_eq!(tm.current_tool, ToolKind::Pen);
        assert!(!tm.is_active());
    }

    #[test]
    fn test_tool_categories() {
        let freehand: Vec<_> = ToolKind::ALL.iter().filter(|t| t.is_freehand()).collect();
        let shapes: Vec<_> = ToolKind::ALL.iter().filter(|t| t.is_shape()).collect();
        assert_eq!(freehand, [&ToolKind::Pen, &ToolKind::Eraser]);
        assert_eq!(shapes, [&ToolKind::Rectangle, &ToolKind::Circle, &ToolKind::Line]);
        assert!(!ToolKind::Text.is_freehand() && !ToolKind::Text.is_shape());
    }

    #[test]
    fn test_names_match_serde() {
        for tool in ToolKind::ALL {
            assert_eq!(serde_json::to_string(&tool).unwrap(), format!("\"{}\"", tool.name()));
        }
    }

    #[test]
    fn test_from_config() {
        let config = EngineConfig {
            default_color: "#ff0000".to_string(),
            default_thickness: 7.0,
            ..Default::default()
        };
        let tm = ToolManager::from_config(&config);
        assert_eq!(tm.style.color, SerializableColor::new(255, 0, 0, 255));
        assert!((tm.style.thickness - 7.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_invalid_default_color_falls_back() {
        let config = EngineConfig {
            default_color: "blue".to_string(),
            ..Default::default()
        };
        assert_eq!(ToolManager::from_config(&config).style.color, SerializableColor::black());
    }

    #[test]
    fn test_text_editing() {
        let mut tm = ToolManager::new();
        assert!(!tm.push_text('a'));

        tm.interaction = Interaction::TextEditing(TextEditBox {
            anchor: Point::ZERO,
            screen_position: Point::ZERO,
            font_size: 15.0,
            display_scale: 1.0,
            content: String::new(),
        });
        assert!(tm.push_text('h'));
        assert!(tm.push_text('i'));
        assert!(tm.pop_text());
        assert_eq!(tm.text_box().unwrap().content, "h");

        let taken = tm.take_interaction();
        assert_eq!(taken.name(), "text-editing");
        assert!(!tm.is_active());
    }

    #[test]
    fn test_tool_serde_names() {
        assert_eq!(serde_json::to_string(&ToolKind::Rectangle).unwrap(), "\"rectangle\"");
        let tool: ToolKind = serde_json::from_str("\"eraser\"").unwrap();
        assert_eq!(tool, ToolKind::Eraser);
    }
}
