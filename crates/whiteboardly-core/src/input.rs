//! Pointer, touch and keyboard events, and keyboard shortcuts.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub alt: bool,
    #[serde(default)]
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const CTRL: Modifiers = Modifiers {
        shift: false,
        ctrl: true,
        alt: false,
        meta: false,
    };
}

/// Pointer and touch events in screen coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PointerEvent {
    Down { position: Point },
    Move { position: Point },
    Up { position: Point },
    /// The pointer left the surface.
    Leave,
    /// Wheel scroll; negative `delta_y` zooms in.
    Wheel { position: Point, delta_y: f64 },
    /// Touch points after a finger went down.
    TouchStart { touches: Vec<Point> },
    /// Touch points after a move.
    TouchMove { touches: Vec<Point> },
    /// Touch points remaining after a finger lifted.
    TouchEnd { touches: Vec<Point> },
}

/// Keys the engine reacts to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    Char(char),
    Enter,
    Escape,
    Backspace,
}

/// A key press.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub key: Key,
    #[serde(default)]
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    /// A key press without modifiers.
    pub fn plain(key: Key) -> Self {
        Self::new(key, Modifiers::NONE)
    }

    /// A Ctrl+key press.
    pub fn ctrl(ch: char) -> Self {
        Self::new(Key::Char(ch), Modifiers::CTRL)
    }
}

/// Session-level action bound to a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    Undo,
    Redo,
    Save,
    FinalizeText,
}

/// Resolve a key press to a shortcut action.
///
/// Redo is bound to Ctrl+X, not Ctrl+Y.
pub fn resolve_shortcut(event: &KeyEvent) -> Option<ShortcutAction> {
    match (&event.key, event.modifiers.ctrl) {
        (Key::Char(c), true) => match c.to_ascii_lowercase() {
            'z' => Some(ShortcutAction::Undo),
            'x' => Some(ShortcutAction::Redo),
            's' => Some(ShortcutAction::Save),
            _ => None,
        },
        (Key::Escape, _) => Some(ShortcutAction::FinalizeText),
        _ => None,
    }
}

/// A keyboard shortcut definition.
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: &'static str,
    pub ctrl: bool,
    pub description: &'static str,
}

impl Shortcut {
    pub const fn new(key: &'static str, ctrl: bool, description: &'static str) -> Self {
        Self { key, ctrl, description }
    }

    /// Format the shortcut for display (e.g., "Ctrl+Z").
    pub fn format(&self) -> String {
        if self.ctrl {
            format!("Ctrl+{}", self.key)
        } else {
            self.key.to_string()
        }
    }
}

/// Registry of all keyboard shortcuts.
pub struct ShortcutRegistry;

impl ShortcutRegistry {
    /// Get all registered shortcuts.
    pub fn all() -> Vec<Shortcut> {
        vec![
            Shortcut::new("Z", true, "Undo"),
            Shortcut::new("X", true, "Redo"),
            Shortcut::new("S", true, "Save"),
            Shortcut::new("Enter", false, "Place text"),
            Shortcut::new("Escape", false, "Place text and close the text box"),
        ]
    }
}

/// Center of a set of touch points.
pub fn centroid(touches: &[Point]) -> Option<Point> {
    if touches.is_empty() {
        return None;
    }
    let sum = touches
        .iter()
        .fold(Vec2::ZERO, |acc, p| acc + p.to_vec2());
    Some((sum / touches.len() as f64).to_point())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undo_redo_bindings() {
        assert_eq!(resolve_shortcut(&KeyEvent::ctrl('z')), Some(ShortcutAction::Undo));
        assert_eq!(resolve_shortcut(&KeyEvent::ctrl('x')), Some(ShortcutAction::Redo));
        assert_eq!(resolve_shortcut(&KeyEvent::ctrl('s')), Some(ShortcutAction::Save));
        assert_eq!(resolve_shortcut(&KeyEvent::ctrl('y')), None);
    }

    #[test]
    fn test_plain_letters_are_not_shortcuts() {
        assert_eq!(resolve_shortcut(&KeyEvent::plain(Key::Char('z'))), None);
        assert_eq!(resolve_shortcut(&KeyEvent::plain(Key::Enter)), None);
    }

    #[test]
    fn test_escape() {
        assert_eq!(
            resolve_shortcut(&KeyEvent::plain(Key::Escape)),
            Some(ShortcutAction::FinalizeText)
        );
    }

    #[test]
    fn test_centroid() {
        assert_eq!(centroid(&[]), None);
        let c = centroid(&[Point::new(0.0, 0.0), Point::new(10.0, 20.0)]).unwrap();
        assert!((c.x - 5.0).abs() < f64::EPSILON);
        assert!((c.y - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shortcut_format() {
        let formatted: Vec<_> = ShortcutRegistry::all().iter().map(Shortcut::format).collect();
        assert!(formatted.contains(&"Ctrl+X".to_string()));
        assert!(formatted.contains(&"Escape".to_string()));
    }

    #[test]
    fn test_event_json() {
        let event: PointerEvent =
            serde_json::from_str(r#"{ "type": "down", "position": { "x": 1.0, "y": 2.0 } }"#).unwrap();
        assert_eq!(event, PointerEvent::Down { position: Point::new(1.0, 2.0) });

        let key: KeyEvent = serde_json::from_str(r#"{ "key": { "char": "z" }, "modifiers": { "ctrl": true } }"#).unwrap();
        assert_eq!(key, KeyEvent::ctrl('z'));
    }
}
