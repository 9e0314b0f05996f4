//! A whiteboard editing session.
//!
//! The session owns the surface, camera, history and tool state, and turns
//! pointer and keyboard events into drawing operations.

use crate::camera::{Camera, ZoomDirection};
use crate::config::EngineConfig;
use crate::drawing::DrawingEngine;
use crate::error::EngineResult;
use crate::history::{DecodedRestore, History, PendingRestore};
use crate::input::{Key, KeyEvent, PointerEvent, ShortcutAction, centroid, resolve_shortcut};
use crate::snapshot::Snapshot;
use crate::style::{SerializableColor, StrokeStyle};
use crate::surface::Surface;
use crate::tools::{Interaction, TextEditBox, ToolKind, ToolManager};
use kurbo::{Point, Vec2};
use tiny_skia::Pixmap;

/// Editing state for one open whiteboard.
#[derive(Debug)]
pub struct WhiteboardSession {
    id: String,
    config: EngineConfig,
    surface: Surface,
    /// Decoded pixels of the history entry under the cursor.
    committed: Pixmap,
    camera: Camera,
    history: History,
    drawing: DrawingEngine,
    tools: ToolManager,
    dirty: bool,
    save_requested: bool,
}

impl WhiteboardSession {
    /// Create a session with a blank surface.
    ///
    /// The blank state is committed so the first action can be undone.
    pub fn new(id: impl Into<String>, config: EngineConfig) -> EngineResult<Self> {
        let drawing = DrawingEngine::from_config(&config)?;
        Self::with_drawing_engine(id, config, drawing)
    }

    /// Create a session with an explicit drawing engine.
    pub fn with_drawing_engine(
        id: impl Into<String>,
        config: EngineConfig,
        drawing: DrawingEngine,
    ) -> EngineResult<Self> {
        let surface = Surface::new(config.surface_width, config.surface_height)?;
        let mut history = History::new(config.max_history);
        history.commit(surface.snapshot());

        let id = id.into();
        log::debug!(
            "Opened whiteboard {} ({}x{})",
            id,
            surface.width(),
            surface.height()
        );

        Ok(Self {
            committed: surface.pixmap().clone(),
            camera: Camera::from_config(&config),
            tools: ToolManager::from_config(&config),
            id,
            surface,
            history,
            drawing,
            dirty: false,
            save_requested: false,
            config,
        })
    }

    /// Create a session and load previously saved content into it.
    ///
    /// Malformed content is logged and the session starts blank.
    pub fn open(id: impl Into<String>, config: EngineConfig, content: Option<&str>) -> EngineResult<Self> {
        let mut session = Self::new(id, config)?;
        if let Some(content) = content {
            session.load_serialized_surface(content);
        }
        Ok(session)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn drawing_engine_mut(&mut self) -> &mut DrawingEngine {
        &mut self.drawing
    }

    pub fn tool(&self) -> ToolKind {
        self.tools.current_tool
    }

    pub fn style(&self) -> &StrokeStyle {
        &self.tools.style
    }

    pub fn interaction(&self) -> &Interaction {
        &self.tools.interaction
    }

    /// The open text box, for the host to render as an overlay.
    pub fn text_box(&self) -> Option<&TextEditBox> {
        self.tools.text_box()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Whether the surface changed since the last save.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    /// Return and clear a pending save request (Ctrl+S).
    pub fn take_save_request(&mut self) -> bool {
        std::mem::take(&mut self.save_requested)
    }

    // --- Tools and style ---

    /// Switch tools, finishing any interaction in progress first.
    pub fn set_tool(&mut self, tool: ToolKind) -> EngineResult<()> {
        if tool == self.tools.current_tool && !self.tools.is_active() {
            return Ok(());
        }
        let result = self.finalize_interaction();
        log::debug!("Tool {:?} -> {:?}", self.tools.current_tool, tool);
        self.tools.current_tool = tool;
        result
    }

    /// Pick a color; this also switches back to the pen.
    pub fn select_color(&mut self, color: SerializableColor) -> EngineResult<()> {
        self.tools.style.color = color;
        self.set_tool(ToolKind::Pen)
    }

    /// Pick a color from a hex string.
    pub fn select_color_hex(&mut self, hex: &str) -> EngineResult<()> {
        match SerializableColor::from_hex(hex) {
            Some(color) => self.select_color(color),
            None => {
                log::warn!("Ignoring invalid color {:?}", hex);
                Ok(())
            }
        }
    }

    /// Set the stroke thickness; non-positive values are ignored.
    pub fn set_thickness(&mut self, thickness: f64) {
        if thickness.is_finite() && thickness > 0.0 {
            self.tools.style.thickness = thickness;
        } else {
            log::warn!("Ignoring invalid thickness {}", thickness);
        }
    }

    // --- Events ---

    /// Route a pointer or touch event.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> EngineResult<()> {
        match event {
            PointerEvent::Down { position } => self.pointer_down(position),
            PointerEvent::Move { position } => self.pointer_move(position),
            PointerEvent::Up { .. } | PointerEvent::Leave => self.pointer_up(),
            PointerEvent::Wheel { position, delta_y } => {
                self.zoom(ZoomDirection::from_wheel_delta(delta_y), position);
                Ok(())
            }
            PointerEvent::TouchStart { touches } => self.touch_start(&touches),
            PointerEvent::TouchMove { touches } => self.touch_move(&touches),
            PointerEvent::TouchEnd { touches } => self.touch_end(&touches),
        }
    }

    /// Route a key press.
    ///
    /// Undo, redo and save shortcuts work in every state. While a text box is
    /// open other keys edit its content.
    pub fn handle_key(&mut self, event: KeyEvent) -> EngineResult<()> {
        match resolve_shortcut(&event) {
            Some(ShortcutAction::Undo) => {
                self.undo();
                return Ok(());
            }
            Some(ShortcutAction::Redo) => {
                self.redo();
                return Ok(());
            }
            Some(ShortcutAction::Save) => {
                log::debug!("Save requested for {}", self.id);
                self.save_requested = true;
                return Ok(());
            }
            Some(ShortcutAction::FinalizeText) => return self.finalize_text().map(|_| ()),
            None => {}
        }

        if self.tools.text_box().is_none() {
            return Ok(());
        }
        match event.key {
            Key::Enter => self.finalize_text().map(|_| ()),
            Key::Backspace => {
                self.tools.pop_text();
                Ok(())
            }
            Key::Char(ch) if !event.modifiers.ctrl && !event.modifiers.meta => {
                self.tools.push_text(ch);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn pointer_down(&mut self, screen: Point) -> EngineResult<()> {
        // A press outside the text box commits it, like losing focus.
        self.finalize_interaction()?;

        let logical = self.camera.screen_to_logical(screen);
        let tool = self.tools.current_tool;
        self.tools.interaction = match tool {
            ToolKind::Pen | ToolKind::Eraser => {
                self.drawing.stroke_segment(
                    &mut self.surface,
                    &self.camera,
                    tool,
                    logical,
                    logical,
                    &self.tools.style,
                )?;
                Interaction::Drawing { last: logical }
            }
            ToolKind::Rectangle | ToolKind::Circle | ToolKind::Line => Interaction::ShapeDragging {
                start: logical,
                current: logical,
            },
            ToolKind::Text => Interaction::TextEditing(TextEditBox {
                anchor: logical,
                screen_position: screen,
                font_size: self.drawing.font_size_for(self.tools.style.thickness),
                display_scale: self.camera.scale,
                content: String::new(),
            }),
            ToolKind::Pan => Interaction::Panning { last: screen },
        };
        log::trace!("Pointer down with {:?}: {}", tool, self.tools.interaction.name());
        Ok(())
    }

    fn pointer_move(&mut self, screen: Point) -> EngineResult<()> {
        let logical = self.camera.screen_to_logical(screen);
        let tool = self.tools.current_tool;
        match &mut self.tools.interaction {
            Interaction::Drawing { last } => {
                let from = *last;
                *last = logical;
                if let Err(e) =
                    self.drawing
                        .stroke_segment(&mut self.surface, &self.camera, tool, from, logical, &self.tools.style)
                {
                    log::error!("Freehand stroke with {:?} failed: {}", tool, e);
                    return Err(e);
                }
            }
            Interaction::ShapeDragging { start, current } => {
                *current = logical;
                let start = *start;
                if let Err(e) = self.drawing.render_shape_preview(
                    &mut self.surface,
                    &self.camera,
                    &self.committed,
                    tool,
                    start,
                    logical,
                    &self.tools.style,
                ) {
                    log::error!("Shape preview with {:?} failed: {}", tool, e);
                    return Err(e);
                }
            }
            Interaction::Panning { last } => {
                let delta = screen - *last;
                *last = screen;
                self.pan(delta);
            }
            Interaction::Idle | Interaction::TextEditing(_) => {}
        }
        Ok(())
    }

    fn pointer_up(&mut self) -> EngineResult<()> {
        match self.tools.interaction {
            Interaction::Drawing { .. } | Interaction::ShapeDragging { .. } | Interaction::Panning { .. } => {
                self.finalize_interaction()
            }
            // The text box stays open after the click that created it.
            Interaction::Idle | Interaction::TextEditing(_) => Ok(()),
        }
    }

    fn touch_start(&mut self, touches: &[Point]) -> EngineResult<()> {
        match touches {
            [single] => self.pointer_down(*single),
            [_, _] => {
                self.finalize_interaction()?;
                if let Some(center) = centroid(touches) {
                    self.tools.interaction = Interaction::Panning { last: center };
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn touch_move(&mut self, touches: &[Point]) -> EngineResult<()> {
        let panning = matches!(self.tools.interaction, Interaction::Panning { .. });
        match touches {
            [_, _] if panning => match centroid(touches) {
                Some(center) => self.pointer_move(center),
                None => Ok(()),
            },
            [single] if !panning => self.pointer_move(*single),
            _ => Ok(()),
        }
    }

    fn touch_end(&mut self, touches: &[Point]) -> EngineResult<()> {
        if touches.is_empty() {
            return self.pointer_up();
        }
        // Lifting one of two fingers ends the pan without starting a stroke.
        if matches!(self.tools.interaction, Interaction::Panning { .. }) && touches.len() < 2 {
            self.tools.interaction = Interaction::Idle;
        }
        Ok(())
    }

    // --- Interaction lifecycle ---

    /// Finish whatever is in progress.
    ///
    /// Strokes and shapes are committed, non-empty text is placed, and a pan
    /// just ends.
    pub fn finalize_interaction(&mut self) -> EngineResult<()> {
        match self.tools.take_interaction() {
            Interaction::Idle | Interaction::Panning { .. } => Ok(()),
            Interaction::Drawing { .. } | Interaction::ShapeDragging { .. } => {
                self.commit();
                Ok(())
            }
            Interaction::TextEditing(text_box) => self.place_text_box(text_box).map(|_| ()),
        }
    }

    /// Close the text box, placing its content if any.
    ///
    /// Returns whether text was committed.
    pub fn finalize_text(&mut self) -> EngineResult<bool> {
        if self.tools.text_box().is_none() {
            return Ok(false);
        }
        match self.tools.take_interaction() {
            Interaction::TextEditing(text_box) => self.place_text_box(text_box),
            _ => Ok(false),
        }
    }

    fn place_text_box(&mut self, text_box: TextEditBox) -> EngineResult<bool> {
        let text = text_box.content.trim();
        if text.is_empty() {
            return Ok(false);
        }
        self.commit_text(text_box.anchor, text)?;
        Ok(true)
    }

    /// Paint text at a logical position and commit it.
    pub fn commit_text(&mut self, position: Point, text: &str) -> EngineResult<()> {
        if let Err(e) = self
            .drawing
            .paint_text(&mut self.surface, &self.camera, position, text, &self.tools.style)
        {
            log::warn!("Could not place text on {}: {}", self.id, e);
            return Err(e);
        }
        self.commit();
        Ok(())
    }

    /// Record the current surface as a history entry.
    fn commit(&mut self) {
        self.history.commit(self.surface.snapshot());
        self.committed = self.surface.pixmap().clone();
        self.dirty = true;
        log::trace!(
            "Committed {} (entry {:?} of {})",
            self.id,
            self.history.cursor(),
            self.history.len()
        );
    }

    // --- History ---

    /// Undo the last action. Returns `false` at the first entry.
    pub fn undo(&mut self) -> bool {
        match self.undo_deferred() {
            Some(pending) => self.finish_restore(pending),
            None => false,
        }
    }

    /// Redo the last undone action. Returns `false` if nothing was undone.
    pub fn redo(&mut self) -> bool {
        match self.redo_deferred() {
            Some(pending) => self.finish_restore(pending),
            None => false,
        }
    }

    /// Move the history cursor back and hand out the restore to decode.
    ///
    /// Pass the decoded result to [`apply_restore`](Self::apply_restore).
    pub fn undo_deferred(&mut self) -> Option<PendingRestore> {
        let pending = self.history.undo();
        if pending.is_none() {
            log::debug!("Nothing to undo on {}", self.id);
        }
        pending
    }

    /// Move the history cursor forward and hand out the restore to decode.
    pub fn redo_deferred(&mut self) -> Option<PendingRestore> {
        let pending = self.history.redo();
        if pending.is_none() {
            log::debug!("Nothing to redo on {}", self.id);
        }
        pending
    }

    /// Paint a decoded restore if it is still the latest history change.
    ///
    /// Returns `false` for a stale restore, which is dropped.
    pub fn apply_restore(&mut self, restore: DecodedRestore) -> bool {
        if !self.history.is_current(restore.seq) {
            log::debug!(
                "Dropping stale restore {} (latest {})",
                restore.seq,
                self.history.seq()
            );
            return false;
        }
        self.committed = restore.pixmap;
        self.surface.repaint_from(&self.committed, &self.camera);
        self.dirty = true;
        true
    }

    fn finish_restore(&mut self, pending: PendingRestore) -> bool {
        match pending.decode() {
            Ok(decoded) => self.apply_restore(decoded),
            Err(e) => {
                log::warn!("Failed to restore snapshot on {}: {}", self.id, e);
                false
            }
        }
    }

    /// Erase everything. The cleared state is a new history entry.
    pub fn clear(&mut self) -> EngineResult<()> {
        self.finalize_interaction()?;
        self.surface.clear();
        self.commit();
        log::debug!("Cleared {}", self.id);
        Ok(())
    }

    // --- View ---

    /// Zoom one step around a screen point. Returns `false` when out of range.
    pub fn zoom(&mut self, direction: ZoomDirection, anchor: Point) -> bool {
        let changed = self.camera.apply_zoom(direction, anchor);
        if changed {
            self.repaint();
        }
        changed
    }

    /// Move the view by a screen-space delta.
    pub fn pan(&mut self, delta: Vec2) {
        self.camera.pan(delta);
        self.repaint();
    }

    /// Back to scale 1 with no offset.
    pub fn reset_view(&mut self) {
        self.camera.reset();
        self.repaint();
    }

    /// Resize the surface and repaint the committed state into it.
    pub fn resize(&mut self, width: u32, height: u32) -> EngineResult<()> {
        self.surface.resize(width, height)?;
        self.repaint();
        log::debug!("Resized {} to {}x{}", self.id, width, height);
        Ok(())
    }

    /// Redraw the committed state through the current camera.
    pub fn repaint(&mut self) {
        self.surface.repaint_from(&self.committed, &self.camera);
    }

    // --- Serialization ---

    /// The current surface as a PNG data URL.
    pub fn current_serialized_surface(&self) -> EngineResult<String> {
        self.surface.snapshot().to_data_url()
    }

    /// Replace the surface with saved content and restart history from it.
    ///
    /// Saved content is a screen image, so the view is reset to identity and
    /// the content lands pixel for pixel. Malformed content is logged and
    /// leaves the session unchanged.
    pub fn load_serialized_surface(&mut self, data_url: &str) -> bool {
        let pixmap = match Snapshot::from_data_url(data_url).and_then(|s| s.decode()) {
            Ok(pixmap) => pixmap,
            Err(e) => {
                log::warn!("Ignoring malformed content for {}: {}", self.id, e);
                return false;
            }
        };
        self.tools.interaction = Interaction::Idle;
        self.camera.reset();
        self.surface.repaint_from(&pixmap, &self.camera);
        self.history.reset_with(self.surface.snapshot());
        self.committed = self.surface.pixmap().clone();
        self.dirty = false;
        log::debug!("Loaded {}x{} content into {}", pixmap.width(), pixmap.height(), self.id);
        true
    }

    /// A reduced preview as a PNG data URL.
    pub fn thumbnail(&self) -> EngineResult<String> {
        let thumb = self.surface.thumbnail(self.config.thumbnail_width)?;
        Snapshot::capture(&thumb).to_data_url()
    }

    /// The current surface as PNG bytes.
    pub fn export_png(&self) -> EngineResult<Vec<u8>> {
        self.surface.encode_png()
    }

}
