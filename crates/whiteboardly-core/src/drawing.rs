//! Paint operations for each tool.
//!
//! Every primitive is expressed in logical coordinates and rasterized under
//! the camera transform, so input converted by [`Camera::screen_to_logical`]
//! lands where the pointer was regardless of zoom and pan.

use crate::camera::Camera;
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::fonts;
use crate::style::StrokeStyle;
use crate::surface::{Composite, Surface};
use crate::tools::ToolKind;
use ab_glyph::{Font, FontArc, OutlineCurve, PxScale, ScaleFont};
use kurbo::{BezPath, Circle, Line, PathEl, Point, Rect, Shape};
use tiny_skia::{PathBuilder, Pixmap};

/// Flattening tolerance for curved shapes, in logical units.
const PATH_TOLERANCE: f64 = 0.1;

/// Geometry of a dragged shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShapeGeometry {
    /// Axis-aligned rectangle spanned by the drag.
    Rect(Rect),
    /// Circle centered at the drag start, reaching the pointer.
    Circle(Circle),
    /// Straight segment from start to pointer.
    Line(Line),
}

impl ShapeGeometry {
    /// Geometry for a drag with a shape tool, or `None` for other tools.
    pub fn from_drag(tool: ToolKind, start: Point, end: Point) -> Option<Self> {
        match tool {
            ToolKind::Rectangle => Some(ShapeGeometry::Rect(Rect::from_points(start, end))),
            ToolKind::Circle => Some(ShapeGeometry::Circle(Circle::new(start, start.distance(end)))),
            ToolKind::Line => Some(ShapeGeometry::Line(Line::new(start, end))),
            ToolKind::Pen | ToolKind::Eraser | ToolKind::Text | ToolKind::Pan => None,
        }
    }

    /// Radius of a circle geometry.
    pub fn radius(&self) -> Option<f64> {
        match self {
            ShapeGeometry::Circle(circle) => Some(circle.radius),
            _ => None,
        }
    }

    fn to_bez_path(self) -> BezPath {
        match self {
            ShapeGeometry::Rect(rect) => rect.to_path(PATH_TOLERANCE),
            ShapeGeometry::Circle(circle) => circle.to_path(PATH_TOLERANCE),
            ShapeGeometry::Line(line) => line.to_path(PATH_TOLERANCE),
        }
    }
}

/// Convert a kurbo path to a rasterizer path.
///
/// Returns `None` for degenerate paths the rasterizer cannot represent.
fn to_raster_path(path: &BezPath) -> Option<tiny_skia::Path> {
    let mut pb = PathBuilder::new();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => pb.move_to(p.x as f32, p.y as f32),
            PathEl::LineTo(p) => pb.line_to(p.x as f32, p.y as f32),
            PathEl::QuadTo(p1, p2) => pb.quad_to(p1.x as f32, p1.y as f32, p2.x as f32, p2.y as f32),
            PathEl::CurveTo(p1, p2, p3) => pb.cubic_to(
                p1.x as f32,
                p1.y as f32,
                p2.x as f32,
                p2.y as f32,
                p3.x as f32,
                p3.y as f32,
            ),
            PathEl::ClosePath => pb.close(),
        }
    }
    pb.finish()
}

/// Executes tool-specific paint operations on a surface.
#[derive(Clone)]
pub struct DrawingEngine {
    font: FontArc,
    text_size_ratio: f64,
}

impl Default for DrawingEngine {
    fn default() -> Self {
        Self::new(fonts::bundled_font(), EngineConfig::default().text_size_ratio)
    }
}

impl std::fmt::Debug for DrawingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawingEngine")
            .field("font_glyphs", &self.font.glyph_count())
            .field("text_size_ratio", &self.text_size_ratio)
            .finish()
    }
}

impl DrawingEngine {
    pub fn new(font: FontArc, text_size_ratio: f64) -> Self {
        Self { font, text_size_ratio }
    }

    /// Create an engine from config; see [`fonts::resolve_font`].
    pub fn from_config(config: &EngineConfig) -> EngineResult<Self> {
        Ok(Self::new(fonts::resolve_font(config)?, config.text_size_ratio))
    }

    /// Replace the text font.
    pub fn set_font(&mut self, font: FontArc) {
        self.font = font;
    }

    /// Font size used for text at a given stroke thickness.
    pub fn font_size_for(&self, thickness: f64) -> f64 {
        thickness * self.text_size_ratio
    }

    /// Paint one freehand segment.
    ///
    /// The pen paints normally with round caps and joins; the eraser removes
    /// existing content (destination-out) instead of painting a background.
    pub fn stroke_segment(
        &self,
        surface: &mut Surface,
        camera: &Camera,
        tool: ToolKind,
        from: Point,
        to: Point,
        style: &StrokeStyle,
    ) -> EngineResult<()> {
        let composite = match tool {
            ToolKind::Pen => Composite::SourceOver,
            ToolKind::Eraser => Composite::DestinationOut,
            other => {
                return Err(EngineError::UnsupportedInteraction(format!(
                    "{:?} cannot paint freehand segments",
                    other
                )));
            }
        };

        let transform = camera.raster_transform();
        if from == to {
            // A zero-length segment is a round dot.
            let radius = (style.thickness / 2.0) as f32;
            if let Some(dot) = PathBuilder::from_circle(from.x as f32, from.y as f32, radius) {
                surface.fill_path(&dot, style, composite, transform);
            }
            return Ok(());
        }

        let path = Line::new(from, to).to_path(PATH_TOLERANCE);
        if let Some(path) = to_raster_path(&path) {
            surface.stroke_path(&path, style, true, composite, transform);
        }
        Ok(())
    }

    /// Repaint the committed state, then draw the in-progress shape on top.
    ///
    /// Restoring `base` first keeps a drag from accumulating ghost outlines.
    #[allow(clippy::too_many_arguments)]
    pub fn render_shape_preview(
        &self,
        surface: &mut Surface,
        camera: &Camera,
        base: &Pixmap,
        tool: ToolKind,
        start: Point,
        end: Point,
        style: &StrokeStyle,
    ) -> EngineResult<ShapeGeometry> {
        let geometry = ShapeGeometry::from_drag(tool, start, end).ok_or_else(|| {
            EngineError::UnsupportedInteraction(format!("{:?} has no shape preview", tool))
        })?;

        surface.repaint_from(base, camera);
        if let Some(path) = to_raster_path(&geometry.to_bez_path()) {
            surface.stroke_path(&path, style, false, Composite::SourceOver, camera.raster_transform());
        }
        Ok(geometry)
    }

    /// Paint a line of text with its top-left corner at `position`.
    pub fn paint_text(
        &self,
        surface: &mut Surface,
        camera: &Camera,
        position: Point,
        text: &str,
        style: &StrokeStyle,
    ) -> EngineResult<()> {
        let font = &self.font;
        let size = self.font_size_for(style.thickness) as f32;
        let scaled = font.as_scaled(PxScale::from(size));
        let (h_scale, v_scale) = (scaled.h_scale_factor(), scaled.v_scale_factor());
        let baseline = position.y as f32 + scaled.ascent();

        let mut pb = PathBuilder::new();
        let mut caret = position.x as f32;
        let mut previous = None;
        for ch in text.chars() {
            let glyph_id = font.glyph_id(ch);
            if let Some(prev) = previous {
                caret += scaled.kern(prev, glyph_id);
            }
            if let Some(outline) = font.outline(glyph_id) {
                let map = |p: ab_glyph::Point| (caret + p.x * h_scale, baseline - p.y * v_scale);
                let mut pen: Option<(f32, f32)> = None;
                for curve in &outline.curves {
                    let (start, end) = match curve {
                        OutlineCurve::Line(a, b) => (map(*a), map(*b)),
                        OutlineCurve::Quad(a, _, c) => (map(*a), map(*c)),
                        OutlineCurve::Cubic(a, _, _, d) => (map(*a), map(*d)),
                    };
                    if pen != Some(start) {
                        if pen.is_some() {
                            pb.close();
                        }
                        pb.move_to(start.0, start.1);
                    }
                    match curve {
                        OutlineCurve::Line(_, _) => pb.line_to(end.0, end.1),
                        OutlineCurve::Quad(_, b, _) => {
                            let b = map(*b);
                            pb.quad_to(b.0, b.1, end.0, end.1);
                        }
                        OutlineCurve::Cubic(_, b, c, _) => {
                            let (b, c) = (map(*b), map(*c));
                            pb.cubic_to(b.0, b.1, c.0, c.1, end.0, end.1);
                        }
                    }
                    pen = Some(end);
                }
                if pen.is_some() {
                    pb.close();
                }
            }
            caret += scaled.h_advance(glyph_id);
            previous = Some(glyph_id);
        }

        if let Some(path) = pb.finish() {
            surface.fill_path(&path, style, Composite::SourceOver, camera.raster_transform());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::SerializableColor;

    fn ink(thickness: f64) -> StrokeStyle {
        StrokeStyle::new(SerializableColor::new(0, 0, 255, 255), thickness)
    }

    /// (min_x, min_y, max_x, max_y) of all non-transparent pixels.
    fn inked_bounds(surface: &Surface) -> Option<(u32, u32, u32, u32)> {
        let mut bounds: Option<(u32, u32, u32, u32)> = None;
        for y in 0..surface.height() {
            for x in 0..surface.width() {
                if surface.pixel(x, y).is_some_and(|p| p.alpha() > 0) {
                    bounds = Some(match bounds {
                        None => (x, y, x, y),
                        Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
                    });
                }
            }
        }
        bounds
    }

    #[test]
    fn test_circle_radius_is_euclidean_distance() {
        let start = Point::new(100.0, 100.0);
        let right = ShapeGeometry::from_drag(ToolKind::Circle, start, Point::new(150.0, 100.0)).unwrap();
        let down = ShapeGeometry::from_drag(ToolKind::Circle, start, Point::new(100.0, 150.0)).unwrap();
        let diagonal = ShapeGeometry::from_drag(ToolKind::Circle, start, Point::new(130.0, 140.0)).unwrap();

        assert!((right.radius().unwrap() - 50.0).abs() < f64::EPSILON);
        assert!((down.radius().unwrap() - 50.0).abs() < f64::EPSILON);
        assert!((diagonal.radius().unwrap() - 50.0).abs() < f64::EPSILON);
        match right {
            ShapeGeometry::Circle(c) => assert_eq!(c.center, start),
            other => panic!("expected circle, got {:?}", other),
        }
    }

    #[test]
    fn test_rectangle_normalizes_drag() {
        let geometry =
            ShapeGeometry::from_drag(ToolKind::Rectangle, Point::new(50.0, 40.0), Point::new(10.0, 80.0)).unwrap();
        assert_eq!(geometry, ShapeGeometry::Rect(Rect::new(10.0, 40.0, 50.0, 80.0)));
    }

    #[test]
    fn test_non_shape_tools_have_no_geometry() {
        for tool in [ToolKind::Pen, ToolKind::Eraser, ToolKind::Text, ToolKind::Pan] {
            assert!(ShapeGeometry::from_drag(tool, Point::ZERO, Point::new(1.0, 1.0)).is_none());
        }
    }

    #[test]
    fn test_pen_segment_paints() {
        let engine = DrawingEngine::default();
        let mut surface = Surface::new(50, 50).unwrap();
        engine
            .stroke_segment(&mut surface, &Camera::new(), ToolKind::Pen, Point::new(5.0, 25.0), Point::new(45.0, 25.0), &ink(6.0))
            .unwrap();
        let px = surface.pixel(25, 25).unwrap();
        assert_eq!(px.alpha(), 255);
        assert_eq!(px.blue(), 255);
        assert_eq!(surface.pixel(25, 5).unwrap().alpha(), 0);
    }

    #[test]
    fn test_single_point_paints_dot() {
        let engine = DrawingEngine::default();
        let mut surface = Surface::new(20, 20).unwrap();
        let p = Point::new(10.0, 10.0);
        engine
            .stroke_segment(&mut surface, &Camera::new(), ToolKind::Pen, p, p, &ink(6.0))
            .unwrap();
        assert_eq!(surface.pixel(10, 10).unwrap().alpha(), 255);
    }

    #[test]
    fn test_eraser_punches_hole() {
        let engine = DrawingEngine::default();
        let camera = Camera::new();
        let mut surface = Surface::new(50, 50).unwrap();
        let thick = ink(30.0);
        engine
            .stroke_segment(&mut surface, &camera, ToolKind::Pen, Point::new(0.0, 25.0), Point::new(50.0, 25.0), &thick)
            .unwrap();
        engine
            .stroke_segment(&mut surface, &camera, ToolKind::Eraser, Point::new(25.0, 0.0), Point::new(25.0, 50.0), &ink(6.0))
            .unwrap();

        let hole = surface.pixel(25, 25).unwrap();
        assert_eq!(hole.alpha(), 0);
        assert_eq!(hole.blue(), 0);
        assert_eq!(surface.pixel(10, 25).unwrap().alpha(), 255);
    }

    #[test]
    fn test_segment_respects_camera() {
        let engine = DrawingEngine::default();
        let mut camera = Camera::new();
        camera.scale = 2.0;
        camera.offset = kurbo::Vec2::new(5.0, 0.0);
        let mut surface = Surface::new(100, 100).unwrap();
        let p = Point::new(10.0, 10.0);
        engine
            .stroke_segment(&mut surface, &camera, ToolKind::Pen, p, p, &ink(4.0))
            .unwrap();
        // (10 + 5) * 2 = 30, 10 * 2 = 20
        assert_eq!(surface.pixel(30, 20).unwrap().alpha(), 255);
        assert_eq!(surface.pixel(10, 10).unwrap().alpha(), 0);
    }

    #[test]
    fn test_shape_tool_cannot_stroke_segment() {
        let engine = DrawingEngine::default();
        let mut surface = Surface::new(10, 10).unwrap();
        let result = engine.stroke_segment(
            &mut surface,
            &Camera::new(),
            ToolKind::Rectangle,
            Point::ZERO,
            Point::new(5.0, 5.0),
            &ink(1.0),
        );
        assert!(matches!(result, Err(EngineError::UnsupportedInteraction(_))));
    }

    #[test]
    fn test_preview_does_not_accumulate() {
        let engine = DrawingEngine::default();
        let camera = Camera::new();
        let mut surface = Surface::new(100, 100).unwrap();
        let base = surface.pixmap().clone();
        let start = Point::new(10.0, 10.0);

        engine
            .render_shape_preview(&mut surface, &camera, &base, ToolKind::Line, start, Point::new(90.0, 10.0), &ink(4.0))
            .unwrap();
        assert_eq!(surface.pixel(80, 10).unwrap().alpha(), 255);

        engine
            .render_shape_preview(&mut surface, &camera, &base, ToolKind::Line, start, Point::new(10.0, 90.0), &ink(4.0))
            .unwrap();
        assert_eq!(surface.pixel(80, 10).unwrap().alpha(), 0);
        assert_eq!(surface.pixel(10, 80).unwrap().alpha(), 255);
    }

    #[test]
    fn test_circle_preview_outline() {
        let engine = DrawingEngine::default();
        let camera = Camera::new();
        let mut surface = Surface::new(200, 200).unwrap();
        let base = surface.pixmap().clone();
        let geometry = engine
            .render_shape_preview(
                &mut surface,
                &camera,
                &base,
                ToolKind::Circle,
                Point::new(100.0, 100.0),
                Point::new(150.0, 100.0),
                &ink(4.0),
            )
            .unwrap();
        assert!((geometry.radius().unwrap() - 50.0).abs() < f64::EPSILON);
        // On the outline, left and below, not in the center.
        assert_eq!(surface.pixel(50, 100).unwrap().alpha(), 255);
        assert_eq!(surface.pixel(100, 150).unwrap().alpha(), 255);
        assert_eq!(surface.pixel(100, 100).unwrap().alpha(), 0);
    }

    #[test]
    fn test_text_lands_right_of_and_below_position() {
        let engine = DrawingEngine::default();
        let mut surface = Surface::new(120, 60).unwrap();
        let style = ink(3.0);
        engine
            .paint_text(&mut surface, &Camera::new(), Point::new(20.0, 10.0), "Hi", &style)
            .unwrap();

        let inked = inked_bounds(&surface).unwrap();
        // 15px text: the cap height sits between the top and the baseline at one ascent.
        assert!(inked.0 >= 19 && inked.1 > 10, "ink starts at {:?}", inked);
        assert!(inked.2 < 20 + 30 && inked.3 <= 10 + 15, "ink ends at {:?}", inked);
        assert!(inked.3 - inked.1 >= 7, "ink height {:?}", inked);
    }

    #[test]
    fn test_text_scales_with_camera() {
        let engine = DrawingEngine::default();
        let mut camera = Camera::new();
        camera.scale = 2.0;
        let mut plain = Surface::new(200, 100).unwrap();
        let mut zoomed = Surface::new(200, 100).unwrap();
        let style = ink(3.0);
        engine.paint_text(&mut plain, &Camera::new(), Point::new(5.0, 5.0), "H", &style).unwrap();
        engine.paint_text(&mut zoomed, &camera, Point::new(5.0, 5.0), "H", &style).unwrap();

        let a = inked_bounds(&plain).unwrap();
        let b = inked_bounds(&zoomed).unwrap();
        let (ha, hb) = (a.3 - a.1, b.3 - b.1);
        assert!(hb >= 2 * ha - 2 && hb <= 2 * ha + 2, "{} vs {}", ha, hb);
    }

    #[test]
    fn test_empty_text_paints_nothing() {
        let engine = DrawingEngine::default();
        let mut surface = Surface::new(10, 10).unwrap();
        engine.paint_text(&mut surface, &Camera::new(), Point::ZERO, "", &ink(3.0)).unwrap();
        assert!(surface.is_blank());
    }

    #[test]
    fn test_font_size_ratio() {
        let engine = DrawingEngine::default();
        assert!((engine.font_size_for(3.0) - 15.0).abs() < f64::EPSILON);
        let custom = DrawingEngine::new(fonts::bundled_font(), 2.0);
        assert!((custom.font_size_for(3.0) - 6.0).abs() < f64::EPSILON);
    }
}
