//! Camera module for pan/zoom transforms.

use crate::config::EngineConfig;
use kurbo::{Affine, Point, Vec2};
use serde::{Deserialize, Serialize};

/// Direction of a single zoom step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoomDirection {
    In,
    Out,
}

impl ZoomDirection {
    /// Map a wheel delta to a zoom direction (scrolling up zooms in).
    pub fn from_wheel_delta(delta_y: f64) -> Self {
        if delta_y < 0.0 { ZoomDirection::In } else { ZoomDirection::Out }
    }

    fn sign(self) -> f64 {
        match self {
            ZoomDirection::In => 1.0,
            ZoomDirection::Out => -1.0,
        }
    }
}

/// Camera manages the view transform for the drawing surface.
///
/// Logical points map to the screen by translating by `offset` and then
/// scaling by `scale`, so `logical = screen / scale - offset`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Camera {
    /// Current zoom level (1.0 = 100%)
    pub scale: f64,
    /// Translation in logical units, applied before scaling
    pub offset: Vec2,
    /// Minimum allowed scale
    pub min_scale: f64,
    /// Maximum allowed scale
    pub max_scale: f64,
    /// Relative change per zoom step
    pub zoom_step: f64,
    /// Keep the anchor point fixed while zooming
    pub zoom_to_anchor: bool,
}

impl Default for Camera {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl Camera {
    /// Create a new camera with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a camera using the scale range and step from a config.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            scale: 1.0,
            offset: Vec2::ZERO,
            min_scale: config.min_scale,
            max_scale: config.max_scale,
            zoom_step: config.zoom_step,
            zoom_to_anchor: config.zoom_to_anchor,
        }
    }

    /// Get the affine transform for painting.
    ///
    /// This transform converts logical coordinates to screen coordinates.
    pub fn transform(&self) -> Affine {
        Affine::scale(self.scale) * Affine::translate(self.offset)
    }

    /// Get the inverse transform for input handling.
    pub fn inverse_transform(&self) -> Affine {
        Affine::translate(-self.offset) * Affine::scale(1.0 / self.scale)
    }

    /// Convert a screen point to logical coordinates.
    pub fn screen_to_logical(&self, screen_point: Point) -> Point {
        Point::new(
            screen_point.x / self.scale - self.offset.x,
            screen_point.y / self.scale - self.offset.y,
        )
    }

    /// Convert a logical point to screen coordinates.
    pub fn logical_to_screen(&self, logical_point: Point) -> Point {
        self.transform() * logical_point
    }

    /// Whether the camera is at unit scale with no offset.
    pub fn is_identity(&self) -> bool {
        (self.scale - 1.0).abs() < f64::EPSILON && self.offset == Vec2::ZERO
    }

    /// Apply one zoom step.
    ///
    /// Returns false, leaving the scale untouched, when the result would fall
    /// outside `[min_scale, max_scale]`.
    pub fn apply_zoom(&mut self, direction: ZoomDirection, anchor: Point) -> bool {
        let new_scale = self.scale * (1.0 + direction.sign() * self.zoom_step);
        if new_scale < self.min_scale || new_scale > self.max_scale {
            log::debug!("Zoom to {:.3} rejected (range [{}, {}])", new_scale, self.min_scale, self.max_scale);
            return false;
        }

        if self.zoom_to_anchor {
            let logical_anchor = self.screen_to_logical(anchor);
            self.scale = new_scale;
            self.offset = Vec2::new(
                anchor.x / new_scale - logical_anchor.x,
                anchor.y / new_scale - logical_anchor.y,
            );
        } else {
            self.scale = new_scale;
        }
        true
    }

    /// Pan the camera by a raw gesture delta.
    ///
    /// The delta is added to the offset as-is, without dividing by the scale.
    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Reset camera to unit scale and no offset.
    pub fn reset(&mut self) {
        self.offset = Vec2::ZERO;
        self.scale = 1.0;
    }

    /// Convert the paint transform for the rasterizer.
    pub fn raster_transform(&self) -> tiny_skia::Transform {
        let [a, b, c, d, e, f] = self.transform().as_coeffs();
        tiny_skia::Transform::from_row(a as f32, b as f32, c as f32, d as f32, e as f32, f as f32)
    }
}
