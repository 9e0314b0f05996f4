//! The raster drawing surface.

use crate::camera::Camera;
use crate::error::{EngineError, EngineResult};
use crate::snapshot::Snapshot;
use crate::style::StrokeStyle;
use tiny_skia::{
    BlendMode, Color, FillRule, FilterQuality, Path, Pixmap, PixmapPaint, PremultipliedColorU8,
    Transform,
};

/// How new paint combines with what is already on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Composite {
    /// Normal painting over existing content.
    SourceOver,
    /// Punch a hole: coverage removes existing content, leaving transparency.
    DestinationOut,
}

impl Composite {
    fn blend_mode(self) -> BlendMode {
        match self {
            Composite::SourceOver => BlendMode::SourceOver,
            Composite::DestinationOut => BlendMode::DestinationOut,
        }
    }
}

/// An RGBA raster the whiteboard is painted onto.
#[derive(Debug, Clone)]
pub struct Surface {
    pixmap: Pixmap,
}

impl Surface {
    /// Create a transparent surface.
    pub fn new(width: u32, height: u32) -> EngineResult<Self> {
        let pixmap = Pixmap::new(width, height).ok_or(EngineError::InvalidSurfaceSize { width, height })?;
        Ok(Self { pixmap })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Reset every pixel to transparent.
    pub fn clear(&mut self) {
        self.pixmap.fill(Color::TRANSPARENT);
    }

    /// Stroke a path under the given transform.
    pub fn stroke_path(
        &mut self,
        path: &Path,
        style: &StrokeStyle,
        rounded: bool,
        composite: Composite,
        transform: Transform,
    ) {
        let paint = style.paint(composite.blend_mode());
        self.pixmap
            .stroke_path(path, &paint, &style.stroke(rounded), transform, None);
    }

    /// Fill a path (nonzero winding) under the given transform.
    pub fn fill_path(&mut self, path: &Path, style: &StrokeStyle, composite: Composite, transform: Transform) {
        let paint = style.paint(composite.blend_mode());
        self.pixmap
            .fill_path(path, &paint, FillRule::Winding, transform, None);
    }

    /// Clear the surface and draw `source` through the camera transform.
    ///
    /// At identity transform and equal size this is an exact byte copy.
    pub fn repaint_from(&mut self, source: &Pixmap, camera: &Camera) {
        let same_size = source.width() == self.width() && source.height() == self.height();
        if same_size && camera.is_identity() {
            self.pixmap.data_mut().copy_from_slice(source.data());
            return;
        }
        self.clear();
        self.pixmap.draw_pixmap(
            0,
            0,
            source.as_ref(),
            &PixmapPaint::default(),
            camera.raster_transform(),
            None,
        );
    }

    /// Freeze the current contents.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.pixmap)
    }

    /// Resize the surface, keeping existing content anchored at the origin.
    pub fn resize(&mut self, width: u32, height: u32) -> EngineResult<()> {
        if width == self.width() && height == self.height() {
            return Ok(());
        }
        let mut resized = Pixmap::new(width, height).ok_or(EngineError::InvalidSurfaceSize { width, height })?;
        resized.draw_pixmap(
            0,
            0,
            self.pixmap.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
        self.pixmap = resized;
        Ok(())
    }

    /// Render a scaled-down copy, `width` pixels wide.
    pub fn thumbnail(&self, width: u32) -> EngineResult<Pixmap> {
        let height = ((self.height() as u64 * width as u64) / self.width() as u64).max(1) as u32;
        let mut thumb = Pixmap::new(width, height).ok_or(EngineError::InvalidSurfaceSize { width, height })?;
        let sx = width as f32 / self.width() as f32;
        let sy = height as f32 / self.height() as f32;
        let paint = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..Default::default()
        };
        thumb.draw_pixmap(0, 0, self.pixmap.as_ref(), &paint, Transform::from_scale(sx, sy), None);
        Ok(thumb)
    }

    /// Encode the surface as PNG.
    pub fn encode_png(&self) -> EngineResult<Vec<u8>> {
        self.pixmap
            .encode_png()
            .map_err(|e| EngineError::Encode(e.to_string()))
    }

    /// Read one premultiplied pixel.
    pub fn pixel(&self, x: u32, y: u32) -> Option<PremultipliedColorU8> {
        self.pixmap.pixel(x, y)
    }

    /// Whether every pixel is fully transparent.
    pub fn is_blank(&self) -> bool {
        self.pixmap.data().iter().all(|&b| b == 0)
    }
}
