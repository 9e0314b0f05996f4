//! Font resolution for the text tool.
//!
//! DejaVu Sans is bundled, so text can always be placed. A configured font
//! file replaces it, and a configured family name is looked up among the
//! installed system fonts, falling back to the bundled face when missing.

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use ab_glyph::{FontArc, FontVec};
use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use std::sync::OnceLock;

static DEJAVU_SANS: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

/// The bundled DejaVu Sans face.
pub fn bundled_font() -> FontArc {
    static FONT: OnceLock<FontArc> = OnceLock::new();
    FONT.get_or_init(|| {
        FontArc::try_from_slice(DEJAVU_SANS).unwrap_or_else(|e| panic!("bundled DejaVu Sans font is invalid: {}", e))
    })
    .clone()
}

fn system_db() -> &'static Database {
    static DB: OnceLock<Database> = OnceLock::new();
    DB.get_or_init(|| {
        let mut db = Database::new();
        db.load_system_fonts();
        log::debug!("Indexed {} system font faces", db.len());
        db
    })
}

/// Parse font bytes (TTF/OTF).
pub fn load_font(bytes: Vec<u8>) -> EngineResult<FontArc> {
    FontArc::try_from_vec(bytes).map_err(|e| EngineError::FontLoad(e.to_string()))
}

/// Regular face of an installed font family.
///
/// `sans-serif`, `serif` and `monospace` select the system's generic faces.
pub fn system_font(family: &str) -> Option<FontArc> {
    let families: Vec<Family<'_>> = match family.trim() {
        "" | "sans-serif" | "Sans" => vec![Family::SansSerif],
        "serif" | "Serif" => vec![Family::Serif],
        "monospace" | "Monospace" => vec![Family::Monospace],
        other => vec![Family::Name(other)],
    };
    let query = Query {
        families: &families,
        weight: Weight::NORMAL,
        stretch: Stretch::Normal,
        style: Style::Normal,
    };

    let db = system_db();
    let id = db.query(&query)?;
    db.with_face_data(id, |data, index| FontVec::try_from_vec_and_index(data.to_vec(), index))?
        .ok()
        .map(FontArc::from)
}

/// The font the text tool uses for a config.
///
/// An unreadable `font_path` is an error. An unknown `font_family` is logged
/// and the bundled face is used.
pub fn resolve_font(config: &EngineConfig) -> EngineResult<FontArc> {
    if let Some(path) = &config.font_path {
        let bytes =
            std::fs::read(path).map_err(|e| EngineError::FontLoad(format!("{}: {}", path.display(), e)))?;
        log::debug!("Using font file {}", path.display());
        return load_font(bytes);
    }
    if let Some(family) = &config.font_family {
        match system_font(family) {
            Some(font) => {
                log::debug!("Using system font {:?}", family);
                return Ok(font);
            }
            None => log::warn!("Font family {:?} not installed, using DejaVu Sans", family),
        }
    }
    Ok(bundled_font())
}
