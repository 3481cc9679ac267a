//! TrueType glyph shaping and rasterization.
//!
//! Fonts are located through `fontdb`, measured with `ttf-parser` and filled
//! with `tiny-skia`. Each byte maps to the Latin-1 character of the same
//! value.

use std::path::{Path, PathBuf};

use resvg::tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Transform};
use thiserror::Error;
use ttf_parser::{Face, GlyphId, OutlineBuilder};

use crate::atlas::{FontShaper, GlyphCanvas, GlyphMetrics};

#[derive(Debug, Error)]
pub enum FontError {
    #[error("failed to read font {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no monospace font found on this system")]
    NotFound,
    #[error("failed to parse font")]
    Parse(#[from] ttf_parser::FaceParsingError),
    #[error("invalid font size {0}")]
    Size(f32),
}

/// Where to load the font from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontSource {
    Path(PathBuf),
    SystemMonospace,
}

impl FontSource {
    pub fn from_option(path: Option<&Path>) -> Self {
        path.map_or(Self::SystemMonospace, |p| Self::Path(p.to_path_buf()))
    }
}

/// A [`FontShaper`] over one TrueType/OpenType face.
pub struct TtfShaper {
    data: Vec<u8>,
    index: u32,
    /// Pixels per font unit.
    units_to_px: f32,
    ascent: f32,
    descent: f32,
    line_gap: f32,
}

impl TtfShaper {
    /// Load a face and size it to `pixel_size` pixels per em.
    ///
    /// # Errors
    ///
    /// Returns an error if the font cannot be found, read or parsed.
    pub fn load(source: &FontSource, pixel_size: f32) -> Result<Self, FontError> {
        if !(pixel_size.is_finite() && pixel_size > 0.0) {
            return Err(FontError::Size(pixel_size));
        }
        let (data, index) = match source {
            FontSource::Path(path) => {
                let data = std::fs::read(path).map_err(|source| FontError::Io {
                    path: path.clone(),
                    source,
                })?;
                (data, 0)
            }
            FontSource::SystemMonospace => system_monospace()?,
        };
        Self::from_data(data, index, pixel_size)
    }

    /// Build a shaper from font file contents.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is not a valid font face.
    pub fn from_data(data: Vec<u8>, index: u32, pixel_size: f32) -> Result<Self, FontError> {
        let face = Face::parse(&data, index)?;
        let units_to_px = pixel_size / f32::from(face.units_per_em());
        let ascent = f32::from(face.ascender()) * units_to_px;
        let descent = -f32::from(face.descender()) * units_to_px;
        let line_gap = f32::from(face.line_gap()) * units_to_px;
        tracing::debug!(pixel_size, ascent, descent, line_gap, "loaded font face");
        Ok(Self {
            data,
            index,
            units_to_px,
            ascent,
            descent,
            line_gap,
        })
    }

    fn face(&self) -> Option<Face<'_>> {
        Face::parse(&self.data, self.index).ok()
    }
}

/// Control bytes have no visible glyph.
const fn is_control(code_point: u8) -> bool {
    code_point < 0x20 || code_point == 0x7f
}

fn glyph_for(face: &Face<'_>, code_point: u8) -> GlyphId {
    face.glyph_index(char::from(code_point))
        .unwrap_or(GlyphId(0))
}

impl FontShaper for TtfShaper {
    fn measure(&self, code_point: u8) -> GlyphMetrics {
        if is_control(code_point) {
            return GlyphMetrics::new(0.0, self.ascent, self.descent);
        }
        let advance = self
            .face()
            .and_then(|face| face.glyph_hor_advance(glyph_for(&face, code_point)))
            .map_or(0.0, |units| f32::from(units) * self.units_to_px);
        GlyphMetrics::new(advance, self.ascent, self.descent)
    }

    fn draw(&self, code_point: u8, canvas: &mut GlyphCanvas<'_>) {
        if is_control(code_point) {
            return;
        }
        let Some(face) = self.face() else {
            return;
        };
        let mut outline = PathOutline(PathBuilder::new());
        if face
            .outline_glyph(glyph_for(&face, code_point), &mut outline)
            .is_none()
        {
            // Blank glyph such as space.
            return;
        }
        let Some(path) = outline.0.finish() else {
            return;
        };
        let Some(mut pixmap) = Pixmap::new(canvas.width(), canvas.height()) else {
            return;
        };

        let mut paint = Paint::default();
        paint.set_color_rgba8(255, 255, 255, 255);
        paint.anti_alias = true;
        // Font units are y-up; the canvas is y-down with the baseline inside it.
        let transform = Transform::from_row(
            self.units_to_px,
            0.0,
            0.0,
            -self.units_to_px,
            0.0,
            canvas.baseline(),
        );
        pixmap.fill_path(&path, &paint, FillRule::Winding, transform, None);
        canvas.blit_rgba(pixmap.data(), pixmap.width(), pixmap.height());
    }

    fn line_height(&self) -> f32 {
        self.ascent + self.descent + self.line_gap
    }
}

impl std::fmt::Debug for TtfShaper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtfShaper")
            .field("bytes", &self.data.len())
            .field("index", &self.index)
            .field("ascent", &self.ascent)
            .field("descent", &self.descent)
            .finish_non_exhaustive()
    }
}

/// Feeds `ttf-parser` outline callbacks into a `tiny-skia` path.
struct PathOutline(PathBuilder);

impl OutlineBuilder for PathOutline {
    fn move_to(&mut self, x: f32, y: f32) {
        self.0.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.0.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.0.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.0.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.0.close();
    }
}

fn system_monospace() -> Result<(Vec<u8>, u32), FontError> {
    let mut db = fontdb::Database::new();
    db.load_system_fonts();
    let query = fontdb::Query {
        families: &[fontdb::Family::Monospace],
        ..fontdb::Query::default()
    };
    let id = db.query(&query).ok_or(FontError::NotFound)?;
    db.with_face_data(id, |data, index| (data.to_vec(), index))
        .ok_or(FontError::NotFound)
}
