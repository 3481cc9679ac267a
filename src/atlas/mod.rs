//! Glyph atlas with shelf packing and a permanent cache.
//!
//! Glyphs are rasterized the first time their byte is seen, packed
//! left-to-right into rows ("shelves") that grow downward from the top of
//! the bitmap, and mirrored into the GPU texture. Later lookups are served
//! from the cache and never touch the shaper again.
//!
//! ```text
//!  y (from bottom)
//!  H ┌──┬───┬──┬────┬─────────┐ ← first shelf
//!    │A │ b │c │ W  │  pen →  │
//!    ├──┴┬──┴──┴────┴─────────┤ ← second shelf
//!    │ d │                    │
//!    │   │                    │
//!  0 └───┴────────────────────┘
//! ```

mod shaper;
mod sprite;

pub use shaper::{FontShaper, GlyphCanvas, GlyphMetrics};
pub use sprite::{GlyphEntry, PixelRect, Sprite};

use thiserror::Error;

use crate::arena::{Arena, ArenaError, ArenaVec};
use crate::render::GpuSurface;

/// Initial number of cache slots; the list grows through the arena.
const INITIAL_CACHE_CAPACITY: usize = 64;

#[derive(Debug, Error)]
pub enum AtlasError {
    #[error("glyph atlas is full: no room for byte {code_point:#04x} in a {width}x{height} bitmap")]
    Full {
        code_point: u8,
        width: u32,
        height: u32,
    },
    #[error(transparent)]
    Arena(#[from] ArenaError),
}

/// Atlas dimensions and the pixel-to-point scale factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtlasConfig {
    pub width: u32,
    pub height: u32,
    /// Bitmap pixels per screen point (the display backing scale).
    pub scale: f32,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 1024,
            scale: 1.0,
        }
    }
}

/// A fixed-size RGBA glyph bitmap plus the cache of glyphs packed into it.
pub struct GlyphAtlas<'r, F, S> {
    bitmap: &'r mut [u8],
    config: AtlasConfig,
    pen_x: u32,
    /// Top of the next free shelf, measured up from the bottom edge.
    pen_y: u32,
    row_height: u32,
    cache: ArenaVec<'r, GlyphEntry>,
    shaper: F,
    surface: S,
}

impl<'r, F: FontShaper, S: GpuSurface> GlyphAtlas<'r, F, S> {
    /// Allocate the bitmap and the cache from `arena`.
    ///
    /// # Errors
    ///
    /// Returns an error if the arena cannot hold the bitmap or the cache.
    pub fn new(
        arena: &'r Arena<'r>,
        config: AtlasConfig,
        shaper: F,
        surface: S,
    ) -> Result<Self, AtlasError> {
        let bitmap_len = (config.width as usize)
            .checked_mul(config.height as usize)
            .and_then(|n| n.checked_mul(4))
            .ok_or(ArenaError::Exhausted {
                requested: usize::MAX,
                offset: arena.stats().used,
                reserved: arena.stats().reserved,
            })?;
        let bitmap = arena.allocate_zeroed(bitmap_len, 4)?;
        let cache = ArenaVec::with_capacity(arena, INITIAL_CACHE_CAPACITY)?;
        tracing::debug!(
            width = config.width,
            height = config.height,
            scale = config.scale,
            "created glyph atlas"
        );
        Ok(Self {
            bitmap,
            config,
            pen_x: 0,
            pen_y: config.height,
            row_height: 0,
            cache,
            shaper,
            surface,
        })
    }

    /// Sprite for `code_point`, rasterizing and packing it on first use.
    ///
    /// # Errors
    ///
    /// [`AtlasError::Full`] when the glyph does not fit in the remaining
    /// bitmap, [`AtlasError::Arena`] when the cache cannot grow.
    pub fn get_or_render(&mut self, code_point: u8) -> Result<Sprite, AtlasError> {
        if let Some(sprite) = self.lookup(code_point) {
            return Ok(sprite);
        }

        let metrics = self.shaper.measure(code_point);
        let sprite = self.pack(code_point, metrics)?;
        self.cache.push(GlyphEntry {
            code_point: u32::from(code_point),
            sprite,
        })?;
        tracing::debug!(
            code_point,
            cached = self.cache.len(),
            pen_x = self.pen_x,
            pen_y = self.pen_y,
            "cached glyph"
        );
        Ok(sprite)
    }

    /// Cached sprite for `code_point`, if any.
    pub fn lookup(&self, code_point: u8) -> Option<Sprite> {
        let key = u32::from(code_point);
        self.cache
            .iter()
            .find(|entry| entry.code_point == key)
            .map(|entry| entry.sprite)
    }

    pub fn contains(&self, code_point: u8) -> bool {
        self.lookup(code_point).is_some()
    }

    /// Number of cached glyphs.
    pub const fn len(&self) -> usize {
        self.cache.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Cached glyphs in the order they were first rendered.
    pub fn entries(&self) -> &[GlyphEntry] {
        self.cache.as_slice()
    }

    /// The RGBA bitmap, `width * 4` bytes per row.
    pub fn bitmap(&self) -> &[u8] {
        self.bitmap
    }

    pub const fn dimensions(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub const fn config(&self) -> AtlasConfig {
        self.config
    }

    /// Line advance in screen points.
    pub fn line_height(&self) -> f32 {
        self.shaper.line_height() / self.config.scale
    }

    pub const fn shaper(&self) -> &F {
        &self.shaper
    }

    pub const fn surface(&self) -> &S {
        &self.surface
    }

    /// Reserve a cell for the glyph, draw it, and build its sprite.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn pack(&mut self, code_point: u8, metrics: GlyphMetrics) -> Result<Sprite, AtlasError> {
        let AtlasConfig {
            width,
            height,
            scale,
        } = self.config;
        let cell_w = metrics.width.max(0.0).ceil() as u32;
        let cell_h = metrics.height().max(0.0).ceil() as u32;
        let full = AtlasError::Full {
            code_point,
            width,
            height,
        };

        // Glyphs with no area (control bytes, flat marks) advance the pen only.
        let occupies = cell_w > 0 && cell_h > 0;
        if occupies {
            if cell_w > width {
                return Err(full);
            }
            if self.pen_x + cell_w > width {
                self.next_row();
            }
            if cell_h > self.pen_y {
                tracing::warn!(code_point, cached = self.cache.len(), "glyph atlas is full");
                return Err(full);
            }
        }

        let rect = PixelRect::new(self.pen_x, height - self.pen_y, cell_w, cell_h);
        let mut sprite = Sprite::solid([0.0; 2], [0.0; 2], Sprite::WHITE);
        sprite.size = [metrics.width / scale, metrics.height() / scale];

        if occupies {
            let bytes_per_row = width as usize * 4;
            let mut canvas =
                GlyphCanvas::new(self.bitmap, bytes_per_row, rect, metrics.ascent);
            canvas.clear();
            self.shaper.draw(code_point, &mut canvas);

            let start = rect.y as usize * bytes_per_row + rect.x as usize * 4;
            self.surface
                .upload(rect, &self.bitmap[start..], bytes_per_row);

            let (w, h) = (width as f32, height as f32);
            sprite.uv_origin = [rect.x as f32 / w, rect.y as f32 / h];
            sprite.uv_size = [metrics.width / w, metrics.height() / h];

            self.row_height = self.row_height.max(cell_h);
            self.pen_x += cell_w;
            if self.pen_x >= width {
                self.next_row();
            }
        }

        Ok(sprite)
    }

    fn next_row(&mut self) {
        self.pen_x = 0;
        self.pen_y = self.pen_y.saturating_sub(self.row_height);
        self.row_height = 0;
    }
}

impl<F, S> std::fmt::Debug for GlyphAtlas<'_, F, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlyphAtlas")
            .field("config", &self.config)
            .field("pen_x", &self.pen_x)
            .field("pen_y", &self.pen_y)
            .field("row_height", &self.row_height)
            .field("cached", &self.cache.len())
            .finish_non_exhaustive()
    }
}
