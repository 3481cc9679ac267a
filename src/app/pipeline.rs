use anyhow::{Context, Result};
use image::RgbaImage;

use crate::arena::{Arena, ArenaStats};
use crate::atlas::{AtlasConfig, FontShaper, GlyphAtlas};
use crate::editor::GapBuffer;
use crate::render::{DrawLayout, DrawStats, Renderer, SoftwareSurface, draw_buffer};

use super::FrameStatus;

/// Space around the text, in points.
pub const MARGIN: f32 = 8.0;

/// Atlas, renderer and surface wired together for one arena.
pub struct Pipeline<'r, F> {
    atlas: GlyphAtlas<'r, F, SoftwareSurface>,
    renderer: Renderer<'r, SoftwareSurface>,
    surface: SoftwareSurface,
    layout: DrawLayout,
    last: DrawStats,
}

impl<'r, F: FontShaper> Pipeline<'r, F> {
    /// Build the atlas and renderer, sharing one software surface.
    ///
    /// # Errors
    ///
    /// Returns an error if the compositor cannot start or the arena is too
    /// small for the atlas or sprite list.
    pub fn new(
        arena: &'r Arena<'r>,
        shaper: F,
        atlas_config: AtlasConfig,
        sprite_limit: usize,
    ) -> Result<Self> {
        let surface = SoftwareSurface::new(atlas_config.width, atlas_config.height, atlas_config.scale)
            .context("Failed to start the software compositor")?;
        let atlas = GlyphAtlas::new(arena, atlas_config, shaper, surface.clone())
            .context("Failed to allocate the glyph atlas")?;
        let renderer = Renderer::new(arena, surface.clone(), sprite_limit)
            .context("Failed to allocate the sprite list")?;
        Ok(Self {
            atlas,
            renderer,
            surface,
            layout: DrawLayout::default(),
            last: DrawStats::default(),
        })
    }

    /// Draw `buffer` starting at `scroll_line`, submit the frame and wait
    /// for it to be composited.
    ///
    /// With no `resolution` the frame is sized to fit the text.
    ///
    /// # Errors
    ///
    /// Returns an error if the atlas is full or the surface rejects the frame.
    #[allow(clippy::cast_precision_loss)]
    pub fn present(
        &mut self,
        buffer: &GapBuffer<'_>,
        resolution: Option<[f32; 2]>,
        scroll_line: usize,
    ) -> Result<DrawStats> {
        let _scope = crate::perf::scope("pipeline.present");
        let line_height = self.atlas.line_height();
        self.layout.origin = [MARGIN, (scroll_line as f32).mul_add(-line_height, MARGIN)];

        self.renderer.begin_frame();
        let stats = draw_buffer(buffer, &mut self.atlas, &mut self.renderer, &self.layout)
            .context("Failed to draw the buffer")?;
        let resolution =
            resolution.unwrap_or([stats.extent[0] + MARGIN, stats.extent[1] + MARGIN]);
        self.renderer
            .end_frame(resolution)
            .context("Failed to submit the frame")?;
        self.renderer.wait_idle();

        crate::perf::log_event(
            "pipeline.present",
            format!(
                "glyphs={} lines={} sprites={} dropped={} cached={}",
                stats.glyphs,
                stats.lines,
                self.renderer.sprites().len(),
                self.renderer.dropped(),
                self.atlas.len()
            ),
        );
        self.last = stats;
        Ok(stats)
    }

    /// The last composited frame.
    pub fn latest_frame(&self) -> Option<RgbaImage> {
        self.surface.latest_frame()
    }

    /// Line advance in points.
    pub fn line_height(&self) -> f32 {
        self.atlas.line_height()
    }

    pub const fn scale(&self) -> f32 {
        self.atlas.config().scale
    }

    pub const fn atlas(&self) -> &GlyphAtlas<'r, F, SoftwareSurface> {
        &self.atlas
    }

    pub const fn renderer(&self) -> &Renderer<'r, SoftwareSurface> {
        &self.renderer
    }

    /// Status-bar counters for the last frame.
    pub fn status(&self, arena: Option<ArenaStats>) -> FrameStatus {
        FrameStatus {
            frames: self.renderer.frames(),
            glyphs: self.last.glyphs,
            sprites: self.renderer.sprites().len(),
            dropped_sprites: self.renderer.dropped(),
            cached_glyphs: self.atlas.len(),
            arena,
        }
    }
}

impl<F> std::fmt::Debug for Pipeline<'_, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("atlas", &self.atlas)
            .field("renderer", &self.renderer)
            .finish_non_exhaustive()
    }
}
