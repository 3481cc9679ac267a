use crate::atlas::{AtlasError, FontShaper, GlyphAtlas, Sprite};
use crate::editor::{GapBuffer, NEWLINE};

use super::{GpuSurface, Renderer};

/// Where and how the buffer is laid out on screen, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawLayout {
    /// Top-left corner of the first line.
    pub origin: [f32; 2],
    pub cursor_width: f32,
    pub cursor_color: [f32; 4],
    pub text_color: [f32; 4],
}

impl Default for DrawLayout {
    fn default() -> Self {
        Self {
            origin: [0.0, 0.0],
            cursor_width: 2.0,
            cursor_color: Sprite::WHITE,
            text_color: Sprite::WHITE,
        }
    }
}

/// What one call to [`draw_buffer`] produced.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DrawStats {
    /// Glyph sprites pushed, cursor excluded.
    pub glyphs: usize,
    pub lines: usize,
    /// Top-left of the cursor quad.
    pub cursor: [f32; 2],
    /// Bottom-right corner of the drawn text, cursor included.
    pub extent: [f32; 2],
}

/// Push the buffer's glyphs, then the cursor, onto the current frame.
///
/// Bytes are visited front segment first. A newline returns the pen to the
/// left margin and moves it down one line; every other byte is looked up in
/// the atlas, placed at the pen and advances it by the sprite width. The
/// caller brackets this with `begin_frame` and `end_frame`.
///
/// # Errors
///
/// Propagates atlas errors; the frame is left partially built.
pub fn draw_buffer<F, A, S>(
    buffer: &GapBuffer<'_>,
    atlas: &mut GlyphAtlas<'_, F, A>,
    renderer: &mut Renderer<'_, S>,
    layout: &DrawLayout,
) -> Result<DrawStats, AtlasError>
where
    F: FontShaper,
    A: GpuSurface,
    S: GpuSurface,
{
    let line_height = atlas.line_height();
    let [left, top] = layout.origin;
    let mut pen = layout.origin;
    let mut stats = DrawStats {
        lines: 1,
        ..DrawStats::default()
    };
    let mut extent_x = left;
    let cursor_index = buffer.cursor();

    for (index, byte) in buffer.visible_sequence().enumerate() {
        if index == cursor_index {
            stats.cursor = pen;
        }
        if byte == NEWLINE {
            pen = [left, pen[1] + line_height];
            stats.lines += 1;
            continue;
        }
        let mut sprite = atlas.get_or_render(byte)?.at(pen);
        sprite.color = layout.text_color;
        pen[0] += sprite.size[0];
        extent_x = extent_x.max(pen[0]);
        if sprite.size[0] > 0.0 {
            renderer.push(sprite);
            stats.glyphs += 1;
        }
    }
    if cursor_index == buffer.len() {
        stats.cursor = pen;
    }

    renderer.push(Sprite::solid(
        stats.cursor,
        [layout.cursor_width, line_height],
        layout.cursor_color,
    ));
    #[allow(clippy::cast_precision_loss)]
    let height = line_height * stats.lines as f32;
    stats.extent = [
        extent_x.max(stats.cursor[0] + layout.cursor_width),
        top + height,
    ];
    Ok(stats)
}
