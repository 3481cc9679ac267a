use super::PixelRect;

/// Glyph extents in atlas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GlyphMetrics {
    /// Horizontal advance.
    pub width: f32,
    /// Distance from the baseline to the top of the line box.
    pub ascent: f32,
    /// Distance from the baseline to the bottom of the line box (positive).
    pub descent: f32,
}

impl GlyphMetrics {
    pub const fn new(width: f32, ascent: f32, descent: f32) -> Self {
        Self {
            width,
            ascent,
            descent,
        }
    }

    pub fn height(&self) -> f32 {
        self.ascent + self.descent
    }
}

/// Measures and rasterizes single-byte glyphs.
pub trait FontShaper {
    fn measure(&self, code_point: u8) -> GlyphMetrics;

    /// Draw the glyph into `canvas`, baseline at `canvas.baseline()` from the
    /// canvas top. The canvas has been cleared beforehand.
    fn draw(&self, code_point: u8, canvas: &mut GlyphCanvas<'_>);

    /// Distance between consecutive baselines, in atlas pixels.
    fn line_height(&self) -> f32;
}

/// A clipped RGBA view onto one cell of the atlas bitmap.
pub struct GlyphCanvas<'a> {
    pixels: &'a mut [u8],
    bytes_per_row: usize,
    rect: PixelRect,
    baseline: f32,
}

impl<'a> GlyphCanvas<'a> {
    pub(crate) const fn new(
        pixels: &'a mut [u8],
        bytes_per_row: usize,
        rect: PixelRect,
        baseline: f32,
    ) -> Self {
        Self {
            pixels,
            bytes_per_row,
            rect,
            baseline,
        }
    }

    pub const fn width(&self) -> u32 {
        self.rect.width
    }

    pub const fn height(&self) -> u32 {
        self.rect.height
    }

    /// Baseline offset from the top of the canvas.
    pub const fn baseline(&self) -> f32 {
        self.baseline
    }

    /// Fill the cell with transparent black.
    pub fn clear(&mut self) {
        for row in 0..self.rect.height {
            let start = self.offset(0, row);
            let end = start + self.rect.width as usize * 4;
            self.pixels[start..end].fill(0);
        }
    }

    /// Write one premultiplied RGBA pixel. Out-of-cell writes are ignored.
    pub fn put_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if x >= self.rect.width || y >= self.rect.height {
            return;
        }
        let at = self.offset(x, y);
        self.pixels[at..at + 4].copy_from_slice(&rgba);
    }

    /// Copy a tightly packed RGBA image into the cell's top-left corner,
    /// clipping whatever does not fit.
    pub fn blit_rgba(&mut self, source: &[u8], source_width: u32, source_height: u32) {
        let columns = source_width.min(self.rect.width) as usize;
        let rows = source_height.min(self.rect.height);
        let source_stride = source_width as usize * 4;
        for row in 0..rows {
            let from = row as usize * source_stride;
            let Some(line) = source.get(from..from + columns * 4) else {
                break;
            };
            let at = self.offset(0, row);
            self.pixels[at..at + columns * 4].copy_from_slice(line);
        }
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (self.rect.y + y) as usize * self.bytes_per_row + (self.rect.x + x) as usize * 4
    }
}

impl std::fmt::Debug for GlyphCanvas<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlyphCanvas")
            .field("rect", &self.rect)
            .field("baseline", &self.baseline)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STRIDE: usize = 8 * 4;

    #[test]
    fn test_put_pixel_lands_inside_rect() {
        let mut pixels = vec![0u8; STRIDE * 8];
        let mut canvas = GlyphCanvas::new(&mut pixels, STRIDE, PixelRect::new(2, 3, 2, 2), 1.0);
        canvas.put_pixel(1, 1, [9, 9, 9, 9]);
        canvas.put_pixel(2, 0, [7, 7, 7, 7]);

        let at = 4 * STRIDE + 3 * 4;
        assert_eq!(&pixels[at..at + 4], &[9, 9, 9, 9]);
        assert_eq!(pixels.iter().filter(|&&b| b == 7).count(), 0);
    }

    #[test]
    fn test_clear_only_touches_rect() {
        let mut pixels = vec![0xFFu8; STRIDE * 4];
        let mut canvas = GlyphCanvas::new(&mut pixels, STRIDE, PixelRect::new(1, 1, 2, 2), 0.0);
        canvas.clear();

        assert_eq!(pixels.iter().filter(|&&b| b == 0).count(), 2 * 2 * 4);
        assert_eq!(pixels[0], 0xFF);
        assert_eq!(pixels[STRIDE + 4], 0);
    }

    #[test]
    fn test_blit_clips_to_rect() {
        let mut pixels = vec![0u8; STRIDE * 4];
        let source = vec![1u8; 5 * 5 * 4];
        let mut canvas = GlyphCanvas::new(&mut pixels, STRIDE, PixelRect::new(6, 2, 2, 2), 0.0);
        canvas.blit_rgba(&source, 5, 5);

        assert_eq!(pixels.iter().filter(|&&b| b == 1).count(), 2 * 2 * 4);
    }

    #[test]
    fn test_metrics_height() {
        assert!((GlyphMetrics::new(10.0, 7.5, 2.5).height() - 10.0).abs() < f32::EPSILON);
    }
}
