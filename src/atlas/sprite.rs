use bytemuck::{Pod, Zeroable};

/// One instanced quad, laid out for a vertex buffer.
///
/// `position` and `size` are in screen points. `uv_origin` and `uv_size` are
/// normalized atlas coordinates with the origin at the top-left texel. A
/// sprite with a zero `uv_size` is drawn as a solid quad in `color`;
/// otherwise the sampled texel is modulated by `color`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Sprite {
    pub position: [f32; 2],
    pub size: [f32; 2],
    pub uv_origin: [f32; 2],
    pub uv_size: [f32; 2],
    pub color: [f32; 4],
}

impl Sprite {
    pub const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

    /// An untextured quad.
    pub const fn solid(position: [f32; 2], size: [f32; 2], color: [f32; 4]) -> Self {
        Self {
            position,
            size,
            uv_origin: [0.0; 2],
            uv_size: [0.0; 2],
            color,
        }
    }

    /// Whether the sprite samples the atlas.
    pub fn is_textured(&self) -> bool {
        self.uv_size[0] > 0.0 && self.uv_size[1] > 0.0
    }

    /// Copy of the sprite moved to `position`.
    #[must_use]
    pub const fn at(mut self, position: [f32; 2]) -> Self {
        self.position = position;
        self
    }
}

/// A rectangle of atlas pixels, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub const fn right(&self) -> u32 {
        self.x + self.width
    }

    pub const fn bottom(&self) -> u32 {
        self.y + self.height
    }
}

/// A cached glyph: the byte it was rendered for and its atlas sprite.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GlyphEntry {
    pub code_point: u32,
    pub sprite: Sprite,
}
