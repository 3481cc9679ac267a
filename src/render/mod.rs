//! Frame submission.
//!
//! The [`Renderer`] collects one frame's sprites into an arena block and
//! hands them to a [`GpuSurface`]. A one-slot [`FrameGate`] keeps the CPU
//! from starting a new frame while the previous one is still in flight.

mod draw;
mod gate;
pub mod software;

pub use draw::{DrawLayout, DrawStats, draw_buffer};
pub use gate::{FrameCompletion, FrameGate};
pub use software::SoftwareSurface;

use thiserror::Error;

use crate::arena::{Arena, ArenaError};
use crate::atlas::{PixelRect, Sprite};

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("surface worker has shut down")]
    Disconnected,
    #[error("invalid frame resolution {width}x{height}")]
    Resolution { width: f32, height: f32 },
}

/// The GPU side of rendering: a texture mirror of the glyph atlas and an
/// instanced sprite pass.
///
/// Surfaces are shared handles. The atlas and the renderer each hold one.
pub trait GpuSurface {
    /// Copy `rect` of the atlas into the texture. `pixels` starts at the
    /// rect's top-left texel; rows are `bytes_per_row` apart.
    fn upload(&self, rect: PixelRect, pixels: &[u8], bytes_per_row: usize);

    /// Draw `sprites` in order over a cleared target of `resolution` points.
    /// `completion` must be signalled or dropped once the frame is done.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame cannot be queued.
    fn submit_frame(
        &self,
        sprites: &[Sprite],
        resolution: [f32; 2],
        completion: FrameCompletion,
    ) -> Result<(), SurfaceError>;
}

/// Builds and submits frames of at most `sprite_limit` sprites.
pub struct Renderer<'r, S> {
    sprites: &'r mut [Sprite],
    count: usize,
    dropped: usize,
    gate: FrameGate,
    pending: Option<FrameCompletion>,
    surface: S,
    frames: u64,
}

impl<'r, S: GpuSurface> Renderer<'r, S> {
    /// # Errors
    ///
    /// Returns an error if the arena cannot hold the sprite list.
    pub fn new(arena: &'r Arena<'r>, surface: S, sprite_limit: usize) -> Result<Self, ArenaError> {
        let sprites = arena.alloc::<Sprite>(sprite_limit)?;
        Ok(Self {
            sprites,
            count: 0,
            dropped: 0,
            gate: FrameGate::new(),
            pending: None,
            surface,
            frames: 0,
        })
    }

    /// Wait for the previous frame to finish and start an empty one.
    pub fn begin_frame(&mut self) {
        if self.pending.is_none() {
            self.pending = Some(self.gate.acquire());
        }
        self.count = 0;
        self.dropped = 0;
    }

    /// Append a sprite. Returns `false` when the frame is already full; the
    /// sprite is dropped and counted.
    pub fn push(&mut self, sprite: Sprite) -> bool {
        if let Some(slot) = self.sprites.get_mut(self.count) {
            *slot = sprite;
            self.count += 1;
            true
        } else {
            self.dropped += 1;
            false
        }
    }

    /// Submit the frame built since [`Renderer::begin_frame`].
    ///
    /// # Errors
    ///
    /// Returns the surface error. The gate is released either way.
    pub fn end_frame(&mut self, resolution: [f32; 2]) -> Result<(), SurfaceError> {
        let completion = match self.pending.take() {
            Some(completion) => completion,
            None => self.gate.acquire(),
        };
        if self.dropped > 0 {
            tracing::warn!(
                limit = self.sprites.len(),
                dropped = self.dropped,
                "sprite limit reached, frame truncated"
            );
        }
        self.frames += 1;
        self.surface
            .submit_frame(&self.sprites[..self.count], resolution, completion)
    }

    /// Block until the last submitted frame has completed.
    pub fn wait_idle(&self) {
        if self.pending.is_none() {
            self.gate.wait_idle();
        }
    }

    /// Sprites of the current (or last submitted) frame.
    pub fn sprites(&self) -> &[Sprite] {
        &self.sprites[..self.count]
    }

    pub fn sprite_limit(&self) -> usize {
        self.sprites.len()
    }

    /// Sprites dropped from the current frame.
    pub const fn dropped(&self) -> usize {
        self.dropped
    }

    /// Frames submitted so far.
    pub const fn frames(&self) -> u64 {
        self.frames
    }

    pub const fn surface(&self) -> &S {
        &self.surface
    }
}

impl<S> std::fmt::Debug for Renderer<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("sprite_limit", &self.sprites.len())
            .field("count", &self.count)
            .field("dropped", &self.dropped)
            .field("frames", &self.frames)
            .finish_non_exhaustive()
    }
}
