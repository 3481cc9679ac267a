//! Application state and main event loop.
//!
//! This module implements The Elm Architecture (TEA):
//! - [`Model`]: The complete application state
//! - [`Message`]: All possible events and actions
//! - [`update`]: State transitions
//! - [`App::run`]: Main event loop with rendering
//!
//! Everything allocated for a session (text, glyph atlas, sprite list)
//! comes from one arena created at the top of [`App::run`] and released
//! when it returns.

mod event_loop;
mod input;
mod model;
mod pipeline;
mod update;

pub use model::{FrameStatus, Model, ToastLevel};
pub use pipeline::{MARGIN, Pipeline};
pub use update::{Message, update};

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::arena::{Arena, Reservation};
use crate::atlas::AtlasConfig;
use crate::editor::{CapacityPolicy, GapBuffer};
use crate::font::{FontSource, TtfShaper};

pub const DEFAULT_CAPACITY: usize = 1 << 20;
pub const DEFAULT_RESERVE_MIB: usize = 256;
pub const DEFAULT_ATLAS_SIZE: u32 = 1024;
pub const DEFAULT_SPRITE_LIMIT: usize = 1 << 16;
pub const DEFAULT_FONT_SIZE: u32 = 24;

/// Main application struct: session settings plus the entry points.
#[derive(Debug, Clone)]
pub struct App {
    initial_text: Vec<u8>,
    capacity: usize,
    policy: CapacityPolicy,
    reserve_bytes: usize,
    atlas_size: u32,
    scale: f32,
    sprite_limit: usize,
    font: FontSource,
    font_size: u32,
    graphics: bool,
    force_half_cell: bool,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        Self {
            initial_text: Vec::new(),
            capacity: DEFAULT_CAPACITY,
            policy: CapacityPolicy::Fixed,
            reserve_bytes: DEFAULT_RESERVE_MIB << 20,
            atlas_size: DEFAULT_ATLAS_SIZE,
            scale: 1.0,
            sprite_limit: DEFAULT_SPRITE_LIMIT,
            font: FontSource::SystemMonospace,
            font_size: DEFAULT_FONT_SIZE,
            graphics: true,
            force_half_cell: false,
        }
    }

    /// Seed the buffer. Characters outside the single-byte range are dropped.
    pub fn with_initial_text(mut self, text: &str) -> Self {
        self.initial_text = text
            .chars()
            .filter_map(|c| u8::try_from(u32::from(c)).ok())
            .collect();
        self
    }

    pub const fn with_capacity(mut self, capacity: usize, policy: CapacityPolicy) -> Self {
        self.capacity = capacity;
        self.policy = policy;
        self
    }

    pub const fn with_reserve_mib(mut self, mib: usize) -> Self {
        self.reserve_bytes = mib.saturating_mul(1 << 20);
        self
    }

    pub const fn with_atlas_size(mut self, size: u32) -> Self {
        self.atlas_size = size;
        self
    }

    /// Bitmap pixels per point.
    pub const fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub const fn with_sprite_limit(mut self, limit: usize) -> Self {
        self.sprite_limit = limit;
        self
    }

    pub fn with_font(mut self, font: FontSource, size: u32) -> Self {
        self.font = font;
        self.font_size = size;
        self
    }

    /// Show composited frames through the terminal graphics protocol.
    /// Without it the buffer is shown as plain text.
    pub const fn with_graphics(mut self, enabled: bool, force_half_cell: bool) -> Self {
        self.graphics = enabled;
        self.force_half_cell = force_half_cell;
        self
    }

    pub const fn atlas_config(&self) -> AtlasConfig {
        AtlasConfig {
            width: self.atlas_size,
            height: self.atlas_size,
            scale: self.scale,
        }
    }

    /// Load the configured font at the atlas pixel size.
    ///
    /// # Errors
    ///
    /// Returns an error if the font cannot be loaded.
    #[allow(clippy::cast_precision_loss)]
    pub fn load_shaper(&self) -> Result<TtfShaper> {
        TtfShaper::load(&self.font, self.font_size as f32 * self.scale)
            .with_context(|| format!("Failed to load font ({:?})", self.font))
    }

    /// Reserve the session's address space.
    ///
    /// # Errors
    ///
    /// Returns an error if the reservation fails.
    pub fn reserve(&self) -> Result<Reservation> {
        Reservation::reserve(self.reserve_bytes).with_context(|| {
            format!("Failed to reserve {} MiB for the arena", self.reserve_bytes >> 20)
        })
    }

    /// Allocate the gap buffer and type the initial text into it.
    ///
    /// # Errors
    ///
    /// Returns an error if the arena cannot hold the buffer.
    pub fn make_buffer<'r>(&self, arena: &'r Arena<'r>) -> Result<GapBuffer<'r>> {
        let mut buffer = GapBuffer::new(arena, self.capacity, self.policy)
            .context("Failed to allocate the text buffer")?;
        let written = buffer
            .insert_str(&self.initial_text)
            .context("Failed to grow the text buffer")?;
        if written < self.initial_text.len() {
            tracing::warn!(
                written,
                requested = self.initial_text.len(),
                "initial text truncated to buffer capacity"
            );
        }
        Ok(buffer)
    }

    /// Render the initial text once, headless, and save it as a PNG.
    ///
    /// # Errors
    ///
    /// Returns an error if any part of the pipeline fails or the file cannot
    /// be written.
    pub fn snapshot(&self, path: &Path) -> Result<PathBuf> {
        let mut reservation = self.reserve()?;
        let arena = Arena::new(&mut reservation);
        let buffer = self.make_buffer(&arena)?;
        let mut pipeline =
            Pipeline::new(&arena, self.load_shaper()?, self.atlas_config(), self.sprite_limit)?;

        pipeline.present(&buffer, None, 0)?;
        let frame = pipeline
            .latest_frame()
            .context("Compositor produced no frame")?;
        frame
            .save(path)
            .with_context(|| format!("Failed to write snapshot {}", path.display()))?;
        tracing::info!(path = %path.display(), stats = ?arena.stats(), "wrote snapshot");
        Ok(path.to_path_buf())
    }
}
