// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. atlas::AtlasConfig)
    clippy::module_name_repetitions
)]

//! # Typewriter
//!
//! A minimal text editor whose text is drawn as sprites from a glyph atlas.
//!
//! Typewriter keeps its session memory in one place:
//! - A virtual-memory arena that hands out every long-lived block
//! - A gap buffer of single-byte characters with column-preserving motion
//! - A glyph atlas that shelf-packs each code point once, on first use
//! - A sprite list drawn per frame, throttled by a one-slot frame gate
//!
//! ## Architecture
//!
//! The terminal front end uses The Elm Architecture (TEA) pattern:
//! - **Model**: Application state
//! - **Message**: Events and actions
//! - **Update**: Pure state transitions
//! - **View**: Render to terminal
//!
//! ## Modules
//!
//! - [`arena`]: Reserved address space with bump allocation
//! - [`editor`]: Gap buffer and cursor motion
//! - [`atlas`]: Glyph atlas, sprites and the font shaping interface
//! - [`font`]: `TrueType` font loading and rasterization
//! - [`render`]: Sprite renderer, frame gate and software compositor
//! - [`app`]: Main application loop and state
//! - [`ui`]: Terminal UI components
//! - [`image`]: Terminal graphics protocol selection
//! - [`config`]: Persisted command-line defaults
//! - [`perf`]: Timing scopes and the render debug log

pub mod app;
pub mod arena;
pub mod atlas;
pub mod config;
pub mod editor;
pub mod font;
pub mod image;
pub mod perf;
pub mod render;
pub mod ui;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::app::{App, Message, Model};
    pub use crate::arena::{Arena, ArenaError, Reservation};
    pub use crate::atlas::{FontShaper, GlyphAtlas, Sprite};
    pub use crate::editor::{CapacityPolicy, GapBuffer, Motion};
    pub use crate::render::{GpuSurface, Renderer, draw_buffer};
}
