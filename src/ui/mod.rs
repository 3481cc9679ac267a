//! Terminal UI components.
//!
//! The text area shows the composited frame through the terminal's image
//! protocol, or the buffer as plain text when graphics are unavailable.
//! Below it sit an optional toast row and the status bar.

mod render;
mod status;

pub use render::{line_number_width, render, split_areas};
pub use status::status_text;
