//! Terminal graphics for composited frames.
//!
//! `ratatui-image` picks the best protocol the terminal supports (Kitty,
//! Sixel, iTerm2) and falls back to Unicode half-blocks.

#[cfg(unix)]
use std::time::Duration;

use ratatui_image::picker::Picker;
#[cfg(unix)]
use ratatui_image::picker::cap_parser::QueryStdioOptions;

const PICKER_QUERY_TIMEOUT_MS: u64 = 250;

/// Create a picker for terminal image rendering.
///
/// The picker detects terminal capabilities and chooses the best protocol.
/// Returns `None` when the terminal cannot be queried.
pub fn create_picker(force_half_cell: bool) -> Option<Picker> {
    if force_half_cell {
        crate::perf::log_event(
            "image.create_picker",
            "force_half_cell=true protocol=Halfblocks",
        );
        return Some(Picker::halfblocks());
    }

    // Windows consoles can leave an orphaned reader thread behind after the
    // stdio capability query, so use half-blocks there.
    #[cfg(not(unix))]
    {
        crate::perf::log_event(
            "image.create_picker",
            "windows fallback protocol=Halfblocks",
        );
        return Some(Picker::halfblocks());
    }

    #[cfg(unix)]
    {
        let picker = match Picker::from_query_stdio_with_options(query_options()) {
            Ok(picker) => picker,
            Err(err) => {
                tracing::warn!(%err, "terminal graphics query failed");
                return None;
            }
        };
        crate::perf::log_event(
            "image.create_picker",
            format!(
                "term_program={} term={} protocol={:?} font_size={:?}",
                std::env::var("TERM_PROGRAM").unwrap_or_else(|_| "<unset>".to_string()),
                std::env::var("TERM").unwrap_or_else(|_| "<unset>".to_string()),
                picker.protocol_type(),
                picker.font_size(),
            ),
        );
        Some(picker)
    }
}

#[cfg(unix)]
fn query_options() -> QueryStdioOptions {
    let mut options = QueryStdioOptions::default();
    options.timeout = Duration::from_millis(PICKER_QUERY_TIMEOUT_MS);
    options
}
