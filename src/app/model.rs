use std::time::{Duration, Instant};

use ratatui_image::picker::Picker;
use ratatui_image::protocol::StatefulProtocol;

use crate::arena::ArenaStats;
use crate::editor::GapBuffer;

const TOAST_DURATION: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Warning,
}

#[derive(Debug, Clone)]
struct Toast {
    level: ToastLevel,
    message: String,
    expires_at: Instant,
}

/// Counters from the last presented frame, shown in the status bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStatus {
    pub frames: u64,
    pub glyphs: usize,
    pub sprites: usize,
    pub dropped_sprites: usize,
    pub cached_glyphs: usize,
    pub arena: Option<ArenaStats>,
}

/// The complete application state.
///
/// All state lives here - no global or scattered state. Rendering
/// resources (atlas, renderer, surface) belong to the event loop.
pub struct Model<'r> {
    /// The text being edited
    pub buffer: GapBuffer<'r>,
    /// Terminal size (columns, rows)
    pub terminal_size: (u16, u16),
    /// First buffer line shown at the top of the text area
    pub scroll_line: usize,
    /// Whether the app should exit
    pub should_quit: bool,
    /// Whether the composited frame is stale
    pub frame_dirty: bool,
    /// Graphics protocol picker; `None` means text-only display
    pub picker: Option<Picker>,
    /// Last composited frame, encoded for the terminal
    pub frame_protocol: Option<StatefulProtocol>,
    /// Counters from the last presented frame
    pub status: FrameStatus,
    /// Inserts dropped because the buffer was full
    pub dropped_inserts: usize,
    toast: Option<Toast>,
}

impl<'r> Model<'r> {
    pub fn new(buffer: GapBuffer<'r>, terminal_size: (u16, u16)) -> Self {
        Self {
            buffer,
            terminal_size,
            scroll_line: 0,
            should_quit: false,
            frame_dirty: true,
            picker: None,
            frame_protocol: None,
            status: FrameStatus::default(),
            dropped_inserts: 0,
            toast: None,
        }
    }

    /// Rows available for text, excluding the status bar and any toast row.
    pub fn text_rows(&self) -> u16 {
        let footer_rows = 1 + u16::from(self.active_toast().is_some());
        self.terminal_size.1.saturating_sub(footer_rows)
    }

    /// Whether frames are shown as images rather than plain text.
    pub const fn graphics_enabled(&self) -> bool {
        self.picker.is_some()
    }

    /// Visible text lines, given the height of one line in terminal rows.
    ///
    /// In text mode one buffer line is one terminal row.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn visible_lines(&self, rows_per_line: f32) -> usize {
        let rows = f32::from(self.text_rows());
        if rows_per_line <= 0.0 {
            return usize::from(self.text_rows()).max(1);
        }
        ((rows / rows_per_line).floor() as usize).max(1)
    }

    /// Scroll so the cursor line is within `visible_lines` of the top.
    pub fn ensure_cursor_visible(&mut self, visible_lines: usize) {
        let (line, _) = self.buffer.line_col();
        let visible = visible_lines.max(1);
        if line < self.scroll_line {
            self.scroll_line = line;
        } else if line >= self.scroll_line + visible {
            self.scroll_line = line + 1 - visible;
        }
    }

    pub fn show_toast(&mut self, level: ToastLevel, message: impl Into<String>) {
        self.toast = Some(Toast {
            level,
            message: message.into(),
            expires_at: Instant::now() + TOAST_DURATION,
        });
        self.frame_dirty = true;
    }

    pub fn active_toast(&self) -> Option<(&str, ToastLevel)> {
        self.toast
            .as_ref()
            .filter(|toast| Instant::now() < toast.expires_at)
            .map(|toast| (toast.message.as_str(), toast.level))
    }
}

impl std::fmt::Debug for Model<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("buffer", &self.buffer)
            .field("terminal_size", &self.terminal_size)
            .field("scroll_line", &self.scroll_line)
            .field("should_quit", &self.should_quit)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}
