use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::app::{Model, ToastLevel};
use crate::editor::CapacityPolicy;

pub fn status_text(model: &Model<'_>) -> String {
    let (line, col) = model.buffer.line_col();
    let grow_indicator = match model.buffer.policy() {
        CapacityPolicy::Grow => " [grow]",
        CapacityPolicy::Fixed => "",
    };
    let mode = if model.graphics_enabled() { "" } else { " [text]" };
    let arena = model.status.arena.map_or_else(String::new, |stats| {
        format!(
            "  arena {}/{} KiB",
            stats.used.div_ceil(1024),
            stats.committed / 1024
        )
    });
    let glyphs = if model.graphics_enabled() {
        format!("  glyphs {}", model.status.cached_glyphs)
    } else {
        String::new()
    };
    format!(
        " Ln {}, Col {}  {}/{} bytes{}{}{}{}  Esc:quit",
        line + 1,
        col + 1,
        model.buffer.len(),
        model.buffer.capacity(),
        grow_indicator,
        arena,
        glyphs,
        mode,
    )
}

pub fn render_status_bar(model: &Model<'_>, frame: &mut Frame, area: Rect) {
    let status_bar = Paragraph::new(status_text(model))
        .style(Style::default().bg(Color::DarkGray).fg(Color::White));
    frame.render_widget(status_bar, area);
}

pub fn render_toast_bar(model: &Model<'_>, frame: &mut Frame, area: Rect) {
    let Some((message, level)) = model.active_toast() else {
        return;
    };
    let (prefix, style) = match level {
        ToastLevel::Info => (
            "[info]",
            Style::default().bg(Color::DarkGray).fg(Color::White),
        ),
        ToastLevel::Warning => (
            "[warn]",
            Style::default().bg(Color::Yellow).fg(Color::Black),
        ),
    };
    let toast = Paragraph::new(format!("{prefix} {message}")).style(style);
    frame.render_widget(toast, area);
}
