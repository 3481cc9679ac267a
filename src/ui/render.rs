use ratatui::prelude::*;
use ratatui::widgets::{Clear, Paragraph};
use ratatui_image::protocol::StatefulProtocolType;
use ratatui_image::{Resize, StatefulImage};

use crate::app::Model;
use crate::editor::NEWLINE;

use super::status;

/// Split the screen into the text area, an optional toast row and the
/// status bar.
pub fn split_areas(area: Rect, toast_active: bool) -> (Rect, Option<Rect>, Rect) {
    let footer_rows = 1 + u16::from(toast_active);
    let text_area = Rect {
        height: area.height.saturating_sub(footer_rows),
        ..area
    };
    let toast_area = toast_active.then(|| Rect {
        y: area.y + area.height.saturating_sub(2),
        height: 1,
        ..area
    });
    let status_area = Rect {
        y: area.y + area.height.saturating_sub(1),
        height: 1,
        ..area
    };
    (text_area, toast_area, status_area)
}

/// Render the complete UI.
pub fn render(model: &mut Model<'_>, frame: &mut Frame) {
    let area = frame.area();
    let (text_area, toast_area, status_area) = split_areas(area, model.active_toast().is_some());

    if let Some(protocol) = model.frame_protocol.as_mut() {
        let resize = if matches!(protocol.protocol_type(), StatefulProtocolType::Halfblocks(_)) {
            // Nearest-neighbor aliases badly in half-cell mode.
            Resize::Scale(Some(image::imageops::FilterType::CatmullRom))
        } else {
            Resize::Scale(None)
        };
        frame.render_widget(Clear, text_area);
        frame.render_stateful_widget(StatefulImage::default().resize(resize), text_area, protocol);
    } else {
        render_text(model, frame, text_area);
    }

    if let Some(toast_area) = toast_area {
        status::render_toast_bar(model, frame, toast_area);
    }
    status::render_status_bar(model, frame, status_area);
}

/// Plain-text fallback: the buffer's lines with the cursor cell inverted.
fn render_text(model: &Model<'_>, frame: &mut Frame, area: Rect) {
    let (cursor_line, cursor_col) = model.buffer.line_col();
    let bytes: Vec<u8> = model.buffer.visible_sequence().collect();
    let gutter_width = line_number_width(bytes.iter().filter(|&&b| b == NEWLINE).count() + 1);

    let content: Vec<Line> = bytes
        .split(|&b| b == NEWLINE)
        .enumerate()
        .skip(model.scroll_line)
        .take(usize::from(area.height))
        .map(|(line_idx, line)| {
            let line_num = format!("{:>width$} ", line_idx + 1, width = usize::from(gutter_width));
            let mut spans = vec![Span::styled(line_num, Style::default().fg(Color::DarkGray))];
            if line_idx == cursor_line {
                let col = cursor_col.min(line.len());
                let before = display_text(&line[..col]);
                let cursor_char = line.get(col).map_or_else(|| " ".to_string(), |&b| display_text(&[b]));
                let after = line.get(col + 1..).map(display_text).unwrap_or_default();

                if !before.is_empty() {
                    spans.push(Span::raw(before));
                }
                spans.push(Span::styled(
                    cursor_char,
                    Style::default().bg(Color::White).fg(Color::Black),
                ));
                if !after.is_empty() {
                    spans.push(Span::raw(after));
                }
            } else {
                spans.push(Span::raw(display_text(line)));
            }
            Line::from(spans)
        })
        .collect();

    frame.render_widget(Clear, area);
    frame.render_widget(Paragraph::new(content), area);
}

/// Bytes as Latin-1 text, with control bytes shown as spaces.
fn display_text(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| if b < 0x20 || b == 0x7f { ' ' } else { char::from(b) })
        .collect()
}

/// Calculate the width needed for line numbers.
pub const fn line_number_width(total_lines: usize) -> u16 {
    if total_lines < 10 {
        1
    } else if total_lines < 100 {
        2
    } else if total_lines < 1000 {
        3
    } else if total_lines < 10000 {
        4
    } else {
        5
    }
}
