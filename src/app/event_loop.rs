use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event;
use image::DynamicImage;
use ratatui::DefaultTerminal;

use crate::app::{App, Model, Pipeline, ToastLevel, update};
use crate::arena::Arena;
use crate::atlas::FontShaper;

use super::input::handle_event;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

impl App {
    /// Run the main event loop.
    ///
    /// # Errors
    ///
    /// Returns an error if terminal initialization fails, the arena runs out,
    /// the glyph atlas fills up, or the event loop hits an I/O failure.
    pub fn run(&self) -> Result<()> {
        let _run_scope = crate::perf::scope("app.run.total");

        // Create image picker BEFORE initializing terminal (queries stdio)
        let picker = if self.graphics {
            let picker_scope = crate::perf::scope("app.create_picker");
            let picker = crate::image::create_picker(self.force_half_cell);
            drop(picker_scope);
            picker
        } else {
            None
        };

        let mut reservation = self.reserve()?;
        let arena = Arena::new(&mut reservation);
        let buffer = self.make_buffer(&arena)?;
        let mut pipeline = Pipeline::new(
            &arena,
            self.load_shaper()?,
            self.atlas_config(),
            self.sprite_limit,
        )?;

        let init_scope = crate::perf::scope("app.ratatui_init");
        let mut terminal = ratatui::try_init()
            .context("Failed to initialize terminal - typewriter requires an interactive terminal")?;
        let size = terminal.size()?;
        drop(init_scope);

        let mut model = Model::new(buffer, (size.width, size.height));
        model.picker = picker;
        if !model.graphics_enabled() {
            model.show_toast(ToastLevel::Info, "No terminal graphics, showing plain text");
        }

        let result = Self::event_loop(&mut terminal, model, &mut pipeline, &arena);
        ratatui::restore();
        result
    }

    fn event_loop<F: FontShaper>(
        terminal: &mut DefaultTerminal,
        mut model: Model<'_>,
        pipeline: &mut Pipeline<'_, F>,
        arena: &Arena<'_>,
    ) -> Result<()> {
        let mut toast_shown = false;
        loop {
            // The toast row takes space from the text area, so the frame
            // must be resized when it appears or expires.
            let showing = model.active_toast().is_some();
            if showing != toast_shown {
                toast_shown = showing;
                model.frame_dirty = true;
            }
            if model.frame_dirty {
                refresh_frame(&mut model, pipeline, arena)?;
            }

            terminal.draw(|frame| crate::ui::render(&mut model, frame))?;

            if event::poll(POLL_INTERVAL)? {
                let event = event::read()?;
                if let Some(msg) = handle_event(&event) {
                    crate::perf::log_event("app.message", format!("{msg:?}"));
                    model = update(model, msg).context("Text buffer could not grow")?;
                }
            }

            if model.should_quit {
                return Ok(());
            }
        }
    }
}

/// Scroll to the cursor, composite a new frame and hand it to the terminal
/// image protocol.
pub(super) fn refresh_frame<F: FontShaper>(
    model: &mut Model<'_>,
    pipeline: &mut Pipeline<'_, F>,
    arena: &Arena<'_>,
) -> Result<()> {
    let _scope = crate::perf::scope("app.refresh_frame");
    model.frame_dirty = false;

    let Some(picker) = model.picker.as_ref() else {
        // Text mode: one buffer line per row.
        let visible = model.visible_lines(1.0);
        model.ensure_cursor_visible(visible);
        model.status.arena = Some(arena.stats());
        return Ok(());
    };

    let (cell_w, cell_h) = picker.font_size();
    let scale = pipeline.scale();
    let rows_per_line = pipeline.line_height() * scale / f32::from(cell_h.max(1));
    let visible = model.visible_lines(rows_per_line);
    model.ensure_cursor_visible(visible);

    let resolution = [
        f32::from(model.terminal_size.0) * f32::from(cell_w) / scale,
        f32::from(model.text_rows()) * f32::from(cell_h) / scale,
    ];
    pipeline.present(&model.buffer, Some(resolution), model.scroll_line)?;
    model.status = pipeline.status(Some(arena.stats()));

    let frame = pipeline
        .latest_frame()
        .filter(|frame| frame.width() > 0 && frame.height() > 0);
    if let (Some(frame), Some(picker)) = (frame, model.picker.as_ref()) {
        let protocol = picker.new_resize_protocol(DynamicImage::ImageRgba8(frame));
        model.frame_protocol = Some(protocol);
    }
    Ok(())
}
