use crate::app::{Model, ToastLevel};
use crate::arena::ArenaError;
use crate::editor::{Motion, NEWLINE};

/// All possible events and actions in the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    // Editing
    /// Insert one byte at the cursor
    Insert(u8),
    /// Insert a line separator
    Newline,
    /// Delete the byte before the cursor
    DeleteBack,
    /// Delete the byte after the cursor
    DeleteForward,

    // Navigation
    /// Move the cursor
    Move(Motion),

    // Application
    /// Terminal resized to (columns, rows)
    Resize(u16, u16),
    /// Quit the application
    Quit,
}

/// Apply a message to the model.
///
/// # Errors
///
/// Returns an error when a growing buffer cannot get more memory from the
/// arena. That is fatal for the session.
pub fn update(mut model: Model<'_>, msg: Message) -> Result<Model<'_>, ArenaError> {
    match msg {
        Message::Insert(byte) => insert(&mut model, byte)?,
        Message::Newline => insert(&mut model, NEWLINE)?,
        Message::DeleteBack => {
            if model.buffer.delete_before_cursor() {
                model.frame_dirty = true;
            }
        }
        Message::DeleteForward => {
            if model.buffer.delete_after_cursor() {
                model.frame_dirty = true;
            }
        }
        Message::Move(motion) => {
            let before = model.buffer.cursor();
            model.buffer.move_cursor(motion);
            if model.buffer.cursor() != before {
                model.frame_dirty = true;
            }
        }
        Message::Resize(width, height) => {
            model.terminal_size = (width, height);
            model.frame_dirty = true;
        }
        Message::Quit => {
            model.should_quit = true;
        }
    }
    Ok(model)
}

fn insert(model: &mut Model<'_>, byte: u8) -> Result<(), ArenaError> {
    if model.buffer.insert(byte)? {
        model.frame_dirty = true;
    } else {
        model.dropped_inserts += 1;
        let capacity = model.buffer.capacity();
        model.show_toast(
            ToastLevel::Warning,
            format!("Buffer full ({capacity} bytes), input dropped"),
        );
    }
    Ok(())
}
