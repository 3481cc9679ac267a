use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::Message;
use crate::editor::Motion;

pub(super) fn handle_event(event: &Event) -> Option<Message> {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => handle_key(key),
        Event::Resize(w, h) => {
            crate::perf::log_event("event.resize", format!("width={w} height={h}"));
            Some(Message::Resize(*w, *h))
        }
        _ => None,
    }
}

pub(super) fn handle_key(key: &KeyEvent) -> Option<Message> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);

    match key.code {
        KeyCode::Esc => Some(Message::Quit),
        KeyCode::Char('q' | 'c') if ctrl => Some(Message::Quit),
        KeyCode::Char('a') if ctrl => Some(Message::Move(Motion::LineStart)),
        KeyCode::Char('e') if ctrl => Some(Message::Move(Motion::LineEnd)),
        KeyCode::Char(c) if !ctrl && !alt => latin1(c).map(Message::Insert),
        KeyCode::Enter => Some(Message::Newline),
        KeyCode::Backspace => Some(Message::DeleteBack),
        KeyCode::Delete => Some(Message::DeleteForward),
        KeyCode::Left => Some(Message::Move(Motion::Left)),
        KeyCode::Right => Some(Message::Move(Motion::Right)),
        KeyCode::Up => Some(Message::Move(Motion::Up)),
        KeyCode::Down => Some(Message::Move(Motion::Down)),
        KeyCode::Home => Some(Message::Move(Motion::LineStart)),
        KeyCode::End => Some(Message::Move(Motion::LineEnd)),
        _ => None,
    }
}

/// The byte for a character, if it is in the single-byte range.
fn latin1(c: char) -> Option<u8> {
    u8::try_from(u32::from(c)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn ctrl(c: char) -> Event {
        Event::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL))
    }

    #[test]
    fn test_printable_keys_insert() {
        assert_eq!(handle_event(&key(KeyCode::Char('a'))), Some(Message::Insert(b'a')));
        assert_eq!(
            handle_event(&Event::Key(KeyEvent::new(KeyCode::Char('A'), KeyModifiers::SHIFT))),
            Some(Message::Insert(b'A'))
        );
        assert_eq!(handle_event(&key(KeyCode::Char('é'))), Some(Message::Insert(0xE9)));
    }

    #[test]
    fn test_wide_characters_are_ignored() {
        assert_eq!(handle_event(&key(KeyCode::Char('€'))), None);
        assert_eq!(handle_event(&key(KeyCode::Char('日'))), None);
    }

    #[test]
    fn test_editing_keys() {
        assert_eq!(handle_event(&key(KeyCode::Enter)), Some(Message::Newline));
        assert_eq!(handle_event(&key(KeyCode::Backspace)), Some(Message::DeleteBack));
        assert_eq!(handle_event(&key(KeyCode::Delete)), Some(Message::DeleteForward));
    }

    #[test]
    fn test_arrow_keys_move() {
        assert_eq!(
            handle_event(&key(KeyCode::Up)),
            Some(Message::Move(Motion::Up))
        );
        assert_eq!(
            handle_event(&key(KeyCode::End)),
            Some(Message::Move(Motion::LineEnd))
        );
        assert_eq!(handle_event(&ctrl('a')), Some(Message::Move(Motion::LineStart)));
    }

    #[test]
    fn test_quit_keys() {
        assert_eq!(handle_event(&key(KeyCode::Esc)), Some(Message::Quit));
        assert_eq!(handle_event(&ctrl('q')), Some(Message::Quit));
        assert_eq!(handle_event(&ctrl('c')), Some(Message::Quit));
    }

    #[test]
    fn test_ctrl_letters_do_not_insert() {
        assert_eq!(handle_event(&ctrl('x')), None);
    }

    #[test]
    fn test_resize_event() {
        assert_eq!(handle_event(&Event::Resize(100, 40)), Some(Message::Resize(100, 40)));
    }
}
