use crate::arena::{Arena, ArenaError};

/// Line separator byte.
pub const NEWLINE: u8 = b'\n';

/// What to do when an insertion finds the gap empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CapacityPolicy {
    /// Drop the byte and leave the buffer unchanged.
    #[default]
    Fixed,
    /// Take a larger block from the arena and keep going.
    Grow,
}

/// Cursor motions available to the key handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Left,
    Right,
    Up,
    Down,
    LineStart,
    LineEnd,
}

/// A gap buffer over a single arena block.
///
/// Layout of `storage` (capacity `C`):
///
/// ```text
/// [0, cursor)        front segment, text before the cursor
/// [cursor, gap_end)  gap, contents undefined
/// [gap_end, C)       back segment, text after the cursor
/// ```
///
/// `0 <= cursor <= gap_end <= C` holds after every operation.
pub struct GapBuffer<'r> {
    arena: &'r Arena<'r>,
    storage: &'r mut [u8],
    cursor: usize,
    gap_end: usize,
    policy: CapacityPolicy,
    /// Column remembered across consecutive vertical moves (sticky column).
    preferred_column: Option<usize>,
}

impl<'r> GapBuffer<'r> {
    /// Create an empty buffer of `capacity` bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the arena cannot hold the storage block.
    pub fn new(
        arena: &'r Arena<'r>,
        capacity: usize,
        policy: CapacityPolicy,
    ) -> Result<Self, ArenaError> {
        let storage = arena.allocate(capacity, 1)?;
        Ok(Self {
            arena,
            storage,
            cursor: 0,
            gap_end: capacity,
            policy,
            preferred_column: None,
        })
    }

    /// Logical cursor position (bytes before the cursor).
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Size of the storage block.
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Free bytes left in the gap.
    pub const fn gap_len(&self) -> usize {
        self.gap_end - self.cursor
    }

    /// Number of content bytes.
    pub fn len(&self) -> usize {
        self.cursor + (self.storage.len() - self.gap_end)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub const fn policy(&self) -> CapacityPolicy {
        self.policy
    }

    /// Text before the cursor.
    pub fn front(&self) -> &[u8] {
        &self.storage[..self.cursor]
    }

    /// Text after the cursor.
    pub fn back(&self) -> &[u8] {
        &self.storage[self.gap_end..]
    }

    /// The content in logical order: the front segment, then the back one.
    ///
    /// The iterator is cheap to clone, so it can be walked more than once.
    pub fn visible_sequence(&self) -> impl Iterator<Item = u8> + Clone + '_ {
        self.front().iter().chain(self.back()).copied()
    }

    /// The content as a string, one `char` per byte.
    pub fn text(&self) -> String {
        self.visible_sequence().map(char::from).collect()
    }

    /// Zero-based line and column of the cursor.
    pub fn line_col(&self) -> (usize, usize) {
        let line = self.front().iter().filter(|&&b| b == NEWLINE).count();
        (line, self.cursor - self.line_start_before(self.cursor))
    }

    /// Insert a byte at the cursor.
    ///
    /// Returns `Ok(false)` when the gap is empty under
    /// [`CapacityPolicy::Fixed`]; nothing is written in that case.
    ///
    /// # Errors
    ///
    /// Under [`CapacityPolicy::Grow`], returns an error if the arena cannot
    /// hold the larger block.
    pub fn insert(&mut self, byte: u8) -> Result<bool, ArenaError> {
        if self.cursor == self.gap_end {
            match self.policy {
                CapacityPolicy::Fixed => {
                    tracing::debug!(capacity = self.capacity(), "gap exhausted, dropping insert");
                    return Ok(false);
                }
                CapacityPolicy::Grow => self.grow()?,
            }
        }
        self.storage[self.cursor] = byte;
        self.cursor += 1;
        self.preferred_column = None;
        Ok(true)
    }

    /// Insert bytes at the cursor, stopping at the first dropped byte.
    ///
    /// Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// See [`GapBuffer::insert`].
    pub fn insert_str(&mut self, bytes: &[u8]) -> Result<usize, ArenaError> {
        let mut written = 0;
        for &byte in bytes {
            if !self.insert(byte)? {
                break;
            }
            written += 1;
        }
        Ok(written)
    }

    /// Remove the byte before the cursor (Backspace).
    ///
    /// Returns `true` if a byte was removed.
    pub fn delete_before_cursor(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        self.preferred_column = None;
        true
    }

    /// Remove the byte after the cursor (Delete).
    ///
    /// Returns `true` if a byte was removed.
    pub fn delete_after_cursor(&mut self) -> bool {
        if self.gap_end == self.storage.len() {
            return false;
        }
        self.gap_end += 1;
        self.preferred_column = None;
        true
    }

    /// Move the cursor in the given direction.
    pub fn move_cursor(&mut self, motion: Motion) {
        match motion {
            Motion::Left => self.move_left(),
            Motion::Right => self.move_right(),
            Motion::Up => self.move_up(),
            Motion::Down => self.move_down(),
            Motion::LineStart => self.move_to_line_start(),
            Motion::LineEnd => self.move_to_line_end(),
        }
    }

    /// Move one byte from the end of the front segment to the start of the
    /// back segment.
    pub fn move_left(&mut self) {
        self.preferred_column = None;
        if self.cursor > 0 {
            self.cursor -= 1;
            self.gap_end -= 1;
            self.storage[self.gap_end] = self.storage[self.cursor];
        }
    }

    /// Move one byte from the start of the back segment to the end of the
    /// front segment.
    pub fn move_right(&mut self) {
        self.preferred_column = None;
        if self.gap_end < self.storage.len() {
            self.storage[self.cursor] = self.storage[self.gap_end];
            self.cursor += 1;
            self.gap_end += 1;
        }
    }

    /// Move to the same column on the previous line, clamped to its length.
    ///
    /// No-op on the first line.
    pub fn move_up(&mut self) {
        let start = self.line_start_before(self.cursor);
        if start == 0 {
            return;
        }
        let column = self.preferred_column.unwrap_or(self.cursor - start);
        // `start - 1` is the separator that ends the previous line.
        let prev_end = start - 1;
        let prev_start = self.line_start_before(prev_end);
        self.seek(prev_start + column.min(prev_end - prev_start));
        self.preferred_column = Some(column);
    }

    /// Move to the same column on the next line, clamped to its length.
    ///
    /// No-op on the last line.
    pub fn move_down(&mut self) {
        let end = self.line_end_after(self.cursor);
        if end == self.len() {
            return;
        }
        let start = self.line_start_before(self.cursor);
        let column = self.preferred_column.unwrap_or(self.cursor - start);
        let next_start = end + 1;
        let next_end = self.line_end_after(next_start);
        self.seek(next_start + column.min(next_end - next_start));
        self.preferred_column = Some(column);
    }

    /// Move to just after the previous separator, or to the buffer start.
    pub fn move_to_line_start(&mut self) {
        self.preferred_column = None;
        self.seek(self.line_start_before(self.cursor));
    }

    /// Move to just before the next separator, or to the buffer end.
    pub fn move_to_line_end(&mut self) {
        self.preferred_column = None;
        self.seek(self.line_end_after(self.cursor));
    }

    // --- Private helpers ---

    /// Start of the line containing logical position `pos` (`pos <= cursor`).
    fn line_start_before(&self, pos: usize) -> usize {
        self.storage[..pos]
            .iter()
            .rposition(|&b| b == NEWLINE)
            .map_or(0, |i| i + 1)
    }

    /// Position of the separator ending the line at logical position `pos`
    /// (`pos >= cursor`), or the content length on the last line.
    fn line_end_after(&self, pos: usize) -> usize {
        let offset = self.gap_end + (pos - self.cursor);
        self.storage[offset..]
            .iter()
            .position(|&b| b == NEWLINE)
            .map_or(self.len(), |i| pos + i)
    }

    /// Move the gap so the cursor lands on logical position `target`.
    ///
    /// Bytes between the old and new cursor are copied across the gap in a
    /// single block move.
    fn seek(&mut self, target: usize) {
        let target = target.min(self.len());
        if target < self.cursor {
            let shift = self.cursor - target;
            self.storage
                .copy_within(target..self.cursor, self.gap_end - shift);
            self.cursor = target;
            self.gap_end -= shift;
        } else if target > self.cursor {
            let shift = target - self.cursor;
            self.storage
                .copy_within(self.gap_end..self.gap_end + shift, self.cursor);
            self.cursor += shift;
            self.gap_end += shift;
        }
    }

    /// Replace the storage with a larger arena block, keeping the cursor.
    fn grow(&mut self) -> Result<(), ArenaError> {
        let old_capacity = self.storage.len();
        let capacity = (old_capacity * 2).max(old_capacity + 1);
        let storage = self.arena.allocate(capacity, 1)?;

        let back_len = old_capacity - self.gap_end;
        storage[..self.cursor].copy_from_slice(&self.storage[..self.cursor]);
        storage[capacity - back_len..].copy_from_slice(&self.storage[self.gap_end..]);

        self.storage = storage;
        self.gap_end = capacity - back_len;
        tracing::debug!(old_capacity, capacity, "grew gap buffer");
        Ok(())
    }
}

impl std::fmt::Debug for GapBuffer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GapBuffer")
            .field("capacity", &self.storage.len())
            .field("cursor", &self.cursor)
            .field("gap_end", &self.gap_end)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Reservation;

    fn type_bytes(buf: &mut GapBuffer<'_>, bytes: &[u8]) {
        for &b in bytes {
            buf.insert(b).unwrap();
        }
    }

    // --- Construction and basic queries ---

    #[test]
    fn test_new_buffer_is_empty() {
        let mut reservation = Reservation::reserve(4096).unwrap();
        let arena = Arena::new(&mut reservation);
        let buf = GapBuffer::new(&arena, 16, CapacityPolicy::Fixed).unwrap();
        assert!(buf.is_empty());
        assert_eq!(buf.cursor(), 0);
        assert_eq!(buf.gap_len(), 16);
        assert_eq!(buf.visible_sequence().count(), 0);
    }

    #[test]
    fn test_storage_comes_from_arena() {
        let mut reservation = Reservation::reserve(4096).unwrap();
        let arena = Arena::new(&mut reservation);
        let _buf = GapBuffer::new(&arena, 100, CapacityPolicy::Fixed).unwrap();
        assert_eq!(arena.stats().used, 100);
    }

    // --- Scenario: "ab\ncd" in a 10-byte buffer ---

    #[test]
    fn test_typing_two_lines() {
        let mut reservation = Reservation::reserve(4096).unwrap();
        let arena = Arena::new(&mut reservation);
        let mut buf = GapBuffer::new(&arena, 10, CapacityPolicy::Fixed).unwrap();
        type_bytes(&mut buf, b"ab\ncd");

        assert_eq!(buf.cursor(), 5);
        assert_eq!(buf.visible_sequence().collect::<Vec<_>>(), b"ab\ncd");
        assert_eq!(buf.line_col(), (1, 2));
    }

    #[test]
    fn test_line_start_then_end_spans_last_line() {
        let mut reservation = Reservation::reserve(4096).unwrap();
        let arena = Arena::new(&mut reservation);
        let mut buf = GapBuffer::new(&arena, 10, CapacityPolicy::Fixed).unwrap();
        type_bytes(&mut buf, b"ab\ncd");

        buf.move_to_line_start();
        let start = buf.cursor();
        buf.move_to_line_end();
        let end = buf.cursor();

        assert_eq!(start, 3);
        assert_eq!(end, 5);
        let text = buf.visible_sequence().collect::<Vec<_>>();
        assert_eq!(&text[start..end], b"cd");
    }

    #[test]
    fn test_move_up_from_end_lands_after_first_line() {
        let mut reservation = Reservation::reserve(4096).unwrap();
        let arena = Arena::new(&mut reservation);
        let mut buf = GapBuffer::new(&arena, 10, CapacityPolicy::Fixed).unwrap();
        type_bytes(&mut buf, b"ab\ncd");

        buf.move_up();
        assert_eq!(buf.cursor(), 2);
        assert_eq!(buf.line_col(), (0, 2));
        assert_eq!(buf.text(), "ab\ncd");
    }

    // --- Insertion and capacity ---

    #[test]
    fn test_insert_in_middle() {
        let mut reservation = Reservation::reserve(4096).unwrap();
        let arena = Arena::new(&mut reservation);
        let mut buf = GapBuffer::new(&arena, 8, CapacityPolicy::Fixed).unwrap();
        type_bytes(&mut buf, b"hllo");
        buf.move_to_line_start();
        buf.move_right();
        buf.insert(b'e').unwrap();
        assert_eq!(buf.text(), "hello");
        assert_eq!(buf.cursor(), 2);
    }

    #[test]
    fn test_insert_when_full_is_dropped() {
        let mut reservation = Reservation::reserve(4096).unwrap();
        let arena = Arena::new(&mut reservation);
        let mut buf = GapBuffer::new(&arena, 3, CapacityPolicy::Fixed).unwrap();
        assert_eq!(buf.insert_str(b"abc").unwrap(), 3);
        assert_eq!(buf.gap_len(), 0);

        assert!(!buf.insert(b'd').unwrap());
        assert_eq!(buf.text(), "abc");
        assert_eq!(buf.cursor(), 3);
    }

    #[test]
    fn test_insert_when_full_with_cursor_in_middle_is_dropped() {
        let mut reservation = Reservation::reserve(4096).unwrap();
        let arena = Arena::new(&mut reservation);
        let mut buf = GapBuffer::new(&arena, 3, CapacityPolicy::Fixed).unwrap();
        type_bytes(&mut buf, b"abc");
        buf.move_left();
        buf.move_left();

        assert!(!buf.insert(b'x').unwrap());
        assert_eq!(buf.text(), "abc");
        assert_eq!(buf.cursor(), 1);
    }

    #[test]
    fn test_zero_capacity_drops_everything() {
        let mut reservation = Reservation::reserve(4096).unwrap();
        let arena = Arena::new(&mut reservation);
        let mut buf = GapBuffer::new(&arena, 0, CapacityPolicy::Fixed).unwrap();
        assert_eq!(buf.insert_str(b"abc").unwrap(), 0);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_insert_str_stops_at_capacity() {
        let mut reservation = Reservation::reserve(4096).unwrap();
        let arena = Arena::new(&mut reservation);
        let mut buf = GapBuffer::new(&arena, 4, CapacityPolicy::Fixed).unwrap();
        assert_eq!(buf.insert_str(b"abcdef").unwrap(), 4);
        assert_eq!(buf.text(), "abcd");
    }

    #[test]
    fn test_grow_policy_keeps_cursor_and_content() {
        let mut reservation = Reservation::reserve(4096).unwrap();
        let arena = Arena::new(&mut reservation);
        let mut buf = GapBuffer::new(&arena, 2, CapacityPolicy::Grow).unwrap();
        type_bytes(&mut buf, b"ad");
        buf.move_left();
        type_bytes(&mut buf, b"bc");

        assert_eq!(buf.text(), "abcd");
        assert_eq!(buf.cursor(), 3);
        assert!(buf.capacity() >= 4);
        buf.move_to_line_end();
        assert_eq!(buf.cursor(), 4);
    }

    #[test]
    fn test_grow_from_zero_capacity() {
        let mut reservation = Reservation::reserve(4096).unwrap();
        let arena = Arena::new(&mut reservation);
        let mut buf = GapBuffer::new(&arena, 0, CapacityPolicy::Grow).unwrap();
        assert_eq!(buf.insert_str(b"hello").unwrap(), 5);
        assert_eq!(buf.text(), "hello");
    }

    #[test]
    fn test_grow_failure_surfaces_arena_error() {
        let mut reservation = Reservation::reserve(4096).unwrap();
        let arena = Arena::new(&mut reservation);
        let mut buf = GapBuffer::new(&arena, 3000, CapacityPolicy::Grow).unwrap();
        for _ in 0..3000 {
            buf.insert(b'x').unwrap();
        }
        assert!(matches!(buf.insert(b'y'), Err(ArenaError::Exhausted { .. })));
        assert_eq!(buf.len(), 3000);
    }

    // --- Deletion ---

    #[test]
    fn test_delete_before_cursor_at_start_is_noop() {
        let mut reservation = Reservation::reserve(4096).unwrap();
        let arena = Arena::new(&mut reservation);
        let mut buf = GapBuffer::new(&arena, 8, CapacityPolicy::Fixed).unwrap();
        assert!(!buf.delete_before_cursor());
        type_bytes(&mut buf, b"ab");
        buf.move_to_line_start();
        assert!(!buf.delete_before_cursor());
        assert_eq!(buf.text(), "ab");
    }

    #[test]
    fn test_delete_before_cursor_keeps_back_segment() {
        let mut reservation = Reservation::reserve(4096).unwrap();
        let arena = Arena::new(&mut reservation);
        let mut buf = GapBuffer::new(&arena, 8, CapacityPolicy::Fixed).unwrap();
        type_bytes(&mut buf, b"abc");
        buf.move_left();
        assert!(buf.delete_before_cursor());
        assert_eq!(buf.text(), "ac");
        assert_eq!(buf.cursor(), 1);
    }

    #[test]
    fn test_delete_after_cursor() {
        let mut reservation = Reservation::reserve(4096).unwrap();
        let arena = Arena::new(&mut reservation);
        let mut buf = GapBuffer::new(&arena, 8, CapacityPolicy::Fixed).unwrap();
        type_bytes(&mut buf, b"abc");
        assert!(!buf.delete_after_cursor());
        buf.move_to_line_start();
        assert!(buf.delete_after_cursor());
        assert_eq!(buf.text(), "bc");
        assert_eq!(buf.cursor(), 0);
    }

    #[test]
    fn test_delete_frees_gap_for_insert() {
        let mut reservation = Reservation::reserve(4096).unwrap();
        let arena = Arena::new(&mut reservation);
        let mut buf = GapBuffer::new(&arena, 2, CapacityPolicy::Fixed).unwrap();
        type_bytes(&mut buf, b"ab");
        buf.delete_before_cursor();
        assert!(buf.insert(b'z').unwrap());
        assert_eq!(buf.text(), "az");
    }

    // --- Horizontal motion ---

    #[test]
    fn test_move_left_and_right_at_edges_are_noops() {
        let mut reservation = Reservation::reserve(4096).unwrap();
        let arena = Arena::new(&mut reservation);
        let mut buf = GapBuffer::new(&arena, 8, CapacityPolicy::Fixed).unwrap();
        type_bytes(&mut buf, b"ab");
        buf.move_right();
        assert_eq!(buf.cursor(), 2);
        buf.move_left();
        buf.move_left();
        buf.move_left();
        assert_eq!(buf.cursor(), 0);
        assert_eq!(buf.text(), "ab");
    }

    #[test]
    fn test_move_left_then_right_restores_position() {
        let mut reservation = Reservation::reserve(4096).unwrap();
        let arena = Arena::new(&mut reservation);
        let mut buf = GapBuffer::new(&arena, 8, CapacityPolicy::Fixed).unwrap();
        type_bytes(&mut buf, b"abcd");
        buf.move_left();
        buf.move_left();
        let cursor = buf.cursor();

        buf.move_left();
        buf.move_right();
        assert_eq!(buf.cursor(), cursor);
        buf.move_right();
        buf.move_left();
        assert_eq!(buf.cursor(), cursor);
        assert_eq!(buf.text(), "abcd");
    }

    // --- Vertical motion ---

    #[test]
    fn test_move_up_on_first_line_is_noop() {
        let mut reservation = Reservation::reserve(4096).unwrap();
        let arena = Arena::new(&mut reservation);
        let mut buf = GapBuffer::new(&arena, 16, CapacityPolicy::Fixed).unwrap();
        type_bytes(&mut buf, b"hello");
        buf.move_left();
        buf.move_up();
        assert_eq!(buf.cursor(), 4);
    }

    #[test]
    fn test_move_down_on_last_line_is_noop() {
        let mut reservation = Reservation::reserve(4096).unwrap();
        let arena = Arena::new(&mut reservation);
        let mut buf = GapBuffer::new(&arena, 16, CapacityPolicy::Fixed).unwrap();
        type_bytes(&mut buf, b"a\nbc");
        buf.move_down();
        assert_eq!(buf.cursor(), 4);
    }

    #[test]
    fn test_move_down_preserves_column() {
        let mut reservation = Reservation::reserve(4096).unwrap();
        let arena = Arena::new(&mut reservation);
        let mut buf = GapBuffer::new(&arena, 32, CapacityPolicy::Fixed).unwrap();
        type_bytes(&mut buf, b"hello\nworld");
        buf.move_up();
        assert_eq!(buf.line_col(), (0, 5));
        buf.move_to_line_start();
        buf.move_right();
        buf.move_right();
        buf.move_down();
        assert_eq!(buf.line_col(), (1, 2));
        assert_eq!(buf.cursor(), 8);
    }

    #[test]
    fn test_move_up_clamps_to_shorter_line() {
        let mut reservation = Reservation::reserve(4096).unwrap();
        let arena = Arena::new(&mut reservation);
        let mut buf = GapBuffer::new(&arena, 32, CapacityPolicy::Fixed).unwrap();
        type_bytes(&mut buf, b"hi\nhello");
        buf.move_left();
        buf.move_up();
        assert_eq!(buf.line_col(), (0, 2));
        assert_eq!(buf.cursor(), 2);
    }

    #[test]
    fn test_move_down_clamps_to_shorter_line() {
        let mut reservation = Reservation::reserve(4096).unwrap();
        let arena = Arena::new(&mut reservation);
        let mut buf = GapBuffer::new(&arena, 32, CapacityPolicy::Fixed).unwrap();
        type_bytes(&mut buf, b"hello\nhi\nthere");
        buf.move_up();
        buf.move_up();
        assert_eq!(buf.line_col(), (0, 5));
        buf.move_down();
        // Stops at the end of "hi" instead of spilling onto "there".
        assert_eq!(buf.line_col(), (1, 2));
    }

    #[test]
    fn test_sticky_column_across_short_line() {
        let mut reservation = Reservation::reserve(4096).unwrap();
        let arena = Arena::new(&mut reservation);
        let mut buf = GapBuffer::new(&arena, 32, CapacityPolicy::Fixed).unwrap();
        type_bytes(&mut buf, b"hello\nhi\nworld");
        buf.move_left();
        assert_eq!(buf.line_col(), (2, 4));
        buf.move_up();
        assert_eq!(buf.line_col(), (1, 2));
        buf.move_up();
        assert_eq!(buf.line_col(), (0, 4));
    }

    #[test]
    fn test_horizontal_move_resets_sticky_column() {
        let mut reservation = Reservation::reserve(4096).unwrap();
        let arena = Arena::new(&mut reservation);
        let mut buf = GapBuffer::new(&arena, 32, CapacityPolicy::Fixed).unwrap();
        type_bytes(&mut buf, b"hello\nhi\nworld");
        buf.move_up();
        assert_eq!(buf.line_col(), (1, 2));
        buf.move_left();
        buf.move_up();
        assert_eq!(buf.line_col(), (0, 1));
    }

    #[test]
    fn test_vertical_motion_across_empty_line() {
        let mut reservation = Reservation::reserve(4096).unwrap();
        let arena = Arena::new(&mut reservation);
        let mut buf = GapBuffer::new(&arena, 32, CapacityPolicy::Fixed).unwrap();
        type_bytes(&mut buf, b"abc\n\nxyz");
        buf.move_up();
        assert_eq!(buf.line_col(), (1, 0));
        assert_eq!(buf.cursor(), 4);
        buf.move_up();
        assert_eq!(buf.line_col(), (0, 3));
        buf.move_down();
        buf.move_down();
        assert_eq!(buf.line_col(), (2, 3));
        assert_eq!(buf.text(), "abc\n\nxyz");
    }

    // --- Line start / end ---

    #[test]
    fn test_line_start_on_first_line_goes_to_zero() {
        let mut reservation = Reservation::reserve(4096).unwrap();
        let arena = Arena::new(&mut reservation);
        let mut buf = GapBuffer::new(&arena, 16, CapacityPolicy::Fixed).unwrap();
        type_bytes(&mut buf, b"abc");
        buf.move_to_line_start();
        assert_eq!(buf.cursor(), 0);
    }

    #[test]
    fn test_line_end_stops_before_separator() {
        let mut reservation = Reservation::reserve(4096).unwrap();
        let arena = Arena::new(&mut reservation);
        let mut buf = GapBuffer::new(&arena, 16, CapacityPolicy::Fixed).unwrap();
        type_bytes(&mut buf, b"abc\ndef");
        buf.move_up();
        buf.move_to_line_start();
        buf.move_to_line_end();
        assert_eq!(buf.cursor(), 3);
    }

    #[test]
    fn test_move_cursor_dispatch() {
        let mut reservation = Reservation::reserve(4096).unwrap();
        let arena = Arena::new(&mut reservation);
        let mut buf = GapBuffer::new(&arena, 16, CapacityPolicy::Fixed).unwrap();
        type_bytes(&mut buf, b"ab\ncd");
        buf.move_cursor(Motion::Up);
        buf.move_cursor(Motion::LineStart);
        buf.move_cursor(Motion::Right);
        assert_eq!(buf.cursor(), 1);
        buf.move_cursor(Motion::Down);
        buf.move_cursor(Motion::LineEnd);
        buf.move_cursor(Motion::Left);
        assert_eq!(buf.cursor(), 4);
    }

    #[test]
    fn test_visible_sequence_is_restartable() {
        let mut reservation = Reservation::reserve(4096).unwrap();
        let arena = Arena::new(&mut reservation);
        let mut buf = GapBuffer::new(&arena, 16, CapacityPolicy::Fixed).unwrap();
        type_bytes(&mut buf, b"abcdef");
        buf.move_left();
        buf.move_left();

        let seq = buf.visible_sequence();
        let first: Vec<u8> = seq.clone().collect();
        let second: Vec<u8> = seq.collect();
        assert_eq!(first, b"abcdef");
        assert_eq!(first, second);
        assert_eq!(buf.front(), b"abcd");
        assert_eq!(buf.back(), b"ef");
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone, Copy)]
        enum Op {
            Insert(u8),
            Backspace,
            Delete,
            Move(Motion),
        }

        fn op_strategy() -> impl Strategy<Value = Op> {
            prop_oneof![
                4 => prop_oneof![Just(b'a'), Just(b'b'), Just(b'\n'), Just(b' ')].prop_map(Op::Insert),
                1 => Just(Op::Backspace),
                1 => Just(Op::Delete),
                1 => Just(Op::Move(Motion::Left)),
                1 => Just(Op::Move(Motion::Right)),
                1 => Just(Op::Move(Motion::Up)),
                1 => Just(Op::Move(Motion::Down)),
                1 => Just(Op::Move(Motion::LineStart)),
                1 => Just(Op::Move(Motion::LineEnd)),
            ]
        }

        /// Plain `Vec` editor with the same semantics.
        #[derive(Debug, Default)]
        struct Model {
            text: Vec<u8>,
            cursor: usize,
            capacity: usize,
            sticky: Option<usize>,
        }

        impl Model {
            fn line_start(&self, pos: usize) -> usize {
                self.text[..pos]
                    .iter()
                    .rposition(|&b| b == NEWLINE)
                    .map_or(0, |i| i + 1)
            }

            fn line_end(&self, pos: usize) -> usize {
                self.text[pos..]
                    .iter()
                    .position(|&b| b == NEWLINE)
                    .map_or(self.text.len(), |i| pos + i)
            }

            fn apply(&mut self, op: Op) {
                match op {
                    Op::Insert(b) => {
                        if self.text.len() < self.capacity {
                            self.text.insert(self.cursor, b);
                            self.cursor += 1;
                            self.sticky = None;
                        }
                    }
                    Op::Backspace => {
                        if self.cursor > 0 {
                            self.cursor -= 1;
                            self.text.remove(self.cursor);
                            self.sticky = None;
                        }
                    }
                    Op::Delete => {
                        if self.cursor < self.text.len() {
                            self.text.remove(self.cursor);
                            self.sticky = None;
                        }
                    }
                    Op::Move(Motion::Left) => {
                        self.cursor = self.cursor.saturating_sub(1);
                        self.sticky = None;
                    }
                    Op::Move(Motion::Right) => {
                        self.cursor = (self.cursor + 1).min(self.text.len());
                        self.sticky = None;
                    }
                    Op::Move(Motion::LineStart) => {
                        self.cursor = self.line_start(self.cursor);
                        self.sticky = None;
                    }
                    Op::Move(Motion::LineEnd) => {
                        self.cursor = self.line_end(self.cursor);
                        self.sticky = None;
                    }
                    Op::Move(Motion::Up) => {
                        let start = self.line_start(self.cursor);
                        if start > 0 {
                            let column = self.sticky.unwrap_or(self.cursor - start);
                            let prev_start = self.line_start(start - 1);
                            let prev_len = start - 1 - prev_start;
                            self.cursor = prev_start + column.min(prev_len);
                            self.sticky = Some(column);
                        }
                    }
                    Op::Move(Motion::Down) => {
                        let end = self.line_end(self.cursor);
                        if end < self.text.len() {
                            let column =
                                self.sticky.unwrap_or(self.cursor - self.line_start(self.cursor));
                            let next_start = end + 1;
                            let next_len = self.line_end(next_start) - next_start;
                            self.cursor = next_start + column.min(next_len);
                            self.sticky = Some(column);
                        }
                    }
                }
            }
        }

        proptest! {
            #[test]
            fn matches_reference_model(
                capacity in 0..48usize,
                ops in proptest::collection::vec(op_strategy(), 0..200),
            ) {
                let mut reservation = Reservation::reserve(4096).unwrap();
                let arena = Arena::new(&mut reservation);
                let mut buf = GapBuffer::new(&arena, capacity, CapacityPolicy::Fixed).unwrap();
                let mut model = Model { capacity, ..Model::default() };

                for op in ops {
                    match op {
                        Op::Insert(b) => {
                            buf.insert(b).unwrap();
                        }
                        Op::Backspace => {
                            buf.delete_before_cursor();
                        }
                        Op::Delete => {
                            buf.delete_after_cursor();
                        }
                        Op::Move(motion) => buf.move_cursor(motion),
                    }
                    model.apply(op);

                    prop_assert_eq!(buf.visible_sequence().collect::<Vec<_>>(), model.text.clone());
                    prop_assert_eq!(buf.cursor(), model.cursor);
                    // front + gap + back fill the block exactly.
                    prop_assert_eq!(buf.front().len(), model.cursor);
                    prop_assert_eq!(buf.back().len(), model.text.len() - model.cursor);
                    prop_assert_eq!(buf.gap_len(), model.capacity - model.text.len());
                }
            }

            #[test]
            fn grow_policy_never_drops(
                bytes in proptest::collection::vec(any::<u8>(), 0..300),
            ) {
                let mut reservation = Reservation::reserve(1 << 16).unwrap();
                let arena = Arena::new(&mut reservation);
                let mut buf = GapBuffer::new(&arena, 1, CapacityPolicy::Grow).unwrap();
                prop_assert_eq!(buf.insert_str(&bytes).unwrap(), bytes.len());
                prop_assert_eq!(buf.visible_sequence().collect::<Vec<_>>(), bytes);
            }

            #[test]
            fn left_right_round_trip(
                text in proptest::collection::vec(prop_oneof![Just(b'x'), Just(b'\n')], 2..40),
                steps_back in 1..39usize,
            ) {
                let mut reservation = Reservation::reserve(4096).unwrap();
                let arena = Arena::new(&mut reservation);
                let mut buf = GapBuffer::new(&arena, 64, CapacityPolicy::Fixed).unwrap();
                buf.insert_str(&text).unwrap();
                // Interior position: 0 < cursor < len.
                for _ in 0..steps_back.min(text.len() - 1) {
                    buf.move_left();
                }
                let cursor = buf.cursor();

                buf.move_left();
                buf.move_right();
                prop_assert_eq!(buf.cursor(), cursor);
                buf.move_right();
                buf.move_left();
                prop_assert_eq!(buf.cursor(), cursor);
                prop_assert_eq!(buf.visible_sequence().collect::<Vec<_>>(), text);
            }
        }
    }
}
