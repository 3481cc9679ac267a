//! Cursor-centric text storage.
//!
//! Provides an arena-backed gap buffer whose gap always sits at the cursor,
//! so typing and backspacing never move any other bytes.

mod buffer;

pub use buffer::{CapacityPolicy, GapBuffer, Motion, NEWLINE};
