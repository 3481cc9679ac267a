//! Bump allocation over a single reserved memory region.
//!
//! A [`Reservation`] maps a block of anonymous address space up front. The
//! kernel backs none of it until a page is touched. An [`Arena`] then hands
//! out aligned, non-overlapping slices from the front of that region and
//! commits whole pages as the high-water mark moves past them.
//!
//! ```text
//! 0            used         committed                      reserved
//! ├────────────┼────────────┼──────────────────────────────┤
//! │ allocated  │ committed, │ reserved only (no backing)   │
//! │ blocks     │ unused     │                              │
//! └────────────┴────────────┴──────────────────────────────┘
//! ```
//!
//! There is no per-block free. Every block borrows from the reservation and
//! is reclaimed when the reservation is dropped.

mod vec;

pub use vec::ArenaVec;

use std::cell::{Cell, RefCell};
use std::fmt;

use bytemuck::Pod;
use memmap2::{MmapMut, MmapOptions};
use thiserror::Error;

/// Commit granularity. Alignments above this are rejected because the
/// mapping base is only guaranteed to be page aligned.
pub const PAGE_SIZE: usize = 4096;

/// Errors raised by the arena. All of them are sizing errors fixed at
/// startup, so callers are expected to propagate rather than retry.
#[derive(Debug, Error)]
pub enum ArenaError {
    #[error("failed to reserve {size} bytes of address space")]
    Reserve {
        size: usize,
        #[source]
        source: std::io::Error,
    },
    #[error(
        "arena exhausted: {requested} bytes requested at offset {offset} of a {reserved}-byte reservation"
    )]
    Exhausted {
        requested: usize,
        offset: usize,
        reserved: usize,
    },
    #[error("invalid alignment {0}: must be a power of two no larger than one page")]
    Alignment(usize),
}

/// Snapshot of the arena offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaStats {
    pub reserved: usize,
    pub used: usize,
    pub committed: usize,
}

/// An anonymous mapping of address space, sized in whole pages.
#[derive(Debug)]
pub struct Reservation {
    map: MmapMut,
}

impl Reservation {
    /// Reserve `size` bytes, rounded up to whole pages (at least one).
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::Reserve`] if the mapping cannot be created.
    pub fn reserve(size: usize) -> Result<Self, ArenaError> {
        let size = align_up(size.max(1), PAGE_SIZE).ok_or_else(|| ArenaError::Reserve {
            size,
            source: std::io::Error::from(std::io::ErrorKind::OutOfMemory),
        })?;
        let map = MmapOptions::new()
            .len(size)
            .map_anon()
            .map_err(|source| ArenaError::Reserve { size, source })?;
        tracing::debug!(size, "reserved arena region");
        Ok(Self { map })
    }

    /// Reserved size in bytes.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the reservation is empty (never true after `reserve`).
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Bump allocator over a [`Reservation`].
///
/// Allocation takes `&self` so several owners (the gap buffer, the atlas,
/// the renderer) can keep growing from the same arena. The arena is
/// single-threaded.
pub struct Arena<'r> {
    /// Unallocated tail of the region, starting at `used`.
    free: RefCell<&'r mut [u8]>,
    reserved: usize,
    used: Cell<usize>,
    committed: Cell<usize>,
}

impl<'r> Arena<'r> {
    pub fn new(reservation: &'r mut Reservation) -> Self {
        let region: &'r mut [u8] = &mut reservation.map[..];
        let reserved = region.len();
        Self {
            free: RefCell::new(region),
            reserved,
            used: Cell::new(0),
            committed: Cell::new(0),
        }
    }

    /// Allocate `byte_count` bytes aligned to `alignment`.
    ///
    /// The block contents are unspecified. Pages between the committed mark
    /// and the end of the block are committed first.
    ///
    /// # Errors
    ///
    /// [`ArenaError::Alignment`] for a bad alignment, [`ArenaError::Exhausted`]
    /// if the block would end past the reservation.
    pub fn allocate(&self, byte_count: usize, alignment: usize) -> Result<&'r mut [u8], ArenaError> {
        if !alignment.is_power_of_two() || alignment > PAGE_SIZE {
            return Err(ArenaError::Alignment(alignment));
        }
        let used = self.used.get();
        let end = align_up(used, alignment)
            .and_then(|start| start.checked_add(byte_count))
            .filter(|&end| end <= self.reserved)
            .ok_or(ArenaError::Exhausted {
                requested: byte_count,
                offset: used,
                reserved: self.reserved,
            })?;
        let start = end - byte_count;

        let mut free = self.free.borrow_mut();
        let tail = std::mem::take(&mut *free);

        let committed = self.committed.get();
        if end > committed {
            // `reserved` is a page multiple, so the rounded end never passes it.
            let target = align_up(end, PAGE_SIZE).map_or(self.reserved, |t| t.min(self.reserved));
            // Touching the pages is what makes the kernel back them.
            tail[committed - used..target - used].fill(0);
            self.committed.set(target);
            tracing::debug!(from = committed, to = target, "committed arena pages");
        }

        let (_, rest) = tail.split_at_mut(start - used);
        let (block, rest) = rest.split_at_mut(byte_count);
        *free = rest;
        self.used.set(end);
        Ok(block)
    }

    /// Same as [`Arena::allocate`], with the block zeroed.
    ///
    /// # Errors
    ///
    /// See [`Arena::allocate`].
    pub fn allocate_zeroed(
        &self,
        byte_count: usize,
        alignment: usize,
    ) -> Result<&'r mut [u8], ArenaError> {
        let block = self.allocate(byte_count, alignment)?;
        block.fill(0);
        Ok(block)
    }

    /// Typed, zeroed allocation of `count` values of `T`.
    ///
    /// # Errors
    ///
    /// [`ArenaError::Exhausted`] if the byte size overflows or does not fit.
    pub fn alloc<T: Pod>(&self, count: usize) -> Result<&'r mut [T], ArenaError> {
        let align = std::mem::align_of::<T>();
        let byte_count =
            count
                .checked_mul(std::mem::size_of::<T>())
                .ok_or(ArenaError::Exhausted {
                    requested: usize::MAX,
                    offset: self.used.get(),
                    reserved: self.reserved,
                })?;
        let bytes = self.allocate_zeroed(byte_count, align)?;
        bytemuck::try_cast_slice_mut(bytes).map_err(|_| ArenaError::Alignment(align))
    }

    pub fn stats(&self) -> ArenaStats {
        ArenaStats {
            reserved: self.reserved,
            used: self.used.get(),
            committed: self.committed.get(),
        }
    }

    /// Bytes still available before the reservation is exhausted.
    pub fn remaining(&self) -> usize {
        self.reserved - self.used.get()
    }
}

impl fmt::Debug for Arena<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("reserved", &self.reserved)
            .field("used", &self.used.get())
            .field("committed", &self.committed.get())
            .finish()
    }
}

/// Round `offset` up to a multiple of `alignment` (a power of two).
fn align_up(offset: usize, alignment: usize) -> Option<usize> {
    offset
        .checked_add(alignment - 1)
        .map(|value| value & !(alignment - 1))
}
