use bytemuck::Pod;

use super::{Arena, ArenaError};

/// Append-only list of plain-data values stored in an [`Arena`].
///
/// When the backing block is full a block of twice the capacity is taken
/// from the arena and the live values are copied over. The old block stays
/// with the arena until the reservation is dropped.
pub struct ArenaVec<'r, T: Pod> {
    arena: &'r Arena<'r>,
    items: &'r mut [T],
    len: usize,
}

impl<'r, T: Pod> ArenaVec<'r, T> {
    const MIN_CAPACITY: usize = 8;

    /// Create a list with room for `capacity` values before the first growth.
    ///
    /// # Errors
    ///
    /// Returns an error if the arena cannot hold the initial block.
    pub fn with_capacity(arena: &'r Arena<'r>, capacity: usize) -> Result<Self, ArenaError> {
        let items = arena.alloc::<T>(capacity)?;
        Ok(Self {
            arena,
            items,
            len: 0,
        })
    }

    /// Append a value, growing through the arena when full.
    ///
    /// # Errors
    ///
    /// Returns an error if the arena cannot hold the grown block.
    pub fn push(&mut self, value: T) -> Result<(), ArenaError> {
        if self.len == self.items.len() {
            self.grow()?;
        }
        self.items[self.len] = value;
        self.len += 1;
        Ok(())
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items[..self.len]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.items.len()
    }

    fn grow(&mut self) -> Result<(), ArenaError> {
        let capacity = (self.items.len() * 2).max(Self::MIN_CAPACITY);
        let items = self.arena.alloc::<T>(capacity)?;
        items[..self.len].copy_from_slice(&self.items[..self.len]);
        self.items = items;
        tracing::debug!(capacity, len = self.len, "grew arena list");
        Ok(())
    }
}

impl<T: Pod + std::fmt::Debug> std::fmt::Debug for ArenaVec<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'a, T: Pod> IntoIterator for &'a ArenaVec<'_, T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
