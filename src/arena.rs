use crate::fixed_vec::FixedVec;

/// Bump allocator over a fixed-capacity buffer.
///
/// Hashlife nodes never die individually: either the whole computation is
/// reset or the run ends. Allocation therefore only moves a high-water
/// mark, and releasing is a no-op until the arena is reset or dropped.
/// Regions are handed out as base indices, keeping the node graph free of
/// real pointers.
pub struct Arena<T> {
    storage: FixedVec<T>,
    head: usize,
}

impl<T: Default> Arena<T> {
    /// An arena of `capacity` value-initialized slots.
    pub fn new(capacity: usize) -> Self {
        Self {
            storage: FixedVec::new(capacity),
            head: 0,
        }
    }
}

impl<T> Arena<T> {
    /// Claims `n` consecutive slots and returns the index of the first,
    /// or `None` without moving the head when the arena cannot fit them.
    pub fn allocate(&mut self, n: usize) -> Option<usize> {
        let new_head = self.head.checked_add(n)?;
        if new_head > self.storage.len() {
            return None;
        }
        let base = self.head;
        self.head = new_head;
        Some(base)
    }

    pub fn full(&self) -> bool {
        self.head == self.storage.len()
    }

    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    pub fn head(&self) -> usize {
        self.head
    }

    /// Rewinds the mark, logically releasing every allocation at once.
    /// Slot contents are left in place until overwritten.
    pub fn reset(&mut self) {
        self.head = 0;
    }

    pub fn get(&self, index: usize) -> &T {
        debug_assert!(index < self.head, "arena: access past the high-water mark");
        &self.storage[index]
    }

    pub fn get_mut(&mut self, index: usize) -> &mut T {
        debug_assert!(index < self.head, "arena: access past the high-water mark");
        &mut self.storage[index]
    }
}

impl<T: Clone> Clone for Arena<T> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            head: self.head,
        }
    }
}
