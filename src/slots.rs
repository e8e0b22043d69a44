//! # Slot Table
//!
//! Storage behind a group read. One contiguous byte buffer holds both the
//! registered IDs and the per-device results:
//!
//! ```text
//! | id0 id1 .. id(cap-1) | data0 .. err0 | data1 .. err1 | ... |
//!   ID zone (cap bytes)    record 0        record 1
//! ```
//!
//! Slot `i` pairs `buffer[i]` with the record at
//! `cap + i * (data_length + 1)`. The buffer is either allocated by the table
//! on first use or lent by the caller, see [`SlotTable::set_external`].

use tracing::trace;

use crate::window::ReadWindow;

/// Backing memory of a [`SlotTable`].
#[derive(Debug, Default)]
enum Storage<'buf> {
    /// Nothing allocated yet; the next insertion allocates.
    #[default]
    Unallocated,
    /// Allocated and exclusively owned by the table.
    Owned(Vec<u8>),
    /// Lent by the caller for the table's lifetime, never freed here.
    Borrowed(&'buf mut [u8]),
}

impl Storage<'_> {
    fn as_slice(&self) -> &[u8] {
        match self {
            Storage::Unallocated => &[],
            Storage::Owned(buf) => buf,
            Storage::Borrowed(buf) => buf,
        }
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        match self {
            Storage::Unallocated => &mut [],
            Storage::Owned(buf) => buf,
            Storage::Borrowed(buf) => buf,
        }
    }
}

/// Registered device IDs and their result records in a single buffer.
#[derive(Debug)]
pub struct SlotTable<'buf> {
    window: ReadWindow,
    capacity: usize,
    count: usize,
    storage: Storage<'buf>,
}

impl<'buf> SlotTable<'buf> {
    /// Create an empty table for up to `capacity` devices.
    ///
    /// No memory is allocated until the first insertion.
    pub fn new(window: ReadWindow, capacity: usize) -> Self {
        Self {
            window,
            capacity,
            count: 0,
            storage: Storage::Unallocated,
        }
    }

    /// Window every record is laid out for.
    pub fn window(&self) -> ReadWindow {
        self.window
    }

    /// Maximum number of slots.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of registered IDs.
    pub fn len(&self) -> usize {
        self.count
    }

    /// True if no ID is registered.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// True if every slot is taken.
    pub fn is_full(&self) -> bool {
        self.count >= self.capacity
    }

    /// True once backing memory exists, owned or borrowed.
    pub fn is_allocated(&self) -> bool {
        !matches!(self.storage, Storage::Unallocated)
    }

    /// True if the backing memory was supplied by the caller.
    pub fn is_borrowed(&self) -> bool {
        matches!(self.storage, Storage::Borrowed(_))
    }

    /// Adopt a caller supplied buffer.
    ///
    /// Any owned buffer is freed, registrations are dropped and the capacity
    /// becomes the number of slots `buffer` can hold. Returns `false` if it
    /// cannot hold a single slot.
    pub fn set_external(&mut self, buffer: &'buf mut [u8]) -> bool {
        self.capacity = self.window.capacity_for(buffer.len());
        self.count = 0;
        self.storage = Storage::Borrowed(buffer);
        trace!("Slot table adopted external buffer, capacity={}", self.capacity);
        self.capacity > 0
    }

    /// Give up the current buffer; the next insertion allocates a fresh one.
    pub fn release(&mut self) {
        self.storage = Storage::Unallocated;
        self.count = 0;
    }

    /// Allocate owned storage sized for the current capacity if none exists.
    pub fn ensure_allocated(&mut self) {
        if let Storage::Unallocated = self.storage {
            let len = self.window.buffer_len(self.capacity);
            trace!("Slot table allocating {} bytes for {} slots", len, self.capacity);
            self.storage = Storage::Owned(vec![0; len]);
            self.count = 0;
        }
    }

    /// Drop all registrations, keeping the storage.
    pub fn clear(&mut self) {
        self.count = 0;
    }

    /// Registered IDs in slot order.
    pub fn ids(&self) -> &[u8] {
        let buf = self.storage.as_slice();
        &buf[..self.count.min(buf.len())]
    }

    /// Slot index of `id`, if registered.
    pub fn find(&self, id: u8) -> Option<usize> {
        self.ids().iter().position(|&slot_id| slot_id == id)
    }

    /// Slot index of `id`, registering it in the next free slot if needed.
    ///
    /// Returns `None` if `id` is new and the table is full.
    pub fn find_or_insert(&mut self, id: u8) -> Option<usize> {
        self.ensure_allocated();

        if let Some(index) = self.find(id) {
            return Some(index);
        }
        if self.is_full() {
            return None;
        }

        let index = self.count;
        self.storage.as_mut_slice()[index] = id;
        self.count += 1;
        Some(index)
    }

    /// Remove every occurrence of `id`, returning how many slots were freed.
    ///
    /// Later slots move down by one, records included, so each remaining ID
    /// keeps its own result bytes.
    pub fn remove(&mut self, id: u8) -> usize {
        let mut removed = 0;
        let mut index = 0;
        while index < self.count {
            if self.storage.as_slice()[index] == id {
                self.remove_at(index);
                removed += 1;
            } else {
                index += 1;
            }
        }
        removed
    }

    fn remove_at(&mut self, index: usize) {
        let count = self.count;
        let record_len = self.window.record_len();
        let records = self.capacity;
        let buf = self.storage.as_mut_slice();

        buf.copy_within(index + 1..count, index);
        buf.copy_within(
            records + (index + 1) * record_len..records + count * record_len,
            records + index * record_len,
        );
        self.count -= 1;
    }

    /// ID stored in slot `index`.
    pub fn id_at(&self, index: usize) -> Option<u8> {
        self.ids().get(index).copied()
    }

    /// Record of slot `index`: `data_length` data bytes then the status byte.
    pub fn record(&self, index: usize) -> Option<&[u8]> {
        if index >= self.count {
            return None;
        }
        let range = self.record_range(index);
        self.storage.as_slice().get(range)
    }

    /// Mutable record of slot `index`.
    pub fn record_mut(&mut self, index: usize) -> Option<&mut [u8]> {
        if index >= self.count {
            return None;
        }
        let range = self.record_range(index);
        self.storage.as_mut_slice().get_mut(range)
    }

    fn record_range(&self, index: usize) -> core::ops::Range<usize> {
        let record_len = self.window.record_len();
        let start = self.capacity + index * record_len;
        start..start + record_len
    }
}
