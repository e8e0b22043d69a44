//! # Register Window
//!
//! A group read fetches the same contiguous block of control-table registers
//! from every participating device. [`ReadWindow`] describes that block and
//! owns the arithmetic derived from it: which fields lie inside it and how
//! many bytes a group buffer needs per device.

use crate::constants::BYTES_PER_SLOT_OVERHEAD;

/// Contiguous register block read from each device.
///
/// # Example
///
/// ```rust
/// use voltage_dynamixel::ReadWindow;
///
/// // Present Position on X-series servos: address 132, 4 bytes
/// let window = ReadWindow::new(132, 4);
///
/// assert!(window.contains(132, 4));
/// assert!(!window.contains(134, 4));
/// assert_eq!(window.record_len(), 5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReadWindow {
    /// First register address.
    pub start_address: u16,
    /// Number of bytes read per device.
    pub data_length: u16,
}

impl ReadWindow {
    /// Create a window starting at `start_address` spanning `data_length` bytes.
    pub const fn new(start_address: u16, data_length: u16) -> Self {
        Self {
            start_address,
            data_length,
        }
    }

    /// One past the last register address (may exceed `u16::MAX`).
    pub fn end(&self) -> u32 {
        u32::from(self.start_address) + u32::from(self.data_length)
    }

    /// Check that `[address, address + length)` lies within the window.
    pub fn contains(&self, address: u16, length: u16) -> bool {
        address >= self.start_address && u32::from(address) + u32::from(length) <= self.end()
    }

    /// Byte offset of `address` inside a device record.
    ///
    /// Only meaningful for addresses accepted by [`contains`](Self::contains).
    pub fn offset_of(&self, address: u16) -> usize {
        usize::from(address.saturating_sub(self.start_address))
    }

    /// Size of one device record: register data plus the status byte.
    pub fn record_len(&self) -> usize {
        usize::from(self.data_length) + 1
    }

    /// Bytes needed by a group buffer holding `capacity` devices.
    pub fn buffer_len(&self, capacity: usize) -> usize {
        capacity * self.slot_footprint()
    }

    /// Number of devices a buffer of `bytes` can hold.
    pub fn capacity_for(&self, bytes: usize) -> usize {
        bytes / self.slot_footprint()
    }

    fn slot_footprint(&self) -> usize {
        usize::from(self.data_length) + BYTES_PER_SLOT_OVERHEAD
    }
}
