//! # Group Sync Read
//!
//! Read the same register window from many devices with one instruction.
//!
//! ## How It Works
//!
//! 1. Register device IDs with [`GroupSyncRead::add_param`]. Each ID gets a
//!    slot in a single buffer that holds the ID list followed by one result
//!    record per slot.
//! 2. [`GroupSyncRead::tx_packet`] sends one sync read instruction naming
//!    every registered ID.
//! 3. [`GroupSyncRead::rx_packet`] reads each device's status packet in
//!    registration order straight into its record.
//! 4. [`GroupSyncRead::get_data`] and [`GroupSyncRead::get_error`] read typed
//!    fields back out, as often as needed, until the next exchange.
//!
//! Results are only trusted after a receive in which every device answered.
//!
//! ## Example
//!
//! ```rust,no_run
//! use voltage_dynamixel::{GroupSyncRead, IoPort, Protocol2PacketHandler, ReadWindow};
//!
//! # fn example(serial: std::fs::File) -> voltage_dynamixel::DxlResult<()> {
//! // Present Position: address 132, 4 bytes
//! let mut group = GroupSyncRead::new(
//!     IoPort::new(serial),
//!     Protocol2PacketHandler::new(),
//!     ReadWindow::new(132, 4),
//!     4,
//! );
//!
//! for id in [1, 2, 3] {
//!     group.add_param(id);
//! }
//!
//! group.tx_rx_packet()?;
//!
//! for id in [1, 2, 3] {
//!     if group.is_available(id, 132, 4) {
//!         println!("ID {} position {}", id, group.get_data(id, 132, 4) as i32);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use tracing::{debug, trace};

use crate::error::{DxlError, DxlResult};
use crate::handler::{PacketHandler, Port};
use crate::slots::SlotTable;
use crate::status::HardwareStatus;
use crate::window::ReadWindow;

/// Batched register read across several devices.
///
/// `'buf` is the lifetime of a caller supplied buffer (see
/// [`set_buffer`](Self::set_buffer)); groups that allocate their own storage
/// can use any lifetime, including `'static`.
pub struct GroupSyncRead<'buf, P, H> {
    link: Option<(P, H)>,
    slots: SlotTable<'buf>,
    last_result: bool,
    /// Leading slots filled by the last successful receive.
    received: usize,
}

impl<'buf, P, H> GroupSyncRead<'buf, P, H>
where
    P: Port,
    H: PacketHandler<P>,
{
    /// Create a group wired to a port and packet handler, ready to transmit.
    pub fn new(port: P, handler: H, window: ReadWindow, capacity: usize) -> Self {
        Self {
            link: Some((port, handler)),
            slots: SlotTable::new(window, capacity),
            last_result: false,
            received: 0,
        }
    }

    /// Create a group without a port or handler; attach them later with
    /// [`init`](Self::init).
    pub fn detached(window: ReadWindow, capacity: usize) -> Self {
        Self {
            link: None,
            slots: SlotTable::new(window, capacity),
            last_result: false,
            received: 0,
        }
    }

    /// Attach a port and packet handler, dropping all registrations.
    pub fn init(&mut self, port: P, handler: H) {
        self.link = Some((port, handler));
        self.clear_param();
    }

    /// Detach and return the port and packet handler.
    pub fn detach(&mut self) -> Option<(P, H)> {
        self.last_result = false;
        self.link.take()
    }

    fn is_capable(&self) -> bool {
        self.link
            .as_ref()
            .is_some_and(|(_, handler)| handler.protocol_version().supports_sync_read())
    }

    /// Back the group with caller memory, or return to self-allocated storage.
    ///
    /// With `Some(buffer)` the group frees any buffer it allocated, drops all
    /// registrations and derives its capacity from the buffer size (each slot
    /// takes `data_length + 2` bytes). Returns `false` if not even one slot
    /// fits.
    ///
    /// With `None` the group frees any buffer it allocated and allocates a
    /// fresh one on the next [`add_param`](Self::add_param). Always returns
    /// `true`.
    ///
    /// Either way previous results are discarded.
    pub fn set_buffer(&mut self, buffer: Option<&'buf mut [u8]>) -> bool {
        self.last_result = false;
        self.received = 0;
        match buffer {
            Some(buffer) => self.slots.set_external(buffer),
            None => {
                self.slots.release();
                true
            }
        }
    }

    /// Register `id` for the next exchange.
    ///
    /// Returns `true` if `id` is registered afterwards (including when it
    /// already was). Fails on protocol 1.0, without a packet handler, or when
    /// every slot is taken. Results already received for other IDs stay
    /// available; a newly registered ID has none until the next receive.
    pub fn add_param(&mut self, id: u8) -> bool {
        if !self.is_capable() {
            return false;
        }

        let before = self.slots.len();
        match self.slots.find_or_insert(id) {
            Some(index) => {
                if self.slots.len() != before {
                    trace!("Sync read registered ID {} in slot {}", id, index);
                }
                true
            }
            None => {
                debug!(
                    "Sync read cannot register ID {}: all {} slots taken",
                    id,
                    self.slots.capacity()
                );
                false
            }
        }
    }

    /// Unregister `id`.
    ///
    /// Later IDs move down one slot and carry their result records with them,
    /// so data already received for the remaining devices stays correct.
    pub fn remove_param(&mut self, id: u8) {
        if !self.is_capable() || !self.slots.is_allocated() {
            return;
        }
        let received = self.received.min(self.slots.len());
        let trusted = self.slots.ids()[..received]
            .iter()
            .filter(|&&registered| registered == id)
            .count();
        self.received = received - trusted;

        let removed = self.slots.remove(id);
        if removed > 0 {
            trace!("Sync read removed ID {} ({} slot(s))", id, removed);
        }
    }

    /// Unregister every ID, keeping the buffer for reuse.
    pub fn clear_param(&mut self) {
        self.slots.clear();
        self.received = 0;
    }

    /// Send the sync read instruction for all registered IDs.
    ///
    /// Returns [`DxlError::NotAvailable`] on protocol 1.0, without a packet
    /// handler, or with nothing registered; otherwise the packet handler's
    /// result as is.
    pub fn tx_packet(&mut self) -> DxlResult<()> {
        if !self.is_capable() || self.slots.is_empty() {
            return Err(DxlError::NotAvailable);
        }
        let Some((port, handler)) = self.link.as_mut() else {
            return Err(DxlError::NotAvailable);
        };

        let window = self.slots.window();
        debug!(
            "Sync read TX: start={}, length={}, ids={:?}",
            window.start_address,
            window.data_length,
            self.slots.ids()
        );
        handler.sync_read_tx(
            port,
            window.start_address,
            window.data_length,
            self.slots.ids(),
        )
    }

    /// Receive every registered device's answer, in registration order.
    ///
    /// Stops at the first failing device and returns its error; records
    /// already filled in that pass are not trusted. Results become available
    /// only when every device answered.
    pub fn rx_packet(&mut self) -> DxlResult<()> {
        self.last_result = false;
        self.received = 0;

        if !self.is_capable() || self.slots.is_empty() {
            return Err(DxlError::NotAvailable);
        }
        let Some((port, handler)) = self.link.as_mut() else {
            return Err(DxlError::NotAvailable);
        };

        let data_length = self.slots.window().data_length;
        let span = usize::from(data_length);
        for index in 0..self.slots.len() {
            let (Some(id), Some(record)) = (self.slots.id_at(index), self.slots.record_mut(index))
            else {
                return Err(DxlError::NotAvailable);
            };
            let (data, status) = record.split_at_mut(span);
            match handler.read_rx(port, id, data_length, data) {
                Ok(error) => status[0] = error,
                Err(e) => {
                    debug!("Sync read RX failed at ID {} (slot {}): {}", id, index, e);
                    return Err(e);
                }
            }
        }

        self.last_result = true;
        self.received = self.slots.len();
        Ok(())
    }

    /// [`tx_packet`](Self::tx_packet) followed by [`rx_packet`](Self::rx_packet).
    pub fn tx_rx_packet(&mut self) -> DxlResult<()> {
        self.tx_packet()?;
        self.rx_packet()
    }

    /// Slot of `id` if it was filled by the last successful receive.
    fn received_slot(&self, id: u8) -> Option<usize> {
        if !self.is_capable() || !self.last_result {
            return None;
        }
        self.slots.find(id).filter(|&index| index < self.received)
    }

    /// Check that `[address, address + length)` of device `id` holds data from
    /// a fully successful exchange.
    pub fn is_available(&self, id: u8, address: u16, length: u16) -> bool {
        self.received_slot(id).is_some() && self.slots.window().contains(address, length)
    }

    /// Field value of device `id`, assembled little-endian.
    ///
    /// `length` must be 1, 2 or 4. Returns `None` if the field is not
    /// available or the width is unsupported.
    pub fn data(&self, id: u8, address: u16, length: u16) -> Option<u32> {
        if !self.is_available(id, address, length) {
            return None;
        }
        let record = self.slots.record(self.received_slot(id)?)?;
        let field = &record[self.slots.window().offset_of(address)..];

        match length {
            1 => Some(u32::from(field[0])),
            2 => Some(u32::from(u16::from_le_bytes([field[0], field[1]]))),
            4 => Some(u32::from_le_bytes([field[0], field[1], field[2], field[3]])),
            _ => None,
        }
    }

    /// Field value of device `id`, or 0 when [`data`](Self::data) is `None`.
    pub fn get_data(&self, id: u8, address: u16, length: u16) -> u32 {
        self.data(id, address, length).unwrap_or(0)
    }

    /// Raw window bytes received from device `id`.
    pub fn slot_data(&self, id: u8) -> Option<&[u8]> {
        let record = self.slots.record(self.received_slot(id)?)?;
        Some(&record[..usize::from(self.slots.window().data_length)])
    }

    /// Status byte received from device `id`, including 0 for no error.
    pub fn device_status(&self, id: u8) -> Option<u8> {
        let record = self.slots.record(self.received_slot(id)?)?;
        record.last().copied()
    }

    /// Nonzero status byte of device `id`.
    ///
    /// `None` means either no error was reported or no trusted result exists
    /// for `id`.
    pub fn get_error(&self, id: u8) -> Option<u8> {
        self.device_status(id).filter(|&status| status != 0)
    }

    /// Decoded status byte of device `id`.
    pub fn hardware_status(&self, id: u8) -> Option<HardwareStatus> {
        self.device_status(id).map(HardwareStatus::from)
    }

    /// Register window read from every device.
    pub fn window(&self) -> ReadWindow {
        self.slots.window()
    }

    /// Maximum number of devices.
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Number of registered devices.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True if no device is registered.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Registered IDs in slot order.
    pub fn ids(&self) -> &[u8] {
        self.slots.ids()
    }

    /// True once the group has a buffer, allocated or supplied.
    pub fn is_allocated(&self) -> bool {
        self.slots.is_allocated()
    }

    /// True if the buffer was supplied through [`set_buffer`](Self::set_buffer).
    pub fn is_user_buffer(&self) -> bool {
        self.slots.is_borrowed()
    }

    /// True if the last receive completed for every device.
    pub fn last_result(&self) -> bool {
        self.last_result
    }

    /// True if a port and packet handler are attached.
    pub fn is_attached(&self) -> bool {
        self.link.is_some()
    }

    /// Get a reference to the attached port.
    pub fn port(&self) -> Option<&P> {
        self.link.as_ref().map(|(port, _)| port)
    }

    /// Get a mutable reference to the attached port.
    pub fn port_mut(&mut self) -> Option<&mut P> {
        self.link.as_mut().map(|(port, _)| port)
    }

    /// Get a reference to the attached packet handler.
    pub fn handler(&self) -> Option<&H> {
        self.link.as_ref().map(|(_, handler)| handler)
    }

    /// Get a mutable reference to the attached packet handler.
    pub fn handler_mut(&mut self) -> Option<&mut H> {
        self.link.as_mut().map(|(_, handler)| handler)
    }
}

impl<P, H> std::fmt::Debug for GroupSyncRead<'_, P, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupSyncRead")
            .field("attached", &self.link.is_some())
            .field("slots", &self.slots)
            .field("last_result", &self.last_result)
            .field("received", &self.received)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::ProtocolVersion;
    use proptest::prelude::*;
    use std::collections::VecDeque;

    // =========================================================================
    // Mock collaborators
    // =========================================================================

    /// Port that never carries bytes; the mock handler fakes the wire.
    #[derive(Default)]
    struct NullPort;

    impl Port for NullPort {
        fn write_port(&mut self, _: &[u8]) -> DxlResult<()> {
            Ok(())
        }

        fn read_port(&mut self, _: &mut [u8]) -> DxlResult<usize> {
            Err(DxlError::RxTimeout)
        }
    }

    /// Sync read request as seen by the handler.
    #[derive(Debug, Clone, PartialEq)]
    struct Request {
        start_address: u16,
        data_length: u16,
        ids: Vec<u8>,
    }

    /// Packet handler replaying queued answers.
    struct MockHandler {
        version: ProtocolVersion,
        /// Records all requests received
        requests: Vec<Request>,
        /// IDs asked for, in order
        reads: Vec<u8>,
        /// Result of the next `sync_read_tx`
        tx_result: DxlResult<()>,
        /// Pre-configured answers (FIFO queue)
        responses: VecDeque<DxlResult<(Vec<u8>, u8)>>,
    }

    impl MockHandler {
        fn new(version: ProtocolVersion) -> Self {
            Self {
                version,
                requests: Vec::new(),
                reads: Vec::new(),
                tx_result: Ok(()),
                responses: VecDeque::new(),
            }
        }

        fn v2() -> Self {
            Self::new(ProtocolVersion::V2)
        }

        fn answer(&mut self, data: &[u8], error: u8) {
            self.responses.push_back(Ok((data.to_vec(), error)));
        }

        fn fail(&mut self, error: DxlError) {
            self.responses.push_back(Err(error));
        }
    }

    impl PacketHandler<NullPort> for MockHandler {
        fn protocol_version(&self) -> ProtocolVersion {
            self.version
        }

        fn sync_read_tx(
            &mut self,
            _port: &mut NullPort,
            start_address: u16,
            data_length: u16,
            ids: &[u8],
        ) -> DxlResult<()> {
            self.requests.push(Request {
                start_address,
                data_length,
                ids: ids.to_vec(),
            });
            self.tx_result
        }

        fn read_rx(
            &mut self,
            _port: &mut NullPort,
            id: u8,
            data_length: u16,
            data: &mut [u8],
        ) -> DxlResult<u8> {
            self.reads.push(id);
            assert_eq!(data.len(), usize::from(data_length));
            let (bytes, error) = self
                .responses
                .pop_front()
                .unwrap_or(Err(DxlError::RxTimeout))?;
            data.copy_from_slice(&bytes);
            Ok(error)
        }
    }

    type Group = GroupSyncRead<'static, NullPort, MockHandler>;

    fn group(capacity: usize) -> Group {
        GroupSyncRead::new(NullPort, MockHandler::v2(), ReadWindow::new(36, 4), capacity)
    }

    fn handler(group: &mut Group) -> &mut MockHandler {
        group.handler_mut().unwrap()
    }

    /// Three devices, all answered; device 2 reports status 0x01.
    fn exchanged_group() -> Group {
        let mut group = group(3);
        for id in [1, 2, 3] {
            assert!(group.add_param(id));
        }
        let mock = handler(&mut group);
        mock.answer(&[0x78, 0x56, 0x34, 0x12], 0);
        mock.answer(&[0x01, 0x00, 0x00, 0x00], 0x01);
        mock.answer(&[0, 0, 0, 0], 0);
        group.tx_rx_packet().unwrap();
        group
    }

    // =========================================================================
    // Registration
    // =========================================================================

    #[test]
    fn test_starts_empty_and_unallocated() {
        let group = group(3);
        assert!(group.is_empty());
        assert!(!group.is_allocated());
        assert!(!group.last_result());
        assert_eq!(group.capacity(), 3);
    }

    #[test]
    fn test_first_registration_allocates() {
        let mut group = group(3);
        assert!(group.add_param(1));
        assert!(group.is_allocated());
        assert!(!group.is_user_buffer());
    }

    #[test]
    fn test_register_same_id_twice() {
        let mut group = group(3);
        assert!(group.add_param(5));
        assert!(group.add_param(5));
        assert_eq!(group.len(), 1);
        assert_eq!(group.ids(), &[5]);
    }

    #[test]
    fn test_register_beyond_capacity() {
        let mut group = group(2);
        assert!(group.add_param(1));
        assert!(group.add_param(2));
        assert!(!group.add_param(3));
        assert_eq!(group.ids(), &[1, 2]);
    }

    #[test]
    fn test_protocol_1_is_rejected() {
        let mut group: Group = GroupSyncRead::new(
            NullPort,
            MockHandler::new(ProtocolVersion::V1),
            ReadWindow::new(36, 4),
            3,
        );
        assert!(!group.add_param(1));
        assert!(!group.is_allocated());
        assert_eq!(group.tx_packet(), Err(DxlError::NotAvailable));
        assert_eq!(group.rx_packet(), Err(DxlError::NotAvailable));
        assert_eq!(group.tx_rx_packet(), Err(DxlError::NotAvailable));
        assert!(handler(&mut group).requests.is_empty());
    }

    #[test]
    fn test_detached_group() {
        let mut group = Group::detached(ReadWindow::new(36, 4), 3);
        assert!(!group.is_attached());
        assert!(!group.add_param(1));
        assert_eq!(group.tx_packet(), Err(DxlError::NotAvailable));
        assert!(!group.is_available(1, 36, 4));

        group.init(NullPort, MockHandler::v2());
        assert!(group.is_attached());
        assert!(group.add_param(1));
        assert_eq!(group.len(), 1);
    }

    #[test]
    fn test_init_clears_registrations() {
        let mut group = group(3);
        group.add_param(1);
        group.add_param(2);
        group.init(NullPort, MockHandler::v2());
        assert!(group.is_empty());
        assert!(group.is_allocated());
    }

    #[test]
    fn test_remove_then_reregister_appends() {
        let mut group = group(3);
        for id in [1, 2, 3] {
            group.add_param(id);
        }
        group.remove_param(2);
        assert_eq!(group.ids(), &[1, 3]);
        assert_eq!(group.len(), 2);

        group.add_param(2);
        assert_eq!(group.ids(), &[1, 3, 2]);
    }

    #[test]
    fn test_remove_before_allocation_is_noop() {
        let mut group = group(3);
        group.remove_param(1);
        assert!(!group.is_allocated());
    }

    #[test]
    fn test_remove_keeps_results_with_their_ids() {
        let mut group = group(3);
        for id in [1, 2, 3] {
            group.add_param(id);
        }
        let mock = handler(&mut group);
        mock.answer(&[0x78, 0x56, 0x34, 0x12], 0);
        mock.answer(&[0x11, 0x11, 0x11, 0x11], 0x04);
        mock.answer(&[0xEF, 0xBE, 0xAD, 0xDE], 0x80);
        group.tx_rx_packet().unwrap();

        group.remove_param(2);

        assert!(group.last_result());
        assert_eq!(group.ids(), &[1, 3]);
        assert_eq!(group.get_data(1, 36, 4), 0x12345678);
        assert_eq!(group.get_data(3, 36, 4), 0xDEADBEEF);
        assert_eq!(group.get_error(3), Some(0x80));
        assert!(!group.is_available(2, 36, 4));
    }

    #[test]
    fn test_clear_keeps_buffer() {
        let mut group = group(3);
        group.add_param(1);
        group.clear_param();
        assert!(group.is_empty());
        assert!(group.is_allocated());
        assert_eq!(group.tx_packet(), Err(DxlError::NotAvailable));
    }

    // =========================================================================
    // External buffer
    // =========================================================================

    #[test]
    fn test_external_buffer_capacity() {
        let mut memory = [0u8; 12];
        let mut group = GroupSyncRead::new(
            NullPort,
            MockHandler::v2(),
            ReadWindow::new(36, 4),
            10,
        );
        assert!(group.set_buffer(Some(&mut memory)));
        assert_eq!(group.capacity(), 2);
        assert!(group.is_user_buffer());

        assert!(group.add_param(1));
        assert!(group.add_param(2));
        assert!(!group.add_param(3));
    }

    #[test]
    fn test_external_buffer_too_small() {
        let mut memory = [0u8; 5];
        let mut group = GroupSyncRead::new(
            NullPort,
            MockHandler::v2(),
            ReadWindow::new(36, 4),
            3,
        );
        group.add_param(1);
        assert!(!group.set_buffer(Some(&mut memory)));
        assert_eq!(group.capacity(), 0);
        assert!(group.is_user_buffer());
        assert!(group.is_empty());
        assert!(!group.add_param(1));
    }

    #[test]
    fn test_external_buffer_receives_results() {
        let mut memory = [0u8; 12];
        {
            let mut group = GroupSyncRead::new(
                NullPort,
                MockHandler::v2(),
                ReadWindow::new(36, 4),
                2,
            );
            group.set_buffer(Some(&mut memory));
            group.add_param(9);
            group.handler_mut().unwrap().answer(&[1, 2, 3, 4], 0x20);
            group.tx_rx_packet().unwrap();
            assert_eq!(group.get_data(9, 38, 2), 0x0403);
        }
        // ID zone then the first record
        assert_eq!(memory[0], 9);
        assert_eq!(&memory[2..7], &[1, 2, 3, 4, 0x20]);
    }

    #[test]
    fn test_set_buffer_none_returns_to_self_allocation() {
        let mut memory = [0u8; 12];
        let mut group = GroupSyncRead::new(
            NullPort,
            MockHandler::v2(),
            ReadWindow::new(36, 4),
            3,
        );
        group.set_buffer(Some(&mut memory));
        group.add_param(1);

        assert!(group.set_buffer(None));
        assert!(group.is_empty());
        assert!(!group.is_allocated());

        assert!(group.add_param(4));
        assert!(group.is_allocated());
        assert!(!group.is_user_buffer());
    }

    #[test]
    fn test_set_buffer_discards_results() {
        let mut group = exchanged_group();
        assert!(group.set_buffer(None));
        assert!(!group.last_result());
        group.add_param(1);
        assert!(!group.is_available(1, 36, 4));
    }

    // =========================================================================
    // Exchange
    // =========================================================================

    #[test]
    fn test_tx_requires_registration() {
        let mut group = group(3);
        assert_eq!(group.tx_packet(), Err(DxlError::NotAvailable));
        assert_eq!(group.rx_packet(), Err(DxlError::NotAvailable));
    }

    #[test]
    fn test_tx_sends_window_and_ids() {
        let mut group = group(3);
        group.add_param(3);
        group.add_param(1);
        group.tx_packet().unwrap();

        assert_eq!(
            handler(&mut group).requests,
            vec![Request {
                start_address: 36,
                data_length: 4,
                ids: vec![3, 1],
            }]
        );
    }

    #[test]
    fn test_tx_error_is_passed_through() {
        let mut group = group(3);
        group.add_param(1);
        handler(&mut group).tx_result = Err(DxlError::TxFail);

        assert_eq!(group.tx_rx_packet(), Err(DxlError::TxFail));
        assert!(handler(&mut group).reads.is_empty());
    }

    #[test]
    fn test_rx_reads_in_registration_order() {
        let mut group = group(3);
        for id in [7, 3, 5] {
            group.add_param(id);
        }
        for _ in 0..3 {
            handler(&mut group).answer(&[0; 4], 0);
        }
        group.rx_packet().unwrap();
        assert_eq!(handler(&mut group).reads, vec![7, 3, 5]);
    }

    #[test]
    fn test_rx_failure_aborts_and_invalidates() {
        let mut group = group(3);
        for id in [1, 2, 3] {
            group.add_param(id);
        }
        let mock = handler(&mut group);
        mock.answer(&[0xAA; 4], 0);
        mock.fail(DxlError::RxCorrupt);
        mock.answer(&[0xBB; 4], 0);

        assert_eq!(group.rx_packet(), Err(DxlError::RxCorrupt));
        assert!(!group.last_result());
        assert_eq!(handler(&mut group).reads, vec![1, 2]);
        for id in [1, 2, 3] {
            assert!(!group.is_available(id, 36, 4));
            assert_eq!(group.get_data(id, 36, 4), 0);
            assert_eq!(group.get_error(id), None);
        }
    }

    #[test]
    fn test_failed_rx_after_success_invalidates() {
        let mut group = exchanged_group();
        handler(&mut group).fail(DxlError::RxTimeout);
        assert_eq!(group.rx_packet(), Err(DxlError::RxTimeout));
        assert_eq!(group.get_data(1, 36, 4), 0);
    }

    #[test]
    fn test_new_registration_keeps_received_results() {
        let mut group = group(4);
        group.add_param(1);
        handler(&mut group).answer(&[0x78, 0x56, 0x34, 0x12], 0);
        group.tx_rx_packet().unwrap();
        assert_eq!(group.get_data(1, 36, 4), 0x12345678);

        group.add_param(1);
        group.add_param(2);

        assert!(group.last_result());
        assert_eq!(group.get_data(1, 36, 4), 0x12345678);
        assert_eq!(group.device_status(1), Some(0));
        assert!(!group.is_available(2, 36, 1));
        assert_eq!(group.get_data(2, 36, 4), 0);
        assert_eq!(group.device_status(2), None);

        handler(&mut group).answer(&[1, 0, 0, 0], 0);
        handler(&mut group).answer(&[2, 0, 0, 0], 0);
        group.tx_rx_packet().unwrap();
        assert_eq!(group.get_data(2, 36, 4), 2);
    }

    #[test]
    fn test_slot_freed_by_remove_has_no_results_for_new_id() {
        let mut group = exchanged_group();
        group.remove_param(3);
        group.add_param(9);

        assert_eq!(group.ids(), &[1, 2, 9]);
        assert!(!group.is_available(9, 36, 4));
        assert_eq!(group.get_data(1, 36, 4), 0x12345678);
        assert_eq!(group.get_error(2), Some(0x01));
    }

    #[test]
    fn test_clear_then_register_has_no_results() {
        let mut group = exchanged_group();
        group.clear_param();
        group.add_param(1);
        assert!(!group.is_available(1, 36, 4));
        assert_eq!(group.get_data(1, 36, 4), 0);
    }

    // =========================================================================
    // Field access
    // =========================================================================

    #[test]
    fn test_unavailable_before_receive() {
        let mut group = group(3);
        group.add_param(1);
        assert!(!group.is_available(1, 36, 4));
        assert_eq!(group.get_data(1, 36, 4), 0);
        assert_eq!(group.device_status(1), None);
        assert_eq!(group.slot_data(1), None);
    }

    #[test]
    fn test_three_device_scenario() {
        let group = exchanged_group();

        assert_eq!(group.get_data(1, 36, 4), 0x12345678);
        assert_eq!(group.get_error(2), Some(0x01));
        assert_eq!(group.get_error(1), None);
        assert_eq!(group.device_status(1), Some(0));
        assert!(!group.is_available(1, 40, 2));
        assert_eq!(group.get_data(1, 40, 2), 0);
    }

    #[test]
    fn test_field_widths() {
        let group = exchanged_group();

        assert_eq!(group.get_data(1, 36, 1), 0x78);
        assert_eq!(group.get_data(1, 37, 1), 0x56);
        assert_eq!(group.get_data(1, 36, 2), 0x5678);
        assert_eq!(group.get_data(1, 38, 2), 0x1234);
        assert_eq!(group.get_data(2, 36, 4), 1);

        assert_eq!(group.get_data(1, 36, 3), 0);
        assert_eq!(group.data(1, 36, 3), None);
        assert_eq!(group.get_data(1, 36, 0), 0);
    }

    #[test]
    fn test_accessors_are_repeatable() {
        let group = exchanged_group();
        for _ in 0..3 {
            assert_eq!(group.get_data(1, 36, 4), 0x12345678);
        }
        assert_eq!(group.slot_data(1), Some(&[0x78, 0x56, 0x34, 0x12][..]));
    }

    #[test]
    fn test_unknown_id() {
        let group = exchanged_group();
        assert!(!group.is_available(42, 36, 4));
        assert_eq!(group.get_data(42, 36, 4), 0);
        assert_eq!(group.get_error(42), None);
        assert_eq!(group.device_status(42), None);
    }

    #[test]
    fn test_hardware_status() {
        let group = exchanged_group();
        let status = group.hardware_status(2).unwrap();
        assert!(status.is_error());
        assert!(!status.is_alert());
        assert!(!group.hardware_status(1).unwrap().is_error());
    }

    #[test]
    fn test_detach_invalidates() {
        let mut group = exchanged_group();
        assert!(group.detach().is_some());
        assert!(!group.is_available(1, 36, 4));
        assert_eq!(group.get_error(2), None);
    }

    proptest! {
        #[test]
        fn prop_availability_matches_window(
            start in 0u16..1000,
            span in 1u16..16,
            address in 0u16..1100,
            width in 0u16..8,
        ) {
            let mut group: Group = GroupSyncRead::new(
                NullPort,
                MockHandler::v2(),
                ReadWindow::new(start, span),
                2,
            );
            group.add_param(1);
            group.add_param(2);
            let data: Vec<u8> = (0..span).map(|i| i as u8).collect();
            handler(&mut group).answer(&data, 0);
            handler(&mut group).answer(&data, 0);
            group.tx_rx_packet().unwrap();

            let inside = start <= address
                && u32::from(address) + u32::from(width) <= u32::from(start) + u32::from(span);
            for id in [1, 2] {
                prop_assert_eq!(group.is_available(id, address, width), inside);
            }

            if inside && matches!(width, 1 | 2 | 4) {
                let offset = usize::from(address - start);
                let mut expected = 0u32;
                for (i, byte) in data[offset..offset + usize::from(width)].iter().enumerate() {
                    expected |= u32::from(*byte) << (8 * i);
                }
                prop_assert_eq!(group.get_data(1, address, width), expected);
            } else {
                prop_assert_eq!(group.get_data(1, address, width), 0);
            }
        }
    }
}
