//! Collaborator traits
//!
//! A group read never touches the wire itself. It passes a [`Port`] to a
//! [`PacketHandler`], which frames the request and pulls each device's answer
//! off the port. Both are implemented for `&mut T` and `Box<T>` so callers can
//! lend one port and handler to several groups in turn.

use crate::error::DxlResult;

/// Protocol revision spoken on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolVersion {
    /// Protocol 1.0, no sync read instruction.
    V1,
    /// Protocol 2.0
    V2,
}

impl ProtocolVersion {
    /// Numeric version as reported by Dynamixel tooling.
    pub fn as_f32(self) -> f32 {
        match self {
            ProtocolVersion::V1 => 1.0,
            ProtocolVersion::V2 => 2.0,
        }
    }

    /// Group sync read needs protocol 2.0 or later.
    pub fn supports_sync_read(self) -> bool {
        self != ProtocolVersion::V1
    }
}

/// Raw half-duplex byte channel.
pub trait Port {
    /// Write a complete packet.
    fn write_port(&mut self, packet: &[u8]) -> DxlResult<()>;

    /// Read whatever bytes are available into `buf`, returning how many.
    ///
    /// Blocks up to the port's own timeout and reports
    /// [`DxlError::RxTimeout`](crate::DxlError::RxTimeout) if nothing arrives.
    fn read_port(&mut self, buf: &mut [u8]) -> DxlResult<usize>;

    /// Discard stale input before a new exchange.
    fn clear_port(&mut self) {}
}

/// Packet layer: frames instructions and parses status packets.
pub trait PacketHandler<P: Port + ?Sized> {
    /// Protocol revision this handler speaks.
    fn protocol_version(&self) -> ProtocolVersion;

    /// Send one sync read instruction asking every device in `ids` for
    /// `data_length` bytes starting at `start_address`.
    fn sync_read_tx(
        &mut self,
        port: &mut P,
        start_address: u16,
        data_length: u16,
        ids: &[u8],
    ) -> DxlResult<()>;

    /// Receive the status packet of device `id`, copying `data_length` bytes
    /// of register data into `data`.
    ///
    /// Returns the device's status byte.
    fn read_rx(
        &mut self,
        port: &mut P,
        id: u8,
        data_length: u16,
        data: &mut [u8],
    ) -> DxlResult<u8>;
}

impl<T: Port + ?Sized> Port for &mut T {
    fn write_port(&mut self, packet: &[u8]) -> DxlResult<()> {
        (**self).write_port(packet)
    }

    fn read_port(&mut self, buf: &mut [u8]) -> DxlResult<usize> {
        (**self).read_port(buf)
    }

    fn clear_port(&mut self) {
        (**self).clear_port()
    }
}

impl<T: Port + ?Sized> Port for Box<T> {
    fn write_port(&mut self, packet: &[u8]) -> DxlResult<()> {
        (**self).write_port(packet)
    }

    fn read_port(&mut self, buf: &mut [u8]) -> DxlResult<usize> {
        (**self).read_port(buf)
    }

    fn clear_port(&mut self) {
        (**self).clear_port()
    }
}

impl<P: Port + ?Sized, H: PacketHandler<P> + ?Sized> PacketHandler<P> for &mut H {
    fn protocol_version(&self) -> ProtocolVersion {
        (**self).protocol_version()
    }

    fn sync_read_tx(
        &mut self,
        port: &mut P,
        start_address: u16,
        data_length: u16,
        ids: &[u8],
    ) -> DxlResult<()> {
        (**self).sync_read_tx(port, start_address, data_length, ids)
    }

    fn read_rx(
        &mut self,
        port: &mut P,
        id: u8,
        data_length: u16,
        data: &mut [u8],
    ) -> DxlResult<u8> {
        (**self).read_rx(port, id, data_length, data)
    }
}

impl<P: Port + ?Sized, H: PacketHandler<P> + ?Sized> PacketHandler<P> for Box<H> {
    fn protocol_version(&self) -> ProtocolVersion {
        (**self).protocol_version()
    }

    fn sync_read_tx(
        &mut self,
        port: &mut P,
        start_address: u16,
        data_length: u16,
        ids: &[u8],
    ) -> DxlResult<()> {
        (**self).sync_read_tx(port, start_address, data_length, ids)
    }

    fn read_rx(
        &mut self,
        port: &mut P,
        id: u8,
        data_length: u16,
        data: &mut [u8],
    ) -> DxlResult<u8> {
        (**self).read_rx(port, id, data_length, data)
    }
}
