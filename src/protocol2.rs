//! # Protocol 2.0 Packet Handler
//!
//! Reference [`PacketHandler`] for Dynamixel Protocol 2.0 buses.
//!
//! ## Framing
//!
//! ```text
//! | FF FF FD 00 | ID | LEN_L LEN_H | INST | PARAM ... | CRC_L CRC_H |
//! ```
//!
//! - `LEN` counts the instruction, the stuffed parameters and the CRC.
//! - Inside instruction + parameters every `FF FF FD` is followed by an extra
//!   `FD` so the header never appears in a payload.
//! - CRC-16 (poly 0x8005, init 0, not reflected) covers the whole stuffed
//!   packet up to the CRC field.
//!
//! ## Sync Read
//!
//! One broadcast instruction (`0x82`) with parameters
//! `start(u16 LE) | length(u16 LE) | id ...`; each listed device then answers
//! with its own status packet (`0x55`), in list order.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use crc::{Crc, CRC_16_UMTS};
use tracing::{debug, trace, warn};

use crate::constants::{
    BROADCAST_ID, INST_STATUS, INST_SYNC_READ, LENGTH_OVERHEAD, MAX_ID, MIN_STATUS_PACKET_LEN,
    PACKET_HEADER, PKT_ERROR, PKT_ID, PKT_INSTRUCTION, PKT_LENGTH_H, PKT_LENGTH_L,
    RX_PACKET_MAX_LEN, STUFFING_BYTE, TX_PACKET_MAX_LEN,
};
use crate::error::{DxlError, DxlResult};
use crate::handler::{PacketHandler, Port, ProtocolVersion};

/// CRC-16 used by Protocol 2.0 (also known as CRC-16/BUYPASS).
const DXL_CRC: Crc<u16> = Crc::<u16>::new(&CRC_16_UMTS);

/// Header bytes that trigger stuffing.
const HEADER_PATTERN: [u8; 3] = [0xFF, 0xFF, 0xFD];

/// Bytes read per port call while hunting for a header.
const READ_CHUNK: usize = 64;

/// Compute the Protocol 2.0 CRC of `data`.
pub fn crc16(data: &[u8]) -> u16 {
    DXL_CRC.checksum(data)
}

/// Append `region` to `out`, inserting a stuffing byte after every header pattern.
pub fn add_stuffing(region: &[u8], out: &mut BytesMut) {
    for (i, &byte) in region.iter().enumerate() {
        out.put_u8(byte);
        if i >= 2 && region[i - 2..=i] == HEADER_PATTERN {
            out.put_u8(STUFFING_BYTE);
        }
    }
}

/// Strip stuffing bytes from a received instruction + parameter region.
pub fn remove_stuffing(region: &[u8]) -> BytesMut {
    let mut out = BytesMut::with_capacity(region.len());
    let mut i = 0;
    while i < region.len() {
        out.put_u8(region[i]);
        if i >= 2
            && region[i - 2..=i] == HEADER_PATTERN
            && region.get(i + 1) == Some(&STUFFING_BYTE)
        {
            i += 1;
        }
        i += 1;
    }
    out
}

/// Frame a complete packet for `id` with the given instruction and parameters.
///
/// # Example
///
/// ```rust
/// use voltage_dynamixel::constants::INST_PING;
/// use voltage_dynamixel::protocol2::encode_packet;
///
/// // Ping device 1
/// let packet = encode_packet(1, INST_PING, &[]).unwrap();
/// assert_eq!(&packet[..], &[0xFF, 0xFF, 0xFD, 0x00, 0x01, 0x03, 0x00, 0x01, 0x19, 0x4E]);
/// ```
pub fn encode_packet(id: u8, instruction: u8, params: &[u8]) -> DxlResult<BytesMut> {
    let mut region = BytesMut::with_capacity(params.len() + 1);
    region.put_u8(instruction);
    region.extend_from_slice(params);

    let mut stuffed = BytesMut::with_capacity(region.len() + region.len() / 3);
    add_stuffing(&region, &mut stuffed);

    // stuffed region starts with the instruction byte
    let length = stuffed.len() - 1 + LENGTH_OVERHEAD;
    let total = PKT_INSTRUCTION + length;
    if total > TX_PACKET_MAX_LEN {
        warn!(
            "Instruction packet too large: {} bytes (max {})",
            total, TX_PACKET_MAX_LEN
        );
        return Err(DxlError::TxError);
    }

    let mut packet = BytesMut::with_capacity(total);
    packet.extend_from_slice(&PACKET_HEADER);
    packet.put_u8(id);
    packet.put_u16_le(length as u16);
    packet.extend_from_slice(&stuffed);
    let crc = crc16(&packet);
    packet.put_u16_le(crc);

    debug!(
        "Packet built: ID={:02X}, INST={:02X}, params={}, total_len={}",
        id,
        instruction,
        params.len(),
        packet.len()
    );
    Ok(packet)
}

/// Build the broadcast sync read instruction.
pub fn encode_sync_read(start_address: u16, data_length: u16, ids: &[u8]) -> DxlResult<BytesMut> {
    let mut params = BytesMut::with_capacity(4 + ids.len());
    params.put_u16_le(start_address);
    params.put_u16_le(data_length);
    params.extend_from_slice(ids);
    encode_packet(BROADCAST_ID, INST_SYNC_READ, &params)
}

/// A validated status packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusPacket {
    /// Responding device.
    pub id: u8,
    /// Status byte.
    pub error: u8,
    /// Parameters after the status byte, stuffing removed.
    pub data: Bytes,
}

/// Protocol 2.0 implementation of [`PacketHandler`].
#[derive(Debug, Clone)]
pub struct Protocol2PacketHandler {
    max_garbage: usize,
}

impl Default for Protocol2PacketHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl Protocol2PacketHandler {
    /// Create a handler with default settings.
    pub fn new() -> Self {
        Self {
            max_garbage: RX_PACKET_MAX_LEN,
        }
    }

    /// Set how many non-packet bytes may be skipped before a receive gives up
    /// with [`DxlError::RxCorrupt`].
    pub fn with_max_garbage(mut self, bytes: usize) -> Self {
        self.max_garbage = bytes;
        self
    }

    /// Send an already framed packet.
    pub fn tx_packet<P: Port + ?Sized>(&self, port: &mut P, packet: &[u8]) -> DxlResult<()> {
        if packet.len() > TX_PACKET_MAX_LEN {
            return Err(DxlError::TxError);
        }
        port.clear_port();
        port.write_port(packet)
    }

    /// Receive the next valid status packet from any device.
    pub fn rx_packet<P: Port + ?Sized>(&self, port: &mut P) -> DxlResult<StatusPacket> {
        let mut packet = BytesMut::with_capacity(RX_PACKET_MAX_LEN);
        let mut chunk = [0u8; READ_CHUNK];
        let mut wait_length = MIN_STATUS_PACKET_LEN;
        let mut skipped = 0usize;

        loop {
            if packet.len() < wait_length {
                let want = (wait_length - packet.len()).min(READ_CHUNK);
                let n = port.read_port(&mut chunk[..want])?;
                if n == 0 {
                    return Err(DxlError::RxTimeout);
                }
                packet.extend_from_slice(&chunk[..n]);
                if packet.len() < wait_length {
                    continue;
                }
            }

            let Some(start) = find_header(&packet) else {
                // keep a possible partial header at the tail
                let drop = packet.len().saturating_sub(HEADER_PATTERN.len() - 1);
                skipped += drop;
                packet.advance(drop);
                if skipped > self.max_garbage {
                    warn!("No status packet header after {} bytes", skipped);
                    return Err(DxlError::RxCorrupt);
                }
                continue;
            };

            if start > 0 {
                trace!("Skipping {} bytes before packet header", start);
                skipped += start;
                packet.advance(start);
                if skipped > self.max_garbage {
                    warn!("No status packet header after {} bytes", skipped);
                    return Err(DxlError::RxCorrupt);
                }
                wait_length = MIN_STATUS_PACKET_LEN;
                continue;
            }

            if packet.len() < MIN_STATUS_PACKET_LEN {
                wait_length = MIN_STATUS_PACKET_LEN;
                continue;
            }

            let length = usize::from(u16::from_le_bytes([
                packet[PKT_LENGTH_L],
                packet[PKT_LENGTH_H],
            ]));
            let full_length = PKT_INSTRUCTION + length;
            if packet[PACKET_HEADER.len() - 1] != PACKET_HEADER[3]
                || packet[PKT_ID] > MAX_ID
                || packet[PKT_INSTRUCTION] != INST_STATUS
                || full_length < MIN_STATUS_PACKET_LEN
                || full_length > RX_PACKET_MAX_LEN
            {
                // not a status packet, resync past this header
                skipped += 1;
                packet.advance(1);
                wait_length = MIN_STATUS_PACKET_LEN;
                continue;
            }

            if packet.len() < full_length {
                wait_length = full_length;
                continue;
            }

            let crc_at = full_length - 2;
            let expected = u16::from_le_bytes([packet[crc_at], packet[crc_at + 1]]);
            let actual = crc16(&packet[..crc_at]);
            if expected != actual {
                warn!(
                    "Status packet CRC mismatch from ID {:02X}: expected {:04X}, got {:04X}",
                    packet[PKT_ID], expected, actual
                );
                return Err(DxlError::RxCorrupt);
            }

            let region = remove_stuffing(&packet[PKT_INSTRUCTION..crc_at]);
            let status = StatusPacket {
                id: packet[PKT_ID],
                error: packet[PKT_ERROR],
                data: region.freeze().slice(2..),
            };
            debug!(
                "Status packet parsed: ID={:02X}, error={:02X}, data_len={}",
                status.id,
                status.error,
                status.data.len()
            );
            return Ok(status);
        }
    }
}

fn find_header(buf: &[u8]) -> Option<usize> {
    buf.windows(HEADER_PATTERN.len())
        .position(|w| w == HEADER_PATTERN)
}

impl<P: Port + ?Sized> PacketHandler<P> for Protocol2PacketHandler {
    fn protocol_version(&self) -> ProtocolVersion {
        ProtocolVersion::V2
    }

    fn sync_read_tx(
        &mut self,
        port: &mut P,
        start_address: u16,
        data_length: u16,
        ids: &[u8],
    ) -> DxlResult<()> {
        let packet = encode_sync_read(start_address, data_length, ids)?;
        self.tx_packet(port, &packet)
    }

    fn read_rx(
        &mut self,
        port: &mut P,
        id: u8,
        data_length: u16,
        data: &mut [u8],
    ) -> DxlResult<u8> {
        let status = loop {
            let status = self.rx_packet(port)?;
            if status.id == id {
                break status;
            }
            trace!("Ignoring status packet from ID {:02X}, waiting for {:02X}", status.id, id);
        };

        let wanted = usize::from(data_length).min(data.len());
        let available = status.data.len().min(wanted);
        if available < wanted && status.error == 0 {
            warn!(
                "Status packet from ID {:02X} too short: {} of {} bytes",
                id, available, wanted
            );
            return Err(DxlError::RxCorrupt);
        }
        data[..available].copy_from_slice(&status.data[..available]);
        data[available..wanted].fill(0);
        Ok(status.error)
    }
}
