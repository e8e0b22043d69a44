//! Dynamixel Protocol 2.0 constants
//!
//! Packet layout:
//!
//! ```text
//! | FF FF FD | 00 | ID | LEN_L LEN_H | INST | PARAM ... | CRC_L CRC_H |
//!   header    rsv          length              params
//! ```
//!
//! `LEN` counts everything after the length field: instruction, (stuffed)
//! parameters and the two CRC bytes.

// ============================================================================
// Packet Framing
// ============================================================================

/// Packet header bytes (`FF FF FD`) followed by the reserved byte.
pub const PACKET_HEADER: [u8; 4] = [0xFF, 0xFF, 0xFD, 0x00];

/// Byte inserted after a header-like sequence inside the payload.
pub const STUFFING_BYTE: u8 = 0xFD;

/// Offset of the device ID in a packet.
pub const PKT_ID: usize = 4;

/// Offset of the low length byte.
pub const PKT_LENGTH_L: usize = 5;

/// Offset of the high length byte.
pub const PKT_LENGTH_H: usize = 6;

/// Offset of the instruction byte.
pub const PKT_INSTRUCTION: usize = 7;

/// Offset of the error byte in a status packet.
pub const PKT_ERROR: usize = 8;

/// Offset of the first parameter in an instruction packet.
pub const PKT_PARAMETER0: usize = 8;

/// Smallest valid status packet: header(4) + ID(1) + LEN(2) + INST(1) + ERR(1) + CRC(2)
pub const MIN_STATUS_PACKET_LEN: usize = 11;

/// Bytes counted by `LEN` besides the parameters: instruction(1) + CRC(2)
pub const LENGTH_OVERHEAD: usize = 3;

/// Maximum instruction packet size.
pub const TX_PACKET_MAX_LEN: usize = 1024;

/// Maximum status packet size.
pub const RX_PACKET_MAX_LEN: usize = 1024;

// ============================================================================
// IDs
// ============================================================================

/// Broadcast ID, every device executes the instruction.
pub const BROADCAST_ID: u8 = 0xFE;

/// Highest assignable device ID.
pub const MAX_ID: u8 = 0xFC;

// ============================================================================
// Instructions
// ============================================================================

/// Ping
pub const INST_PING: u8 = 0x01;

/// Sync Read
pub const INST_SYNC_READ: u8 = 0x82;

/// Status (device answer)
pub const INST_STATUS: u8 = 0x55;

// ============================================================================
// Sync Read Layout
// ============================================================================

/// Fixed sync read parameters before the ID list:
/// start address(2) + data length(2)
pub const SYNC_READ_FIXED_PARAMS: usize = 4;

/// Per-slot bytes beyond the register data in a group buffer:
/// one byte in the ID zone plus the trailing status byte of the record.
pub const BYTES_PER_SLOT_OVERHEAD: usize = 2;

// ============================================================================
// Status Byte
// ============================================================================

/// Hardware alert flag in the status byte.
pub const ERRBIT_ALERT: u8 = 0x80;

/// Mask for the error number in the status byte.
pub const ERRNUM_MASK: u8 = 0x7F;

/// Instruction failed.
pub const ERRNUM_RESULT_FAIL: u8 = 1;

/// Undefined instruction.
pub const ERRNUM_INSTRUCTION: u8 = 2;

/// CRC mismatch on the device side.
pub const ERRNUM_CRC: u8 = 3;

/// Value out of range.
pub const ERRNUM_DATA_RANGE: u8 = 4;

/// Data shorter than the register.
pub const ERRNUM_DATA_LENGTH: u8 = 5;

/// Value exceeds the limit.
pub const ERRNUM_DATA_LIMIT: u8 = 6;

/// Register not writable/readable or locked.
pub const ERRNUM_ACCESS: u8 = 7;
