//! Device status byte
//!
//! Every Protocol 2.0 status packet carries one status byte. Bit 7 flags a
//! hardware alert (details in the device's Hardware Error Status register);
//! bits 0-6 hold the error number of the instruction just processed.

use std::fmt;

use crate::constants::{
    ERRBIT_ALERT, ERRNUM_ACCESS, ERRNUM_CRC, ERRNUM_DATA_LENGTH, ERRNUM_DATA_LIMIT,
    ERRNUM_DATA_RANGE, ERRNUM_INSTRUCTION, ERRNUM_MASK, ERRNUM_RESULT_FAIL,
};

/// Error number reported in the low bits of the status byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorNumber {
    /// Instruction failed
    ResultFail,
    /// Undefined instruction or action without reg write
    Instruction,
    /// Packet CRC mismatch
    Crc,
    /// Value out of range
    DataRange,
    /// Data shorter than the register
    DataLength,
    /// Value exceeds the configured limit
    DataLimit,
    /// Register is read-only, write-only or locked
    Access,
    /// Code not defined by the protocol
    Unknown(u8),
}

impl ErrorNumber {
    fn from_u8(code: u8) -> Option<Self> {
        match code {
            0 => None,
            ERRNUM_RESULT_FAIL => Some(ErrorNumber::ResultFail),
            ERRNUM_INSTRUCTION => Some(ErrorNumber::Instruction),
            ERRNUM_CRC => Some(ErrorNumber::Crc),
            ERRNUM_DATA_RANGE => Some(ErrorNumber::DataRange),
            ERRNUM_DATA_LENGTH => Some(ErrorNumber::DataLength),
            ERRNUM_DATA_LIMIT => Some(ErrorNumber::DataLimit),
            ERRNUM_ACCESS => Some(ErrorNumber::Access),
            other => Some(ErrorNumber::Unknown(other)),
        }
    }

    /// Short description.
    pub fn description(self) -> &'static str {
        match self {
            ErrorNumber::ResultFail => "Failed to process the instruction packet",
            ErrorNumber::Instruction => "Undefined instruction or action without reg write",
            ErrorNumber::Crc => "CRC of the sent packet does not match",
            ErrorNumber::DataRange => "Data to be written is out of range",
            ErrorNumber::DataLength => "Data is shorter than the register",
            ErrorNumber::DataLimit => "Data to be written exceeds the limit",
            ErrorNumber::Access => "Register access denied",
            ErrorNumber::Unknown(_) => "Unknown error",
        }
    }
}

/// Decoded status byte of one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HardwareStatus(pub u8);

impl HardwareStatus {
    /// Raw byte.
    pub fn raw(self) -> u8 {
        self.0
    }

    /// True if any bit is set.
    pub fn is_error(self) -> bool {
        self.0 != 0
    }

    /// Hardware alert: read the device's Hardware Error Status for details.
    pub fn is_alert(self) -> bool {
        self.0 & ERRBIT_ALERT != 0
    }

    /// Error number of the processed instruction, if any.
    pub fn error_number(self) -> Option<ErrorNumber> {
        ErrorNumber::from_u8(self.0 & ERRNUM_MASK)
    }
}

impl From<u8> for HardwareStatus {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl fmt::Display for HardwareStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.error_number(), self.is_alert()) {
            (None, false) => write!(f, "OK"),
            (None, true) => write!(f, "Hardware alert"),
            (Some(num), false) => write!(f, "{}", num.description()),
            (Some(num), true) => write!(f, "{} (hardware alert)", num.description()),
        }
    }
}
