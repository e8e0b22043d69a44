//! Error types and communication result codes
//!
//! Every fallible operation on the bus returns [`DxlResult`]. The variants of
//! [`DxlError`] mirror the communication result codes used across Dynamixel
//! tooling, so [`DxlError::code`] can be handed to code that still speaks the
//! numeric convention (`0` for success).

use thiserror::Error;

/// Numeric code for a successful exchange.
pub const COMM_SUCCESS: i32 = 0;

/// Communication error on the bus or in the packet layer.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DxlError {
    /// Operation is not supported in the current state (missing handler,
    /// protocol 1.0, or nothing registered).
    #[error("Operation not available")]
    NotAvailable,

    /// Port is in use by another exchange.
    #[error("Port is busy")]
    PortBusy,

    /// Failed to write the instruction packet to the port.
    #[error("Failed to transmit instruction packet")]
    TxFail,

    /// Instruction packet could not be built (bad length or parameters).
    #[error("Incorrect instruction packet")]
    TxError,

    /// Failed to read a status packet from the port.
    #[error("Failed to receive status packet")]
    RxFail,

    /// Status packet is still being received.
    #[error("Still receiving status packet")]
    RxWaiting,

    /// No status packet arrived in time.
    #[error("Timed out waiting for status packet")]
    RxTimeout,

    /// Status packet arrived but failed validation.
    #[error("Corrupted status packet")]
    RxCorrupt,
}

/// Result type used throughout the crate.
pub type DxlResult<T> = Result<T, DxlError>;

impl DxlError {
    /// Conventional numeric communication result code.
    pub fn code(self) -> i32 {
        match self {
            DxlError::PortBusy => -1000,
            DxlError::TxFail => -1001,
            DxlError::TxError => -2000,
            DxlError::RxTimeout => -3000,
            DxlError::RxFail => -3001,
            DxlError::RxWaiting => -3002,
            DxlError::RxCorrupt => -3003,
            DxlError::NotAvailable => -9000,
        }
    }

    /// Look up the variant for a numeric communication result.
    ///
    /// Returns `None` for [`COMM_SUCCESS`] and for unknown codes.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -1000 => Some(DxlError::PortBusy),
            -1001 => Some(DxlError::TxFail),
            -2000 => Some(DxlError::TxError),
            -3000 => Some(DxlError::RxTimeout),
            -3001 => Some(DxlError::RxFail),
            -3002 => Some(DxlError::RxWaiting),
            -3003 => Some(DxlError::RxCorrupt),
            -9000 => Some(DxlError::NotAvailable),
            _ => None,
        }
    }

    /// True for errors raised while sending.
    pub fn is_tx_error(self) -> bool {
        matches!(self, DxlError::TxFail | DxlError::TxError | DxlError::PortBusy)
    }

    /// True for errors raised while receiving.
    pub fn is_rx_error(self) -> bool {
        matches!(
            self,
            DxlError::RxFail | DxlError::RxWaiting | DxlError::RxTimeout | DxlError::RxCorrupt
        )
    }

    /// True if the device never answered.
    pub fn is_timeout(self) -> bool {
        self == DxlError::RxTimeout
    }
}

/// Collapse a result into the numeric communication code.
pub fn result_code(result: DxlResult<()>) -> i32 {
    match result {
        Ok(()) => COMM_SUCCESS,
        Err(e) => e.code(),
    }
}
