//! # Voltage Dynamixel - Group Sync Read for Dynamixel Buses
//!
//! **Author:** Evan Liu <liuyifanz.1996@gmail.com>
//! **License:** MIT
//!
//! Batched register reads over a half-duplex Dynamixel bus: register several
//! device IDs, send one sync read instruction, demultiplex every device's
//! answer into one buffer and read typed fields back out.
//!
//! ## Features
//!
//! - **One Request, Many Devices**: a single Protocol 2.0 sync read instruction
//! - **Single Buffer**: IDs and results share one allocation, self-allocated
//!   on first use or lent by the caller
//! - **Pluggable Layers**: bring your own [`Port`] and [`PacketHandler`], or use
//!   [`IoPort`] and [`Protocol2PacketHandler`]
//! - **Blocking and Simple**: no runtime, no threads, no hidden retries
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use voltage_dynamixel::{GroupSyncRead, IoPort, Protocol2PacketHandler, ReadWindow};
//! use std::fs::OpenOptions;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Serial device already configured for 57600 baud
//!     let serial = OpenOptions::new().read(true).write(true).open("/dev/ttyUSB0")?;
//!
//!     // Read Present Position (address 132, 4 bytes) from up to 8 servos
//!     let mut group = GroupSyncRead::new(
//!         IoPort::new(serial),
//!         Protocol2PacketHandler::new(),
//!         ReadWindow::new(132, 4),
//!         8,
//!     );
//!     group.add_param(1);
//!     group.add_param(2);
//!
//!     group.tx_rx_packet()?;
//!     println!("ID 1 at {}", group.get_data(1, 132, 4) as i32);
//!     Ok(())
//! }
//! ```

// ============================================================================
// Core modules
// ============================================================================

/// Error types and communication result codes
pub mod error;

/// Dynamixel Protocol 2.0 constants
pub mod constants;

/// Register window configuration
pub mod window;

/// Port and packet handler traits
pub mod handler;

/// Group sync read
pub mod sync_read;

/// Single-buffer slot storage
pub mod slots;

// ============================================================================
// Protocol layers
// ============================================================================

/// Protocol 2.0 packet handler
pub mod protocol2;

/// `std::io` port adapter
pub mod port;

/// Device status byte decoding
pub mod status;

// ============================================================================
// Re-exports for convenience
// ============================================================================

// === Core API ===
pub use sync_read::GroupSyncRead;
pub use window::ReadWindow;

// === Error handling ===
pub use error::{result_code, DxlError, DxlResult, COMM_SUCCESS};

// === Collaborators ===
pub use handler::{PacketHandler, Port, ProtocolVersion};
pub use port::IoPort;
pub use protocol2::{Protocol2PacketHandler, StatusPacket};

// === Status ===
pub use status::{ErrorNumber, HardwareStatus};

// === Protocol constants (commonly needed) ===
pub use constants::{BROADCAST_ID, MAX_ID};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library information
pub fn info() -> String {
    format!(
        "Voltage Dynamixel v{} - Group sync read for Dynamixel buses by Evan Liu",
        VERSION
    )
}
