//! Byte channel adapter
//!
//! [`IoPort`] turns any blocking `Read + Write` handle into a [`Port`]: an
//! opened serial device, a TCP bridge to an RS-485 converter, or an in-memory
//! pipe in tests. Read timeouts are whatever the wrapped handle enforces.

use std::io::{ErrorKind, Read, Write};

use tracing::{trace, warn};

use crate::error::{DxlError, DxlResult};
use crate::handler::Port;

/// [`Port`] over a blocking `std::io` handle.
#[derive(Debug)]
pub struct IoPort<T> {
    inner: T,
    packet_logging: bool,
}

impl<T: Read + Write> IoPort<T> {
    /// Wrap an I/O handle.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            packet_logging: false,
        }
    }

    /// Enable or disable hex dumps of every packet at trace level.
    pub fn set_packet_logging(&mut self, enabled: bool) {
        self.packet_logging = enabled;
    }

    /// Get a reference to the wrapped handle.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Get a mutable reference to the wrapped handle.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Unwrap the handle.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Read + Write> Port for IoPort<T> {
    fn write_port(&mut self, packet: &[u8]) -> DxlResult<()> {
        if self.packet_logging {
            trace!("TX {:02X?}", packet);
        }
        self.inner
            .write_all(packet)
            .and_then(|()| self.inner.flush())
            .map_err(|e| {
                warn!("Port write failed: {}", e);
                DxlError::TxFail
            })
    }

    fn read_port(&mut self, buf: &mut [u8]) -> DxlResult<usize> {
        loop {
            match self.inner.read(buf) {
                Ok(0) if !buf.is_empty() => return Err(DxlError::RxTimeout),
                Ok(n) => {
                    if self.packet_logging {
                        trace!("RX {:02X?}", &buf[..n]);
                    }
                    return Ok(n);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                    return Err(DxlError::RxTimeout)
                }
                Err(e) => {
                    warn!("Port read failed: {}", e);
                    return Err(DxlError::RxFail);
                }
            }
        }
    }
}
