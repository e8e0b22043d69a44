#![no_main]

use libfuzzer_sys::fuzz_target;
use voltage_dynamixel::{DxlError, DxlResult, Port, Protocol2PacketHandler};

struct SlicePort<'a> {
    data: &'a [u8],
}

impl Port for SlicePort<'_> {
    fn write_port(&mut self, _: &[u8]) -> DxlResult<()> {
        Ok(())
    }

    fn read_port(&mut self, buf: &mut [u8]) -> DxlResult<usize> {
        if self.data.is_empty() {
            return Err(DxlError::RxTimeout);
        }
        let n = buf.len().min(self.data.len());
        buf[..n].copy_from_slice(&self.data[..n]);
        self.data = &self.data[n..];
        Ok(n)
    }
}

fuzz_target!(|data: &[u8]| {
    let handler = Protocol2PacketHandler::new();
    let mut port = SlicePort { data };
    while let Ok(status) = handler.rx_packet(&mut port) {
        assert!(status.id <= voltage_dynamixel::MAX_ID);
    }
});
