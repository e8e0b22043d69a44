#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use voltage_dynamixel::{
    DxlError, DxlResult, GroupSyncRead, Port, Protocol2PacketHandler, ReadWindow,
};

#[derive(Debug, Arbitrary)]
enum Op {
    Add(u8),
    Remove(u8),
    Clear,
    Exchange,
    Get { id: u8, address: u16, length: u8 },
}

#[derive(Debug, Arbitrary)]
struct Input {
    start: u16,
    length: u8,
    capacity: u8,
    wire: Vec<u8>,
    ops: Vec<Op>,
}

struct WirePort {
    data: Vec<u8>,
    pos: usize,
}

impl Port for WirePort {
    fn write_port(&mut self, _: &[u8]) -> DxlResult<()> {
        Ok(())
    }

    fn read_port(&mut self, buf: &mut [u8]) -> DxlResult<usize> {
        let rest = &self.data[self.pos..];
        if rest.is_empty() {
            return Err(DxlError::RxTimeout);
        }
        let n = buf.len().min(rest.len());
        buf[..n].copy_from_slice(&rest[..n]);
        self.pos += n;
        Ok(n)
    }
}

fuzz_target!(|input: Input| {
    let mut group = GroupSyncRead::new(
        WirePort { data: input.wire, pos: 0 },
        Protocol2PacketHandler::new(),
        ReadWindow::new(input.start, u16::from(input.length)),
        usize::from(input.capacity),
    );

    for op in input.ops {
        match op {
            Op::Add(id) => {
                group.add_param(id);
            }
            Op::Remove(id) => group.remove_param(id),
            Op::Clear => group.clear_param(),
            Op::Exchange => {
                let _ = group.tx_rx_packet();
            }
            Op::Get { id, address, length } => {
                let length = u16::from(length);
                let value = group.get_data(id, address, length);
                if !group.is_available(id, address, length) {
                    assert_eq!(value, 0);
                }
            }
        }
        assert!(group.len() <= group.capacity());
    }
});
