#![no_main]

use bytes::BytesMut;
use libfuzzer_sys::fuzz_target;
use voltage_dynamixel::protocol2::{add_stuffing, remove_stuffing};

fuzz_target!(|data: &[u8]| {
    let mut stuffed = BytesMut::new();
    add_stuffing(data, &mut stuffed);
    assert_eq!(&remove_stuffing(&stuffed)[..], data);
});
