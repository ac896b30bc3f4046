//! Fuzz target for pkt-line decoding.
//!
//! Feeds arbitrary bytes through the packet decoder and checks it never
//! panics or over-reads the buffer.

#![no_main]

use barge_git::Packet;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut rest = data;

    // Decode up to 100 packets (prevent long runs on crafted input)
    for _ in 0..100 {
        match Packet::decode(rest) {
            Ok(Some((_, used))) => {
                assert!(used <= rest.len());
                rest = &rest[used..];
            }
            Ok(None) => break,  // Incomplete packet
            Err(_) => break,    // Errors are expected for malformed input
        }
    }
});
