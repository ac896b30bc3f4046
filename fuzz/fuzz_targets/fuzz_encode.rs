//! Fuzz target for pkt-line encoding consistency.
//!
//! Encodes arbitrary payloads and checks the decoder reads back exactly
//! the bytes that went in.

#![no_main]

use barge_git::{Packet, MAX_PACKET_LENGTH};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|payloads: Vec<Vec<u8>>| {
    for payload in payloads {
        if payload.len() + 4 > MAX_PACKET_LENGTH {
            continue;
        }

        let encoded = Packet::from_bytes(payload.clone()).encode();
        let (decoded, used) = Packet::decode(&encoded)
            .expect("encoded packet must decode")
            .expect("encoded packet must be complete");
        assert_eq!(used, encoded.len());
        assert_eq!(decoded.data(), Some(payload.as_slice()));
    }
});
