//! Fuzz target for daemon request parsing.
//!
//! A request payload arrives straight off the network, so the parser must
//! reject arbitrary garbage without panicking.

#![no_main]

use barge_git::DaemonRequest;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(request) = DaemonRequest::parse(data) {
        // Anything that parses must re-state its service by name.
        assert!(!request.service.name().is_empty());
    }
});
