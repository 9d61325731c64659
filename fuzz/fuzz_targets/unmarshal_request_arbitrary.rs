#![no_main]
use libfuzzer_sys::fuzz_target;

use tinykv::protocol::unmarshal_request;

fuzz_target!(|data: &[u8]| {
    // Feed arbitrary bytes straight at the request decoder. Ok/Err/None are
    // all fine outcomes; what we verify is no panic and, when it does claim
    // success, that it never reports consuming more bytes than were given.
    if let Ok(Some((_req, consumed))) = unmarshal_request(data) {
        assert!(consumed <= data.len());
    }
});
