#![no_main]
use libfuzzer_sys::fuzz_target;

use tinykv::buffer::Buffer;
use tinykv::protocol::{marshal_request, unmarshal_request, Request};

fuzz_target!(|args: Vec<Vec<u8>>| {
    let req = Request { args };

    let mut wire = Buffer::new();
    // A request built from arbitrarily many/large arguments may legitimately
    // exceed MAX_FRAME_LEN; that is a expected, recoverable `TooBig`, not a bug.
    if marshal_request(&req, &mut wire).is_err() {
        return;
    }

    let (decoded, consumed) = unmarshal_request(wire.data())
        .expect("a frame we just marshaled must unmarshal without error")
        .expect("a fully-buffered frame must never report incomplete");

    assert_eq!(consumed, wire.len());
    assert_eq!(decoded, req);
});
