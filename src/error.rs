//! Error taxonomy for the framed wire codec.
//!
//! Rust rendition of the `MarshalStatus` / `UnmarshalStatus` enums from
//! `original_source/requests/Request.hpp` and `original_source/responses/Response.hpp`.
//! The C++ source models "incomplete" as a status value alongside the real
//! errors; here it is folded into `Result<Option<_>, CodecError>` at the call
//! site instead (see `crate::protocol`), so `CodecError` only carries the
//! two conditions that are genuinely exceptional: a frame over [`MAX_FRAME_LEN`]
//! and an unrecognized variant tag.
//!
//! [`MAX_FRAME_LEN`]: crate::protocol::MAX_FRAME_LEN

use thiserror::Error;

/// Errors produced while marshaling or unmarshaling a framed request/response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The encoded (or to-be-encoded) payload exceeds `MAX_FRAME_LEN`.
    #[error("frame payload of {len} bytes exceeds the {max} byte limit")]
    TooBig {
        /// Size of the offending payload, in bytes.
        len: usize,
        /// The limit that was exceeded.
        max: usize,
    },

    /// The leading tag byte of a payload did not match a known variant.
    #[error("unrecognized wire tag {0:#04x}")]
    InvalidTag(u8),

    /// A length-prefixed field (a string, an array count, a nested element)
    /// claimed more bytes than remained in the frame's payload. The overall
    /// frame length was valid; some inner field was not.
    #[error("malformed frame payload: a length-prefixed field ran past the payload bounds")]
    Malformed,
}
