//! Fixed-width little-endian codec primitives.
//!
//! Rust port of `original_source/utils/buf_utils.cpp`, generalized the way
//! `read_le32`/`write_le32` are generalized in this crate's own
//! `frame::header` module: free functions over a cursor rather than a
//! `char **` that gets advanced in place. The source repository carries two
//! revisions of these helpers — one network-order, one host-order, copied
//! verbatim with `memcpy` — this crate picks little-endian once and applies
//! it uniformly (see `SPEC_FULL.md` §4.2 and §9).

/// Reads a `u8` at `offset`.
#[inline]
pub fn read_u8(src: &[u8], offset: usize) -> u8 {
    src[offset]
}

/// Reads a little-endian `u32` at `offset`.
#[inline]
pub fn read_u32(src: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(src[offset..offset + 4].try_into().unwrap())
}

/// Reads a little-endian `i64` at `offset`.
#[inline]
pub fn read_i64(src: &[u8], offset: usize) -> i64 {
    i64::from_le_bytes(src[offset..offset + 8].try_into().unwrap())
}

/// Reads a little-endian `f64` at `offset`.
#[inline]
pub fn read_f64(src: &[u8], offset: usize) -> f64 {
    f64::from_le_bytes(src[offset..offset + 8].try_into().unwrap())
}

/// Reads `len` raw bytes at `offset` without copying past the stated length.
#[inline]
pub fn read_bytes(src: &[u8], offset: usize, len: usize) -> &[u8] {
    &src[offset..offset + len]
}
