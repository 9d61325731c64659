//! String hashing for hash-table keys.
//!
//! Rust port of `original_source/utils/hash_utils.cpp`: the FNV-1 hash
//! (multiply-then-xor, as opposed to FNV-1a's xor-then-multiply).
//! Reference: <https://en.wikipedia.org/wiki/Fowler%E2%80%93Noll%E2%80%93Vo_hash_function#FNV-1_hash>

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Hashes a byte string using FNV-1.
///
/// Every hash table and sorted set in this crate keys on this function, so a
/// given byte string always lands in the same bucket across the fixed
/// hash table (D), the progressive hash map (E), and the sorted set (H).
#[inline]
pub fn str_hash(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for &b in bytes {
        hash = hash.wrapping_mul(FNV_PRIME);
        hash ^= b as u64;
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_is_offset_basis() {
        assert_eq!(str_hash(b""), FNV_OFFSET_BASIS);
    }

    #[test]
    fn same_bytes_hash_the_same() {
        assert_eq!(str_hash(b"tyler"), str_hash(b"tyler"));
    }

    #[test]
    fn different_bytes_usually_differ() {
        assert_ne!(str_hash(b"jeff"), str_hash(b"won"));
    }
}
