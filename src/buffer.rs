//! Growable FIFO byte buffer backing the framed wire codec.
//!
//! Rust port of `original_source/buffer/Buffer.cpp` / `Buffer.hpp`. The C++
//! version tracks four raw pointers (`buffer_start`, `buffer_end`,
//! `data_start`, `data_end`); here those collapse to a `Vec<u8>` plus a
//! `head` cursor, which gives the same amortized cost profile (compact when
//! there's room, double when there isn't) without manual `realloc`.
//!
//! | Rust method        | C++ equivalent         |
//! |---------------------|------------------------|
//! | [`Buffer::append`]  | `Buffer::append`        |
//! | [`Buffer::consume`] | `Buffer::consume`       |
//! | [`Buffer::data`]    | `Buffer::data`          |
//! | [`Buffer::len`]     | `Buffer::size`          |

const INITIAL_CAPACITY: usize = 64 * 1024;

/// A contiguous, growable byte buffer with O(1)-amortized append at the tail
/// and O(1) consume from the head.
pub struct Buffer {
    storage: Vec<u8>,
    head: usize,
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Buffer {
    /// Creates an empty buffer with the default 64 KiB region, matching the
    /// C++ constructor's initial `malloc(64 * 1024)`.
    pub fn new() -> Self {
        Buffer {
            storage: Vec::with_capacity(INITIAL_CAPACITY),
            head: 0,
        }
    }

    /// Number of live bytes currently held.
    pub fn len(&self) -> usize {
        self.storage.len() - self.head
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A view of the live bytes, `[data_start, data_end)` in the C++ source.
    pub fn data(&self) -> &[u8] {
        &self.storage[self.head..]
    }

    /// Appends `bytes` to the tail. Compacts in place before growing, mirroring
    /// the C++ source's "enough combined space, but need to move data to the
    /// front" branch; only reallocates when compaction alone wouldn't make room.
    pub fn append(&mut self, bytes: &[u8]) {
        let data_len = self.len();
        if self.head > 0 && self.storage.capacity() - data_len < bytes.len() {
            log::trace!("compacting buffer: {} bytes of head slack reclaimed", self.head);
            self.storage.drain(0..self.head);
            self.head = 0;
        }
        if self.storage.capacity() < data_len + bytes.len() {
            log::trace!(
                "growing buffer past {} bytes of capacity",
                self.storage.capacity()
            );
        }
        self.storage.extend_from_slice(bytes);
    }

    pub fn append_u8(&mut self, value: u8) {
        self.append(&[value]);
    }

    pub fn append_u32(&mut self, value: u32) {
        self.append(&value.to_le_bytes());
    }

    pub fn append_i64(&mut self, value: i64) {
        self.append(&value.to_le_bytes());
    }

    pub fn append_f64(&mut self, value: f64) {
        self.append(&value.to_le_bytes());
    }

    /// Advances the head past `n` consumed bytes without copying the rest.
    /// A no-op (logged, not an error) when the buffer is already empty,
    /// matching `original_source/buffer/Buffer.cpp`'s `consume`.
    pub fn consume(&mut self, n: usize) {
        if self.is_empty() {
            log::debug!("consume called on an empty buffer, nothing to remove");
            return;
        }
        self.head = (self.head + n).min(self.storage.len());
        if self.head == self.storage.len() {
            self.storage.clear();
            self.head = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_then_consume_all_is_empty() {
        let mut buf = Buffer::new();
        buf.append(b"hello world");
        assert_eq!(buf.len(), 11);
        buf.consume(buf.len());
        assert_eq!(buf.len(), 0);
        assert!(buf.is_empty());
    }

    #[test]
    fn consume_on_empty_buffer_is_a_no_op() {
        let mut buf = Buffer::new();
        buf.consume(5);
        assert_eq!(buf.len(), 0);
    }

    #[test]
    fn partial_consume_preserves_remaining_bytes() {
        let mut buf = Buffer::new();
        buf.append(b"abcdef");
        buf.consume(2);
        assert_eq!(buf.data(), b"cdef");
    }

    #[test]
    fn grow_past_initial_region_preserves_every_byte() {
        let mut buf = Buffer::new();
        let first: Vec<u8> = (0..48 * 1024).map(|i| (i % 256) as u8).collect();
        buf.append(&first);
        buf.consume(32 * 1024);
        let second: Vec<u8> = (0..48 * 1024).map(|i| ((i + 7) % 256) as u8).collect();
        buf.append(&second);

        assert_eq!(buf.len(), 64 * 1024);
        let expected: Vec<u8> = first[32 * 1024..]
            .iter()
            .chain(second.iter())
            .copied()
            .collect();
        assert_eq!(buf.data(), expected.as_slice());
    }

    #[test]
    fn fixed_width_appenders_write_little_endian() {
        let mut buf = Buffer::new();
        buf.append_u8(0xAB);
        buf.append_u32(0x0102_0304);
        buf.append_i64(-1);
        buf.append_f64(1.5);

        let data = buf.data();
        assert_eq!(data[0], 0xAB);
        assert_eq!(&data[1..5], &0x0102_0304u32.to_le_bytes());
        assert_eq!(&data[5..13], &(-1i64).to_le_bytes());
        assert_eq!(&data[13..21], &1.5f64.to_le_bytes());
    }
}
