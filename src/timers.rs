//! Connection idle timeouts and per-key TTL expiry.
//!
//! Rust port of `original_source/timers/IdleTimer.hpp`/`.cpp` and
//! `original_source/timers/TTLTimer.hpp`/`.cpp`, built on this crate's
//! [`crate::queue::Queue`] and [`crate::heap::MinHeap`] respectively rather
//! than the C++ source's intrusive list/heap nodes.
//!
//! Neither timer reads the clock itself: every operation that needs "now"
//! takes it as an explicit `now_ms: u64` parameter, so the timer logic is
//! deterministic and testable without sleeping (see `SPEC_FULL.md` §4.9 and
//! §9 for the rationale).

use crate::heap::{Handle as HeapHandle, MinHeap};
use crate::queue::{Handle as QueueHandle, Queue};

/// Default connection idle timeout, matching `original_source`'s
/// `IdleTimer::TIMEOUT_MS`.
pub const IDLE_TIMEOUT_MS: u64 = 60_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnHandle(QueueHandle);

struct ConnEntry {
    conn_id: u64,
    last_active_ms: u64,
}

impl Default for ConnEntry {
    fn default() -> Self {
        ConnEntry {
            conn_id: 0,
            last_active_ms: 0,
        }
    }
}

/// Tracks connection activity in a FIFO queue and evicts connections that
/// have been idle for longer than [`IDLE_TIMEOUT_MS`].
///
/// Because every `mark_active` call moves a connection to the back of the
/// queue, the queue stays sorted by `last_active_ms` ascending, so expiry
/// only ever has to inspect the front.
pub struct IdleTimer {
    queue: Queue<ConnEntry>,
    timeout_ms: u64,
}

impl Default for IdleTimer {
    fn default() -> Self {
        Self::new(IDLE_TIMEOUT_MS)
    }
}

impl IdleTimer {
    pub fn new(timeout_ms: u64) -> Self {
        IdleTimer {
            queue: Queue::new(),
            timeout_ms,
        }
    }

    /// Registers a newly accepted connection as active at `now_ms`.
    pub fn register(&mut self, conn_id: u64, now_ms: u64) -> ConnHandle {
        ConnHandle(self.queue.push(ConnEntry {
            conn_id,
            last_active_ms: now_ms,
        }))
    }

    /// Marks a connection active again, moving it to the back of the queue.
    /// `handle` is consumed; the returned handle replaces it for any later
    /// call (`remove`/`mark_active` again).
    pub fn mark_active(&mut self, handle: ConnHandle, now_ms: u64) -> ConnHandle {
        let entry = self.queue.remove(handle.0);
        ConnHandle(self.queue.push(ConnEntry {
            conn_id: entry.conn_id,
            last_active_ms: now_ms,
        }))
    }

    /// Removes a connection from tracking entirely (e.g. on disconnect).
    pub fn remove(&mut self, handle: ConnHandle) {
        self.queue.remove(handle.0);
    }

    /// Returns the ids of every connection that has been idle for at least
    /// `timeout_ms`, removing them from tracking.
    pub fn expire(&mut self, now_ms: u64) -> Vec<u64> {
        let mut expired = Vec::new();
        loop {
            let Some((handle, entry)) = self.queue.front() else {
                break;
            };
            if now_ms.saturating_sub(entry.last_active_ms) < self.timeout_ms {
                break;
            }
            let conn_id = entry.conn_id;
            self.queue.remove(handle);
            log::debug!("connection {conn_id} idle past {}ms, expiring", self.timeout_ms);
            expired.push(conn_id);
        }
        expired
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TtlHandle(HeapHandle);

struct TtlEntry {
    key_hash: u64,
    expires_at_ms: u64,
}

impl PartialEq for TtlEntry {
    fn eq(&self, other: &Self) -> bool {
        self.expires_at_ms == other.expires_at_ms
    }
}
impl Eq for TtlEntry {}
impl PartialOrd for TtlEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for TtlEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.expires_at_ms.cmp(&other.expires_at_ms)
    }
}

/// Tracks per-key expiry deadlines in a min-heap ordered by absolute
/// expiry time, so the next key due to expire is always at the heap's root.
pub struct TtlTimer {
    heap: MinHeap<TtlEntry>,
}

impl Default for TtlTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl TtlTimer {
    pub fn new() -> Self {
        TtlTimer {
            heap: MinHeap::new(),
        }
    }

    /// Schedules `key_hash` to expire at `expires_at_ms`.
    pub fn schedule(&mut self, key_hash: u64, expires_at_ms: u64) -> TtlHandle {
        TtlHandle(self.heap.push(TtlEntry {
            key_hash,
            expires_at_ms,
        }))
    }

    /// Cancels a previously scheduled expiry (e.g. the key was overwritten
    /// with no TTL, or deleted outright).
    pub fn cancel(&mut self, handle: TtlHandle) {
        self.heap.remove(handle.0);
    }

    /// Pops every key hash whose deadline is at or before `now_ms`.
    pub fn expire(&mut self, now_ms: u64) -> Vec<u64> {
        let mut expired = Vec::new();
        while let Some(entry) = self.heap.peek() {
            if entry.expires_at_ms > now_ms {
                break;
            }
            let entry = self.heap.pop_min().unwrap();
            log::debug!("key hash {:#x} past its TTL, expiring", entry.key_hash);
            expired.push(entry.key_hash);
        }
        expired
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_timer_does_not_expire_recently_active_connections() {
        let mut t = IdleTimer::new(1000);
        t.register(1, 0);
        assert!(t.expire(500).is_empty());
    }

    #[test]
    fn idle_timer_expires_connections_past_the_timeout() {
        let mut t = IdleTimer::new(1000);
        t.register(1, 0);
        t.register(2, 100);
        let expired = t.expire(1100);
        assert_eq!(expired, vec![1]);
        assert!(t.expire(1200).is_empty());
        let expired = t.expire(1200 + 1000);
        assert_eq!(expired, vec![2]);
        assert!(t.is_empty());
    }

    #[test]
    fn mark_active_resets_a_connections_deadline() {
        let mut t = IdleTimer::new(1000);
        let h1 = t.register(1, 0);
        t.register(2, 0);
        let _h1 = t.mark_active(h1, 900);
        // At t=1000, conn 2 (still active at 0) is overdue; conn 1 was
        // refreshed at 900 and is not.
        let expired = t.expire(1000);
        assert_eq!(expired, vec![2]);
    }

    #[test]
    fn removed_connections_never_expire() {
        let mut t = IdleTimer::new(1000);
        let h = t.register(1, 0);
        t.remove(h);
        assert!(t.expire(5000).is_empty());
    }

    #[test]
    fn ttl_timer_expires_keys_in_deadline_order() {
        let mut t = TtlTimer::new();
        t.schedule(111, 500);
        t.schedule(222, 100);
        t.schedule(333, 900);
        assert_eq!(t.expire(100), vec![222]);
        assert_eq!(t.expire(500), vec![111]);
        assert!(t.expire(800).is_empty());
        assert_eq!(t.expire(900), vec![333]);
    }

    #[test]
    fn ttl_timer_cancel_removes_a_pending_expiry() {
        let mut t = TtlTimer::new();
        let h = t.schedule(1, 100);
        t.schedule(2, 200);
        t.cancel(h);
        assert_eq!(t.expire(1000), vec![2]);
    }
}
