//! An in-memory, single-node key-value store reachable over a
//! length-prefixed binary TCP protocol.
//!
//! The crate is organized leaf-first, the way the data flows through a
//! request: [`buffer`] and [`codec`] are the raw byte-level primitives that
//! [`protocol`] builds its framed, tagged request/response codec on top of.
//! [`hashtable`] and [`hashmap`] provide point lookup (the latter adding
//! progressive, amortized resizing); [`avl`] provides ordered/ranked
//! queries; [`sorted_set`] composes the two. [`heap`] and [`queue`] back the
//! two timer flavors in [`timers`]. [`store`] ties the whole stack together
//! behind a single `execute` entry point that an external TCP listener (see
//! `src/bin/kv_server.rs`) drives.
//!
//! None of these modules perform I/O or read the clock; see `SPEC_FULL.md`
//! §5 for the concurrency and resource model this crate follows.

pub mod avl;
pub mod buffer;
pub mod codec;
pub mod config;
pub mod error;
pub mod hash;
pub mod hashmap;
pub mod hashtable;
pub mod heap;
pub mod protocol;
pub mod queue;
pub mod sorted_set;
pub mod store;
pub mod timefn;
pub mod timers;

pub use error::CodecError;
pub use protocol::{Request, Response};
pub use store::Store;
