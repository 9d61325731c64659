//! Compile-time configuration constants for the demonstration server binary.
//!
//! Mirrors `original_source/timers/IdleTimer.cpp`'s `TIMEOUT_MS` and
//! `original_source/server.cpp`'s fixed listening port, generalized per
//! `SPEC_FULL.md` §4.12/§6 into defaults that `src/bin/kv_server.rs`
//! overrides with `--port`/`--idle-timeout-ms` flags.

/// Default TCP port the demonstration server binds, absent a `--port` flag.
pub const DEFAULT_PORT: u16 = 7878;

/// Default connection idle timeout in milliseconds, matching
/// [`crate::timers::IDLE_TIMEOUT_MS`].
pub const DEFAULT_IDLE_TIMEOUT_MS: u64 = crate::timers::IDLE_TIMEOUT_MS;

/// How often the demonstration server's background sweep checks for idle
/// connections to close.
pub const IDLE_SWEEP_INTERVAL_MS: u64 = 5_000;
