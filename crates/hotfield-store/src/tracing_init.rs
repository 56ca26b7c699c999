//! `tracing-subscriber` bootstrap, used by tests and downstream binaries.
//!
//! Library crates never install a global subscriber themselves; only this
//! helper does, and only when explicitly called.

use tracing_subscriber::EnvFilter;

/// Install a `tracing-subscriber` formatter honoring `RUST_LOG`, defaulting
/// to `info` when unset. Safe to call more than once; subsequent calls are
/// a no-op (the global subscriber can only be set once per process).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
