use std::sync::atomic::{AtomicU64, Ordering};

/// Returns a process-unique connection identifier, starting at 1.
///
/// Connection ids key the join arbiter, so they must never repeat within a run.
pub fn next_connection_id() -> u64 {
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    COUNTER.fetch_add(1, Ordering::Relaxed)
}
