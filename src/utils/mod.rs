
use chrono::Local;
use std::sync::atomic::{AtomicU64, Ordering};

/// Format used for message timestamps, e.g. `3:04PM`.
pub const KITCHEN_FORMAT: &str = "%-I:%M%p";

/// Returns the next process-unique id. Ids are never reused.
pub fn get_id() -> u64 {
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Current local time as a short human readable string.
pub fn kitchen_time() -> String {
    Local::now().format(KITCHEN_FORMAT).to_string()
}
