//! Cached AP-domain lookup.
//!
//! The domain is read from sysfs once, lazily, the first time any
//! coprocessor request is framed, and reused for the life of the
//! process.

use std::sync::atomic::{AtomicI32, Ordering};

use crate::os;

/// Sentinel meaning "not yet read". `os::sys_domain()` itself returns -1
/// on failure, which is a valid (if useless) cached value, so the
/// sentinel has to be something no OS read can produce.
const UNSET: i32 = i32::MIN;

static CACHED: AtomicI32 = AtomicI32::new(UNSET);

/// Returns the AP domain, reading it from the OS at most once plus
/// however many first calls race. Racing first readers observe the same
/// OS value, so losing the race costs a redundant syscall and nothing
/// else; no lock is needed.
pub(crate) fn domain() -> i32 {
    let cached = CACHED.load(Ordering::Relaxed);
    if cached != UNSET {
        return cached;
    }

    let read = os::sys_domain();
    match CACHED.compare_exchange(UNSET, read, Ordering::Relaxed, Ordering::Relaxed) {
        Ok(_) => read,
        Err(winner) => winner,
    }
}

/// Clears the cache so tests can exercise both the first-read and the
/// cached path deterministically.
#[cfg(test)]
pub(crate) fn reset_for_test() {
    CACHED.store(UNSET, Ordering::Relaxed);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_read_reuses_the_cached_value() {
        reset_for_test();
        let first = domain();
        assert_eq!(domain(), first);
    }
}
