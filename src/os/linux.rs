//! Linux system-call bindings.
//!
//! Two services live here: `sys_random`, which seeds the CSPRNG behind
//! the software keygen path, and `sys_domain`, the one-shot sysfs read
//! backing the cached AP domain.

use libc::{c_void, getrandom};
use std::fs;

/// Fills a buffer with cryptographically secure random bytes from the
/// kernel, retrying on partial reads until the buffer is full.
pub(crate) fn sys_random(buf: &mut [u8]) {
    let mut filled = 0;

    while filled < buf.len() {
        let ret = unsafe {
            getrandom(
                buf[filled..].as_mut_ptr() as *mut c_void,
                buf.len() - filled,
                0,
            )
        };

        if ret < 0 {
            panic!("getrandom() failed");
        }

        filled += ret as usize;
    }
}

/// Reads the decimal integer in `/sys/bus/ap/ap_domain`.
///
/// Returns `-1` on any I/O or parse failure. An absent or malformed
/// sysfs file is not fatal at this layer; the sentinel domain rides in
/// every request until a coprocessor rejects it.
pub(crate) fn sys_domain() -> i32 {
    fs::read_to_string("/sys/bus/ap/ap_domain")
        .ok()
        .and_then(|s| s.trim().parse::<i32>().ok())
        .unwrap_or(-1)
}
