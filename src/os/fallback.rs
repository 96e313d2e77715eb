//! Fallback OS bindings for hosts that are neither Linux, macOS nor Windows.
//!
//! Used for `target_arch = "s390x"` builds under non-Linux kernels and any
//! other exotic host; there is no real entropy source to bind to, so this
//! exists purely to keep the crate buildable everywhere the rest of the
//! tree is exercised.

pub(crate) fn sys_random(buf: &mut [u8]) {
    buf.fill(0);
    panic!("no secure entropy source available on this platform");
}

pub(crate) fn sys_domain() -> i32 {
    -1
}
