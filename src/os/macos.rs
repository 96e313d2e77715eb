//! macOS system-call bindings.
//!
//! There is no AP bus or coprocessor character device outside Linux, so
//! only `sys_random` is meaningful here; `sys_domain` returns the same
//! sentinel a missing sysfs file yields, which keeps the coprocessor
//! framing code portable for testing off-Linux.

use libc::arc4random_buf;

pub(crate) fn sys_random(buf: &mut [u8]) {
    unsafe {
        arc4random_buf(buf.as_mut_ptr() as *mut libc::c_void, buf.len());
    }
}

pub(crate) fn sys_domain() -> i32 {
    -1
}
