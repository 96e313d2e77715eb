//! Windows system-call bindings.
//!
//! Present only so the crate builds as a portable dependency during
//! development; the coprocessor and CPU-instruction backends this crate
//! exists for are s390x/Linux-only.

use windows_sys::Win32::Security::Cryptography::{BCryptGenRandom, BCRYPT_USE_SYSTEM_PREFERRED_RNG};

pub(crate) fn sys_random(buf: &mut [u8]) {
    let status = unsafe {
        BCryptGenRandom(
            std::ptr::null_mut(),
            buf.as_mut_ptr(),
            buf.len() as u32,
            BCRYPT_USE_SYSTEM_PREFERRED_RNG,
        )
    };

    if status != 0 {
        panic!("BCryptGenRandom failed with status {status}");
    }
}

pub(crate) fn sys_domain() -> i32 {
    -1
}
