//! Secret scrubbing.
//!
//! Zeroization must survive the optimizer even when the buffer is about
//! to go out of scope. `zeroize` wraps the write in a volatile operation
//! plus a compiler fence, so a parameter block or request buffer that
//! never escapes its function still gets its clearing writes emitted.

use zeroize::Zeroize;

/// Scrubs `buf` in a way the optimizer cannot remove.
pub(crate) fn scrub(buf: &mut [u8]) {
    buf.zeroize();
}
