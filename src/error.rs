//! Error taxonomy.
//!
//! Every public operation returns `Result<T, Error>`. [`Error::errno`]
//! collapses a variant to the POSIX constant callers interoperating
//! with C-style return codes expect. `CurveUnsupported` is the sentinel
//! the dispatcher consumes to escalate from one backend to the next; it
//! reaches a caller only when every backend has refused the curve.

use crate::curve::Curve;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// This backend cannot handle `curve`; the dispatcher escalates to
    /// the next one.
    #[error("curve {curve:?} not supported on the {backend} backend")]
    CurveUnsupported { curve: Curve, backend: &'static str },

    /// A CPU instruction or coprocessor ioctl failed in a way that is
    /// not a signature rejection.
    #[error("hardware operation failed: {0}")]
    HardwareFault(&'static str),

    /// ECDSA verification rejected the signature.
    #[error("signature verification failed")]
    SignatureInvalid,

    /// Neither the CPU-instruction path nor a coprocessor is usable.
    #[error("no ECC accelerator available")]
    NoDevice,

    /// A request or reply buffer could not be sized.
    #[error("allocation failure: {0}")]
    Allocation(&'static str),

    /// Lengths or framing in a request, reply or key record disagree
    /// with what the operation requires.
    #[error("format mismatch: {0}")]
    FormatMismatch(&'static str),

    /// FIPS mode is required but only a policy-excluded path remained.
    #[error("operation denied by FIPS policy")]
    PolicyDenied,
}

impl Error {
    /// Maps this error to its POSIX errno.
    pub fn errno(&self) -> i32 {
        match self {
            Error::CurveUnsupported { .. } => libc::EINVAL,
            Error::HardwareFault(_) => libc::EIO,
            Error::SignatureInvalid => libc::EFAULT,
            Error::NoDevice => libc::ENODEV,
            Error::Allocation(_) => libc::ENOMEM,
            Error::FormatMismatch(_) => libc::EIO,
            Error::PolicyDenied => libc::EACCES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errno_mapping_matches_the_return_code_table() {
        let unsupported = Error::CurveUnsupported { curve: Curve::P256, backend: "cpacf" };
        assert_eq!(unsupported.errno(), libc::EINVAL);
        assert_eq!(Error::SignatureInvalid.errno(), libc::EFAULT);
        assert_eq!(Error::NoDevice.errno(), libc::ENODEV);
        assert_eq!(Error::PolicyDenied.errno(), libc::EACCES);
        assert_eq!(Error::FormatMismatch("x").errno(), libc::EIO);
    }
}
