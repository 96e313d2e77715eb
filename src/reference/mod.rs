//! Portable math backing the hardware-shaped backends.
//!
//! On real s390x hardware the elliptic-curve arithmetic is silicon;
//! everywhere else it is the RustCrypto/dalek curve crates. This module
//! is the seam: it performs the actual scalar multiplications and ECDSA
//! math, so that `cpacf::invoke` and the simulated coprocessor transport
//! stay pure glue that differs from the real s390x/ioctl code path only
//! in where the arithmetic happens, never in how inputs and outputs are
//! shaped.

pub(crate) mod edwards;
pub(crate) mod montgomery;
pub(crate) mod weierstrass;
