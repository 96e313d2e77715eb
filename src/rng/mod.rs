//! Randomness used by this crate's software-backed paths.
//!
//! Two call sites need secure randomness: scalar generation on the
//! software keygen path, and the off-hardware stand-in for the nonce the
//! KDSA sign instruction draws internally when no deterministic
//! generator is supplied.
//!
//! Real s390x hardware draws this from the PCC/KDSA instructions
//! themselves; off that target, this module provides a ChaCha20-based
//! DRBG seeded from OS entropy so the same call sites behave identically
//! in tests.
mod chacha20;
mod csprng;

pub(crate) use csprng::Csprng;
