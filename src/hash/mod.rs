//! Hash functions behind Edwards public-key derivation.
//!
//! Ed25519 key derivation hashes the seed with SHA-512; Ed448 hashes it
//! with SHAKE-256 (114-byte output). SHA-512 is a small fixed-input
//! compression loop implemented in-house; SHAKE-256 comes from `sha3`.

mod sha512;

pub(crate) use sha512::sha512;

/// Computes the SHAKE-256 extendable-output hash of `input`, writing
/// exactly `out.len()` bytes (114 for Ed448 key derivation).
pub(crate) fn shake256(input: &[u8], out: &mut [u8]) {
    use sha3::digest::{ExtendableOutput, Update, XofReader};
    let mut hasher = sha3::Shake256::default();
    hasher.update(input);
    let mut reader = hasher.finalize_xof();
    reader.read(out);
}
