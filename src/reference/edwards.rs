//! Dalek/Goldilocks-backed Edwards base-point multiplication.
//!
//! The Edwards consumers in this crate only ever multiply the curve's
//! own generator by a clamped scalar and then need the affine `y` plus
//! the parity of `x` for RFC 8032 point compression, so the surface here
//! is exactly that: `(y, x_parity)`, both in the RFC's little-endian
//! layout with the sign bit stripped out of `y`.

use curve25519_dalek::constants::ED25519_BASEPOINT_TABLE;
use curve25519_dalek::scalar::Scalar as Ed25519Scalar;
use ed448_goldilocks_plus::{
    EdwardsPoint as Ed448Point, Scalar as Ed448Scalar, ScalarBytes, WideScalarBytes,
};

/// Multiplies the Ed25519 base point by `scalar` (32 bytes,
/// little-endian, already clamped).
pub(crate) fn ed25519_base_mul(scalar_le: &[u8; 32]) -> ([u8; 32], u8) {
    let scalar = Ed25519Scalar::from_bytes_mod_order(*scalar_le);
    let point = ED25519_BASEPOINT_TABLE * &scalar;
    let compressed = point.compress().to_bytes();

    // RFC 8032 packs the x parity into the top bit of the last byte.
    let parity = compressed[31] >> 7;
    let mut y = compressed;
    y[31] &= 0x7f;

    (y, parity)
}

/// Multiplies the Ed448 base point by `scalar` (57 bytes, little-endian,
/// already clamped, top byte zero).
pub(crate) fn ed448_base_mul(scalar_le: &[u8; 57]) -> ([u8; 57], u8) {
    let mut wide = WideScalarBytes::default();
    wide[..57].copy_from_slice(&ScalarBytes::clone_from_slice(scalar_le));
    let scalar = Ed448Scalar::from_bytes_mod_order_wide(&wide);
    let point = Ed448Point::GENERATOR * &scalar;
    let compressed = point.compress().to_bytes();

    // 56 magnitude bytes of y, then the sign byte carrying x's parity
    // in its top bit.
    let parity = compressed[56] >> 7;
    let mut y = compressed;
    y[56] = 0;

    (y, parity)
}
