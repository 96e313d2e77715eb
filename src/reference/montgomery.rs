//! X25519 / X448 Montgomery ladders.
//!
//! X25519 rides on `x25519_dalek`. X448 runs the RFC 7748 §5 ladder
//! directly over `crypto-bigint` field residues: the clamped scalar has
//! bit 447 set and therefore exceeds the prime subgroup order, so it
//! must drive the ladder as a raw integer — reducing it to a group
//! `Scalar` first would change its value and, on inputs carrying a
//! cofactor component, the resulting u-coordinate.
//!
//! RFC 7748 clamping happens in the parameter-block packing before
//! these are reached; both functions clamp again, which is harmless
//! since clamping is idempotent.

use crypto_bigint::generic_array::GenericArray;
use crypto_bigint::modular::runtime_mod::{DynResidue, DynResidueParams};
use crypto_bigint::{ArrayEncoding, U448};

/// X25519 ladder: `scalar` and `u` are 32 bytes, little-endian.
pub(crate) fn x25519_mul(scalar: &[u8; 32], u: &[u8; 32]) -> [u8; 32] {
    x25519_dalek::x25519(*scalar, *u)
}

/// The curve448 field prime, 2^448 - 2^224 - 1.
const P448: U448 = U448::from_be_hex(
    "fffffffffffffffffffffffffffffffffffffffffffffffffffffffeffffffffffffffffffffffffffffffffffffffffffffffffffffffff",
);

/// (A - 2) / 4 for curve448's A = 156326.
const A24: u64 = 39081;

/// X448 ladder: `scalar` and `u` are 56 bytes, little-endian. The
/// scalar drives the ladder bit-for-bit after clamping.
pub(crate) fn x448_mul(scalar: &[u8; 56], u: &[u8; 56]) -> [u8; 56] {
    let params = DynResidueParams::new(&P448);
    let fe = |v: U448| DynResidue::new(&v, params);

    let mut k = *scalar;
    k[0] &= 252;
    k[55] |= 128;

    let x1 = fe(U448::from_le_byte_array(GenericArray::clone_from_slice(u)));
    let a24 = fe(U448::from_u64(A24));

    let mut x2 = DynResidue::one(params);
    let mut z2 = DynResidue::zero(params);
    let mut x3 = x1;
    let mut z3 = DynResidue::one(params);
    let mut swap = 0u8;

    for t in (0..448).rev() {
        let kt = (k[t / 8] >> (t % 8)) & 1;
        if swap ^ kt == 1 {
            core::mem::swap(&mut x2, &mut x3);
            core::mem::swap(&mut z2, &mut z3);
        }
        swap = kt;

        let a = x2 + z2;
        let aa = a * a;
        let b = x2 - z2;
        let bb = b * b;
        let e = aa - bb;
        let c = x3 + z3;
        let d = x3 - z3;
        let da = d * a;
        let cb = c * b;

        let da_cb = da + cb;
        x3 = da_cb * da_cb;
        let da_less_cb = da - cb;
        z3 = x1 * (da_less_cb * da_less_cb);
        x2 = aa * bb;
        z2 = e * (aa + a24 * e);
    }

    if swap == 1 {
        core::mem::swap(&mut x2, &mut x3);
        core::mem::swap(&mut z2, &mut z3);
    }

    // z2^(p - 2) is z2's inverse, and 0 for the all-zero input point,
    // which makes u = 0 map to 0 as RFC 7748 requires.
    let exp = P448.wrapping_sub(&U448::from_u64(2));
    let result = (x2 * z2.pow(&exp)).retrieve();

    let mut out = [0u8; 56];
    out.copy_from_slice(&result.to_le_byte_array());
    out
}
