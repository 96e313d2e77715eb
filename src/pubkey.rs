//! Public-key derivation from a private scalar.
//!
//! Materializes `(X, Y)` for Weierstrass keys and the public `u` for
//! Montgomery keys by multiplying the curve's generator on the
//! CPU-instruction path — no distinct "derive" verb exists there, it is
//! ordinary scalar multiplication with the base point as the input
//! point. Edwards curves are not handled here: their derivation is the
//! compound hash-and-clamp procedure in [`crate::edwards_derive`].

use crate::cpacf;
use crate::curve::{Curve, CurveKind};
use crate::error::Error;

/// Derives the public point from `d` for a Weierstrass or Montgomery
/// curve. Montgomery keys carry their public `u` coordinate in the first
/// element; the second is empty.
pub(crate) fn derive(curve: Curve, d: &[u8]) -> Result<(Vec<u8>, Vec<u8>), Error> {
    match curve.kind() {
        CurveKind::Weierstrass => {
            let (gx, gy) = curve.base_point();
            let (x, y) = cpacf::scalar_mul(curve, gx, gy, d, true)?;
            Ok((x, y.expect("y was requested")))
        }
        CurveKind::Montgomery => {
            let u = curve.montgomery_base_u();
            let x = cpacf::scalar_mul_montgomery(curve, d, &u)?;
            Ok((x, Vec::new()))
        }
        CurveKind::Edwards => Err(Error::CurveUnsupported { curve, backend: "pubkey::derive" }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn p256_private_key_one_derives_the_base_point_itself() {
        let mut d = [0u8; 32];
        d[31] = 1;

        let (x, y) = derive(Curve::P256, &d).unwrap();
        let (gx, gy) = Curve::P256.base_point();
        assert_eq!(x, gx);
        assert_eq!(y, gy);
    }

    #[test]
    fn p521_coordinates_keep_their_full_width() {
        let mut d = [0u8; 66];
        d[65] = 1;

        let (x, y) = derive(Curve::P521, &d).unwrap();
        assert_eq!(x.len(), 66);
        assert_eq!(y.len(), 66);
        assert_eq!(x[0], 0x00);
    }

    #[test]
    fn edwards_curves_are_rejected() {
        assert!(matches!(derive(Curve::Ed25519, &[0u8; 32]), Err(Error::CurveUnsupported { .. })));
    }
}
