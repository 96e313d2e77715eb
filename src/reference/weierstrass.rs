//! RustCrypto-backed P-256 / P-384 / P-521 arithmetic.
//!
//! Operands arrive as big-endian fixed-width byte slices straight out of
//! a parameter block or key token; results go back the same way. The
//! hash operand is already truncated/padded to field width by the
//! caller, so it is used as the prehash scalar bytes verbatim.

use crate::curve::Curve;

macro_rules! curve_impl {
    ($mod_name:ident, $crate_name:ident, $curve_ty:ty, $len:literal) => {
        mod $mod_name {
            use ecdsa::hazmat::{SignPrimitive, VerifyPrimitive};
            use ecdsa::Signature;
            use $crate_name::elliptic_curve::{
                generic_array::GenericArray,
                group::Group,
                sec1::{FromEncodedPoint, ToEncodedPoint},
                PrimeField,
            };
            use $crate_name::{AffinePoint, EncodedPoint, ProjectivePoint, Scalar};

            fn decode_scalar(bytes: &[u8]) -> Result<Scalar, ()> {
                Option::from(Scalar::from_repr(GenericArray::clone_from_slice(bytes))).ok_or(())
            }

            fn decode_point(x: &[u8], y: &[u8]) -> Result<AffinePoint, ()> {
                let encoded = EncodedPoint::from_affine_coordinates(
                    GenericArray::from_slice(x),
                    GenericArray::from_slice(y),
                    false,
                );
                Option::from(AffinePoint::from_encoded_point(&encoded)).ok_or(())
            }

            fn encode_point(point: &ProjectivePoint, want_y: bool) -> Result<([u8; $len], Option<[u8; $len]>), ()> {
                let encoded = point.to_affine().to_encoded_point(false);
                let rx: [u8; $len] = encoded.x().ok_or(())?.as_slice().try_into().map_err(|_| ())?;
                let ry = if want_y {
                    Some(encoded.y().ok_or(())?.as_slice().try_into().map_err(|_| ())?)
                } else {
                    None
                };
                Ok((rx, ry))
            }

            pub(super) fn base_mul(scalar: &[u8], want_y: bool) -> Result<([u8; $len], Option<[u8; $len]>), ()> {
                let k = decode_scalar(scalar)?;
                encode_point(&(ProjectivePoint::generator() * k), want_y)
            }

            pub(super) fn scalar_mul(
                x: &[u8],
                y: &[u8],
                scalar: &[u8],
                want_y: bool,
            ) -> Result<([u8; $len], Option<[u8; $len]>), ()> {
                let affine = decode_point(x, y)?;
                let k = decode_scalar(scalar)?;
                encode_point(&(ProjectivePoint::from(affine) * k), want_y)
            }

            pub(super) fn ecdsa_sign(d: &[u8], hash: &[u8], k: &[u8]) -> Result<([u8; $len], [u8; $len]), ()> {
                let d = decode_scalar(d)?;
                let k = decode_scalar(k)?;
                let z = GenericArray::clone_from_slice(hash);

                let (sig, _) = d.try_sign_prehashed(k, &z).map_err(|_| ())?;

                let (r_bytes, s_bytes) = sig.split_bytes();
                let r: [u8; $len] = r_bytes.as_slice().try_into().map_err(|_| ())?;
                let s: [u8; $len] = s_bytes.as_slice().try_into().map_err(|_| ())?;
                Ok((r, s))
            }

            pub(super) fn ecdsa_verify(x: &[u8], y: &[u8], hash: &[u8], r: &[u8], s: &[u8]) -> Result<(), ()> {
                let affine = decode_point(x, y)?;
                let z = GenericArray::clone_from_slice(hash);

                let signature = Signature::<$curve_ty>::from_scalars(
                    GenericArray::clone_from_slice(r),
                    GenericArray::clone_from_slice(s),
                )
                .map_err(|_| ())?;

                affine.verify_prehashed(&z, &signature).map_err(|_| ())
            }
        }
    };
}

curve_impl!(p256_math, p256, p256::NistP256, 32);
curve_impl!(p384_math, p384, p384::NistP384, 48);
curve_impl!(p521_math, p521, p521::NistP521, 66);

pub(crate) fn base_mul(curve: Curve, scalar: &[u8], want_y: bool) -> Result<(Vec<u8>, Option<Vec<u8>>), ()> {
    match curve {
        Curve::P256 => p256_math::base_mul(scalar, want_y).map(|(rx, ry)| (rx.to_vec(), ry.map(|v| v.to_vec()))),
        Curve::P384 => p384_math::base_mul(scalar, want_y).map(|(rx, ry)| (rx.to_vec(), ry.map(|v| v.to_vec()))),
        Curve::P521 => p521_math::base_mul(scalar, want_y).map(|(rx, ry)| (rx.to_vec(), ry.map(|v| v.to_vec()))),
        _ => Err(()),
    }
}

pub(crate) fn scalar_mul(
    curve: Curve,
    x: &[u8],
    y: &[u8],
    scalar: &[u8],
    want_y: bool,
) -> Result<(Vec<u8>, Option<Vec<u8>>), ()> {
    match curve {
        Curve::P256 => p256_math::scalar_mul(x, y, scalar, want_y).map(|(rx, ry)| (rx.to_vec(), ry.map(|v| v.to_vec()))),
        Curve::P384 => p384_math::scalar_mul(x, y, scalar, want_y).map(|(rx, ry)| (rx.to_vec(), ry.map(|v| v.to_vec()))),
        Curve::P521 => p521_math::scalar_mul(x, y, scalar, want_y).map(|(rx, ry)| (rx.to_vec(), ry.map(|v| v.to_vec()))),
        _ => Err(()),
    }
}

pub(crate) fn ecdsa_sign(curve: Curve, d: &[u8], hash: &[u8], k: &[u8]) -> Result<(Vec<u8>, Vec<u8>), ()> {
    match curve {
        Curve::P256 => p256_math::ecdsa_sign(d, hash, k).map(|(r, s)| (r.to_vec(), s.to_vec())),
        Curve::P384 => p384_math::ecdsa_sign(d, hash, k).map(|(r, s)| (r.to_vec(), s.to_vec())),
        Curve::P521 => p521_math::ecdsa_sign(d, hash, k).map(|(r, s)| (r.to_vec(), s.to_vec())),
        _ => Err(()),
    }
}

pub(crate) fn ecdsa_verify(curve: Curve, x: &[u8], y: &[u8], hash: &[u8], r: &[u8], s: &[u8]) -> Result<(), ()> {
    match curve {
        Curve::P256 => p256_math::ecdsa_verify(x, y, hash, r, s),
        Curve::P384 => p384_math::ecdsa_verify(x, y, hash, r, s),
        Curve::P521 => p521_math::ecdsa_verify(x, y, hash, r, s),
        _ => Err(()),
    }
}
