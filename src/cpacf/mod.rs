//! CPU-instruction backend: PCC-based scalar multiplication and
//! KDSA-based ECDSA over fixed-layout 4 KiB parameter blocks.

mod invoke;
mod paramblock;

use crate::curve::{Curve, CurveKind};
use crate::error::Error;
use crate::rng::Csprng;
use paramblock::{clamp_x25519, clamp_x448, mslot, slot, FiveSlotBlock, ThreeSlotBlock};

/// Weierstrass/Edwards scalar multiplication: `x`, `y`, `scalar` are
/// big-endian, each `privlen(curve)` bytes.
pub(crate) fn scalar_mul(
    curve: Curve,
    x: &[u8],
    y: &[u8],
    scalar: &[u8],
    want_y: bool,
) -> Result<(Vec<u8>, Option<Vec<u8>>), Error> {
    debug_assert!(curve.kind() != CurveKind::Montgomery);
    let privlen = curve.privlen();

    let mut block = FiveSlotBlock::new(curve.weierstrass_slot());
    block.pack(slot::X, x);
    block.pack(slot::Y, y);
    block.pack(slot::SCALAR, scalar);

    invoke::scalar_mul(curve, &mut block, privlen, want_y)?;

    let rx = block.unpack(slot::RES_X, privlen);
    let ry = if want_y { Some(block.unpack(slot::RES_Y, privlen)) } else { None };
    Ok((rx, ry))
}

/// Montgomery scalar multiplication for X25519/X448 key agreement and
/// public-key derivation.
///
/// `scalar` and `u` arrive little-endian. The scalar is clamped per
/// RFC 7748 while still little-endian (clamping is defined in terms of
/// that byte order), X25519's non-canonical high coordinate bit is
/// masked, and only then is everything flipped to the big-endian form
/// the parameter block wants; the result flips back on the way out.
pub(crate) fn scalar_mul_montgomery(curve: Curve, scalar: &[u8], u: &[u8]) -> Result<Vec<u8>, Error> {
    debug_assert_eq!(curve.kind(), CurveKind::Montgomery);
    let privlen = curve.privlen();

    let mut u_buf = u.to_vec();
    let mut clamped;
    match curve {
        Curve::X25519 => {
            let mut buf: [u8; 32] =
                scalar.try_into().map_err(|_| Error::FormatMismatch("X25519 scalar must be 32 bytes"))?;
            clamp_x25519(&mut buf);
            clamped = buf.to_vec();

            if u_buf.len() != 32 {
                return Err(Error::FormatMismatch("X25519 coordinate must be 32 bytes"));
            }
            // Mask the non-canonical high bit of the coordinate while it
            // is still little-endian.
            u_buf[31] &= 0x7f;
        }
        Curve::X448 => {
            let mut buf: [u8; 56] =
                scalar.try_into().map_err(|_| Error::FormatMismatch("X448 scalar must be 56 bytes"))?;
            clamp_x448(&mut buf);
            clamped = buf.to_vec();

            if u_buf.len() != 56 {
                return Err(Error::FormatMismatch("X448 coordinate must be 56 bytes"));
            }
        }
        _ => unreachable!(),
    }
    crate::endian::reverse(&mut clamped);
    crate::endian::reverse(&mut u_buf);

    let mut block = ThreeSlotBlock::new(curve.montgomery_slot());
    block.pack(mslot::SCALAR, &clamped);
    block.pack(mslot::U, &u_buf);
    crate::scrub::scrub(&mut clamped);

    invoke::scalar_mul_montgomery(curve, &mut block, privlen)?;

    let mut result = block.unpack(mslot::RES_U, privlen);
    crate::endian::reverse(&mut result);
    Ok(result)
}

/// ECDSA sign over a prehashed digest.
///
/// Without `rng` the instruction is invoked exactly once and supplies
/// its own nonce (stood in for by the crate CSPRNG off-hardware). With
/// `rng` — the deterministic-signature / test-vector path — the
/// deterministic function-code bit is set and the instruction is retried
/// with a freshly drawn nonce until it accepts one; the instruction may
/// reject individual `k` values, so the generator is drained anew on
/// every pass.
pub(crate) fn ecdsa_sign(
    curve: Curve,
    d: &[u8],
    hash: &[u8],
    mut rng: Option<&mut dyn FnMut(&mut [u8])>,
) -> Result<(Vec<u8>, Vec<u8>), Error> {
    if !curve.cpacf_ecdsa_supported() {
        return Err(Error::CurveUnsupported { curve, backend: "cpacf" });
    }
    let privlen = curve.privlen();

    let mut block = FiveSlotBlock::new(curve.weierstrass_slot());
    block.pack_hash(slot::HASH, hash);
    block.pack(slot::KEY, d);

    let mut nonce = vec![0u8; privlen];
    let deterministic = rng.is_some();
    loop {
        match &mut rng {
            Some(generate) => generate(&mut nonce),
            None => Csprng::new().fill_bytes(&mut nonce),
        }
        block.pack(slot::RAND, &nonce);
        crate::scrub::scrub(&mut nonce);

        match invoke::ecdsa_sign(curve, &mut block, privlen, deterministic) {
            Ok(()) => break,
            // A rejected nonce is retried in deterministic mode only;
            // the instruction-internal path reports the failure as-is.
            Err(err) if !deterministic => return Err(err),
            Err(_) => block.wipe_slot(slot::RAND),
        }
    }

    let r = block.unpack(slot::SIG_R, privlen);
    let s = block.unpack(slot::SIG_S, privlen);
    Ok((r, s))
}

/// ECDSA verify: `r`, `s`, `x`, `y` are big-endian, `privlen` bytes
/// apiece; `hash` is truncated/padded to slot width during packing.
pub(crate) fn ecdsa_verify(curve: Curve, x: &[u8], y: &[u8], hash: &[u8], r: &[u8], s: &[u8]) -> Result<(), Error> {
    if !curve.cpacf_ecdsa_supported() {
        return Err(Error::CurveUnsupported { curve, backend: "cpacf" });
    }
    let privlen = curve.privlen();

    let mut block = FiveSlotBlock::new(curve.weierstrass_slot());
    block.pack(slot::SIG_R, r);
    block.pack(slot::SIG_S, s);
    block.pack_hash(slot::HASH, hash);
    block.pack(slot::KEY, x);
    block.pack(slot::RAND, y);

    invoke::ecdsa_verify(curve, &mut block, privlen)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p256_generator() -> (Vec<u8>, Vec<u8>) {
        let (gx, gy) = Curve::P256.base_point();
        (gx.to_vec(), gy.to_vec())
    }

    #[test]
    fn p256_sign_then_verify_round_trips() {
        let (gx, gy) = p256_generator();
        let d = [0x11u8; 32];
        let (x, y) = scalar_mul(Curve::P256, &gx, &gy, &d, true).unwrap();
        let y = y.unwrap();

        let hash = [0x42u8; 32];
        let mut fixed_k = |out: &mut [u8]| out.copy_from_slice(&[0x07u8; 32]);
        let (r, s) = ecdsa_sign(Curve::P256, &d, &hash, Some(&mut fixed_k)).unwrap();

        ecdsa_verify(Curve::P256, &x, &y, &hash, &r, &s).unwrap();
    }

    #[test]
    fn p256_verify_rejects_tampered_signature() {
        let (gx, gy) = p256_generator();
        let d = [0x11u8; 32];
        let (x, y) = scalar_mul(Curve::P256, &gx, &gy, &d, true).unwrap();
        let y = y.unwrap();

        let hash = [0x42u8; 32];
        let (r, mut s) = ecdsa_sign(Curve::P256, &d, &hash, None).unwrap();
        s[0] ^= 0x01;

        assert!(matches!(ecdsa_verify(Curve::P256, &x, &y, &hash, &r, &s), Err(Error::SignatureInvalid)));
    }

    #[test]
    fn edwards_sign_is_not_offered_on_the_instruction_path() {
        let err = ecdsa_sign(Curve::Ed25519, &[0x11; 32], &[0u8; 32], None).unwrap_err();
        assert!(matches!(err, Error::CurveUnsupported { .. }));
    }

    #[test]
    fn x25519_matches_the_rfc7748_test_vector() {
        let scalar = hex::decode("a546e36bf0527c9d3b16154b82465edd62144c0ac1fc5a18506a2244ba449ac4").unwrap();
        let u = hex::decode("e6db6867583030db3594c1a424b15f7c726624ec26b3353b10a903a6d0ab1c4c").unwrap();
        let expected = hex::decode("c3da55379de9c6908e94ea4df28d084f32eccf03491c71f754b4075577a28552").unwrap();

        let out = scalar_mul_montgomery(Curve::X25519, &scalar, &u).unwrap();
        assert_eq!(out, expected);
    }

    #[test]
    fn x25519_masks_the_non_canonical_coordinate_bit() {
        let scalar = [0x31u8; 32];
        let u = [0x05u8; 32];
        let mut u_high = u;
        u_high[31] |= 0x80;

        assert_eq!(
            scalar_mul_montgomery(Curve::X25519, &scalar, &u).unwrap(),
            scalar_mul_montgomery(Curve::X25519, &scalar, &u_high).unwrap()
        );
    }
}
