//! Ed25519 / Ed448 public-key derivation (RFC 8032 §5.1.5, §5.2.5).
//!
//! A compound operation over pieces the rest of the crate already has:
//! hash the seed (SHA-512 for Ed25519, SHAKE-256 with 114-byte output
//! for Ed448), clamp the low half of the digest, flip it to big-endian
//! for the PCC parameter block, multiply the curve's generator, flip the
//! result back, and fold the parity of `x` into the top bit of `y` as
//! the compressed public key.
//!
//! Ed448 works inside 64-byte buffers matching its PCC slot width, with
//! the 57 meaningful bytes at the little-endian low end; the final
//! public key is the low 57 bytes.
//!
//! Both curves store the compressed point in [`EcKey::x`] (`y` stays
//! unset), the same way Montgomery keys store their single public `u`
//! coordinate.

use crate::cpacf;
use crate::curve::Curve;
use crate::endian;
use crate::error::Error;
use crate::hash::{sha512, shake256};
use crate::key::EcKey;
use crate::scrub::scrub;

/// Derives an Ed25519 public key from a 32-byte seed.
pub(crate) fn ed25519_derive_pub(seed: &[u8]) -> Result<Vec<u8>, Error> {
    if seed.len() != 32 {
        return Err(Error::FormatMismatch("Ed25519 seed must be 32 bytes"));
    }

    let mut digest = sha512(seed);
    let mut scalar = [0u8; 32];
    scalar.copy_from_slice(&digest[..32]);
    scrub(&mut digest);

    scalar[0] &= !7;
    scalar[31] = (scalar[31] & 0x3f) | 0x40;
    endian::reverse(&mut scalar);

    let (gx, gy) = Curve::Ed25519.base_point();
    let (res_x, res_y) = cpacf::scalar_mul(Curve::Ed25519, gx, gy, &scalar, true)?;
    scrub(&mut scalar);

    let mut res_x = res_x;
    let mut pub_y = res_y.expect("y was requested");
    endian::reverse(&mut res_x);
    endian::reverse(&mut pub_y);

    pub_y[31] |= (res_x[0] & 1) << 7;
    Ok(pub_y)
}

/// Derives an Ed448 public key from a 57-byte seed.
pub(crate) fn ed448_derive_pub(seed: &[u8]) -> Result<Vec<u8>, Error> {
    if seed.len() != 57 {
        return Err(Error::FormatMismatch("Ed448 seed must be 57 bytes"));
    }

    let mut digest = [0u8; 114];
    shake256(seed, &mut digest);

    let mut scalar = [0u8; 64];
    scalar[..57].copy_from_slice(&digest[..57]);
    scrub(&mut digest);

    scalar[0] &= !3;
    scalar[55] |= 0x80;
    scalar[56] = 0;
    endian::reverse(&mut scalar);

    // The block is packed at the 57-byte token width; the leading zero
    // bytes of the 64-byte workspace land as slot padding.
    let (gx, gy) = Curve::Ed448.base_point();
    let (res_x, res_y) = cpacf::scalar_mul(Curve::Ed448, gx, gy, &scalar[7..], true)?;
    scrub(&mut scalar);

    let mut x_work = [0u8; 64];
    x_work[7..].copy_from_slice(&res_x);
    endian::reverse(&mut x_work);

    let mut y_work = [0u8; 64];
    y_work[7..].copy_from_slice(&res_y.expect("y was requested"));
    endian::reverse(&mut y_work);

    y_work[56] |= (x_work[0] & 1) << 7;
    Ok(y_work[..57].to_vec())
}

/// Dispatches to the curve-appropriate derivation and wraps the result
/// in an [`EcKey`] carrying the seed as `d` and the compressed public
/// point as `x`.
pub(crate) fn derive(curve: Curve, seed: &[u8]) -> Result<EcKey, Error> {
    let public = match curve {
        Curve::Ed25519 => ed25519_derive_pub(seed)?,
        Curve::Ed448 => ed448_derive_pub(seed)?,
        _ => return Err(Error::CurveUnsupported { curve, backend: "edwards_derive" }),
    };

    let mut key = EcKey::new(curve).with_private(seed)?;
    key.x = Some(crate::key::FieldBuf::from_be_slice(curve.privlen(), &public)?);
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ed25519_matches_the_rfc8032_test_vector() {
        let seed = hex::decode("9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60").unwrap();
        let expected = hex::decode("d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a").unwrap();

        assert_eq!(ed25519_derive_pub(&seed).unwrap(), expected);
    }

    #[test]
    fn ed448_matches_the_rfc8032_test_vector() {
        let seed = hex::decode(
            "6c82a562cb808d10d632be89c8513ebf6c929f34ddfa8c9f63c9960ef6e348a3528c8a3fcc2f044e39a3fc5b94492f8f032e7549a20098f95b",
        )
        .unwrap();
        let expected = hex::decode(
            "5fd7449b59b461fd2ce787ec616ad46a1da1342485a70e1f8a0ea75d80e96778edf124769b46c7061bd6783df1e50f6cd1fa1abeafe8256180",
        )
        .unwrap();

        assert_eq!(ed448_derive_pub(&seed).unwrap(), expected);
    }

    #[test]
    fn ed25519_rejects_wrong_length_seed() {
        assert!(matches!(ed25519_derive_pub(&[0u8; 31]), Err(Error::FormatMismatch(_))));
    }

    #[test]
    fn ed448_rejects_wrong_length_seed() {
        assert!(matches!(ed448_derive_pub(&[0u8; 56]), Err(Error::FormatMismatch(_))));
    }

    #[test]
    fn derive_rejects_non_edwards_curves() {
        assert!(matches!(derive(Curve::P256, &[0u8; 32]), Err(Error::CurveUnsupported { .. })));
    }
}
