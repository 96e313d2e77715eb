//! Curve catalog.
//!
//! Every other component keys off [`Curve`]. Constants that would
//! otherwise be scattered across per-curve branches in each operation —
//! scalar width, parameter-block slot width, instruction function codes,
//! generator coordinates, group order — live here once, and the
//! packing/framing code downstream is written a single time,
//! parameterized over them.

/// The closed set of supported curves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Curve {
    P256,
    P384,
    P521,
    Ed25519,
    Ed448,
    X25519,
    X448,
}

/// The family a curve belongs to, which determines parameter-block shape
/// and coordinate endianness convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveKind {
    Weierstrass,
    Edwards,
    Montgomery,
}

// NIST generators and group orders, SEC 2 / FIPS 186-4.
const P256_GX: [u8; 32] = hex_literal(*b"6b17d1f2e12c4247f8bce6e563a440f277037d812deb33a0f4a13945d898c296");
const P256_GY: [u8; 32] = hex_literal(*b"4fe342e2fe1a7f9b8ee7eb4a7c0f9e162bce33576b315ececbb6406837bf51f5");
const P256_ORDER: [u8; 32] = hex_literal(*b"ffffffff00000000ffffffffffffffffbce6faada7179e84f3b9cac2fc632551");

const P384_GX: [u8; 48] =
    hex_literal(*b"aa87ca22be8b05378eb1c71ef320ad746e1d3b628ba79b9859f741e082542a385502f25dbf55296c3a545e3872760ab7");
const P384_GY: [u8; 48] =
    hex_literal(*b"3617de4a96262c6f5d9e98bf9292dc29f8f41dbd289a147ce9da3113b5f0b8c00a60b1ce1d7e819d7a431d7c90ea0e5f");
const P384_ORDER: [u8; 48] =
    hex_literal(*b"ffffffffffffffffffffffffffffffffffffffffffffffffc7634d81f4372ddf581a0db248b0a77aecec196accc52973");

const P521_GX: [u8; 66] = hex_literal(
    *b"00c6858e06b70404e9cd9e3ecb662395b4429c648139053fb521f828af606b4d3dbaa14b5e77efe75928fe1dc127a2ffa8de3348b3c1856a429bf97e7e31c2e5bd66",
);
const P521_GY: [u8; 66] = hex_literal(
    *b"011839296a789a3bc0045c8a5fb42c7d1bd998f54449579b446817afbd17273e662c97ee72995ef42640c550b9013fad0761353c7086a272c24088be94769fd16650",
);
const P521_ORDER: [u8; 66] = hex_literal(
    *b"01fffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffa51868783bf2f966b7fcc0148f709a5d03bb5c9b8899c47aebb6fb71e91386409",
);

// Edwards generators, RFC 8032. Stored big-endian like everything else
// in the catalog; the derivation path flips to and from the RFC's
// little-endian convention at its own boundary.
const ED25519_GX: [u8; 32] = hex_literal(*b"216936d3cd6e53fec0a4e231fdd6dc5c692cc7609525a7b2c9562d608f25d51a");
const ED25519_GY: [u8; 32] = hex_literal(*b"6666666666666666666666666666666666666666666666666666666666666658");
const ED25519_ORDER: [u8; 32] = hex_literal(*b"1000000000000000000000000000000014def9dea2f79cd65812631a5cf5d3ed");

const ED448_GX: [u8; 57] = hex_literal(
    *b"004f1970c66bed0ded221d15a622bf36da9e146570470f1767ea6de324a3d3a46412ae1af72ab66511433b80e18b00938e2626a82bc70cc05e",
);
const ED448_GY: [u8; 57] = hex_literal(
    *b"00693f46716eb6bc248876203756c9c7624bea73736ca3984087789c1e05a0c2d73ad3ff1ce67c39c4fdbd132c4ed7c8ad9808795bf230fa14",
);
const ED448_ORDER: [u8; 57] = hex_literal(
    *b"003fffffffffffffffffffffffffffffffffffffffffffffffffffffff7cca23e9c44edb49aed63690216cc2728dc58f552378c292ab5844f3",
);

const fn hex_nibble(c: u8) -> u8 {
    match c {
        b'0'..=b'9' => c - b'0',
        b'a'..=b'f' => c - b'a' + 10,
        _ => panic!("invalid hex digit in curve constant"),
    }
}

/// Decodes an ASCII hex string into bytes at compile time. A length
/// mismatch between the string and the destination is an out-of-bounds
/// index in const evaluation, so it fails the build rather than
/// truncating a curve constant.
const fn hex_literal<const N: usize, const M: usize>(hex: [u8; N]) -> [u8; M] {
    assert!(N == 2 * M, "hex string length does not match the constant width");
    let mut out = [0u8; M];
    let mut i = 0;
    while i < M {
        out[i] = (hex_nibble(hex[2 * i]) << 4) | hex_nibble(hex[2 * i + 1]);
        i += 1;
    }
    out
}

impl Curve {
    pub const ALL: [Curve; 7] = [
        Curve::P256,
        Curve::P384,
        Curve::P521,
        Curve::Ed25519,
        Curve::Ed448,
        Curve::X25519,
        Curve::X448,
    ];

    /// Canonical private-scalar / coordinate byte length.
    pub const fn privlen(self) -> usize {
        match self {
            Curve::P256 | Curve::Ed25519 | Curve::X25519 => 32,
            Curve::P384 => 48,
            Curve::P521 => 66,
            Curve::Ed448 => 57,
            Curve::X448 => 56,
        }
    }

    pub const fn kind(self) -> CurveKind {
        match self {
            Curve::P256 | Curve::P384 | Curve::P521 => CurveKind::Weierstrass,
            Curve::Ed25519 | Curve::Ed448 => CurveKind::Edwards,
            Curve::X25519 | Curve::X448 => CurveKind::Montgomery,
        }
    }

    /// Slot width of the five-slot PCC/KDSA parameter block. Unused for
    /// Montgomery curves.
    pub const fn weierstrass_slot(self) -> usize {
        match self {
            Curve::P256 | Curve::Ed25519 => 32,
            Curve::P384 => 48,
            Curve::P521 => 80,
            Curve::Ed448 => 64,
            Curve::X25519 | Curve::X448 => 0,
        }
    }

    /// Slot width of the three-slot Montgomery PCC parameter block. For
    /// X448 only 56 of the 64 bytes are meaningful.
    pub const fn montgomery_slot(self) -> usize {
        match self {
            Curve::X25519 => 32,
            Curve::X448 => 64,
            _ => 0,
        }
    }

    /// Bit length carried in coprocessor key-token bit-length fields:
    /// `privlen * 8`, except P-521 whose field is 521 bits wide rather
    /// than the 528 its byte buffer implies.
    pub const fn bitlen(self) -> u16 {
        match self {
            Curve::P521 => 521,
            other => (other.privlen() * 8) as u16,
        }
    }

    /// Affine generator coordinates, big-endian, each `privlen` bytes.
    /// Montgomery curves have no `y` here; their generator is the lone
    /// `u` coordinate from [`Curve::montgomery_base_u`].
    pub(crate) fn base_point(self) -> (&'static [u8], &'static [u8]) {
        match self {
            Curve::P256 => (&P256_GX, &P256_GY),
            Curve::P384 => (&P384_GX, &P384_GY),
            Curve::P521 => (&P521_GX, &P521_GY),
            Curve::Ed25519 => (&ED25519_GX, &ED25519_GY),
            Curve::Ed448 => (&ED448_GX, &ED448_GY),
            Curve::X25519 | Curve::X448 => (&[], &[]),
        }
    }

    /// The RFC 7748 Montgomery generator u-coordinate — 9 for X25519,
    /// 5 for X448 — little-endian at the curve's coordinate width.
    pub(crate) fn montgomery_base_u(self) -> Vec<u8> {
        let mut u = vec![0u8; self.privlen()];
        u[0] = match self {
            Curve::X448 => 5,
            _ => 9,
        };
        u
    }

    /// Group order, big-endian, `privlen` bytes.
    pub(crate) fn order(self) -> &'static [u8] {
        match self {
            Curve::P256 => &P256_ORDER,
            Curve::P384 => &P384_ORDER,
            Curve::P521 => &P521_ORDER,
            Curve::Ed25519 | Curve::X25519 => &ED25519_ORDER,
            Curve::Ed448 => &ED448_ORDER,
            Curve::X448 => &ED448_ORDER[1..],
        }
    }

    /// Whether the KDSA ECDSA path supports this curve. Only the three
    /// NIST Weierstrass curves do; EdDSA is not exposed through this
    /// core's CPU path.
    pub const fn cpacf_ecdsa_supported(self) -> bool {
        matches!(self, Curve::P256 | Curve::P384 | Curve::P521)
    }

    /// PCC function code for scalar multiplication on this curve.
    pub(crate) const fn pcc_scalar_mul_function(self) -> u8 {
        match self {
            Curve::P256 => 0x40,
            Curve::P384 => 0x41,
            Curve::P521 => 0x42,
            Curve::Ed25519 => 0x48,
            Curve::Ed448 => 0x49,
            Curve::X25519 => 0x50,
            Curve::X448 => 0x51,
        }
    }

    /// KDSA function code for ECDSA verify. Sign is verify `| 0x08`; the
    /// deterministic-nonce variant of sign additionally sets bit 7.
    pub(crate) const fn kdsa_verify_function(self) -> u8 {
        match self {
            Curve::P256 => 0x01,
            Curve::P384 => 0x02,
            Curve::P521 => 0x03,
            _ => 0,
        }
    }

    pub(crate) const fn kdsa_sign_function(self) -> u8 {
        self.kdsa_verify_function() | 0x08
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_lengths_are_consistent() {
        for curve in Curve::ALL {
            assert_eq!(curve.order().len(), curve.privlen(), "{curve:?}");
            if curve.kind() != CurveKind::Montgomery {
                let (gx, gy) = curve.base_point();
                assert_eq!(gx.len(), curve.privlen(), "{curve:?}");
                assert_eq!(gy.len(), curve.privlen(), "{curve:?}");
            }
        }
    }

    #[test]
    fn p521_carries_its_true_bit_length() {
        assert_eq!(Curve::P521.bitlen(), 521);
        assert_eq!(Curve::P384.bitlen(), 384);
        assert_eq!(Curve::Ed448.bitlen(), 456);
    }

    #[test]
    fn p521_generator_keeps_its_leading_zero_byte() {
        let (gx, _) = Curve::P521.base_point();
        assert_eq!(gx.len(), 66);
        assert_eq!(gx[0], 0x00);
    }

    #[test]
    fn montgomery_generators_match_rfc7748() {
        let u25519 = Curve::X25519.montgomery_base_u();
        assert_eq!(u25519[0], 9);
        assert!(u25519[1..].iter().all(|b| *b == 0));

        let u448 = Curve::X448.montgomery_base_u();
        assert_eq!(u448[0], 5);
        assert!(u448[1..].iter().all(|b| *b == 0));
    }
}
