//! Top-level operations and backend dispatch.
//!
//! `ecdh`, `ecdsa_sign`, `ecdsa_verify` and `eckeygen` each try the
//! CPU-instruction path first (unless `ica_offload_enabled` forces the
//! coprocessor — key generation ignores that override and always tries
//! the CPU first), escalate to the coprocessor when the CPU path cannot
//! handle the curve, and propagate any other error as-is.
//!
//! The four Edwards/Montgomery public-key derivations have a single
//! backend apiece — PCC scalar multiplication for Montgomery, the
//! hash-and-clamp procedure in [`crate::edwards_derive`] for Edwards —
//! so they call straight through, but still run the same FIPS gate and
//! counter bookkeeping.

use crate::capabilities::{Backend, Capabilities, Counters, DRIVER_NOT_LOADED};
use crate::coprocessor;
use crate::curve::{Curve, CurveKind};
use crate::edwards_derive;
use crate::error::Error;
use crate::key::EcKey;
use crate::pubkey;
use crate::rng::Csprng;

#[cfg(target_arch = "s390x")]
use crate::coprocessor::transport::LinuxTransport;
#[cfg(not(target_arch = "s390x"))]
use crate::coprocessor::transport::SimulatedTransport;

#[cfg(target_arch = "s390x")]
fn transport() -> LinuxTransport {
    LinuxTransport
}

#[cfg(not(target_arch = "s390x"))]
fn transport() -> SimulatedTransport {
    SimulatedTransport::default()
}

/// Whether dispatch tries the CPU path before the coprocessor. Key
/// generation always does; every other operation does unless
/// `ica_offload_enabled` forces the card.
fn cpu_path_first(caps: &Capabilities, is_keygen: bool) -> bool {
    caps.msa9_switch && (is_keygen || !caps.ica_offload_enabled)
}

/// The gate a coprocessor attempt must clear before a request is built.
fn coprocessor_available(caps: &Capabilities) -> Result<(), Error> {
    if !caps.ecc_via_online_card {
        return Err(Error::NoDevice);
    }
    if caps.adapter == DRIVER_NOT_LOADED {
        return Err(Error::HardwareFault("coprocessor adapter handle not loaded"));
    }
    Ok(())
}

/// Rejects up front when policy requires FIPS and the operation would
/// run on the software-only path. This crate does not implement FIPS
/// policy itself; this is the seam a caller's policy layer hooks into.
fn fips_gate(caps: &Capabilities, software_only: bool) -> Result<(), Error> {
    if caps.fips_required && software_only {
        return Err(Error::PolicyDenied);
    }
    Ok(())
}

/// Runs `f` against a key that is guaranteed to carry its public
/// coordinates, deriving them from the private scalar when the caller's
/// record lacks them — the coprocessor key tokens embed the public
/// point even for private-key operations.
fn with_materialized_public<T>(priv_key: &EcKey, f: impl FnOnce(&EcKey) -> Result<T, Error>) -> Result<T, Error> {
    if !priv_key.needs_public() || priv_key.curve.kind() == CurveKind::Edwards {
        return f(priv_key);
    }

    let d = priv_key.d.as_ref().ok_or(Error::FormatMismatch("operation requires a private scalar"))?;
    let (x, y) = pubkey::derive(priv_key.curve, d.as_bytes())?;
    let y = if y.is_empty() { vec![0u8; priv_key.curve.privlen()] } else { y };

    let full = EcKey::new(priv_key.curve).with_private(d.as_bytes())?.with_public(&x, &y)?;
    f(&full)
}

/// ECDH shared-secret derivation for Weierstrass and Montgomery curves.
/// Montgomery peers pass their `u` coordinate as `peer_x` and an empty
/// `peer_y`.
pub fn ecdh(
    caps: &Capabilities,
    counters: &Counters,
    curve: Curve,
    priv_key: &EcKey,
    peer_x: &[u8],
    peer_y: &[u8],
) -> Result<Vec<u8>, Error> {
    priv_key.validate()?;
    fips_gate(caps, false)?;
    if curve.kind() == CurveKind::Edwards {
        return Err(Error::CurveUnsupported { curve, backend: "ecdh" });
    }

    let d = priv_key.d.as_ref().ok_or(Error::FormatMismatch("ECDH requires a private scalar"))?.as_bytes();

    if cpu_path_first(caps, false) {
        log::debug!("ecdh({curve:?}): trying the CPU-instruction path");
        let result = match curve.kind() {
            CurveKind::Weierstrass => crate::cpacf::scalar_mul(curve, peer_x, peer_y, d, false).map(|(x, _)| x),
            CurveKind::Montgomery => crate::cpacf::scalar_mul_montgomery(curve, d, peer_x),
            CurveKind::Edwards => unreachable!("rejected above"),
        };
        match result {
            Ok(z) => {
                counters.record(Backend::Cpacf, true);
                return Ok(z);
            }
            Err(Error::CurveUnsupported { .. }) => {
                counters.record(Backend::Cpacf, false);
                log::debug!("ecdh({curve:?}): CPU path does not support this curve, escalating");
            }
            Err(err) => {
                counters.record(Backend::Cpacf, false);
                return Err(err);
            }
        }
    }

    coprocessor_available(caps)?;
    log::debug!("ecdh({curve:?}): dispatching to the coprocessor");
    let t = transport();
    let result =
        with_materialized_public(priv_key, |key| coprocessor::ecdh(curve, &t, caps.adapter, key, peer_x, peer_y));
    counters.record(Backend::Coprocessor, result.is_ok());
    if result.is_err() {
        log::warn!("ecdh({curve:?}): coprocessor request failed");
    }
    result
}

/// ECDSA sign over a prehashed digest.
///
/// `rng` is the deterministic-signature hook: when supplied, it is asked
/// for a fresh nonce on every signing attempt and the CPU instruction
/// runs in its deterministic mode. Without it the instruction draws its
/// own randomness.
pub fn ecdsa_sign(
    caps: &Capabilities,
    counters: &Counters,
    curve: Curve,
    priv_key: &EcKey,
    hash: &[u8],
    rng: Option<&mut dyn FnMut(&mut [u8])>,
) -> Result<(Vec<u8>, Vec<u8>), Error> {
    priv_key.validate()?;
    fips_gate(caps, false)?;
    let d = priv_key.d.as_ref().ok_or(Error::FormatMismatch("ECDSA sign requires a private scalar"))?.as_bytes();

    if curve.kind() == CurveKind::Weierstrass && cpu_path_first(caps, false) {
        log::debug!("ecdsa_sign({curve:?}): trying the CPU-instruction path");
        match crate::cpacf::ecdsa_sign(curve, d, hash, rng) {
            Ok(sig) => {
                counters.record(Backend::Cpacf, true);
                return Ok(sig);
            }
            Err(Error::CurveUnsupported { .. }) => {
                counters.record(Backend::Cpacf, false);
                log::debug!("ecdsa_sign({curve:?}): CPU path does not support this curve, escalating");
            }
            Err(err) => {
                counters.record(Backend::Cpacf, false);
                return Err(err);
            }
        }
    }

    coprocessor_available(caps)?;
    log::debug!("ecdsa_sign({curve:?}): dispatching to the coprocessor");
    let t = transport();
    let result = with_materialized_public(priv_key, |key| coprocessor::ecdsa_sign(curve, &t, caps.adapter, key, hash));
    counters.record(Backend::Coprocessor, result.is_ok());
    if result.is_err() {
        log::warn!("ecdsa_sign({curve:?}): coprocessor request failed");
    }
    result
}

/// ECDSA verify over a prehashed digest.
pub fn ecdsa_verify(
    caps: &Capabilities,
    counters: &Counters,
    curve: Curve,
    pub_key: &EcKey,
    hash: &[u8],
    r: &[u8],
    s: &[u8],
) -> Result<(), Error> {
    pub_key.validate()?;
    fips_gate(caps, false)?;
    let x = pub_key.x.as_ref().ok_or(Error::FormatMismatch("ECDSA verify requires a public key"))?.as_bytes();
    let y = pub_key.y.as_ref().ok_or(Error::FormatMismatch("ECDSA verify requires a public key"))?.as_bytes();

    if curve.kind() == CurveKind::Weierstrass && cpu_path_first(caps, false) {
        log::debug!("ecdsa_verify({curve:?}): trying the CPU-instruction path");
        match crate::cpacf::ecdsa_verify(curve, x, y, hash, r, s) {
            Ok(()) => {
                counters.record(Backend::Cpacf, true);
                return Ok(());
            }
            Err(Error::CurveUnsupported { .. }) => {
                counters.record(Backend::Cpacf, false);
                log::debug!("ecdsa_verify({curve:?}): CPU path does not support this curve, escalating");
            }
            Err(err) => {
                counters.record(Backend::Cpacf, false);
                return Err(err);
            }
        }
    }

    coprocessor_available(caps)?;
    log::debug!("ecdsa_verify({curve:?}): dispatching to the coprocessor");
    let t = transport();
    let result = coprocessor::ecdsa_verify(curve, &t, caps.adapter, pub_key, hash, r, s);
    counters.record(Backend::Coprocessor, result.is_ok());
    result
}

/// EC key generation. The CPU "path" has no dedicated keygen
/// instruction: it draws a random scalar in software and derives the
/// public point through the scalar multiplication the curve already
/// supports, which is why keygen tries it first even under
/// `ica_offload_enabled`.
pub fn eckeygen(caps: &Capabilities, counters: &Counters, curve: Curve) -> Result<EcKey, Error> {
    fips_gate(caps, false)?;

    if cpu_path_first(caps, true) {
        log::debug!("eckeygen({curve:?}): trying the CPU-instruction path");
        match cpu_keygen(curve) {
            Ok(key) => {
                counters.record(Backend::Cpacf, true);
                return Ok(key);
            }
            Err(Error::CurveUnsupported { .. }) => {
                counters.record(Backend::Cpacf, false);
                log::debug!("eckeygen({curve:?}): CPU path does not support this curve, escalating");
            }
            Err(err) => {
                counters.record(Backend::Cpacf, false);
                return Err(err);
            }
        }
    }

    coprocessor_available(caps)?;
    log::debug!("eckeygen({curve:?}): dispatching to the coprocessor");
    let t = transport();
    let result = coprocessor::eckeygen(curve, &t, caps.adapter);
    counters.record(Backend::Coprocessor, result.is_ok());
    if result.is_err() {
        log::warn!("eckeygen({curve:?}): coprocessor request failed");
    }
    result
}

/// Lexicographic big-endian check that a candidate scalar lies in
/// `[1, order)`.
fn scalar_in_range(candidate: &[u8], order: &[u8]) -> bool {
    candidate.iter().any(|b| *b != 0) && candidate < order
}

/// Keygen on the CPU path: rejection-sample a scalar, derive the public
/// point. Weierstrass scalars must land below the group order;
/// Montgomery secrets are arbitrary byte strings (clamping happens in
/// the multiplication); Edwards seeds are arbitrary byte strings fed to
/// the hash-and-clamp derivation.
fn cpu_keygen(curve: Curve) -> Result<EcKey, Error> {
    let mut rng = Csprng::new();
    let mut d = vec![0u8; curve.privlen()];

    match curve.kind() {
        CurveKind::Weierstrass => {
            loop {
                rng.fill_bytes(&mut d);
                if scalar_in_range(&d, curve.order()) {
                    break;
                }
            }
            let (x, y) = pubkey::derive(curve, &d)?;
            EcKey::new(curve).with_private(&d)?.with_public(&x, &y)
        }
        CurveKind::Montgomery => {
            rng.fill_bytes(&mut d);
            let (u, _) = pubkey::derive(curve, &d)?;
            let mut key = EcKey::new(curve).with_private(&d)?;
            key.x = Some(crate::key::FieldBuf::from_be_slice(curve.privlen(), &u)?);
            Ok(key)
        }
        CurveKind::Edwards => {
            rng.fill_bytes(&mut d);
            edwards_derive::derive(curve, &d)
        }
    }
}

/// X25519 public-key derivation: multiplies the Montgomery base point on
/// the CPU-instruction path, the only backend modeled for Montgomery
/// curves.
pub fn x25519_derive_pub(caps: &Capabilities, counters: &Counters, d: &[u8]) -> Result<Vec<u8>, Error> {
    montgomery_derive_pub(caps, counters, Curve::X25519, d)
}

/// X448 public-key derivation; see [`x25519_derive_pub`].
pub fn x448_derive_pub(caps: &Capabilities, counters: &Counters, d: &[u8]) -> Result<Vec<u8>, Error> {
    montgomery_derive_pub(caps, counters, Curve::X448, d)
}

fn montgomery_derive_pub(caps: &Capabilities, counters: &Counters, curve: Curve, d: &[u8]) -> Result<Vec<u8>, Error> {
    fips_gate(caps, false)?;
    let result = pubkey::derive(curve, d).map(|(u, _)| u);
    counters.record(Backend::Cpacf, result.is_ok());
    result
}

/// Ed25519 public-key derivation: SHA-512, RFC 8032 clamping, base-point
/// multiplication and sign-bit compression. The hashing and clamping
/// stages run in software even when the multiplication is accelerated,
/// so FIPS policy treats the operation as the software path.
pub fn ed25519_derive_pub(caps: &Capabilities, counters: &Counters, seed: &[u8]) -> Result<Vec<u8>, Error> {
    edwards_derive_pub(caps, counters, Curve::Ed25519, seed)
}

/// Ed448 public-key derivation (SHAKE-256); see [`ed25519_derive_pub`].
pub fn ed448_derive_pub(caps: &Capabilities, counters: &Counters, seed: &[u8]) -> Result<Vec<u8>, Error> {
    edwards_derive_pub(caps, counters, Curve::Ed448, seed)
}

fn edwards_derive_pub(caps: &Capabilities, counters: &Counters, curve: Curve, seed: &[u8]) -> Result<Vec<u8>, Error> {
    fips_gate(caps, true)?;
    let result = match curve {
        Curve::Ed25519 => edwards_derive::ed25519_derive_pub(seed),
        Curve::Ed448 => edwards_derive::ed448_derive_pub(seed),
        _ => unreachable!("only called for Edwards curves"),
    };
    counters.record(Backend::SoftwareFallback, result.is_ok());
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps_cpu_only() -> Capabilities {
        Capabilities { msa9_switch: true, ..Capabilities::default() }
    }

    #[test]
    fn eckeygen_on_cpu_path_produces_a_usable_keypair() {
        let caps = caps_cpu_only();
        let counters = Counters::default();

        let key = eckeygen(&caps, &counters, Curve::P256).unwrap();
        let hash = [0x5Au8; 32];
        let (r, s) = ecdsa_sign(&caps, &counters, Curve::P256, &key, &hash, None).unwrap();
        ecdsa_verify(&caps, &counters, Curve::P256, &key, &hash, &r, &s).unwrap();
    }

    #[test]
    fn eckeygen_covers_every_curve_on_the_cpu_path() {
        let caps = caps_cpu_only();
        let counters = Counters::default();

        for curve in Curve::ALL {
            let key = eckeygen(&caps, &counters, curve).unwrap();
            assert_eq!(key.d.as_ref().unwrap().len(), curve.privlen(), "{curve:?}");
            assert_eq!(key.x.as_ref().unwrap().len(), curve.privlen(), "{curve:?}");
        }
    }

    #[test]
    fn ecdsa_sign_for_edwards_bottoms_out_at_no_device_without_a_coprocessor() {
        // Ed25519 has no CPU-path ECDSA; with no card configured the
        // escalation ends at the device gate.
        let caps = caps_cpu_only();
        let counters = Counters::default();
        let key = EcKey::new(Curve::Ed25519).with_private(&[0x11u8; 32]).unwrap();

        let err = ecdsa_sign(&caps, &counters, Curve::Ed25519, &key, &[0u8; 32], None).unwrap_err();
        assert!(matches!(err, Error::NoDevice));
    }

    #[test]
    fn sign_materializes_the_public_point_for_the_coprocessor() {
        // A record carrying only `d` reaches the card path (the CPU
        // path is disabled) and must still produce a full key token.
        let caps = Capabilities {
            msa9_switch: false,
            ecc_via_online_card: true,
            adapter: 0,
            ..Capabilities::default()
        };
        let counters = Counters::default();

        let key = EcKey::new(Curve::P256).with_private(&[0x11u8; 32]).unwrap();
        let hash = [0x42u8; 32];
        let (r, s) = ecdsa_sign(&caps, &counters, Curve::P256, &key, &hash, None).unwrap();

        let (x, y) = pubkey::derive(Curve::P256, &[0x11u8; 32]).unwrap();
        let pub_key = EcKey::new(Curve::P256).with_public(&x, &y).unwrap();
        ecdsa_verify(&caps, &counters, Curve::P256, &pub_key, &hash, &r, &s).unwrap();
    }

    #[test]
    fn offload_flag_forces_the_coprocessor_for_sign_but_not_keygen() {
        let caps = Capabilities {
            msa9_switch: true,
            ecc_via_online_card: false,
            ica_offload_enabled: true,
            ..Capabilities::default()
        };
        let counters = Counters::default();

        // Keygen ignores the offload override and succeeds on the CPU.
        let key = eckeygen(&caps, &counters, Curve::P256).unwrap();

        // Sign is forced toward the card, and there is none.
        let err = ecdsa_sign(&caps, &counters, Curve::P256, &key, &[0u8; 32], None).unwrap_err();
        assert!(matches!(err, Error::NoDevice));
    }

    #[test]
    fn fips_required_denies_edwards_derivation() {
        let caps = Capabilities { fips_required: true, ..Capabilities::default() };
        let counters = Counters::default();

        let err = ed25519_derive_pub(&caps, &counters, &[0x11u8; 32]).unwrap_err();
        assert!(matches!(err, Error::PolicyDenied));
    }

    #[test]
    fn x25519_derive_pub_matches_the_keygen_derivation() {
        let caps = caps_cpu_only();
        let counters = Counters::default();
        let d = [0x22u8; 32];

        let via_ops = x25519_derive_pub(&caps, &counters, &d).unwrap();
        let via_pubkey = pubkey::derive(Curve::X25519, &d).unwrap().0;
        assert_eq!(via_ops, via_pubkey);
    }

    #[test]
    fn counters_track_backend_attempts() {
        let caps = caps_cpu_only();
        let counters = Counters::default();
        eckeygen(&caps, &counters, Curve::P384).unwrap();

        let snapshot = counters.snapshot();
        assert_eq!(snapshot[0], ("cpacf_ok", 1));
    }
}
