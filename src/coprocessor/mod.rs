//! Coprocessor backend: CPRBX-framed CCA requests over the zcrypt
//! character-device ioctl.
//!
//! Four request kinds exist — ECDH, ECDSA sign, ECDSA verify, EC key
//! generation. Each shares the same parameter-block skeleton behind the
//! CPRBX envelope: a two-byte sub-function code, an 8-character rule
//! array, a vendor-unique-data block, and a length-prefixed key block of
//! CCA key tokens.

mod cprb;
mod domain;
mod simulate;
mod token;
pub(crate) mod transport;

use zeroize::Zeroizing;

use crate::curve::Curve;
use crate::error::Error;
use crate::key::EcKey;
use cprb::RequestBuffer;
use transport::Transport;

const SUB_FUNC_ECDH: u16 = 0x4448; // "DH"
const SUB_FUNC_SIGN: u16 = 0x5347; // "SG"
const SUB_FUNC_VERIFY: u16 = 0x5356; // "SV"
const SUB_FUNC_KEYGEN: u16 = 0x5047; // "PG"

const RULE_ARRAY_LEN: u16 = 0x000A;
const RULE_PASSTHRU: &[u8; 8] = b"PASSTHRU";
const RULE_ECDSA: &[u8; 8] = b"ECDSA   ";
const RULE_CLEAR: &[u8; 8] = b"CLEAR   ";

/// Fixed vendor-unique data of an ECDH request.
const ECDH_VUD: [u8; 20] = [
    0x00, 0x14, // total length
    0x00, 0x04, 0x00, 0x91, // pass-through mode
    0x00, 0x06, 0x00, 0x93, 0x00, 0x00, // key derivation: none
    0x00, 0x04, 0x00, 0x90, // shared-secret output
    0x00, 0x04, 0x00, 0x92, // no party identifiers
];

/// VUD entry tags for length-prefixed hash and signature payloads.
const VUD_TAG_HASH: u16 = 0x0095;
const VUD_TAG_SIGNATURE: u16 = 0x0096;

/// Overhead of a reply VUD ahead of its payload: the container length
/// and flags words plus one entry header.
const REPLY_VUD_OVERHEAD: usize = 8;

/// Overhead of a reply key block ahead of its payload: the length word
/// plus a flags word.
const REPLY_KEY_OVERHEAD: usize = 4;

/// Reason code accompanying `ccp_rtcode == 4` when ECDSA verification
/// rejected the signature rather than the request failing outright.
const RS_SIGNATURE_INVALID: u16 = 429;

fn push_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}

fn push_rule(out: &mut Vec<u8>, rule: &[u8; 8]) {
    push_u16(out, RULE_ARRAY_LEN);
    out.extend_from_slice(rule);
}

fn push_vud_entry(out: &mut Vec<u8>, tag: u16, payload: &[u8]) {
    push_u16(out, (4 + payload.len()) as u16);
    push_u16(out, tag);
    out.extend_from_slice(payload);
}

/// A VUD holding length-prefixed entries behind a total-length word.
fn build_vud(entries: &[(u16, &[u8])]) -> Vec<u8> {
    let total = 2 + entries.iter().map(|(_, p)| 4 + p.len()).sum::<usize>();
    let mut out = Vec::with_capacity(total);
    push_u16(&mut out, total as u16);
    for (tag, payload) in entries {
        push_vud_entry(&mut out, *tag, payload);
    }
    out
}

fn push_key_block(out: &mut Vec<u8>, tokens: &[&[u8]]) {
    let len = 2 + tokens.iter().map(|t| t.len()).sum::<usize>();
    push_u16(out, len as u16);
    for t in tokens {
        out.extend_from_slice(t);
    }
}

fn required(field: &Option<crate::key::FieldBuf>, what: &'static str) -> Result<Vec<u8>, Error> {
    Ok(field.as_ref().ok_or(Error::FormatMismatch(what))?.as_bytes().to_vec())
}

fn send(transport: &dyn Transport, adapter: i32, parm: &[u8]) -> Result<RequestBuffer, Error> {
    let mut buffer = RequestBuffer::new(parm, domain::domain() as u16)?;
    log::debug!("sending {}-byte CPRBX parameter block", parm.len());
    transport.send(adapter, &mut buffer)?;
    Ok(buffer)
}

/// Splits a reply parameter block into its VUD and key block.
fn reply_sections(parm: &[u8]) -> Result<(&[u8], &[u8]), Error> {
    if parm.len() < 4 {
        return Err(Error::FormatMismatch("reply parameter block truncated"));
    }
    let vud_len = u16::from_be_bytes([parm[2], parm[3]]) as usize;
    if vud_len < 2 || parm.len() < 2 + vud_len + 2 {
        return Err(Error::FormatMismatch("reply VUD overruns the parameter block"));
    }
    let vud = &parm[2..2 + vud_len];

    let key_off = 2 + vud_len;
    let key_len = u16::from_be_bytes([parm[key_off], parm[key_off + 1]]) as usize;
    if key_len < 2 || parm.len() < key_off + key_len {
        return Err(Error::FormatMismatch("reply key block overruns the parameter block"));
    }
    Ok((vud, &parm[key_off..key_off + key_len]))
}

fn check_rtcode(buffer: &RequestBuffer) -> Result<(), Error> {
    let reply = buffer.reply()?;
    if reply.ccp_rtcode != 0 {
        log::warn!(
            "coprocessor refused the request: rtcode={} rscode={}",
            reply.ccp_rtcode,
            reply.ccp_rscode
        );
        return Err(Error::HardwareFault("coprocessor returned a nonzero return code"));
    }
    Ok(())
}

/// ECDH shared-secret derivation. `priv_key` must carry `d` and both
/// public coordinates; the key block repeats the identical
/// private-plus-peer token pair twice, padded with null key tokens, as
/// the firmware demands.
pub(crate) fn ecdh(
    curve: Curve,
    transport: &dyn Transport,
    adapter: i32,
    priv_key: &EcKey,
    peer_x: &[u8],
    peer_y: &[u8],
) -> Result<Vec<u8>, Error> {
    let privlen = curve.privlen();
    let d = Zeroizing::new(required(&priv_key.d, "ECDH requires a private scalar")?);
    let own_x = required(&priv_key.x, "ECDH requires the caller's public point")?;
    let own_y = required(&priv_key.y, "ECDH requires the caller's public point")?;

    // Montgomery peers have a lone `u` coordinate; the token's `Y` half
    // is zero filler.
    let peer_y_zeros;
    let peer_y = if peer_y.is_empty() {
        peer_y_zeros = vec![0u8; privlen];
        &peer_y_zeros
    } else {
        peer_y
    };

    let own_token = Zeroizing::new(token::build_key_token(
        curve,
        token::USAGE_KEY_AGREEMENT,
        Some(&d),
        Some((&own_x, &own_y)),
    ));
    let peer_token = token::build_public_token(curve, peer_x, peer_y);

    let mut parm = Zeroizing::new(Vec::new());
    push_u16(&mut parm, SUB_FUNC_ECDH);
    push_rule(&mut parm, RULE_PASSTHRU);
    parm.extend_from_slice(&ECDH_VUD);
    push_key_block(
        &mut parm,
        &[
            &own_token,
            &peer_token,
            &token::NULL_KEY_TOKEN,
            &token::NULL_KEY_TOKEN,
            &own_token,
            &peer_token,
            &token::NULL_KEY_TOKEN,
            &token::NULL_KEY_TOKEN,
        ],
    );

    let buffer = send(transport, adapter, &parm)?;
    check_rtcode(&buffer)?;

    let reply = buffer.reply()?;
    let (_, key) = reply_sections(reply.parm)?;
    if key.len() != REPLY_KEY_OVERHEAD + privlen {
        return Err(Error::FormatMismatch("ECDH reply key length does not match privlen"));
    }
    Ok(key[REPLY_KEY_OVERHEAD..].to_vec())
}

/// ECDSA sign. `priv_key` must carry `d` and both public coordinates;
/// returns `privlen` bytes each of `r` and `s`.
pub(crate) fn ecdsa_sign(
    curve: Curve,
    transport: &dyn Transport,
    adapter: i32,
    priv_key: &EcKey,
    hash: &[u8],
) -> Result<(Vec<u8>, Vec<u8>), Error> {
    let privlen = curve.privlen();
    let d = Zeroizing::new(required(&priv_key.d, "ECDSA sign requires a private scalar")?);
    let x = required(&priv_key.x, "ECDSA sign requires the public point")?;
    let y = required(&priv_key.y, "ECDSA sign requires the public point")?;

    let key_token = Zeroizing::new(token::build_key_token(curve, token::USAGE_SIGNATURE, Some(&d), Some((&x, &y))));

    let mut parm = Zeroizing::new(Vec::new());
    push_u16(&mut parm, SUB_FUNC_SIGN);
    push_rule(&mut parm, RULE_ECDSA);
    parm.extend_from_slice(&build_vud(&[(VUD_TAG_HASH, hash)]));
    push_key_block(&mut parm, &[&key_token]);

    let buffer = send(transport, adapter, &parm)?;
    check_rtcode(&buffer)?;

    let reply = buffer.reply()?;
    let (vud, _) = reply_sections(reply.parm)?;
    if vud.len() != REPLY_VUD_OVERHEAD + 2 * privlen {
        return Err(Error::FormatMismatch("ECDSA sign reply length does not match 2*privlen"));
    }
    let sig = &vud[REPLY_VUD_OVERHEAD..];
    Ok((sig[..privlen].to_vec(), sig[privlen..].to_vec()))
}

/// ECDSA verify. The return/reason code pair `(4, 429)` is the firmware
/// saying "signature did not verify"; it is surfaced as
/// [`Error::SignatureInvalid`], while every other nonzero pair is a
/// transport-level fault.
pub(crate) fn ecdsa_verify(
    curve: Curve,
    transport: &dyn Transport,
    adapter: i32,
    pub_key: &EcKey,
    hash: &[u8],
    r: &[u8],
    s: &[u8],
) -> Result<(), Error> {
    let x = required(&pub_key.x, "ECDSA verify requires a public key")?;
    let y = required(&pub_key.y, "ECDSA verify requires a public key")?;
    let key_token = token::build_public_token(curve, &x, &y);

    let mut signature = Vec::with_capacity(r.len() + s.len());
    signature.extend_from_slice(r);
    signature.extend_from_slice(s);

    let mut parm = Vec::new();
    push_u16(&mut parm, SUB_FUNC_VERIFY);
    push_rule(&mut parm, RULE_ECDSA);
    parm.extend_from_slice(&build_vud(&[(VUD_TAG_HASH, hash), (VUD_TAG_SIGNATURE, &signature)]));
    push_key_block(&mut parm, &[&key_token]);

    let buffer = send(transport, adapter, &parm)?;
    let reply = buffer.reply()?;
    match (reply.ccp_rtcode, reply.ccp_rscode) {
        (0, 0) => Ok(()),
        (4, RS_SIGNATURE_INVALID) => Err(Error::SignatureInvalid),
        _ => Err(Error::HardwareFault("coprocessor returned a nonzero return code")),
    }
}

/// EC key generation: sends a skeleton private-key token plus the null
/// ECC token and parses the generated clear keypair out of the reply
/// token.
pub(crate) fn eckeygen(curve: Curve, transport: &dyn Transport, adapter: i32) -> Result<EcKey, Error> {
    let privlen = curve.privlen();
    let skeleton = token::build_key_token(curve, token::USAGE_SIGNATURE, None, None);

    let mut parm = Vec::new();
    push_u16(&mut parm, SUB_FUNC_KEYGEN);
    push_rule(&mut parm, RULE_CLEAR);
    parm.extend_from_slice(&build_vud(&[]));
    push_key_block(&mut parm, &[&skeleton, &token::ECC_NULL_TOKEN]);

    let buffer = send(transport, adapter, &parm)?;
    check_rtcode(&buffer)?;

    let reply = buffer.reply()?;
    let (_, key) = reply_sections(reply.parm)?;
    let parsed = token::parse_token(&key[2..])?;

    let d = parsed.d.ok_or(Error::FormatMismatch("keygen reply carries no private scalar"))?;
    if d.len() != privlen {
        return Err(Error::FormatMismatch("keygen reply scalar length does not match privlen"));
    }
    let x = parsed.x.ok_or(Error::FormatMismatch("keygen reply carries no public point"))?;
    let y = parsed.y.ok_or(Error::FormatMismatch("keygen reply carries no public point"))?;
    if x.len() != privlen || y.len() != privlen {
        return Err(Error::FormatMismatch("keygen reply point length does not match privlen"));
    }

    EcKey::new(curve).with_private(&d)?.with_public(&x, &y)
}

#[cfg(test)]
mod tests {
    use super::transport::SimulatedTransport;
    use super::*;

    fn materialized_key(curve: Curve) -> EcKey {
        let transport = SimulatedTransport::default();
        eckeygen(curve, &transport, 0).unwrap()
    }

    #[test]
    fn keygen_then_sign_then_verify_round_trips_through_the_simulated_card() {
        let transport = SimulatedTransport::default();
        let key = materialized_key(Curve::P256);

        let hash = [0x5Au8; 32];
        let (r, s) = ecdsa_sign(Curve::P256, &transport, 0, &key, &hash).unwrap();
        ecdsa_verify(Curve::P256, &transport, 0, &key, &hash, &r, &s).unwrap();
    }

    #[test]
    fn verify_reports_a_flipped_signature_as_invalid_not_as_a_fault() {
        let transport = SimulatedTransport::default();
        let key = materialized_key(Curve::P384);

        let hash = [0x5Au8; 48];
        let (mut r, s) = ecdsa_sign(Curve::P384, &transport, 0, &key, &hash).unwrap();
        r[10] ^= 0x04;

        let err = ecdsa_verify(Curve::P384, &transport, 0, &key, &hash, &r, &s).unwrap_err();
        assert!(matches!(err, Error::SignatureInvalid));
    }

    #[test]
    fn ecdh_shared_secret_agrees_between_both_sides() {
        let transport = SimulatedTransport::default();
        let alice = materialized_key(Curve::P256);
        let bob = materialized_key(Curve::P256);

        let z_alice = ecdh(
            Curve::P256,
            &transport,
            0,
            &alice,
            bob.x.as_ref().unwrap().as_bytes(),
            bob.y.as_ref().unwrap().as_bytes(),
        )
        .unwrap();
        let z_bob = ecdh(
            Curve::P256,
            &transport,
            0,
            &bob,
            alice.x.as_ref().unwrap().as_bytes(),
            alice.y.as_ref().unwrap().as_bytes(),
        )
        .unwrap();

        assert_eq!(z_alice, z_bob);
        assert_eq!(z_alice.len(), 32);
    }

    #[test]
    fn tampered_reply_lengths_surface_as_format_mismatch() {
        let transport = SimulatedTransport { corrupt_reply_len: true };
        let key = materialized_key(Curve::P256);

        let err = ecdsa_sign(Curve::P256, &transport, 0, &key, &[0x5A; 32]).unwrap_err();
        assert!(matches!(err, Error::FormatMismatch(_)));
    }

    #[test]
    fn p521_keygen_pads_to_sixty_six_bytes() {
        let key = materialized_key(Curve::P521);
        assert_eq!(key.d.as_ref().unwrap().len(), 66);
        assert_eq!(key.x.as_ref().unwrap().len(), 66);
        assert_eq!(key.y.as_ref().unwrap().len(), 66);
    }
}
