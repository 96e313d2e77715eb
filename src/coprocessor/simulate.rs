//! Software stand-in for the coprocessor firmware.
//!
//! Parses a serialized request the same way the card would — envelope,
//! sub-function code, rule array, VUD, key block — and answers it with
//! [`crate::reference`] math. It exists purely so the framing in
//! [`super`] is exercised end to end on hosts without an adapter; it has
//! no bearing on what real firmware does beyond agreeing on the byte
//! layout.

use crate::curve::{Curve, CurveKind};
use crate::error::Error;
use crate::reference::{montgomery, weierstrass};
use crate::rng::Csprng;

use super::cprb;
use super::token::{self, ParsedToken};
use super::{SUB_FUNC_ECDH, SUB_FUNC_KEYGEN, SUB_FUNC_SIGN, SUB_FUNC_VERIFY};
use super::{RS_SIGNATURE_INVALID, VUD_TAG_HASH, VUD_TAG_SIGNATURE};

/// Return code for a request the simulated firmware cannot service.
const RT_FUNCTION_NOT_SUPPORTED: u16 = 12;

pub(super) struct SimReply {
    pub rtcode: u16,
    pub rscode: u16,
    pub parm: Vec<u8>,
}

impl SimReply {
    fn ok(parm: Vec<u8>) -> Self {
        Self { rtcode: 0, rscode: 0, parm }
    }

    fn refused(rtcode: u16, rscode: u16, sub_func: u16) -> Self {
        Self { rtcode, rscode, parm: reply_parm(sub_func, &[0x00, 0x02], &[0x00, 0x02]) }
    }
}

fn get_u16(data: &[u8], off: usize) -> Result<u16, Error> {
    if data.len() < off + 2 {
        return Err(Error::FormatMismatch("request parameter block truncated"));
    }
    Ok(u16::from_be_bytes([data[off], data[off + 1]]))
}

/// A parsed request parameter block: rule array, VUD and key block.
struct ParsedParm<'a> {
    sub_func: u16,
    rule: &'a [u8],
    vud: &'a [u8],
    key: &'a [u8],
}

fn parse_parm(parm: &[u8]) -> Result<ParsedParm<'_>, Error> {
    let sub_func = get_u16(parm, 0)?;
    let rule_len = get_u16(parm, 2)? as usize;
    if rule_len < 2 || parm.len() < 2 + rule_len {
        return Err(Error::FormatMismatch("rule array overruns the parameter block"));
    }
    let rule = &parm[4..2 + rule_len];

    let vud_off = 2 + rule_len;
    let vud_len = get_u16(parm, vud_off)? as usize;
    if vud_len < 2 || parm.len() < vud_off + vud_len {
        return Err(Error::FormatMismatch("VUD overruns the parameter block"));
    }
    let vud = &parm[vud_off..vud_off + vud_len];

    let key_off = vud_off + vud_len;
    let key_len = get_u16(parm, key_off)? as usize;
    if key_len < 2 || parm.len() < key_off + key_len {
        return Err(Error::FormatMismatch("key block overruns the parameter block"));
    }
    let key = &parm[key_off + 2..key_off + key_len];

    Ok(ParsedParm { sub_func, rule, vud, key })
}

/// Walks the VUD entries and returns the payload tagged `tag`.
fn vud_entry<'a>(vud: &'a [u8], tag: u16) -> Result<&'a [u8], Error> {
    let mut off = 2;
    while off < vud.len() {
        let entry_len = get_u16(vud, off)? as usize;
        if entry_len < 4 || off + entry_len > vud.len() {
            return Err(Error::FormatMismatch("VUD entry overruns the VUD"));
        }
        if get_u16(vud, off + 2)? == tag {
            return Ok(&vud[off + 4..off + entry_len]);
        }
        off += entry_len;
    }
    Err(Error::FormatMismatch("expected VUD entry is missing"))
}

fn reply_parm(sub_func: u16, vud: &[u8], key: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(2 + vud.len() + key.len());
    out.extend_from_slice(&sub_func.to_be_bytes());
    out.extend_from_slice(vud);
    out.extend_from_slice(key);
    out
}

pub(super) fn execute(request: &[u8], corrupt_reply_len: bool) -> Result<SimReply, Error> {
    let (_domain, parm) = cprb::read_request(request)?;
    let parsed = parse_parm(parm)?;

    match parsed.sub_func {
        SUB_FUNC_ECDH => ecdh(&parsed, corrupt_reply_len),
        SUB_FUNC_SIGN => sign(&parsed, corrupt_reply_len),
        SUB_FUNC_VERIFY => verify(&parsed),
        SUB_FUNC_KEYGEN => keygen(&parsed),
        _ => Err(Error::FormatMismatch("unrecognized sub-function code")),
    }
}

fn expect_rule(parsed: &ParsedParm<'_>, rule: &[u8; 8]) -> Result<(), Error> {
    if parsed.rule != rule.as_slice() {
        return Err(Error::FormatMismatch("rule array does not match the sub-function"));
    }
    Ok(())
}

/// Splits the ECDH key block into its duplicated token pair, checking
/// the null-token padding and that both copies are byte-identical — the
/// same duplication the real firmware insists on.
fn ecdh_token_pair(key: &[u8]) -> Result<(ParsedToken, ParsedToken), Error> {
    let own = token::parse_token(key)?;
    let peer = token::parse_token(&key[own.len..])?;
    let pair_len = own.len + peer.len;

    let nulls = [token::NULL_KEY_TOKEN, token::NULL_KEY_TOKEN].concat();
    let rest = &key[pair_len..];
    if rest.len() != pair_len + 2 * nulls.len()
        || rest[..nulls.len()] != nulls[..]
        || rest[nulls.len()..nulls.len() + pair_len] != key[..pair_len]
        || rest[nulls.len() + pair_len..] != nulls[..]
    {
        return Err(Error::FormatMismatch("ECDH key block is not a duplicated token pair"));
    }

    Ok((own, peer))
}

fn ecdh(parsed: &ParsedParm<'_>, corrupt: bool) -> Result<SimReply, Error> {
    expect_rule(parsed, super::RULE_PASSTHRU)?;
    if parsed.vud != super::ECDH_VUD.as_slice() {
        return Err(Error::FormatMismatch("ECDH VUD does not match the pass-through form"));
    }

    let (own, peer) = ecdh_token_pair(parsed.key)?;
    let curve = own.curve;
    let privlen = curve.privlen();
    let d = own.d.ok_or(Error::FormatMismatch("ECDH request is missing the private key"))?;
    let peer_x = peer.x.ok_or(Error::FormatMismatch("ECDH request is missing the peer point"))?;

    let z = match curve.kind() {
        CurveKind::Weierstrass => {
            let peer_y = peer.y.ok_or(Error::FormatMismatch("ECDH request is missing the peer point"))?;
            match weierstrass::scalar_mul(curve, &peer_x, &peer_y, &d, false) {
                Ok((z, _)) => z,
                Err(()) => return Ok(SimReply::refused(8, 2054, parsed.sub_func)),
            }
        }
        // Montgomery coordinates ride through the tokens in their
        // little-endian external form.
        CurveKind::Montgomery => match curve {
            Curve::X25519 => {
                let d: [u8; 32] = d.as_slice().try_into().map_err(|_| Error::FormatMismatch("bad scalar width"))?;
                let u: [u8; 32] =
                    peer_x.as_slice().try_into().map_err(|_| Error::FormatMismatch("bad coordinate width"))?;
                montgomery::x25519_mul(&d, &u).to_vec()
            }
            _ => {
                let d: [u8; 56] = d.as_slice().try_into().map_err(|_| Error::FormatMismatch("bad scalar width"))?;
                let u: [u8; 56] =
                    peer_x.as_slice().try_into().map_err(|_| Error::FormatMismatch("bad coordinate width"))?;
                montgomery::x448_mul(&d, &u).to_vec()
            }
        },
        CurveKind::Edwards => return Ok(SimReply::refused(RT_FUNCTION_NOT_SUPPORTED, 0, parsed.sub_func)),
    };

    let mut key_reply = Vec::with_capacity(4 + privlen);
    let mut key_len = (4 + privlen) as u16;
    if corrupt {
        key_len -= 2;
    }
    key_reply.extend_from_slice(&key_len.to_be_bytes());
    key_reply.extend_from_slice(&[0x00, 0x00]);
    key_reply.extend_from_slice(&z);

    Ok(SimReply::ok(reply_parm(parsed.sub_func, &[0x00, 0x02], &key_reply)))
}

fn sign(parsed: &ParsedParm<'_>, corrupt: bool) -> Result<SimReply, Error> {
    expect_rule(parsed, super::RULE_ECDSA)?;
    let hash = vud_entry(parsed.vud, VUD_TAG_HASH)?;

    let key = token::parse_token(parsed.key)?;
    let curve = key.curve;
    if curve.kind() != CurveKind::Weierstrass {
        return Ok(SimReply::refused(RT_FUNCTION_NOT_SUPPORTED, 0, parsed.sub_func));
    }
    let privlen = curve.privlen();
    let d = key.d.ok_or(Error::FormatMismatch("sign request is missing the private key"))?;

    // The hash rides in at its digest width; signing wants it at field
    // width, leftmost bytes kept.
    let mut z = vec![0u8; privlen];
    let take = privlen.min(hash.len());
    z[privlen - take..].copy_from_slice(&hash[..take]);

    let mut rng = Csprng::new();
    let mut k = vec![0u8; privlen];
    let mut signature = None;
    for _ in 0..8 {
        rng.fill_bytes(&mut k);
        if let Ok((r, s)) = weierstrass::ecdsa_sign(curve, &d, &z, &k) {
            signature = Some((r, s));
            break;
        }
    }
    let Some((r, s)) = signature else {
        return Ok(SimReply::refused(8, 2053, parsed.sub_func));
    };

    let mut vud_len = (8 + 2 * privlen) as u16;
    if corrupt {
        vud_len -= 2;
    }
    let mut vud = Vec::with_capacity(8 + 2 * privlen);
    vud.extend_from_slice(&vud_len.to_be_bytes());
    vud.extend_from_slice(&[0x00, 0x00]);
    vud.extend_from_slice(&((4 + 2 * privlen) as u16).to_be_bytes());
    vud.extend_from_slice(&VUD_TAG_SIGNATURE.to_be_bytes());
    vud.extend_from_slice(&r);
    vud.extend_from_slice(&s);

    Ok(SimReply::ok(reply_parm(parsed.sub_func, &vud, &[0x00, 0x02])))
}

fn verify(parsed: &ParsedParm<'_>) -> Result<SimReply, Error> {
    expect_rule(parsed, super::RULE_ECDSA)?;
    let hash = vud_entry(parsed.vud, VUD_TAG_HASH)?;
    let signature = vud_entry(parsed.vud, VUD_TAG_SIGNATURE)?;

    let key = token::parse_token(parsed.key)?;
    let curve = key.curve;
    if curve.kind() != CurveKind::Weierstrass {
        return Ok(SimReply::refused(RT_FUNCTION_NOT_SUPPORTED, 0, parsed.sub_func));
    }
    let privlen = curve.privlen();
    let x = key.x.ok_or(Error::FormatMismatch("verify request is missing the public key"))?;
    let y = key.y.ok_or(Error::FormatMismatch("verify request is missing the public key"))?;

    if signature.len() != 2 * privlen {
        return Err(Error::FormatMismatch("signature length does not match 2*privlen"));
    }
    let (r, s) = signature.split_at(privlen);

    let mut z = vec![0u8; privlen];
    let take = privlen.min(hash.len());
    z[privlen - take..].copy_from_slice(&hash[..take]);

    match weierstrass::ecdsa_verify(curve, &x, &y, &z, r, s) {
        Ok(()) => Ok(SimReply::ok(reply_parm(parsed.sub_func, &[0x00, 0x02], &[0x00, 0x02]))),
        Err(()) => Ok(SimReply::refused(4, RS_SIGNATURE_INVALID, parsed.sub_func)),
    }
}

/// Lexicographic big-endian comparison against the group order; the
/// generated scalar must land in `[1, order)`.
fn scalar_in_range(candidate: &[u8], order: &[u8]) -> bool {
    candidate.iter().any(|b| *b != 0) && candidate < order
}

fn keygen(parsed: &ParsedParm<'_>) -> Result<SimReply, Error> {
    expect_rule(parsed, super::RULE_CLEAR)?;

    let skeleton = token::parse_token(parsed.key)?;
    if skeleton.d.is_some() {
        return Err(Error::FormatMismatch("keygen skeleton token must not carry a scalar"));
    }
    if &parsed.key[skeleton.len..] != token::ECC_NULL_TOKEN.as_slice() {
        return Err(Error::FormatMismatch("keygen key block is missing the null ECC token"));
    }

    let curve = skeleton.curve;
    let privlen = curve.privlen();
    let mut rng = Csprng::new();
    let mut d = vec![0u8; privlen];

    let (x, y) = match curve.kind() {
        CurveKind::Weierstrass => {
            loop {
                rng.fill_bytes(&mut d);
                if scalar_in_range(&d, curve.order()) {
                    break;
                }
            }
            match weierstrass::base_mul(curve, &d, true) {
                Ok((x, Some(y))) => (x, y),
                _ => return Ok(SimReply::refused(8, 2054, parsed.sub_func)),
            }
        }
        CurveKind::Montgomery => {
            // Any byte string is a valid Montgomery secret; clamping
            // happens inside the ladder.
            rng.fill_bytes(&mut d);
            let base = curve.montgomery_base_u();
            let u = match curve {
                Curve::X25519 => {
                    let d: [u8; 32] = d.as_slice().try_into().expect("privlen is 32");
                    let base: [u8; 32] = base.as_slice().try_into().expect("privlen is 32");
                    montgomery::x25519_mul(&d, &base).to_vec()
                }
                _ => {
                    let d: [u8; 56] = d.as_slice().try_into().expect("privlen is 56");
                    let base: [u8; 56] = base.as_slice().try_into().expect("privlen is 56");
                    montgomery::x448_mul(&d, &base).to_vec()
                }
            };
            (u, vec![0u8; privlen])
        }
        CurveKind::Edwards => return Ok(SimReply::refused(RT_FUNCTION_NOT_SUPPORTED, 0, parsed.sub_func)),
    };

    let reply_token = token::build_key_token(curve, token::USAGE_SIGNATURE, Some(&d), Some((&x, &y)));
    let mut key_reply = Vec::with_capacity(2 + reply_token.len());
    key_reply.extend_from_slice(&((2 + reply_token.len()) as u16).to_be_bytes());
    key_reply.extend_from_slice(&reply_token);

    Ok(SimReply::ok(reply_parm(parsed.sub_func, &[0x00, 0x02], &key_reply)))
}
