//! CCA ECC key tokens.
//!
//! A key travels to the coprocessor as a token: an 8-byte header
//! (id 0x1E) followed by a private-key section (id 0x20) and/or a
//! public-key section (id 0x21). The private section embeds an
//! associated-data block describing the curve, whose usage flag mirrors
//! the section's own `key_usage`; the firmware checks both. Public
//! points ride uncompressed: a 0x04 lead byte then `X ‖ Y`.
//!
//! All multi-byte numeric fields are big-endian.

use crate::curve::{Curve, CurveKind};
use crate::error::Error;

pub(crate) const TOKEN_HDR_ID: u8 = 0x1E;
pub(crate) const PRIVATE_SECTION_ID: u8 = 0x20;
pub(crate) const PUBLIC_SECTION_ID: u8 = 0x21;

/// Filler between and after the key tokens of an ECDH request.
pub(crate) const NULL_KEY_TOKEN: [u8; 2] = [0x00, 0x44];

/// The null ECC token terminating a key-generation request.
pub(crate) const ECC_NULL_TOKEN: [u8; 5] = [0x00, 0x05, 0x00, 0x10, 0x00];

/// `key_usage` values for the private-key section.
pub(crate) const USAGE_KEY_AGREEMENT: u8 = 0xC0;
pub(crate) const USAGE_SIGNATURE: u8 = 0x80;

/// `key_format` for clear (unencrypted) key material.
const KEY_FORMAT_CLEAR: u8 = 0x40;

/// Lead byte of an uncompressed public point.
pub(crate) const COMPRESS_UNCOMPRESSED: u8 = 0x04;

const TOKEN_HDR_LEN: usize = 8;
const PRIV_SECTION_HDR_LEN: usize = 14;
const ADATA_LEN: usize = 8;
const PUB_SECTION_HDR_LEN: usize = 10;

fn curve_type(curve: Curve) -> u8 {
    match curve.kind() {
        CurveKind::Weierstrass => 0x00,
        CurveKind::Edwards => 0x01,
        CurveKind::Montgomery => 0x02,
    }
}

fn curve_from(curve_type: u8, bitlen: u16) -> Option<Curve> {
    Curve::ALL
        .into_iter()
        .find(|c| self::curve_type(*c) == curve_type && c.bitlen() == bitlen)
}

fn push_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}

/// Builds the private-key section, including its associated data and,
/// unless this is a key-generation skeleton, the clear private scalar.
fn push_private_section(out: &mut Vec<u8>, curve: Curve, usage: u8, d: Option<&[u8]>) {
    let dlen = d.map_or(0, <[u8]>::len);
    let section_len = PRIV_SECTION_HDR_LEN + ADATA_LEN + dlen;

    out.push(PRIVATE_SECTION_ID);
    out.push(0x00);
    push_u16(out, section_len as u16);
    out.push(usage);
    out.push(curve_type(curve));
    out.push(KEY_FORMAT_CLEAR);
    out.push(0x00);
    push_u16(out, curve.bitlen());
    push_u16(out, ADATA_LEN as u16);
    push_u16(out, dlen as u16);

    // Associated data; the usage and format flags repeat the section
    // header's values and the firmware rejects a mismatch.
    out.push(ADATA_LEN as u8);
    out.push(curve_type(curve));
    out.push(usage);
    out.push(KEY_FORMAT_CLEAR);
    push_u16(out, curve.bitlen());
    push_u16(out, 0);

    if let Some(d) = d {
        out.extend_from_slice(d);
    }
}

fn push_public_section(out: &mut Vec<u8>, curve: Curve, x: &[u8], y: &[u8]) {
    let q_bytelen = 1 + x.len() + y.len();

    out.push(PUBLIC_SECTION_ID);
    out.push(0x00);
    push_u16(out, (PUB_SECTION_HDR_LEN + q_bytelen) as u16);
    out.push(curve_type(curve));
    out.push(0x00);
    push_u16(out, curve.bitlen());
    push_u16(out, q_bytelen as u16);
    out.push(COMPRESS_UNCOMPRESSED);
    out.extend_from_slice(x);
    out.extend_from_slice(y);
}

fn finish_token(mut body: Vec<u8>) -> Vec<u8> {
    let total = (TOKEN_HDR_LEN + body.len()) as u16;
    let mut out = Vec::with_capacity(total as usize);
    out.push(TOKEN_HDR_ID);
    out.push(0x00);
    out.extend_from_slice(&total.to_be_bytes());
    out.extend_from_slice(&[0u8; 4]);
    out.append(&mut body);
    out
}

/// A token carrying a private-key section (clear scalar, or a skeleton
/// when `d` is `None`) and, when coordinates are supplied, a public-key
/// section.
pub(crate) fn build_key_token(curve: Curve, usage: u8, d: Option<&[u8]>, xy: Option<(&[u8], &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    push_private_section(&mut body, curve, usage, d);
    if let Some((x, y)) = xy {
        push_public_section(&mut body, curve, x, y);
    }
    finish_token(body)
}

/// A token carrying only a public-key section.
pub(crate) fn build_public_token(curve: Curve, x: &[u8], y: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    push_public_section(&mut body, curve, x, y);
    finish_token(body)
}

/// Key material parsed back out of a token.
pub(crate) struct ParsedToken {
    pub curve: Curve,
    pub d: Option<Vec<u8>>,
    pub x: Option<Vec<u8>>,
    pub y: Option<Vec<u8>>,
    /// Total token length, so a caller walking a key block can find the
    /// next token.
    pub len: usize,
}

fn get_u16(data: &[u8], off: usize) -> Result<u16, Error> {
    if data.len() < off + 2 {
        return Err(Error::FormatMismatch("token truncated"));
    }
    Ok(u16::from_be_bytes([data[off], data[off + 1]]))
}

/// Parses a token built by [`build_key_token`] / [`build_public_token`],
/// walking its sections the same way reply parsing does: the public
/// section, when present, starts `section_len` bytes after the start of
/// the private section.
pub(crate) fn parse_token(data: &[u8]) -> Result<ParsedToken, Error> {
    if data.len() < TOKEN_HDR_LEN || data[0] != TOKEN_HDR_ID {
        return Err(Error::FormatMismatch("key token header missing or malformed"));
    }
    let total = get_u16(data, 2)? as usize;
    if total < TOKEN_HDR_LEN || data.len() < total {
        return Err(Error::FormatMismatch("key token shorter than its declared length"));
    }

    let mut curve = None;
    let mut d = None;
    let mut x = None;
    let mut y = None;

    let mut off = TOKEN_HDR_LEN;
    while off < total {
        let section_len = get_u16(data, off + 2)? as usize;
        if section_len == 0 || off + section_len > total {
            return Err(Error::FormatMismatch("token section overruns the token"));
        }
        let section = &data[off..off + section_len];

        match section[0] {
            PRIVATE_SECTION_ID => {
                let bitlen = get_u16(section, 8)?;
                let found =
                    curve_from(section[5], bitlen).ok_or(Error::FormatMismatch("unrecognized curve in key token"))?;
                curve = Some(found);

                let adata_len = get_u16(section, 10)? as usize;
                let dlen = get_u16(section, 12)? as usize;
                let d_off = PRIV_SECTION_HDR_LEN + adata_len;
                if dlen > 0 {
                    if section.len() < d_off + dlen {
                        return Err(Error::FormatMismatch("private scalar overruns its section"));
                    }
                    d = Some(section[d_off..d_off + dlen].to_vec());
                }
            }
            PUBLIC_SECTION_ID => {
                let bitlen = get_u16(section, 6)?;
                let found =
                    curve_from(section[4], bitlen).ok_or(Error::FormatMismatch("unrecognized curve in key token"))?;
                curve.get_or_insert(found);

                let q_bytelen = get_u16(section, 8)? as usize;
                if q_bytelen < 1 || section.len() < PUB_SECTION_HDR_LEN + q_bytelen {
                    return Err(Error::FormatMismatch("public point overruns its section"));
                }
                if section[PUB_SECTION_HDR_LEN] != COMPRESS_UNCOMPRESSED {
                    return Err(Error::FormatMismatch("public point is not in uncompressed form"));
                }
                let coords = &section[PUB_SECTION_HDR_LEN + 1..PUB_SECTION_HDR_LEN + q_bytelen];
                let half = coords.len() / 2;
                x = Some(coords[..half].to_vec());
                y = Some(coords[half..].to_vec());
            }
            _ => return Err(Error::FormatMismatch("unrecognized token section id")),
        }
        off += section_len;
    }

    let curve = curve.ok_or(Error::FormatMismatch("token carries no key section"))?;
    Ok(ParsedToken { curve, d, x, y, len: total })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn private_token_round_trips() {
        let d = [0x11u8; 32];
        let x = [0x22u8; 32];
        let y = [0x33u8; 32];
        let token = build_key_token(Curve::P256, USAGE_SIGNATURE, Some(&d), Some((&x, &y)));

        let parsed = parse_token(&token).unwrap();
        assert_eq!(parsed.curve, Curve::P256);
        assert_eq!(parsed.d.unwrap(), d);
        assert_eq!(parsed.x.unwrap(), x);
        assert_eq!(parsed.y.unwrap(), y);
        assert_eq!(parsed.len, token.len());
    }

    #[test]
    fn skeleton_token_has_no_key_material() {
        let token = build_key_token(Curve::P521, USAGE_SIGNATURE, None, None);
        let parsed = parse_token(&token).unwrap();

        assert_eq!(parsed.curve, Curve::P521);
        assert!(parsed.d.is_none());
        assert!(parsed.x.is_none());
    }

    #[test]
    fn usage_flag_is_mirrored_into_the_associated_data() {
        let token = build_key_token(Curve::P384, USAGE_KEY_AGREEMENT, Some(&[0x44; 48]), None);

        // Section header usage at +4 of the private section, associated
        // data usage two bytes into the associated data.
        let priv_off = 8;
        assert_eq!(token[priv_off + 4], USAGE_KEY_AGREEMENT);
        assert_eq!(token[priv_off + 14 + 2], USAGE_KEY_AGREEMENT);
    }

    #[test]
    fn p521_token_carries_bitlen_521() {
        let token = build_public_token(Curve::P521, &[0u8; 66], &[0u8; 66]);
        // Public section starts after the 8-byte token header; its
        // bit-length field sits at +6.
        assert_eq!(u16::from_be_bytes([token[8 + 6], token[8 + 7]]), 521);
    }

    #[test]
    fn truncated_token_is_rejected() {
        let token = build_public_token(Curve::P256, &[0u8; 32], &[0u8; 32]);
        assert!(parse_token(&token[..token.len() - 4]).is_err());
    }
}
