//! Instruction invocation: PCC for scalar multiplication, KDSA for ECDSA
//! sign/verify.
//!
//! On s390x this issues the real CPU instruction against a packed
//! parameter block. Everywhere else — which is every host this crate is
//! actually built and tested on — [`crate::reference`]'s math stands in,
//! driven off the same packed bytes, so the packing code in
//! [`super::paramblock`] and [`super`] never has to know which side of
//! the `cfg` it is running on.

use super::paramblock::{mslot, slot, FiveSlotBlock, ThreeSlotBlock};
use crate::curve::{Curve, CurveKind};
use crate::error::Error;

/// Deterministic-nonce bit of the KDSA sign function codes: with it set,
/// the instruction consumes the caller's `rand` slot instead of drawing
/// its own nonce.
#[cfg(target_arch = "s390x")]
const KDSA_DETERMINISTIC: u8 = 0x80;

#[cfg(target_arch = "s390x")]
mod hw {
    use core::arch::asm;

    /// PCC, opcode 0xB92C. Function code in the low byte of GR0,
    /// parameter block address in GR1. Returns the condition code.
    pub(super) unsafe fn pcc(fc: u8, block: *mut u8) -> u32 {
        let cc: u64;
        asm!(
            ".insn rre, 0xb92c0000, 0, 0",
            "ipm {cc}",
            "srl {cc}, 28",
            cc = out(reg) cc,
            in("r0") fc as u64,
            in("r1") block,
            options(nostack),
        );
        cc as u32
    }

    /// KDSA, opcode 0xB93A. Function code in GR0, parameter block
    /// address in GR1; the message-operand register pair is unused for
    /// the prehashed ECDSA function codes this crate issues.
    pub(super) unsafe fn kdsa(fc: u8, block: *mut u8) -> u32 {
        let cc: u64;
        asm!(
            ".insn rre, 0xb93a0000, 0, 2",
            "ipm {cc}",
            "srl {cc}, 28",
            cc = out(reg) cc,
            in("r0") fc as u64,
            in("r1") block,
            in("r2") 0u64,
            in("r3") 0u64,
            options(nostack),
        );
        cc as u32
    }
}

/// Weierstrass/Edwards scalar multiplication: reads `x`, `y`, `scalar`
/// from the block, writes `res_x` (and `res_y` when `want_y`).
pub(crate) fn scalar_mul(curve: Curve, block: &mut FiveSlotBlock, privlen: usize, want_y: bool) -> Result<(), Error> {
    debug_assert!(curve.kind() != CurveKind::Montgomery);

    #[cfg(target_arch = "s390x")]
    {
        let _ = (privlen, want_y);
        let cc = unsafe { hw::pcc(curve.pcc_scalar_mul_function(), block.as_mut_ptr()) };
        if cc != 0 {
            return Err(Error::HardwareFault("PCC scalar multiplication rejected the block"));
        }
        Ok(())
    }

    #[cfg(not(target_arch = "s390x"))]
    {
        match curve.kind() {
            CurveKind::Weierstrass => {
                let x = block.unpack(slot::X, privlen);
                let y = block.unpack(slot::Y, privlen);
                let scalar = block.unpack(slot::SCALAR, privlen);

                let (rx, ry) = crate::reference::weierstrass::scalar_mul(curve, &x, &y, &scalar, want_y)
                    .map_err(|_| Error::HardwareFault("scalar multiplication rejected its operands"))?;

                block.pack(slot::RES_X, &rx);
                if let Some(ry) = ry {
                    block.pack(slot::RES_Y, &ry);
                }
                Ok(())
            }
            CurveKind::Edwards => edwards_stand_in(curve, block, privlen),
            CurveKind::Montgomery => unreachable!(),
        }
    }
}

/// Edwards stand-in for the PCC scalar-multiply function codes. The only
/// in-crate caller multiplies the curve's own generator and then consumes
/// two things from the block: the `res_y` coordinate and the low bit of
/// `res_x`. The dalek/Goldilocks backends expose exactly those through
/// point compression, so this fills `res_y` with the big-endian `y` and
/// the tail byte of `res_x` with the parity of `x`.
#[cfg(not(target_arch = "s390x"))]
fn edwards_stand_in(curve: Curve, block: &mut FiveSlotBlock, privlen: usize) -> Result<(), Error> {
    let mut scalar = block.unpack(slot::SCALAR, privlen);
    crate::endian::reverse(&mut scalar);

    let (mut y_le, parity) = match curve {
        Curve::Ed25519 => {
            let scalar: [u8; 32] = scalar.try_into().map_err(|_| Error::HardwareFault("bad operand length"))?;
            let (y, parity) = crate::reference::edwards::ed25519_base_mul(&scalar);
            (y.to_vec(), parity)
        }
        Curve::Ed448 => {
            let scalar: [u8; 57] = scalar.try_into().map_err(|_| Error::HardwareFault("bad operand length"))?;
            let (y, parity) = crate::reference::edwards::ed448_base_mul(&scalar);
            (y.to_vec(), parity)
        }
        _ => unreachable!(),
    };

    crate::endian::reverse(&mut y_le);
    block.pack(slot::RES_Y, &y_le);

    let mut res_x = vec![0u8; privlen];
    res_x[privlen - 1] = parity;
    block.pack(slot::RES_X, &res_x);
    Ok(())
}

/// Montgomery scalar multiplication: reads `u`, `scalar` from the block,
/// writes `res_u`.
pub(crate) fn scalar_mul_montgomery(curve: Curve, block: &mut ThreeSlotBlock, privlen: usize) -> Result<(), Error> {
    debug_assert_eq!(curve.kind(), CurveKind::Montgomery);

    #[cfg(target_arch = "s390x")]
    {
        let _ = privlen;
        let cc = unsafe { hw::pcc(curve.pcc_scalar_mul_function(), block.as_mut_ptr()) };
        if cc != 0 {
            return Err(Error::HardwareFault("PCC scalar multiplication rejected the block"));
        }
        Ok(())
    }

    #[cfg(not(target_arch = "s390x"))]
    {
        // The block holds big-endian operands; the ladders want the
        // RFC 7748 native little-endian form.
        let mut u = block.unpack(mslot::U, privlen);
        let mut scalar = block.unpack(mslot::SCALAR, privlen);
        crate::endian::reverse(&mut u);
        crate::endian::reverse(&mut scalar);

        let mut result = match curve {
            Curve::X25519 => {
                let u: [u8; 32] = u.try_into().map_err(|_| Error::HardwareFault("bad operand length"))?;
                let scalar: [u8; 32] = scalar.try_into().map_err(|_| Error::HardwareFault("bad operand length"))?;
                crate::reference::montgomery::x25519_mul(&scalar, &u).to_vec()
            }
            Curve::X448 => {
                let u: [u8; 56] = u.try_into().map_err(|_| Error::HardwareFault("bad operand length"))?;
                let scalar: [u8; 56] = scalar.try_into().map_err(|_| Error::HardwareFault("bad operand length"))?;
                crate::reference::montgomery::x448_mul(&scalar, &u).to_vec()
            }
            _ => unreachable!(),
        };

        crate::endian::reverse(&mut result);
        block.pack(mslot::RES_U, &result);
        Ok(())
    }
}

/// ECDSA sign: reads `hash`, `key` (= d) and, in deterministic mode,
/// `rand` (= k) from the block; writes `sig_r`, `sig_s`.
pub(crate) fn ecdsa_sign(curve: Curve, block: &mut FiveSlotBlock, privlen: usize, deterministic: bool) -> Result<(), Error> {
    debug_assert!(curve.cpacf_ecdsa_supported());

    #[cfg(target_arch = "s390x")]
    {
        let _ = privlen;
        let mut fc = curve.kdsa_sign_function();
        if deterministic {
            fc |= KDSA_DETERMINISTIC;
        }
        let cc = unsafe { hw::kdsa(fc, block.as_mut_ptr()) };
        if cc != 0 {
            return Err(Error::HardwareFault("KDSA sign rejected the block"));
        }
        Ok(())
    }

    #[cfg(not(target_arch = "s390x"))]
    {
        // Off-hardware there is no instruction-internal nonce source;
        // the caller fills `rand` in both modes, so both collapse to the
        // same computation here.
        let _ = deterministic;
        let hash = block.unpack(slot::HASH, privlen);
        let d = block.unpack(slot::KEY, privlen);
        let k = block.unpack(slot::RAND, privlen);

        let (r, s) = crate::reference::weierstrass::ecdsa_sign(curve, &d, &hash, &k)
            .map_err(|_| Error::HardwareFault("ECDSA signing rejected its operands"))?;

        block.pack(slot::SIG_R, &r);
        block.pack(slot::SIG_S, &s);
        Ok(())
    }
}

/// ECDSA verify: reads `sig_r`, `sig_s`, `hash` and the public `(x, y)`
/// from the block. No output fields; the condition code alone decides.
pub(crate) fn ecdsa_verify(curve: Curve, block: &mut FiveSlotBlock, privlen: usize) -> Result<(), Error> {
    debug_assert!(curve.cpacf_ecdsa_supported());

    #[cfg(target_arch = "s390x")]
    {
        let _ = privlen;
        let cc = unsafe { hw::kdsa(curve.kdsa_verify_function(), block.as_mut_ptr()) };
        if cc != 0 {
            return Err(Error::SignatureInvalid);
        }
        Ok(())
    }

    #[cfg(not(target_arch = "s390x"))]
    {
        let r = block.unpack(slot::SIG_R, privlen);
        let s = block.unpack(slot::SIG_S, privlen);
        let hash = block.unpack(slot::HASH, privlen);
        let x = block.unpack(slot::KEY, privlen);
        let y = block.unpack(slot::RAND, privlen);

        crate::reference::weierstrass::ecdsa_verify(curve, &x, &y, &hash, &r, &s).map_err(|_| Error::SignatureInvalid)
    }
}
