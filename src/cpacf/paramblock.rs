//! PCC/KDSA parameter blocks.
//!
//! Both block shapes are 4 KiB structures: a handful of named slots at
//! the front, scratch space the instruction itself may use beyond that.
//! Slots are always right-aligned within their slot width with leading
//! zero padding, so a P-256 operand (32 bytes) sitting in a P-521
//! block's 80-byte slot occupies the last 32 bytes of that slot.
//!
//! Every multi-byte value in a block is big-endian; the Montgomery
//! caller flips its RFC 7748 little-endian operands before packing and
//! after unpacking.

use crate::scrub::scrub;

/// Total size of a PCC/KDSA parameter block.
const PARAM_BLOCK_SIZE: usize = 4096;

/// Widest slot across the supported curve set (P-521's 80-byte slot).
const MAX_SLOT: usize = 80;

/// Slot indices for the five-slot block. Scalar multiplication and
/// ECDSA share the block shape, so two names may map to the same index:
/// the instruction reads the layout off its function code, not off the
/// bytes.
pub(crate) mod slot {
    pub(crate) const RES_X: usize = 0;
    pub(crate) const RES_Y: usize = 1;
    pub(crate) const X: usize = 2;
    pub(crate) const Y: usize = 3;
    pub(crate) const SCALAR: usize = 4;

    pub(crate) const SIG_R: usize = 0;
    pub(crate) const SIG_S: usize = 1;
    pub(crate) const HASH: usize = 2;
    pub(crate) const KEY: usize = 3;
    pub(crate) const RAND: usize = 4;
}

/// Slot indices for the three-slot Montgomery block.
pub(crate) mod mslot {
    pub(crate) const RES_U: usize = 0;
    pub(crate) const U: usize = 1;
    pub(crate) const SCALAR: usize = 2;
}

/// The five-slot parameter block shared by Weierstrass/Edwards scalar
/// multiplication (`res_x, res_y, x, y, scalar`) and ECDSA sign/verify
/// (`sig_r, sig_s, hash, key, rand`).
pub(crate) struct FiveSlotBlock {
    slot: usize,
    raw: Box<[u8; PARAM_BLOCK_SIZE]>,
}

impl FiveSlotBlock {
    pub(crate) fn new(slot: usize) -> Self {
        debug_assert!(slot > 0 && slot <= MAX_SLOT);
        Self { slot, raw: Box::new([0u8; PARAM_BLOCK_SIZE]) }
    }

    /// Right-aligns `data` into the slot, leaving leading bytes zero.
    pub(crate) fn pack(&mut self, idx: usize, data: &[u8]) {
        assert!(data.len() <= self.slot, "operand wider than the curve's slot");
        let off = idx * self.slot;
        let pad = self.slot - data.len();
        self.raw[off..off + pad].fill(0);
        self.raw[off + pad..off + self.slot].copy_from_slice(data);
    }

    /// Packs `hash`, keeping its leftmost `slot` bytes when longer than
    /// the slot, right-aligned with zero padding when shorter.
    pub(crate) fn pack_hash(&mut self, idx: usize, hash: &[u8]) {
        let off = self.slot - self.slot.min(hash.len());
        let take = self.slot - off;
        let base = idx * self.slot;

        self.raw[base..base + off].fill(0);
        self.raw[base + off..base + self.slot].copy_from_slice(&hash[..take]);
    }

    /// Returns the trailing `len` bytes of the slot (the meaningful,
    /// right-aligned portion for a curve whose `privlen` is `len`).
    pub(crate) fn unpack(&self, idx: usize, len: usize) -> Vec<u8> {
        let off = idx * self.slot;
        self.raw[off + self.slot - len..off + self.slot].to_vec()
    }

    /// Scrubs the secret-bearing slots without waiting for drop, so a
    /// retry loop can refill `rand` into an otherwise clean block.
    pub(crate) fn wipe_slot(&mut self, idx: usize) {
        let off = idx * self.slot;
        scrub(&mut self.raw[off..off + self.slot]);
    }

    pub(crate) fn as_mut_ptr(&mut self) -> *mut u8 {
        self.raw.as_mut_ptr()
    }
}

impl Drop for FiveSlotBlock {
    fn drop(&mut self) {
        scrub(self.raw.as_mut_slice());
    }
}

/// The three-slot parameter block for Montgomery scalar multiplication:
/// `res_u, u, scalar`.
pub(crate) struct ThreeSlotBlock {
    slot: usize,
    raw: Box<[u8; PARAM_BLOCK_SIZE]>,
}

impl ThreeSlotBlock {
    pub(crate) fn new(slot: usize) -> Self {
        debug_assert!(slot > 0 && slot <= MAX_SLOT);
        Self { slot, raw: Box::new([0u8; PARAM_BLOCK_SIZE]) }
    }

    pub(crate) fn pack(&mut self, idx: usize, data: &[u8]) {
        assert!(data.len() <= self.slot);
        let off = idx * self.slot;
        let pad = self.slot - data.len();
        self.raw[off..off + pad].fill(0);
        self.raw[off + pad..off + self.slot].copy_from_slice(data);
    }

    pub(crate) fn unpack(&self, idx: usize, len: usize) -> Vec<u8> {
        let off = idx * self.slot;
        self.raw[off + self.slot - len..off + self.slot].to_vec()
    }

    pub(crate) fn as_mut_ptr(&mut self) -> *mut u8 {
        self.raw.as_mut_ptr()
    }
}

impl Drop for ThreeSlotBlock {
    fn drop(&mut self) {
        scrub(self.raw.as_mut_slice());
    }
}

/// RFC 7748 §5 scalar clamping for X25519. Applied to the little-endian
/// form, before the big-endian flip the parameter block wants.
pub(crate) fn clamp_x25519(scalar: &mut [u8; 32]) {
    scalar[0] &= 248;
    scalar[31] &= 127;
    scalar[31] |= 64;
}

/// RFC 7748 §5 scalar clamping for X448.
pub(crate) fn clamp_x448(scalar: &mut [u8; 56]) {
    scalar[0] &= 252;
    scalar[55] |= 128;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_right_aligns_with_zero_padding() {
        let mut block = FiveSlotBlock::new(48);
        block.pack(slot::X, &[0xAA; 32]);

        let out = block.unpack(slot::X, 48);
        assert_eq!(&out[..16], &[0u8; 16]);
        assert_eq!(&out[16..], &[0xAA; 32]);
    }

    #[test]
    fn pack_hash_truncates_from_the_tail_when_longer_than_slot() {
        let mut block = FiveSlotBlock::new(32);
        let hash: Vec<u8> = (0u8..64).collect();
        block.pack_hash(slot::HASH, &hash);

        let out = block.unpack(slot::HASH, 32);
        assert_eq!(out, &hash[..32]);
    }

    #[test]
    fn pack_hash_zero_pads_when_shorter_than_slot() {
        let mut block = FiveSlotBlock::new(32);
        block.pack_hash(slot::HASH, &[0xFF; 20]);

        let out = block.unpack(slot::HASH, 32);
        assert_eq!(&out[..12], &[0u8; 12]);
        assert_eq!(&out[12..], &[0xFF; 20]);
    }

    #[test]
    fn wipe_slot_clears_only_that_slot() {
        let mut block = FiveSlotBlock::new(32);
        block.pack(slot::KEY, &[0x55; 32]);
        block.pack(slot::RAND, &[0x66; 32]);

        block.wipe_slot(slot::RAND);
        assert_eq!(block.unpack(slot::RAND, 32), vec![0u8; 32]);
        assert_eq!(block.unpack(slot::KEY, 32), vec![0x55; 32]);
    }

    #[test]
    fn x25519_clamp_matches_rfc7748() {
        let mut scalar = [0xFFu8; 32];
        clamp_x25519(&mut scalar);
        assert_eq!(scalar[0], 0xF8);
        assert_eq!(scalar[31], 0x7F);
    }
}
