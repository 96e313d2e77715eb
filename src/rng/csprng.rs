//! ChaCha20-DRBG-based CSPRNG, seeded from OS entropy.

use super::chacha20::block;
use crate::os::sys_random;

/// Cryptographically secure pseudorandom byte source.
///
/// Seeded once from the OS, then expanded with the ChaCha20 block
/// function. Rekeys itself after every fill to bound the amount of
/// output produced under a single key.
pub(crate) struct Csprng {
    key: [u8; 32],
    nonce: [u8; 12],
    counter: u32,
}

impl Csprng {
    pub(crate) fn new() -> Self {
        let mut seed = [0u8; 32];
        sys_random(&mut seed);
        let key = seed;
        seed.fill(0);

        Self { key, nonce: [0u8; 12], counter: 0 }
    }

    pub(crate) fn fill_bytes(&mut self, out: &mut [u8]) {
        let mut offset = 0;

        while offset < out.len() {
            let keystream = block(&self.key, self.counter, &self.nonce);
            self.counter = self.counter.wrapping_add(1);

            let to_copy = 64.min(out.len() - offset);
            out[offset..offset + to_copy].copy_from_slice(&keystream[..to_copy]);
            offset += to_copy;
        }

        self.rekey();
    }

    fn rekey(&mut self) {
        let keystream = block(&self.key, self.counter, &self.nonce);
        self.counter = self.counter.wrapping_add(1);
        self.key.copy_from_slice(&keystream[..32]);
    }
}

impl Drop for Csprng {
    fn drop(&mut self) {
        use zeroize::Zeroize;
        self.key.zeroize();
    }
}
