//! EC key record.
//!
//! `D`, `X` and `Y` are each fixed at `privlen(curve)` bytes, right-aligned
//! with leading zero padding, and may individually be absent. The record
//! owns its buffers and does not implement `Clone`/`Copy`: it frequently
//! carries private material and copying it silently would multiply the
//! number of places that material needs scrubbing.

use zeroize::Zeroize;

use crate::curve::Curve;
use crate::error::Error;

/// A private scalar or affine coordinate, padded to `privlen(curve)`
/// bytes. The maximum width across the supported curve set is 66 bytes
/// (P-521); unused tail bytes are zero.
#[derive(Clone, Zeroize)]
pub struct FieldBuf {
    len: usize,
    bytes: [u8; 66],
}

impl FieldBuf {
    /// Builds a buffer from up to `len` bytes, right-aligning them with
    /// leading zero padding.
    pub fn from_be_slice(len: usize, data: &[u8]) -> Result<Self, Error> {
        if data.len() > len {
            return Err(Error::FormatMismatch("field value longer than privlen"));
        }

        let mut bytes = [0u8; 66];
        bytes[len - data.len()..len].copy_from_slice(data);
        Ok(Self { len, bytes })
    }

    pub fn zero(len: usize) -> Self {
        Self { len, bytes: [0u8; 66] }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    pub fn as_mut_bytes(&mut self) -> &mut [u8] {
        &mut self.bytes[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) fn is_zero(&self) -> bool {
        self.as_bytes().iter().all(|b| *b == 0)
    }
}

/// An EC key record: a curve identifier plus the private scalar `D` and
/// affine public coordinates `(X, Y)`, any of which may be absent.
pub struct EcKey {
    pub curve: Curve,
    pub d: Option<FieldBuf>,
    pub x: Option<FieldBuf>,
    pub y: Option<FieldBuf>,
}

impl EcKey {
    pub fn new(curve: Curve) -> Self {
        Self { curve, d: None, x: None, y: None }
    }

    pub fn with_private(mut self, d: &[u8]) -> Result<Self, Error> {
        self.d = Some(FieldBuf::from_be_slice(self.curve.privlen(), d)?);
        Ok(self)
    }

    pub fn with_public(mut self, x: &[u8], y: &[u8]) -> Result<Self, Error> {
        let len = self.curve.privlen();
        self.x = Some(FieldBuf::from_be_slice(len, x)?);
        self.y = Some(FieldBuf::from_be_slice(len, y)?);
        Ok(self)
    }

    /// Checks that every present field is exactly `privlen(curve)`
    /// bytes. `FieldBuf` already enforces this at construction time, so
    /// this mainly guards records assembled by other means, such as
    /// directly from a coprocessor reply.
    pub fn validate(&self) -> Result<(), Error> {
        let want = self.curve.privlen();

        for field in [&self.d, &self.x, &self.y].into_iter().flatten() {
            if field.len() != want {
                return Err(Error::FormatMismatch("key field length does not match privlen"));
            }
        }

        Ok(())
    }

    /// True when the public coordinates are missing and must be
    /// materialized via scalar multiplication before use; coprocessor
    /// key tokens embed `(X, Y)` even for private-key operations.
    pub fn needs_public(&self) -> bool {
        self.x.is_none() || self.y.is_none()
    }
}

impl Drop for EcKey {
    fn drop(&mut self) {
        if let Some(d) = &mut self.d {
            d.zeroize();
        }
    }
}
