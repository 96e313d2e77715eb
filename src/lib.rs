//! Elliptic-curve core for a hardware-accelerated mainframe crypto
//! library.
//!
//! This crate implements the dispatcher and the two hardware-acceleration
//! paths behind EC key generation, ECDH shared-secret derivation, and
//! ECDSA signing/verification, plus public-key derivation for the
//! Edwards and Montgomery curves, over the closed curve set {P-256,
//! P-384, P-521, Ed25519, Ed448, X25519, X448}.
//!
//! Every operation chooses between up to three backends at call time,
//! driven off [`Capabilities`]:
//!
//! - the CPU-instruction path (`cpacf`), packing a fixed-layout 4 KiB
//!   parameter block and issuing PCC/KDSA directly on s390x, backed by
//!   the RustCrypto/dalek curve crates everywhere else;
//! - the coprocessor path (`coprocessor`), framing a CCA CPRBX
//!   request/reply pair over a character-device ioctl;
//! - for Edwards public-key derivation, the RFC 8032 hash-clamp-multiply
//!   procedure on top of the scalar-multiplication path.
//!
//! # Module overview
//!
//! - `curve` — the per-curve constant catalog everything else keys off:
//!   scalar width, slot width, function codes, generator, group order.
//! - `key` — the in-memory EC key record ([`EcKey`]) and its fixed-width
//!   field buffers.
//! - `cpacf` — PCC/KDSA parameter-block packing and instruction
//!   invocation.
//! - `coprocessor` — CPRBX request/reply framing, CCA key tokens and the
//!   `ZSECSENDCPRB` ioctl path.
//! - `reference` — the portable math the non-hardware paths and the
//!   simulated coprocessor both run on.
//! - `pubkey` / `edwards_derive` — public-key derivation from a private
//!   scalar.
//! - `ops` — the top-level operations and the backend dispatch between
//!   them.
//! - `capabilities` — runtime capability flags, the FIPS-policy seam and
//!   per-backend usage counters.
//!
//! This crate does not implement big-integer or field arithmetic from
//! scratch, does not support curves outside the set above, and does not
//! persist or serialize keys beyond the in-memory record.

mod capabilities;
mod coprocessor;
mod cpacf;
mod curve;
mod edwards_derive;
mod endian;
mod error;
mod hash;
mod key;
mod ops;
mod os;
mod pubkey;
mod reference;
mod rng;
mod scrub;

pub use capabilities::{Backend, Capabilities, Counters, DRIVER_NOT_LOADED};
pub use curve::{Curve, CurveKind};
pub use error::Error;
pub use key::{EcKey, FieldBuf};

pub use ops::{
    ecdh, ecdsa_sign, ecdsa_verify, eckeygen, ed25519_derive_pub, ed448_derive_pub, x25519_derive_pub,
    x448_derive_pub,
};
