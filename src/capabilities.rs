//! Runtime capability flags and per-backend usage counters.
//!
//! Flags are read-only after library initialization: a caller builds one
//! [`Capabilities`] value at process start and passes it by reference
//! into every top-level operation.

use std::sync::atomic::{AtomicU64, Ordering};

/// Adapter handle value meaning the coprocessor driver never came up.
pub const DRIVER_NOT_LOADED: i32 = -1;

/// Runtime capability flags consulted by the dispatcher.
#[derive(Debug, Clone, Copy)]
pub struct Capabilities {
    /// The MSA 9 instruction family (curve-specific PCC/KDSA function
    /// codes) is available.
    pub msa9_switch: bool,
    /// A coprocessor card is reachable.
    pub ecc_via_online_card: bool,
    /// Force the coprocessor path even when the CPU path is available.
    pub ica_offload_enabled: bool,
    /// Open coprocessor adapter handle, or [`DRIVER_NOT_LOADED`].
    pub adapter: i32,
    /// FIPS mode is required by policy. This crate does not implement
    /// FIPS policy itself, only the seam a caller's policy layer hooks
    /// into: when set, an operation that would otherwise run on a
    /// disallowed path returns [`crate::Error::PolicyDenied`] instead.
    pub fips_required: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            msa9_switch: false,
            ecc_via_online_card: false,
            ica_offload_enabled: false,
            adapter: DRIVER_NOT_LOADED,
            fips_required: false,
        }
    }
}

/// Which backend serviced (or attempted) an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Cpacf,
    Coprocessor,
    SoftwareFallback,
}

/// Per-backend invocation counters. Populated by the dispatcher, never
/// read internally; a caller wires these into its own metrics surface.
#[derive(Default)]
pub struct Counters {
    cpacf_ok: AtomicU64,
    cpacf_err: AtomicU64,
    coprocessor_ok: AtomicU64,
    coprocessor_err: AtomicU64,
    software_ok: AtomicU64,
    software_err: AtomicU64,
}

impl Counters {
    pub fn record(&self, backend: Backend, ok: bool) {
        let counter = match (backend, ok) {
            (Backend::Cpacf, true) => &self.cpacf_ok,
            (Backend::Cpacf, false) => &self.cpacf_err,
            (Backend::Coprocessor, true) => &self.coprocessor_ok,
            (Backend::Coprocessor, false) => &self.coprocessor_err,
            (Backend::SoftwareFallback, true) => &self.software_ok,
            (Backend::SoftwareFallback, false) => &self.software_err,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> [(&'static str, u64); 6] {
        [
            ("cpacf_ok", self.cpacf_ok.load(Ordering::Relaxed)),
            ("cpacf_err", self.cpacf_err.load(Ordering::Relaxed)),
            ("coprocessor_ok", self.coprocessor_ok.load(Ordering::Relaxed)),
            ("coprocessor_err", self.coprocessor_err.load(Ordering::Relaxed)),
            ("software_ok", self.software_ok.load(Ordering::Relaxed)),
            ("software_err", self.software_err.load(Ordering::Relaxed)),
        ]
    }
}
