//! Deterministic fingerprints of specialization chains.
//!
//! A [`Fingerprint`] summarizes a declaration together with every ancestor it
//! inherits from and the way its chain ends. Equal fingerprints mean the chain
//! resolution result can be reused; any edit along the chain changes it.
//!
//! Uses XXHash64 with domain markers so that, e.g., a chain ending at a base
//! and a chain ending at a missing ancestor never mix.

use std::fmt;
use std::hash::{Hash, Hasher};

use xxhash_rust::xxh64::Xxh64;

/// Domain markers mixed in per chain element.
pub mod fingerprint_constants {
    /// Marker for a declaration link of the chain.
    pub const LINK: u64 = 0x2fac10b63a6cc57c;

    /// Chain ends at a base declaration.
    pub const ROOT: u64 = 0x5ea77ffbcdf5f302;

    /// Chain ends at an ancestor that is not declared.
    pub const MISSING: u64 = 0x7d3c8b4a92e15f6d;

    /// Chain ends at an already-resolved (foreign) ancestor.
    pub const RESOLVED: u64 = 0x3e9f5d2a8c7b1403;

    /// Chain loops back on itself.
    pub const CYCLE: u64 = 0x9a7f3d5e2b8c4601;
}

/// A 64-bit chain fingerprint.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Fingerprint(pub u64);

impl Fingerprint {
    pub const EMPTY: Fingerprint = Fingerprint(0);
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({:#018x})", self.0)
    }
}

/// Incremental fingerprint builder.
pub struct FingerprintBuilder {
    hasher: Xxh64,
}

impl FingerprintBuilder {
    pub fn new() -> Self {
        Self {
            hasher: Xxh64::new(0),
        }
    }

    /// Mix in one element under a domain marker.
    pub fn mix<T: Hash + ?Sized>(&mut self, marker: u64, value: &T) -> &mut Self {
        self.hasher.write_u64(marker);
        value.hash(&mut self.hasher);
        self
    }

    /// Mix in a bare domain marker.
    pub fn mark(&mut self, marker: u64) -> &mut Self {
        self.hasher.write_u64(marker);
        self
    }

    pub fn finish(&self) -> Fingerprint {
        Fingerprint(self.hasher.finish())
    }
}

impl Default for FingerprintBuilder {
    fn default() -> Self {
        Self::new()
    }
}
