//! Batch-GCD detection of shared-prime RSA keys in DKIM DNS records.
//!
//! RSA moduli generated with a flawed random-number source can end up
//! sharing a prime factor with another key in the wild. Any two such
//! moduli are factored instantly by a single GCD, with no factoring
//! effort at all. This crate scans a batch of DKIM TXT key records for
//! exactly that failure: it extracts every RSA modulus, builds a product
//! tree over the batch, and tests each modulus against the product of
//! all the others.
//!
//! The scan uses a simplified product tree rather than the full
//! remainder-tree batch-GCD: cofactors are accumulated without modular
//! reduction on the walk to the root. That keeps the implementation
//! small at the cost of larger intermediate products, which is fine for
//! batches of tens to low thousands of keys.

pub mod extract;
pub mod keygen;
pub mod record;
pub mod scan;
pub mod tree;

use num_bigint::BigUint;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

pub use scan::{scan_moduli, scan_records};
pub use tree::ProductTree;

/// A key flagged by the scanner: its modulus shares a prime factor with
/// at least one other modulus in the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompromisedKey {
    /// Position of the modulus in the scanned batch (extraction order).
    pub index: usize,
    /// The full RSA modulus.
    pub modulus: BigUint,
    /// The recovered shared prime factor.
    pub p: BigUint,
    /// The recovered cofactor, `modulus / p`.
    pub q: BigUint,
}

impl CompromisedKey {
    /// Bit length of the compromised modulus.
    pub fn bit_length(&self) -> u64 {
        self.modulus.bits()
    }
}

// Big integers serialize as decimal strings so the output stays readable
// by downstream tooling regardless of bignum library.
impl Serialize for CompromisedKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("CompromisedKey", 5)?;
        state.serialize_field("index", &self.index)?;
        state.serialize_field("modulus", &self.modulus.to_string())?;
        state.serialize_field("p", &self.p.to_string())?;
        state.serialize_field("q", &self.q.to_string())?;
        state.serialize_field("bit_length", &self.bit_length())?;
        state.end()
    }
}
