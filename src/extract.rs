//! RSA modulus extraction from DKIM key records.
//!
//! Thin adapter between record parsing and the scanner: a record string
//! goes in, an arbitrary-precision modulus comes out, or nothing at all.
//! Every failure mode (unparsable record, non-RSA key, corrupt payload)
//! is absorbed here — a bad record can shrink the batch but never abort
//! a scan.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::{debug, warn};
use num_bigint::BigUint;
use rsa::pkcs8::DecodePublicKey;
use rsa::traits::PublicKeyParts;
use rsa::RsaPublicKey;

use crate::record::{KeyRecord, KeyType};

/// The conventional RSA public exponent, the Fermat prime F4.
pub const STANDARD_EXPONENT: u32 = 65537;

/// Extract the RSA modulus from a DKIM key record string.
///
/// Returns `None` for records that are unparsable, not RSA-typed, or
/// carry a payload that does not decode as a SubjectPublicKeyInfo. A
/// non-standard public exponent is logged as a warning but does not
/// reject the key: a weak exponent is a separate signal, and the modulus
/// is still worth scanning.
pub fn rsa_modulus(record: &str) -> Option<BigUint> {
    let parsed = match KeyRecord::parse(record) {
        Ok(parsed) => parsed,
        Err(err) => {
            debug!("skipping record: {}", err);
            return None;
        }
    };

    if parsed.key_type != KeyType::Rsa {
        debug!("skipping non-RSA key record (k={})", parsed.key_type);
        return None;
    }

    let key_bytes = match STANDARD.decode(&parsed.public_key_data) {
        Ok(bytes) => bytes,
        Err(err) => {
            debug!("skipping record with undecodable p= payload: {}", err);
            return None;
        }
    };

    let key = match RsaPublicKey::from_public_key_der(&key_bytes) {
        Ok(key) => key,
        Err(err) => {
            debug!("skipping record with malformed public key info: {}", err);
            return None;
        }
    };

    // The rsa crate carries its own bignum type; round-trip through
    // big-endian bytes to get back onto num-bigint.
    let n = BigUint::from_bytes_be(&key.n().to_bytes_be());
    let e = BigUint::from_bytes_be(&key.e().to_bytes_be());

    if e != BigUint::from(STANDARD_EXPONENT) {
        warn!("non-standard public exponent detected: {}", e);
    }

    Some(n)
}
