//! Deliberately weak demonstration keys.
//!
//! Builders for the kinds of keys the scanner is meant to catch: batches
//! whose moduli share a prime factor (simulating an RNG collision at key
//! generation time) and keys with legacy public exponents. These exist
//! for the demo binary and the test suite; the detection path never
//! calls into this module.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use num_bigint::{BigUint, RandBigInt};
use num_integer::Integer;
use num_traits::One;
use rand::Rng;
use rsa::pkcs8::EncodePublicKey;
use rsa::RsaPublicKey;

use crate::extract::STANDARD_EXPONENT;

/// Miller-Rabin rounds used for fixture primes. More than enough for
/// test-sized candidates.
const MR_ROUNDS: u32 = 25;

/// Generate a random probable prime of exactly `bits` bits.
pub fn random_prime(bits: u64, rng: &mut impl Rng) -> BigUint {
    assert!(bits >= 8, "prime too small for an RSA factor");
    loop {
        let mut candidate = rng.gen_biguint(bits);
        // Pin the width and force the candidate odd.
        candidate.set_bit(bits - 1, true);
        candidate.set_bit(0, true);
        if is_probably_prime(&candidate, MR_ROUNDS, rng) {
            return candidate;
        }
    }
}

/// Miller-Rabin probabilistic primality test.
pub fn is_probably_prime(n: &BigUint, rounds: u32, rng: &mut impl Rng) -> bool {
    let one = BigUint::one();
    let two = BigUint::from(2u32);
    let three = BigUint::from(3u32);

    if *n < two {
        return false;
    }
    // 2 and 3 are prime but leave no room to draw a witness from [2, n-2].
    if *n == two || *n == three {
        return true;
    }
    if n.is_even() {
        return false;
    }

    // n - 1 = 2^r * d with d odd
    let n_minus_1 = n - &one;
    let mut d = n_minus_1.clone();
    let mut r = 0u32;
    while d.is_even() {
        d >>= 1u32;
        r += 1;
    }

    'witness: for _ in 0..rounds {
        let a = rng.gen_biguint_range(&two, &n_minus_1);
        let mut x = a.modpow(&d, n);
        if x == one || x == n_minus_1 {
            continue 'witness;
        }
        for _ in 0..r - 1 {
            x = x.modpow(&two, n);
            if x == n_minus_1 {
                continue 'witness;
            }
        }
        return false;
    }

    true
}

/// Format an RSA public key as a publishable DKIM TXT record.
///
/// Encodes (n, e) as a DER SubjectPublicKeyInfo via the `rsa` crate and
/// wraps the base64 in `v=DKIM1; k=rsa; p=...`.
pub fn dkim_record(n: &BigUint, e: &BigUint) -> String {
    let key = RsaPublicKey::new(
        rsa::BigUint::from_bytes_be(&n.to_bytes_be()),
        rsa::BigUint::from_bytes_be(&e.to_bytes_be()),
    )
    .expect("fixture components do not form a valid RSA public key");
    let der = key
        .to_public_key_der()
        .expect("SPKI encoding of a valid public key");
    format!("v=DKIM1; k=rsa; p={}", STANDARD.encode(der.as_bytes()))
}

/// A properly generated RSA key record of roughly `bits` modulus width,
/// with the standard exponent. Useful as an independent control key in
/// a batch of weak ones.
pub fn rsa_record(bits: u64, rng: &mut impl Rng) -> String {
    let e = BigUint::from(STANDARD_EXPONENT);
    let p = usable_prime(bits / 2, &e, rng);
    let q = distinct_usable_prime(bits / 2, &e, &[p.clone()], rng);
    dkim_record(&(&p * &q), &e)
}

/// A batch of `count` key records whose moduli all share one secret
/// prime, as if every key was generated on a device with the same
/// stuck RNG. Every index of the batch is recoverable by the scanner.
pub fn shared_prime_records(bits: u64, count: usize, rng: &mut impl Rng) -> Vec<String> {
    assert!(count >= 2, "a shared-prime batch needs at least two keys");
    let e = BigUint::from(STANDARD_EXPONENT);
    let shared = usable_prime(bits / 2, &e, rng);

    let mut used = vec![shared.clone()];
    (0..count)
        .map(|_| {
            let q = distinct_usable_prime(bits / 2, &e, &used, rng);
            used.push(q.clone());
            dkim_record(&(&shared * &q), &e)
        })
        .collect()
}

/// A key record with a non-standard (legacy) public exponent such as 3
/// or 17. The modulus itself is sound; extraction should warn but still
/// accept it.
pub fn legacy_exponent_record(bits: u64, exponent: u32, rng: &mut impl Rng) -> String {
    assert!(
        exponent >= 3 && exponent % 2 == 1,
        "public exponent must be an odd integer >= 3"
    );
    let e = BigUint::from(exponent);
    let p = usable_prime(bits / 2, &e, rng);
    let q = distinct_usable_prime(bits / 2, &e, &[p.clone()], rng);
    dkim_record(&(&p * &q), &e)
}

/// A prime p with p - 1 coprime to e, so e is a valid exponent for any
/// modulus containing p.
fn usable_prime(bits: u64, e: &BigUint, rng: &mut impl Rng) -> BigUint {
    let one = BigUint::one();
    loop {
        let p = random_prime(bits, rng);
        if (&p - &one).gcd(e).is_one() {
            return p;
        }
    }
}

fn distinct_usable_prime(
    bits: u64,
    e: &BigUint,
    excluded: &[BigUint],
    rng: &mut impl Rng,
) -> BigUint {
    loop {
        let q = usable_prime(bits, e, rng);
        if !excluded.contains(&q) {
            return q;
        }
    }
}
