//! Shared-prime scan orchestration.
//!
//! Extracts the RSA moduli from a batch of DKIM records, builds one
//! product tree over them, and tests every modulus against the product
//! of all the others with a single GCD each. Indices are evaluated in
//! parallel; the tree and moduli are shared read-only and findings are
//! appended under a mutex.

use std::sync::Mutex;

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::One;
use rayon::prelude::*;

use crate::extract;
use crate::tree::ProductTree;
use crate::CompromisedKey;

/// Scan a batch of DKIM record strings for moduli with shared primes.
///
/// Records that fail to yield an RSA modulus are skipped; the surviving
/// moduli keep their extraction order, and that position is the `index`
/// reported in any finding. Bad input can only shrink the result set,
/// never fail the scan.
pub fn scan_records<S: AsRef<str>>(records: &[S]) -> Vec<CompromisedKey> {
    let moduli: Vec<BigUint> = records
        .iter()
        .filter_map(|record| extract::rsa_modulus(record.as_ref()))
        .collect();
    scan_moduli(&moduli)
}

/// Scan a batch of already-extracted moduli for shared prime factors.
///
/// Returns one [`CompromisedKey`] per modulus that shares a prime with
/// any other modulus in the batch. The set of findings is deterministic;
/// their order is not (parallel arrival order).
pub fn scan_moduli(moduli: &[BigUint]) -> Vec<CompromisedKey> {
    // A shared-factor test needs at least two samples.
    if moduli.len() < 2 {
        return Vec::new();
    }

    let tree = ProductTree::build(moduli);
    let findings: Mutex<Vec<CompromisedKey>> = Mutex::new(Vec::new());

    (0..moduli.len()).into_par_iter().for_each(|index| {
        let n = &moduli[index];
        let others = tree.cofactor(index);
        let g = n.gcd(&others);

        // g == 1: no shared factor, the common case. g == n: the modulus
        // divides the product of the others, which only happens for a
        // verbatim duplicate and recovers no factor — the strict upper
        // bound excludes it.
        if g > BigUint::one() && &g < n {
            let q = n / &g;
            let finding = CompromisedKey {
                index,
                modulus: n.clone(),
                p: g,
                q,
            };
            findings.lock().unwrap().push(finding);
        }
    });

    findings.into_inner().unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moduli(values: &[u64]) -> Vec<BigUint> {
        values.iter().map(|&v| BigUint::from(v)).collect()
    }

    fn finding_for(findings: &[CompromisedKey], index: usize) -> &CompromisedKey {
        findings
            .iter()
            .find(|f| f.index == index)
            .unwrap_or_else(|| panic!("no finding for index {}", index))
    }

    #[test]
    fn test_pairwise_coprime_batch_yields_nothing() {
        let m = moduli(&[3 * 5, 7 * 11, 13 * 17, 19 * 23]);
        assert!(scan_moduli(&m).is_empty());
    }

    #[test]
    fn test_shared_prime_pair_is_flagged_both_ways() {
        // 101 is shared between indices 0 and 1; index 2 is independent.
        let m = moduli(&[101 * 103, 101 * 107, 11 * 13]);
        let findings = scan_moduli(&m);
        assert_eq!(findings.len(), 2);

        let first = finding_for(&findings, 0);
        assert_eq!(first.p, BigUint::from(101u64));
        assert_eq!(first.q, BigUint::from(103u64));
        assert_eq!(&first.p * &first.q, first.modulus);

        let second = finding_for(&findings, 1);
        assert_eq!(second.p, BigUint::from(101u64));
        assert_eq!(second.q, BigUint::from(107u64));
        assert_eq!(&second.p * &second.q, second.modulus);
    }

    #[test]
    fn test_shared_prime_in_odd_sized_batch() {
        // The shared pair sits at the tail where carry-forward applies.
        let m = moduli(&[11 * 13, 17 * 19, 23 * 29, 101 * 103, 101 * 107]);
        let findings = scan_moduli(&m);
        assert_eq!(findings.len(), 2);
        assert_eq!(finding_for(&findings, 3).p, BigUint::from(101u64));
        assert_eq!(finding_for(&findings, 4).p, BigUint::from(101u64));
    }

    #[test]
    fn test_duplicate_modulus_is_not_reported() {
        // gcd(n, cofactor) == n for a verbatim duplicate; excluded by
        // the strict bound, so nothing useful is reported.
        let m = moduli(&[3 * 5, 3 * 5, 7 * 11]);
        assert!(scan_moduli(&m).is_empty());
    }

    #[test]
    fn test_empty_and_single_batches() {
        assert!(scan_moduli(&[]).is_empty());
        assert!(scan_moduli(&moduli(&[3 * 5])).is_empty());
    }

    #[test]
    fn test_bit_length_of_finding() {
        let m = moduli(&[101 * 103, 101 * 107]);
        let findings = scan_moduli(&m);
        let first = finding_for(&findings, 0);
        assert_eq!(first.bit_length(), BigUint::from(101u64 * 103).bits());
    }

    #[test]
    fn test_records_with_non_rsa_entries_are_excluded() {
        // One RSA record plus one ed25519 record leaves a single usable
        // modulus, so the scan short-circuits to empty.
        let records = vec![
            "v=DKIM1; k=rsa; p=MFwwDQYJKoZIhvcNAQEBBQADSwAwSAJBAMBe7mWbuirQNM7FLN9MEPLZquGCdNUq8EZMPEHWudxWVpQ0Gbgkq5CXJkqubPCrplFXjSQWT9ASj7A1hh7I17kCAwEAAQ==".to_string(),
            "v=DKIM1; k=ed25519; p=11qYAYKxCrfVS/7TyWQHOg7hcvPapiMlrwIaaPcHURo=".to_string(),
        ];
        assert!(scan_records(&records).is_empty());
    }
}
