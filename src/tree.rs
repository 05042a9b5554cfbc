//! Product tree over a batch of moduli.
//!
//! Level 0 holds the moduli in input order; each level above it holds
//! the pairwise products of its neighbors, with an unpaired final
//! element carried forward unchanged. The top level is the product of
//! the whole batch. The flat level-indexed layout makes the sibling of
//! position `i` simply `i ^ 1`, and the parent `i >> 1`.

use num_bigint::BigUint;
use num_traits::One;

/// Level-indexed product tree. Immutable once built.
#[derive(Debug, Clone)]
pub struct ProductTree {
    levels: Vec<Vec<BigUint>>,
}

impl ProductTree {
    /// Build the tree over `moduli`, preserving input order at level 0.
    ///
    /// Deterministic and free of shared state. A meaningful cofactor
    /// needs at least two leaves; the scanner enforces that before
    /// calling in.
    pub fn build(moduli: &[BigUint]) -> ProductTree {
        let mut levels = vec![moduli.to_vec()];

        while levels.last().map_or(false, |level| level.len() > 1) {
            let next: Vec<BigUint> = levels
                .last()
                .unwrap()
                .chunks(2)
                .map(|pair| {
                    if pair.len() == 2 {
                        &pair[0] * &pair[1]
                    } else {
                        pair[0].clone()
                    }
                })
                .collect();
            levels.push(next);
        }

        ProductTree { levels }
    }

    /// Number of leaves (input moduli).
    pub fn num_leaves(&self) -> usize {
        self.levels[0].len()
    }

    /// Number of levels, including the leaf level.
    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    /// The product of all leaves.
    ///
    /// Panics if the tree was built over an empty batch.
    pub fn root(&self) -> &BigUint {
        let top = self.levels.last().unwrap();
        assert!(!top.is_empty(), "product tree built over an empty batch");
        &top[0]
    }

    /// The product of every leaf except the one at `index`.
    ///
    /// Walks from the leaf toward the root, multiplying in the sibling
    /// subtree at each level. The sibling subtrees along the path
    /// partition the other leaves exactly, so no leaf is counted twice
    /// or missed — including at levels where the current position is an
    /// unpaired carry-forward, which simply contributes no factor. No
    /// modular reduction is applied on the way up, so the result is the
    /// full (N-1)-modulus product.
    ///
    /// Panics if `index` is not a valid leaf position.
    pub fn cofactor(&self, index: usize) -> BigUint {
        assert!(
            index < self.num_leaves(),
            "leaf index {} out of range for {} leaves",
            index,
            self.num_leaves()
        );

        let mut product = BigUint::one();
        let mut idx = index;
        for level in &self.levels {
            let sibling = idx ^ 1;
            if let Some(value) = level.get(sibling) {
                product *= value;
            }
            idx >>= 1;
        }
        product
    }
}
