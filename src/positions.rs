// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Per-block coefficient position selection.
//!
//! Each block carries its bit in [`POSITIONS_PER_BLOCK`] coefficients chosen
//! from the 63 AC positions (DC is never touched). The choice is seeded with
//! `key + POS_OFFSET + i * BLOCK_STRIDE + j`, so it depends only on the key
//! and the block index: blocks may be visited in any order or in parallel.

use crate::config::{WatermarkKey, BLOCK_STRIDE, POSITIONS_PER_BLOCK, POS_OFFSET};
use crate::rng::KeyRng;

/// `(row, col)` inside an 8×8 block.
pub type Coord = (usize, usize);

/// The 63 AC coordinates in row-major order (DC excluded).
const AC_CANDIDATES: [Coord; 63] = {
    let mut out = [(0usize, 0usize); 63];
    let mut k = 0;
    let mut idx = 1;
    while idx < 64 {
        out[k] = (idx / 8, idx % 8);
        k += 1;
        idx += 1;
    }
    out
};

/// PRNG seed for block `(i, j)`.
pub fn block_seed(i: usize, j: usize, key: WatermarkKey) -> i64 {
    key.seed(POS_OFFSET)
        .wrapping_add((i as i64).wrapping_mul(BLOCK_STRIDE))
        .wrapping_add(j as i64)
}

/// Select the embedding coordinates for block `(i, j)`.
pub fn positions(i: usize, j: usize, key: WatermarkKey) -> [Coord; POSITIONS_PER_BLOCK] {
    let mut rng = KeyRng::new(block_seed(i, j, key));
    let picks = rng.sample_distinct(AC_CANDIDATES.len(), POSITIONS_PER_BLOCK);
    let mut out = [(0, 0); POSITIONS_PER_BLOCK];
    for (slot, &k) in out.iter_mut().zip(&picks) {
        *slot = AC_CANDIDATES[k];
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn candidates_exclude_dc() {
        assert!(!AC_CANDIDATES.contains(&(0, 0)));
        assert_eq!(AC_CANDIDATES[0], (0, 1));
        assert_eq!(AC_CANDIDATES[62], (7, 7));
        let unique: HashSet<_> = AC_CANDIDATES.iter().collect();
        assert_eq!(unique.len(), 63);
    }

    #[test]
    fn distinct_and_never_dc() {
        let key = WatermarkKey::new(12345);
        for i in 0..20 {
            for j in 0..20 {
                let p = positions(i, j, key);
                assert!(p.iter().all(|&c| c != (0, 0)));
                assert!(p.iter().all(|&(r, c)| r < 8 && c < 8));
                assert!(p[0] != p[1] && p[0] != p[2] && p[1] != p[2], "block ({i},{j}): {p:?}");
            }
        }
    }

    #[test]
    fn independent_of_call_order() {
        let key = WatermarkKey::new(99);
        let first = positions(3, 4, key);
        for i in (0..10).rev() {
            for j in 0..10 {
                positions(i, j, key);
            }
        }
        assert_eq!(positions(3, 4, key), first);
    }

    #[test]
    fn seeds_unique_within_stride() {
        let key = WatermarkKey::new(0);
        let mut seen = HashSet::new();
        for i in 0..50 {
            for j in 0..(BLOCK_STRIDE as usize) {
                assert!(seen.insert(block_seed(i, j, key)), "collision at ({i},{j})");
            }
        }
    }

    #[test]
    fn blocks_get_varied_positions() {
        let key = WatermarkKey::new(5);
        let distinct: HashSet<_> = (0..64).map(|j| positions(0, j, key)).collect();
        assert!(distinct.len() > 50, "only {} distinct selections", distinct.len());
    }
}
