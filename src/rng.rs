// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Key-derived randomness.
//!
//! Every pseudo-random draw in the codec (watermark bits, the scrambling
//! permutation, per-block coefficient positions) goes through a [`KeyRng`]
//! constructed from an explicit integer seed. There is no shared generator:
//! two derivations with the same seed produce the same stream no matter what
//! was drawn before, on which thread, or in which order.
//!
//! # Cross-platform portability
//!
//! All ranges are drawn as `u32` (never `usize`). `usize` is 32-bit on WASM
//! but 64-bit on native, which would make `gen_range` consume different
//! amounts of ChaCha output per draw and silently change every watermark.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

/// A ChaCha20 stream seeded from a single signed integer.
pub struct KeyRng {
    inner: ChaCha20Rng,
}

impl KeyRng {
    /// Seed a fresh generator. Negative seeds are reinterpreted bitwise.
    pub fn new(seed: i64) -> Self {
        Self { inner: ChaCha20Rng::seed_from_u64(seed as u64) }
    }

    /// Draw a single bit (0 or 1).
    pub fn next_bit(&mut self) -> u8 {
        self.inner.gen_range(0..2u32) as u8
    }

    /// Draw a uniform permutation of `0..n` (Fisher-Yates).
    pub fn permutation(&mut self, n: usize) -> Vec<usize> {
        let mut perm: Vec<usize> = (0..n).collect();
        for i in (1..n).rev() {
            let j = self.inner.gen_range(0..=(i as u32)) as usize;
            perm.swap(i, j);
        }
        perm
    }

    /// Draw `k` distinct indices from `0..n` without replacement.
    ///
    /// Runs the first `k` steps of a forward Fisher-Yates shuffle, so the
    /// result is in draw order, not sorted.
    pub fn sample_distinct(&mut self, n: usize, k: usize) -> Vec<usize> {
        assert!(k <= n, "cannot draw {k} distinct values from {n}");
        let mut pool: Vec<usize> = (0..n).collect();
        for i in 0..k {
            let j = i + self.inner.gen_range(0..((n - i) as u32)) as usize;
            pool.swap(i, j);
        }
        pool.truncate(k);
        pool
    }
}
