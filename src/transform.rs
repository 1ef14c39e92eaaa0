// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Orthonormal 8×8 DCT-II / DCT-III.
//!
//! Blocks are 64 values in natural (row-major) order, index = row * 8 + col.
//! Both directions are separable and share one cosine table; with the
//! orthonormal scaling `C(0) = 1/sqrt(8)`, `C(u>0) = 1/2` the inverse is the
//! exact transpose of the forward transform, so a round trip reproduces the
//! input up to floating-point rounding (well below 1e-9 for pixel data).
//! No level shift is applied.
//!
//! The table uses the platform's `f64::cos`, which may differ between libm
//! implementations in the last ulp. That cannot change results: pixels are
//! re-quantized to u8 after the inverse, and extraction has a margin of
//! `delta / 4` against perturbations many orders of magnitude larger.

use std::sync::OnceLock;

/// A block of 64 samples or coefficients in natural order.
pub type Block = [f64; 64];

/// `COSINE[u][x] = C(u) * cos((2x + 1) * u * PI / 16)`, normalization folded in.
static COSINE: OnceLock<[[f64; 8]; 8]> = OnceLock::new();

fn basis() -> &'static [[f64; 8]; 8] {
    COSINE.get_or_init(|| {
        let mut table = [[0.0f64; 8]; 8];
        for (u, row) in table.iter_mut().enumerate() {
            let c = if u == 0 { 1.0 / 8.0f64.sqrt() } else { 0.5 };
            for (x, v) in row.iter_mut().enumerate() {
                *v = c * ((2 * x + 1) as f64 * u as f64 * std::f64::consts::PI / 16.0).cos();
            }
        }
        table
    })
}

/// Forward 2D DCT-II: rows, then columns.
pub fn forward(pixels: &Block) -> Block {
    let cos = basis();

    let mut temp = [0.0f64; 64];
    for row in 0..8 {
        for u in 0..8 {
            let mut sum = 0.0;
            for x in 0..8 {
                sum += pixels[row * 8 + x] * cos[u][x];
            }
            temp[row * 8 + u] = sum;
        }
    }

    let mut coeffs = [0.0f64; 64];
    for col in 0..8 {
        for v in 0..8 {
            let mut sum = 0.0;
            for y in 0..8 {
                sum += temp[y * 8 + col] * cos[v][y];
            }
            coeffs[v * 8 + col] = sum;
        }
    }
    coeffs
}

/// Inverse 2D DCT (DCT-III): columns, then rows.
pub fn inverse(coeffs: &Block) -> Block {
    let cos = basis();

    let mut temp = [0.0f64; 64];
    for col in 0..8 {
        for y in 0..8 {
            let mut sum = 0.0;
            for v in 0..8 {
                sum += coeffs[v * 8 + col] * cos[v][y];
            }
            temp[y * 8 + col] = sum;
        }
    }

    let mut pixels = [0.0f64; 64];
    for row in 0..8 {
        for x in 0..8 {
            let mut sum = 0.0;
            for u in 0..8 {
                sum += temp[row * 8 + u] * cos[u][x];
            }
            pixels[row * 8 + x] = sum;
        }
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn flat_block_is_dc_only() {
        let block = [100.0; 64];
        let coeffs = forward(&block);
        // DC = 8 * mean for the orthonormal 2D DCT.
        assert!((coeffs[0] - 800.0).abs() < 1e-9, "dc={}", coeffs[0]);
        for (i, c) in coeffs.iter().enumerate().skip(1) {
            assert!(c.abs() < 1e-9, "AC {i} = {c}");
        }
    }

    #[test]
    fn single_coefficient_is_basis_image() {
        let mut coeffs = [0.0; 64];
        coeffs[1] = 1.0; // (0, 1): horizontal half-cycle
        let px = inverse(&coeffs);
        // Energy preserved: sum of squares == 1.
        let energy: f64 = px.iter().map(|p| p * p).sum();
        assert!((energy - 1.0).abs() < 1e-12);
        // Every row identical; columns decrease left to right.
        for row in 1..8 {
            for col in 0..8 {
                assert!((px[row * 8 + col] - px[col]).abs() < 1e-12);
            }
        }
        assert!(px[0] > px[7]);
    }

    #[test]
    fn gradient_roundtrip() {
        let mut block = [0.0; 64];
        for (i, v) in block.iter_mut().enumerate() {
            *v = ((i * 37) % 256) as f64;
        }
        let back = inverse(&forward(&block));
        for i in 0..64 {
            assert!((back[i] - block[i]).abs() < 1e-9, "index {i}");
        }
    }

    proptest! {
        #[test]
        fn roundtrip_within_epsilon(vals in prop::collection::vec(0.0f64..=255.0, 64)) {
            let mut px = [0.0; 64];
            px.copy_from_slice(&vals);
            let back = inverse(&forward(&px));
            for i in 0..64 {
                prop_assert!((back[i] - px[i]).abs() <= 1e-6);
            }
        }

        #[test]
        fn forward_preserves_energy(vals in prop::collection::vec(-1000.0f64..1000.0, 64)) {
            let mut px = [0.0; 64];
            px.copy_from_slice(&vals);
            let c = forward(&px);
            let e_px: f64 = px.iter().map(|v| v * v).sum();
            let e_c: f64 = c.iter().map(|v| v * v).sum();
            prop_assert!((e_px - e_c).abs() <= 1e-6 * e_px.max(1.0));
        }
    }
}
