// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Key-derived watermark pattern and its scrambling permutation.
//!
//! The pattern has one bit per 8×8 block of the padded luminance plane. It is
//! never stored: the verifier regenerates it from the key and the image
//! shape. Before embedding, the bits are scrambled by a permutation drawn
//! from a second seed (`key + PERM_OFFSET`) so that neighbouring blocks do
//! not carry correlated bits.

use crate::config::{WatermarkKey, PERM_OFFSET};
use crate::error::{Result, WatermarkError};
use crate::rng::KeyRng;

/// Row-major grid of bits, one per block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitMatrix {
    rows: usize,
    cols: usize,
    bits: Vec<u8>,
}

impl BitMatrix {
    /// All-zero matrix.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self { rows, cols, bits: vec![0; rows * cols] }
    }

    /// Wrap an existing row-major bit vector. Values other than 0 are
    /// normalized to 1.
    pub fn from_vec(rows: usize, cols: usize, bits: Vec<u8>) -> Result<Self> {
        if bits.len() != rows * cols {
            return Err(WatermarkError::ShapeMismatch {
                expected: (rows, cols),
                got: (bits.len() / cols.max(1), cols),
            });
        }
        let bits = bits.into_iter().map(|b| (b != 0) as u8).collect();
        Ok(Self { rows, cols, bits })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn get(&self, i: usize, j: usize) -> u8 {
        self.bits[self.index(i, j)]
    }

    pub fn set(&mut self, i: usize, j: usize, bit: u8) {
        let idx = self.index(i, j);
        self.bits[idx] = (bit != 0) as u8;
    }

    /// Flat row-major view.
    pub fn as_slice(&self) -> &[u8] {
        &self.bits
    }

    /// Rows as nested vectors, for JSON-style audit output.
    pub fn to_rows(&self) -> Vec<Vec<u8>> {
        self.bits.chunks(self.cols.max(1)).map(<[u8]>::to_vec).collect()
    }

    /// Number of positions where `self` and `other` disagree.
    pub fn hamming_distance(&self, other: &BitMatrix) -> Result<usize> {
        if self.shape() != other.shape() {
            return Err(WatermarkError::ShapeMismatch { expected: self.shape(), got: other.shape() });
        }
        Ok(self.bits.iter().zip(&other.bits).filter(|(a, b)| a != b).count())
    }

    /// Fraction of mismatched bits, in `[0, 1]`. An empty pair has BER 0.
    pub fn bit_error_rate(&self, other: &BitMatrix) -> Result<f64> {
        let errors = self.hamming_distance(other)?;
        if self.is_empty() {
            return Ok(0.0);
        }
        Ok(errors as f64 / self.len() as f64)
    }

    fn index(&self, i: usize, j: usize) -> usize {
        debug_assert!(i < self.rows, "row {i} >= {}", self.rows);
        debug_assert!(j < self.cols, "col {j} >= {}", self.cols);
        i * self.cols + j
    }
}

/// A generated watermark: the raw bits, the scrambled bits that actually get
/// embedded, and the permutation linking them (`scrambled[k] = bits[perm[k]]`).
#[derive(Debug, Clone)]
pub struct Watermark {
    pub bits: BitMatrix,
    pub scrambled: BitMatrix,
    pub permutation: Vec<usize>,
}

impl Watermark {
    /// Undo the scrambling of an observed matrix, yielding bits comparable
    /// to [`Watermark::bits`].
    pub fn unscramble(&self, observed: &BitMatrix) -> Result<BitMatrix> {
        if observed.shape() != self.scrambled.shape() {
            return Err(WatermarkError::ShapeMismatch {
                expected: self.scrambled.shape(),
                got: observed.shape(),
            });
        }
        let mut out = BitMatrix::zeros(observed.rows(), observed.cols());
        for (k, &src) in self.permutation.iter().enumerate() {
            out.bits[src] = observed.bits[k];
        }
        Ok(out)
    }
}

/// Generate the watermark for a block grid of `shape = (rows, cols)`.
///
/// Deterministic in `(shape, key)`.
pub fn generate(shape: (usize, usize), key: WatermarkKey) -> Watermark {
    let (rows, cols) = shape;
    let n = rows * cols;

    let mut bit_rng = KeyRng::new(key.value());
    let raw: Vec<u8> = (0..n).map(|_| bit_rng.next_bit()).collect();

    let permutation = KeyRng::new(key.seed(PERM_OFFSET)).permutation(n);
    let scrambled: Vec<u8> = permutation.iter().map(|&src| raw[src]).collect();

    Watermark {
        bits: BitMatrix { rows, cols, bits: raw },
        scrambled: BitMatrix { rows, cols, bits: scrambled },
        permutation,
    }
}
