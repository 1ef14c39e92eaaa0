// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Typed parameters and the fixed constants shared by embedder and verifier.
//!
//! Every value that can arrive from outside (key, delta, mode) is parsed and
//! validated here, once, before it reaches the block loop. The constants
//! below must be identical between the deployment that embeds and the one
//! that verifies; changing any of them invalidates all existing watermarks.

use std::str::FromStr;

use crate::error::{Result, WatermarkError};

/// Seed offset separating the scrambling permutation from the bit draws.
pub const PERM_OFFSET: i64 = 54_321;

/// Seed offset for per-block coefficient positions.
pub const POS_OFFSET: i64 = 98_765;

/// Seed stride between block rows. Must exceed the widest block row, see
/// [`MAX_DIMENSION`].
pub const BLOCK_STRIDE: i64 = 1_000;

/// Number of DCT coefficients carrying each watermark bit.
pub const POSITIONS_PER_BLOCK: usize = 3;

/// Block edge length in pixels.
pub const BLOCK_SIZE: usize = 8;

/// Detection threshold: an image is watermarked iff its BER is below this.
pub const BER_THRESHOLD: f64 = 0.3;

/// Step added to delta after each failed embedding attempt.
pub const DELTA_INCREMENT: f64 = 0.25;

/// Maximum embedding attempts before the search gives up.
pub const MAX_ITERATIONS: u32 = 10;

/// Candidate deltas on each side of the centre delta during detection.
pub const DETECT_RADIUS: u32 = 2;

/// Upper bound on `detect_radius`; each candidate is a full extraction.
pub const MAX_DETECT_RADIUS: u32 = 64;

/// Upper bound on the number of deltas a sweep may try.
pub const MAX_SWEEP_TRIALS: usize = 1_000;

/// Adaptive delta: luma standard deviation is divided by this factor.
pub const ADAPTIVE_FACTOR: f64 = 10.0;

/// Adaptive delta floor for low-contrast images.
pub const MIN_DELTA: f64 = 2.0;

/// Maximum width or height in pixels. 8000px is 1000 blocks, so block
/// seeds `i * BLOCK_STRIDE + j` never alias.
pub const MAX_DIMENSION: u32 = 8_000;

/// Maximum total pixel count (width × height).
pub const MAX_PIXELS: u64 = 40_000_000;

/// Validate image dimensions before any heavy processing.
///
/// # Errors
/// - [`WatermarkError::EmptyImage`] if either dimension is zero.
/// - [`WatermarkError::ImageTooLarge`] if a side exceeds 8000px or the total
///   exceeds 40M pixels.
pub fn validate_dimensions(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(WatermarkError::EmptyImage);
    }
    if width > MAX_DIMENSION || height > MAX_DIMENSION || width as u64 * height as u64 > MAX_PIXELS {
        return Err(WatermarkError::ImageTooLarge { width, height });
    }
    Ok(())
}

/// The watermark secret: a plain integer PRNG seed, not key material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatermarkKey(i64);

impl WatermarkKey {
    pub const fn new(key: i64) -> Self {
        Self(key)
    }

    pub const fn value(self) -> i64 {
        self.0
    }

    /// Seed for a derivation offset from the key. Wraps on overflow so
    /// keys near `i64::MAX` still work.
    pub const fn seed(self, offset: i64) -> i64 {
        self.0.wrapping_add(offset)
    }
}

impl From<i64> for WatermarkKey {
    fn from(key: i64) -> Self {
        Self(key)
    }
}

impl FromStr for WatermarkKey {
    type Err = WatermarkError;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|_| WatermarkError::InvalidKey(s.to_string()))
    }
}

/// Quantization step. Always positive and finite.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Delta(f64);

impl Delta {
    /// Floor of the adaptive delta.
    pub const MIN: Delta = Delta(MIN_DELTA);

    /// # Errors
    /// [`WatermarkError::InvalidDelta`] for `value <= 0`, NaN or infinity.
    pub fn new(value: f64) -> Result<Self> {
        if value.is_finite() && value > 0.0 {
            Ok(Self(value))
        } else {
            Err(WatermarkError::InvalidDelta(value.to_string()))
        }
    }

    pub fn get(self) -> f64 {
        self.0
    }

    /// `self + step`, re-validated.
    pub fn offset(self, step: f64) -> Result<Self> {
        Self::new(self.0 + step)
    }
}

impl FromStr for Delta {
    type Err = WatermarkError;

    fn from_str(s: &str) -> Result<Self> {
        let value = s
            .trim()
            .parse::<f64>()
            .map_err(|_| WatermarkError::InvalidDelta(s.to_string()))?;
        Self::new(value)
    }
}

/// What the frame codec does to each block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Embed,
    Extract,
}

impl FromStr for Mode {
    type Err = WatermarkError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "embed" => Ok(Self::Embed),
            "extract" => Ok(Self::Extract),
            _ => Err(WatermarkError::InvalidMode(s.to_string())),
        }
    }
}

/// Validated parameters for one codec invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CodecConfig {
    pub key: WatermarkKey,
    /// `None` selects the adaptive delta.
    pub delta: Option<Delta>,
    pub mode: Mode,
}

impl CodecConfig {
    pub fn new(key: impl Into<WatermarkKey>, delta: Option<Delta>, mode: Mode) -> Self {
        Self { key: key.into(), delta, mode }
    }

    /// Parse untyped request fields (form values, query strings, JSON strings).
    ///
    /// `key` is required. An absent or blank `delta` selects the adaptive
    /// delta; an absent `mode` defaults to [`Mode::Extract`].
    pub fn from_fields(key: Option<&str>, delta: Option<&str>, mode: Option<&str>) -> Result<Self> {
        let key = match key {
            Some(raw) if !raw.trim().is_empty() => raw.parse::<WatermarkKey>()?,
            _ => return Err(WatermarkError::MissingKey),
        };
        let delta = match delta {
            Some(raw) if !raw.trim().is_empty() => Some(raw.parse::<Delta>()?),
            _ => None,
        };
        let mode = match mode {
            Some(raw) => raw.parse::<Mode>()?,
            None => Mode::Extract,
        };
        Ok(Self { key, delta, mode })
    }
}

/// Parameters of the embedding convergence loop and presence detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchConfig {
    /// BER strictly below this counts as "watermark present".
    pub threshold: f64,
    /// Delta step between attempts and between detection candidates.
    pub increment: f64,
    /// Upper bound on embedding attempts.
    pub max_iterations: u32,
    /// Detection tries `centre ± k * increment` for `k` in `0..=radius`.
    pub detect_radius: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            threshold: BER_THRESHOLD,
            increment: DELTA_INCREMENT,
            max_iterations: MAX_ITERATIONS,
            detect_radius: DETECT_RADIUS,
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.threshold > 0.0 && self.threshold <= 1.0) {
            return Err(WatermarkError::InvalidSearchConfig("threshold must be in (0, 1]"));
        }
        if !(self.increment.is_finite() && self.increment > 0.0) {
            return Err(WatermarkError::InvalidSearchConfig("increment must be positive"));
        }
        if self.max_iterations == 0 {
            return Err(WatermarkError::InvalidSearchConfig("max_iterations must be at least 1"));
        }
        if self.detect_radius > MAX_DETECT_RADIUS {
            return Err(WatermarkError::InvalidSearchConfig("detect_radius exceeds 64"));
        }
        Ok(())
    }
}
