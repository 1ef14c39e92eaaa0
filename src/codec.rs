// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Frame codec: one embed or extract pass over an image.
//!
//! 1. RGB → Y/Cr/Cb; only Y is processed.
//! 2. Reflect-pad Y to multiples of 8.
//! 3. Regenerate the scrambled watermark for the padded block grid.
//! 4. Per block: DCT, select 3 key-derived AC positions, QIM-embed the
//!    block's bit (or extract three bits and majority-vote), IDCT, clamp to
//!    [0, 255].
//! 5. Crop, merge the untouched chroma, convert back to RGB.
//!
//! Blocks have no data dependency on each other, so with the `parallel`
//! feature they are processed with Rayon. Output is identical either way.

use image::RgbImage;

use crate::config::{validate_dimensions, CodecConfig, Delta, Mode, WatermarkKey, BLOCK_SIZE, POSITIONS_PER_BLOCK};
use crate::error::Result;
use crate::plane::{BlockGrid, Plane, YCrCbPlanes};
use crate::positions::positions;
use crate::qim;
use crate::search::adaptive_delta;
use crate::transform;
use crate::watermark::{self, BitMatrix};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Result of one codec pass over an RGB image.
#[derive(Debug, Clone)]
pub struct FrameOutput {
    /// Processed image, same dimensions as the input.
    pub image: RgbImage,
    /// Scrambled watermark the key prescribes for this image shape.
    pub expected: BitMatrix,
    /// Watermark read from the image (extract mode only).
    pub observed: Option<BitMatrix>,
    /// Delta actually used (the caller's, or the adaptive one).
    pub delta: Delta,
}

/// Result of one codec pass over a bare luminance plane.
#[derive(Debug, Clone)]
pub struct PlaneOutput {
    pub luma: Plane,
    pub expected: BitMatrix,
    pub observed: Option<BitMatrix>,
}

/// Expected and observed watermark of an image, with their BER.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub expected: BitMatrix,
    pub observed: BitMatrix,
    pub ber: f64,
    pub delta: Delta,
}

/// Run one codec pass over an RGB image.
///
/// # Errors
/// - [`crate::WatermarkError::EmptyImage`] / [`crate::WatermarkError::ImageTooLarge`]
///   for out-of-range dimensions.
pub fn process(image: &RgbImage, config: &CodecConfig) -> Result<FrameOutput> {
    validate_dimensions(image.width(), image.height())?;

    let mut planes = YCrCbPlanes::from_rgb(image);
    let delta = match config.delta {
        Some(d) => d,
        None => adaptive_delta(&planes.y),
    };

    let out = process_plane(&planes.y, config.key, delta, config.mode)?;
    planes.y = out.luma;

    Ok(FrameOutput {
        image: planes.to_rgb(),
        expected: out.expected,
        observed: out.observed,
        delta,
    })
}

/// Run one codec pass over a luminance plane (values nominally 0–255).
///
/// The returned plane has the input's dimensions; padding is applied and
/// cropped internally.
pub fn process_plane(luma: &Plane, key: WatermarkKey, delta: Delta, mode: Mode) -> Result<PlaneOutput> {
    let (width, height) = (luma.width(), luma.height());
    let padded = luma.pad_reflect(BLOCK_SIZE);
    let mut grid = BlockGrid::from_plane(&padded)?;
    let (bt, bw) = (grid.blocks_tall(), grid.blocks_wide());

    let expected = watermark::generate((bt, bw), key).scrambled;
    let step = delta.get();

    let process_block = |(k, chunk): (usize, &mut [f64])| -> u8 {
        let (i, j) = (k / bw, k % bw);
        let mut px = [0.0f64; 64];
        px.copy_from_slice(chunk);
        let mut coeffs = transform::forward(&px);

        let coords = positions(i, j, key);
        let bit = match mode {
            Mode::Embed => {
                let bit = expected.get(i, j);
                for &(r, c) in &coords {
                    coeffs[r * 8 + c] = qim::embed(coeffs[r * 8 + c], bit, step);
                }
                bit
            }
            Mode::Extract => {
                let mut votes = [0u8; POSITIONS_PER_BLOCK];
                for (vote, &(r, c)) in votes.iter_mut().zip(&coords) {
                    *vote = qim::extract(coeffs[r * 8 + c], step);
                }
                qim::majority(&votes)
            }
        };

        let out = transform::inverse(&coeffs);
        for (dst, v) in chunk.iter_mut().zip(out.iter()) {
            *dst = v.clamp(0.0, 255.0);
        }
        bit
    };

    #[cfg(feature = "parallel")]
    let bits: Vec<u8> = grid.samples_mut().par_chunks_mut(64).enumerate().map(process_block).collect();
    #[cfg(not(feature = "parallel"))]
    let bits: Vec<u8> = grid.samples_mut().chunks_mut(64).enumerate().map(process_block).collect();

    let observed = match mode {
        Mode::Embed => None,
        Mode::Extract => Some(BitMatrix::from_vec(bt, bw, bits)?),
    };

    Ok(PlaneOutput {
        luma: grid.to_plane().crop(width, height),
        expected,
        observed,
    })
}

/// Embed the watermark for `key` at `delta` (adaptive if `None`).
pub fn embed(image: &RgbImage, key: WatermarkKey, delta: Option<Delta>) -> Result<FrameOutput> {
    process(image, &CodecConfig::new(key, delta, Mode::Embed))
}

/// Extract the watermark for `key` at `delta` (adaptive if `None`) and
/// compare it with the expected pattern.
pub fn extract(image: &RgbImage, key: WatermarkKey, delta: Option<Delta>) -> Result<Extraction> {
    let out = process(image, &CodecConfig::new(key, delta, Mode::Extract))?;
    let observed = out.observed.unwrap_or_else(|| BitMatrix::zeros(out.expected.rows(), out.expected.cols()));
    let ber = out.expected.bit_error_rate(&observed)?;
    Ok(Extraction { expected: out.expected, observed, ber, delta: out.delta })
}
