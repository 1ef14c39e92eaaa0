// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Pixel planes: color conversion, reflect padding and the block grid.
//!
//! The codec only ever touches luminance. [`YCrCbPlanes`] splits an RGB
//! image into full-range BT.601 Y, Cr and Cb planes (the JPEG convention)
//! and merges them back; the inverse is the exact algebraic inverse of the
//! forward matrix, so an unmodified image converts back to identical bytes.
//!
//! [`BlockGrid`] stores a block-aligned plane in block-raster order (each
//! 64-value chunk is one 8×8 block) so blocks can be handed out as disjoint
//! mutable slices, e.g. to Rayon's `par_chunks_mut`.

use image::{Rgb, RgbImage};

use crate::config::BLOCK_SIZE;
use crate::error::{Result, WatermarkError};

const KR: f64 = 0.299;
const KG: f64 = 0.587;
const KB: f64 = 0.114;
const CR_SCALE: f64 = 0.713;
const CB_SCALE: f64 = 0.564;
const CHROMA_BIAS: f64 = 128.0;

/// A single-channel plane of `f64` samples, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    width: usize,
    height: usize,
    data: Vec<f64>,
}

impl Plane {
    /// Wrap raw samples. Every sample must be finite.
    ///
    /// # Errors
    /// - [`WatermarkError::EmptyImage`] if either dimension is zero.
    /// - [`WatermarkError::ShapeMismatch`] if `data.len() != width * height`.
    /// - [`WatermarkError::NonFinitePixel`] on the first NaN or infinity.
    pub fn from_raw(width: usize, height: usize, data: Vec<f64>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(WatermarkError::EmptyImage);
        }
        if data.len() != width * height {
            return Err(WatermarkError::ShapeMismatch {
                expected: (height, width),
                got: (data.len() / width, width),
            });
        }
        if let Some(idx) = data.iter().position(|v| !v.is_finite()) {
            return Err(WatermarkError::NonFinitePixel { x: idx % width, y: idx / width });
        }
        Ok(Self { width, height, data })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> f64 {
        self.data[y * self.width + x]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Population standard deviation of all samples.
    pub fn std_dev(&self) -> f64 {
        let n = self.data.len() as f64;
        let mean = self.data.iter().sum::<f64>() / n;
        let var = self.data.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
        var.sqrt()
    }

    /// Extend bottom and right edges by mirror reflection (edge sample
    /// repeated: `...cba|abc...`) until both sides are multiples of `block`.
    pub fn pad_reflect(&self, block: usize) -> Plane {
        let pw = self.width.div_ceil(block) * block;
        let ph = self.height.div_ceil(block) * block;
        if pw == self.width && ph == self.height {
            return self.clone();
        }
        let mut data = Vec::with_capacity(pw * ph);
        for y in 0..ph {
            let sy = reflect(y, self.height);
            for x in 0..pw {
                data.push(self.data[sy * self.width + reflect(x, self.width)]);
            }
        }
        Plane { width: pw, height: ph, data }
    }

    /// Keep the top-left `width × height` region.
    pub fn crop(&self, width: usize, height: usize) -> Plane {
        debug_assert!(width <= self.width && height <= self.height);
        if width == self.width && height == self.height {
            return self.clone();
        }
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            let start = y * self.width;
            data.extend_from_slice(&self.data[start..start + width]);
        }
        Plane { width, height, data }
    }
}

/// Map an out-of-range index back into `0..len` by mirror reflection with
/// the edge sample repeated.
fn reflect(idx: usize, len: usize) -> usize {
    if idx < len {
        return idx;
    }
    let period = 2 * len;
    let m = idx % period;
    if m < len {
        m
    } else {
        period - 1 - m
    }
}

/// Luma and chroma planes of an RGB image.
#[derive(Debug, Clone)]
pub struct YCrCbPlanes {
    pub y: Plane,
    pub cr: Plane,
    pub cb: Plane,
}

impl YCrCbPlanes {
    pub fn from_rgb(img: &RgbImage) -> Self {
        let (w, h) = (img.width() as usize, img.height() as usize);
        let n = w * h;
        let mut y = Vec::with_capacity(n);
        let mut cr = Vec::with_capacity(n);
        let mut cb = Vec::with_capacity(n);
        for px in img.pixels() {
            let (r, g, b) = (px[0] as f64, px[1] as f64, px[2] as f64);
            let luma = KR * r + KG * g + KB * b;
            y.push(luma);
            cr.push((r - luma) * CR_SCALE + CHROMA_BIAS);
            cb.push((b - luma) * CB_SCALE + CHROMA_BIAS);
        }
        Self {
            y: Plane { width: w, height: h, data: y },
            cr: Plane { width: w, height: h, data: cr },
            cb: Plane { width: w, height: h, data: cb },
        }
    }

    /// Merge back to 8-bit RGB (rounded, clamped).
    pub fn to_rgb(&self) -> RgbImage {
        let (w, h) = (self.y.width, self.y.height);
        let mut img = RgbImage::new(w as u32, h as u32);
        for (i, px) in img.pixels_mut().enumerate() {
            let luma = self.y.data[i];
            let r = luma + (self.cr.data[i] - CHROMA_BIAS) / CR_SCALE;
            let b = luma + (self.cb.data[i] - CHROMA_BIAS) / CB_SCALE;
            let g = (luma - KR * r - KB * b) / KG;
            *px = Rgb([to_u8(r), to_u8(g), to_u8(b)]);
        }
        img
    }
}

fn to_u8(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// A block-aligned plane in block-raster order.
#[derive(Debug, Clone)]
pub struct BlockGrid {
    blocks_wide: usize,
    blocks_tall: usize,
    /// `blocks_tall * blocks_wide * 64` samples; each 64-chunk is one block
    /// in natural (row-major) order.
    samples: Vec<f64>,
}

impl BlockGrid {
    /// Tile a padded plane into 8×8 blocks.
    ///
    /// # Errors
    /// [`WatermarkError::MisalignedPlane`] if a side is not a multiple of 8.
    pub fn from_plane(plane: &Plane) -> Result<Self> {
        if plane.width % BLOCK_SIZE != 0 || plane.height % BLOCK_SIZE != 0 {
            return Err(WatermarkError::MisalignedPlane { width: plane.width, height: plane.height });
        }
        let bw = plane.width / BLOCK_SIZE;
        let bt = plane.height / BLOCK_SIZE;
        let mut samples = vec![0.0f64; plane.data.len()];
        for br in 0..bt {
            for bc in 0..bw {
                let base = (br * bw + bc) * 64;
                for row in 0..8 {
                    let src = (br * 8 + row) * plane.width + bc * 8;
                    samples[base + row * 8..base + row * 8 + 8]
                        .copy_from_slice(&plane.data[src..src + 8]);
                }
            }
        }
        Ok(Self { blocks_wide: bw, blocks_tall: bt, samples })
    }

    /// Reassemble the row-major plane.
    pub fn to_plane(&self) -> Plane {
        let width = self.blocks_wide * 8;
        let height = self.blocks_tall * 8;
        let mut data = vec![0.0f64; width * height];
        for br in 0..self.blocks_tall {
            for bc in 0..self.blocks_wide {
                let base = (br * self.blocks_wide + bc) * 64;
                for row in 0..8 {
                    let dst = (br * 8 + row) * width + bc * 8;
                    data[dst..dst + 8].copy_from_slice(&self.samples[base + row * 8..base + row * 8 + 8]);
                }
            }
        }
        Plane { width, height, data }
    }

    pub fn blocks_wide(&self) -> usize {
        self.blocks_wide
    }

    pub fn blocks_tall(&self) -> usize {
        self.blocks_tall
    }

    /// Raw mutable access, one 64-chunk per block; chunk `k` is block
    /// `(k / blocks_wide, k % blocks_wide)`. Used for parallel per-block
    /// processing.
    pub fn samples_mut(&mut self) -> &mut [f64] {
        &mut self.samples
    }
}

#[cfg(test)]
impl BlockGrid {
    fn total_blocks(&self) -> usize {
        self.blocks_wide * self.blocks_tall
    }

    fn block_coords(&self, k: usize) -> (usize, usize) {
        (k / self.blocks_wide, k % self.blocks_wide)
    }

    fn block(&self, br: usize, bc: usize) -> &[f64] {
        let start = (br * self.blocks_wide + bc) * 64;
        &self.samples[start..start + 64]
    }
}
