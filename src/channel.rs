// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Transmission channels for the convergence loop.
//!
//! A [`Channel`] models what happens to an image between embedding and
//! verification. The search only accepts a delta once the watermark reads
//! back correctly on the far side of the channel.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, RgbImage};

use crate::error::Result;

pub trait Channel {
    fn transmit(&self, image: &RgbImage) -> Result<RgbImage>;
}

/// Identity channel. PNG storage is lossless, so this is the default.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lossless;

impl Channel for Lossless {
    fn transmit(&self, image: &RgbImage) -> Result<RgbImage> {
        Ok(image.clone())
    }
}

/// Encode as baseline JPEG at `quality` (1-100) and decode again.
#[derive(Debug, Clone, Copy)]
pub struct JpegRecompress {
    pub quality: u8,
}

impl JpegRecompress {
    pub fn new(quality: u8) -> Self {
        Self { quality: quality.clamp(1, 100) }
    }
}

impl Channel for JpegRecompress {
    fn transmit(&self, image: &RgbImage) -> Result<RgbImage> {
        let mut buf = Vec::new();
        JpegEncoder::new_with_quality(&mut buf, self.quality).encode_image(image)?;
        let decoded = image::load(Cursor::new(buf), ImageFormat::Jpeg)?;
        Ok(decoded.to_rgb8())
    }
}
