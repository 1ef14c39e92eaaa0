// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Image bytes in and out: decoding, deterministic PNG encoding, content
//! hashing and atomic file writes.

use std::io::Write;
use std::path::Path;

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::RgbImage;
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

use crate::config::validate_dimensions;
use crate::error::{Result, WatermarkError};

/// Decode any supported format (PNG, JPEG, BMP) to 8-bit RGB.
///
/// Alpha is dropped and grayscale is expanded.
pub fn decode_image(bytes: &[u8]) -> Result<RgbImage> {
    if bytes.is_empty() {
        return Err(WatermarkError::EmptyImage);
    }
    let rgb = image::load_from_memory(bytes)?.to_rgb8();
    validate_dimensions(rgb.width(), rgb.height())?;
    Ok(rgb)
}

/// Encode as PNG with fixed settings, so equal pixels give equal bytes (and
/// therefore equal content hashes).
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut buf, CompressionType::Default, FilterType::Adaptive);
    image.write_with_encoder(encoder)?;
    Ok(buf)
}

/// Lowercase hex SHA-256 of the encoded bytes.
pub fn content_hash(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Write `bytes` to `path` through a temp file in the same directory.
///
/// The destination either keeps its old content or gets all of `bytes`;
/// the temp file is deleted on every failure path.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| WatermarkError::Io(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn sample() -> RgbImage {
        RgbImage::from_fn(17, 9, |x, y| Rgb([(x * 15) as u8, (y * 28) as u8, ((x + y) * 7) as u8]))
    }

    #[test]
    fn png_roundtrip_is_lossless() {
        let img = sample();
        let bytes = encode_png(&img).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
        assert_eq!(decode_image(&bytes).unwrap(), img);
    }

    #[test]
    fn encoding_is_deterministic() {
        let img = sample();
        assert_eq!(encode_png(&img).unwrap(), encode_png(&img).unwrap());
    }

    #[test]
    fn hash_is_sha256_hex() {
        assert_eq!(
            content_hash(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(content_hash(&[]).len(), 64);
    }

    #[test]
    fn empty_and_garbage_input_rejected() {
        assert!(matches!(decode_image(&[]), Err(WatermarkError::EmptyImage)));
        assert!(matches!(decode_image(b"not an image"), Err(WatermarkError::Image(_))));
    }

    #[test]
    fn write_atomic_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"second");
        // Only the destination is left behind.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn write_atomic_missing_dir_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("out.png");
        assert!(matches!(write_atomic(&path, b"x"), Err(WatermarkError::Io(_))));
        assert!(!path.exists());
    }
}
