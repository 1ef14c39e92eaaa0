// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the watermarking pipeline.
//!
//! [`WatermarkError`] covers all failure modes from request validation
//! through the delta search. An image that already carries the watermark is
//! not an error: it is reported as [`crate::EmbedOutcome::AlreadyWatermarked`].

use core::fmt;

/// Errors that can occur while embedding, extracting or verifying a watermark.
#[derive(Debug)]
pub enum WatermarkError {
    /// The input image has no pixels (or the byte stream was empty).
    EmptyImage,
    /// The image dimensions exceed the maximum allowed (8000px / 40MP).
    ImageTooLarge { width: u32, height: u32 },
    /// No key was supplied with the request.
    MissingKey,
    /// The key field could not be parsed as a signed integer.
    InvalidKey(String),
    /// Delta is zero, negative, non-finite or unparsable.
    InvalidDelta(String),
    /// The mode field is neither `embed` nor `extract`.
    InvalidMode(String),
    /// A search parameter is out of range.
    InvalidSearchConfig(&'static str),
    /// A luminance sample is NaN or infinite.
    NonFinitePixel { x: usize, y: usize },
    /// Two watermark matrices of different shapes were compared.
    ShapeMismatch {
        expected: (usize, usize),
        got: (usize, usize),
    },
    /// The padded plane is not a multiple of the block size. Indicates a
    /// padding bug, never a user error.
    MisalignedPlane { width: usize, height: usize },
    /// The delta search ran out of iterations without reaching the BER target.
    NotConverged {
        iterations: u32,
        last_delta: f64,
        best_ber: f64,
    },
    /// The image could not be decoded or encoded.
    Image(image::ImageError),
    /// Reading or writing image bytes failed.
    Io(std::io::Error),
    /// The content ledger could not be queried.
    Ledger(String),
}

impl fmt::Display for WatermarkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyImage => write!(f, "image is empty"),
            Self::ImageTooLarge { width, height } => {
                write!(f, "image too large: {width}x{height} (max 8000px / 40MP)")
            }
            Self::MissingKey => write!(f, "watermark key is required"),
            Self::InvalidKey(raw) => write!(f, "invalid watermark key {raw:?}: expected an integer"),
            Self::InvalidDelta(raw) => write!(f, "invalid delta {raw}: must be a positive finite number"),
            Self::InvalidMode(raw) => write!(f, "invalid mode {raw:?}: expected \"embed\" or \"extract\""),
            Self::InvalidSearchConfig(why) => write!(f, "invalid search configuration: {why}"),
            Self::NonFinitePixel { x, y } => write!(f, "non-finite luminance sample at ({x}, {y})"),
            Self::ShapeMismatch { expected, got } => write!(
                f,
                "watermark shape mismatch: expected {}x{}, got {}x{}",
                expected.0, expected.1, got.0, got.1
            ),
            Self::MisalignedPlane { width, height } => {
                write!(f, "padded plane {width}x{height} is not block-aligned")
            }
            Self::NotConverged { iterations, last_delta, best_ber } => write!(
                f,
                "delta search did not converge after {iterations} iterations \
                 (last delta {last_delta:.2}, best BER {best_ber:.4})"
            ),
            Self::Image(e) => write!(f, "image codec error: {e}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Ledger(msg) => write!(f, "ledger lookup failed: {msg}"),
        }
    }
}

impl std::error::Error for WatermarkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Image(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<image::ImageError> for WatermarkError {
    fn from(e: image::ImageError) -> Self {
        Self::Image(e)
    }
}

impl From<std::io::Error> for WatermarkError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, WatermarkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_converged_message_carries_numbers() {
        let e = WatermarkError::NotConverged { iterations: 10, last_delta: 4.75, best_ber: 0.5 };
        let msg = e.to_string();
        assert!(msg.contains("10 iterations"), "{msg}");
        assert!(msg.contains("4.75"), "{msg}");
        assert!(msg.contains("0.5000"), "{msg}");
    }

    #[test]
    fn io_error_is_source() {
        use std::error::Error;
        let e: WatermarkError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(e.source().is_some());
        assert!(WatermarkError::EmptyImage.source().is_none());
    }
}
