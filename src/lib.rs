// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! # qimark-core
//!
//! Blind, key-based image watermarking in the DCT domain.
//!
//! A secret integer key deterministically produces a binary watermark with
//! one bit per 8×8 luminance block, scrambled by a key-derived permutation.
//! Each bit is embedded into three key-selected AC coefficients of its block
//! by scalar quantization index modulation (QIM). Extraction needs only the
//! image, the key and the quantization step `delta`: it majority-votes the
//! three coefficients per block and compares the result with the expected
//! pattern by bit error rate (BER).
//!
//! - [`codec`]: one embed or extract pass over an image.
//! - [`search`]: adaptive delta, presence detection and the convergence
//!   loop that raises delta until the watermark survives a [`Channel`].
//! - [`io`], [`ledger`]: encoding, content hashing and authentication of
//!   uploaded files.
//!
//! Everything is pure and deterministic: the same image, key and delta give
//! bit-identical output on every platform.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use qimark_core::{embed_with_search, detect, Lossless, SearchConfig, WatermarkKey};
//!
//! let img = image::open("photo.png").unwrap().to_rgb8();
//! let key = WatermarkKey::new(12345);
//! let cfg = SearchConfig::default();
//! let outcome = embed_with_search(&img, key, None, &cfg, &Lossless).unwrap();
//! let marked = outcome.embedded().unwrap();
//! assert!(detect(&marked.image, key, Some(marked.delta), &cfg).unwrap().watermarked);
//! ```

pub mod channel;
pub mod codec;
pub mod config;
pub mod error;
pub mod io;
pub mod ledger;
pub mod plane;
pub mod positions;
pub mod qim;
pub mod rng;
pub mod search;
pub mod transform;
pub mod watermark;

pub use channel::{Channel, JpegRecompress, Lossless};
pub use codec::{embed, extract, process, Extraction, FrameOutput};
pub use config::{validate_dimensions, CodecConfig, Delta, Mode, SearchConfig, WatermarkKey, MAX_DIMENSION, MAX_PIXELS};
pub use error::{Result, WatermarkError};
pub use io::{content_hash, decode_image, encode_png, write_atomic};
pub use ledger::{authenticate, Authentication, ContentLedger, MemoryLedger};
pub use search::{adaptive_delta, detect, embed_with_search, sweep_delta, DeltaSweep, Detection, EmbedOutcome, Embedded};
pub use watermark::{generate, BitMatrix, Watermark};
