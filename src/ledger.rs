// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Content ledger and image authentication.
//!
//! Publishing a watermarked image records the SHA-256 of its encoded bytes
//! in a ledger. An uploaded file is authentic when its hash is on the
//! ledger and it still carries the watermark of the key.

use std::collections::HashSet;
use std::sync::RwLock;

use crate::config::{Delta, SearchConfig, WatermarkKey};
use crate::error::{Result, WatermarkError};
use crate::io::{content_hash, decode_image};
use crate::search::{detect, Detection};

/// Lookup of published content hashes.
pub trait ContentLedger {
    fn contains(&self, hash: &str) -> Result<bool>;
}

/// In-process ledger.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    hashes: RwLock<HashSet<String>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `hash`. Returns `false` if it was already present.
    pub fn insert(&self, hash: impl Into<String>) -> Result<bool> {
        let mut set = self.hashes.write().map_err(|_| WatermarkError::Ledger("lock poisoned".into()))?;
        Ok(set.insert(hash.into()))
    }

    pub fn len(&self) -> Result<usize> {
        let set = self.hashes.read().map_err(|_| WatermarkError::Ledger("lock poisoned".into()))?;
        Ok(set.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl ContentLedger for MemoryLedger {
    fn contains(&self, hash: &str) -> Result<bool> {
        let set = self.hashes.read().map_err(|_| WatermarkError::Ledger("lock poisoned".into()))?;
        Ok(set.contains(hash))
    }
}

#[derive(Debug, Clone)]
pub struct Authentication {
    /// Hex SHA-256 of the submitted bytes.
    pub hash: String,
    /// Whether the ledger knows the hash.
    pub registered: bool,
    pub detection: Detection,
    /// `registered && detection.watermarked`.
    pub valid: bool,
}

/// Check submitted image bytes against the ledger and the watermark.
///
/// Detection runs even for unregistered content so the caller can tell a
/// re-encoded copy (watermark present, hash unknown) from a foreign image.
pub fn authenticate(
    bytes: &[u8],
    key: WatermarkKey,
    delta: Option<Delta>,
    config: &SearchConfig,
    ledger: &dyn ContentLedger,
) -> Result<Authentication> {
    let hash = content_hash(bytes);
    let registered = ledger.contains(&hash)?;
    let image = decode_image(bytes)?;
    let detection = detect(&image, key, delta, config)?;
    tracing::debug!(%hash, registered, ber = detection.ber, "authentication");

    let valid = registered && detection.watermarked;
    Ok(Authentication { hash, registered, detection, valid })
}
