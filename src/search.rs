// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Delta selection, presence detection and the embedding convergence loop.
//!
//! An embed request runs:
//!
//! ```text
//! INIT ──detect()──▶ ALREADY_WATERMARKED          (Ok, nothing embedded)
//!   │
//!   └──▶ EMBEDDING ──BER < threshold──▶ CONVERGED  (Ok)
//!            │  ▲
//!            └──┘ delta += increment
//!            │
//!            └──max_iterations──▶ NotConverged     (Err)
//! ```
//!
//! Each attempt embeds, sends the result through a [`Channel`] and extracts
//! at the same delta, so a converged result is known to survive that
//! channel.

use image::RgbImage;

use crate::channel::Channel;
use crate::codec;
use crate::config::{Delta, SearchConfig, WatermarkKey, ADAPTIVE_FACTOR, MAX_SWEEP_TRIALS, MIN_DELTA};
use crate::error::{Result, WatermarkError};
use crate::plane::{Plane, YCrCbPlanes};
use crate::watermark::BitMatrix;

/// `max(stddev(luma) / 10, 2.0)` over the unpadded plane.
pub fn adaptive_delta(luma: &Plane) -> Delta {
    let raw = (luma.std_dev() / ADAPTIVE_FACTOR).max(MIN_DELTA);
    Delta::new(raw).unwrap_or(Delta::MIN)
}

/// Adaptive delta of an RGB image's luminance.
pub fn adaptive_delta_for(image: &RgbImage) -> Delta {
    adaptive_delta(&YCrCbPlanes::from_rgb(image).y)
}

/// A successfully embedded image.
#[derive(Debug, Clone)]
pub struct Embedded {
    pub image: RgbImage,
    /// Scrambled watermark that was embedded.
    pub expected: BitMatrix,
    /// Delta of the converged attempt.
    pub delta: Delta,
    /// BER measured after the channel.
    pub ber: f64,
    /// Number of attempts, 1-based.
    pub iterations: u32,
}

/// Presence detection result.
#[derive(Debug, Clone)]
pub struct Detection {
    pub watermarked: bool,
    /// Lowest BER over all candidates.
    pub ber: f64,
    /// Candidate delta that produced `ber`.
    pub delta: Delta,
    /// Every `(delta, ber)` pair tried, in order.
    pub candidates: Vec<(f64, f64)>,
}

#[derive(Debug, Clone)]
pub enum EmbedOutcome {
    Converged(Embedded),
    /// The input already carries this key's watermark; it was left alone.
    AlreadyWatermarked(Detection),
}

impl EmbedOutcome {
    pub fn embedded(&self) -> Option<&Embedded> {
        match self {
            Self::Converged(e) => Some(e),
            Self::AlreadyWatermarked(_) => None,
        }
    }
}

/// Look for the watermark of `key` around `centre` (adaptive if `None`).
///
/// Candidates are `centre + k * increment` for `k` in `-radius..=radius`;
/// non-positive candidates are skipped. The image counts as watermarked when
/// the lowest BER is strictly below the threshold.
pub fn detect(image: &RgbImage, key: WatermarkKey, centre: Option<Delta>, config: &SearchConfig) -> Result<Detection> {
    config.validate()?;
    let centre = centre.unwrap_or_else(|| adaptive_delta_for(image));
    let radius = config.detect_radius as i64;

    let mut best: Option<(f64, Delta)> = None;
    let mut candidates = Vec::with_capacity(2 * radius as usize + 1);
    for k in -radius..=radius {
        let Ok(delta) = centre.offset(k as f64 * config.increment) else {
            continue;
        };
        let ber = codec::extract(image, key, Some(delta))?.ber;
        tracing::debug!(delta = delta.get(), ber, "detection candidate");
        candidates.push((delta.get(), ber));
        match best {
            Some((b, _)) if b <= ber => {}
            _ => best = Some((ber, delta)),
        }
    }

    // The centre itself is always a valid candidate, so `best` is set.
    let (ber, delta) = best.unwrap_or((1.0, centre));
    Ok(Detection {
        watermarked: ber < config.threshold,
        ber,
        delta,
        candidates,
    })
}

/// Embed with the convergence loop, after checking the input is unmarked.
///
/// # Errors
/// [`WatermarkError::NotConverged`] once `max_iterations` attempts have all
/// stayed at or above the threshold.
pub fn embed_with_search(
    image: &RgbImage,
    key: WatermarkKey,
    initial: Option<Delta>,
    config: &SearchConfig,
    channel: &dyn Channel,
) -> Result<EmbedOutcome> {
    config.validate()?;
    let start = initial.unwrap_or_else(|| adaptive_delta_for(image));

    let existing = detect(image, key, Some(start), config)?;
    if existing.watermarked {
        tracing::info!(ber = existing.ber, delta = existing.delta.get(), "image already watermarked");
        return Ok(EmbedOutcome::AlreadyWatermarked(existing));
    }

    let mut delta = start;
    let mut best_ber = f64::INFINITY;
    for iteration in 1..=config.max_iterations {
        let marked = codec::embed(image, key, Some(delta))?;
        let received = channel.transmit(&marked.image)?;
        let ber = codec::extract(&received, key, Some(delta))?.ber;
        tracing::debug!(iteration, delta = delta.get(), ber, "embedding attempt");

        if ber < config.threshold {
            tracing::info!(iterations = iteration, delta = delta.get(), ber, "watermark embedded");
            return Ok(EmbedOutcome::Converged(Embedded {
                image: marked.image,
                expected: marked.expected,
                delta,
                ber,
                iterations: iteration,
            }));
        }
        best_ber = best_ber.min(ber);
        if iteration < config.max_iterations {
            delta = delta.offset(config.increment)?;
        }
    }

    tracing::warn!(
        iterations = config.max_iterations,
        last_delta = delta.get(),
        best_ber,
        "delta search did not converge"
    );
    Err(WatermarkError::NotConverged {
        iterations: config.max_iterations,
        last_delta: delta.get(),
        best_ber,
    })
}

/// One `(delta, ber)` measurement of a sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepTrial {
    pub delta: f64,
    pub ber: f64,
}

#[derive(Debug, Clone)]
pub struct DeltaSweep {
    pub trials: Vec<SweepTrial>,
    /// Lowest-BER trial; the smallest delta wins ties.
    pub best: SweepTrial,
}

/// Embed and extract at every delta in `start..=end` by `step`.
///
/// Offline tuning aid: shows how BER after `channel` falls off as delta
/// grows for a given image.
pub fn sweep_delta(
    image: &RgbImage,
    key: WatermarkKey,
    start: f64,
    end: f64,
    step: f64,
    channel: &dyn Channel,
) -> Result<DeltaSweep> {
    if !(start.is_finite() && start > 0.0) {
        return Err(WatermarkError::InvalidSearchConfig("sweep start must be positive"));
    }
    if !(step.is_finite() && step > 0.0) {
        return Err(WatermarkError::InvalidSearchConfig("sweep step must be positive"));
    }
    if !(end.is_finite() && end >= start) {
        return Err(WatermarkError::InvalidSearchConfig("sweep end must not be below start"));
    }

    // Index-based to avoid accumulating float error over the range.
    let span = ((end - start) / step + 1e-9).floor();
    if !(span < MAX_SWEEP_TRIALS as f64) {
        return Err(WatermarkError::InvalidSearchConfig("sweep range exceeds 1000 trials"));
    }
    let count = span as usize + 1;
    let mut trials = Vec::with_capacity(count);
    for n in 0..count {
        let delta = Delta::new(start + n as f64 * step)?;
        let marked = codec::embed(image, key, Some(delta))?;
        let received = channel.transmit(&marked.image)?;
        let ber = codec::extract(&received, key, Some(delta))?.ber;
        tracing::debug!(delta = delta.get(), ber, "sweep trial");
        trials.push(SweepTrial { delta: delta.get(), ber });
    }

    let best = trials
        .iter()
        .copied()
        .fold(None, |acc: Option<SweepTrial>, t| match acc {
            Some(b) if b.ber <= t.ber => Some(b),
            _ => Some(t),
        })
        .ok_or(WatermarkError::InvalidSearchConfig("empty sweep range"))?;

    Ok(DeltaSweep { trials, best })
}
