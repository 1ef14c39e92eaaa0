// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Scalar quantization index modulation.
//!
//! One bit is carried by which of two interleaved lattices a coefficient
//! sits on:
//!
//! - Q_0: centers at {n * delta}
//! - Q_1: centers at {(n + 0.5) * delta}
//!
//! Embedding snaps the coefficient to the nearest point of the lattice
//! selected by the bit. Extraction compares the distances to the nearest
//! point of each lattice; a coefficient exactly halfway decodes as 1.

/// Quantize `c` onto the lattice for `bit`.
pub fn embed(c: f64, bit: u8, delta: f64) -> f64 {
    debug_assert!(bit <= 1);
    if bit == 0 {
        (c / delta).round() * delta
    } else {
        ((c / delta - 0.5).round() + 0.5) * delta
    }
}

/// Signed decision margin: `d1 - d0`.
///
/// Positive favors bit 0, negative favors bit 1, zero is the tie. The
/// magnitude is at most `delta / 4`.
pub fn margin(c: f64, delta: f64) -> f64 {
    let q0 = (c / delta).round() * delta;
    let q1 = ((c / delta - 0.5).round() + 0.5) * delta;
    (c - q1).abs() - (c - q0).abs()
}

/// Recover the bit carried by `c`. Ties resolve to 1.
pub fn extract(c: f64, delta: f64) -> u8 {
    if margin(c, delta) > 0.0 {
        0
    } else {
        1
    }
}

/// Majority vote over extracted bits: the rounded mean, ties toward 1.
pub fn majority(bits: &[u8]) -> u8 {
    let ones = bits.iter().filter(|&&b| b != 0).count();
    (ones * 2 >= bits.len()) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn embed_lattices() {
        let delta = 10.0;
        assert!((embed(7.0, 0, delta) - 10.0).abs() < 1e-10);
        assert!((embed(3.0, 0, delta) - 0.0).abs() < 1e-10);
        assert!((embed(-7.0, 0, delta) - -10.0).abs() < 1e-10);

        assert!((embed(3.0, 1, delta) - 5.0).abs() < 1e-10);
        assert!((embed(8.0, 1, delta) - 5.0).abs() < 1e-10);
        assert!((embed(12.0, 1, delta) - 15.0).abs() < 1e-10);
        assert!((embed(-3.0, 1, delta) - -5.0).abs() < 1e-10);
    }

    #[test]
    fn extract_recovers_embedded_bit() {
        for delta in [2.0, 5.0, 7.25, 16.0] {
            for bit in 0..=1u8 {
                for c in [-123.4, -10.0, -0.1, 0.0, 0.3, 55.5, 1017.9] {
                    let q = embed(c, bit, delta);
                    assert_eq!(extract(q, delta), bit, "c={c} bit={bit} delta={delta}");
                }
            }
        }
    }

    #[test]
    fn survives_perturbation_below_quarter_step() {
        let delta = 8.0;
        for bit in 0..=1u8 {
            let q = embed(41.3, bit, delta);
            for noise in [-1.9, -1.0, 0.5, 1.9] {
                assert_eq!(extract(q + noise, delta), bit, "bit={bit} noise={noise}");
            }
        }
    }

    #[test]
    fn exact_midpoint_is_one() {
        // 2.5 sits exactly between 0 (Q_0) and 5 (Q_1).
        let delta = 10.0;
        assert_eq!(margin(2.5, delta), 0.0);
        assert_eq!(extract(2.5, delta), 1);
        assert_eq!(extract(-2.5, delta), 1);
    }

    /// Single-sided decision: only the offset point above the nearest
    /// multiple is considered (`q1 = q0 + delta / 2`).
    fn single_sided_extract(c: f64, delta: f64) -> u8 {
        let q0 = (c / delta).round() * delta;
        let q1 = q0 + delta / 2.0;
        if (c - q0).abs() < (c - q1).abs() {
            0
        } else {
            1
        }
    }

    #[test]
    fn nearest_lattice_differs_from_single_sided_below_q0() {
        let delta = 10.0;
        // Band (q0 - delta/2, q0 - delta/4] around q0 = 0 and q0 = 10.
        for k in 0..=24 {
            let c = -2.5 - 0.1 * k as f64;
            assert_eq!(extract(c, delta), 1, "c={c}");
            assert_eq!(single_sided_extract(c, delta), 0, "c={c}");
        }
        assert_eq!((extract(7.0, delta), single_sided_extract(7.0, delta)), (1, 0));

        // A bit-1 point with a little noise toward q0 is still read as 1.
        let noisy = embed(-3.0, 1, delta) + 0.3;
        assert_eq!(extract(noisy, delta), 1);
        assert_eq!(single_sided_extract(noisy, delta), 0);

        // Outside the band both rules agree.
        for k in 0..=73 {
            let c = -2.4 + 0.1 * k as f64;
            assert_eq!(extract(c, delta), single_sided_extract(c, delta), "c={c}");
        }
    }

    #[test]
    fn majority_vote() {
        assert_eq!(majority(&[1, 1, 0]), 1);
        assert_eq!(majority(&[0, 0, 1]), 0);
        assert_eq!(majority(&[1, 0, 1]), 1);
        assert_eq!(majority(&[0, 0, 0]), 0);
        assert_eq!(majority(&[1, 1, 1]), 1);
        // Even-length ties round toward 1.
        assert_eq!(majority(&[0, 1]), 1);
    }

    proptest! {
        #[test]
        fn roundtrip_any_coefficient(c in -2048.0f64..2048.0, bit in 0u8..=1, delta in 0.5f64..64.0) {
            let q = embed(c, bit, delta);
            prop_assert_eq!(extract(q, delta), bit);
            // Distortion is bounded by half a step.
            prop_assert!((q - c).abs() <= delta / 2.0 + 1e-9);
        }
    }
}
