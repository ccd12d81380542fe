//! Gaussian Approximation density evolution
//!
//! Models every synthetic channel's LLR as a consistent Gaussian
//! (`variance = 2 · mean`) and tracks only the mean through the
//! polarization recursion:
//!
//! - bit node: `z' = 2z`
//! - check node: `z' = phi⁻¹(1 - (1 - phi(z))²)`
//!
//! `phi` is the usual two-piece curve fit:
//!
//! ```text
//! phi(t) = exp(0.0564 t² - 0.4856 t)       t <  0.867861
//!          exp(alpha · t^gamma + beta)       t >= 0.867861
//! ```
//!
//! with `alpha = -0.4527`, `beta = 0.0218`, `gamma = 0.86`.
//!
//! The result is a mean-LLR vector: larger means more reliable.
//! [`capacity_scale`] maps it onto `[0, 1]` with `erf(sqrt(z / 2))`.

use std::f64::consts::LN_2;

use statrs::function::erf::erf;
use tracing::{debug, warn};

use crate::design::{BlockSpec, DesignPoint};
use crate::reliability::{ScoreKind, ScoreVector};
use crate::types::{PolarError, PolarResult};

pub const ALPHA: f64 = -0.4527;
pub const BETA: f64 = 0.0218;
pub const GAMMA: f64 = 0.8600;

/// `phi` switches from the quadratic to the power-law fit here.
pub const PHI_PIVOT: f64 = 0.867861;
/// `phi(PHI_PIVOT)`; `inv_phi` switches branches here.
pub const INV_PHI_PIVOT: f64 = 0.6845772418;

const POLY_A: f64 = 0.0564;
const POLY_B: f64 = -0.4856;
/// `-POLY_B / (2 · POLY_A)`
const POLY_INV_SCALE: f64 = 4.304964539;
/// `4 · POLY_A / POLY_B²`
const POLY_INV_SLOPE: f64 = 0.9567131408;

/// Check-node update for large means: `T + ln2 / (alpha · gamma)`.
const ASYMPTOTIC_OFFSET: f64 = LN_2 / (ALPHA * GAMMA);

fn poly_exponent(t: f64) -> f64 {
    POLY_A * t * t + POLY_B * t
}

fn power_exponent(t: f64) -> f64 {
    ALPHA * t.powf(GAMMA) + BETA
}

/// Evaluate `f(exponent(t))` on the fitted branch, retrying through the
/// power-law branch when the result is not finite.
fn phi_with<F>(t: f64, f: F) -> PolarResult<f64>
where
    F: Fn(f64) -> f64,
{
    if t.is_nan() {
        return Err(PolarError::numeric("phi", t));
    }
    let first = if t < PHI_PIVOT {
        f(poly_exponent(t))
    } else {
        f(power_exponent(t))
    };
    if first.is_finite() {
        return Ok(first);
    }

    let retry = f(power_exponent(t));
    if retry.is_finite() {
        Ok(retry)
    } else {
        Err(PolarError::numeric("phi", t))
    }
}

/// `phi(t)`, the expected `tanh`-domain transform of a consistent Gaussian
/// LLR with mean `t`.
pub fn phi(t: f64) -> PolarResult<f64> {
    phi_with(t, f64::exp)
}

/// `1 - phi(t)` without cancellation for small `t`.
fn one_minus_phi(t: f64) -> PolarResult<f64> {
    phi_with(t, |x| -x.exp_m1())
}

/// Inverse of the quadratic branch given `ln t`:
/// `4.305 · (1 - sqrt(1 + 0.9567 · ln t))`, rearranged so that `ln t`
/// near zero does not cancel.
fn poly_inverse_from_ln(ln_t: f64) -> f64 {
    let y = POLY_INV_SLOPE * ln_t;
    -POLY_INV_SCALE * y / (1.0 + (1.0 + y).sqrt())
}

/// Inverse of [`phi`].
///
/// `t == 0` is replaced by the smallest positive normal `f64` so the
/// power-law branch never takes `ln(0)`.
pub fn inv_phi(t: f64) -> PolarResult<f64> {
    let result = if t > INV_PHI_PIVOT {
        poly_inverse_from_ln(t.ln())
    } else {
        let t = if t == 0.0 { f64::MIN_POSITIVE } else { t };
        ((t.ln() - BETA) / ALPHA).powf(1.0 / GAMMA)
    };
    if result.is_finite() {
        Ok(result)
    } else {
        Err(PolarError::numeric("inv_phi", t))
    }
}

/// Check-node combining rule `inv_phi(1 - (1 - phi(T))²)`.
///
/// Returns infinity when the argument underflows to zero, which is where
/// the exact inverse diverges.
fn check_node(mean: f64) -> PolarResult<f64> {
    let p = phi(mean)?;
    let q = one_minus_phi(mean)?;

    // 1 - q² computed from whichever of p, q is small
    let x = if p < 0.5 { p * (2.0 - p) } else { 1.0 - q * q };
    if x == 0.0 {
        // inv_phi(0) would cap the mean near 5182 regardless of T; the
        // caller's asymptotic update keeps growing with T instead
        return Ok(f64::INFINITY);
    }
    if x > INV_PHI_PIVOT {
        let v = poly_inverse_from_ln((-q * q).ln_1p());
        if v.is_finite() {
            Ok(v)
        } else {
            Err(PolarError::numeric("inv_phi", x))
        }
    } else {
        inv_phi(x)
    }
}

/// Raw mean-LLR density evolution, before any validation.
fn evolve(block: &BlockSpec, design: &DesignPoint) -> PolarResult<(Vec<f64>, usize)> {
    let m = block.power();
    let mut z = vec![design.initial_mean_llr(); block.size()];
    let mut fallbacks = 0usize;

    for l in 1..=m {
        let o1 = 1usize << (m - l + 1);
        let o2 = 1usize << (m - l);
        for t in 0..(1usize << (l - 1)) {
            let parent = z[t * o1];
            let degraded = check_node(parent)?;
            z[t * o1] = if degraded.is_finite() {
                degraded
            } else {
                fallbacks += 1;
                parent + ASYMPTOTIC_OFFSET
            };
            z[t * o1 + o2] = 2.0 * parent;
        }
    }

    Ok((z, fallbacks))
}

/// Mean LLR of every synthetic channel in natural index order.
pub fn mean_llrs(block: &BlockSpec, design: &DesignPoint) -> PolarResult<ScoreVector> {
    let (z, fallbacks) = evolve(block, design)?;
    if fallbacks > 0 {
        warn!(
            n = block.size(),
            snr_db = design.snr_db(),
            fallbacks,
            "check-node argument underflowed, used asymptotic update"
        );
    }

    let scores = ScoreVector::from_f64(ScoreKind::MeanLlr, z)?;
    debug!(
        n = block.size(),
        snr_db = design.snr_db(),
        distinct = scores.distinct_count(),
        "gaussian approximation"
    );
    Ok(scores)
}

/// Map mean LLRs onto a `[0, 1]` capacity-like scale: `erf(sqrt(z / 2))`.
pub fn capacity_scale(mean_llrs: &[f64]) -> Vec<f64> {
    mean_llrs
        .iter()
        .map(|&z| erf((z.max(0.0) / 2.0).sqrt()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reliability::sorted_channels;

    fn setup(n: usize, snr_db: f64) -> (BlockSpec, DesignPoint) {
        (
            BlockSpec::from_size(n).unwrap(),
            DesignPoint::new(snr_db).unwrap(),
        )
    }

    #[test]
    fn test_phi_continuous_at_pivot() {
        let below = phi(PHI_PIVOT - 1e-12).unwrap();
        let at = phi(PHI_PIVOT).unwrap();
        assert!((below - INV_PHI_PIVOT).abs() < 1e-8);
        assert!((at - INV_PHI_PIVOT).abs() < 1e-8);
    }

    #[test]
    fn test_phi_endpoints() {
        assert_eq!(phi(0.0).unwrap(), 1.0);
        // Deep in the power-law region phi underflows to zero, not NaN
        assert_eq!(phi(1e6).unwrap(), 0.0);
    }

    #[test]
    fn test_phi_is_decreasing() {
        let mut prev = phi(0.0).unwrap();
        for i in 1..2000 {
            let t = f64::from(i) * 0.01;
            let cur = phi(t).unwrap();
            // The two fits meet with a ~1e-9 step at the pivot
            assert!(cur <= prev + 2e-9, "phi({t})");
            prev = cur;
        }
    }

    #[test]
    fn test_phi_rejects_unrecoverable_input() {
        // Quadratic branch overflows, power-law retry is NaN for t < 0
        assert!(matches!(
            phi(-1e4),
            Err(PolarError::NumericEvaluation { function: "phi", .. })
        ));
        assert!(phi(f64::NAN).is_err());
        // Moderate negative input stays on the quadratic branch
        assert!(phi(-1.0).unwrap() > 1.0);
    }

    #[test]
    fn test_inv_phi_zero_substitution() {
        let at_zero = inv_phi(0.0).unwrap();
        let at_min = inv_phi(f64::MIN_POSITIVE).unwrap();
        assert_eq!(at_zero, at_min);
        assert!(at_zero.is_finite() && at_zero > 1000.0);
    }

    #[test]
    fn test_inv_phi_rejects_negative() {
        assert!(matches!(
            inv_phi(-0.5),
            Err(PolarError::NumericEvaluation { function: "inv_phi", .. })
        ));
        assert!(inv_phi(f64::NAN).is_err());
    }

    #[test]
    fn test_phi_inv_phi_roundtrip() {
        let points = [
            1e-300, 1e-100, 1e-10, 1e-3, 0.1, 0.5, 0.68,
            INV_PHI_PIVOT - 1e-9, INV_PHI_PIVOT, INV_PHI_PIVOT + 1e-9,
            0.69, 0.9, 0.999, 1.0,
        ];
        for &t in &points {
            let back = phi(inv_phi(t).unwrap()).unwrap();
            assert!(((back - t) / t).abs() < 1e-9, "t = {t}: {back}");
        }
    }

    #[test]
    fn test_inv_phi_phi_roundtrip() {
        let points = [
            0.0, 1e-8, 0.01, 0.5, 0.86,
            PHI_PIVOT - 1e-9, PHI_PIVOT, PHI_PIVOT + 1e-9,
            0.87, 1.0, 5.0, 50.0, 500.0, 5000.0,
        ];
        for &t in &points {
            let back = inv_phi(phi(t).unwrap()).unwrap();
            assert!((back - t).abs() < 1e-7 * t.max(1.0), "t = {t}: {back}");
        }
    }

    #[test]
    fn test_n2_values() {
        let (block, design) = setup(2, 0.0);
        let z = mean_llrs(&block, &design).unwrap().to_f64_vec();
        assert_eq!(z[1], 8.0);
        let expected = inv_phi(1.0 - (1.0 - phi(4.0).unwrap()).powi(2)).unwrap();
        assert!((z[0] - expected).abs() < 1e-9);
        assert!(z[0] < 4.0);
    }

    #[test]
    fn test_asymptotic_fallback() {
        // phi(40000) underflows, so the check node takes the fallback
        let (block, design) = setup(2, 40.0);
        let init = design.initial_mean_llr();
        let z = mean_llrs(&block, &design).unwrap().to_f64_vec();
        assert_eq!(z[0], init + LN_2 / (ALPHA * GAMMA));
        assert_eq!(z[1], 2.0 * init);
        // Not the zero-substituted inverse, which saturates
        let saturated = inv_phi(0.0).unwrap();
        assert!(saturated < 6000.0);
        assert!(z[0] > 5.0 * saturated);
        assert_eq!(check_node(init).unwrap(), f64::INFINITY);
    }

    #[test]
    fn test_all_entries_finite_across_snr() {
        let block = BlockSpec::from_size(256).unwrap();
        for i in -20..=80 {
            let design = DesignPoint::new(f64::from(i) * 0.5).unwrap();
            let z = mean_llrs(&block, &design).unwrap();
            assert!(z.to_f64_vec().iter().all(|v| v.is_finite() && *v >= 0.0));
        }
    }

    #[test]
    fn test_monotonic_in_design_snr() {
        for n in [64, 1024] {
            let block = BlockSpec::from_size(n).unwrap();
            let mut prev: Option<Vec<f64>> = None;
            for i in -40..=160 {
                let design = DesignPoint::new(f64::from(i) * 0.25).unwrap();
                let z = mean_llrs(&block, &design).unwrap().to_f64_vec();
                if let Some(p) = &prev {
                    for (j, (a, b)) in z.iter().zip(p.iter()).enumerate() {
                        assert!(*a >= *b * (1.0 - 1e-9), "N={n} idx {j}: {a} < {b}");
                    }
                }
                prev = Some(z);
            }
        }
    }

    #[test]
    fn test_ordering_matches_bhattacharyya_small_n() {
        let (block, design) = setup(16, 0.0);
        let order = sorted_channels(&mean_llrs(&block, &design).unwrap());
        assert_eq!(
            order.as_slice(),
            &[0, 1, 2, 4, 8, 3, 5, 6, 9, 10, 12, 7, 11, 13, 14, 15]
        );
    }

    #[test]
    fn test_capacity_scale() {
        let caps = capacity_scale(&[0.0, 2.0, 50.0]);
        assert!(caps[0].abs() < 1e-15);
        assert!((caps[1] - erf(1.0)).abs() < 1e-15);
        assert!(caps[2] > 0.999_999);
        assert!(caps.iter().all(|c| (0.0..=1.0).contains(c)));
    }
}
