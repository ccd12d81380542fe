//! Bhattacharyya-bound channel construction
//!
//! Treats the design channel as a binary erasure channel with parameter
//! `eta` and tracks the erasure-equivalent capacity `1 - Z` of every
//! synthetic channel through the polarization recursion:
//!
//! ```text
//!            v
//!          /   \
//!   degrade     upgrade
//!  (check)       (bit)
//!    v^2       2v - v^2
//! ```
//!
//! Each level doubles the vector, writing the pair at consecutive positions
//! so the newest level lands in the least significant index bit.
//!
//! Two numerical domains are provided:
//!
//! - [`linear_capacities`]: probabilities directly, seeded with `1 - eta`.
//!   `2v - v^2` collapses to exactly 1 once `(1 - v)^2` drops below the
//!   mantissa.
//! - [`log_capacities`]: `ln v` with a cancellation-free upgrade, also
//!   seeded with `1 - eta`. The result is mapped through `1 - exp(ℓ)` and
//!   reversed. Near `v = 1` the upgrade and the final mapping go through
//!   `expm1`, so channels stay apart until `ℓ` underflows.
//!
//! The two domains do **not** compute the same quantity. Complementing
//! swaps the children (`1 - v^2 = 2c - c^2`, `1 - (2v - v^2) = c^2` for
//! `c = 1 - v`), and the index reversal `i -> N-1-i` flips every index bit,
//! which swaps them back. So the log output equals the linear recursion
//! seeded with `eta` instead of `1 - eta`:
//!
//! ```text
//! log_capacities(eta)[i] = linear recursion from eta, index i
//! ```
//!
//! That is the ranking of the dual erasure channel. Both rankings agree up
//! to `N = 16`; from `N = 32` they differ in a few mid-reliability pairs
//! (at 0 dB, channels 12/17 and 14/19 swap).
//!
//! [`combined_capacities`] runs both and keeps whichever resolved more
//! distinct values.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::design::{BlockSpec, DesignPoint};
use crate::quad::Quad;
use crate::reliability::{ScoreKind, ScoreVector};
use crate::types::PolarResult;

/// Which Bhattacharyya domain the combiner kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BhattacharyyaDomain {
    Linear,
    Log,
}

/// Outcome of the linear/log comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinerSelection {
    pub linear_distinct: usize,
    pub log_distinct: usize,
    pub selected: BhattacharyyaDomain,
}

/// Expand every value into its (degrade, upgrade) pair.
fn polarize<F, G>(vals: &[Quad], degrade: F, upgrade: G) -> Vec<Quad>
where
    F: Fn(Quad) -> Quad,
    G: Fn(Quad) -> Quad,
{
    let mut out = Vec::with_capacity(2 * vals.len());
    for &v in vals {
        out.push(degrade(v));
        out.push(upgrade(v));
    }
    out
}

/// Check-node child in probability domain.
fn degrade_linear(v: Quad) -> Quad {
    v.square()
}

/// Bit-node child in probability domain.
fn upgrade_linear(v: Quad) -> Quad {
    v.ldexp(1) - v.square()
}

/// `ln(v^2)`.
fn degrade_log(l: Quad) -> Quad {
    l.ldexp(1)
}

/// `ln(2v - v^2) = ℓ + ln2 + ln(1 - exp(ℓ - ln2))`.
///
/// Above `v = 1/2` the same value is taken as `ln(1 - (1 - v)^2)` with
/// `1 - v = -expm1(ℓ)`, which keeps `ℓ` exact as it approaches zero.
fn upgrade_log(l: Quad) -> Quad {
    if l > -Quad::LN_2 {
        let w = -l.exp_m1();
        return Quad::ln_1m(w.square());
    }
    l + Quad::LN_2 + Quad::ln_1m((l - Quad::LN_2).exp())
}

/// `1 - exp(ℓ)`.
fn capacity_from_log(l: Quad) -> Quad {
    -l.exp_m1()
}

/// Probability-domain recursion over `power` levels from `seed`.
pub(crate) fn linear_recursion(seed: Quad, power: u32) -> Vec<Quad> {
    let mut vals = vec![seed];
    for _ in 0..power {
        vals = polarize(&vals, degrade_linear, upgrade_linear);
    }
    vals
}

/// Capacity bounds computed in probability domain.
///
/// Starts from `1 - eta` and returns the length-`N` vector unmodified.
pub fn linear_capacities(block: &BlockSpec, design: &DesignPoint) -> PolarResult<ScoreVector> {
    let vals = linear_recursion(Quad::ONE - design.eta_extended(), block.power());

    let scores = ScoreVector::new(ScoreKind::BhattacharyyaCapacity, vals)?;
    debug!(
        n = block.size(),
        snr_db = design.snr_db(),
        distinct = scores.distinct_count(),
        "bhattacharyya linear"
    );
    Ok(scores)
}

/// Capacity bounds computed in log domain.
///
/// Starts from `ln(1 - eta)`, maps the final log values through
/// `1 - exp(ℓ)` and reverses the vector (`i -> N-1-i`). The result equals
/// [`linear_recursion`] seeded with `eta` up to double-double rounding,
/// i.e. the dual channel, not a re-oriented copy of [`linear_capacities`].
pub fn log_capacities(block: &BlockSpec, design: &DesignPoint) -> PolarResult<ScoreVector> {
    let mut vals = vec![Quad::ln_1m(design.eta_extended())];
    for _ in 0..block.power() {
        vals = polarize(&vals, degrade_log, upgrade_log);
    }

    let mut caps: Vec<Quad> = vals.into_iter().map(capacity_from_log).collect();
    caps.reverse();

    let scores = ScoreVector::new(ScoreKind::BhattacharyyaCapacity, caps)?;
    debug!(
        n = block.size(),
        snr_db = design.snr_db(),
        distinct = scores.distinct_count(),
        "bhattacharyya log"
    );
    Ok(scores)
}

/// Run both domains and keep the one with strictly more distinct values;
/// a tie keeps the log domain.
pub fn combined_capacities(
    block: &BlockSpec,
    design: &DesignPoint,
) -> PolarResult<(ScoreVector, CombinerSelection)> {
    let linear = linear_capacities(block, design)?;
    let log = log_capacities(block, design)?;

    let linear_distinct = linear.distinct_count();
    let log_distinct = log.distinct_count();
    let selected = if linear_distinct > log_distinct {
        BhattacharyyaDomain::Linear
    } else {
        BhattacharyyaDomain::Log
    };

    let n = block.size();
    if linear_distinct < n && log_distinct < n {
        warn!(
            n,
            snr_db = design.snr_db(),
            linear_distinct,
            log_distinct,
            "both Bhattacharyya domains lost channel resolution"
        );
    }
    info!(
        n,
        snr_db = design.snr_db(),
        linear_distinct,
        log_distinct,
        ?selected,
        "bhattacharyya domain selected"
    );

    let selection = CombinerSelection {
        linear_distinct,
        log_distinct,
        selected,
    };
    let scores = match selected {
        BhattacharyyaDomain::Linear => linear,
        BhattacharyyaDomain::Log => log,
    };
    Ok((scores, selection))
}
