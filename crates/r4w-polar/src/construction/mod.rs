//! Polar Channel Construction
//!
//! Ranks the `N` synthetic channels of a polar code by reliability for a
//! given design SNR. The ranking decides which positions are frozen and
//! which carry information; it is computed once per `(N, design SNR)` and
//! handed to an encoder/decoder as plain index lists.
//!
//! ## Available Methods
//!
//! - [`Method::BhattacharyyaLinear`] - erasure bound in probability domain
//! - [`Method::BhattacharyyaLog`] - erasure bound in log domain
//! - [`Method::Bhattacharyya`] - both domains, keeps the better resolved one
//! - [`Method::GaussianApproximation`] - mean-LLR density evolution
//!
//! All methods follow the same score convention (higher = more reliable),
//! so the frozen set is always the head of the ascending ordering.
//!
//! ## Usage
//!
//! ```rust
//! use r4w_polar::construction::{Construction, Method};
//! use r4w_polar::design::{BlockSpec, DesignPoint};
//!
//! let block = BlockSpec::from_size(16).unwrap();
//! let design = DesignPoint::new(0.0).unwrap();
//! let cc = Construction::build(Method::Bhattacharyya, block, design).unwrap();
//!
//! // (16, 8) code: freeze the 8 least reliable channels
//! let frozen = cc.frozen_bit_positions(8).unwrap();
//! assert_eq!(frozen.sorted(), vec![0, 1, 2, 3, 4, 5, 6, 8]);
//! assert_eq!(cc.information_positions(8).unwrap(), vec![7, 9, 10, 11, 12, 13, 14, 15]);
//! ```

pub mod bhattacharyya;
pub mod gaussian;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::design::{BlockSpec, DesignPoint};
use crate::reliability::{sorted_channels, FrozenSet, ScoreKind, ScoreVector, SortedOrder};
use crate::types::{PolarError, PolarResult};

pub use bhattacharyya::{BhattacharyyaDomain, CombinerSelection};

/// Channel construction method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    BhattacharyyaLinear,
    BhattacharyyaLog,
    Bhattacharyya,
    GaussianApproximation,
}

impl Default for Method {
    fn default() -> Self {
        Method::Bhattacharyya
    }
}

impl Method {
    pub const ALL: [Method; 4] = [
        Method::BhattacharyyaLinear,
        Method::BhattacharyyaLog,
        Method::Bhattacharyya,
        Method::GaussianApproximation,
    ];
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::BhattacharyyaLinear => write!(f, "bhattacharyya_linear"),
            Method::BhattacharyyaLog => write!(f, "bhattacharyya_log"),
            Method::Bhattacharyya => write!(f, "bhattacharyya"),
            Method::GaussianApproximation => write!(f, "gaussian_approximation"),
        }
    }
}

/// Method-specific part of a construction: the score vector.
pub trait CapacityEstimator {
    /// Per-channel scores in natural order, higher = more reliable.
    fn calculate_capacities(
        &self,
        block: &BlockSpec,
        design: &DesignPoint,
    ) -> PolarResult<ScoreVector>;
}

impl CapacityEstimator for Method {
    fn calculate_capacities(
        &self,
        block: &BlockSpec,
        design: &DesignPoint,
    ) -> PolarResult<ScoreVector> {
        match self {
            Method::BhattacharyyaLinear => bhattacharyya::linear_capacities(block, design),
            Method::BhattacharyyaLog => bhattacharyya::log_capacities(block, design),
            Method::Bhattacharyya => {
                bhattacharyya::combined_capacities(block, design).map(|(scores, _)| scores)
            }
            Method::GaussianApproximation => gaussian::mean_llrs(block, design),
        }
    }
}

/// A finished channel construction.
///
/// Built once by [`Construction::build`]; read-only afterwards.
#[derive(Debug, Clone)]
pub struct Construction {
    method: Method,
    block: BlockSpec,
    design: DesignPoint,
    scores: ScoreVector,
    order: SortedOrder,
    selection: Option<CombinerSelection>,
}

impl Construction {
    /// Compute scores and ordering for `(block, design)` with `method`.
    pub fn build(method: Method, block: BlockSpec, design: DesignPoint) -> PolarResult<Self> {
        let (scores, selection) = match method {
            Method::Bhattacharyya => {
                let (scores, selection) = bhattacharyya::combined_capacities(&block, &design)?;
                (scores, Some(selection))
            }
            _ => (method.calculate_capacities(&block, &design)?, None),
        };
        let order = sorted_channels(&scores);

        debug!(
            %method,
            n = block.size(),
            snr_db = design.snr_db(),
            "channel construction complete"
        );

        Ok(Self {
            method,
            block,
            design,
            scores,
            order,
            selection,
        })
    }

    /// Validate `(n, snr_db)` and build.
    pub fn for_block(method: Method, n: usize, snr_db: f64) -> PolarResult<Self> {
        Self::build(method, BlockSpec::from_size(n)?, DesignPoint::new(snr_db)?)
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn block(&self) -> &BlockSpec {
        &self.block
    }

    pub fn design(&self) -> &DesignPoint {
        &self.design
    }

    pub fn scores(&self) -> &ScoreVector {
        &self.scores
    }

    /// Channels from least to most reliable.
    pub fn sorted_channels(&self) -> &SortedOrder {
        &self.order
    }

    /// The `k` least reliable channels.
    pub fn frozen_bit_positions(&self, k: usize) -> PolarResult<FrozenSet> {
        self.order.frozen(k)
    }

    /// Ascending positions of the `k` most reliable channels.
    pub fn information_positions(&self, k: usize) -> PolarResult<Vec<usize>> {
        let n = self.block.size();
        if k > n {
            return Err(PolarError::FrozenCountExceedsBlock {
                requested: k,
                block_size: n,
            });
        }
        Ok(self.frozen_bit_positions(n - k)?.information_positions())
    }

    /// Scores on the `[0, 1]` capacity scale. Bhattacharyya scores already
    /// are; mean LLRs go through `erf(sqrt(z / 2))`.
    pub fn capacities(&self) -> Vec<f64> {
        let values = self.scores.to_f64_vec();
        match self.scores.kind() {
            ScoreKind::BhattacharyyaCapacity => values,
            ScoreKind::MeanLlr => gaussian::capacity_scale(&values),
        }
    }

    /// Linear/log comparison, for [`Method::Bhattacharyya`] only.
    pub fn selection(&self) -> Option<&CombinerSelection> {
        self.selection.as_ref()
    }
}

/// Ascending frozen positions of an `(n, k)` code at `design_snr_db`,
/// using the combined Bhattacharyya construction.
pub fn frozen_bits(n: usize, k: usize, design_snr_db: f64) -> PolarResult<Vec<usize>> {
    if k > n {
        return Err(PolarError::FrozenCountExceedsBlock {
            requested: k,
            block_size: n,
        });
    }
    let cc = Construction::for_block(Method::Bhattacharyya, n, design_snr_db)?;
    Ok(cc.frozen_bit_positions(n - k)?.sorted())
}
