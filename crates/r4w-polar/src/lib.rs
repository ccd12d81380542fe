//! # Polar Code Channel Construction
//!
//! Ranks the `N = 2^m` synthetic channels produced by polarizing a binary
//! channel, so an `(N, K)` polar code can freeze the `N - K` least reliable
//! positions and carry data on the rest.
//!
//! ## Overview
//!
//! A construction takes a block size and a design SNR and produces one
//! reliability score per channel, an ascending ordering of the channels, and
//! frozen/information index sets derived from that ordering. Four estimators
//! are available:
//!
//! - **Bhattacharyya, linear**: erasure bound on probabilities
//! - **Bhattacharyya, log**: the same bound on log values
//! - **Bhattacharyya, combined**: runs both, keeps the better resolved one
//! - **Gaussian Approximation**: mean-LLR density evolution
//!
//! ## Pipeline
//!
//! ```text
//! (N, SNR) → BlockSpec + DesignPoint → estimator → ScoreVector
//!          → SortedOrder (least reliable first) → FrozenSet / information set
//! ```
//!
//! ## Example
//!
//! ```rust
//! use r4w_polar::prelude::*;
//!
//! let cc = Construction::for_block(Method::GaussianApproximation, 8, 0.0).unwrap();
//! assert_eq!(cc.sorted_channels().as_slice(), &[0, 1, 2, 4, 3, 5, 6, 7]);
//!
//! // (8, 4) code
//! assert_eq!(cc.information_positions(4).unwrap(), vec![3, 5, 6, 7]);
//! assert_eq!(frozen_bits(8, 4, 0.0).unwrap(), vec![0, 1, 2, 4]);
//! ```

pub mod config;
pub mod construction;
pub mod design;
pub mod observe;
pub mod quad;
pub mod reliability;
pub mod types;

pub use construction::{frozen_bits, CapacityEstimator, Construction, Method};
pub use design::{BlockSpec, DesignPoint};
pub use quad::Quad;
pub use reliability::{FrozenSet, ScoreKind, ScoreVector, SortedOrder};
pub use types::{PolarError, PolarResult};

/// Prelude for common imports
pub mod prelude {
    pub use crate::construction::{
        frozen_bits, BhattacharyyaDomain, CapacityEstimator, CombinerSelection, Construction,
        Method,
    };
    pub use crate::design::{BlockSpec, DesignPoint};
    pub use crate::reliability::{sorted_channels, FrozenSet, ScoreKind, ScoreVector, SortedOrder};
    pub use crate::types::{PolarError, PolarResult};
}
