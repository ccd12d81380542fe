//! Block size and design point
//!
//! [`BlockSpec`] fixes the code length `N = 2^m`; [`DesignPoint`] fixes the
//! design SNR and everything derived from it. Both validate on construction
//! and are immutable afterwards.
//!
//! ## Example
//!
//! ```rust
//! use r4w_polar::design::{BlockSpec, DesignPoint};
//!
//! let block = BlockSpec::from_size(1024).unwrap();
//! assert_eq!(block.power(), 10);
//!
//! let design = DesignPoint::new(0.0).unwrap();
//! assert!((design.eta() - (-2.0_f64).exp()).abs() < 1e-15);
//! assert_eq!(design.initial_mean_llr(), 4.0);
//!
//! assert!(BlockSpec::from_size(1000).is_err());
//! ```

use crate::quad::Quad;
use crate::types::{PolarError, PolarResult};

/// Largest supported block power (`N = 2^30`).
pub const MAX_BLOCK_POWER: u32 = 30;

/// Code length `N = 2^m`, `m >= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockSpec {
    power: u32,
}

impl BlockSpec {
    /// Create from the block power `m`.
    pub fn from_power(power: u32) -> PolarResult<Self> {
        if power == 0 || power > MAX_BLOCK_POWER {
            return Err(PolarError::InvalidBlockPower(power));
        }
        Ok(Self { power })
    }

    /// Create from the block size `N`. Anything but an exact power of two
    /// `>= 2` is rejected.
    pub fn from_size(size: usize) -> PolarResult<Self> {
        if size < 2 || !size.is_power_of_two() {
            return Err(PolarError::InvalidBlockSize(size));
        }
        let power = size.trailing_zeros();
        if power > MAX_BLOCK_POWER {
            return Err(PolarError::InvalidBlockSize(size));
        }
        Ok(Self { power })
    }

    /// Block power `m = log2(N)`, also the number of polarization levels.
    pub fn power(&self) -> u32 {
        self.power
    }

    /// Block size `N`.
    pub fn size(&self) -> usize {
        1usize << self.power
    }
}

/// Design SNR and its derived channel parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DesignPoint {
    snr_db: f64,
    snr_linear: f64,
    eta: Quad,
    noise_variance: f64,
    initial_mean_llr: f64,
}

impl DesignPoint {
    /// Design SNR at which uncoded BER reaches 0.5. Documented floor, not
    /// enforced.
    pub const SHANNON_LIMIT_DB: f64 = -1.5917;

    /// Derive the channel parameters for `snr_db`.
    ///
    /// - `eta = exp(-2 · 10^(snr/10))`, the erasure-equivalent Bhattacharyya
    ///   parameter at code rate 1.
    /// - noise variance `sigma² = 1 / (2 · 10^(snr/10))` of the equivalent
    ///   BPSK/AWGN channel, giving an initial mean LLR of
    ///   `2 / sigma² = 4 · 10^(snr/10)`.
    pub fn new(snr_db: f64) -> PolarResult<Self> {
        if snr_db.is_nan() {
            return Err(PolarError::degenerate(snr_db, "design SNR is NaN"));
        }

        let snr_linear = 10.0_f64.powf(snr_db / 10.0);
        let eta = Quad::from(-2.0 * snr_linear).exp();
        if !(eta < Quad::ONE) {
            return Err(PolarError::degenerate(snr_db, "eta >= 1"));
        }

        let noise_variance = 1.0 / (2.0 * snr_linear);
        // 2 / sigma²
        let initial_mean_llr = 4.0 * snr_linear;
        if !initial_mean_llr.is_finite() {
            return Err(PolarError::degenerate(
                snr_db,
                "initial mean LLR is not finite",
            ));
        }

        Ok(Self {
            snr_db,
            snr_linear,
            eta,
            noise_variance,
            initial_mean_llr,
        })
    }

    pub fn snr_db(&self) -> f64 {
        self.snr_db
    }

    pub fn snr_linear(&self) -> f64 {
        self.snr_linear
    }

    /// Erasure-equivalent parameter, rounded to `f64`.
    pub fn eta(&self) -> f64 {
        self.eta.to_f64()
    }

    /// Erasure-equivalent parameter in extended precision.
    pub fn eta_extended(&self) -> Quad {
        self.eta
    }

    /// AWGN noise variance of the equivalent BPSK channel,
    /// `1 / (2 · 10^(snr/10))`.
    ///
    /// This is deliberately not `4 · 10^(snr/10)`, the value commonly quoted
    /// as `sigma²` for this construction: seeding the
    /// Gaussian Approximation with that value makes every mean LLR fall as
    /// the design SNR rises. `4 · 10^(snr/10)` is kept as the initial mean
    /// LLR `2 / sigma²` instead, see [`DesignPoint::initial_mean_llr`].
    pub fn noise_variance(&self) -> f64 {
        self.noise_variance
    }

    /// Mean LLR of the unpolarized channel, the Gaussian Approximation seed.
    pub fn initial_mean_llr(&self) -> f64 {
        self.initial_mean_llr
    }
}
