//! Core types for polar channel construction
//!
//! Errors are explicit and distinct: a construction either produces a fully
//! finite reliability ranking or fails with one of the variants below. No
//! NaN or infinity is ever handed to a caller inside a score vector.

/// Result type for construction operations
pub type PolarResult<T> = Result<T, PolarError>;

/// Errors that can occur while constructing a polar code
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PolarError {
    #[error("Invalid block size: {0}. Must be a power of two >= 2")]
    InvalidBlockSize(usize),

    #[error(
        "Invalid block power: {0}. Must be between 1 and {max}",
        max = crate::design::MAX_BLOCK_POWER
    )]
    InvalidBlockPower(u32),

    #[error("Degenerate design point at {snr_db} dB: {reason}")]
    DegenerateDesignPoint { snr_db: f64, reason: String },

    #[error("Numeric evaluation of {function}({argument}) did not produce a finite value")]
    NumericEvaluation {
        function: &'static str,
        argument: f64,
    },

    #[error("Requested {requested} frozen positions but the block only has {block_size}")]
    FrozenCountExceedsBlock { requested: usize, block_size: usize },
}

impl PolarError {
    pub(crate) fn numeric(function: &'static str, argument: f64) -> Self {
        PolarError::NumericEvaluation { function, argument }
    }

    pub(crate) fn degenerate(snr_db: f64, reason: impl Into<String>) -> Self {
        PolarError::DegenerateDesignPoint {
            snr_db,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let e = PolarError::InvalidBlockSize(12);
        assert_eq!(e.to_string(), "Invalid block size: 12. Must be a power of two >= 2");

        let e = PolarError::FrozenCountExceedsBlock {
            requested: 9,
            block_size: 8,
        };
        assert!(e.to_string().contains("9 frozen positions"));

        let e = PolarError::numeric("phi", -3.0);
        assert!(e.to_string().contains("phi(-3)"));
    }

    #[test]
    fn test_errors_are_distinct() {
        let a = PolarError::InvalidBlockSize(3);
        let b = PolarError::degenerate(f64::NEG_INFINITY, "eta >= 1");
        assert_ne!(a, b);
        assert!(matches!(b, PolarError::DegenerateDesignPoint { .. }));
    }
}
