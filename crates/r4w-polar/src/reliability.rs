//! Reliability metric shared by every estimator
//!
//! An estimator produces a [`ScoreVector`]: one score per synthetic channel
//! in natural index order. Every estimator in this crate follows the same
//! convention, **a higher score means a more reliable channel**:
//!
//! | Kind | Value | Range |
//! |------|-------|-------|
//! | [`ScoreKind::BhattacharyyaCapacity`] | erasure-equivalent capacity bound | `[0, 1]` |
//! | [`ScoreKind::MeanLlr`] | Gaussian Approximation mean LLR | `[0, ∞)` |
//!
//! Sorting ascending therefore lists the least reliable channels first, and
//! the frozen set is always a prefix of that ordering.
//!
//! ```text
//! scores:        [0.31, 0.81, 0.88, 0.99]
//! SortedOrder:   [0, 1, 2, 3]        (ascending, stable on index)
//! FrozenSet(2):  [0, 1]              (first k of SortedOrder)
//! information:   [2, 3]
//! ```

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::quad::Quad;
use crate::types::{PolarError, PolarResult};

/// What the values in a [`ScoreVector`] measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreKind {
    /// Complement of the Bhattacharyya parameter bound.
    BhattacharyyaCapacity,
    /// Mean log-likelihood ratio from density evolution.
    MeanLlr,
}

/// Per-channel reliability scores in natural channel order.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreVector {
    kind: ScoreKind,
    values: Vec<Quad>,
}

impl ScoreVector {
    /// Wrap extended-precision scores. Non-finite scores are rejected.
    pub fn new(kind: ScoreKind, values: Vec<Quad>) -> PolarResult<Self> {
        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(PolarError::numeric("score", bad.hi()));
        }
        Ok(Self { kind, values })
    }

    /// Wrap `f64` scores. Non-finite scores are rejected.
    pub fn from_f64(kind: ScoreKind, values: Vec<f64>) -> PolarResult<Self> {
        Self::new(kind, values.into_iter().map(Quad::from).collect())
    }

    pub fn kind(&self) -> ScoreKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Quad> {
        self.values.get(index).copied()
    }

    pub fn as_slice(&self) -> &[Quad] {
        &self.values
    }

    /// Scores rounded to `f64`.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        self.values.iter().map(|v| v.to_f64()).collect()
    }

    /// Number of distinct scores at full stored precision.
    ///
    /// Fewer distinct values than channels means the recursion lost the
    /// ability to tell some channels apart.
    pub fn distinct_count(&self) -> usize {
        let mut sorted = self.values.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        sorted.dedup();
        sorted.len()
    }
}

/// Channel indices ordered from least to most reliable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortedOrder(Vec<usize>);

impl SortedOrder {
    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<usize> {
        self.0
    }

    /// The `k` least reliable channels.
    pub fn frozen(&self, k: usize) -> PolarResult<FrozenSet> {
        if k > self.0.len() {
            return Err(PolarError::FrozenCountExceedsBlock {
                requested: k,
                block_size: self.0.len(),
            });
        }
        Ok(FrozenSet {
            ranked: self.0[..k].to_vec(),
            block_size: self.0.len(),
        })
    }
}

/// Frozen channel positions, a prefix of a [`SortedOrder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrozenSet {
    ranked: Vec<usize>,
    block_size: usize,
}

impl FrozenSet {
    /// Positions in ranking order (least reliable first).
    pub fn ranked(&self) -> &[usize] {
        &self.ranked
    }

    /// Positions in ascending index order.
    pub fn sorted(&self) -> Vec<usize> {
        let mut pos = self.ranked.clone();
        pos.sort_unstable();
        pos
    }

    pub fn len(&self) -> usize {
        self.ranked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn contains(&self, index: usize) -> bool {
        self.ranked.contains(&index)
    }

    /// Frozen bit mask over the block (true = frozen).
    pub fn mask(&self) -> Vec<bool> {
        let mut mask = vec![false; self.block_size];
        for &pos in &self.ranked {
            mask[pos] = true;
        }
        mask
    }

    /// The complement: information positions in ascending order.
    pub fn information_positions(&self) -> Vec<usize> {
        let mask = self.mask();
        (0..self.block_size).filter(|&i| !mask[i]).collect()
    }
}

/// Sort channel indices by ascending score. Ties keep ascending index order.
pub fn sorted_channels(scores: &ScoreVector) -> SortedOrder {
    let values = scores.as_slice();
    let mut indices: Vec<usize> = (0..values.len()).collect();
    // sort_by is stable, so equal scores keep index order
    indices.sort_by(|&a, &b| {
        values[a]
            .partial_cmp(&values[b])
            .unwrap_or(Ordering::Equal)
    });
    SortedOrder(indices)
}

/// The `k` lowest-scoring channels.
pub fn frozen_bit_positions(scores: &ScoreVector, k: usize) -> PolarResult<FrozenSet> {
    sorted_channels(scores).frozen(k)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn scores(values: &[f64]) -> ScoreVector {
        ScoreVector::from_f64(ScoreKind::BhattacharyyaCapacity, values.to_vec()).unwrap()
    }

    #[test]
    fn test_sorted_channels_ascending() {
        let s = scores(&[0.9, 0.1, 0.5, 0.3]);
        assert_eq!(sorted_channels(&s).as_slice(), &[1, 3, 2, 0]);
    }

    #[test]
    fn test_ties_break_on_index() {
        let s = scores(&[0.5, 0.2, 0.5, 0.2, 0.5]);
        assert_eq!(sorted_channels(&s).as_slice(), &[1, 3, 0, 2, 4]);
    }

    #[test]
    fn test_ties_resolved_by_low_limb() {
        let values = vec![Quad::ONE + Quad::from(1e-20), Quad::ONE, Quad::ONE];
        let s = ScoreVector::new(ScoreKind::BhattacharyyaCapacity, values).unwrap();
        assert_eq!(sorted_channels(&s).as_slice(), &[1, 2, 0]);
        assert_eq!(s.distinct_count(), 2);
    }

    #[test]
    fn test_frozen_prefix() {
        let s = scores(&[0.9, 0.1, 0.5, 0.3]);
        let frozen = frozen_bit_positions(&s, 2).unwrap();
        assert_eq!(frozen.ranked(), &[1, 3]);
        assert_eq!(frozen.sorted(), vec![1, 3]);
        assert_eq!(frozen.information_positions(), vec![0, 2]);
        assert_eq!(frozen.mask(), vec![false, true, false, true]);
        assert!(frozen.contains(3));
        assert!(!frozen.contains(0));
    }

    #[test]
    fn test_frozen_bounds() {
        let s = scores(&[0.9, 0.1, 0.5, 0.3]);
        assert!(frozen_bit_positions(&s, 0).unwrap().is_empty());
        assert_eq!(frozen_bit_positions(&s, 4).unwrap().len(), 4);
        assert_eq!(
            frozen_bit_positions(&s, 5),
            Err(PolarError::FrozenCountExceedsBlock {
                requested: 5,
                block_size: 4
            })
        );
    }

    #[test]
    fn test_non_finite_scores_rejected() {
        let err = ScoreVector::from_f64(ScoreKind::MeanLlr, vec![1.0, f64::NAN]).unwrap_err();
        assert!(matches!(err, PolarError::NumericEvaluation { .. }));
        assert!(ScoreVector::from_f64(ScoreKind::MeanLlr, vec![f64::INFINITY]).is_err());
    }

    #[test]
    fn test_random_scores_frozen_is_k_smallest() {
        let mut rng = StdRng::seed_from_u64(0x9e37_79b9);
        for _ in 0..50 {
            let n = 1 << rng.gen_range(1..8);
            // Coarse grid so ties occur
            let values: Vec<f64> = (0..n).map(|_| f64::from(rng.gen_range(0..16u8))).collect();
            let s = scores(&values);
            let order = sorted_channels(&s);

            let mut seen = vec![false; n];
            for &i in order.as_slice() {
                assert!(!seen[i]);
                seen[i] = true;
            }
            assert!(seen.iter().all(|&x| x));

            let k = rng.gen_range(0..=n);
            let frozen = frozen_bit_positions(&s, k).unwrap();
            let mut expected: Vec<usize> = (0..n).collect();
            expected.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap().then(a.cmp(&b)));
            assert_eq!(frozen.ranked(), &expected[..k]);
        }
    }
}
