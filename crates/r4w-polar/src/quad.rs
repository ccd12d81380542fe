//! Double-Double Extended Precision
//!
//! The Bhattacharyya recursions square probabilities at every polarization
//! level, so values decay doubly-exponentially with depth. Plain `f64`
//! (53-bit mantissa) collapses many synthetic channels onto identical scores
//! long before `N = 1024`. [`Quad`] stores a value as the unevaluated sum of
//! two `f64` limbs (`hi + lo`, `|lo| <= ulp(hi)/2`) which gives roughly 106
//! bits of mantissa with the exponent range of `f64`.
//!
//! ## Precision vs. block size
//!
//! A channel after `m` levels carries terms like `(1 - eta)^(2^m)` and
//! `1 - eta^(2^m)`. Keeping the latter distinct from 1 needs about
//! `2^m · log2(1/eta)` mantissa bits, so no fixed-width format resolves
//! every channel for large `m`. The double-double format keeps all channels
//! distinct up to `N = 64` for design SNRs in [-4, 0] dB and loses
//! resolution gradually beyond that. The combiner in
//! [`crate::construction::bhattacharyya`] uses that loss as its selection
//! signal.
//!
//! ## Example
//!
//! ```rust
//! use r4w_polar::quad::Quad;
//!
//! let third = Quad::ONE.div_f64(3.0);
//! let back = third * Quad::from(3.0);
//! assert!((back - Quad::ONE).to_f64().abs() < 1e-30);
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

/// Exact sum of two doubles: `a + b = s + e`.
#[inline]
fn two_sum(a: f64, b: f64) -> (f64, f64) {
    let s = a + b;
    let bb = s - a;
    let e = (a - (s - bb)) + (b - bb);
    (s, e)
}

/// Exact sum when `|a| >= |b|`.
#[inline]
fn quick_two_sum(a: f64, b: f64) -> (f64, f64) {
    let s = a + b;
    let e = b - (s - a);
    (s, e)
}

/// Exact product via fused multiply-add: `a * b = p + e`.
#[inline]
fn two_prod(a: f64, b: f64) -> (f64, f64) {
    let p = a * b;
    let e = a.mul_add(b, -p);
    (p, e)
}

/// Extended precision value `hi + lo`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Quad {
    hi: f64,
    lo: f64,
}

impl Quad {
    pub const ZERO: Quad = Quad { hi: 0.0, lo: 0.0 };
    pub const ONE: Quad = Quad { hi: 1.0, lo: 0.0 };
    /// ln(2) to double-double precision.
    pub const LN_2: Quad = Quad {
        hi: 0.693_147_180_559_945_3,
        lo: 2.319_046_813_846_299_6e-17,
    };

    /// Terms below this fraction of the running sum no longer affect a
    /// double-double result.
    const SERIES_TOLERANCE: f64 = 1e-36;
    const MAX_EXP_TERMS: u32 = 40;
    const MAX_LOG_TERMS: u32 = 200;
    /// Argument scaling for `exp`: the reduced argument is divided by
    /// `2^EXP_SQUARINGS` and the series result squared back up.
    const EXP_SQUARINGS: i32 = 10;
    const LN_SCALE_BELOW: f64 = 1e-300;
    const LN_SCALE_POWER: i32 = 600;

    /// Build from two limbs, renormalising.
    pub fn new(hi: f64, lo: f64) -> Self {
        let (hi, lo) = two_sum(hi, lo);
        Self { hi, lo }
    }

    /// High limb (the nearest `f64`).
    pub fn hi(self) -> f64 {
        self.hi
    }

    /// Low limb (the rounding residue of `hi`).
    pub fn lo(self) -> f64 {
        self.lo
    }

    /// Round to the nearest `f64`.
    pub fn to_f64(self) -> f64 {
        self.hi + self.lo
    }

    pub fn is_finite(self) -> bool {
        self.hi.is_finite() && self.lo.is_finite()
    }

    pub fn is_nan(self) -> bool {
        self.hi.is_nan() || self.lo.is_nan()
    }

    pub fn abs(self) -> Self {
        if self.hi < 0.0 {
            -self
        } else {
            self
        }
    }

    /// Multiply by `2^k`. Exact unless the result leaves the normal range.
    pub fn ldexp(self, k: i32) -> Self {
        // Two steps so 2^a and 2^b stay representable for |k| up to ~2000.
        let a = k.div_euclid(2);
        let b = k - a;
        let sa = 2.0_f64.powi(a);
        let sb = 2.0_f64.powi(b);
        Self {
            hi: self.hi * sa * sb,
            lo: self.lo * sa * sb,
        }
    }

    /// Divide by a double.
    pub fn div_f64(self, b: f64) -> Self {
        let q1 = self.hi / b;
        let (p1, p2) = two_prod(q1, b);
        let (s, mut e) = two_sum(self.hi, -p1);
        e -= p2;
        e += self.lo;
        let q2 = (s + e) / b;
        let (hi, lo) = quick_two_sum(q1, q2);
        Self { hi, lo }
    }

    /// `self * self`.
    pub fn square(self) -> Self {
        self * self
    }

    /// Natural exponential.
    ///
    /// Reduces `x = k·ln2 + r`, evaluates `expm1(r / 2^10)` by its Taylor
    /// series and undoes the scaling with `(1 + s)^2 - 1 = 2s + s^2`, which
    /// never forms the cancelling `1 + s` until the end.
    pub fn exp(self) -> Self {
        if self.hi > 709.78 {
            return Self {
                hi: f64::INFINITY,
                lo: 0.0,
            };
        }
        if self.hi < -745.2 {
            return Self::ZERO;
        }

        let k = (self.hi / Self::LN_2.hi).round();
        let r = self - Self::LN_2 * Quad::from(k);
        (Self::expm1_reduced(r) + Self::ONE).ldexp(k as i32)
    }

    /// `exp(x) - 1` without cancellation for small `|x|`.
    pub fn exp_m1(self) -> Self {
        // x^2/2 is below the low limb
        if self.hi.abs() < 1e-32 {
            return self;
        }
        if self.hi.abs() < 0.5 {
            return Self::expm1_reduced(self);
        }
        self.exp() - Self::ONE
    }

    /// Taylor series on `r / 2^10`, then undo the scaling with
    /// `e^{2x} - 1 = 2s + s^2`. Used for `|r| < 0.5`.
    fn expm1_reduced(r: Quad) -> Self {
        let r = r.ldexp(-Self::EXP_SQUARINGS);
        let mut sum = r;
        let mut term = r;
        let mut i = 2u32;
        loop {
            term = (term * r).div_f64(f64::from(i));
            sum = sum + term;
            if term.hi.abs() <= Self::SERIES_TOLERANCE * sum.hi.abs().max(1e-300)
                || i > Self::MAX_EXP_TERMS
            {
                break;
            }
            i += 1;
        }

        for _ in 0..Self::EXP_SQUARINGS {
            sum = sum.ldexp(1) + sum * sum;
        }
        sum
    }

    /// Natural logarithm. One Newton step on `exp` from the `f64` estimate.
    ///
    /// Returns `-inf` for zero and NaN for negative input.
    pub fn ln(self) -> Self {
        if self.hi == 0.0 {
            return Self {
                hi: f64::NEG_INFINITY,
                lo: 0.0,
            };
        }
        if self.hi < 0.0 || self.is_nan() {
            return Self {
                hi: f64::NAN,
                lo: f64::NAN,
            };
        }
        if self.hi.is_infinite() {
            return self;
        }
        // exp(-y) below would overflow; ln(x) = ln(x · 2^k) - k·ln2
        if self.hi < Self::LN_SCALE_BELOW {
            let k = Self::LN_SCALE_POWER;
            return self.ldexp(k).ln() - Self::LN_2 * Quad::from(f64::from(k));
        }

        let y = Quad::from(self.hi.ln());
        y + self * (-y).exp() - Self::ONE
    }

    /// `ln(1 - u)` for `0 <= u < 1`.
    ///
    /// Small `u` goes through the series `-(u + u^2/2 + u^3/3 + ...)` so that
    /// results near zero keep their relative precision.
    pub fn ln_1m(u: Quad) -> Self {
        if u.hi < 0.0625 {
            let mut sum = -u;
            let mut power = u;
            let mut k = 2u32;
            loop {
                power = power * u;
                let term = power.div_f64(f64::from(k));
                sum = sum - term;
                if term.hi.abs() <= Self::SERIES_TOLERANCE * sum.hi.abs()
                    || k > Self::MAX_LOG_TERMS
                {
                    break;
                }
                k += 1;
            }
            return sum;
        }
        (Self::ONE - u).ln()
    }
}

impl From<f64> for Quad {
    fn from(v: f64) -> Self {
        Self { hi: v, lo: 0.0 }
    }
}

impl Add for Quad {
    type Output = Quad;

    fn add(self, rhs: Quad) -> Quad {
        let (s, mut e) = two_sum(self.hi, rhs.hi);
        let (t, f) = two_sum(self.lo, rhs.lo);
        e += t;
        let (s, mut e) = quick_two_sum(s, e);
        e += f;
        let (hi, lo) = quick_two_sum(s, e);
        Quad { hi, lo }
    }
}

impl Neg for Quad {
    type Output = Quad;

    fn neg(self) -> Quad {
        Quad {
            hi: -self.hi,
            lo: -self.lo,
        }
    }
}

impl Sub for Quad {
    type Output = Quad;

    fn sub(self, rhs: Quad) -> Quad {
        self + (-rhs)
    }
}

impl Mul for Quad {
    type Output = Quad;

    fn mul(self, rhs: Quad) -> Quad {
        let (p, mut e) = two_prod(self.hi, rhs.hi);
        e += self.hi * rhs.lo + self.lo * rhs.hi;
        let (hi, lo) = quick_two_sum(p, e);
        Quad { hi, lo }
    }
}

impl PartialEq for Quad {
    fn eq(&self, other: &Self) -> bool {
        self.hi == other.hi && self.lo == other.lo
    }
}

impl PartialOrd for Quad {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match self.hi.partial_cmp(&other.hi)? {
            Ordering::Equal => self.lo.partial_cmp(&other.lo),
            ord => Some(ord),
        }
    }
}

impl fmt::Display for Quad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.lo == 0.0 {
            write!(f, "{:e}", self.hi)
        } else {
            write!(f, "{:e} {:+e}", self.hi, self.lo)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_prod_is_exact() {
        let a = 1.0 + f64::EPSILON;
        let (p, e) = two_prod(a, a);
        // (1+eps)^2 = 1 + 2eps + eps^2, the eps^2 part lands in e
        assert_eq!(p, 1.0 + 2.0 * f64::EPSILON);
        assert_eq!(e, f64::EPSILON * f64::EPSILON);
    }

    #[test]
    fn test_add_keeps_small_residue() {
        let sum = Quad::ONE + Quad::from(1e-20);
        assert_eq!(sum.hi(), 1.0);
        assert_eq!(sum.lo(), 1e-20);
        let back = sum - Quad::ONE;
        assert_eq!(back.to_f64(), 1e-20);
    }

    #[test]
    fn test_complement_square_resolves_below_f64() {
        // 2v - v^2 for v = 1 - 1e-10 is 1 - 1e-20: exactly 1.0 in f64.
        let v = Quad::ONE - Quad::from(1e-10);
        let up = v.ldexp(1) - v.square();
        assert_eq!(up.hi(), 1.0);
        let gap = (Quad::ONE - up).to_f64();
        assert!((gap - 1e-20).abs() < 1e-30, "gap = {gap:e}");
    }

    #[test]
    fn test_div_f64() {
        let third = Quad::ONE.div_f64(3.0);
        let err = (third * Quad::from(3.0) - Quad::ONE).to_f64().abs();
        assert!(err < 1e-31, "err = {err:e}");
    }

    #[test]
    fn test_exp_matches_f64() {
        for &x in &[-700.0, -20.0, -1.0, -1e-8, 0.0, 0.5, 1.0, 10.0, 700.0] {
            let e = Quad::from(x).exp().to_f64();
            let reference = x.exp();
            assert!(
                ((e - reference) / reference).abs() < 4.0 * f64::EPSILON,
                "exp({x}) = {e} vs {reference}"
            );
        }
    }

    #[test]
    fn test_exp_m1_small_arguments() {
        for &x in &[1e-40, -1e-20, 1e-10, -3e-5, 0.25, -0.49, 0.7, -2.0] {
            let got = Quad::from(x).exp_m1().to_f64();
            assert!(((got - x.exp_m1()) / x.exp_m1()).abs() < 1e-15, "x = {x}");
        }
        // exp(x) - 1 would round the residue away
        let tiny = Quad::from(-1e-25).exp_m1();
        assert!(((tiny.to_f64() + 1e-25) / 1e-25).abs() < 1e-15);
        assert_eq!((Quad::ONE + tiny).to_f64(), 1.0);
    }

    #[test]
    fn test_exp_limits() {
        assert_eq!(Quad::from(-800.0).exp(), Quad::ZERO);
        assert!(Quad::from(800.0).exp().hi().is_infinite());
    }

    #[test]
    fn test_exp_ln_roundtrip_extended() {
        for &x in &[1e-30, 0.25, 0.5, 0.75, 1.0 + 1e-12, 3.0, 1e30] {
            let q = Quad::from(x) + Quad::from(x * 1e-20);
            let back = q.ln().exp();
            let rel = ((back - q).to_f64() / q.to_f64()).abs();
            assert!(rel < 1e-29, "x = {x}, rel = {rel:e}");
        }
    }

    #[test]
    fn test_ln_known_values() {
        assert_eq!(Quad::ONE.ln().to_f64(), 0.0);
        let ln2 = Quad::from(2.0).ln();
        assert!((ln2 - Quad::LN_2).to_f64().abs() < 1e-31);
        assert!(Quad::ZERO.ln().hi().is_infinite());
        assert!(Quad::from(-1.0).ln().is_nan());
    }

    #[test]
    fn test_ln_of_tiny_and_subnormal() {
        for &x in &[1e-300, 1.5e-308, 1e-310, 5e-324] {
            let got = Quad::from(x).ln();
            assert!(got.is_finite(), "x = {x}");
            assert!(((got.to_f64() - x.ln()) / x.ln()).abs() < 1e-15, "x = {x}");
        }
        // Low limb survives the rescaling
        let x = Quad::new(1e-305, 1e-322);
        assert!(x.ln() > Quad::from(1e-305).ln());
    }

    #[test]
    fn test_ln_1m_small_argument() {
        // ln(1 - 1e-25) = -1e-25 - 5e-51
        let r = Quad::ln_1m(Quad::from(1e-25));
        assert!((r.to_f64() + 1e-25).abs() < 1e-40);
        // Large branch agrees with ln of the complement
        let u = Quad::from(0.3);
        let direct = (Quad::ONE - u).ln();
        assert_eq!(Quad::ln_1m(u), direct);
        // Branches meet at the switch point
        let below = Quad::ln_1m(Quad::from(0.0625 - 1e-12)).to_f64();
        let above = Quad::ln_1m(Quad::from(0.0625)).to_f64();
        assert!((below - above).abs() < 1e-11);
    }

    #[test]
    fn test_ordering_uses_low_limb() {
        let a = Quad::ONE;
        let b = Quad::ONE + Quad::from(1e-25);
        assert!(a < b);
        assert!(b > a);
        assert_ne!(a, b);
        assert_eq!(Quad::new(0.0, -0.0), Quad::ZERO);
    }

    #[test]
    fn test_ldexp_negative_odd() {
        let q = Quad::from(3.0).ldexp(-11);
        assert_eq!(q.to_f64(), 3.0 / 2048.0);
        let q = Quad::from(1.5).ldexp(1023);
        assert_eq!(q.to_f64(), 1.5 * 2.0_f64.powi(1023));
    }
}
