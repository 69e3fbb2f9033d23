// ========================================================================================
//
//                      Analytic power of a two-sided additive association test
//
// ========================================================================================
//
// Under `y = beta * g + e`, `e ~ N(0, sigma^2)`, with allele dosage `g` drawn at
// Hardy-Weinberg equilibrium, the Wald statistic for `beta` is approximately
// `N(ncp, 1)` where `ncp = beta * sqrt(n * 2 * maf * (1 - maf)) / sigma`. Power is
// the mass of that distribution beyond the two-sided critical value.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use thiserror::Error;

/// Residual noise scale used when the caller does not supply one.
pub const DEFAULT_SIGMA: f64 = 1.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PowerError {
    #[error("Sample size must be a finite, non-negative number, but was {0}.")]
    SampleSize(f64),
    #[error("Minor allele frequency must lie in (0, 0.5], but was {0}.")]
    MinorAlleleFrequency(f64),
    #[error("Effect size must be finite, but was {0}.")]
    EffectSize(f64),
    #[error("Significance threshold must lie strictly between 0 and 1, but was {0}.")]
    Threshold(f64),
    #[error("Residual noise scale must be finite and positive, but was {0}.")]
    NoiseScale(f64),
}

/// One fully specified power query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerInputs {
    pub n: f64,
    pub maf: f64,
    pub beta: f64,
    pub p_thr: f64,
    pub sigma: f64,
}

impl PowerInputs {
    /// Builds a query with unit residual noise.
    pub fn new(n: f64, maf: f64, beta: f64, p_thr: f64) -> Self {
        Self {
            n,
            maf,
            beta,
            p_thr,
            sigma: DEFAULT_SIGMA,
        }
    }

    pub fn with_sigma(self, sigma: f64) -> Self {
        Self { sigma, ..self }
    }

    pub fn with_beta(self, beta: f64) -> Self {
        Self { beta, ..self }
    }

    pub fn with_maf(self, maf: f64) -> Self {
        Self { maf, ..self }
    }

    /// Rejects any input outside its mathematical domain. NaN fails every check.
    pub fn validate(&self) -> Result<(), PowerError> {
        if !(self.n.is_finite() && self.n >= 0.0) {
            return Err(PowerError::SampleSize(self.n));
        }
        if !(self.maf > 0.0 && self.maf <= 0.5) {
            return Err(PowerError::MinorAlleleFrequency(self.maf));
        }
        if !self.beta.is_finite() {
            return Err(PowerError::EffectSize(self.beta));
        }
        if !(self.p_thr > 0.0 && self.p_thr < 1.0) {
            return Err(PowerError::Threshold(self.p_thr));
        }
        if !(self.sigma.is_finite() && self.sigma > 0.0) {
            return Err(PowerError::NoiseScale(self.sigma));
        }
        Ok(())
    }

    /// Mean shift of the test statistic under the alternative.
    pub fn noncentrality(&self) -> f64 {
        self.beta * (self.n * genotype_variance(self.maf)).sqrt() / self.sigma
    }

    pub fn power(&self) -> Result<f64, PowerError> {
        self.validate()?;
        let normal = standard_normal();

        let z_cut = critical_value(&normal, self.p_thr);
        let ncp = self.noncentrality();

        // SF(z_cut - ncp) is evaluated as CDF(ncp - z_cut) to keep precision in the tail.
        let upper = normal.cdf(ncp - z_cut);
        let lower = normal.cdf(-z_cut - ncp);
        let power = (upper + lower).clamp(0.0, 1.0);

        log::debug!(
            "n={} maf={} beta={} p_thr={:e} sigma={} -> z_cut={z_cut:.6} ncp={ncp:.6} power={power:.6e}",
            self.n,
            self.maf,
            self.beta,
            self.p_thr,
            self.sigma,
        );
        Ok(power)
    }
}

/// Power of the two-sided test of `beta` at threshold `p_thr`.
///
/// Returns a probability in `[0, 1]`, or a [`PowerError`] naming the first input
/// that lies outside its domain. With `beta == 0` or `n == 0` the result equals
/// `p_thr`, the false-positive rate under the null.
pub fn power(n: f64, maf: f64, beta: f64, p_thr: f64, sigma: f64) -> Result<f64, PowerError> {
    PowerInputs::new(n, maf, beta, p_thr)
        .with_sigma(sigma)
        .power()
}

/// Additive-coding genotype variance at Hardy-Weinberg equilibrium.
#[inline]
pub fn genotype_variance(maf: f64) -> f64 {
    2.0 * maf * (1.0 - maf)
}

/// Two-sided critical value: the inverse survival function at `p_thr / 2`.
///
/// Computed as `-Q(p_thr / 2)` so that tiny genome-wide thresholds never pass
/// through `1 - p` and lose their significant digits.
pub fn two_sided_critical_value(p_thr: f64) -> Result<f64, PowerError> {
    if !(p_thr > 0.0 && p_thr < 1.0) {
        return Err(PowerError::Threshold(p_thr));
    }
    Ok(critical_value(&standard_normal(), p_thr))
}

fn critical_value(normal: &Normal, p_thr: f64) -> f64 {
    -normal.inverse_cdf(p_thr / 2.0)
}

fn standard_normal() -> Normal {
    Normal::new(0.0, 1.0).expect("N(0, 1) has valid parameters")
}
