//! Turns a [`GroundMotion`] prediction into a probability of exceeding a
//! given ground-motion level, the inner loop of hazard curve
//! construction.

use crate::auxilary::standard_normal_cdf;
use crate::ground_motion::GroundMotion;

/// How the lognormal ground-motion distribution is truncated (or not)
/// before computing an exceedance probability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExceedanceModel {
    /// No truncation: `P(GM > level) = 1 - Phi(z)`.
    Lognormal,
    /// Truncated at `mean +/- n_sigma * sigma`, renormalized so the
    /// truncated distribution still integrates to 1.
    TruncatedNSigma(f64),
    /// NSHMP-style cap: ground motion can never exceed `cap_ln`
    /// (natural log units), regardless of what the model's mean predicts.
    NshmpCeusMaxIntensity { cap_ln: f64 },
}

impl ExceedanceModel {
    /// Exceedance probability for `gm` at `level_ln` (natural log of the
    /// ground-motion level). `Multi` predictions are a two-dimensional
    /// logic tree — mean branches and sigma branches vary independently —
    /// so the combined probability is the weighted sum over every
    /// `(mean_i, sigma_j)` pair, normalized by the product of the two
    /// weight totals, per `spec.md` §4.6's "weighted sum of per-branch
    /// exceedance probabilities" rule.
    pub fn probability(&self, gm: &GroundMotion, level_ln: f64) -> f64 {
        match gm {
            GroundMotion::Scalar { mean_ln, sigma_ln } => {
                self.scalar_probability(*mean_ln, *sigma_ln, level_ln)
            }
            GroundMotion::Multi {
                means,
                weights,
                sigmas,
                sigma_weights,
            } => {
                let mean_total: f64 = weights.iter().sum();
                let sigma_total: f64 = sigma_weights.iter().sum();
                let mut acc = 0.0;
                for (mean_ln, w_mean) in means.iter().zip(weights) {
                    for (sigma_ln, w_sigma) in sigmas.iter().zip(sigma_weights) {
                        acc += w_mean * w_sigma * self.scalar_probability(*mean_ln, *sigma_ln, level_ln);
                    }
                }
                acc / (mean_total * sigma_total)
            }
        }
    }

    fn scalar_probability(&self, mean_ln: f64, sigma_ln: f64, level_ln: f64) -> f64 {
        match self {
            ExceedanceModel::Lognormal => {
                let z = (level_ln - mean_ln) / sigma_ln;
                1.0 - standard_normal_cdf(z)
            }
            ExceedanceModel::TruncatedNSigma(n) => {
                let z = (level_ln - mean_ln) / sigma_ln;
                if z > *n {
                    0.0
                } else if z <= -*n {
                    1.0
                } else {
                    let denom = 1.0 - standard_normal_cdf(-*n);
                    (1.0 - standard_normal_cdf(z)) / denom
                }
            }
            ExceedanceModel::NshmpCeusMaxIntensity { cap_ln } => {
                let capped_mean = mean_ln.min(*cap_ln);
                let z = (level_ln - capped_mean) / sigma_ln;
                1.0 - standard_normal_cdf(z)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lognormal_at_mean_is_one_half() {
        let model = ExceedanceModel::Lognormal;
        let gm = GroundMotion::Scalar {
            mean_ln: -1.0,
            sigma_ln: 0.6,
        };
        let p = model.probability(&gm, -1.0);
        assert!((p - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_lognormal_decreases_with_level() {
        let model = ExceedanceModel::Lognormal;
        let gm = GroundMotion::Scalar {
            mean_ln: -1.0,
            sigma_ln: 0.6,
        };
        let low = model.probability(&gm, -2.0);
        let high = model.probability(&gm, 0.0);
        assert!(low > high);
    }

    #[test]
    fn test_truncated_zeroes_beyond_n_sigma() {
        let model = ExceedanceModel::TruncatedNSigma(3.0);
        let gm = GroundMotion::Scalar {
            mean_ln: 0.0,
            sigma_ln: 1.0,
        };
        assert_eq!(model.probability(&gm, 3.01), 0.0);
        assert_eq!(model.probability(&gm, -3.01), 1.0);
    }

    #[test]
    fn test_nshmp_cap_reduces_probability_above_cap() {
        let uncapped = ExceedanceModel::Lognormal;
        let capped = ExceedanceModel::NshmpCeusMaxIntensity { cap_ln: -0.5 };
        let gm = GroundMotion::Scalar {
            mean_ln: 0.0,
            sigma_ln: 0.6,
        };
        let p_uncapped = uncapped.probability(&gm, 0.0);
        let p_capped = capped.probability(&gm, 0.0);
        assert!(p_capped < p_uncapped);
    }

    #[test]
    fn test_multi_is_weighted_average_of_branches() {
        let model = ExceedanceModel::Lognormal;
        let gm = GroundMotion::Multi {
            means: vec![-1.0, -1.0],
            weights: vec![1.0, 1.0],
            sigmas: vec![0.5],
            sigma_weights: vec![1.0],
        };
        let gm_scalar = GroundMotion::Scalar {
            mean_ln: -1.0,
            sigma_ln: 0.5,
        };
        let p_multi = model.probability(&gm, -1.0);
        let p_scalar = model.probability(&gm_scalar, -1.0);
        assert!((p_multi - p_scalar).abs() < 1e-12);
    }
}
