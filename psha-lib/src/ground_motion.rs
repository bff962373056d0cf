//! The ground-motion prediction result type and the trait every model
//! family implements.

use crate::error::Result;
use crate::gmm_input::{Constraints, GmmInput};
use crate::imt::Imt;

/// The lognormal prediction a [`GroundMotionModel`] returns for one
/// `(GmmInput, Imt)` pair.
///
/// `Scalar` is the common case: a single lognormal distribution. `Multi`
/// represents a weighted mixture of lognormals, used by composite models
/// (e.g. NGA-East-style tables) that average several component branches
/// before a hazard curve can treat them as one distribution; `sigma`s
/// carry their own, possibly distinct, weights because epistemic
/// sigma-branching and mean-branching logic trees needn't share weights.
#[derive(Debug, Clone, PartialEq)]
pub enum GroundMotion {
    Scalar { mean_ln: f64, sigma_ln: f64 },
    Multi {
        means: Vec<f64>,
        weights: Vec<f64>,
        sigmas: Vec<f64>,
        sigma_weights: Vec<f64>,
    },
}

impl GroundMotion {
    /// Weighted-average mean, in log space. For `Scalar`, this is just
    /// `mean_ln`.
    pub fn weighted_mean_ln(&self) -> f64 {
        match self {
            GroundMotion::Scalar { mean_ln, .. } => *mean_ln,
            GroundMotion::Multi { means, weights, .. } => {
                let total: f64 = weights.iter().sum();
                means.iter().zip(weights).map(|(m, w)| m * w).sum::<f64>() / total
            }
        }
    }

    /// Weighted-average sigma, in log space.
    pub fn weighted_sigma_ln(&self) -> f64 {
        match self {
            GroundMotion::Scalar { sigma_ln, .. } => *sigma_ln,
            GroundMotion::Multi {
                sigmas,
                sigma_weights,
                ..
            } => {
                let total: f64 = sigma_weights.iter().sum();
                sigmas.iter().zip(sigma_weights).map(|(s, w)| s * w).sum::<f64>() / total
            }
        }
    }
}

/// A ground-motion prediction model: given a site/rupture geometry and an
/// IMT, returns a lognormal (or mixture) prediction of ground motion.
///
/// Implementors are expected to be cheap to construct and are cached by
/// [`crate::registry`] keyed on `(GmmId, Imt)`, so `calc` is the only
/// method that needs to be fast; `name`/`constraints`/`supported_imts`
/// are called at most once per cache miss.
pub trait GroundMotionModel: Send + Sync {
    /// Stable, human-readable model name, used in error messages and
    /// output metadata.
    fn name(&self) -> &'static str;

    /// The input field ranges this model was calibrated over. Not
    /// enforced automatically; callers that want validation call
    /// [`Constraints::check`] themselves before [`GroundMotionModel::calc`].
    fn constraints(&self) -> &Constraints;

    /// The IMTs this model instance has coefficients for.
    fn supported_imts(&self) -> Vec<Imt>;

    /// Predict ground motion for `input` at `imt`. Returns
    /// [`crate::error::HazardError::UnsupportedImt`] if `imt` isn't in
    /// [`GroundMotionModel::supported_imts`].
    fn calc(&self, input: &GmmInput, imt: Imt) -> Result<GroundMotion>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_weighted_mean_is_identity() {
        let gm = GroundMotion::Scalar {
            mean_ln: -1.2,
            sigma_ln: 0.6,
        };
        assert_eq!(gm.weighted_mean_ln(), -1.2);
        assert_eq!(gm.weighted_sigma_ln(), 0.6);
    }

    #[test]
    fn test_multi_weighted_mean() {
        let gm = GroundMotion::Multi {
            means: vec![-1.0, -2.0],
            weights: vec![0.5, 0.5],
            sigmas: vec![0.5, 0.7],
            sigma_weights: vec![1.0, 1.0],
        };
        assert!((gm.weighted_mean_ln() - (-1.5)).abs() < 1e-12);
        assert!((gm.weighted_sigma_ln() - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_multi_weighted_mean_uneven_weights() {
        let gm = GroundMotion::Multi {
            means: vec![0.0, -4.0],
            weights: vec![3.0, 1.0],
            sigmas: vec![0.5],
            sigma_weights: vec![1.0],
        };
        assert!((gm.weighted_mean_ln() - (-1.0)).abs() < 1e-12);
    }
}
