//! Auxiliary constants and helper functions.
//!
//! This module provides numerical constants and utility functions for
//! common operations used in ground motion prediction calculations.

/// Standard acceleration due to gravity on Earth's surface, in m/s².
pub const G_GLOBAL: f64 = 9.81;

/// Default depth (in meters) to the subsurface layer where the shear-wave
/// velocity (Vs) reaches 1400 m/s at a site.
///
/// This value is used when no site-specific `dl` value is provided,
/// but is required by a GMPE implementation.
pub const DL: u64 = 250;

/// `ln(10)`, used throughout the CEUS and table-based models to convert
/// base-10 tabulated log-ground-motion to natural log.
pub const LN10: f64 = std::f64::consts::LN_10;

/// `ln(980)`, i.e. `ln(g in cm/s^2)`: used by the ground-motion table unit
/// converter in [`crate::gm_table`] to move from natural-log cm/s² to
/// natural-log m/s² (equivalently, natural-log g).
pub const LN_980: f64 = 6.887552571664617;

/// Check if two floating-point numbers are approximately equal within a given tolerance (epsilon).
///
/// # Arguments
///
/// * `a` - First floating-point value.
/// * `b` - Second floating-point value.
/// * `epsilon` - Maximum allowed difference between `a` and `b` for them to be considered equal.
///
/// # Returns
///
/// `true` if the absolute difference between `a` and `b` is less than `epsilon`, `false` otherwise.
///
/// # Examples
///
/// ```
/// use psha_lib::auxilary::approx_equal;
/// assert!(approx_equal(1.00001, 1.00002, 0.0001));
/// ```
pub fn approx_equal(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

/// Round a floating-point number to a specified number of decimal places.
///
/// # Arguments
///
/// * `val` - The floating-point value to round.
/// * `places` - Number of decimal places to round to.
///
/// # Returns
///
/// A new `f64` rounded to the specified precision.
///
/// # Examples
///
/// ```
/// use psha_lib::auxilary::round_to_places;
/// assert_eq!(round_to_places(3.14159, 2), 3.14);
/// ```
pub fn round_to_places(val: f64, places: u32) -> f64 {
    let factor = 10_f64.powi(places as i32);
    (val * factor).round() / factor
}

/// Standard normal cumulative distribution function `Φ(z)`.
///
/// Used by [`crate::exceedance`] to turn a lognormal `(mean_ln, sigma_ln)`
/// prediction and a ground-motion level into an exceedance probability.
pub fn standard_normal_cdf(z: f64) -> f64 {
    0.5 * erfc(-z / std::f64::consts::SQRT_2)
}

/// Complementary error function, `erfc(x) = 1 - erf(x)`.
///
/// Abramowitz & Stegun 7.1.26 rational approximation (max error ~1.5e-7).
fn erfc(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();

    const A1: f64 = 0.254829592;
    const A2: f64 = -0.284496736;
    const A3: f64 = 1.421413741;
    const A4: f64 = -1.453152027;
    const A5: f64 = 1.061405429;
    const P: f64 = 0.3275911;

    let t = 1.0 / (1.0 + P * x);
    let poly = ((((A5 * t + A4) * t + A3) * t + A2) * t + A1) * t;
    let erf = 1.0 - poly * (-x * x).exp();
    1.0 - sign * erf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approx_equal_true() {
        assert!(approx_equal(1.000001, 1.000002, 0.00001));
    }

    #[test]
    fn test_approx_equal_false() {
        assert!(!approx_equal(1.0, 1.1, 0.00001));
    }

    #[test]
    fn test_approx_equal_exact() {
        assert!(approx_equal(3.14, 3.14, 0.00001));
    }

    #[test]
    fn test_approx_equal_with_small_epsilon() {
        assert!(!approx_equal(3.14, 3.1400001, 1e-12));
        assert!(approx_equal(3.14, 3.14, 1e-12));
    }

    #[test]
    fn test_round_to_places() {
        assert_eq!(round_to_places(3.14159, 2), 3.14);
        assert_eq!(round_to_places(3.145, 2), 3.15);
        assert_eq!(round_to_places(-3.145, 2), -3.15);
        assert_eq!(round_to_places(3.0, 2), 3.0);
    }

    #[test]
    fn test_round_zero_places() {
        assert_eq!(round_to_places(3.7, 0), 4.0);
        assert_eq!(round_to_places(3.3, 0), 3.0);
    }

    #[test]
    fn test_round_to_more_places() {
        assert_eq!(round_to_places(3.14159, 4), 3.1416);
    }

    #[test]
    fn test_standard_normal_cdf_midpoint() {
        assert!(approx_equal(standard_normal_cdf(0.0), 0.5, 1e-6));
    }

    #[test]
    fn test_standard_normal_cdf_tails() {
        assert!(approx_equal(standard_normal_cdf(3.0), 0.9986501, 1e-6));
        assert!(approx_equal(standard_normal_cdf(-3.0), 0.0013499, 1e-6));
    }

    #[test]
    fn test_standard_normal_cdf_one() {
        assert!(approx_equal(standard_normal_cdf(1.0), 0.8413447, 1e-6));
    }
}
