//! Tabulated ground-motion models: bilinear interpolation over a
//! `(magnitude, distance) -> ln(ground motion)` grid, as used by the
//! table-based model family.
//!
//! The grid itself is new substrate needed to host Atkinson-style
//! "GMPE as a table" models; it has no analog in the curve-reading
//! conventions elsewhere in this crate (`readers.rs`).

use crate::auxilary::{LN10, LN_980};
use crate::error::{HazardError, Result};

/// How a [`GroundMotionTable`]'s distance axis and its stored values are
/// scaled, mirroring the handful of distinct table flavors that appear
/// in the published NGA-East/CEUS table families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    /// Distance axis is linear; stored values are natural-log ground motion.
    Plain,
    /// Distance axis is `ln(distance)`; stored values are natural-log
    /// ground motion.
    LogDistance,
    /// Distance axis is `ln(distance)`; stored values are a unitless
    /// scale factor applied multiplicatively (in log space, additively)
    /// to a companion [`GroundMotionTable`]'s value.
    LogDistanceScaling,
}

/// Units the table's raw values were tabulated in. The table itself always
/// exposes natural-log-of-m/s² (for acceleration IMTs) after conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableUnits {
    /// Values are base-10 log of cm/s² (the common Atkinson convention).
    Log10CmPerSecSquared,
    /// Values are already natural-log m/s² (no conversion needed).
    LnGravity,
}

impl TableUnits {
    /// Converts a single raw tabulated value to natural-log m/s².
    ///
    /// `log10(cm/s^2) -> ln(m/s^2)` is `raw * ln(10) - ln(980)`, since
    /// `1 g = 980 cm/s^2` and `ln(cm/s^2) = ln(980) + ln(g)`. PGV tables
    /// are always already in natural-log units and bypass the formula.
    pub fn to_ln_gravity(self, raw: f64, is_pgv: bool) -> f64 {
        match self {
            TableUnits::LnGravity => raw,
            TableUnits::Log10CmPerSecSquared if is_pgv => raw,
            TableUnits::Log10CmPerSecSquared => raw * LN10 - LN_980,
        }
    }
}

/// A rectangular `(magnitude, distance) -> value` grid with bilinear
/// interpolation and edge clamping (no extrapolation: queries outside the
/// grid clamp to the nearest edge row/column).
#[derive(Debug, Clone)]
pub struct GroundMotionTable {
    kind: TableKind,
    magnitudes: Vec<f64>,
    /// Distance axis, already in the table's native units (linear, or
    /// `ln(distance)` for the `LogDistance*` kinds).
    distances: Vec<f64>,
    /// `values[mag_index][dist_index]`, in natural-log m/s² (or unitless
    /// for `LogDistanceScaling`).
    values: Vec<Vec<f64>>,
}

impl GroundMotionTable {
    pub fn new(kind: TableKind, magnitudes: Vec<f64>, distances: Vec<f64>, values: Vec<Vec<f64>>) -> Result<Self> {
        if magnitudes.len() < 2 || distances.len() < 2 {
            return Err(HazardError::out_of_range(
                "ground motion table requires at least 2 magnitudes and 2 distances",
            ));
        }
        if values.len() != magnitudes.len() {
            return Err(HazardError::ResourceLoadFailure {
                resource: "ground motion table".to_string(),
                detail: format!(
                    "{} magnitude rows declared but {} value rows given",
                    magnitudes.len(),
                    values.len()
                ),
            });
        }
        for row in &values {
            if row.len() != distances.len() {
                return Err(HazardError::ResourceLoadFailure {
                    resource: "ground motion table".to_string(),
                    detail: format!(
                        "{} distance columns declared but a value row has {}",
                        distances.len(),
                        row.len()
                    ),
                });
            }
        }
        Ok(Self {
            kind,
            magnitudes,
            distances,
            values,
        })
    }

    pub fn kind(&self) -> TableKind {
        self.kind
    }

    /// Bilinear lookup at `(mag, distance)`. `distance` must already be in
    /// the table's native units (the caller converts to `ln(distance)`
    /// for `LogDistance*` kinds).
    pub fn interpolate(&self, mag: f64, distance: f64) -> f64 {
        let (mi0, mi1, mf) = bracket_and_fraction(&self.magnitudes, mag);
        let (di0, di1, df) = bracket_and_fraction(&self.distances, distance);

        let v00 = self.values[mi0][di0];
        let v01 = self.values[mi0][di1];
        let v10 = self.values[mi1][di0];
        let v11 = self.values[mi1][di1];

        let v0 = v00 + (v01 - v00) * df;
        let v1 = v10 + (v11 - v10) * df;
        let interpolated = v0 + (v1 - v0) * mf;

        // `LogDistanceScaling` tables extrapolate past their tabulated
        // maximum distance by reducing the clamped edge value by the
        // excess log-distance, rather than holding it flat the way
        // `Plain`/`LogDistance` tables do.
        if self.kind == TableKind::LogDistanceScaling {
            let max_dist = self.distances[self.distances.len() - 1];
            if distance > max_dist {
                return interpolated - (distance - max_dist);
            }
        }
        interpolated
    }
}

/// Clamping binary search: returns `(lower_index, upper_index, fraction)`
/// such that `query` lies between `axis[lower_index]` and
/// `axis[upper_index]` (`upper_index == lower_index + 1`), with `query`
/// clamped to `[axis[0], axis[last]]` before bracketing. `fraction` is 0
/// at the lower edge and 1 at the upper edge.
fn bracket_and_fraction(axis: &[f64], query: f64) -> (usize, usize, f64) {
    let last = axis.len() - 1;
    let q = query.clamp(axis[0], axis[last]);
    let lo = match axis.binary_search_by(|v| v.partial_cmp(&q).unwrap()) {
        Ok(i) => i.min(last.saturating_sub(1)),
        Err(i) => i.saturating_sub(1).min(last.saturating_sub(1)),
    };
    let hi = lo + 1;
    let span = axis[hi] - axis[lo];
    let fraction = if span == 0.0 { 0.0 } else { (q - axis[lo]) / span };
    (lo, hi, fraction)
}

/// Parses an Atkinson-style frequency header token (e.g. `"99"`, `"89"`,
/// `"0.32"`, `"3.33"`) into the IMT it denotes, following the family's
/// special-cased codes for PGA/PGV and for frequency values whose naive
/// `1/f` period doesn't land on the intended spectral period:
///
/// - `"99"` -> PGA
/// - `"89"` -> PGV
/// - `"0.32"`/`"0.33"` Hz -> SA3P0 (3.0 s)
/// - `"3.2"`/`"3.33"` Hz -> SA0P3 (0.3 s)
/// - `"32"`/`"33"`/`"33.33"` Hz -> SA0P03 (0.03 s)
/// - anything else -> `SA` at period `1/f`
pub fn parse_atkinson_frequency_header(token: &str) -> Option<Imt> {
    let token = token.trim();
    match token {
        "99" => return Some(Imt::Pga),
        "89" => return Some(Imt::Pgv),
        "0.32" | "0.33" => return Some(Imt::Sa(3.0)),
        "3.2" | "3.33" => return Some(Imt::Sa(0.3)),
        "32" | "33" | "33.33" => return Some(Imt::Sa(0.03)),
        _ => {}
    }
    let freq: f64 = token.parse().ok()?;
    if freq <= 0.0 {
        None
    } else {
        Some(Imt::Sa(1.0 / freq))
    }
}

use crate::imt::Imt;

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> GroundMotionTable {
        GroundMotionTable::new(
            TableKind::Plain,
            vec![5.0, 6.0, 7.0],
            vec![1.0, 10.0, 100.0],
            vec![
                vec![0.0, -1.0, -2.0],
                vec![1.0, 0.0, -1.0],
                vec![2.0, 1.0, 0.0],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_interpolate_exact_grid_points() {
        let t = sample_table();
        assert_eq!(t.interpolate(6.0, 10.0), 0.0);
        assert_eq!(t.interpolate(5.0, 1.0), 0.0);
        assert_eq!(t.interpolate(7.0, 100.0), 0.0);
    }

    #[test]
    fn test_interpolate_midpoint() {
        let t = sample_table();
        let v = t.interpolate(5.5, 1.0);
        assert!((v - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_interpolate_clamps_outside_grid() {
        let t = sample_table();
        assert_eq!(t.interpolate(4.0, 1.0), t.interpolate(5.0, 1.0));
        assert_eq!(t.interpolate(6.0, 1000.0), t.interpolate(6.0, 100.0));
    }

    #[test]
    fn test_table_units_conversion() {
        let units = TableUnits::Log10CmPerSecSquared;
        let ln_g = units.to_ln_gravity(0.0, false);
        assert!((ln_g - (-LN_980)).abs() < 1e-9);
        assert_eq!(units.to_ln_gravity(1.23, true), 1.23);
    }

    #[test]
    fn test_atkinson_header_special_cases() {
        assert_eq!(parse_atkinson_frequency_header("99"), Some(Imt::Pga));
        assert_eq!(parse_atkinson_frequency_header("89"), Some(Imt::Pgv));
        assert_eq!(parse_atkinson_frequency_header("0.32"), Some(Imt::Sa(3.0)));
        assert_eq!(parse_atkinson_frequency_header("0.33"), Some(Imt::Sa(3.0)));
        assert_eq!(parse_atkinson_frequency_header("3.2"), Some(Imt::Sa(0.3)));
        assert_eq!(parse_atkinson_frequency_header("3.33"), Some(Imt::Sa(0.3)));
        assert_eq!(parse_atkinson_frequency_header("32"), Some(Imt::Sa(0.03)));
        assert_eq!(parse_atkinson_frequency_header("33.33"), Some(Imt::Sa(0.03)));
        assert_eq!(parse_atkinson_frequency_header("5.0"), Some(Imt::Sa(0.2)));
        assert_eq!(parse_atkinson_frequency_header("-1"), None);
    }

    #[test]
    fn test_log_distance_scaling_reduces_beyond_max_distance() {
        let t = GroundMotionTable::new(
            TableKind::LogDistanceScaling,
            vec![5.0, 6.0, 7.0],
            vec![0.0, 1.0, 2.0],
            vec![
                vec![0.0, 0.0, 0.0],
                vec![0.0, 0.0, 0.0],
                vec![0.0, 0.0, 0.0],
            ],
        )
        .unwrap();
        let at_max = t.interpolate(6.0, 2.0);
        let beyond_max = t.interpolate(6.0, 3.0);
        assert_eq!(at_max, 0.0);
        assert!((beyond_max - (-1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_plain_table_holds_flat_beyond_max_distance() {
        let t = sample_table();
        let at_max = t.interpolate(6.0, 100.0);
        let beyond_max = t.interpolate(6.0, 1000.0);
        assert_eq!(at_max, beyond_max);
    }

    #[test]
    fn test_rejects_mismatched_rows() {
        let result = GroundMotionTable::new(
            TableKind::Plain,
            vec![5.0, 6.0],
            vec![1.0, 10.0],
            vec![vec![0.0, 1.0]],
        );
        assert!(result.is_err());
    }
}
