//! Deaggregation: inverts a hazard curve to the ground-motion level for
//! a target return period, then bins each rupture's contribution to that
//! level by magnitude, distance, and epsilon.

use crate::config::DeaggConfig;
use crate::error::{HazardError, Result};
use crate::exceedance::ExceedanceModel;
use crate::ground_motion::GroundMotionModel;
use crate::pipeline::HazardCurve;
use crate::source_model::{Site, SourceModel};
use crate::xy::ArbitrarySeries;

/// Inverts a hazard curve to find the ground-motion level (natural log)
/// at which the annual frequency of exceedance equals `target_afe`.
///
/// Interpolation is log-log: `ln(afe)` is linear in `level_ln` between
/// tabulated points, matching the curve's own near-log-log shape: this
/// is the only function in the crate allowed to extrapolate past the
/// curve's tabulated levels, since a requested return period routinely
/// falls outside them.
pub fn invert_curve(curve: &HazardCurve, target_afe: f64) -> Result<f64> {
    if target_afe <= 0.0 {
        return Err(HazardError::out_of_range("target AFE must be > 0"));
    }
    let points: Vec<(f64, f64)> = curve
        .levels_ln
        .iter()
        .zip(&curve.afe)
        .filter(|(_, afe)| **afe > 0.0)
        .map(|(level_ln, afe)| (*level_ln, afe.ln()))
        .collect();
    if points.len() < 2 {
        return Err(HazardError::out_of_range(
            "hazard curve has fewer than two positive-AFE points to invert",
        ));
    }

    let target_ln = target_afe.ln();
    let series = ArbitrarySeries::from_points(points.clone(), 1e-12);
    if let Ok(level_ln) = series.first_x_from_y(target_ln) {
        return Ok(level_ln);
    }

    // target_ln falls outside the tabulated range: extrapolate linearly
    // in log-log space using the nearest bracketing pair of endpoints.
    let (x0, y0) = points[0];
    let (x1, y1) = points[1];
    let (xn1, yn1) = points[points.len() - 2];
    let (xn, yn) = points[points.len() - 1];

    if target_ln > y0.max(y1) {
        let slope = (y1 - y0) / (x1 - x0);
        Ok(x0 + (target_ln - y0) / slope)
    } else {
        let slope = (yn - yn1) / (xn - xn1);
        Ok(xn + (target_ln - yn) / slope)
    }
}

/// One rupture's contribution to the deaggregation at the inverted
/// level: its own magnitude/distance/epsilon and the fraction of total
/// exceedance rate it accounts for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeaggContribution {
    pub mag: f64,
    pub r_rup: f64,
    pub epsilon: f64,
    pub rate_contribution: f64,
}

/// A single cell of the magnitude x distance x epsilon histogram.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeaggBin {
    pub mag_bin: (f64, f64),
    pub dist_bin: (f64, f64),
    pub epsilon_bin: (f64, f64),
    pub rate: f64,
}

/// A binned deaggregation result: every rupture's contribution summed
/// into a magnitude x distance x epsilon histogram, plus rate-weighted
/// mean and modal-bin summaries.
#[derive(Debug, Clone)]
pub struct DeaggResult {
    pub level_ln: f64,
    pub total_rate: f64,
    pub contributions: Vec<DeaggContribution>,
    pub histogram: Vec<DeaggBin>,
    pub mean_mag: f64,
    pub mean_dist: f64,
    pub mean_epsilon: f64,
    pub modal_mag_bin: (f64, f64),
    pub modal_dist_bin: (f64, f64),
    pub modal_epsilon_bin: (f64, f64),
}

fn bin_index(value: f64, min: f64, width: f64, count: usize) -> usize {
    if width <= 0.0 {
        return 0;
    }
    (((value - min) / width).floor() as i64).clamp(0, count as i64 - 1) as usize
}

fn bin_edges(min: f64, width: f64, index: usize) -> (f64, f64) {
    (min + index as f64 * width, min + (index + 1) as f64 * width)
}

/// Runs a full deaggregation for one site at `target_afe` (the return
/// period's reciprocal annual frequency of exceedance): inverts the
/// site's hazard curve to find the corresponding ground-motion level,
/// then recomputes every rupture's contribution to bin its rate by
/// magnitude, distance, and epsilon.
pub fn deaggregate(
    curve: &HazardCurve,
    target_afe: f64,
    site: &Site,
    model: &SourceModel,
    gmm: &dyn GroundMotionModel,
    exceedance: ExceedanceModel,
    config: &DeaggConfig,
) -> Result<DeaggResult> {
    let level_ln = invert_curve(curve, target_afe)?;

    let mag_bin_count = (((config.mag_max - config.mag_min) / config.mag_bin_width).ceil() as usize).max(1);
    let dist_bin_count = (((config.dist_max - config.dist_min) / config.dist_bin_width).ceil() as usize).max(1);
    let eps_bin_count =
        (((config.epsilon_max - config.epsilon_min) / config.epsilon_bin_width).ceil() as usize).max(1);

    // A flattened mag x dist x eps histogram, indexed as
    // `mag_idx * dist_bin_count * eps_bin_count + dist_idx * eps_bin_count + eps_idx`.
    let mut histogram_totals = vec![0.0; mag_bin_count * dist_bin_count * eps_bin_count];
    let mut contributions = Vec::with_capacity(model.rupture_count());
    let mut total_rate = 0.0;
    let mut mag_weighted = 0.0;
    let mut dist_weighted = 0.0;
    let mut eps_weighted = 0.0;

    for (_source, rupture) in model.iter_ruptures() {
        let input = rupture.to_gmm_input(site)?;
        let gm = gmm.calc(&input, curve.imt)?;
        let mean_ln = gm.weighted_mean_ln();
        let sigma_ln = gm.weighted_sigma_ln();
        let probability = exceedance.probability(&gm, level_ln);
        let rate_contribution = rupture.rate_per_year * probability;
        // Epsilon out of the configured bin range clamps to the nearest
        // edge bin rather than being dropped, so the histogram's total
        // always equals `total_rate`.
        let epsilon = ((level_ln - mean_ln) / sigma_ln).clamp(config.epsilon_min, config.epsilon_max);

        total_rate += rate_contribution;
        mag_weighted += rate_contribution * rupture.mag;
        dist_weighted += rate_contribution * rupture.r_rup;
        eps_weighted += rate_contribution * epsilon;

        let mi = bin_index(rupture.mag, config.mag_min, config.mag_bin_width, mag_bin_count);
        let di = bin_index(rupture.r_rup, config.dist_min, config.dist_bin_width, dist_bin_count);
        let ei = bin_index(epsilon, config.epsilon_min, config.epsilon_bin_width, eps_bin_count);
        histogram_totals[mi * dist_bin_count * eps_bin_count + di * eps_bin_count + ei] += rate_contribution;

        contributions.push(DeaggContribution {
            mag: rupture.mag,
            r_rup: rupture.r_rup,
            epsilon,
            rate_contribution,
        });
    }

    if total_rate <= 0.0 {
        return Err(HazardError::out_of_range(
            "deaggregation has zero total rate at the inverted level",
        ));
    }

    let mut histogram = Vec::new();
    let mut mag_totals = vec![0.0; mag_bin_count];
    let mut dist_totals = vec![0.0; dist_bin_count];
    let mut eps_totals = vec![0.0; eps_bin_count];
    for mi in 0..mag_bin_count {
        for di in 0..dist_bin_count {
            for ei in 0..eps_bin_count {
                let rate = histogram_totals[mi * dist_bin_count * eps_bin_count + di * eps_bin_count + ei];
                mag_totals[mi] += rate;
                dist_totals[di] += rate;
                eps_totals[ei] += rate;
                if rate > 0.0 {
                    histogram.push(DeaggBin {
                        mag_bin: bin_edges(config.mag_min, config.mag_bin_width, mi),
                        dist_bin: bin_edges(config.dist_min, config.dist_bin_width, di),
                        epsilon_bin: bin_edges(config.epsilon_min, config.epsilon_bin_width, ei),
                        rate,
                    });
                }
            }
        }
    }

    let modal_index = |totals: &[f64]| -> usize {
        totals
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap_or(0)
    };
    let modal_mag_idx = modal_index(&mag_totals);
    let modal_dist_idx = modal_index(&dist_totals);
    let modal_eps_idx = modal_index(&eps_totals);

    Ok(DeaggResult {
        level_ln,
        total_rate,
        contributions,
        histogram,
        mean_mag: mag_weighted / total_rate,
        mean_dist: dist_weighted / total_rate,
        mean_epsilon: eps_weighted / total_rate,
        modal_mag_bin: bin_edges(config.mag_min, config.mag_bin_width, modal_mag_idx),
        modal_dist_bin: bin_edges(config.dist_min, config.dist_bin_width, modal_dist_idx),
        modal_epsilon_bin: bin_edges(config.epsilon_min, config.epsilon_bin_width, modal_eps_idx),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imt::Imt;
    use crate::models::crustal::{Flavor as CrustalFlavor, NgaWest2Like};
    use crate::source_model::{Rupture, Source, SourceType};

    fn sample_curve() -> HazardCurve {
        HazardCurve {
            site: Site::new(0.0, 0.0, 400.0),
            imt: Imt::Pga,
            levels_ln: vec![-4.0, -3.0, -2.0, -1.0, 0.0],
            afe: vec![1.0e-1, 3.0e-2, 8.0e-3, 1.5e-3, 1.0e-4],
        }
    }

    #[test]
    fn test_invert_curve_within_range() {
        let curve = sample_curve();
        let level = invert_curve(&curve, 8.0e-3).unwrap();
        assert!((level - (-2.0)).abs() < 1e-6);
    }

    #[test]
    fn test_invert_curve_extrapolates_beyond_range() {
        let curve = sample_curve();
        let level = invert_curve(&curve, 1.0e-6).unwrap();
        assert!(level > 0.0);
    }

    fn sample_model() -> SourceModel {
        SourceModel::new(vec![Source {
            id: "src".to_string(),
            source_type: SourceType::Fault,
            representative_distance_km: 10.0,
            ruptures: vec![
                Rupture {
                    mag: 6.0,
                    rate_per_year: 1e-2,
                    r_jb: 5.0,
                    r_rup: 5.3,
                    r_x: 5.0,
                    dip: 90.0,
                    width: 10.0,
                    z_top: 0.5,
                    z_hyp: 6.0,
                    rake: 0.0,
                },
                Rupture {
                    mag: 7.5,
                    rate_per_year: 1e-3,
                    r_jb: 50.0,
                    r_rup: 50.5,
                    r_x: 50.0,
                    dip: 90.0,
                    width: 20.0,
                    z_top: 0.5,
                    z_hyp: 10.0,
                    rake: 0.0,
                },
            ],
        }])
    }

    fn sample_deagg_config() -> DeaggConfig {
        DeaggConfig {
            mag_min: 4.0,
            mag_max: 8.0,
            mag_bin_width: 1.0,
            dist_min: 0.0,
            dist_max: 100.0,
            dist_bin_width: 10.0,
            dist_log_spaced: false,
            epsilon_min: -3.0,
            epsilon_max: 3.0,
            epsilon_bin_width: 0.5,
        }
    }

    #[test]
    fn test_deaggregate_returns_consistent_totals() {
        let curve = HazardCurve {
            levels_ln: vec![-6.0, -4.0, -2.0, 0.0, 2.0],
            afe: vec![5.0e-2, 1.0e-2, 2.0e-3, 2.0e-4, 1.0e-5],
            ..sample_curve()
        };
        let model = sample_model();
        let gmm = NgaWest2Like::new(CrustalFlavor::Ask14).unwrap();
        let config = sample_deagg_config();
        let result = deaggregate(&curve, 1.0 / 475.0, &curve.site, &model, &gmm, ExceedanceModel::Lognormal, &config)
            .unwrap();
        assert_eq!(result.contributions.len(), 2);
        let sum: f64 = result.contributions.iter().map(|c| c.rate_contribution).sum();
        assert!((sum - result.total_rate).abs() < 1e-12);
        assert!(result.mean_mag >= 6.0 && result.mean_mag <= 7.5);

        let histogram_sum: f64 = result.histogram.iter().map(|b| b.rate).sum();
        assert!((histogram_sum - result.total_rate).abs() < 1e-9);
    }

    #[test]
    fn test_epsilon_clamps_to_edge_bin_when_out_of_range() {
        let curve = HazardCurve {
            levels_ln: vec![-6.0, -4.0, -2.0, 0.0, 2.0],
            afe: vec![5.0e-2, 1.0e-2, 2.0e-3, 2.0e-4, 1.0e-5],
            ..sample_curve()
        };
        let model = sample_model();
        let gmm = NgaWest2Like::new(CrustalFlavor::Ask14).unwrap();
        // A narrow epsilon range forces every rupture's true epsilon to
        // clamp to an edge bin, but the histogram must still capture the
        // full rate.
        let config = DeaggConfig {
            epsilon_min: -0.1,
            epsilon_max: 0.1,
            epsilon_bin_width: 0.1,
            ..sample_deagg_config()
        };
        let result = deaggregate(&curve, 1.0 / 475.0, &curve.site, &model, &gmm, ExceedanceModel::Lognormal, &config)
            .unwrap();
        for contribution in &result.contributions {
            assert!(contribution.epsilon >= -0.1 && contribution.epsilon <= 0.1);
        }
        let histogram_sum: f64 = result.histogram.iter().map(|b| b.rate).sum();
        assert!((histogram_sum - result.total_rate).abs() < 1e-9);
    }

    #[test]
    fn test_modal_epsilon_bin_is_reported() {
        let curve = HazardCurve {
            levels_ln: vec![-6.0, -4.0, -2.0, 0.0, 2.0],
            afe: vec![5.0e-2, 1.0e-2, 2.0e-3, 2.0e-4, 1.0e-5],
            ..sample_curve()
        };
        let model = sample_model();
        let gmm = NgaWest2Like::new(CrustalFlavor::Ask14).unwrap();
        let config = sample_deagg_config();
        let result = deaggregate(&curve, 1.0 / 475.0, &curve.site, &model, &gmm, ExceedanceModel::Lognormal, &config)
            .unwrap();
        assert!(result.modal_epsilon_bin.1 > result.modal_epsilon_bin.0);
    }
}
