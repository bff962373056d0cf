//! The hazard aggregation pipeline: for every site, sums each rupture's
//! annual rate weighted by its ground-motion exceedance probability into
//! a hazard curve, using a Rayon thread pool sized from [`crate::config`].
//!
//! GMM-level decomposition is a caller concern: a caller
//! wanting per-GMM curves runs the pipeline once per configured
//! [`crate::registry::GmmId`] and keys the results by which model
//! produced them, the same way [`crate::registry::instance`] is already
//! keyed per `(GmmId, Imt)`. This module only decomposes by source type,
//! since that partition is intrinsic to a single pipeline pass over one
//! GMM's ruptures.

use crate::config::ThreadCountSetting;
use crate::error::{HazardError, Result};
use crate::exceedance::ExceedanceModel;
use crate::ground_motion::GroundMotionModel;
use crate::imt::Imt;
use crate::source_model::{Site, SourceModel, SourceType};
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info_span, warn};

/// The annual frequency of exceedance at each of a curve's levels, for
/// one site and one IMT.
#[derive(Debug, Clone, PartialEq)]
pub struct HazardCurve {
    pub site: Site,
    pub imt: Imt,
    pub levels_ln: Vec<f64>,
    /// Annual frequency of exceedance, one per `levels_ln` entry.
    pub afe: Vec<f64>,
}

/// A site's total hazard curve plus, when requested, its decomposition
/// into one curve per [`SourceType`] present in the source model.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteHazard {
    pub total: HazardCurve,
    pub by_source_type: Vec<(SourceType, HazardCurve)>,
}

/// The complete output of one pipeline run: one [`SiteHazard`] per site
/// submitted.
#[derive(Debug, Clone, Default)]
pub struct HazardResult {
    pub sites: Vec<SiteHazard>,
}

fn empty_curve(site: &Site, imt: Imt, levels_ln: &[f64]) -> HazardCurve {
    HazardCurve {
        site: site.clone(),
        imt,
        levels_ln: levels_ln.to_vec(),
        afe: vec![0.0; levels_ln.len()],
    }
}

/// Computes the total hazard curve at a single site for a single IMT,
/// plus its per-source-type decomposition when `decompose_by_source` is
/// set, by summing over every rupture in `model` that rupture's annual
/// rate times its ground-motion exceedance probability at each level.
/// This is the standard Poissonian first-order approximation of hazard
/// curve construction: it treats ruptures as independent and sums their
/// rates of exceedance rather than combining occurrence probabilities.
///
/// A source whose `representative_distance_km` exceeds
/// `max_source_distance` is skipped entirely.
fn compute_site_hazard(
    site: &Site,
    model: &SourceModel,
    gmm: &dyn GroundMotionModel,
    imt: Imt,
    exceedance: ExceedanceModel,
    levels_ln: &[f64],
    max_source_distance: f64,
    decompose_by_source: bool,
) -> Result<SiteHazard> {
    let _span = info_span!("site", lon = site.lon, lat = site.lat).entered();

    let mut total = empty_curve(site, imt, levels_ln);
    let mut by_source_type: Vec<(SourceType, HazardCurve)> = Vec::new();

    for source in &model.sources {
        if source.representative_distance_km > max_source_distance {
            continue;
        }

        let sub_curve = decompose_by_source.then(|| {
            by_source_type
                .iter()
                .position(|(t, _)| *t == source.source_type)
                .unwrap_or_else(|| {
                    by_source_type.push((source.source_type, empty_curve(site, imt, levels_ln)));
                    by_source_type.len() - 1
                })
        });

        for rupture in &source.ruptures {
            let input = match rupture.to_gmm_input(site) {
                Ok(input) => input,
                Err(err) => {
                    warn!(source = %source.id, error = %err, "skipping rupture with invalid GMM input");
                    continue;
                }
            };
            let gm = gmm.calc(&input, imt)?;
            for (i, level_ln) in levels_ln.iter().enumerate() {
                let rate = rupture.rate_per_year * exceedance.probability(&gm, *level_ln);
                total.afe[i] += rate;
                if let Some(idx) = sub_curve {
                    by_source_type[idx].1.afe[i] += rate;
                }
            }
        }
    }

    Ok(SiteHazard { total, by_source_type })
}

/// Runs curve computations for a batch of sites over a dedicated Rayon
/// thread pool, with cooperative cancellation.
pub struct Pipeline {
    pool: rayon::ThreadPool,
    cancelled: Arc<AtomicBool>,
}

impl Pipeline {
    pub fn new(threads: ThreadCountSetting) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads.resolve())
            .build()
            .map_err(|e| HazardError::state(format!("failed to build thread pool: {e}")))?;
        Ok(Self {
            pool,
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Requests cancellation. Tasks already in flight finish their
    /// current site; tasks not yet started are skipped. Does not block —
    /// pair with [`Pipeline::wait_for_cancellation`] if a caller needs to
    /// know when in-flight work has actually drained.
    pub fn request_cancellation(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn cancellation_requested(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Blocks up to `grace_period` waiting for [`Pipeline::cancellation_requested`]
    /// to be observed; returns `true` if cancellation was (already) requested
    /// before the grace period elapsed, `false` if it timed out without a
    /// cancellation request — in which case the caller should treat the run
    /// as having completed normally rather than cancelled.
    pub fn wait_for_cancellation(&self, grace_period: Duration) -> bool {
        let step = Duration::from_millis(10).min(grace_period);
        let mut waited = Duration::ZERO;
        while !self.cancellation_requested() && waited < grace_period {
            std::thread::sleep(step);
            waited += step;
        }
        self.cancellation_requested()
    }

    /// Computes one [`SiteHazard`] per site, in the same order as `sites`.
    /// Rayon's `par_iter().map().collect()` preserves input order even
    /// though evaluation order across threads is unspecified.
    #[allow(clippy::too_many_arguments)]
    pub fn run_ordered(
        &self,
        sites: &[Site],
        model: &SourceModel,
        gmm: &dyn GroundMotionModel,
        imt: Imt,
        exceedance: ExceedanceModel,
        levels_ln: &[f64],
        max_source_distance: f64,
        decompose_by_source: bool,
    ) -> Result<HazardResult> {
        let cancelled = Arc::clone(&self.cancelled);
        let sites_out: Result<Vec<SiteHazard>> = self.pool.install(|| {
            sites
                .par_iter()
                .map(|site| {
                    if cancelled.load(Ordering::Relaxed) {
                        return Err(HazardError::state("cancelled"));
                    }
                    compute_site_hazard(
                        site,
                        model,
                        gmm,
                        imt,
                        exceedance,
                        levels_ln,
                        max_source_distance,
                        decompose_by_source,
                    )
                })
                .collect()
        });
        Ok(HazardResult { sites: sites_out? })
    }

    /// Computes hazard for `sites` and hands each result to `sink` as
    /// soon as it completes, in whatever order threads finish — useful
    /// for a streaming, batched writer that doesn't need to hold the
    /// whole result set in memory. Stops submitting new sites once
    /// cancellation is requested; sites already dispatched still
    /// complete and are still delivered to `sink`.
    #[allow(clippy::too_many_arguments)]
    pub fn run_unordered<F>(
        &self,
        sites: &[Site],
        model: &SourceModel,
        gmm: &dyn GroundMotionModel,
        imt: Imt,
        exceedance: ExceedanceModel,
        levels_ln: &[f64],
        max_source_distance: f64,
        decompose_by_source: bool,
        mut sink: F,
    ) -> Result<()>
    where
        F: FnMut(SiteHazard) -> Result<()>,
    {
        let (tx, rx) = mpsc::channel::<Result<SiteHazard>>();
        let cancelled = Arc::clone(&self.cancelled);

        self.pool.scope(|scope| {
            for site in sites {
                if cancelled.load(Ordering::Relaxed) {
                    break;
                }
                let tx = tx.clone();
                let cancelled = Arc::clone(&cancelled);
                scope.spawn(move |_| {
                    if cancelled.load(Ordering::Relaxed) {
                        return;
                    }
                    let result = compute_site_hazard(
                        site,
                        model,
                        gmm,
                        imt,
                        exceedance,
                        levels_ln,
                        max_source_distance,
                        decompose_by_source,
                    );
                    let _ = tx.send(result);
                });
            }
        });
        drop(tx);

        for result in rx {
            sink(result?)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::crustal::{Flavor as CrustalFlavor, NgaWest2Like};
    use crate::source_model::{Rupture, Source, SourceType};

    fn sample_model() -> SourceModel {
        SourceModel::new(vec![
            Source {
                id: "near".to_string(),
                source_type: SourceType::Fault,
                representative_distance_km: 10.0,
                ruptures: vec![Rupture {
                    mag: 6.5,
                    rate_per_year: 1e-3,
                    r_jb: 10.0,
                    r_rup: 10.3,
                    r_x: 10.0,
                    dip: 90.0,
                    width: 14.0,
                    z_top: 0.5,
                    z_hyp: 7.5,
                    rake: 0.0,
                }],
            },
            Source {
                id: "far".to_string(),
                source_type: SourceType::Area,
                representative_distance_km: 400.0,
                ruptures: vec![Rupture {
                    mag: 7.0,
                    rate_per_year: 2e-4,
                    r_jb: 20.0,
                    r_rup: 20.2,
                    r_x: 20.0,
                    dip: 90.0,
                    width: 20.0,
                    z_top: 0.5,
                    z_hyp: 8.0,
                    rake: 0.0,
                }],
            },
        ])
    }

    #[test]
    fn test_run_ordered_preserves_site_order() {
        let pipeline = Pipeline::new(ThreadCountSetting::Fixed(2)).unwrap();
        let model = sample_model();
        let gmm = NgaWest2Like::new(CrustalFlavor::Ask14).unwrap();
        let sites = vec![Site::new(0.0, 0.0, 400.0), Site::new(1.0, 1.0, 800.0)];
        let levels = vec![-3.0, -1.0, 0.0];
        let result = pipeline
            .run_ordered(&sites, &model, &gmm, Imt::Pga, ExceedanceModel::Lognormal, &levels, 1000.0, false)
            .unwrap();
        assert_eq!(result.sites.len(), 2);
        assert_eq!(result.sites[0].total.site, sites[0]);
        assert_eq!(result.sites[1].total.site, sites[1]);
    }

    #[test]
    fn test_afe_decreases_with_level() {
        let pipeline = Pipeline::new(ThreadCountSetting::Fixed(1)).unwrap();
        let model = sample_model();
        let gmm = NgaWest2Like::new(CrustalFlavor::Ask14).unwrap();
        let sites = vec![Site::new(0.0, 0.0, 400.0)];
        let levels = vec![-4.0, -2.0, 0.0];
        let result = pipeline
            .run_ordered(&sites, &model, &gmm, Imt::Pga, ExceedanceModel::Lognormal, &levels, 1000.0, false)
            .unwrap();
        let afe = &result.sites[0].total.afe;
        assert!(afe[0] > afe[1]);
        assert!(afe[1] > afe[2]);
    }

    #[test]
    fn test_run_unordered_delivers_every_site() {
        let pipeline = Pipeline::new(ThreadCountSetting::Fixed(2)).unwrap();
        let model = sample_model();
        let gmm = NgaWest2Like::new(CrustalFlavor::Ask14).unwrap();
        let sites = vec![Site::new(0.0, 0.0, 400.0), Site::new(1.0, 1.0, 800.0)];
        let levels = vec![-2.0, 0.0];
        let mut received = Vec::new();
        pipeline
            .run_unordered(
                &sites,
                &model,
                &gmm,
                Imt::Pga,
                ExceedanceModel::Lognormal,
                &levels,
                1000.0,
                false,
                |hazard| {
                    received.push(hazard);
                    Ok(())
                },
            )
            .unwrap();
        assert_eq!(received.len(), 2);
    }

    #[test]
    fn test_cancellation_stops_further_dispatch() {
        let pipeline = Pipeline::new(ThreadCountSetting::Fixed(1)).unwrap();
        pipeline.request_cancellation();
        let model = sample_model();
        let gmm = NgaWest2Like::new(CrustalFlavor::Ask14).unwrap();
        let sites = vec![Site::new(0.0, 0.0, 400.0)];
        let levels = vec![0.0];
        let mut received = Vec::new();
        pipeline
            .run_unordered(
                &sites,
                &model,
                &gmm,
                Imt::Pga,
                ExceedanceModel::Lognormal,
                &levels,
                1000.0,
                false,
                |hazard| {
                    received.push(hazard);
                    Ok(())
                },
            )
            .unwrap();
        assert!(received.is_empty());
    }

    #[test]
    fn test_wait_for_cancellation_times_out_without_request() {
        let pipeline = Pipeline::new(ThreadCountSetting::Fixed(1)).unwrap();
        let observed = pipeline.wait_for_cancellation(Duration::from_millis(20));
        assert!(!observed);
    }

    #[test]
    fn test_max_source_distance_excludes_far_sources() {
        let pipeline = Pipeline::new(ThreadCountSetting::Fixed(1)).unwrap();
        let model = sample_model();
        let gmm = NgaWest2Like::new(CrustalFlavor::Ask14).unwrap();
        let sites = vec![Site::new(0.0, 0.0, 400.0)];
        let levels = vec![-2.0];

        let unfiltered = pipeline
            .run_ordered(&sites, &model, &gmm, Imt::Pga, ExceedanceModel::Lognormal, &levels, 1000.0, false)
            .unwrap();
        let filtered = pipeline
            .run_ordered(&sites, &model, &gmm, Imt::Pga, ExceedanceModel::Lognormal, &levels, 50.0, false)
            .unwrap();

        assert!(filtered.sites[0].total.afe[0] < unfiltered.sites[0].total.afe[0]);
    }

    #[test]
    fn test_source_decomposition_sums_to_total() {
        let pipeline = Pipeline::new(ThreadCountSetting::Fixed(1)).unwrap();
        let model = sample_model();
        let gmm = NgaWest2Like::new(CrustalFlavor::Ask14).unwrap();
        let sites = vec![Site::new(0.0, 0.0, 400.0)];
        let levels = vec![-2.0, 0.0];
        let result = pipeline
            .run_ordered(&sites, &model, &gmm, Imt::Pga, ExceedanceModel::Lognormal, &levels, 1000.0, true)
            .unwrap();
        let site = &result.sites[0];
        assert_eq!(site.by_source_type.len(), 2);
        for i in 0..levels.len() {
            let sum: f64 = site.by_source_type.iter().map(|(_, c)| c.afe[i]).sum();
            assert!((sum - site.total.afe[i]).abs() < 1e-12);
        }
    }
}
