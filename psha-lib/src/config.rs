//! Calculation configuration: thread pool sizing, exceedance model,
//! output format, and deaggregation parameters, serializable to/from
//! JSON and mergeable so a CLI-supplied config file can override one
//! field of a model's default config without clobbering the rest.

use crate::exceedance::ExceedanceModel;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// How many worker threads the hazard pipeline's Rayon pool should use.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreadCountSetting {
    One,
    Two,
    AllMinusOne,
    All,
    Fixed(usize),
}

impl ThreadCountSetting {
    pub fn resolve(self) -> usize {
        let available = || std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        match self {
            ThreadCountSetting::One => 1,
            ThreadCountSetting::Two => 2,
            ThreadCountSetting::AllMinusOne => available().saturating_sub(1).max(1),
            ThreadCountSetting::All => available(),
            ThreadCountSetting::Fixed(n) => n.max(1),
        }
    }
}

impl Default for ThreadCountSetting {
    fn default() -> Self {
        ThreadCountSetting::All
    }
}

/// Which curve decompositions a run writes, beyond the always-present
/// total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveOutputKind {
    Total,
    Source,
    Gmm,
    SourceLogicTreeBranch,
}

/// Exceedance-model selection, serializable alongside its parameter,
/// resolved into an [`ExceedanceModel`] at the point of use.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExceedanceModelSetting {
    Lognormal,
    LognormalTruncatedNsigma { truncation_level: f64 },
    NshmpCeusMaxIntensity { cap_ln: f64 },
}

impl Default for ExceedanceModelSetting {
    fn default() -> Self {
        ExceedanceModelSetting::LognormalTruncatedNsigma { truncation_level: 3.0 }
    }
}

impl ExceedanceModelSetting {
    pub fn resolve(self) -> ExceedanceModel {
        match self {
            ExceedanceModelSetting::Lognormal => ExceedanceModel::Lognormal,
            ExceedanceModelSetting::LognormalTruncatedNsigma { truncation_level } => {
                ExceedanceModel::TruncatedNSigma(truncation_level)
            }
            ExceedanceModelSetting::NshmpCeusMaxIntensity { cap_ln } => {
                ExceedanceModel::NshmpCeusMaxIntensity { cap_ln }
            }
        }
    }
}

/// Per-IMT ground-motion levels (natural log units) a curve is tabulated
/// at. The default is a 20-point logarithmic sweep from 0.0025 g to 7.5 g.
pub fn default_ground_motion_levels() -> Vec<f64> {
    let lo = 0.0025_f64.ln();
    let hi = 7.5_f64.ln();
    (0..20)
        .map(|i| lo + (hi - lo) * i as f64 / 19.0)
        .collect()
}

/// Top-level hazard-run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub thread_count: ThreadCountSetting,
    pub output_directory: PathBuf,
    /// IMT labels to compute curves for (e.g. `"PGA"`, `"SA1P0"`); parsed
    /// via [`crate::imt::Imt::parse`] at the point of use.
    pub imts: Vec<String>,
    #[serde(default)]
    pub exceedance_model: ExceedanceModelSetting,
    /// Ruptures beyond this distance (km) from a site are skipped.
    pub max_source_distance: f64,
    /// Which curve decompositions to write; `Total` is implied even if
    /// omitted.
    #[serde(default = "default_curve_output_types")]
    pub curve_output_types: HashSet<CurveOutputKind>,
    /// Ground-motion levels (natural log units), per IMT label. An IMT
    /// absent from this map falls back to [`default_ground_motion_levels`].
    #[serde(default)]
    pub ground_motion_levels: std::collections::HashMap<String, Vec<f64>>,
    /// Number of sites accumulated before a batch is flushed to disk.
    #[serde(default = "default_flush_limit")]
    pub flush_limit: usize,
    /// When true, curves are converted from annual rate to 1-year
    /// Poisson exceedance probability via `1 - exp(-rate)` before being
    /// written.
    #[serde(default)]
    pub output_as_poisson_probability: bool,
    /// Milliseconds a cooperative cancellation waits for in-flight sites
    /// to complete before the pool is forcibly torn down.
    #[serde(default = "default_shutdown_grace_period_ms")]
    pub shutdown_grace_period_ms: u64,
    /// When true, output rows are written in the same order sites were
    /// submitted; when false (default), rows are written in completion
    /// order.
    #[serde(default)]
    pub ordered_output: bool,
}

fn default_curve_output_types() -> HashSet<CurveOutputKind> {
    HashSet::from([CurveOutputKind::Total])
}

fn default_flush_limit() -> usize {
    100
}

fn default_shutdown_grace_period_ms() -> u64 {
    30_000
}

impl Config {
    /// Ground-motion levels for a given IMT label, falling back to the
    /// default sweep when the config doesn't name one explicitly.
    pub fn levels_for_imt(&self, imt_label: &str) -> Vec<f64> {
        self.ground_motion_levels
            .get(imt_label)
            .cloned()
            .unwrap_or_else(default_ground_motion_levels)
    }

    /// Merges `overrides` on top of `self` field-by-field (shallow JSON
    /// object merge: any key present in `overrides` replaces the
    /// corresponding key in `self`, missing keys are left alone) and
    /// re-validates the result by deserializing it back into a `Config`.
    pub fn merge(&self, overrides: &serde_json::Value) -> Result<Config, serde_json::Error> {
        let mut base = serde_json::to_value(self)?;
        merge_json(&mut base, overrides);
        serde_json::from_value(base)
    }
}

fn merge_json(base: &mut serde_json::Value, overrides: &serde_json::Value) {
    match (base, overrides) {
        (serde_json::Value::Object(base_map), serde_json::Value::Object(override_map)) => {
            for (key, value) in override_map {
                merge_json(base_map.entry(key.clone()).or_insert(serde_json::Value::Null), value);
            }
        }
        (base_slot, value) => {
            *base_slot = value.clone();
        }
    }
}

/// Deaggregation-specific configuration: the magnitude/distance/epsilon
/// bin geometry. The return period itself is a
/// CLI positional argument, not part of this struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeaggConfig {
    pub mag_min: f64,
    pub mag_max: f64,
    pub mag_bin_width: f64,
    pub dist_min: f64,
    pub dist_max: f64,
    pub dist_bin_width: f64,
    #[serde(default)]
    pub dist_log_spaced: bool,
    pub epsilon_min: f64,
    pub epsilon_max: f64,
    #[serde(default = "default_epsilon_bin_width")]
    pub epsilon_bin_width: f64,
}

fn default_epsilon_bin_width() -> f64 {
    0.5
}

impl Default for DeaggConfig {
    fn default() -> Self {
        Self {
            mag_min: 4.0,
            mag_max: 9.0,
            mag_bin_width: 0.5,
            dist_min: 0.0,
            dist_max: 300.0,
            dist_bin_width: 10.0,
            dist_log_spaced: false,
            epsilon_min: -3.0,
            epsilon_max: 3.0,
            epsilon_bin_width: 0.5,
        }
    }
}

/// Finds an output directory that doesn't already exist by appending
/// `-1`, `-2`, ... to `base` until a free name is found. `base` itself is
/// returned unchanged if it doesn't exist yet.
pub fn unique_output_dir(base: &Path) -> PathBuf {
    if !base.exists() {
        return base.to_path_buf();
    }
    let parent = base.parent().unwrap_or_else(|| Path::new(""));
    let stem = base.file_name().and_then(|s| s.to_str()).unwrap_or("output");
    for suffix in 1.. {
        let candidate = parent.join(format!("{stem}-{suffix}"));
        if !candidate.exists() {
            return candidate;
        }
    }
    unreachable!("a free output directory name always exists within a finite search")
}
