//! # Output Writers: Hazard Curves and Deaggregation
//!
//! This module writes the persisted-state layout a run produces: a
//! curve-output CSV per decomposition under
//! `<output_dir>/<imt>/...`, truncated on a batch's first write to a
//! given path and appended to on every subsequent batch for that same
//! path, plus a JSON report for a single deaggregation result and a
//! snapshot of the effective configuration a run used.
//!
//! ## Curve CSV format
//!
//! ```text
//! lon,lat,0.0025,0.00317,...,7.5
//! 142.600,50.100,0.0998,0.0721,...,1.2e-6
//! ```
//!
//! The header's ground-motion levels are linear units (`level_ln.exp()`);
//! each data row is one site's annual frequency of exceedance (or, when
//! [`crate::config::Config::output_as_poisson_probability`] is set, its
//! one-year Poisson exceedance probability) at each level.
//!
//! ## See Also
//!
//! - [`crate::pipeline::HazardCurve`]
//! - [`crate::deagg::DeaggResult`]
//! - [`csv`](https://docs.rs/csv/)

use crate::deagg::DeaggResult;
use crate::error::{HazardError, Result};
use crate::pipeline::HazardCurve;
use crate::registry::GmmId;
use csv::WriterBuilder;
use std::fs::{self, OpenOptions};
use std::io::Write as _;
use std::path::{Path, PathBuf};

fn io_err(path: &Path, source: std::io::Error) -> HazardError {
    HazardError::IoFailure {
        path: path.display().to_string(),
        source,
    }
}

/// Converts an annual frequency of exceedance to a one-year Poisson
/// exceedance probability, `1 - exp(-rate)`.
pub fn afe_to_poisson_probability(rate: f64) -> f64 {
    -(-rate).exp_m1()
}

/// The curve output path for a given IMT and decomposition:
///
/// - total curve: `<output_dir>/<imt>/total.csv`
/// - per-source-type curve: `<output_dir>/<imt>/source/<type>.csv`
/// - per-GMM curve: `<output_dir>/<imt>/gmm/<gmm_id>.csv`
pub enum CurveOutputPath<'a> {
    Total,
    SourceType(&'a str),
    Gmm(GmmId),
}

fn curve_path(output_dir: &Path, imt_label: &str, kind: &CurveOutputPath) -> PathBuf {
    let imt_dir = output_dir.join(imt_label);
    match kind {
        CurveOutputPath::Total => imt_dir.join("total.csv"),
        CurveOutputPath::SourceType(source_type) => imt_dir.join("source").join(format!("{source_type}.csv")),
        CurveOutputPath::Gmm(id) => imt_dir.join("gmm").join(format!("{id:?}.csv")),
    }
}

fn resource_io_err(path: &Path, err: csv::Error) -> HazardError {
    match err.into_kind() {
        csv::ErrorKind::Io(source) => io_err(path, source),
        other => HazardError::ResourceLoadFailure {
            resource: path.display().to_string(),
            detail: other.to_string(),
        },
    }
}

/// Appends a batch of curves to the CSV at `curve_path(output_dir, imt_label, kind)`,
/// creating the file (and its parent directories) and writing the header
/// row the first time this path is written, and truncating it only then
/// — every later call for the same path appends, supporting a caller
/// that streams sites through in flush-sized batches.
pub fn write_curve_batch(
    output_dir: &Path,
    imt_label: &str,
    kind: CurveOutputPath,
    curves: &[HazardCurve],
    as_poisson_probability: bool,
) -> Result<()> {
    if curves.is_empty() {
        return Ok(());
    }
    let path = curve_path(output_dir, imt_label, &kind);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }

    let is_first_write = !path.exists();
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(!is_first_write)
        .truncate(is_first_write)
        .open(&path)
        .map_err(|e| io_err(&path, e))?;

    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(file);

    if is_first_write {
        let mut header = vec!["lon".to_string(), "lat".to_string()];
        header.extend(curves[0].levels_ln.iter().map(|level_ln| level_ln.exp().to_string()));
        wtr.write_record(&header).map_err(|e| resource_io_err(&path, e))?;
    }

    for curve in curves {
        let mut row = vec![curve.site.lon.to_string(), curve.site.lat.to_string()];
        row.extend(curve.afe.iter().map(|rate| {
            let value = if as_poisson_probability {
                afe_to_poisson_probability(*rate)
            } else {
                *rate
            };
            value.to_string()
        }));
        wtr.write_record(&row).map_err(|e| resource_io_err(&path, e))?;
    }
    wtr.flush().map_err(|e| io_err(&path, e))?;
    Ok(())
}

/// Writes a single deaggregation result to `<output_dir>/<imt>/deagg.json`.
pub fn write_deagg_result(output_dir: &Path, imt_label: &str, result: &DeaggResult) -> Result<()> {
    #[derive(serde::Serialize)]
    struct DeaggBinRow {
        mag_bin: (f64, f64),
        dist_bin: (f64, f64),
        epsilon_bin: (f64, f64),
        rate: f64,
    }
    #[derive(serde::Serialize)]
    struct DeaggReport {
        level_ln: f64,
        level: f64,
        total_rate: f64,
        mean_mag: f64,
        mean_dist: f64,
        mean_epsilon: f64,
        modal_mag_bin: (f64, f64),
        modal_dist_bin: (f64, f64),
        modal_epsilon_bin: (f64, f64),
        histogram: Vec<DeaggBinRow>,
    }

    let report = DeaggReport {
        level_ln: result.level_ln,
        level: result.level_ln.exp(),
        total_rate: result.total_rate,
        mean_mag: result.mean_mag,
        mean_dist: result.mean_dist,
        mean_epsilon: result.mean_epsilon,
        modal_mag_bin: result.modal_mag_bin,
        modal_dist_bin: result.modal_dist_bin,
        modal_epsilon_bin: result.modal_epsilon_bin,
        histogram: result
            .histogram
            .iter()
            .map(|bin| DeaggBinRow {
                mag_bin: bin.mag_bin,
                dist_bin: bin.dist_bin,
                epsilon_bin: bin.epsilon_bin,
                rate: bin.rate,
            })
            .collect(),
    };

    let imt_dir = output_dir.join(imt_label);
    fs::create_dir_all(&imt_dir).map_err(|e| io_err(&imt_dir, e))?;
    let path = imt_dir.join("deagg.json");
    let text = serde_json::to_string_pretty(&report).map_err(|e| HazardError::ResourceLoadFailure {
        resource: path.display().to_string(),
        detail: e.to_string(),
    })?;
    fs::write(&path, text).map_err(|e| io_err(&path, e))?;
    Ok(())
}

/// Writes the effective configuration a run used to `<output_dir>/config.json`,
/// so a run's on-disk output is self-describing independent of whatever
/// CLI arguments and model-directory defaults produced it.
pub fn write_effective_config(output_dir: &Path, config: &crate::config::Config) -> Result<()> {
    fs::create_dir_all(output_dir).map_err(|e| io_err(output_dir, e))?;
    let path = output_dir.join("config.json");
    let text = serde_json::to_string_pretty(config).map_err(|e| HazardError::ResourceLoadFailure {
        resource: path.display().to_string(),
        detail: e.to_string(),
    })?;
    fs::write(&path, text).map_err(|e| io_err(&path, e))?;
    Ok(())
}

/// Appends a single line to `<output_dir>/<program>.log`, used by the CLI
/// as a plain-text run log sitting alongside `tracing`'s structured
/// stderr/file output.
pub fn append_run_log_line(output_dir: &Path, program: &str, line: &str) -> Result<()> {
    fs::create_dir_all(output_dir).map_err(|e| io_err(output_dir, e))?;
    let path = output_dir.join(format!("{program}.log"));
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| io_err(&path, e))?;
    writeln!(file, "{line}").map_err(|e| io_err(&path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imt::Imt;
    use crate::source_model::Site;

    fn sample_curve(lon: f64, lat: f64) -> HazardCurve {
        HazardCurve {
            site: Site::new(lon, lat, 400.0),
            imt: Imt::Pga,
            levels_ln: vec![0.0025_f64.ln(), 0.1_f64.ln(), 1.0_f64.ln()],
            afe: vec![0.5, 0.05, 0.001],
        }
    }

    #[test]
    fn test_afe_to_poisson_probability_matches_formula() {
        let p = afe_to_poisson_probability(0.001);
        assert!((p - (1.0 - (-0.001_f64).exp())).abs() < 1e-15);
    }

    #[test]
    fn test_write_curve_batch_truncates_then_appends() {
        let dir = std::env::temp_dir().join("psha-lib-test-write-curve-batch");
        let _ = fs::remove_dir_all(&dir);

        write_curve_batch(&dir, "PGA", CurveOutputPath::Total, &[sample_curve(1.0, 2.0)], false).unwrap();
        write_curve_batch(&dir, "PGA", CurveOutputPath::Total, &[sample_curve(3.0, 4.0)], false).unwrap();

        let path = curve_path(&dir, "PGA", &CurveOutputPath::Total);
        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        // header + 2 data rows, no repeated header on the second write.
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("lon,lat,"));
        assert!(lines[1].starts_with("1,2,"));
        assert!(lines[2].starts_with("3,4,"));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_write_curve_batch_poisson_probability_is_smaller_than_rate() {
        let dir = std::env::temp_dir().join("psha-lib-test-write-curve-poisson");
        let _ = fs::remove_dir_all(&dir);

        write_curve_batch(&dir, "PGA", CurveOutputPath::Total, &[sample_curve(1.0, 2.0)], true).unwrap();
        let path = curve_path(&dir, "PGA", &CurveOutputPath::Total);
        let text = fs::read_to_string(&path).unwrap();
        let data_row = text.lines().nth(1).unwrap();
        let first_value: f64 = data_row.split(',').nth(2).unwrap().parse().unwrap();
        assert!(first_value < 0.5);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_source_type_and_gmm_paths_are_nested() {
        let dir = PathBuf::from("/tmp/psha-out");
        let source_path = curve_path(&dir, "PGA", &CurveOutputPath::SourceType("fault"));
        assert_eq!(source_path, dir.join("PGA").join("source").join("fault.csv"));
        let gmm_path = curve_path(&dir, "PGA", &CurveOutputPath::Gmm(GmmId::Ask14Like));
        assert_eq!(gmm_path, dir.join("PGA").join("gmm").join("Ask14Like.csv"));
    }

    #[test]
    fn test_write_effective_config_round_trips() {
        use crate::config::{Config, ExceedanceModelSetting, ThreadCountSetting};
        use std::collections::HashSet;

        let dir = std::env::temp_dir().join("psha-lib-test-write-config");
        let _ = fs::remove_dir_all(&dir);
        let config = Config {
            thread_count: ThreadCountSetting::Fixed(2),
            output_directory: dir.clone(),
            imts: vec!["PGA".to_string()],
            exceedance_model: ExceedanceModelSetting::Lognormal,
            max_source_distance: 200.0,
            curve_output_types: HashSet::from([crate::config::CurveOutputKind::Total]),
            ground_motion_levels: std::collections::HashMap::new(),
            flush_limit: 100,
            output_as_poisson_probability: false,
            shutdown_grace_period_ms: 30_000,
            ordered_output: false,
        };

        write_effective_config(&dir, &config).unwrap();
        let text = fs::read_to_string(dir.join("config.json")).unwrap();
        let parsed: Config = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, config);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_append_run_log_line_appends_across_calls() {
        let dir = std::env::temp_dir().join("psha-lib-test-run-log");
        let _ = fs::remove_dir_all(&dir);

        append_run_log_line(&dir, "psha-bin", "started").unwrap();
        append_run_log_line(&dir, "psha-bin", "finished").unwrap();
        let text = fs::read_to_string(dir.join("psha-bin.log")).unwrap();
        assert_eq!(text.lines().collect::<Vec<_>>(), vec!["started", "finished"]);

        fs::remove_dir_all(&dir).unwrap();
    }
}
