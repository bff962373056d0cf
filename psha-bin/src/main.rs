mod cmd_args;

use anyhow::{bail, Context, Result};
use clap::Parser;
use psha_lib::config::{unique_output_dir, Config};
use psha_lib::deagg::deaggregate;
use psha_lib::imt::Imt;
use psha_lib::pipeline::Pipeline;
use psha_lib::readers::{read_config_file, read_default_config, read_sites, read_source_model};
use psha_lib::registry::{self, GmmId};
use psha_lib::writers::{write_curve_batch, write_deagg_result, write_effective_config, CurveOutputPath};
use std::path::Path;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cmd_args::{CmdArgs, Command, DeaggArgs, HazardArgs};

fn main() -> Result<()> {
    let args = CmdArgs::parse();

    if let Command::ListGmms = &args.command {
        for (group, ids) in GmmId::groups() {
            println!("{group}:");
            for id in ids {
                println!("  {id:?}");
            }
        }
        return Ok(());
    }

    match &args.command {
        Command::Hazard(hazard_args) => run_hazard(hazard_args),
        Command::Deagg(deagg_args) => run_deagg(deagg_args),
        Command::ListGmms => unreachable!("handled above"),
    }
}

/// Loads the effective configuration for a run: the model directory's
/// `config.json` if present, overridden field-by-field by `[config]`
/// when one is given.
fn load_config(model_dir: &str, config_path: &Option<String>) -> Result<Config> {
    let default_config = read_default_config(model_dir).context("reading model directory's config.json")?;

    let config = match (default_config, config_path) {
        (Some(default_value), Some(override_path)) => {
            let base: Config = serde_json::from_value(default_value).context("parsing model directory's config.json")?;
            let overrides = read_config_file(override_path).context("reading override config file")?;
            base.merge(&overrides).context("merging override config")?
        }
        (Some(default_value), None) => {
            serde_json::from_value(default_value).context("parsing model directory's config.json")?
        }
        (None, Some(override_path)) => {
            let overrides = read_config_file(override_path).context("reading config file")?;
            serde_json::from_value(overrides).context("parsing config file")?
        }
        (None, None) => bail!(
            "no configuration available: model directory has no config.json and no [config] was given"
        ),
    };
    Ok(config)
}

fn init_logging(output_dir: &Path, program: &str) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    std::fs::create_dir_all(output_dir).with_context(|| format!("creating output directory {output_dir:?}"))?;
    let file_appender = tracing_appender::rolling::never(output_dir, format!("{program}.log"));
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(guard)
}

fn run_hazard(args: &HazardArgs) -> Result<()> {
    let config = load_config(&args.model, &args.config)?;
    let output_dir = unique_output_dir(&config.output_directory);
    let _log_guard = init_logging(&output_dir, "psha-hazard")?;

    info!(model = %args.model, sites = %args.sites, gmm = ?args.gmm.0, "starting hazard run");

    let source_model = read_source_model(&args.model).context("reading source model")?;
    let sites = read_sites(&args.sites).context("reading sites")?;
    write_effective_config(&output_dir, &config).context("writing effective config")?;

    let pipeline = Pipeline::new(config.thread_count).context("building thread pool")?;
    let exceedance = config.exceedance_model.resolve();

    for imt_label in &config.imts {
        let imt = Imt::parse(imt_label).with_context(|| format!("parsing IMT label `{imt_label}`"))?;
        let gmm = registry::instance(args.gmm.0, imt).with_context(|| format!("looking up GMM for {imt_label}"))?;
        let levels_ln = config.levels_for_imt(imt_label);
        let decompose_by_source = config
            .curve_output_types
            .contains(&psha_lib::config::CurveOutputKind::Source);

        for batch in sites.chunks(config.flush_limit.max(1)) {
            let result = pipeline.run_ordered(
                batch,
                &source_model,
                gmm.as_ref(),
                imt,
                exceedance,
                &levels_ln,
                config.max_source_distance,
                decompose_by_source,
            );
            let result = match result {
                Ok(result) => result,
                Err(err) => {
                    error!(error = %err, "hazard batch failed");
                    return Err(err.into());
                }
            };

            let totals: Vec<_> = result.sites.iter().map(|s| s.total.clone()).collect();
            write_curve_batch(
                &output_dir,
                imt_label,
                CurveOutputPath::Total,
                &totals,
                config.output_as_poisson_probability,
            )
            .context("writing total curve batch")?;

            if decompose_by_source {
                let mut by_type: std::collections::HashMap<String, Vec<_>> = std::collections::HashMap::new();
                for site_hazard in &result.sites {
                    for (source_type, curve) in &site_hazard.by_source_type {
                        by_type.entry(source_type.to_string()).or_default().push(curve.clone());
                    }
                }
                for (source_type, curves) in by_type {
                    write_curve_batch(
                        &output_dir,
                        imt_label,
                        CurveOutputPath::SourceType(&source_type),
                        &curves,
                        config.output_as_poisson_probability,
                    )
                    .context("writing per-source-type curve batch")?;
                }
            }

            info!(imt = %imt_label, sites_in_batch = batch.len(), "batch complete");
        }
    }

    info!(output_dir = %output_dir.display(), "hazard run complete");
    Ok(())
}

fn run_deagg(args: &DeaggArgs) -> Result<()> {
    if args.return_period <= 0.0 {
        bail!("return_period must be positive, got {}", args.return_period);
    }

    let config = load_config(&args.model, &args.config)?;
    let output_dir = unique_output_dir(&config.output_directory);
    let _log_guard = init_logging(&output_dir, "psha-deagg")?;

    info!(model = %args.model, sites = %args.sites, return_period = args.return_period, "starting deaggregation run");

    let source_model = read_source_model(&args.model).context("reading source model")?;
    let sites = read_sites(&args.sites).context("reading sites")?;
    write_effective_config(&output_dir, &config).context("writing effective config")?;

    let pipeline = Pipeline::new(config.thread_count).context("building thread pool")?;
    let exceedance = config.exceedance_model.resolve();
    let target_afe = 1.0 / args.return_period;
    let deagg_config = psha_lib::config::DeaggConfig::default();

    for imt_label in &config.imts {
        let imt = Imt::parse(imt_label).with_context(|| format!("parsing IMT label `{imt_label}`"))?;
        let gmm = registry::instance(args.gmm.0, imt).with_context(|| format!("looking up GMM for {imt_label}"))?;
        let levels_ln = config.levels_for_imt(imt_label);

        for site in &sites {
            let hazard = pipeline.run_ordered(
                std::slice::from_ref(site),
                &source_model,
                gmm.as_ref(),
                imt,
                exceedance,
                &levels_ln,
                config.max_source_distance,
                false,
            );
            let hazard = match hazard {
                Ok(hazard) => hazard,
                Err(err) => {
                    error!(error = %err, site = %site.name, "hazard curve failed");
                    return Err(err.into());
                }
            };
            let curve = &hazard.sites[0].total;

            let result = deaggregate(curve, target_afe, site, &source_model, gmm.as_ref(), exceedance, &deagg_config);
            let result = match result {
                Ok(result) => result,
                Err(err) => {
                    warn!(site = %site.name, error = %err, "skipping site with no invertible hazard curve");
                    continue;
                }
            };

            write_deagg_result(&output_dir.join(&site.name), imt_label, &result).context("writing deagg result")?;
            info!(site = %site.name, imt = %imt_label, level = result.level_ln.exp(), "deaggregation complete");
        }
    }

    info!(output_dir = %output_dir.display(), "deaggregation run complete");
    Ok(())
}
