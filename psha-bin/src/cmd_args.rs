use clap::{Args, Parser, Subcommand};

/// Ground-motion model selector, parsed from a CLI string into a
/// [`psha_lib::registry::GmmId`].
///
/// There's no configuration-file option for GMM selection — source-model
/// logic trees (which would normally carry this choice) are out of scope
/// for this crate. `--gmm` fills that gap for the CLI surface, matching
/// [`psha_lib::registry::GmmId`]'s variant names case-insensitively
/// (e.g. `ask14like`, `zhao06likeinterface`).
#[derive(Debug, Clone, Copy)]
pub struct GmmIdArg(pub psha_lib::registry::GmmId);

impl std::str::FromStr for GmmIdArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use psha_lib::registry::GmmId::*;
        let normalized = s.to_ascii_lowercase().replace(['-', '_'], "");
        let id = match normalized.as_str() {
            "ask14like" => Ask14Like,
            "bssa14like" => Bssa14Like,
            "cb14like" => Cb14Like,
            "cy14like" => Cy14Like,
            "idriss14like" => Idriss14Like,
            "zhao06likeinterface" => Zhao06LikeInterface,
            "zhao06likeslab" => Zhao06LikeSlab,
            "bchydro12interface" => BcHydro12Interface,
            "bchydro12slab" => BcHydro12Slab,
            "frankel96likesoftrock" => Frankel96LikeSoftRock,
            "frankel96likehardrock" => Frankel96LikeHardRock,
            "ab06primelike" => Ab06PrimeLike,
            "a08primelike" => A08PrimeLike,
            "p11like" => P11Like,
            "ngaeastlike" => NgaEastLike,
            "genericregionallike" => GenericRegionalLike,
            other => return Err(format!("unknown GMM `{other}`; run `list-gmms` to see every accepted name")),
        };
        Ok(GmmIdArg(id))
    }
}

/// Computes hazard curves for a set of sites against a source model.
#[derive(Args, Debug)]
pub struct HazardArgs {
    /// Directory containing `model.json` (and optionally `config.json`).
    pub model: String,

    /// A single CSV site line, a `*.csv` file, or a `*.geojson` file.
    pub sites: String,

    /// Configuration file overriding the model directory's default
    /// (or supplying one, if the model directory has none).
    pub config: Option<String>,

    /// Ground-motion model to evaluate ruptures with.
    #[arg(long, default_value = "ask14like")]
    pub gmm: GmmIdArg,
}

/// Deaggregates a hazard curve at a target return period.
#[derive(Args, Debug)]
pub struct DeaggArgs {
    /// Directory containing `model.json` (and optionally `config.json`).
    pub model: String,

    /// A single CSV site line, a `*.csv` file, or a `*.geojson` file.
    pub sites: String,

    /// Return period in years (a positive number); inverted to an
    /// annual frequency of exceedance via `1 / return_period`.
    pub return_period: f64,

    /// Configuration file overriding the model directory's default
    /// (or supplying one, if the model directory has none).
    pub config: Option<String>,

    /// Ground-motion model to evaluate ruptures with.
    #[arg(long, default_value = "ask14like")]
    pub gmm: GmmIdArg,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Hazard(HazardArgs),
    Deagg(DeaggArgs),
    /// Lists every known `--gmm` name, grouped by tectonic regime.
    ListGmms,
}

/// Top-level CLI: `hazard`, `deagg`, or `list-gmms`.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CmdArgs {
    #[command(subcommand)]
    pub command: Command,
}
