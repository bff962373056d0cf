//! A minimal in-memory seismic source model: sources producing ruptures
//! at a known annual rate, and sites to evaluate them against.
//!
//! A full source model reader (fault traces, area-source polygons with
//! Gutenberg-Richter rate distributions, logic trees over source
//! geometry) is out of scope here; this module supplies just enough
//! structure — sources holding pre-enumerated ruptures — for
//! [`crate::pipeline`] to have something to iterate.

use crate::error::Result;
use crate::gmm_input::GmmInput;
use geo::{Distance, Haversine, Point};
use serde::{Deserialize, Serialize};

/// The kind of source a [`Source`] represents, carried through to output
/// metadata but otherwise not consulted by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Fault,
    Area,
    Grid,
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            SourceType::Fault => "fault",
            SourceType::Area => "area",
            SourceType::Grid => "grid",
        };
        write!(f, "{label}")
    }
}

/// A single rupture: a magnitude, an annual occurrence rate, and the
/// site-to-rupture distance/geometry terms a [`crate::ground_motion::GroundMotionModel`]
/// needs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rupture {
    pub mag: f64,
    pub rate_per_year: f64,
    pub r_jb: f64,
    pub r_rup: f64,
    pub r_x: f64,
    pub dip: f64,
    pub width: f64,
    pub z_top: f64,
    pub z_hyp: f64,
    pub rake: f64,
}

impl Rupture {
    /// Combines this rupture's geometry with a site's soil column into a
    /// complete [`GmmInput`].
    pub fn to_gmm_input(&self, site: &Site) -> Result<GmmInput> {
        GmmInput::with_defaults()
            .mw(self.mag)
            .r_jb(self.r_jb)
            .r_rup(self.r_rup)
            .r_x(self.r_x)
            .dip(self.dip)
            .width(self.width)
            .z_top(self.z_top)
            .z_hyp(self.z_hyp)
            .rake(self.rake)
            .vs30(site.vs30)
            .vs_inf(site.vs_inf)
            .z1p0(site.z1p0)
            .z2p5(site.z2p5)
            .build()
    }
}

/// A seismic source: a named group of ruptures sharing a source type and
/// a representative distance used only for reporting/sorting, not for
/// GMM evaluation (each rupture carries its own distance terms).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub id: String,
    pub source_type: SourceType,
    pub representative_distance_km: f64,
    pub ruptures: Vec<Rupture>,
}

/// A collection of sources making up one hazard calculation's input.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceModel {
    pub sources: Vec<Source>,
}

impl SourceModel {
    pub fn new(sources: Vec<Source>) -> Self {
        Self { sources }
    }

    /// Total number of ruptures across all sources, used to size
    /// progress reporting in [`crate::pipeline`].
    pub fn rupture_count(&self) -> usize {
        self.sources.iter().map(|s| s.ruptures.len()).sum()
    }

    pub fn iter_ruptures(&self) -> impl Iterator<Item = (&Source, &Rupture)> {
        self.sources
            .iter()
            .flat_map(|source| source.ruptures.iter().map(move |r| (source, r)))
    }
}

/// A site where hazard is to be computed: an identifying label, location,
/// and the soil-column properties every [`GmmInput`] needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    #[serde(default)]
    pub name: String,
    pub lon: f64,
    pub lat: f64,
    pub vs30: f64,
    #[serde(default = "default_vs_inf")]
    pub vs_inf: bool,
    #[serde(default = "default_nan")]
    pub z1p0: f64,
    #[serde(default = "default_nan")]
    pub z2p5: f64,
}

fn default_vs_inf() -> bool {
    true
}

fn default_nan() -> f64 {
    f64::NAN
}

impl Site {
    /// A site at `(lon, lat)` with a given Vs30, an empty name, and no
    /// basin-depth overrides (`z1p0`/`z2p5` left `NaN`, i.e. "use model
    /// default").
    pub fn new(lon: f64, lat: f64, vs30: f64) -> Self {
        Self {
            name: String::new(),
            lon,
            lat,
            vs30,
            vs_inf: true,
            z1p0: f64::NAN,
            z2p5: f64::NAN,
        }
    }

    /// A named site, otherwise identical to [`Site::new`].
    pub fn named(name: impl Into<String>, lon: f64, lat: f64, vs30: f64) -> Self {
        Self {
            name: name.into(),
            ..Self::new(lon, lat, vs30)
        }
    }

    /// Great-circle distance to `other`, in km, via `geo::{Haversine, Distance}`.
    pub fn distance_km(&self, other: &Site) -> f64 {
        Haversine.distance(Point::new(self.lon, self.lat), Point::new(other.lon, other.lat)) / 1000.0
    }
}
