//! Error taxonomy shared by every module in this crate.
//!
//! Variants follow the error taxonomy from the engine's design: each
//! carries enough context to produce a useful log line (offending field,
//! site, rupture) without forcing callers to downcast a boxed error.

use crate::imt::Imt;

/// Crate-wide error type.
#[derive(Debug, thiserror::Error)]
pub enum HazardError {
    /// A `GmmInput` field or configuration value is NaN or outside its
    /// constraint. The pipeline isolates these per-site and continues.
    #[error("invalid input: field `{field}` = {value} is outside its constraint ({detail})")]
    InvalidInput {
        field: &'static str,
        value: f64,
        detail: String,
    },

    /// A GMM was asked for an IMT it has no coefficient data for. Fails
    /// fast, before any site is processed.
    #[error("{model} does not support {imt:?}")]
    UnsupportedImt { model: &'static str, imt: Imt },

    /// A table lookup or interpolation was asked for an x (or r, m) value
    /// outside the tabulated/represented range, and the no-clamp variant
    /// was used.
    #[error("out of range: {detail}")]
    OutOfRange { detail: String },

    /// Index out of bounds on a discretized function.
    #[error("index {index} out of bounds (len {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    /// A coefficient or ground-motion table resource failed to parse or
    /// could not be read. Fatal at startup.
    #[error("failed to load resource `{resource}`: {detail}")]
    ResourceLoadFailure { resource: String, detail: String },

    /// Output could not be written. Fatal for the current run; partial
    /// results already written remain on disk.
    #[error("I/O failure writing `{path}`: {source}")]
    IoFailure {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Misuse of a builder or the registry's instance cache: double-set
    /// field, missing field at `build()`, or a cache in an impossible
    /// state. Always a programmer error, always fatal.
    #[error("state error: {0}")]
    StateError(String),
}

impl HazardError {
    pub fn state<S: Into<String>>(msg: S) -> Self {
        HazardError::StateError(msg.into())
    }

    pub fn out_of_range<S: Into<String>>(msg: S) -> Self {
        HazardError::OutOfRange {
            detail: msg.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, HazardError>;
