//! A representative model family per tectonic regime.
//!
//! Coefficients embedded in this module are illustrative: they exercise
//! the correct functional form for each family but are not sourced from
//! any published GMPE and must not be used for real hazard estimates.
//! See `DESIGN.md` for the full disclosure.

pub mod ceus;
pub mod crustal;
pub mod regional;
pub mod subduction;
pub mod tables;
