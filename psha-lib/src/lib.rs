//! # `psha-lib`
//!
//! **A probabilistic seismic hazard analysis (PSHA) engine: ground-motion
//! models, the hazard aggregation pipeline, and deaggregation.**
//!
//! Given a seismic source model (a catalog of ruptures, each with a
//! magnitude, geometry, and annual rate of occurrence) and a set of
//! sites, this crate computes, per site and intensity measure type
//! (IMT), a hazard curve: the annual rate at which each of a fixed set
//! of ground-motion levels is exceeded. It can additionally deaggregate
//! a curve at a chosen return period into magnitude/distance/epsilon
//! bins.
//!
//! ## Module overview
//!
//! - [`xy`] — the discretized-function substrate (evenly spaced and
//!   arbitrary XY-sequences, with linear and log-space interpolation)
//!   that hazard curves, coefficient tables, and curve inversion are
//!   built on.
//! - [`imt`] — the intensity measure type registry (PGA, PGV, spectral
//!   acceleration at a period).
//! - [`gmm_input`] — the immutable ground-motion model input record, its
//!   builder, field constraints, and style-of-faulting classification.
//! - [`coefficients`] — IMT-keyed coefficient containers loaded once per
//!   model family from a CSV-like resource.
//! - [`gm_table`] — tabulated `(magnitude, distance) -> ln(ground
//!   motion)` grids with bilinear interpolation, used by the table-based
//!   model family.
//! - [`ground_motion`] — the `GroundMotion` result type (scalar or
//!   multi-branch) and the `GroundMotionModel` trait every model family
//!   implements.
//! - [`models`] — one representative model per tectonic regime (active
//!   crustal, subduction, stable continent, table-based, other
//!   regional).
//! - [`registry`] — the catalog of known models and a process-wide,
//!   thread-safe instance cache keyed on `(GmmId, Imt)`.
//! - [`exceedance`] — turns a `GroundMotion` prediction into a
//!   probability of exceeding a ground-motion level, with optional
//!   truncation or an NSHMP-style intensity cap.
//! - [`config`] — the calculation configuration (thread pool sizing,
//!   output format, deaggregation parameters), serializable to/from
//!   JSON and mergeable.
//! - [`source_model`] — the in-memory source/rupture/site shapes the
//!   pipeline consumes.
//! - [`pipeline`] — the per-site hazard aggregation pipeline: source
//!   distance filtering, per-rupture GMM dispatch, exceedance-weighted
//!   rate accumulation, parallelized over sites with a Rayon thread
//!   pool.
//! - [`deagg`] — curve inversion and magnitude/distance/epsilon
//!   deaggregation.
//! - [`readers`] — site CSV/GeoJSON and source-model JSON loaders.
//! - [`writers`] — batched hazard-curve CSV output and run log writing.
//! - [`auxilary`] — shared numerical constants and helpers (`erfc`-based
//!   standard normal CDF, float comparison).
//! - [`error`] — the crate-wide `HazardError` taxonomy.
//!
//! ## License
//!
//! Licensed under the Apache License, Version 2.0 ([Apache-2.0](http://www.apache.org/licenses/LICENSE-2.0))
//!
//! ---
//!
//! ```text
//! Copyright 2025 Andrey Stepnov, GEOPHYSTECH LLC
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! you may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//!     http://www.apache.org/licenses/LICENSE-2.0
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.
//! ```
//! ---

pub mod auxilary;
pub mod coefficients;
pub mod config;
pub mod deagg;
pub mod error;
pub mod exceedance;
pub mod gm_table;
pub mod ground_motion;
pub mod gmm_input;
pub mod imt;
pub mod models;
pub mod pipeline;
pub mod readers;
pub mod registry;
pub mod source_model;
pub mod writers;
pub mod xy;
