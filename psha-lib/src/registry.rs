//! The catalog of known ground-motion models and a process-wide instance
//! cache: a `OnceLock`-backed map, keyed on `(GmmId, Imt)` rather than a
//! bare string, since callers ask the registry for "this model at this
//! IMT".
//!
//! A model is constructed once per [`GmmId`] (not once per IMT — each
//! model instance already answers every IMT it supports) and the same
//! `Arc` is shared across every `(id, imt)` cache entry that model
//! answers for.

use crate::error::{HazardError, Result};
use crate::ground_motion::GroundMotionModel;
use crate::imt::Imt;
use crate::models::{ceus, crustal, regional, subduction, tables};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

/// Stable identifier for a known model family/flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GmmId {
    Ask14Like,
    Bssa14Like,
    Cb14Like,
    Cy14Like,
    Idriss14Like,
    Zhao06LikeInterface,
    Zhao06LikeSlab,
    BcHydro12Interface,
    BcHydro12Slab,
    Frankel96LikeSoftRock,
    Frankel96LikeHardRock,
    Ab06PrimeLike,
    A08PrimeLike,
    P11Like,
    NgaEastLike,
    GenericRegionalLike,
}

impl GmmId {
    /// All known IDs, grouped by tectonic regime family — used by CLI
    /// help text and by callers that want to run "every model in a
    /// family" against the same inputs.
    pub fn groups() -> Vec<(&'static str, Vec<GmmId>)> {
        vec![
            (
                "2014 active crust (WUS)",
                vec![
                    GmmId::Ask14Like,
                    GmmId::Bssa14Like,
                    GmmId::Cb14Like,
                    GmmId::Cy14Like,
                    GmmId::Idriss14Like,
                ],
            ),
            (
                "subduction",
                vec![
                    GmmId::Zhao06LikeInterface,
                    GmmId::Zhao06LikeSlab,
                    GmmId::BcHydro12Interface,
                    GmmId::BcHydro12Slab,
                ],
            ),
            (
                "stable continent",
                vec![GmmId::Frankel96LikeSoftRock, GmmId::Frankel96LikeHardRock],
            ),
            (
                "table-based",
                vec![
                    GmmId::Ab06PrimeLike,
                    GmmId::A08PrimeLike,
                    GmmId::P11Like,
                    GmmId::NgaEastLike,
                ],
            ),
            ("other regional", vec![GmmId::GenericRegionalLike]),
        ]
    }

    fn build(self) -> Result<Arc<dyn GroundMotionModel>> {
        use crate::models::ceus::{MagnitudeConversion, SiteClass};
        use crate::models::crustal::Flavor as CrustalFlavor;
        use crate::models::subduction::Flavor as SubductionFlavor;

        Ok(match self {
            GmmId::Ask14Like => Arc::new(crustal::NgaWest2Like::new(CrustalFlavor::Ask14)?),
            GmmId::Bssa14Like => Arc::new(crustal::NgaWest2Like::new(CrustalFlavor::Bssa14)?),
            GmmId::Cb14Like => Arc::new(crustal::NgaWest2Like::new(CrustalFlavor::Cb14)?),
            GmmId::Cy14Like => Arc::new(crustal::NgaWest2Like::new(CrustalFlavor::Cy14)?),
            GmmId::Idriss14Like => Arc::new(crustal::NgaWest2Like::new(CrustalFlavor::Idriss14)?),
            GmmId::Zhao06LikeInterface => Arc::new(subduction::Zhao06Like::new(SubductionFlavor::Interface)?),
            GmmId::Zhao06LikeSlab => Arc::new(subduction::Zhao06Like::new(SubductionFlavor::Slab)?),
            GmmId::BcHydro12Interface => Arc::new(subduction::BcHydro12Like::new(SubductionFlavor::Interface)?),
            GmmId::BcHydro12Slab => Arc::new(subduction::BcHydro12Like::new(SubductionFlavor::Slab)?),
            GmmId::Frankel96LikeSoftRock => {
                Arc::new(ceus::Frankel96Like::new(SiteClass::SoftRock, MagnitudeConversion::None)?)
            }
            GmmId::Frankel96LikeHardRock => {
                Arc::new(ceus::Frankel96Like::new(SiteClass::HardRock, MagnitudeConversion::None)?)
            }
            GmmId::Ab06PrimeLike => Arc::new(tables::Ab06PrimeLike::new()?),
            GmmId::A08PrimeLike => Arc::new(tables::A08PrimeLike::new()?),
            GmmId::P11Like => Arc::new(tables::P11Like::new()?),
            GmmId::NgaEastLike => Arc::new(tables::NgaEastLike::new()?),
            GmmId::GenericRegionalLike => Arc::new(regional::GenericRegionalLike::new()?),
        })
    }
}

type CacheKey = (GmmId, Imt);

fn cache() -> &'static Mutex<HashMap<CacheKey, Arc<dyn GroundMotionModel>>> {
    static CACHE: OnceLock<Mutex<HashMap<(GmmId, Imt), Arc<dyn GroundMotionModel>>>> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Returns the shared model instance for `id`, verifying it supports
/// `imt`. The first call for a given `id` constructs the model and
/// populates cache entries for every IMT it supports; later calls (for
/// any IMT that model supports) are a lock-and-lookup.
pub fn instance(id: GmmId, imt: Imt) -> Result<Arc<dyn GroundMotionModel>> {
    {
        let guard = cache().lock().map_err(|_| HazardError::state("model cache poisoned"))?;
        if let Some(model) = guard.get(&(id, imt)) {
            return Ok(Arc::clone(model));
        }
    }

    let model = id.build()?;
    if !model.supported_imts().contains(&imt) {
        return Err(HazardError::UnsupportedImt {
            model: model.name(),
            imt,
        });
    }

    let mut guard = cache().lock().map_err(|_| HazardError::state("model cache poisoned"))?;
    for supported in model.supported_imts() {
        guard.entry((id, supported)).or_insert_with(|| Arc::clone(&model));
    }
    Ok(Arc::clone(guard.get(&(id, imt)).expect("just inserted")))
}
