//! Table-based family: ground motion predicted by bilinear interpolation
//! over a `(magnitude, distance)` grid rather than a closed-form
//! equation, in the style of the Atkinson/NGA-East "GMPE as a table"
//! approach. Each named model differs mainly in its minimum-distance
//! floor (used to keep the near-source singularity in `ln(distance)`
//! tables finite) and, for [`NgaEastLike`], in combining several branch
//! tables into a single epistemic-uncertainty mixture. Grid values are
//! illustrative, not published.

use crate::error::Result;
use crate::gm_table::{GroundMotionTable, TableKind};
use crate::gmm_input::{Constraints, FieldRange, GmmInput};
use crate::ground_motion::{GroundMotion, GroundMotionModel};
use crate::imt::Imt;
use std::collections::HashMap;

fn table_constraints() -> Constraints {
    Constraints {
        mw: FieldRange::closed(4.0, 8.0),
        r_jb: FieldRange::closed(0.0, 1000.0),
        r_rup: FieldRange::closed(0.0, 1000.0),
        r_x: FieldRange::closed(-1000.0, 1000.0),
        dip: FieldRange::closed(0.0, 90.0),
        width: FieldRange::closed(0.0, 60.0),
        z_top: FieldRange::closed(0.0, 20.0),
        z_hyp: FieldRange::closed(0.0, 30.0),
        rake: FieldRange::closed(-180.0, 180.0),
        vs30: FieldRange::closed(600.0, 3000.0),
        z1p0: FieldRange::closed(0.0, 5.0),
        z2p5: FieldRange::closed(0.0, 10.0),
    }
}

fn illustrative_grid() -> (Vec<f64>, Vec<f64>, Vec<Vec<f64>>) {
    let magnitudes = vec![4.0, 5.0, 6.0, 7.0, 8.0];
    let distances = vec![1.0, 10.0, 100.0, 500.0];
    // ln(ground motion in m/s^2), decreasing with distance, increasing
    // with magnitude — a monotone illustrative surface, not a fit to data.
    let values = vec![
        vec![-1.0, -2.5, -5.0, -7.5],
        vec![0.0, -1.5, -4.0, -6.5],
        vec![1.0, -0.5, -3.0, -5.5],
        vec![2.0, 0.5, -2.0, -4.5],
        vec![3.0, 1.5, -1.0, -3.5],
    ];
    (magnitudes, distances, values)
}

fn build_single_imt_table(sigma_ln: f64) -> Result<(HashMap<Imt, GroundMotionTable>, f64)> {
    let (mags, dists, values) = illustrative_grid();
    let table = GroundMotionTable::new(TableKind::Plain, mags, dists, values)?;
    let mut tables = HashMap::new();
    tables.insert(Imt::Pga, table);
    Ok((tables, sigma_ln))
}

/// Table-based model with a 1.8 km minimum-distance floor, in the style
/// of an Atkinson & Boore (2006)-derived table set.
pub struct Ab06PrimeLike {
    tables: HashMap<Imt, GroundMotionTable>,
    constraints: Constraints,
    sigma_ln: f64,
}

impl Ab06PrimeLike {
    const MIN_DISTANCE_KM: f64 = 1.8;

    pub fn new() -> Result<Self> {
        let (tables, sigma_ln) = build_single_imt_table(0.65)?;
        Ok(Self {
            tables,
            constraints: table_constraints(),
            sigma_ln,
        })
    }
}

/// Table-based model with a 0.11 km minimum-distance floor.
pub struct A08PrimeLike {
    tables: HashMap<Imt, GroundMotionTable>,
    constraints: Constraints,
    sigma_ln: f64,
}

impl A08PrimeLike {
    const MIN_DISTANCE_KM: f64 = 0.11;

    pub fn new() -> Result<Self> {
        let (tables, sigma_ln) = build_single_imt_table(0.60)?;
        Ok(Self {
            tables,
            constraints: table_constraints(),
            sigma_ln,
        })
    }
}

/// Table-based model with a 1.0 km minimum-distance floor.
pub struct P11Like {
    tables: HashMap<Imt, GroundMotionTable>,
    constraints: Constraints,
    sigma_ln: f64,
}

impl P11Like {
    const MIN_DISTANCE_KM: f64 = 1.0;

    pub fn new() -> Result<Self> {
        let (tables, sigma_ln) = build_single_imt_table(0.70)?;
        Ok(Self {
            tables,
            constraints: table_constraints(),
            sigma_ln,
        })
    }
}

macro_rules! impl_table_model {
    ($ty:ident, $name:expr) => {
        impl GroundMotionModel for $ty {
            fn name(&self) -> &'static str {
                $name
            }

            fn constraints(&self) -> &Constraints {
                &self.constraints
            }

            fn supported_imts(&self) -> Vec<Imt> {
                self.tables.keys().copied().collect()
            }

            fn calc(&self, input: &GmmInput, imt: Imt) -> Result<GroundMotion> {
                let table = self
                    .tables
                    .get(&imt)
                    .ok_or_else(|| crate::error::HazardError::UnsupportedImt { model: $name, imt })?;
                let distance = input.r_rup.max(Self::MIN_DISTANCE_KM);
                let mean_ln = table.interpolate(input.mw, distance);
                Ok(GroundMotion::Scalar {
                    mean_ln,
                    sigma_ln: self.sigma_ln,
                })
            }
        }
    };
}

impl_table_model!(Ab06PrimeLike, "AB06'-like (illustrative table)");
impl_table_model!(A08PrimeLike, "A08'-like (illustrative table)");
impl_table_model!(P11Like, "P11-like (illustrative table)");

/// NGA-East-style composite: the predicted ground motion is an epistemic
/// mixture of several branch tables (each a plausible median-model
/// alternative), combined via [`GroundMotion::Multi`] rather than
/// collapsed to a single mean up front, so downstream hazard integration
/// can treat each branch's sigma separately if it chooses to.
pub struct NgaEastLike {
    branches: Vec<(GroundMotionTable, f64)>,
    constraints: Constraints,
    sigma_ln: f64,
}

impl NgaEastLike {
    const MIN_DISTANCE_KM: f64 = 1.0;

    pub fn new() -> Result<Self> {
        let (mags, dists, mut values) = illustrative_grid();
        let branch_a = GroundMotionTable::new(TableKind::Plain, mags.clone(), dists.clone(), values.clone())?;
        for row in values.iter_mut() {
            for v in row.iter_mut() {
                *v += 0.2;
            }
        }
        let branch_b = GroundMotionTable::new(TableKind::Plain, mags.clone(), dists.clone(), values.clone())?;
        for row in values.iter_mut() {
            for v in row.iter_mut() {
                *v -= 0.4;
            }
        }
        let branch_c = GroundMotionTable::new(TableKind::Plain, mags, dists, values)?;

        Ok(Self {
            branches: vec![(branch_a, 0.3), (branch_b, 0.4), (branch_c, 0.3)],
            constraints: table_constraints(),
            sigma_ln: 0.55,
        })
    }
}

impl GroundMotionModel for NgaEastLike {
    fn name(&self) -> &'static str {
        "NGA-East-like (illustrative multi-branch)"
    }

    fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    fn supported_imts(&self) -> Vec<Imt> {
        vec![Imt::Pga]
    }

    fn calc(&self, input: &GmmInput, imt: Imt) -> Result<GroundMotion> {
        if imt != Imt::Pga {
            return Err(crate::error::HazardError::UnsupportedImt {
                model: self.name(),
                imt,
            });
        }
        let distance = input.r_rup.max(Self::MIN_DISTANCE_KM);
        let means: Vec<f64> = self
            .branches
            .iter()
            .map(|(table, _)| table.interpolate(input.mw, distance))
            .collect();
        let weights: Vec<f64> = self.branches.iter().map(|(_, w)| *w).collect();

        Ok(GroundMotion::Multi {
            means,
            weights,
            sigmas: vec![self.sigma_ln],
            sigma_weights: vec![1.0],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ab06_clamps_to_minimum_distance() {
        let model = Ab06PrimeLike::new().unwrap();
        let at_floor = GmmInput::with_defaults().r_rup(Ab06PrimeLike::MIN_DISTANCE_KM).build().unwrap();
        let below_floor = GmmInput::with_defaults().r_rup(0.01).build().unwrap();
        let gm_at_floor = model.calc(&at_floor, Imt::Pga).unwrap();
        let gm_below_floor = model.calc(&below_floor, Imt::Pga).unwrap();
        assert_eq!(gm_at_floor.weighted_mean_ln(), gm_below_floor.weighted_mean_ln());
    }

    #[test]
    fn test_distinct_distance_floors() {
        assert!(A08PrimeLike::MIN_DISTANCE_KM < Ab06PrimeLike::MIN_DISTANCE_KM);
        assert!(Ab06PrimeLike::MIN_DISTANCE_KM < P11Like::MIN_DISTANCE_KM * 2.0);
    }

    #[test]
    fn test_nga_east_branches_differ() {
        let model = NgaEastLike::new().unwrap();
        let input = GmmInput::with_defaults().build().unwrap();
        let gm = model.calc(&input, Imt::Pga).unwrap();
        match gm {
            GroundMotion::Multi { means, weights, .. } => {
                assert_eq!(means.len(), 3);
                assert!((weights.iter().sum::<f64>() - 1.0).abs() < 1e-9);
                assert_ne!(means[0], means[1]);
            }
            GroundMotion::Scalar { .. } => panic!("expected a multi-branch result"),
        }
    }

    #[test]
    fn test_nga_east_rejects_non_pga() {
        let model = NgaEastLike::new().unwrap();
        let input = GmmInput::with_defaults().build().unwrap();
        assert!(model.calc(&input, Imt::Sa(1.0)).is_err());
    }
}
