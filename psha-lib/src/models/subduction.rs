//! Subduction zone family: interface and intraslab flavors of a
//! Zhao-style model, plus a BC Hydro-style depth-scaled alternative.
//! Coefficients are illustrative, not published.

use crate::coefficients::CoefficientTable;
use crate::error::Result;
use crate::gmm_input::{Constraints, FieldRange, GmmInput};
use crate::ground_motion::{GroundMotion, GroundMotionModel};
use crate::imt::Imt;

/// Which subduction rupture type a [`Zhao06Like`] instance was configured
/// for. Interface and slab ruptures get distinct depth and distance terms
/// in the underlying model family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    Interface,
    Slab,
}

const ZHAO_COEFFICIENTS_CSV: &str = "\
Imt, a, b, c, d, e, sslab, sigma
PGA, 1.10, 0.430, -2.300, 0.0060, 0.500, 0.250, 0.680
SA0P2, 1.35, 0.400, -2.250, 0.0055, 0.480, 0.300, 0.700
SA1P0, 0.70, 0.460, -2.150, 0.0065, 0.520, 0.200, 0.720
";

pub struct Zhao06Like {
    table: CoefficientTable,
    constraints: Constraints,
    flavor: Flavor,
}

fn subduction_constraints() -> Constraints {
    Constraints {
        mw: FieldRange::closed(4.5, 9.5),
        r_jb: FieldRange::closed(0.0, 400.0),
        r_rup: FieldRange::closed(0.0, 400.0),
        r_x: FieldRange::closed(-400.0, 400.0),
        dip: FieldRange::closed(0.0, 90.0),
        width: FieldRange::closed(0.0, 200.0),
        z_top: FieldRange::closed(0.0, 50.0),
        z_hyp: FieldRange::closed(0.0, 300.0),
        rake: FieldRange::closed(-180.0, 180.0),
        vs30: FieldRange::closed(150.0, 1500.0),
        z1p0: FieldRange::closed(0.0, 5.0),
        z2p5: FieldRange::closed(0.0, 10.0),
    }
}

impl Zhao06Like {
    pub fn new(flavor: Flavor) -> Result<Self> {
        let table = CoefficientTable::from_csv_str("subduction/zhao06like.csv", ZHAO_COEFFICIENTS_CSV)?;
        Ok(Self {
            table,
            constraints: subduction_constraints(),
            flavor,
        })
    }

    pub fn flavor(&self) -> Flavor {
        self.flavor
    }
}

impl GroundMotionModel for Zhao06Like {
    fn name(&self) -> &'static str {
        match self.flavor {
            Flavor::Interface => "Zhao06-like interface (illustrative)",
            Flavor::Slab => "Zhao06-like slab (illustrative)",
        }
    }

    fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    fn supported_imts(&self) -> Vec<Imt> {
        self.table.imts()
    }

    fn calc(&self, input: &GmmInput, imt: Imt) -> Result<GroundMotion> {
        let coef = |name: &str| self.table.get(imt, name);

        let a = coef("a")?;
        let b = coef("b")?;
        let c = coef("c")?;
        let d = coef("d")?;
        let e = coef("e")?;
        let sslab = coef("sslab")?;
        let sigma = coef("sigma")?;

        // Slab events saturate at Mw 7.8; interface events are unbounded.
        let mw = match self.flavor {
            Flavor::Interface => input.mw,
            Flavor::Slab => input.mw.min(7.8),
        };
        // rRup is floored at 1 km regardless of flavor.
        let r_rup = input.r_rup.max(1.0);

        let mag_term = b * mw;
        let dist_term = c * (r_rup + d * (e * mw).exp()).ln();
        // Depth scaling: interface ruptures always use a fixed 20 km
        // reference depth, ignoring zTop entirely; slab ruptures use
        // zTop clamped to a 125 km saturation depth.
        let depth_km = match self.flavor {
            Flavor::Interface => 20.0,
            Flavor::Slab => input.z_top.min(125.0),
        };
        let depth_term = 0.004 * depth_km;
        let slab_term = match self.flavor {
            Flavor::Interface => 0.0,
            Flavor::Slab => sslab,
        };

        let mean_ln = a + mag_term + dist_term + depth_term + slab_term;

        Ok(GroundMotion::Scalar {
            mean_ln,
            sigma_ln: sigma,
        })
    }
}

const BC_HYDRO_COEFFICIENTS_CSV: &str = "\
Imt, theta1, theta2, theta4, theta6, vlin, b, sigma
PGA, 4.20, 1.100, 0.00600, -0.00800, 865.1, -1.186, 0.740
SA0P2, 4.55, 1.050, 0.00550, -0.00750, 1108.9, -1.186, 0.760
SA1P0, 3.40, 1.200, 0.00650, -0.00900, 400.0, -1.955, 0.780
";

/// BC Hydro (2012)-style subduction model: magnitude scaling saturates
/// smoothly rather than via a hinge, depth scaling is linear rather than
/// capped, and the site term is a period-dependent nonlinear `Vlin`
/// response rather than the crustal family's simple log-linear scaling.
/// Coefficients are illustrative, not published.
pub struct BcHydro12Like {
    table: CoefficientTable,
    constraints: Constraints,
    flavor: Flavor,
}

impl BcHydro12Like {
    pub fn new(flavor: Flavor) -> Result<Self> {
        let table = CoefficientTable::from_csv_str("subduction/bchydro12like.csv", BC_HYDRO_COEFFICIENTS_CSV)?;
        Ok(Self {
            table,
            constraints: subduction_constraints(),
            flavor,
        })
    }

    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    /// ΔC1: a flavor-dependent shift applied on top of the base
    /// magnitude/distance term, reflecting the distinct interface vs.
    /// slab source characteristics.
    fn delta_c1(&self) -> f64 {
        match self.flavor {
            Flavor::Interface => -0.1,
            Flavor::Slab => -0.3,
        }
    }
}

impl GroundMotionModel for BcHydro12Like {
    fn name(&self) -> &'static str {
        match self.flavor {
            Flavor::Interface => "BCHydro12-like interface (illustrative)",
            Flavor::Slab => "BCHydro12-like slab (illustrative)",
        }
    }

    fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    fn supported_imts(&self) -> Vec<Imt> {
        self.table.imts()
    }

    fn calc(&self, input: &GmmInput, imt: Imt) -> Result<GroundMotion> {
        let coef = |name: &str| self.table.get(imt, name);

        let theta1 = coef("theta1")?;
        let theta2 = coef("theta2")?;
        let theta4 = coef("theta4")?;
        let theta6 = coef("theta6")?;
        let vlin = coef("vlin")?;
        let b = coef("b")?;
        let sigma = coef("sigma")?;

        let mw = match self.flavor {
            Flavor::Interface => input.mw,
            Flavor::Slab => input.mw.min(7.8),
        };
        let r_rup = input.r_rup.max(1.0);

        let mag_term = theta2 * mw;
        let dist_term = theta4 * (r_rup + 10.0_f64.powf(0.1 * mw)).ln();
        let depth_term = theta6 * input.z_hyp;

        let pga_rock = (theta1 + self.delta_c1() + mag_term + dist_term + depth_term).exp();

        // Nonlinear Vs30 site term: above Vlin, amplification scales
        // log-linearly with Vs30 (capped at 1000 m/s); below Vlin it
        // additionally saturates with rock-site PGA, following the
        // family's nonlinear site-response shape.
        let vs30_capped = input.vs30.min(1000.0);
        let site_term = if input.vs30 < vlin {
            b * (vs30_capped / vlin).ln() - b * ((pga_rock + 0.1) / 0.1).ln()
        } else {
            b * (vs30_capped / vlin).ln()
        };

        Ok(GroundMotion::Scalar {
            mean_ln: theta1 + self.delta_c1() + mag_term + dist_term + depth_term + site_term,
            sigma_ln: sigma,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slab_exceeds_interface_at_same_input() {
        let interface = Zhao06Like::new(Flavor::Interface).unwrap();
        let slab = Zhao06Like::new(Flavor::Slab).unwrap();
        let input = GmmInput::with_defaults().build().unwrap();
        let gm_interface = interface.calc(&input, Imt::Pga).unwrap();
        let gm_slab = slab.calc(&input, Imt::Pga).unwrap();
        assert!(gm_slab.weighted_mean_ln() > gm_interface.weighted_mean_ln());
    }

    #[test]
    fn test_bc_hydro_deeper_hypocenter_changes_mean() {
        let model = BcHydro12Like::new(Flavor::Interface).unwrap();
        let shallow = GmmInput::with_defaults().z_hyp(10.0).build().unwrap();
        let deep = GmmInput::with_defaults().z_hyp(100.0).build().unwrap();
        let gm_shallow = model.calc(&shallow, Imt::Pga).unwrap();
        let gm_deep = model.calc(&deep, Imt::Pga).unwrap();
        assert!(gm_deep.weighted_mean_ln() > gm_shallow.weighted_mean_ln());
    }

    #[test]
    fn test_bc_hydro_slab_differs_from_interface_via_delta_c1() {
        let interface = BcHydro12Like::new(Flavor::Interface).unwrap();
        let slab = BcHydro12Like::new(Flavor::Slab).unwrap();
        let input = GmmInput::with_defaults().build().unwrap();
        let gm_interface = interface.calc(&input, Imt::Pga).unwrap();
        let gm_slab = slab.calc(&input, Imt::Pga).unwrap();
        assert!(gm_slab.weighted_mean_ln() < gm_interface.weighted_mean_ln());
    }

    #[test]
    fn test_zhao06_interface_ignores_z_top() {
        let model = Zhao06Like::new(Flavor::Interface).unwrap();
        let shallow = GmmInput::with_defaults().z_top(1.0).mw(9.0).r_rup(60.0).build().unwrap();
        let deep = GmmInput::with_defaults().z_top(40.0).mw(9.0).r_rup(60.0).build().unwrap();
        let gm_shallow = model.calc(&shallow, Imt::Pga).unwrap();
        let gm_deep = model.calc(&deep, Imt::Pga).unwrap();
        assert_eq!(gm_shallow.weighted_mean_ln(), gm_deep.weighted_mean_ln());
    }

    #[test]
    fn test_zhao06_slab_clamps_z_top_to_125() {
        let model = Zhao06Like::new(Flavor::Slab).unwrap();
        let at_cap = GmmInput::with_defaults().z_top(125.0).mw(9.0).r_rup(60.0).build().unwrap();
        let beyond_cap = GmmInput::with_defaults().z_top(150.0).mw(9.0).r_rup(60.0).build().unwrap();
        let gm_at_cap = model.calc(&at_cap, Imt::Pga).unwrap();
        let gm_beyond_cap = model.calc(&beyond_cap, Imt::Pga).unwrap();
        assert_eq!(gm_at_cap.weighted_mean_ln(), gm_beyond_cap.weighted_mean_ln());
    }

    #[test]
    fn test_zhao06_slab_saturates_magnitude_at_7p8() {
        let model = Zhao06Like::new(Flavor::Slab).unwrap();
        let at_cap = GmmInput::with_defaults().mw(7.8).r_rup(60.0).build().unwrap();
        let beyond_cap = GmmInput::with_defaults().mw(9.0).r_rup(60.0).build().unwrap();
        let gm_at_cap = model.calc(&at_cap, Imt::Pga).unwrap();
        let gm_beyond_cap = model.calc(&beyond_cap, Imt::Pga).unwrap();
        assert_eq!(gm_at_cap.weighted_mean_ln(), gm_beyond_cap.weighted_mean_ln());
    }
}
