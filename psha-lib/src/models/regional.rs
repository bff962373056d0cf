//! A generic "other regional" model, carrying over the Morikawa &
//! Fujiwara (2013)-style formula structure from this codebase's previous
//! incarnation almost unchanged: magnitude saturation at an upper limit,
//! a single geometric/anelastic distance term, a deep-sedimentary-layer
//! correction, and linear Vs30 amplification. Coefficients are
//! illustrative, not published.

use crate::auxilary::{DL, G_GLOBAL, LN10};
use crate::coefficients::CoefficientTable;
use crate::error::Result;
use crate::gmm_input::{Constraints, FieldRange, GmmInput};
use crate::ground_motion::{GroundMotion, GroundMotionModel};
use crate::imt::Imt;

const COEFFICIENTS_CSV: &str = "\
Imt, mw0, a, b, c, d, e, sigma, pd, dl_min, d0, ps, vs_max, v0
PGA, 8.2, 0.59000, -0.00320, 0.00100, 0.00130, 0.40000, 0.60000, 0.10000, 30.0, 100.0, -0.60000, 1100.0, 350.0
SA0P2, 8.2, 0.62000, -0.00300, 0.20000, 0.00130, 0.40000, 0.62000, 0.12000, 30.0, 100.0, -0.65000, 1100.0, 350.0
SA1P0, 8.2, 0.55000, -0.00250, -0.40000, 0.00130, 0.40000, 0.68000, 0.15000, 30.0, 100.0, -0.55000, 1100.0, 350.0
PGV, 8.2, 0.66000, -0.00280, 0.90000, 0.00130, 0.40000, 0.58000, 0.10000, 30.0, 100.0, -0.50000, 1100.0, 350.0
";

/// A single hypocentral-distance-based regional model, generalizing the
/// point-source distance calculation this codebase previously performed
/// from lon/lat/depth (`rRup = sqrt(epicentral^2 + depth^2)`) to operate
/// directly on a [`GmmInput`]'s `r_rup`.
pub struct GenericRegionalLike {
    table: CoefficientTable,
    constraints: Constraints,
}

impl GenericRegionalLike {
    pub fn new() -> Result<Self> {
        let table = CoefficientTable::from_csv_str("regional/genericlike.csv", COEFFICIENTS_CSV)?;
        Ok(Self {
            table,
            constraints: Constraints {
                mw: FieldRange::closed(3.5, 8.2),
                r_jb: FieldRange::closed(0.0, 300.0),
                r_rup: FieldRange::closed(0.0, 300.0),
                r_x: FieldRange::closed(-300.0, 300.0),
                dip: FieldRange::closed(0.0, 90.0),
                width: FieldRange::closed(0.0, 60.0),
                z_top: FieldRange::closed(0.0, 20.0),
                z_hyp: FieldRange::closed(0.0, 200.0),
                rake: FieldRange::closed(-180.0, 180.0),
                vs30: FieldRange::closed(100.0, 1100.0),
                z1p0: FieldRange::closed(0.0, 5.0),
                z2p5: FieldRange::closed(0.0, 10.0),
            },
        })
    }
}

impl GroundMotionModel for GenericRegionalLike {
    fn name(&self) -> &'static str {
        "generic regional (illustrative)"
    }

    fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    fn supported_imts(&self) -> Vec<Imt> {
        self.table.imts()
    }

    fn calc(&self, input: &GmmInput, imt: Imt) -> Result<GroundMotion> {
        let coef = |name: &str| self.table.get(imt, name);

        let mw0 = coef("mw0")?;
        let a = coef("a")?;
        let b = coef("b")?;
        let c = coef("c")?;
        let d = coef("d")?;
        let e = coef("e")?;
        let sigma = coef("sigma")?;
        let pd = coef("pd")?;
        let dl_min = coef("dl_min")?;
        let d0 = coef("d0")?;
        let ps = coef("ps")?;
        let vs_max = coef("vs_max")?;
        let v0 = coef("v0")?;

        let magnitude = input.mw.min(mw0);
        let a_mw = a * magnitude;

        // Deep sedimentary layer correction: `z1p0` (km) stands in for
        // the original `dl` (m to the 1400 m/s horizon); a NaN input
        // falls back to the global default depth.
        let dl = if input.z1p0.is_nan() {
            DL as f64
        } else {
            input.z1p0 * 1000.0
        };
        let g_d = pd * (dl.max(dl_min) / d0).log10();

        let log_a =
            (a_mw + b * input.r_rup + c) - (input.r_rup + d * 10.0_f64.powf(e * magnitude)).log10();
        let log_agd = log_a + g_d;

        let gs = ps * (input.vs30.min(vs_max) / v0).log10();
        let log_ags = log_agd + gs;

        let mean_ln = if imt == Imt::Pgv {
            log_ags * LN10
        } else {
            // Acceleration IMTs: convert cm/s^2 to natural-log g.
            log_ags * LN10 - G_GLOBAL.ln() - (100.0_f64).ln()
        };

        Ok(GroundMotion::Scalar {
            mean_ln,
            sigma_ln: sigma,
        })
    }
}
