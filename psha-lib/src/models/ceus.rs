//! Stable-continent (central/eastern US) family: a Frankel-style model
//! with a hard/soft rock site term and an optional magnitude-convention
//! conversion. The formula shape — log10 ground motion as magnitude,
//! distance, and site terms summed before a final unit conversion —
//! follows this crate's other regionally-calibrated models. Coefficients
//! are illustrative, not published.

use crate::auxilary::LN10;
use crate::coefficients::CoefficientTable;
use crate::error::Result;
use crate::gmm_input::{Constraints, FieldRange, GmmInput};
use crate::ground_motion::{GroundMotion, GroundMotionModel};
use crate::imt::Imt;

/// Reference rock condition the model's site term is calibrated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteClass {
    SoftRock,
    HardRock,
}

impl SiteClass {
    /// Reference Vs30 (m/s) this site class represents.
    pub fn reference_vs30(self) -> f64 {
        match self {
            SiteClass::SoftRock => 760.0,
            SiteClass::HardRock => 2000.0,
        }
    }
}

/// How an input magnitude (assumed mb, a legacy-catalog body-wave
/// magnitude) is converted to Mw before the model's own native magnitude
/// scale is applied, mirroring the two mb<->Mw conversions published CEUS
/// models use to rebase legacy catalogs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MagnitudeConversion {
    None,
    /// Johnston (1996): `Mw = 1.14 + 0.24*mb + 0.0933*mb^2`.
    Johnston,
    /// Atkinson & Boore (1995): `Mw = 2.715 - 0.277*mb + 0.127*mb^2`.
    AtkinsonBoore,
}

impl MagnitudeConversion {
    fn apply(self, mw: f64) -> f64 {
        match self {
            MagnitudeConversion::None => mw,
            MagnitudeConversion::Johnston => 1.14 + 0.24 * mw + 0.0933 * mw * mw,
            MagnitudeConversion::AtkinsonBoore => 2.715 - 0.277 * mw + 0.127 * mw * mw,
        }
    }
}

const COEFFICIENTS_CSV: &str = "\
Imt, c1, c2, c3, c4, c5, site_slope
PGA, 1.050, 0.820, -1.250, -0.00230, 0.350, -0.120
SA0P2, 1.400, 0.780, -1.200, -0.00200, 0.380, -0.150
SA1P0, 0.350, 0.880, -1.100, -0.00300, 0.300, -0.080
";

pub struct Frankel96Like {
    table: CoefficientTable,
    constraints: Constraints,
    site_class: SiteClass,
    magnitude_conversion: MagnitudeConversion,
}

impl Frankel96Like {
    pub fn new(site_class: SiteClass, magnitude_conversion: MagnitudeConversion) -> Result<Self> {
        let table = CoefficientTable::from_csv_str("ceus/frankel96like.csv", COEFFICIENTS_CSV)?;
        Ok(Self {
            table,
            constraints: Constraints {
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
            },
            site_class,
            magnitude_conversion,
        })
    }
}

impl GroundMotionModel for Frankel96Like {
    fn name(&self) -> &'static str {
        "Frankel96-like (illustrative stable continent)"
    }

    fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    fn supported_imts(&self) -> Vec<Imt> {
        self.table.imts()
    }

    fn calc(&self, input: &GmmInput, imt: Imt) -> Result<GroundMotion> {
        let coef = |name: &str| self.table.get(imt, name);

        let c1 = coef("c1")?;
        let c2 = coef("c2")?;
        let c3 = coef("c3")?;
        let c4 = coef("c4")?;
        let c5 = coef("c5")?;
        let site_slope = coef("site_slope")?;

        let mag = self.magnitude_conversion.apply(input.mw);

        // log10(ground motion) as a sum of magnitude, geometric, and
        // anelastic distance terms.
        let log10_motion =
            c1 + c2 * mag + c3 * (input.r_rup + c4 * 10.0_f64.powf(c5 * mag)).log10();

        // Site term: a fixed offset relative to the reference rock Vs30
        // for this class, same linear-in-log-Vs30 shape as the crustal
        // family's site scaling.
        let site_term = site_slope * (input.vs30 / self.site_class.reference_vs30()).ln();

        let mean_ln = log10_motion * LN10 + site_term;

        // NSHMP-style maximum-intensity clamp: PGA never exceeds 1.5 g,
        // and short-to-moderate period SA (0.02 s < T < 0.5 s, exclusive
        // of the boundary) never exceeds 3.0 g. Longer periods and PGV
        // are left unclamped.
        let clamped_mean_ln = match imt {
            Imt::Pga => mean_ln.min(1.5_f64.ln()),
            Imt::Sa(period) if period > 0.02 && period < 0.5 => mean_ln.min(3.0_f64.ln()),
            _ => mean_ln,
        };

        Ok(GroundMotion::Scalar {
            mean_ln: clamped_mean_ln,
            sigma_ln: 0.75,
        })
    }
}
