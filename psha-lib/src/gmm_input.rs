//! The GMM input record, its builder, field constraints, and the
//! style-of-faulting classification derived from rake.

use crate::error::{HazardError, Result};
use std::ops::Bound;

/// Immutable input to every [`crate::ground_motion::GroundMotionModel`].
///
/// Optional fields (`z1p0`, `z2p5`) are signaled by `NaN` rather than a
/// separate presence flag; individual models interpret `NaN` as "use the
/// model's default basin-depth relation".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GmmInput {
    pub mw: f64,
    pub r_jb: f64,
    pub r_rup: f64,
    pub r_x: f64,
    pub dip: f64,
    pub width: f64,
    pub z_top: f64,
    pub z_hyp: f64,
    pub rake: f64,
    pub vs30: f64,
    pub vs_inf: bool,
    pub z1p0: f64,
    pub z2p5: f64,
}

impl GmmInput {
    /// The documented default preset.
    pub fn with_defaults() -> GmmInputBuilder {
        let mut b = GmmInputBuilder::new();
        b.mw(6.5)
            .r_jb(10.0)
            .r_rup(10.3)
            .r_x(10.0)
            .dip(90.0)
            .width(14.0)
            .z_top(0.5)
            .z_hyp(7.5)
            .rake(0.0)
            .vs30(760.0)
            .vs_inf(true)
            .z1p0(f64::NAN)
            .z2p5(f64::NAN);
        b
    }

    pub fn fault_style(&self) -> FaultStyle {
        FaultStyle::from_rake(self.rake)
    }
}

/// Tracks, per field, whether it has already been set once this build
/// cycle. `build()` fails with [`HazardError::StateError`] if any field
/// is missing; a second `set` of the same field before `build()` also
/// fails. After `build()`, all flags reset so the builder can be reused.
#[derive(Debug, Default)]
pub struct GmmInputBuilder {
    mw: Option<f64>,
    r_jb: Option<f64>,
    r_rup: Option<f64>,
    r_x: Option<f64>,
    dip: Option<f64>,
    width: Option<f64>,
    z_top: Option<f64>,
    z_hyp: Option<f64>,
    rake: Option<f64>,
    vs30: Option<f64>,
    vs_inf: Option<bool>,
    z1p0: Option<f64>,
    z2p5: Option<f64>,
    /// Records the first field double-set seen this cycle, if any. `set`
    /// methods are infallible (`&mut Self`, chainable) by convention in
    /// this codebase, so the violation is surfaced at `build()` time
    /// instead of at the call site.
    double_set: Option<&'static str>,
}

/// Defines an infallible, chainable setter that records a double-set
/// violation (surfaced by `build()`) instead of panicking or returning
/// `Result`, matching this builder's "set now, fail at `build()`" style.
macro_rules! builder_field {
    ($name:ident, $field_ty:ty) => {
        pub fn $name(&mut self, value: $field_ty) -> &mut Self {
            if self.$name.is_some() && self.double_set.is_none() {
                self.double_set = Some(stringify!($name));
            }
            self.$name = Some(value);
            self
        }
    };
}

impl GmmInputBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    builder_field!(mw, f64);
    builder_field!(r_jb, f64);
    builder_field!(r_rup, f64);
    builder_field!(r_x, f64);
    builder_field!(dip, f64);
    builder_field!(width, f64);
    builder_field!(z_top, f64);
    builder_field!(z_hyp, f64);
    builder_field!(rake, f64);
    builder_field!(vs30, f64);
    builder_field!(vs_inf, bool);
    builder_field!(z1p0, f64);
    builder_field!(z2p5, f64);

    pub fn build(&mut self) -> Result<GmmInput> {
        let result = self.try_build();
        *self = Self::default();
        result
    }

    fn try_build(&self) -> Result<GmmInput> {
        if let Some(field) = self.double_set {
            return Err(HazardError::state(format!(
                "field `{field}` was set more than once"
            )));
        }
        Ok(GmmInput {
            mw: self.mw.ok_or_else(|| HazardError::state("mw not set"))?,
            r_jb: self.r_jb.ok_or_else(|| HazardError::state("r_jb not set"))?,
            r_rup: self
                .r_rup
                .ok_or_else(|| HazardError::state("r_rup not set"))?,
            r_x: self.r_x.ok_or_else(|| HazardError::state("r_x not set"))?,
            dip: self.dip.ok_or_else(|| HazardError::state("dip not set"))?,
            width: self
                .width
                .ok_or_else(|| HazardError::state("width not set"))?,
            z_top: self
                .z_top
                .ok_or_else(|| HazardError::state("z_top not set"))?,
            z_hyp: self
                .z_hyp
                .ok_or_else(|| HazardError::state("z_hyp not set"))?,
            rake: self.rake.ok_or_else(|| HazardError::state("rake not set"))?,
            vs30: self.vs30.ok_or_else(|| HazardError::state("vs30 not set"))?,
            vs_inf: self
                .vs_inf
                .ok_or_else(|| HazardError::state("vs_inf not set"))?,
            z1p0: self.z1p0.ok_or_else(|| HazardError::state("z1p0 not set"))?,
            z2p5: self.z2p5.ok_or_else(|| HazardError::state("z2p5 not set"))?,
        })
    }
}

/// Style of faulting derived from rake via four 90°-wide sectors.
/// `rake in [45, 135]` → `Reverse`; `rake in [-135, -45]` → `Normal`;
/// `NaN` → `Unknown`; everything else → `StrikeSlip`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultStyle {
    StrikeSlip,
    Normal,
    Reverse,
    ReverseOblique,
    Unknown,
}

impl FaultStyle {
    pub fn from_rake(rake: f64) -> FaultStyle {
        if rake.is_nan() {
            return FaultStyle::Unknown;
        }
        if (45.0..=135.0).contains(&rake) {
            FaultStyle::Reverse
        } else if (-135.0..=-45.0).contains(&rake) {
            FaultStyle::Normal
        } else {
            FaultStyle::StrikeSlip
        }
    }
}

/// A single field's allowed range: closed, half-open, or a singleton.
#[derive(Debug, Clone, Copy)]
pub struct FieldRange {
    pub lower: Bound<f64>,
    pub upper: Bound<f64>,
}

impl FieldRange {
    pub fn closed(lo: f64, hi: f64) -> Self {
        Self {
            lower: Bound::Included(lo),
            upper: Bound::Included(hi),
        }
    }

    pub fn half_open(lo: f64, hi: f64) -> Self {
        Self {
            lower: Bound::Included(lo),
            upper: Bound::Excluded(hi),
        }
    }

    pub fn singleton(v: f64) -> Self {
        Self {
            lower: Bound::Included(v),
            upper: Bound::Included(v),
        }
    }

    pub fn contains(&self, v: f64) -> bool {
        let above_lower = match self.lower {
            Bound::Included(l) => v >= l,
            Bound::Excluded(l) => v > l,
            Bound::Unbounded => true,
        };
        let below_upper = match self.upper {
            Bound::Included(u) => v <= u,
            Bound::Excluded(u) => v < u,
            Bound::Unbounded => true,
        };
        above_lower && below_upper
    }
}

/// Per-GMM record of allowed ranges for each `GmmInput` field. Used for
/// input validation and UI range reporting; intentionally not enforced
/// inside `calc`'s hot path.
#[derive(Debug, Clone)]
pub struct Constraints {
    pub mw: FieldRange,
    pub r_jb: FieldRange,
    pub r_rup: FieldRange,
    pub r_x: FieldRange,
    pub dip: FieldRange,
    pub width: FieldRange,
    pub z_top: FieldRange,
    pub z_hyp: FieldRange,
    pub rake: FieldRange,
    pub vs30: FieldRange,
    pub z1p0: FieldRange,
    pub z2p5: FieldRange,
}

/// A single out-of-constraint field, as reported by [`Constraints::check`].
#[derive(Debug, Clone)]
pub struct FieldViolation {
    pub field: &'static str,
    pub value: f64,
}

impl Constraints {
    pub fn check(&self, input: &GmmInput) -> Vec<FieldViolation> {
        let mut violations = Vec::new();
        macro_rules! check_field {
            ($field:ident) => {
                if !self.$field.contains(input.$field) {
                    violations.push(FieldViolation {
                        field: stringify!($field),
                        value: input.$field,
                    });
                }
            };
        }
        check_field!(mw);
        check_field!(r_jb);
        check_field!(r_rup);
        check_field!(r_x);
        check_field!(dip);
        check_field!(width);
        check_field!(z_top);
        check_field!(z_hyp);
        check_field!(rake);
        check_field!(vs30);
        // z1p0/z2p5 are NaN-sentinel optionals: skip range checks when unset.
        if !input.z1p0.is_nan() {
            check_field!(z1p0);
        }
        if !input.z2p5.is_nan() {
            check_field!(z2p5);
        }
        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_defaults_builds() {
        let input = GmmInput::with_defaults().build().unwrap();
        assert_eq!(input.mw, 6.5);
        assert_eq!(input.r_jb, 10.0);
        assert_eq!(input.r_rup, 10.3);
        assert_eq!(input.r_x, 10.0);
        assert_eq!(input.dip, 90.0);
        assert_eq!(input.width, 14.0);
        assert_eq!(input.z_top, 0.5);
        assert_eq!(input.z_hyp, 7.5);
        assert_eq!(input.rake, 0.0);
        assert_eq!(input.vs30, 760.0);
        assert!(input.vs_inf);
        assert!(input.z1p0.is_nan());
        assert!(input.z2p5.is_nan());
    }

    #[test]
    fn test_build_missing_field_is_state_error() {
        let mut b = GmmInputBuilder::new();
        b.mw(6.0);
        assert!(matches!(b.build(), Err(HazardError::StateError(_))));
    }

    #[test]
    fn test_builder_reusable_after_build() {
        let mut b = GmmInput::with_defaults();
        let _first = b.build().unwrap();
        // builder flags reset; must set everything again
        assert!(matches!(b.build(), Err(HazardError::StateError(_))));
        let second = GmmInput::with_defaults().build().unwrap();
        assert_eq!(second.mw, 6.5);
    }

    #[test]
    fn test_fault_style_sector_boundaries() {
        assert_eq!(FaultStyle::from_rake(45.0), FaultStyle::Reverse);
        assert_eq!(FaultStyle::from_rake(135.0), FaultStyle::Reverse);
        assert_eq!(FaultStyle::from_rake(-45.0), FaultStyle::Normal);
        assert_eq!(FaultStyle::from_rake(-135.0), FaultStyle::Normal);
        assert_eq!(FaultStyle::from_rake(0.0), FaultStyle::StrikeSlip);
        assert_eq!(FaultStyle::from_rake(180.0), FaultStyle::StrikeSlip);
        assert_eq!(FaultStyle::from_rake(f64::NAN), FaultStyle::Unknown);
    }

    #[test]
    fn test_constraints_check() {
        let constraints = Constraints {
            mw: FieldRange::closed(4.0, 8.0),
            r_jb: FieldRange::closed(0.0, 300.0),
            r_rup: FieldRange::closed(0.0, 300.0),
            r_x: FieldRange::closed(-300.0, 300.0),
            dip: FieldRange::closed(0.0, 90.0),
            width: FieldRange::closed(0.0, 60.0),
            z_top: FieldRange::closed(0.0, 20.0),
            z_hyp: FieldRange::closed(0.0, 30.0),
            rake: FieldRange::closed(-180.0, 180.0),
            vs30: FieldRange::closed(150.0, 2000.0),
            z1p0: FieldRange::closed(0.0, 5.0),
            z2p5: FieldRange::closed(0.0, 10.0),
        };
        let mut input = GmmInput::with_defaults().build().unwrap();
        input.mw = 9.5;
        let violations = constraints.check(&input);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "mw");
    }
}
