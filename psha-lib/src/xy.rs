//! Discretized-function substrate: ordered (x, y) sequences with linear,
//! log-y, and log-x/log-y interpolation.
//!
//! Two concrete representations share the [`XySequence`] contract:
//!
//! - [`EvenlySpacedSeries`] — `x` is implicit from `min`, `delta`, `n`.
//! - [`ArbitrarySeries`] — explicit, ascending `x` values compared with a
//!   `tolerance`.
//!
//! Hazard curves, coefficient interpolation, and table axes are all built
//! on top of this module.

use crate::error::{HazardError, Result};

/// Smallest positive normal `f64`, used to guard `log(0)` in the log-y and
/// log-x/log-y interpolation variants.
const MIN_POSITIVE_NORMAL: f64 = f64::MIN_POSITIVE;

/// Shared contract for both discretized-function representations.
pub trait XySequence {
    fn n(&self) -> usize;
    fn x(&self, i: usize) -> f64;
    fn y(&self, i: usize) -> f64;

    fn min_x(&self) -> f64 {
        self.x(0)
    }
    fn max_x(&self) -> f64 {
        self.x(self.n() - 1)
    }
    fn min_y(&self) -> f64 {
        (0..self.n()).map(|i| self.y(i)).fold(f64::INFINITY, f64::min)
    }
    fn max_y(&self) -> f64 {
        (0..self.n())
            .map(|i| self.y(i))
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Replace the y-value at index `i`.
    fn set(&mut self, i: usize, y: f64) -> Result<()>;

    /// Insert or overwrite the point at `x` with value `y`.
    fn set_xy(&mut self, x: f64, y: f64);

    /// `true` if this sequence already has a point at `(x, y)` (within
    /// whatever x-tolerance the concrete type uses, exact on y).
    fn has_point(&self, x: f64, y: f64) -> bool;

    /// Bracketing index `i` such that `x(i) <= x < x(i+1)`, clamped to
    /// `[0, n-2]` so bilinear/linear interpolation is always well-defined.
    fn bracket_index(&self, x: f64) -> usize;

    /// Exact lookup: return the stored y at the grid point nearest `x`,
    /// or `OutOfRange` if `x` is further than this sequence's tolerance
    /// from that nearest grid point.
    fn get(&self, x: f64) -> Result<f64>;
}

/// An evenly spaced XY-sequence: `x[i] = min + i * delta`.
#[derive(Debug, Clone, PartialEq)]
pub struct EvenlySpacedSeries {
    min: f64,
    delta: f64,
    y: Vec<f64>,
    tolerance: f64,
}

impl EvenlySpacedSeries {
    /// Build a new evenly spaced series. `n == 1` requires `delta == 0`.
    pub fn new(min: f64, delta: f64, n: usize, tolerance: f64) -> Result<Self> {
        if delta < 0.0 {
            return Err(HazardError::state("EvenlySpacedSeries: delta must be >= 0"));
        }
        if n == 1 && delta != 0.0 {
            return Err(HazardError::state(
                "EvenlySpacedSeries: n == 1 requires delta == 0",
            ));
        }
        if n == 0 {
            return Err(HazardError::state("EvenlySpacedSeries: n must be >= 1"));
        }
        Ok(Self {
            min,
            delta,
            y: vec![0.0; n],
            tolerance,
        })
    }

    pub fn with_values(min: f64, delta: f64, y: Vec<f64>, tolerance: f64) -> Result<Self> {
        let mut s = Self::new(min, delta, y.len(), tolerance)?;
        s.y = y;
        Ok(s)
    }

    /// Precision-scaled rounded index for a query `x`, clamped to
    /// `[0, n-1]`. The `1 + 1e-14` scale factor biases an x exactly on a
    /// bin boundary to round up rather than toward-even.
    fn rounded_index(&self, x: f64) -> usize {
        let raw = ((1.0 + 1e-14) * (x - self.min) / self.delta).round();
        if raw.is_nan() {
            return 0;
        }
        raw.clamp(0.0, (self.n() - 1) as f64) as usize
    }
}

impl XySequence for EvenlySpacedSeries {
    fn n(&self) -> usize {
        self.y.len()
    }

    fn x(&self, i: usize) -> f64 {
        self.min + i as f64 * self.delta
    }

    fn y(&self, i: usize) -> f64 {
        self.y[i]
    }

    fn set(&mut self, i: usize, y: f64) -> Result<()> {
        if i >= self.n() {
            return Err(HazardError::IndexOutOfBounds {
                index: i,
                len: self.n(),
            });
        }
        self.y[i] = y;
        Ok(())
    }

    fn set_xy(&mut self, x: f64, y: f64) {
        let i = if self.delta == 0.0 {
            0
        } else {
            self.rounded_index(x)
        };
        self.y[i] = y;
    }

    fn has_point(&self, x: f64, y: f64) -> bool {
        let i = if self.delta == 0.0 {
            0
        } else {
            self.rounded_index(x)
        };
        (self.x(i) - x).abs() <= self.tolerance && self.y[i] == y
    }

    fn bracket_index(&self, x: f64) -> usize {
        if self.delta == 0.0 {
            return 0;
        }
        let raw = ((x - self.min) / self.delta).floor();
        let max_index = if self.n() >= 2 { self.n() - 2 } else { 0 };
        raw.clamp(0.0, max_index as f64) as usize
    }

    fn get(&self, x: f64) -> Result<f64> {
        let i = if self.delta == 0.0 {
            0
        } else {
            self.rounded_index(x)
        };
        if (self.x(i) - x).abs() <= self.tolerance {
            Ok(self.y[i])
        } else {
            Err(HazardError::out_of_range(format!(
                "x = {x} is not within tolerance {} of grid point {}",
                self.tolerance,
                self.x(i)
            )))
        }
    }
}

/// An XY-sequence with arbitrary, sorted-ascending x values.
#[derive(Debug, Clone, PartialEq)]
pub struct ArbitrarySeries {
    points: Vec<(f64, f64)>,
    tolerance: f64,
}

impl ArbitrarySeries {
    pub fn new(tolerance: f64) -> Self {
        Self {
            points: Vec::new(),
            tolerance: tolerance.max(1e-16),
        }
    }

    pub fn from_points(mut points: Vec<(f64, f64)>, tolerance: f64) -> Self {
        points.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
        Self {
            points,
            tolerance: tolerance.max(1e-16),
        }
    }

    /// Position `i` such that `points[i-1].0 < x` and `x <= points[i].0`
    /// (a standard ascending-insertion point, ignoring tolerance).
    fn insertion_point(&self, x: f64) -> usize {
        self.points.partition_point(|(px, _)| *px < x)
    }

    /// Index of the point within `tolerance` of `x`, if any.
    fn index_within_tolerance(&self, x: f64) -> Option<usize> {
        let ip = self.insertion_point(x);
        if ip < self.points.len() && (self.points[ip].0 - x).abs() <= self.tolerance {
            return Some(ip);
        }
        if ip > 0 && (self.points[ip - 1].0 - x).abs() <= self.tolerance {
            return Some(ip - 1);
        }
        None
    }

    /// Index of the last point with `x(i) <= query`, or `-1` if the query
    /// is exactly equal to the first point's x — a query equal to the
    /// first point is treated as having no point strictly before it.
    pub fn x_index_before(&self, query: f64) -> i64 {
        if self.points.is_empty() {
            return -1;
        }
        if (self.points[0].0 - query).abs() <= self.tolerance {
            return -1;
        }
        let ip = self.insertion_point(query);
        if ip == 0 {
            -1
        } else {
            (ip - 1) as i64
        }
    }

    /// Scan forward for the first bracketing pair whose y-values straddle
    /// `target`, and linearly interpolate for the corresponding x.
    /// Intentionally order-sensitive: duplicate y-values yield the
    /// lowest-x match.
    pub fn first_x_from_y(&self, target: f64) -> Result<f64> {
        for w in self.points.windows(2) {
            let (x0, y0) = w[0];
            let (x1, y1) = w[1];
            let straddles = (y0 <= target && target <= y1) || (y1 <= target && target <= y0);
            if straddles {
                if y1 == y0 {
                    return Ok(x0);
                }
                return Ok(x0 + (x1 - x0) * (target - y0) / (y1 - y0));
            }
        }
        Err(HazardError::out_of_range(format!(
            "no bracketing pair found for y = {target}"
        )))
    }
}

impl XySequence for ArbitrarySeries {
    fn n(&self) -> usize {
        self.points.len()
    }

    fn x(&self, i: usize) -> f64 {
        self.points[i].0
    }

    fn y(&self, i: usize) -> f64 {
        self.points[i].1
    }

    fn set(&mut self, i: usize, y: f64) -> Result<()> {
        if i >= self.n() {
            return Err(HazardError::IndexOutOfBounds {
                index: i,
                len: self.n(),
            });
        }
        self.points[i].1 = y;
        Ok(())
    }

    fn set_xy(&mut self, x: f64, y: f64) {
        if let Some(i) = self.index_within_tolerance(x) {
            self.points[i] = (x, y);
            return;
        }
        let ip = self.insertion_point(x);
        self.points.insert(ip, (x, y));
    }

    fn has_point(&self, x: f64, y: f64) -> bool {
        self.index_within_tolerance(x)
            .is_some_and(|i| self.points[i].1 == y)
    }

    fn bracket_index(&self, x: f64) -> usize {
        let max_index = if self.n() >= 2 { self.n() - 2 } else { 0 };
        if self.n() < 2 {
            return 0;
        }
        if let Some(i) = self.index_within_tolerance(x) {
            return i.min(max_index);
        }
        let ip = self.insertion_point(x);
        ip.saturating_sub(1).min(max_index)
    }

    fn get(&self, x: f64) -> Result<f64> {
        match self.index_within_tolerance(x) {
            Some(i) => Ok(self.points[i].1),
            None => Err(HazardError::out_of_range(format!(
                "x = {x} is not within tolerance {} of any point",
                self.tolerance
            ))),
        }
    }
}

/// Linear-linear interpolation: `y = y0 + (y1-y0)*(x-x0)/(x1-x0)`.
pub fn linear_interp<S: XySequence>(seq: &S, x: f64) -> Result<f64> {
    if x < seq.min_x() || x > seq.max_x() {
        return Err(HazardError::out_of_range(format!(
            "x = {x} outside [{}, {}]",
            seq.min_x(),
            seq.max_x()
        )));
    }
    let i = seq.bracket_index(x);
    Ok(interp_linear_points(
        seq.x(i),
        seq.y(i),
        seq.x(i + 1),
        seq.y(i + 1),
        x,
    ))
}

fn interp_linear_points(x0: f64, y0: f64, x1: f64, y1: f64, x: f64) -> f64 {
    if x1 == x0 {
        return y0;
    }
    y0 + (y1 - y0) * (x - x0) / (x1 - x0)
}

/// Substitute the smallest positive normal double for a zero value before
/// taking a log, per the log-space zero-guarding convention.
fn guarded_ln(y: f64) -> f64 {
    if y == 0.0 {
        MIN_POSITIVE_NORMAL.ln()
    } else {
        y.ln()
    }
}

/// Log-y interpolation: interpolate `ln(y)` linearly in `x`, then
/// exponentiate. Both-zero brackets return zero; a single zero bracket is
/// guarded with [`guarded_ln`] and the result clamped back to zero if it
/// comes out equal to the substitute.
pub fn log_y_interp<S: XySequence>(seq: &S, x: f64) -> Result<f64> {
    if x < seq.min_x() || x > seq.max_x() {
        return Err(HazardError::out_of_range(format!(
            "x = {x} outside [{}, {}]",
            seq.min_x(),
            seq.max_x()
        )));
    }
    let i = seq.bracket_index(x);
    let (x0, y0) = (seq.x(i), seq.y(i));
    let (x1, y1) = (seq.x(i + 1), seq.y(i + 1));
    Ok(interp_log_y_points(x0, y0, x1, y1, x))
}

fn interp_log_y_points(x0: f64, y0: f64, x1: f64, y1: f64, x: f64) -> f64 {
    if y0 == 0.0 && y1 == 0.0 {
        return 0.0;
    }
    let ln0 = guarded_ln(y0);
    let ln1 = guarded_ln(y1);
    let interpolated_ln = interp_linear_points(x0, ln0, x1, ln1, x);
    let result = interpolated_ln.exp();
    if (y0 == 0.0 || y1 == 0.0) && result == MIN_POSITIVE_NORMAL {
        0.0
    } else {
        result
    }
}

/// Log-x/log-y interpolation: replace both x and y with their logs before
/// interpolating linearly, with the same zero-guarding as [`log_y_interp`].
pub fn log_x_log_y_interp<S: XySequence>(seq: &S, x: f64) -> Result<f64> {
    if x <= 0.0 {
        return Err(HazardError::out_of_range("x must be > 0 for log-x interpolation"));
    }
    if x < seq.min_x() || x > seq.max_x() {
        return Err(HazardError::out_of_range(format!(
            "x = {x} outside [{}, {}]",
            seq.min_x(),
            seq.max_x()
        )));
    }
    let i = seq.bracket_index(x);
    let (x0, y0) = (seq.x(i), seq.y(i));
    let (x1, y1) = (seq.x(i + 1), seq.y(i + 1));
    Ok(interp_log_y_points(x0.ln(), y0, x1.ln(), y1, x.ln()))
}

/// Linearly extend in log-y beyond the end points; within range this is
/// identical to [`log_y_interp`]. This is the only variant that
/// extrapolates instead of signalling `OutOfRange`.
pub fn interp_or_extrap<S: XySequence>(seq: &S, x: f64) -> f64 {
    let n = seq.n();
    if x < seq.min_x() {
        return extrapolate_log_y(seq.x(0), seq.y(0), seq.x(1), seq.y(1), x);
    }
    if x > seq.max_x() {
        return extrapolate_log_y(seq.x(n - 2), seq.y(n - 2), seq.x(n - 1), seq.y(n - 1), x);
    }
    log_y_interp(seq, x).expect("x within range checked above")
}

fn extrapolate_log_y(x0: f64, y0: f64, x1: f64, y1: f64, x: f64) -> f64 {
    let ln0 = guarded_ln(y0);
    let ln1 = guarded_ln(y1);
    let slope = (ln1 - ln0) / (x1 - x0);
    (ln0 + slope * (x - x0)).exp()
}
