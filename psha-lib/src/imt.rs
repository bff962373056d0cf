//! Intensity measure type (IMT) registry.
//!
//! An `Imt` is the closed set of ground-motion quantities the rest of the
//! crate predicts and tabulates: peak ground acceleration, peak ground
//! velocity, and spectral acceleration at a fixed period. Two IMTs compare
//! equal iff their labels match exactly; spectral period equality uses an
//! absolute tolerance of `1e-6` seconds.

use std::fmt;

/// Absolute tolerance (seconds) used when comparing two SA periods.
const PERIOD_TOLERANCE: f64 = 1e-6;

/// Frequency assigned to PGA for the purposes of [`Imt::frequency`].
const PGA_FREQUENCY_HZ: f64 = 100.0;

/// An intensity measure type.
#[derive(Debug, Clone, Copy)]
pub enum Imt {
    Pga,
    Pgv,
    /// Spectral acceleration at the given period, in seconds.
    Sa(f64),
}

impl Imt {
    /// `true` if this IMT is a spectral acceleration.
    pub fn is_sa(self) -> bool {
        matches!(self, Imt::Sa(_))
    }

    /// The SA period in seconds, or `None` for PGA/PGV.
    pub fn period(self) -> Option<f64> {
        match self {
            Imt::Sa(t) => Some(t),
            _ => None,
        }
    }

    /// Frequency in Hz: `1/period` for SA, `100` for PGA (by convention;
    /// PGA has no associated period), and `0` for PGV (PGV has no
    /// frequency-domain meaning here).
    pub fn frequency(self) -> f64 {
        match self {
            Imt::Pga => PGA_FREQUENCY_HZ,
            Imt::Pgv => 0.0,
            Imt::Sa(t) => 1.0 / t,
        }
    }

    /// Build an IMT from a spectral period. `period <= 0` yields PGA,
    /// matching the common convention that PGA is the zero-period limit
    /// of the SA response spectrum.
    pub fn from_period(period: f64) -> Imt {
        if period <= 0.0 {
            Imt::Pga
        } else {
            Imt::Sa(period)
        }
    }

    /// Canonical label, e.g. `"PGA"`, `"PGV"`, `"SA0P2"`, `"SA1P0"`.
    ///
    /// Periods are rendered with the `.` replaced by `P` and trailing
    /// zeros trimmed (but at least one digit after the point), matching
    /// the header convention consumed by [`crate::gm_table`]'s Atkinson
    /// frequency-header parser.
    pub fn label(self) -> String {
        match self {
            Imt::Pga => "PGA".to_string(),
            Imt::Pgv => "PGV".to_string(),
            Imt::Sa(t) => format!("SA{}", format_period(t)),
        }
    }

    /// Parse a label produced by [`Imt::label`] (or a bare coefficient-CSV
    /// "Imt" column value).
    pub fn parse(label: &str) -> Option<Imt> {
        let label = label.trim();
        match label.to_ascii_uppercase().as_str() {
            "PGA" => return Some(Imt::Pga),
            "PGV" => return Some(Imt::Pgv),
            _ => {}
        }
        let upper = label.to_ascii_uppercase();
        let rest = upper.strip_prefix("SA")?;
        let numeric = rest.replacen('P', ".", 1);
        numeric.parse::<f64>().ok().map(Imt::Sa)
    }
}

fn format_period(period: f64) -> String {
    // e.g. 0.2 -> "0P2", 1.0 -> "1P0", 0.03 -> "0P03", 3.0 -> "3P0"
    let s = format!("{period:.4}");
    let trimmed = s.trim_end_matches('0');
    let trimmed = if trimmed.ends_with('.') {
        format!("{trimmed}0")
    } else {
        trimmed.to_string()
    };
    trimmed.replace('.', "P")
}

impl PartialEq for Imt {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Imt::Pga, Imt::Pga) | (Imt::Pgv, Imt::Pgv) => true,
            (Imt::Sa(a), Imt::Sa(b)) => (a - b).abs() <= PERIOD_TOLERANCE,
            _ => false,
        }
    }
}
impl Eq for Imt {}

impl std::hash::Hash for Imt {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        // Hash on the rendered label so that periods within tolerance of
        // each other (which compare equal) also hash equal in the common
        // case of exactly-equal periods; this registry never constructs
        // two distinct-but-tolerance-equal periods internally.
        self.label().hash(state);
    }
}

impl fmt::Display for Imt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
