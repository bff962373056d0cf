//! Coefficient containers: an immutable `IMT -> (name -> value)` map
//! loaded once per model family from a CSV-like text resource whose
//! header row is `Imt, <coef1>, <coef2>, ...`.

use crate::error::{HazardError, Result};
use crate::imt::Imt;
use std::collections::HashMap;

/// An immutable, IMT-keyed coefficient table shared by every instance of
/// a GMM family.
#[derive(Debug, Clone)]
pub struct CoefficientTable {
    rows: HashMap<Imt, HashMap<String, f64>>,
}

impl CoefficientTable {
    /// Parse a coefficient resource. The header's first column must be
    /// `Imt`; remaining header columns name the coefficients. Spaces are
    /// ignored and empty lines are skipped.
    pub fn from_csv_str(resource_name: &str, text: &str) -> Result<Self> {
        let mut lines = text.lines().filter(|l| !l.trim().is_empty());

        let header = lines.next().ok_or_else(|| HazardError::ResourceLoadFailure {
            resource: resource_name.to_string(),
            detail: "empty resource".to_string(),
        })?;
        let columns: Vec<String> = header
            .split(',')
            .map(|c| c.replace(' ', ""))
            .collect();
        if columns.first().map(|s| s.as_str()) != Some("Imt") {
            return Err(HazardError::ResourceLoadFailure {
                resource: resource_name.to_string(),
                detail: "header's first column must be `Imt`".to_string(),
            });
        }
        let coef_names = &columns[1..];

        let mut rows = HashMap::new();
        for line in lines {
            let fields: Vec<String> = line.split(',').map(|c| c.replace(' ', "")).collect();
            if fields.is_empty() {
                continue;
            }
            let imt = Imt::parse(&fields[0]).ok_or_else(|| HazardError::ResourceLoadFailure {
                resource: resource_name.to_string(),
                detail: format!("unrecognized Imt label `{}`", fields[0]),
            })?;
            let mut row = HashMap::new();
            for (name, raw) in coef_names.iter().zip(fields.iter().skip(1)) {
                let value: f64 = raw.parse().map_err(|_| HazardError::ResourceLoadFailure {
                    resource: resource_name.to_string(),
                    detail: format!("coefficient `{name}` for {imt}: `{raw}` is not a number"),
                })?;
                row.insert(name.clone(), value);
            }
            rows.insert(imt, row);
        }

        Ok(Self { rows })
    }

    /// The set of IMTs this table has coefficient rows for.
    pub fn imts(&self) -> Vec<Imt> {
        self.rows.keys().copied().collect()
    }

    pub fn supports(&self, imt: Imt) -> bool {
        self.rows.contains_key(&imt)
    }

    /// Look up a named coefficient for `imt`. Returns `ResourceLoadFailure`
    /// if the IMT or the coefficient name is missing — this only happens
    /// when a model is mis-wired to its own table, which is a startup
    /// (not per-site) condition.
    pub fn get(&self, imt: Imt, name: &str) -> Result<f64> {
        let row = self.rows.get(&imt).ok_or_else(|| HazardError::UnsupportedImt {
            model: "coefficient table",
            imt,
        })?;
        row.get(name).copied().ok_or_else(|| HazardError::ResourceLoadFailure {
            resource: "coefficient table".to_string(),
            detail: format!("missing coefficient `{name}` for {imt}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Imt, a, b, c
PGA, 0.55, -0.0045, 0.46
SA0P2, 0.60, -0.0040, 0.80
SA1P0, 0.61, -0.0020, -0.28
";

    #[test]
    fn test_from_csv_str_parses_rows() {
        let table = CoefficientTable::from_csv_str("sample", SAMPLE).unwrap();
        assert!(table.supports(Imt::Pga));
        assert!(table.supports(Imt::Sa(0.2)));
        assert!(!table.supports(Imt::Pgv));
        assert_eq!(table.get(Imt::Pga, "a").unwrap(), 0.55);
        assert_eq!(table.get(Imt::Sa(1.0), "c").unwrap(), -0.28);
    }

    #[test]
    fn test_missing_coefficient_errors() {
        let table = CoefficientTable::from_csv_str("sample", SAMPLE).unwrap();
        assert!(table.get(Imt::Pga, "nonexistent").is_err());
        assert!(table.get(Imt::Pgv, "a").is_err());
    }

    #[test]
    fn test_bad_header_rejected() {
        let bad = "NotImt, a\nPGA, 1.0\n";
        assert!(CoefficientTable::from_csv_str("bad", bad).is_err());
    }
}
