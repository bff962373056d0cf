//! # Input Readers: Sites and Source Models
//!
//! This module provides utilities for reading the hazard pipeline's two
//! external inputs that are in scope for this crate:
//!
//! - **Sites** — a single CSV line, a `*.csv` file (header-tolerant,
//!   `#`-prefixed lines ignored), or a `*.geojson` file of point
//!   features, each deserializing to a [`Site`].
//! - **Source model** — a `model.json` resource deserializing to a
//!   [`SourceModel`], plus an optional sibling `config.json` used as a
//!   run's default configuration.
//!
//! ## Site CSV format (tab- or comma-delimited)
//!
//! ```text
//! # name, lon, lat, vs30, vsInf, z1p0, z2p5
//! site-a, 142.523, 52.913, 300, 1
//! site-b, 142.600, 50.100, 350, 0, 0.45, 1.8
//! ```
//!
//! Columns beyond `lon,lat` are optional and fill in from
//! [`GmmInput::with_defaults`](crate::gmm_input::GmmInput::with_defaults)'s
//! site properties when absent. A leading `name` column is optional; a
//! row is recognized as headerless data the moment its `lon`/`lat`
//! columns parse as numbers, so a descriptive header row is silently
//! skipped rather than rejected.
//!
//! ## See Also
//!
//! - [`crate::source_model::Site`]
//! - [`csv`](https://docs.rs/csv/)

use crate::error::{HazardError, Result};
use crate::source_model::{Site, SourceModel};
use csv::ReaderBuilder;
use std::fs;
use std::path::Path;

fn resource_load_err(resource: impl Into<String>, detail: impl Into<String>) -> HazardError {
    HazardError::ResourceLoadFailure {
        resource: resource.into(),
        detail: detail.into(),
    }
}

/// Parses one site record's fields (already split on the delimiter) into
/// a [`Site`], trying a leading `name` column first and falling back to
/// treating the first column as `lon` if it doesn't parse as text-then-
/// numbers the way a named row would.
///
/// Recognized shapes: `name,lon,lat`, `name,lon,lat,vs30`, `name,lon,lat,vs30,vsInf`,
/// `name,lon,lat,vs30,vsInf,z1p0,z2p5`, and each of those without the
/// leading `name`.
fn parse_site_fields(fields: &[&str]) -> Option<Site> {
    let trimmed: Vec<&str> = fields.iter().map(|f| f.trim()).collect();
    if trimmed.is_empty() {
        return None;
    }

    let (name, rest) = if trimmed[0].parse::<f64>().is_ok() {
        (String::new(), trimmed.as_slice())
    } else {
        (trimmed[0].to_string(), &trimmed[1..])
    };

    if rest.len() < 2 {
        return None;
    }
    let lon: f64 = rest[0].parse().ok()?;
    let lat: f64 = rest[1].parse().ok()?;
    let vs30 = rest.get(2).and_then(|s| s.parse().ok()).unwrap_or(760.0);
    let vs_inf = rest
        .get(3)
        .map(|s| matches!(*s, "1" | "true" | "True" | "TRUE"))
        .unwrap_or(true);
    let z1p0 = rest.get(4).and_then(|s| s.parse().ok()).unwrap_or(f64::NAN);
    let z2p5 = rest.get(5).and_then(|s| s.parse().ok()).unwrap_or(f64::NAN);

    Some(Site {
        name,
        lon,
        lat,
        vs30,
        vs_inf,
        z1p0,
        z2p5,
    })
}

/// Parses a single delimited site line, e.g. `"downtown,142.6,50.1,350,1"`.
pub fn parse_site_line(line: &str) -> Result<Site> {
    let fields: Vec<&str> = line.split(',').collect();
    parse_site_fields(&fields).ok_or_else(|| {
        resource_load_err("site line", format!("could not parse site fields from `{line}`"))
    })
}

/// Reads sites from a `*.csv` file: comma-delimited, `#`-prefixed and
/// blank lines ignored, a descriptive header row tolerated (skipped
/// because its `lon`/`lat` columns fail to parse as numbers).
pub fn read_sites_csv<P: AsRef<Path>>(path: P) -> Result<Vec<Site>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| HazardError::IoFailure {
        path: path.display().to_string(),
        source: e,
    })?;

    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut sites = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(|e| resource_load_err(path.display().to_string(), e.to_string()))?;
        let first = record.get(0).unwrap_or("").trim();
        if first.is_empty() || first.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = record.iter().collect();
        if let Some(site) = parse_site_fields(&fields) {
            sites.push(site);
        }
        // A row that doesn't parse is treated as a header/comment line.
    }
    Ok(sites)
}

/// Reads sites from a GeoJSON `FeatureCollection` of `Point` features.
/// Recognized `properties` keys are `name`, `vs30`,
/// `vsInf`/`vs_inf`, `z1p0`, `z2p5`; all are optional and fall back to
/// the same defaults [`parse_site_fields`] uses.
pub fn read_sites_geojson<P: AsRef<Path>>(path: P) -> Result<Vec<Site>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| HazardError::IoFailure {
        path: path.display().to_string(),
        source: e,
    })?;
    let value: serde_json::Value =
        serde_json::from_str(&text).map_err(|e| resource_load_err(path.display().to_string(), e.to_string()))?;

    let features = value
        .get("features")
        .and_then(|f| f.as_array())
        .ok_or_else(|| resource_load_err(path.display().to_string(), "missing `features` array"))?;

    let mut sites = Vec::with_capacity(features.len());
    for feature in features {
        let coords = feature
            .pointer("/geometry/coordinates")
            .and_then(|c| c.as_array())
            .ok_or_else(|| resource_load_err(path.display().to_string(), "feature missing Point coordinates"))?;
        let lon = coords.first().and_then(|v| v.as_f64()).ok_or_else(|| {
            resource_load_err(path.display().to_string(), "Point coordinate[0] is not a number")
        })?;
        let lat = coords.get(1).and_then(|v| v.as_f64()).ok_or_else(|| {
            resource_load_err(path.display().to_string(), "Point coordinate[1] is not a number")
        })?;

        let props = feature.get("properties");
        let prop_f64 = |key: &str| -> f64 {
            props
                .and_then(|p| p.get(key))
                .and_then(|v| v.as_f64())
                .unwrap_or(f64::NAN)
        };
        let name = props
            .and_then(|p| p.get("name"))
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();
        let vs30 = props
            .and_then(|p| p.get("vs30"))
            .and_then(|v| v.as_f64())
            .unwrap_or(760.0);
        let vs_inf = props
            .and_then(|p| p.get("vsInf").or_else(|| p.get("vs_inf")))
            .and_then(|v| v.as_bool())
            .unwrap_or(true);

        sites.push(Site {
            name,
            lon,
            lat,
            vs30,
            vs_inf,
            z1p0: prop_f64("z1p0"),
            z2p5: prop_f64("z2p5"),
        });
    }
    Ok(sites)
}

/// Reads sites from `spec`, dispatching on shape the same way the
/// `hazard`/`deagg` CLI surfaces do: a path ending in
/// `.geojson` is read as GeoJSON, a path ending in `.csv` (or any other
/// existing file path) is read as CSV, and anything else is parsed as a
/// single inline site line.
pub fn read_sites(spec: &str) -> Result<Vec<Site>> {
    let path = Path::new(spec);
    if spec.ends_with(".geojson") {
        return read_sites_geojson(path);
    }
    if path.is_file() {
        return read_sites_csv(path);
    }
    Ok(vec![parse_site_line(spec)?])
}

/// Reads a [`SourceModel`] from `<model_dir>/model.json`.
pub fn read_source_model<P: AsRef<Path>>(model_dir: P) -> Result<SourceModel> {
    let path = model_dir.as_ref().join("model.json");
    let text = fs::read_to_string(&path).map_err(|e| HazardError::IoFailure {
        path: path.display().to_string(),
        source: e,
    })?;
    serde_json::from_str(&text).map_err(|e| resource_load_err(path.display().to_string(), e.to_string()))
}

/// Reads `<model_dir>/config.json` if present, returning `None` when the
/// model directory carries no default configuration — the CLI's
/// `[config]` positional then supplies the whole configuration instead
/// of overriding a subset of it.
pub fn read_default_config<P: AsRef<Path>>(model_dir: P) -> Result<Option<serde_json::Value>> {
    let path = model_dir.as_ref().join("config.json");
    if !path.exists() {
        return Ok(None);
    }
    let text = fs::read_to_string(&path).map_err(|e| HazardError::IoFailure {
        path: path.display().to_string(),
        source: e,
    })?;
    serde_json::from_str(&text)
        .map(Some)
        .map_err(|e| resource_load_err(path.display().to_string(), e.to_string()))
}

/// Reads a standalone configuration file.
pub fn read_config_file<P: AsRef<Path>>(path: P) -> Result<serde_json::Value> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| HazardError::IoFailure {
        path: path.display().to_string(),
        source: e,
    })?;
    serde_json::from_str(&text).map_err(|e| resource_load_err(path.display().to_string(), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_model::{Rupture, Source, SourceType};
    use std::io::Write;

    #[test]
    fn test_parse_site_line_minimal() {
        let site = parse_site_line("142.6,50.1").unwrap();
        assert_eq!(site.lon, 142.6);
        assert_eq!(site.lat, 50.1);
        assert_eq!(site.vs30, 760.0);
        assert!(site.vs_inf);
    }

    #[test]
    fn test_parse_site_line_full() {
        let site = parse_site_line("downtown,142.6,50.1,350,0,0.45,1.8").unwrap();
        assert_eq!(site.name, "downtown");
        assert_eq!(site.vs30, 350.0);
        assert!(!site.vs_inf);
        assert_eq!(site.z1p0, 0.45);
        assert_eq!(site.z2p5, 1.8);
    }

    #[test]
    fn test_read_sites_csv_skips_header_and_comments() {
        let dir = std::env::temp_dir().join("psha-lib-test-sites-csv");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("sites.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "# site list").unwrap();
        writeln!(file, "name,lon,lat,vs30").unwrap();
        writeln!(file, "a,142.6,50.1,350").unwrap();
        writeln!(file, "b,142.7,50.2,450").unwrap();
        drop(file);

        let sites = read_sites_csv(&path).unwrap();
        assert_eq!(sites.len(), 2);
        assert_eq!(sites[0].name, "a");
        assert_eq!(sites[1].vs30, 450.0);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_read_sites_geojson() {
        let dir = std::env::temp_dir().join("psha-lib-test-sites-geojson");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("sites.geojson");
        std::fs::write(
            &path,
            r#"{
                "type": "FeatureCollection",
                "features": [
                    {
                        "type": "Feature",
                        "properties": {"name": "a", "vs30": 300, "vsInf": false},
                        "geometry": {"type": "Point", "coordinates": [142.6, 50.1]}
                    }
                ]
            }"#,
        )
        .unwrap();

        let sites = read_sites_geojson(&path).unwrap();
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].name, "a");
        assert_eq!(sites[0].vs30, 300.0);
        assert!(!sites[0].vs_inf);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_read_sites_dispatches_on_inline_line() {
        let sites = read_sites("142.6,50.1,350").unwrap();
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].vs30, 350.0);
    }

    #[test]
    fn test_read_source_model_round_trips_json() {
        let dir = std::env::temp_dir().join("psha-lib-test-source-model");
        std::fs::create_dir_all(&dir).unwrap();
        let model = SourceModel::new(vec![Source {
            id: "s".to_string(),
            source_type: SourceType::Fault,
            representative_distance_km: 5.0,
            ruptures: vec![Rupture {
                mag: 6.5,
                rate_per_year: 1e-4,
                r_jb: 25.0,
                r_rup: 25.2,
                r_x: 25.0,
                dip: 90.0,
                width: 14.0,
                z_top: 0.5,
                z_hyp: 7.5,
                rake: 0.0,
            }],
        }]);
        std::fs::write(dir.join("model.json"), serde_json::to_string(&model).unwrap()).unwrap();

        let loaded = read_source_model(&dir).unwrap();
        assert_eq!(loaded.sources.len(), 1);
        assert_eq!(loaded.rupture_count(), 1);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_read_default_config_absent_is_none() {
        let dir = std::env::temp_dir().join("psha-lib-test-no-config");
        std::fs::create_dir_all(&dir).unwrap();
        assert!(read_default_config(&dir).unwrap().is_none());
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
