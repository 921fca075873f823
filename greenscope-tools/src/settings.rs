//! Optional JSON settings file shared by the tools. Command
//! line flags override every value read here.
//!
//! ```json
//! {
//!   "catalog": "data/catalog.json",
//!   "boundaries": "data/boundaries.json",
//!   "assets": "assets/GIF",
//!   "source": "sentinel2",
//!   "threshold": 0.2,
//!   "reduce": { "max_pixels": 1e9, "tile_scale": 8 }
//! }
//! ```
//!
//! Relative paths are resolved against the settings file's
//! directory.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveDate;
use greenscope::prelude::*;
use serde_derive::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub catalog: Option<PathBuf>,
    pub boundaries: Option<PathBuf>,
    /// Directory of per-region media assets.
    pub assets: Option<PathBuf>,
    pub source: Option<Source>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub threshold: Option<Threshold>,
    pub reduce: ReduceOptions,
}

impl Settings {
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let mut settings: Settings = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("parsing {}", path.display()))?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        for p in [&mut settings.catalog, &mut settings.boundaries, &mut settings.assets] {
            if let Some(p) = p {
                if p.is_relative() {
                    *p = base.join(&*p);
                }
            }
        }
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn reads_and_resolves_paths() {
        let tmp = TempDir::new("settings_test").unwrap();
        let path = tmp.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{
                "catalog": "catalog.json",
                "boundaries": "/data/boundaries.json",
                "source": "landsat",
                "threshold": 0.25,
                "start": "2022-03-01",
                "reduce": { "tile_scale": 8 }
            }"#,
        )
        .unwrap();
        let settings = Settings::from_file(&path).unwrap();
        assert_eq!(settings.catalog, Some(tmp.path().join("catalog.json")));
        assert_eq!(settings.boundaries, Some(PathBuf::from("/data/boundaries.json")));
        assert_eq!(settings.source, Some(Source::Landsat));
        assert_eq!(settings.threshold.map(Threshold::value), Some(0.25));
        assert_eq!(settings.start, NaiveDate::from_ymd_opt(2022, 3, 1));
        assert_eq!(settings.reduce.tile_scale, 8);
        assert_eq!(settings.reduce.max_pixels, 1e13);
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let tmp = TempDir::new("settings_test").unwrap();
        let path = tmp.path().join("settings.json");
        std::fs::write(&path, r#"{ "threshold": 3.0 }"#).unwrap();
        assert!(Settings::from_file(&path).is_err());
    }
}
