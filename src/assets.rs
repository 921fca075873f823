//! Lookup of the per-region media assets that accompany a
//! report (e.g. an animation of the region's index history).
//!
//! Assets live in one directory and are named
//! `<region><suffix>`. A region without its own asset falls back
//! to the default (country wide) one. Nothing here is fatal: a
//! missing asset is reported and logged, never an error.

use std::path::{Path, PathBuf};

use serde_derive::Serialize;
use tracing::{debug, warn};

pub const DEFAULT_SUFFIX: &str = "_final.gif";
pub const DEFAULT_NAME: &str = "country";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "path", rename_all = "snake_case")]
pub enum AssetLookup {
    /// The region's own asset.
    Found(PathBuf),
    /// The default asset, used in place of a missing one.
    Fallback(PathBuf),
    Missing,
}

impl AssetLookup {
    pub fn path(&self) -> Option<&Path> {
        match self {
            AssetLookup::Found(p) | AssetLookup::Fallback(p) => Some(p),
            AssetLookup::Missing => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Assets {
    dir: PathBuf,
    suffix: String,
    default: String,
}

impl Assets {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Assets {
            dir: dir.into(),
            suffix: DEFAULT_SUFFIX.into(),
            default: DEFAULT_NAME.into(),
        }
    }

    pub fn with_suffix<S: Into<String>>(mut self, suffix: S) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn with_default<S: Into<String>>(mut self, name: S) -> Self {
        self.default = name.into();
        self
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}{}", name, self.suffix))
    }

    /// Asset of `region`, or of the whole country if `None`.
    pub fn resolve(&self, region: Option<&str>) -> AssetLookup {
        if let Some(name) = region {
            let path = self.path_for(name);
            if path.is_file() {
                debug!(path = %path.display(), "asset found");
                return AssetLookup::Found(path);
            }
        }
        let fallback = self.path_for(&self.default);
        if !fallback.is_file() {
            warn!(dir = %self.dir.display(), region, "no asset and no default asset");
            return AssetLookup::Missing;
        }
        match region {
            Some(name) => {
                warn!(region = name, "asset missing; using the default");
                AssetLookup::Fallback(fallback)
            }
            None => AssetLookup::Found(fallback),
        }
    }
}

/// Asset of `region` in `dir`, with the default naming.
pub fn resolve(dir: &Path, region: Option<&str>) -> AssetLookup {
    Assets::new(dir).resolve(region)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"GIF89a").unwrap();
    }

    #[test]
    fn region_asset_is_preferred() {
        let tmp = TempDir::new("assets_test").unwrap();
        touch(tmp.path(), "Tabuk_final.gif");
        touch(tmp.path(), "country_final.gif");
        assert_eq!(
            resolve(tmp.path(), Some("Tabuk")),
            AssetLookup::Found(tmp.path().join("Tabuk_final.gif"))
        );
        assert_eq!(
            resolve(tmp.path(), None),
            AssetLookup::Found(tmp.path().join("country_final.gif"))
        );
    }

    #[test]
    fn falls_back_to_default() {
        let tmp = TempDir::new("assets_test").unwrap();
        touch(tmp.path(), "country_final.gif");
        let found = resolve(tmp.path(), Some("Jazan"));
        assert_eq!(found, AssetLookup::Fallback(tmp.path().join("country_final.gif")));
        assert!(found.path().is_some());
    }

    #[test]
    fn missing_everything_is_not_fatal() {
        let tmp = TempDir::new("assets_test").unwrap();
        assert_eq!(resolve(tmp.path(), Some("Jazan")), AssetLookup::Missing);
        let custom = Assets::new(tmp.path()).with_suffix(".png").with_default("KSA");
        touch(tmp.path(), "KSA.png");
        assert_eq!(
            custom.resolve(Some("Jazan")),
            AssetLookup::Fallback(tmp.path().join("KSA.png"))
        );
    }
}
