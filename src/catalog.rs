//! A file-backed [`Backend`]: a JSON manifest listing the
//! observations of each collection, each stored in its own file.
//!
//! ```json
//! {
//!   "collections": {
//!     "MODIS/061/MOD13A2": [
//!       { "id": "A2023001", "date": "2023-01-01", "path": "modis/A2023001.cbor" }
//!     ]
//!   }
//! }
//! ```
//!
//! Paths are relative to the manifest. `.cbor` files hold a
//! serialized [`Observation`]; with the "gdal" feature, any
//! other extension is opened as a GDAL raster whose bands are
//! named by `bands` (or by the band descriptions).

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use geo::MultiPolygon;
use serde_derive::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::backend::{date_range, Backend, Observation};
use crate::geometry::Crs;
use crate::io::read_bin;
use crate::window::{Availability, DateWindow};
use crate::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub date: NaiveDate,
    pub path: PathBuf,
    /// Band names, in band order, for rasters without
    /// descriptions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bands: Vec<String>,
    #[serde(default)]
    pub crs: Crs,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    pub collections: BTreeMap<String, Vec<CatalogEntry>>,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    root: PathBuf,
    manifest: Manifest,
}

impl Catalog {
    /// Read and validate a manifest. Fails if the manifest is
    /// unreadable or lists a file that does not exist, so a
    /// broken catalog is caught before any computation.
    pub fn open(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let manifest: Manifest = serde_json::from_reader(reader)?;
        let root = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let catalog = Catalog { root, manifest };

        for (name, entries) in &catalog.manifest.collections {
            for entry in entries {
                let file = catalog.resolve(&entry.path);
                if !file.is_file() {
                    return Err(Error::Backend(format!(
                        "{}: observation {} missing at {}",
                        name,
                        entry.id,
                        file.display()
                    )));
                }
            }
            debug!(collection = %name, observations = entries.len(), "catalog collection");
        }
        info!(
            path = %path.display(),
            collections = catalog.manifest.collections.len(),
            "opened catalog"
        );
        Ok(catalog)
    }

    /// A catalog over an in-memory manifest rooted at `root`.
    pub fn from_manifest(root: PathBuf, manifest: Manifest) -> Self {
        Catalog { root, manifest }
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    fn entries(&self, collection: &str) -> &[CatalogEntry] {
        self.manifest
            .collections
            .get(collection)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn load(&self, entry: &CatalogEntry) -> Result<Observation> {
        let path = self.resolve(&entry.path);
        let is_cbor = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("cbor"))
            .unwrap_or(false);
        let obs: Observation = if is_cbor {
            read_bin(&path)?
        } else {
            load_raster(&path, entry)?
        };
        if obs.date() != entry.date {
            debug!(id = %entry.id, "manifest date overrides stored date");
        }
        Ok(obs.relabel(entry.id.clone(), entry.date))
    }
}

#[cfg(feature = "gdal")]
fn load_raster(path: &Path, entry: &CatalogEntry) -> Result<Observation> {
    crate::gdal_io::read_observation(path, &entry.id, entry.date, entry.crs, &entry.bands)
}

#[cfg(not(feature = "gdal"))]
fn load_raster(path: &Path, _entry: &CatalogEntry) -> Result<Observation> {
    Err(Error::Backend(format!(
        "{}: only .cbor observations are supported without the `gdal` feature",
        path.display()
    )))
}

impl Backend for Catalog {
    fn availability(&self, collection: &str) -> Result<Option<Availability>> {
        Ok(date_range(self.entries(collection).iter().map(|e| e.date)))
    }

    fn observations(
        &self,
        collection: &str,
        geom: &MultiPolygon<f64>,
        window: &DateWindow,
    ) -> Result<Vec<Observation>> {
        let mut found = Vec::new();
        for entry in self.entries(collection) {
            if !window.contains(entry.date) {
                continue;
            }
            let obs = self.load(entry)?;
            if obs.intersects(geom) {
                found.push(obs);
            }
        }
        found.sort_by_key(Observation::date);
        debug!(collection, count = found.len(), "observations loaded");
        Ok(found)
    }
}
