//! Administrative boundaries and the region / city selection
//! that resolves to the geometry every computation runs over.
//!
//! Boundaries are read from a JSON document:
//!
//! ```json
//! {
//!   "country": [{ "exterior": [{ "x": 34.5, "y": 16.4 }, ...], "interiors": [] }],
//!   "regions": [{ "name": "Riyadh", "geometry": [...] }],
//!   "cities": [{ "name": "Diriyah", "region": "Riyadh", "geometry": [...] }]
//! }
//! ```
//!
//! where geometries use the `geo` serde encoding of a
//! `MultiPolygon`; or, with the
//! "gdal" feature, from three OGR vector datasets.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use geo::MultiPolygon;
use serde_derive::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub name: String,
    pub geometry: MultiPolygon<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub name: String,
    /// Name of the region the city lies in.
    pub region: String,
    pub geometry: MultiPolygon<f64>,
}

/// A filter selection. A city, when given, wins over the
/// region; no region means the whole country.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    pub region: Option<String>,
    pub city: Option<String>,
}

impl Selection {
    pub fn country() -> Self {
        Default::default()
    }

    pub fn region<S: Into<String>>(name: S) -> Self {
        Selection {
            region: Some(name.into()),
            city: None,
        }
    }

    pub fn city<S: Into<String>, T: Into<String>>(region: S, city: T) -> Self {
        Selection {
            region: Some(region.into()),
            city: Some(city.into()),
        }
    }

    /// Human readable name of the selected area.
    pub fn describe(&self) -> &str {
        self.city
            .as_deref()
            .or(self.region.as_deref())
            .unwrap_or("country")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Boundaries {
    country: MultiPolygon<f64>,
    #[serde(default)]
    regions: Vec<Region>,
    #[serde(default)]
    cities: Vec<City>,
}

impl Boundaries {
    pub fn new(country: MultiPolygon<f64>, regions: Vec<Region>, cities: Vec<City>) -> Self {
        Boundaries {
            country,
            regions,
            cities,
        }
    }

    /// Read boundaries from a JSON document.
    pub fn from_json(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let boundaries: Boundaries = serde_json::from_reader(reader)?;
        info!(
            path = %path.display(),
            regions = boundaries.regions.len(),
            cities = boundaries.cities.len(),
            "loaded boundaries"
        );
        Ok(boundaries)
    }

    /// Read boundaries from vector datasets. `regions` pairs a
    /// dataset with its name field; `cities` adds the field
    /// holding the parent region's name.
    ///
    /// This function is only available with the "gdal" feature.
    #[cfg(feature = "gdal")]
    pub fn from_datasets(
        country: &Path,
        regions: (&Path, &str),
        cities: (&Path, &str, &str),
    ) -> Result<Self> {
        use crate::gdal_io::{read_cities, read_country, read_regions};
        Ok(Boundaries {
            country: read_country(country)?,
            regions: read_regions(regions.0, regions.1)?,
            cities: read_cities(cities.0, cities.1, cities.2)?,
        })
    }

    pub fn country(&self) -> &MultiPolygon<f64> {
        &self.country
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    /// Geometry of the first region named exactly `name`.
    pub fn region(&self, name: &str) -> Result<&MultiPolygon<f64>> {
        self.regions
            .iter()
            .find(|r| r.name == name)
            .map(|r| &r.geometry)
            .ok_or_else(|| Error::RegionNotFound(name.to_string()))
    }

    /// Geometry of the first city named exactly `name`.
    pub fn city(&self, name: &str) -> Result<&MultiPolygon<f64>> {
        self.cities
            .iter()
            .find(|c| c.name == name)
            .map(|c| &c.geometry)
            .ok_or_else(|| Error::CityNotFound(name.to_string()))
    }

    /// Geometry of a selection: the city if one is chosen, else
    /// the region, else the whole country.
    pub fn resolve(&self, selection: &Selection) -> Result<&MultiPolygon<f64>> {
        let geom = match (&selection.region, &selection.city) {
            (_, Some(city)) => self.city(city)?,
            (Some(region), None) => self.region(region)?,
            (None, None) => &self.country,
        };
        debug!(area = selection.describe(), polygons = geom.0.len(), "resolved selection");
        Ok(geom)
    }

    /// Distinct region names in sorted order.
    pub fn region_names(&self) -> Vec<&str> {
        let names: BTreeSet<_> = self.regions.iter().map(|r| r.name.as_str()).collect();
        names.into_iter().collect()
    }

    /// Distinct names of the cities in `region`, sorted.
    pub fn city_names(&self, region: &str) -> Vec<&str> {
        let names: BTreeSet<_> = self
            .cities
            .iter()
            .filter(|c| c.region == region)
            .map(|c| c.name.as_str())
            .collect();
        names.into_iter().collect()
    }
}
