//! Read observations and boundaries through GDAL.
//!
//! This module is only available with the "gdal" feature.

use std::path::Path;

use chrono::NaiveDate;
use gdal::raster::ResampleAlg;
use gdal::Dataset;
use geo::MultiPolygon;
use ndarray::Array2;
use tracing::debug;

use crate::backend::Observation;
use crate::boundary::{City, Region};
use crate::geometry::{Crs, Grid};
use crate::{Error, Result};

/// Read every band of a raster into an [`Observation`]. Bands
/// are named by `names` in band order, falling back to the band
/// description, then to `band_<n>`. No-data pixels become NaN.
pub fn read_observation(
    path: &Path,
    id: &str,
    date: NaiveDate,
    crs: Crs,
    names: &[String],
) -> Result<Observation> {
    let ds = Dataset::open(path)?;
    let transform = ds.geo_transform()?;
    let (width, height) = ds.raster_size();
    let grid = Grid::new(transform, crs, width, height);

    let mut obs = Observation::new(id, date, grid);
    for idx in 1..=ds.raster_count() {
        let band = ds.rasterband(idx)?;
        let name = names
            .get(idx as usize - 1)
            .cloned()
            .or_else(|| band.description().ok().filter(|d| !d.is_empty()))
            .unwrap_or_else(|| format!("band_{}", idx));

        let mut data = vec![0f64; width * height];
        band.read_into_slice(
            (0, 0),
            (width, height),
            (width, height),
            &mut data,
            Some(ResampleAlg::NearestNeighbour),
        )?;
        if let Some(no_val) = band.no_data_value() {
            for v in data.iter_mut().filter(|v| **v == no_val) {
                *v = f64::NAN;
            }
        }
        obs = obs.with_band(name, Array2::from_shape_vec((height, width), data)?)?;
    }
    debug!(path = %path.display(), "read observation");
    Ok(obs)
}

fn multipoly_from(geom: geo::Geometry<f64>) -> Result<MultiPolygon<f64>> {
    use geo::Geometry::{MultiPolygon, Polygon};
    match geom {
        Polygon(p) => Ok(p.into()),
        MultiPolygon(p) => Ok(p),
        _ => Err(Error::Backend("boundary is not a (multi)-polygon".into())),
    }
}

/// Read `(name, polygon)` pairs (and an optional parent name) of
/// the first layer of a vector dataset.
/// Name, parent name and geometry of one vector feature.
type Feature = (String, Option<String>, MultiPolygon<f64>);

fn read_features(
    path: &Path,
    name_field: &str,
    parent_field: Option<&str>,
) -> Result<Vec<Feature>> {
    let ds = Dataset::open(path)?;
    let mut layer = ds.layer(0)?;
    let mut out = Vec::new();
    for feature in layer.features() {
        let field = |name: &str| -> Result<Option<String>> {
            Ok(feature.field(name)?.and_then(|v| v.into_string()))
        };
        let name = match field(name_field)? {
            Some(name) => name,
            None => continue,
        };
        let parent = match parent_field {
            Some(p) => field(p)?,
            None => None,
        };
        let poly = multipoly_from(feature.geometry().to_geo()?)?;
        out.push((name, parent, poly));
    }
    Ok(out)
}

/// Country outline: union of every feature of the dataset.
pub fn read_country(path: &Path) -> Result<MultiPolygon<f64>> {
    let ds = Dataset::open(path)?;
    let mut layer = ds.layer(0)?;
    let mut polys = Vec::new();
    for feature in layer.features() {
        polys.extend(multipoly_from(feature.geometry().to_geo()?)?.0);
    }
    Ok(MultiPolygon(polys))
}

pub fn read_regions(path: &Path, name_field: &str) -> Result<Vec<Region>> {
    Ok(read_features(path, name_field, None)?
        .into_iter()
        .map(|(name, _, geometry)| Region { name, geometry })
        .collect())
}

pub fn read_cities(path: &Path, name_field: &str, region_field: &str) -> Result<Vec<City>> {
    Ok(read_features(path, name_field, Some(region_field))?
        .into_iter()
        .map(|(name, region, geometry)| City {
            name,
            region: region.unwrap_or_default(),
            geometry,
        })
        .collect())
}
