//! The geospatial backend: the collaborator that holds raster
//! observations and answers spatio-temporal queries over them.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use geo::{BoundingRect, Intersects, MultiPolygon, Rect};
use ndarray::Array2;
use serde_derive::{Deserialize, Serialize};

use crate::geometry::Grid;
use crate::window::{Availability, DateWindow};
use crate::{Error, Result};

/// One acquisition of a collection: named bands sharing a grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    id: String,
    date: NaiveDate,
    grid: Grid,
    bands: BTreeMap<String, Array2<f64>>,
}

impl Observation {
    pub fn new<S: Into<String>>(id: S, date: NaiveDate, grid: Grid) -> Self {
        Observation {
            id: id.into(),
            date,
            grid,
            bands: BTreeMap::new(),
        }
    }

    /// Add a band; its shape must match the grid.
    pub fn with_band<S: Into<String>>(mut self, name: S, data: Array2<f64>) -> Result<Self> {
        if data.dim() != self.grid.shape() {
            return Err(Error::DimensionMismatch {
                expected: self.grid.shape(),
                found: data.dim(),
            });
        }
        self.bands.insert(name.into(), data);
        Ok(self)
    }

    /// The same bands under a catalog's identifier and date.
    pub(crate) fn relabel(self, id: String, date: NaiveDate) -> Self {
        Observation { id, date, ..self }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn band_names(&self) -> impl Iterator<Item = &str> {
        self.bands.keys().map(String::as_str)
    }

    pub fn band(&self, name: &str) -> Result<&Array2<f64>> {
        self.bands.get(name).ok_or_else(|| Error::MissingBand {
            id: self.id.clone(),
            band: name.to_string(),
        })
    }

    /// World-space extent of the observation.
    pub fn bounds(&self) -> Rect<f64> {
        let grid = &self.grid;
        let t = grid.pixel_transform();
        let corner = |x: f64, y: f64| {
            let p = t.transform_point(&nalgebra::Point2::new(x, y));
            geo::Coord { x: p.x, y: p.y }
        };
        let (w, h) = (grid.width as f64, grid.height as f64);
        let a = corner(0., 0.);
        let b = corner(w, h);
        let c = corner(w, 0.);
        let d = corner(0., h);
        let min = geo::Coord {
            x: a.x.min(b.x).min(c.x).min(d.x),
            y: a.y.min(b.y).min(c.y).min(d.y),
        };
        let max = geo::Coord {
            x: a.x.max(b.x).max(c.x).max(d.x),
            y: a.y.max(b.y).max(c.y).max(d.y),
        };
        Rect::new(min, max)
    }

    /// Coarse spatial filter: does the extent touch the
    /// bounding box of `geom`?
    pub fn intersects(&self, geom: &MultiPolygon<f64>) -> bool {
        geom.bounding_rect()
            .map(|r| r.intersects(&self.bounds()))
            .unwrap_or(false)
    }
}

/// Query interface over observation collections.
///
/// Implementations must be free of observable side effects:
/// equal arguments yield equal answers, so callers may memoize.
pub trait Backend {
    /// Capture date range of a collection (floored at
    /// 2020-01-01), or `None` if it holds nothing.
    fn availability(&self, collection: &str) -> Result<Option<Availability>>;

    /// Observations of `collection` captured within `window`
    /// and touching `geom`, ordered by capture date. Observations
    /// sharing a date keep their catalog order.
    fn observations(
        &self,
        collection: &str,
        geom: &MultiPolygon<f64>,
        window: &DateWindow,
    ) -> Result<Vec<Observation>>;
}

impl<'a, B: Backend + ?Sized> Backend for &'a B {
    fn availability(&self, collection: &str) -> Result<Option<Availability>> {
        (**self).availability(collection)
    }

    fn observations(
        &self,
        collection: &str,
        geom: &MultiPolygon<f64>,
        window: &DateWindow,
    ) -> Result<Vec<Observation>> {
        (**self).observations(collection, geom, window)
    }
}

/// A backend holding every observation in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryBackend {
    collections: HashMap<String, Vec<Observation>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn insert<S: Into<String>>(&mut self, collection: S, obs: Observation) {
        self.collections.entry(collection.into()).or_default().push(obs);
    }

    pub fn with<S: Into<String>>(mut self, collection: S, obs: Observation) -> Self {
        self.insert(collection, obs);
        self
    }
}

impl Backend for MemoryBackend {
    fn availability(&self, collection: &str) -> Result<Option<Availability>> {
        let dates = self
            .collections
            .get(collection)
            .into_iter()
            .flatten()
            .map(Observation::date);
        Ok(date_range(dates))
    }

    fn observations(
        &self,
        collection: &str,
        geom: &MultiPolygon<f64>,
        window: &DateWindow,
    ) -> Result<Vec<Observation>> {
        let mut found: Vec<_> = self
            .collections
            .get(collection)
            .into_iter()
            .flatten()
            .filter(|obs| window.contains(obs.date()) && obs.intersects(geom))
            .cloned()
            .collect();
        found.sort_by_key(Observation::date);
        Ok(found)
    }
}

/// Availability spanned by a set of capture dates.
pub(crate) fn date_range<I: IntoIterator<Item = NaiveDate>>(dates: I) -> Option<Availability> {
    dates
        .into_iter()
        .fold(None, |acc: Option<(NaiveDate, NaiveDate)>, d| match acc {
            None => Some((d, d)),
            Some((lo, hi)) => Some((lo.min(d), hi.max(d))),
        })
        .map(|(lo, hi)| Availability::from_range(lo, hi))
}
