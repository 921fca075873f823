//! Index compositing: the per-pixel mean of a source's index
//! over every observation in a date window, clipped to a
//! boundary.

use geo::{BoundingRect, MultiPolygon};
use ndarray::{Array2, Zip};
use serde_derive::Serialize;
use tracing::{debug, info};

use crate::align::align_to;
use crate::backend::Backend;
use crate::geometry::{Crs, Grid};
use crate::raster::Raster;
use crate::source::Source;
use crate::window::DateWindow;
use crate::Result;

/// A composite index raster and the scale to reduce it at.
#[derive(Debug, Clone, Serialize)]
pub struct Composite {
    raster: Raster,
    scale: f64,
    observations: usize,
}

impl Composite {
    /// The composite of no observations: a grid without pixels
    /// anchored at the boundary's corner. Every statistic over
    /// it is zero.
    fn empty(source: Source, geom: &MultiPolygon<f64>) -> Self {
        let (x, y) = geom
            .bounding_rect()
            .map(|r| (r.min().x, r.max().y))
            .unwrap_or((0., 0.));
        let grid = Grid::new([x, 1., 0., y, 0., -1.], Crs::default(), 0, 0);
        Composite {
            raster: Raster::filled(grid, f64::NAN),
            scale: source.scale(),
            observations: 0,
        }
    }

    #[inline]
    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    pub fn into_raster(self) -> Raster {
        self.raster
    }

    /// Ground sample distance (in meters) statistics over this
    /// composite are computed at.
    #[inline]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Number of observations averaged.
    #[inline]
    pub fn observations(&self) -> usize {
        self.observations
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.observations == 0
    }
}

/// Composite `source` over `window`, clipped to `geom`.
///
/// Each observation is turned into index values by the source's
/// rule, then averaged pixel by pixel; a pixel masked in some
/// observations is the mean of the others, and NaN if masked in
/// all. Observations are resampled onto the grid of the first
/// one. Pixels whose center lies outside `geom` are NaN.
pub fn composite<B: Backend>(
    backend: &B,
    source: Source,
    window: &DateWindow,
    geom: &MultiPolygon<f64>,
) -> Result<Composite> {
    let observations = backend.observations(source.collection(), geom, window)?;
    let grid = match observations.first() {
        Some(obs) => obs.grid().clone(),
        None => {
            info!(
                %source,
                start = %window.start(),
                end = %window.end(),
                "no observations; empty composite"
            );
            return Ok(Composite::empty(source, geom));
        }
    };

    let mut sum = Array2::<f64>::zeros(grid.shape());
    let mut count = Array2::<u32>::zeros(grid.shape());
    for obs in &observations {
        let index = align_to(&source.index_of(obs)?, obs.grid(), &grid)?;
        Zip::from(&mut sum)
            .and(&mut count)
            .and(&index)
            .for_each(|s, c, &v| {
                if !v.is_nan() {
                    *s += v;
                    *c += 1;
                }
            });
        debug!(id = obs.id(), date = %obs.date(), "composited observation");
    }
    let mean = Zip::from(&sum)
        .and(&count)
        .map_collect(|&s, &c| if c == 0 { f64::NAN } else { s / c as f64 });

    let raster = Raster::new(grid, mean)?.clip(geom)?;
    info!(
        %source,
        observations = observations.len(),
        valid_pixels = raster.valid_count(),
        "composite ready"
    );
    Ok(Composite {
        raster,
        scale: source.scale(),
        observations: observations.len(),
    })
}
