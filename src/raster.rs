//! In-memory single band rasters of `f64` values. NaN marks
//! masked or missing pixels throughout the crate.

use geo::MultiPolygon;
use ndarray::{Array2, Zip};
use serde_derive::{Deserialize, Serialize};

use crate::geometry::Grid;
use crate::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Raster {
    grid: Grid,
    data: Array2<f64>,
}

impl Raster {
    pub fn new(grid: Grid, data: Array2<f64>) -> Result<Self> {
        if data.dim() != grid.shape() {
            return Err(Error::DimensionMismatch {
                expected: grid.shape(),
                found: data.dim(),
            });
        }
        Ok(Raster { grid, data })
    }

    /// A raster with every pixel set to `value`.
    pub fn filled(grid: Grid, value: f64) -> Self {
        let data = Array2::from_elem(grid.shape(), value);
        Raster { grid, data }
    }

    #[inline]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[inline]
    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn into_data(self) -> Array2<f64> {
        self.data
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[(row, col)]
    }

    /// Number of pixels holding a value.
    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|v| !v.is_nan()).count()
    }

    /// `true` if no pixel holds a value.
    pub fn is_empty(&self) -> bool {
        self.data.iter().all(|v| v.is_nan())
    }

    /// Mask every pixel whose center lies outside `geom`.
    pub fn clip(mut self, geom: &MultiPolygon<f64>) -> Result<Self> {
        let footprint = self.grid.footprint(geom)?;
        let (rows, cols) = (footprint.rows(), footprint.cols());
        for ((i, j), val) in self.data.indexed_iter_mut() {
            if !(rows.contains(&i) && cols.contains(&j) && footprint.contains(i, j)) {
                *val = f64::NAN;
            }
        }
        Ok(self)
    }

    /// Apply `f` to every pixel holding a value.
    pub fn map<F: Fn(f64) -> f64>(&self, f: F) -> Raster {
        Raster {
            grid: self.grid.clone(),
            data: self.data.mapv(|v| if v.is_nan() { v } else { f(v) }),
        }
    }

    /// Combine two rasters on the same grid pixel by pixel. The
    /// output is NaN where either input is.
    pub fn zip_with<F: Fn(f64, f64) -> f64>(&self, other: &Raster, f: F) -> Result<Raster> {
        if self.data.dim() != other.data.dim() {
            return Err(Error::DimensionMismatch {
                expected: self.data.dim(),
                found: other.data.dim(),
            });
        }
        let mut data = Array2::from_elem(self.data.dim(), f64::NAN);
        Zip::from(&mut data)
            .and(&self.data)
            .and(&other.data)
            .for_each(|out, &a, &b| {
                if !a.is_nan() && !b.is_nan() {
                    *out = f(a, b);
                }
            });
        Ok(Raster {
            grid: self.grid.clone(),
            data,
        })
    }

    /// Values limited to `[min, max]`, for consumers that need
    /// strict bounds.
    pub fn clamped(&self, min: f64, max: f64) -> Raster {
        self.map(|v| v.max(min).min(max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Crs;
    use geo::polygon;
    use ndarray::array;

    fn grid() -> Grid {
        Grid::new([0., 1., 0., 2., 0., -1.], Crs::Projected, 2, 2)
    }

    #[test]
    fn rejects_mismatched_data() {
        let res = Raster::new(grid(), Array2::zeros((3, 2)));
        assert!(matches!(res, Err(Error::DimensionMismatch { .. })));
    }

    #[test]
    fn clip_masks_outside_pixels() {
        let raster = Raster::new(grid(), array![[1., 2.], [3., 4.]]).unwrap();
        let left: MultiPolygon<f64> = polygon![
            (x: 0., y: 0.),
            (x: 1., y: 0.),
            (x: 1., y: 2.),
            (x: 0., y: 2.),
        ]
        .into();
        let clipped = raster.clip(&left).unwrap();
        assert_eq!(clipped.get(0, 0), 1.);
        assert_eq!(clipped.get(1, 0), 3.);
        assert!(clipped.get(0, 1).is_nan());
        assert!(clipped.get(1, 1).is_nan());
        assert_eq!(clipped.valid_count(), 2);
    }

    #[test]
    fn zip_propagates_nan() {
        let a = Raster::new(grid(), array![[1., f64::NAN], [3., 4.]]).unwrap();
        let b = Raster::new(grid(), array![[0.5, 1.], [f64::NAN, 1.]]).unwrap();
        let d = a.zip_with(&b, |x, y| x - y).unwrap();
        assert_eq!(d.get(0, 0), 0.5);
        assert!(d.get(0, 1).is_nan());
        assert!(d.get(1, 0).is_nan());
        assert_eq!(d.get(1, 1), 3.);
    }

    #[test]
    fn clamped_limits_range() {
        let r = Raster::new(grid(), array![[-1.5, 0.2], [f64::NAN, 1.2]]).unwrap();
        let c = r.clamped(-1., 1.);
        assert_eq!(c.get(0, 0), -1.);
        assert_eq!(c.get(0, 1), 0.2);
        assert!(c.get(1, 0).is_nan());
        assert_eq!(c.get(1, 1), 1.);
    }
}
