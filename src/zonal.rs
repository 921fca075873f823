//! Zonal statistics: reductions of a raster over the pixels of a
//! boundary.
//!
//! Every reduction walks the rows of the boundary's footprint in
//! chunks (see [`ChunkConfig`]), in parallel with the
//! "use-rayon" feature, and accumulates [`PixelStats`] weighted
//! by the ground area of each pixel.
//!
//! # Sampling
//!
//! A reduction runs at a _scale_, a ground sample distance in
//! meters. When it is coarser than the raster, only every
//! `stride`-th row and column is visited, with `stride =
//! round(scale / gsd)`, and each visited pixel stands for the
//! block of up to `stride²` pixels it starts. Blocks are cut
//! short at the edge of the footprint.

use std::hash::{Hash, Hasher};

use geo::MultiPolygon;
use serde_derive::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::boundary::{Boundaries, Region};
use crate::chunking::ChunkConfig;
use crate::geometry::{geometry_area, Footprint};
use crate::raster::Raster;
use crate::stats::PixelStats;
use crate::{Error, Result};

/// Index value above which a pixel counts as highly vegetated.
/// Always within `[0, 1]`, so it is never NaN and can be hashed.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Threshold(f64);

impl Threshold {
    pub fn new(value: f64) -> Result<Self> {
        if (0. ..=1.).contains(&value) {
            // -0.0 becomes 0.0, keeping `Hash` consistent with `Eq`
            Ok(Threshold(value + 0.))
        } else {
            Err(Error::InvalidThreshold(value))
        }
    }

    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Threshold(0.1)
    }
}

impl Eq for Threshold {}

impl Hash for Threshold {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl TryFrom<f64> for Threshold {
    type Error = Error;
    fn try_from(value: f64) -> Result<Self> {
        Threshold::new(value)
    }
}

impl From<Threshold> for f64 {
    fn from(t: Threshold) -> f64 {
        t.0
    }
}

/// Limits of a reduction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReduceOptions {
    /// Most pixels one reduction may visit.
    pub max_pixels: f64,
    /// Coarsen the sampling stride instead of failing when
    /// `max_pixels` would be exceeded.
    pub best_effort: bool,
    /// Split row chunks into this many smaller ones.
    pub tile_scale: usize,
}

impl Default for ReduceOptions {
    fn default() -> Self {
        ReduceOptions {
            max_pixels: 1e13,
            best_effort: true,
            tile_scale: 4,
        }
    }
}

/// Highly vegetated share and area of a boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VegetationSummary {
    /// Percent of the boundary area above the threshold.
    pub high_ratio: f64,
    /// Area above the threshold in km².
    pub vegetated_km2: f64,
}

/// Mean and standard deviation of a raster over one region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionStats {
    pub name: String,
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
    pub pixels: usize,
}

/// Percent of `geom`'s area where `raster` exceeds `threshold`.
pub fn high_vegetation_ratio(
    raster: &Raster,
    geom: &MultiPolygon<f64>,
    scale: f64,
    threshold: Threshold,
) -> Result<f64> {
    Ok(vegetation_summary(raster, geom, scale, threshold, &ReduceOptions::default())?.high_ratio)
}

/// Area (km²) of `geom` where `raster` exceeds `threshold`.
pub fn vegetated_area_km2(
    raster: &Raster,
    geom: &MultiPolygon<f64>,
    scale: f64,
    threshold: Threshold,
) -> Result<f64> {
    let high = reduce(raster, geom, scale, &ReduceOptions::default(), |v| {
        Some(above(v, threshold))
    })?;
    Ok(high.sum() / 1e6)
}

/// Ratio and area from one reduction pass.
pub fn vegetation_summary(
    raster: &Raster,
    geom: &MultiPolygon<f64>,
    scale: f64,
    threshold: Threshold,
    opts: &ReduceOptions,
) -> Result<VegetationSummary> {
    let total = geometry_area(geom, raster.grid().crs);
    if !(total.is_finite() && total > 0.) {
        return Err(Error::DegenerateGeometry(format!("area {} m²", total)));
    }
    let high = reduce(raster, geom, scale, opts, |v| Some(above(v, threshold)))?.sum();
    debug!(high_m2 = high, total_m2 = total, "vegetation summary");
    Ok(VegetationSummary {
        high_ratio: high / total * 100.,
        vegetated_km2: high / 1e6,
    })
}

/// Area weighted mean and standard deviation of `raster` over
/// `geom`.
pub fn zonal_stats(
    raster: &Raster,
    geom: &MultiPolygon<f64>,
    scale: f64,
    opts: &ReduceOptions,
) -> Result<PixelStats> {
    reduce(raster, geom, scale, opts, Some)
}

/// Mean and standard deviation of `raster` over one region.
pub fn region_stats(
    raster: &Raster,
    region: &Region,
    scale: f64,
    opts: &ReduceOptions,
) -> Result<RegionStats> {
    let stats = zonal_stats(raster, &region.geometry, scale, opts)?;
    Ok(RegionStats {
        name: region.name.clone(),
        mean: stats.mean(),
        std_dev: stats.std_deviation(),
        pixels: stats.count(),
    })
}

/// [`region_stats`] of every region of `boundaries`, in
/// boundary order.
pub fn region_statistics(
    raster: &Raster,
    boundaries: &Boundaries,
    scale: f64,
    opts: &ReduceOptions,
) -> Result<Vec<RegionStats>> {
    boundaries
        .regions()
        .iter()
        .map(|region| region_stats(raster, region, scale, opts))
        .collect()
}

#[inline]
fn above(v: f64, threshold: Threshold) -> f64 {
    if v > threshold.value() {
        1.
    } else {
        0.
    }
}

/// Sampling stride for reducing `raster` at `scale`.
fn stride_for(raster: &Raster, scale: f64) -> usize {
    let grid = raster.grid();
    if grid.width == 0 || grid.height == 0 {
        return 1;
    }
    let gsd = grid.cell_area(grid.height / 2, 0).sqrt();
    if !(gsd > 0. && scale.is_finite()) {
        return 1;
    }
    ((scale / gsd).round() as usize).max(1)
}

/// Accumulate `f(value)` weighted by pixel area over the
/// pixels of `raster` inside `geom`. Pixels that are NaN, or
/// for which `f` yields `None`, are skipped.
fn reduce<F>(
    raster: &Raster,
    geom: &MultiPolygon<f64>,
    scale: f64,
    opts: &ReduceOptions,
    f: F,
) -> Result<PixelStats>
where
    F: Fn(f64) -> Option<f64> + Sync,
{
    let grid = raster.grid();
    let footprint = grid.footprint(geom)?;
    let (rows, cols) = (footprint.rows(), footprint.cols());

    let mut stride = stride_for(raster, scale);
    let samples = |s: usize| (((rows.len() + s - 1) / s) * ((cols.len() + s - 1) / s)) as f64;
    if samples(stride) > opts.max_pixels {
        if !opts.best_effort {
            return Err(Error::TooManyPixels {
                needed: samples(stride),
                max: opts.max_pixels,
            });
        }
        let full = (rows.len() * cols.len()) as f64;
        stride = stride.max((full / opts.max_pixels).sqrt().ceil() as usize);
        let widest = rows.len().max(cols.len()).max(1);
        while samples(stride) > opts.max_pixels && stride < widest {
            stride += 1;
        }
        warn!(stride, "too many pixels; coarsening the sampling");
    }

    let chunks = ChunkConfig::with_dims(grid.width, grid.height)
        .with_min_data_size(0x10000)
        .with_tile_scale(opts.tile_scale)
        .with_start(rows.start)
        .with_end(rows.end);

    let sampler = Sampler {
        raster,
        footprint: &footprint,
        rows: rows.clone(),
        cols,
        stride,
        f: &f,
    };

    #[cfg(feature = "use-rayon")]
    let stats = {
        use rayon::prelude::*;
        chunks
            .par_iter()
            .map(|(_, start, len)| sampler.chunk(start, len))
            .reduce(PixelStats::default, |mut acc, other| {
                acc += other;
                acc
            })
    };

    #[cfg(not(feature = "use-rayon"))]
    let stats = chunks
        .iter()
        .map(|(_, start, len)| sampler.chunk(start, len))
        .fold(PixelStats::default(), |mut acc, other| {
            acc += other;
            acc
        });

    debug!(stride, pixels = stats.count(), "reduced");
    Ok(stats)
}

/// Visits the sampled pixels of a footprint, one chunk of rows
/// at a time.
struct Sampler<'a, F> {
    raster: &'a Raster,
    footprint: &'a Footprint,
    rows: std::ops::Range<usize>,
    cols: std::ops::Range<usize>,
    stride: usize,
    f: &'a F,
}

impl<'a, F> Sampler<'a, F>
where
    F: Fn(f64) -> Option<f64>,
{
    fn chunk(&self, start: usize, len: usize) -> PixelStats {
        let grid = self.raster.grid();
        let stride = self.stride;
        let mut stats = PixelStats::default();
        for i in (start..start + len).filter(|i| (i - self.rows.start) % stride == 0) {
            // area of one column of the block
            let block_rows = i..(i + stride).min(self.rows.end);
            let column_area: f64 = block_rows.map(|r| grid.cell_area(r, 0)).sum();
            for j in self.cols.clone().step_by(stride) {
                let val = self.raster.get(i, j);
                if val.is_nan() || !self.footprint.contains(i, j) {
                    continue;
                }
                let block_cols = (j + stride).min(self.cols.end) - j;
                if let Some(v) = (self.f)(val) {
                    stats += (v, column_area * block_cols as f64);
                }
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Crs, Grid};
    use approx::assert_relative_eq;
    use geo::polygon;
    use ndarray::Array2;

    /// 1 km × 1 km in 10 m pixels; the top-left 500 m × 500 m
    /// quarter is vegetated.
    fn quarter_green() -> (Raster, MultiPolygon<f64>) {
        let grid = Grid::new([0., 10., 0., 1000., 0., -10.], Crs::Projected, 100, 100);
        let data = Array2::from_shape_fn((100, 100), |(i, j)| {
            if i < 50 && j < 50 {
                0.6
            } else {
                0.05
            }
        });
        let geom = polygon![
            (x: 0., y: 0.),
            (x: 1000., y: 0.),
            (x: 1000., y: 1000.),
            (x: 0., y: 1000.),
        ]
        .into();
        (Raster::new(grid, data).unwrap(), geom)
    }

    fn gradient() -> (Raster, MultiPolygon<f64>) {
        let grid = Grid::new([0., 10., 0., 100., 0., -10.], Crs::Projected, 10, 10);
        let data = Array2::from_shape_fn((10, 10), |(i, j)| (i * 10 + j) as f64 / 100.);
        let geom = polygon![
            (x: 0., y: 0.),
            (x: 100., y: 0.),
            (x: 100., y: 100.),
            (x: 0., y: 100.),
        ]
        .into();
        (Raster::new(grid, data).unwrap(), geom)
    }

    #[test]
    fn threshold_range_is_checked() {
        assert!(Threshold::new(0.).is_ok());
        assert!(Threshold::new(1.).is_ok());
        assert!(matches!(Threshold::new(1.5), Err(Error::InvalidThreshold(_))));
        assert!(Threshold::new(-0.1).is_err());
        assert_eq!(Threshold::default().value(), 0.1);
    }

    #[test]
    fn quarter_of_the_area_is_25_percent() {
        let (raster, geom) = quarter_green();
        let t = Threshold::default();
        assert_relative_eq!(high_vegetation_ratio(&raster, &geom, 10., t).unwrap(), 25.0);
        assert_relative_eq!(vegetated_area_km2(&raster, &geom, 10., t).unwrap(), 0.25);
    }

    #[test]
    fn coarse_scale_samples_with_stride() {
        let (raster, geom) = quarter_green();
        let ratio = high_vegetation_ratio(&raster, &geom, 50., Threshold::default()).unwrap();
        assert_relative_eq!(ratio, 25.0);
    }

    #[test]
    fn partial_blocks_are_not_counted_whole() {
        let grid = Grid::new([0., 10., 0., 1000., 0., -10.], Crs::Projected, 100, 100);
        let raster = Raster::new(grid, Array2::from_elem((100, 100), 0.9)).unwrap();
        let (_, geom) = quarter_green();
        let t = Threshold::default();
        for scale in [10., 30., 70., 130.] {
            let ratio = high_vegetation_ratio(&raster, &geom, scale, t).unwrap();
            let km2 = vegetated_area_km2(&raster, &geom, scale, t).unwrap();
            assert_relative_eq!(ratio, 100., max_relative = 1e-9);
            assert_relative_eq!(km2, 1., max_relative = 1e-9);
        }

        let coarse = ReduceOptions {
            max_pixels: 49.,
            ..Default::default()
        };
        let summary = vegetation_summary(&raster, &geom, 10., t, &coarse).unwrap();
        assert!(summary.high_ratio <= 100. + 1e-9);
        assert_relative_eq!(summary.vegetated_km2, 1., max_relative = 1e-9);
    }

    #[test]
    fn ratio_grows_as_threshold_falls() {
        let (raster, geom) = gradient();
        let mut last = -1.;
        for t in [1., 0.8, 0.5, 0.3, 0.1, 0.] {
            let threshold = Threshold::new(t).unwrap();
            let ratio = high_vegetation_ratio(&raster, &geom, 10., threshold).unwrap();
            assert!(ratio >= last, "{} < {} at {}", ratio, last, t);
            last = ratio;
        }
    }

    #[test]
    fn zero_threshold_area_bounds_the_others() {
        let (raster, geom) = gradient();
        let zero = vegetated_area_km2(&raster, &geom, 10., Threshold::new(0.).unwrap()).unwrap();
        for t in [0.05, 0.4, 0.99] {
            let area = vegetated_area_km2(&raster, &geom, 10., Threshold::new(t).unwrap()).unwrap();
            assert!(zero >= area);
        }
    }

    #[test]
    fn masked_pixels_are_not_vegetated() {
        let (raster, geom) = quarter_green();
        let masked = raster.map(|_| f64::NAN);
        assert_eq!(high_vegetation_ratio(&masked, &geom, 10., Threshold::default()).unwrap(), 0.);
    }

    #[test]
    fn degenerate_geometry_is_an_error() {
        let (raster, _) = quarter_green();
        let line: MultiPolygon<f64> = polygon![
            (x: 0., y: 0.),
            (x: 100., y: 0.),
            (x: 200., y: 0.),
        ]
        .into();
        assert!(matches!(
            high_vegetation_ratio(&raster, &line, 10., Threshold::default()),
            Err(Error::DegenerateGeometry(_))
        ));
    }

    #[test]
    fn pixel_budget_without_best_effort() {
        let (raster, geom) = quarter_green();
        let strict = ReduceOptions {
            max_pixels: 100.,
            best_effort: false,
            ..Default::default()
        };
        assert!(matches!(
            vegetation_summary(&raster, &geom, 10., Threshold::default(), &strict),
            Err(Error::TooManyPixels { .. })
        ));

        let relaxed = ReduceOptions {
            max_pixels: 100.,
            ..Default::default()
        };
        let summary =
            vegetation_summary(&raster, &geom, 10., Threshold::default(), &relaxed).unwrap();
        assert_relative_eq!(summary.high_ratio, 25.0);
    }

    #[test]
    fn zonal_mean_and_deviation() {
        let grid = Grid::new([0., 1., 0., 2., 0., -1.], Crs::Projected, 2, 2);
        let raster = Raster::new(grid, ndarray::array![[0.2, 0.4], [f64::NAN, 0.6]]).unwrap();
        let geom = polygon![
            (x: 0., y: 0.),
            (x: 2., y: 0.),
            (x: 2., y: 2.),
            (x: 0., y: 2.),
        ]
        .into();
        let stats = zonal_stats(&raster, &geom, 1., &Default::default()).unwrap();
        assert_eq!(stats.count(), 3);
        assert_relative_eq!(stats.mean().unwrap(), 0.4);
    }
}
