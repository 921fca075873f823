//! Raster grids: pixel ↔ world transforms, cell areas, and
//! projecting vector boundaries onto pixel space.
//!
//! Pixel coordinates follow the GDAL convention: `(x, y)` is
//! `(column, row)` and the pixel `(j, i)` covers
//! `[j, j + 1) × [i, i + 1)`. A pixel belongs to a geometry
//! iff its center `(j + 0.5, i + 0.5)` does.

use geo::{
    BoundingRect, ChamberlainDuquetteArea, Contains, Coord, MapCoords, MultiPolygon, Point, Rect,
};
use nalgebra::{Matrix3, Point2};
use serde_derive::{Deserialize, Serialize};

use crate::{Error, Result};

/// `(width, height)` of a raster, or of a window in it.
pub type RasterDims = (usize, usize);
/// `(x, y)` offset of a window.
pub type RasterOffset = (isize, isize);
pub type RasterWindow = (RasterOffset, RasterDims);

/// Affine transform in homogeneous coordinates.
pub type PixelTransform = Matrix3<f64>;

/// Radius used for cell areas of geographic grids. Equal to
/// the radius `geo` uses for its Chamberlain-Duquette area, so
/// a grid fully covering a polygon sums to the polygon area.
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Build the pixel → world transform from a GDAL style
/// 6-element geo transform.
pub fn transform_from_gdal(t: &[f64; 6]) -> PixelTransform {
    Matrix3::new(t[1], t[2], t[0], t[4], t[5], t[3], 0., 0., 1.)
}

/// Coordinate reference of a grid, as far as area
/// computations are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Crs {
    /// Longitude / latitude in degrees.
    Geographic,
    /// Planar coordinates in meters.
    Projected,
}

impl Default for Crs {
    fn default() -> Self {
        Crs::Geographic
    }
}

/// Area of a boundary in square meters, consistent with
/// [`Grid::cell_area`].
pub fn geometry_area(geom: &MultiPolygon<f64>, crs: Crs) -> f64 {
    match crs {
        Crs::Geographic => geom.chamberlain_duquette_unsigned_area(),
        Crs::Projected => {
            use geo::Area;
            geom.unsigned_area()
        }
    }
}

/// Location and shape of a raster on the ground.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    pub transform: [f64; 6],
    #[serde(default)]
    pub crs: Crs,
    pub width: usize,
    pub height: usize,
}

impl Grid {
    pub fn new(transform: [f64; 6], crs: Crs, width: usize, height: usize) -> Self {
        Grid {
            transform,
            crs,
            width,
            height,
        }
    }

    #[inline]
    pub fn dims(&self) -> RasterDims {
        (self.width, self.height)
    }

    /// Shape of an `ndarray` holding this grid: `(rows, cols)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn pixel_transform(&self) -> PixelTransform {
        transform_from_gdal(&self.transform)
    }

    /// World coordinates of the center of pixel `(row, col)`.
    pub fn pixel_center(&self, row: usize, col: usize) -> Coord<f64> {
        let t = &self.transform;
        let x = col as f64 + 0.5;
        let y = row as f64 + 0.5;
        Coord {
            x: t[0] + x * t[1] + y * t[2],
            y: t[3] + x * t[4] + y * t[5],
        }
    }

    /// Ground area of pixel `(row, col)` in square meters.
    ///
    /// Geographic cells use the exact spherical area of a
    /// lon/lat rectangle; rotated geographic grids fall back to
    /// scaling by the cosine of the center latitude.
    pub fn cell_area(&self, row: usize, _col: usize) -> f64 {
        let t = &self.transform;
        let det = (t[1] * t[5] - t[2] * t[4]).abs();
        match self.crs {
            Crs::Projected => det,
            Crs::Geographic if t[2] == 0. && t[4] == 0. => {
                let top = (t[3] + row as f64 * t[5]).to_radians();
                let bottom = (t[3] + (row + 1) as f64 * t[5]).to_radians();
                let dlon = t[1].abs().to_radians();
                EARTH_RADIUS_M * EARTH_RADIUS_M * dlon * (top.sin() - bottom.sin()).abs()
            }
            Crs::Geographic => {
                let lat = self.pixel_center(row, 0).y.to_radians();
                let r = EARTH_RADIUS_M.to_radians();
                det * r * r * lat.cos()
            }
        }
    }

    /// Project a world-space boundary onto this grid's pixel
    /// space.
    pub fn footprint(&self, geom: &MultiPolygon<f64>) -> Result<Footprint> {
        let inv = self
            .pixel_transform()
            .try_inverse()
            .ok_or(Error::SingularTransform)?;
        let poly = geom.map_coords(move |c: Coord<f64>| {
            let pt = inv.transform_point(&Point2::new(c.x, c.y));
            Coord { x: pt.x, y: pt.y }
        });
        let window = poly
            .bounding_rect()
            .map(|r| r.window_from_bounds(self.dims()))
            .unwrap_or(((0, 0), (0, 0)));
        Ok(Footprint { poly, window })
    }
}

/// A boundary in pixel coordinates of some grid, with the
/// window of pixels that may intersect it.
#[derive(Debug, Clone)]
pub struct Footprint {
    poly: MultiPolygon<f64>,
    window: RasterWindow,
}

impl Footprint {
    pub fn window(&self) -> RasterWindow {
        self.window
    }

    /// Rows of the grid that may hold pixels inside.
    pub fn rows(&self) -> std::ops::Range<usize> {
        let ((_, y), (_, h)) = self.window;
        y as usize..y as usize + h
    }

    /// Columns of the grid that may hold pixels inside.
    pub fn cols(&self) -> std::ops::Range<usize> {
        let ((x, _), (w, _)) = self.window;
        x as usize..x as usize + w
    }

    #[inline]
    pub fn contains(&self, row: usize, col: usize) -> bool {
        self.poly
            .contains(&Point::new(col as f64 + 0.5, row as f64 + 0.5))
    }
}

/// Convert pixel-space bounds into a window clamped to a
/// raster.
pub trait BoundsExt {
    fn window_from_bounds(&self, dim: RasterDims) -> RasterWindow;
}

impl BoundsExt for Rect<f64> {
    fn window_from_bounds(&self, dim: RasterDims) -> RasterWindow {
        let clamp = |v: f64, max: usize| (v.max(0.) as usize).min(max);
        let x0 = clamp(self.min().x.floor(), dim.0);
        let y0 = clamp(self.min().y.floor(), dim.1);
        let x1 = clamp(self.max().x.ceil(), dim.0);
        let y1 = clamp(self.max().y.ceil(), dim.1);
        ((x0 as isize, y0 as isize), (x1 - x0, y1 - y0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::polygon;

    fn degree_grid() -> Grid {
        // 1° cells, north-up, top-left at (40E, 25N)
        Grid::new([40., 1., 0., 25., 0., -1.], Crs::Geographic, 4, 4)
    }

    #[test]
    fn pixel_center_follows_transform() {
        let grid = degree_grid();
        let c = grid.pixel_center(0, 0);
        assert_relative_eq!(c.x, 40.5);
        assert_relative_eq!(c.y, 24.5);
        let c = grid.pixel_center(3, 2);
        assert_relative_eq!(c.x, 42.5);
        assert_relative_eq!(c.y, 21.5);
    }

    #[test]
    fn geographic_cells_match_polygon_area() {
        let grid = degree_grid();
        let cells: f64 = (0..4)
            .flat_map(|i| (0..4).map(move |j| (i, j)))
            .map(|(i, j)| grid.cell_area(i, j))
            .sum();
        let square: MultiPolygon<f64> = polygon![
            (x: 40., y: 21.),
            (x: 44., y: 21.),
            (x: 44., y: 25.),
            (x: 40., y: 25.),
        ]
        .into();
        assert_relative_eq!(cells, geometry_area(&square, Crs::Geographic), max_relative = 1e-2);
    }

    #[test]
    fn cells_shrink_toward_the_pole() {
        let grid = Grid::new([40., 1., 0., 80., 0., -1.], Crs::Geographic, 1, 80);
        assert!(grid.cell_area(0, 0) < grid.cell_area(79, 0));
    }

    #[test]
    fn projected_cells_use_determinant() {
        let grid = Grid::new([0., 10., 0., 100., 0., -10.], Crs::Projected, 10, 10);
        assert_relative_eq!(grid.cell_area(3, 7), 100.);
    }

    #[test]
    fn footprint_selects_pixel_centers() {
        let grid = Grid::new([0., 1., 0., 4., 0., -1.], Crs::Projected, 4, 4);
        // Left half of the grid in world coordinates
        let half: MultiPolygon<f64> = polygon![
            (x: 0., y: 0.),
            (x: 2., y: 0.),
            (x: 2., y: 4.),
            (x: 0., y: 4.),
        ]
        .into();
        let fp = grid.footprint(&half).unwrap();
        assert_eq!(fp.cols(), 0..2);
        assert_eq!(fp.rows(), 0..4);
        assert!(fp.contains(0, 0));
        assert!(fp.contains(3, 1));
        assert!(!fp.contains(0, 2));
    }
}
