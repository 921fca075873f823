//! Align a pair of grids by their geo. transform.
//!
//! Observations of one collection usually share a grid, but
//! nothing guarantees it. Compositing picks a reference grid and
//! looks up, for every reference pixel `(i, j)`, the unique pixel
//! `(k, l)` of the other grid that contains the center of
//! `(i, j)`.

use nalgebra::Point2;
use ndarray::Array2;

use crate::geometry::{Grid, PixelTransform, RasterDims};
use crate::{Error, Result};

/// Compute affine transform to transfer from pixel
/// coordinates of the first grid to the second grid.
pub fn transform_between(grid_1: &Grid, grid_2: &Grid) -> Result<PixelTransform> {
    let transform_1 = grid_1.pixel_transform();
    let transform_2 = grid_2.pixel_transform();

    transform_2
        .try_inverse()
        .ok_or(Error::SingularTransform)
        .map(|inv| inv * transform_1)
}

/// Converts a pixel transform into a function that maps
/// `(row, col)` indices of the source onto indices of the
/// target if it falls within the given dimension (`dim`), and
/// otherwise `None`. Indices are mapped through the pixel
/// center.
pub fn index_transformer(
    transform: PixelTransform,
    dim: RasterDims,
) -> impl Fn((usize, usize)) -> Option<(usize, usize)> {
    let (cols, rows) = dim;

    move |(i, j)| {
        let pt = transform.transform_point(&Point2::new(j as f64 + 0.5, i as f64 + 0.5));

        if pt.x < 0. || pt.y < 0. {
            return None;
        }
        let j_2 = pt.x.floor() as usize;
        let i_2 = pt.y.floor() as usize;

        if j_2 >= cols || i_2 >= rows {
            None
        } else {
            Some((i_2, j_2))
        }
    }
}

/// Resample `data` (laid out on `from`) onto the grid `onto`
/// by nearest pixel-center lookup. Pixels of `onto` not covered
/// by `from` are NaN.
pub fn align_to(data: &Array2<f64>, from: &Grid, onto: &Grid) -> Result<Array2<f64>> {
    if from == onto {
        return Ok(data.clone());
    }
    let lookup = index_transformer(transform_between(onto, from)?, from.dims());
    Ok(Array2::from_shape_fn(onto.shape(), |idx| {
        lookup(idx).map(|src| data[src]).unwrap_or(f64::NAN)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Crs;
    use ndarray::array;

    #[test]
    fn identical_grids_copy() {
        let grid = Grid::new([0., 1., 0., 2., 0., -1.], Crs::Projected, 2, 2);
        let data = array![[1., 2.], [3., 4.]];
        assert_eq!(align_to(&data, &grid, &grid).unwrap(), data);
    }

    #[test]
    fn shifted_grid_looks_up_centers() {
        // `from` starts one column further east than `onto`
        let onto = Grid::new([0., 1., 0., 2., 0., -1.], Crs::Projected, 3, 2);
        let from = Grid::new([1., 1., 0., 2., 0., -1.], Crs::Projected, 2, 2);
        let data = array![[1., 2.], [3., 4.]];
        let out = align_to(&data, &from, &onto).unwrap();

        assert!(out[(0, 0)].is_nan());
        assert_eq!(out[(0, 1)], 1.);
        assert_eq!(out[(0, 2)], 2.);
        assert_eq!(out[(1, 2)], 4.);
    }

    #[test]
    fn coarser_grid_covers_several_pixels() {
        let onto = Grid::new([0., 1., 0., 2., 0., -1.], Crs::Projected, 2, 2);
        let from = Grid::new([0., 2., 0., 2., 0., -2.], Crs::Projected, 1, 1);
        let data = array![[7.]];
        let out = align_to(&data, &from, &onto).unwrap();
        assert!(out.iter().all(|&v| v == 7.));
    }
}
