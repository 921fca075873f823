//! Split rasters into row chunks for reductions.
//!
//! Zonal reductions visit every pixel of a (possibly large)
//! grid. This module splits the rows of a grid into chunks
//! that can be reduced independently (and, with the
//! "use-rayon" feature, in parallel) and merged afterwards.
//!
//! # Chunk Size
//!
//! Each chunk spans the full width of the raster. The number
//! of rows is derived from a minimum number of pixels per
//! chunk (see [`with_min_data_size`]), then divided by the
//! _tile scale_: a larger tile scale yields more, smaller
//! chunks, trading per-chunk overhead for a smaller working
//! set.
//!
//! [`with_min_data_size`]: ChunkConfig::with_min_data_size

/// Builder to configure chunking. Supports configuring the
/// following paramaters.
///
/// - `width`, `height` - the dimensions of the raster.
///
/// - `data_height` - the number of rows in each chunk (the
/// last chunk may be shorter).
///
/// - `tile_scale` - divisor applied to `data_height`.
///
/// - `start`,`end` - the semi-open range (i.e. `start..end`
/// in the usual notation) of rows to process.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ChunkConfig {
    width: usize,
    height: usize,

    data_height: usize,
    tile_scale: usize,

    start: usize,
    end: usize,
}

/// The type of item produced by the iterations. Consists
/// of:
///
/// 1. reference to the underlying `ChunkConfig`
/// 1. the first row of this chunk
/// 1. the number of rows in this chunk
pub type ChunkWindow<'a> = (&'a ChunkConfig, usize, usize);

mod builder;
mod iters;

#[cfg(feature = "use-rayon")]
mod par_iters;

#[cfg(test)]
mod tests {
    use super::*;

    fn check_cfg(cfg: ChunkConfig, output: Vec<(usize, usize)>) {
        assert_eq!(
            cfg.into_iter().map(|(_, a, b)| (a, b)).collect::<Vec<_>>(),
            output
        );
    }

    #[test]
    fn test_simple() {
        check_cfg(
            ChunkConfig::with_dims(32, 20).with_min_data_height(8),
            vec![(0, 8), (8, 8), (16, 4)],
        )
    }

    #[test]
    fn tile_scale_shrinks_chunks() {
        check_cfg(
            ChunkConfig::with_dims(32, 20)
                .with_min_data_height(8)
                .with_tile_scale(4),
            vec![
                (0, 2),
                (2, 2),
                (4, 2),
                (6, 2),
                (8, 2),
                (10, 2),
                (12, 2),
                (14, 2),
                (16, 2),
                (18, 2),
            ],
        )
    }

    #[test]
    fn range_restricts_rows() {
        check_cfg(
            ChunkConfig::with_dims(10, 100)
                .with_min_data_height(16)
                .with_start(10)
                .with_end(40),
            vec![(10, 16), (26, 14)],
        )
    }

    #[test]
    fn empty_range_yields_nothing() {
        let cfg = ChunkConfig::with_dims(10, 100).with_start(50).with_end(50);
        assert_eq!(cfg.iter().len(), 0);
    }

    #[test]
    fn min_data_size_rounds_up_rows() {
        let cfg = ChunkConfig::with_dims(1000, 1000).with_min_data_size(0x10000);
        assert_eq!(cfg.data_height(), 66);
    }
}
