//! Vegetation index analytics over administrative boundaries:
//! compositing, zonal statistics, time series and change maps.
//!
//! Raster observations come from a [`Backend`](backend::Backend);
//! [`Catalog`](catalog::Catalog) is a file backed one. Most
//! programs only need the [`prelude`] and [`session::report`].

pub mod align;
pub mod assets;
pub mod backend;
pub mod boundary;
pub mod catalog;
pub mod change;
pub mod chunking;
pub mod composite;
pub mod error;
pub mod export;
pub mod geometry;
pub mod io;
pub mod raster;
pub mod series;
pub mod session;
pub mod source;
pub mod stats;
pub mod window;
pub mod zonal;

#[cfg(feature = "gdal")]
pub mod gdal_io;

pub mod prelude;

pub use error::{Error, Result};
