//! Error type shared by every computation in the crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The resolved boundary has no area, so no ratio can be
    /// expressed against it.
    #[error("geometry `{0}` has zero area; refusing to compute a ratio")]
    DegenerateGeometry(String),

    #[error("unknown data source: {0}")]
    UnknownSource(String),

    #[error("region not found: {0}")]
    RegionNotFound(String),

    #[error("city not found: {0}")]
    CityNotFound(String),

    #[error("threshold {0} outside [0, 1]")]
    InvalidThreshold(f64),

    #[error("observation {id} is missing band `{band}`")]
    MissingBand { id: String, band: String },

    #[error("band dimensions {found:?} don't match grid {expected:?}")]
    DimensionMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },

    /// Reduction would touch more pixels than allowed and
    /// best-effort sampling is disabled.
    #[error("reduction needs {needed} pixels (max: {max})")]
    TooManyPixels { needed: f64, max: f64 },

    #[error("geo transform is not invertible")]
    SingularTransform,

    #[error("backend error: {0}")]
    Backend(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CBOR error: {0}")]
    Cbor(#[from] serde_cbor::Error),

    #[error("array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[cfg(feature = "gdal")]
    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),
}

pub type Result<T> = std::result::Result<T, Error>;
