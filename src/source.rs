//! The data sources a composite can be built from.
//!
//! Each [`Source`] owns a [`SourceDescriptor`]: the collection it reads,
//! its ground sample distance and revisit cadence, and the
//! [`IndexRule`] that turns one observation into vegetation
//! index values in `[-1, 1]`.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use ndarray::{Array2, Zip};
use serde_derive::{Deserialize, Serialize};

use crate::backend::Observation;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Source {
    Modis,
    Sentinel2,
    Landsat,
}

/// Pixel quality rule applied before computing the index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QualityMask {
    /// Keep pixels where the quality band is zero (no flag set).
    FlagClear { band: &'static str },
    /// Keep pixels where the quality band equals `value`.
    Equals { band: &'static str, value: f64 },
}

impl QualityMask {
    pub fn band(&self) -> &'static str {
        match *self {
            QualityMask::FlagClear { band } | QualityMask::Equals { band, .. } => band,
        }
    }

    #[inline]
    pub fn keeps(&self, quality: f64) -> bool {
        match *self {
            QualityMask::FlagClear { .. } => quality == 0.,
            QualityMask::Equals { value, .. } => quality == value,
        }
    }
}

/// How an observation becomes index values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndexRule {
    /// `(nir - red) / (nir + red)` on masked reflectance bands.
    NormalizedDifference {
        nir: &'static str,
        red: &'static str,
        mask: QualityMask,
    },
    /// A precomputed, integer encoded index band, divided by
    /// `divisor` to map it onto `[-1, 1]`.
    Precomputed { band: &'static str, divisor: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceDescriptor {
    pub source: Source,
    pub label: &'static str,
    pub collection: &'static str,
    /// Ground sample distance in meters.
    pub scale: f64,
    /// Nominal revisit cadence in days.
    pub cadence_days: i64,
    /// Length in days of the short composites compared by the
    /// change detector.
    pub change_days: i64,
    pub rule: IndexRule,
}

const SOURCES: [SourceDescriptor; 3] = [
    SourceDescriptor {
        source: Source::Modis,
        label: "MODIS (500 m / 16 day)",
        collection: "MODIS/061/MOD13A2",
        scale: 500.,
        cadence_days: 16,
        change_days: 16,
        rule: IndexRule::Precomputed {
            band: "NDVI",
            divisor: 10000.,
        },
    },
    SourceDescriptor {
        source: Source::Sentinel2,
        label: "Sentinel-2 (10 m / 5 day)",
        collection: "COPERNICUS/S2_SR_HARMONIZED",
        scale: 10.,
        cadence_days: 5,
        change_days: 5,
        rule: IndexRule::NormalizedDifference {
            nir: "B8",
            red: "B4",
            mask: QualityMask::FlagClear { band: "QA60" },
        },
    },
    SourceDescriptor {
        source: Source::Landsat,
        label: "Landsat 8-9 (30 m / 16 day)",
        collection: "LANDSAT/LC08/C02/T1_L2",
        scale: 30.,
        cadence_days: 16,
        change_days: 5,
        rule: IndexRule::NormalizedDifference {
            nir: "SR_B5",
            red: "SR_B4",
            mask: QualityMask::Equals {
                band: "pixel_qa",
                value: 0.,
            },
        },
    },
];

impl Source {
    pub const ALL: [Source; 3] = [Source::Modis, Source::Sentinel2, Source::Landsat];

    pub fn descriptor(self) -> &'static SourceDescriptor {
        match self {
            Source::Modis => &SOURCES[0],
            Source::Sentinel2 => &SOURCES[1],
            Source::Landsat => &SOURCES[2],
        }
    }

    #[inline]
    pub fn label(self) -> &'static str {
        self.descriptor().label
    }

    #[inline]
    pub fn collection(self) -> &'static str {
        self.descriptor().collection
    }

    #[inline]
    pub fn scale(self) -> f64 {
        self.descriptor().scale
    }

    /// Length of the short composite window used for change
    /// detection.
    pub fn change_window(self) -> chrono::Duration {
        chrono::Duration::days(self.descriptor().change_days)
    }

    /// Index values of one observation, NaN where the quality
    /// mask rejects a pixel, a band has no data, or the
    /// normalized difference is undefined.
    pub fn index_of(self, obs: &Observation) -> Result<Array2<f64>> {
        match self.descriptor().rule {
            IndexRule::Precomputed { band, divisor } => Ok(obs.band(band)?.mapv(|v| v / divisor)),
            IndexRule::NormalizedDifference { nir, red, mask } => {
                let nir = obs.band(nir)?;
                let red = obs.band(red)?;
                let quality = obs.band(mask.band())?;
                let mut out = Array2::from_elem(nir.dim(), f64::NAN);
                Zip::from(&mut out)
                    .and(nir)
                    .and(red)
                    .and(quality)
                    .for_each(|out, &n, &r, &q| {
                        if mask.keeps(q) {
                            *out = normalized_difference(n, r);
                        }
                    });
                Ok(out)
            }
        }
    }
}

/// `(a - b) / (a + b)`, NaN when the sum vanishes.
#[inline]
pub fn normalized_difference(a: f64, b: f64) -> f64 {
    let sum = a + b;
    if sum == 0. {
        f64::NAN
    } else {
        (a - b) / sum
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Parses a label, a collection identifier, or a short name
/// (`modis`, `sentinel-2`, `landsat`).
impl FromStr for Source {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let short = s.trim().to_ascii_lowercase();
        Source::ALL
            .iter()
            .copied()
            .find(|src| {
                let desc = src.descriptor();
                desc.label == s || desc.collection == s
            })
            .or_else(|| match short.as_str() {
                "modis" => Some(Source::Modis),
                "sentinel2" | "sentinel-2" | "s2" => Some(Source::Sentinel2),
                "landsat" | "landsat8" | "landsat-8" => Some(Source::Landsat),
                _ => None,
            })
            .ok_or_else(|| Error::UnknownSource(s.to_string()))
    }
}

/// First day any composite may start at, whatever the source
/// holds.
pub fn min_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or(NaiveDate::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Crs, Grid};
    use ndarray::array;

    fn observation(bands: Vec<(&str, Array2<f64>)>) -> Observation {
        let grid = Grid::new([0., 1., 0., 2., 0., -1.], Crs::Projected, 2, 2);
        let date = NaiveDate::from_ymd_opt(2023, 3, 1).unwrap();
        let mut obs = Observation::new("test", date, grid);
        for (name, data) in bands {
            obs = obs.with_band(name, data).unwrap();
        }
        obs
    }

    #[test]
    fn modis_rescales_raw_values() {
        let obs = observation(vec![("NDVI", array![[5000., 10000.], [-2000., 0.]])]);
        let ndvi = Source::Modis.index_of(&obs).unwrap();
        assert_eq!(ndvi[(0, 0)], 0.5);
        assert_eq!(ndvi[(0, 1)], 1.);
        assert_eq!(ndvi[(1, 0)], -0.2);
    }

    #[test]
    fn sentinel_masks_cloud_flags() {
        let obs = observation(vec![
            ("B8", array![[3., 3.], [1., 0.]]),
            ("B4", array![[1., 1.], [1., 0.]]),
            ("QA60", array![[0., 1024.], [0., 0.]]),
        ]);
        let ndvi = Source::Sentinel2.index_of(&obs).unwrap();
        assert_eq!(ndvi[(0, 0)], 0.5);
        assert!(ndvi[(0, 1)].is_nan());
        assert_eq!(ndvi[(1, 0)], 0.);
        // zero denominator
        assert!(ndvi[(1, 1)].is_nan());
    }

    #[test]
    fn landsat_keeps_quality_equal_to_zero() {
        let obs = observation(vec![
            ("SR_B5", array![[4., 4.], [4., 4.]]),
            ("SR_B4", array![[2., 2.], [2., 2.]]),
            ("pixel_qa", array![[0., 2.], [0., 0.]]),
        ]);
        let ndvi = Source::Landsat.index_of(&obs).unwrap();
        assert_eq!(ndvi.iter().filter(|v| v.is_nan()).count(), 1);
        assert!((ndvi[(0, 0)] - 1. / 3.).abs() < 1e-12);
    }

    #[test]
    fn missing_band_is_reported() {
        let obs = observation(vec![("B8", Array2::zeros((2, 2)))]);
        assert!(matches!(
            Source::Sentinel2.index_of(&obs),
            Err(Error::MissingBand { .. })
        ));
    }

    #[test]
    fn parses_labels_and_ids() {
        assert_eq!("MODIS/061/MOD13A2".parse::<Source>().unwrap(), Source::Modis);
        assert_eq!(
            "Sentinel-2 (10 m / 5 day)".parse::<Source>().unwrap(),
            Source::Sentinel2
        );
        assert_eq!("landsat".parse::<Source>().unwrap(), Source::Landsat);
        assert!("spot".parse::<Source>().is_err());
    }

    #[test]
    fn only_modis_compares_16_day_windows() {
        assert_eq!(Source::Modis.change_window().num_days(), 16);
        assert_eq!(Source::Sentinel2.change_window().num_days(), 5);
        assert_eq!(Source::Landsat.change_window().num_days(), 5);
        assert_eq!(Source::Landsat.descriptor().cadence_days, 16);
    }
}
