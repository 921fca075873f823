//! Per-observation time series of the zonal mean index.

use chrono::NaiveDate;
use geo::MultiPolygon;
use serde_derive::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::backend::Backend;
use crate::raster::Raster;
use crate::source::Source;
use crate::window::DateWindow;
use crate::zonal::{zonal_stats, ReduceOptions, Threshold};
use crate::Result;

/// The zonal mean of one observation. `mean_index` is `None`
/// when every pixel inside the boundary was masked.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesRecord {
    #[serde(with = "iso_date")]
    pub date: NaiveDate,
    pub mean_index: Option<f64>,
}

/// Records in capture order, one per observation. Several
/// observations on one day give several records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    records: Vec<SeriesRecord>,
}

impl TimeSeries {
    pub fn new(records: Vec<SeriesRecord>) -> Self {
        TimeSeries { records }
    }

    pub fn records(&self) -> &[SeriesRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records whose mean exceeds `threshold`; records without a
    /// value are dropped.
    pub fn above_threshold(&self, threshold: Threshold) -> TimeSeries {
        self.filter(|r| r.mean_index.map_or(false, |v| v > threshold.value()))
    }

    /// Records captured within `window`.
    pub fn within(&self, window: &DateWindow) -> TimeSeries {
        self.filter(|r| window.contains(r.date))
    }

    fn filter<F: Fn(&SeriesRecord) -> bool>(&self, keep: F) -> TimeSeries {
        TimeSeries {
            records: self.records.iter().copied().filter(|r| keep(r)).collect(),
        }
    }
}

impl<'a> IntoIterator for &'a TimeSeries {
    type Item = &'a SeriesRecord;
    type IntoIter = std::slice::Iter<'a, SeriesRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// The area weighted mean index over `geom`, at `scale`, of
/// every observation of `source` in `window`.
pub fn time_series<B: Backend>(
    backend: &B,
    source: Source,
    geom: &MultiPolygon<f64>,
    scale: f64,
    window: &DateWindow,
) -> Result<TimeSeries> {
    let opts = ReduceOptions::default();
    let observations = backend.observations(source.collection(), geom, window)?;
    let records = observations
        .iter()
        .map(|obs| {
            let raster = Raster::new(obs.grid().clone(), source.index_of(obs)?)?;
            let mean_index = zonal_stats(&raster, geom, scale, &opts)?.mean();
            debug!(id = obs.id(), date = %obs.date(), ?mean_index, "series record");
            Ok(SeriesRecord {
                date: obs.date(),
                mean_index,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    info!(%source, records = records.len(), "time series ready");
    Ok(TimeSeries { records })
}

/// Dates as `YYYY-MM-DD`.
mod iso_date {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S: Serializer>(date: &NaiveDate, ser: S) -> Result<S::Ok, S::Error> {
        ser.collect_str(&date.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<NaiveDate, D::Error> {
        let s = String::deserialize(de)?;
        NaiveDate::parse_from_str(&s, FORMAT).map_err(de::Error::custom)
    }
}
