//! Change detection: the difference of two short composites, one
//! starting at each of two dates.

use chrono::{Duration, NaiveDate};
use geo::MultiPolygon;
use serde_derive::Serialize;
use tracing::info;

use crate::align::align_to;
use crate::backend::Backend;
use crate::composite::{composite, Composite};
use crate::raster::Raster;
use crate::source::Source;
use crate::stats::PixelStats;
use crate::window::DateWindow;
use crate::Result;

/// Index change between two dates. Values are not clamped and
/// may fall outside `[-1, 1]`; use [`Raster::clamped`] where
/// strict bounds are needed.
#[derive(Debug, Clone, Serialize)]
pub struct ChangeMap {
    delta: Raster,
    scale: f64,
    stats: PixelStats,
}

impl ChangeMap {
    #[inline]
    pub fn delta(&self) -> &Raster {
        &self.delta
    }

    pub fn into_delta(self) -> Raster {
        self.delta
    }

    #[inline]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Statistics of the delta over every pixel where both
    /// composites hold a value.
    #[inline]
    pub fn stats(&self) -> &PixelStats {
        &self.stats
    }
}

/// `composite(end) - composite(start)`, each composite spanning
/// the source's change window from its date.
pub fn change_raster<B: Backend>(
    backend: &B,
    source: Source,
    start: NaiveDate,
    end: NaiveDate,
    geom: &MultiPolygon<f64>,
) -> Result<ChangeMap> {
    let days = source.change_window();
    let before = composite(backend, source, &DateWindow::starting_at(start, days), geom)?;
    let after = composite(backend, source, &DateWindow::starting_at(end, days), geom)?;
    let delta = difference(&after, &before)?;

    let mut stats = PixelStats::default();
    for &v in delta.data().iter().filter(|v| !v.is_nan()) {
        stats += v;
    }
    info!(
        %source,
        %start,
        %end,
        pixels = stats.count(),
        mean = ?stats.mean(),
        "change map ready"
    );
    Ok(ChangeMap {
        delta,
        scale: source.scale(),
        stats,
    })
}

/// `after - before` on the grid of `after`. An empty composite on
/// either side gives a delta without values.
fn difference(after: &Composite, before: &Composite) -> Result<Raster> {
    let grid = after.raster().grid();
    if after.is_empty() || before.is_empty() {
        return Ok(Raster::filled(grid.clone(), f64::NAN));
    }
    let before = Raster::new(
        grid.clone(),
        align_to(before.raster().data(), before.raster().grid(), grid)?,
    )?;
    after.raster().zip_with(&before, |a, b| a - b)
}

/// Days covered by each end of a [`period_composites`] pair.
pub const PERIOD_DAYS: i64 = 16;

/// The composites of the first and the last [`PERIOD_DAYS`] of
/// `window`, whatever the source, for a side by side comparison
/// of a period.
pub fn period_composites<B: Backend>(
    backend: &B,
    source: Source,
    window: &DateWindow,
    geom: &MultiPolygon<f64>,
) -> Result<(Composite, Composite)> {
    let days = Duration::days(PERIOD_DAYS);
    let first = DateWindow::starting_at(window.start(), days);
    let last = DateWindow::ending_at(window.end(), days);
    Ok((
        composite(backend, source, &first, geom)?,
        composite(backend, source, &last, geom)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MemoryBackend, Observation};
    use crate::geometry::{Crs, Grid};
    use geo::polygon;
    use ndarray::{array, Array2};

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, m, day).unwrap()
    }

    fn square() -> MultiPolygon<f64> {
        polygon![
            (x: 0., y: 0.),
            (x: 2., y: 0.),
            (x: 2., y: 2.),
            (x: 0., y: 2.),
        ]
        .into()
    }

    fn modis(date: NaiveDate, ndvi: Array2<f64>) -> Observation {
        let grid = Grid::new([0., 1., 0., 2., 0., -1.], Crs::Projected, 2, 2);
        Observation::new(date.to_string(), date, grid)
            .with_band("NDVI", ndvi)
            .unwrap()
    }

    fn backend() -> MemoryBackend {
        let c = Source::Modis.collection();
        MemoryBackend::new()
            .with(c, modis(d(1, 1), array![[1000., 2000.], [3000., f64::NAN]]))
            .with(c, modis(d(1, 17), array![[1000., 2000.], [3000., 4000.]]))
            .with(c, modis(d(6, 10), array![[5000., 1000.], [3000., 4000.]]))
    }

    #[test]
    fn same_date_gives_no_change() {
        let map = change_raster(&backend(), Source::Modis, d(1, 1), d(1, 1), &square()).unwrap();
        assert!(map
            .delta()
            .data()
            .iter()
            .filter(|v| !v.is_nan())
            .all(|v| v.abs() < 1e-12));
        assert_eq!(map.stats().count(), 3);
        assert_eq!(map.scale(), 500.);
    }

    #[test]
    fn delta_is_end_minus_start() {
        let map = change_raster(&backend(), Source::Modis, d(1, 1), d(6, 1), &square()).unwrap();
        let delta = map.delta();
        assert!((delta.get(0, 0) - 0.4).abs() < 1e-12);
        assert!((delta.get(0, 1) + 0.1).abs() < 1e-12);
        assert!(delta.get(1, 1).is_nan());
        assert_eq!(map.stats().count(), 3);
    }

    #[test]
    fn missing_period_gives_an_empty_delta() {
        let map = change_raster(&backend(), Source::Modis, d(1, 1), d(9, 1), &square()).unwrap();
        assert!(map.delta().is_empty());
        assert!(map.stats().is_empty());
    }

    #[test]
    fn period_composites_cover_both_ends() {
        let window = DateWindow::new(d(1, 1), d(6, 20));
        let (first, last) =
            period_composites(&backend(), Source::Modis, &window, &square()).unwrap();
        assert_eq!(first.observations(), 1);
        assert_eq!(last.observations(), 1);
        assert!((last.raster().get(0, 0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn periods_span_16_days_for_every_source() {
        let sentinel = |date: NaiveDate, nir: f64| {
            let grid = Grid::new([0., 1., 0., 2., 0., -1.], Crs::Projected, 2, 2);
            Observation::new(date.to_string(), date, grid)
                .with_band("B8", Array2::from_elem((2, 2), nir))
                .unwrap()
                .with_band("B4", Array2::from_elem((2, 2), 0.1))
                .unwrap()
                .with_band("QA60", Array2::zeros((2, 2)))
                .unwrap()
        };
        let c = Source::Sentinel2.collection();
        let backend = MemoryBackend::new()
            .with(c, sentinel(d(3, 10), 0.3))
            .with(c, sentinel(d(6, 21), 0.5));

        // day 10 of the window, past the 5 day revisit
        let window = DateWindow::new(d(3, 1), d(6, 30));
        let (first, last) =
            period_composites(&backend, Source::Sentinel2, &window, &square()).unwrap();
        assert_eq!(first.observations(), 1);
        assert_eq!(last.observations(), 1);
        assert!((first.raster().get(0, 0) - 0.5).abs() < 1e-12);
        assert!((last.raster().get(0, 0) - 4. / 6.).abs() < 1e-12);
    }
}
