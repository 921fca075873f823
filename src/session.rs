//! The filter context of one analysis, and the report computed
//! from it.
//!
//! A [`SessionContext`] holds every input of a report. It is
//! `Eq + Hash`, and [`report`] is a pure function of it (and of
//! the backend's contents), so callers may memoize reports by
//! context.

use serde_derive::{Deserialize, Serialize};
use tracing::info;

use crate::backend::Backend;
use crate::boundary::{Boundaries, Selection};
use crate::composite::composite;
use crate::series::{time_series, TimeSeries};
use crate::source::{min_date, Source};
use crate::window::{DateWindow, WindowSpan};
use crate::zonal::{vegetation_summary, ReduceOptions, Threshold};
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionContext {
    pub selection: Selection,
    pub source: Source,
    pub window: DateWindow,
    #[serde(default)]
    pub threshold: Threshold,
}

impl SessionContext {
    pub fn new(selection: Selection, source: Source, window: DateWindow) -> Self {
        SessionContext {
            selection,
            source,
            window,
            threshold: Threshold::default(),
        }
    }

    pub fn with_threshold(mut self, threshold: Threshold) -> Self {
        self.threshold = threshold;
        self
    }

    /// The context with its window clamped to what the backend
    /// holds for the source. A source without observations only
    /// has its window floored at [`min_date`].
    pub fn clamped<B: Backend>(mut self, backend: &B) -> Result<Self> {
        self.window = match backend.availability(self.source.collection())? {
            Some(avail) => self.window.clamp_to(&avail),
            None => DateWindow::new(self.window.start().max(min_date()), self.window.end()),
        };
        Ok(self)
    }
}

/// Every number an analysis displays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    pub area: String,
    pub source: Source,
    pub source_label: &'static str,
    pub window: DateWindow,
    pub span: WindowSpan,
    pub threshold: Threshold,
    /// Scale (m) the statistics were computed at.
    pub scale: f64,
    /// Observations in the composite.
    pub observations: usize,
    /// Percent of the area above the threshold.
    pub high_ratio: f64,
    pub vegetated_km2: f64,
    pub series: TimeSeries,
}

/// Resolve the selection, clamp the window, composite, and
/// reduce.
pub fn report<B: Backend>(
    backend: &B,
    boundaries: &Boundaries,
    ctx: &SessionContext,
) -> Result<DashboardReport> {
    let ctx = ctx.clone().clamped(backend)?;
    let source = ctx.source;
    let geom = boundaries.resolve(&ctx.selection)?;

    let comp = composite(backend, source, &ctx.window, geom)?;
    let summary = vegetation_summary(
        comp.raster(),
        geom,
        comp.scale(),
        ctx.threshold,
        &ReduceOptions::default(),
    )?;
    let series = time_series(backend, source, geom, comp.scale(), &ctx.window)?;

    info!(
        area = ctx.selection.describe(),
        %source,
        high_ratio = summary.high_ratio,
        vegetated_km2 = summary.vegetated_km2,
        "report ready"
    );
    Ok(DashboardReport {
        area: ctx.selection.describe().to_string(),
        source,
        source_label: source.label(),
        window: ctx.window,
        span: ctx.window.span(),
        threshold: ctx.threshold,
        scale: comp.scale(),
        observations: comp.observations(),
        high_ratio: summary.high_ratio,
        vegetated_km2: summary.vegetated_km2,
        series,
    })
}
