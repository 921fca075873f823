use chrono::NaiveDate;
use greenscope::prelude::*;
use serde_derive::Serialize;

#[derive(Serialize)]
pub struct VegChangeOutput {
    pub area: String,
    pub source: Source,
    /// Days in each composite
    pub window_days: i64,
    pub before: DateWindow,
    pub after: DateWindow,
    pub scale: f64,
    /// Ground area of one delta pixel (m²)
    pub pix_area: f64,
    pub stats: PixelStats,
    /// Pixels that gained above the threshold
    pub gained: usize,
    /// Pixels that lost more than the threshold
    pub lost: usize,
}

impl VegChangeOutput {
    pub fn new(
        selection: &Selection,
        source: Source,
        before: NaiveDate,
        after: NaiveDate,
        map: &ChangeMap,
        threshold: Threshold,
    ) -> Self {
        let days = source.change_window();
        let grid = map.delta().grid();
        let pix_area = if grid.width > 0 && grid.height > 0 {
            grid.cell_area(grid.height / 2, 0)
        } else {
            0.
        };
        let t = threshold.value();
        let valid = || map.delta().data().iter().filter(|v| !v.is_nan());
        VegChangeOutput {
            area: selection.describe().to_string(),
            source,
            window_days: days.num_days(),
            before: DateWindow::starting_at(before, days),
            after: DateWindow::starting_at(after, days),
            scale: map.scale(),
            pix_area,
            stats: map.stats().clone(),
            gained: valid().filter(|&&v| v > t).count(),
            lost: valid().filter(|&&v| v < -t).count(),
        }
    }
}
