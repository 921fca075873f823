//! Flat CSV export of a time series.
//!
//! One header row, then one row per record:
//! `date,mean_index[,region][,city]`. A masked record leaves
//! `mean_index` empty. The region and city columns are present
//! only when a region (or city) is selected, and repeat it on
//! every row.

use std::io::Write;

use crate::boundary::Selection;
use crate::series::TimeSeries;
use crate::Result;

/// Write `series` as CSV, labelled with `selection`.
pub fn write_csv<W: Write>(series: &TimeSeries, selection: &Selection, out: W) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(out);
    let mut header = vec!["date", "mean_index"];
    if selection.region.is_some() {
        header.push("region");
    }
    if selection.city.is_some() {
        header.push("city");
    }
    writer.write_record(&header)?;

    let labels = selection.region.iter().chain(selection.city.iter());
    for record in series {
        let date = record.date.format("%Y-%m-%d").to_string();
        let value = record.mean_index.map(|v| v.to_string()).unwrap_or_default();
        let row = [date, value].into_iter().chain(labels.clone().cloned());
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// The CSV export as a string.
pub fn to_csv_string(series: &TimeSeries, selection: &Selection) -> Result<String> {
    let mut buf = Vec::new();
    write_csv(series, selection, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
