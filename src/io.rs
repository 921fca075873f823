//! Binary (CBOR) persistence of rasters and observations.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::Result;

pub fn write_bin<T: serde::Serialize>(path: &Path, data: &T) -> Result<()> {
    let file = File::create(path)?;
    let mut buf = std::io::BufWriter::with_capacity(0x100000, file);
    serde_cbor::to_writer(&mut buf, data)?;
    buf.flush()?;
    Ok(())
}

pub fn read_bin<T: for<'a> serde::Deserialize<'a>>(path: &Path) -> Result<T> {
    let file = File::open(path)?;
    // Safety: the file is opened read-only and only read while
    // the map is alive.
    let file = unsafe { memmap::MmapOptions::new().map(&file)? };
    Ok(serde_cbor::from_slice(file.as_ref())?)
}
