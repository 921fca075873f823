//! Utilities to open inputs, write outputs and set up logging.

use std::io::Write;
use std::path::Path;

use anyhow::Context;
use greenscope::prelude::*;
use serde::Serialize;

use crate::Result;

pub fn read_catalog(path: &Path) -> Result<Catalog> {
    Catalog::open(path).with_context(|| format!("opening catalog {}", path.display()))
}

pub fn read_boundaries(path: &Path) -> Result<Boundaries> {
    Boundaries::from_json(path).with_context(|| format!("reading boundaries {}", path.display()))
}

pub fn print_json<T: Serialize>(json: &T) -> Result<()> {
    let mut writer = std::io::BufWriter::new(std::io::stdout());
    serde_json::to_writer_pretty(&mut writer, json)?;
    writeln!(writer)?;
    Ok(())
}

/// Log to stderr. The level defaults to `info` and is set with
/// `RUST_LOG`.
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
