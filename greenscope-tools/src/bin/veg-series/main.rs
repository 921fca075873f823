use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::Context;
use clap::value_t;
use tracing::info;

use greenscope::prelude::*;
use greenscope_tools::cli::args::Common;
use greenscope_tools::{args_parser, common_args, opt, utils::*, Result};

// Main function
greenscope_tools::sync_main!(run());

fn run() -> Result<()> {
    // Parse command line
    let args = parse_cmd_line();
    let common = &args.common;

    let catalog = read_catalog(&common.catalog)?;
    let boundaries = read_boundaries(&common.boundaries)?;
    let ctx = common.context(&catalog)?;
    let geom = boundaries.resolve(&ctx.selection)?;

    let mut series = time_series(&catalog, ctx.source, geom, ctx.source.scale(), &ctx.window)?;
    if args.above_threshold {
        series = series.above_threshold(ctx.threshold);
    }

    match &args.output {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
            write_csv(&series, &ctx.selection, BufWriter::new(file))?;
            info!(path = %path.display(), records = series.len(), "wrote time series");
        }
        None => write_csv(&series, &ctx.selection, std::io::stdout().lock())?,
    }
    Ok(())
}

/// Program arguments
pub struct Args {
    common: Common,
    /// Keep only records above the threshold
    above_threshold: bool,
    /// Output path (CSV); stdout if absent
    output: Option<PathBuf>,
}

fn parse_cmd_line() -> Args {
    let matches = common_args!(args_parser!("veg-series")
        .about("Extract the mean vegetation index of every observation as CSV."))
    .arg(
        opt!("above threshold")
            .takes_value(false)
            .help("Keep only observations whose mean exceeds the threshold"),
    )
    .arg(opt!("output").short("o").help("Output path (default: stdout)"))
    .get_matches();

    Args {
        common: Common::from_matches(&matches),
        above_threshold: matches.is_present("above threshold"),
        output: value_t!(matches, "output", PathBuf).ok(),
    }
}
