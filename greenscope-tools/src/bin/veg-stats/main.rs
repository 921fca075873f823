use anyhow::Context;
use rayon::prelude::*;

use greenscope::prelude::*;
use greenscope_tools::cli::args::Common;
use greenscope_tools::{args_parser, common_args, opt, utils::*, Result, Tracker};

mod outputs;

// Main function
greenscope_tools::sync_main!(run());

fn run() -> Result<()> {
    // Parse command line
    let args = parse_cmd_line();
    let common = &args.common;

    let catalog = read_catalog(&common.catalog)?;
    let boundaries = read_boundaries(&common.boundaries)?;
    let ctx = common.context(&catalog)?;

    let report = report(&catalog, &boundaries, &ctx)
        .with_context(|| format!("computing statistics of {}", ctx.selection.describe()))?;

    let regions = if args.regions {
        Some(region_table(&catalog, &boundaries, &ctx, &common.settings.reduce)?)
    } else {
        None
    };

    let asset = common
        .settings
        .assets
        .as_ref()
        .map(|dir| Assets::new(dir).resolve(ctx.selection.region.as_deref()));

    print_json(&outputs::VegStatsOutput {
        report,
        regions,
        asset,
    })?;
    Ok(())
}

/// Mean and deviation of the country composite in every
/// region, reduced in parallel.
fn region_table(
    catalog: &Catalog,
    boundaries: &Boundaries,
    ctx: &SessionContext,
    opts: &ReduceOptions,
) -> Result<Vec<RegionStats>> {
    let comp = composite(catalog, ctx.source, &ctx.window, boundaries.country())?;
    let tracker = Tracker::new("regions", boundaries.regions().len());
    let stats = boundaries
        .regions()
        .par_iter()
        .map(|region| {
            let stats = region_stats(comp.raster(), region, comp.scale(), opts)
                .with_context(|| format!("region {}", region.name))?;
            if stats.pixels == 0 {
                tracker.skip();
            }
            tracker.increment();
            Ok(stats)
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(stats)
}

/// Program arguments
pub struct Args {
    common: Common,
    /// Add per-region statistics
    regions: bool,
}

fn parse_cmd_line() -> Args {
    let matches = common_args!(args_parser!("veg-stats")
        .about("Compute vegetation statistics of a region or city."))
    .arg(
        opt!("regions")
            .takes_value(false)
            .help("Also compute the mean and std. deviation of every region"),
    )
    .get_matches();

    Args {
        common: Common::from_matches(&matches),
        regions: matches.is_present("regions"),
    }
}
