use anyhow::Context;
use tracing::info;

use greenscope::io::write_bin;
use greenscope::prelude::*;
use greenscope_tools::{utils::*, Result};

mod args;
mod outputs;

// Main function
greenscope_tools::sync_main!(run());

fn run() -> Result<()> {
    // Parse command line
    let args = args::parse_cmd_line();
    let common = &args.common;

    let catalog = read_catalog(&common.catalog)?;
    let boundaries = read_boundaries(&common.boundaries)?;
    let geom = boundaries.resolve(&common.selection)?;

    let map = change_raster(&catalog, common.source, args.before, args.after, geom)
        .with_context(|| format!("computing change of {}", common.selection.describe()))?;

    if let Some(path) = &args.output {
        let delta = if args.clamp {
            map.delta().clamped(-1., 1.)
        } else {
            map.delta().clone()
        };
        write_bin(path, &delta).with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "wrote delta raster");
    }

    print_json(&outputs::VegChangeOutput::new(
        &common.selection,
        common.source,
        args.before,
        args.after,
        &map,
        common.threshold,
    ))?;
    Ok(())
}
