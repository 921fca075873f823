use chrono::NaiveDate;
use clap::{value_t, ErrorKind};
use std::path::PathBuf;

use greenscope_tools::cli::args::Common;
use greenscope_tools::{arg, args_parser, common_args, opt};

/// Program arguments
pub struct Args {
    pub common: Common,
    /// Start of the first composite
    pub before: NaiveDate,
    /// Start of the second composite
    pub after: NaiveDate,
    /// Clamp the delta to [-1, 1] before writing
    pub clamp: bool,
    /// Output path of the delta raster (CBOR)
    pub output: Option<PathBuf>,
}

pub fn parse_cmd_line() -> Args {
    let matches = common_args!(args_parser!("veg-change")
        .about("Compute the vegetation index change between two dates."))
    .arg(
        arg!("before")
            .required(true)
            .help("Start day of the first composite (YYYY-MM-DD)"),
    )
    .arg(
        arg!("after")
            .required(true)
            .help("Start day of the second composite (YYYY-MM-DD)"),
    )
    .arg(
        opt!("clamp")
            .takes_value(false)
            .requires("output")
            .help("Clamp written values to [-1, 1]"),
    )
    .arg(opt!("output").short("o").help("Output path of the delta raster (CBOR)"))
    .get_matches();

    let date = |name: &str| -> NaiveDate {
        let s = value_t!(matches, name, String).unwrap_or_else(|e| e.exit());
        NaiveDate::parse_from_str(&s, "%Y-%m-%d").unwrap_or_else(|e| {
            clap::Error::with_description(
                &format!("{}: `{}' is not a date: {}", name, s, e),
                ErrorKind::InvalidValue,
            )
            .exit()
        })
    };

    Args {
        before: date("before"),
        after: date("after"),
        clamp: matches.is_present("clamp"),
        output: value_t!(matches, "output", PathBuf).ok(),
        common: Common::from_matches(&matches),
    }
}
