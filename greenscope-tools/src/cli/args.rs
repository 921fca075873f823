//! Command line parsing shared by the tools.
//!
//! Every tool takes the same filter options (see
//! [`common_args!`]); [`Common`] reads them back and merges them
//! with the optional settings file.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{value_t, ArgMatches};
use greenscope::prelude::*;

use crate::settings::Settings;

pub use clap::{App, Arg};
pub use inflector::Inflector;

#[macro_export]
macro_rules! args_parser {
    ($name:expr) => {{
        $crate::cli::args::App::new($name)
            .version(clap::crate_version!())
            .author(clap::crate_authors!())
    }};
}

#[macro_export]
macro_rules! arg {
    ($name:expr) => {{
        use inflector::Inflector;
        $crate::cli::args::Arg::with_name($name).value_name(&$name.to_screaming_snake_case())
    }};
}

#[macro_export]
macro_rules! opt {
    ($name:expr) => {{
        use inflector::Inflector;
        $crate::cli::args::Arg::with_name($name)
            .long(&$name.to_kebab_case())
            .value_name(&$name.to_screaming_snake_case())
    }};
}

/// Add the filter options every tool shares to a parser. Must
/// be used in the same statement that calls `get_matches`.
#[macro_export]
macro_rules! common_args {
    ($parser:expr) => {{
        $parser
            .arg($crate::opt!("config").help("Settings file (JSON)"))
            .arg($crate::opt!("catalog").help("Observation catalog manifest (JSON)"))
            .arg($crate::opt!("boundaries").help("Boundaries file (JSON)"))
            .arg($crate::opt!("region").help("Region name (default: whole country)"))
            .arg(
                $crate::opt!("city")
                    .requires("region")
                    .help("City name within the region"),
            )
            .arg(
                $crate::opt!("source")
                    .help("Data source: modis, sentinel-2 or landsat (default: modis)"),
            )
            .arg($crate::opt!("start").help("First day, YYYY-MM-DD (default: 2023-01-01)"))
            .arg($crate::opt!("end").help("Last day, YYYY-MM-DD (default: 2023-12-31)"))
            .arg(
                $crate::opt!("threshold")
                    .short("t")
                    .help("High vegetation threshold in [0, 1] (default: 0.1)"),
            )
    }};
}

/// Filter options of a run, after merging the settings file.
#[derive(Debug, Clone)]
pub struct Common {
    pub settings: Settings,
    pub catalog: PathBuf,
    pub boundaries: PathBuf,
    pub selection: Selection,
    pub source: Source,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub threshold: Threshold,
}

fn invalid(msg: String) -> ! {
    clap::Error::with_description(&msg, clap::ErrorKind::InvalidValue).exit()
}

fn parse_date(matches: &ArgMatches, name: &str) -> Option<NaiveDate> {
    matches.value_of(name).map(|s| {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .unwrap_or_else(|e| invalid(format!("{}: `{}' is not a date: {}", name, s, e)))
    })
}

impl Common {
    /// Read the options added by [`common_args!`]. Exits with a
    /// usage error on invalid values.
    pub fn from_matches(matches: &ArgMatches) -> Self {
        let settings = match value_t!(matches, "config", PathBuf) {
            Ok(path) => Settings::from_file(&path)
                .unwrap_or_else(|e| invalid(format!("config: {:#}", e))),
            Err(_) => Settings::default(),
        };

        let catalog = value_t!(matches, "catalog", PathBuf)
            .ok()
            .or_else(|| settings.catalog.clone())
            .unwrap_or_else(|| invalid("a catalog is required (`--catalog' or config)".into()));
        let boundaries = value_t!(matches, "boundaries", PathBuf)
            .ok()
            .or_else(|| settings.boundaries.clone())
            .unwrap_or_else(|| {
                invalid("boundaries are required (`--boundaries' or config)".into())
            });

        let selection = Selection {
            region: matches.value_of("region").map(String::from),
            city: matches.value_of("city").map(String::from),
        };

        let source = match matches.value_of("source") {
            Some(s) => s.parse().unwrap_or_else(|e| invalid(format!("source: {}", e))),
            None => settings.source.unwrap_or(Source::Modis),
        };

        let threshold = match value_t!(matches, "threshold", f64) {
            Ok(t) => Threshold::new(t).unwrap_or_else(|e| invalid(format!("threshold: {}", e))),
            Err(e) if matches.is_present("threshold") => e.exit(),
            Err(_) => settings.threshold.unwrap_or_default(),
        };

        Common {
            start: parse_date(matches, "start").or(settings.start),
            end: parse_date(matches, "end").or(settings.end),
            settings,
            catalog,
            boundaries,
            selection,
            source,
            threshold,
        }
    }

    /// The session context of this run. Missing dates default
    /// to the year 2023; the window is clamped to what the
    /// backend holds.
    pub fn context<B: Backend>(&self, backend: &B) -> Result<SessionContext> {
        let avail = backend.availability(self.source.collection())?;
        let default = match &avail {
            Some(avail) => avail.default_window(),
            None => DateWindow::new(
                NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or(NaiveDate::MIN),
                NaiveDate::from_ymd_opt(2023, 12, 31).unwrap_or(NaiveDate::MAX),
            ),
        };
        let window = DateWindow::new(
            self.start.unwrap_or(default.start()),
            self.end.unwrap_or(default.end()),
        );
        SessionContext::new(self.selection.clone(), self.source, window)
            .with_threshold(self.threshold)
            .clamped(backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{args_parser, common_args};
    use tempdir::TempDir;

    fn parse(args: &[&str]) -> Common {
        let matches = common_args!(args_parser!("test")).get_matches_from(args.to_vec());
        Common::from_matches(&matches)
    }

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, m, day).unwrap()
    }

    #[test]
    fn flags_without_settings() {
        let common = parse(&[
            "test",
            "--catalog",
            "catalog.json",
            "--boundaries",
            "boundaries.json",
            "--region",
            "Riyadh",
            "--city",
            "Diriyah",
            "-t",
            "0.2",
        ]);
        assert_eq!(common.catalog, PathBuf::from("catalog.json"));
        assert_eq!(common.selection, Selection::city("Riyadh", "Diriyah"));
        assert_eq!(common.source, Source::Modis);
        assert_eq!(common.threshold.value(), 0.2);
        assert!(common.start.is_none() && common.end.is_none());
    }

    #[test]
    fn flags_override_settings() {
        let tmp = TempDir::new("args_test").unwrap();
        let config = tmp.path().join("settings.json");
        std::fs::write(
            &config,
            r#"{
                "catalog": "catalog.json",
                "boundaries": "boundaries.json",
                "source": "landsat",
                "threshold": 0.3,
                "end": "2023-06-30"
            }"#,
        )
        .unwrap();
        let config = config.to_string_lossy().into_owned();
        let common = parse(&["test", "--config", &config, "--source", "sentinel-2"]);
        assert_eq!(common.catalog, tmp.path().join("catalog.json"));
        assert_eq!(common.source, Source::Sentinel2);
        assert_eq!(common.threshold.value(), 0.3);
        assert_eq!(common.end, Some(d(6, 30)));
        assert_eq!(common.selection, Selection::country());
    }

    #[test]
    fn context_is_clamped_to_the_backend() {
        let grid = Grid::new([0., 1., 0., 1., 0., -1.], Crs::Projected, 1, 1);
        let backend = MemoryBackend::new()
            .with(Source::Modis.collection(), Observation::new("a", d(3, 1), grid.clone()))
            .with(Source::Modis.collection(), Observation::new("b", d(9, 1), grid));

        let common = parse(&["test", "--catalog", "c.json", "--boundaries", "b.json"]);
        let ctx = common.context(&backend).unwrap();
        assert_eq!(ctx.window, DateWindow::new(d(3, 1), d(9, 1)));

        let common = parse(&[
            "test",
            "--catalog",
            "c.json",
            "--boundaries",
            "b.json",
            "--start",
            "2023-04-01",
        ]);
        let ctx = common.context(&backend).unwrap();
        assert_eq!(ctx.window, DateWindow::new(d(4, 1), d(9, 1)));
    }
}
