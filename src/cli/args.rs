//! Command-line flags for suite runners built on this crate.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::{ColorMode, ConfigOverrides, OutputFormat};
use crate::harness::Backend;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Console,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    Native,
    Xunit,
}

#[derive(Debug, Parser)]
#[command(
    name = "selfcheck",
    version,
    about = "Run the registered describe/it suites and report the results."
)]
pub struct RunArgs {
    /// Config file; defaults to testify.yaml or testify.yml in the working directory.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Only run tests whose "suite > test" name contains this text (case-insensitive).
    #[arg(long, value_name = "TEXT")]
    pub filter: Option<String>,

    /// Output format.
    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,

    /// Disable colored output.
    #[arg(long)]
    pub no_color: bool,

    /// Skip every test after the first failure.
    #[arg(long)]
    pub stop_on_failure: bool,

    /// Print skip reasons and per-suite tallies.
    #[arg(short, long)]
    pub verbose: bool,

    /// Execution backend.
    #[arg(long, value_enum, default_value = "native")]
    pub backend: BackendArg,
}

impl RunArgs {
    /// Flags that were given, as config overrides. Absent flags leave the
    /// file value alone.
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            colors: self.no_color.then_some(ColorMode::Never),
            stop_on_failure: self.stop_on_failure.then_some(true),
            filter: self.filter.clone(),
            verbose: self.verbose.then_some(true),
            format: self.format.map(|format| match format {
                FormatArg::Console => OutputFormat::Console,
                FormatArg::Json => OutputFormat::Json,
            }),
        }
    }

    pub fn backend(&self) -> Backend {
        match self.backend {
            BackendArg::Native => Backend::Native,
            BackendArg::Xunit => Backend::XUnit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_flags_do_not_override() {
        let args = RunArgs::parse_from(["selfcheck"]);
        assert_eq!(args.overrides(), ConfigOverrides::default());
        assert_eq!(args.backend(), Backend::Native);
    }

    #[test]
    fn flags_map_onto_overrides() {
        let args = RunArgs::parse_from([
            "selfcheck",
            "--no-color",
            "--filter",
            "math",
            "--format",
            "json",
            "--stop-on-failure",
            "--backend",
            "xunit",
        ]);
        let overrides = args.overrides();
        assert_eq!(overrides.colors, Some(ColorMode::Never));
        assert_eq!(overrides.filter.as_deref(), Some("math"));
        assert_eq!(overrides.format, Some(OutputFormat::Json));
        assert_eq!(overrides.stop_on_failure, Some(true));
        assert_eq!(overrides.verbose, None);
        assert_eq!(args.backend(), Backend::XUnit);
    }
}
