//! Thin command-line front end: flags, logging and the run loop for a
//! binary that registers its own suites.

use clap::Parser;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::action;
use crate::config::Config;
use crate::errors::{ConfigError, Outcome};
use crate::harness::Testify;

pub mod args;

pub use args::RunArgs;

/// Installs a stderr subscriber filtered by `RUST_LOG` (default `warn`).
/// Does nothing if a subscriber is already set.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .try_init();
}

/// Routes panics caught by test and hook bodies to `tracing` instead of
/// stderr; the reporter already shows their message. Other panics keep the
/// previous hook.
pub fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        if action::is_invoking() {
            debug!(panic = %info, "caught panic in test code");
        } else {
            previous(info);
        }
    }));
}

/// Builds a harness from the config file and the flags layered on top.
pub fn prepare(args: &RunArgs) -> Result<Testify, ConfigError> {
    let config = Config::load(args.config.as_deref())?.merge(args.overrides());
    debug!(?config, "effective configuration");
    Ok(Testify::with_config(config).backend(args.backend()))
}

/// Parses flags, lets `register` declare suites, runs them and exits.
///
/// Config and declaration errors are printed as diagnostics and exit 1
/// before any test runs.
pub fn main_with<F>(register: F) -> !
where
    F: FnOnce(&mut Testify) -> Outcome,
{
    let args = RunArgs::parse();
    init_tracing();
    install_panic_hook();

    let mut testify = match prepare(&args) {
        Ok(testify) => testify,
        Err(err) => {
            eprintln!("{:?}", miette::Report::new(err));
            std::process::exit(1);
        }
    };
    if let Err(fault) = register(&mut testify) {
        eprintln!("{:?}", miette::Report::new(fault));
        std::process::exit(1);
    }
    testify.run_and_exit()
}
