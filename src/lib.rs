//! Switch the active gh account and keep git's commit identity in step.
//!
//! `gitswitch` runs the switch workflow; `gitswitch-setup` bootstraps the
//! tools it depends on.

pub mod cli;
pub mod config;
pub mod error;
pub mod gh;
pub mod git;
pub mod identity;
pub mod probe;
pub mod request;
pub mod setup;
pub mod switch;
pub mod validation;

use env_logger::Env;

/// Initialises `env_logger`: `warn` by default, `debug` when verbose,
/// `RUST_LOG` overriding both
pub fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}
