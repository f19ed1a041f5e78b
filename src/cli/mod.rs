//! CLI arguments parsing for the simulation driver

pub mod args;

pub use args::SimArgs;

use clap::Parser;

/// Parse command-line arguments
pub fn parse_args() -> SimArgs {
    SimArgs::parse()
}
