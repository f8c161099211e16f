//! Command implementations for the Sea-Bird CNV CLI
//!
//! Each command lives in its own module; shared reporting, logging and
//! progress helpers are in [`shared`].

pub mod convert;
pub mod dump;
pub mod shared;

pub use shared::{CommandReport, setup_logging};

use crate::cli::args::{Args, Commands};

/// Dispatch to the subcommand handler
///
/// - `dump`: print a file's attributes
/// - `convert`: export CNV files to netCDF
pub async fn run(args: Args) -> anyhow::Result<CommandReport> {
    let show_progress = args.show_progress();
    match &args.command {
        Some(Commands::Dump(dump_args)) => dump::run_dump(dump_args).await,
        Some(Commands::Convert(convert_args)) => {
            convert::run_convert(convert_args, show_progress).await
        }
        None => Ok(CommandReport::default()),
    }
}
