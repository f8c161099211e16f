use clap::Parser;
use colored::*;
use seabird_cnv::cli::{args::Args, commands};
use std::process;

fn main() {
    let args = Args::parse();

    // If no subcommand was provided, show help and available commands
    if args.command.is_none() {
        show_help_and_commands();
        process::exit(0);
    }

    if let Err(e) = commands::setup_logging(&args) {
        eprintln!("Warning: {}", e);
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to create async runtime: {}", e);
            process::exit(1);
        }
    };

    let result = runtime.block_on(async {
        tokio::select! {
            result = commands::run(args) => result,
            _ = tokio::signal::ctrl_c() => {
                eprintln!("\nReceived CTRL+C, shutting down...");
                Err(anyhow::anyhow!("Interrupted by user"))
            }
        }
    });

    match result {
        Ok(_report) => process::exit(0),
        Err(error) => {
            match error.downcast_ref::<seabird_cnv::Error>() {
                // Bad input files get a short red message
                Some(parse_error) if parse_error.is_parse_error() => {
                    eprintln!("{}", parse_error.to_string().bright_red());
                }
                _ => eprintln!("Error: {:#}", error),
            }
            process::exit(1);
        }
    }
}

/// Show help information and available commands when no subcommand is provided
fn show_help_and_commands() {
    println!("seabird - Sea-Bird CTD .cnv tools");
    println!("=================================");
    println!();
    println!("Inspect Sea-Bird CTD .cnv instrument dumps and convert them into");
    println!("self-describing netCDF classic files.");
    println!();
    println!("USAGE:");
    println!("    seabird <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    dump        Print global and per-variable attributes of a .cnv or .nc file");
    println!("    convert     Convert .cnv files, directories or glob patterns to netCDF");
    println!("    help        Show this help message or help for specific commands");
    println!();
    println!("OPTIONS:");
    println!("    -v, --verbose    Increase logging verbosity (repeatable)");
    println!("    -q, --quiet      Only report errors");
    println!("    -h, --help       Show help information");
    println!("    -V, --version    Show version information");
    println!();
    println!("EXAMPLES:");
    println!("    # Show the header of a cast:");
    println!("    seabird dump cast01.cnv");
    println!();
    println!("    # Convert one file next to its input (cast01.nc):");
    println!("    seabird convert cast01.cnv");
    println!();
    println!("    # Convert a cruise directory into another directory, 4 at a time:");
    println!("    seabird convert raw/ -o netcdf/ -j 4");
    println!();
    println!("    # Keep existing outputs:");
    println!("    seabird convert 'raw/*.cnv' --no-clobber");
    println!();
    println!("ENVIRONMENT:");
    println!("    SEABIRD_BAD_FLAG_EPSILON    Relative tolerance for bad-flag matching");
    println!("    SEABIRD_WORKERS             Default number of concurrent conversions");
    println!("    RUST_LOG                    Log filter, overrides -v/-q");
}
