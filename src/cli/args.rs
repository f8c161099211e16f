//! Command-line argument definitions for the Sea-Bird CNV toolchain
//!
//! This module defines the CLI interface using the clap derive API. Logging
//! flags are global so they can follow any subcommand.

use crate::constants::NETCDF_EXTENSION;
use crate::{Error, Result};
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// CLI arguments for the Sea-Bird CNV tools
///
/// Inspects Sea-Bird CTD `.cnv` instrument dumps and converts them into
/// self-describing netCDF classic files.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "seabird",
    version,
    about = "Inspect Sea-Bird CTD .cnv files and convert them to netCDF",
    long_about = "Reads Sea-Bird CTD .cnv instrument dumps written by any Seasoft generation, \
                  recovers instrument metadata, variable declarations and bad-flag sentinels, \
                  and writes the result as netCDF classic files."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        global = true,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Suppress output (quiet mode)
    ///
    /// Only show errors. Overrides verbose settings.
    #[arg(
        short = 'q',
        long = "quiet",
        global = true,
        help = "Suppress output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Print the attributes of a .cnv (or exported .nc) file
    Dump(DumpArgs),
    /// Convert .cnv files to netCDF
    Convert(ConvertArgs),
}

/// Arguments for the dump command
#[derive(Debug, Clone, Parser)]
pub struct DumpArgs {
    /// File to inspect
    ///
    /// Files ending in `.nc` are read as netCDF; anything else is parsed
    /// as CNV.
    #[arg(value_name = "FILE", help = "File to inspect (.cnv or .nc)")]
    pub input: PathBuf,

    /// Relative tolerance for bad-flag matching
    #[arg(
        long = "bad-flag-epsilon",
        value_name = "EPS",
        help = "Relative tolerance when matching the bad flag"
    )]
    pub bad_flag_epsilon: Option<f64>,
}

/// Arguments for the convert command
#[derive(Debug, Clone, Parser)]
pub struct ConvertArgs {
    /// Files, directories or glob patterns to convert
    ///
    /// Directories are walked recursively for `*.cnv` files.
    #[arg(
        value_name = "INPUT",
        required = true,
        num_args = 1..,
        help = "CNV files, directories or glob patterns"
    )]
    pub inputs: Vec<String>,

    /// Output file or directory
    ///
    /// With a single input this names the output file unless it is an
    /// existing directory. With several inputs it must be a directory.
    /// By default each output sits next to its input with a `.nc` extension.
    #[arg(
        short = 'o',
        long = "output",
        value_name = "PATH",
        help = "Output file (single input) or directory"
    )]
    pub output: Option<PathBuf>,

    /// Refuse to replace existing output files
    #[arg(long = "no-clobber", help = "Fail instead of replacing existing output files")]
    pub no_clobber: bool,

    /// Number of parallel workers
    #[arg(
        short = 'j',
        long = "workers",
        value_name = "COUNT",
        help = "Number of files converted concurrently [default: CPU count]"
    )]
    pub workers: Option<usize>,

    /// Relative tolerance for bad-flag matching
    #[arg(
        long = "bad-flag-epsilon",
        value_name = "EPS",
        help = "Relative tolerance when matching the bad flag"
    )]
    pub bad_flag_epsilon: Option<f64>,

    /// Disable the progress bar
    #[arg(long = "no-progress", help = "Disable the progress bar")]
    pub no_progress: bool,
}

impl Args {
    /// Determine the appropriate log level based on verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Check if we should print progress and status lines (not in quiet mode)
    pub fn show_progress(&self) -> bool {
        !self.quiet
    }
}

impl ConvertArgs {
    /// Validate the convert command arguments for consistency
    pub fn validate(&self) -> Result<()> {
        if self.workers == Some(0) {
            return Err(Error::configuration(
                "Number of workers must be greater than 0",
            ));
        }

        if let Some(output) = &self.output {
            let target_dir = if output.is_dir() {
                Some(output.as_path())
            } else {
                output.parent().filter(|p| !p.as_os_str().is_empty())
            };
            if let Some(dir) = target_dir {
                if !dir.exists() {
                    return Err(Error::configuration(format!(
                        "Output directory does not exist: {}",
                        dir.display()
                    )));
                }
            }
        }

        Ok(())
    }

    /// Check the output path against the number of resolved inputs
    pub fn validate_output_for(&self, input_count: usize) -> Result<()> {
        if let Some(output) = &self.output {
            if input_count > 1 && !output.is_dir() {
                return Err(Error::configuration(format!(
                    "Output must be an existing directory when converting {} files: {}",
                    input_count,
                    output.display()
                )));
            }
        }
        Ok(())
    }

    /// Destination path for one input
    ///
    /// `single` is true when exactly one input file was resolved, which is
    /// the only case where `--output` may name a file.
    pub fn destination_for(&self, input: &Path, single: bool) -> PathBuf {
        match &self.output {
            Some(output) if single && !output.is_dir() => output.clone(),
            Some(output) => {
                let file_name = input
                    .file_name()
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("output"));
                output.join(file_name).with_extension(NETCDF_EXTENSION)
            }
            None => input.with_extension(NETCDF_EXTENSION),
        }
    }

    /// Pair every input with its destination
    ///
    /// Two inputs mapping onto the same output (e.g. `leg1/cast01.cnv` and
    /// `leg2/cast01.cnv` with `--output DIR`) are rejected before anything
    /// is written.
    pub fn plan_jobs(&self, inputs: Vec<PathBuf>) -> Result<Vec<(PathBuf, PathBuf)>> {
        let single = inputs.len() == 1;
        let mut claimed: HashMap<PathBuf, PathBuf> = HashMap::new();
        let mut jobs = Vec::with_capacity(inputs.len());

        for input in inputs {
            let destination = self.destination_for(&input, single);
            if let Some(previous) = claimed.get(&destination) {
                return Err(Error::configuration(format!(
                    "{} and {} would both be written to {}",
                    previous.display(),
                    input.display(),
                    destination.display()
                )));
            }
            claimed.insert(destination.clone(), input.clone());
            jobs.push((input, destination));
        }
        Ok(jobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::TempDir;

    fn convert_args(inputs: &[&str]) -> ConvertArgs {
        ConvertArgs {
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            output: None,
            no_clobber: false,
            workers: None,
            bad_flag_epsilon: None,
            no_progress: false,
        }
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_convert_command() {
        let args = Args::try_parse_from([
            "seabird",
            "convert",
            "a.cnv",
            "casts/",
            "-o",
            "out",
            "--no-clobber",
            "-j",
            "4",
            "-vv",
        ])
        .unwrap();

        assert_eq!(args.verbose, 2);
        assert_eq!(args.get_log_level(), "debug");
        match args.command {
            Some(Commands::Convert(convert)) => {
                assert_eq!(convert.inputs, vec!["a.cnv", "casts/"]);
                assert_eq!(convert.output, Some(PathBuf::from("out")));
                assert!(convert.no_clobber);
                assert_eq!(convert.workers, Some(4));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_dump_command() {
        let args = Args::try_parse_from(["seabird", "-q", "dump", "cast.cnv"]).unwrap();
        assert!(args.quiet);
        assert_eq!(args.get_log_level(), "error");
        assert!(!args.show_progress());
        assert!(matches!(args.command, Some(Commands::Dump(ref d)) if d.input == Path::new("cast.cnv")));
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Args::try_parse_from(["seabird", "-q", "-v", "dump", "cast.cnv"]).is_err());
    }

    #[test]
    fn test_convert_requires_input() {
        assert!(Args::try_parse_from(["seabird", "convert"]).is_err());
    }

    #[test]
    fn test_log_levels() {
        let mut args = Args::try_parse_from(["seabird"]).unwrap();
        assert!(args.command.is_none());
        assert_eq!(args.get_log_level(), "warn");
        args.verbose = 1;
        assert_eq!(args.get_log_level(), "info");
        args.verbose = 5;
        assert_eq!(args.get_log_level(), "trace");
    }

    #[test]
    fn test_default_destination_replaces_extension() {
        let args = convert_args(&["casts/cast01.cnv"]);
        assert_eq!(
            args.destination_for(Path::new("casts/cast01.cnv"), true),
            PathBuf::from("casts/cast01.nc")
        );
    }

    #[test]
    fn test_output_file_for_single_input() {
        let mut args = convert_args(&["cast01.cnv"]);
        args.output = Some(PathBuf::from("renamed.nc"));
        assert_eq!(
            args.destination_for(Path::new("cast01.cnv"), true),
            PathBuf::from("renamed.nc")
        );
    }

    #[test]
    fn test_output_directory_for_many_inputs() {
        let temp_dir = TempDir::new().unwrap();
        let mut args = convert_args(&["a.cnv", "b.cnv"]);
        args.output = Some(temp_dir.path().to_path_buf());

        assert!(args.validate().is_ok());
        assert!(args.validate_output_for(2).is_ok());
        assert_eq!(
            args.destination_for(Path::new("raw/b.cnv"), false),
            temp_dir.path().join("b.nc")
        );
    }

    #[test]
    fn test_same_file_name_in_output_directory_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let mut args = convert_args(&["raw"]);
        args.output = Some(temp_dir.path().to_path_buf());

        let inputs = vec![
            PathBuf::from("raw/leg1/cast01.cnv"),
            PathBuf::from("raw/leg2/cast01.cnv"),
        ];
        let error = args.plan_jobs(inputs).unwrap_err();
        assert!(matches!(error, Error::Configuration { .. }));
        assert!(error.to_string().contains("raw/leg2/cast01.cnv"));
    }

    #[test]
    fn test_same_file_name_next_to_inputs_is_allowed() {
        let args = convert_args(&["raw"]);
        let jobs = args
            .plan_jobs(vec![
                PathBuf::from("raw/leg1/cast01.cnv"),
                PathBuf::from("raw/leg2/cast01.cnv"),
            ])
            .unwrap();
        assert_eq!(jobs[0].1, PathBuf::from("raw/leg1/cast01.nc"));
        assert_eq!(jobs[1].1, PathBuf::from("raw/leg2/cast01.nc"));
    }

    #[test]
    fn test_validation_errors() {
        let mut args = convert_args(&["a.cnv"]);
        args.workers = Some(0);
        assert!(args.validate().is_err());

        let mut args = convert_args(&["a.cnv", "b.cnv"]);
        args.output = Some(PathBuf::from("/definitely/not/here/out.nc"));
        assert!(args.validate().is_err());
        assert!(args.validate_output_for(2).is_err());
    }
}
