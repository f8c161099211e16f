//! Convert command implementation
//!
//! Each input file is parsed and exported on its own blocking task. Tasks
//! run concurrently up to the configured worker count and share no mutable
//! state; results are gathered with `buffer_unordered` and reported in input
//! order.

use super::shared::{CommandReport, create_progress_bar, print_status};
use crate::app::services::cnv_parser::CnvParser;
use crate::app::services::netcdf_writer::{ExportStats, NetcdfWriter};
use crate::cli::args::ConvertArgs;
use crate::cli::input::resolve_inputs;
use crate::config::Config;
use crate::{Error, Result};
use colored::*;
use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::task;
use tracing::{debug, info};

/// Result of converting one file
#[derive(Debug)]
pub struct FileOutcome {
    pub input: PathBuf,
    pub destination: PathBuf,
    pub result: Result<ExportStats>,
}

/// Run the convert command
pub async fn run_convert(args: &ConvertArgs, show_progress: bool) -> anyhow::Result<CommandReport> {
    let start = Instant::now();

    args.validate()?;
    let config = build_config(args)?;
    let inputs = resolve_inputs(&args.inputs)?;
    args.validate_output_for(inputs.len())?;

    let single = inputs.len() == 1;
    let jobs = args.plan_jobs(inputs)?;
    debug!(
        "Converting {} files with {} workers",
        jobs.len(),
        config.workers
    );

    let pb = if show_progress && !args.no_progress && !single {
        create_progress_bar(jobs.len() as u64, "Converting")
    } else {
        ProgressBar::hidden()
    };

    let mut outcomes = convert_all(jobs, &config, &pb, show_progress).await;
    pb.finish_and_clear();
    outcomes.sort_by(|a, b| a.input.cmp(&b.input));

    let mut report = CommandReport::default();
    let mut first_error = None;
    for outcome in outcomes {
        match outcome.result {
            Ok(stats) => {
                report.files_processed += 1;
                report.bytes_written += stats.bytes_written;
            }
            Err(error) => {
                report.files_failed += 1;
                if single {
                    first_error = Some(error);
                } else {
                    report_failure(&outcome.input, &error);
                }
            }
        }
    }
    report.processing_time = start.elapsed();

    // A lone input reports its own error so `main` can classify it
    if let Some(error) = first_error {
        return Err(error.into());
    }

    if show_progress && !single {
        println!(
            "{} {} of {} files ({}) in {:.2?}",
            "Converted".bright_green(),
            report.files_processed,
            report.files_processed + report.files_failed,
            CommandReport::format_size(report.bytes_written),
            report.processing_time
        );
    }

    if !report.is_success() {
        anyhow::bail!(
            "{} of {} files failed to convert",
            report.files_failed,
            report.files_processed + report.files_failed
        );
    }

    Ok(report)
}

/// Apply command-line overrides on top of environment configuration
pub fn build_config(args: &ConvertArgs) -> Result<Config> {
    let mut config = Config::from_env()?;
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if let Some(epsilon) = args.bad_flag_epsilon {
        config.parser.bad_flag_epsilon = epsilon;
    }
    config.export.overwrite = !args.no_clobber;
    config.validate()?;
    Ok(config)
}

/// Convert every job, at most `config.workers` at a time
pub async fn convert_all(
    jobs: Vec<(PathBuf, PathBuf)>,
    config: &Config,
    pb: &ProgressBar,
    show_progress: bool,
) -> Vec<FileOutcome> {
    let parser = CnvParser::new(config.parser.clone());
    let writer = NetcdfWriter::new(config.export.clone());

    stream::iter(jobs)
        .map(|(input, destination)| {
            let parser = parser.clone();
            let writer = writer.clone();
            print_status(
                pb,
                show_progress,
                format!("Saving on {}", destination.display()),
            );
            async move {
                let (task_input, task_destination) = (input.clone(), destination.clone());
                let handle = task::spawn_blocking(move || {
                    convert_file(&parser, &writer, &task_input, &task_destination)
                });
                let result = match handle.await {
                    Ok(result) => result,
                    Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                    Err(e) => Err(Error::export(
                        destination.display().to_string(),
                        format!("conversion task was cancelled: {}", e),
                    )),
                };
                FileOutcome {
                    input,
                    destination,
                    result,
                }
            }
        })
        .buffer_unordered(config.workers)
        .inspect(|_| pb.inc(1))
        .collect()
        .await
}

/// Parse one CNV file and export it
pub fn convert_file(
    parser: &CnvParser,
    writer: &NetcdfWriter,
    input: &Path,
    destination: &Path,
) -> Result<ExportStats> {
    if input == destination {
        return Err(Error::export(
            destination.display().to_string(),
            "destination is the input file",
        ));
    }

    let dataset = parser.parse_file(input)?;
    let stats = writer.write(&dataset, destination)?;
    info!(
        "Converted {} -> {} ({} variables, {} rows, {} skipped)",
        input.display(),
        destination.display(),
        stats.variables,
        stats.rows,
        dataset.skipped_rows()
    );
    Ok(stats)
}

fn report_failure(input: &Path, error: &Error) {
    if error.is_parse_error() {
        eprintln!("{}", format!("{}: {}", input.display(), error).bright_red());
        return;
    }

    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    eprintln!("{}: {}", input.display(), message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::services::netcdf_writer::read_netcdf;
    use std::fs;
    use tempfile::TempDir;

    const CAST: &str = "* Sea-Bird SBE 9 Data File:
# name 0 = prDM: Pressure, Digiquartz [db]
# name 1 = t090C: Temperature [ITS-90, deg C]
# bad_flag = -9.990e-29
*END*
      1.000    12.5000
      2.000 -9.990e-29
";

    fn convert_args(inputs: Vec<String>) -> ConvertArgs {
        ConvertArgs {
            inputs,
            output: None,
            no_clobber: false,
            workers: Some(2),
            bad_flag_epsilon: None,
            no_progress: true,
        }
    }

    #[tokio::test]
    async fn test_convert_directory_next_to_inputs() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["a.cnv", "b.cnv", "c.cnv"] {
            fs::write(temp_dir.path().join(name), CAST).unwrap();
        }

        let args = convert_args(vec![temp_dir.path().display().to_string()]);
        let report = run_convert(&args, false).await.unwrap();

        assert_eq!(report.files_processed, 3);
        assert_eq!(report.files_failed, 0);
        for name in ["a.nc", "b.nc", "c.nc"] {
            let file = read_netcdf(&temp_dir.path().join(name)).unwrap();
            assert_eq!(file.dimensions[0].length, 2);
        }
    }

    #[tokio::test]
    async fn test_convert_single_file_to_named_output() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("cast.cnv");
        let output = temp_dir.path().join("renamed.nc");
        fs::write(&input, CAST).unwrap();

        let mut args = convert_args(vec![input.display().to_string()]);
        args.output = Some(output.clone());
        run_convert(&args, false).await.unwrap();

        assert!(output.exists());
        assert!(!temp_dir.path().join("cast.nc").exists());
    }

    #[tokio::test]
    async fn test_single_parse_failure_keeps_error_kind() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("broken.cnv");
        fs::write(&input, "# name 0 = prDM: Pressure [db]\n 1.0\n").unwrap();

        let args = convert_args(vec![input.display().to_string()]);
        let error = run_convert(&args, false).await.unwrap_err();

        let error = error.downcast_ref::<Error>().unwrap();
        assert!(error.is_parse_error());
        assert!(!temp_dir.path().join("broken.nc").exists());
    }

    #[tokio::test]
    async fn test_one_bad_file_does_not_stop_the_rest() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("good.cnv"), CAST).unwrap();
        fs::write(temp_dir.path().join("bad.cnv"), "no header end\n").unwrap();

        let args = convert_args(vec![temp_dir.path().display().to_string()]);
        let error = run_convert(&args, false).await.unwrap_err();

        assert!(error.to_string().contains("1 of 2 files failed"));
        assert!(temp_dir.path().join("good.nc").exists());
        assert!(!temp_dir.path().join("bad.nc").exists());
    }

    #[tokio::test]
    async fn test_no_clobber_keeps_existing_output() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("cast.cnv");
        let output = temp_dir.path().join("cast.nc");
        fs::write(&input, CAST).unwrap();
        fs::write(&output, b"previous").unwrap();

        let mut args = convert_args(vec![input.display().to_string()]);
        args.no_clobber = true;
        let error = run_convert(&args, false).await.unwrap_err();

        assert!(matches!(
            error.downcast_ref::<Error>(),
            Some(Error::Export { .. })
        ));
        assert_eq!(fs::read(&output).unwrap(), b"previous");
    }

    #[tokio::test]
    async fn test_colliding_outputs_fail_before_writing() {
        let temp_dir = TempDir::new().unwrap();
        let raw = temp_dir.path().join("raw");
        let out = temp_dir.path().join("out");
        for leg in ["leg1", "leg2"] {
            fs::create_dir_all(raw.join(leg)).unwrap();
            fs::write(raw.join(leg).join("cast01.cnv"), CAST).unwrap();
        }
        fs::create_dir(&out).unwrap();

        let mut args = convert_args(vec![raw.display().to_string()]);
        args.output = Some(out.clone());
        let error = run_convert(&args, false).await.unwrap_err();

        assert!(matches!(
            error.downcast_ref::<Error>(),
            Some(Error::Configuration { .. })
        ));
        assert_eq!(fs::read_dir(&out).unwrap().count(), 0);
    }

    #[test]
    fn test_destination_equal_to_input_is_refused() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cast.nc");
        fs::write(&path, CAST).unwrap();

        let result = convert_file(
            &CnvParser::default(),
            &NetcdfWriter::default(),
            &path,
            &path,
        );
        assert!(matches!(result, Err(Error::Export { .. })));
        assert_eq!(fs::read_to_string(&path).unwrap(), CAST);
    }

    #[test]
    fn test_build_config_applies_overrides() {
        let mut args = convert_args(vec!["cast.cnv".to_string()]);
        args.workers = Some(3);
        args.bad_flag_epsilon = Some(1e-3);
        args.no_clobber = true;

        let config = build_config(&args).unwrap();
        assert_eq!(config.workers, 3);
        assert_eq!(config.parser.bad_flag_epsilon, 1e-3);
        assert!(!config.export.overwrite);
    }
}
