//! Shared components for CLI commands
//!
//! This module contains the command report, logging setup and progress bar
//! helpers used by the command implementations.

use crate::cli::args::Args;
use crate::{Error, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::debug;

/// Summary of a command run, returned to `main`
#[derive(Debug, Clone, Default)]
pub struct CommandReport {
    /// Number of files read or converted successfully
    pub files_processed: usize,
    /// Number of files that failed
    pub files_failed: usize,
    /// Total bytes written to netCDF outputs
    pub bytes_written: u64,
    /// Wall-clock time of the command
    pub processing_time: Duration,
}

impl CommandReport {
    /// Format a size in bytes in human-readable form
    pub fn format_size(bytes: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = bytes as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", bytes, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }

    /// True when no file failed
    pub fn is_success(&self) -> bool {
        self.files_failed == 0
    }
}

/// Set up structured logging on stderr
///
/// `RUST_LOG` wins over the verbosity flags when set.
pub fn setup_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("seabird_cnv={}", log_level)));

    let installed = if args.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };
    installed.map_err(|e| Error::configuration(format!("Failed to initialize logging: {}", e)))?;

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

/// Create a progress bar for file-level work
pub fn create_progress_bar(total: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg} [{per_sec}] ETA: {eta}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb
}

/// Print a status line without tearing an active progress bar
pub fn print_status(pb: &ProgressBar, enabled: bool, message: impl AsRef<str>) {
    if !enabled {
        return;
    }
    if pb.is_hidden() {
        println!("{}", message.as_ref());
    } else {
        pb.println(message.as_ref());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_report_default() {
        let report = CommandReport::default();
        assert_eq!(report.files_processed, 0);
        assert!(report.is_success());
    }

    #[test]
    fn test_format_size() {
        assert_eq!(CommandReport::format_size(500), "500 B");
        assert_eq!(CommandReport::format_size(1536), "1.50 KB");
        assert_eq!(CommandReport::format_size(1048576), "1.00 MB");
        assert_eq!(CommandReport::format_size(1073741824), "1.00 GB");
    }

    #[test]
    fn test_progress_bar_counts() {
        let pb = create_progress_bar(3, "Converting");
        pb.inc(2);
        assert_eq!(pb.position(), 2);
        assert_eq!(pb.length(), Some(3));
    }
}
