//! Dump command implementation
//!
//! Prints a file's global attributes in sorted order followed by each
//! variable and its attributes. CNV files are parsed; `.nc` files are read
//! back with the netCDF reader so exported files can be inspected too.

use super::shared::CommandReport;
use crate::app::models::Dataset;
use crate::app::services::cnv_parser::CnvParser;
use crate::app::services::netcdf_writer::{ArrayFile, read_netcdf};
use crate::cli::args::DumpArgs;
use crate::config::Config;
use crate::constants::NETCDF_EXTENSION;
use anyhow::Context;
use colored::*;
use std::io::{self, Write};
use std::path::Path;
use std::time::Instant;
use tokio::task;

/// What a dumped file decoded to
#[derive(Debug)]
pub enum DumpSource {
    Cnv(Dataset),
    NetCdf(ArrayFile),
}

/// Run the dump command
pub async fn run_dump(args: &DumpArgs) -> anyhow::Result<CommandReport> {
    let start = Instant::now();

    let mut config = Config::from_env()?;
    if let Some(epsilon) = args.bad_flag_epsilon {
        config.parser.bad_flag_epsilon = epsilon;
    }

    let input = args.input.clone();
    let source = task::spawn_blocking(move || load(&input, &config))
        .await
        .context("Dump task failed")??;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match &source {
        DumpSource::Cnv(dataset) => write_dataset(&mut out, &args.input, dataset),
        DumpSource::NetCdf(file) => write_array_file(&mut out, &args.input, file),
    }
    .context("Failed to write to stdout")?;

    Ok(CommandReport {
        files_processed: 1,
        processing_time: start.elapsed(),
        ..CommandReport::default()
    })
}

/// Decode a file by extension
pub fn load(path: &Path, config: &Config) -> crate::Result<DumpSource> {
    if is_netcdf(path) {
        Ok(DumpSource::NetCdf(read_netcdf(path)?))
    } else {
        let parser = CnvParser::new(config.parser.clone());
        Ok(DumpSource::Cnv(parser.parse_file(path)?))
    }
}

fn is_netcdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(NETCDF_EXTENSION))
}

/// Write a parsed CNV dataset
pub fn write_dataset<W: Write>(out: &mut W, path: &Path, dataset: &Dataset) -> io::Result<()> {
    writeln!(out, "file: {}", path.display())?;
    writeln!(out, "Global attributes")?;
    for name in dataset.global_attribute_names() {
        let value = dataset.global_attribute(name).unwrap_or_default();
        write_attribute(out, name, value)?;
    }

    writeln!(out)?;
    writeln!(out, "Variables")?;
    for variable in dataset.variables() {
        writeln!(out, "{}", variable.name().bright_red())?;
        for (key, value) in variable.spec.attributes() {
            write_attribute(out, key, &value)?;
        }
        write_attribute(out, "missing", &variable.missing_count().to_string())?;
        if variable.out_of_span > 0 {
            write_attribute(out, "out_of_span", &variable.out_of_span.to_string())?;
        }
    }
    Ok(())
}

/// Write a netCDF file read back from disk
pub fn write_array_file<W: Write>(out: &mut W, path: &Path, file: &ArrayFile) -> io::Result<()> {
    writeln!(out, "file: {} (CDF-{})", path.display(), file.version)?;

    let dimensions: Vec<String> = file
        .dimensions
        .iter()
        .map(|d| {
            if d.is_record {
                format!("{} = UNLIMITED ({})", d.name, d.length)
            } else {
                format!("{} = {}", d.name, d.length)
            }
        })
        .collect();
    writeln!(out, "Dimensions: {}", dimensions.join(", "))?;

    writeln!(out, "Global attributes")?;
    let mut attributes: Vec<_> = file.attributes.iter().collect();
    attributes.sort_by(|a, b| a.name.cmp(&b.name));
    for attribute in attributes {
        write_attribute(out, &attribute.name, &attribute.value.to_string())?;
    }

    writeln!(out)?;
    writeln!(out, "Variables")?;
    for variable in &file.variables {
        writeln!(
            out,
            "{} ({})",
            variable.name.bright_red(),
            variable.dimensions.join(", ")
        )?;
        for attribute in &variable.attributes {
            write_attribute(out, &attribute.name, &attribute.value.to_string())?;
        }
    }
    Ok(())
}

fn write_attribute<W: Write>(out: &mut W, key: &str, value: &str) -> io::Result<()> {
    // Joined multi-line values stay under their key
    writeln!(out, "\t{}: {}", key.bright_yellow(), value.replace('\n', "\n\t\t"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::services::netcdf_writer::export;
    use tempfile::TempDir;

    const CAST: &str = "* Sea-Bird SBE 9 Data File:
** Ship: Antares
** Cruise: Leg 2
# name 0 = prDM: Pressure, Digiquartz [db]
# name 1 = t090C: Temperature [ITS-90, deg C]
# span 0 = 1.000, 2.000
# bad_flag = -9.990e-29
*END*
      1.000    12.5000
      2.000 -9.990e-29
";

    fn render(source: &DumpSource, path: &Path) -> String {
        colored::control::set_override(false);
        let mut buffer = Vec::new();
        match source {
            DumpSource::Cnv(dataset) => write_dataset(&mut buffer, path, dataset).unwrap(),
            DumpSource::NetCdf(file) => write_array_file(&mut buffer, path, file).unwrap(),
        }
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_dump_cnv_lists_sorted_attributes_and_variables() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cast.cnv");
        std::fs::write(&path, CAST).unwrap();

        let source = load(&path, &Config::default()).unwrap();
        assert!(matches!(source, DumpSource::Cnv(_)));
        let text = render(&source, &path);

        assert!(text.contains("\tcruise: Leg 2"));
        assert!(text.contains("\tship: Antares"));
        assert!(text.find("\tcruise:").unwrap() < text.find("\tship:").unwrap());
        assert!(text.contains("\nVariables\nprDM\n"));
        assert!(text.contains("\tunits: ITS-90, deg C"));
        assert!(text.contains("\tmissing: 1"));
    }

    #[test]
    fn test_dump_netcdf_reads_exported_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cast.nc");
        let dataset = crate::parse_str(CAST).unwrap();
        export(&dataset, &path).unwrap();

        let source = load(&path, &Config::default()).unwrap();
        assert!(matches!(source, DumpSource::NetCdf(_)));
        let text = render(&source, &path);

        assert!(text.contains("(CDF-1)"));
        assert!(text.contains("Dimensions: scan = 2"));
        assert!(text.contains("\tship: Antares"));
        assert!(text.contains("t090C (scan)"));
        assert!(text.contains("\tspan: 1, 2"));
    }

    #[test]
    fn test_dump_parse_error_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.cnv");
        std::fs::write(&path, "# name 0 = prDM: Pressure [db]\n 1.0\n").unwrap();

        let error = load(&path, &Config::default()).unwrap_err();
        assert!(error.is_parse_error());
    }
}
