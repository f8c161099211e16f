//! Test utilities and fixtures for CNV parser testing
//!
//! This module provides sample CNV files in each supported dialect and
//! helper functions used across the parser test modules.

use std::io::Write;
use tempfile::NamedTempFile;

// Test modules
mod metadata_tests;

/// Seasave (SBE 9) cast with four variables and one masked conductivity cell
pub const SEASAVE_CNV: &str = r"* Sea-Bird SBE 9 Data File:
* FileName = C:\data\cast001.hex
* Software Version Seasave V 7.26.7.107
* Temperature SN = 5621
* Conductivity SN = 4310
* System UpLoad Time = Jun 01 2015 10:12:11
* NMEA Latitude = 17 54.87 S
* NMEA Longitude = 038 42.58 W
* NMEA UTC (Time) = Jun 01 2015  10:12:11
* Store Lat/Lon Data = Append to Every Scan
** Ship: Antares
** Station: 12
** Operator: J. Doe
# nquan = 4
# nvalues = 3
# units = specified
# name 0 = prDM: Pressure, Digiquartz [db]
# name 1 = t090C: Temperature [ITS-90, deg C]
# name 2 = c0S/m: Conductivity [S/m]
# name 3 = flag:  0.000e+00
# span 0 =      3.000,     12.000
# span 1 =    20.1000,    25.3000
# span 2 =   4.500000,   5.600000
# span 3 = 0.0000e+00, 0.0000e+00
# interval = seconds: 0.0416667
# start_time = Jun 01 2015 10:12:11 [NMEA time, header]
# bad_flag = -9.990e-29
# datcnv_date = Jun 01 2015 11:20:03, 7.26.7.107
# file_type = ascii
*END*
      3.000    20.1000   4.500000  0.000e+00
      6.000    21.5000 -9.990e-29  0.000e+00
     12.000    25.3000   5.600000  0.000e+00
";

/// DOS-era SEACAT upload using the `badflag` spelling
pub const SEASOFT_DOS_CNV: &str = "* SEACAT PROFILER V3.1a  SN 1234   06/01/95  10:12:11.234
* Cell CTcor = 3.2500e-06
** Cruise: Legacy 95
# nquan = 3
# nvalues = 2
# name 0 = pr: pressure [db]
# name 1 = t068: temperature, IPTS-68 [deg C]
# name 2 = sal00: salinity, PSS-78 [PSU]
# span 0 =      1.000,     50.000
# span 1 =    8.2000,    14.9000
# span 2 =   33.0000,   35.1000
# badflag = -9.990e-29
*END*
      1.000    14.9000   33.0000
     50.000     8.2000 -9.990e-29
";

/// Minimal three-variable file in no particular dialect
pub const GENERIC_CNV: &str = "* logger v2
# name 0 = TEMP: Temperature [deg C]
# name 1 = COND: Conductivity [S/m]
# name 2 = PRES: Pressure [db]
# bad_flag = -9.990e-29
*END*
 20.1 3.5 -9.99e-29
 20.2 3.6 10.0
";

/// Header with no end-of-header delimiter
pub const NO_DELIMITER_CNV: &str = "* Sea-Bird SBE 9 Data File:
# name 0 = prDM: Pressure, Digiquartz [db]
      3.000
";

/// Helper to create a temporary file with given content
pub fn create_temp_file(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    write!(temp_file, "{}", content).unwrap();
    temp_file.flush().unwrap();
    temp_file
}
