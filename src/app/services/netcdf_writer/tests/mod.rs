//! Test utilities for netCDF export testing

use crate::app::models::Dataset;
use crate::app::services::cnv_parser::parse_str;


/// Small cast with a masked cell, a unit, a span and a name needing sanitizing
pub const EXPORT_CNV: &str = "* Sea-Bird SBE 9 Data File:
* Temperature SN = 5621
** Ship: Antares
# name 0 = prDM: Pressure, Digiquartz [db]
# name 1 = c0S/m: Conductivity [S/m]
# name 2 = flag
# span 0 = 3.000, 12.000
# bad_flag = -9.990e-29
# bad_flag 2 = 1
*END*
      3.000   4.500000  0.000e+00
      6.000 -9.990e-29  0.000e+00
     12.000   5.600000  0.000e+00
";

/// Dataset parsed from [`EXPORT_CNV`]
pub fn export_dataset() -> Dataset {
    parse_str(EXPORT_CNV).unwrap()
}

/// Header-only dataset
pub fn empty_dataset() -> Dataset {
    parse_str("# name 0 = TEMP: Temperature [deg C]\n*END*\n").unwrap()
}
