//! Tests for header metadata extraction

use super::*;
use crate::Error;
use crate::app::models::{BadFlagSentinel, Span};
use crate::app::services::cnv_parser::{
    Dialect, HeaderMetadata, HeaderTokenizer, MetadataExtractor,
};
use crate::Result;

fn extract(text: &str) -> Result<HeaderMetadata> {
    let tokenizer = HeaderTokenizer::new(text)?;
    let dialect = Dialect::detect(tokenizer.instrument_lines());
    MetadataExtractor::extract(dialect.clone(), tokenizer.header_lines(&dialect))
}

#[test]
fn test_seasave_variables() {
    let metadata = extract(SEASAVE_CNV).unwrap();

    let names: Vec<_> = metadata.variables.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(names, vec!["prDM", "t090C", "c0S/m", "flag"]);

    let pressure = &metadata.variables[0];
    assert_eq!(pressure.long_name.as_deref(), Some("Pressure, Digiquartz"));
    assert_eq!(pressure.unit.as_deref(), Some("db"));
    assert_eq!(pressure.span, Some(Span::new(3.0, 12.0)));
    assert_eq!(pressure.ordinal, 0);

    let temperature = &metadata.variables[1];
    assert_eq!(temperature.unit.as_deref(), Some("ITS-90, deg C"));

    assert_eq!(metadata.variables[3].unit, None);
    // `flag:  0.000e+00` carries a default value, not a description
    assert_eq!(metadata.variables[3].long_name, None);
    assert_eq!(metadata.bad_flag, Some(BadFlagSentinel::new(-9.990e-29)));
    assert_eq!(metadata.declared_nquan, Some(4));
    assert_eq!(metadata.declared_nvalues, Some(3));
}

#[test]
fn test_seasave_global_attributes() {
    let metadata = extract(SEASAVE_CNV).unwrap();
    let attrs = &metadata.global_attributes;

    assert_eq!(attrs["temperature_sn"], "5621");
    assert_eq!(attrs["ship"], "Antares");
    assert_eq!(attrs["station"], "12");
    assert_eq!(attrs["interval"], "seconds: 0.0416667");
    assert_eq!(attrs["file_type"], "ascii");
    assert_eq!(attrs["instrument_model"], "SBE 9");
    assert_eq!(attrs["datetime"], "2015-06-01T10:12:11");
    assert_eq!(
        attrs["instrument_header"],
        "Sea-Bird SBE 9 Data File:\nSoftware Version Seasave V 7.26.7.107"
    );

    let latitude: f64 = attrs["latitude"].parse().unwrap();
    let longitude: f64 = attrs["longitude"].parse().unwrap();
    assert!((latitude + 17.9145).abs() < 1e-9);
    assert!((longitude + 38.709_666_666).abs() < 1e-6);
}

#[test]
fn test_instrument_and_user_keys_normalize_identically() {
    let text = "* Temperature SN = 1234\n** temperature sn: 1234\n*END*\n";
    let metadata = extract(text).unwrap();
    assert_eq!(metadata.global_attributes["temperature_sn"], "1234\n1234");
}

#[test]
fn test_seasoft_dos_badflag_synonym() {
    let metadata = extract(SEASOFT_DOS_CNV).unwrap();
    assert_eq!(metadata.dialect, Dialect::SeasoftDos);
    assert_eq!(metadata.bad_flag, Some(BadFlagSentinel::new(-9.990e-29)));
    assert_eq!(metadata.global_attributes["cruise"], "Legacy 95");
    assert_eq!(metadata.global_attributes["cell_ctcor"], "3.2500e-06");
    assert!(!metadata.global_attributes.contains_key("instrument_model"));
}

#[test]
fn test_span_resolved_by_name_after_declarations() {
    let text = "\
# span TEMP = 30, -2
# name 0 = TEMP: Temperature [deg C]
*END*
";
    let metadata = extract(text).unwrap();
    assert_eq!(metadata.variables[0].span, Some(Span::new(-2.0, 30.0)));
}

#[test]
fn test_unresolved_span_recorded_raw() {
    let text = "\
# name 0 = TEMP: Temperature [deg C]
# span 5 = 0, 10
# span 0 = not numbers
*END*
";
    let metadata = extract(text).unwrap();
    assert_eq!(metadata.variables[0].span, None);
    assert_eq!(metadata.global_attributes["span_5"], "0, 10");
    assert_eq!(metadata.global_attributes["span_0"], "not numbers");
}

#[test]
fn test_per_variable_bad_flag() {
    let text = "\
# name 0 = TEMP: Temperature [deg C]
# name 1 = PRES: Pressure [db]
# bad_flag = -9.990e-29
# bad_flag 1 = 9999
# bad_flag COND = -1
*END*
";
    let metadata = extract(text).unwrap();
    assert_eq!(metadata.variables[1].bad_flag, Some(9999.0));
    assert_eq!(metadata.global_attributes["bad_flag_cond"], "-1");

    let sentinels = metadata.sentinels();
    assert_eq!(sentinels[0], Some(BadFlagSentinel::new(-9.990e-29)));
    assert_eq!(sentinels[1], Some(BadFlagSentinel::new(9999.0)));
}

#[test]
fn test_unparsable_global_bad_flag_disables_masking() {
    let text = "# name 0 = TEMP\n# bad_flag = none\n*END*\n";
    let metadata = extract(text).unwrap();
    assert_eq!(metadata.bad_flag, None);
    assert_eq!(metadata.global_attributes["bad_flag"], "none");
    assert_eq!(metadata.sentinels(), vec![None]);
}

#[test]
fn test_duplicate_names_get_ordinal_suffix() {
    let text = "# name 0 = t090C: a [deg C]\n# name 1 = t090C: b [deg C]\n*END*\n";
    let metadata = extract(text).unwrap();
    let names: Vec<_> = metadata.variables.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(names, vec!["t090C", "t090C_1"]);
}

#[test]
fn test_empty_variable_name_is_fatal() {
    let text = "# name 0 = TEMP\n# name 1 = : Pressure [db]\n*END*\n";
    match extract(text) {
        Err(Error::MalformedVariableDecl { line, .. }) => assert_eq!(line, 1),
        other => panic!("expected MalformedVariableDecl, got {:?}", other),
    }
}

#[test]
fn test_binary_file_type_rejected() {
    let text = "# name 0 = TEMP\n# file_type = binary\n*END*\n";
    assert!(matches!(
        extract(text),
        Err(Error::UnsupportedFileType { .. })
    ));
}

#[test]
fn test_unknown_line_preserved() {
    let text = "* logger\ncast notes typed by hand\n*END*\n";
    let metadata = extract(text).unwrap();
    assert_eq!(
        metadata.global_attributes["header_line_1"],
        "cast notes typed by hand"
    );
}

#[test]
fn test_derived_attributes_do_not_overwrite() {
    let text = "\
** latitude: 45N station
* NMEA Latitude = 17 54.87 S
*END*
";
    let metadata = extract(text).unwrap();
    assert_eq!(metadata.global_attributes["latitude"], "45N station");
}

#[test]
fn test_nquan_mismatch_is_not_fatal() {
    let text = "# nquan = 5\n# name 0 = TEMP\n*END*\n";
    let metadata = extract(text).unwrap();
    assert_eq!(metadata.declared_nquan, Some(5));
    assert_eq!(metadata.variables.len(), 1);
}
