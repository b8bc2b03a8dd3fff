mod common;

use common::{CPU_TIME, FINAL_ENERGY, GULP_LOG};
use gulprelax::calculation::CalculationReport;
use gulprelax::parser::{parse_output, read_output_file, ParseError};

#[test]
fn test_parse_full_report() {
    let output = parse_output(GULP_LOG).unwrap();

    assert_eq!(output.energy, FINAL_ENERGY);
    assert_eq!(output.iterations, 2);
    assert!((output.cpu_time - CPU_TIME).abs() < 1e-12);
    assert!(output.finished);

    let stress = output.stress.unwrap();
    let expected = [
        -0.12345678,
        -0.22345678,
        -0.32345678,
        0.001,
        0.002,
        0.003,
    ];
    for (s, e) in stress.iter().zip(expected.iter()) {
        assert!((s - e).abs() < 1e-12);
    }

    assert_eq!(output.labels.as_deref(), Some(&["C".to_string(), "C".to_string()][..]));
    let coords = output.frac_coords.unwrap();
    assert_eq!(coords.len(), 6);
    assert!((coords[3] - 0.2501).abs() < 1e-12);
    assert!((coords[4] - 0.2499).abs() < 1e-12);

    let lattice = output.lattice.unwrap();
    assert!((lattice.volume() - 3.566f64.powi(3)).abs() < 1e-9);
}

#[test]
fn test_forces_from_merged_derivative_row() {
    let output = parse_output(GULP_LOG).unwrap();
    assert_eq!(output.num_force_rows(), Some(2));

    let forces = output.forces.unwrap();
    let expected = [-0.0001, -0.0002, 0.0003, -0.001, 0.001234, 0.002345];
    for (f, e) in forces.iter().zip(expected.iter()) {
        assert!((f - e).abs() < 1e-12, "{} != {}", f, e);
    }
}

#[test]
fn test_single_point_report_without_optimisation_sections() {
    let report = "\
  Total lattice energy       =         -12.34567890 eV
  Total CPU time                                                 0.0040
  Job Finished at 09:00.00 19th October     2026
";
    let output = parse_output(report).unwrap();
    assert_eq!(output.energy, -12.3456789);
    assert_eq!(output.iterations, 0);
    assert!(output.stress.is_none());
    assert!(output.forces.is_none());
    assert!(output.lattice.is_none());
    assert!(output.finished);
}

#[test]
fn test_unfinished_report_still_parses() {
    let cut = GULP_LOG.find("  Job Finished").unwrap();
    let output = parse_output(&GULP_LOG[..cut]).unwrap();
    assert!(!output.finished);
    assert_eq!(output.energy, FINAL_ENERGY);
}

#[test]
fn test_report_without_energy() {
    let report = "  Error in input: species C not found in library\n";
    assert_eq!(parse_output(report), Err(ParseError::MissingEnergy));
}

#[test]
fn test_read_output_file_and_json_report() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("_gulp.log");
    std::fs::write(&path, GULP_LOG).unwrap();

    let output = read_output_file(&path).unwrap();
    let json = serde_json::to_value(CalculationReport::from(&output)).unwrap();
    assert_eq!(json["energy"], FINAL_ENERGY);
    assert_eq!(json["iterations"], 2);
    assert_eq!(json["forces"].as_array().unwrap().len(), 2);
    assert_eq!(json["labels"][1], "C");
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = read_output_file(&dir.path().join("absent.log")).unwrap_err();
    assert!(matches!(err, ParseError::Read { .. }));
}

#[test]
fn test_overflowed_table_fields_fail_the_parse() {
    let coords = GULP_LOG.replace("0.250100", "********");
    assert!(matches!(
        parse_output(&coords),
        Err(ParseError::InvalidNumber { ref text, .. }) if text == "********"
    ));

    let derivatives = GULP_LOG.replace("0.000200", "     NaN");
    assert!(matches!(
        parse_output(&derivatives),
        Err(ParseError::InvalidNumber { ref text, .. }) if text == "NaN"
    ));
}
