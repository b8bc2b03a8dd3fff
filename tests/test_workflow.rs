mod common;

use common::{diamond, fake_gulp, CPU_TIME, FINAL_ENERGY, GULP_LOG};
use gulprelax::calculation::GulpCalculation;
use gulprelax::config::{GulpConfig, OptimizationMode};
use gulprelax::gulp_interface::GulpError;
use gulprelax::parser::ParseError;
use gulprelax::workflow::{
    energy_or_penalty, optimize, single_optimize, JobSpec, DEFAULT_STAGES, FAILED_ENERGY,
};
use std::fs;

fn spec<'a>(exe: &'a str, workdir: &'a std::path::Path, clean: bool) -> JobSpec<'a> {
    JobSpec {
        forcefield: "tersoff.lib",
        executable: exe,
        workdir,
        label: "_",
        clean,
    }
}

#[test]
fn test_single_optimize_returns_relaxed_structure() {
    let dir = tempfile::tempdir().unwrap();
    let exe = fake_gulp(dir.path(), GULP_LOG, 0);
    let workdir = dir.path().join("jobs");

    let relaxed = single_optimize(
        &diamond(),
        &spec(&exe, &workdir, true),
        OptimizationMode::Conp,
    )
    .unwrap();

    assert_eq!(relaxed.energy, FINAL_ENERGY);
    assert!((relaxed.cpu_time - CPU_TIME).abs() < 1e-12);
    assert_eq!(relaxed.crystal.species, vec!["C", "C"]);
    assert!((relaxed.crystal.lattice.volume() - 3.566f64.powi(3)).abs() < 1e-9);
    assert!((relaxed.crystal.get_frac_coords(1)[0] - 0.2501).abs() < 1e-12);

    // GULP received the deck on stdin.
    let received = fs::read_to_string(dir.path().join("received.in")).unwrap();
    assert!(received.starts_with("opti stress conp conjugate nosymmetry"));
    assert!(received.contains("library tersoff.lib"));

    assert!(!workdir.join("_gulp.in").exists());
    assert!(!workdir.join("_gulp.log").exists());
}

#[test]
fn test_keep_leaves_job_files() {
    let dir = tempfile::tempdir().unwrap();
    let exe = fake_gulp(dir.path(), GULP_LOG, 0);
    let workdir = dir.path().join("jobs");

    single_optimize(
        &diamond(),
        &spec(&exe, &workdir, false),
        OptimizationMode::Conv,
    )
    .unwrap();

    let deck = fs::read_to_string(workdir.join("_gulp.in")).unwrap();
    assert!(deck.starts_with("opti stress conv conjugate nosymmetry"));
    assert_eq!(fs::read_to_string(workdir.join("_gulp.log")).unwrap(), GULP_LOG);
}

#[test]
fn test_failed_exit_status_is_an_error_and_cleans_up() {
    let dir = tempfile::tempdir().unwrap();
    let exe = fake_gulp(dir.path(), GULP_LOG, 3);
    let workdir = dir.path().join("jobs");

    let result = single_optimize(
        &diamond(),
        &spec(&exe, &workdir, true),
        OptimizationMode::Conp,
    );
    match &result {
        Err(GulpError::Calculation(msg)) => assert!(msg.contains("fake gulp stderr")),
        other => panic!("expected a calculation error, got {:?}", other.as_ref().map(|r| r.energy)),
    }
    assert_eq!(energy_or_penalty(&result), FAILED_ENERGY);
    assert!(!workdir.join("_gulp.in").exists());
    assert!(!workdir.join("_gulp.log").exists());
}

#[test]
fn test_nan_energy_is_a_failure() {
    let dir = tempfile::tempdir().unwrap();
    let report = GULP_LOG.replace("-74.60185321 eV", "NaN eV");
    let exe = fake_gulp(dir.path(), &report, 0);
    let workdir = dir.path().join("jobs");

    let result = single_optimize(
        &diamond(),
        &spec(&exe, &workdir, true),
        OptimizationMode::Conp,
    );
    assert!(matches!(
        result,
        Err(GulpError::Parse(ParseError::NonFiniteEnergy(_)))
    ));
    assert_eq!(energy_or_penalty(&result), FAILED_ENERGY);
}

#[test]
fn test_optimize_chains_stages_and_sums_cpu_time() {
    let dir = tempfile::tempdir().unwrap();
    let exe = fake_gulp(dir.path(), GULP_LOG, 0);
    let workdir = dir.path().join("jobs");

    let relaxed = optimize(&diamond(), &spec(&exe, &workdir, true), &DEFAULT_STAGES).unwrap();
    assert_eq!(relaxed.energy, FINAL_ENERGY);
    assert!((relaxed.cpu_time - 2.0 * CPU_TIME).abs() < 1e-12);
    assert_eq!(energy_or_penalty(&Ok(relaxed)), FINAL_ENERGY);

    // The second stage starts from the cell the first one produced.
    let received = fs::read_to_string(dir.path().join("received.in")).unwrap();
    assert!(received.contains("    3.566000    3.566000    3.566000"));
}

#[test]
fn test_optimize_without_stages_runs_single_point() {
    let dir = tempfile::tempdir().unwrap();
    let exe = fake_gulp(dir.path(), GULP_LOG, 0);
    let workdir = dir.path().join("jobs");

    optimize(&diamond(), &spec(&exe, &workdir, true), &[]).unwrap();
    let received = fs::read_to_string(dir.path().join("received.in")).unwrap();
    assert!(received.starts_with("grad conp stress"));
}

#[test]
fn test_missing_executable_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let workdir = dir.path().join("jobs");
    let result = single_optimize(
        &diamond(),
        &spec("gulprelax-no-such-binary", &workdir, true),
        OptimizationMode::Single,
    );
    assert!(matches!(result, Err(GulpError::Io(_))));
}

#[test]
fn test_calculation_accessors_after_run() {
    let dir = tempfile::tempdir().unwrap();
    let exe = fake_gulp(dir.path(), GULP_LOG, 0);
    let config = GulpConfig {
        label: "c2_".to_string(),
        workdir: dir.path().join("jobs"),
        forcefield: "tersoff.lib".to_string(),
        mode: OptimizationMode::Single,
        executable: exe,
        ..GulpConfig::default()
    };

    let mut calc = GulpCalculation::new(diamond(), config).unwrap();
    assert!(calc.energy().is_none());
    calc.run(false).unwrap();

    assert_eq!(calc.energy(), Some(FINAL_ENERGY));
    assert_eq!(calc.iterations(), 2);
    assert!(calc.optimized());
    assert_eq!(calc.forces().map(|f| f.len()), Some(6));
    assert!((calc.stress().unwrap()[5] - 0.003).abs() < 1e-12);
    assert!(calc.files().input.ends_with("c2_gulp.in"));
    assert!(calc.files().output.exists());

    let report = calc.clean();
    assert_eq!(report.removed.len(), 2);
    assert!(report.is_clean());
}

#[test]
fn test_invalid_job_is_rejected_before_running() {
    let dir = tempfile::tempdir().unwrap();
    let config = GulpConfig {
        workdir: dir.path().join("jobs"),
        forcefield: String::new(),
        ..GulpConfig::default()
    };
    assert!(matches!(
        GulpCalculation::new(diamond(), config),
        Err(GulpError::Invalid(_))
    ));
    assert!(!dir.path().join("jobs").exists());
}
