#![allow(dead_code)]

use gulprelax::{Crystal, Lattice};
use std::fs;
use std::path::Path;

/// Abridged report of a two-atom diamond relaxation.
pub const GULP_LOG: &str = "\
********************************************************************************
*                       GENERAL UTILITY LATTICE PROGRAM                        *
********************************************************************************

  Components of energy :

--------------------------------------------------------------------------------
  Many-body potentials       =         -74.08240712 eV
--------------------------------------------------------------------------------
  Total lattice energy       =         -74.08240712 eV
--------------------------------------------------------------------------------
  Total lattice energy       =           -7147.8126 kJ/(mole unit cells)
--------------------------------------------------------------------------------

  Number of variables =        9

  Start of bulk optimisation :

  Cycle:      0 Energy:       -74.082407  Gnorm:      0.512345  CPU:    0.012
  Cycle:      1 Energy:       -74.501234  Gnorm:      0.101234  CPU:    0.020
  Cycle:      2 Energy:       -74.601853  Gnorm:      0.000012  CPU:    0.028


  **** Optimisation achieved ****


  Final energy =     -74.60185321 eV
  Final Gnorm  =       0.00001234

  Components of energy :

--------------------------------------------------------------------------------
  Many-body potentials       =         -74.60185321 eV
--------------------------------------------------------------------------------
  Total lattice energy       =         -74.60185321 eV
--------------------------------------------------------------------------------
  Total lattice energy       =           -7197.9307 kJ/(mole unit cells)
--------------------------------------------------------------------------------

  Final fractional coordinates of atoms :

--------------------------------------------------------------------------------
   No.  Atomic        x           y          z          Radius
        Label       (Frac)      (Frac)     (Frac)       (Angs)
--------------------------------------------------------------------------------
     1  C     c     0.000000    0.000000    0.000000    0.000000
     2  C     c     0.250100    0.249900    0.250000    0.000000
--------------------------------------------------------------------------------

  Final Cartesian lattice vectors (Angstroms) :

        3.566000    0.000000    0.000000
        0.000000    3.566000    0.000000
        0.000000    0.000000    3.566000


  Final cell parameters and derivatives :

--------------------------------------------------------------------------------
       a            3.566000 Angstrom     dE/de1(xx)    -0.001234 eV/strain
--------------------------------------------------------------------------------

  Final internal derivatives :

--------------------------------------------------------------------------------
   No.  Atomic          x                 y                 z           Radius
        Label          (eV)              (eV)              (eV)        (eV/Angs)
--------------------------------------------------------------------------------
      1 C     c       0.000100          0.000200         -0.000300      0.000000
      2 C     c       0.001000 -0.001234-0.002345      0.000000
--------------------------------------------------------------------------------

  Final stress tensor components (GPa):

--------------------------------------------------------------------------------
      x      -0.12345678  yz      0.00100000
      y      -0.22345678  xz      0.00200000
      z      -0.32345678  xy      0.00300000
--------------------------------------------------------------------------------

  Time to end of optimisation =       0.0300 seconds

  Peak dynamic memory used =       0.52 MB

  Timing analysis for GULP :

--------------------------------------------------------------------------------
  Task / Subroutine                                          Time (Seconds)
--------------------------------------------------------------------------------
  Many-body potentials                                           0.0200
--------------------------------------------------------------------------------
  Total CPU time                                                 0.0312
--------------------------------------------------------------------------------

  Job Finished at 10:12.34 19th October     2026
";

pub const FINAL_ENERGY: f64 = -74.60185321;
pub const CPU_TIME: f64 = 0.0312;

/// Conventional diamond cell with two of its sites.
pub fn diamond() -> Crystal {
    Crystal::new(
        Lattice::from_parameters(3.57, 3.57, 3.57, 90.0, 90.0, 90.0),
        vec!["C".to_string(), "C".to_string()],
        vec![0.0, 0.0, 0.0, 0.25, 0.25, 0.25],
    )
    .unwrap()
}

/// Writes `report` and a stand-in GULP script into `dir`.
///
/// The script copies the deck it receives on stdin to `received.in`,
/// prints the report and exits with `status`. Returns the executable
/// string to put in a job configuration.
pub fn fake_gulp(dir: &Path, report: &str, status: i32) -> String {
    let report_path = dir.join("report.log");
    fs::write(&report_path, report).unwrap();

    let script = dir.join("fake_gulp.sh");
    fs::write(
        &script,
        format!(
            "cat > \"{}\"\ncat \"{}\"\necho 'fake gulp stderr' >&2\nexit {}\n",
            dir.join("received.in").display(),
            report_path.display(),
            status
        ),
    )
    .unwrap();

    format!("sh {}", script.display())
}
