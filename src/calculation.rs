//! Stateful GULP calculator.
//!
//! A [`GulpCalculation`] owns one structure and one job configuration and
//! walks through write → execute → read → clean. After a successful run it
//! exposes the parsed numbers and the optimised structure.
//!
//! ```no_run
//! use gulprelax::calculation::GulpCalculation;
//! use gulprelax::config::{GulpConfig, OptimizationMode};
//! # use gulprelax::structure::{Crystal, Lattice};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # let diamond = Crystal::new(
//! #     Lattice::from_parameters(3.57, 3.57, 3.57, 90.0, 90.0, 90.0),
//! #     vec!["C".to_string(), "C".to_string()],
//! #     vec![0.0, 0.0, 0.0, 0.25, 0.25, 0.25],
//! # )?;
//! let config = GulpConfig {
//!     forcefield: "tersoff.lib".to_string(),
//!     mode: OptimizationMode::Single,
//!     ..GulpConfig::default()
//! };
//! let mut calc = GulpCalculation::new(diamond, config)?;
//! calc.run(true)?;
//! println!("{:?} eV, stress {:?}", calc.energy(), calc.stress());
//! # Ok(())
//! # }
//! ```

use crate::cleanup::{self, CleanupReport};
use crate::config::GulpConfig;
use crate::gulp_interface::{ForceFieldInterface, GulpError, GulpInterface, Result};
use crate::naming::JobFiles;
use crate::parser::GulpOutput;
use crate::structure::Crystal;
use crate::validation;
use log::{debug, info, warn};
use nalgebra::{DVector, Vector6};
use serde::{Deserialize, Serialize};

/// One GULP job over one structure.
pub struct GulpCalculation {
    crystal: Crystal,
    interface: GulpInterface,
    files: JobFiles,
    output: Option<GulpOutput>,
}

impl GulpCalculation {
    /// Validates the job and prepares its working directory.
    pub fn new(crystal: Crystal, config: GulpConfig) -> Result<Self> {
        validation::validate_config(&config).map_err(|e| GulpError::Invalid(e.to_string()))?;
        validation::validate_crystal(&crystal).map_err(|e| GulpError::Invalid(e.to_string()))?;

        let files = JobFiles::new(&config);
        files.ensure_workdir()?;

        Ok(Self {
            crystal,
            interface: GulpInterface::new(config),
            files,
            output: None,
        })
    }

    /// Writes, executes and reads the job; removes its files when `clean` is set.
    ///
    /// Cleaning also happens when the job failed.
    pub fn run(&mut self, clean: bool) -> Result<&GulpOutput> {
        let outcome = self.write().and_then(|()| self.execute()).and_then(|()| self.read());

        if clean {
            self.clean();
        }

        match outcome {
            Ok(output) => {
                info!(
                    "GULP {} finished: E = {:.6} eV after {} cycles ({:.2} s CPU)",
                    self.config().mode,
                    output.energy,
                    output.iterations,
                    output.cpu_time
                );
                if !output.finished {
                    warn!("GULP report has no 'Job Finished' line");
                }
                Ok(&*self.output.insert(output))
            }
            Err(e) => {
                warn!("GULP calculation is wrong: {}", e);
                self.output = None;
                Err(e)
            }
        }
    }

    /// Writes the input deck.
    pub fn write(&self) -> Result<()> {
        self.interface.write_input(&self.crystal, &self.files.input)
    }

    /// Runs GULP on the deck.
    pub fn execute(&self) -> Result<()> {
        self.interface
            .run_calculation(&self.files.input, &self.files.output)
    }

    /// Parses the report without storing it.
    pub fn read(&self) -> Result<GulpOutput> {
        self.interface.read_output(&self.files.output)
    }

    /// Removes the deck, report and dump.
    pub fn clean(&self) -> CleanupReport {
        debug!("Cleaning job files in {}", self.files.workdir.display());
        cleanup::remove_job_files(&self.files)
    }

    /// Job configuration.
    pub fn config(&self) -> &GulpConfig {
        self.interface.config()
    }

    /// Job file paths.
    pub fn files(&self) -> &JobFiles {
        &self.files
    }

    /// Structure the job was created with.
    pub fn input_crystal(&self) -> &Crystal {
        &self.crystal
    }

    /// Parsed report of the last successful run.
    pub fn output(&self) -> Option<&GulpOutput> {
        self.output.as_ref()
    }

    /// Total lattice energy in eV.
    pub fn energy(&self) -> Option<f64> {
        self.output.as_ref().map(|o| o.energy)
    }

    /// Stress tensor (Voigt order, GPa).
    pub fn stress(&self) -> Option<&Vector6<f64>> {
        self.output.as_ref().and_then(|o| o.stress.as_ref())
    }

    /// Flattened forces in eV/Å.
    pub fn forces(&self) -> Option<&DVector<f64>> {
        self.output.as_ref().and_then(|o| o.forces.as_ref())
    }

    /// Number of optimisation cycles GULP reported.
    pub fn iterations(&self) -> usize {
        self.output.as_ref().map_or(0, |o| o.iterations)
    }

    /// CPU seconds GULP reported.
    pub fn cpu_time(&self) -> f64 {
        self.output.as_ref().map_or(0.0, |o| o.cpu_time)
    }

    /// True once GULP printed its normal termination line.
    pub fn optimized(&self) -> bool {
        self.output.as_ref().is_some_and(|o| o.finished)
    }

    /// Structure after the run.
    ///
    /// Lattice and coordinates come from the report when present, otherwise
    /// from the input structure. Species are always those of the input.
    pub fn to_crystal(&self) -> Result<Crystal> {
        let Some(output) = &self.output else {
            return Ok(self.crystal.clone());
        };

        let lattice = output
            .lattice
            .clone()
            .unwrap_or_else(|| self.crystal.lattice.clone());
        let coords = output
            .frac_coords
            .as_ref()
            .unwrap_or(&self.crystal.frac_coords)
            .iter()
            .copied()
            .collect();

        Ok(self.crystal.with_geometry(lattice, coords)?)
    }
}

/// Serialisable summary of a parsed report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationReport {
    /// Total lattice energy, eV
    pub energy: f64,
    /// Voigt stress, GPa
    pub stress: Option<Vec<f64>>,
    /// Per-atom forces, eV/Å
    pub forces: Option<Vec<[f64; 3]>>,
    /// Optimisation cycles
    pub iterations: usize,
    /// CPU seconds
    pub cpu_time: f64,
    /// "Job Finished" seen
    pub finished: bool,
    /// Final lattice vectors as rows
    pub lattice: Option<[[f64; 3]; 3]>,
    /// Final site labels
    pub labels: Option<Vec<String>>,
    /// Final fractional coordinates
    pub frac_coords: Option<Vec<[f64; 3]>>,
}

fn triples(v: &DVector<f64>) -> Vec<[f64; 3]> {
    v.as_slice()
        .chunks_exact(3)
        .map(|c| [c[0], c[1], c[2]])
        .collect()
}

impl From<&GulpOutput> for CalculationReport {
    fn from(output: &GulpOutput) -> Self {
        Self {
            energy: output.energy,
            stress: output.stress.map(|s| s.iter().copied().collect()),
            forces: output.forces.as_ref().map(triples),
            iterations: output.iterations,
            cpu_time: output.cpu_time,
            finished: output.finished,
            lattice: output.lattice.as_ref().map(|l| {
                let m = &l.matrix;
                [
                    [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
                    [m[(1, 0)], m[(1, 1)], m[(1, 2)]],
                    [m[(2, 0)], m[(2, 1)], m[(2, 2)]],
                ]
            }),
            labels: output.labels.clone(),
            frac_coords: output.frac_coords.as_ref().map(triples),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::Lattice;
    use nalgebra::Matrix3;

    fn output() -> GulpOutput {
        GulpOutput {
            energy: -12.5,
            stress: Some(Vector6::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0)),
            forces: Some(DVector::from_vec(vec![0.1, 0.2, 0.3, -0.1, -0.2, -0.3])),
            iterations: 7,
            cpu_time: 0.5,
            finished: true,
            frac_coords: Some(DVector::from_vec(vec![0.0, 0.0, 0.0, 0.26, 0.24, 0.25])),
            labels: Some(vec!["C".into(), "C".into()]),
            lattice: Some(Lattice::from_matrix(Matrix3::from_diagonal_element(3.6))),
        }
    }

    #[test]
    fn test_report_groups_per_atom_triples() {
        let report = CalculationReport::from(&output());
        assert_eq!(report.forces.unwrap()[1], [-0.1, -0.2, -0.3]);
        assert_eq!(report.stress.unwrap(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(report.lattice.unwrap()[2], [0.0, 0.0, 3.6]);
        assert_eq!(report.frac_coords.unwrap()[1], [0.26, 0.24, 0.25]);
    }

    #[test]
    fn test_report_serializes_to_json() {
        let json = serde_json::to_string(&CalculationReport::from(&output())).unwrap();
        assert!(json.contains("\"energy\":-12.5"));
        let back: CalculationReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.iterations, 7);
    }

    #[test]
    fn test_to_crystal_uses_report_geometry() {
        let dir = tempfile::tempdir().unwrap();
        let crystal = Crystal::new(
            Lattice::from_parameters(3.57, 3.57, 3.57, 90.0, 90.0, 90.0),
            vec!["C".into(), "C".into()],
            vec![0.0, 0.0, 0.0, 0.25, 0.25, 0.25],
        )
        .unwrap();
        let config = GulpConfig {
            workdir: dir.path().to_path_buf(),
            ..GulpConfig::default()
        };
        let mut calc = GulpCalculation::new(crystal.clone(), config).unwrap();
        assert_eq!(calc.to_crystal().unwrap(), crystal);

        calc.output = Some(output());
        let relaxed = calc.to_crystal().unwrap();
        assert_eq!(relaxed.get_frac_coords(1), [0.26, 0.24, 0.25]);
        assert!((relaxed.lattice.volume() - 3.6f64.powi(3)).abs() < 1e-9);
        assert_eq!(calc.iterations(), 7);
        assert!(calc.optimized());

        let mut wrong = output();
        wrong.frac_coords = Some(DVector::from_vec(vec![0.0; 9]));
        calc.output = Some(wrong);
        assert!(matches!(calc.to_crystal(), Err(GulpError::Structure(_))));
    }
}
