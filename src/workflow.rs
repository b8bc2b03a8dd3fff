//! One-call relaxation workflows.
//!
//! [`single_optimize`] runs one GULP job and returns the relaxed structure;
//! [`optimize`] chains several jobs, feeding each result into the next stage
//! (the usual recipe is two constant-pressure stages so that the second one
//! starts from a cell GULP has already adjusted).

use crate::calculation::GulpCalculation;
use crate::config::{GulpConfig, OptimizationMode};
use crate::gulp_interface::Result;
use crate::structure::Crystal;
use log::{info, warn};
use std::path::Path;

/// Energy assigned to failed relaxations when ranking candidates
pub const FAILED_ENERGY: f64 = 100_000.0;

/// Default stage sequence for [`optimize`]
pub const DEFAULT_STAGES: [OptimizationMode; 2] = [OptimizationMode::Conp, OptimizationMode::Conp];

/// Result of a successful relaxation.
#[derive(Debug, Clone, PartialEq)]
pub struct Relaxation {
    /// Optimised structure
    pub crystal: Crystal,
    /// Final total lattice energy, eV
    pub energy: f64,
    /// GULP CPU seconds, summed over stages
    pub cpu_time: f64,
}

/// Job parameters shared by every stage of a workflow.
#[derive(Debug, Clone)]
pub struct JobSpec<'a> {
    /// Force-field library
    pub forcefield: &'a str,
    /// GULP executable
    pub executable: &'a str,
    /// Working directory
    pub workdir: &'a Path,
    /// File label
    pub label: &'a str,
    /// Remove job files afterwards
    pub clean: bool,
}

impl JobSpec<'_> {
    fn config(&self, mode: OptimizationMode, base: &GulpConfig) -> GulpConfig {
        GulpConfig {
            label: self.label.to_string(),
            workdir: self.workdir.to_path_buf(),
            forcefield: self.forcefield.to_string(),
            mode,
            executable: self.executable.to_string(),
            ..base.clone()
        }
    }
}

/// Runs one GULP job with the given mode.
pub fn single_optimize(
    crystal: &Crystal,
    spec: &JobSpec<'_>,
    mode: OptimizationMode,
) -> Result<Relaxation> {
    single_optimize_with(crystal, spec, mode, &GulpConfig::default())
}

/// As [`single_optimize`], taking the remaining parameters from `base`.
pub fn single_optimize_with(
    crystal: &Crystal,
    spec: &JobSpec<'_>,
    mode: OptimizationMode,
    base: &GulpConfig,
) -> Result<Relaxation> {
    let mut calc = GulpCalculation::new(crystal.clone(), spec.config(mode, base))?;
    if let Err(e) = calc.run(spec.clean) {
        warn!("GULP error in single optimize: {}", e);
        return Err(e);
    }

    Ok(Relaxation {
        crystal: calc.to_crystal()?,
        energy: calc.energy().unwrap_or(FAILED_ENERGY),
        cpu_time: calc.cpu_time(),
    })
}

/// Runs the stages in order, stopping at the first failure.
pub fn optimize(
    crystal: &Crystal,
    spec: &JobSpec<'_>,
    stages: &[OptimizationMode],
) -> Result<Relaxation> {
    optimize_with(crystal, spec, stages, &GulpConfig::default())
}

/// As [`optimize`], taking the remaining parameters from `base`.
///
/// With no stages the input structure is returned after a single point.
pub fn optimize_with(
    crystal: &Crystal,
    spec: &JobSpec<'_>,
    stages: &[OptimizationMode],
    base: &GulpConfig,
) -> Result<Relaxation> {
    if stages.is_empty() {
        return single_optimize_with(crystal, spec, OptimizationMode::Single, base);
    }

    let mut current = crystal.clone();
    let mut energy = FAILED_ENERGY;
    let mut cpu_time = 0.0;

    for (n, &mode) in stages.iter().enumerate() {
        let stage = single_optimize_with(&current, spec, mode, base)?;
        info!(
            "Stage {}/{} ({}): E = {:.6} eV",
            n + 1,
            stages.len(),
            mode,
            stage.energy
        );
        cpu_time += stage.cpu_time;
        energy = stage.energy;
        current = stage.crystal;
    }

    Ok(Relaxation {
        crystal: current,
        energy,
        cpu_time,
    })
}

/// Energy of a relaxation, or [`FAILED_ENERGY`] if it failed.
///
/// # Examples
///
/// ```
/// use gulprelax::gulp_interface::GulpError;
/// use gulprelax::workflow::{energy_or_penalty, Relaxation, FAILED_ENERGY};
///
/// let failed: Result<Relaxation, GulpError> =
///     Err(GulpError::Calculation("segfault".to_string()));
/// assert_eq!(energy_or_penalty(&failed), FAILED_ENERGY);
/// ```
pub fn energy_or_penalty(result: &Result<Relaxation>) -> f64 {
    match result {
        Ok(r) => r.energy,
        Err(_) => FAILED_ENERGY,
    }
}
