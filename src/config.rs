//! Job configuration for a single GULP calculation.
//!
//! This module defines:
//!
//! - [`OptimizationMode`]: what GULP is asked to do with the structure
//! - [`GulpConfig`]: everything needed to write, run and clean up one job
//!
//! Defaults mirror the settings file defaults; see
//! [`settings`](crate::settings) for the hierarchical configuration layer.

use crate::settings::SettingsManager;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Default Ewald real-space cutoff written to every deck
pub const DEFAULT_EWALD_CUTOFF: f64 = 10.0;
/// Default maximum number of optimisation cycles
pub const DEFAULT_MAX_STEPS: u32 = 1000;

/// Kind of GULP run.
///
/// # Examples
///
/// ```
/// use gulprelax::config::OptimizationMode;
///
/// let mode: OptimizationMode = "CONV".parse().unwrap();
/// assert_eq!(mode, OptimizationMode::Conv);
/// assert!("relax".parse::<OptimizationMode>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OptimizationMode {
    /// Relax atomic positions at constant cell volume
    Conv,
    /// Relax positions and cell at constant pressure
    #[default]
    Conp,
    /// Single point: energy, gradients and stress only
    Single,
}

impl OptimizationMode {
    /// Keyword used for this mode in the input deck and on the command line.
    pub fn keyword(self) -> &'static str {
        match self {
            OptimizationMode::Conv => "conv",
            OptimizationMode::Conp => "conp",
            OptimizationMode::Single => "single",
        }
    }

    /// True for the modes that move atoms.
    pub fn is_relaxation(self) -> bool {
        !matches!(self, OptimizationMode::Single)
    }

    /// Parses a comma-separated list such as `conp,conv`.
    pub fn parse_list(list: &str) -> Result<Vec<Self>, String> {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .collect()
    }
}

impl fmt::Display for OptimizationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for OptimizationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "conv" => Ok(OptimizationMode::Conv),
            "conp" => Ok(OptimizationMode::Conp),
            "single" => Ok(OptimizationMode::Single),
            other => Err(format!(
                "Unknown optimisation mode '{}'. Expected one of: conv, conp, single",
                other
            )),
        }
    }
}

/// Parameters of one GULP job.
///
/// # Examples
///
/// ```
/// use gulprelax::config::{GulpConfig, OptimizationMode};
///
/// let config = GulpConfig {
///     forcefield: "tersoff.lib".to_string(),
///     mode: OptimizationMode::Single,
///     ..GulpConfig::default()
/// };
/// assert_eq!(config.label, "_");
/// assert_eq!(config.max_steps, 1000);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GulpConfig {
    /// Prefix of the deck and report file names
    pub label: String,
    /// Directory holding the deck and report
    pub workdir: PathBuf,
    /// Force-field library passed to the `library` keyword
    pub forcefield: String,
    /// What GULP should do
    pub mode: OptimizationMode,
    /// `maxcycle` for relaxations
    pub max_steps: u32,
    /// Executable, optionally preceded by launcher words
    pub executable: String,
    /// Deck file name (appended to the label)
    pub input_name: String,
    /// Report file name (appended to the label)
    pub output_name: String,
    /// CIF file GULP should dump the final structure to
    pub dump: Option<PathBuf>,
    /// Ewald real-space cutoff
    pub ewald_cutoff: f64,
}

impl Default for GulpConfig {
    fn default() -> Self {
        Self {
            label: "_".to_string(),
            workdir: PathBuf::from("tmp"),
            forcefield: "reax".to_string(),
            mode: OptimizationMode::Conp,
            max_steps: DEFAULT_MAX_STEPS,
            executable: "gulp".to_string(),
            input_name: "gulp.in".to_string(),
            output_name: "gulp.log".to_string(),
            dump: None,
            ewald_cutoff: DEFAULT_EWALD_CUTOFF,
        }
    }
}

impl GulpConfig {
    /// Seeds a configuration from loaded settings.
    pub fn from_settings(settings: &SettingsManager) -> Self {
        let s = settings.settings();
        Self {
            workdir: PathBuf::from(&s.files.workdir),
            mode: s.gulp.mode,
            max_steps: s.gulp.max_steps,
            executable: s.gulp.executable.clone(),
            input_name: s.files.input_name.clone(),
            output_name: s.files.output_name.clone(),
            ewald_cutoff: s.gulp.ewald_cutoff,
            ..Self::default()
        }
    }

    /// Splits [`executable`](Self::executable) into program and arguments.
    ///
    /// Returns `None` when the string is blank.
    pub fn command_line(&self) -> Option<(&str, Vec<&str>)> {
        let mut words = self.executable.split_whitespace();
        let program = words.next()?;
        Some((program, words.collect()))
    }
}
