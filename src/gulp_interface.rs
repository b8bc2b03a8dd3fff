//! Program interface for GULP calculations.
//!
//! The [`ForceFieldInterface`] trait captures the lifecycle of one external
//! force-field calculation:
//!
//! - Writing the input deck
//! - Executing the program
//! - Parsing the report
//!
//! [`GulpInterface`] implements it for GULP, which reads its deck from stdin
//! and writes its report to stdout, i.e. it is run as
//! `gulp < job.in > job.log`.
//!
//! # Usage Pattern
//!
//! ```no_run
//! use gulprelax::config::GulpConfig;
//! use gulprelax::gulp_interface::{ForceFieldInterface, GulpInterface};
//! # use gulprelax::structure::{Crystal, Lattice};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # let crystal = Crystal::new(
//! #     Lattice::from_parameters(3.57, 3.57, 3.57, 90.0, 90.0, 90.0),
//! #     vec!["C".to_string()],
//! #     vec![0.0, 0.0, 0.0],
//! # )?;
//! let gulp = GulpInterface::new(GulpConfig::default());
//! gulp.write_input(&crystal, Path::new("job.in"))?;
//! gulp.run_calculation(Path::new("job.in"), Path::new("job.log"))?;
//! let output = gulp.read_output(Path::new("job.log"))?;
//! println!("E = {} eV", output.energy);
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! All operations return a [`GulpError`]:
//! - `Io`: file system errors and failures to spawn the executable
//! - `Calculation`: GULP exited with a failure status
//! - `Parse`: the report lacks required data or is malformed
//! - `Structure`: the report does not fit the structure that was sent

use crate::config::GulpConfig;
use crate::deck;
use crate::parser::{self, GulpOutput, ParseError};
use crate::structure::{Crystal, StructureError};
use log::{debug, warn};
use std::fs;
use std::path::Path;
use std::process::{Command, Stdio};
use thiserror::Error;

/// Error type for GULP calculations.
#[derive(Error, Debug)]
pub enum GulpError {
    /// File system or process spawn failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// GULP execution failed
    #[error("GULP calculation failed: {0}")]
    Calculation(String),
    /// Failed to parse GULP output
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
    /// Parsed geometry does not match the submitted structure
    #[error("Structure error: {0}")]
    Structure(#[from] StructureError),
    /// Job configuration or structure rejected before running
    #[error("Invalid job: {0}")]
    Invalid(String),
}

/// Type alias for GULP operation results
pub type Result<T> = std::result::Result<T, GulpError>;

/// Contract for an external force-field program.
pub trait ForceFieldInterface {
    /// Writes the program input for `crystal` to `path`.
    fn write_input(&self, crystal: &Crystal, path: &Path) -> Result<()>;

    /// Runs the program on `input_path`, leaving its report at `output_path`.
    fn run_calculation(&self, input_path: &Path, output_path: &Path) -> Result<()>;

    /// Parses the report at `output_path`.
    fn read_output(&self, output_path: &Path) -> Result<GulpOutput>;
}

/// GULP program interface.
///
/// # Examples
///
/// ```
/// use gulprelax::config::{GulpConfig, OptimizationMode};
/// use gulprelax::gulp_interface::GulpInterface;
///
/// let gulp = GulpInterface::new(GulpConfig {
///     forcefield: "catlow.lib".to_string(),
///     mode: OptimizationMode::Conv,
///     ..GulpConfig::default()
/// });
/// assert_eq!(gulp.config().forcefield, "catlow.lib");
/// ```
pub struct GulpInterface {
    config: GulpConfig,
}

impl GulpInterface {
    /// Creates an interface for the given job configuration.
    pub fn new(config: GulpConfig) -> Self {
        Self { config }
    }

    /// Job configuration in use.
    pub fn config(&self) -> &GulpConfig {
        &self.config
    }
}

impl ForceFieldInterface for GulpInterface {
    fn write_input(&self, crystal: &Crystal, path: &Path) -> Result<()> {
        deck::write_input_deck(crystal, &self.config, path)?;
        Ok(())
    }

    fn run_calculation(&self, input_path: &Path, output_path: &Path) -> Result<()> {
        let (program, args) = self.config.command_line().ok_or_else(|| {
            GulpError::Invalid("GULP executable is empty".to_string())
        })?;

        let stdin = fs::File::open(input_path)?;
        let stdout = fs::File::create(output_path)?;

        debug!(
            "Running {} < {} > {}",
            self.config.executable,
            input_path.display(),
            output_path.display()
        );
        let output = Command::new(program)
            .args(&args)
            .stdin(Stdio::from(stdin))
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::piped())
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!("{} exited with {}", program, output.status);
            return Err(GulpError::Calculation(if stderr.is_empty() {
                format!("{} exited with {}", program, output.status)
            } else {
                stderr
            }));
        }
        Ok(())
    }

    fn read_output(&self, output_path: &Path) -> Result<GulpOutput> {
        if !output_path.exists() {
            return Err(GulpError::Calculation(format!(
                "GULP output file not found: {}. Check that GULP ran and wrote its report.",
                output_path.display()
            )));
        }
        Ok(parser::read_output_file(output_path)?)
    }
}
