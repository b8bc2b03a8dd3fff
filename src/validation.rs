//! Pre-flight validation of GULP jobs.
//!
//! Checks run before any file is written so that a bad job fails with a
//! clear message instead of an empty or garbled GULP report.

use crate::config::GulpConfig;
use crate::structure::Crystal;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validation error with guidance for the user.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category for programmatic handling
    pub category: ErrorCategory,
    /// Human-readable error message
    pub message: String,
    /// Optional suggestion for fixing the issue
    pub suggestion: Option<String>,
}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Invalid job parameters
    InvalidConfiguration,
    /// Structure that GULP cannot be given
    InvalidStructure,
}

impl ValidationError {
    fn config(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self {
            category: ErrorCategory::InvalidConfiguration,
            message: message.into(),
            suggestion: Some(suggestion.into()),
        }
    }

    fn structure(message: impl Into<String>) -> Self {
        Self {
            category: ErrorCategory::InvalidStructure,
            message: message.into(),
            suggestion: None,
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, "\n\nSuggestion: {}", suggestion)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Checks the job parameters.
///
/// # Examples
///
/// ```
/// use gulprelax::config::GulpConfig;
/// use gulprelax::validation::validate_config;
///
/// assert!(validate_config(&GulpConfig::default()).is_ok());
///
/// let bad = GulpConfig { forcefield: String::new(), ..GulpConfig::default() };
/// assert!(validate_config(&bad).is_err());
/// ```
pub fn validate_config(config: &GulpConfig) -> ValidationResult<()> {
    if config.forcefield.trim().is_empty() {
        return Err(ValidationError::config(
            "No force-field library given",
            "Pass the library file GULP should load, e.g. 'catlow.lib'",
        ));
    }

    if config.command_line().is_none() {
        return Err(ValidationError::config(
            "GULP executable is empty",
            "Set 'executable' in the [gulp] section of gulprelax.cfg or pass --exe",
        ));
    }

    if config.mode.is_relaxation() && config.max_steps == 0 {
        return Err(ValidationError::config(
            format!("max_steps must be positive for a '{}' relaxation", config.mode),
            "Use a positive maxcycle, or mode 'single' for a single point",
        ));
    }

    if !(config.ewald_cutoff.is_finite() && config.ewald_cutoff > 0.0) {
        return Err(ValidationError::config(
            format!("Invalid Ewald cutoff {}", config.ewald_cutoff),
            "The cutoff is a real-space distance in Angstroms and must be positive",
        ));
    }

    if config.label.contains(['/', '\\']) {
        return Err(ValidationError::config(
            format!("Job label '{}' contains a path separator", config.label),
            "Use the working directory setting to place files in another directory",
        ));
    }

    if config.input_name.trim().is_empty() || config.output_name.trim().is_empty() {
        return Err(ValidationError::config(
            "Input and output file names must not be empty",
            "Defaults are 'gulp.in' and 'gulp.log'",
        ));
    }

    Ok(())
}

/// Checks that a structure can be written as a deck.
pub fn validate_crystal(crystal: &Crystal) -> ValidationResult<()> {
    if crystal.num_atoms == 0 {
        return Err(ValidationError::structure("Structure has no sites"));
    }

    for (i, symbol) in crystal.species.iter().enumerate() {
        if symbol.is_empty() || symbol.chars().any(char::is_whitespace) {
            return Err(ValidationError::structure(format!(
                "Site {} has an invalid species label '{}'",
                i + 1,
                symbol
            )));
        }
    }

    if let Some(i) = crystal.frac_coords.iter().position(|x| !x.is_finite()) {
        return Err(ValidationError::structure(format!(
            "Site {} has a non-finite fractional coordinate",
            i / 3 + 1
        )));
    }

    let volume = crystal.lattice.volume();
    if !(volume.is_finite() && volume > 1e-8) {
        return Err(ValidationError::structure(format!(
            "Cell volume {:.3e} is not positive; lattice vectors are degenerate",
            volume
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OptimizationMode;
    use crate::structure::Lattice;
    use nalgebra::Matrix3;

    fn cubic(species: Vec<&str>, coords: Vec<f64>) -> Crystal {
        Crystal::new(
            Lattice::from_parameters(3.0, 3.0, 3.0, 90.0, 90.0, 90.0),
            species.into_iter().map(String::from).collect(),
            coords,
        )
        .unwrap()
    }

    #[test]
    fn test_single_point_allows_zero_steps() {
        let config = GulpConfig {
            mode: OptimizationMode::Single,
            max_steps: 0,
            ..GulpConfig::default()
        };
        assert!(validate_config(&config).is_ok());

        let relax = GulpConfig {
            max_steps: 0,
            ..GulpConfig::default()
        };
        let err = validate_config(&relax).unwrap_err();
        assert_eq!(err.category, ErrorCategory::InvalidConfiguration);
        assert!(err.to_string().contains("Suggestion:"));
    }

    #[test]
    fn test_label_with_separator_is_rejected() {
        let config = GulpConfig {
            label: "../escape".to_string(),
            ..GulpConfig::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_species_with_whitespace_is_rejected() {
        let crystal = cubic(vec!["Mg", "O 2"], vec![0.0; 6]);
        let err = validate_crystal(&crystal).unwrap_err();
        assert_eq!(err.category, ErrorCategory::InvalidStructure);
        assert!(err.message.contains("Site 2"));
    }

    #[test]
    fn test_nan_coordinate_is_rejected() {
        let crystal = cubic(vec!["C", "C"], vec![0.0, 0.0, 0.0, 0.5, f64::NAN, 0.5]);
        let err = validate_crystal(&crystal).unwrap_err();
        assert!(err.message.contains("Site 2"));
    }

    #[test]
    fn test_flat_cell_is_rejected() {
        let flat = Crystal::new(
            Lattice::from_matrix(Matrix3::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0)),
            vec!["C".to_string()],
            vec![0.0; 3],
        )
        .unwrap();
        assert!(validate_crystal(&flat).is_err());
    }

    #[test]
    fn test_empty_structure_is_rejected() {
        assert!(validate_crystal(&cubic(vec![], vec![])).is_err());
    }
}
