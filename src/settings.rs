//! Configuration management for gulprelax.
//!
//! Program defaults are read from INI-format files with the following
//! precedence:
//!
//! 1. Local configuration (`./gulprelax.cfg`)
//! 2. User configuration (`~/.config/gulprelax/gulprelax.cfg`)
//! 3. System configuration (`/etc/gulprelax/gulprelax.cfg`)
//! 4. Built-in defaults
//!
//! # Configuration File Format
//!
//! ```ini
//! [gulp]
//! executable = gulp
//! ewald_cutoff = 10.0
//! max_steps = 1000
//! mode = conp
//!
//! [files]
//! workdir = tmp
//! input_name = gulp.in
//! output_name = gulp.log
//!
//! [logging]
//! level = info
//!
//! [cleanup]
//! enabled = true
//! ```

use crate::config::{OptimizationMode, DEFAULT_EWALD_CUTOFF, DEFAULT_MAX_STEPS};
use configparser::ini::Ini;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the settings file searched for in every location
pub const SETTINGS_FILE_NAME: &str = "gulprelax.cfg";

/// Errors that can occur during configuration loading and processing.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// I/O error when reading configuration files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// INI parsing error
    #[error("INI parsing error: {0}")]
    IniParse(String),
    /// Invalid configuration value
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// All program settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Settings {
    /// How GULP is invoked and what it is asked to do
    pub gulp: GulpSettings,
    /// Where job files go
    pub files: FileSettings,
    /// Logging configuration
    pub logging: LoggingSettings,
    /// Cleanup configuration
    pub cleanup: CleanupSettings,
}

/// `[gulp]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GulpSettings {
    /// Executable, optionally with launcher words (default: "gulp")
    pub executable: String,
    /// Ewald real-space cutoff (default: 10.0)
    pub ewald_cutoff: f64,
    /// Maximum optimisation cycles (default: 1000)
    pub max_steps: u32,
    /// Default mode for single-stage runs (default: conp)
    pub mode: OptimizationMode,
}

impl Default for GulpSettings {
    fn default() -> Self {
        Self {
            executable: "gulp".to_string(),
            ewald_cutoff: DEFAULT_EWALD_CUTOFF,
            max_steps: DEFAULT_MAX_STEPS,
            mode: OptimizationMode::Conp,
        }
    }
}

/// `[files]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileSettings {
    /// Scratch directory for decks and reports (default: "tmp")
    pub workdir: String,
    /// Deck file name suffix (default: "gulp.in")
    pub input_name: String,
    /// Report file name suffix (default: "gulp.log")
    pub output_name: String,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            workdir: "tmp".to_string(),
            input_name: "gulp.in".to_string(),
            output_name: "gulp.log".to_string(),
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingSettings {
    /// Log level (default: "info")
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// `[cleanup]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CleanupSettings {
    /// Remove deck, report and dump after each job (default: true)
    pub enabled: bool,
}

impl Default for CleanupSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Loads settings and remembers where they came from.
pub struct SettingsManager {
    settings: Settings,
    config_source: String,
}

impl SettingsManager {
    /// Loads configuration from the standard locations.
    ///
    /// Files that fail to parse are reported with `warn!` and skipped.
    pub fn load() -> Result<Self, ConfigError> {
        let (settings, source) = Self::load_from_files()?;
        info!("Configuration loaded from: {}", source);
        Ok(Self {
            settings,
            config_source: source,
        })
    }

    /// Wraps already-built settings.
    pub fn from_settings(settings: Settings) -> Self {
        Self {
            settings,
            config_source: "built-in defaults".to_string(),
        }
    }

    /// Returns the source of the loaded configuration.
    pub fn config_source(&self) -> &str {
        &self.config_source
    }

    /// Gets a reference to the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Gets the logging settings.
    pub fn logging(&self) -> &LoggingSettings {
        &self.settings.logging
    }

    /// Gets the cleanup settings.
    pub fn cleanup(&self) -> &CleanupSettings {
        &self.settings.cleanup
    }

    fn load_from_files() -> Result<(Settings, String), ConfigError> {
        let candidates: Vec<(&str, PathBuf)> = [
            ("system", Self::get_system_config_path()),
            ("user", Self::get_user_config_path()),
            ("local", Some(PathBuf::from(SETTINGS_FILE_NAME))),
        ]
        .into_iter()
        .filter_map(|(kind, path)| path.map(|p| (kind, p)))
        .collect();

        Self::load_from_paths(&candidates)
    }

    /// Applies each existing file in order; later files override earlier ones.
    fn load_from_paths(candidates: &[(&str, PathBuf)]) -> Result<(Settings, String), ConfigError> {
        let mut settings = Settings::default();
        let mut config_source = "built-in defaults".to_string();

        for (kind, path) in candidates {
            if !path.exists() {
                continue;
            }
            match Self::load_config(path) {
                Ok(section_map) => {
                    settings.apply(&section_map)?;
                    config_source = format!("{} config ({})", kind, path.display());
                    debug!("Loaded {} configuration from: {}", kind, path.display());
                }
                Err(e) => {
                    warn!("Failed to load {} config from {}: {}", kind, path.display(), e);
                }
            }
        }

        Ok((settings, config_source))
    }

    fn load_config(path: &Path) -> Result<HashMap<String, HashMap<String, Option<String>>>, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::parse_ini(&content)
    }

    fn parse_ini(
        content: &str,
    ) -> Result<HashMap<String, HashMap<String, Option<String>>>, ConfigError> {
        let mut ini = Ini::new();
        ini.read(content.to_string())
            .map_err(|e| ConfigError::IniParse(format!("Failed to parse INI: {}", e)))
    }

    /// Parses settings from INI text on top of the built-in defaults.
    pub fn parse_str(content: &str) -> Result<Settings, ConfigError> {
        let mut settings = Settings::default();
        settings.apply(&Self::parse_ini(content)?)?;
        Ok(settings)
    }

    fn get_system_config_path() -> Option<PathBuf> {
        #[cfg(unix)]
        {
            Some(PathBuf::from("/etc/gulprelax").join(SETTINGS_FILE_NAME))
        }
        #[cfg(windows)]
        {
            std::env::var("PROGRAMDATA")
                .ok()
                .map(|pd| PathBuf::from(pd).join("gulprelax").join(SETTINGS_FILE_NAME))
        }
    }

    fn get_user_config_path() -> Option<PathBuf> {
        #[cfg(unix)]
        {
            std::env::var("HOME").ok().map(|home| {
                PathBuf::from(home)
                    .join(".config")
                    .join("gulprelax")
                    .join(SETTINGS_FILE_NAME)
            })
        }
        #[cfg(windows)]
        {
            std::env::var("APPDATA")
                .ok()
                .map(|appdata| PathBuf::from(appdata).join("gulprelax").join(SETTINGS_FILE_NAME))
        }
    }

    /// Writes a commented settings template holding the built-in defaults.
    pub fn create_template(path: &Path) -> Result<(), ConfigError> {
        fs::write(path, Self::generate_template_content())?;
        info!("Created settings template at: {}", path.display());
        Ok(())
    }

    fn generate_template_content() -> String {
        let defaults = Settings::default();
        format!(
            r#"# gulprelax configuration file
#
# Files are loaded in this order, later ones overriding earlier ones:
#
# 1. System config (/etc/gulprelax/gulprelax.cfg)
# 2. User config (~/.config/gulprelax/gulprelax.cfg)
# 3. Current working directory (./gulprelax.cfg)
#
# Missing sections or values keep the built-in defaults shown below.

[gulp]
# GULP executable. Launcher words are allowed, e.g. "mpirun -np 4 gulp"
executable = {}

# Ewald real-space cutoff written to every input deck
ewald_cutoff = {:.1}

# maxcycle for relaxations
max_steps = {}

# Default mode: conv (constant volume), conp (constant pressure), single
mode = {}

[files]
# Scratch directory for input decks and reports
workdir = {}

# File names; the job label is prepended to both
input_name = {}
output_name = {}

[logging]
# Log level: debug, info, warn, error
level = {}

[cleanup]
# Remove the deck, report and CIF dump after each job
enabled = {}
"#,
            defaults.gulp.executable,
            defaults.gulp.ewald_cutoff,
            defaults.gulp.max_steps,
            defaults.gulp.mode,
            defaults.files.workdir,
            defaults.files.input_name,
            defaults.files.output_name,
            defaults.logging.level,
            defaults.cleanup.enabled,
        )
    }
}

impl Settings {
    /// Overrides fields present in an INI section map.
    fn apply(
        &mut self,
        sections: &HashMap<String, HashMap<String, Option<String>>>,
    ) -> Result<(), ConfigError> {
        if let Some(gulp) = sections.get("gulp") {
            if let Some(Some(exe)) = gulp.get("executable") {
                self.gulp.executable = exe.clone();
            }
            if let Some(Some(cutoff)) = gulp.get("ewald_cutoff") {
                self.gulp.ewald_cutoff = cutoff.parse().map_err(|_| {
                    ConfigError::InvalidValue(format!("Invalid ewald_cutoff: {}", cutoff))
                })?;
            }
            if let Some(Some(steps)) = gulp.get("max_steps") {
                self.gulp.max_steps = steps.parse().map_err(|_| {
                    ConfigError::InvalidValue(format!("Invalid max_steps: {}", steps))
                })?;
            }
            if let Some(Some(mode)) = gulp.get("mode") {
                self.gulp.mode = mode.parse().map_err(ConfigError::InvalidValue)?;
            }
        }

        if let Some(files) = sections.get("files") {
            if let Some(Some(workdir)) = files.get("workdir") {
                self.files.workdir = workdir.clone();
            }
            if let Some(Some(input_name)) = files.get("input_name") {
                self.files.input_name = input_name.clone();
            }
            if let Some(Some(output_name)) = files.get("output_name") {
                self.files.output_name = output_name.clone();
            }
        }

        if let Some(logging) = sections.get("logging") {
            if let Some(Some(level)) = logging.get("level") {
                self.logging.level = level.clone();
            }
        }

        if let Some(cleanup) = sections.get("cleanup") {
            if let Some(Some(enabled)) = cleanup.get("enabled") {
                self.cleanup.enabled = enabled.parse().map_err(|_| {
                    ConfigError::InvalidValue(format!("Invalid enabled value: {}", enabled))
                })?;
            }
        }

        Ok(())
    }
}
