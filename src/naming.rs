//! File naming for GULP jobs.
//!
//! Every job owns a deck and a report inside its working directory, both
//! prefixed with the job label so that several jobs can share a directory:
//!
//! ```
//! use gulprelax::config::GulpConfig;
//! use gulprelax::naming::JobFiles;
//! use std::path::Path;
//!
//! let config = GulpConfig {
//!     label: "mgo_3_".to_string(),
//!     ..GulpConfig::default()
//! };
//! let files = JobFiles::new(&config);
//!
//! assert_eq!(files.input, Path::new("tmp/mgo_3_gulp.in"));
//! assert_eq!(files.output, Path::new("tmp/mgo_3_gulp.log"));
//! assert!(files.dump.is_none());
//! ```

use crate::config::GulpConfig;
use log::debug;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Paths belonging to one GULP job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobFiles {
    /// Working directory
    pub workdir: PathBuf,
    /// Input deck
    pub input: PathBuf,
    /// Report written by GULP
    pub output: PathBuf,
    /// CIF dump requested from GULP, if any
    pub dump: Option<PathBuf>,
}

impl JobFiles {
    /// Derives the job paths from a configuration.
    pub fn new(config: &GulpConfig) -> Self {
        let workdir = config.workdir.clone();
        Self {
            input: workdir.join(format!("{}{}", config.label, config.input_name)),
            output: workdir.join(format!("{}{}", config.label, config.output_name)),
            dump: config.dump.clone(),
            workdir,
        }
    }

    /// Creates the working directory if it does not exist yet.
    pub fn ensure_workdir(&self) -> io::Result<()> {
        if !self.workdir.as_os_str().is_empty() && !self.workdir.exists() {
            debug!("Creating working directory {}", self.workdir.display());
            fs::create_dir_all(&self.workdir)?;
        }
        Ok(())
    }

    /// All files the job may leave behind.
    pub fn all(&self) -> Vec<&Path> {
        let mut files = vec![self.input.as_path(), self.output.as_path()];
        if let Some(dump) = &self.dump {
            files.push(dump.as_path());
        }
        files
    }
}
