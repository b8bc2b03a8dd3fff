#![deny(missing_docs)]

//! gulprelax - crystal structure relaxation through GULP
//!
//! gulprelax drives the General Utility Lattice Program (GULP) as an external
//! process: it writes a GULP input deck for a periodic crystal, runs the
//! executable, and parses the text report for the lattice energy, stress
//! tensor, atomic forces, and the optimised cell and coordinates.
//!
//! # Overview
//!
//! A job goes through four steps:
//!
//! 1. **Write**: render the structure and force-field choice as a deck
//!    (`opti stress conp conjugate nosymmetry`, `cell`, `fractional`,
//!    `Species`, `library`, `ewald`, `maxcycle`) inside the working directory
//! 2. **Execute**: run `gulp < input > output` from the caller's current
//!    directory, so relative `library` and `output cif` paths resolve there
//! 3. **Read**: scan the report for its fixed section markers
//! 4. **Clean**: remove the deck, report and optional CIF dump
//!
//! # Modes
//!
//! | Mode | Keywords | Effect |
//! |------|----------|--------|
//! | `conv` | `opti stress conv conjugate nosymmetry` | Fixed volume relaxation |
//! | `conp` | `opti stress conp conjugate nosymmetry` | Constant pressure relaxation |
//! | `single` | `grad conp stress` | Single point |
//!
//! # Quick Start
//!
//! ```no_run
//! use gulprelax::io::read_poscar;
//! use gulprelax::workflow::{optimize, JobSpec, DEFAULT_STAGES};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let crystal = read_poscar(Path::new("POSCAR"))?;
//!     let spec = JobSpec {
//!         forcefield: "catlow.lib",
//!         executable: "gulp",
//!         workdir: Path::new("tmp"),
//!         label: "_",
//!         clean: true,
//!     };
//!     let relaxed = optimize(&crystal, &spec, &DEFAULT_STAGES)?;
//!     println!("E = {:.6} eV", relaxed.energy);
//!     Ok(())
//! }
//! ```
//!
//! # Units
//!
//! Lengths in Angstrom, energies in eV, stress in GPa, forces in eV/Angstrom,
//! exactly as GULP prints them.

/// Stateful single-job calculator
pub mod calculation;
/// Removal of job files
pub mod cleanup;
pub mod config;
/// GULP input deck generation
pub mod deck;
pub mod gulp_interface;
/// Built-in help system
pub mod help;
pub mod io;
/// Job file paths derived from label and working directory
pub mod naming;
pub mod parser;
/// Configuration management system
pub mod settings;
pub mod structure;
/// Pre-flight checks of jobs and structures
pub mod validation;
pub mod workflow;

pub use calculation::GulpCalculation;
pub use config::{GulpConfig, OptimizationMode};
pub use structure::{Crystal, Lattice};
