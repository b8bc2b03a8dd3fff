//! GULP report parsing.
//!
//! GULP writes a human-oriented log. This module scans it line by line and
//! extracts the numbers a caller needs after a relaxation or single point:
//!
//! - total lattice energy (eV)
//! - stress tensor components (GPa, Voigt order xx yy zz yz xz xy)
//! - forces, as the negated internal derivatives (eV/Å)
//! - final fractional coordinates and Cartesian lattice vectors
//! - optimisation cycle count, CPU time and the "Job Finished" marker
//!
//! When a section appears several times the last occurrence wins, so the
//! final energy of an optimisation replaces the initial one.
//!
//! # Merged columns
//!
//! GULP prints its tables in fixed-width columns. A wide negative number can
//! consume the separating blank, producing cells such as
//! `-0.001234-0.002345`. Each whitespace token of a table row is therefore
//! cut again wherever a sign follows a digit or a decimal point. Every piece
//! must then parse as a finite number; overflow asterisks and `NaN` are
//! errors, never skipped.

use crate::structure::Lattice;
use lazy_static::lazy_static;
use nalgebra::{DVector, Matrix3, Vector6};
use regex::Regex;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors produced while reading a GULP report.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// Report could not be read
    #[error("failed to read GULP output {path}: {reason}")]
    Read {
        /// Report path
        path: String,
        /// Underlying I/O error text
        reason: String,
    },
    /// No "Total lattice energy ... eV" line was found
    #[error("no total lattice energy found in GULP output")]
    MissingEnergy,
    /// The final energy is NaN or infinite
    #[error("GULP reported a non-finite lattice energy ({0})")]
    NonFiniteEnergy(f64),
    /// A number could not be parsed
    #[error("line {line}: cannot parse '{text}' as a number")]
    InvalidNumber {
        /// 1-based line number
        line: usize,
        /// Offending text
        text: String,
    },
    /// A table ended before all expected rows or columns were read
    #[error("line {line}: truncated '{section}' block")]
    Truncated {
        /// Section header text
        section: &'static str,
        /// 1-based line number of the section header
        line: usize,
    },
}

/// Result type for report parsing
pub type Result<T> = std::result::Result<T, ParseError>;

const ENERGY_SECTION: &str = "Total lattice energy";
const FINISHED_MARKER: &str = "Job Finished";
const CPU_SECTION: &str = "Total CPU time";
const STRESS_SECTION: &str = "Final stress tensor components";
const DERIVATIVES_SECTION: &str = "Final internal derivatives";
const CYCLE_MARKER: &str = " Cycle: ";
const COORDS_SECTION: &str = "Final fractional coordinates of atoms";
const LATTICE_SECTION: &str = "Final Cartesian lattice vectors";
const TABLE_RULE: &str = "------------";

/// Rows between a table header line and its first data row.
const TABLE_DATA_OFFSET: usize = 6;

lazy_static! {
    // "  Total lattice energy       =         -74.60185321 eV"
    static ref ENERGY_RE: Regex =
        Regex::new(&format!(r"^\s*{}\s*=\s*(\S+)\s*eV\b", ENERGY_SECTION)).unwrap();
}

/// Everything extracted from one report.
#[derive(Debug, Clone, PartialEq)]
pub struct GulpOutput {
    /// Last total lattice energy, eV
    pub energy: f64,
    /// Stress tensor in Voigt order (xx, yy, zz, yz, xz, xy), GPa
    pub stress: Option<Vector6<f64>>,
    /// Flattened forces `[fx1, fy1, fz1, ...]`, eV/Å
    pub forces: Option<DVector<f64>>,
    /// Last optimisation cycle number
    pub iterations: usize,
    /// Total CPU time in seconds
    pub cpu_time: f64,
    /// GULP reached its normal termination message
    pub finished: bool,
    /// Flattened final fractional coordinates
    pub frac_coords: Option<DVector<f64>>,
    /// Site labels from the final coordinate table
    pub labels: Option<Vec<String>>,
    /// Final lattice vectors
    pub lattice: Option<Lattice>,
}

impl GulpOutput {
    /// Number of atoms with forces, if forces were reported.
    pub fn num_force_rows(&self) -> Option<usize> {
        self.forces.as_ref().map(|f| f.len() / 3)
    }
}

/// Splits a run of numbers that may have lost their separating blanks.
///
/// Tokens are cut where a `-` or `+` follows a digit or `.`; a sign after an
/// exponent marker stays with its number. Pieces are not validated.
///
/// # Examples
///
/// ```
/// use gulprelax::parser::split_merged_numbers;
///
/// assert_eq!(
///     split_merged_numbers("-0.001234-0.002345   0.003456"),
///     vec!["-0.001234", "-0.002345", "0.003456"]
/// );
/// ```
pub fn split_merged_numbers(text: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    for token in text.split_whitespace() {
        let bytes = token.as_bytes();
        let mut start = 0;
        for i in 1..bytes.len() {
            let prev = bytes[i - 1];
            if matches!(bytes[i], b'-' | b'+') && (prev.is_ascii_digit() || prev == b'.') {
                pieces.push(&token[start..i]);
                start = i;
            }
        }
        pieces.push(&token[start..]);
    }
    pieces
}

/// Reads and parses a report file.
pub fn read_output_file(path: &Path) -> Result<GulpOutput> {
    let content = fs::read_to_string(path).map_err(|e| ParseError::Read {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    parse_output(&content)
}

/// Parses the text of a GULP report.
pub fn parse_output(content: &str) -> Result<GulpOutput> {
    let lines: Vec<&str> = content.lines().collect();

    let mut energy = None;
    let mut stress = None;
    let mut forces = None;
    let mut iterations = 0;
    let mut cpu_time = 0.0;
    let mut finished = false;
    let mut frac_coords = None;
    let mut labels = None;
    let mut lattice = None;

    for (i, line) in lines.iter().enumerate() {
        if let Some(caps) = ENERGY_RE.captures(line) {
            energy = Some(parse_number(&caps[1], i)?);
        } else if line.contains(FINISHED_MARKER) {
            finished = true;
        } else if line.contains(CPU_SECTION) {
            if let Some(last) = line.split_whitespace().last() {
                cpu_time = parse_number(last, i)?;
            }
        } else if line.contains(STRESS_SECTION) {
            stress = Some(parse_stress(&lines, i)?);
        } else if line.contains(DERIVATIVES_SECTION) {
            let rows = parse_table(&lines, i, DERIVATIVES_SECTION)?;
            forces = Some(DVector::from_iterator(
                rows.len() * 3,
                rows.iter().flat_map(|(_, v)| v.iter().map(|d| -d)),
            ));
        } else if line.contains(CYCLE_MARKER) {
            if let Some(n) = line.split_whitespace().nth(1) {
                iterations = n.parse().map_err(|_| ParseError::InvalidNumber {
                    line: i + 1,
                    text: n.to_string(),
                })?;
            }
        } else if line.contains(COORDS_SECTION) {
            let rows = parse_table(&lines, i, COORDS_SECTION)?;
            labels = Some(rows.iter().map(|(label, _)| label.clone()).collect());
            frac_coords = Some(DVector::from_iterator(
                rows.len() * 3,
                rows.iter().flat_map(|(_, v)| v.iter().copied()),
            ));
        } else if line.contains(LATTICE_SECTION) {
            lattice = Some(parse_lattice_vectors(&lines, i)?);
        }
    }

    let energy = energy.ok_or(ParseError::MissingEnergy)?;
    if !energy.is_finite() {
        return Err(ParseError::NonFiniteEnergy(energy));
    }

    Ok(GulpOutput {
        energy,
        stress,
        forces,
        iterations,
        cpu_time,
        finished,
        frac_coords,
        labels,
        lattice,
    })
}

fn parse_number(text: &str, idx: usize) -> Result<f64> {
    text.parse().map_err(|_| ParseError::InvalidNumber {
        line: idx + 1,
        text: text.to_string(),
    })
}

/// As [`parse_number`], also rejecting NaN and infinities.
fn parse_finite(text: &str, idx: usize) -> Result<f64> {
    match parse_number(text, idx)? {
        v if v.is_finite() => Ok(v),
        _ => Err(ParseError::InvalidNumber {
            line: idx + 1,
            text: text.to_string(),
        }),
    }
}

/// Returns the text following the first `n` whitespace-separated tokens.
fn after_tokens(line: &str, n: usize) -> &str {
    let mut rest = line;
    for _ in 0..n {
        rest = rest.trim_start();
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        rest = &rest[end..];
    }
    rest
}

/// Reads `No. Label Type x y z ...` rows until the closing rule.
fn parse_table(
    lines: &[&str],
    header: usize,
    section: &'static str,
) -> Result<Vec<(String, [f64; 3])>> {
    let truncated = ParseError::Truncated {
        section,
        line: header + 1,
    };
    let mut rows = Vec::new();

    let mut idx = header + TABLE_DATA_OFFSET;
    loop {
        let line = lines.get(idx).ok_or_else(|| truncated.clone())?;
        if line.contains(TABLE_RULE) {
            break;
        }

        let label = line
            .split_whitespace()
            .nth(1)
            .ok_or_else(|| truncated.clone())?
            .to_string();
        let numbers = split_merged_numbers(after_tokens(line, 3));
        if numbers.len() < 3 {
            return Err(truncated);
        }
        let mut values = [0.0; 3];
        for (v, text) in values.iter_mut().zip(&numbers) {
            *v = parse_finite(text, idx)?;
        }
        rows.push((label, values));
        idx += 1;
    }

    Ok(rows)
}

/// Reads the three `xx .. yz` style rows under the stress header.
fn parse_stress(lines: &[&str], header: usize) -> Result<Vector6<f64>> {
    let mut stress = Vector6::zeros();
    for j in 0..3 {
        let idx = header + 3 + j;
        let tokens: Vec<&str> = lines
            .get(idx)
            .map(|l| l.split_whitespace().collect())
            .unwrap_or_default();
        if tokens.len() < 4 {
            return Err(ParseError::Truncated {
                section: STRESS_SECTION,
                line: header + 1,
            });
        }
        stress[j] = parse_finite(tokens[1], idx)?;
        stress[j + 3] = parse_finite(tokens[3], idx)?;
    }
    Ok(stress)
}

/// Reads the three lattice vector rows following the header and a blank line.
fn parse_lattice_vectors(lines: &[&str], header: usize) -> Result<Lattice> {
    let mut matrix = Matrix3::zeros();
    for row in 0..3 {
        let idx = header + 2 + row;
        let tokens: Vec<&str> = lines
            .get(idx)
            .map(|l| l.split_whitespace().collect())
            .unwrap_or_default();
        if tokens.len() < 3 {
            return Err(ParseError::Truncated {
                section: LATTICE_SECTION,
                line: header + 1,
            });
        }
        for col in 0..3 {
            matrix[(row, col)] = parse_finite(tokens[col], idx)?;
        }
    }
    Ok(Lattice::from_matrix(matrix))
}
