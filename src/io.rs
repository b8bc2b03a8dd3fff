//! Structure file I/O.
//!
//! Reads and writes VASP POSCAR/CONTCAR files, the interchange format used
//! to hand structures to and from the command-line tool.
//!
//! ```text
//! Comment line
//! 1.0                    scaling factor
//! a1 a2 a3               lattice vector a
//! b1 b2 b3               lattice vector b
//! c1 c2 c3               lattice vector c
//! Mg O                   element symbols (required)
//! 4 4                    counts per element
//! Selective dynamics     optional
//! Direct                 or Cartesian
//! x y z                  one line per site
//! ```

use crate::structure::{Crystal, Lattice};
use nalgebra::{Matrix3, Vector3};
use std::fs;
use std::io::{Error, ErrorKind, Result};
use std::path::Path;

fn invalid(msg: impl Into<String>) -> Error {
    Error::new(ErrorKind::InvalidData, msg.into())
}

fn parse_floats(line: &str, n: usize, what: &str) -> Result<Vec<f64>> {
    let values: Vec<f64> = line
        .split_whitespace()
        .take(n)
        .map(|t| t.parse::<f64>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| invalid(format!("Invalid {}: '{}'", what, line.trim())))?;
    if values.len() < n {
        return Err(invalid(format!("Invalid {}: '{}'", what, line.trim())));
    }
    Ok(values)
}

/// Parses POSCAR text.
pub fn parse_poscar(content: &str) -> Result<Crystal> {
    let mut lines = content.lines();
    let mut next = |what: &str| {
        lines
            .next()
            .ok_or_else(|| invalid(format!("Unexpected end of POSCAR: missing {}", what)))
    };

    next("comment")?;
    let scale = parse_floats(next("scaling factor")?, 1, "scaling factor")?[0];

    let mut matrix = Matrix3::zeros();
    for row in 0..3 {
        let v = parse_floats(next("lattice vector")?, 3, "lattice vector")?;
        for col in 0..3 {
            matrix[(row, col)] = v[col];
        }
    }
    // A negative scaling factor is the target cell volume.
    let factor = if scale < 0.0 {
        (-scale / matrix.determinant().abs()).cbrt()
    } else {
        scale
    };
    let lattice = Lattice::from_matrix(matrix * factor);

    let symbols: Vec<String> = next("element symbols")?
        .split_whitespace()
        .map(String::from)
        .collect();
    if symbols
        .first()
        .map_or(true, |s| !s.chars().next().is_some_and(char::is_alphabetic))
    {
        return Err(invalid("POSCAR without an element-symbol line is not supported"));
    }
    let counts: Vec<usize> = next("element counts")?
        .split_whitespace()
        .map(|t| t.parse::<usize>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| invalid("Invalid element counts"))?;
    if counts.len() != symbols.len() {
        return Err(invalid(format!(
            "{} element symbols but {} counts",
            symbols.len(),
            counts.len()
        )));
    }

    let mut mode = next("coordinate mode")?.trim().to_lowercase();
    if mode.starts_with('s') {
        mode = next("coordinate mode")?.trim().to_lowercase();
    }
    let cartesian = mode.starts_with('c') || mode.starts_with('k');

    let inverse = lattice
        .matrix
        .transpose()
        .try_inverse()
        .ok_or_else(|| invalid("Singular lattice"))?;

    let mut species = Vec::new();
    let mut coords = Vec::new();
    for (symbol, &count) in symbols.iter().zip(&counts) {
        for _ in 0..count {
            let v = parse_floats(next("atomic position")?, 3, "atomic position")?;
            let frac = if cartesian {
                inverse * (Vector3::new(v[0], v[1], v[2]) * factor)
            } else {
                Vector3::new(v[0], v[1], v[2])
            };
            species.push(symbol.clone());
            coords.extend_from_slice(&[frac.x, frac.y, frac.z]);
        }
    }

    Crystal::new(lattice, species, coords).map_err(|e| invalid(e.to_string()))
}

/// Reads a POSCAR/CONTCAR file.
pub fn read_poscar(path: &Path) -> Result<Crystal> {
    parse_poscar(&fs::read_to_string(path)?)
}

/// Renders a crystal as POSCAR text with Direct coordinates.
///
/// Sites are grouped by species in first-appearance order.
pub fn format_poscar(crystal: &Crystal, comment: &str) -> String {
    let mut content = format!("{}\n1.0\n", comment);
    for row in 0..3 {
        let v = crystal.lattice.vector(row);
        content.push_str(&format!(" {:14.8} {:14.8} {:14.8}\n", v.x, v.y, v.z));
    }

    let unique = crystal.unique_species();
    let counts: Vec<String> = unique
        .iter()
        .map(|s| crystal.species.iter().filter(|x| x == s).count().to_string())
        .collect();
    content.push_str(&format!(" {}\n {}\nDirect\n", unique.join(" "), counts.join(" ")));

    for s in &unique {
        for (i, _) in crystal.species.iter().enumerate().filter(|(_, x)| x == s) {
            let [x, y, z] = crystal.get_frac_coords(i);
            content.push_str(&format!(" {:12.8} {:12.8} {:12.8}\n", x, y, z));
        }
    }
    content
}

/// Writes a crystal to a POSCAR file.
pub fn write_poscar(crystal: &Crystal, path: &Path) -> Result<()> {
    fs::write(path, format_poscar(crystal, &crystal.formula()))
}
