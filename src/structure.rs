//! Core crystal data structures.
//!
//! This module provides the flat record that is handed to GULP and rebuilt
//! from its report:
//!
//! - [`Lattice`]: the periodic cell, stored as a 3×3 matrix whose rows are
//!   the a, b and c vectors
//! - [`Crystal`]: a lattice plus fractional coordinates and species labels
//!
//! All lengths are in Angstroms and all angles are in degrees.

use nalgebra::{DVector, Matrix3, Vector3};
use thiserror::Error;

/// Errors raised when a crystal record is inconsistent.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StructureError {
    /// Coordinate vector does not hold three values per site
    #[error("expected {expected} fractional coordinates for {atoms} sites, got {got}")]
    CoordinateMismatch {
        /// Number of sites in the species list
        atoms: usize,
        /// Required coordinate count (3 × atoms)
        expected: usize,
        /// Coordinate count actually supplied
        got: usize,
    },
}

/// Periodic cell with lattice vectors stored as matrix rows.
///
/// # Examples
///
/// ```
/// use gulprelax::structure::Lattice;
///
/// let lattice = Lattice::from_parameters(4.0, 4.0, 6.0, 90.0, 90.0, 120.0);
/// let (a, _, c, _, _, gamma) = lattice.parameters();
/// assert!((a - 4.0).abs() < 1e-9);
/// assert!((c - 6.0).abs() < 1e-9);
/// assert!((gamma - 120.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Lattice {
    /// Rows are the a, b, c vectors in Angstroms
    pub matrix: Matrix3<f64>,
}

impl Lattice {
    /// Wraps a matrix whose rows are the lattice vectors.
    pub fn from_matrix(matrix: Matrix3<f64>) -> Self {
        Self { matrix }
    }

    /// Builds a cell from lengths and angles (degrees).
    ///
    /// The a vector lies along x and b lies in the xy plane.
    pub fn from_parameters(a: f64, b: f64, c: f64, alpha: f64, beta: f64, gamma: f64) -> Self {
        let (cos_a, cos_b) = (alpha.to_radians().cos(), beta.to_radians().cos());
        let (sin_g, cos_g) = gamma.to_radians().sin_cos();

        let cx = c * cos_b;
        let cy = c * (cos_a - cos_b * cos_g) / sin_g;
        let cz = (c * c - cx * cx - cy * cy).max(0.0).sqrt();

        Self::from_matrix(Matrix3::new(
            a, 0.0, 0.0, //
            b * cos_g, b * sin_g, 0.0, //
            cx, cy, cz,
        ))
    }

    /// Returns the lattice vector with index 0 (a), 1 (b) or 2 (c).
    pub fn vector(&self, i: usize) -> Vector3<f64> {
        self.matrix.row(i).transpose()
    }

    /// Returns `(a, b, c, alpha, beta, gamma)` with angles in degrees.
    pub fn parameters(&self) -> (f64, f64, f64, f64, f64, f64) {
        let (va, vb, vc) = (self.vector(0), self.vector(1), self.vector(2));
        let (a, b, c) = (va.norm(), vb.norm(), vc.norm());

        let angle = |u: &Vector3<f64>, v: &Vector3<f64>, lu: f64, lv: f64| {
            (u.dot(v) / (lu * lv)).clamp(-1.0, 1.0).acos().to_degrees()
        };

        (
            a,
            b,
            c,
            angle(&vb, &vc, b, c),
            angle(&va, &vc, a, c),
            angle(&va, &vb, a, b),
        )
    }

    /// Cell volume in cubic Angstroms.
    pub fn volume(&self) -> f64 {
        self.matrix.determinant().abs()
    }
}

/// A periodic structure: lattice, species labels and fractional coordinates.
///
/// Coordinates use the same flat layout as forces elsewhere in the crate:
/// `[x1, y1, z1, x2, y2, z2, ...]`.
///
/// # Examples
///
/// ```
/// use gulprelax::structure::{Crystal, Lattice};
///
/// let lattice = Lattice::from_parameters(5.43, 5.43, 5.43, 90.0, 90.0, 90.0);
/// let crystal = Crystal::new(
///     lattice,
///     vec!["Si".to_string(), "Si".to_string()],
///     vec![0.0, 0.0, 0.0, 0.25, 0.25, 0.25],
/// )
/// .unwrap();
///
/// assert_eq!(crystal.num_atoms, 2);
/// assert_eq!(crystal.get_frac_coords(1), [0.25, 0.25, 0.25]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Crystal {
    /// Periodic cell
    pub lattice: Lattice,
    /// Species symbol of every site, in site order
    pub species: Vec<String>,
    /// Flattened fractional coordinates
    pub frac_coords: DVector<f64>,
    /// Number of sites
    pub num_atoms: usize,
}

impl Crystal {
    /// Creates a crystal, checking that there are three coordinates per site.
    pub fn new(
        lattice: Lattice,
        species: Vec<String>,
        frac_coords: Vec<f64>,
    ) -> Result<Self, StructureError> {
        let num_atoms = species.len();
        if frac_coords.len() != num_atoms * 3 {
            return Err(StructureError::CoordinateMismatch {
                atoms: num_atoms,
                expected: num_atoms * 3,
                got: frac_coords.len(),
            });
        }
        Ok(Self {
            lattice,
            species,
            frac_coords: DVector::from_vec(frac_coords),
            num_atoms,
        })
    }

    /// Fractional coordinates of one site.
    pub fn get_frac_coords(&self, atom_idx: usize) -> [f64; 3] {
        let i = atom_idx * 3;
        [
            self.frac_coords[i],
            self.frac_coords[i + 1],
            self.frac_coords[i + 2],
        ]
    }

    /// Distinct species in order of first appearance.
    pub fn unique_species(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for s in &self.species {
            if !seen.contains(&s.as_str()) {
                seen.push(s);
            }
        }
        seen
    }

    /// Returns a copy carrying a new cell and new coordinates, same species.
    pub fn with_geometry(
        &self,
        lattice: Lattice,
        frac_coords: Vec<f64>,
    ) -> Result<Self, StructureError> {
        Self::new(lattice, self.species.clone(), frac_coords)
    }

    /// Chemical formula in first-appearance order, e.g. `Mg4O4`.
    pub fn formula(&self) -> String {
        self.unique_species()
            .into_iter()
            .map(|s| {
                let n = self.species.iter().filter(|x| x.as_str() == s).count();
                if n == 1 {
                    s.to_string()
                } else {
                    format!("{}{}", s, n)
                }
            })
            .collect()
    }
}
