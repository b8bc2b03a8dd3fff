//! GULP input deck generation.
//!
//! A deck is a keyword line followed by blocks describing the cell, the
//! sites, the species and the force field. For a relaxation it looks like:
//!
//! ```text
//! opti stress conp conjugate nosymmetry
//!
//! cell
//!     4.210000    4.210000    4.210000   90.000000   90.000000   90.000000
//!
//! fractional
//! Mg       0.000000     0.000000     0.000000 core
//! O        0.500000     0.500000     0.500000 core
//!
//! Species
//! Mg   core Mg
//! O    core O
//!
//! library catlow.lib
//! ewald 10.0
//! maxcycle 1000
//! ```

use crate::config::{GulpConfig, OptimizationMode};
use crate::structure::Crystal;
use log::debug;
use std::fs;
use std::io;
use std::path::Path;

/// First line of the deck for a given mode.
pub fn keyword_line(mode: OptimizationMode) -> String {
    match mode {
        OptimizationMode::Single => "grad conp stress".to_string(),
        relax => format!("opti stress {} conjugate nosymmetry", relax.keyword()),
    }
}

/// Renders the full input deck.
pub fn build_input_deck(crystal: &Crystal, config: &GulpConfig) -> String {
    let (a, b, c, alpha, beta, gamma) = crystal.lattice.parameters();
    let mut deck = format!("{}\n", keyword_line(config.mode));

    deck.push_str(&format!(
        "\ncell\n{:12.6}{:12.6}{:12.6}{:12.6}{:12.6}{:12.6}\n",
        a, b, c, alpha, beta, gamma
    ));

    deck.push_str("\nfractional\n");
    for (i, site) in crystal.species.iter().enumerate() {
        let [x, y, z] = crystal.get_frac_coords(i);
        deck.push_str(&format!(
            "{:<4} {:12.6} {:12.6} {:12.6} core \n",
            site, x, y, z
        ));
    }

    deck.push_str("\nSpecies\n");
    for specie in crystal.unique_species() {
        deck.push_str(&format!("{:<4} core {:<4}\n", specie, specie));
    }

    deck.push_str(&format!("\nlibrary {}\n", config.forcefield));
    deck.push_str(&format!("ewald {:.1}\n", config.ewald_cutoff));
    if config.mode.is_relaxation() {
        deck.push_str(&format!("maxcycle {}\n", config.max_steps));
    }
    if let Some(dump) = &config.dump {
        deck.push_str(&format!("output cif {}\n", dump.display()));
    }

    deck
}

/// Writes the deck to `path`.
pub fn write_input_deck(crystal: &Crystal, config: &GulpConfig, path: &Path) -> io::Result<()> {
    let deck = build_input_deck(crystal, config);
    fs::write(path, deck)?;
    debug!("Wrote GULP input deck {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::Lattice;
    use std::path::PathBuf;

    fn mgo() -> Crystal {
        Crystal::new(
            Lattice::from_parameters(4.21, 4.21, 4.21, 90.0, 90.0, 90.0),
            vec!["Mg".into(), "O".into()],
            vec![0.0, 0.0, 0.0, 0.5, 0.5, 0.5],
        )
        .unwrap()
    }

    #[test]
    fn test_relaxation_deck() {
        let config = GulpConfig {
            forcefield: "catlow.lib".to_string(),
            ..GulpConfig::default()
        };
        let expected = "opti stress conp conjugate nosymmetry\n\
\n\
cell\n    4.210000    4.210000    4.210000   90.000000   90.000000   90.000000\n\
\n\
fractional\n\
Mg       0.000000     0.000000     0.000000 core \n\
O        0.500000     0.500000     0.500000 core \n\
\n\
Species\n\
Mg   core Mg  \n\
O    core O   \n\
\n\
library catlow.lib\n\
ewald 10.0\n\
maxcycle 1000\n";
        assert_eq!(build_input_deck(&mgo(), &config), expected);
    }

    #[test]
    fn test_single_point_deck_has_no_maxcycle() {
        let config = GulpConfig {
            mode: OptimizationMode::Single,
            forcefield: "catlow.lib".to_string(),
            ..GulpConfig::default()
        };
        let deck = build_input_deck(&mgo(), &config);
        assert!(deck.starts_with("grad conp stress\n"));
        assert!(!deck.contains("maxcycle"));
    }

    #[test]
    fn test_dump_line_and_constant_volume_keyword() {
        let config = GulpConfig {
            mode: OptimizationMode::Conv,
            dump: Some(PathBuf::from("relaxed.cif")),
            max_steps: 50,
            ..GulpConfig::default()
        };
        let deck = build_input_deck(&mgo(), &config);
        assert!(deck.starts_with("opti stress conv conjugate nosymmetry\n"));
        assert!(deck.ends_with("maxcycle 50\noutput cif relaxed.cif\n"));
    }
}
