//! Built-in help for the command-line tool.

use crate::config::{DEFAULT_EWALD_CUTOFF, DEFAULT_MAX_STEPS};

/// Category of a settings key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordCategory {
    /// `[gulp]` section
    Gulp,
    /// `[files]` section
    Files,
    /// `[logging]` section
    Logging,
    /// `[cleanup]` section
    Cleanup,
}

impl KeywordCategory {
    fn section(self) -> &'static str {
        match self {
            KeywordCategory::Gulp => "[gulp]",
            KeywordCategory::Files => "[files]",
            KeywordCategory::Logging => "[logging]",
            KeywordCategory::Cleanup => "[cleanup]",
        }
    }
}

/// Documentation entry for one settings key.
#[derive(Debug, Clone)]
pub struct Keyword {
    /// Key name as written in gulprelax.cfg
    pub name: &'static str,
    /// Section the key belongs to
    pub category: KeywordCategory,
    /// What the key controls
    pub description: &'static str,
    /// Built-in default
    pub default_value: &'static str,
}

/// All settings keys.
pub const KEYWORDS: &[Keyword] = &[
    Keyword {
        name: "executable",
        category: KeywordCategory::Gulp,
        description: "GULP executable; launcher words allowed (mpirun -np 4 gulp)",
        default_value: "gulp",
    },
    Keyword {
        name: "ewald_cutoff",
        category: KeywordCategory::Gulp,
        description: "Real-space Ewald cutoff written to every deck",
        default_value: "10.0",
    },
    Keyword {
        name: "max_steps",
        category: KeywordCategory::Gulp,
        description: "maxcycle for relaxations",
        default_value: "1000",
    },
    Keyword {
        name: "mode",
        category: KeywordCategory::Gulp,
        description: "Stage mode for 'opt' without --modes (run twice)",
        default_value: "conp",
    },
    Keyword {
        name: "workdir",
        category: KeywordCategory::Files,
        description: "Directory for input decks and reports",
        default_value: "tmp",
    },
    Keyword {
        name: "input_name",
        category: KeywordCategory::Files,
        description: "Deck file name, prefixed with the job label",
        default_value: "gulp.in",
    },
    Keyword {
        name: "output_name",
        category: KeywordCategory::Files,
        description: "Report file name, prefixed with the job label",
        default_value: "gulp.log",
    },
    Keyword {
        name: "level",
        category: KeywordCategory::Logging,
        description: "Log level: debug, info, warn, error",
        default_value: "info",
    },
    Keyword {
        name: "enabled",
        category: KeywordCategory::Cleanup,
        description: "Delete deck, report and CIF dump after each job",
        default_value: "true",
    },
];

/// Print global help
pub fn print_global_help() {
    println!("gulprelax - run GULP lattice-energy relaxations on crystal structures");
    println!();
    println!("USAGE:");
    println!("    gulprelax <COMMAND> [ARGS] [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    opt <POSCAR> <library>     Relax a structure (stages from --modes, default conp,conp)");
    println!("    single <POSCAR> <library>  Single point: energy, stress and forces");
    println!("    parse <gulp.log>           Parse an existing GULP report");
    println!("    ci gulprelax.cfg           Create a settings template");
    println!();
    println!("OPTIONS:");
    println!("    --modes <m1,m2,..>   Stage modes for 'opt' (conv, conp, single)");
    println!("    --exe <command>      GULP executable (default from settings)");
    println!("    --dir <path>         Working directory (default from settings)");
    println!("    --label <text>       File name prefix (default '_')");
    println!("    --steps <n>          maxcycle (default {})", DEFAULT_MAX_STEPS);
    println!("    --dump <file.cif>    Ask GULP to write the final structure as CIF");
    println!("    --out <POSCAR>       Write the optimised structure");
    println!("    --keep               Keep decks and reports");
    println!("    --json               Print the result as JSON");
    println!("    -h, --help [topic]   Show help. Topics: settings, modes");
    println!();
    println!("EXAMPLES:");
    println!("    gulprelax opt POSCAR catlow.lib --out CONTCAR");
    println!("    gulprelax opt POSCAR tersoff.lib --modes conv,conp --keep");
    println!("    gulprelax single POSCAR tersoff.lib --json");
    println!("    gulprelax parse tmp/_gulp.log");
    println!();
}

/// Print settings reference
pub fn print_settings_help() {
    println!("SETTINGS (gulprelax.cfg)");
    println!("════════════════════════════════════════════════════════════");
    println!();
    println!("Loaded from /etc/gulprelax, ~/.config/gulprelax and the current");
    println!("directory, later files overriding earlier ones.");

    let mut current = None;
    for keyword in KEYWORDS {
        if current != Some(keyword.category) {
            println!();
            println!("{}", keyword.category.section());
            current = Some(keyword.category);
        }
        println!(
            "  {:<14} {} (default: {})",
            keyword.name, keyword.description, keyword.default_value
        );
    }
    println!();
}

/// Print mode reference
pub fn print_modes_help() {
    println!("OPTIMISATION MODES");
    println!("════════════════════════════════════════════════════════════");
    println!();
    println!("  conv    opti stress conv conjugate nosymmetry");
    println!("          Relax atomic positions at fixed cell volume.");
    println!();
    println!("  conp    opti stress conp conjugate nosymmetry");
    println!("          Relax positions and cell at constant pressure.");
    println!();
    println!("  single  grad conp stress");
    println!("          Energy, gradients and stress without moving atoms.");
    println!();
    println!(
        "Every deck also carries 'ewald {:.1}' and, for relaxations, 'maxcycle'.",
        DEFAULT_EWALD_CUTOFF
    );
    println!();
}
