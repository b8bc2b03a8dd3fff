//! gulprelax Command-Line Interface
//!
//! Entry point of the `gulprelax` program: argument parsing, logging setup
//! and dispatch to the library workflows.
//!
//! # Usage
//!
//! 1. **Relaxation** (`gulprelax opt <POSCAR> <library>`):
//!    Relaxes a structure through one or more GULP stages
//!
//! 2. **Single point** (`gulprelax single <POSCAR> <library>`):
//!    Energy, stress and forces without moving atoms
//!
//! 3. **Report parsing** (`gulprelax parse <gulp.log>`):
//!    Reads an existing GULP report
//!
//! 4. **Settings template** (`gulprelax ci gulprelax.cfg`)
//!
//! # Examples
//!
//! ```bash
//! gulprelax opt POSCAR catlow.lib --out CONTCAR
//! gulprelax opt POSCAR tersoff.lib --modes conv,conp --exe "mpirun -np 4 gulp"
//! gulprelax single POSCAR tersoff.lib --json
//! gulprelax parse tmp/_gulp.log --json
//! ```

use gulprelax::calculation::{CalculationReport, GulpCalculation};
use gulprelax::config::{GulpConfig, OptimizationMode};
use gulprelax::io::{read_poscar, write_poscar};
use gulprelax::parser::read_output_file;
use gulprelax::settings::{Settings, SettingsManager, SETTINGS_FILE_NAME};
use gulprelax::workflow::{self, JobSpec, DEFAULT_STAGES};
use log::{debug, info, warn};
use std::env;
use std::path::{Path, PathBuf};
use std::process;
use std::str::FromStr;

/// Options shared by the `opt`, `single` and `parse` commands.
#[derive(Debug, Default, PartialEq)]
struct CliOptions {
    positional: Vec<String>,
    modes: Option<Vec<OptimizationMode>>,
    exe: Option<String>,
    dir: Option<PathBuf>,
    label: Option<String>,
    steps: Option<u32>,
    dump: Option<PathBuf>,
    out: Option<PathBuf>,
    keep: bool,
    json: bool,
}

fn parse_options(args: &[String]) -> Result<CliOptions, String> {
    let mut opts = CliOptions::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        let mut value = |flag: &str| {
            iter.next()
                .cloned()
                .ok_or_else(|| format!("{} requires a value", flag))
        };

        match arg.as_str() {
            "--modes" => opts.modes = Some(OptimizationMode::parse_list(&value("--modes")?)?),
            "--exe" => opts.exe = Some(value("--exe")?),
            "--dir" => opts.dir = Some(PathBuf::from(value("--dir")?)),
            "--label" => opts.label = Some(value("--label")?),
            "--steps" => {
                let text = value("--steps")?;
                let steps = text
                    .parse::<u32>()
                    .map_err(|_| format!("Invalid --steps value '{}'", text))?;
                opts.steps = Some(steps);
            }
            "--dump" => opts.dump = Some(PathBuf::from(value("--dump")?)),
            "--out" => opts.out = Some(PathBuf::from(value("--out")?)),
            "--keep" => opts.keep = true,
            "--json" => opts.json = true,
            flag if flag.starts_with("--") => return Err(format!("Unknown option: {}", flag)),
            _ => opts.positional.push(arg.clone()),
        }
    }

    Ok(opts)
}

impl CliOptions {
    /// Job configuration: settings first, then command-line overrides.
    fn job_config(&self, settings: &SettingsManager, forcefield: &str) -> GulpConfig {
        let mut config = GulpConfig::from_settings(settings);
        config.forcefield = forcefield.to_string();
        if let Some(exe) = &self.exe {
            config.executable = exe.clone();
        }
        if let Some(dir) = &self.dir {
            config.workdir = dir.clone();
        }
        if let Some(label) = &self.label {
            config.label = label.clone();
        }
        if let Some(steps) = self.steps {
            config.max_steps = steps;
        }
        config.dump = self.dump.clone();
        config
    }

    fn clean(&self, settings: &SettingsManager) -> bool {
        !self.keep && settings.cleanup().enabled
    }
}

fn main() {
    let level_from_env = env::var_os("RUST_LOG").is_some();
    let mut builder = env_logger::Builder::from_default_env();
    if !level_from_env {
        // Settings narrow this through log::set_max_level once loaded.
        builder.filter_level(log::LevelFilter::Trace);
    }
    builder
        .target(env_logger::Target::Stdout)
        .format_timestamp_millis()
        .init();
    if !level_from_env {
        log::set_max_level(log::LevelFilter::Info);
    }

    let settings = match SettingsManager::load() {
        Ok(settings) => settings,
        Err(e) => {
            warn!("{}; using built-in defaults", e);
            SettingsManager::from_settings(Settings::default())
        }
    };
    if !level_from_env {
        log::set_max_level(settings_level(&settings.logging().level));
    }
    debug!("Settings source: {}", settings.config_source());

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage(&args[0]);
        process::exit(1);
    }

    check_help_flags(&args);

    let command = args[1].as_str();
    if command == "ci" {
        run_ci(&args);
        return;
    }

    let opts = match parse_options(&args[2..]) {
        Ok(opts) => opts,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let result = match command {
        "opt" => run_opt(&settings, &opts),
        "single" => run_single(&settings, &opts),
        "parse" => run_parse(&opts),
        _ => {
            eprintln!("Error: Unknown command: {}", command);
            print_usage(&args[0]);
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Level named in `[logging] level`, falling back to info.
fn settings_level(level: &str) -> log::LevelFilter {
    log::LevelFilter::from_str(level.trim()).unwrap_or_else(|_| {
        warn!("Unknown log level '{}', using info", level);
        log::LevelFilter::Info
    })
}

fn check_help_flags(args: &[String]) {
    use gulprelax::help::*;

    if args[1] == "--help" || args[1] == "-h" {
        match args.get(2).map(String::as_str) {
            Some("settings") => print_settings_help(),
            Some("modes") => print_modes_help(),
            Some(topic) => {
                eprintln!("Unknown help topic: {}", topic);
                eprintln!("Available topics: settings, modes");
                process::exit(1);
            }
            None => print_global_help(),
        }
        process::exit(0);
    }

    if args[2..].iter().any(|a| a == "--help" || a == "-h") {
        print_global_help();
        process::exit(0);
    }
}

fn print_usage(program_name: &str) {
    eprintln!("gulprelax - crystal structure relaxation with GULP");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  {} opt <POSCAR> <library> [options]", program_name);
    eprintln!("  {} single <POSCAR> <library> [options]", program_name);
    eprintln!("  {} parse <gulp.log> [--json]", program_name);
    eprintln!("  {} ci {}", program_name, SETTINGS_FILE_NAME);
    eprintln!();
    eprintln!("Run '{} --help' for all options.", program_name);
}

fn run_ci(args: &[String]) {
    match args.get(2).map(String::as_str) {
        Some(SETTINGS_FILE_NAME) => match run_create_settings_template() {
            Ok(()) => {
                println!("✓ Settings template created successfully!");
                println!("  Output file: {}", SETTINGS_FILE_NAME);
                println!("\nNext steps:");
                println!("  1. Point 'executable' at your GULP binary");
                println!("  2. Adjust the working directory and cleanup policy as needed");
                println!("  3. The settings will be automatically loaded by gulprelax");
            }
            Err(e) => {
                eprintln!("Error creating settings template: {}", e);
                process::exit(1);
            }
        },
        _ => {
            eprintln!("Usage: {} ci {}", args[0], SETTINGS_FILE_NAME);
            process::exit(1);
        }
    }
}

fn run_create_settings_template() -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(SETTINGS_FILE_NAME);
    if path.exists() {
        return Err(format!(
            "{} already exists. Please remove it first or choose a different location.",
            SETTINGS_FILE_NAME
        )
        .into());
    }
    SettingsManager::create_template(path)?;
    Ok(())
}

fn structure_and_library(opts: &CliOptions) -> Result<(PathBuf, &str), String> {
    match opts.positional.as_slice() {
        [poscar, library] => Ok((PathBuf::from(poscar), library.as_str())),
        _ => Err("expected <POSCAR> <library>".to_string()),
    }
}

fn run_opt(settings: &SettingsManager, opts: &CliOptions) -> Result<(), Box<dyn std::error::Error>> {
    let (poscar, library) = structure_and_library(opts)?;
    let crystal = read_poscar(&poscar)?;
    info!(
        "Read {} ({} sites) from {}",
        crystal.formula(),
        crystal.num_atoms,
        poscar.display()
    );

    let base = opts.job_config(settings, library);
    let stages = opts
        .modes
        .clone()
        .unwrap_or_else(|| vec![base.mode; DEFAULT_STAGES.len()]);
    let spec = JobSpec {
        forcefield: &base.forcefield,
        executable: &base.executable,
        workdir: &base.workdir,
        label: &base.label,
        clean: opts.clean(settings),
    };

    let relaxed = workflow::optimize_with(&crystal, &spec, &stages, &base)?;
    let (a, b, c, alpha, beta, gamma) = relaxed.crystal.lattice.parameters();

    if opts.json {
        let summary = serde_json::json!({
            "energy": relaxed.energy,
            "cpu_time": relaxed.cpu_time,
            "formula": relaxed.crystal.formula(),
            "cell": [a, b, c, alpha, beta, gamma],
            "volume": relaxed.crystal.lattice.volume(),
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!();
        println!("Final energy     : {:.8} eV", relaxed.energy);
        println!(
            "Cell             : {:.6} {:.6} {:.6} {:.3} {:.3} {:.3}",
            a, b, c, alpha, beta, gamma
        );
        println!("Volume           : {:.6} A^3", relaxed.crystal.lattice.volume());
        println!("GULP CPU time    : {:.2} s", relaxed.cpu_time);
    }

    if let Some(out) = &opts.out {
        write_poscar(&relaxed.crystal, out)?;
        info!("Optimised structure written to {}", out.display());
    }
    Ok(())
}

fn run_single(
    settings: &SettingsManager,
    opts: &CliOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let (poscar, library) = structure_and_library(opts)?;
    let crystal = read_poscar(&poscar)?;

    let mut config = opts.job_config(settings, library);
    config.mode = match opts.modes.as_deref() {
        Some([mode]) => *mode,
        Some(_) => return Err("'single' takes exactly one mode".into()),
        None => OptimizationMode::Single,
    };

    let mut calc = GulpCalculation::new(crystal, config)?;
    let report = CalculationReport::from(calc.run(opts.clean(settings))?);
    print_report(&report, opts.json)?;

    if let Some(out) = &opts.out {
        write_poscar(&calc.to_crystal()?, out)?;
        info!("Structure written to {}", out.display());
    }
    Ok(())
}

fn run_parse(opts: &CliOptions) -> Result<(), Box<dyn std::error::Error>> {
    let [log_file] = opts.positional.as_slice() else {
        return Err("expected <gulp.log>".into());
    };
    let output = read_output_file(Path::new(log_file))?;
    if !output.finished {
        warn!("{} has no 'Job Finished' line", log_file);
    }
    print_report(&CalculationReport::from(&output), opts.json)
}

fn print_report(report: &CalculationReport, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!();
    println!("Total lattice energy : {:.8} eV", report.energy);
    println!("Cycles               : {}", report.iterations);
    println!("CPU time             : {:.4} s", report.cpu_time);
    println!("Job finished         : {}", if report.finished { "YES" } else { "NO" });

    if let Some(stress) = &report.stress {
        println!();
        println!(" Stress (GPa)      xx          yy          zz          yz          xz          xy");
        let row: Vec<String> = stress.iter().map(|s| format!("{:11.6}", s)).collect();
        println!("             {}", row.join(" "));
    }

    if let Some(forces) = &report.forces {
        println!();
        println!(" Atom        Fx (eV/A)      Fy (eV/A)      Fz (eV/A)");
        println!("------------------------------------------------------");
        for (i, f) in forces.iter().enumerate() {
            let label = report
                .labels
                .as_ref()
                .and_then(|l| l.get(i))
                .map_or("", String::as_str);
            println!(
                " {:>4} {:<4} {:14.6} {:14.6} {:14.6}",
                i + 1,
                label,
                f[0],
                f[1],
                f[2]
            );
        }
    }
    Ok(())
}
