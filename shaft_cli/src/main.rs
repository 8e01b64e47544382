//! # Shaftwork CLI
//!
//! Command line front end for `shaft_core`.
//!
//! ```text
//! shaft size design.json --constants site.json
//! shaft demo --topology four-point --fatigue synthesized
//! shaft project new drivetrain.lss --engineer "J. Doe" --job WT-042 --turbine "NREL 5MW"
//! shaft project add drivetrain.lss design.json
//! shaft project run drivetrain.lss --json
//! shaft project report drivetrain.lss package.pdf
//! ```
//!
//! Set `RUST_LOG=shaft_core=debug` to follow the span and seat searches.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use shaft_core::calculations::low_speed_shaft::{calculate, FatigueMode, LowSpeedShaftInput, LowSpeedShaftResult};
use shaft_core::calculations::static_sizing::SupportTopology;
use shaft_core::calculations::{CalculationItem, CalculationOutput};
use shaft_core::config::DesignConstants;
use shaft_core::errors::{CalcError, CalcResult};
use shaft_core::file_io::{self, FileLock};
use shaft_core::pdf;
use shaft_core::project::Project;

#[derive(Parser)]
#[command(name = "shaft")]
#[command(about = "Shaftwork - low-speed shaft and main bearing sizing", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Size one design from a JSON input deck
    Size {
        /// Path to a LowSpeedShaftInput JSON file
        input: PathBuf,
        /// Design constants JSON (defaults when omitted)
        #[arg(long)]
        constants: Option<PathBuf>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
        /// Also write a PDF report
        #[arg(long)]
        pdf: Option<PathBuf>,
    },
    /// Size the 5 MW reference drivetrain
    Demo {
        #[arg(long, default_value = "three-point", value_parser = parse_topology)]
        topology: SupportTopology,
        #[arg(long, default_value = "off", value_parser = parse_fatigue)]
        fatigue: FatigueMode,
        #[arg(long)]
        json: bool,
    },
    /// Manage .lss project files
    #[command(subcommand)]
    Project(ProjectCommands),
}

#[derive(Subcommand)]
enum ProjectCommands {
    /// Create an empty project
    New {
        path: PathBuf,
        #[arg(long, default_value = "")]
        engineer: String,
        #[arg(long, default_value = "")]
        job: String,
        #[arg(long, default_value = "")]
        turbine: String,
    },
    /// Add a design deck to a project
    Add {
        path: PathBuf,
        /// Path to a LowSpeedShaftInput JSON file
        input: PathBuf,
    },
    /// Size every design in a project
    Run {
        path: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Write the calculation package for a project as PDF
    Report {
        path: PathBuf,
        output: PathBuf,
    },
}

fn parse_topology(s: &str) -> Result<SupportTopology, String> {
    SupportTopology::from_str_flexible(s).map_err(|e| e.to_string())
}

fn parse_fatigue(s: &str) -> Result<FatigueMode, String> {
    FatigueMode::from_str_flexible(s).map_err(|e| e.to_string())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Size {
            input,
            constants,
            json,
            pdf,
        } => cmd_size(&input, constants.as_deref(), json, pdf.as_deref()),
        Commands::Demo { topology, fatigue, json } => cmd_demo(topology, fatigue, json),
        Commands::Project(project_cmd) => match project_cmd {
            ProjectCommands::New {
                path,
                engineer,
                job,
                turbine,
            } => cmd_project_new(&path, engineer, job, turbine),
            ProjectCommands::Add { path, input } => cmd_project_add(&path, &input),
            ProjectCommands::Run { path, json } => cmd_project_run(&path, json),
            ProjectCommands::Report { path, output } => cmd_project_report(&path, &output),
        },
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&e);
            ExitCode::FAILURE
        }
    }
}

fn load_constants(path: Option<&Path>) -> CalcResult<DesignConstants> {
    match path {
        Some(path) => DesignConstants::from_json_file(path),
        None => Ok(DesignConstants::default()),
    }
}

fn cmd_size(input: &Path, constants: Option<&Path>, json: bool, pdf_path: Option<&Path>) -> CalcResult<()> {
    let constants = load_constants(constants)?;
    let deck: LowSpeedShaftInput = file_io::read_json(input)?;
    let result = calculate(&deck, &constants)?;
    emit(&result, json)?;

    if let Some(pdf_path) = pdf_path {
        let bytes = pdf::render_shaft_pdf(&deck, &result, &current_user(), "")?;
        write_bytes(pdf_path, &bytes)?;
    }
    Ok(())
}

fn cmd_demo(topology: SupportTopology, fatigue: FatigueMode, json: bool) -> CalcResult<()> {
    let input = LowSpeedShaftInput::reference_5mw(topology, fatigue);
    let result = calculate(&input, &DesignConstants::default())?;
    emit(&result, json)
}

fn cmd_project_new(path: &Path, engineer: String, job: String, turbine: String) -> CalcResult<()> {
    if path.exists() {
        return Err(CalcError::file_error(
            "create project",
            path.display().to_string(),
            "file already exists",
        ));
    }
    let project = Project::new(engineer, job, turbine);
    file_io::save_project(&project, path)?;
    println!("Created {}", path.display());
    Ok(())
}

fn cmd_project_add(path: &Path, input: &Path) -> CalcResult<()> {
    let _lock = FileLock::acquire(path, current_user())?;
    let mut project = file_io::load_project(path)?;
    let deck: LowSpeedShaftInput = file_io::read_json(input)?;
    deck.validate()?;

    let label = deck.label.clone();
    let id = project.add_item(CalculationItem::LowSpeedShaft(deck));
    file_io::save_project(&project, path)?;
    println!("Added '{}' ({}) to {}", label, id, path.display());
    Ok(())
}

fn cmd_project_run(path: &Path, json: bool) -> CalcResult<()> {
    let (project, lock) = file_io::load_project_with_lock_check(path)?;
    if let Some(lock) = lock {
        tracing::warn!(user = %lock.user_id, machine = %lock.machine, "project is open elsewhere; results may be stale");
    }

    let mut results = project.run_all();
    let mut first_failure = None;

    for (id, item) in project.items_by_label() {
        match results.remove(id) {
            Some(Ok(CalculationOutput::LowSpeedShaft(result))) => emit(&result, json)?,
            Some(Err(e)) => {
                eprintln!("{}: {}", item.label(), e);
                first_failure.get_or_insert(e);
            }
            None => {}
        }
    }

    match first_failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn cmd_project_report(path: &Path, output: &Path) -> CalcResult<()> {
    let project = file_io::load_project(path)?;
    let bytes = pdf::render_project_pdf(&project)?;
    write_bytes(output, &bytes)
}

fn write_bytes(path: &Path, bytes: &[u8]) -> CalcResult<()> {
    std::fs::write(path, bytes)
        .map_err(|e| CalcError::file_error("write", path.display().to_string(), e.to_string()))?;
    println!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

fn current_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}

fn emit(result: &LowSpeedShaftResult, json: bool) -> CalcResult<()> {
    if json {
        let text = serde_json::to_string_pretty(result).map_err(|e| CalcError::SerializationError {
            reason: e.to_string(),
        })?;
        println!("{}", text);
    } else {
        print_report(result);
    }
    Ok(())
}

fn print_report(result: &LowSpeedShaftResult) {
    let geometry = &result.static_sizing.geometry;

    println!("═══════════════════════════════════════");
    println!("  {} ({}, fatigue {})", result.label, result.topology, result.fatigue_mode);
    println!("═══════════════════════════════════════");
    println!();
    println!("Geometry:");
    println!("  Length:        {:.3} m", result.length_m);
    println!("  Hub seat:      {:.3} m", result.hub_seat_diameter_m);
    println!("  Second seat:   {:.3} m", result.second_seat_diameter_m);
    println!("  Bore:          {:.3} m", result.bore_m);
    println!("  Main span:     {:.3} m (budget {:.3} m)", geometry.main_span_m, result.span_budget_m);
    if result.topology == SupportTopology::FourPoint {
        println!("  Gearbox span:  {:.3} m", geometry.gearbox_span_m);
    }
    println!();
    println!("Mass properties:");
    println!("  Mass:          {:.0} kg", result.mass_kg);
    println!(
        "  CM:            [{:.3}, {:.3}, {:.3}] m",
        result.cm[0], result.cm[1], result.cm[2]
    );
    println!(
        "  Inertia:       [{:.0}, {:.0}, {:.0}] kg·m²",
        result.inertia[0], result.inertia[1], result.inertia[2]
    );
    println!();
    println!("Bearings:");
    for (name, bearing) in [("Upwind", &result.upwind_bearing), ("Second", &result.second_bearing)] {
        print!(
            "  {:<7} {} d={:.3} m, {:.0} kg with housing",
            name, bearing.seat.bearing_type, bearing.seat.diameter_m, bearing.assembly.mass_kg
        );
        match bearing.required_rating_n {
            Some(rating) => println!(", C_req={:.0} kN", rating / 1000.0),
            None => println!(),
        }
    }

    if let Some(damage) = &result.hub_seat_damage {
        println!();
        println!("Fatigue damage:");
        println!(
            "  Hub seat:      {:.3} (stochastic {:.3}, deterministic {:.3})",
            damage.total(),
            damage.stochastic,
            damage.deterministic
        );
        if let Some(gb) = &result.gearbox_seat_damage {
            println!("  Gearbox seat:  {:.3}", gb.total());
        }
    }

    println!();
    println!(
        "  Governs: {}",
        if result.fatigue_governs() { "fatigue" } else { "static" }
    );
    println!();
}

fn report_error(e: &CalcError) {
    eprintln!("Error [{}]: {}", e.error_code(), e);
    if let Ok(json) = serde_json::to_string_pretty(e) {
        eprintln!();
        eprintln!("Error JSON:");
        eprintln!("{}", json);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn demo_flags_parse_flexibly() {
        let cli = Cli::try_parse_from(["shaft", "demo", "--topology", "4pt", "--fatigue", "synthesized"]).unwrap();
        match cli.command {
            Commands::Demo { topology, fatigue, json } => {
                assert_eq!(topology, SupportTopology::FourPoint);
                assert_eq!(fatigue, FatigueMode::Synthesized);
                assert!(!json);
            }
            _ => panic!("expected demo"),
        }
    }

    #[test]
    fn unknown_topology_is_rejected() {
        assert!(Cli::try_parse_from(["shaft", "demo", "--topology", "five-point"]).is_err());
    }
}
