use amalgam::{AmalgamateConfig, ConfigFile, Orchestrator, ProcessCompiler};
use amalgam_core::paths;
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "amalgam")]
#[command(
    about = "Merge a compilation database into one conflict-free C translation unit",
    long_about = None
)]
struct Cli {
    /// Artifact name: writes <NAME>.c, <NAME>.o, <NAME>.ii and <NAME> into the output directory
    name: Option<String>,

    /// Project root; unit paths and relative options are resolved against it
    #[arg(short = 'C', long, default_value = ".")]
    project_root: PathBuf,

    /// Compilation database (default: compile_commands.json)
    #[arg(long)]
    database: Option<PathBuf>,

    /// Directory for generated artifacts (default: amalgamated)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Files to leave out (default: <output-dir>/files_with_errors.txt)
    #[arg(long)]
    skip_list: Option<PathBuf>,

    /// Compiler used for the amalgamated unit
    #[arg(long, env = "CC")]
    compiler: Option<String>,

    /// Drop this flag from every unit (repeatable)
    #[arg(long = "drop-flag", value_name = "FLAG", allow_hyphen_values = true)]
    drop_flags: Vec<String>,

    /// Macro whose presence marks a unit-test variant (default: UNIT_TEST)
    #[arg(long)]
    unit_test_marker: Option<String>,

    /// Extra argument for the link command (repeatable)
    #[arg(long = "link-arg", value_name = "ARG", allow_hyphen_values = true)]
    link_args: Vec<String>,

    /// Compile the final unit again and report remaining collisions
    #[arg(long)]
    verify: bool,

    /// Also print the command that links the executable
    #[arg(long)]
    link: bool,

    /// TOML file with defaults for any of the options above
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

impl Cli {
    fn layer(&self) -> ConfigFile {
        ConfigFile {
            name: self.name.clone(),
            database: self.database.clone(),
            output_dir: self.output_dir.clone(),
            skip_list: self.skip_list.clone(),
            compiler: self.compiler.clone(),
            drop_flags: self.drop_flags.clone(),
            unit_test_marker: self.unit_test_marker.clone(),
            link_args: self.link_args.clone(),
            verify: self.verify.then_some(true),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.debug {
        tracing::Level::TRACE
    } else if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    // stdout is reserved for the reported commands
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(cli.debug)
        .with_writer(std::io::stderr)
        .init();

    let cwd = std::env::current_dir().context("Failed to determine the working directory")?;
    let project_root = paths::resolve(&cli.project_root, &cwd);
    let config = AmalgamateConfig::resolve(&project_root, cli.layer(), cli.config.as_deref())?;
    info!(
        "Amalgamating {} into {}",
        config.database.display(),
        config.output_dir.display()
    );

    let report = Orchestrator::new(config, ProcessCompiler::new()).run()?;

    info!(
        "{} of {} units amalgamated, {} identifiers renamed",
        report.included_units().len(),
        report.units,
        report.resolution.renamings.identifier_count()
    );
    if report.verified_clean() == Some(false) {
        warn!("The final unit still has name collisions; see the warnings above");
    }

    println!("{}", report.commands.preprocess);
    println!("{}", report.commands.compile);
    if cli.link {
        println!("{}", report.commands.link);
    }
    Ok(())
}
