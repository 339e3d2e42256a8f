use clap::{Parser, Subcommand};
use loc_footprint::{logging, reporter::ReportFormat, Analyzer, Config, ProjectGraph, Reporter, ResolutionCache};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "loc-footprint")]
#[command(about = "Computes the transitive lines-of-code footprint of every module in a workspace")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Enable debug logging (overridden by LOC_FOOTPRINT_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute per-module footprints and write the report
    Analyze {
        /// Workspace root to analyze
        #[arg(short, long, default_value = ".")]
        path: PathBuf,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output directory for reports
        #[arg(short, long, default_value = "./footprint-output")]
        output: PathBuf,

        /// Report formats written next to the module summary
        #[arg(long, value_enum, default_value = "all")]
        format: ReportFormat,
    },
    /// Export the resolved project dependency graph in Graphviz DOT format
    Graph {
        /// Workspace root to analyze
        #[arg(short, long, default_value = ".")]
        path: PathBuf,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Generate a default configuration file
    Config {
        /// Output path for the config file (defaults to ~/.loc-footprint.toml)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);

    match cli.command {
        Commands::Analyze { path, config, output, format } => {
            analyze_workspace(path, config, output, format)?;
        }
        Commands::Graph { path, config, output } => {
            export_graph(path, config, output)?;
        }
        Commands::Config { output } => {
            generate_config(output)?;
        }
    }

    Ok(())
}

fn load_config(target_path: PathBuf, config_path: Option<PathBuf>) -> anyhow::Result<Config> {
    let mut config = match config_path {
        Some(config_path) => Config::from_file(&config_path)?,
        None => Config::load()?,
    };
    config.workspace_directory = target_path;
    Ok(config)
}

fn analyze_workspace(
    target_path: PathBuf,
    config_path: Option<PathBuf>,
    output_path: PathBuf,
    format: ReportFormat,
) -> anyhow::Result<()> {
    println!("🚀 Starting workspace footprint analysis");
    println!("========================================");

    let start_time = Instant::now();
    let config = load_config(target_path, config_path)?;
    let reporter = Reporter::new(config.report.summary_file_name.clone());

    println!("🎯 Workspace: {}", config.workspace_directory.display());
    println!("📤 Output directory: {}", output_path.display());

    let analyzer = Analyzer::new(config)?;
    let analysis = analyzer.analyze_workspace()?;
    let duration = start_time.elapsed();

    analysis.print_summary();

    println!("\n📊 Generating reports...");
    let report = reporter.generate_report(&analysis, duration.as_millis());
    let exported_files = reporter.export_report(&report, &output_path, format)?;

    println!("\n✅ Analysis completed in {:.2}s", duration.as_secs_f64());
    println!("📁 Reports exported to:");
    for file in exported_files {
        println!("   - {}", file.display());
    }

    Ok(())
}

fn export_graph(target_path: PathBuf, config_path: Option<PathBuf>, output_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = load_config(target_path, config_path)?;
    let analyzer = Analyzer::new(config)?;
    let projects = analyzer.load_projects()?;

    let cache = ResolutionCache::new();
    let dot = ProjectGraph::build(&projects, &cache).to_dot();

    match output_path {
        Some(path) => {
            std::fs::write(&path, dot)?;
            println!("🕸️  Dependency graph written to {}", path.display());
        }
        None => print!("{}", dot),
    }

    Ok(())
}

fn generate_config(output_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config_path = match output_path {
        Some(path) => path,
        None => Config::default_config_path()?,
    };

    println!("📝 Generating configuration file: {}", config_path.display());
    std::fs::write(&config_path, Config::create_documented_config())?;

    println!("✅ Configuration file created successfully!");
    println!("💡 Edit the file to customize discovery, exclusions and report output.");

    Ok(())
}
