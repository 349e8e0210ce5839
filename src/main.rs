use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod core;
mod output;

use crate::core::Target;

#[derive(Parser)]
#[command(name = "umlgen")]
#[command(
    author,
    version,
    about = "Generate PlantUML class diagrams from Java sources via the UML generator jar"
)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging and pass -v to the generator
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Result format (defaults to output.format from the config file)
    #[arg(short, long, global = true)]
    format: Option<output::Format>,

    /// Explicit configuration file
    #[arg(short, long, global = true, env = "UMLGEN_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a diagram for each source file
    File {
        /// Source files to process
        #[arg(required = true)]
        paths: Vec<String>,

        #[command(flatten)]
        generation: GenerationFlags,
    },

    /// Generate a diagram for each source directory
    Dir {
        /// Directories to process
        #[arg(required = true)]
        paths: Vec<String>,

        #[command(flatten)]
        generation: GenerationFlags,
    },

    /// Show current configuration
    Config {
        /// Initialize a new config file
        #[arg(long)]
        init: bool,
    },
}

#[derive(Args)]
struct GenerationFlags {
    /// Path to the UML generator jar
    #[arg(long, env = "UMLGEN_TOOL_PATH")]
    tool: Option<PathBuf>,

    /// Java launcher used for .jar tools
    #[arg(long, env = "UMLGEN_JAVA")]
    java: Option<PathBuf>,

    /// Output directory, relative to the workspace root or the input
    #[arg(short, long, env = "UMLGEN_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Workspace root used to anchor a relative output directory
    #[arg(short, long)]
    workspace: Option<PathBuf>,

    /// Leave relationship arrows out of the diagram
    #[arg(long)]
    no_relationships: bool,

    /// Do not open the generated diagram
    #[arg(long)]
    no_open: bool,

    /// Open the folder containing each generated diagram
    #[arg(long)]
    reveal: bool,

    /// Kill the generator after this many seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Number of generator processes run at once
    #[arg(short, long, default_value = "4")]
    parallelism: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose { "debug" } else { "info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let (paths, generation, is_directory) = match cli.command {
        Commands::File { paths, generation } => (paths, generation, false),
        Commands::Dir { paths, generation } => (paths, generation, true),
        Commands::Config { init } => {
            return commands::config::run(init, cli.config.as_deref());
        }
    };

    commands::generate::run(commands::generate::GenerateArgs {
        paths,
        target: Target::from_is_directory(is_directory),
        tool: generation.tool,
        java: generation.java,
        output_dir: generation.output_dir,
        workspace: generation.workspace,
        no_relationships: generation.no_relationships,
        no_open: generation.no_open,
        reveal: generation.reveal,
        timeout: generation.timeout,
        parallelism: generation.parallelism,
        verbose: cli.verbose,
        format: cli.format,
        config: cli.config,
    })
    .await
}
