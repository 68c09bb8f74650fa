//! Main CLI application structure

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use super::output::{Output, OutputFormat};
use super::plan;
use crate::domain::Strategy;
use crate::storage::Config;

#[derive(Parser)]
#[command(name = "taskplan")]
#[command(author, version, about = "Dependency validation and execution planning for generated tasks")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to the global config, then text)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default taskplan.toml
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,
    },

    /// Validate a task file and print its execution plan
    Plan {
        /// Task file (.json, .jsonl, .yaml)
        file: PathBuf,

        /// Ordering strategy (sequential, critical_path, parallelizable)
        #[arg(long, short)]
        strategy: Option<Strategy>,

        /// Skip keyword-based dependency suggestions
        #[arg(long)]
        no_suggestions: bool,
    },

    /// Print the validation report; fails when the task set is invalid
    Validate {
        /// Task file (.json, .jsonl, .yaml)
        file: PathBuf,

        /// Skip keyword-based dependency suggestions
        #[arg(long)]
        no_suggestions: bool,
    },

    /// Show dependencies suggested by task titles
    Suggest {
        /// Task file (.json, .jsonl, .yaml)
        file: PathBuf,
    },
}

/// Installs the tracing subscriber; library events go to stderr
fn init_tracing(verbose: bool) {
    let default_level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load()?;
    let format = cli
        .format
        .unwrap_or_else(|| config.global.default_format.into());
    let output = Output::new(format, cli.verbose);

    output.verbose("taskplan starting");
    if let Some(root) = &config.project_root {
        output.verbose_ctx("config", &format!("Using project config in {}", root.display()));
    }

    match cli.command {
        Commands::Init { path } => {
            output.verbose_ctx("init", &format!("Initializing config at: {}", path));
            let (config_path, created) = Config::init_project(std::path::Path::new(&path))?;
            if created {
                output.success(&format!("Created {}", config_path.display()));
            } else {
                output.success(&format!("{} already exists", config_path.display()));
            }
        }

        Commands::Plan {
            file,
            strategy,
            no_suggestions,
        } => {
            output.verbose_ctx("plan", &format!("Planning {} (strategy: {:?})", file.display(), strategy));
            plan::plan(&output, &config, &file, strategy, no_suggestions)?
        }

        Commands::Validate {
            file,
            no_suggestions,
        } => {
            output.verbose_ctx("validate", &format!("Validating {}", file.display()));
            plan::validate(&output, &config, &file, no_suggestions)?
        }

        Commands::Suggest { file } => {
            output.verbose_ctx("suggest", &format!("Scanning {}", file.display()));
            plan::suggest(&output, &config, &file)?
        }
    }

    output.verbose("Command completed successfully");
    Ok(())
}
