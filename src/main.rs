//! litweave CLI - literate document weaver

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use litweave::commands::{self, OutputFormat};
use litweave::interface::Context;

#[derive(Parser)]
#[command(name = "litweave")]
#[command(author, version, about = "Literate document weaver", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Working directory
    #[arg(short = 'C', long, global = true)]
    directory: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a source file and write the woven document
    Weave {
        /// Source file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Markdown)]
        format: OutputFormat,

        /// Echo executed code before each directive
        #[arg(long)]
        echo: bool,
    },

    /// Weave without writing and report every problem
    Check {
        /// Source file
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Re-weave whenever the source or its inputs change
    Watch {
        /// Source file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Markdown)]
        format: OutputFormat,

        /// Debounce delay in milliseconds
        #[arg(short, long, default_value = "100")]
        debounce: u64,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let base_dir = cli
        .directory
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    let config = match cli.config {
        Some(ref path) => litweave::config::read_config_file(path),
        None => litweave::config::read_config(&base_dir),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error reading configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut ctx = Context::new(config, base_dir);

    let result = match cli.command {
        Commands::Weave {
            file,
            output,
            format,
            echo,
        } => {
            let options = commands::WeaveOptions {
                file,
                output,
                format,
                echo,
            };
            commands::weave(&mut ctx, options)
        }

        Commands::Check { file } => commands::check(&ctx, commands::CheckOptions { file }),

        Commands::Watch {
            file,
            output,
            format,
            debounce,
        } => {
            let options = commands::WatchOptions {
                file,
                output,
                format,
                debounce_ms: debounce,
            };
            commands::watch(&ctx, options)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
