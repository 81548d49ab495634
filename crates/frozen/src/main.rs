//! Frozen CLI - freeze a running web application into a static site.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "frozen")]
#[command(about = "Freeze a running web application into a static site")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to frozen.toml config file
    #[arg(short, long, default_value = "frozen.toml")]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a starter config and source directories
    Init {
        /// Overwrite existing files
        #[arg(short, long)]
        yes: bool,
    },

    /// Render every page of the running application into the output directory
    Build {
        /// Output directory (defaults to config or "output")
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Base URL of the running application
        #[arg(long)]
        origin: Option<String>,

        /// Pages rendered at once
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Keep rendering after a page fails
        #[arg(long)]
        continue_on_error: bool,
    },

    /// Preview the built site
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,

        /// Directory to serve (defaults to the configured output)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Do not open browser
        #[arg(long)]
        no_open: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    match cli.command {
        Commands::Init { yes } => {
            commands::init::run(&cli.config, yes).await?;
        }
        Commands::Build {
            output,
            origin,
            jobs,
            continue_on_error,
        } => {
            let overrides = commands::build::Overrides {
                output,
                origin,
                jobs,
                continue_on_error,
            };
            commands::build::run(&cli.config, overrides).await?;
        }
        Commands::Serve { port, dir, no_open } => {
            commands::serve::run(&cli.config, port, dir, !no_open).await?;
        }
    }

    Ok(())
}
