//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod extract;
pub mod say;
pub mod settings;


use std::error::Error;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::cli::extract::{run_extract, run_preview};
use crate::cli::say::{run_say, SayOptions};
use crate::cli::settings::{SetContext, SettingError, SettingRegistry};
use crate::core::config::{path_display, Config};
use crate::core::extract::DEFAULT_SCOPE;
use crate::utils::logging;

#[derive(Parser)]
#[command(name = "vellum")]
#[command(about = "Chat replies with their code, markup and data pulled out as artifacts")]
#[command(
    long_about = "Vellum streams replies from an OpenAI-compatible chat server and turns \
fenced blocks in the finished text into artifacts: HTML pages, SVG images, JSON data, \
code, React components and long text.\n\n\
Environment Variables:\n\
  VELLUM_API_KEY    Bearer token sent to the server (optional)\n\
  RUST_LOG          Log filter (defaults to vellum=info)"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Use this config file instead of the default location
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract artifacts from a file (or stdin) and print them as JSON
    Extract {
        /// Input file; reads stdin when omitted
        file: Option<PathBuf>,
        /// Prefix for artifact ids
        #[arg(long, default_value = DEFAULT_SCOPE)]
        scope: String,
    },
    /// Send a prompt and stream the reply
    Say {
        /// Prompt text (multiple words are joined with spaces)
        #[arg(required = true, trailing_var_arg = true)]
        prompt: Vec<String>,
        /// Model to request; defaults to the persona's or the configured model
        #[arg(short = 'm', long)]
        model: Option<String>,
        /// Persona id to speak as
        #[arg(long)]
        persona: Option<String>,
        /// Download every artifact of the reply, into DIR or the configured download-dir
        #[arg(long, value_name = "DIR", num_args = 0..=1, default_missing_value = "")]
        save_artifacts: Option<String>,
        /// Open artifact N (numbered from 1) in a new window
        #[arg(long, value_name = "N")]
        open: Option<usize>,
    },
    /// Print how the N-th artifact of a file would be rendered
    Preview {
        file: PathBuf,
        /// Artifact number, counted from 1
        #[arg(long, default_value_t = 1)]
        index: usize,
        /// Show the source view instead of the preview
        #[arg(long)]
        raw: bool,
    },
    /// Show the current configuration
    Config,
    /// Set configuration values, or list them when no key is given
    Set {
        /// Configuration key to set
        key: Option<String>,
        /// Value to set for the key (can be multiple words)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Unset configuration values
    Unset {
        /// Configuration key to unset
        key: String,
    },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    logging::init(args.log_file.as_deref())?;
    tokio::runtime::Runtime::new()?.block_on(async_main(args))
}

async fn async_main(args: Args) -> Result<(), Box<dyn Error>> {
    let config_path = match args.config {
        Some(path) => path,
        None => Config::get_config_path()?,
    };
    let config = Config::load_from_path(&config_path)?;

    match args.command {
        Commands::Extract { file, scope } => {
            run_extract(file.as_deref(), &scope, &config, &mut std::io::stdout())
        }
        Commands::Say {
            prompt,
            model,
            persona,
            save_artifacts,
            open,
        } => {
            let save_artifacts = save_artifacts.map(|dir| resolve_download_dir(dir, &config));
            let opts = SayOptions {
                prompt,
                model,
                persona,
                save_artifacts,
                open,
            };
            if let Err(e) = run_say(opts, &config).await {
                eprintln!("\n❌ Error: {e}");
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Preview { file, index, raw } => {
            run_preview(&file, index, raw, &config, &mut std::io::stdout())
        }
        Commands::Config => {
            println!("Config file: {}", path_display(&config_path));
            config.print_all();
            Ok(())
        }
        Commands::Set { key, value } => {
            let registry = SettingRegistry::new();
            let Some(key) = key else {
                println!("Available settings:");
                for line in registry.format_all(&config) {
                    println!("{line}");
                }
                return Ok(());
            };
            report(handle_set(&registry, &key, &value, &config, &config_path))
        }
        Commands::Unset { key } => {
            let registry = SettingRegistry::new();
            report(handle_unset(&registry, &key, &config, &config_path))
        }
    }
}

/// An empty `--save-artifacts` value means the configured directory, or the
/// current one when none is set.
pub fn resolve_download_dir(dir: String, config: &Config) -> PathBuf {
    if !dir.is_empty() {
        return PathBuf::from(dir);
    }
    config
        .download_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn handle_set(
    registry: &SettingRegistry,
    key: &str,
    value: &[String],
    config: &Config,
    config_path: &Path,
) -> Result<String, SettingError> {
    let ctx = SetContext {
        config,
        config_path,
    };
    registry.set(key, value, &ctx)
}

pub fn handle_unset(
    registry: &SettingRegistry,
    key: &str,
    config: &Config,
    config_path: &Path,
) -> Result<String, SettingError> {
    let ctx = SetContext {
        config,
        config_path,
    };
    registry.unset(key, &ctx)
}

fn report(result: Result<String, SettingError>) -> Result<(), Box<dyn Error>> {
    match result {
        Ok(message) => {
            println!("{message}");
            Ok(())
        }
        Err(e) => {
            e.print();
            std::process::exit(e.exit_code());
        }
    }
}
