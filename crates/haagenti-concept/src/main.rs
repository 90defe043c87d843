//! Haagenti concept prompt tool
//!
//! ## Usage
//!
//! ```bash
//! # Resolve a prompts file and print every setting with defaults filled in
//! haagenti-concept validate prompts.yaml
//!
//! # List the distinct prompt texts an encoder has to embed
//! haagenti-concept prompts prompts.yaml
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use haagenti_concept::{distinct_prompts, load_prompts_from_file};

#[derive(Parser, Debug)]
#[command(name = "haagenti-concept")]
#[command(author = "Daemoniorum LLC")]
#[command(version)]
#[command(about = "Resolve concept erase/enhance prompt files", long_about = None)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a prompts file and print the settings as JSON
    Validate {
        /// Prompts file (.yaml, .yml or .json)
        path: PathBuf,
    },
    /// Print each distinct prompt text, one per line
    Prompts {
        /// Prompts file (.yaml, .yml or .json)
        path: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match args.command {
        Command::Validate { path } => {
            let settings = load_prompts_from_file(&path)?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
            info!("{} is valid", path.display());
        }
        Command::Prompts { path } => {
            let settings = load_prompts_from_file(&path)?;
            for prompt in distinct_prompts(&settings) {
                println!("{:?}", prompt);
            }
        }
    }

    Ok(())
}
