mod config;
mod normalize_cmd;
mod roadmap_cmd;
#[cfg(test)]
mod test_util;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use upcycle_core::model::GeminiConfig;

use config::UpcycleConfig;

#[derive(Parser)]
#[command(name = "upcycle", about = "Step-by-step roadmaps for upcycling projects")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write an upcycle config file
    Init {
        /// Gemini API key to store (falls back to GEMINI_API_KEY)
        #[arg(long)]
        api_key: Option<String>,
        /// Gemini model name
        #[arg(long)]
        model: Option<String>,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Generate a roadmap for a project photo
    Roadmap {
        /// Path to a JPEG or PNG photo of the starting item
        #[arg(long)]
        image: PathBuf,
        /// Project name
        #[arg(long)]
        name: String,
        /// What the item should become
        #[arg(long)]
        description: String,
        /// Output file path (defaults to stdout)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Gemini API key (overrides GEMINI_API_KEY and the config file)
        #[arg(long)]
        api_key: Option<String>,
    },
    /// Reconcile a saved model response into validated steps
    Normalize {
        /// File holding the raw response (defaults to stdin)
        file: Option<PathBuf>,
        /// Accept strict JSON only; skip quote and literal repair
        #[arg(long)]
        strict: bool,
    },
}

/// Execute the `upcycle init` command: write config file.
fn cmd_init(api_key: Option<String>, model: Option<String>, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let api_key = api_key.or_else(|| std::env::var(config::API_KEY_VAR).ok());

    let cfg = config::ConfigFile {
        gemini: config::GeminiSection {
            api_key: api_key.clone(),
            model: Some(model.unwrap_or_else(|| GeminiConfig::DEFAULT_MODEL.to_string())),
            ..config::GeminiSection::default()
        },
        ..config::ConfigFile::default()
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    match &api_key {
        Some(key) => println!("  gemini.api_key = {}", config::mask_secret(key)),
        None => println!("  gemini.api_key = (not set)"),
    }
    if let Some(model) = &cfg.gemini.model {
        println!("  gemini.model = {model}");
    }
    if api_key.is_none() {
        println!();
        println!("Next: add an API key with `upcycle init --force --api-key <KEY>` or set {}.", config::API_KEY_VAR);
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            api_key,
            model,
            force,
        } => {
            cmd_init(api_key, model, force)?;
        }
        Commands::Roadmap {
            image,
            name,
            description,
            output,
            api_key,
        } => {
            let resolved = UpcycleConfig::resolve(api_key.as_deref())?;
            roadmap_cmd::run_roadmap(&resolved, &image, &name, &description, output.as_deref())
                .await?;
        }
        Commands::Normalize { file, strict } => {
            normalize_cmd::run_normalize(file.as_deref(), strict)?;
        }
    }

    Ok(())
}
