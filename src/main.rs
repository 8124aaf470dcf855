use std::fs::{self, OpenOptions};
use std::path::PathBuf;

use anyhow::{Context, Result};
use aut_runner::{script, spec_url, util, RunScript, RuntimeConfig, SpecDescriptor};
use clap::{Parser, Subcommand};

/// Drive the application-under-test surface headlessly
#[derive(Parser)]
#[command(name = "aut-runner")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Data directory (defaults to ~/.aut-runner)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the URL a spec is served under
    SpecUrl {
        /// Absolute spec path; empty prints an empty line
        absolute: String,

        #[arg(long, default_value = "__cypress")]
        namespace: String,

        #[arg(long, default_value = "")]
        prefix: String,
    },

    /// Replay a JSONL run script and print a JSON summary
    Replay {
        script: PathBuf,

        /// Config file (defaults to <data-dir>/config.toml)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn init_logging() -> Result<()> {
    // Log to file (<data-dir>/logs/aut-runner.log); stdout carries the output
    fs::create_dir_all(util::logs_dir())?;

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(util::log_file_path())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .init();
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    util::init_data_dir(cli.data_dir);
    init_logging().context("Failed to initialize logging")?;

    match cli.command {
        Commands::SpecUrl {
            absolute,
            namespace,
            prefix,
        } => {
            let spec = (!absolute.is_empty()).then(|| SpecDescriptor::new(absolute));
            println!("{}", spec_url(&namespace, spec.as_ref(), &prefix));
        }
        Commands::Replay {
            script: path,
            config,
        } => {
            let config = match config {
                Some(config_path) => RuntimeConfig::load_from_path(&config_path)
                    .with_context(|| format!("Failed to load config {}", config_path.display()))?,
                None => RuntimeConfig::load(),
            };
            let run_script = RunScript::read_jsonl_from_path(&path)
                .with_context(|| format!("Failed to read script {}", path.display()))?;
            tracing::info!(
                script = %path.display(),
                steps = run_script.steps.len(),
                "Replaying run script"
            );

            let summary = script::replay(run_script, config).await;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}
