//! CLI binary for running and validating Cadence pipelines.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use cadence_config::{Config, HandlerType};
use cadence_engine::DataPipe;

const CONFIG_FILE_PATH_ENV_VAR: &str = "CONFIG_FILE_PATH";
const DEFAULT_CONFIG_FILE_PATH: &str = "./config.yaml";

#[derive(Parser)]
#[command(name = "cadence", version, about = "Periodic data-processing pipeline runner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline on its configured schedule
    Run {
        /// Path to the YAML config (falls back to $CONFIG_FILE_PATH, then ./config.yaml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Parse and validate a config, then print the pipeline summary
    Validate {
        /// Path to the YAML config (falls back to $CONFIG_FILE_PATH, then ./config.yaml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config } => cmd_run(&resolve_config_path(config)).await,
        Commands::Validate { config } => cmd_validate(&resolve_config_path(config)),
    }
}

fn resolve_config_path(flag: Option<PathBuf>) -> PathBuf {
    if let Some(path) = flag {
        return path;
    }
    match std::env::var(CONFIG_FILE_PATH_ENV_VAR) {
        Ok(path) if !path.is_empty() => PathBuf::from(path),
        _ => PathBuf::from(DEFAULT_CONFIG_FILE_PATH),
    }
}

fn load_config(path: &Path) -> anyhow::Result<Config> {
    let cfg = Config::from_yaml_file(path)?;
    cfg.validate()?;
    Ok(cfg)
}

async fn cmd_run(path: &Path) -> anyhow::Result<()> {
    let cfg = load_config(path)?;

    tracing_subscriber::fmt()
        .with_max_level(cfg.engine.log.level.to_filter())
        .init();

    let pipe = DataPipe::new(&cfg)?;

    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        tracing::info!("shutting down");
        token.cancel();
    });

    tracing::info!(
        config = %path.display(),
        handlers = cfg.handlers.len(),
        static_fields = ?cfg.engine.log.static_fields,
        "starting data pipe"
    );
    pipe.run(cancel).await;
    Ok(())
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut terminate = match signal(SignalKind::terminate()) {
            Ok(terminate) => terminate,
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = terminate.recv() => {}
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn cmd_validate(path: &Path) -> anyhow::Result<()> {
    let cfg = load_config(path)?;

    println!("Config is valid: {}", path.display());
    println!("Interval: {:?}", cfg.engine.interval);
    if let Some(run_at) = &cfg.engine.run_at {
        println!("Run at: {run_at} (local time, 24h repeat)");
    }

    println!("\nPipeline ({} handlers):", cfg.handlers.len());
    for entry in &cfg.handlers {
        match entry.handler.kind {
            HandlerType::Http => println!(
                "  {} [http] {} {}",
                entry.name, entry.handler.http.method, entry.handler.http.url
            ),
            HandlerType::Filter => println!(
                "  {} [filter] {}",
                entry.name, entry.handler.filter.expression
            ),
        }
    }

    Ok(())
}
