use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tempo_client::{ExecutionRef, FileProvider, HttpProvider, MockProvider, WorkflowProvider};
use tempo_tui::config::{self, Config};
use tempo_tui::{RunOptions, logging};

#[derive(Parser)]
#[command(name = "tempo", about = "Terminal console for Temporal workflow histories")]
struct Cli {
    /// Config profile to use
    #[arg(long)]
    profile: Option<String>,

    /// Temporal HTTP API address, overrides the profile
    #[arg(long)]
    address: Option<String>,

    /// Namespace, overrides the profile
    #[arg(long)]
    namespace: Option<String>,

    /// Browse exported history JSON (a file or a directory of files)
    #[arg(long, conflicts_with = "mock")]
    file: Option<PathBuf>,

    /// Use built-in demo workflows instead of a server
    #[arg(long)]
    mock: bool,

    /// Open this workflow's history on start
    #[arg(long)]
    workflow: Option<String>,

    /// Run id of --workflow; latest run when omitted
    #[arg(long, requires = "workflow")]
    run: Option<String>,

    /// Config file path
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the default config file and exit
    #[arg(long)]
    init_config: bool,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let config_path = match cli.config {
        Some(path) => path,
        None => config::config_path().context("failed to locate config file")?,
    };

    if cli.init_config {
        if config_path.exists() {
            anyhow::bail!("{} already exists", config_path.display());
        }
        config::save(&config_path, &Config::default())?;
        println!("Wrote {}", config_path.display());
        return Ok(());
    }

    let cfg = config::load(&config_path)?;
    let mut profile = cfg.profile(cli.profile.as_deref())?;
    if let Some(address) = cli.address {
        profile.address = address;
    }
    if let Some(namespace) = cli.namespace {
        profile.namespace = namespace;
    }

    let log_dir = config::log_dir().context("failed to locate log directory")?;
    let log_path = logging::init(&log_dir)?;
    tracing::info!(config = %config_path.display(), log = %log_path.display(), "starting tempo");

    let provider: Arc<dyn WorkflowProvider> = if cli.mock {
        Arc::new(MockProvider::new())
    } else if let Some(path) = cli.file {
        if !path.exists() {
            anyhow::bail!("{} does not exist", path.display());
        }
        Arc::new(FileProvider::new(path))
    } else {
        let mut http = HttpProvider::new(&profile.address, cfg.timeouts.history())
            .with_context(|| format!("failed to create client for {}", profile.address))?;
        if let Some(key) = profile.api_key.clone() {
            http.set_api_key(key);
        }
        Arc::new(http)
    };

    tempo_tui::run(RunOptions {
        provider,
        profile,
        ui: cfg.ui,
        timeouts: cfg.timeouts,
        open: cli.workflow.map(|id| ExecutionRef::new(id, cli.run)),
    })
}
