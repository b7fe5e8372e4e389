// Siteline - conversational website reporting

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use siteline::models::{AppConfig, SessionRecord, SettingsUpdate, ENV_API_KEY};
use siteline::services::operator::ConsoleOperator;
use siteline::services::pipeline::{PhaseOrchestrator, SessionOutcome};
use siteline::services::routing::{default_graph, default_tools, AgentRouter};
use siteline_llm::OpenAIProvider;
use siteline_tools::CsvTableSource;

#[derive(Parser)]
#[command(name = "siteline")]
#[command(about = "Conversational website reporting over CSV access data")]
#[command(version)]
struct Cli {
    /// Config file (default: ./siteline.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Site to report on
    #[arg(long)]
    site_id: Option<String>,

    /// Directory holding the CSV datasets
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Chat model name
    #[arg(long)]
    model: Option<String>,

    /// OpenAI-compatible endpoint
    #[arg(long)]
    base_url: Option<String>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_env(|key| std::env::var(key).ok());
    config.apply_update(SettingsUpdate {
        site_id: cli.site_id.clone(),
        data_dir: cli.data_dir.clone(),
        model: cli.model.clone(),
        base_url: cli.base_url.clone(),
    });
    config.validate()?;
    Ok(config)
}

async fn run(cli: Cli) -> Result<SessionOutcome> {
    let config = load_config(&cli)?;
    let api_key = std::env::var(ENV_API_KEY)
        .ok()
        .filter(|k| !k.trim().is_empty())
        .with_context(|| format!("{} is not set", ENV_API_KEY))?;

    let record = SessionRecord::new(config.site_id.as_str(), chrono::Local::now().date_naive());
    tracing::info!(
        "[Main] session {} model={} data_dir={}",
        record.session_id(),
        config.model,
        config.data_dir.display()
    );

    let source = Arc::new(
        CsvTableSource::new(config.data_dir.clone())
            .with_files(config.access_file.as_str(), config.service_file.as_str()),
    );
    let provider = Arc::new(OpenAIProvider::new(config.provider_config(api_key))?);
    let router = AgentRouter::new(
        provider,
        Arc::new(default_graph()?),
        Arc::new(default_tools(source)),
    )?
    .with_session(record.session_id(), config.data_dir.clone())
    .with_max_turns(config.max_routing_turns);

    let orchestrator = PhaseOrchestrator::new(Arc::new(router), Arc::new(ConsoleOperator::new()))
        .with_config(&config);
    Ok(orchestrator.run(record).await)
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("failed to initialise logging: {e}");
    }

    match run(cli).await {
        Ok(outcome) => {
            let summary = outcome.summary();
            for (phase, reason) in &summary.failed {
                tracing::warn!("[Main] {} did not complete: {}", phase, reason);
            }
            if outcome.is_aborted() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("siteline: {e:#}");
            ExitCode::FAILURE
        }
    }
}
