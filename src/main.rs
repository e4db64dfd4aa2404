use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

mod cli;

use cli::Cli;
use cli::commands::Commands;
use medagent::agent::RoutingAgent;
use medagent::config::{self, Config};
use medagent::db::DbRegistry;
use medagent::llm::{GroqClient, GroqConfig};
use medagent::loader;
use medagent::repl;
use medagent::search::{TavilyClient, TavilyConfig};
use medagent::tools::AgentToolRouter;

fn setup_logging() -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("medagent")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("medagent.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        Some(Commands::Load) => run_load(config),
        None | Some(Commands::Chat) => run_chat(config).await,
    }
}

fn run_load(config: &Config) -> Result<()> {
    println!("{}", "Building databases...".cyan());

    let mut failures = 0;
    for (spec, outcome) in loader::load_all(&config.data.data_dir, &config.data.db_dir) {
        match outcome {
            Ok(report) => println!(
                "{} {} ({} rows into {}::{})",
                "Loaded:".green(),
                spec.csv_file,
                report.rows,
                spec.db_file,
                report.table
            ),
            Err(e) => {
                failures += 1;
                println!("{} {}: {}", "Failed:".red(), spec.csv_file, e);
            }
        }
    }

    if failures > 0 {
        eyre::bail!("{} dataset(s) failed to load", failures);
    }

    println!(
        "{} {}",
        "All databases ready in".green(),
        config.data.db_dir.display()
    );
    Ok(())
}

async fn run_chat(config: &Config) -> Result<()> {
    // Credentials are checked before any tool or client is constructed
    let groq_key = config::require_env("GROQ_API_KEY")?;
    let tavily_key = config::require_env("TAVILY_API_KEY")?;

    let registry = DbRegistry::open(&config.data.db_dir).context("Failed to open databases")?;

    let llm = GroqClient::with_api_key(
        groq_key,
        GroqConfig {
            model: config.llm.model.clone(),
            max_tokens: config.llm.max_tokens,
            temperature: config.llm.temperature,
            timeout: Duration::from_millis(config.llm.timeout_ms),
        },
    )?;
    let search = TavilyClient::with_api_key(
        tavily_key,
        TavilyConfig {
            max_results: config.search.max_results,
            timeout: Duration::from_millis(config.search.timeout_ms),
        },
    )?;
    let router = AgentToolRouter::new(&registry, search).context("Failed to build tool router")?;
    let agent = RoutingAgent::new(Arc::new(llm), Arc::new(router), config.agent.max_steps);

    info!("Agent ready with model {}", config.llm.model);
    repl::run(&agent).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup logging first
    setup_logging().context("Failed to setup logging")?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    info!("Starting with config from: {:?}", cli.config);

    run_application(&cli, &config).await.context("Application failed")?;

    Ok(())
}
