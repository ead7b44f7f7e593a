//! `site-inspector` entry point
//!
//! Analyses one domain and prints the report as JSON on stdout. Logs go to
//! stderr so the output can be piped straight into other tools.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use site_inspector_core::{Collaborators, Inspector, InspectorConfig};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Parser, Debug)]
#[command(name = "site-inspector")]
#[command(version)]
#[command(about = "Identify the CDN, hosting backend and CMS behind a domain", long_about = None)]
struct Cli {
    /// Domain to analyse, e.g. www.health.gov.au
    domain: String,

    /// JSON configuration file (defaults plus environment overrides when omitted)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Pretty-print the report
    #[arg(long)]
    pretty: bool,

    /// Only run the named plugin; repeat for several
    #[arg(long = "plugin", value_name = "NAME")]
    plugins: Vec<String>,
}

impl Cli {
    fn load_config(&self) -> anyhow::Result<InspectorConfig> {
        match &self.config {
            Some(path) => InspectorConfig::load(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display())),
            None => Ok(InspectorConfig::from_env()),
        }
    }
}

async fn run(cli: &Cli) -> anyhow::Result<String> {
    let config = cli.load_config()?;
    let collaborators =
        Collaborators::from_config(&config).context("Failed to set up network clients")?;
    let inspector = Inspector::build(config, collaborators)
        .await
        .context("Failed to start the inspector")?;

    let report = if cli.plugins.is_empty() {
        inspector.analyse(&cli.domain).await?
    } else {
        inspector.analyse_only(&cli.domain, &cli.plugins).await?
    };

    let json = if cli.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    Ok(json)
}

/// `RUST_LOG` when it is set and valid, otherwise `info`.
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .without_time()
                .with_ansi(false),
        )
        .with(log_filter(
            std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref(),
        ))
        .init();

    tracing::info!("Inspecting {}", cli.domain);

    match run(&cli).await {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("site-inspector: {e:#}");
            ExitCode::FAILURE
        }
    }
}
