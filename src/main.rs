use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;
use tracing::{error, info};

use filingscope::config::Config;
use filingscope::{FilingError, FilingService};

mod cli;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Set default log level to INFO if not specified
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "filingscope=info");
    }

    // Log to stderr so stdout carries only JSON
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let file_appender = tracing_appender::rolling::never(".", "filingscope.log");

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(EnvFilter::from_default_env()),
        )
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_filter(EnvFilter::from_default_env()),
        )
        .init();

    let cli = Cli::parse();

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    let service = FilingService::new(config).context("Failed to build HTTP client")?;

    match run(&service, &cli.command).await {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Err(e) => {
            error!("Command failed: {}", e);
            println!("{}", serde_json::to_string_pretty(&e.to_payload())?);
            std::process::exit(1);
        }
    }

    Ok(())
}

async fn run(service: &FilingService, command: &Commands) -> Result<Value, FilingError> {
    match command {
        Commands::Resolve { query } => {
            info!("Resolving '{}'", query);
            let resolution = service.resolve(query).await?;
            Ok(serde_json::to_value(resolution)?)
        }

        Commands::Filings {
            identifier,
            filters,
            enrich,
        } => {
            let registry_id = service.resolve_exact(identifier).await?;
            info!("Listing filings for {} ({})", identifier, registry_id);

            let page = service
                .list_filings(&registry_id, &filters.filter(), filters.page_request(), *enrich)
                .await?;
            Ok(serde_json::to_value(page)?)
        }

        Commands::Person {
            identifier,
            name,
            filters,
        } => {
            let registry_id = service.resolve_exact(identifier).await?;
            info!("Searching filings of {} ({}) for '{}'", identifier, registry_id, name);

            let page = service
                .search_by_person(&registry_id, name, &filters.filter(), filters.page_request())
                .await?;
            Ok(serde_json::to_value(page)?)
        }
    }
}
