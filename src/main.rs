use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

use price_bridge::browser::ChromeLauncher;
use price_bridge::models::PriceResponse;
use price_bridge::site::TrioSite;
use price_bridge::web::{self, AppState};
use price_bridge::{AppConfig, MatchExtractor, PageFetcher, PriceLookup, SessionManager};

#[derive(Debug, Parser)]
#[command(name = "price-bridge", version, about = "Vendor price lookup over a headless browser session")]
struct Cli {
    /// Extra configuration file layered over config/default and config/local.
    #[arg(short, long, env = "PRICE_BRIDGE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sign in and serve POST /get_prices (default).
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
        /// Exit instead of serving when the vendor login fails.
        #[arg(long)]
        require_session: bool,
    },
    /// Sign in, look up the given queries once and print the results as JSON.
    Lookup {
        #[arg(required = true)]
        queries: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("price_bridge=debug".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let mut config =
        AppConfig::from_env(cli.config.as_deref()).context("Failed to load configuration")?;

    if !config.has_credentials() {
        warn!("FORNECEDOR_USER / FORNECEDOR_PASS not set; vendor login will fail");
    }

    let site = Arc::new(TrioSite::new());
    let session = Arc::new(SessionManager::new(
        Arc::new(ChromeLauncher),
        site.clone(),
        config.vendor.clone(),
        config.browser.clone(),
    ));
    let lookup = Arc::new(PriceLookup::new(
        session.clone(),
        MatchExtractor::new(site, config.matching.confidence_threshold),
        config.vendor.search_page_url.clone(),
    ));

    info!("Starting price bridge...");
    let operational = session.ensure_session().await;
    if !operational {
        error!("Scraper not operational; lookups will report errors until restart");
    }

    match cli.command.unwrap_or(Command::Serve {
        host: None,
        port: None,
        require_session: false,
    }) {
        Command::Serve {
            host,
            port,
            require_session,
        } => {
            if require_session && !operational {
                anyhow::bail!("vendor login failed, refusing to serve");
            }
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            web::serve(&config.server, AppState::new(lookup)).await?;
        }
        Command::Lookup { queries } => {
            let mut results = Vec::with_capacity(queries.len());
            for query in &queries {
                results.push(lookup.lookup(query).await);
            }
            println!("{}", serde_json::to_string_pretty(&PriceResponse { results })?);
        }
    }

    Ok(())
}
