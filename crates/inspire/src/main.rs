use anyhow::Context;
use clap::Parser;
use inspire::catalog::RegionCatalog;
use inspire::config::ScraperConfig;
use inspire::job::JobController;
use inspire::portal::InspireClient;
use inspire::server;
use inspire::types::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "inspire", version, about = "INSPIRE awards school contact scraper")]
struct Args {
    /// JSON config file; missing keys use the defaults
    #[arg(long, env = "INSPIRE_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, env = "INSPIRE_HOST", default_value = "0.0.0.0")]
    host: String,

    #[arg(long, env = "INSPIRE_PORT", default_value_t = 5000)]
    port: u16,

    /// Overrides `output_dir` from the config file
    #[arg(long, env = "INSPIRE_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ScraperConfig::load_from_file(path)?,
        None => ScraperConfig::default(),
    };
    if let Some(output_dir) = args.output_dir {
        config.output_dir = output_dir;
    }

    std::fs::create_dir_all(&config.output_dir).with_context(|| {
        format!(
            "Failed to create output directory {}",
            config.output_dir.display()
        )
    })?;

    let file_appender = tracing_appender::rolling::never(&config.output_dir, "scraper.log");
    let (file_writer, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inspire=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .init();

    let catalog = RegionCatalog::new();
    if let Some(path) = &config.catalog_file {
        if let Err(e) = catalog.load_districts_file(path) {
            warn!(path = %path.display(), error = %e, "Ignoring district catalog file");
        }
    }

    let portal = Arc::new(InspireClient::new(&config));
    let controller = JobController::new(portal, Arc::new(catalog), &config);

    info!(
        base_url = %config.base_url,
        output_dir = %config.output_dir.display(),
        log_file = %config.log_file().display(),
        "Starting INSPIRE scraper"
    );

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", args.host, args.port))?;
    let state = Arc::new(AppState::new(config, controller));

    server::serve(state, addr).await?;
    Ok(())
}
