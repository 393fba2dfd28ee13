//! Currencycloud CLI
//!
//! Quote and find currency rates from the command line.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use currencycloud_client::{ClientConfig, CurrencyCloud, HttpTransport, RecordedTransport};

mod commands;

/// Currencycloud rates CLI
#[derive(Parser, Debug)]
#[command(name = "currencycloud")]
#[command(about = "Look up Currencycloud conversion rates")]
struct Args {
    /// Answer from a recorded interactions file instead of the live API
    #[arg(long, conflicts_with = "record")]
    replay: Option<PathBuf>,

    /// Call the live API and write the interactions to this file.
    /// The login request, API key included, is part of the recording.
    #[arg(long)]
    record: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Get a detailed quote for a conversion
    Rate(commands::RateArgs),
    /// Find indicative rates for currency pairs
    Find(commands::FindArgs),
}

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
    );
    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so stdout stays pipeable JSON.
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.json_logs);

    let config = ClientConfig::from_env()?;
    let mut recorder = None;
    let mut builder = CurrencyCloud::builder(config.clone());
    if let Some(path) = &args.replay {
        info!(path = %path.display(), "Replaying recorded interactions");
        builder = builder.transport(Arc::new(RecordedTransport::from_file(path)?));
    } else if let Some(path) = &args.record {
        info!(path = %path.display(), "Recording interactions");
        let transport = Arc::new(RecordedTransport::recording(Arc::new(HttpTransport::new(&config)?)));
        builder = builder.transport(transport.clone());
        recorder = Some((transport, path));
    }
    let client = builder.build()?;

    client.login().await?;

    let output = match &args.command {
        Command::Rate(rate) => commands::rate(&client, rate).await,
        Command::Find(find) => commands::find(&client, find).await,
    };

    if let Err(e) = client.logout().await {
        error!(error = %e, "Failed to close session");
    }

    if let Some((transport, path)) = recorder {
        transport.save(path)?;
    }

    println!("{}", output?);
    Ok(())
}
