//! Command line entry point: prints the statistics of one DJ radio channel
//!
//! Run with: cargo run -p pmodjradio -- <radio id>

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};
use pmoconfig::{get_config, Config};
use pmodjradio::{ChannelReport, DjRadioClient, DjRadioConfigExt};
use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "pmodjradio", version, about = "Statistics of a NetEase Cloud Music DJ radio channel")]
struct Cli {
    /// Channel id (asked interactively when omitted)
    radio_id: Option<String>,

    /// Configuration directory (defaults to ./.pmodjradio or ~/.pmodjradio)
    #[arg(long)]
    config_dir: Option<String>,

    /// More logs on stderr (-v: debug, -vv: trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_logging(config: &Config, verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.get_djradio_log_level())),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn prompt_radio_id() -> Result<String> {
    print!("Radio id: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read radio id")?;
    Ok(line.trim().to_string())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = match &cli.config_dir {
        Some(dir) => Arc::new(Config::load_config(dir)?),
        None => get_config(),
    };
    init_logging(&config, cli.verbose);
    debug!(config_dir = %config.config_dir().display(), "Configuration loaded");

    let radio_id = match cli.radio_id {
        Some(id) => id.trim().to_string(),
        None => prompt_radio_id()?,
    };
    if radio_id.is_empty() {
        bail!("No radio id given");
    }

    let client = DjRadioClient::builder()
        .settings(config.djradio_fetch_settings())
        .build()
        .await?;

    let Some(channel) = client.fetch_channel(&radio_id).await? else {
        eprintln!("Channel {} not found", radio_id);
        return Ok(ExitCode::FAILURE);
    };

    let now = chrono::Local::now().naive_local();
    let report = ChannelReport::compute(&channel, now)?;
    println!("{}", report);

    Ok(ExitCode::SUCCESS)
}
