//! soc-mazda - publish a Mazda EV's state of charge to the openWB ramdisk
//!
//! Usage: `soc-mazda <chargepoint> <email> <password> <region> <vin> [log-level]`

mod config;
mod logging;
mod poll;
mod publisher;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use mazda_client::{ClientConfig, MazdaClient, Region};
use tracing::{info, warn};

use crate::config::Config;

/// Mazda state-of-charge module for openWB
#[derive(Parser, Debug)]
#[command(name = "soc-mazda")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Charge point number (1 writes `soc`, any other `soc1`)
    chargepoint: u32,

    /// Mazda connected-services account email
    email: String,

    /// Account password
    password: String,

    /// Account region: MNAO, MME or MJO
    region: Region,

    /// VIN of the vehicle to read
    vin: String,

    /// DEBUG, INFO, WARNING, ERROR or CRITICAL
    log_level: Option<String>,

    /// Configuration file path
    #[arg(short, long, env = "SOC_MAZDA_CONFIG")]
    config: Option<PathBuf>,

    /// Directory for the SoC and log files
    #[arg(long, env = "SOC_MAZDA_RAMDISK")]
    ramdisk: Option<PathBuf>,

    /// Override the region's API base URL
    #[arg(long)]
    base_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let file_config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load().unwrap_or_default(),
    };
    let settings = file_config.merge_with_args(cli.ramdisk.as_deref(), cli.base_url.as_deref());

    let log_path = logging::log_file_path(&settings.ramdisk_dir, cli.chargepoint);
    logging::init(&log_path, logging::level_from_name(cli.log_level.as_deref()))?;

    let mut builder = ClientConfig::builder(&cli.email, &cli.password, cli.region)
        .use_cached_vehicle_list(true);
    if let Some(url) = &settings.base_url {
        builder = builder.base_url(url);
    }
    let client_config = builder.build().context("Invalid account configuration")?;

    let mut client = MazdaClient::new(client_config).context("Failed to create Mazda client")?;
    info!("Client created for region {}", cli.region);

    let result = poll::fetch_soc(&mut client, &cli.vin).await;

    if let Err(e) = client.close().await {
        warn!("Failed to close session: {}", e);
    }

    if let Some(soc) = result? {
        let path = publisher::publish(&settings.ramdisk_dir, cli.chargepoint, soc)?;
        info!("Wrote {} to {}", publisher::format_soc(soc), path.display());
    }

    Ok(())
}
