//! Log setup: one log file per charge point inside the ramdisk

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Map an openWB log level name to a filter; unknown names log everything
pub fn level_from_name(name: Option<&str>) -> LevelFilter {
    match name.map(str::to_ascii_uppercase).as_deref() {
        Some("INFO") => LevelFilter::INFO,
        Some("WARNING") => LevelFilter::WARN,
        Some("ERROR") | Some("CRITICAL") => LevelFilter::ERROR,
        _ => LevelFilter::DEBUG,
    }
}

/// `<ramdisk>/mazdareply<chargepoint>`
pub fn log_file_path(ramdisk_dir: &Path, chargepoint: u32) -> PathBuf {
    ramdisk_dir.join(format!("mazdareply{}", chargepoint))
}

/// Append logs to `path`; `RUST_LOG` overrides `level`
pub fn init(path: &Path, level: LevelFilter) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))?;

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(false),
        )
        .with(filter)
        .init();

    Ok(())
}
