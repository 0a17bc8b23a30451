use directories::ProjectDirs;
use log::LevelFilter;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use crate::{ConfigError::InvalidValue, Result};

const LOG_FILE: &str = "headroom.log";

/// Initialize the logger with file and console output
///
/// Console output goes to stderr so stdout only carries the report.
///
/// # Arguments
///
/// * `verbose` - Enable debug level logging
/// * `quiet` - Suppress console output (logs still written to file)
///
/// # Platform-specific log locations
///
/// * **macOS**: `~/Library/Application Support/io.kube-headroom.kube-headroom/headroom.log`
/// * **Linux**: `~/.local/share/kube-headroom/headroom.log`
/// * **Windows**: `C:\Users\<User>\AppData\Local\kube-headroom\kube-headroom\data\headroom.log`
///
pub fn init_logger(verbose: bool, quiet: bool) -> Result<()> {
    let log_level = level(verbose);
    let log_path = log_path()?;

    // Open log file for writing
    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .map_err(|e| InvalidValue(format!("Failed to open log file: {}", e)))?;

    // Build logger
    let mut builder = env_logger::Builder::new();
    builder.filter_level(log_level).format_timestamp_secs();

    if quiet {
        // Only write to file when quiet
        builder.target(env_logger::Target::Pipe(Box::new(log_file)));
    } else {
        let multi_writer = MultiWriter {
            stderr: std::io::stderr(),
            file: log_file,
        };
        builder.target(env_logger::Target::Pipe(Box::new(multi_writer)));
    }

    builder.init();

    if !quiet {
        log::info!("Logging to: {}", log_path.display());
    }

    Ok(())
}

fn level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

fn log_path() -> Result<PathBuf> {
    if let Some(proj_dirs) = ProjectDirs::from("io", "kube-headroom", "kube-headroom") {
        let log_dir = proj_dirs.data_local_dir();
        fs::create_dir_all(log_dir)
            .map_err(|e| InvalidValue(format!("Failed to create log directory: {}", e)))?;
        Ok(log_dir.join(LOG_FILE))
    } else {
        // Fallback to current directory if ProjectDirs fails
        Ok(std::env::current_dir()
            .map_err(|e| InvalidValue(format!("Failed to get current directory: {}", e)))?
            .join(LOG_FILE))
    }
}

/// Write to both stderr and the log file
struct MultiWriter {
    stderr: std::io::Stderr,
    file: fs::File,
}

impl Write for MultiWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.stderr.write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.stderr.flush()?;
        self.file.flush()?;
        Ok(())
    }
}
