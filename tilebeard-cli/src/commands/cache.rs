//! Cache management CLI commands.

use std::path::PathBuf;

use clap::Subcommand;
use tilebeard::{clear_disk_cache, disk_cache_stats};

use crate::error::CliError;

/// Cache action subcommands.
#[derive(Debug, Subcommand)]
pub enum CacheAction {
    /// Show disk cache statistics
    Stats {
        /// Cache directory
        dir: PathBuf,
    },
    /// Clear the disk cache, removing all cached tiles
    Clear {
        /// Cache directory
        dir: PathBuf,
    },
}

/// Run a cache subcommand.
pub fn run(action: CacheAction) -> Result<(), CliError> {
    match action {
        CacheAction::Stats { dir } => {
            println!("Disk cache: {}", dir.display());
            match disk_cache_stats(&dir) {
                Ok((files, bytes)) => {
                    println!("  Files: {}", files);
                    println!("  Size:  {}", format_size(bytes));
                    Ok(())
                }
                Err(e) => Err(CliError::CacheStats(e.to_string())),
            }
        }
        CacheAction::Clear { dir } => {
            println!("Clearing disk cache at: {}", dir.display());
            match clear_disk_cache(&dir) {
                Ok(result) => {
                    println!(
                        "Deleted {} files, freed {}",
                        result.files_deleted,
                        format_size(result.bytes_freed)
                    );
                    Ok(())
                }
                Err(e) => Err(CliError::CacheClear(e.to_string())),
            }
        }
    }
}

/// Human-readable byte size.
fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}
