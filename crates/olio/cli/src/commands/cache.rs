//! Bootstrap cache inspection commands

use std::path::Path;
use std::sync::Arc;

use clap::Subcommand;
use olio_session::{BootstrapCache, FileKeyValueStore, HydrationConfig};

use crate::error::CliResult;
use crate::output::{print_info, print_json, print_success};

/// Cache subcommands
#[derive(Debug, Subcommand)]
pub enum CacheCommands {
    /// Print the persisted bootstrap record
    Show {
        /// Directory holding the cache files
        #[arg(long)]
        cache_dir: std::path::PathBuf,
    },

    /// Remove the persisted bootstrap record
    Clear {
        /// Directory holding the cache files
        #[arg(long)]
        cache_dir: std::path::PathBuf,
    },
}

/// Execute a cache command
pub fn execute(command: CacheCommands, config: &HydrationConfig) -> CliResult<()> {
    match command {
        CacheCommands::Show { cache_dir } => {
            let record = open(&cache_dir, config)?.try_read()?;
            if record.is_empty() {
                print_info("No bootstrap record");
                Ok(())
            } else {
                print_json(&record)
            }
        }
        CacheCommands::Clear { cache_dir } => {
            let cache = open(&cache_dir, config)?;
            cache.try_clear()?;
            print_success(&format!("Cleared bootstrap record '{}'", cache.key()));
            Ok(())
        }
    }
}

fn open(dir: &Path, config: &HydrationConfig) -> CliResult<BootstrapCache> {
    let store = FileKeyValueStore::open(dir)?;
    Ok(BootstrapCache::new(Arc::new(store), config.cache_key.clone()))
}
