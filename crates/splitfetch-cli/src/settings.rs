use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use splitfetch::Config;

use crate::cli::Args;

/// Config file first, then command-line overrides.
pub fn load(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => from_file(path)?,
        None => Config::default(),
    };

    if let Some(threads) = args.threads {
        config.thread_count = threads;
    }
    if let Some(buffer) = args.buffer {
        config.buffer_size = buffer;
    }
    match args.parallel {
        Some(parallel) => config.parallel = parallel,
        // a lowered thread count drags the default parallelism with it
        None => config.parallel = config.parallel.min(config.thread_count.max(1)),
    }

    config.validate().context("invalid download configuration")?;
    Ok(config)
}

fn from_file(path: &Path) -> Result<Config> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("failed to parse config file {}", path.display()))
}
