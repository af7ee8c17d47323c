use std::path::PathBuf;

use clap::Parser;

#[derive(Clone, Debug, Parser)]
#[command(name = "splitfetch", version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
/// Download a file over HTTP in concurrent byte-range chunks.
pub struct Args {
    /// Absolute URL of the resource.
    pub url: String,

    /// Target file or existing directory. Defaults to the current directory.
    #[arg(short, long, value_name = "PATH", default_value = ".")]
    pub output: PathBuf,

    /// Number of chunks to split the resource into.
    #[arg(short = 't', long = "threads", value_name = "N")]
    pub threads: Option<u32>,

    /// Maximum chunks fetched at once.
    #[arg(short, long, value_name = "N")]
    pub parallel: Option<u32>,

    /// Bytes per chunk-store write.
    #[arg(short, long = "buffer", value_name = "BYTES")]
    pub buffer: Option<usize>,

    /// TOML file with `thread_count`, `parallel` and `buffer_size`.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Extra runs for failed chunks, with exponential backoff.
    #[arg(long, value_name = "N", default_value_t = 3)]
    pub retries: u32,

    /// Log at debug level.
    #[arg(short, long)]
    pub verbose: bool,
}
