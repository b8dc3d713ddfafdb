use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "episode-ratings")]
#[command(about = "Fetch per-episode ratings from OMDb and merge them with a local episode table")]
pub struct Cli {
    /// Series to process, as named in the configuration (default: all)
    pub series: Vec<String>,

    /// Series configuration file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Reuse and store season responses in the local cache
    #[arg(long)]
    pub use_cache: bool,

    /// List configured series and exit
    #[arg(long)]
    pub list: bool,
}
