mod cli;
mod config;
mod domain;
mod error;
mod infra;
mod workflows;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use config::{PipelineConfig, SeriesConfig};
use infra::cache::{Cache, CachingSource};
use infra::omdb::OmdbClient;
use workflows::pipeline::{run_series, Summary};

fn main() {
    let cli = Cli::parse();
    init_logging();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config =
        config::load_config(cli.config.as_deref()).context("Failed to load series configuration")?;

    if cli.list {
        for series in &config.series {
            println!(
                "{}: {} seasons, {} -> {}",
                series.name,
                series.seasons,
                series.supplemental.display(),
                series.output.display()
            );
        }
        return Ok(());
    }

    let selected = select_series(&config, &cli.series)?;
    if selected.is_empty() {
        bail!("No series configured");
    }

    let client = OmdbClient::new(&config)?;
    let mut cache = cli.use_cache.then(Cache::load);

    for series in selected {
        println!("Fetching {} seasons of {}...", series.seasons, series.name);

        let summary = match cache.as_mut() {
            Some(cache) => run_series(series, &mut CachingSource::new(client.clone(), cache)),
            None => run_series(series, &mut client.clone()),
        }
        .with_context(|| format!("Failed to process {}", series.name))?;

        print_summary(&summary);
    }

    // Only reached when every series succeeded
    if let Some(cache) = &cache {
        if let Err(e) = cache.save() {
            eprintln!("Warning: Failed to save cache: {e}");
        }
    }

    Ok(())
}

fn select_series<'a>(config: &'a PipelineConfig, names: &[String]) -> Result<Vec<&'a SeriesConfig>> {
    if names.is_empty() {
        return Ok(config.series.iter().collect());
    }

    names
        .iter()
        .map(|name| match config.find_series(name) {
            Some(series) => Ok(series),
            None => bail!("Unknown series '{name}'. Use --list to see configured series"),
        })
        .collect()
}

fn print_summary(summary: &Summary) {
    println!(
        "{}: {} episodes, wrote {} rows to {}",
        summary.series,
        summary.episodes,
        summary.rows,
        summary.output.display()
    );
}
