use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use melframe::cli::{Cli, Command, CopyArgs, FeatureArgs, FilterArgs, InputArgs, ShowArgs};
use melframe::config::StreamConfig;
use melframe::tools::{self, features, filter, inspect, mean, show};
use melframe::transform::{BasisCache, FeatureExtractor};
use melframe::SeekableReader;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = StreamConfig::from_override(cli.config.as_deref())
        .context("Failed to load configuration")?;
    debug!(?config, "configuration");

    match cli.command {
        Command::Inspect(args) => handle_inspect(&config, &args),
        Command::Filter(args) => handle_filter(&config, &args),
        Command::Mean(args) => handle_mean(&config, &args),
        Command::Features(args) => handle_features(&config, &args),
        Command::Show(args) => handle_show(&config, &args),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn handle_inspect(config: &StreamConfig, args: &InputArgs) -> Result<()> {
    let reader = tools::open_reader(&args.input, config.codec())?;
    let summary = inspect::summarize(reader)
        .with_context(|| format!("Failed to inspect {:?}", args.input))?;
    print!("{}", summary);
    Ok(())
}

fn handle_filter(config: &StreamConfig, args: &FilterArgs) -> Result<()> {
    let group_filter = filter::GroupFilter::new(&args.source, &args.label)?;
    let mut reader = tools::open_reader(&args.streams.input.input, config.codec())?;
    let mut writer = tools::open_writer(&args.streams.output, config.codec())?;
    let stats = filter::filter_groups(&mut reader, &mut writer, &group_filter)?;
    info!(
        kept = stats.groups_kept,
        dropped = stats.groups_dropped,
        frames = stats.frames_kept,
        "filtered groups"
    );
    Ok(())
}

fn handle_mean(config: &StreamConfig, args: &CopyArgs) -> Result<()> {
    let mut reader = tools::open_reader(&args.input.input, config.codec())?;
    let mut writer = tools::open_writer(&args.output, config.codec())?;
    let labels = mean::mean_by_label(&mut reader, &mut writer)?;
    info!(labels, "wrote mean frames");
    Ok(())
}

fn handle_features(config: &StreamConfig, args: &FeatureArgs) -> Result<()> {
    let extractor = FeatureExtractor::for_mode(
        &args.mode,
        Arc::new(BasisCache::new()),
        config.projection()?,
    )
    .context("Failed to set up feature extraction")?;
    let mut reader = tools::open_reader(&args.input.input, config.codec())?;
    let mut out = tools::open_output(&args.output)?;
    features::write_features(&mut reader, &extractor, args.skip_silent, &mut out)?;
    Ok(())
}

fn handle_show(config: &StreamConfig, args: &ShowArgs) -> Result<()> {
    let reader = tools::open_reader(&args.input.input, config.codec())?;
    debug!(
        seekable = reader.is_seekable(),
        "navigating through in-memory frame history"
    );
    let mut frames = SeekableReader::new(reader);
    let stdout = std::io::stdout();
    show::show_neighbourhood(&mut frames, args.frame, args.context, &mut stdout.lock())?;
    Ok(())
}
