use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "melframe",
    version,
    about = "Inspect, filter and transform binary speech feature streams"
)]
pub struct Cli {
    /// Optional JSON file with stream and transform settings.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
    /// Log debug detail to stderr (RUST_LOG takes precedence).
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Summarize profiles and per-label frame counts.
    Inspect(InputArgs),
    /// Keep only groups whose source and label match.
    Filter(FilterArgs),
    /// Average each label's frames into a single frame.
    Mean(CopyArgs),
    /// Write one JSON feature vector per frame.
    Features(FeatureArgs),
    /// Print the frames around a frame index.
    Show(ShowArgs),
}

#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Input stream path, or `-` for stdin.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct CopyArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Output stream path, or `-` for stdout.
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct FilterArgs {
    /// Pattern matched against the start of each group's source.
    #[arg(long, default_value = ".*")]
    pub source: String,
    /// Pattern matched against the start of each group's label.
    #[arg(long, default_value = ".*")]
    pub label: String,
    #[command(flatten)]
    pub streams: CopyArgs,
}

#[derive(Args, Debug, Clone)]
pub struct FeatureArgs {
    /// Feature mode: bands, mels, dcts, wvls or pca.
    #[arg(long)]
    pub mode: String,
    /// Drop frames that sit near the silence threshold.
    #[arg(long)]
    pub skip_silent: bool,
    /// Where to write JSON lines, `-` for stdout.
    #[arg(long, short, default_value = "-")]
    pub output: PathBuf,
    #[command(flatten)]
    pub input: InputArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ShowArgs {
    /// Zero-based index of the frame to centre on.
    #[arg(long, default_value_t = 0)]
    pub frame: usize,
    /// Frames to print on each side.
    #[arg(long, default_value_t = 3)]
    pub context: usize,
    #[command(flatten)]
    pub input: InputArgs,
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use clap::Parser;
    use std::path::Path;

    #[test]
    fn parses_filter_with_defaults() {
        let cli = Cli::try_parse_from(["melframe", "filter", "in.mfcc", "out.mfcc"]).unwrap();
        let Command::Filter(args) = cli.command else {
            panic!("expected filter command");
        };
        assert_eq!(args.source, ".*");
        assert_eq!(args.label, ".*");
        assert_eq!(args.streams.input.input, Path::new("in.mfcc"));
        assert_eq!(args.streams.output, Path::new("out.mfcc"));
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = Cli::try_parse_from([
            "melframe",
            "features",
            "--mode",
            "dcts",
            "-",
            "--config",
            "cfg.json",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config.as_deref(), Some(Path::new("cfg.json")));
        let Command::Features(args) = cli.command else {
            panic!("expected features command");
        };
        assert_eq!(args.mode, "dcts");
        assert_eq!(args.output, Path::new("-"));
        assert!(!args.skip_silent);
    }

    #[test]
    fn features_requires_mode() {
        assert!(Cli::try_parse_from(["melframe", "features", "in.mfcc"]).is_err());
    }

    #[test]
    fn show_defaults_to_start() {
        let cli = Cli::try_parse_from(["melframe", "show", "in.mfcc"]).unwrap();
        let Command::Show(args) = cli.command else {
            panic!("expected show command");
        };
        assert_eq!((args.frame, args.context), (0, 3));
    }
}
