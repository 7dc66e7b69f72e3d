use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Normalize one raw capture JSONL file into a run manifest.
    Normalize(NormalizeArgs),
    /// Print the built-in platform registry as YAML.
    Platforms(PlatformsArgs),
}

#[derive(Debug, Args)]
pub struct NormalizeArgs {
    /// Input path to the raw capture JSONL.
    #[arg(long)]
    pub input: String,

    /// Platform code (see `platforms`).
    #[arg(long)]
    pub platform: String,

    /// Output file path for the manifest JSON (default: stdout).
    #[arg(long)]
    pub out: Option<String>,

    /// Also write the final items, one JSON object per line.
    #[arg(long)]
    pub items_jsonl: Option<String>,

    /// YAML file with engine overrides.
    #[arg(long)]
    pub config: Option<String>,

    /// Keep at most this many items in the output.
    #[arg(long)]
    pub max_items: Option<usize>,

    /// Copy each candidate into `raw_attrs.raw`.
    #[arg(long, default_value_t = false)]
    pub include_raw: bool,

    /// Maximum per-record samples kept in the manifest (floor: 20).
    #[arg(long)]
    pub max_samples: Option<usize>,

    /// Maximum image URLs per listing.
    #[arg(long)]
    pub image_limit: Option<usize>,

    /// Overwrite existing output files.
    #[arg(long, default_value_t = false)]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct PlatformsArgs {
    /// Include each platform's field hint aliases.
    #[arg(long, default_value_t = false)]
    pub hints: bool,
}
