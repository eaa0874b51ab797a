//! CLI command definitions and argument parsing.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Sift - Extract structured records from long text with a language model.
#[derive(Debug, Parser)]
#[command(name = "sift")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path (default: ~/.sift/config.toml)
    #[arg(short, long, global = true, env = "SIFT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v for debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (one JSON record per line)
    Quiet,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => Self::Table,
            CliFormat::Json => Self::Json,
            CliFormat::Quiet => Self::Quiet,
        }
    }
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract records from a text file or stdin
    Extract(ExtractArgs),

    /// Show how a text would be split into segments
    Chunk(ChunkArgs),

    /// Print a schema as TOML or as the JSON Schema sent to the model
    Schema(SchemaArgs),
}

/// Segment selection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StrategyArg {
    /// Extract from every segment
    Brute,
    /// Extract only from the segments most similar to --query
    Retrieval,
}

/// Model backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ProviderArg {
    /// Offline mock that never finds anything (dry runs)
    Mock,
    /// Local Ollama server
    Ollama,
    /// OpenAI-compatible chat completions API
    Openai,
}

/// Chunking unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum UnitArg {
    /// Words
    Words,
    /// Grapheme clusters
    Graphemes,
}

/// Configuration preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PresetArg {
    /// Balanced defaults
    Default,
    /// Small segments, high parallelism, fail fast
    Aggressive,
    /// Large segments, patient retries, deduplication
    Lenient,
}

/// Chunking overrides shared by `extract` and `chunk`.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ChunkOverrides {
    /// Maximum segment size in units
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Units shared by consecutive segments
    #[arg(long)]
    pub overlap: Option<usize>,

    /// Counting unit
    #[arg(long, value_enum)]
    pub unit: Option<UnitArg>,
}

/// Arguments for the extract command.
#[derive(Debug, Parser)]
pub struct ExtractArgs {
    /// Input text file ("-" or omitted for stdin)
    pub input: Option<PathBuf>,

    /// Schema TOML file (default: key developments)
    #[arg(short, long)]
    pub schema: Option<PathBuf>,

    /// Segment selection strategy
    #[arg(long, value_enum, default_value = "brute")]
    pub strategy: StrategyArg,

    /// Query for the retrieval strategy
    #[arg(short, long)]
    pub query: Option<String>,

    /// Segments kept by the retrieval strategy
    #[arg(long)]
    pub top_k: Option<usize>,

    /// Drop records whose evidence repeats an earlier record
    #[arg(long)]
    pub dedup: bool,

    /// Abort on the first failing segment
    #[arg(long)]
    pub fail_fast: bool,

    /// Model backend
    #[arg(short, long, value_enum)]
    pub provider: Option<ProviderArg>,

    /// Model name
    #[arg(short, long)]
    pub model: Option<String>,

    /// Provider endpoint / base URL
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Maximum model calls in flight
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Start from a configuration preset instead of the config file
    #[arg(long, value_enum)]
    pub preset: Option<PresetArg>,

    #[command(flatten)]
    pub chunking: ChunkOverrides,
}

/// Arguments for the chunk command.
#[derive(Debug, Parser)]
pub struct ChunkArgs {
    /// Input text file ("-" or omitted for stdin)
    pub input: Option<PathBuf>,

    #[command(flatten)]
    pub chunking: ChunkOverrides,
}

/// Arguments for the schema command.
#[derive(Debug, Parser)]
pub struct SchemaArgs {
    /// Schema TOML file (default: key developments)
    #[arg(short, long)]
    pub schema: Option<PathBuf>,

    /// Print the JSON Schema sent to the model instead of TOML
    #[arg(long)]
    pub json_schema: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_extract() {
        let cli = Cli::try_parse_from([
            "sift", "extract", "cars.txt", "--strategy", "retrieval", "-q", "car history", "--top-k", "2",
            "--chunk-size", "500", "--overlap", "10", "-p", "mock", "-vv",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Extract(args) => {
                assert_eq!(args.input, Some(PathBuf::from("cars.txt")));
                assert_eq!(args.strategy, StrategyArg::Retrieval);
                assert_eq!(args.query.as_deref(), Some("car history"));
                assert_eq!(args.top_k, Some(2));
                assert_eq!(args.chunking.chunk_size, Some(500));
                assert_eq!(args.chunking.overlap, Some(10));
                assert_eq!(args.provider, Some(ProviderArg::Mock));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_chunk_from_stdin() {
        let cli = Cli::try_parse_from(["sift", "chunk", "--unit", "graphemes", "-f", "json"]).unwrap();
        assert_eq!(cli.format, Some(CliFormat::Json));
        match cli.command {
            Command::Chunk(args) => {
                assert!(args.input.is_none());
                assert_eq!(args.chunking.unit, Some(UnitArg::Graphemes));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_command_required() {
        assert!(Cli::try_parse_from(["sift"]).is_err());
    }
}
