//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tagduel_domain::TokenizerKind;
use tagduel_stream::StreamConfig;

/// Tagduel - turn a feed of posts into hashtag match-ups.
#[derive(Debug, Parser)]
#[command(name = "tagduel")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path (default: ~/.tagduel/config.toml)
    #[arg(short, long, global = true, env = "TAGDUEL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log every created record and skipped item
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Filter posts from a captured stream and append them to a batch file
    Collect(CollectArgs),

    /// Build a fixture document from a batch file
    Fixtures(FixturesArgs),

    /// Load a batch file into a SQLite database, with all tag pairs
    Load(LoadArgs),

    /// Collect a batch on every interval until interrupted
    Watch(WatchArgs),
}

/// Post filter flags shared by the feed-reading commands.
#[derive(Debug, Clone, Default, Parser)]
pub struct FilterArgs {
    /// Language code posts must declare
    #[arg(long)]
    pub lang: Option<String>,

    /// Also accept posts that declare no language
    #[arg(long)]
    pub lang_none: bool,

    /// Accept posts without structured hashtags
    #[arg(long)]
    pub all: bool,

    /// Drop post metadata and read tags from the text alone
    #[arg(long)]
    pub no_meta: bool,

    /// Tokenizer for post text
    #[arg(long, value_enum)]
    pub tokenizer: Option<TokenizerArg>,

    /// Maximum accepted posts per batch
    #[arg(short, long)]
    pub limit: Option<usize>,
}

impl FilterArgs {
    /// Apply the flags on top of configured values.
    pub fn apply(&self, config: &mut StreamConfig) {
        if let Some(lang) = &self.lang {
            config.lang = lang.clone();
        }
        if self.lang_none {
            config.lang_none = true;
        }
        if self.all {
            config.hash_only = false;
        }
        if self.no_meta {
            config.keep_metadata = false;
        }
        if let Some(tokenizer) = self.tokenizer {
            config.tokenizer = tokenizer.into();
        }
        if let Some(limit) = self.limit {
            config.limit = limit;
        }
    }
}

/// Arguments for the collect command.
#[derive(Debug, Parser)]
pub struct CollectArgs {
    /// Captured stream, one raw post per line (default: stdin)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Batch file to append to
    #[arg(short, long)]
    pub output: PathBuf,

    #[command(flatten)]
    pub filter: FilterArgs,
}

/// Arguments for the fixtures command.
#[derive(Debug, Parser)]
pub struct FixturesArgs {
    /// Batch file to read
    #[arg(short, long)]
    pub input: PathBuf,

    /// Fixture document to write
    #[arg(short, long)]
    pub output: PathBuf,

    /// Read at most this many posts
    #[arg(short, long)]
    pub maximum: Option<usize>,

    /// Prefix for fixture model names
    #[arg(long)]
    pub app_label: Option<String>,
}

/// Arguments for the load command.
#[derive(Debug, Parser)]
pub struct LoadArgs {
    /// Batch file to read
    #[arg(short, long)]
    pub input: PathBuf,

    /// SQLite database (default: settings.database)
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Read at most this many posts
    #[arg(short, long)]
    pub maximum: Option<usize>,

    /// Start ids after the highest ones already in the database
    #[arg(long)]
    pub resume: bool,
}

/// Arguments for the watch command.
#[derive(Debug, Parser)]
pub struct WatchArgs {
    /// Captured stream, one raw post per line (default: stdin)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Append each batch to this file instead of the database
    #[arg(short, long, conflicts_with = "db")]
    pub output: Option<PathBuf>,

    /// SQLite database (default: settings.database)
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Seconds between batches
    #[arg(long)]
    pub interval: Option<u64>,

    /// Stop after this many batches
    #[arg(long)]
    pub cycles: Option<usize>,

    /// Stop once the input runs dry
    #[arg(long)]
    pub until_exhausted: bool,

    #[command(flatten)]
    pub filter: FilterArgs,
}

/// Tokenizer argument.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum TokenizerArg {
    /// Split on whitespace
    Whitespace,
    /// Runs of word characters
    Words,
}

impl From<TokenizerArg> for TokenizerKind {
    fn from(tokenizer: TokenizerArg) -> Self {
        match tokenizer {
            TokenizerArg::Whitespace => TokenizerKind::Whitespace,
            TokenizerArg::Words => TokenizerKind::Words,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_command() {
        let cli = Cli::parse_from([
            "tagduel", "collect", "--output", "batch.ndjson", "--lang", "de", "--all", "-l", "5",
        ]);
        match cli.command {
            Command::Collect(args) => {
                assert!(args.input.is_none());
                assert_eq!(args.output, PathBuf::from("batch.ndjson"));
                assert_eq!(args.filter.lang.as_deref(), Some("de"));
                assert!(args.filter.all);
                assert_eq!(args.filter.limit, Some(5));
            }
            _ => panic!("Expected Collect command"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "tagduel", "fixtures", "-i", "in.ndjson", "-o", "out.json", "--verbose", "--config",
            "alt.toml",
        ]);
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("alt.toml")));
        assert!(matches!(cli.command, Command::Fixtures(_)));
    }

    #[test]
    fn test_watch_output_conflicts_with_db() {
        let result = Cli::try_parse_from([
            "tagduel", "watch", "--output", "batch.ndjson", "--db", "tagduel.db",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_filter_args_override_config() {
        let args = FilterArgs {
            lang: Some("es".to_string()),
            lang_none: true,
            all: true,
            no_meta: true,
            tokenizer: Some(TokenizerArg::Words),
            limit: Some(7),
        };
        let mut config = StreamConfig::default();
        args.apply(&mut config);

        assert_eq!(config.lang, "es");
        assert!(config.lang_none);
        assert!(!config.hash_only);
        assert!(!config.keep_metadata);
        assert_eq!(config.tokenizer, TokenizerKind::Words);
        assert_eq!(config.limit, 7);
    }

    #[test]
    fn test_empty_filter_args_keep_config() {
        let mut config = StreamConfig::permissive();
        FilterArgs::default().apply(&mut config);
        assert_eq!(config, StreamConfig::permissive());
    }
}
