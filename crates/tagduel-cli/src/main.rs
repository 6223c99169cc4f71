//! Tagduel CLI - turn a feed of posts into hashtag match-ups.

use clap::Parser;
use tagduel_cli::commands;
use tagduel_cli::{Cli, Command, Config};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> tagduel_cli::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if cli.verbose {
        config.stream.verbose = true;
        config.builder.verbose = true;
    }
    config.validate()?;

    init_tracing(&config, cli.verbose);

    match cli.command {
        Command::Collect(args) => commands::execute_collect(args, &config)?,
        Command::Fixtures(args) => commands::execute_fixtures(args, &config)?,
        Command::Load(args) => commands::execute_load(args, &config)?,
        Command::Watch(args) => commands::execute_watch(args, &config).await?,
    }

    Ok(())
}

/// Log to stderr so stdout stays clean for command output.
fn init_tracing(config: &Config, verbose: bool) {
    let default = if verbose {
        "debug"
    } else {
        config.settings.log_level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}
