//! Load command implementation.

use crate::cli::LoadArgs;
use crate::config::Config;
use crate::error::Result;
use tagduel_relate::{BatchReader, RelationshipBuilder};
use tagduel_store::SqliteStore;

/// Execute the load command.
pub fn execute_load(args: LoadArgs, config: &Config) -> Result<()> {
    let path = args.db.unwrap_or_else(|| config.settings.database.clone());
    let store = SqliteStore::new(&path)?;

    let mut builder = RelationshipBuilder::with_store(store, config.builder.clone());
    if args.resume {
        builder.resume_from_store()?;
    }

    let mut reader = BatchReader::open(&args.input)?.with_tokenizer(config.stream.tokenizer);
    if let Some(maximum) = args.maximum {
        reader = reader.with_maximum(maximum);
    }

    for post in reader.by_ref() {
        builder.ingest(&post?)?;
    }
    builder.build_pairs()?;

    println!(
        "Loaded into {}: {} ({} malformed lines skipped)",
        path.display(),
        builder.stats().summary(),
        reader.skipped()
    );
    Ok(())
}
