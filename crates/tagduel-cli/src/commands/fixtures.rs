//! Fixtures command implementation.

use crate::cli::FixturesArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use std::fs::File;
use std::io::BufWriter;
use tagduel_relate::{write_fixtures, BatchReader, RelationshipBuilder};

/// Execute the fixtures command.
pub fn execute_fixtures(args: FixturesArgs, config: &Config) -> Result<()> {
    let mut builder_config = config.builder.clone();
    if let Some(app_label) = args.app_label {
        builder_config.app_label = app_label;
    }
    builder_config.validate().map_err(CliError::Config)?;

    let mut reader = BatchReader::open(&args.input)?.with_tokenizer(config.stream.tokenizer);
    if let Some(maximum) = args.maximum {
        reader = reader.with_maximum(maximum);
    }

    let mut builder = RelationshipBuilder::new(builder_config);
    for post in reader.by_ref() {
        builder.ingest(&post?)?;
    }
    builder.build_pairs()?;

    let file = File::create(&args.output)?;
    let entries = write_fixtures(
        BufWriter::new(file),
        builder.records(),
        &builder.config().app_label,
    )?;

    println!(
        "Wrote {} fixture entries to {}: {} ({} malformed lines skipped)",
        entries,
        args.output.display(),
        builder.stats().summary(),
        reader.skipped()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::fs;

    #[test]
    fn test_fixtures_from_batch() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("batch.ndjson");
        let output = dir.path().join("fixtures.json");
        fs::write(
            &input,
            "[\"#x #y\", null]\n[\"#y #z\", null]\nbroken\n[\"plain\", null]\n",
        )
        .unwrap();

        let args = FixturesArgs {
            input,
            output: output.clone(),
            maximum: None,
            app_label: Some("hash_to_hash".to_string()),
        };
        execute_fixtures(args, &Config::default()).unwrap();

        let document: Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        let entries = document.as_array().unwrap();
        assert_eq!(entries.len(), 3 + 4 + 5);
        assert_eq!(entries[0]["model"], "hash_to_hash.post");
        assert_eq!(entries[11]["model"], "hash_to_hash.tagpair");
    }

    #[test]
    fn test_fixtures_maximum() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("batch.ndjson");
        let output = dir.path().join("fixtures.json");
        fs::write(&input, "[\"#a #b\", null]\n[\"#c\", null]\n").unwrap();

        let args = FixturesArgs {
            input,
            output: output.clone(),
            maximum: Some(1),
            app_label: None,
        };
        execute_fixtures(args, &Config::default()).unwrap();

        let document: Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        // one post, two tags, one pair
        assert_eq!(document.as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_fixtures_bad_app_label() {
        let dir = tempfile::tempdir().unwrap();
        let args = FixturesArgs {
            input: dir.path().join("batch.ndjson"),
            output: dir.path().join("fixtures.json"),
            maximum: None,
            app_label: Some("has.dot".to_string()),
        };
        assert!(matches!(
            execute_fixtures(args, &Config::default()),
            Err(CliError::Config(_))
        ));
    }
}
