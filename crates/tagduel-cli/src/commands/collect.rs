//! Collect command implementation.

use super::open_feed;
use crate::cli::CollectArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use tagduel_relate::BatchWriter;
use tagduel_stream::StreamSession;

/// Execute the collect command.
pub fn execute_collect(args: CollectArgs, config: &Config) -> Result<()> {
    let mut stream = config.stream.clone();
    args.filter.apply(&mut stream);
    stream.validate().map_err(CliError::Config)?;

    let feed = open_feed(args.input.as_deref())?;
    let (posts, report) = StreamSession::new(feed, &stream).run()?;

    let mut writer = BatchWriter::append_to(&args.output)?;
    writer.write_all(&posts)?;
    writer.finish()?;

    println!(
        "Collected {} posts into {} ({})",
        posts.len(),
        args.output.display(),
        report.summary()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::FilterArgs;
    use std::fs;
    use std::path::PathBuf;
    use tagduel_relate::BatchReader;

    const CAPTURE: &str = concat!(
        r#"{"text": "a #x #y", "lang": "en", "entities": {"hashtags": [{"text": "x"}, {"text": "y"}]}}"#,
        "\n",
        r#"{"text": "b", "lang": "en"}"#,
        "\n",
        "garbage\n",
        r#"{"text": "c #z", "entities": {"hashtags": [{"text": "z"}]}}"#,
        "\n",
    );

    fn args(input: PathBuf, output: PathBuf, filter: FilterArgs) -> CollectArgs {
        CollectArgs {
            input: Some(input),
            output,
            filter,
        }
    }

    #[test]
    fn test_collect_appends_filtered_posts() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("capture.jsonl");
        let output = dir.path().join("batch.ndjson");
        fs::write(&input, CAPTURE).unwrap();

        execute_collect(
            args(input.clone(), output.clone(), FilterArgs::default()),
            &Config::default(),
        )
        .unwrap();
        assert_eq!(BatchReader::open(&output).unwrap().count(), 1);

        let permissive = FilterArgs {
            lang_none: true,
            all: true,
            ..Default::default()
        };
        execute_collect(args(input, output.clone(), permissive), &Config::default()).unwrap();
        assert_eq!(BatchReader::open(&output).unwrap().count(), 1 + 3);
    }

    #[test]
    fn test_collect_rejects_invalid_limit() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("capture.jsonl");
        fs::write(&input, CAPTURE).unwrap();

        let filter = FilterArgs {
            limit: Some(0),
            ..Default::default()
        };
        let result = execute_collect(
            args(input, dir.path().join("out.ndjson"), filter),
            &Config::default(),
        );
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn test_collect_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let result = execute_collect(
            args(
                dir.path().join("missing.jsonl"),
                dir.path().join("out.ndjson"),
                FilterArgs::default(),
            ),
            &Config::default(),
        );
        assert!(matches!(result, Err(CliError::Feed(_))));
    }
}
