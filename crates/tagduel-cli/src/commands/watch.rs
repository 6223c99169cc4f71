//! Watch command implementation.

use super::open_feed;
use crate::cli::WatchArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use tagduel_domain::{PostFeed, PostRecord};
use tagduel_relate::{BatchWriter, RelationshipBuilder};
use tagduel_store::SqliteStore;
use tagduel_stream::Poller;

/// Execute the watch command.
///
/// Each batch is appended to `--output` when given; otherwise its posts are
/// ingested into the database and paired as they arrive.
pub async fn execute_watch(args: WatchArgs, config: &Config) -> Result<()> {
    let mut stream = config.stream.clone();
    args.filter.apply(&mut stream);
    if let Some(interval) = args.interval {
        stream.poll_interval_secs = interval;
    }
    stream.validate().map_err(CliError::Config)?;

    let mut feed = open_feed(args.input.as_deref())?;
    let mut poller = Poller::new(stream).stop_when_exhausted(args.until_exhausted);

    let cancel = poller.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
            cancel.cancel();
        }
    });

    match args.output {
        Some(output) => {
            let handler = |batch: Vec<PostRecord>| -> Result<()> {
                let mut writer = BatchWriter::append_to(&output)?;
                writer.write_all(&batch)?;
                writer.finish()?;
                Ok(())
            };
            run_poller(&mut poller, &mut feed, handler, args.cycles).await?;
            println!(
                "Appended {} posts to {} over {} batches",
                poller.collected(),
                output.display(),
                poller.cycles()
            );
        }
        None => {
            let path = args.db.unwrap_or_else(|| config.settings.database.clone());
            let store = SqliteStore::new(&path)?;
            let mut builder = RelationshipBuilder::with_store(store, config.builder.clone());
            builder.resume_from_store()?;

            let handler = |batch: Vec<PostRecord>| -> Result<()> {
                for post in &batch {
                    builder.ingest_incremental(post)?;
                }
                Ok(())
            };
            run_poller(&mut poller, &mut feed, handler, args.cycles).await?;
            println!(
                "Loaded into {} over {} batches: {}",
                path.display(),
                poller.cycles(),
                builder.stats().summary()
            );
        }
    }

    Ok(())
}

async fn run_poller<F, H>(
    poller: &mut Poller,
    feed: &mut F,
    handler: H,
    cycles: Option<usize>,
) -> Result<()>
where
    F: PostFeed,
    H: FnMut(Vec<PostRecord>) -> Result<()>,
{
    match cycles {
        Some(cycles) => poller.run_cycles(feed, handler, cycles).await?,
        None => poller.run(feed, handler).await?,
    }
    Ok(())
}
