//! Periodic collection of post batches

use crate::{CancelToken, StreamConfig, StreamError, StreamSession};
use std::fmt::Display;
use tagduel_domain::{PostFeed, PostRecord};
use tokio::time::{interval, Duration, MissedTickBehavior};

/// Failure reported by a batch handler
///
/// [`Poller::run`] logs a handler error and keeps polling unless it is fatal.
pub trait HandlerError: Display {
    /// Whether the poll loop must stop
    fn is_fatal(&self) -> bool {
        false
    }
}

impl HandlerError for String {}

impl HandlerError for &str {}

impl HandlerError for std::io::Error {}

/// Runs one bounded session per tick and hands each batch to a handler
///
/// The first batch is collected immediately; later batches follow every
/// `poll_interval_secs`. The loop ends when its [`CancelToken`] fires.
///
/// Feeds are pulled synchronously on the task running the poller. The token
/// is checked between pulls, so a feed blocked in a read holds up shutdown
/// until that read returns.
///
/// # Examples
///
/// ```no_run
/// use std::io::BufReader;
/// use tagduel_stream::{JsonlFeed, Poller, StreamConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut feed = JsonlFeed::new(BufReader::new(std::io::stdin()));
///     let mut poller = Poller::new(StreamConfig::default());
///
///     let cancel = poller.cancel_token();
///     tokio::spawn(async move {
///         let _ = tokio::signal::ctrl_c().await;
///         cancel.cancel();
///     });
///
///     poller
///         .run(&mut feed, |batch| {
///             println!("{} posts", batch.len());
///             Ok::<(), std::io::Error>(())
///         })
///         .await?;
///     Ok(())
/// }
/// ```
pub struct Poller {
    config: StreamConfig,
    interval: Duration,
    cancel: CancelToken,
    stop_when_exhausted: bool,
    cycles: usize,
    collected: usize,
}

impl Poller {
    /// Create a poller with the given configuration
    pub fn new(config: StreamConfig) -> Self {
        let interval = config.poll_interval();
        Self {
            config,
            interval,
            cancel: CancelToken::new(),
            stop_when_exhausted: false,
            cycles: 0,
            collected: 0,
        }
    }

    /// Override the interval between batches
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Share an existing cancellation token
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Stop once a session finds the feed exhausted
    ///
    /// Useful for finite feeds such as a capture file; a live feed that is
    /// merely quiet should keep polling.
    pub fn stop_when_exhausted(mut self, stop: bool) -> Self {
        self.stop_when_exhausted = stop;
        self
    }

    /// Token that stops the loop
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Completed collection cycles
    pub fn cycles(&self) -> usize {
        self.cycles
    }

    /// Posts handed to the handler so far
    pub fn collected(&self) -> usize {
        self.collected
    }

    /// Run until cancelled
    ///
    /// Handler failures are logged and the loop continues with the next
    /// batch, unless [`HandlerError::is_fatal`] says otherwise.
    ///
    /// # Errors
    ///
    /// Returns the first fatal session error (authorization or I/O), or
    /// [`StreamError::Handler`] for a fatal handler error.
    pub async fn run<F, H, E>(&mut self, feed: &mut F, mut handler: H) -> Result<(), StreamError>
    where
        F: PostFeed,
        H: FnMut(Vec<PostRecord>) -> Result<(), E>,
        E: HandlerError,
    {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let cancel = self.cancel.clone();

        tracing::info!("Poller started (interval: {:?})", self.interval);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!("Shutdown requested, stopping poller");
                    break;
                }
                _ = ticker.tick() => {
                    tracing::debug!("Starting collection cycle {}", self.cycles + 1);

                    let (batch, exhausted) = self.collect(feed)?;
                    let size = batch.len();
                    match handler(batch) {
                        Ok(()) => {
                            tracing::info!("Cycle {} handled {} posts", self.cycles, size);
                        }
                        Err(e) if e.is_fatal() => {
                            tracing::error!("Cycle {} handler failed, stopping: {}", self.cycles, e);
                            return Err(StreamError::Handler(e.to_string()));
                        }
                        Err(e) => {
                            tracing::error!("Cycle {} handler failed: {}", self.cycles, e);
                        }
                    }

                    if exhausted && self.stop_when_exhausted {
                        tracing::info!("Feed exhausted, stopping poller");
                        break;
                    }
                }
            }
        }

        tracing::info!(
            "Poller stopped after {} cycles, {} posts collected",
            self.cycles,
            self.collected
        );
        Ok(())
    }

    /// Run for a fixed number of cycles
    ///
    /// Unlike [`Poller::run`], a handler failure ends the loop.
    pub async fn run_cycles<F, H, E>(
        &mut self,
        feed: &mut F,
        mut handler: H,
        cycles: usize,
    ) -> Result<(), StreamError>
    where
        F: PostFeed,
        H: FnMut(Vec<PostRecord>) -> Result<(), E>,
        E: HandlerError,
    {
        let mut ticker = interval(self.interval);
        let cancel = self.cancel.clone();

        tracing::info!(
            "Poller started for {} cycles (interval: {:?})",
            cycles,
            self.interval
        );

        for cycle in 0..cycles {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!("Shutdown requested after {}/{} cycles", cycle, cycles);
                    break;
                }
                _ = ticker.tick() => {}
            }

            let (batch, _) = self.collect(feed)?;
            let size = batch.len();
            if let Err(e) = handler(batch) {
                tracing::error!("Cycle {}/{} handler failed: {}", cycle + 1, cycles, e);
                return Err(StreamError::Handler(e.to_string()));
            }
            tracing::info!("Cycle {}/{} handled {} posts", cycle + 1, cycles, size);
        }

        tracing::info!(
            "Poller finished {} cycles, {} posts collected",
            self.cycles,
            self.collected
        );
        Ok(())
    }

    fn collect<F: PostFeed>(&mut self, feed: &mut F) -> Result<(Vec<PostRecord>, bool), StreamError> {
        let session = StreamSession::new(&mut *feed, &self.config).with_cancel(self.cancel.clone());
        let (batch, report) = session.run()?;

        self.cycles += 1;
        self.collected += batch.len();
        Ok((batch, report.exhausted))
    }
}
