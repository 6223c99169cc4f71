//! Bounded pull sessions over a feed

use crate::{CancelToken, StreamConfig, StreamError, StreamFilter};
use std::iter::FusedIterator;
use tagduel_domain::{PostFeed, PostRecord, RawPost, Tokenizer};
use tracing::{debug, info, trace, warn};

/// Outcome counters for one session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionReport {
    /// Posts accepted and returned
    pub accepted: usize,
    /// Posts pulled but rejected by the filter
    pub rejected: usize,
    /// Feed items that could not be decoded
    pub malformed: usize,
    /// Feed ran dry before the limit was reached
    pub exhausted: bool,
    /// Session stopped because its token was cancelled
    pub cancelled: bool,
}

impl SessionReport {
    /// One-line summary for logs
    pub fn summary(&self) -> String {
        format!(
            "{} posts accepted, {} rejected, {} malformed{}{}",
            self.accepted,
            self.rejected,
            self.malformed,
            if self.exhausted { " (feed exhausted)" } else { "" },
            if self.cancelled { " (cancelled)" } else { "" },
        )
    }
}

/// Pulls raw posts from a feed until `limit` are accepted
///
/// The session is a lazy iterator of parsed posts. Rejected and malformed
/// items do not count toward the limit; fatal feed errors are yielded once,
/// after which the session ends.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use tagduel_domain::RawPost;
/// use tagduel_stream::{StreamConfig, StreamSession, VecFeed};
///
/// let posts = (0..5).map(|i| {
///     RawPost::from_value(json!({
///         "text": format!("post {} #rust", i),
///         "lang": "en",
///         "entities": {"hashtags": [{"text": "rust"}]},
///     }))
///     .unwrap()
/// });
///
/// let config = StreamConfig { limit: 3, ..Default::default() };
/// let session = StreamSession::new(VecFeed::new(posts), &config);
/// let (records, report) = session.run().unwrap();
///
/// assert_eq!(records.len(), 3);
/// assert!(!report.exhausted);
/// ```
pub struct StreamSession<F> {
    feed: F,
    filter: StreamFilter,
    limit: usize,
    keep_metadata: bool,
    verbose: bool,
    tokenizer: Box<dyn Tokenizer>,
    cancel: CancelToken,
    report: SessionReport,
    finished: bool,
}

impl<F: PostFeed> StreamSession<F> {
    /// Create a session over a feed
    pub fn new(feed: F, config: &StreamConfig) -> Self {
        Self {
            feed,
            filter: StreamFilter::from_config(config),
            limit: config.limit,
            keep_metadata: config.keep_metadata,
            verbose: config.verbose,
            tokenizer: Box::new(config.tokenizer.as_fn()),
            cancel: CancelToken::new(),
            report: SessionReport::default(),
            finished: false,
        }
    }

    /// Override the tokenizer
    pub fn with_tokenizer(mut self, tokenizer: impl Tokenizer + 'static) -> Self {
        self.tokenizer = Box::new(tokenizer);
        self
    }

    /// Override the accepted-post limit
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Stop pulling once this token is cancelled
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Counters so far
    pub fn report(&self) -> &SessionReport {
        &self.report
    }

    /// Drain the session
    ///
    /// Returns the accepted posts and the final report. A short read is not
    /// an error.
    pub fn run(mut self) -> Result<(Vec<PostRecord>, SessionReport), StreamError> {
        let mut posts = Vec::new();
        for post in self.by_ref() {
            posts.push(post?);
        }

        if self.verbose {
            info!("{} posts returned ({})", posts.len(), self.report.summary());
        }
        Ok((posts, self.report))
    }

    fn parse(&self, raw: RawPost) -> PostRecord {
        let text = raw.text().unwrap_or_default().to_string();
        let metadata = self.keep_metadata.then(|| raw.metadata());
        PostRecord::with_tokenizer(text, metadata.as_ref(), self.tokenizer.as_ref())
    }

    fn finish(&mut self) {
        self.finished = true;
        debug!("Session finished: {}", self.report.summary());
    }
}

impl<F: PostFeed> Iterator for StreamSession<F> {
    type Item = Result<PostRecord, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if self.report.accepted >= self.limit {
            self.finish();
            return None;
        }

        loop {
            if self.cancel.is_cancelled() {
                self.report.cancelled = true;
                self.finish();
                return None;
            }

            match self.feed.next_post() {
                Ok(Some(raw)) => match self.filter.check(&raw) {
                    Ok(()) => {
                        self.report.accepted += 1;
                        return Some(Ok(self.parse(raw)));
                    }
                    Err(reason) => {
                        self.report.rejected += 1;
                        trace!("Rejected post: {}", reason);
                    }
                },
                Ok(None) => {
                    let more = if self.report.accepted > 0 { "more " } else { "" };
                    info!("Feed seems not to have any {}posts", more);
                    self.report.exhausted = true;
                    self.finish();
                    return None;
                }
                Err(e) if e.is_recoverable() => {
                    self.report.malformed += 1;
                    warn!("Skipping feed item: {}", e);
                }
                Err(e) => {
                    self.finish();
                    return Some(Err(e.into()));
                }
            }
        }
    }
}

impl<F: PostFeed> FusedIterator for StreamSession<F> {}
