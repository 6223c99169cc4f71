//! Feed adapters
//!
//! The live streaming client is an external collaborator; these adapters let
//! a session pull from a captured stream (one raw post per line) or from
//! posts held in memory.

use serde_json::Value;
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tagduel_domain::{FeedError, PostFeed, RawPost};

/// Reads raw posts from newline-delimited JSON
///
/// Blank lines (stream keep-alives) are skipped. Lines that are not JSON
/// objects, including lines that are not valid UTF-8, surface as
/// [`FeedError::Malformed`].
pub struct JsonlFeed<R> {
    reader: R,
    buffer: Vec<u8>,
    line_number: usize,
}

impl<R: BufRead> JsonlFeed<R> {
    /// Read from any buffered reader
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: Vec::new(),
            line_number: 0,
        }
    }

    /// Lines consumed so far
    pub fn line_number(&self) -> usize {
        self.line_number
    }
}

impl JsonlFeed<BufReader<File>> {
    /// Open a capture file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FeedError> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> PostFeed for JsonlFeed<R> {
    fn next_post(&mut self) -> Result<Option<RawPost>, FeedError> {
        loop {
            self.buffer.clear();
            if self.reader.read_until(b'\n', &mut self.buffer)? == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            if self.buffer.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            let value: Value = serde_json::from_slice(&self.buffer).map_err(|e| {
                FeedError::Malformed(format!("line {}: {}", self.line_number, e))
            })?;

            return RawPost::from_value(value).map(Some).ok_or_else(|| {
                FeedError::Malformed(format!("line {}: not a JSON object", self.line_number))
            });
        }
    }
}

/// Feed backed by queued items
///
/// Errors can be queued alongside posts to exercise session error handling.
#[derive(Debug, Default)]
pub struct VecFeed {
    items: VecDeque<Result<RawPost, FeedError>>,
    pulled: usize,
}

impl VecFeed {
    /// Feed that yields the given posts, then is exhausted
    pub fn new(posts: impl IntoIterator<Item = RawPost>) -> Self {
        Self {
            items: posts.into_iter().map(Ok).collect(),
            pulled: 0,
        }
    }

    /// Queue another post
    pub fn push(&mut self, post: RawPost) {
        self.items.push_back(Ok(post));
    }

    /// Queue an error
    pub fn push_error(&mut self, error: FeedError) {
        self.items.push_back(Err(error));
    }

    /// Items not yet pulled
    pub fn remaining(&self) -> usize {
        self.items.len()
    }

    /// Items pulled so far, errors included
    pub fn pulled(&self) -> usize {
        self.pulled
    }
}

impl PostFeed for VecFeed {
    fn next_post(&mut self) -> Result<Option<RawPost>, FeedError> {
        match self.items.pop_front() {
            None => Ok(None),
            Some(item) => {
                self.pulled += 1;
                item.map(Some)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    #[test]
    fn test_jsonl_feed_reads_objects() {
        let data = "{\"text\": \"one\"}\n\n{\"text\": \"two\"}\n";
        let mut feed = JsonlFeed::new(Cursor::new(data));

        assert_eq!(feed.next_post().unwrap().unwrap().text(), Some("one"));
        assert_eq!(feed.next_post().unwrap().unwrap().text(), Some("two"));
        assert!(feed.next_post().unwrap().is_none());
        assert_eq!(feed.line_number(), 3);
    }

    #[test]
    fn test_jsonl_feed_malformed_lines() {
        let data = "not json\n[1, 2]\n{\"text\": \"ok\"}\n";
        let mut feed = JsonlFeed::new(Cursor::new(data));

        assert!(matches!(feed.next_post(), Err(FeedError::Malformed(_))));
        assert!(matches!(feed.next_post(), Err(FeedError::Malformed(_))));
        assert_eq!(feed.next_post().unwrap().unwrap().text(), Some("ok"));
    }

    #[test]
    fn test_jsonl_feed_invalid_utf8_is_malformed() {
        let mut data = b"{\"text\": \"one\"}\n".to_vec();
        data.extend_from_slice(b"{\"text\": \"bad \xff\xfe\"}\n");
        data.extend_from_slice(b"{\"text\": \"three\"}\n");
        let mut feed = JsonlFeed::new(Cursor::new(data));

        assert_eq!(feed.next_post().unwrap().unwrap().text(), Some("one"));
        match feed.next_post() {
            Err(e @ FeedError::Malformed(_)) => assert!(e.is_recoverable()),
            other => panic!("Expected malformed line, got {:?}", other),
        };
        assert_eq!(feed.next_post().unwrap().unwrap().text(), Some("three"));
        assert!(feed.next_post().unwrap().is_none());
    }

    #[test]
    fn test_jsonl_feed_open_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{{\"text\": \"from disk\"}}").unwrap();

        let mut feed = JsonlFeed::open(file.path()).unwrap();
        assert_eq!(feed.next_post().unwrap().unwrap().text(), Some("from disk"));
    }

    #[test]
    fn test_jsonl_feed_missing_file() {
        let result = JsonlFeed::open("/definitely/not/here.jsonl");
        assert!(matches!(result, Err(FeedError::Io(_))));
    }

    #[test]
    fn test_vec_feed() {
        let mut feed = VecFeed::default();
        feed.push_error(FeedError::Unauthorized("401".to_string()));
        feed.push(RawPost::default());

        assert!(feed.next_post().is_err());
        assert!(feed.next_post().unwrap().is_some());
        assert!(feed.next_post().unwrap().is_none());
        assert_eq!(feed.pulled(), 2);
        assert_eq!(feed.remaining(), 0);
    }
}
