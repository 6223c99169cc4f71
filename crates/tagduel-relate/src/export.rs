//! Batch files and fixture documents
//!
//! A batch file holds one parsed post per line as a two-element JSON array,
//! `[text, metadata]`, where `metadata` is the flattened metadata or `null`.
//! Writers append, so running the same export twice duplicates its output.
//!
//! A fixture document is a single JSON array of `{model, pk, fields}` objects
//! covering every record a builder created.

use crate::ExportError;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tagduel_domain::{PostRecord, Record, RecordKind, TokenizerKind};
use tracing::{info, warn};

/// Appends posts to a batch file
pub struct BatchWriter<W: Write> {
    writer: W,
    written: usize,
}

impl BatchWriter<BufWriter<File>> {
    /// Open a batch file for appending, creating it if needed
    pub fn append_to<P: AsRef<Path>>(path: P) -> Result<Self, ExportError> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> BatchWriter<W> {
    /// Write batch lines to any writer
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    /// Append one post
    pub fn write(&mut self, post: &PostRecord) -> Result<(), ExportError> {
        serde_json::to_writer(&mut self.writer, &(post.text(), post.metadata()))?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    /// Append every post, returning how many were written
    pub fn write_all<'a>(
        &mut self,
        posts: impl IntoIterator<Item = &'a PostRecord>,
    ) -> Result<usize, ExportError> {
        let before = self.written;
        for post in posts {
            self.write(post)?;
        }
        Ok(self.written - before)
    }

    /// Posts written so far
    pub fn written(&self) -> usize {
        self.written
    }

    /// Flush and return the inner writer
    pub fn finish(mut self) -> Result<W, ExportError> {
        self.writer.flush()?;
        info!("Wrote {} posts to batch", self.written);
        Ok(self.writer)
    }
}

/// Reads posts back from a batch file
///
/// Lines that do not hold a `[text, metadata]` pair, or are not valid UTF-8,
/// are logged and skipped. Only read failures are returned as errors.
///
/// # Examples
///
/// ```
/// use std::io::Cursor;
/// use tagduel_relate::BatchReader;
///
/// let batch = "[\"#a #b\", null]\nnot json\n[\"#c\", {\"lang\": \"en\"}]\n";
/// let posts: Vec<_> = BatchReader::new(Cursor::new(batch))
///     .collect::<Result<_, _>>()
///     .unwrap();
///
/// assert_eq!(posts.len(), 2);
/// assert!(posts[1].metadata().is_some());
/// ```
pub struct BatchReader<R> {
    reader: R,
    buffer: Vec<u8>,
    line_number: usize,
    read: usize,
    skipped: usize,
    maximum: Option<usize>,
    tokenizer: TokenizerKind,
}

impl BatchReader<BufReader<File>> {
    /// Open a batch file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ExportError> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> BatchReader<R> {
    /// Read from any buffered reader
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: Vec::new(),
            line_number: 0,
            read: 0,
            skipped: 0,
            maximum: None,
            tokenizer: TokenizerKind::default(),
        }
    }

    /// Stop after this many posts
    pub fn with_maximum(mut self, maximum: usize) -> Self {
        self.maximum = Some(maximum);
        self
    }

    /// Tokenizer for the rebuilt posts
    pub fn with_tokenizer(mut self, tokenizer: TokenizerKind) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    /// Posts read so far
    pub fn read(&self) -> usize {
        self.read
    }

    /// Malformed lines skipped so far
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn parse_line(&self, line: &[u8]) -> Result<PostRecord, String> {
        let value: Value = serde_json::from_slice(line).map_err(|e| e.to_string())?;
        let (text, metadata) = match value.as_array().map(Vec::as_slice) {
            Some([text, metadata]) => (text, metadata),
            _ => return Err("expected a [text, metadata] pair".to_string()),
        };

        let text = text.as_str().ok_or("text is not a string")?;
        let metadata: Option<&Map<String, Value>> = match metadata {
            Value::Null => None,
            Value::Object(map) => Some(map),
            _ => return Err("metadata is neither an object nor null".to_string()),
        };

        Ok(PostRecord::with_tokenizer(text, metadata, &self.tokenizer.as_fn()))
    }
}

impl<R: BufRead> Iterator for BatchReader<R> {
    type Item = Result<PostRecord, ExportError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.maximum.is_some_and(|maximum| self.read >= maximum) {
            return None;
        }

        loop {
            self.buffer.clear();
            match self.reader.read_until(b'\n', &mut self.buffer) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(e.into())),
            }
            self.line_number += 1;

            if self.buffer.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            match self.parse_line(&self.buffer) {
                Ok(post) => {
                    self.read += 1;
                    return Some(Ok(post));
                }
                Err(reason) => {
                    self.skipped += 1;
                    warn!("Skipping batch line {}: {}", self.line_number, reason);
                }
            }
        }
    }
}

/// One entry of a fixture document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FixtureEntry {
    /// `<app_label>.<record type>`
    pub model: String,
    /// Record id
    pub pk: u64,
    /// Record fields
    pub fields: Value,
}

impl FixtureEntry {
    /// Build the entry for one record
    pub fn from_record(record: &Record, app_label: &str) -> Self {
        let fields = match record {
            Record::Post(row) => json!({
                "text": row.text,
                "uid": row.uid,
                "time_zone": row.time_zone,
                "lat": row.lat,
                "lon": row.lon,
            }),
            Record::Tag(row) => json!({
                "text": row.text,
                "post": row.post,
            }),
            Record::TagPair(row) => json!({
                "tag1": row.tag1.tag_id,
                "tag2": row.tag2.tag_id,
                "votes": row.votes,
            }),
        };

        Self {
            model: format!("{}.{}", app_label, record.kind()),
            pk: record.id(),
            fields,
        }
    }
}

/// Fixture entries grouped by type: posts, then tags, then pairs
///
/// Creation order is kept within each group.
pub fn fixture_entries(records: &[Record], app_label: &str) -> Vec<FixtureEntry> {
    RecordKind::ALL
        .iter()
        .flat_map(|&kind| {
            records
                .iter()
                .filter(move |record| record.kind() == kind)
                .map(move |record| FixtureEntry::from_record(record, app_label))
        })
        .collect()
}

/// Write every record as one fixture document, returning the entry count
pub fn write_fixtures<W: Write>(
    mut writer: W,
    records: &[Record],
    app_label: &str,
) -> Result<usize, ExportError> {
    let entries = fixture_entries(records, app_label);
    serde_json::to_writer(&mut writer, &entries)?;
    writer.flush()?;

    info!("Wrote {} fixture entries", entries.len());
    Ok(entries.len())
}
