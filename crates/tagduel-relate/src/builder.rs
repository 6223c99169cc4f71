//! Relationship builder: ids, records and competitor pairs

use crate::{BuildError, BuildStats, BuilderConfig};
use std::collections::BTreeMap;
use tagduel_domain::{
    CreateError, PostRecord, PostRow, Record, RecordKind, RecordStore, TagOccurrence, TagPairRow,
    TagRow,
};
use tagduel_store::MemoryStore;
use tracing::{debug, info, warn};

/// Turns parsed posts into Post, Tag and TagPair records
///
/// Each record type has its own id counter starting at 1. Records are written
/// through a [`RecordStore`]; when the store reports an id as taken the same
/// record is retried with the next id, up to `max_id_retries` times.
///
/// Every tag written is also kept as an occurrence. Pairs are formed over
/// these occurrences, so the same tag text from two posts counts twice, but
/// two occurrences with equal text never pair with each other.
///
/// Use either [`ingest`](Self::ingest) followed by one
/// [`build_pairs`](Self::build_pairs), or
/// [`ingest_incremental`](Self::ingest_incremental) alone. Mixing the two on
/// one builder emits some pairs twice.
///
/// [`resume_from_store`](Self::resume_from_store) loads the tags the store
/// already holds as history. New occurrences pair with history, but history
/// is never paired with itself again.
///
/// # Examples
///
/// ```
/// use tagduel_domain::PostRecord;
/// use tagduel_relate::{BuilderConfig, RelationshipBuilder};
///
/// let mut builder = RelationshipBuilder::new(BuilderConfig::default());
/// builder.ingest(&PostRecord::new("#rust vs #go", None)).unwrap();
/// builder.ingest(&PostRecord::new("#zig", None)).unwrap();
///
/// let pairs = builder.build_pairs().unwrap();
/// assert_eq!(pairs, 3);
/// assert_eq!(builder.stats().tags, 3);
/// ```
pub struct RelationshipBuilder<S: RecordStore = MemoryStore> {
    store: S,
    config: BuilderConfig,
    next_post: u64,
    next_tag: u64,
    next_pair: u64,
    records: Vec<Record>,
    occurrences: Vec<TagOccurrence>,
    /// Leading occurrences loaded from the store, already paired
    history: usize,
    /// Pending length at a failed drain step mapped to the pairs it committed
    partial_drains: BTreeMap<usize, usize>,
    stats: BuildStats,
}

impl RelationshipBuilder<MemoryStore> {
    /// Create a builder backed by an in-memory store
    pub fn new(config: BuilderConfig) -> Self {
        Self::with_store(MemoryStore::new(), config)
    }

    /// Create a builder with default configuration
    pub fn default_config() -> Self {
        Self::new(BuilderConfig::default())
    }
}

impl<S: RecordStore> RelationshipBuilder<S> {
    /// Create a builder that writes through the given store
    pub fn with_store(store: S, config: BuilderConfig) -> Self {
        Self {
            store,
            config,
            next_post: 1,
            next_tag: 1,
            next_pair: 1,
            records: Vec::new(),
            occurrences: Vec::new(),
            history: 0,
            partial_drains: BTreeMap::new(),
            stats: BuildStats::new(),
        }
    }

    /// Start each counter after the highest id the store already holds
    ///
    /// Counters never move backwards. Tags already in the store become history
    /// that later occurrences pair with. Call this before ingesting.
    pub fn resume_from_store(&mut self) -> Result<(), BuildError> {
        for kind in RecordKind::ALL {
            let max = self
                .store
                .max_id(kind)
                .map_err(|e| BuildError::Store(e.to_string()))?;

            if let Some(max) = max {
                let counter = self.counter_mut(kind);
                *counter = (*counter).max(max.saturating_add(1));
            }
        }

        let known: std::collections::HashSet<u64> =
            self.occurrences.iter().map(|o| o.tag_id).collect();
        let mut history: Vec<TagOccurrence> = self
            .store
            .tag_occurrences()
            .map_err(|e| BuildError::Store(e.to_string()))?
            .into_iter()
            .filter(|o| !known.contains(&o.tag_id))
            .collect();
        let loaded = history.len();
        history.append(&mut self.occurrences);
        self.occurrences = history;
        self.history += loaded;

        info!(
            "Resuming at post {}, tag {}, pair {} with {} stored tags",
            self.next_post, self.next_tag, self.next_pair, loaded
        );
        Ok(())
    }

    /// Create the Post record and one Tag record per tag
    ///
    /// Returns the id of the created post. A post without tags still gets a
    /// Post record.
    pub fn ingest(&mut self, post: &PostRecord) -> Result<u64, BuildError> {
        let (lon, lat) = match post.coordinates() {
            Some(coordinates) => {
                let (lon, lat) = coordinates.as_pair();
                (Some(lon), Some(lat))
            }
            None => (None, None),
        };

        let post_id = self.commit(Record::Post(PostRow {
            id: 0,
            text: post.redacted_text().to_string(),
            uid: post.author_id().map(str::to_string),
            time_zone: post.time_zone().map(str::to_string),
            lat,
            lon,
        }))?;

        for tag in post.tags() {
            let tag_id = self.commit(Record::Tag(TagRow {
                id: 0,
                text: tag.clone(),
                post: post_id,
            }))?;
            self.occurrences.push(TagOccurrence {
                tag_id,
                text: tag.clone(),
            });
        }

        Ok(post_id)
    }

    /// Ingest a post and pair its tags right away
    ///
    /// Each new occurrence is paired with every retained occurrence before
    /// it, including the post's own earlier tags. Occurrences stay retained
    /// for later posts.
    pub fn ingest_incremental(&mut self, post: &PostRecord) -> Result<u64, BuildError> {
        let start = self.occurrences.len();
        let post_id = self.ingest(post)?;

        let retained = std::mem::take(&mut self.occurrences);
        let result = self.pair_from(&retained, start);
        self.occurrences = retained;

        let pairs = result?;
        if pairs > 0 {
            debug!("Post {} added {} pairs", post_id, pairs);
        }
        Ok(post_id)
    }

    /// Pair every retained occurrence with every other, draining them
    ///
    /// The most recent occurrence is taken first and paired with each
    /// remaining one, oldest first, skipping equal texts. Returns the number
    /// of pairs created. History loaded from the store is paired with but
    /// not drained.
    ///
    /// On error the occurrences not yet drained are kept, and a later call
    /// continues after the last pair committed.
    pub fn build_pairs(&mut self) -> Result<usize, BuildError> {
        let mut pending = std::mem::take(&mut self.occurrences);
        let total = pending.len().saturating_sub(self.history);
        let mut created = 0;

        while pending.len() > self.history {
            let Some((latest, rest)) = pending.split_last() else {
                break;
            };
            let start = self.partial_drains.remove(&rest.len()).unwrap_or(0);
            match self.pair_latest(latest, rest, start) {
                Ok(count) => created += count,
                Err((committed, e)) => {
                    self.partial_drains.insert(rest.len(), committed);
                    self.occurrences = pending;
                    return Err(e);
                }
            }
            pending.pop();
        }
        self.occurrences = pending;

        info!("Built {} pairs from {} tag occurrences", created, total);
        Ok(created)
    }

    /// Every record created so far, in creation order
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Created records of one type
    pub fn records_of(&self, kind: RecordKind) -> impl Iterator<Item = &Record> {
        self.records.iter().filter(move |record| record.kind() == kind)
    }

    /// Occurrences not yet drained by [`build_pairs`](Self::build_pairs),
    /// stored history first
    pub fn occurrences(&self) -> &[TagOccurrence] {
        &self.occurrences
    }

    /// Id the next record of this type will try first
    pub fn next_id(&self, kind: RecordKind) -> u64 {
        match kind {
            RecordKind::Post => self.next_post,
            RecordKind::Tag => self.next_tag,
            RecordKind::TagPair => self.next_pair,
        }
    }

    /// Counters for this builder
    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    /// Builder configuration
    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Borrow the underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consume the builder, returning its store
    pub fn into_store(self) -> S {
        self.store
    }

    fn pair_from(&mut self, occurrences: &[TagOccurrence], start: usize) -> Result<usize, BuildError> {
        let mut created = 0;
        for (i, latest) in occurrences.iter().enumerate().skip(start) {
            for other in &occurrences[..i] {
                if other.text != latest.text {
                    self.commit_pair(latest, other)?;
                    created += 1;
                }
            }
        }
        Ok(created)
    }

    /// Pair `latest` with `rest[start..]`, returning how far it got on error
    fn pair_latest(
        &mut self,
        latest: &TagOccurrence,
        rest: &[TagOccurrence],
        start: usize,
    ) -> Result<usize, (usize, BuildError)> {
        let mut created = 0;
        for (i, other) in rest.iter().enumerate().skip(start) {
            if other.text != latest.text {
                self.commit_pair(latest, other).map_err(|e| (i, e))?;
                created += 1;
            }
        }
        Ok(created)
    }

    fn commit_pair(&mut self, tag1: &TagOccurrence, tag2: &TagOccurrence) -> Result<u64, BuildError> {
        self.commit(Record::TagPair(TagPairRow {
            id: 0,
            tag1: tag1.clone(),
            tag2: tag2.clone(),
            votes: 0,
        }))
    }

    /// Write a record at the next free id of its type
    fn commit(&mut self, mut record: Record) -> Result<u64, BuildError> {
        let kind = record.kind();
        let first = self.next_id(kind);
        let last = first.saturating_add(self.config.max_id_retries);
        let mut id = first;

        loop {
            record.set_id(id);
            match self.store.create(&record) {
                Ok(()) => break,
                Err(CreateError::Conflict { .. }) => {
                    self.stats.conflicts += 1;
                    if id >= last {
                        *self.counter_mut(kind) = id.saturating_add(1);
                        return Err(BuildError::AllocationExhausted { kind, first, last });
                    }
                    warn!("{} id {} already taken, trying {}", kind, id, id + 1);
                    id += 1;
                }
                Err(CreateError::Backend(e)) => return Err(BuildError::Store(e.to_string())),
            }
        }

        *self.counter_mut(kind) = id + 1;
        match kind {
            RecordKind::Post => self.stats.posts += 1,
            RecordKind::Tag => self.stats.tags += 1,
            RecordKind::TagPair => self.stats.pairs += 1,
        }
        if self.config.verbose {
            debug!("Created {} {}", kind, id);
        }

        self.records.push(record);
        Ok(id)
    }

    fn counter_mut(&mut self, kind: RecordKind) -> &mut u64 {
        match kind {
            RecordKind::Post => &mut self.next_post,
            RecordKind::Tag => &mut self.next_tag,
            RecordKind::TagPair => &mut self.next_pair,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn post(text: &str) -> PostRecord {
        PostRecord::new(text, None)
    }

    fn config(max_id_retries: u64) -> BuilderConfig {
        BuilderConfig {
            max_id_retries,
            ..BuilderConfig::quiet()
        }
    }

    #[test]
    fn test_ingest_assigns_sequential_ids() {
        let mut builder = RelationshipBuilder::default_config();

        assert_eq!(builder.ingest(&post("#a #b")).unwrap(), 1);
        assert_eq!(builder.ingest(&post("#c")).unwrap(), 2);

        let tags: Vec<_> = builder
            .records_of(RecordKind::Tag)
            .map(|r| match r {
                Record::Tag(row) => (row.id, row.text.as_str(), row.post),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(tags, vec![(1, "a", 1), (2, "b", 1), (3, "c", 2)]);
    }

    #[test]
    fn test_post_without_tags_advances_post_counter_once() {
        let mut builder = RelationshipBuilder::default_config();
        builder.ingest(&post("nothing here")).unwrap();

        assert_eq!(builder.next_id(RecordKind::Post), 2);
        assert_eq!(builder.next_id(RecordKind::Tag), 1);
        assert!(builder.occurrences().is_empty());
    }

    #[test]
    fn test_post_row_fields() {
        let metadata = json!({
            "user": {"id": 99, "time_zone": "Berlin"},
            "coordinates": {"type": "Point", "coordinates": [13.4, 52.5]},
        });
        let record = PostRecord::new("hi @bob #x", metadata.as_object());

        let mut builder = RelationshipBuilder::default_config();
        builder.ingest(&record).unwrap();

        match &builder.records()[0] {
            Record::Post(row) => {
                assert_eq!(row.text, "hi @xxxxxxxx #x");
                assert_eq!(row.uid.as_deref(), Some("99"));
                assert_eq!(row.time_zone.as_deref(), Some("Berlin"));
                assert_eq!(row.lon, Some(13.4));
                assert_eq!(row.lat, Some(52.5));
            }
            other => panic!("Expected post, got {:?}", other),
        }
    }

    #[test]
    fn test_build_pairs_order() {
        let mut builder = RelationshipBuilder::default_config();
        builder.ingest(&post("#a #b #c")).unwrap();
        assert_eq!(builder.build_pairs().unwrap(), 3);

        let pairs: Vec<_> = builder
            .records_of(RecordKind::TagPair)
            .map(|r| match r {
                Record::TagPair(row) => (row.id, row.tag1.text.as_str(), row.tag2.text.as_str()),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(pairs, vec![(1, "c", "a"), (2, "c", "b"), (3, "b", "a")]);
        assert!(builder.occurrences().is_empty());
    }

    #[test]
    fn test_build_pairs_twice_is_empty() {
        let mut builder = RelationshipBuilder::default_config();
        builder.ingest(&post("#a #b")).unwrap();
        assert_eq!(builder.build_pairs().unwrap(), 1);
        assert_eq!(builder.build_pairs().unwrap(), 0);
    }

    #[test]
    fn test_conflicts_are_skipped() {
        let mut store = MemoryStore::new();
        store.reserve(RecordKind::Post, [1, 2]);
        store.reserve(RecordKind::Tag, [2]);

        let mut builder = RelationshipBuilder::with_store(store, config(10));
        let id = builder.ingest(&post("#a #b")).unwrap();

        assert_eq!(id, 3);
        let tag_ids: Vec<_> = builder.records_of(RecordKind::Tag).map(Record::id).collect();
        assert_eq!(tag_ids, vec![1, 3]);
        assert_eq!(builder.stats().conflicts, 3);
        assert_eq!(builder.next_id(RecordKind::Post), 4);
    }

    #[test]
    fn test_pairs_reference_reallocated_tag_ids() {
        let mut store = MemoryStore::new();
        store.reserve(RecordKind::Tag, [1]);

        let mut builder = RelationshipBuilder::with_store(store, config(10));
        builder.ingest(&post("#a #b")).unwrap();
        builder.build_pairs().unwrap();

        match builder.records_of(RecordKind::TagPair).next() {
            Some(Record::TagPair(row)) => {
                assert_eq!(row.tag1.tag_id, 3);
                assert_eq!(row.tag2.tag_id, 2);
                assert_eq!(row.votes, 0);
            }
            other => panic!("Expected pair, got {:?}", other),
        };
    }

    #[test]
    fn test_allocation_exhausted() {
        let mut store = MemoryStore::new();
        store.reserve(RecordKind::Post, 1..=5);

        let mut builder = RelationshipBuilder::with_store(store, config(3));
        let err = builder.ingest(&post("#a")).unwrap_err();

        match err {
            BuildError::AllocationExhausted { kind, first, last } => {
                assert_eq!(kind, RecordKind::Post);
                assert_eq!(first, 1);
                assert_eq!(last, 4);
            }
            other => panic!("Expected exhaustion, got {:?}", other),
        }
        assert!(builder.records().is_empty());

        // The next attempt picks up where the window ended
        assert_eq!(builder.ingest(&post("#a")).unwrap(), 6);
    }

    #[test]
    fn test_build_pairs_keeps_occurrences_on_failure() {
        let mut store = MemoryStore::new();
        store.reserve(RecordKind::TagPair, [1, 2]);

        let mut builder = RelationshipBuilder::with_store(store, config(1));
        builder.ingest(&post("#a #b #c")).unwrap();

        assert!(matches!(
            builder.build_pairs(),
            Err(BuildError::AllocationExhausted { kind: RecordKind::TagPair, .. })
        ));
        assert_eq!(builder.occurrences().len(), 3);

        assert_eq!(builder.build_pairs().unwrap(), 3);
        assert!(builder.occurrences().is_empty());

        let mut pairs: Vec<_> = builder
            .records_of(RecordKind::TagPair)
            .map(|r| match r {
                Record::TagPair(row) => {
                    let mut ids = [row.tag1.tag_id, row.tag2.tag_id];
                    ids.sort_unstable();
                    ids
                }
                other => panic!("Expected pair, got {:?}", other),
            })
            .collect();
        pairs.sort_unstable();
        assert_eq!(pairs, vec![[1, 2], [1, 3], [2, 3]]);
    }

    #[test]
    fn test_build_pairs_fails_midway_then_continues() {
        let mut store = MemoryStore::new();
        store.reserve(RecordKind::TagPair, [2, 3]);

        let mut builder = RelationshipBuilder::with_store(store, config(1));
        builder.ingest(&post("#a #b #c")).unwrap();

        // c pairs with a at id 1, then b exhausts ids 2..=3
        assert!(builder.build_pairs().is_err());
        assert_eq!(builder.stats().pairs, 1);
        assert_eq!(builder.occurrences().len(), 3);

        assert_eq!(builder.build_pairs().unwrap(), 2);
        assert_eq!(builder.stats().pairs, 3);
        let ids: Vec<_> = builder.records_of(RecordKind::TagPair).map(Record::id).collect();
        assert_eq!(ids, vec![1, 4, 5]);
    }

    #[test]
    fn test_resume_pairs_new_tags_with_stored_tags() {
        let mut first = RelationshipBuilder::default_config();
        first.ingest(&post("#a #b")).unwrap();
        first.build_pairs().unwrap();

        let mut builder = RelationshipBuilder::with_store(first.into_store(), config(1));
        builder.resume_from_store().unwrap();
        assert_eq!(builder.occurrences().len(), 2);

        builder.ingest(&post("#c #a")).unwrap();
        // new a: pairs with c and stored b; new c: pairs with stored a and b
        assert_eq!(builder.build_pairs().unwrap(), 4);
        assert_eq!(builder.occurrences().len(), 2);
        assert_eq!(builder.build_pairs().unwrap(), 0);
        assert_eq!(builder.into_store().count(RecordKind::TagPair), 5);
    }

    #[test]
    fn test_resume_from_store() {
        let mut store = MemoryStore::new();
        store.reserve(RecordKind::Post, [7]);
        store.reserve(RecordKind::TagPair, [40]);

        let mut builder = RelationshipBuilder::with_store(store, config(1));
        builder.resume_from_store().unwrap();

        assert_eq!(builder.next_id(RecordKind::Post), 8);
        assert_eq!(builder.next_id(RecordKind::Tag), 1);
        assert_eq!(builder.next_id(RecordKind::TagPair), 41);
        assert_eq!(builder.stats().conflicts, 0);
    }

    #[test]
    fn test_incremental_pairs_against_history() {
        let mut builder = RelationshipBuilder::default_config();

        builder.ingest_incremental(&post("#a #b")).unwrap();
        assert_eq!(builder.stats().pairs, 1);

        builder.ingest_incremental(&post("#a #c")).unwrap();
        // new a: pairs with b; new c: pairs with a, b, a
        assert_eq!(builder.stats().pairs, 5);
        assert_eq!(builder.occurrences().len(), 4);
    }

    #[test]
    fn test_store_receives_records() {
        let mut builder = RelationshipBuilder::default_config();
        builder.ingest(&post("#a #b")).unwrap();
        builder.build_pairs().unwrap();

        let store = builder.into_store();
        assert_eq!(store.count(RecordKind::Post), 1);
        assert_eq!(store.count(RecordKind::Tag), 2);
        assert_eq!(store.count(RecordKind::TagPair), 1);
    }
}
