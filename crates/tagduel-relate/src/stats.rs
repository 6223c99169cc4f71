//! Counters for builder runs

/// Records created by a builder, plus id conflicts it stepped over
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Posts created
    pub posts: usize,

    /// Tags created
    pub tags: usize,

    /// Tag pairs created
    pub pairs: usize,

    /// Ids skipped because the store already held them
    pub conflicts: usize,
}

impl BuildStats {
    /// Create empty stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Total records created
    pub fn total_records(&self) -> usize {
        self.posts + self.tags + self.pairs
    }

    /// Reset all counters
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// One-line summary for logs
    pub fn summary(&self) -> String {
        format!(
            "{} posts, {} tags, {} pairs ({} id conflicts)",
            self.posts, self.tags, self.pairs, self.conflicts
        )
    }
}
