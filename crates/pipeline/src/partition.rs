//! Three-way split of one run's query results against the ledger snapshot.

use std::collections::HashSet;

use crate::{ArticleId, ArticleRecord};

/// Identifiers already recorded in the ledger when the run started.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeenSet(HashSet<ArticleId>);

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &ArticleId) -> bool {
        self.0.contains(id)
    }

    /// Adds `id`, returning `false` if it was already present.
    pub fn insert(&mut self, id: ArticleId) -> bool {
        self.0.insert(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<ArticleId> for SeenSet {
    fn from_iter<I: IntoIterator<Item = ArticleId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Query results split into `seen`, `skippable`, and `new`.
///
/// Computed once against the snapshot; appends made later in the run do not
/// move records between partitions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunBatch {
    /// Already in the ledger, or a repeat of an earlier record in this batch.
    pub seen: Vec<ArticleRecord>,
    /// Not in the ledger and without an abstract. Left unrecorded so the
    /// article is reconsidered once it gains one.
    pub skippable: Vec<ArticleRecord>,
    /// Everything else, in query order.
    pub new: Vec<ArticleRecord>,
}

impl RunBatch {
    pub fn partition(records: Vec<ArticleRecord>, snapshot: &SeenSet) -> Self {
        let mut batch = RunBatch::default();
        let mut in_batch: HashSet<ArticleId> = HashSet::new();

        for record in records {
            if snapshot.contains(&record.id) || !in_batch.insert(record.id.clone()) {
                batch.seen.push(record);
            } else if record.lacks_abstract() {
                batch.skippable.push(record);
            } else {
                batch.new.push(record);
            }
        }
        batch
    }

    pub fn total(&self) -> usize {
        self.seen.len() + self.skippable.len() + self.new.len()
    }
}
