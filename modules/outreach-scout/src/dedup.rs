//! Global duplicate suppression by natural key.
//!
//! The index is an owned value: built once from everything already on disk,
//! then threaded through the generation run and updated as each shard is
//! committed, so suppression spans every shard rather than one at a time.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use tracing::{info, warn};

use outreach_common::{ContactRecord, NaturalKey, OutreachError};

use crate::store::ShardStore;

#[derive(Debug, Clone, Default)]
pub struct DedupIndex {
    seen: HashMap<NaturalKey, ContactRecord>,
}

impl DedupIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan every shard in the store. An unreadable shard is logged and
    /// skipped; an unreadable store is an error.
    pub fn from_store(store: &dyn ShardStore) -> Result<Self, OutreachError> {
        let mut index = Self::new();
        let keys = store.keys()?;
        let mut records = 0usize;
        let mut duplicates = 0usize;

        for key in &keys {
            let shard = match store.read(key) {
                Ok(shard) => shard,
                Err(e) => {
                    warn!(shard = %key, error = %e, "Unreadable shard left out of dedup index");
                    continue;
                }
            };
            for record in shard {
                records += 1;
                if !index.register(&record) {
                    duplicates += 1;
                }
            }
        }

        info!(
            shards = keys.len(),
            records,
            unique_keys = index.len(),
            duplicates,
            "Dedup index built from existing shards"
        );
        Ok(index)
    }

    /// Insert a record. Returns false when its natural key is already taken.
    /// Records without a natural key are always accepted and never stored.
    pub fn register(&mut self, record: &ContactRecord) -> bool {
        let Some(key) = record.natural_key() else {
            return true;
        };
        match self.seen.entry(key) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                true
            }
        }
    }

    pub fn contains(&self, record: &ContactRecord) -> bool {
        record
            .natural_key()
            .is_some_and(|key| self.seen.contains_key(&key))
    }

    /// The first record registered under the same natural key.
    pub fn representative(&self, record: &ContactRecord) -> Option<&ContactRecord> {
        record.natural_key().and_then(|key| self.seen.get(&key))
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
