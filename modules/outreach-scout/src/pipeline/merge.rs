//! Fold every shard into one deduplicated contacts file.
//!
//! Shards are read in dataset order and the first record seen for a natural
//! key wins, so re-running without shard changes reproduces the file byte
//! for byte.

use std::path::Path;

use tracing::{info, warn};

use outreach_common::{ContactRecord, OutreachError};

use crate::dedup::DedupIndex;
use crate::pipeline::stats::MergeStats;
use crate::store::{write_contacts, ShardStore};

/// Read and deduplicate every shard without writing anything.
pub fn merge_records(
    store: &dyn ShardStore,
) -> Result<(Vec<ContactRecord>, MergeStats), OutreachError> {
    let mut stats = MergeStats::default();
    let mut index = DedupIndex::new();
    let mut merged = Vec::new();

    for key in store.keys()? {
        let shard = match store.read(&key) {
            Ok(shard) => shard,
            Err(e) => {
                warn!(shard = %key, error = %e, "Skipping unreadable shard");
                stats.shards_unreadable += 1;
                continue;
            }
        };
        stats.shards_read += 1;

        for record in shard {
            stats.records_read += 1;
            if index.register(&record) {
                merged.push(record);
            } else {
                stats.duplicates += 1;
            }
        }
    }

    stats.records_written = merged.len() as u32;
    Ok((merged, stats))
}

/// Merge the dataset into `output`. Nothing is written when the dataset
/// holds no records.
pub fn merge_dataset(store: &dyn ShardStore, output: &Path) -> Result<MergeStats, OutreachError> {
    let (merged, stats) = merge_records(store)?;

    if merged.is_empty() {
        if output.exists() {
            warn!(
                output = %output.display(),
                "No contacts found to merge; existing merged file left as is and may be stale"
            );
        } else {
            info!(output = %output.display(), "No contacts found to merge");
        }
        return Ok(stats);
    }

    write_contacts(output, &merged)?;
    info!(
        output = %output.display(),
        records = merged.len(),
        duplicates = stats.duplicates,
        "Merged contacts written"
    );
    Ok(stats)
}
