//! Fill in missing Twitter handles in fixed-size batches.
//!
//! Only records whose Twitter column is empty are sent, so earlier answers
//! (resolved handles, `not_found`, `not_sure`) are never revisited. A batch
//! whose answers do not line up one-to-one with its records is discarded
//! whole and its records stay untouched.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use tracing::{info, warn};

use outreach_common::{ContactRecord, OutreachError, ShardKey};

use crate::enrichment::handles::HandleMatch;
use crate::store::{read_contacts_file, write_contacts, ShardStore};
use crate::traits::{HandleReconciler, ReconcileQuery};

#[derive(Debug, Clone)]
pub struct EnrichmentSettings {
    pub batch_size: usize,
    /// Pause between consecutive batches.
    pub delay: Duration,
}

impl Default for EnrichmentSettings {
    fn default() -> Self {
        Self {
            batch_size: 20,
            delay: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct EnrichmentStats {
    pub candidates: u32,
    pub batches: u32,
    pub batches_mismatched: u32,
    pub batches_failed: u32,
    pub resolved: u32,
    pub not_found: u32,
    pub not_sure: u32,
    pub shards_rewritten: u32,
    /// Shards left alone because they could not be read back exactly or
    /// could not be written.
    pub shards_failed: u32,
}

impl fmt::Display for EnrichmentStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Enrichment: {} candidates in {} batches ({} mismatched, {} failed); {} resolved, {} not_found, {} not_sure",
            self.candidates,
            self.batches,
            self.batches_mismatched,
            self.batches_failed,
            self.resolved,
            self.not_found,
            self.not_sure,
        )?;
        if self.shards_rewritten > 0 || self.shards_failed > 0 {
            write!(
                f,
                "; {} shards rewritten, {} shards not rewritten",
                self.shards_rewritten, self.shards_failed
            )?;
        }
        Ok(())
    }
}

pub struct Enricher<'a> {
    reconciler: &'a dyn HandleReconciler,
    settings: EnrichmentSettings,
}

impl<'a> Enricher<'a> {
    pub fn new(reconciler: &'a dyn HandleReconciler, settings: EnrichmentSettings) -> Self {
        Self {
            reconciler,
            settings,
        }
    }

    /// Enrich a flat record set in place.
    pub async fn enrich(&self, records: &mut [ContactRecord]) -> EnrichmentStats {
        let pending: Vec<usize> = (0..records.len())
            .filter(|&i| records[i].lacks_twitter())
            .collect();
        let queries: Vec<ReconcileQuery> = pending.iter().map(|&i| (&records[i]).into()).collect();

        let mut stats = EnrichmentStats::default();
        let answers = self.classify(&queries, &mut stats).await;

        for (&i, answer) in pending.iter().zip(answers) {
            if let Some(answer) = answer {
                records[i].twitter = answer.field_value();
            }
        }
        stats
    }

    /// Enrich every shard in the store, batching across shard boundaries and
    /// rewriting only the shards that changed.
    pub async fn enrich_shards(
        &self,
        store: &dyn ShardStore,
    ) -> Result<EnrichmentStats, OutreachError> {
        let mut shards: Vec<(ShardKey, Vec<ContactRecord>)> = Vec::new();
        let mut stats = EnrichmentStats::default();
        for key in store.keys()? {
            match store.read_for_rewrite(&key) {
                Ok(records) => shards.push((key, records)),
                Err(e) => {
                    warn!(shard = %key, error = %e, "Shard left out of enrichment");
                    stats.shards_failed += 1;
                }
            }
        }

        let pending: Vec<(usize, usize)> = shards
            .iter()
            .enumerate()
            .flat_map(|(s, (_, records))| {
                records
                    .iter()
                    .enumerate()
                    .filter(|(_, r)| r.lacks_twitter())
                    .map(move |(r, _)| (s, r))
            })
            .collect();
        let queries: Vec<ReconcileQuery> = pending
            .iter()
            .map(|&(s, r)| (&shards[s].1[r]).into())
            .collect();

        let answers = self.classify(&queries, &mut stats).await;

        let mut touched = BTreeSet::new();
        for (&(s, r), answer) in pending.iter().zip(answers) {
            if let Some(answer) = answer {
                shards[s].1[r].twitter = answer.field_value();
                touched.insert(s);
            }
        }

        for s in touched {
            let (key, records) = &shards[s];
            match store.write(key, records) {
                Ok(()) => stats.shards_rewritten += 1,
                Err(e) => {
                    warn!(shard = %key, error = %e, "Failed to write enriched shard");
                    stats.shards_failed += 1;
                }
            }
        }

        Ok(stats)
    }

    /// Enrich a standalone contacts file, such as the merged output. A file
    /// with rows that would not survive a rewrite is refused up front.
    pub async fn enrich_file(&self, path: &Path) -> Result<EnrichmentStats, OutreachError> {
        let mut records = read_contacts_file(path)?.into_rewritable()?;
        let stats = self.enrich(&mut records).await;
        if stats.resolved + stats.not_found + stats.not_sure > 0 {
            write_contacts(path, &records)?;
        }
        Ok(stats)
    }

    /// One answer slot per query; `None` where the batch was discarded.
    async fn classify(
        &self,
        queries: &[ReconcileQuery],
        stats: &mut EnrichmentStats,
    ) -> Vec<Option<HandleMatch>> {
        stats.candidates = queries.len() as u32;
        let mut answers = vec![None; queries.len()];
        let batch_size = self.settings.batch_size.max(1);

        info!(
            candidates = queries.len(),
            batch_size,
            "Enrichment starting"
        );

        for (batch_no, batch) in queries.chunks(batch_size).enumerate() {
            if batch_no > 0 {
                tokio::time::sleep(self.settings.delay).await;
            }
            stats.batches += 1;

            let matches = match self.reconcile_batch(batch_no, batch).await {
                Ok(matches) => matches,
                Err(e) => {
                    if matches!(e, OutreachError::ReconciliationMismatch { .. }) {
                        stats.batches_mismatched += 1;
                    } else {
                        stats.batches_failed += 1;
                    }
                    warn!(batch = batch_no, size = batch.len(), error = %e, "Batch left unmodified");
                    continue;
                }
            };

            let offset = batch_no * batch_size;
            for (i, answer) in matches.into_iter().enumerate() {
                match answer {
                    HandleMatch::Resolved(_) => stats.resolved += 1,
                    HandleMatch::NotFound => stats.not_found += 1,
                    HandleMatch::NotSure => stats.not_sure += 1,
                }
                answers[offset + i] = Some(answer);
            }
            info!(batch = batch_no, size = batch.len(), "Batch reconciled");
        }

        answers
    }

    async fn reconcile_batch(
        &self,
        batch_no: usize,
        batch: &[ReconcileQuery],
    ) -> Result<Vec<HandleMatch>, OutreachError> {
        let raw = self.reconciler.reconcile(batch).await?;
        if raw.len() != batch.len() {
            return Err(OutreachError::ReconciliationMismatch {
                batch: batch_no,
                expected: batch.len(),
                actual: raw.len(),
            });
        }
        Ok(raw.iter().map(|answer| HandleMatch::parse(answer)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{contact, MockReconciler};

    fn settings(batch_size: usize) -> EnrichmentSettings {
        EnrichmentSettings {
            batch_size,
            delay: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn only_blank_handles_are_sent() {
        let mut records = vec![
            contact("Known", "k@x.org", ""),
            contact("Blank", "b@x.org", ""),
            contact("Unsure", "u@x.org", ""),
        ];
        records[0].twitter = "@known".into();
        records[2].twitter = "not_sure".into();

        let reconciler = MockReconciler::new().answer("Blank", "@blank");
        let stats = Enricher::new(&reconciler, settings(10)).enrich(&mut records).await;

        assert_eq!(stats.candidates, 1);
        assert_eq!(records[0].twitter, "@known");
        assert_eq!(records[1].twitter, "@blank");
        assert_eq!(records[2].twitter, "not_sure");
        assert_eq!(reconciler.calls()[0].len(), 1);
    }

    #[tokio::test]
    async fn every_record_in_a_good_batch_is_classified() {
        let mut records: Vec<_> = (0..5)
            .map(|i| contact(&format!("P{i}"), &format!("p{i}@x.org"), ""))
            .collect();
        let reconciler = MockReconciler::new()
            .answer("P0", "p0_handle")
            .answer("P1", "not_sure")
            .answer("P3", "https://twitter.com/p3");

        let stats = Enricher::new(&reconciler, settings(2)).enrich(&mut records).await;

        assert_eq!(stats.batches, 3);
        assert_eq!((stats.resolved, stats.not_found, stats.not_sure), (2, 2, 1));
        let handles: Vec<_> = records.iter().map(|r| r.twitter.as_str()).collect();
        assert_eq!(handles, vec!["@p0_handle", "not_sure", "not_found", "@p3", "not_found"]);
    }

    #[tokio::test]
    async fn short_response_leaves_batch_unmodified() {
        let mut records: Vec<_> = (0..4)
            .map(|i| contact(&format!("P{i}"), &format!("p{i}@x.org"), ""))
            .collect();
        let reconciler = MockReconciler::new().short_on_call(1);

        let stats = Enricher::new(&reconciler, settings(2)).enrich(&mut records).await;

        assert_eq!(stats.batches_mismatched, 1);
        assert_eq!(records[0].twitter, "not_found");
        assert_eq!(records[1].twitter, "not_found");
        assert!(records[2].lacks_twitter());
        assert!(records[3].lacks_twitter());
    }

    #[tokio::test]
    async fn collaborator_error_leaves_batch_unmodified() {
        let mut records = vec![contact("A", "a@x.org", ""), contact("B", "b@x.org", "")];
        let reconciler = MockReconciler::new().fail_on_call(0);

        let stats = Enricher::new(&reconciler, settings(1)).enrich(&mut records).await;

        assert_eq!(stats.batches_failed, 1);
        assert!(records[0].lacks_twitter());
        assert_eq!(records[1].twitter, "not_found");
    }
}
