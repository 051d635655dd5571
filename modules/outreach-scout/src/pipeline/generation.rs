//! Generation coordinator: walk (city, partner type) pairs in a fixed order
//! and materialize each missing shard exactly once.
//!
//! A shard that already exists is never regenerated, so an interrupted run
//! resumes where it stopped and an overlapping run only fills gaps. A shard
//! is committed to the dedup index only after its file is written.

use std::collections::HashSet;
use std::time::Duration;

use tracing::{info, warn};

use outreach_common::{CitySeed, ContactRecord, OutreachError, PartnerType, ShardKey};

use crate::dedup::DedupIndex;
use crate::pipeline::stats::GenerationStats;
use crate::store::ShardStore;
use crate::traits::ContactGenerator;

#[derive(Debug, Clone)]
pub struct GenerationSettings {
    /// Records requested per shard; the shard is capped at this many.
    pub per_type: usize,
    /// Model calls per shard while fewer than `per_type` unique records
    /// have been collected.
    pub max_attempts: usize,
    /// Pause after every model call, successful or not.
    pub delay: Duration,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            per_type: 100,
            max_attempts: 1,
            delay: Duration::from_millis(600),
        }
    }
}

#[derive(Debug)]
pub enum ShardOutcome {
    Skipped,
    Written {
        received: usize,
        records: usize,
        duplicates: usize,
    },
    Failed(OutreachError),
}

pub struct GenerationCoordinator<'a> {
    store: &'a dyn ShardStore,
    generator: &'a dyn ContactGenerator,
    settings: GenerationSettings,
}

impl<'a> GenerationCoordinator<'a> {
    pub fn new(
        store: &'a dyn ShardStore,
        generator: &'a dyn ContactGenerator,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            store,
            generator,
            settings,
        }
    }

    /// Cities in the given order, partner types in their fixed order.
    pub fn plan(cities: &[CitySeed]) -> Vec<(&CitySeed, PartnerType)> {
        cities
            .iter()
            .flat_map(|city| PartnerType::ALL.into_iter().map(move |t| (city, t)))
            .collect()
    }

    /// Run every pair. Per-shard failures are logged and counted; the run
    /// always continues to the next pair.
    pub async fn run(
        &self,
        cities: &[CitySeed],
        mut index: DedupIndex,
    ) -> (DedupIndex, GenerationStats) {
        let plan = Self::plan(cities);
        let mut stats = GenerationStats {
            shards_planned: plan.len() as u32,
            ..Default::default()
        };

        info!(
            cities = cities.len(),
            shards = plan.len(),
            known_contacts = index.len(),
            "Generation starting"
        );

        for (i, (city, partner_type)) in plan.into_iter().enumerate() {
            info!(
                progress = format!("{}/{}", i + 1, stats.shards_planned).as_str(),
                city = city.slug.as_str(),
                partner_type = partner_type.as_str(),
                "Processing shard"
            );

            let (next, outcome) = self.generate_shard(city, partner_type, index, &mut stats).await;
            index = next;

            match outcome {
                ShardOutcome::Skipped => stats.shards_skipped += 1,
                ShardOutcome::Written {
                    received,
                    records,
                    duplicates,
                } => {
                    stats.shards_written += 1;
                    stats.records_received += received as u32;
                    stats.records_written += records as u32;
                    stats.duplicates_suppressed += duplicates as u32;
                }
                ShardOutcome::Failed(e) => {
                    warn!(city = city.slug.as_str(), partner_type = partner_type.as_str(), error = %e, "Shard not generated");
                    stats.shards_failed += 1;
                    stats.failed.push(ShardKey::new(&city.slug, partner_type));
                }
            }
        }

        (index, stats)
    }

    /// Materialize one shard if it does not exist yet.
    pub async fn generate_shard(
        &self,
        city: &CitySeed,
        partner_type: PartnerType,
        mut index: DedupIndex,
        stats: &mut GenerationStats,
    ) -> (DedupIndex, ShardOutcome) {
        let key = ShardKey::new(&city.slug, partner_type);

        if self.store.exists(&key) {
            info!(shard = %key, "Shard exists, skipping");
            return (index, ShardOutcome::Skipped);
        }

        let target = self.settings.per_type;
        let mut staged: Vec<ContactRecord> = Vec::new();
        let mut staged_keys = HashSet::new();
        let mut received = 0usize;
        let mut duplicates = 0usize;

        for attempt in 1..=self.settings.max_attempts.max(1) {
            if staged.len() >= target {
                break;
            }

            let result = self.generator.generate(city, partner_type, target).await;
            stats.collaborator_calls += 1;
            tokio::time::sleep(self.settings.delay).await;

            let candidates = match result {
                Ok(candidates) => candidates,
                Err(e) => {
                    let failure = OutreachError::Generation {
                        shard: key.to_string(),
                        message: format!("attempt {attempt}: {e:#}"),
                    };
                    return (index, ShardOutcome::Failed(failure));
                }
            };

            received += candidates.len();
            for candidate in candidates {
                let record = stamp(candidate, city, partner_type);
                let natural_key = record.natural_key();
                let seen_in_shard = natural_key
                    .as_ref()
                    .is_some_and(|k| staged_keys.contains(k));
                if index.contains(&record) || seen_in_shard {
                    duplicates += 1;
                    continue;
                }
                if let Some(k) = natural_key {
                    staged_keys.insert(k);
                }
                staged.push(record);
            }
        }

        staged.truncate(target);

        if let Err(e) = self.store.write(&key, &staged) {
            return (index, ShardOutcome::Failed(e));
        }

        for record in &staged {
            index.register(record);
        }

        if staged.is_empty() {
            warn!(shard = %key, received, duplicates, "Wrote empty shard");
        } else {
            info!(
                shard = %key,
                received,
                written = staged.len(),
                duplicates,
                "Shard written"
            );
        }

        (
            index,
            ShardOutcome::Written {
                received,
                records: staged.len(),
                duplicates,
            },
        )
    }
}

/// Pin a generated record to its shard: country, language, city and type
/// come from the seed regardless of what the model returned.
pub fn stamp(record: ContactRecord, city: &CitySeed, partner_type: PartnerType) -> ContactRecord {
    let clean = |s: String| s.trim().to_string();
    ContactRecord {
        name: clean(record.name),
        email: clean(record.email),
        country: city.iso3.clone(),
        language: city.language.clone(),
        city: city.name.clone(),
        instagram: clean(record.instagram),
        twitter: clean(record.twitter),
        phone: clean(record.phone),
        organization: clean(record.organization),
        partner_type,
        notes: clean(record.notes),
    }
}
