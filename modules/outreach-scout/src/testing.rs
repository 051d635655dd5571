// Test doubles for the scout pipeline.
//
// Three mocks matching the three boundaries:
// - MemoryShardStore (ShardStore): BTreeMap-backed shards, optional write failures
// - MockGenerator (ContactGenerator): scripted responses per shard, in call order
// - MockReconciler (HandleReconciler): answers by name, optional short or failed calls
//
// Plus `contact()` for building records.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use outreach_common::{CitySeed, ContactRecord, OutreachError, PartnerType, ShardKey};

use crate::enrichment::NOT_FOUND;
use crate::store::ShardStore;
use crate::traits::{ContactGenerator, HandleReconciler, ReconcileQuery};

/// A record with just the identifying fields set.
pub fn contact(name: &str, email: &str, instagram: &str) -> ContactRecord {
    ContactRecord {
        name: name.to_string(),
        email: email.to_string(),
        instagram: instagram.to_string(),
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// MemoryShardStore
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryShardStore {
    shards: Mutex<BTreeMap<ShardKey, Vec<ContactRecord>>>,
    failing_writes: HashSet<ShardKey>,
    unreadable: HashSet<ShardKey>,
}

impl MemoryShardStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shard(self, key: ShardKey, records: Vec<ContactRecord>) -> Self {
        self.shards.lock().unwrap().insert(key, records);
        self
    }

    pub fn fail_writes_for(mut self, key: ShardKey) -> Self {
        self.failing_writes.insert(key);
        self
    }

    /// The shard is listed but every read of it fails.
    pub fn unreadable(mut self, key: ShardKey) -> Self {
        self.shards.lock().unwrap().insert(key.clone(), Vec::new());
        self.unreadable.insert(key);
        self
    }
}

impl ShardStore for MemoryShardStore {
    fn exists(&self, key: &ShardKey) -> bool {
        self.shards.lock().unwrap().contains_key(key)
    }

    fn read(&self, key: &ShardKey) -> Result<Vec<ContactRecord>, OutreachError> {
        if self.unreadable.contains(key) {
            return Err(OutreachError::persistence(key.to_string(), "unreadable"));
        }
        self.shards
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| OutreachError::persistence(key.to_string(), "no such shard"))
    }

    fn write(&self, key: &ShardKey, records: &[ContactRecord]) -> Result<(), OutreachError> {
        if self.failing_writes.contains(key) {
            return Err(OutreachError::persistence(key.to_string(), "disk full"));
        }
        self.shards
            .lock()
            .unwrap()
            .insert(key.clone(), records.to_vec());
        Ok(())
    }

    fn keys(&self) -> Result<Vec<ShardKey>, OutreachError> {
        Ok(self.shards.lock().unwrap().keys().cloned().collect())
    }
}

// ---------------------------------------------------------------------------
// MockGenerator
// ---------------------------------------------------------------------------

/// Scripted generator. Each `.on()` / `.fail()` queues one response for a
/// shard; calls beyond the script return `Err`.
#[derive(Default)]
pub struct MockGenerator {
    script: Mutex<HashMap<ShardKey, VecDeque<Result<Vec<ContactRecord>, String>>>>,
    calls: Mutex<Vec<ShardKey>>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, city_slug: &str, partner_type: PartnerType, records: Vec<ContactRecord>) -> Self {
        self.push(city_slug, partner_type, Ok(records));
        self
    }

    pub fn fail(self, city_slug: &str, partner_type: PartnerType, message: &str) -> Self {
        self.push(city_slug, partner_type, Err(message.to_string()));
        self
    }

    /// Queue the same response for every partner type of a city.
    pub fn on_city(mut self, city_slug: &str, records: Vec<ContactRecord>) -> Self {
        for partner_type in PartnerType::ALL {
            self = self.on(city_slug, partner_type, records.clone());
        }
        self
    }

    fn push(&self, city_slug: &str, partner_type: PartnerType, response: Result<Vec<ContactRecord>, String>) {
        self.script
            .lock()
            .unwrap()
            .entry(ShardKey::new(city_slug, partner_type))
            .or_default()
            .push_back(response);
    }

    pub fn calls(&self) -> Vec<ShardKey> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContactGenerator for MockGenerator {
    async fn generate(
        &self,
        city: &CitySeed,
        partner_type: PartnerType,
        _count: usize,
    ) -> Result<Vec<ContactRecord>> {
        let key = ShardKey::new(&city.slug, partner_type);
        self.calls.lock().unwrap().push(key.clone());

        let next = self
            .script
            .lock()
            .unwrap()
            .get_mut(&key)
            .and_then(|queue| queue.pop_front());

        match next {
            Some(Ok(records)) => Ok(records),
            Some(Err(message)) => Err(anyhow!("MockGenerator: {message}")),
            None => Err(anyhow!("MockGenerator: no response scripted for {key}")),
        }
    }
}

// ---------------------------------------------------------------------------
// MockReconciler
// ---------------------------------------------------------------------------

/// Answers by contact name, `not_found` for anyone unlisted.
#[derive(Default)]
pub struct MockReconciler {
    answers: HashMap<String, String>,
    short_calls: HashSet<usize>,
    failing_calls: HashSet<usize>,
    calls: Mutex<Vec<Vec<ReconcileQuery>>>,
}

impl MockReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(mut self, name: &str, handle: &str) -> Self {
        self.answers.insert(name.to_string(), handle.to_string());
        self
    }

    /// The nth call (0-based) drops its last answer.
    pub fn short_on_call(mut self, call: usize) -> Self {
        self.short_calls.insert(call);
        self
    }

    /// The nth call (0-based) returns an error.
    pub fn fail_on_call(mut self, call: usize) -> Self {
        self.failing_calls.insert(call);
        self
    }

    pub fn calls(&self) -> Vec<Vec<ReconcileQuery>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl HandleReconciler for MockReconciler {
    async fn reconcile(&self, batch: &[ReconcileQuery]) -> Result<Vec<String>> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(batch.to_vec());
            calls.len() - 1
        };

        if self.failing_calls.contains(&call) {
            return Err(anyhow!("MockReconciler: call {call} failed"));
        }

        let mut answers: Vec<String> = batch
            .iter()
            .map(|q| {
                self.answers
                    .get(&q.name)
                    .cloned()
                    .unwrap_or_else(|| NOT_FOUND.to_string())
            })
            .collect();

        if self.short_calls.contains(&call) {
            answers.pop();
        }
        Ok(answers)
    }
}
