// Collaborator boundaries for the two model-backed steps.
//
// ContactGenerator: proposes contacts for one (city, partner type) shard.
// HandleReconciler: looks up Twitter/X handles for a batch of contacts.
//
// The OpenAI implementations live in `llm`; `testing` has scripted mocks so
// the coordinator and reconciler run without network access.

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

use outreach_common::{CitySeed, ContactRecord, PartnerType};

#[async_trait]
pub trait ContactGenerator: Send + Sync {
    /// Best effort: may return fewer than `count` records, or fail.
    async fn generate(
        &self,
        city: &CitySeed,
        partner_type: PartnerType,
        count: usize,
    ) -> Result<Vec<ContactRecord>>;
}

/// What the reconciler is told about each contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileQuery {
    pub name: String,
    pub organization: String,
    pub city: String,
    pub country: String,
}

impl From<&ContactRecord> for ReconcileQuery {
    fn from(record: &ContactRecord) -> Self {
        Self {
            name: record.name.clone(),
            organization: record.organization.clone(),
            city: record.city.clone(),
            country: record.country.clone(),
        }
    }
}

#[async_trait]
pub trait HandleReconciler: Send + Sync {
    /// One answer per query, in order: a handle, `not_found` or `not_sure`.
    async fn reconcile(&self, batch: &[ReconcileQuery]) -> Result<Vec<String>>;
}
