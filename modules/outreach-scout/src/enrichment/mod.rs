pub mod handles;
pub mod reconciler;

pub use handles::{HandleMatch, NOT_FOUND, NOT_SURE};
pub use reconciler::{EnrichmentSettings, EnrichmentStats, Enricher};
