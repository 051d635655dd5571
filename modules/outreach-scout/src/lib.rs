pub mod dedup;
pub mod enrichment;
pub mod llm;
pub mod matcher;
pub mod pipeline;
pub mod store;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;
