pub mod generator;
pub mod prompts;
pub mod reconciler;

pub use generator::OpenAiGenerator;
pub use reconciler::OpenAiReconciler;
