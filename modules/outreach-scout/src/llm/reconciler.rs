use ai_client::OpenAi;
use anyhow::{bail, Result};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;

use crate::llm::prompts::{reconcile_user_prompt, RECONCILE_SYSTEM_PROMPT};
use crate::traits::{HandleReconciler, ReconcileQuery};

/// Response schema for handle reconciliation.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct HandleAnswers {
    pub matches: Vec<HandleAnswer>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct HandleAnswer {
    /// The contact's name, echoed from the input
    pub name: String,
    /// "@handle", "not_found" or "not_sure"
    pub handle: String,
}

pub struct OpenAiReconciler {
    ai: OpenAi,
}

impl OpenAiReconciler {
    pub fn new(ai: OpenAi) -> Self {
        Self { ai }
    }
}

#[async_trait]
impl HandleReconciler for OpenAiReconciler {
    async fn reconcile(&self, batch: &[ReconcileQuery]) -> Result<Vec<String>> {
        let answers: HandleAnswers = self
            .ai
            .extract(
                "handle_matches",
                RECONCILE_SYSTEM_PROMPT,
                reconcile_user_prompt(batch),
            )
            .await?;

        aligned_handles(batch, answers.matches)
    }
}

/// Keep answers only if each one names the contact at its position. A
/// length difference is passed through for the caller to reject.
fn aligned_handles(batch: &[ReconcileQuery], answers: Vec<HandleAnswer>) -> Result<Vec<String>> {
    if answers.len() == batch.len() {
        for (i, (query, answer)) in batch.iter().zip(&answers).enumerate() {
            if comparable(&query.name) != comparable(&answer.name) {
                bail!(
                    "answer {} is for {:?}, expected {:?}",
                    i + 1,
                    answer.name,
                    query.name
                );
            }
        }
    }
    Ok(answers.into_iter().map(|a| a.handle).collect())
}

fn comparable(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
