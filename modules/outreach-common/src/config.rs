use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::info;

use crate::error::OutreachError;

pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_PER_TYPE: usize = 100;
pub const DEFAULT_GENERATION_DELAY_SECS: f64 = 0.6;
pub const DEFAULT_BATCH_SIZE: usize = 20;
pub const DEFAULT_ENRICHMENT_DELAY_SECS: f64 = 1.0;

/// Run configuration: the API credential from the environment plus the
/// settings chosen on the command line.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub model: String,

    // Generation
    pub output_root: PathBuf,
    pub per_type: usize,
    pub max_attempts: usize,
    pub generation_delay: Duration,

    // Merge
    pub merge_output: PathBuf,

    // Enrichment
    pub batch_size: usize,
    pub enrichment_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openai_api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            output_root: PathBuf::from("out"),
            per_type: DEFAULT_PER_TYPE,
            max_attempts: 1,
            generation_delay: Duration::from_secs_f64(DEFAULT_GENERATION_DELAY_SECS),
            merge_output: PathBuf::from("merged_contacts.csv"),
            batch_size: DEFAULT_BATCH_SIZE,
            enrichment_delay: Duration::from_secs_f64(DEFAULT_ENRICHMENT_DELAY_SECS),
        }
    }
}

impl Config {
    /// Configuration for modes that call the model. Requires `OPENAI_API_KEY`.
    pub fn from_env() -> Result<Self, OutreachError> {
        Ok(Self {
            openai_api_key: required_env("OPENAI_API_KEY")?,
            ..Self::default()
        })
    }

    /// Configuration for merge-only runs, which never call the model.
    pub fn offline() -> Self {
        Self::default()
    }

    /// Reject settings that would make a run meaningless.
    pub fn validate(&self) -> Result<(), OutreachError> {
        if self.per_type == 0 {
            return Err(OutreachError::Config("per-type count must be at least 1".into()));
        }
        if self.max_attempts == 0 {
            return Err(OutreachError::Config("max attempts must be at least 1".into()));
        }
        if self.batch_size == 0 {
            return Err(OutreachError::Config("batch size must be at least 1".into()));
        }
        if self.model.trim().is_empty() {
            return Err(OutreachError::Config("model must not be empty".into()));
        }
        Ok(())
    }

    pub fn log_redacted(&self) {
        info!(
            model = self.model.as_str(),
            output_root = %self.output_root.display(),
            per_type = self.per_type,
            max_attempts = self.max_attempts,
            generation_delay_ms = self.generation_delay.as_millis() as u64,
            merge_output = %self.merge_output.display(),
            batch_size = self.batch_size,
            enrichment_delay_ms = self.enrichment_delay.as_millis() as u64,
            api_key_set = !self.openai_api_key.is_empty(),
            "Configuration loaded"
        );
    }
}

/// Parse a non-negative number of seconds, as given on the command line.
pub fn parse_delay(raw: &str) -> Result<Duration, OutreachError> {
    let secs: f64 = raw
        .trim()
        .parse()
        .map_err(|_| OutreachError::Config(format!("invalid delay: {raw}")))?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(OutreachError::Config(format!("delay must be >= 0: {raw}")));
    }
    Ok(Duration::from_secs_f64(secs))
}

fn required_env(key: &str) -> Result<String, OutreachError> {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| OutreachError::Config(format!("{key} environment variable is required")))
}
