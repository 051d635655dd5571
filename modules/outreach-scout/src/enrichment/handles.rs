use regex::Regex;
use std::sync::LazyLock;

/// Terminal negative answer. Written verbatim and never retried.
pub const NOT_FOUND: &str = "not_found";
/// Ambiguous answer left for human review. Written verbatim.
pub const NOT_SURE: &str = "not_sure";

static RE_TWITTER_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:https?://)?(?:www\.|mobile\.)?(?:twitter|x)\.com/@?([A-Za-z0-9_]+)").unwrap()
});
static RE_HANDLE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]{1,15}$").unwrap());

const TWITTER_SKIP: &[&str] = &["intent", "share", "hashtag", "search", "i", "home"];

/// Classification of one reconciler answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleMatch {
    Resolved(String),
    NotFound,
    NotSure,
}

impl HandleMatch {
    /// Blank answers and anything that is not a plausible handle count as
    /// `NotSure`.
    pub fn parse(raw: &str) -> Self {
        let answer = raw.trim();
        match answer.to_lowercase().as_str() {
            NOT_FOUND => return HandleMatch::NotFound,
            NOT_SURE | "" => return HandleMatch::NotSure,
            _ => {}
        }

        let candidate = match RE_TWITTER_URL.captures(answer) {
            Some(caps) => caps[1].to_string(),
            None => answer.trim_start_matches('@').to_string(),
        };

        if TWITTER_SKIP.contains(&candidate.to_lowercase().as_str()) || !RE_HANDLE.is_match(&candidate) {
            return HandleMatch::NotSure;
        }
        HandleMatch::Resolved(format!("@{candidate}"))
    }

    /// Value stored in the record's Twitter column.
    pub fn field_value(&self) -> String {
        match self {
            HandleMatch::Resolved(handle) => handle.clone(),
            HandleMatch::NotFound => NOT_FOUND.to_string(),
            HandleMatch::NotSure => NOT_SURE.to_string(),
        }
    }
}
