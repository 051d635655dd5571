//! Resolve user-supplied city tokens against the known seed list.
//!
//! A token matches every slug that contains its normalized form. Matching
//! targets the intended city set, not whatever already exists on disk.

use std::collections::HashSet;

use tracing::{info, warn};

use outreach_common::{normalize, CitySeed, OutreachError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    NoMatch,
    OneMatch(String),
    ManyMatches(Vec<String>),
}

impl MatchOutcome {
    pub fn slugs(&self) -> &[String] {
        match self {
            MatchOutcome::NoMatch => &[],
            MatchOutcome::OneMatch(slug) => std::slice::from_ref(slug),
            MatchOutcome::ManyMatches(slugs) => slugs,
        }
    }
}

pub struct CityMatcher {
    known: Vec<CitySeed>,
}

impl CityMatcher {
    pub fn new(known: Vec<CitySeed>) -> Self {
        Self { known }
    }

    pub fn known(&self) -> &[CitySeed] {
        &self.known
    }

    pub fn known_slugs(&self) -> Vec<String> {
        self.known.iter().map(|c| c.slug.clone()).collect()
    }

    pub fn match_token(&self, token: &str) -> MatchOutcome {
        let needle = normalize(token);
        if needle.is_empty() {
            return MatchOutcome::NoMatch;
        }

        let mut hits: Vec<String> = self
            .known
            .iter()
            .filter(|c| normalize(&c.slug).contains(&needle))
            .map(|c| c.slug.clone())
            .collect();

        match hits.len() {
            0 => MatchOutcome::NoMatch,
            1 => MatchOutcome::OneMatch(hits.remove(0)),
            _ => MatchOutcome::ManyMatches(hits),
        }
    }

    /// Union of every token's matches, in seed-list order.
    ///
    /// No tokens (or only blank ones) selects every known city. A token that
    /// matches nothing is logged; only an empty overall result is an error.
    pub fn resolve(&self, tokens: &[String]) -> Result<Vec<CitySeed>, OutreachError> {
        let tokens: Vec<&String> = tokens.iter().filter(|t| !normalize(t).is_empty()).collect();
        if tokens.is_empty() {
            return Ok(self.known.clone());
        }

        let mut selected: HashSet<String> = HashSet::new();
        for token in tokens {
            let outcome = self.match_token(token);
            match &outcome {
                MatchOutcome::NoMatch => warn!(token = token.as_str(), "City token matched nothing"),
                MatchOutcome::OneMatch(slug) => {
                    info!(token = token.as_str(), city = slug.as_str(), "City token matched")
                }
                MatchOutcome::ManyMatches(slugs) => info!(
                    token = token.as_str(),
                    cities = slugs.join(", ").as_str(),
                    "City token matched several cities"
                ),
            }
            selected.extend(outcome.slugs().iter().cloned());
        }

        if selected.is_empty() {
            return Err(OutreachError::NoMatch {
                known: self.known_slugs(),
            });
        }

        Ok(self
            .known
            .iter()
            .filter(|c| selected.contains(&c.slug))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use outreach_common::default_cities;

    fn matcher(slugs: &[(&str, &str)]) -> CityMatcher {
        CityMatcher::new(slugs.iter().map(|(c, k)| CitySeed::new(c, k)).collect())
    }

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn new_york_does_not_match_york() {
        let m = matcher(&[("new_york", "usa"), ("york", "england")]);
        assert_eq!(
            m.match_token("new york"),
            MatchOutcome::OneMatch("new_york_usa".into())
        );
        assert_eq!(
            m.match_token("york"),
            MatchOutcome::ManyMatches(vec!["new_york_usa".into(), "york_england".into()])
        );
    }

    #[test]
    fn joined_words_do_not_match_separated_slugs() {
        let m = matcher(&[("new_york", "usa")]);
        assert_eq!(m.match_token("newyork"), MatchOutcome::NoMatch);
        assert_eq!(
            m.match_token("New-York"),
            MatchOutcome::OneMatch("new_york_usa".into())
        );
    }

    #[test]
    fn every_superstring_slug_is_matched() {
        let m = CityMatcher::new(default_cities());
        for seed in m.known() {
            for cut in [1, seed.slug.len() / 2, seed.slug.len()] {
                let token = seed.slug[..cut].trim_end_matches('_').to_string();
                if token.is_empty() {
                    continue;
                }
                assert!(
                    m.match_token(&token).slugs().contains(&seed.slug),
                    "{token} should match {}",
                    seed.slug
                );
            }
        }
    }

    #[test]
    fn resolve_keeps_seed_order_and_dedups() {
        let m = CityMatcher::new(default_cities());
        let cities = m.resolve(&tokens(&["tokyo", "PARIS", "paris", "india"])).unwrap();
        let slugs: Vec<_> = cities.iter().map(|c| c.slug.as_str()).collect();
        assert_eq!(
            slugs,
            vec![
                "paris_france",
                "mumbai_india",
                "delhi_india",
                "bangalore_india",
                "tokyo_japan"
            ]
        );
    }

    #[test]
    fn unmatched_tokens_are_tolerated() {
        let m = CityMatcher::new(default_cities());
        let cities = m.resolve(&tokens(&["atlantis", "lagos"])).unwrap();
        assert_eq!(cities.len(), 1);
        assert_eq!(cities[0].slug, "lagos_nigeria");
    }

    #[test]
    fn empty_token_list_selects_everything() {
        let m = CityMatcher::new(default_cities());
        assert_eq!(m.resolve(&[]).unwrap().len(), 41);
        assert_eq!(m.resolve(&tokens(&["  ", "-"])).unwrap().len(), 41);
    }

    #[test]
    fn no_match_carries_known_slugs() {
        let m = matcher(&[("paris", "france"), ("lima", "peru")]);
        match m.resolve(&tokens(&["atlantis"])) {
            Err(OutreachError::NoMatch { known }) => {
                assert_eq!(known, vec!["paris_france", "lima_peru"]);
            }
            other => panic!("expected NoMatch, got {other:?}"),
        }
    }
}
