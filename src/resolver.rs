//! Free-text identifier resolution against the entity directory

use std::cmp::Ordering;

use crate::config::ResolverConfig;
use crate::errors::{FilingError, Result};
use crate::models::{normalize_registry_id, IdentifierRecord, MatchCandidate, Resolution};

/// What a raw query turned out to be
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedQuery {
    /// Digits only; already zero-padded
    RegistryId(String),
    Text(String),
}

pub fn parse_query(query: &str) -> Result<ParsedQuery> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(FilingError::InvalidIdentifier("empty query".to_string()));
    }
    if trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return normalize_registry_id(trimmed).map(ParsedQuery::RegistryId);
    }
    Ok(ParsedQuery::Text(trimmed.to_string()))
}

/// Uppercase alphanumerics only; `BRK.B`, `brk-b` and `BRKB` all become `BRKB`
pub fn ticker_key(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Lowercase, punctuation dropped, whitespace collapsed
pub fn name_key(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .filter_map(|c| {
            if c.is_alphanumeric() {
                Some(c.to_ascii_lowercase())
            } else if c.is_whitespace() || c == '-' || c == '/' {
                Some(' ')
            } else {
                None
            }
        })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(Debug, Clone)]
pub struct Resolver {
    config: ResolverConfig,
}

impl Resolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    /// Resolution for a registry ID query. `known` is the directory entry when
    /// one exists.
    pub fn resolve_registry_id(&self, registry_id: &str, known: Option<&IdentifierRecord>) -> Resolution {
        let record = known.cloned().unwrap_or_else(|| IdentifierRecord {
            ticker: None,
            display_name: format!("CIK {}", registry_id),
            registry_id: registry_id.to_string(),
        });
        Resolution {
            exact: Some(record.clone()),
            candidates: vec![MatchCandidate {
                identifier: record,
                score: self.config.ticker_exact,
            }],
        }
    }

    /// Rank `records` against a free-text query
    pub fn rank(&self, query: &str, records: &[IdentifierRecord]) -> Result<Resolution> {
        let query_ticker = ticker_key(query);
        let query_name = name_key(query);
        if query_ticker.is_empty() && query_name.is_empty() {
            return Err(FilingError::InvalidIdentifier(format!(
                "query '{}' has no searchable characters",
                query
            )));
        }
        let query_tokens: Vec<&str> = query_name.split(' ').filter(|t| !t.is_empty()).collect();

        let mut candidates: Vec<MatchCandidate> = records
            .iter()
            .filter_map(|record| {
                let score = self.score(record, &query_ticker, &query_name, &query_tokens);
                (score >= self.config.relevance_floor).then(|| MatchCandidate {
                    identifier: record.clone(),
                    score,
                })
            })
            .collect();

        if candidates.is_empty() {
            return Err(FilingError::NotFound(format!("no entity matches '{}'", query)));
        }

        candidates.sort_by(compare_candidates);
        candidates.truncate(self.config.max_candidates.clamp(5, 15));

        let top = &candidates[0];
        // Several listings of the same entity (share classes) are not ambiguity
        let contested = candidates[1..].iter().any(|other| {
            other.identifier.registry_id != top.identifier.registry_id
                && top.score - other.score < self.config.disambiguation_margin
        });
        let exact = (!contested).then(|| top.identifier.clone());

        Ok(Resolution { exact, candidates })
    }

    fn score(&self, record: &IdentifierRecord, query_ticker: &str, query_name: &str, query_tokens: &[&str]) -> f64 {
        let c = &self.config;
        let mut best: f64 = 0.0;

        if let Some(ticker) = record.ticker.as_deref() {
            let ticker = ticker_key(ticker);
            if !query_ticker.is_empty() && !ticker.is_empty() {
                if ticker == query_ticker {
                    best = best.max(c.ticker_exact);
                } else if ticker.starts_with(query_ticker) {
                    let extra = (ticker.len() - query_ticker.len()) as f64;
                    best = best.max((c.ticker_prefix - c.ticker_prefix_step * extra).max(c.ticker_prefix_min));
                } else if ticker.contains(query_ticker) {
                    best = best.max(c.ticker_substring);
                }
            }
        }

        let name = name_key(&record.display_name);
        if !query_name.is_empty() && !name.is_empty() {
            if name == query_name {
                best = best.max(c.name_exact);
            } else if name.starts_with(query_name) {
                let extra = (name.chars().count() - query_name.chars().count()) as f64;
                best = best.max((c.name_prefix - c.name_prefix_step * extra).max(c.name_prefix_min));
            } else if name.contains(query_name) {
                best = best.max(c.name_substring);
            } else if !query_tokens.is_empty() {
                let words: Vec<&str> = name.split(' ').collect();
                let matched = query_tokens.iter().filter(|t| words.contains(t)).count();
                best = best.max(c.name_token_overlap * matched as f64 / query_tokens.len() as f64);
            }
        }

        best
    }
}

/// Score descending, then ticker, then registry ID, so equal scores order the
/// same way on every call
fn compare_candidates(a: &MatchCandidate, b: &MatchCandidate) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.identifier.ticker.cmp(&b.identifier.ticker))
        .then_with(|| a.identifier.registry_id.cmp(&b.identifier.registry_id))
}
