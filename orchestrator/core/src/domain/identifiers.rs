// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Identifiers
//!
//! Agent identifiers and the normalisation rules every seed passes through.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Value objects for node identity, slug and dedupe rules

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Prefix shared by every global support agent.
pub const GLOBAL_STAGE_KEY: &str = "orchestration";

/// Fully qualified agent identifier (`<stage_key>.<agent_slug>` for generated
/// agents, free-form for flat seeds).
///
/// # Invariants
/// - Never empty
/// - No leading/trailing whitespace
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    /// Create a new AgentId, trimming surrounding whitespace.
    pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(IdentifierError::Empty);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// `<stage_key>.<slug>`; both halves are already slugs so this cannot fail.
    pub fn scoped(stage_key: &str, slug: &str) -> Self {
        Self(format!("{}.{}", stage_key, slug))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last dotted segment (`search.scholar_agent` -> `scholar_agent`).
    pub fn local_part(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }

    /// Filesystem-safe stem: every character outside `[A-Za-z0-9_-]` becomes `_`.
    pub fn file_stem(&self) -> String {
        self.0
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for AgentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
    #[error("identifier cannot be empty")]
    Empty,
}

/// Lowercase, collapse every non-alphanumeric run into `_`, strip edge
/// underscores. An empty result becomes `"orchestration"`.
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_separator = false;

    for c in value.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_separator && !slug.is_empty() {
                slug.push('_');
            }
            pending_separator = false;
            slug.push(c);
        } else {
            pending_separator = true;
        }
    }

    if slug.is_empty() {
        GLOBAL_STAGE_KEY.to_string()
    } else {
        slug
    }
}

/// Trim every item, drop empties, keep the first occurrence of each.
pub fn dedupe<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut result = Vec::new();
    for item in items {
        let key = item.as_ref().trim();
        if !key.is_empty() && seen.insert(key.to_string()) {
            result.push(key.to_string());
        }
    }
    result
}

/// Order-preserving dedupe over agent ids.
pub fn dedupe_ids<'a, I>(ids: I) -> Vec<AgentId>
where
    I: IntoIterator<Item = &'a AgentId>,
{
    let mut seen = HashSet::new();
    ids.into_iter()
        .filter(|id| seen.insert((*id).clone()))
        .cloned()
        .collect()
}

/// "scholar_agent_primary" -> "Scholar Agent Primary"
pub fn title_case(slug: &str) -> String {
    slug.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
