// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Agent Graph
//!
//! Typed edges between agents. Only `depends_on` affects execution order;
//! every other relation is advisory and may form cycles.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Edge relation vocabulary and the seen-set edge builder

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;

use crate::domain::identifiers::AgentId;

/// Edge relation vocabulary.
///
/// Flat seeds may name arbitrary relations; those are carried verbatim as
/// [`Relation::Custom`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Relation {
    DependsOn,
    Feeds,
    Handoff,
    Controls,
    Reports,
    RetrySignal,
    RetryDispatch,
    Feedback,
    Monitors,
    Oversees,
    Custom(String),
}

impl Relation {
    pub fn as_str(&self) -> &str {
        match self {
            Self::DependsOn => "depends_on",
            Self::Feeds => "feeds",
            Self::Handoff => "handoff",
            Self::Controls => "controls",
            Self::Reports => "reports",
            Self::RetrySignal => "retry_signal",
            Self::RetryDispatch => "retry_dispatch",
            Self::Feedback => "feedback",
            Self::Monitors => "monitors",
            Self::Oversees => "oversees",
            Self::Custom(name) => name,
        }
    }

    pub fn parse(name: &str) -> Self {
        match name.trim() {
            "depends_on" => Self::DependsOn,
            "feeds" => Self::Feeds,
            "handoff" => Self::Handoff,
            "controls" => Self::Controls,
            "reports" => Self::Reports,
            "retry_signal" => Self::RetrySignal,
            "retry_dispatch" => Self::RetryDispatch,
            "feedback" => Self::Feedback,
            "monitors" => Self::Monitors,
            "oversees" => Self::Oversees,
            other => Self::Custom(other.to_string()),
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Relation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Relation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::parse(&name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source: AgentId,
    pub target: AgentId,
    pub relation: Relation,
}

/// Insertion-ordered edge list that drops self-loops and repeated triples.
#[derive(Debug, Default)]
pub struct EdgeSet {
    edges: Vec<Edge>,
    seen: HashSet<(AgentId, AgentId, Relation)>,
}

impl EdgeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when the edge was added.
    pub fn add(&mut self, source: &AgentId, target: &AgentId, relation: Relation) -> bool {
        if source == target {
            return false;
        }
        let key = (source.clone(), target.clone(), relation.clone());
        if !self.seen.insert(key) {
            return false;
        }
        self.edges.push(Edge {
            source: source.clone(),
            target: target.clone(),
            relation,
        });
        true
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn into_edges(self) -> Vec<Edge> {
        self.edges
    }
}
