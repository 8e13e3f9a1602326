// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Gates
//!
//! Stage-transition gates written to `gates/<name>.yaml`. A gate passes when
//! the achieved score reaches the required score and the stage reports
//! `ready`.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Gate descriptors and their evaluation rule

use serde::{Deserialize, Serialize};

pub const GATES_DIR: &str = "gates";
pub const READY_STATUS: &str = "ready";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateDefinition {
    pub name: String,
    pub description: String,
}

/// Values a gate is evaluated against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GateContext {
    #[serde(default)]
    pub required: f64,
    #[serde(default)]
    pub achieved: f64,
    #[serde(default)]
    pub status: String,
}

impl GateDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }

    /// The four gates every pipeline bundle carries.
    pub fn standard_set() -> Vec<Self> {
        vec![
            Self::new(
                "g_search_complete",
                "Search stage must deliver the required corpus before extraction begins.",
            ),
            Self::new(
                "g_extraction_quality",
                "Extraction outputs must contain traceable evidence identifiers.",
            ),
            Self::new(
                "g_analysis_depth",
                "Analysis stage must reach depth scores within the acceptable threshold.",
            ),
            Self::new(
                "g_validation_passed",
                "Validation stage verifies logic, consistency, and fact checks before reporting.",
            ),
        ]
    }

    pub fn file_name(&self) -> String {
        format!("{}.yaml", self.name)
    }

    pub fn evaluate(&self, context: &GateContext) -> bool {
        context.achieved >= context.required && context.status == READY_STATUS
    }
}
