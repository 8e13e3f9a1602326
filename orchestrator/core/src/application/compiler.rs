// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Graph Compiler
//!
//! Expands a validated seed into a complete in-memory orchestration: stage
//! specialists, one coordinator per stage, the global support agents, the
//! typed edge list and every bundle document derived from them.
//!
//! # DDD Pattern: Domain Service (pure)
//!
//! - **Layer:** Application
//! - **Responsibility:** Seed -> blueprints -> graph -> bundle documents
//! - **Collaborators:** none; nothing here touches the filesystem
//!
//! # Flow
//!
//! 1. Derive base policy tokens from the seed `policies` keys
//! 2. Expand every stage into specialists plus a coordinator
//! 3. Build the six default global agents, then seed extras
//! 4. Wire `depends_on` (coordinators -> globals, specialists -> coordinator + globals)
//! 5. Synthesize edges through the seen-set
//! 6. Derive manifest, flows, specs, prompts, gates, policy snapshot and checks
//!
//! Identifier, stage-key and file-path collisions are rejected, never renamed.

use std::collections::{BTreeMap, HashSet};
use tracing::debug;

use crate::domain::agent_spec::AgentSpecDocument;
use crate::domain::blueprint::{AgentBlueprint, AgentCategory, RetryPolicy, StageSpec};
use crate::domain::checks::{CheckSuite, PARALLEL_AGENTS_SUITE, PIPELINE_E2E_SUITE};
use crate::domain::gate::GateDefinition;
use crate::domain::graph::{Edge, EdgeSet, Relation};
use crate::domain::identifiers::{dedupe, dedupe_ids, slugify, title_case, AgentId, GLOBAL_STAGE_KEY};
use crate::domain::manifest::{summarize_policies, FlatGraphManifest, FlatNode, OrchestrationManifest};
use crate::domain::pipeline::{
    FeedbackLoops, ParallelGroups, PipelineFlow, ANALYSIS_STAGE, VALIDATION_STAGE,
};
use crate::domain::policy::{
    base_policy_tokens, PolicySnapshot, STAGE_ALIGNMENT, SYSTEM_FALLBACKS, SYSTEM_OBSERVABILITY,
};
use crate::domain::seed::{
    first_non_blank, AgentEntry, FlatSeed, GlobalAgentEntry, PipelineSeed, ScalarText, SeedError,
    StageEntry,
};

pub const GLOBAL_STAGE_LABEL: &str = "Global Orchestration";

/// One prompt file to render.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptArtifact {
    pub stage: String,
    pub variant: String,
    pub agent_name: String,
    pub stage_label: String,
    pub policies: Vec<String>,
}

impl PromptArtifact {
    pub fn relative_path(&self) -> String {
        format!("prompts/{}/{}.md", self.stage, self.variant)
    }
}

/// A per-agent spec document and where it goes in the bundle.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecArtifact {
    pub relative_path: String,
    pub document: AgentSpecDocument,
}

/// Everything a bundle contains, in memory.
#[derive(Debug, Clone)]
pub struct CompiledOrchestration {
    pub name: String,
    pub description: String,
    /// Bundle directory name, `slug(name)`.
    pub bundle_name: String,
    pub stages: Vec<StageSpec>,
    pub global_agents: Vec<AgentBlueprint>,
    pub manifest: OrchestrationManifest,
    pub pipeline: PipelineFlow,
    pub feedback_loops: FeedbackLoops,
    pub parallel_groups: ParallelGroups,
    pub agent_specs: Vec<SpecArtifact>,
    pub prompts: Vec<PromptArtifact>,
    pub gates: Vec<GateDefinition>,
    pub policy_snapshot: PolicySnapshot,
    /// `(relative path, suite)`
    pub check_suites: Vec<(String, CheckSuite)>,
}

impl CompiledOrchestration {
    /// Specialists and coordinator per stage, then the global agents.
    pub fn blueprints(&self) -> impl Iterator<Item = &AgentBlueprint> {
        self.stages
            .iter()
            .flat_map(StageSpec::blueprints)
            .chain(self.global_agents.iter())
    }

    pub fn edges(&self) -> &[Edge] {
        &self.manifest.edges
    }
}

struct GlobalDefault {
    slug: &'static str,
    name: &'static str,
    role: &'static str,
    description: &'static str,
    category: AgentCategory,
}

const GLOBAL_DEFAULTS: [GlobalDefault; 6] = [
    GlobalDefault {
        slug: "supervisor",
        name: "Orchestration Supervisor",
        role: "executive",
        description: "Directs the full orchestration lifecycle and resolves contention across stages.",
        category: AgentCategory::Supervisor,
    },
    GlobalDefault {
        slug: "observability_hub",
        name: "Observability Hub",
        role: "telemetry",
        description: "Aggregates metrics, traces, and structured logs for every stage transition.",
        category: AgentCategory::Observer,
    },
    GlobalDefault {
        slug: "policy_enforcer",
        name: "Policy Enforcer",
        role: "governance",
        description: "Ensures every agent complies with governance packs before execution proceeds.",
        category: AgentCategory::Governance,
    },
    GlobalDefault {
        slug: "audit_trail",
        name: "Audit Trail Emitter",
        role: "provenance",
        description: "Emits immutable evidence records for each agent execution.",
        category: AgentCategory::Observer,
    },
    GlobalDefault {
        slug: "retry_manager",
        name: "Retry Manager",
        role: "resilience",
        description: "Coordinates retries, exponential backoff, and safe restarts across stages.",
        category: AgentCategory::Resilience,
    },
    GlobalDefault {
        slug: "quality_board",
        name: "Quality Board",
        role: "analysis",
        description: "Evaluates outputs against evidence thresholds and signals corrective actions.",
        category: AgentCategory::Analysis,
    },
];

pub fn retry_manager_id() -> AgentId {
    AgentId::scoped(GLOBAL_STAGE_KEY, "retry_manager")
}

// ============================================================================
// Pipeline compilation
// ============================================================================

pub fn compile(seed: &PipelineSeed) -> Result<CompiledOrchestration, SeedError> {
    let name = seed.display_name().to_string();
    let base_policies = base_policy_tokens(&seed.policies);

    let mut stages = Vec::with_capacity(seed.pipeline_stages.len());
    let mut stage_keys = HashSet::new();
    for (index, entry) in seed.pipeline_stages.iter().enumerate() {
        let stage = expand_stage(index, entry, &base_policies)?;
        if stage.key == GLOBAL_STAGE_KEY {
            return Err(SeedError::Invalid(format!(
                "stage #{} uses the reserved key '{}'",
                index + 1,
                GLOBAL_STAGE_KEY
            )));
        }
        if !stage_keys.insert(stage.key.clone()) {
            return Err(SeedError::Invalid(format!("duplicate stage key: {}", stage.key)));
        }
        stages.push(stage);
    }

    let coordinator_ids: Vec<AgentId> = stages.iter().map(|s| s.coordinator.identifier.clone()).collect();
    let mut global_agents = build_global_agents(&base_policies, &coordinator_ids, &seed.global_agents)?;
    let global_ids: Vec<AgentId> = global_agents.iter().map(|a| a.identifier.clone()).collect();

    for stage in &mut stages {
        stage.coordinator.depends_on = dedupe_ids(&global_ids);
        let coordinator_id = stage.coordinator.identifier.clone();
        for agent in &mut stage.agents {
            agent.depends_on = dedupe_ids(std::iter::once(&coordinator_id).chain(global_ids.iter()));
        }
    }
    for agent in &mut global_agents {
        agent.depends_on = dedupe_ids(&coordinator_ids);
    }

    check_unique_files(&stages, &global_agents)?;

    let edges = build_edges(&stages, &global_agents, &retry_manager_id());
    let all_agents: Vec<&AgentBlueprint> = stages
        .iter()
        .flat_map(StageSpec::blueprints)
        .chain(global_agents.iter())
        .collect();

    let manifest = OrchestrationManifest::new(
        name.clone(),
        seed.description_text(),
        &all_agents,
        edges.clone(),
        stages.len(),
    );

    let agent_specs = all_agents
        .iter()
        .map(|agent| SpecArtifact {
            relative_path: agent.spec_path(),
            document: AgentSpecDocument::from(*agent),
        })
        .collect();

    let prompts = all_agents
        .iter()
        .flat_map(|agent| {
            agent.prompt_variants.iter().map(move |variant| PromptArtifact {
                stage: agent.stage.clone(),
                variant: variant.clone(),
                agent_name: agent.name.clone(),
                stage_label: agent.stage_label.clone(),
                policies: agent.policies.clone(),
            })
        })
        .collect();

    let compiled = CompiledOrchestration {
        bundle_name: slugify(&name),
        description: seed.description_text().to_string(),
        pipeline: PipelineFlow::new(&stages, &global_agents, edges),
        feedback_loops: FeedbackLoops::new(&stages, &retry_manager_id()),
        parallel_groups: ParallelGroups::new(&stages, &global_agents),
        agent_specs,
        prompts,
        gates: GateDefinition::standard_set(),
        policy_snapshot: PolicySnapshot::from_seed(&seed.policies),
        check_suites: vec![
            (PIPELINE_E2E_SUITE.to_string(), CheckSuite::pipeline_e2e()),
            (PARALLEL_AGENTS_SUITE.to_string(), CheckSuite::parallel_agents()),
        ],
        manifest,
        stages,
        global_agents,
        name,
    };

    debug!(
        name = %compiled.name,
        stages = compiled.stages.len(),
        agents = compiled.manifest.nodes.len(),
        edges = compiled.manifest.edges.len(),
        "Compiled orchestration"
    );

    Ok(compiled)
}

fn expand_stage(
    index: usize,
    entry: &StageEntry,
    base_policies: &[String],
) -> Result<StageSpec, SeedError> {
    let label = first_non_blank(&[&entry.label, &entry.name])
        .unwrap_or("Stage")
        .to_string();
    let key = slugify(first_non_blank(&[&entry.key, &entry.label, &entry.name]).unwrap_or(&label));
    let retry = entry
        .retry
        .as_ref()
        .map(|r| r.resolve(&RetryPolicy::stage_default()))
        .unwrap_or_else(RetryPolicy::stage_default);
    let concurrency = match entry.concurrency {
        Some(value) if value > 0 => value,
        _ => entry.agents.len().max(1) as u32,
    };

    let coordinator_id = AgentId::scoped(&key, "coordinator");
    let mut seen = HashSet::new();
    seen.insert(coordinator_id.clone());

    let mut agents = Vec::with_capacity(entry.agents.len());
    for (position, raw) in entry.agents.iter().enumerate() {
        let agent = expand_specialist(&key, &label, raw, &retry, base_policies).ok_or_else(|| {
            SeedError::Invalid(format!(
                "agent #{} in stage #{} ('{}') has an empty label",
                position + 1,
                index + 1,
                label
            ))
        })?;
        if !seen.insert(agent.identifier.clone()) {
            return Err(SeedError::Invalid(format!(
                "duplicate agent identifier '{}' in stage '{}'",
                agent.identifier, key
            )));
        }
        agents.push(agent);
    }

    let coordinator = AgentBlueprint {
        identifier: coordinator_id,
        name: format!("{} Coordinator", label),
        stage: key.clone(),
        stage_label: label.clone(),
        role: "coordinator".to_string(),
        description: format!(
            "Coordinates all {} agents and manages hand-offs to subsequent stages.",
            label
        ),
        policies: dedupe(base_policies.iter().map(String::as_str).chain([STAGE_ALIGNMENT])),
        depends_on: vec![],
        max_dependency_degree: (agents.len() as u32 * 4).max(32),
        prompt_variants: vec![format!("{}_coordination", key)],
        concurrency,
        retry: retry.clone(),
        capabilities: vec![
            "schedule".to_string(),
            "governance".to_string(),
            "quality_assurance".to_string(),
        ],
        inputs: vec![format!("{}.input", key)],
        outputs: vec![format!("{}.handoff", key)],
        category: AgentCategory::Coordinator,
    };

    Ok(StageSpec {
        key,
        label,
        agents,
        coordinator,
        concurrency,
        retry,
    })
}

/// `None` when a bare label is blank.
fn expand_specialist(
    key: &str,
    stage_label: &str,
    raw: &AgentEntry,
    stage_retry: &RetryPolicy,
    base_policies: &[String],
) -> Option<AgentBlueprint> {
    let (label, role, description, capabilities, extra_policies, concurrency, retry) = match raw {
        AgentEntry::Label(text) => (
            text.non_blank()?.to_string(),
            None,
            None,
            vec![],
            vec![],
            None,
            None,
        ),
        AgentEntry::Detailed(details) => (
            first_non_blank(&[&details.label, &details.name, &details.id])
                .unwrap_or("agent")
                .to_string(),
            first_non_blank(&[&details.role]).map(str::to_string),
            first_non_blank(&[&details.description]).map(str::to_string),
            non_blank_items(&details.capabilities),
            non_blank_items(&details.policies),
            details.concurrency,
            details.retry.as_ref().map(|r| r.resolve(stage_retry)),
        ),
    };

    let slug = slugify(&label);
    let prompt_variants = vec![
        format!("{}_primary", slug),
        format!("{}_fallback", slug),
        format!("{}_summary", slug),
    ];

    Some(AgentBlueprint {
        identifier: AgentId::scoped(key, &slug),
        description: description.unwrap_or_else(|| {
            format!(
                "Executes {} responsibilities within the {} stage.",
                label, stage_label
            )
        }),
        name: label,
        stage: key.to_string(),
        stage_label: stage_label.to_string(),
        role: role.unwrap_or_else(|| "specialist".to_string()),
        policies: dedupe(base_policies.iter().chain(extra_policies.iter())),
        depends_on: vec![],
        max_dependency_degree: (prompt_variants.len() as u32 * 4).max(16),
        prompt_variants,
        concurrency: concurrency.filter(|c| *c > 0).unwrap_or(1),
        retry: retry.unwrap_or_else(|| stage_retry.clone()),
        capabilities,
        inputs: vec![format!("{}.input", key)],
        outputs: vec![format!("{}.output", key)],
        category: AgentCategory::Stage,
    })
}

fn non_blank_items(items: &[ScalarText]) -> Vec<String> {
    items
        .iter()
        .filter_map(ScalarText::non_blank)
        .map(str::to_string)
        .collect()
}

fn build_global_agents(
    base_policies: &[String],
    coordinator_ids: &[AgentId],
    extras: &[GlobalAgentEntry],
) -> Result<Vec<AgentBlueprint>, SeedError> {
    let policies = dedupe(
        base_policies
            .iter()
            .map(String::as_str)
            .chain([STAGE_ALIGNMENT, SYSTEM_OBSERVABILITY, SYSTEM_FALLBACKS]),
    );

    let mut agents: Vec<AgentBlueprint> = GLOBAL_DEFAULTS
        .iter()
        .map(|d| {
            global_blueprint(
                d.slug,
                d.name.to_string(),
                d.role.to_string(),
                d.description.to_string(),
                d.category,
                &policies,
                coordinator_ids,
            )
        })
        .collect();

    let mut seen: HashSet<AgentId> = agents.iter().map(|a| a.identifier.clone()).collect();
    for extra in extras {
        let raw_identifier = first_non_blank(&[&extra.identifier, &extra.id, &extra.name]).unwrap_or("agent");
        let slug = slugify(raw_identifier.rsplit('.').next().unwrap_or(raw_identifier));
        let category = match first_non_blank(&[&extra.category]) {
            Some(raw) => raw.parse::<AgentCategory>().map_err(SeedError::Invalid)?,
            None => AgentCategory::Support,
        };

        let agent = global_blueprint(
            &slug,
            first_non_blank(&[&extra.name])
                .map(str::to_string)
                .unwrap_or_else(|| title_case(&slug)),
            first_non_blank(&[&extra.role]).unwrap_or("support").to_string(),
            first_non_blank(&[&extra.description])
                .unwrap_or("Global orchestration support agent")
                .to_string(),
            category,
            &policies,
            coordinator_ids,
        );

        if !seen.insert(agent.identifier.clone()) {
            return Err(SeedError::Invalid(format!(
                "duplicate global agent identifier: {}",
                agent.identifier
            )));
        }
        agents.push(agent);
    }

    Ok(agents)
}

fn global_blueprint(
    slug: &str,
    name: String,
    role: String,
    description: String,
    category: AgentCategory,
    policies: &[String],
    coordinator_ids: &[AgentId],
) -> AgentBlueprint {
    AgentBlueprint {
        identifier: AgentId::scoped(GLOBAL_STAGE_KEY, slug),
        name,
        stage: GLOBAL_STAGE_KEY.to_string(),
        stage_label: GLOBAL_STAGE_LABEL.to_string(),
        role,
        description,
        policies: policies.to_vec(),
        depends_on: coordinator_ids.to_vec(),
        max_dependency_degree: (coordinator_ids.len() as u32 * 2).max(24),
        prompt_variants: vec![
            format!("{}_primary", slug),
            format!("{}_monitor", slug),
            format!("{}_summary", slug),
        ],
        concurrency: 1,
        retry: RetryPolicy::global_default(),
        capabilities: vec!["monitor".to_string(), "govern".to_string(), "recover".to_string()],
        inputs: vec!["orchestration.signal".to_string()],
        outputs: vec!["orchestration.report".to_string()],
        category,
    }
}

/// Spec files are named after `slug(name)` and prompt files after variants,
/// so distinct identifiers can still land on the same path.
fn check_unique_files(stages: &[StageSpec], global_agents: &[AgentBlueprint]) -> Result<(), SeedError> {
    let mut spec_paths = HashSet::new();
    let mut prompt_paths = HashSet::new();

    for agent in stages.iter().flat_map(StageSpec::blueprints).chain(global_agents.iter()) {
        let spec_path = agent.spec_path();
        if !spec_paths.insert(spec_path.clone()) {
            return Err(SeedError::Invalid(format!(
                "agent '{}' would overwrite spec file {}",
                agent.identifier, spec_path
            )));
        }
        for prompt_path in agent.prompt_paths() {
            if !prompt_paths.insert(prompt_path.clone()) {
                return Err(SeedError::Invalid(format!(
                    "agent '{}' would overwrite prompt file {}",
                    agent.identifier, prompt_path
                )));
            }
        }
    }

    Ok(())
}

fn build_edges(stages: &[StageSpec], global_agents: &[AgentBlueprint], retry_manager: &AgentId) -> Vec<Edge> {
    let mut edges = EdgeSet::new();

    for stage in stages {
        for agent in stage.blueprints() {
            for dependency in &agent.depends_on {
                edges.add(&agent.identifier, dependency, Relation::DependsOn);
            }
        }
    }

    for global in global_agents {
        for dependency in &global.depends_on {
            edges.add(&global.identifier, dependency, Relation::Monitors);
        }
    }

    for pair in stages.windows(2) {
        let (current, next) = (&pair[0], &pair[1]);
        for source in &current.agents {
            for target in &next.agents {
                edges.add(&source.identifier, &target.identifier, Relation::Feeds);
            }
        }
        edges.add(
            &current.coordinator.identifier,
            &next.coordinator.identifier,
            Relation::Handoff,
        );
    }

    let by_key: BTreeMap<&str, &StageSpec> = stages.iter().map(|s| (s.key.as_str(), s)).collect();
    if let (Some(analysis), Some(validation)) = (by_key.get(ANALYSIS_STAGE), by_key.get(VALIDATION_STAGE)) {
        for a in &analysis.agents {
            for v in &validation.agents {
                edges.add(&a.identifier, &v.identifier, Relation::Feedback);
                edges.add(&v.identifier, &a.identifier, Relation::Feedback);
            }
        }
    }

    for stage in stages {
        let coordinator = &stage.coordinator.identifier;
        for agent in &stage.agents {
            edges.add(coordinator, &agent.identifier, Relation::Controls);
            edges.add(&agent.identifier, coordinator, Relation::Reports);
            edges.add(&agent.identifier, retry_manager, Relation::RetrySignal);
            edges.add(retry_manager, &agent.identifier, Relation::RetryDispatch);
        }
        for global in global_agents {
            edges.add(coordinator, &global.identifier, Relation::Reports);
            edges.add(&global.identifier, coordinator, Relation::Oversees);
        }
    }

    edges.into_edges()
}

// ============================================================================
// Flat compilation
// ============================================================================

pub fn compile_flat(seed: &FlatSeed) -> Result<FlatGraphManifest, SeedError> {
    seed.validate()?;

    let mut nodes = Vec::with_capacity(seed.agents.len());
    for agent in &seed.agents {
        let id = AgentId::new(agent.id.as_str()).map_err(|e| SeedError::Invalid(e.to_string()))?;
        nodes.push(FlatNode {
            id,
            role: first_non_blank(&[&agent.role]).unwrap_or("agent").to_string(),
            policy_pack_ids: dedupe(non_blank_items(&agent.policy_pack_ids)),
            max_dependency_degree: agent.max_dependency_degree,
        });
    }

    let mut edges = EdgeSet::new();
    for (node, agent) in nodes.iter().zip(&seed.agents) {
        let relation = first_non_blank(&[&agent.relation])
            .map(Relation::parse)
            .unwrap_or(Relation::DependsOn);
        for target in agent.depends_on.iter().filter_map(ScalarText::non_blank) {
            let target = AgentId::new(target).map_err(|e| SeedError::Invalid(e.to_string()))?;
            edges.add(&node.id, &target, relation.clone());
        }
    }

    let policy_summary = summarize_policies(nodes.iter().map(|n| n.policy_pack_ids.as_slice()));

    Ok(FlatGraphManifest {
        nodes,
        edges: edges.into_edges(),
        policy_summary,
    })
}
