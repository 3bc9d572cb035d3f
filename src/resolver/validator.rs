//! Consistency checks over a built dependency graph.
//!
//! The validator never fails and never mutates its inputs. It reports problems
//! in three buckets: errors make the mod set unloadable, warnings point at
//! bookkeeping drift between the mods directory and the MOD list, and
//! suggestions name MODs whose enabling would fix an error.

use super::dependency_graph::{DependencyGraph, Edge, Node, format_cycle};
use crate::core::ModpmError;
use crate::installed::InstalledMods;
use crate::models::ModId;
use crate::modlist::ModList;
use serde::Serialize;
use std::collections::HashSet;

/// What a [`ValidationIssue`] is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Required dependency absent or not installed
    MissingDependency,
    /// Required dependency installed but disabled
    DisabledDependency,
    /// Required dependency at a version failing the requirement
    VersionMismatch,
    /// Enabled MODs requiring each other in a loop
    CircularDependency,
    /// Two enabled MODs declare an incompatibility
    Conflict,
    /// Installed MOD without MOD list entry
    NotInModList,
    /// MOD list entry without installed artifact
    NotInstalled,
    /// Pinned version is not on disk
    PinnedVersionMissing,
    /// Enabling a MOD would satisfy a dependency
    EnableMod,
}

/// One finding of the validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// Finding category
    pub kind: IssueKind,
    /// Human-readable description
    pub message: String,
    /// MODs involved, requester first
    pub mods: Vec<ModId>,
}

impl ValidationIssue {
    fn new(kind: IssueKind, message: impl Into<String>, mods: Vec<ModId>) -> Self {
        Self {
            kind,
            message: message.into(),
            mods,
        }
    }
}

/// Outcome of [`validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    /// Problems that keep the mod set from loading
    pub errors: Vec<ValidationIssue>,
    /// Bookkeeping drift
    pub warnings: Vec<ValidationIssue>,
    /// Fixes the user may want to apply
    pub suggestions: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Whether no errors were found.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Errors of the given kind.
    pub fn errors_of(&self, kind: IssueKind) -> impl Iterator<Item = &ValidationIssue> {
        self.errors.iter().filter(move |issue| issue.kind == kind)
    }
}

/// Check the graph against itself, the MOD list and the installed artifacts.
#[must_use]
pub fn validate(
    graph: &DependencyGraph,
    mod_list: &ModList,
    installed: &InstalledMods,
) -> ValidationResult {
    let mut result = ValidationResult::default();

    check_required_edges(graph, &mut result);
    check_cycles(graph, &mut result);
    check_conflicts(graph, &mut result);
    check_bookkeeping(mod_list, installed, &mut result);

    result
}

/// A required edge to a builtin MOD passes when the game data was not scanned.
pub(crate) fn assumed_present(graph: &DependencyGraph, edge: &Edge) -> bool {
    edge.to.is_builtin() && !graph.contains(edge.to.as_str())
}

fn check_required_edges(graph: &DependencyGraph, result: &mut ValidationResult) {
    let mut suggested = HashSet::new();

    for node in graph.nodes().iter().filter(|node| node.enabled) {
        for edge in graph.edges_from(node.id.as_str()).iter().filter(|edge| edge.is_required()) {
            if assumed_present(graph, edge) {
                continue;
            }
            let mods = vec![edge.from.clone(), edge.to.clone()];

            let target = match graph.node(edge.to.as_str()) {
                Some(target) if target.installed => target,
                _ => {
                    let error = ModpmError::MissingDependency {
                        requester: edge.from.to_string(),
                        dependency: edge.to.to_string(),
                        requirement: edge.requirement.to_string(),
                    };
                    result.errors.push(ValidationIssue::new(
                        IssueKind::MissingDependency,
                        error.to_string(),
                        mods,
                    ));
                    continue;
                }
            };

            let satisfied = satisfies(target, edge);
            if !target.enabled {
                result.errors.push(ValidationIssue::new(
                    IssueKind::DisabledDependency,
                    format!("MOD '{}' requires '{}', but it is disabled", edge.from, edge.to),
                    mods,
                ));
                if satisfied && suggested.insert(target.id.clone()) {
                    result.suggestions.push(ValidationIssue::new(
                        IssueKind::EnableMod,
                        format!("enable {}", target.id),
                        vec![target.id.clone()],
                    ));
                }
            } else if !satisfied {
                let error = ModpmError::VersionMismatch {
                    requester: edge.from.to_string(),
                    dependency: edge.to.to_string(),
                    requirement: edge.requirement.to_string(),
                    found: target.resolved_version.map(|v| v.to_string()).unwrap_or_default(),
                };
                result.errors.push(ValidationIssue::new(
                    IssueKind::VersionMismatch,
                    error.to_string(),
                    mods,
                ));
            }
        }
    }
}

fn satisfies(target: &Node, edge: &Edge) -> bool {
    target.resolved_version.is_some_and(|version| edge.requirement.satisfied_by(&version))
}

fn check_cycles(graph: &DependencyGraph, result: &mut ValidationResult) {
    for cycle in graph.cycles_among(|node| node.enabled) {
        result.errors.push(ValidationIssue::new(
            IssueKind::CircularDependency,
            format!("Circular dependency: {}", format_cycle(&cycle)),
            cycle,
        ));
    }
}

fn check_conflicts(graph: &DependencyGraph, result: &mut ValidationResult) {
    let mut reported = HashSet::new();

    for node in graph.nodes().iter().filter(|node| node.enabled) {
        for edge in graph
            .edges_from(node.id.as_str())
            .iter()
            .filter(|edge| edge.is_incompatible() && edge.to != edge.from)
        {
            let target_enabled = graph.node(edge.to.as_str()).is_some_and(|target| target.enabled);
            if !target_enabled {
                continue;
            }

            // Both sides may declare the same incompatibility
            let pair = if edge.from <= edge.to {
                (edge.from.clone(), edge.to.clone())
            } else {
                (edge.to.clone(), edge.from.clone())
            };
            if !reported.insert(pair) {
                continue;
            }

            let error = ModpmError::Conflict {
                mod_a: edge.from.to_string(),
                mod_b: edge.to.to_string(),
            };
            result.errors.push(ValidationIssue::new(
                IssueKind::Conflict,
                error.to_string(),
                vec![edge.from.clone(), edge.to.clone()],
            ));
        }
    }
}

fn check_bookkeeping(mod_list: &ModList, installed: &InstalledMods, result: &mut ValidationResult) {
    for id in installed.ids().filter(|id| !id.is_builtin()) {
        if !mod_list.exists(id.as_str()) {
            result.warnings.push(ValidationIssue::new(
                IssueKind::NotInModList,
                format!("MOD '{id}' is installed but missing from the MOD list"),
                vec![id.clone()],
            ));
        }
    }

    for entry in mod_list.entries() {
        let id = ModId::new(entry.name.as_str());
        if id.is_builtin() {
            continue;
        }

        if !installed.contains(id.as_str()) {
            result.warnings.push(ValidationIssue::new(
                IssueKind::NotInstalled,
                format!("MOD '{id}' is in the MOD list but not installed"),
                vec![id],
            ));
        } else if let Some(version) = entry.version {
            if !installed.contains_version(id.as_str(), &version) {
                result.warnings.push(ValidationIssue::new(
                    IssueKind::PinnedVersionMissing,
                    format!("MOD '{id}' is pinned to {version}, which is not installed"),
                    vec![id],
                ));
            }
        }
    }
}
