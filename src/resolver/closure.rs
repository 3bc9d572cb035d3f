//! Closure planners for enable, disable and uninstall.
//!
//! Each planner walks the graph breadth-first with an explicit worklist and a
//! visited set, so the resulting closures are ordered, free of duplicates and
//! stable across runs on the same state. Plans only describe changes;
//! [`crate::installer::PlanExecutor`] applies them.

use super::dependency_graph::{DependencyGraph, Edge};
use super::validator::assumed_present;
use crate::core::ModpmError;
use crate::installed::InstalledMods;
use crate::models::{ModId, ModSpec};
use crate::modlist::ModList;
use crate::utils::find_similar_name;
use crate::version::Version;
use anyhow::Result;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::PathBuf;
use tracing::debug;

/// MODs to enable, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnablePlan {
    /// Requested MODs first, then the disabled dependencies they pull in
    pub mods: Vec<ModId>,
}

/// MODs to disable, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisablePlan {
    /// Requested MODs first, then their enabled dependents
    pub mods: Vec<ModId>,
}

/// One artifact scheduled for deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedArtifact {
    /// Version of the artifact
    pub version: Version,
    /// Archive or directory to delete
    pub path: PathBuf,
}

/// Changes for one MOD of an uninstall plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UninstallItem {
    /// MOD identity
    pub id: ModId,
    /// Artifacts to delete, ascending by version
    pub artifacts: Vec<RemovedArtifact>,
    /// Whether the MOD list entry goes away (no versions remain)
    pub remove_entry: bool,
    /// Replacement pin when the pinned version is deleted
    pub new_pin: Option<Version>,
    /// Only disable the MOD (expansions in bulk mode)
    pub disable_only: bool,
}

/// Ordered uninstall changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UninstallPlan {
    /// One item per affected MOD
    pub items: Vec<UninstallItem>,
}

impl UninstallPlan {
    /// Whether the plan changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// [`ModpmError::ModNotInstalled`] with a closest-name hint when one exists.
pub(crate) fn not_installed(graph: &DependencyGraph, name: &str) -> anyhow::Error {
    let error = anyhow::Error::from(ModpmError::ModNotInstalled {
        name: name.to_string(),
    });
    let candidates = graph.nodes().iter().filter(|node| node.installed).map(|node| node.id.as_str());
    match find_similar_name(name, candidates) {
        Some(hint) => error.context(format!("MOD '{name}' is not installed. Did you mean '{hint}'?")),
        None => error,
    }
}

fn requirement_error(edge: &Edge, found: Option<Version>) -> ModpmError {
    match found {
        Some(found) => ModpmError::VersionMismatch {
            requester: edge.from.to_string(),
            dependency: edge.to.to_string(),
            requirement: edge.requirement.to_string(),
            found: found.to_string(),
        },
        None => ModpmError::MissingDependency {
            requester: edge.from.to_string(),
            dependency: edge.to.to_string(),
            requirement: edge.requirement.to_string(),
        },
    }
}

/// Plan enabling `targets` together with every disabled required dependency.
///
/// Fails when a target is not installed, a required dependency is missing or
/// at the wrong version, or an incompatibility (declared by either side) hits
/// an enabled or newly enabled MOD.
pub fn plan_enable(graph: &DependencyGraph, targets: &[ModId]) -> Result<EnablePlan> {
    for target in targets {
        if !graph.node(target.as_str()).is_some_and(|node| node.installed) {
            return Err(not_installed(graph, target.as_str()));
        }
    }

    let mut mods = Vec::new();
    let mut visited = HashSet::new();
    let mut queue: VecDeque<ModId> = targets.iter().cloned().collect();

    while let Some(current) = queue.pop_front() {
        let Some(node) = graph.node(current.as_str()) else {
            continue;
        };
        if node.enabled || !visited.insert(current.clone()) {
            continue;
        }
        mods.push(current.clone());

        for edge in graph.edges_from(current.as_str()).iter().filter(|edge| edge.is_required()) {
            if edge.to.is_base() || assumed_present(graph, edge) {
                continue;
            }
            let target = match graph.node(edge.to.as_str()) {
                Some(target) if target.installed => target,
                _ => return Err(requirement_error(edge, None).into()),
            };
            let satisfied =
                target.resolved_version.is_some_and(|version| edge.requirement.satisfied_by(&version));
            if !satisfied {
                return Err(requirement_error(edge, target.resolved_version).into());
            }
            if !target.enabled {
                queue.push_back(edge.to.clone());
            }
        }
    }

    let active = |id: &ModId| {
        visited.contains(id) || graph.node(id.as_str()).is_some_and(|node| node.enabled)
    };
    for id in &mods {
        let incoming = graph.edges_to(id.as_str());
        let declared_by_others =
            incoming.iter().filter(|edge| edge.is_incompatible()).map(|edge| &edge.from);
        let declared_by_self = graph
            .edges_from(id.as_str())
            .iter()
            .filter(|edge| edge.is_incompatible())
            .map(|edge| &edge.to);

        for other in declared_by_self.chain(declared_by_others) {
            if other != id && active(other) {
                return Err(ModpmError::Conflict {
                    mod_a: id.to_string(),
                    mod_b: other.to_string(),
                }
                .into());
            }
        }
    }

    debug!("Enable closure: {:?}", mods);
    Ok(EnablePlan {
        mods,
    })
}

/// Plan disabling `targets` together with every enabled MOD depending on them.
pub fn plan_disable(graph: &DependencyGraph, targets: &[ModId]) -> Result<DisablePlan> {
    if let Some(base) = targets.iter().find(|target| target.is_base()) {
        return Err(ModpmError::InvalidTarget {
            name: base.to_string(),
            reason: "the base game cannot be disabled".to_string(),
        }
        .into());
    }

    Ok(disable_closure(graph, targets.iter().cloned()))
}

/// Plan disabling every enabled MOD except base.
#[must_use]
pub fn plan_disable_all(graph: &DependencyGraph) -> DisablePlan {
    let seeds = graph
        .nodes()
        .iter()
        .filter(|node| node.enabled && !node.id.is_base())
        .map(|node| node.id.clone());
    disable_closure(graph, seeds)
}

fn disable_closure(graph: &DependencyGraph, seeds: impl Iterator<Item = ModId>) -> DisablePlan {
    let mut mods = Vec::new();
    let mut visited = HashSet::new();
    let mut queue: VecDeque<ModId> = seeds.collect();

    while let Some(current) = queue.pop_front() {
        let Some(node) = graph.node(current.as_str()) else {
            debug!("Skipping unknown MOD '{current}'");
            continue;
        };
        if !node.installed || !node.enabled || !visited.insert(current.clone()) {
            continue;
        }
        mods.push(current.clone());
        queue.extend(graph.find_enabled_dependents(current.as_str()));
    }

    debug!("Disable closure: {:?}", mods);
    DisablePlan {
        mods,
    }
}

/// Plan uninstalling `specs` (`name` for every version, `name@version` for one).
///
/// Fails with [`ModpmError::DependentsWouldBreak`] listing every enabled MOD
/// whose required dependency would lose all satisfying versions.
pub fn plan_uninstall(
    graph: &DependencyGraph,
    installed: &InstalledMods,
    mod_list: &ModList,
    specs: &[ModSpec],
) -> Result<UninstallPlan> {
    let mut order: Vec<ModId> = Vec::new();
    let mut removed: HashMap<ModId, Vec<RemovedArtifact>> = HashMap::new();

    for spec in specs {
        if spec.id.is_builtin() {
            return Err(ModpmError::InvalidTarget {
                name: spec.id.to_string(),
                reason: "the base game and expansions cannot be uninstalled".to_string(),
            }
            .into());
        }

        let artifacts: Vec<RemovedArtifact> = installed
            .versions_of(spec.id.as_str())
            .iter()
            .filter(|artifact| spec.exact_version().is_none_or(|version| artifact.version == version))
            .map(|artifact| RemovedArtifact {
                version: artifact.version,
                path: artifact.path.clone(),
            })
            .collect();
        if artifacts.is_empty() {
            return Err(not_installed(graph, &spec.to_string()));
        }

        if !removed.contains_key(&spec.id) {
            order.push(spec.id.clone());
        }
        let entry = removed.entry(spec.id.clone()).or_default();
        for artifact in artifacts {
            if !entry.iter().any(|existing| existing.version == artifact.version) {
                entry.push(artifact);
            }
        }
    }

    let remaining_versions = |id: &ModId| -> Vec<Version> {
        let gone = removed.get(id);
        installed
            .versions_of(id.as_str())
            .iter()
            .map(|artifact| artifact.version)
            .filter(|version| !gone.is_some_and(|gone| gone.iter().any(|a| a.version == *version)))
            .collect()
    };
    let fully_removed: HashSet<&ModId> =
        order.iter().filter(|id| remaining_versions(*id).is_empty()).collect();

    let mut broken = Vec::new();
    let mut items = Vec::new();
    for id in &order {
        let remaining = remaining_versions(id);
        let mut reported = HashSet::new();

        for edge in graph.edges_to(id.as_str()) {
            if !edge.is_required() || edge.from == *id || fully_removed.contains(&edge.from) {
                continue;
            }
            if !graph.node(edge.from.as_str()).is_some_and(|node| node.enabled) {
                continue;
            }
            if !remaining.iter().any(|version| edge.requirement.satisfied_by(version))
                && reported.insert(&edge.from)
            {
                broken.push(format!("{} (requires {} {})", edge.from, id, edge.requirement));
            }
        }

        let mut artifacts = removed.get(id).cloned().unwrap_or_default();
        artifacts.sort_by_key(|artifact| artifact.version);

        let pin_removed = mod_list
            .version(id.as_str())
            .is_some_and(|pin| artifacts.iter().any(|artifact| artifact.version == pin));
        let new_pin = if pin_removed { remaining.iter().max().copied() } else { None };

        items.push(UninstallItem {
            id: id.clone(),
            artifacts,
            remove_entry: remaining.is_empty(),
            new_pin,
            disable_only: false,
        });
    }

    if !broken.is_empty() {
        return Err(ModpmError::DependentsWouldBreak {
            dependents: broken.join(", "),
        }
        .into());
    }

    Ok(UninstallPlan {
        items,
    })
}

/// Plan uninstalling every MOD, dependents before their dependencies.
///
/// Expansions are only disabled; base is left alone.
pub fn plan_uninstall_all(graph: &DependencyGraph, installed: &InstalledMods) -> Result<UninstallPlan> {
    let mut items = Vec::new();

    for id in graph.topological_order()?.into_iter().rev() {
        if id.is_base() {
            continue;
        }
        let Some(node) = graph.node(id.as_str()) else {
            continue;
        };

        if id.is_expansion() {
            if node.enabled {
                items.push(UninstallItem {
                    id,
                    artifacts: Vec::new(),
                    remove_entry: false,
                    new_pin: None,
                    disable_only: true,
                });
            }
            continue;
        }

        let artifacts: Vec<RemovedArtifact> = installed
            .versions_of(id.as_str())
            .iter()
            .map(|artifact| RemovedArtifact {
                version: artifact.version,
                path: artifact.path.clone(),
            })
            .collect();
        if artifacts.is_empty() {
            continue;
        }
        items.push(UninstallItem {
            id,
            artifacts,
            remove_entry: true,
            new_pin: None,
            disable_only: false,
        });
    }

    Ok(UninstallPlan {
        items,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ModSetBuilder;

    fn ids(names: &[&str]) -> Vec<ModId> {
        names.iter().map(|name| ModId::new(*name)).collect()
    }

    fn spec(raw: &str) -> ModSpec {
        raw.parse().unwrap()
    }

    fn kind(err: &anyhow::Error) -> &ModpmError {
        err.downcast_ref::<ModpmError>().unwrap()
    }

    #[test]
    fn test_enable_pulls_in_disabled_dependencies() {
        let graph = ModSetBuilder::new()
            .disabled("a", "1.0.0", &["base", "b"])
            .disabled("b", "1.0.0", &["c"])
            .enabled("c", "1.0.0", &[])
            .build()
            .graph();

        let plan = plan_enable(&graph, &ids(&["a"])).unwrap();
        assert_eq!(plan.mods, ids(&["a", "b"]));
    }

    #[test]
    fn test_enable_of_enabled_mod_is_empty() {
        let graph = ModSetBuilder::new().enabled("a", "1.0.0", &[]).build().graph();
        assert!(plan_enable(&graph, &ids(&["a"])).unwrap().mods.is_empty());
    }

    #[test]
    fn test_enable_unknown_target_suggests_name() {
        let graph = ModSetBuilder::new().disabled("helmod", "1.0.0", &[]).build().graph();

        let err = plan_enable(&graph, &ids(&["helmdo"])).unwrap_err();
        assert!(matches!(kind(&err), ModpmError::ModNotInstalled { name } if name == "helmdo"));
        assert!(err.to_string().contains("Did you mean 'helmod'?"));
    }

    #[test]
    fn test_enable_listed_but_missing_target_fails() {
        let graph = ModSetBuilder::new().listed("gone", false).build().graph();
        let err = plan_enable(&graph, &ids(&["gone"])).unwrap_err();
        assert!(matches!(kind(&err), ModpmError::ModNotInstalled { .. }));
    }

    #[test]
    fn test_enable_ignores_incompatible_mod_that_is_only_listed() {
        let graph = ModSetBuilder::new()
            .disabled("a", "1.0.0", &["! c"])
            .listed("c", true)
            .build()
            .graph();

        let plan = plan_enable(&graph, &ids(&["a"])).unwrap();
        assert_eq!(plan.mods, ids(&["a"]));
    }

    #[test]
    fn test_enable_missing_and_mismatched_dependencies() {
        let graph = ModSetBuilder::new()
            .disabled("a", "1.0.0", &["ghost"])
            .disabled("b", "1.0.0", &["c >= 2.0"])
            .disabled("c", "1.5.0", &[])
            .build()
            .graph();

        let err = plan_enable(&graph, &ids(&["a"])).unwrap_err();
        assert!(matches!(kind(&err), ModpmError::MissingDependency { dependency, .. } if dependency == "ghost"));

        let err = plan_enable(&graph, &ids(&["b"])).unwrap_err();
        assert!(matches!(kind(&err), ModpmError::VersionMismatch { found, .. } if found == "1.5.0"));
    }

    #[test]
    fn test_enable_conflicts_within_closure() {
        let graph = ModSetBuilder::new()
            .disabled("a", "1.0.0", &["b"])
            .disabled("b", "1.0.0", &["! a"])
            .build()
            .graph();

        let err = plan_enable(&graph, &ids(&["a"])).unwrap_err();
        assert!(matches!(kind(&err), ModpmError::Conflict { .. }));
    }

    #[test]
    fn test_disable_base_is_invalid() {
        let graph = ModSetBuilder::new().base("2.0.0").build().graph();
        let err = plan_disable(&graph, &ids(&["base"])).unwrap_err();
        assert!(matches!(kind(&err), ModpmError::InvalidTarget { .. }));
    }

    #[test]
    fn test_disable_all_skips_base_and_disabled() {
        let graph = ModSetBuilder::new()
            .base("2.0.0")
            .enabled("a", "1.0.0", &["b"])
            .enabled("b", "1.0.0", &[])
            .disabled("c", "1.0.0", &[])
            .build()
            .graph();

        let plan = plan_disable_all(&graph);
        assert_eq!(plan.mods, ids(&["a", "b"]));
    }

    #[test]
    fn test_uninstall_rejects_builtin_and_unknown() {
        let state = ModSetBuilder::new().enabled("a", "1.0.0", &[]).build();
        let graph = state.graph();

        for target in ["base", "space-age"] {
            let err = plan_uninstall(&graph, &state.installed, &state.mod_list, &[spec(target)])
                .unwrap_err();
            assert!(matches!(kind(&err), ModpmError::InvalidTarget { .. }));
        }

        let err = plan_uninstall(&graph, &state.installed, &state.mod_list, &[spec("a@2.0.0")])
            .unwrap_err();
        assert!(matches!(kind(&err), ModpmError::ModNotInstalled { name } if name == "a@2.0.0"));
    }

    #[test]
    fn test_uninstall_one_version_updates_pin() {
        let state = ModSetBuilder::new()
            .enabled("x", "1.0.0", &[])
            .enabled("x", "1.5.0", &[])
            .enabled("x", "2.0.0", &[])
            .pinned("x", "2.0.0")
            .build();
        let graph = state.graph();

        let plan =
            plan_uninstall(&graph, &state.installed, &state.mod_list, &[spec("x@2.0.0")]).unwrap();
        let item = &plan.items[0];
        assert_eq!(item.artifacts.len(), 1);
        assert!(!item.remove_entry);
        assert_eq!(item.new_pin, Some(Version::new(1, 5, 0)));
    }

    #[test]
    fn test_uninstall_whole_mod_with_dependent_removed_too() {
        let state = ModSetBuilder::new()
            .enabled("lib", "1.0.0", &[])
            .enabled("user", "1.0.0", &["lib"])
            .build();
        let graph = state.graph();

        let err = plan_uninstall(&graph, &state.installed, &state.mod_list, &[spec("lib")])
            .unwrap_err();
        assert!(matches!(
            kind(&err),
            ModpmError::DependentsWouldBreak { dependents } if dependents == "user (requires lib any version)"
        ));

        let plan =
            plan_uninstall(&graph, &state.installed, &state.mod_list, &[spec("lib"), spec("user")])
                .unwrap();
        assert_eq!(plan.items.len(), 2);
        assert!(plan.items.iter().all(|item| item.remove_entry));
    }

    #[test]
    fn test_uninstall_lists_each_dependent_once() {
        let state = ModSetBuilder::new()
            .enabled("x", "2.0.0", &[])
            .enabled("user", "1.0.0", &["x", "x >= 2.0"])
            .build();
        let graph = state.graph();

        let err = plan_uninstall(&graph, &state.installed, &state.mod_list, &[spec("x")])
            .unwrap_err();
        match kind(&err) {
            ModpmError::DependentsWouldBreak { dependents } => {
                assert_eq!(dependents.matches("user").count(), 1, "{dependents}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_uninstall_all_orders_dependents_first() {
        let state = ModSetBuilder::new()
            .base("2.0.0")
            .expansion("space-age", "2.0.0")
            .enabled("lib", "1.0.0", &["base"])
            .enabled("user", "1.0.0", &["lib", "space-age"])
            .build();
        let graph = state.graph();

        let plan = plan_uninstall_all(&graph, &state.installed).unwrap();
        let order: Vec<&str> = plan.items.iter().map(|item| item.id.as_str()).collect();
        assert!(!order.contains(&"base"));

        let pos = |name: &str| order.iter().position(|id| *id == name).unwrap();
        assert!(pos("user") < pos("lib"));
        assert!(pos("user") < pos("space-age"));

        let expansion = &plan.items[pos("space-age")];
        assert!(expansion.disable_only);
        assert!(expansion.artifacts.is_empty());
    }
}
