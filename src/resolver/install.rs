//! Install and update planning against the remote registry.
//!
//! Installing a MOD can require MODs nobody has seen locally yet, so planning
//! proceeds in rounds:
//!
//! 1. **Round 0** fetches the requested MODs concurrently and selects one
//!    release each. Any failure here aborts planning.
//! 2. **Frontier rounds** fetch, again concurrently, every required dependency
//!    of the previous round's additions that has no node yet. A dependency that
//!    cannot be resolved is skipped with a warning.
//! 3. An **enable pass** marks installed but disabled dependencies of planned
//!    MODs for enabling.
//! 4. A **validation gate** rejects cycles and incompatibilities.
//! 5. **Extraction** emits planned nodes in dependency-first order.
//!
//! Fetches within a round run on a bounded stream (`jobs` at a time). Results
//! are applied to the graph on the calling task in request order, so the plan
//! does not depend on which fetch finished first.

use super::closure::not_installed;
use super::dependency_graph::{DependencyGraph, Edge, NodeOperation, format_cycles};
use crate::constants::DEFAULT_JOBS;
use crate::core::ModpmError;
use crate::installed::InstalledMods;
use crate::models::{ModId, ModSpec, VersionSelector};
use crate::registry::{RegistryClient, Release};
use crate::version::Version;
use anyhow::Result;
use futures::{StreamExt, TryStreamExt, stream};
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, warn};

/// What to do with one MOD of an install plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanAction {
    /// Download `release`; `enable` decides the resulting MOD list flag
    Install {
        /// Selected registry release
        release: Release,
        /// Whether the MOD ends up enabled
        enable: bool,
    },
    /// Enable the installed MOD
    Enable,
}

/// One step of an install plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanItem {
    /// MOD identity
    pub id: ModId,
    /// Step to perform
    pub action: PlanAction,
}

/// Result of install or update planning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallPlan {
    /// Steps in dependency-first order
    pub items: Vec<PlanItem>,
    /// Skipped dependencies and other non-fatal findings
    pub warnings: Vec<String>,
    /// Requested MODs already installed and enabled at the selected version
    pub already_installed: Vec<(ModId, Version)>,
}

impl InstallPlan {
    /// Whether the plan changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Releases to download, in plan order.
    pub fn downloads(&self) -> impl Iterator<Item = (&ModId, &Release)> {
        self.items.iter().filter_map(|item| match &item.action {
            PlanAction::Install {
                release,
                ..
            } => Some((&item.id, release)),
            PlanAction::Enable => None,
        })
    }
}

/// Whether planning installs new MODs or updates installed ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Install,
    Update,
}

/// Multi-round planner resolving MODs against a [`RegistryClient`].
pub struct InstallPlanner<'a, R: RegistryClient> {
    registry: &'a R,
    jobs: usize,
}

impl<'a, R: RegistryClient> InstallPlanner<'a, R> {
    /// Create a planner with the default concurrency.
    pub fn new(registry: &'a R) -> Self {
        Self {
            registry,
            jobs: DEFAULT_JOBS,
        }
    }

    /// Limit concurrent registry requests per round.
    #[must_use]
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Plan installing `specs` and their missing dependencies.
    ///
    /// `graph` is extended in place with a node per selected release.
    pub async fn plan(
        &self,
        graph: &mut DependencyGraph,
        installed: &InstalledMods,
        specs: &[ModSpec],
    ) -> Result<InstallPlan> {
        let specs = dedup_specs(specs);
        for spec in &specs {
            reject_builtin(&spec.id)?;
        }

        let game = game_version(graph);
        let resolved = self.resolve_targets(&specs, game).await?;
        self.plan_resolved(graph, installed, resolved, Vec::new(), Mode::Install).await
    }

    /// Plan updating `names` (every installed MOD when empty) to their latest
    /// compatible releases.
    ///
    /// Only MODs with a release newer than their highest installed version are
    /// planned. Disabled MODs stay disabled. When updating everything, MODs the
    /// registry cannot serve are skipped with a warning.
    pub async fn plan_update(
        &self,
        graph: &mut DependencyGraph,
        installed: &InstalledMods,
        names: &[ModId],
    ) -> Result<InstallPlan> {
        let update_all = names.is_empty();
        let targets: Vec<ModId> = if update_all {
            installed.ids().filter(|id| !id.is_builtin()).cloned().collect()
        } else {
            for name in names {
                reject_builtin(name)?;
                if !installed.contains(name.as_str()) {
                    return Err(not_installed(graph, name.as_str()));
                }
            }
            names.to_vec()
        };

        let specs: Vec<ModSpec> =
            dedup_specs(&targets.iter().map(|id| ModSpec::latest(id.as_str())).collect::<Vec<_>>());
        let game = game_version(graph);

        let (resolved, warnings) = if update_all {
            self.resolve_targets_lenient(&specs, game).await
        } else {
            (self.resolve_targets(&specs, game).await?, Vec::new())
        };

        let newer: Vec<(ModSpec, Release)> = resolved
            .into_iter()
            .filter(|(spec, release)| {
                let current = installed.latest(spec.id.as_str()).map(|artifact| artifact.version);
                let is_newer = current.is_none_or(|current| release.version > current);
                if !is_newer {
                    debug!("'{}' is up to date", spec.id);
                }
                is_newer
            })
            .collect();

        self.plan_resolved(graph, installed, newer, warnings, Mode::Update).await
    }

    /// Round 0: resolve every explicit target, failing on the first error.
    async fn resolve_targets(
        &self,
        specs: &[ModSpec],
        game: Option<Version>,
    ) -> Result<Vec<(ModSpec, Release)>> {
        let completed = AtomicUsize::new(0);
        let total = specs.len();

        let mut resolved: Vec<(usize, ModSpec, Release)> =
            stream::iter(specs.iter().cloned().enumerate())
                .map(|(index, spec)| self.fetch_target(index, spec, game, &completed, total))
                .buffer_unordered(self.jobs)
                .try_collect()
                .await?;

        resolved.sort_by_key(|(index, ..)| *index);
        Ok(resolved.into_iter().map(|(_, spec, release)| (spec, release)).collect())
    }

    /// Round 0 for bulk updates: failures become warnings.
    async fn resolve_targets_lenient(
        &self,
        specs: &[ModSpec],
        game: Option<Version>,
    ) -> (Vec<(ModSpec, Release)>, Vec<String>) {
        let completed = AtomicUsize::new(0);
        let total = specs.len();

        let results: Vec<Result<(usize, ModSpec, Release), ModpmError>> =
            stream::iter(specs.iter().cloned().enumerate())
                .map(|(index, spec)| self.fetch_target(index, spec, game, &completed, total))
                .buffer_unordered(self.jobs)
                .collect()
                .await;

        let mut resolved = Vec::new();
        let mut warnings = Vec::new();
        for result in results {
            match result {
                Ok(entry) => resolved.push(entry),
                Err(e) => {
                    warn!("Skipping update: {e}");
                    warnings.push(e.to_string());
                }
            }
        }
        warnings.sort();
        resolved.sort_by_key(|(index, ..)| *index);
        (resolved.into_iter().map(|(_, spec, release)| (spec, release)).collect(), warnings)
    }

    async fn fetch_target(
        &self,
        index: usize,
        spec: ModSpec,
        game: Option<Version>,
        completed: &AtomicUsize,
        total: usize,
    ) -> Result<(usize, ModSpec, Release), ModpmError> {
        let registry_mod = self.registry.fetch_mod(spec.id.as_str()).await.map_err(|e| {
            ModpmError::RegistryUnavailable {
                name: spec.id.to_string(),
                reason: e.to_string(),
            }
        })?;

        let release = match spec.version {
            VersionSelector::Exact(version) => registry_mod.release(&version),
            VersionSelector::Latest => registry_mod.latest_release(game.as_ref()),
        };
        let release = release.cloned().ok_or_else(|| ModpmError::ReleaseNotFound {
            name: spec.id.to_string(),
            requirement: match (spec.version, game) {
                (VersionSelector::Exact(version), _) => format!("version {version}"),
                (VersionSelector::Latest, Some(game)) => {
                    format!("game version {}.{}", game.major, game.minor)
                }
                (VersionSelector::Latest, None) => "any version".to_string(),
            },
        })?;

        let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Resolved {}@{} ({done}/{total})", spec.id, release.version);
        Ok((index, spec, release))
    }

    /// A frontier fetch; every failure is reported as a transitive one.
    async fn fetch_dependency(
        &self,
        index: usize,
        edge: Edge,
        game: Option<Version>,
    ) -> (usize, Edge, Result<Release, ModpmError>) {
        let unavailable = |reason: String| ModpmError::RegistryUnavailableTransitive {
            requester: edge.from.to_string(),
            name: edge.to.to_string(),
            reason,
        };

        let result = match self.registry.fetch_mod(edge.to.as_str()).await {
            Ok(registry_mod) => registry_mod
                .latest_satisfying(&edge.requirement, game.as_ref())
                .cloned()
                .ok_or_else(|| unavailable(format!("no release matches {}", edge.requirement))),
            Err(e) => Err(unavailable(e.to_string())),
        };
        (index, edge, result)
    }

    async fn plan_resolved(
        &self,
        graph: &mut DependencyGraph,
        installed: &InstalledMods,
        resolved: Vec<(ModSpec, Release)>,
        mut warnings: Vec<String>,
        mode: Mode,
    ) -> Result<InstallPlan> {
        let game = game_version(graph);
        let mut processed: HashSet<ModId> = HashSet::new();
        let mut dormant: HashSet<ModId> = HashSet::new();
        let mut already_installed = Vec::new();
        let mut frontier = Vec::new();

        for (spec, release) in resolved {
            processed.insert(spec.id.clone());

            if mode == Mode::Install && installed.contains_version(spec.id.as_str(), &release.version)
            {
                let enabled = graph.node(spec.id.as_str()).is_some_and(|node| node.enabled);
                if enabled {
                    info!("{}@{} is already installed", spec.id, release.version);
                    already_installed.push((spec.id.clone(), release.version));
                } else {
                    graph.set_node_operation(spec.id.as_str(), NodeOperation::Enable);
                    frontier.push(spec.id.clone());
                }
                continue;
            }

            let manifest = release.manifest(&spec.id)?;
            if mode == Mode::Update && !graph.node(spec.id.as_str()).is_some_and(|node| node.enabled) {
                dormant.insert(spec.id.clone());
            } else {
                frontier.push(spec.id.clone());
            }
            graph.add_uninstalled_mod(&manifest, release);
        }

        let mut round = 1;
        while !frontier.is_empty() {
            let pending = collect_pending(graph, &frontier, &mut processed);
            if pending.is_empty() {
                break;
            }
            debug!("Resolution round {round}: fetching {} dependencies", pending.len());

            let mut fetched: Vec<(usize, Edge, Result<Release, ModpmError>)> =
                stream::iter(pending.into_iter().enumerate())
                    .map(|(index, edge)| self.fetch_dependency(index, edge, game))
                    .buffer_unordered(self.jobs)
                    .collect()
                    .await;
            fetched.sort_by_key(|(index, ..)| *index);

            let mut next = Vec::new();
            for (_, edge, result) in fetched {
                let manifest = result.and_then(|release| {
                    release
                        .manifest(&edge.to)
                        .map(|manifest| (manifest, release))
                        .map_err(|e| ModpmError::RegistryUnavailableTransitive {
                            requester: edge.from.to_string(),
                            name: edge.to.to_string(),
                            reason: e.to_string(),
                        })
                });
                match manifest {
                    Ok((manifest, release)) => {
                        graph.add_uninstalled_mod(&manifest, release);
                        next.push(edge.to);
                    }
                    Err(e) => {
                        warn!("Skipping dependency: {e}");
                        warnings.push(e.to_string());
                    }
                }
            }
            frontier = next;
            round += 1;
        }

        mark_enable_closure(graph, &dormant);
        warnings.extend(unsatisfied_requirements(graph, &dormant));
        check_gate(graph, &dormant)?;

        let mut items = Vec::new();
        for id in graph.topological_order()? {
            let Some(node) = graph.node(id.as_str()) else {
                continue;
            };
            let action = match (node.operation, &node.release) {
                (NodeOperation::None, _) => continue,
                (NodeOperation::Enable, _) => PlanAction::Enable,
                (NodeOperation::Install, Some(release)) => PlanAction::Install {
                    release: release.clone(),
                    enable: !dormant.contains(&id),
                },
                (NodeOperation::Install, None) => continue,
            };
            items.push(PlanItem {
                id,
                action,
            });
        }

        info!("Planned {} steps with {} warnings", items.len(), warnings.len());
        Ok(InstallPlan {
            items,
            warnings,
            already_installed,
        })
    }
}

fn dedup_specs(specs: &[ModSpec]) -> Vec<ModSpec> {
    let mut seen = HashSet::new();
    specs.iter().filter(|spec| seen.insert(spec.id.clone())).cloned().collect()
}

fn reject_builtin(id: &ModId) -> Result<()> {
    if id.is_builtin() {
        return Err(ModpmError::InvalidTarget {
            name: id.to_string(),
            reason: "the base game and expansions ship with the game".to_string(),
        }
        .into());
    }
    Ok(())
}

/// Version of the installed base game, used to filter releases.
fn game_version(graph: &DependencyGraph) -> Option<Version> {
    graph.node(crate::constants::BASE_MOD).and_then(|node| node.resolved_version)
}

/// Required edges of `frontier` whose targets still need a fetch, one per target.
fn collect_pending(
    graph: &DependencyGraph,
    frontier: &[ModId],
    processed: &mut HashSet<ModId>,
) -> Vec<Edge> {
    let mut pending = Vec::new();
    for requester in frontier {
        for edge in graph.edges_from(requester.as_str()).iter().filter(|edge| edge.is_required()) {
            if edge.to.is_builtin() || graph.contains(edge.to.as_str()) {
                continue;
            }
            if processed.insert(edge.to.clone()) {
                pending.push(edge.clone());
            }
        }
    }
    pending
}

/// Mark installed, disabled dependencies of planned MODs for enabling.
fn mark_enable_closure(graph: &mut DependencyGraph, dormant: &HashSet<ModId>) {
    let mut queue: VecDeque<ModId> = graph
        .nodes()
        .iter()
        .filter(|node| node.is_planned() && !dormant.contains(&node.id))
        .map(|node| node.id.clone())
        .collect();
    let mut visited = HashSet::new();

    while let Some(current) = queue.pop_front() {
        if !visited.insert(current.clone()) {
            continue;
        }
        let targets: Vec<ModId> = graph
            .edges_from(current.as_str())
            .iter()
            .filter(|edge| edge.is_required())
            .filter_map(|edge| graph.node(edge.to.as_str()))
            .filter(|node| node.installed && !node.enabled && node.operation == NodeOperation::None)
            .map(|node| node.id.clone())
            .collect();

        for target in targets {
            debug!("Enabling dependency '{target}' of '{current}'");
            graph.set_node_operation(target.as_str(), NodeOperation::Enable);
            queue.push_back(target);
        }
    }
}

/// Warnings for planned MODs whose existing dependencies fail a requirement.
fn unsatisfied_requirements(graph: &DependencyGraph, dormant: &HashSet<ModId>) -> Vec<String> {
    let mut warnings = Vec::new();
    for node in graph.nodes().iter().filter(|node| node.is_planned() && !dormant.contains(&node.id)) {
        for edge in graph.edges_from(node.id.as_str()).iter().filter(|edge| edge.is_required()) {
            let Some(target) = graph.node(edge.to.as_str()) else {
                continue;
            };
            let satisfied =
                target.resolved_version.is_some_and(|version| edge.requirement.satisfied_by(&version));
            if !satisfied {
                let found = target.resolved_version.map_or_else(|| "none".to_string(), |v| v.to_string());
                warnings.push(
                    ModpmError::VersionMismatch {
                        requester: edge.from.to_string(),
                        dependency: edge.to.to_string(),
                        requirement: edge.requirement.to_string(),
                        found,
                    }
                    .to_string(),
                );
            }
        }
    }
    warnings
}

/// Reject cycles anywhere and incompatibilities touching planned MODs.
fn check_gate(graph: &DependencyGraph, dormant: &HashSet<ModId>) -> Result<()> {
    let cycles = graph.cycles();
    if !cycles.is_empty() {
        return Err(ModpmError::CircularDependency {
            chain: format_cycles(&cycles),
        }
        .into());
    }

    let active = |id: &ModId| {
        graph
            .node(id.as_str())
            .is_some_and(|node| node.enabled || (node.is_planned() && !dormant.contains(id)))
    };

    for node in graph.nodes().iter().filter(|node| node.is_planned() && !dormant.contains(&node.id)) {
        let incoming = graph.edges_to(node.id.as_str());
        let declared_by_others =
            incoming.iter().filter(|edge| edge.is_incompatible()).map(|edge| &edge.from);
        let declared_by_self = graph
            .edges_from(node.id.as_str())
            .iter()
            .filter(|edge| edge.is_incompatible())
            .map(|edge| &edge.to);

        for other in declared_by_self.chain(declared_by_others) {
            if *other != node.id && active(other) {
                return Err(ModpmError::Conflict {
                    mod_a: node.id.to_string(),
                    mod_b: other.to_string(),
                }
                .into());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RegistryError;
    use crate::test_utils::{MockRegistry, ModSetBuilder};
    use std::time::Duration;

    fn spec(raw: &str) -> ModSpec {
        raw.parse().unwrap()
    }

    fn names(plan: &InstallPlan) -> Vec<&str> {
        plan.items.iter().map(|item| item.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_install_resolves_unknown_dependency_first() {
        let registry = MockRegistry::new()
            .with_release("mod-a", "1.0.0", &["base", "mod-c >= 1.0"])
            .with_release("mod-c", "1.2.0", &["base"]);
        let state = ModSetBuilder::new().build();
        let mut graph = state.graph();

        let plan = InstallPlanner::new(&registry)
            .plan(&mut graph, &state.installed, &[spec("mod-a")])
            .await
            .unwrap();

        assert_eq!(names(&plan), vec!["mod-c", "mod-a"]);
        assert!(plan.warnings.is_empty());
        assert_eq!(registry.fetch_count("base"), 0);
    }

    #[tokio::test]
    async fn test_listed_but_missing_dependency_is_fetched() {
        let registry = MockRegistry::new()
            .with_release("mod-a", "1.0.0", &["mod-c", "! ghost"])
            .with_release("mod-c", "1.0.0", &[]);
        let state = ModSetBuilder::new().listed("mod-c", true).listed("ghost", true).build();
        let mut graph = state.graph();

        let plan = InstallPlanner::new(&registry)
            .plan(&mut graph, &state.installed, &[spec("mod-a")])
            .await
            .unwrap();

        assert_eq!(names(&plan), vec!["mod-c", "mod-a"]);
        assert!(plan.warnings.is_empty(), "{:?}", plan.warnings);
        assert_eq!(registry.fetch_count("mod-c"), 1);
    }

    #[tokio::test]
    async fn test_explicit_target_failure_is_fatal() {
        let registry = MockRegistry::new();
        let state = ModSetBuilder::new().build();
        let mut graph = state.graph();

        let err = InstallPlanner::new(&registry)
            .plan(&mut graph, &state.installed, &[spec("nope")])
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ModpmError>(),
            Some(ModpmError::RegistryUnavailable { name, .. }) if name == "nope"
        ));

        let registry = MockRegistry::new().with_release("a", "1.0.0", &[]);
        let err = InstallPlanner::new(&registry)
            .plan(&mut graph, &state.installed, &[spec("a@9.9.9")])
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ModpmError>(),
            Some(ModpmError::ReleaseNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_transitive_failures_become_warnings() {
        let registry = MockRegistry::new()
            .with_release("a", "1.0.0", &["missing", "flaky", "too-old >= 2.0"])
            .with_release("too-old", "1.0.0", &[])
            .with_failure(
                "flaky",
                RegistryError::Http {
                    name: "flaky".to_string(),
                    message: "HTTP 503".to_string(),
                    transient: true,
                },
            );
        let state = ModSetBuilder::new().build();
        let mut graph = state.graph();

        let plan = InstallPlanner::new(&registry)
            .plan(&mut graph, &state.installed, &[spec("a")])
            .await
            .unwrap();

        assert_eq!(names(&plan), vec!["a"]);
        assert_eq!(plan.warnings.len(), 3);
        assert!(plan.warnings[0].contains("'missing' of 'a'"));
        assert!(plan.warnings[1].contains("HTTP 503"));
        assert!(plan.warnings[2].contains("no release matches >= 2.0.0"));
    }

    #[tokio::test]
    async fn test_commit_order_ignores_completion_order() {
        let registry = MockRegistry::new()
            .with_release("top", "1.0.0", &["slow", "fast"])
            .with_release("slow", "1.0.0", &["shared"])
            .with_release("fast", "1.0.0", &["shared"])
            .with_release("shared", "1.0.0", &[])
            .with_delay("slow", Duration::from_millis(50));
        let state = ModSetBuilder::new().build();
        let mut graph = state.graph();

        let plan = InstallPlanner::new(&registry)
            .with_jobs(4)
            .plan(&mut graph, &state.installed, &[spec("top")])
            .await
            .unwrap();

        let order: Vec<&str> = graph.nodes().iter().map(|node| node.id.as_str()).collect();
        assert_eq!(order, vec!["top", "slow", "fast", "shared"]);
        assert_eq!(registry.fetch_count("shared"), 1);
        assert_eq!(plan.items.len(), 4);
        assert_eq!(plan.items[3].id.as_str(), "top");
    }

    #[tokio::test]
    async fn test_already_installed_target() {
        let registry = MockRegistry::new()
            .with_release("on", "1.0.0", &[])
            .with_release("off", "1.0.0", &["dep"]);
        let state = ModSetBuilder::new()
            .enabled("on", "1.0.0", &[])
            .disabled("off", "1.0.0", &["dep"])
            .disabled("dep", "1.0.0", &[])
            .build();
        let mut graph = state.graph();

        let plan = InstallPlanner::new(&registry)
            .plan(&mut graph, &state.installed, &[spec("on"), spec("off")])
            .await
            .unwrap();

        assert_eq!(plan.already_installed, vec![(ModId::new("on"), Version::new(1, 0, 0))]);
        assert_eq!(names(&plan), vec!["dep", "off"]);
        assert!(plan.items.iter().all(|item| item.action == PlanAction::Enable));
        assert_eq!(plan.downloads().count(), 0);
    }

    #[tokio::test]
    async fn test_install_enables_disabled_installed_dependency() {
        let registry = MockRegistry::new().with_release("a", "1.0.0", &["lib"]);
        let state = ModSetBuilder::new().disabled("lib", "0.5.0", &[]).build();
        let mut graph = state.graph();

        let plan = InstallPlanner::new(&registry)
            .plan(&mut graph, &state.installed, &[spec("a")])
            .await
            .unwrap();

        assert_eq!(names(&plan), vec!["lib", "a"]);
        assert_eq!(plan.items[0].action, PlanAction::Enable);
        assert_eq!(registry.fetch_count("lib"), 0);
    }

    #[tokio::test]
    async fn test_conflict_gate_checks_both_directions() {
        let registry = MockRegistry::new()
            .with_release("a", "1.0.0", &["! c"])
            .with_release("b", "1.0.0", &[]);
        let state = ModSetBuilder::new()
            .enabled("c", "1.0.0", &[])
            .enabled("d", "1.0.0", &["! b"])
            .build();

        let mut graph = state.graph();
        let err = InstallPlanner::new(&registry)
            .plan(&mut graph, &state.installed, &[spec("a")])
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ModpmError>(),
            Some(ModpmError::Conflict { mod_a, mod_b }) if mod_a == "a" && mod_b == "c"
        ));

        let mut graph = state.graph();
        let err = InstallPlanner::new(&registry)
            .plan(&mut graph, &state.installed, &[spec("b")])
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ModpmError>(),
            Some(ModpmError::Conflict { mod_a, mod_b }) if mod_a == "b" && mod_b == "d"
        ));
    }

    #[tokio::test]
    async fn test_cycle_gate() {
        let registry = MockRegistry::new()
            .with_release("a", "1.0.0", &["b"])
            .with_release("b", "1.0.0", &["a"]);
        let state = ModSetBuilder::new().build();
        let mut graph = state.graph();

        let err = InstallPlanner::new(&registry)
            .plan(&mut graph, &state.installed, &[spec("a")])
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ModpmError>(),
            Some(ModpmError::CircularDependency { chain }) if chain == "a -> b -> a"
        ));
    }

    #[tokio::test]
    async fn test_game_version_filters_latest() {
        let registry = MockRegistry::new()
            .with_game_release("m", "2.0.0", Some("2.0"), &[])
            .with_game_release("m", "1.9.0", Some("1.1"), &[]);
        let state = ModSetBuilder::new().base("2.0.28").build();
        let mut graph = state.graph();

        let plan = InstallPlanner::new(&registry)
            .plan(&mut graph, &state.installed, &[spec("m")])
            .await
            .unwrap();
        let (_, release) = plan.downloads().next().unwrap();
        assert_eq!(release.version, Version::new(2, 0, 0));
    }

    #[tokio::test]
    async fn test_builtin_targets_are_rejected() {
        let registry = MockRegistry::new();
        let state = ModSetBuilder::new().build();
        let mut graph = state.graph();

        let err = InstallPlanner::new(&registry)
            .plan(&mut graph, &state.installed, &[spec("space-age")])
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ModpmError>(),
            Some(ModpmError::InvalidTarget { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_plans_only_newer_releases() {
        let registry = MockRegistry::new()
            .with_release("fresh", "1.0.0", &[])
            .with_release("stale", "1.0.0", &[])
            .with_release("stale", "1.1.0", &["new-dep"])
            .with_release("new-dep", "0.1.0", &[])
            .with_release("sleeping", "2.0.0", &["never-fetched"]);
        let state = ModSetBuilder::new()
            .enabled("fresh", "1.0.0", &[])
            .enabled("stale", "1.0.0", &[])
            .disabled("sleeping", "1.0.0", &[])
            .unlisted("gone-upstream", "1.0.0", &[])
            .build();
        let mut graph = state.graph();

        let plan = InstallPlanner::new(&registry)
            .plan_update(&mut graph, &state.installed, &[])
            .await
            .unwrap();

        let planned = names(&plan);
        let mut sorted = planned.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec!["new-dep", "sleeping", "stale"]);
        let position = |name: &str| planned.iter().position(|n| *n == name).unwrap();
        assert!(position("new-dep") < position("stale"));

        let sleeping = plan.items.iter().find(|item| item.id.as_str() == "sleeping").unwrap();
        assert!(matches!(sleeping.action, PlanAction::Install { enable: false, .. }));
        assert_eq!(registry.fetch_count("never-fetched"), 0);
        assert_eq!(plan.warnings.len(), 1);
        assert!(plan.warnings[0].contains("gone-upstream"));
    }

    #[tokio::test]
    async fn test_update_named_mod_must_be_installed() {
        let registry = MockRegistry::new();
        let state = ModSetBuilder::new().enabled("helmod", "1.0.0", &[]).build();
        let mut graph = state.graph();

        let err = InstallPlanner::new(&registry)
            .plan_update(&mut graph, &state.installed, &[ModId::new("helmdo")])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Did you mean 'helmod'?"));
    }
}
