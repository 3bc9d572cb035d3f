//! Dependency graph over MOD identities.
//!
//! The graph holds one [`Node`] per MOD identity and one [`Edge`] per dependency
//! entry of that node's manifest. Edges keep every [`DependencyKind`] for
//! display, but the algorithms here only follow required edges between nodes
//! that exist. An edge whose target has no node is "dangling" and simply
//! ignored by cycle detection and ordering.
//!
//! A graph is built fresh for every command from the installed artifacts and
//! the MOD list ([`DependencyGraph::build`]). Install planning extends it in
//! place with speculative nodes for releases that are not installed yet
//! ([`DependencyGraph::add_uninstalled_mod`]).
//!
//! # Algorithms
//!
//! - Strongly connected components (Tarjan) over the required subgraph, with a
//!   filtered variant for "enabled nodes only"
//! - Topological order, dependencies first
//! - Reverse lookup of enabled dependents

use crate::core::ModpmError;
use crate::installed::InstalledMods;
use crate::manifest::{DependencyKind, ModManifest};
use crate::models::ModId;
use crate::modlist::ModList;
use crate::registry::Release;
use crate::version::{Version, VersionRequirement};
use anyhow::Result;
use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Planner-assigned intent for a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeOperation {
    /// Leave the MOD as it is
    #[default]
    None,
    /// Download and enable the node's release
    Install,
    /// Enable the installed, disabled MOD
    Enable,
}

/// One MOD identity in the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// MOD identity
    pub id: ModId,
    /// Whether any version is on disk
    pub installed: bool,
    /// Whether the MOD list enables it
    pub enabled: bool,
    /// Version the outgoing edges were taken from
    pub resolved_version: Option<Version>,
    /// Planner scratch state
    pub operation: NodeOperation,
    /// Registry release chosen for an `Install` node
    pub release: Option<Release>,
}

impl Node {
    fn new(id: ModId, installed: bool, enabled: bool, resolved_version: Option<Version>) -> Self {
        Self {
            id,
            installed,
            enabled,
            resolved_version,
            operation: NodeOperation::None,
            release: None,
        }
    }

    /// Whether a planner scheduled work for this node.
    #[must_use]
    pub fn is_planned(&self) -> bool {
        self.operation != NodeOperation::None
    }

    /// Whether the node is enabled now or will be after the plan runs.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.enabled || self.is_planned()
    }
}

/// A typed dependency from one node's manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    /// Declaring MOD (always has a node)
    pub from: ModId,
    /// Target MOD (may have no node)
    pub to: ModId,
    /// Dependency kind
    pub kind: DependencyKind,
    /// Requirement on the target's version
    pub requirement: VersionRequirement,
}

impl Edge {
    /// Whether this is a required dependency.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.kind == DependencyKind::Required
    }

    /// Whether this declares an incompatibility.
    #[must_use]
    pub fn is_incompatible(&self) -> bool {
        self.kind == DependencyKind::Incompatible
    }
}

/// Node and edge store keyed by MOD identity.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: Vec<Node>,
    index: HashMap<ModId, usize>,
    /// Outgoing edges, parallel to `nodes`
    outgoing: Vec<Vec<Edge>>,
    /// Target name to `(node, edge)` positions in `outgoing`, in insertion order
    incoming: HashMap<ModId, Vec<(usize, usize)>>,
}

impl DependencyGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph for the installed artifacts and MOD list.
    ///
    /// Each installed MOD becomes a node whose version is the pinned one when
    /// that version is installed, otherwise the highest installed version.
    /// MOD list entries without an artifact get no node; the validator reports
    /// them from the MOD list itself.
    pub fn build(installed: &InstalledMods, mod_list: &ModList) -> Self {
        let mut graph = Self::new();

        for id in installed.ids() {
            let pinned = mod_list
                .version(id.as_str())
                .filter(|version| installed.contains_version(id.as_str(), version));
            let artifact = match pinned {
                Some(version) => installed.get(id.as_str(), &version),
                None => installed.latest(id.as_str()),
            };
            let Some(artifact) = artifact else {
                continue;
            };

            let enabled = id.is_base() || mod_list.is_enabled(id.as_str());
            let idx = graph.push_node(Node::new(id.clone(), true, enabled, Some(artifact.version)));
            graph.replace_edges(idx, &artifact.manifest);
        }

        debug!(
            "Built dependency graph with {} nodes and {} edges",
            graph.nodes.len(),
            graph.edge_count()
        );
        graph
    }

    fn push_node(&mut self, node: Node) -> usize {
        let idx = self.nodes.len();
        self.index.insert(node.id.clone(), idx);
        self.nodes.push(node);
        self.outgoing.push(Vec::new());
        idx
    }

    fn replace_edges(&mut self, idx: usize, manifest: &ModManifest) {
        for edge in &self.outgoing[idx] {
            if let Some(positions) = self.incoming.get_mut(edge.to.as_str()) {
                positions.retain(|(from, _)| *from != idx);
            }
        }

        let from = self.nodes[idx].id.clone();
        let edges: Vec<Edge> = manifest
            .dependencies
            .iter()
            .map(|dep| Edge {
                from: from.clone(),
                to: dep.target.clone(),
                kind: dep.kind,
                requirement: dep.requirement,
            })
            .collect();

        for (pos, edge) in edges.iter().enumerate() {
            self.incoming.entry(edge.to.clone()).or_default().push((idx, pos));
        }
        self.outgoing[idx] = edges;
    }

    /// Whether `id` has a node.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// The node for `id`.
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&idx| &self.nodes[idx])
    }

    /// All nodes in insertion order.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Total number of edges, dangling ones included.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.outgoing.iter().map(Vec::len).sum()
    }

    /// Edges declared by `id`, in manifest order.
    #[must_use]
    pub fn edges_from(&self, id: &str) -> &[Edge] {
        self.index.get(id).map_or(&[], |&idx| self.outgoing[idx].as_slice())
    }

    /// Edges pointing at `id`, in insertion order.
    #[must_use]
    pub fn edges_to(&self, id: &str) -> Vec<&Edge> {
        self.incoming
            .get(id)
            .map(|positions| positions.iter().map(|&(from, pos)| &self.outgoing[from][pos]).collect())
            .unwrap_or_default()
    }

    /// Add a node for a release that is not installed yet.
    ///
    /// The node is marked [`NodeOperation::Install`] and its outgoing edges
    /// come from `manifest`. When `manifest.name` already has a node (an
    /// update), its edges, version and release are replaced while the
    /// installed and enabled flags are kept.
    pub fn add_uninstalled_mod(&mut self, manifest: &ModManifest, release: Release) {
        let idx = match self.index.get(manifest.name.as_str()) {
            Some(&idx) => idx,
            None => self.push_node(Node::new(manifest.name.clone(), false, false, None)),
        };

        let node = &mut self.nodes[idx];
        node.resolved_version = Some(manifest.version);
        node.operation = NodeOperation::Install;
        node.release = Some(release);
        self.replace_edges(idx, manifest);
    }

    /// Set the planner operation of `id`. Returns `false` when there is no node.
    pub fn set_node_operation(&mut self, id: &str, operation: NodeOperation) -> bool {
        match self.index.get(id) {
            Some(&idx) => {
                self.nodes[idx].operation = operation;
                true
            }
            None => false,
        }
    }

    /// Petgraph view of the required edges between included nodes.
    ///
    /// Every node is present so that petgraph indices equal ours; excluded
    /// nodes simply have no edges.
    fn required_graph(&self, include: &dyn Fn(&Node) -> bool) -> DiGraph<(), ()> {
        let mut graph = DiGraph::with_capacity(self.nodes.len(), self.edge_count());
        for _ in &self.nodes {
            graph.add_node(());
        }

        for (from, edges) in self.outgoing.iter().enumerate() {
            if !include(&self.nodes[from]) {
                continue;
            }
            for edge in edges.iter().filter(|edge| edge.is_required()) {
                if let Some(&to) = self.index.get(edge.to.as_str()) {
                    if include(&self.nodes[to]) {
                        graph.update_edge(NodeIndex::new(from), NodeIndex::new(to), ());
                    }
                }
            }
        }
        graph
    }

    /// Components as node positions in traversal order, with a nontrivial flag.
    fn components(&self, include: &dyn Fn(&Node) -> bool) -> Vec<(Vec<usize>, bool)> {
        let graph = self.required_graph(include);

        let mut components: Vec<(Vec<usize>, bool)> = tarjan_scc(&graph)
            .into_iter()
            .map(|component| component.into_iter().map(NodeIndex::index).collect::<Vec<_>>())
            .filter(|members| members.iter().all(|&idx| include(&self.nodes[idx])))
            .map(|members| {
                let nontrivial = members.len() > 1
                    || graph.contains_edge(NodeIndex::new(members[0]), NodeIndex::new(members[0]));
                (Self::traversal_order(&graph, &members), nontrivial)
            })
            .collect();

        components.sort_by_key(|(members, _)| members[0]);
        components
    }

    /// Depth-first order of `members`, starting from the earliest node and
    /// following edges in insertion order.
    fn traversal_order(graph: &DiGraph<(), ()>, members: &[usize]) -> Vec<usize> {
        let member_set: HashSet<usize> = members.iter().copied().collect();
        let start = members.iter().copied().min().unwrap_or_default();

        let mut order = Vec::with_capacity(members.len());
        let mut visited = HashSet::new();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            order.push(current);
            // Petgraph yields the newest edge first; the stack reverses that
            for next in graph.neighbors(NodeIndex::new(current)) {
                if member_set.contains(&next.index()) && !visited.contains(&next.index()) {
                    stack.push(next.index());
                }
            }
        }
        order
    }

    fn ids(&self, positions: &[usize]) -> Vec<ModId> {
        positions.iter().map(|&idx| self.nodes[idx].id.clone()).collect()
    }

    /// All strongly connected components of the required subgraph, singletons
    /// included.
    #[must_use]
    pub fn strongly_connected_components(&self) -> Vec<Vec<ModId>> {
        self.strongly_connected_components_among(|_| true)
    }

    /// Strongly connected components among the nodes matching `include`.
    #[must_use]
    pub fn strongly_connected_components_among(
        &self,
        include: impl Fn(&Node) -> bool,
    ) -> Vec<Vec<ModId>> {
        self.components(&include).iter().map(|(members, _)| self.ids(members)).collect()
    }

    /// Components with more than one member or a required self edge.
    #[must_use]
    pub fn cycles(&self) -> Vec<Vec<ModId>> {
        self.cycles_among(|_| true)
    }

    /// Cycles among the nodes matching `include`.
    #[must_use]
    pub fn cycles_among(&self, include: impl Fn(&Node) -> bool) -> Vec<Vec<ModId>> {
        self.components(&include)
            .iter()
            .filter(|(_, nontrivial)| *nontrivial)
            .map(|(members, _)| self.ids(members))
            .collect()
    }

    /// Whether the required subgraph has a cycle.
    #[must_use]
    pub fn is_cyclic(&self) -> bool {
        !self.cycles().is_empty()
    }

    /// Node identities with every dependency before its dependents.
    ///
    /// Only required edges between existing nodes constrain the order. A cyclic
    /// graph is reported as [`ModpmError::CircularDependency`].
    pub fn topological_order(&self) -> Result<Vec<ModId>> {
        let cycles = self.cycles();
        if !cycles.is_empty() {
            return Err(ModpmError::CircularDependency {
                chain: format_cycles(&cycles),
            }
            .into());
        }

        let graph = self.required_graph(&|_| true);
        let sorted = toposort(&graph, None).map_err(|cycle| ModpmError::CircularDependency {
            chain: self.nodes[cycle.node_id().index()].id.to_string(),
        })?;

        // Edges point from dependent to dependency
        Ok(sorted.into_iter().rev().map(|idx| self.nodes[idx.index()].id.clone()).collect())
    }

    /// Enabled MODs with a required edge to `id`, in edge insertion order.
    #[must_use]
    pub fn find_enabled_dependents(&self, id: &str) -> Vec<ModId> {
        let mut seen = HashSet::new();
        self.edges_to(id)
            .into_iter()
            .filter(|edge| edge.is_required() && edge.from.as_str() != id)
            .filter(|edge| self.node(edge.from.as_str()).is_some_and(|node| node.enabled))
            .filter(|edge| seen.insert(edge.from.clone()))
            .map(|edge| edge.from.clone())
            .collect()
    }
}

/// Render a cycle as `a -> b -> a`.
#[must_use]
pub fn format_cycle(cycle: &[ModId]) -> String {
    let mut names: Vec<&str> = cycle.iter().map(ModId::as_str).collect();
    if let Some(first) = names.first().copied() {
        names.push(first);
    }
    names.join(" -> ")
}

/// Render several cycles separated by `; `.
#[must_use]
pub fn format_cycles(cycles: &[Vec<ModId>]) -> String {
    cycles.iter().map(|cycle| format_cycle(cycle)).collect::<Vec<_>>().join("; ")
}
