//! Dependency graph and lifecycle planning for installed MODs.
//!
//! Every lifecycle command starts from the same picture of the world: the
//! [`DependencyGraph`] built from the installed artifacts and the MOD list.
//! Planners read that graph and produce a plan; nothing here touches the disk.
//! Executing a plan is the job of [`crate::installer`].
//!
//! # Architecture Overview
//!
//! - [`dependency_graph`] - Nodes per MOD, typed edges per declared dependency,
//!   strongly connected components and topological order
//! - [`validator`] - Non-failing consistency report (`modpm check`)
//! - [`closure`] - Enable, disable and uninstall planning over local state
//! - [`install`] - Multi-round install and update planning against the registry
//!
//! # Edges and requirements
//!
//! Only *required* edges take part in ordering, cycle detection and closures.
//! Optional and hidden-optional edges are recorded for display, and
//! *incompatible* edges are checked as conflicts whenever both ends would be
//! enabled. Each edge is checked on its own against the single resolved
//! version of its target; requirements on the same MOD are never intersected.
//!
//! # Builtin MODs
//!
//! `base` and the expansions only have nodes when the game data directory was
//! scanned. A required edge to a builtin MOD without a node is treated as
//! satisfied, and planners never fetch or download builtin MODs.
//!
//! # Example
//!
//! ```rust,no_run
//! use modpm::installed::InstalledMods;
//! use modpm::modlist::ModList;
//! use modpm::resolver::{DependencyGraph, plan_enable, validate};
//! use modpm::models::ModId;
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let mods_dir = Path::new("/games/factorio/mods");
//! let installed = InstalledMods::scan(mods_dir, None)?;
//! let mod_list = ModList::load(&ModList::default_path(mods_dir))?;
//! let graph = DependencyGraph::build(&installed, &mod_list);
//!
//! let report = validate(&graph, &mod_list, &installed);
//! println!("{} errors", report.errors.len());
//!
//! let plan = plan_enable(&graph, &[ModId::new("helmod")])?;
//! println!("would enable {:?}", plan.mods);
//! # Ok(())
//! # }
//! ```

pub mod closure;
pub mod dependency_graph;
pub mod install;
pub mod validator;

pub use closure::{
    DisablePlan, EnablePlan, RemovedArtifact, UninstallItem, UninstallPlan, plan_disable,
    plan_disable_all, plan_enable, plan_uninstall, plan_uninstall_all,
};
pub use dependency_graph::{DependencyGraph, Edge, Node, NodeOperation, format_cycle, format_cycles};
pub use install::{InstallPlan, InstallPlanner, PlanAction, PlanItem};
pub use validator::{IssueKind, ValidationIssue, ValidationResult, validate};
