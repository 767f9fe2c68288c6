//! Greedy dependency resolution: depth-first from each root, the highest
//! satisfying version wins, and a coordinate is selected at most once per call.
//!
//! Resolution is first-requestor-wins. A later constraint on an already
//! selected coordinate can only produce a conflict, never a re-selection.
//! Every failure is accumulated into the result; nothing is returned as an
//! error. Any conflict suppresses graph building and the load order.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use integra_core::catalog::Catalog;
use integra_core::config::{CycleReport, ResolverConfig};
use integra_core::module::{DependencyDecl, ModuleRecord};
use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::conflict::{Conflict, ConflictKind, ConflictReport};
use crate::graph::DependencyGraph;
use crate::range::VersionRange;
use crate::version::Version;

/// A coordinate that survived selection, with the reason it was chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectedVersion {
    pub coordinate: String,
    pub version: Version,
    pub reason: String,
}

/// The output of [`DependencyResolver::resolve`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResolutionResult {
    pub selected_versions: BTreeMap<String, SelectedVersion>,
    pub conflicts: ConflictReport,
    /// Records in activation order, dependencies first. Empty unless successful.
    pub load_order: Vec<ModuleRecord>,
    /// Requested coordinates that ended without a selected version.
    pub unresolved_dependencies: BTreeSet<String>,
}

impl ResolutionResult {
    pub fn is_success(&self) -> bool {
        self.conflicts.is_empty() && self.unresolved_dependencies.is_empty()
    }

    /// Version chosen for `coordinate`, if any.
    pub fn selected(&self, coordinate: &str) -> Option<&Version> {
        self.selected_versions.get(coordinate).map(|s| &s.version)
    }

    pub fn load_order_coordinates(&self) -> Vec<&str> {
        self.load_order
            .iter()
            .map(|r| r.coordinate.as_str())
            .collect()
    }
}

/// Greedy, non-backtracking resolver.
///
/// Holds only configuration; all working state lives in a per-call session,
/// so one resolver can serve concurrent callers.
#[derive(Debug, Clone, Default)]
pub struct DependencyResolver {
    config: ResolverConfig,
}

impl DependencyResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve `roots` (requested unconstrained, in order) against `catalog`.
    pub fn resolve<C, S>(&self, catalog: &C, roots: &[S]) -> ResolutionResult
    where
        C: Catalog + ?Sized,
        S: AsRef<str>,
    {
        let mut session = Session::new(catalog, &self.config);
        for root in roots {
            session.resolve(root.as_ref(), None, None);
        }
        let result = session.finish();
        debug!(
            "resolved {} modules with {} conflicts",
            result.selected_versions.len(),
            result.conflicts.len()
        );
        result
    }
}

/// Constraint carried by one dependency edge.
enum EdgeConstraint {
    Any,
    Range(VersionRange),
    /// Malformed and rejected under strict mode; the edge is skipped.
    Rejected,
}

/// Working state of one `resolve()` call.
struct Session<'a, C: ?Sized> {
    catalog: &'a C,
    config: &'a ResolverConfig,
    selected: BTreeMap<String, SelectedVersion>,
    records: HashMap<String, &'a ModuleRecord>,
    selection_order: Vec<String>,
    /// Coordinates on the active call stack, outermost first.
    stack: Vec<String>,
    on_stack: HashSet<String>,
    resolved: HashSet<String>,
    requested: BTreeSet<String>,
    conflicts: ConflictReport,
}

impl<'a, C: Catalog + ?Sized> Session<'a, C> {
    fn new(catalog: &'a C, config: &'a ResolverConfig) -> Self {
        Self {
            catalog,
            config,
            selected: BTreeMap::new(),
            records: HashMap::new(),
            selection_order: Vec::new(),
            stack: Vec::new(),
            on_stack: HashSet::new(),
            resolved: HashSet::new(),
            requested: BTreeSet::new(),
            conflicts: ConflictReport::new(),
        }
    }

    fn resolve(&mut self, coordinate: &str, constraint: Option<&VersionRange>, requester: Option<&str>) {
        self.requested.insert(coordinate.to_string());

        if self.on_stack.contains(coordinate) {
            let conflict = {
                let start = self
                    .stack
                    .iter()
                    .position(|c| c == coordinate)
                    .unwrap_or(0);
                let mut path: Vec<&str> = self.stack[start..].iter().map(String::as_str).collect();
                path.push(coordinate);
                Conflict::circular(coordinate, &path)
            };
            self.conflicts.add(conflict);
            return;
        }

        if self.resolved.contains(coordinate) {
            if let (Some(range), Some(chosen)) = (constraint, self.selected.get(coordinate)) {
                if !range.satisfies(&chosen.version) {
                    let conflict = Conflict::version_mismatch(
                        coordinate,
                        range.as_str(),
                        &chosen.version.to_string(),
                        requester.unwrap_or("root"),
                    );
                    self.conflicts.add(conflict);
                }
            }
            return;
        }

        let catalog = self.catalog;
        let records = catalog.versions(coordinate);
        if records.is_empty() {
            self.conflicts.add(Conflict::missing(coordinate, requester));
            return;
        }

        let candidates = parse_candidates(coordinate, records);
        if candidates.is_empty() {
            self.conflicts
                .add(Conflict::unreadable(coordinate, records.len()));
            return;
        }
        let any = VersionRange::any();
        let range = constraint.unwrap_or(&any);

        let mut best: Option<&(Version, &'a ModuleRecord)> = None;
        for candidate in &candidates {
            if !range.satisfies(&candidate.0) {
                trace!("{coordinate}@{} rejected by {range}", candidate.0);
                continue;
            }
            if best.map_or(true, |b| candidate.0 > b.0) {
                best = Some(candidate);
            }
        }

        let Some((version, record)) = best.cloned() else {
            let available: Vec<String> = candidates.iter().map(|(v, _)| v.to_string()).collect();
            self.conflicts
                .add(Conflict::unsatisfied(coordinate, range.as_str(), &available));
            return;
        };

        let reason = match (requester, constraint) {
            (None, _) => "direct".to_string(),
            (Some(_), Some(range)) => format!("satisfies constraint {range}"),
            (Some(_), None) => format!("satisfies constraint {any}"),
        };
        debug!("selected {coordinate}@{version} ({reason})");

        self.selected.insert(
            coordinate.to_string(),
            SelectedVersion {
                coordinate: coordinate.to_string(),
                version,
                reason,
            },
        );
        self.records.insert(coordinate.to_string(), record);
        self.selection_order.push(coordinate.to_string());

        self.stack.push(coordinate.to_string());
        self.on_stack.insert(coordinate.to_string());
        for dep in &record.dependencies {
            match self.edge_constraint(coordinate, dep) {
                EdgeConstraint::Any => self.resolve(&dep.coordinate, None, Some(coordinate)),
                EdgeConstraint::Range(range) => {
                    self.resolve(&dep.coordinate, Some(&range), Some(coordinate))
                }
                EdgeConstraint::Rejected => {}
            }
        }
        self.stack.pop();
        self.on_stack.remove(coordinate);
        self.resolved.insert(coordinate.to_string());
    }

    fn edge_constraint(&mut self, from: &str, dep: &DependencyDecl) -> EdgeConstraint {
        if dep.is_unconstrained() {
            return EdgeConstraint::Any;
        }
        let text = dep.constraint_text();
        match VersionRange::parse(text) {
            Ok(range) => EdgeConstraint::Range(range),
            Err(e) if self.config.strict_edge_constraints => {
                self.conflicts.add(
                    Conflict::new(
                        ConflictKind::UnsatisfiedConstraint,
                        &dep.coordinate,
                        format!("{from} declares a malformed constraint: {e}"),
                    )
                    .with_constraint(text)
                    .with_suggestion(format!("fix the constraint on {} in {from}", dep.coordinate)),
                );
                EdgeConstraint::Rejected
            }
            Err(e) => {
                warn!(
                    "{from}: treating malformed constraint on {} as unconstrained: {e}",
                    dep.coordinate
                );
                EdgeConstraint::Any
            }
        }
    }

    fn finish(self) -> ResolutionResult {
        let Session {
            config,
            selected,
            records,
            selection_order,
            requested,
            conflicts,
            ..
        } = self;

        let unresolved_dependencies = requested
            .into_iter()
            .filter(|c| !selected.contains_key(c))
            .collect();
        let mut result = ResolutionResult {
            selected_versions: selected,
            conflicts,
            load_order: Vec::new(),
            unresolved_dependencies,
        };
        if !result.conflicts.is_empty() {
            return result;
        }

        let graph = DependencyGraph::from_selection(
            selection_order
                .iter()
                .filter_map(|c| records.get(c).copied()),
        );
        if graph.has_cycle() {
            for conflict in cycle_conflicts(&graph, config.cycle_report) {
                result.conflicts.add(conflict);
            }
            return result;
        }

        result.load_order = graph
            .load_order()
            .unwrap_or_default()
            .into_iter()
            .filter_map(|c| records.get(c).map(|r| (*r).clone()))
            .collect();
        result
    }
}

/// Parse every catalog record's version, skipping malformed ones.
pub(crate) fn parse_candidates<'a>(
    coordinate: &str,
    records: &'a [ModuleRecord],
) -> Vec<(Version, &'a ModuleRecord)> {
    records
        .iter()
        .filter_map(|record| match Version::parse(&record.version) {
            Ok(version) => Some((version, record)),
            Err(e) => {
                warn!("skipping catalog entry for {coordinate}: {e}");
                None
            }
        })
        .collect()
}

/// Conflicts to report once the selected graph is known to be cyclic.
///
/// `Connected` flags every node with both incoming and outgoing edges, which
/// can include nodes that merely sit between two parts of the graph.
fn cycle_conflicts(graph: &DependencyGraph, mode: CycleReport) -> Vec<Conflict> {
    let nodes: Vec<&str> = match mode {
        CycleReport::Connected => graph
            .nodes()
            .filter(|n| graph.in_degree(n) > 0 && graph.out_degree(n) > 0)
            .collect(),
        CycleReport::OnCycle => graph.cyclic_nodes(),
    };
    nodes
        .into_iter()
        .map(|n| Conflict::circular(n, &[]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use integra_core::catalog::ModuleCatalog;

    fn catalog(records: Vec<ModuleRecord>) -> ModuleCatalog {
        ModuleCatalog::from_records(records)
    }

    #[test]
    fn root_reason_is_direct() {
        let cat = catalog(vec![ModuleRecord::new("t:a", "1.0.0")]);
        let result = DependencyResolver::default().resolve(&cat, &["t:a"]);
        assert!(result.is_success());
        assert_eq!(result.selected_versions["t:a"].reason, "direct");
    }

    #[test]
    fn dependency_reason_names_constraint() {
        let cat = catalog(vec![
            ModuleRecord::new("t:a", "1.0.0")
                .with_dependency("t:b", Some("^1.0.0"))
                .with_dependency("t:c", None),
            ModuleRecord::new("t:b", "1.3.0"),
            ModuleRecord::new("t:c", "0.1.0"),
        ]);
        let result = DependencyResolver::default().resolve(&cat, &["t:a"]);
        assert_eq!(
            result.selected_versions["t:b"].reason,
            "satisfies constraint ^1.0.0"
        );
        assert_eq!(result.selected_versions["t:c"].reason, "satisfies constraint *");
    }

    #[test]
    fn malformed_catalog_versions_are_skipped() {
        let cat = catalog(vec![
            ModuleRecord::new("t:a", "not-a-version"),
            ModuleRecord::new("t:a", "1.0.0"),
        ]);
        let result = DependencyResolver::default().resolve(&cat, &["t:a"]);
        assert!(result.is_success());
        assert_eq!(result.selected("t:a"), Some(&Version::new(1, 0, 0)));
    }

    #[test]
    fn unreadable_catalog_entries_are_reported_as_missing() {
        let cat = catalog(vec![
            ModuleRecord::new("t:a", "1.0.0").with_dependency("t:b", None),
            ModuleRecord::new("t:b", "one"),
            ModuleRecord::new("t:b", "1.0"),
        ]);
        let result = DependencyResolver::default().resolve(&cat, &["t:a"]);
        assert_eq!(result.conflicts.len(), 1);
        let conflict = &result.conflicts.conflicts[0];
        assert_eq!(conflict.kind, ConflictKind::MissingDependency);
        assert_eq!(
            conflict.message,
            "none of the 2 catalog entries has a readable version"
        );
        assert!(result.unresolved_dependencies.contains("t:b"));
    }

    #[test]
    fn equal_versions_keep_first_record() {
        let cat = catalog(vec![
            ModuleRecord::new("t:a", "1.0.0+first").with_dependency("t:x", None),
            ModuleRecord::new("t:a", "1.0.0+second"),
            ModuleRecord::new("t:x", "1.0.0"),
        ]);
        let result = DependencyResolver::default().resolve(&cat, &["t:a"]);
        assert_eq!(result.load_order_coordinates(), vec!["t:x", "t:a"]);
    }

    #[test]
    fn connected_heuristic_over_reports() {
        let mut g = DependencyGraph::new();
        g.add_dependency("t:root", "t:bridge");
        g.add_dependency("t:bridge", "t:a");
        g.add_dependency("t:a", "t:b");
        g.add_dependency("t:b", "t:a");

        let flagged: Vec<String> = cycle_conflicts(&g, CycleReport::Connected)
            .into_iter()
            .map(|c| c.coordinate)
            .collect();
        assert_eq!(flagged, vec!["t:bridge", "t:a", "t:b"]);

        let on_cycle: Vec<String> = cycle_conflicts(&g, CycleReport::OnCycle)
            .into_iter()
            .map(|c| c.coordinate)
            .collect();
        assert_eq!(on_cycle, vec!["t:a", "t:b"]);
    }

    #[test]
    fn cycle_conflicts_are_circular_kind() {
        let mut g = DependencyGraph::new();
        g.add_dependency("t:a", "t:a");
        let conflicts = cycle_conflicts(&g, CycleReport::Connected);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].kind, ConflictKind::CircularDependency);
    }
}
