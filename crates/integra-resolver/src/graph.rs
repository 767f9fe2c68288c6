//! Dependency graph keyed by module coordinate.
//!
//! An edge `a -> b` means "a depends on b".

use std::collections::{HashMap, VecDeque};
use std::fmt;

use integra_core::module::ModuleRecord;
use petgraph::algo::{has_path_connecting, is_cyclic_directed, tarjan_scc};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

/// A directed "depends on" graph backed by petgraph.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    graph: DiGraph<String, ()>,
    /// Lookup from coordinate to node index.
    index: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Graph over a selected set of records. Edges are kept only when both
    /// endpoints are part of the selection; nodes follow record order.
    pub fn from_selection<'r, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'r ModuleRecord>,
    {
        let records: Vec<&ModuleRecord> = records.into_iter().collect();
        let mut graph = Self::new();
        for record in &records {
            graph.add_node(&record.coordinate);
        }
        for record in &records {
            for dep in &record.dependencies {
                if graph.contains(&dep.coordinate) {
                    graph.add_dependency(&record.coordinate, &dep.coordinate);
                }
            }
        }
        graph
    }

    /// Add or retrieve a node. If the coordinate already exists, returns the existing index.
    pub fn add_node(&mut self, coordinate: &str) -> NodeIndex {
        if let Some(&idx) = self.index.get(coordinate) {
            return idx;
        }
        let idx = self.graph.add_node(coordinate.to_string());
        self.index.insert(coordinate.to_string(), idx);
        idx
    }

    /// Record that `from` depends on `to`. Both endpoints are added as needed;
    /// adding an existing edge is a no-op.
    pub fn add_dependency(&mut self, from: &str, to: &str) {
        let from = self.add_node(from);
        let to = self.add_node(to);
        if self.graph.find_edge(from, to).is_none() {
            self.graph.add_edge(from, to, ());
        }
    }

    pub fn contains(&self, coordinate: &str) -> bool {
        self.index.contains_key(coordinate)
    }

    /// Coordinates `coordinate` depends on, in the order the edges were added.
    pub fn dependencies(&self, coordinate: &str) -> Vec<&str> {
        self.neighbors(coordinate, Direction::Outgoing)
    }

    /// Coordinates that depend on `coordinate`, in the order the edges were added.
    pub fn dependents(&self, coordinate: &str) -> Vec<&str> {
        self.neighbors(coordinate, Direction::Incoming)
    }

    fn neighbors(&self, coordinate: &str, dir: Direction) -> Vec<&str> {
        let Some(&idx) = self.index.get(coordinate) else {
            return Vec::new();
        };
        let mut edges: Vec<_> = self.graph.edges_directed(idx, dir).collect();
        edges.sort_by_key(|e| e.id());
        edges
            .into_iter()
            .map(|e| {
                let other = if dir == Direction::Outgoing {
                    e.target()
                } else {
                    e.source()
                };
                self.graph[other].as_str()
            })
            .collect()
    }

    pub fn in_degree(&self, coordinate: &str) -> usize {
        self.degree(coordinate, Direction::Incoming)
    }

    pub fn out_degree(&self, coordinate: &str) -> usize {
        self.degree(coordinate, Direction::Outgoing)
    }

    fn degree(&self, coordinate: &str, dir: Direction) -> usize {
        self.index
            .get(coordinate)
            .map(|&idx| self.graph.edges_directed(idx, dir).count())
            .unwrap_or(0)
    }

    /// Whether `to` is reachable from `from`. A known node reaches itself;
    /// unknown nodes reach nothing.
    pub fn has_path(&self, from: &str, to: &str) -> bool {
        match (self.index.get(from), self.index.get(to)) {
            (Some(&a), Some(&b)) => has_path_connecting(&self.graph, a, b, None),
            _ => false,
        }
    }

    /// Whether the graph contains a directed cycle. A self-loop counts.
    pub fn has_cycle(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }

    /// Nodes that lie on at least one cycle, in insertion order.
    pub fn cyclic_nodes(&self) -> Vec<&str> {
        let mut on_cycle: Vec<NodeIndex> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| scc.len() > 1 || self.graph.find_edge(scc[0], scc[0]).is_some())
            .flatten()
            .collect();
        on_cycle.sort();
        on_cycle
            .into_iter()
            .map(|idx| self.graph[idx].as_str())
            .collect()
    }

    /// Kahn's algorithm over "depends on" edges: every module appears before
    /// the modules it depends on. Returns `None` when the graph is cyclic.
    ///
    /// Ties are broken by node insertion order, so the result is deterministic.
    pub fn topological_sort(&self) -> Option<Vec<&str>> {
        let mut in_degree: Vec<usize> = self
            .graph
            .node_indices()
            .map(|idx| self.graph.edges_directed(idx, Direction::Incoming).count())
            .collect();

        let mut ready: VecDeque<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|idx| in_degree[idx.index()] == 0)
            .collect();

        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(idx) = ready.pop_front() {
            order.push(self.graph[idx].as_str());
            let mut edges: Vec<_> = self.graph.edges(idx).collect();
            edges.sort_by_key(|e| e.id());
            for edge in edges {
                let target = edge.target();
                in_degree[target.index()] -= 1;
                if in_degree[target.index()] == 0 {
                    ready.push_back(target);
                }
            }
        }

        (order.len() == self.graph.node_count()).then_some(order)
    }

    /// Dependency-first order: the reverse of [`Self::topological_sort`].
    pub fn load_order(&self) -> Option<Vec<&str>> {
        self.topological_sort().map(|mut order| {
            order.reverse();
            order
        })
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.graph.node_weights().map(String::as_str)
    }

    /// All `(from, to)` edges in insertion order.
    pub fn edges(&self) -> Vec<(&str, &str)> {
        self.graph
            .edge_references()
            .map(|e| (self.graph[e.source()].as_str(), self.graph[e.target()].as_str()))
            .collect()
    }

    /// Number of nodes.
    pub fn size(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn clear(&mut self) {
        self.graph.clear();
        self.index.clear();
    }
}

impl fmt::Display for DependencyGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for node in self.nodes() {
            let deps = self.dependencies(node);
            if deps.is_empty() {
                writeln!(f, "{node}")?;
            } else {
                writeln!(f, "{node} -> {}", deps.join(", "))?;
            }
        }
        Ok(())
    }
}
