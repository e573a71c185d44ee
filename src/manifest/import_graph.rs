//! Import graph between stack manifests.
//!
//! Nodes are manifest identifiers and an edge `a -> b` means `a` imports `b`.
//! The graph is built while loading a stack and answers two questions: is there
//! an import cycle, and which manifests does a root import transitively.

use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeSet, HashMap, VecDeque};

/// Color states for cycle detection using DFS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Directed graph of `import:` edges.
#[derive(Debug, Default)]
pub struct ImportGraph {
    graph: DiGraph<String, ()>,
    node_map: HashMap<String, NodeIndex>,
}

impl ImportGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a manifest, returning its node index.
    pub fn ensure_node(&mut self, id: &str) -> NodeIndex {
        if let Some(&index) = self.node_map.get(id) {
            index
        } else {
            let index = self.graph.add_node(id.to_string());
            self.node_map.insert(id.to_string(), index);
            index
        }
    }

    /// Record that `importer` imports `imported`.
    pub fn add_import(&mut self, importer: &str, imported: &str) {
        let from = self.ensure_node(importer);
        let to = self.ensure_node(imported);
        if !self.graph.contains_edge(from, to) {
            self.graph.add_edge(from, to, ());
        }
    }

    /// Find an import cycle.
    ///
    /// Returns the cycle as a path that starts and ends with the same manifest,
    /// e.g. `["a", "b", "a"]`. Nodes are visited in insertion order, so the
    /// reported cycle is stable for a given load order.
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        let mut colors: HashMap<NodeIndex, Color> =
            self.graph.node_indices().map(|n| (n, Color::White)).collect();
        let mut path = Vec::new();

        for node in self.graph.node_indices() {
            if colors.get(&node) == Some(&Color::White)
                && let Some(cycle) = self.dfs_visit(node, &mut colors, &mut path)
            {
                return Some(cycle);
            }
        }
        None
    }

    fn dfs_visit(
        &self,
        node: NodeIndex,
        colors: &mut HashMap<NodeIndex, Color>,
        path: &mut Vec<NodeIndex>,
    ) -> Option<Vec<String>> {
        colors.insert(node, Color::Gray);
        path.push(node);

        // petgraph yields neighbors newest-edge first; walk them in insertion order
        let mut neighbors: Vec<NodeIndex> = self.graph.neighbors(node).collect();
        neighbors.reverse();

        for neighbor in neighbors {
            match colors.get(&neighbor) {
                Some(Color::Gray) => {
                    let start = path.iter().position(|n| *n == neighbor).unwrap_or(0);
                    let mut cycle: Vec<String> =
                        path[start..].iter().map(|n| self.graph[*n].clone()).collect();
                    cycle.push(self.graph[neighbor].clone());
                    return Some(cycle);
                }
                Some(Color::White) => {
                    if let Some(cycle) = self.dfs_visit(neighbor, colors, path) {
                        return Some(cycle);
                    }
                }
                _ => {}
            }
        }

        path.pop();
        colors.insert(node, Color::Black);
        None
    }

    /// Every manifest reachable from `root` through imports, excluding `root`
    /// unless it imports itself.
    pub fn transitive_imports(&self, root: &str) -> BTreeSet<String> {
        let mut seen = BTreeSet::new();
        let Some(&start) = self.node_map.get(root) else {
            return seen;
        };

        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            for neighbor in self.graph.neighbors(current) {
                if seen.insert(self.graph[neighbor].clone()) {
                    queue.push_back(neighbor);
                }
            }
        }
        seen
    }
}
