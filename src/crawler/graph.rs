//! Discovery graph of a run

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub url: String,
    /// Depth at first discovery
    pub depth: u32,
    pub crawled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
}

/// Every URL seen during a run and the links between them
///
/// Nodes keep first-discovery order; the node set doubles as the run's
/// "seen" set.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiscoveryGraph {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl DiscoveryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a graph from saved nodes and edges
    pub fn from_parts(nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> Self {
        let index = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (node.url.clone(), i))
            .collect();
        Self {
            nodes,
            edges,
            index,
        }
    }

    /// Adds a node; returns false if the URL was already seen
    pub fn add_node(&mut self, url: &str, depth: u32) -> bool {
        if self.index.contains_key(url) {
            return false;
        }
        self.index.insert(url.to_string(), self.nodes.len());
        self.nodes.push(GraphNode {
            url: url.to_string(),
            depth,
            crawled: false,
        });
        true
    }

    pub fn add_edge(&mut self, from: &str, to: &str) {
        self.edges.push(GraphEdge {
            from: from.to_string(),
            to: to.to_string(),
        });
    }

    pub fn mark_crawled(&mut self, url: &str) {
        if let Some(&i) = self.index.get(url) {
            self.nodes[i].crawled = true;
        }
    }

    pub fn contains(&self, url: &str) -> bool {
        self.index.contains_key(url)
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}
