use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Directed link graph over every page seen so far.
///
/// Edges are simple: adding the same edge twice, or a self-loop twice, leaves
/// one edge. A destination becomes a node as soon as an edge points at it.
/// Nodes keep their first-seen order, which is the order dump passes scan them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "GraphBlob")]
pub struct LinkGraph {
    nodes: Vec<String>,
    edges: HashMap<String, BTreeSet<String>>,
    #[serde(skip)]
    index: HashSet<String>,
}

#[derive(Deserialize)]
struct GraphBlob {
    nodes: Vec<String>,
    edges: HashMap<String, BTreeSet<String>>,
}

impl From<GraphBlob> for LinkGraph {
    fn from(blob: GraphBlob) -> Self {
        let mut graph = LinkGraph::new();
        for node in blob.nodes {
            graph.add_node(&node);
        }
        for (source, targets) in blob.edges {
            for target in targets {
                graph.add_edge(&source, &target);
            }
        }
        graph
    }
}

impl LinkGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(seed: &str) -> Self {
        let mut graph = Self::new();
        graph.add_node(seed);
        graph
    }

    /// Returns true when the node is new.
    pub fn add_node(&mut self, id: &str) -> bool {
        if self.index.contains(id) {
            return false;
        }
        self.index.insert(id.to_string());
        self.nodes.push(id.to_string());
        true
    }

    /// Returns true when the edge is new.
    pub fn add_edge(&mut self, source: &str, target: &str) -> bool {
        self.add_node(source);
        self.add_node(target);
        self.edges
            .entry(source.to_string())
            .or_default()
            .insert(target.to_string())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains(id)
    }

    /// Number of nodes (the universe size).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(BTreeSet::len).sum()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(String::as_str)
    }

    pub fn successors(&self, id: &str) -> impl Iterator<Item = &str> {
        self.edges
            .get(id)
            .into_iter()
            .flat_map(|targets| targets.iter().map(String::as_str))
    }

    pub fn has_edge(&self, source: &str, target: &str) -> bool {
        self.edges.get(source).is_some_and(|t| t.contains(target))
    }
}

/// Pages whose links have already been recorded.
///
/// Serialized as a plain `{ page: true }` map so a checkpoint can be read by
/// anything that understands JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisitedSet {
    marks: HashMap<String, bool>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&mut self, id: &str) {
        self.marks.insert(id.to_string(), true);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.marks.get(id).copied().unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.marks.values().filter(|v| **v).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.marks
            .iter()
            .filter(|(_, v)| **v)
            .map(|(k, _)| k.as_str())
    }
}
