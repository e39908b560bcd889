use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub parent: Option<String>,
    pub children: Vec<String>,
    pub depth: usize,
}

/// Rooted search tree in which every page appears at most once.
///
/// The first insertion of a page wins; later insertions of the same page under
/// any parent are ignored, so the tree records the first (shallowest) way each
/// page was reached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlTree {
    root: String,
    order: Vec<String>,
    nodes: HashMap<String, TreeNode>,
}

impl CrawlTree {
    pub fn new(root: impl Into<String>) -> Self {
        let root = root.into();
        let mut nodes = HashMap::new();
        nodes.insert(
            root.clone(),
            TreeNode {
                parent: None,
                children: Vec::new(),
                depth: 0,
            },
        );
        Self {
            order: vec![root.clone()],
            root,
            nodes,
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// Add `child` under `parent`. Returns false (and changes nothing) when the
    /// child is already in the tree or the parent is not.
    pub fn insert(&mut self, child: &str, parent: &str) -> bool {
        if self.nodes.contains_key(child) {
            return false;
        }
        let Some(parent_node) = self.nodes.get_mut(parent) else {
            return false;
        };
        parent_node.children.push(child.to_string());
        let depth = parent_node.depth + 1;

        self.nodes.insert(
            child.to_string(),
            TreeNode {
                parent: Some(parent.to_string()),
                children: Vec::new(),
                depth,
            },
        );
        self.order.push(child.to_string());
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&TreeNode> {
        self.nodes.get(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Depth of the deepest node; a root-only tree has depth 0.
    pub fn depth(&self) -> usize {
        self.nodes.values().map(|n| n.depth).max().unwrap_or(0)
    }

    /// Nodes in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn nodes_at_depth(&self, depth: usize) -> Vec<String> {
        self.order
            .iter()
            .filter(|id| self.nodes.get(*id).is_some_and(|n| n.depth == depth))
            .cloned()
            .collect()
    }

    /// Root-to-`id` path, or `None` when `id` is not in the tree.
    pub fn path_to(&self, id: &str) -> Option<Vec<String>> {
        let mut path = vec![id.to_string()];
        let mut current = self.nodes.get(id)?;
        while let Some(parent) = &current.parent {
            path.push(parent.clone());
            current = self.nodes.get(parent)?;
        }
        path.reverse();
        Some(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_tree_has_root_only() {
        let tree = CrawlTree::new("A");
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.depth(), 0);
        assert_eq!(tree.path_to("A"), Some(vec!["A".to_string()]));
    }

    #[test]
    fn test_duplicate_insert_keeps_first_parent() {
        let mut tree = CrawlTree::new("A");
        assert!(tree.insert("B", "A"));
        assert!(tree.insert("C", "A"));
        assert!(tree.insert("D", "B"));
        assert!(!tree.insert("D", "C"));
        assert!(!tree.insert("A", "D"));

        assert_eq!(tree.len(), 4);
        assert_eq!(tree.get("D").unwrap().parent.as_deref(), Some("B"));
        assert!(tree.get("C").unwrap().children.is_empty());
        assert_eq!(tree.get("A").unwrap().parent, None);
    }

    #[test]
    fn test_insert_under_unknown_parent_is_ignored() {
        let mut tree = CrawlTree::new("A");
        assert!(!tree.insert("B", "Nope"));
        assert!(!tree.contains("B"));
    }

    #[test]
    fn test_paths_and_levels() {
        let mut tree = CrawlTree::new("A");
        tree.insert("B", "A");
        tree.insert("C", "A");
        tree.insert("D", "B");

        assert_eq!(tree.depth(), 2);
        assert_eq!(tree.nodes_at_depth(1), vec!["B", "C"]);
        assert_eq!(tree.path_to("D").unwrap(), vec!["A", "B", "D"]);
        assert_eq!(tree.path_to("Z"), None);
    }

    #[test]
    fn test_serde_round_trip_preserves_order() {
        let mut tree = CrawlTree::new("A");
        tree.insert("B", "A");
        tree.insert("C", "A");

        let json = serde_json::to_string(&tree).unwrap();
        let back: CrawlTree = serde_json::from_str(&json).unwrap();
        assert_eq!(back.iter().collect::<Vec<_>>(), vec!["A", "B", "C"]);
        assert_eq!(back.get("C"), tree.get("C"));
    }
}
