//! Bidirectional item ↔ node tables.

use folio_model::{NodeId, Tree};
use std::collections::HashMap;
use std::hash::Hash;

/// Which nodes an external item produced (parsing) or was produced from
/// (rendering), and the reverse.
#[derive(Debug, Clone)]
pub struct Mapping<K> {
    items: HashMap<K, Vec<NodeId>>,
    nodes: HashMap<NodeId, Vec<K>>,
}

impl<K> Default for Mapping<K> {
    fn default() -> Self {
        Self {
            items: HashMap::new(),
            nodes: HashMap::new(),
        }
    }
}

impl<K: Clone + Eq + Hash> Mapping<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `key` and `node` correspond. Links are kept in insertion
    /// order and never duplicated.
    pub fn link(&mut self, key: K, node: NodeId) {
        let nodes = self.items.entry(key.clone()).or_default();
        if !nodes.contains(&node) {
            nodes.push(node);
        }
        let keys = self.nodes.entry(node).or_default();
        if !keys.contains(&key) {
            keys.push(key);
        }
    }

    pub fn nodes(&self, key: &K) -> &[NodeId] {
        self.items.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn items(&self, node: NodeId) -> &[K] {
        self.nodes.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_item(&self, key: &K) -> bool {
        self.items.contains_key(key)
    }

    pub fn forget_item(&mut self, key: &K) {
        if let Some(nodes) = self.items.remove(key) {
            for node in nodes {
                if let Some(keys) = self.nodes.get_mut(&node) {
                    keys.retain(|k| k != key);
                    if keys.is_empty() {
                        self.nodes.remove(&node);
                    }
                }
            }
        }
    }

    pub fn forget_node(&mut self, node: NodeId) {
        if let Some(keys) = self.nodes.remove(&node) {
            for key in keys {
                if let Some(nodes) = self.items.get_mut(&key) {
                    nodes.retain(|n| *n != node);
                    if nodes.is_empty() {
                        self.items.remove(&key);
                    }
                }
            }
        }
    }

    /// Drop links to nodes that no longer exist in `tree`.
    pub fn retain_live(&mut self, tree: &Tree) {
        let dead: Vec<NodeId> = self
            .nodes
            .keys()
            .copied()
            .filter(|node| !tree.contains(*node))
            .collect();
        for node in dead {
            self.forget_node(node);
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.nodes.clear();
    }

    /// Number of mapped items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
