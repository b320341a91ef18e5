//! Ownership invariants under long sequences of structural edits

use folio_model::{NodeId, NodeKind, Tree, TreeError};
use std::collections::HashSet;

/// Small deterministic generator so failures are reproducible.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn pick<T: Copy>(&mut self, items: &[T]) -> Option<T> {
        if items.is_empty() {
            None
        } else {
            Some(items[(self.next() as usize) % items.len()])
        }
    }
}

fn assert_invariants(tree: &Tree, known: &[NodeId]) {
    let root = tree.root();
    let mut seen = HashSet::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        assert!(seen.insert(node), "Node {node} reachable twice (cycle or shared child)");
        for child in tree.children(node) {
            assert_eq!(tree.parent(*child), Some(node), "Parent link of {child} is stale");
            stack.push(*child);
        }
    }

    for &node in known {
        if !tree.contains(node) {
            continue;
        }
        let owners = known
            .iter()
            .chain(std::iter::once(&root))
            .filter(|candidate| tree.contains(**candidate))
            .filter(|candidate| tree.children(**candidate).contains(&node))
            .count();
        match tree.parent(node) {
            Some(_) => assert_eq!(owners, 1, "Node {node} must have exactly one owner"),
            None => assert_eq!(owners, 0, "Detached node {node} is still listed as a child"),
        }
    }
}

#[test]
fn test_random_edit_sequences_keep_ownership() {
    for seed in 1..20u64 {
        let mut rng = Lcg(seed);
        let mut tree = Tree::new();
        let mut known: Vec<NodeId> = Vec::new();

        for _ in 0..200 {
            let live: Vec<NodeId> = known.iter().copied().filter(|n| tree.contains(*n)).collect();
            match rng.next() % 5 {
                0 | 1 => {
                    let kind = if rng.next() % 2 == 0 {
                        NodeKind::block("p")
                    } else {
                        NodeKind::char('x')
                    };
                    let node = tree.create(kind);
                    known.push(node);
                    let mut parents = live.clone();
                    parents.push(tree.root());
                    let parent = rng.pick(&parents).unwrap();
                    let _ = tree.append(parent, &[node]);
                }
                2 => {
                    if let (Some(node), Some(parent)) = (rng.pick(&live), rng.pick(&live)) {
                        match tree.prepend(parent, &[node]) {
                            Ok(()) => assert_eq!(tree.parent(node), Some(parent)),
                            Err(TreeError::CycleDetected { .. }) => {
                                assert!(tree.is_ancestor_or_self(node, parent))
                            }
                            Err(_) => {}
                        }
                    }
                }
                3 => {
                    if let Some(node) = rng.pick(&live) {
                        tree.remove(node);
                        assert!(!tree.contains(node));
                        tree.remove(node);
                    }
                }
                _ => {
                    if let Some(node) = rng.pick(&live) {
                        let _ = tree.detach(node);
                    }
                }
            }
            assert_invariants(&tree, &known);
        }
    }
}

#[test]
fn test_removed_subtree_is_gone_entirely() {
    let mut tree = Tree::new();
    let root = tree.root();
    let outer = tree.create(NodeKind::block("div"));
    let inner = tree.create(NodeKind::block("p"));
    let leaf = tree.create(NodeKind::char('a'));
    tree.append(root, &[outer]).unwrap();
    tree.append(outer, &[inner]).unwrap();
    tree.append(inner, &[leaf]).unwrap();

    tree.remove(outer);
    for node in [outer, inner, leaf] {
        assert!(!tree.contains(node));
        assert_eq!(tree.append(root, &[node]), Err(TreeError::NodeNotFound(node)));
    }
    assert_eq!(tree.len(), 1);
}
