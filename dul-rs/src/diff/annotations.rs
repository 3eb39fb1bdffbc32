//! Traversal-order markings used while generating an edit script.

use rustc_hash::FxHashSet;

use crate::node::{id_of, NodeRef};

/// Tracks which nodes are "in order", meaning their position in the
/// working document already agrees with the target document.
///
/// Nodes start in order; the child alignment pass marks misaligned
/// children out of order and repairs them with moves. Kept as a side
/// table keyed by node id so the tree itself stays free of bookkeeping.
#[derive(Debug, Default)]
pub struct Annotations {
    out_of_order: FxHashSet<u64>,
}

impl Annotations {
    pub fn new() -> Annotations {
        Annotations::default()
    }

    pub fn set_in_order(&mut self, node: &NodeRef) {
        self.out_of_order.remove(&id_of(node));
    }

    pub fn set_out_of_order(&mut self, node: &NodeRef) {
        self.out_of_order.insert(id_of(node));
    }

    pub fn is_in_order(&self, node: &NodeRef) -> bool {
        !self.out_of_order.contains(&id_of(node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{NodeContent, NodeInner};

    #[test]
    fn test_default_in_order() {
        let node = NodeInner::new(NodeContent::Text("x".to_string()));
        let order = Annotations::new();
        assert!(order.is_in_order(&node));
    }

    #[test]
    fn test_mark_and_clear() {
        let node = NodeInner::new(NodeContent::Text("x".to_string()));
        let mut order = Annotations::new();
        order.set_out_of_order(&node);
        assert!(!order.is_in_order(&node));
        order.set_in_order(&node);
        assert!(order.is_in_order(&node));
    }
}
