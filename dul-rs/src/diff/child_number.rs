//! Child position calculations.
//!
//! A node has several distinct positions among its siblings:
//!
//! - The DOM index, 0-based, counting every sibling.
//! - The XPath index, 1-based, where adjacent text nodes coalesce into
//!   one position and empty text nodes and doctype declarations are
//!   invisible.
//! - The character position, 1-based, of the node's first character
//!   within the run of contiguous text siblings it belongs to.
//!
//! Each has an "ignoring" variant that computes the position as if a
//! given node were absent, used when that node is about to be moved,
//! and an "in order" variant that counts only nodes marked in order
//! during edit script generation.

use crate::diff::annotations::Annotations;
use crate::node::{
    children_of, is_empty_text, is_text, parent_of, same_node, text_length, NodeContent, NodeRef,
};

/// Position calculator for one node. Captures a snapshot of the
/// node's sibling list at construction.
pub struct ChildNumber {
    node: NodeRef,
    siblings: Vec<NodeRef>,
}

/// Whether the sibling at `index` starts a new XPath position.
///
/// False for a text node directly preceded by another text node, for
/// empty text nodes, and for doctype declarations.
pub(crate) fn starts_xpath_position(siblings: &[NodeRef], index: usize) -> bool {
    let curr = &siblings[index];
    if index > 0 && is_text(curr) && is_text(&siblings[index - 1]) {
        return false;
    }
    if is_empty_text(curr) {
        return false;
    }
    !matches!(*curr.borrow().content(), NodeContent::DocType(_))
}

impl ChildNumber {
    /// Creates a calculator for a node. The node must be attached.
    pub fn new(node: &NodeRef) -> ChildNumber {
        debug_assert!(parent_of(node).is_some(), "node must have a parent");
        let siblings = parent_of(node)
            .map(|p| children_of(&p))
            .unwrap_or_else(|| vec![node.clone()]);
        ChildNumber {
            node: node.clone(),
            siblings,
        }
    }

    /// DOM index of the node.
    pub fn dom(&self) -> usize {
        self.dom_in(&self.siblings)
    }

    /// DOM index as if `ignore` were absent.
    pub fn dom_ignoring(&self, ignore: Option<&NodeRef>) -> usize {
        self.dom_in(&self.filtered(ignore))
    }

    /// XPath child number of the node.
    pub fn xpath(&self) -> usize {
        self.xpath_in(&self.siblings).0
    }

    /// XPath child number as if `ignore` were absent.
    pub fn xpath_ignoring(&self, ignore: Option<&NodeRef>) -> usize {
        self.xpath_in(&self.filtered(ignore)).0
    }

    /// Character position of the node's first character.
    pub fn xpath_char_pos(&self) -> usize {
        let (_, dom_index) = self.xpath_in(&self.siblings);
        char_pos_in(&self.siblings, dom_index)
    }

    /// Character position as if `ignore` were absent.
    pub fn xpath_char_pos_ignoring(&self, ignore: Option<&NodeRef>) -> usize {
        let siblings = self.filtered(ignore);
        let (_, dom_index) = self.xpath_in(&siblings);
        char_pos_in(&siblings, dom_index)
    }

    /// DOM index counting only siblings marked in order.
    pub fn in_order_dom(&self, order: &Annotations) -> usize {
        let mut count = 0;
        for sibling in &self.siblings {
            if same_node(sibling, &self.node) {
                break;
            }
            if order.is_in_order(sibling) {
                count += 1;
            }
        }
        count
    }

    /// XPath child number counting only siblings marked in order. If
    /// the node itself is out of order it is counted as if appended
    /// after the last in-order sibling before it.
    pub fn in_order_xpath(&self, order: &Annotations) -> usize {
        self.in_order_xpath_in(order).0
    }

    /// Character position counting only siblings marked in order.
    pub fn in_order_xpath_char_pos(&self, order: &Annotations) -> usize {
        let (_, dom_index) = self.in_order_xpath_in(order);
        let mut pos = 1;
        for i in (0..dom_index).rev() {
            let sibling = &self.siblings[i];
            if is_text(sibling) {
                if order.is_in_order(sibling) {
                    pos += text_length(sibling);
                }
            } else if order.is_in_order(sibling) {
                break;
            }
        }
        pos
    }

    fn filtered(&self, ignore: Option<&NodeRef>) -> Vec<NodeRef> {
        match ignore {
            None => self.siblings.clone(),
            Some(ignored) => {
                debug_assert!(
                    !same_node(ignored, &self.node),
                    "cannot ignore the position node"
                );
                self.siblings
                    .iter()
                    .filter(|s| !same_node(s, ignored))
                    .cloned()
                    .collect()
            }
        }
    }

    fn dom_in(&self, siblings: &[NodeRef]) -> usize {
        siblings
            .iter()
            .position(|s| same_node(s, &self.node))
            .unwrap_or(siblings.len())
    }

    /// Returns the XPath child number and the DOM index of the node
    /// within `siblings`.
    fn xpath_in(&self, siblings: &[NodeRef]) -> (usize, usize) {
        let mut child_no = 1;
        let mut dom_index = siblings.len();
        for i in 0..siblings.len() {
            if same_node(&siblings[i], &self.node) {
                if !starts_xpath_position(siblings, i) {
                    child_no -= 1;
                }
                dom_index = i;
                break;
            }
            if starts_xpath_position(siblings, i) {
                child_no += 1;
            }
        }
        (child_no, dom_index)
    }

    fn in_order_xpath_in(&self, order: &Annotations) -> (usize, usize) {
        let mut child_no = 0;
        let mut dom_index = self.siblings.len();
        let mut last_in_order: Option<NodeRef> = None;
        let mut found = false;
        for (i, sibling) in self.siblings.iter().enumerate() {
            let coalesces = is_text(sibling)
                && last_in_order.as_ref().map(is_text).unwrap_or(false);
            if order.is_in_order(sibling) && !coalesces && !is_empty_text(sibling) {
                child_no += 1;
            }
            if same_node(sibling, &self.node) {
                dom_index = i;
                found = true;
                break;
            }
            if order.is_in_order(sibling) {
                last_in_order = Some(sibling.clone());
            }
        }
        if found && !order.is_in_order(&self.node) {
            child_no += 1;
        }
        (child_no, dom_index)
    }
}

fn char_pos_in(siblings: &[NodeRef], dom_index: usize) -> usize {
    let mut pos = 1;
    for i in (0..dom_index).rev() {
        if is_text(&siblings[i]) {
            pos += text_length(&siblings[i]);
        } else {
            break;
        }
    }
    pos
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::document_element;
    use crate::xml::parse_str;

    // The document is returned alongside the children: it holds the
    // only strong reference chain, and the parent links are weak.
    fn kids(xml: &str) -> (NodeRef, Vec<NodeRef>) {
        let doc = parse_str(xml).unwrap();
        let kids = children_of(&document_element(&doc).unwrap());
        (doc, kids)
    }

    #[test]
    fn test_dom_and_xpath_elements() {
        let (_doc, kids) = kids("<a><b/><c/><d/></a>");
        let c = ChildNumber::new(&kids[1]);
        assert_eq!(c.dom(), 1);
        assert_eq!(c.xpath(), 2);
        assert_eq!(c.xpath_char_pos(), 1);
    }

    #[test]
    fn test_text_runs_coalesce() {
        // After parsing, text is one node; build a run by hand.
        let doc = parse_str("<a><b/></a>").unwrap();
        let root = document_element(&doc).unwrap();
        use crate::node::{NodeContent, NodeInner};
        let t1 = NodeInner::new(NodeContent::Text("one".to_string()));
        let t2 = NodeInner::new(NodeContent::Cdata("two".to_string()));
        NodeInner::add_child_to_ref(&root, t1.clone());
        NodeInner::add_child_to_ref(&root, t2.clone());

        let n1 = ChildNumber::new(&t1);
        let n2 = ChildNumber::new(&t2);
        assert_eq!(n1.xpath(), 2);
        assert_eq!(n2.xpath(), 2);
        assert_eq!(n1.xpath_char_pos(), 1);
        assert_eq!(n2.xpath_char_pos(), 4);
        assert_eq!(n2.dom(), 2);
    }

    #[test]
    fn test_char_pos_stops_at_element() {
        let doc = parse_str("<a><b/></a>").unwrap();
        let root = document_element(&doc).unwrap();
        use crate::node::{NodeContent, NodeInner};
        let t = NodeInner::new(NodeContent::Text("xy".to_string()));
        NodeInner::add_child_to_ref(&root, t.clone());

        let n = ChildNumber::new(&t);
        assert_eq!(n.xpath_char_pos(), 1);
        assert_eq!(n.xpath(), 2);
    }

    #[test]
    fn test_ignoring() {
        let (_doc, kids) = kids("<a><b/><c/><d/></a>");
        let d = ChildNumber::new(&kids[2]);
        assert_eq!(d.dom_ignoring(Some(&kids[0])), 1);
        assert_eq!(d.xpath_ignoring(Some(&kids[0])), 2);
        assert_eq!(d.dom_ignoring(None), 2);
    }

    #[test]
    fn test_in_order_counts() {
        let (_doc, kids) = kids("<a><b/><c/><d/></a>");
        let mut order = Annotations::new();
        order.set_out_of_order(&kids[0]);

        let d = ChildNumber::new(&kids[2]);
        assert_eq!(d.in_order_dom(&order), 1);
        assert_eq!(d.in_order_xpath(&order), 2);

        let b = ChildNumber::new(&kids[0]);
        // Out of order nodes count as appended after preceding siblings.
        assert_eq!(b.in_order_xpath(&order), 1);
    }

    #[test]
    fn test_in_order_char_pos_skips_out_of_order_text() {
        let doc = parse_str("<a/>").unwrap();
        let root = document_element(&doc).unwrap();
        use crate::node::{NodeContent, NodeInner};
        let t1 = NodeInner::new(NodeContent::Text("ab".to_string()));
        let t2 = NodeInner::new(NodeContent::Text("cde".to_string()));
        let t3 = NodeInner::new(NodeContent::Text("f".to_string()));
        for t in [&t1, &t2, &t3] {
            NodeInner::add_child_to_ref(&root, t.clone());
        }
        let mut order = Annotations::new();
        order.set_out_of_order(&t2);

        let n = ChildNumber::new(&t3);
        assert_eq!(n.in_order_xpath_char_pos(&order), 3);
    }
}
