//! Fast match: pairing equivalent nodes between two documents.
//!
//! Nodes are considered deepest first, so leaves pair up before their
//! ancestors. Each unmatched node in the first document is paired with
//! the first equivalent unmatched node in the second. The greedy pick
//! keeps matching linear at the cost of occasionally pairing across
//! subtrees; the edit script generator repairs those with moves.

use rustc_hash::FxHashMap;

use crate::node::{children_of, depth_of, document_element, id_of, NodeContent, NodeRef};
use crate::options::DiffOptions;

/// The set of node pairings between two documents.
///
/// Both directions are kept so partner lookup is constant time from
/// either side. Maps are keyed by node id.
#[derive(Debug, Default)]
pub struct NodePairs {
    first_to_second: FxHashMap<u64, NodeRef>,
    second_to_first: FxHashMap<u64, NodeRef>,
}

impl NodePairs {
    pub fn new() -> NodePairs {
        NodePairs::default()
    }

    /// Records a pairing between a node in the first document and a
    /// node in the second.
    pub fn add(&mut self, first: &NodeRef, second: &NodeRef) {
        self.first_to_second.insert(id_of(first), second.clone());
        self.second_to_first.insert(id_of(second), first.clone());
    }

    /// Returns the partner of a node from either document.
    pub fn partner(&self, node: &NodeRef) -> Option<NodeRef> {
        let id = id_of(node);
        self.first_to_second
            .get(&id)
            .or_else(|| self.second_to_first.get(&id))
            .cloned()
    }

    /// Whether a node has a partner.
    pub fn is_matched(&self, node: &NodeRef) -> bool {
        let id = id_of(node);
        self.first_to_second.contains_key(&id) || self.second_to_first.contains_key(&id)
    }

    /// Drops the pairing involving the given node, on both sides.
    pub fn remove(&mut self, node: &NodeRef) {
        let id = id_of(node);
        if let Some(partner) = self.first_to_second.remove(&id) {
            self.second_to_first.remove(&id_of(&partner));
        }
        if let Some(partner) = self.second_to_first.remove(&id) {
            self.first_to_second.remove(&id_of(&partner));
        }
    }

    /// Number of pairings.
    pub fn len(&self) -> usize {
        self.first_to_second.len()
    }

    pub fn is_empty(&self) -> bool {
        self.first_to_second.is_empty()
    }
}

/// Whether the edit script walk skips a node under the options.
///
/// Skipped nodes still take part in matching, so unchanged ones pair
/// up and survive the delete phase.
pub fn is_banned(node: &NodeRef, options: &DiffOptions) -> bool {
    match node.borrow().content() {
        NodeContent::Text(t) => {
            options.ignore_whitespace_nodes && t.chars().all(char::is_whitespace)
        }
        NodeContent::Comment(_) => options.ignore_comments,
        NodeContent::ProcessingInstruction { .. } => options.ignore_processing_instructions,
        _ => false,
    }
}

/// Pairs up equivalent nodes between two documents.
pub fn match_trees(doc1: &NodeRef, doc2: &NodeRef, options: &DiffOptions) -> NodePairs {
    let mut pairs = NodePairs::new();
    pairs.add(doc1, doc2);

    // Document elements always pair up, even under a rename; the edit
    // script expresses the rename as an update.
    if let (Some(root1), Some(root2)) = (document_element(doc1), document_element(doc2)) {
        pairs.add(&root1, &root2);
    }

    let list1 = depth_sorted(doc1);
    let mut list2 = depth_sorted(doc2);

    for a in &list1 {
        if pairs.is_matched(a) {
            continue;
        }
        let found = list2
            .iter()
            .position(|b| !pairs.is_matched(b) && compare_nodes(a, b, options));
        if let Some(index) = found {
            pairs.add(a, &list2[index]);
            // Keep the candidate order intact so greedy ties keep
            // resolving to the earliest candidate.
            list2.remove(index);
        }
    }
    pairs
}

/// Collects all nodes under `root`, deepest first. Nodes at equal
/// depth stay in document order.
fn depth_sorted(root: &NodeRef) -> Vec<NodeRef> {
    let mut nodes = Vec::new();
    collect(root, &mut nodes);
    nodes.sort_by_key(|n| std::cmp::Reverse(depth_of(n)));
    nodes
}

fn collect(node: &NodeRef, out: &mut Vec<NodeRef>) {
    for child in children_of(node) {
        out.push(child.clone());
        collect(&child, out);
    }
}

/// Whether two nodes are equivalent for matching purposes.
pub fn compare_nodes(a: &NodeRef, b: &NodeRef, options: &DiffOptions) -> bool {
    let a = a.borrow();
    let b = b.borrow();
    match (a.content(), b.content()) {
        (NodeContent::Document, NodeContent::Document) => true,
        (NodeContent::Element(x), NodeContent::Element(y)) => compare_elements(x, y),
        (NodeContent::Text(x), NodeContent::Text(y)) => compare_text(x, y, options),
        (NodeContent::Cdata(x), NodeContent::Cdata(y)) => compare_text(x, y, options),
        // Comments compare exactly; the text knobs do not apply.
        (NodeContent::Comment(x), NodeContent::Comment(y)) => x == y,
        (
            NodeContent::ProcessingInstruction { target: t1, data: d1 },
            NodeContent::ProcessingInstruction { target: t2, data: d2 },
        ) => t1 == t2 && d1 == d2,
        (NodeContent::DocType(x), NodeContent::DocType(y)) => x == y,
        _ => false,
    }
}

fn compare_elements(x: &crate::node::ElementData, y: &crate::node::ElementData) -> bool {
    if x.local_name != y.local_name
        || x.namespace.as_deref().unwrap_or("") != y.namespace.as_deref().unwrap_or("")
    {
        return false;
    }
    if x.attributes.len() != y.attributes.len() {
        return false;
    }
    x.attributes.iter().all(|a| {
        y.attribute_ns(a.namespace.as_deref(), &a.local_name)
            .map(|b| b.value == a.value)
            .unwrap_or(false)
    })
}

fn compare_text(x: &str, y: &str, options: &DiffOptions) -> bool {
    let mut x = x.to_string();
    let mut y = y.to_string();
    if options.ignore_all_whitespace {
        x.retain(|c| !c.is_whitespace());
        y.retain(|c| !c.is_whitespace());
    } else if options.ignore_leading_whitespace {
        x = x.trim().to_string();
        y = y.trim().to_string();
    }
    if options.ignore_case {
        x = x.to_lowercase();
        y = y.to_lowercase();
    }
    x == y
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{document_element, same_node};
    use crate::xml::parse_str;

    #[test]
    fn test_pairs_both_directions() {
        let doc1 = parse_str("<a/>").unwrap();
        let doc2 = parse_str("<a/>").unwrap();
        let mut pairs = NodePairs::new();
        pairs.add(&doc1, &doc2);

        assert!(same_node(&pairs.partner(&doc1).unwrap(), &doc2));
        assert!(same_node(&pairs.partner(&doc2).unwrap(), &doc1));
        assert!(pairs.is_matched(&doc1));

        pairs.remove(&doc2);
        assert!(!pairs.is_matched(&doc1));
        assert!(pairs.is_empty());
    }

    #[test]
    fn test_match_identical() {
        let doc1 = parse_str("<a><b>x</b><c/></a>").unwrap();
        let doc2 = parse_str("<a><b>x</b><c/></a>").unwrap();
        let pairs = match_trees(&doc1, &doc2, &DiffOptions::default());

        // Documents, a, b, text, c.
        assert_eq!(pairs.len(), 5);
        let root1 = document_element(&doc1).unwrap();
        let root2 = document_element(&doc2).unwrap();
        assert!(same_node(&pairs.partner(&root1).unwrap(), &root2));
    }

    #[test]
    fn test_match_partial() {
        let doc1 = parse_str("<a><b/></a>").unwrap();
        let doc2 = parse_str("<a><c/></a>").unwrap();
        let pairs = match_trees(&doc1, &doc2, &DiffOptions::default());

        // Documents and the roots; b and c stay unmatched.
        assert_eq!(pairs.len(), 2);
        let b = crate::node::children_of(&document_element(&doc1).unwrap())[0].clone();
        assert!(!pairs.is_matched(&b));
    }

    #[test]
    fn test_compare_elements_attrs() {
        let options = DiffOptions::default();
        let doc1 = parse_str(r#"<a x="1" y="2"/>"#).unwrap();
        let doc2 = parse_str(r#"<a y="2" x="1"/>"#).unwrap();
        let doc3 = parse_str(r#"<a x="1"/>"#).unwrap();
        let r1 = document_element(&doc1).unwrap();
        let r2 = document_element(&doc2).unwrap();
        let r3 = document_element(&doc3).unwrap();

        assert!(compare_nodes(&r1, &r2, &options));
        assert!(!compare_nodes(&r1, &r3, &options));
    }

    #[test]
    fn test_compare_text_options() {
        let mut options = DiffOptions::default();
        assert!(!compare_text("a b", "ab", &options));
        options.ignore_all_whitespace = true;
        assert!(compare_text("a b", "ab", &options));

        let mut options = DiffOptions::default();
        options.ignore_case = true;
        assert!(compare_text("ABC", "abc", &options));

        let mut options = DiffOptions::default();
        options.ignore_leading_whitespace = true;
        assert!(compare_text("  x ", "x", &options));
    }

    #[test]
    fn test_ignored_comments_still_match() {
        let mut options = DiffOptions::default();
        options.ignore_comments = true;
        let doc1 = parse_str("<a><!--same--></a>").unwrap();
        let doc2 = parse_str("<a><!--same--></a>").unwrap();
        let pairs = match_trees(&doc1, &doc2, &options);
        // Documents, roots and the comments: skipping comments in the
        // edit script walk does not keep them from pairing up.
        assert_eq!(pairs.len(), 3);
    }

    #[test]
    fn test_comments_compare_exactly() {
        let mut options = DiffOptions::default();
        options.ignore_case = true;
        let doc1 = parse_str("<a><!--ABC--></a>").unwrap();
        let doc2 = parse_str("<a><!--abc--></a>").unwrap();
        let pairs = match_trees(&doc1, &doc2, &options);
        // Only documents and roots; the case knob applies to text,
        // not comments.
        assert_eq!(pairs.len(), 2);
    }

    #[test]
    fn test_greedy_ties_keep_candidate_order() {
        let doc1 = parse_str("<a><b><m/><n/><y/></b><y/></a>").unwrap();
        let doc2 = parse_str("<a><b><m/><n/><y/></b><y/></a>").unwrap();
        let pairs = match_trees(&doc1, &doc2, &DiffOptions::default());

        // Identical trees pair node for node, including both y
        // elements at their own depths.
        let b1 = children_of(&document_element(&doc1).unwrap())[0].clone();
        let y_inner1 = children_of(&b1)[2].clone();
        let b2 = children_of(&document_element(&doc2).unwrap())[0].clone();
        let y_inner2 = children_of(&b2)[2].clone();
        assert!(same_node(&pairs.partner(&y_inner1).unwrap(), &y_inner2));
        assert_eq!(pairs.len(), 7);
    }
}
