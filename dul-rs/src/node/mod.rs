//! Node structures for XML tree representation.
//!
//! Documents are trees of reference-counted nodes with interior
//! mutability, so the diff and patch passes can restructure them in
//! place. Every node carries a process-unique id; the id is the key for
//! all side tables (matchings, traversal order) and is never reused.

mod content;
pub mod namespace;

pub use content::{Attribute, ElementData, NodeContent};

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

/// Global counter for generating unique node IDs.
static NODE_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Generates a unique node ID.
fn next_node_id() -> u64 {
    NODE_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// A reference-counted pointer to a node.
pub type NodeRef = Rc<RefCell<NodeInner>>;

/// A node in the document tree.
#[derive(Debug)]
pub struct NodeInner {
    /// Unique identifier for this node.
    id: u64,
    /// What kind of node this is, and its data.
    content: NodeContent,
    /// Child nodes, in document order.
    children: Vec<NodeRef>,
    /// Weak reference to the parent node.
    parent: Weak<RefCell<NodeInner>>,
}

impl NodeInner {
    /// Creates a new detached node with the given content.
    pub fn new(content: NodeContent) -> NodeRef {
        Rc::new(RefCell::new(NodeInner {
            id: next_node_id(),
            content,
            children: Vec::new(),
            parent: Weak::new(),
        }))
    }

    /// Creates a new document node.
    pub fn document() -> NodeRef {
        Self::new(NodeContent::Document)
    }

    /// Returns the unique ID of this node.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns the content of this node.
    pub fn content(&self) -> &NodeContent {
        &self.content
    }

    /// Returns a mutable reference to the content.
    pub fn content_mut(&mut self) -> &mut NodeContent {
        &mut self.content
    }

    /// Returns the number of children.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Returns a reference to the child at the given index.
    pub fn child(&self, index: usize) -> Option<&NodeRef> {
        self.children.get(index)
    }

    /// Returns the children as a slice.
    pub fn children(&self) -> &[NodeRef] {
        &self.children
    }

    /// Appends a child, detaching it from any previous parent.
    pub fn add_child_to_ref(parent_ref: &NodeRef, child_ref: NodeRef) {
        let index = parent_ref.borrow().children.len();
        Self::add_child_at_to_ref(parent_ref, index, child_ref);
    }

    /// Inserts a child at the given index, detaching it from any
    /// previous parent.
    pub fn add_child_at_to_ref(parent_ref: &NodeRef, index: usize, child_ref: NodeRef) {
        detach(&child_ref);
        child_ref.borrow_mut().parent = Rc::downgrade(parent_ref);
        parent_ref.borrow_mut().children.insert(index, child_ref);
    }

    /// Replaces `old` with `new` among the children of `parent_ref`,
    /// preserving its position. Does nothing if `old` is not a child.
    pub fn replace_child_of_ref(parent_ref: &NodeRef, old: &NodeRef, new: NodeRef) {
        let old_id = old.borrow().id;
        let index = parent_ref
            .borrow()
            .children
            .iter()
            .position(|c| c.borrow().id == old_id);
        if let Some(index) = index {
            detach(old);
            Self::add_child_at_to_ref(parent_ref, index, new);
        }
    }
}

/// Returns the unique id of a node.
pub fn id_of(node: &NodeRef) -> u64 {
    node.borrow().id
}

/// Whether two references name the same node.
pub fn same_node(a: &NodeRef, b: &NodeRef) -> bool {
    a.borrow().id == b.borrow().id
}

/// Returns the parent node, if attached.
pub fn parent_of(node: &NodeRef) -> Option<NodeRef> {
    node.borrow().parent.upgrade()
}

/// Returns a snapshot of a node's children.
pub fn children_of(node: &NodeRef) -> Vec<NodeRef> {
    node.borrow().children.clone()
}

/// Returns the index of a node among its siblings.
pub fn index_in_parent(node: &NodeRef) -> Option<usize> {
    let parent = parent_of(node)?;
    let id = id_of(node);
    let index = parent.borrow().children.iter().position(|c| c.borrow().id == id);
    index
}

/// Removes a node from its parent, leaving it detached.
pub fn detach(node: &NodeRef) {
    if let Some(parent) = parent_of(node) {
        let id = id_of(node);
        parent.borrow_mut().children.retain(|c| c.borrow().id != id);
    }
    node.borrow_mut().parent = Weak::new();
}

/// Returns the next sibling of a node, if any.
pub fn next_sibling(node: &NodeRef) -> Option<NodeRef> {
    let parent = parent_of(node)?;
    let index = index_in_parent(node)?;
    let sibling = parent.borrow().children.get(index + 1).cloned();
    sibling
}

/// Returns the previous sibling of a node, if any.
pub fn prev_sibling(node: &NodeRef) -> Option<NodeRef> {
    let parent = parent_of(node)?;
    let index = index_in_parent(node)?;
    let sibling = index
        .checked_sub(1)
        .and_then(|i| parent.borrow().children.get(i).cloned());
    sibling
}

/// True for text and CDATA nodes.
pub fn is_text(node: &NodeRef) -> bool {
    node.borrow().content.is_text()
}

/// True for text nodes whose value is empty.
pub fn is_empty_text(node: &NodeRef) -> bool {
    matches!(node.borrow().content, NodeContent::Text(ref t) if t.is_empty())
}

/// Length in characters of a text or CDATA node, 0 for other kinds.
pub fn text_length(node: &NodeRef) -> usize {
    node.borrow()
        .content
        .text()
        .map(|t| t.chars().count())
        .unwrap_or(0)
}

/// Length in characters of the text run starting at `node`: the node
/// itself plus any directly following text or CDATA siblings.
pub fn run_length(node: &NodeRef) -> usize {
    if !is_text(node) {
        return 0;
    }
    let mut total = text_length(node);
    let mut current = node.clone();
    while let Some(next) = next_sibling(&current) {
        if !is_text(&next) {
            break;
        }
        total += text_length(&next);
        current = next;
    }
    total
}

/// Copies a node's content without its children, under a fresh id.
pub fn shallow_copy(node: &NodeRef) -> NodeRef {
    NodeInner::new(node.borrow().content.clone())
}

/// Returns the first element child of a document node.
pub fn document_element(doc: &NodeRef) -> Option<NodeRef> {
    let found = doc
        .borrow()
        .children
        .iter()
        .find(|c| matches!(c.borrow().content, NodeContent::Element(_)))
        .cloned();
    found
}

/// Returns the depth of a node; the document node is at depth 0.
pub fn depth_of(node: &NodeRef) -> usize {
    let mut depth = 0;
    let mut current = node.clone();
    while let Some(parent) = parent_of(&current) {
        depth += 1;
        current = parent;
    }
    depth
}

/// Byte offset of the given character position in `s`, saturating at
/// the end of the string.
pub fn char_offset(s: &str, chars: usize) -> usize {
    s.char_indices().nth(chars).map(|(i, _)| i).unwrap_or(s.len())
}

/// Splits a text or CDATA node at `offset` characters. The first part
/// stays in the node; a new, detached node of the same kind holding
/// the remainder is returned. Returns None for other node kinds.
pub fn split_text_at(node: &NodeRef, offset: usize) -> Option<NodeRef> {
    let (head, tail, cdata) = {
        let inner = node.borrow();
        let (text, cdata) = match inner.content() {
            NodeContent::Text(t) => (t, false),
            NodeContent::Cdata(t) => (t, true),
            _ => return None,
        };
        let at = char_offset(text, offset);
        (text[..at].to_string(), text[at..].to_string(), cdata)
    };
    *node.borrow_mut().content_mut() = if cdata {
        NodeContent::Cdata(head)
    } else {
        NodeContent::Text(head)
    };
    Some(NodeInner::new(if cdata {
        NodeContent::Cdata(tail)
    } else {
        NodeContent::Text(tail)
    }))
}

/// Merges adjacent plain text siblings and drops empty text nodes,
/// recursively. CDATA sections are never merged with their neighbours.
pub fn normalize(node: &NodeRef) {
    for child in children_of(node) {
        normalize(&child);
    }
    let mut index = 0;
    loop {
        let children = children_of(node);
        if index >= children.len() {
            break;
        }
        let current = &children[index];
        if is_empty_text(current) {
            detach(current);
            continue;
        }
        if index + 1 < children.len() {
            let next = &children[index + 1];
            let both_plain = matches!(current.borrow().content, NodeContent::Text(_))
                && matches!(next.borrow().content, NodeContent::Text(_));
            if both_plain {
                let extra = next.borrow().content.text().unwrap_or("").to_string();
                if let NodeContent::Text(t) = current.borrow_mut().content_mut() {
                    t.push_str(&extra);
                }
                detach(next);
                continue;
            }
        }
        index += 1;
    }
}
