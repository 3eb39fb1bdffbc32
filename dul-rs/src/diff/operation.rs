//! Edit script operations.

use crate::node::NodeContent;

/// DOM numeric codes identifying node kinds on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeTypeCode {
    Element = 1,
    Attribute = 2,
    Text = 3,
    Cdata = 4,
    ProcessingInstruction = 7,
    Comment = 8,
}

impl NodeTypeCode {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<NodeTypeCode> {
        match code {
            1 => Some(NodeTypeCode::Element),
            2 => Some(NodeTypeCode::Attribute),
            3 => Some(NodeTypeCode::Text),
            4 => Some(NodeTypeCode::Cdata),
            7 => Some(NodeTypeCode::ProcessingInstruction),
            8 => Some(NodeTypeCode::Comment),
            _ => None,
        }
    }

    /// The code for a node's content, if the kind can be inserted.
    pub fn of(content: &NodeContent) -> Option<NodeTypeCode> {
        match content {
            NodeContent::Element(_) => Some(NodeTypeCode::Element),
            NodeContent::Text(_) => Some(NodeTypeCode::Text),
            NodeContent::Cdata(_) => Some(NodeTypeCode::Cdata),
            NodeContent::ProcessingInstruction { .. } => {
                Some(NodeTypeCode::ProcessingInstruction)
            }
            NodeContent::Comment(_) => Some(NodeTypeCode::Comment),
            NodeContent::Document | NodeContent::DocType(_) => None,
        }
    }
}

/// A single operation in an edit script.
///
/// Node-valued fields are locators into the document as it stands
/// when the operation is applied; earlier operations in the script
/// have already taken effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Insert a new node or attribute.
    Insert {
        /// Locator of the parent, or of the owning element for an
        /// attribute insert.
        parent: String,
        /// The kind of node to insert.
        node_type: NodeTypeCode,
        /// 1-based XPath child number to insert at. Absent for
        /// attribute inserts.
        childno: Option<usize>,
        /// Name: element or attribute name, or PI target.
        name: Option<String>,
        /// Namespace URI of the name.
        namespace: Option<String>,
        /// 1-based character position within a text run. Only
        /// recorded when greater than 1.
        charpos: Option<usize>,
        /// Character data: text, comment or PI content, or an
        /// attribute value.
        value: Option<String>,
    },
    /// Delete a node or attribute.
    Delete {
        /// Locator of the node to delete.
        node: String,
        /// For text nodes, the character position within the run.
        charpos: Option<usize>,
        /// For text nodes, the number of characters to delete.
        length: Option<usize>,
    },
    /// Move a node to a new parent or position.
    Move {
        /// Locator of the node to move.
        node: String,
        /// Locator of the new parent.
        parent: String,
        /// 1-based XPath child number to insert at.
        childno: usize,
        /// Character position of the node at its old location.
        old_charpos: usize,
        /// Character position to insert at in the new location.
        new_charpos: usize,
        /// For text nodes, the number of characters to move.
        length: Option<usize>,
    },
    /// Update a node's value in place. For elements the value is the
    /// new qualified name; for attributes and character data it is
    /// the new value.
    Update {
        /// Locator of the node to update.
        node: String,
        /// The new name or value.
        value: String,
    },
}

/// An ordered list of operations turning one document into another.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditScript {
    /// The operations, in application order.
    pub ops: Vec<Operation>,
    /// Context sizes recorded on the delta root, as (sibling, parent,
    /// parent sibling).
    pub context: Option<(u32, u32, u32)>,
    /// Whether the delta is marked reversible.
    pub reverse_patch: bool,
    /// Whether entities were resolved when the inputs were parsed.
    pub resolve_entities: bool,
}

impl EditScript {
    pub fn new() -> EditScript {
        EditScript {
            resolve_entities: true,
            ..EditScript::default()
        }
    }

    /// Whether the script holds no operations, meaning the documents
    /// did not differ.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Number of operations.
    pub fn len(&self) -> usize {
        self.ops.len()
    }
}
