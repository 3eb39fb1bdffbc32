//! Edit script generation, the DUL delta format, and patch application.

pub mod annotations;
pub mod child_number;
pub mod delta;
pub mod edit_script;
pub mod find_position;
pub mod locator;
pub mod operation;
pub mod patch;

/// Namespace of the delta document element.
pub const DUL_NAMESPACE: &str = "http://www.adrianmouat.com/dul";

/// Element and attribute names of the delta format.
pub(crate) mod names {
    pub const DELTA: &str = "delta";
    pub const INSERT: &str = "insert";
    pub const DELETE: &str = "delete";
    pub const MOVE: &str = "move";
    pub const UPDATE: &str = "update";

    pub const NODE: &str = "node";
    pub const PARENT: &str = "parent";
    pub const CHILDNO: &str = "childno";
    pub const NODETYPE: &str = "nodetype";
    pub const NAME: &str = "name";
    pub const NAMESPACE: &str = "ns";
    pub const CHARPOS: &str = "charpos";
    pub const LENGTH: &str = "length";
    pub const OLD_CHARPOS: &str = "old_charpos";
    pub const NEW_CHARPOS: &str = "new_charpos";
    pub const SIBLING_CONTEXT: &str = "sib_context";
    pub const PARENT_CONTEXT: &str = "par_context";
    pub const PARENT_SIBLING_CONTEXT: &str = "par_sib_context";
    pub const REVERSE_PATCH: &str = "reverse_patch";
    pub const RESOLVE_ENTITIES: &str = "resolve_entities";
}
