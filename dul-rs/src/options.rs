//! Options controlling how documents are compared.

/// Settings for a single diff invocation.
///
/// The defaults compare documents exactly: all whitespace, case,
/// comments and processing instructions are significant.
#[derive(Debug, Clone)]
pub struct DiffOptions {
    /// Ignore all whitespace when comparing text nodes.
    pub ignore_all_whitespace: bool,
    /// Ignore leading and trailing whitespace when comparing text nodes.
    pub ignore_leading_whitespace: bool,
    /// Skip whitespace-only text nodes during the edit script walk.
    pub ignore_whitespace_nodes: bool,
    /// Compare text nodes case insensitively.
    pub ignore_case: bool,
    /// Skip comment nodes during the edit script walk.
    pub ignore_comments: bool,
    /// Skip processing instructions during the edit script walk.
    pub ignore_processing_instructions: bool,
    /// Record context sizing attributes on the delta root.
    pub context: bool,
    /// Number of sibling context nodes, recorded when `context` is set.
    pub sibling_context: u32,
    /// Number of parent context levels, recorded when `context` is set.
    pub parent_context: u32,
    /// Number of parent sibling context nodes, recorded when `context`
    /// is set.
    pub parent_sibling_context: u32,
    /// Mark the delta as reversible.
    pub reverse_patch: bool,
    /// Whether entities were resolved when the inputs were parsed.
    pub resolve_entities: bool,
}

impl Default for DiffOptions {
    fn default() -> Self {
        DiffOptions {
            ignore_all_whitespace: false,
            ignore_leading_whitespace: false,
            ignore_whitespace_nodes: false,
            ignore_case: false,
            ignore_comments: false,
            ignore_processing_instructions: false,
            context: false,
            sibling_context: 2,
            parent_context: 1,
            parent_sibling_context: 0,
            reverse_patch: false,
            resolve_entities: true,
        }
    }
}
