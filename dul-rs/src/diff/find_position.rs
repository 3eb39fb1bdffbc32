//! Finds where an unmatched or misplaced node should land in the
//! working document.

use crate::diff::annotations::Annotations;
use crate::diff::child_number::ChildNumber;
use crate::matching::NodePairs;
use crate::node::{is_text, prev_sibling, text_length, NodeRef};

/// The position a node should be inserted at, expressed three ways.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertPosition {
    /// 0-based index among the parent's children.
    pub dom: usize,
    /// 1-based XPath child number.
    pub xpath: usize,
    /// 1-based character position within a text run, 1 when the
    /// insertion point is not inside text.
    pub charpos: usize,
}

/// Computes where the partner of `x` belongs in the working document.
///
/// The position is just after the partner of `x`'s nearest in-order
/// left sibling. When `x` already has a partner, that partner is about
/// to be moved and must not count towards the position.
pub fn find_position(x: &NodeRef, pairs: &NodePairs, order: &Annotations) -> InsertPosition {
    let Some(v) = in_order_left_sibling(x, order) else {
        return InsertPosition {
            dom: 0,
            xpath: 1,
            charpos: 1,
        };
    };

    let Some(u) = pairs.partner(&v) else {
        debug_assert!(false, "in-order left sibling has no partner");
        return InsertPosition {
            dom: 0,
            xpath: 1,
            charpos: 1,
        };
    };

    let numbers = ChildNumber::new(&u);
    let w = pairs.partner(x);

    let dom = numbers.dom_ignoring(w.as_ref()) + 1;
    let xpath = numbers.xpath_ignoring(w.as_ref()) + 1;
    let charpos = if is_text(&u) {
        numbers.xpath_char_pos_ignoring(w.as_ref()) + text_length(&u)
    } else {
        1
    };

    InsertPosition { dom, xpath, charpos }
}

/// The nearest left sibling of `n` marked in order.
fn in_order_left_sibling(n: &NodeRef, order: &Annotations) -> Option<NodeRef> {
    let mut current = prev_sibling(n);
    while let Some(node) = current {
        if order.is_in_order(&node) {
            return Some(node);
        }
        current = prev_sibling(&node);
    }
    None
}
