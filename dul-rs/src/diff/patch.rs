//! Applies DUL deltas to documents.
//!
//! The document is normalized before every operation: adjacent text
//! nodes merged, empty text nodes dropped. Operation locators address
//! the normalized document, so character positions line up with
//! whole text runs.

use crate::diff::locator::{resolve, Target};
use crate::diff::operation::{EditScript, NodeTypeCode, Operation};
use crate::error::{Error, Result};
use crate::node::namespace::{resolve_prefix_in_scope, split_qname};
use crate::node::{
    char_offset, children_of, detach, index_in_parent, is_text, next_sibling, normalize,
    parent_of, run_length, text_length, Attribute, ElementData, NodeContent, NodeInner, NodeRef,
};

/// Applies an edit script to a document, in place.
pub fn apply(doc: &NodeRef, script: &EditScript) -> Result<()> {
    for op in &script.ops {
        normalize(doc);
        apply_op(doc, op)?;
    }
    Ok(())
}

fn apply_op(doc: &NodeRef, op: &Operation) -> Result<()> {
    match op {
        Operation::Insert {
            parent,
            node_type,
            childno,
            name,
            namespace,
            charpos,
            value,
        } => do_insert(
            doc,
            parent,
            *node_type,
            *childno,
            name.as_deref(),
            namespace.as_deref(),
            charpos.unwrap_or(1),
            value.as_deref(),
        ),
        Operation::Delete { node, charpos, length } => {
            do_delete(doc, node, charpos.unwrap_or(1), *length)
        }
        Operation::Move {
            node,
            parent,
            childno,
            old_charpos,
            new_charpos,
            length,
        } => do_move(doc, node, parent, *childno, *old_charpos, *new_charpos, *length),
        Operation::Update { node, value } => do_update(doc, node, value),
    }
}

#[allow(clippy::too_many_arguments)]
fn do_insert(
    doc: &NodeRef,
    parent: &str,
    node_type: NodeTypeCode,
    childno: Option<usize>,
    name: Option<&str>,
    namespace: Option<&str>,
    charpos: usize,
    value: Option<&str>,
) -> Result<()> {
    let parent_node = resolve_node(doc, parent)?;
    let value = value.unwrap_or("");

    if node_type == NodeTypeCode::Attribute {
        let name = name.ok_or_else(|| Error::PatchFormat("No name specified".to_string()))?;
        let (_, local) = split_qname(name);
        let attr = Attribute {
            namespace: namespace.map(str::to_string),
            local_name: local.to_string(),
            qname: name.to_string(),
            value: value.to_string(),
        };
        match parent_node.borrow_mut().content_mut() {
            NodeContent::Element(data) => data.set_attribute(attr),
            _ => return Err(Error::PatchFormat("Parent not an element".to_string())),
        }
        return Ok(());
    }

    let ins = match node_type {
        NodeTypeCode::Text => NodeInner::new(NodeContent::Text(value.to_string())),
        NodeTypeCode::Cdata => NodeInner::new(NodeContent::Cdata(value.to_string())),
        NodeTypeCode::Comment => NodeInner::new(NodeContent::Comment(value.to_string())),
        NodeTypeCode::ProcessingInstruction => {
            let target =
                name.ok_or_else(|| Error::PatchFormat("No name specified".to_string()))?;
            NodeInner::new(NodeContent::ProcessingInstruction {
                target: target.to_string(),
                data: value.to_string(),
            })
        }
        NodeTypeCode::Element => {
            let name = name.ok_or_else(|| Error::PatchFormat("No name specified".to_string()))?;
            let (prefix, local) = split_qname(name);
            // Declare the namespace on the element itself so the
            // patched document serializes with the binding present.
            let decls = namespace
                .map(|ns| vec![(prefix.to_string(), ns.to_string())])
                .unwrap_or_default();
            NodeInner::new(NodeContent::Element(ElementData {
                namespace: namespace.map(str::to_string),
                local_name: local.to_string(),
                qname: name.to_string(),
                attributes: Vec::new(),
                namespace_decls: decls,
            }))
        }
        NodeTypeCode::Attribute => unreachable!("handled above"),
    };

    let domcn = dom_child_no_from_xpath(&children_of(&parent_node), childno.unwrap_or(1));
    insert_node(&parent_node, domcn, charpos, ins)
}

fn do_delete(doc: &NodeRef, node: &str, charpos: usize, length: Option<usize>) -> Result<()> {
    match resolve(doc, node)? {
        Target::Attribute { owner, qname } => {
            match owner.borrow_mut().content_mut() {
                NodeContent::Element(data) => {
                    if data.attribute(&qname).is_none() {
                        return Err(Error::PatchFormat(format!(
                            "could not resolve path: {node}"
                        )));
                    }
                    data.remove_attribute(&qname);
                }
                _ => {
                    return Err(Error::PatchFormat(format!(
                        "could not resolve path: {node}"
                    )))
                }
            }
            Ok(())
        }
        Target::Node(del_node) if is_text(&del_node) => {
            match length {
                Some(length) => {
                    if length == 0 {
                        return Err(Error::PatchFormat("Invalid length".to_string()));
                    }
                    delete_text(&del_node, charpos, length)?;
                }
                None => {
                    delete_text_run(&del_node, charpos)?;
                }
            }
            Ok(())
        }
        Target::Node(del_node) => {
            if parent_of(&del_node).is_none() {
                return Err(Error::PatchFormat(
                    "cannot delete the document node".to_string(),
                ));
            }
            detach(&del_node);
            Ok(())
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn do_move(
    doc: &NodeRef,
    node: &str,
    parent: &str,
    childno: usize,
    old_charpos: usize,
    new_charpos: usize,
    length: Option<usize>,
) -> Result<()> {
    let move_node = resolve_node(doc, node)?;
    let parent_node = resolve_node(doc, parent)?;

    // Excise first; the destination child number is then computed
    // against the sibling list without the node in it.
    let moved = if is_text(&move_node) {
        match length {
            Some(length) => delete_text(&move_node, old_charpos, length)?,
            None => delete_text_run(&move_node, old_charpos)?,
        }
    } else {
        detach(&move_node);
        move_node
    };

    let domcn = dom_child_no_from_xpath(&children_of(&parent_node), childno);
    insert_node(&parent_node, domcn, new_charpos, moved)
}

fn do_update(doc: &NodeRef, node: &str, value: &str) -> Result<()> {
    match resolve(doc, node)? {
        Target::Attribute { owner, qname } => match owner.borrow_mut().content_mut() {
            NodeContent::Element(data) => {
                match data.attributes.iter_mut().find(|a| a.qname == qname) {
                    Some(attr) => {
                        attr.value = value.to_string();
                        Ok(())
                    }
                    None => Err(Error::PatchFormat(format!(
                        "could not resolve path: {node}"
                    ))),
                }
            }
            _ => Err(Error::PatchFormat(format!("could not resolve path: {node}"))),
        },
        Target::Node(target) => {
            let new_content = {
                let inner = target.borrow();
                match inner.content() {
                    NodeContent::Element(data) => {
                        // The value is the new qualified name; its
                        // prefix is resolved against the declarations
                        // in scope at the node.
                        let (prefix, local) = split_qname(value);
                        let namespace = resolve_prefix_in_scope(&target, prefix);
                        NodeContent::Element(ElementData {
                            namespace,
                            local_name: local.to_string(),
                            qname: value.to_string(),
                            attributes: data.attributes.clone(),
                            namespace_decls: data.namespace_decls.clone(),
                        })
                    }
                    NodeContent::Text(_) => NodeContent::Text(value.to_string()),
                    NodeContent::Cdata(_) => NodeContent::Cdata(value.to_string()),
                    NodeContent::Comment(_) => NodeContent::Comment(value.to_string()),
                    NodeContent::ProcessingInstruction { target: t, .. } => {
                        NodeContent::ProcessingInstruction {
                            target: t.clone(),
                            data: value.to_string(),
                        }
                    }
                    other => {
                        return Err(Error::PatchFormat(format!(
                            "cannot update a {} node",
                            other.kind_name()
                        )))
                    }
                }
            };
            *target.borrow_mut().content_mut() = new_content;
            Ok(())
        }
    }
}

fn resolve_node(doc: &NodeRef, path: &str) -> Result<NodeRef> {
    match resolve(doc, path)? {
        Target::Node(node) => Ok(node),
        Target::Attribute { .. } => Err(Error::PatchFormat(format!(
            "expected a node, found an attribute: {path}"
        ))),
    }
}

/// Converts an XPath child number to a DOM index in `siblings`.
/// A child number one past the last position means append.
fn dom_child_no_from_xpath(siblings: &[NodeRef], xpathcn: usize) -> usize {
    let mut dom_index = 0;
    let mut xpath_index = 1;
    while xpath_index < xpathcn && dom_index < siblings.len() {
        let coalesces = dom_index > 0
            && is_text(&siblings[dom_index])
            && is_text(&siblings[dom_index - 1]);
        if !coalesces {
            xpath_index += 1;
        }
        dom_index += 1;
    }
    if xpath_index < xpathcn {
        dom_index += 1;
    }
    dom_index
}

/// Attaches `ins` under `parent` at DOM index `domcn`. When the node
/// before that index is text, `charpos` places the node within the
/// text run instead.
fn insert_node(parent: &NodeRef, domcn: usize, charpos: usize, ins: NodeRef) -> Result<()> {
    let siblings = children_of(parent);
    if domcn > siblings.len() {
        return Err(Error::PatchFormat("Child number past end of nodes".to_string()));
    }
    let parent_ok = matches!(
        *parent.borrow().content(),
        NodeContent::Element(_) | NodeContent::Document
    );
    if !parent_ok {
        return Err(Error::PatchFormat("Parent must be an element".to_string()));
    }

    if siblings.is_empty() {
        NodeInner::add_child_to_ref(parent, ins);
    } else if domcn > 0 && is_text(&siblings[domcn - 1]) {
        insert_at_char_pos(charpos, &siblings, domcn, ins, parent)?;
    } else {
        NodeInner::add_child_at_to_ref(parent, domcn.min(siblings.len()), ins);
    }
    Ok(())
}

/// Inserts `ins` at character position `charpos` within the text run
/// ending just before `domcn`.
fn insert_at_char_pos(
    charpos: usize,
    siblings: &[NodeRef],
    domcn: usize,
    ins: NodeRef,
    parent: &NodeRef,
) -> Result<()> {
    let mut cp = charpos;
    let mut index = domcn - 1;
    while index > 0 && is_text(&siblings[index - 1]) {
        index -= 1;
    }

    // Walk forward through the run consuming whole nodes.
    loop {
        let node = &siblings[index];
        if is_text(node) && cp > text_length(node) {
            cp -= text_length(node);
            index += 1;
            if index == siblings.len() {
                if cp > 1 {
                    return Err(Error::PatchFormat("charpos past end of text".to_string()));
                }
                NodeInner::add_child_to_ref(parent, ins);
                return Ok(());
            }
        } else {
            break;
        }
    }

    let sibling = siblings[index].clone();
    let sib_index = index_in_parent(&sibling).unwrap_or(index);

    if cp == 1 {
        NodeInner::add_child_at_to_ref(parent, sib_index, ins);
        return Ok(());
    }
    if !is_text(&sibling) {
        return Err(Error::PatchFormat("charpos not within text".to_string()));
    }
    if cp > text_length(&sibling) {
        NodeInner::add_child_at_to_ref(parent, sib_index + 1, ins);
        return Ok(());
    }

    // Inserting into the middle of the node: split it.
    let (text, sib_cdata) = {
        let inner = sibling.borrow();
        let cdata = matches!(inner.content(), NodeContent::Cdata(_));
        (inner.content().text().unwrap_or("").to_string(), cdata)
    };
    let at = char_offset(&text, cp - 1);
    let ins_cdata = matches!(*ins.borrow().content(), NodeContent::Cdata(_));

    if sib_cdata && ins_cdata {
        // Two CDATA sections collapse into one.
        let ins_text = ins.borrow().content().text().unwrap_or("").to_string();
        let merged = format!("{}{}{}", &text[..at], ins_text, &text[at..]);
        let merged_node = NodeInner::new(NodeContent::Cdata(merged));
        detach(&sibling);
        NodeInner::add_child_at_to_ref(parent, sib_index, merged_node);
    } else {
        let make = |value: &str| {
            if sib_cdata {
                NodeInner::new(NodeContent::Cdata(value.to_string()))
            } else {
                NodeInner::new(NodeContent::Text(value.to_string()))
            }
        };
        detach(&sibling);
        NodeInner::add_child_at_to_ref(parent, sib_index, make(&text[..at]));
        NodeInner::add_child_at_to_ref(parent, sib_index + 1, ins);
        NodeInner::add_child_at_to_ref(parent, sib_index + 2, make(&text[at..]));
    }
    Ok(())
}

/// Deletes `length` characters starting at `charpos` within the text
/// run starting at `del_node`. Returns a detached node of the same
/// kind holding the deleted text.
fn delete_text(del_node: &NodeRef, charpos: usize, length: usize) -> Result<NodeRef> {
    if !is_text(del_node) {
        return Err(Error::PatchFormat(
            "Attempt to delete text from non-text node".to_string(),
        ));
    }

    let (text, cdata) = {
        let inner = del_node.borrow();
        let cdata = matches!(inner.content(), NodeContent::Cdata(_));
        (inner.content().text().unwrap_or("").to_string(), cdata)
    };
    let text_len = text.chars().count();

    if charpos > text_len {
        return match next_sibling(del_node) {
            Some(next) if is_text(&next) => delete_text(&next, charpos - text_len, length),
            _ => Err(Error::PatchFormat("charpos not within text".to_string())),
        };
    }

    let start = char_offset(&text, charpos - 1);
    let mut kept = text[..start].to_string();
    let mut deleted = text[start..].to_string();
    let overrun = (length + charpos - 1) as i64 - text_len as i64;
    if overrun < 0 {
        let end = char_offset(&text, charpos - 1 + length);
        kept.push_str(&text[end..]);
        deleted = text[start..end].to_string();
    }

    let parent = parent_of(del_node).ok_or_else(|| {
        Error::PatchFormat("Attempt to delete text from a detached node".to_string())
    })?;
    if !kept.is_empty() {
        let index = index_in_parent(del_node).unwrap_or(0);
        let kept_node = if cdata {
            NodeInner::new(NodeContent::Cdata(kept))
        } else {
            NodeInner::new(NodeContent::Text(kept))
        };
        NodeInner::add_child_at_to_ref(&parent, index, kept_node);
    }

    if overrun > 0 {
        match next_sibling(del_node) {
            Some(next) if is_text(&next) => {
                let more = delete_text(&next, 1, overrun as usize)?;
                let more_text = more.borrow().content().text().unwrap_or("").to_string();
                deleted.push_str(&more_text);
            }
            _ => return Err(Error::PatchFormat("length past end of text".to_string())),
        }
    }
    detach(del_node);

    Ok(if cdata {
        NodeInner::new(NodeContent::Cdata(deleted))
    } else {
        NodeInner::new(NodeContent::Text(deleted))
    })
}

/// Deletes from `charpos` to the end of the text run.
fn delete_text_run(del_node: &NodeRef, charpos: usize) -> Result<NodeRef> {
    let total = run_length(del_node);
    if charpos > total {
        return Err(Error::PatchFormat("charpos not within text".to_string()));
    }
    delete_text(del_node, charpos, total - charpos + 1)
}
