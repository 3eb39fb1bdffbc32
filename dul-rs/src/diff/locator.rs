//! XPath-style node locators.
//!
//! Delta operations address nodes with a restricted XPath subset:
//! absolute paths of `node()[i]` steps, optionally ending in an
//! attribute step. The document node is addressed as `/`. Generated
//! paths only ever use `node()[i]` and `@name` steps, but the resolver
//! also accepts named element steps such as `item[2]`.

use crate::diff::child_number::{starts_xpath_position, ChildNumber};
use crate::error::{Error, Result};
use crate::node::{children_of, parent_of, NodeContent, NodeRef};

/// What a locator resolved to.
#[derive(Debug, Clone)]
pub enum Target {
    /// A node in the tree. A locator pointing into the middle of a
    /// text run resolves to the first node of the run.
    Node(NodeRef),
    /// An attribute of an element.
    Attribute {
        /// The element carrying the attribute.
        owner: NodeRef,
        /// The attribute name as written.
        qname: String,
    },
}

/// Builds the locator for a node. The document node is `/`.
pub fn xpath_of(node: &NodeRef) -> String {
    match parent_of(node) {
        None => "/".to_string(),
        Some(parent) => {
            let step = format!("/node()[{}]", ChildNumber::new(node).xpath());
            if parent_of(&parent).is_none() {
                step
            } else {
                format!("{}{}", xpath_of(&parent), step)
            }
        }
    }
}

/// Builds the locator for an attribute of an element.
pub fn attribute_xpath(owner: &NodeRef, qname: &str) -> String {
    format!("{}/@{}", xpath_of(owner), qname)
}

/// Resolves a locator against a document.
pub fn resolve(doc: &NodeRef, path: &str) -> Result<Target> {
    let trimmed = path.trim();
    if !trimmed.starts_with('/') {
        return Err(Error::PatchFormat(format!("invalid node path: {path}")));
    }
    if trimmed == "/" {
        return Ok(Target::Node(doc.clone()));
    }

    let steps: Vec<&str> = trimmed[1..].split('/').collect();
    let mut current = doc.clone();
    for (i, step) in steps.iter().enumerate() {
        if let Some(name) = step.strip_prefix('@') {
            if name.is_empty() || i + 1 != steps.len() {
                return Err(Error::PatchFormat(format!("invalid node path: {path}")));
            }
            return Ok(Target::Attribute {
                owner: current,
                qname: name.to_string(),
            });
        }
        current = resolve_step(&current, step, path)?;
    }
    Ok(Target::Node(current))
}

fn resolve_step(context: &NodeRef, step: &str, path: &str) -> Result<NodeRef> {
    let (name, index) = match step.find('[') {
        Some(open) => {
            let close = step
                .rfind(']')
                .ok_or_else(|| Error::PatchFormat(format!("invalid node path: {path}")))?;
            let index: usize = step[open + 1..close]
                .parse()
                .map_err(|_| Error::PatchFormat(format!("invalid node path: {path}")))?;
            (&step[..open], index)
        }
        None => (step, 1),
    };
    if name.is_empty() || index < 1 {
        return Err(Error::PatchFormat(format!("invalid node path: {path}")));
    }

    let children = children_of(context);
    if name == "node()" {
        let mut position = 0;
        for i in 0..children.len() {
            if starts_xpath_position(&children, i) {
                position += 1;
                if position == index {
                    return Ok(children[i].clone());
                }
            }
        }
    } else {
        let mut count = 0;
        for child in &children {
            let matches = matches!(
                child.borrow().content(), NodeContent::Element(data) if data.qname == name);
            if matches {
                count += 1;
                if count == index {
                    return Ok(child.clone());
                }
            }
        }
    }
    Err(Error::PatchFormat(format!("could not resolve path: {path}")))
}
