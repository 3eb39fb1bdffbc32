//! Reading and writing edit scripts as DUL delta documents.

use std::fmt::Write;

use crate::diff::operation::{EditScript, NodeTypeCode, Operation};
use crate::diff::{names, DUL_NAMESPACE};
use crate::error::{Error, Result};
use crate::node::{children_of, ElementData, NodeContent, NodeRef};
use crate::xml::{escape_attr, escape_text, parse_str};

impl EditScript {
    /// Serializes the script as a DUL delta document.
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        let _ = write!(out, "<{} xmlns=\"{}\"", names::DELTA, DUL_NAMESPACE);
        if let Some((sibling, parent, parent_sibling)) = self.context {
            let _ = write!(
                out,
                " {}=\"{}\" {}=\"{}\" {}=\"{}\"",
                names::SIBLING_CONTEXT,
                sibling,
                names::PARENT_CONTEXT,
                parent,
                names::PARENT_SIBLING_CONTEXT,
                parent_sibling
            );
        }
        if self.reverse_patch {
            let _ = write!(out, " {}=\"true\"", names::REVERSE_PATCH);
        }
        if !self.resolve_entities {
            let _ = write!(out, " {}=\"false\"", names::RESOLVE_ENTITIES);
        }

        if self.ops.is_empty() {
            out.push_str("/>");
            return out;
        }
        out.push('>');
        // One operation per line; text payloads stay inside their
        // operation element untouched.
        for op in &self.ops {
            out.push('\n');
            write_op(&mut out, op);
        }
        let _ = write!(out, "\n</{}>", names::DELTA);
        out
    }

    /// Parses a DUL delta document.
    pub fn from_xml(xml: &str) -> Result<EditScript> {
        Self::from_document(&parse_str(xml)?)
    }

    /// Reads an edit script out of a parsed delta document.
    pub fn from_document(doc: &NodeRef) -> Result<EditScript> {
        let root = crate::node::document_element(doc).ok_or_else(|| {
            Error::PatchFormat("delta document has no document element".to_string())
        })?;
        let root_inner = root.borrow();
        let data = match root_inner.content() {
            NodeContent::Element(data) if data.local_name == names::DELTA => data,
            NodeContent::Element(data) => {
                return Err(Error::PatchFormat(format!(
                    "expected a {} document element, found {}",
                    names::DELTA,
                    data.qname
                )))
            }
            other => {
                return Err(Error::PatchFormat(format!(
                    "expected a {} document element, found a {} node",
                    names::DELTA,
                    other.kind_name()
                )))
            }
        };

        let context = match (
            attr_value(data, names::SIBLING_CONTEXT),
            attr_value(data, names::PARENT_CONTEXT),
            attr_value(data, names::PARENT_SIBLING_CONTEXT),
        ) {
            (Some(s), Some(p), Some(ps)) => Some((
                parse_number(&s, names::SIBLING_CONTEXT)?,
                parse_number(&p, names::PARENT_CONTEXT)?,
                parse_number(&ps, names::PARENT_SIBLING_CONTEXT)?,
            )),
            _ => None,
        };
        let reverse_patch = attr_value(data, names::REVERSE_PATCH).as_deref() == Some("true");
        let resolve_entities =
            attr_value(data, names::RESOLVE_ENTITIES).as_deref() != Some("false");

        let mut ops = Vec::new();
        for child in children_of(&root) {
            let child_inner = child.borrow();
            let data = match child_inner.content() {
                NodeContent::Element(data) => data,
                // Whitespace and comments between operations are fine.
                _ => continue,
            };
            ops.push(read_op(data, &child)?);
        }

        Ok(EditScript {
            ops,
            context,
            reverse_patch,
            resolve_entities,
        })
    }
}

fn write_op(out: &mut String, op: &Operation) {
    match op {
        Operation::Insert {
            parent,
            node_type,
            childno,
            name,
            namespace,
            charpos,
            value,
        } => {
            let _ = write!(
                out,
                "<{} {}=\"{}\" {}=\"{}\"",
                names::INSERT,
                names::PARENT,
                escape_attr(parent),
                names::NODETYPE,
                node_type.code()
            );
            if let Some(childno) = childno {
                let _ = write!(out, " {}=\"{}\"", names::CHILDNO, childno);
            }
            if let Some(namespace) = namespace {
                let _ = write!(out, " {}=\"{}\"", names::NAMESPACE, escape_attr(namespace));
            }
            if let Some(name) = name {
                let _ = write!(out, " {}=\"{}\"", names::NAME, escape_attr(name));
            }
            if let Some(charpos) = charpos {
                let _ = write!(out, " {}=\"{}\"", names::CHARPOS, charpos);
            }
            match value {
                Some(value) => {
                    let _ = write!(
                        out,
                        ">{}</{}>",
                        escape_text(value),
                        names::INSERT
                    );
                }
                None => out.push_str("/>"),
            }
        }
        Operation::Delete { node, charpos, length } => {
            let _ = write!(
                out,
                "<{} {}=\"{}\"",
                names::DELETE,
                names::NODE,
                escape_attr(node)
            );
            if let Some(charpos) = charpos {
                let _ = write!(out, " {}=\"{}\"", names::CHARPOS, charpos);
            }
            if let Some(length) = length {
                let _ = write!(out, " {}=\"{}\"", names::LENGTH, length);
            }
            out.push_str("/>");
        }
        Operation::Move {
            node,
            parent,
            childno,
            old_charpos,
            new_charpos,
            length,
        } => {
            let _ = write!(
                out,
                "<{} {}=\"{}\" {}=\"{}\" {}=\"{}\"",
                names::MOVE,
                names::NODE,
                escape_attr(node),
                names::OLD_CHARPOS,
                old_charpos,
                names::NEW_CHARPOS,
                new_charpos
            );
            if let Some(length) = length {
                let _ = write!(out, " {}=\"{}\"", names::LENGTH, length);
            }
            let _ = write!(
                out,
                " {}=\"{}\" {}=\"{}\"/>",
                names::PARENT,
                escape_attr(parent),
                names::CHILDNO,
                childno
            );
        }
        Operation::Update { node, value } => {
            let _ = write!(
                out,
                "<{} {}=\"{}\">{}</{}>",
                names::UPDATE,
                names::NODE,
                escape_attr(node),
                escape_text(value),
                names::UPDATE
            );
        }
    }
}

fn read_op(data: &ElementData, element: &NodeRef) -> Result<Operation> {
    match data.local_name.as_str() {
        name if name == names::INSERT => {
            let parent = required_attr(data, names::PARENT)?;
            let code: u8 = parse_number(&required_attr(data, names::NODETYPE)?, names::NODETYPE)?;
            if code == 10 {
                return Err(Error::PatchFormat(
                    "doctype declarations cannot be inserted".to_string(),
                ));
            }
            let node_type = NodeTypeCode::from_code(code).ok_or_else(|| {
                Error::PatchFormat(format!("Invalid {}: {code}", names::NODETYPE))
            })?;
            Ok(Operation::Insert {
                parent,
                node_type,
                childno: optional_number(data, names::CHILDNO)?,
                name: attr_value(data, names::NAME),
                namespace: attr_value(data, names::NAMESPACE),
                charpos: optional_charpos(data, names::CHARPOS)?,
                value: text_content(element),
            })
        }
        name if name == names::DELETE => Ok(Operation::Delete {
            node: required_attr(data, names::NODE)?,
            charpos: optional_charpos(data, names::CHARPOS)?,
            length: optional_number(data, names::LENGTH)?,
        }),
        name if name == names::MOVE => Ok(Operation::Move {
            node: required_attr(data, names::NODE)?,
            parent: required_attr(data, names::PARENT)?,
            childno: optional_number(data, names::CHILDNO)?.unwrap_or(1),
            old_charpos: optional_charpos(data, names::OLD_CHARPOS)?.unwrap_or(1),
            new_charpos: optional_charpos(data, names::NEW_CHARPOS)?.unwrap_or(1),
            length: optional_number(data, names::LENGTH)?,
        }),
        name if name == names::UPDATE => Ok(Operation::Update {
            node: required_attr(data, names::NODE)?,
            value: text_content(element).unwrap_or_default(),
        }),
        other => Err(Error::PatchFormat(format!("Invalid element: {other}"))),
    }
}

fn attr_value(data: &ElementData, name: &str) -> Option<String> {
    data.attribute(name).map(|a| a.value.clone())
}

fn required_attr(data: &ElementData, name: &str) -> Result<String> {
    attr_value(data, name).ok_or_else(|| Error::PatchFormat(format!("No {name} specified")))
}

fn parse_number<T: std::str::FromStr>(value: &str, name: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::PatchFormat(format!("Invalid {name}: {value}")))
}

fn optional_number(data: &ElementData, name: &str) -> Result<Option<usize>> {
    attr_value(data, name)
        .map(|v| parse_number(&v, name))
        .transpose()
}

fn optional_charpos(data: &ElementData, name: &str) -> Result<Option<usize>> {
    match optional_number(data, name)? {
        Some(0) => Err(Error::PatchFormat(format!("{name} must be >= 1"))),
        other => Ok(other),
    }
}

/// Concatenated text and CDATA children, None when there are none.
fn text_content(element: &NodeRef) -> Option<String> {
    let mut found = false;
    let mut out = String::new();
    for child in children_of(element) {
        if let Some(text) = child.borrow().content().text() {
            found = true;
            out.push_str(text);
        }
    }
    found.then_some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_script() {
        let script = EditScript::new();
        let xml = script.to_xml();
        assert_eq!(xml, r#"<delta xmlns="http://www.adrianmouat.com/dul"/>"#);
        assert_eq!(EditScript::from_xml(&xml).unwrap(), script);
    }

    #[test]
    fn test_root_flags() {
        let script = EditScript {
            ops: Vec::new(),
            context: Some((2, 1, 0)),
            reverse_patch: true,
            resolve_entities: false,
        };
        let xml = script.to_xml();
        assert!(xml.contains(r#"sib_context="2""#));
        assert!(xml.contains(r#"par_context="1""#));
        assert!(xml.contains(r#"par_sib_context="0""#));
        assert!(xml.contains(r#"reverse_patch="true""#));
        assert!(xml.contains(r#"resolve_entities="false""#));
        assert_eq!(EditScript::from_xml(&xml).unwrap(), script);
    }

    #[test]
    fn test_operations_round_trip() {
        let script = EditScript {
            ops: vec![
                Operation::Insert {
                    parent: "/node()[1]".to_string(),
                    node_type: NodeTypeCode::Element,
                    childno: Some(2),
                    name: Some("c".to_string()),
                    namespace: Some("urn:x".to_string()),
                    charpos: None,
                    value: None,
                },
                Operation::Insert {
                    parent: "/node()[1]/node()[2]".to_string(),
                    node_type: NodeTypeCode::Attribute,
                    childno: None,
                    name: Some("x".to_string()),
                    namespace: None,
                    charpos: None,
                    value: Some("a \"quoted\" & value".to_string()),
                },
                Operation::Insert {
                    parent: "/node()[1]".to_string(),
                    node_type: NodeTypeCode::Text,
                    childno: Some(1),
                    name: None,
                    namespace: None,
                    charpos: Some(5),
                    value: Some("some <text>".to_string()),
                },
                Operation::Delete {
                    node: "/node()[1]/node()[3]".to_string(),
                    charpos: Some(2),
                    length: Some(4),
                },
                Operation::Move {
                    node: "/node()[1]/node()[1]".to_string(),
                    parent: "/node()[1]/node()[2]".to_string(),
                    childno: 1,
                    old_charpos: 1,
                    new_charpos: 3,
                    length: Some(7),
                },
                Operation::Update {
                    node: "/node()[1]/@x".to_string(),
                    value: "new".to_string(),
                },
            ],
            context: None,
            reverse_patch: false,
            resolve_entities: true,
        };

        let xml = script.to_xml();
        assert_eq!(EditScript::from_xml(&xml).unwrap(), script);
    }

    #[test]
    fn test_insert_attribute_omits_childno() {
        let script = EditScript {
            ops: vec![Operation::Insert {
                parent: "/node()[1]".to_string(),
                node_type: NodeTypeCode::Attribute,
                childno: None,
                name: Some("x".to_string()),
                namespace: None,
                charpos: None,
                value: Some("1".to_string()),
            }],
            ..EditScript::new()
        };
        let xml = script.to_xml();
        assert!(!xml.contains("childno"));
        assert!(xml.contains(r#"nodetype="2""#));
    }

    #[test]
    fn test_decode_errors() {
        let ns = DUL_NAMESPACE;
        assert!(matches!(
            EditScript::from_xml(&format!(r#"<delta xmlns="{ns}"><frob/></delta>"#)),
            Err(Error::PatchFormat(msg)) if msg.contains("Invalid element")
        ));
        assert!(EditScript::from_xml(&format!(
            r#"<delta xmlns="{ns}"><insert nodetype="1" childno="1" name="a"/></delta>"#
        ))
        .is_err());
        assert!(EditScript::from_xml(&format!(
            r#"<delta xmlns="{ns}"><insert parent="/" nodetype="10" childno="1"/></delta>"#
        ))
        .is_err());
        assert!(EditScript::from_xml(&format!(
            r#"<delta xmlns="{ns}"><insert parent="/" nodetype="1" childno="x"/></delta>"#
        ))
        .is_err());
        assert!(EditScript::from_xml(&format!(
            r#"<delta xmlns="{ns}"><delete node="/node()[1]" charpos="0"/></delta>"#
        ))
        .is_err());
        assert!(EditScript::from_xml(&format!(r#"<notdelta xmlns="{ns}"/>"#)).is_err());
    }
}
