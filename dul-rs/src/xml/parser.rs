//! Streaming XML parser building document trees.

use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{Error, Result};
use crate::node::namespace::{is_xmlns, split_qname, NamespaceContext};
use crate::node::{Attribute, ElementData, NodeContent, NodeInner, NodeRef};

/// Parses an XML document from a string into a tree rooted at a
/// document node.
pub fn parse_str(xml: &str) -> Result<NodeRef> {
    let mut reader = Reader::from_str(xml);
    let document = NodeInner::document();
    let mut stack: Vec<NodeRef> = vec![document.clone()];
    let mut namespaces = NamespaceContext::new();
    let mut seen_root = false;

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                let parent = current(&stack);
                if at_document_level(&stack) {
                    if seen_root {
                        return Err(Error::Parse(
                            "more than one document element".to_string(),
                        ));
                    }
                    seen_root = true;
                }
                let element = element_node(&start, &mut namespaces)?;
                NodeInner::add_child_to_ref(&parent, element.clone());
                stack.push(element);
            }
            Event::End(_) => {
                stack.pop();
                namespaces.pop_scope();
            }
            Event::Empty(start) => {
                let parent = current(&stack);
                if at_document_level(&stack) {
                    if seen_root {
                        return Err(Error::Parse(
                            "more than one document element".to_string(),
                        ));
                    }
                    seen_root = true;
                }
                let element = element_node(&start, &mut namespaces)?;
                namespaces.pop_scope();
                NodeInner::add_child_to_ref(&parent, element);
            }
            Event::Text(text) => {
                let value = text
                    .unescape()
                    .map_err(|e| Error::Parse(e.to_string()))?
                    .into_owned();
                if at_document_level(&stack) {
                    if value.chars().all(char::is_whitespace) {
                        continue;
                    }
                    return Err(Error::Parse(
                        "text content outside the document element".to_string(),
                    ));
                }
                let parent = current(&stack);
                NodeInner::add_child_to_ref(&parent, NodeInner::new(NodeContent::Text(value)));
            }
            Event::CData(data) => {
                let value = String::from_utf8_lossy(&data.into_inner()).into_owned();
                if at_document_level(&stack) {
                    return Err(Error::Parse(
                        "CDATA outside the document element".to_string(),
                    ));
                }
                let parent = current(&stack);
                NodeInner::add_child_to_ref(&parent, NodeInner::new(NodeContent::Cdata(value)));
            }
            Event::Comment(text) => {
                let value = text
                    .unescape()
                    .map_err(|e| Error::Parse(e.to_string()))?
                    .into_owned();
                let parent = current(&stack);
                NodeInner::add_child_to_ref(&parent, NodeInner::new(NodeContent::Comment(value)));
            }
            Event::PI(pi) => {
                let target = String::from_utf8_lossy(pi.target()).into_owned();
                let data = String::from_utf8_lossy(pi.content()).trim_start().to_string();
                let parent = current(&stack);
                NodeInner::add_child_to_ref(
                    &parent,
                    NodeInner::new(NodeContent::ProcessingInstruction { target, data }),
                );
            }
            Event::DocType(text) => {
                let value = String::from_utf8_lossy(text.as_ref()).trim().to_string();
                NodeInner::add_child_to_ref(
                    &document,
                    NodeInner::new(NodeContent::DocType(value)),
                );
            }
            Event::Decl(_) => {}
            Event::Eof => break,
        }
    }

    if stack.len() != 1 {
        return Err(Error::Parse("unclosed element at end of input".to_string()));
    }
    if !seen_root {
        return Err(Error::Parse("no document element".to_string()));
    }
    Ok(document)
}

/// Parses an XML document from a file.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<NodeRef> {
    let xml = std::fs::read_to_string(path)?;
    parse_str(&xml)
}

fn current(stack: &[NodeRef]) -> NodeRef {
    debug_assert!(!stack.is_empty());
    stack[stack.len() - 1].clone()
}

fn at_document_level(stack: &[NodeRef]) -> bool {
    stack.len() == 1
}

/// Builds an element node from a start tag, pushing its namespace
/// declarations as a new scope.
fn element_node(start: &BytesStart<'_>, namespaces: &mut NamespaceContext) -> Result<NodeRef> {
    let qname = String::from_utf8_lossy(start.name().as_ref()).into_owned();

    let mut raw_attrs: Vec<(String, String)> = Vec::new();
    let mut decls: Vec<(String, String)> = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| Error::Parse(e.to_string()))?;
        let name = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| Error::Parse(e.to_string()))?
            .into_owned();
        if is_xmlns(&name) {
            let prefix = name.strip_prefix("xmlns:").unwrap_or("").to_string();
            decls.push((prefix, value));
        } else {
            raw_attrs.push((name, value));
        }
    }
    namespaces.push_scope(decls.clone());

    let (prefix, local) = split_qname(&qname);
    let namespace = namespaces.resolve(prefix);
    if namespace.is_none() && !prefix.is_empty() {
        return Err(Error::Parse(format!("unbound namespace prefix: {prefix}")));
    }

    let mut attributes = Vec::new();
    for (name, value) in raw_attrs {
        let (prefix, local) = split_qname(&name);
        // Unprefixed attributes are never in the default namespace.
        let namespace = if prefix.is_empty() {
            None
        } else {
            match namespaces.resolve(prefix) {
                Some(uri) => Some(uri),
                None => {
                    return Err(Error::Parse(format!(
                        "unbound namespace prefix: {prefix}"
                    )))
                }
            }
        };
        attributes.push(Attribute {
            namespace,
            local_name: local.to_string(),
            qname: name,
            value,
        });
    }

    Ok(NodeInner::new(NodeContent::Element(ElementData {
        namespace,
        local_name: local.to_string(),
        qname,
        attributes,
        namespace_decls: decls,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{children_of, document_element};

    #[test]
    fn test_parse_simple() {
        let doc = parse_str("<a><b>text</b><c/></a>").unwrap();
        let root = document_element(&doc).unwrap();
        let root_inner = root.borrow();
        let data = match root_inner.content() {
            NodeContent::Element(d) => d,
            other => panic!("unexpected content: {other:?}"),
        };
        assert_eq!(data.qname, "a");
        assert_eq!(root_inner.child_count(), 2);

        let b = children_of(&root)[0].clone();
        assert_eq!(children_of(&b)[0].borrow().content().text(), Some("text"));
    }

    #[test]
    fn test_parse_attributes_and_entities() {
        let doc = parse_str(r#"<a x="1 &amp; 2">&lt;</a>"#).unwrap();
        let root = document_element(&doc).unwrap();
        let root_inner = root.borrow();
        if let NodeContent::Element(data) = root_inner.content() {
            assert_eq!(data.attribute("x").map(|a| a.value.as_str()), Some("1 & 2"));
        } else {
            panic!("not an element");
        }
        assert_eq!(children_of(&root)[0].borrow().content().text(), Some("<"));
    }

    #[test]
    fn test_parse_namespaces() {
        let doc = parse_str(r#"<p:a xmlns:p="urn:p"><p:b p:x="1"/></p:a>"#).unwrap();
        let root = document_element(&doc).unwrap();
        let b = children_of(&root)[0].clone();
        let b_inner = b.borrow();
        if let NodeContent::Element(data) = b_inner.content() {
            assert_eq!(data.namespace.as_deref(), Some("urn:p"));
            assert_eq!(data.local_name, "b");
            let attr = data.attribute("p:x").unwrap();
            assert_eq!(attr.namespace.as_deref(), Some("urn:p"));
        } else {
            panic!("not an element");
        }
    }

    #[test]
    fn test_parse_default_namespace_not_on_attrs() {
        let doc = parse_str(r#"<a xmlns="urn:d" x="1"/>"#).unwrap();
        let root = document_element(&doc).unwrap();
        let root_inner = root.borrow();
        if let NodeContent::Element(data) = root_inner.content() {
            assert_eq!(data.namespace.as_deref(), Some("urn:d"));
            assert_eq!(data.attribute("x").unwrap().namespace, None);
        } else {
            panic!("not an element");
        }
    }

    #[test]
    fn test_parse_misc_nodes() {
        let doc = parse_str("<?pi data?><a><!--note--><![CDATA[raw <&]]></a>").unwrap();
        let kids = children_of(&doc);
        assert!(matches!(
            *kids[0].borrow().content(),
            NodeContent::ProcessingInstruction { .. }
        ));
        let root = document_element(&doc).unwrap();
        let inner = children_of(&root);
        assert!(matches!(*inner[0].borrow().content(), NodeContent::Comment(_)));
        assert_eq!(inner[1].borrow().content().text(), Some("raw <&"));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_str("").is_err());
        assert!(parse_str("<a/><b/>").is_err());
        assert!(parse_str("stray<a/>").is_err());
        assert!(parse_str("<a>").is_err());
        assert!(parse_str("<p:a/>").is_err());
    }
}
