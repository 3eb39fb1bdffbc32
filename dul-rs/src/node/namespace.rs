//! Namespace prefix resolution.

use crate::node::{parent_of, NodeContent, NodeRef};

/// The namespace URI bound to the `xml` prefix.
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// A stack of namespace scopes used while parsing. Each element pushes
/// a scope holding its declarations; lookups walk from the innermost
/// scope outwards.
#[derive(Debug, Default)]
pub struct NamespaceContext {
    scopes: Vec<Vec<(String, String)>>,
}

impl NamespaceContext {
    pub fn new() -> NamespaceContext {
        NamespaceContext::default()
    }

    /// Opens a scope with the given declarations.
    pub fn push_scope(&mut self, decls: Vec<(String, String)>) {
        self.scopes.push(decls);
    }

    /// Closes the innermost scope.
    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// Resolves a prefix to a namespace URI. The empty prefix resolves
    /// the default namespace; an empty URI declaration unbinds it.
    pub fn resolve(&self, prefix: &str) -> Option<String> {
        if prefix == "xml" {
            return Some(XML_NS.to_string());
        }
        for scope in self.scopes.iter().rev() {
            if let Some((_, uri)) = scope.iter().rev().find(|(p, _)| p == prefix) {
                if uri.is_empty() {
                    return None;
                }
                return Some(uri.clone());
            }
        }
        None
    }
}

/// Splits a qualified name into its prefix and local part. Names
/// without a colon get an empty prefix.
pub fn split_qname(qname: &str) -> (&str, &str) {
    match qname.split_once(':') {
        Some((prefix, local)) => (prefix, local),
        None => ("", qname),
    }
}

/// Whether an attribute name declares a namespace.
pub fn is_xmlns(qname: &str) -> bool {
    qname == "xmlns" || qname.starts_with("xmlns:")
}

/// Resolves a prefix against the declarations in scope at `node`,
/// walking up through its ancestors.
pub fn resolve_prefix_in_scope(node: &NodeRef, prefix: &str) -> Option<String> {
    if prefix == "xml" {
        return Some(XML_NS.to_string());
    }
    let mut current = Some(node.clone());
    while let Some(n) = current {
        if let NodeContent::Element(data) = n.borrow().content() {
            if let Some((_, uri)) = data.namespace_decls.iter().rev().find(|(p, _)| p == prefix) {
                if uri.is_empty() {
                    return None;
                }
                return Some(uri.clone());
            }
        }
        current = parent_of(&n);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{ElementData, NodeInner};

    #[test]
    fn test_split_qname() {
        assert_eq!(split_qname("a:b"), ("a", "b"));
        assert_eq!(split_qname("b"), ("", "b"));
    }

    #[test]
    fn test_is_xmlns() {
        assert!(is_xmlns("xmlns"));
        assert!(is_xmlns("xmlns:x"));
        assert!(!is_xmlns("xml:lang"));
    }

    #[test]
    fn test_context_resolution() {
        let mut ctx = NamespaceContext::new();
        ctx.push_scope(vec![("".to_string(), "urn:outer".to_string())]);
        ctx.push_scope(vec![("p".to_string(), "urn:p".to_string())]);

        assert_eq!(ctx.resolve(""), Some("urn:outer".to_string()));
        assert_eq!(ctx.resolve("p"), Some("urn:p".to_string()));
        assert_eq!(ctx.resolve("xml"), Some(XML_NS.to_string()));
        assert_eq!(ctx.resolve("q"), None);

        ctx.pop_scope();
        assert_eq!(ctx.resolve("p"), None);
    }

    #[test]
    fn test_unbinding_default() {
        let mut ctx = NamespaceContext::new();
        ctx.push_scope(vec![("".to_string(), "urn:outer".to_string())]);
        ctx.push_scope(vec![("".to_string(), String::new())]);
        assert_eq!(ctx.resolve(""), None);
    }

    #[test]
    fn test_resolve_in_scope() {
        let mut outer_data = ElementData::new("outer");
        outer_data.namespace_decls.push(("p".to_string(), "urn:p".to_string()));
        let outer = NodeInner::new(NodeContent::Element(outer_data));
        let inner = NodeInner::new(NodeContent::Element(ElementData::new("inner")));
        NodeInner::add_child_to_ref(&outer, inner.clone());

        assert_eq!(resolve_prefix_in_scope(&inner, "p"), Some("urn:p".to_string()));
        assert_eq!(resolve_prefix_in_scope(&inner, "q"), None);
    }
}
