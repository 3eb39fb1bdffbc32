//! Node content variants and element data.

/// The kind and payload of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeContent {
    /// The document root. Exactly one per tree, always at the top.
    Document,
    /// An element with a name, attributes and namespace declarations.
    Element(ElementData),
    /// A plain text node.
    Text(String),
    /// A CDATA section.
    Cdata(String),
    /// A comment.
    Comment(String),
    /// A processing instruction.
    ProcessingInstruction {
        /// The PI target, e.g. `xml-stylesheet`.
        target: String,
        /// The PI data, everything after the target.
        data: String,
    },
    /// A document type declaration. Carried through parsing so it can
    /// be reproduced on output, but never diffed.
    DocType(String),
}

impl NodeContent {
    /// True for text and CDATA content.
    pub fn is_text(&self) -> bool {
        matches!(self, NodeContent::Text(_) | NodeContent::Cdata(_))
    }

    /// The character data of text and CDATA content.
    pub fn text(&self) -> Option<&str> {
        match self {
            NodeContent::Text(t) | NodeContent::Cdata(t) => Some(t),
            _ => None,
        }
    }

    /// A short name for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            NodeContent::Document => "document",
            NodeContent::Element(_) => "element",
            NodeContent::Text(_) => "text",
            NodeContent::Cdata(_) => "cdata",
            NodeContent::Comment(_) => "comment",
            NodeContent::ProcessingInstruction { .. } => "processing instruction",
            NodeContent::DocType(_) => "doctype",
        }
    }
}

/// An attribute on an element.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    /// Namespace URI, if the attribute name carries a bound prefix.
    pub namespace: Option<String>,
    /// Local part of the attribute name.
    pub local_name: String,
    /// The name as written, prefix included.
    pub qname: String,
    /// The attribute value.
    pub value: String,
}

/// The data carried by an element node.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementData {
    /// Namespace URI the element name is bound to.
    pub namespace: Option<String>,
    /// Local part of the element name.
    pub local_name: String,
    /// The name as written, prefix included.
    pub qname: String,
    /// Attributes in document order, namespace declarations excluded.
    pub attributes: Vec<Attribute>,
    /// Namespace declarations on this element, as (prefix, uri) pairs.
    /// The default namespace uses an empty prefix.
    pub namespace_decls: Vec<(String, String)>,
}

impl ElementData {
    /// Creates element data for an unqualified name.
    pub fn new(name: &str) -> ElementData {
        ElementData {
            namespace: None,
            local_name: name.to_string(),
            qname: name.to_string(),
            attributes: Vec::new(),
            namespace_decls: Vec::new(),
        }
    }

    /// Looks up an attribute by its written name.
    pub fn attribute(&self, qname: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.qname == qname)
    }

    /// Looks up an attribute by namespace and local name. A `None`
    /// namespace matches attributes with no namespace.
    pub fn attribute_ns(&self, namespace: Option<&str>, local_name: &str) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|a| a.namespace.as_deref() == namespace && a.local_name == local_name)
    }

    /// Sets an attribute value, replacing any attribute with the same
    /// written name.
    pub fn set_attribute(&mut self, attr: Attribute) {
        if let Some(existing) = self.attributes.iter_mut().find(|a| a.qname == attr.qname) {
            *existing = attr;
        } else {
            self.attributes.push(attr);
        }
    }

    /// Removes an attribute by its written name.
    pub fn remove_attribute(&mut self, qname: &str) {
        self.attributes.retain(|a| a.qname != qname);
    }
}
