//! Serializes document trees back to XML text.

use std::io::Write;

use crate::error::Result;
use crate::node::{children_of, NodeContent, NodeRef};

/// Writes a node tree as XML markup.
pub struct XmlPrinter<W: Write> {
    writer: W,
}

impl<W: Write> XmlPrinter<W> {
    pub fn new(writer: W) -> XmlPrinter<W> {
        XmlPrinter { writer }
    }

    /// Writes a node and all of its descendants.
    pub fn print(&mut self, node: &NodeRef) -> Result<()> {
        let content = node.borrow().content().clone();
        match content {
            NodeContent::Document => {
                for child in children_of(node) {
                    self.print(&child)?;
                }
            }
            NodeContent::Element(data) => {
                write!(self.writer, "<{}", data.qname)?;
                for (prefix, uri) in &data.namespace_decls {
                    if prefix.is_empty() {
                        write!(self.writer, " xmlns=\"{}\"", escape_attr(uri))?;
                    } else {
                        write!(self.writer, " xmlns:{}=\"{}\"", prefix, escape_attr(uri))?;
                    }
                }
                for attr in &data.attributes {
                    write!(self.writer, " {}=\"{}\"", attr.qname, escape_attr(&attr.value))?;
                }
                let children = children_of(node);
                if children.is_empty() {
                    write!(self.writer, "/>")?;
                } else {
                    write!(self.writer, ">")?;
                    for child in children {
                        self.print(&child)?;
                    }
                    write!(self.writer, "</{}>", data.qname)?;
                }
            }
            NodeContent::Text(text) => {
                write!(self.writer, "{}", escape_text(&text))?;
            }
            NodeContent::Cdata(text) => {
                write!(self.writer, "<![CDATA[{text}]]>")?;
            }
            NodeContent::Comment(text) => {
                write!(self.writer, "<!--{text}-->")?;
            }
            NodeContent::ProcessingInstruction { target, data } => {
                if data.is_empty() {
                    write!(self.writer, "<?{target}?>")?;
                } else {
                    write!(self.writer, "<?{target} {data}?>")?;
                }
            }
            NodeContent::DocType(decl) => {
                write!(self.writer, "<!DOCTYPE {decl}>")?;
            }
        }
        Ok(())
    }
}

/// Serializes a tree to a string.
pub fn document_to_string(node: &NodeRef) -> String {
    let mut out = Vec::new();
    // Writing to a Vec cannot fail.
    let _ = XmlPrinter::new(&mut out).print(node);
    String::from_utf8_lossy(&out).into_owned()
}

/// Escapes character data content.
pub(crate) fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escapes an attribute value for a double-quoted literal.
pub(crate) fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_str;

    fn round_trip(xml: &str) -> String {
        document_to_string(&parse_str(xml).unwrap())
    }

    #[test]
    fn test_print_simple() {
        assert_eq!(round_trip("<a><b>text</b><c/></a>"), "<a><b>text</b><c/></a>");
    }

    #[test]
    fn test_print_escapes() {
        assert_eq!(
            round_trip(r#"<a x="&quot;&amp;">a &lt; b</a>"#),
            r#"<a x="&quot;&amp;">a &lt; b</a>"#
        );
    }

    #[test]
    fn test_print_namespaces() {
        assert_eq!(
            round_trip(r#"<p:a xmlns:p="urn:p" p:x="1"><b xmlns="urn:d"/></p:a>"#),
            r#"<p:a xmlns:p="urn:p" p:x="1"><b xmlns="urn:d"/></p:a>"#
        );
    }

    #[test]
    fn test_print_misc() {
        assert_eq!(
            round_trip("<?pi data?><a><!--note--><![CDATA[x < y]]></a>"),
            "<?pi data?><a><!--note--><![CDATA[x < y]]></a>"
        );
    }
}
