//! XML parsing and serialization.

mod parser;
mod printer;

pub use parser::{parse_file, parse_str};
pub use printer::{document_to_string, XmlPrinter};

pub(crate) use printer::{escape_attr, escape_text};
