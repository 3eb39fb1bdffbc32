//! Tree-aware XML diff and patch.
//!
//! Compares two XML documents as node trees and produces an edit
//! script in the DUL (Delta Update Language) format: an XML document
//! of insert, delete, move and update operations that transforms the
//! first document into the second. The script can be serialized,
//! parsed back, and applied to a fresh copy of the original.
//!
//! # Example
//!
//! ```
//! use xml_dul::options::DiffOptions;
//! use xml_dul::xml::parse_str;
//! use xml_dul::{diff, patch};
//!
//! # fn main() -> xml_dul::Result<()> {
//! let original = parse_str("<doc><a/></doc>")?;
//! let modified = parse_str("<doc><a/><b/></doc>")?;
//! let script = diff(&original, &modified, &DiffOptions::default())?;
//! assert!(!script.is_empty());
//!
//! // Diffing consumes the first document as a working copy, so
//! // apply the script to a fresh parse.
//! let target = parse_str("<doc><a/></doc>")?;
//! patch(&target, &script)?;
//! # Ok(())
//! # }
//! ```

pub mod diff;
pub mod error;
pub mod fmes;
pub mod matching;
pub mod node;
pub mod options;
pub mod xml;

pub use diff::operation::{EditScript, Operation};
pub use error::{Error, Result};
pub use fmes::{diff, patch};
pub use node::NodeRef;
pub use options::DiffOptions;
