//! The top-level diff and patch entry points.
//!
//! Diffing follows the fast match / edit script pattern: pair up
//! equivalent nodes between the two documents, then walk the modified
//! document generating the operations that turn the original into it.

use std::path::Path;

use crate::diff::operation::EditScript;
use crate::diff::{edit_script, patch as patcher};
use crate::error::Result;
use crate::matching::match_trees;
use crate::node::{children_of, detach, normalize, NodeContent, NodeRef};
use crate::options::DiffOptions;
use crate::xml::parse_file;

/// Computes the edit script turning `doc1` into `doc2`.
///
/// Both documents are normalized first, and doctype declarations are
/// dropped from both since the delta format cannot express them.
/// `doc1` is used as the working copy and is mutated into an
/// equivalent of `doc2`; parse it afresh before applying the returned
/// script to it.
pub fn diff(doc1: &NodeRef, doc2: &NodeRef, options: &DiffOptions) -> Result<EditScript> {
    for doc in [doc1, doc2] {
        normalize(doc);
        excise_doctypes(doc);
    }
    let mut pairs = match_trees(doc1, doc2, options);
    edit_script::build_edit_script(doc1, doc2, &mut pairs, options)
}

fn excise_doctypes(doc: &NodeRef) {
    for child in children_of(doc) {
        if matches!(*child.borrow().content(), NodeContent::DocType(_)) {
            detach(&child);
        }
    }
}

/// Diffs two documents loaded from files.
pub fn diff_files<P: AsRef<Path>>(
    path1: P,
    path2: P,
    options: &DiffOptions,
) -> Result<EditScript> {
    let doc1 = parse_file(path1)?;
    let doc2 = parse_file(path2)?;
    diff(&doc1, &doc2, options)
}

/// Applies an edit script to a document, in place.
pub fn patch(doc: &NodeRef, script: &EditScript) -> Result<()> {
    patcher::apply(doc, script)
}

/// Applies an edit script loaded from a file to a document loaded
/// from a file, returning the patched document.
pub fn patch_files<P: AsRef<Path>>(doc_path: P, delta_path: P) -> Result<NodeRef> {
    let doc = parse_file(doc_path)?;
    let delta = std::fs::read_to_string(delta_path)?;
    let script = EditScript::from_xml(&delta)?;
    patch(&doc, &script)?;
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::{document_to_string, parse_str};

    fn diff_then_patch(xml1: &str, xml2: &str) -> String {
        let working = parse_str(xml1).unwrap();
        let target = parse_str(xml2).unwrap();
        let script = diff(&working, &target, &DiffOptions::default()).unwrap();

        // The working copy was consumed; apply to a fresh parse.
        let doc = parse_str(xml1).unwrap();
        patch(&doc, &script).unwrap();
        normalize(&doc);
        document_to_string(&doc)
    }

    #[test]
    fn test_identical_documents_empty_script() {
        let doc1 = parse_str("<a><b>x</b></a>").unwrap();
        let doc2 = parse_str("<a><b>x</b></a>").unwrap();
        let script = diff(&doc1, &doc2, &DiffOptions::default()).unwrap();
        assert!(script.is_empty());
    }

    #[test]
    fn test_self_diff_with_ignored_comments_is_empty() {
        let mut options = DiffOptions::default();
        options.ignore_comments = true;
        let doc1 = parse_str("<a><!--same--><b/></a>").unwrap();
        let doc2 = parse_str("<a><!--same--><b/></a>").unwrap();
        let script = diff(&doc1, &doc2, &options).unwrap();
        assert!(script.is_empty(), "unexpected ops: {:?}", script.ops);
    }

    #[test]
    fn test_self_diff_with_repeated_names_is_empty() {
        let doc1 = parse_str("<a><b><m/><n/><y/></b><y/></a>").unwrap();
        let doc2 = parse_str("<a><b><m/><n/><y/></b><y/></a>").unwrap();
        let script = diff(&doc1, &doc2, &DiffOptions::default()).unwrap();
        assert!(script.is_empty(), "unexpected ops: {:?}", script.ops);
    }

    #[test]
    fn test_case_knob_does_not_match_comments() {
        let mut options = DiffOptions::default();
        options.ignore_case = true;
        let doc1 = parse_str("<a><!--ABC--></a>").unwrap();
        let doc2 = parse_str("<a><!--abc--></a>").unwrap();
        let script = diff(&doc1, &doc2, &options).unwrap();
        assert!(!script.is_empty());
    }

    #[test]
    fn test_diff_patch_insert() {
        assert_eq!(diff_then_patch("<a><b/></a>", "<a><b/><c/></a>"), "<a><b/><c/></a>");
    }

    #[test]
    fn test_diff_patch_delete() {
        assert_eq!(diff_then_patch("<a><b/><c/></a>", "<a><c/></a>"), "<a><c/></a>");
    }

    #[test]
    fn test_diff_patch_reorder() {
        assert_eq!(
            diff_then_patch("<a><b/><c/><d/></a>", "<a><d/><b/><c/></a>"),
            "<a><d/><b/><c/></a>"
        );
    }

    #[test]
    fn test_diff_patch_text_change() {
        assert_eq!(
            diff_then_patch("<a>old text</a>", "<a>new text</a>"),
            "<a>new text</a>"
        );
    }

    #[test]
    fn test_diff_patch_move_across_parents() {
        assert_eq!(
            diff_then_patch("<a><b><x/></b><c/></a>", "<a><b/><c><x/></c></a>"),
            "<a><b/><c><x/></c></a>"
        );
    }

    #[test]
    fn test_diff_patch_attribute_change() {
        assert_eq!(
            diff_then_patch(r#"<a x="1"/>"#, r#"<a x="2" y="3"/>"#),
            r#"<a x="2" y="3"/>"#
        );
    }

    #[test]
    fn test_diff_patch_root_rename() {
        assert_eq!(diff_then_patch("<a><b/></a>", "<z><b/></z>"), "<z><b/></z>");
    }

    #[test]
    fn test_diff_mutates_working_copy() {
        let working = parse_str("<a/>").unwrap();
        let target = parse_str("<a><b/></a>").unwrap();
        diff(&working, &target, &DiffOptions::default()).unwrap();
        assert_eq!(document_to_string(&working), "<a><b/></a>");
    }
}
