//! Edit script generation.
//!
//! Walks the modified document breadth first, repairing the working
//! copy of the original as it goes. Unmatched nodes become inserts,
//! matched nodes under the wrong parent become moves, and a child
//! alignment pass based on the longest common subsequence of matched
//! children fixes ordering within a parent. A final post-order sweep
//! deletes whatever is left unmatched in the original.
//!
//! Operations are recorded against the working document *before* it
//! is mutated, so each operation's locators are valid at the moment
//! it would be applied.

use std::collections::VecDeque;

use rustc_hash::FxHashSet;

use crate::diff::annotations::Annotations;
use crate::diff::child_number::ChildNumber;
use crate::diff::find_position::{find_position, InsertPosition};
use crate::diff::locator::xpath_of;
use crate::diff::operation::{EditScript, NodeTypeCode, Operation};
use crate::error::{Error, Result};
use crate::matching::{compare_nodes, is_banned, NodePairs};
use crate::node::{
    children_of, detach, document_element, id_of, is_text, parent_of, same_node, shallow_copy,
    text_length, Attribute, NodeContent, NodeInner, NodeRef,
};
use crate::options::DiffOptions;

/// Generates the edit script turning `doc1` into `doc2`.
///
/// `doc1` is used as the working document and is mutated into a copy
/// of `doc2` in the process.
pub fn build_edit_script(
    doc1: &NodeRef,
    doc2: &NodeRef,
    pairs: &mut NodePairs,
    options: &DiffOptions,
) -> Result<EditScript> {
    let mut builder = EditScriptBuilder {
        pairs,
        options,
        order: Annotations::new(),
        ops: Vec::new(),
    };
    builder.run(doc1, doc2)?;

    Ok(EditScript {
        ops: builder.ops,
        context: options.context.then_some((
            options.sibling_context,
            options.parent_context,
            options.parent_sibling_context,
        )),
        reverse_patch: options.reverse_patch,
        resolve_entities: options.resolve_entities,
    })
}

struct EditScriptBuilder<'a> {
    pairs: &'a mut NodePairs,
    options: &'a DiffOptions,
    order: Annotations,
    ops: Vec<Operation>,
}

impl<'a> EditScriptBuilder<'a> {
    fn run(&mut self, doc1: &NodeRef, doc2: &NodeRef) -> Result<()> {
        let mut fifo = VecDeque::new();
        self.enqueue_children(&mut fifo, doc2);
        self.align_children(doc1, doc2);
        let doc2_root = document_element(doc2);

        while let Some(x) = fifo.pop_front() {
            self.enqueue_children(&mut fifo, &x);
            let y = parent_of(&x)
                .ok_or_else(|| Error::Diff("traversal reached a detached node".to_string()))?;
            let z = self
                .pairs
                .partner(&y)
                .ok_or_else(|| Error::Diff("parent has no partner during traversal".to_string()))?;

            let w = match self.pairs.partner(&x) {
                None => self.do_insert(&x, &z)?,
                Some(w) => {
                    let is_doc2_root =
                        doc2_root.as_ref().map(|r| same_node(r, &x)).unwrap_or(false);
                    if is_doc2_root && !compare_nodes(&w, &x, self.options) {
                        self.do_update(&w, &x)?
                    } else {
                        let w_parent = parent_of(&w).ok_or_else(|| {
                            Error::Diff("matched node is detached".to_string())
                        })?;
                        if !same_node(&z, &w_parent) {
                            self.do_move(&w, &x, &z);
                        }
                        w
                    }
                }
            };
            self.align_children(&w, &x);
        }

        self.delete_phase(doc1);
        Ok(())
    }

    fn enqueue_children(&self, fifo: &mut VecDeque<NodeRef>, node: &NodeRef) {
        for child in children_of(node) {
            if !is_banned(&child, self.options) {
                fifo.push_back(child);
            }
        }
    }

    /// Inserts a copy of `x` under `z`, the partner of `x`'s parent.
    fn do_insert(&mut self, x: &NodeRef, z: &NodeRef) -> Result<NodeRef> {
        if matches!(*x.borrow().content(), NodeContent::DocType(_)) {
            return Err(Error::Diff(
                "doctype declarations cannot be inserted".to_string(),
            ));
        }

        let pos = find_position(x, self.pairs, &self.order);
        let w = shallow_copy(x);

        // Inserted nodes are not revisited, so mark them settled now.
        self.order.set_in_order(&w);
        self.order.set_in_order(x);

        self.record_insert(&w, &xpath_of(z), pos.xpath, pos.charpos)?;
        insert_as_child(z, pos.dom, w.clone());
        self.pairs.add(&w, x);
        Ok(w)
    }

    /// Rewrites `w` to have `x`'s name and attributes, keeping `w`'s
    /// children. Only used for the document element, which can never
    /// be inserted or deleted.
    fn do_update(&mut self, w: &NodeRef, x: &NodeRef) -> Result<NodeRef> {
        let w_data = match w.borrow().content() {
            NodeContent::Element(data) => data.clone(),
            other => {
                return Err(Error::Diff(format!(
                    "cannot update a {} node",
                    other.kind_name()
                )))
            }
        };
        let x_data = match x.borrow().content() {
            NodeContent::Element(data) => data.clone(),
            other => {
                return Err(Error::Diff(format!(
                    "cannot update to a {} node",
                    other.kind_name()
                )))
            }
        };
        let w_path = xpath_of(w);

        // Attribute changes first: drop, change, then add.
        for attr in &w_data.attributes {
            match x_data.attribute_ns(attr.namespace.as_deref(), &attr.local_name) {
                None => self.ops.push(Operation::Delete {
                    node: format!("{w_path}/@{}", attr.qname),
                    charpos: None,
                    length: None,
                }),
                Some(x_attr) if x_attr.value != attr.value => {
                    self.ops.push(Operation::Update {
                        node: format!("{w_path}/@{}", attr.qname),
                        value: x_attr.value.clone(),
                    })
                }
                Some(_) => {}
            }
        }
        for attr in &x_data.attributes {
            if w_data
                .attribute_ns(attr.namespace.as_deref(), &attr.local_name)
                .is_none()
            {
                self.record_attr_insert(&w_path, attr);
            }
        }

        self.ops.push(Operation::Update {
            node: w_path,
            value: x_data.qname.clone(),
        });

        // Renaming in place is not possible, so rebuild the node and
        // adopt its children. Namespace declarations stay with the
        // document being patched.
        let mut new_data = x_data;
        new_data.namespace_decls = w_data.namespace_decls;
        let new_w = NodeInner::new(NodeContent::Element(new_data));
        for child in children_of(w) {
            NodeInner::add_child_to_ref(&new_w, child);
        }
        let parent = parent_of(w)
            .ok_or_else(|| Error::Diff("cannot update a detached node".to_string()))?;
        NodeInner::replace_child_of_ref(&parent, w, new_w.clone());
        self.pairs.remove(w);
        self.pairs.add(&new_w, x);
        Ok(new_w)
    }

    /// Moves `w` under `z` to mirror `x`'s position.
    fn do_move(&mut self, w: &NodeRef, x: &NodeRef, z: &NodeRef) {
        let pos = find_position(x, self.pairs, &self.order);
        self.order.set_in_order(w);
        self.order.set_in_order(x);
        self.record_move(w, z, pos);
        insert_as_child(z, pos.dom, w.clone());
    }

    /// Repairs the relative order of the matched children of `w` and
    /// `x` with move operations.
    fn align_children(&mut self, w: &NodeRef, x: &NodeRef) {
        for child in children_of(w).iter().chain(children_of(x).iter()) {
            self.order.set_out_of_order(child);
        }

        let w_kids = children_of(w);
        let x_kids = children_of(x);
        let w_seq = self.sequence(&w_kids, &x_kids);
        let x_seq = self.sequence(&x_kids, &w_kids);
        let lcs = self.lcs(&w_seq, &x_seq);

        let mut stay = FxHashSet::default();
        for a in &lcs {
            stay.insert(id_of(a));
            self.order.set_in_order(a);
            if let Some(b) = self.pairs.partner(a) {
                self.order.set_in_order(&b);
            }
        }

        for a in &w_seq {
            if stay.contains(&id_of(a)) {
                continue;
            }
            let Some(b) = self.pairs.partner(a) else {
                continue;
            };
            let pos = find_position(&b, self.pairs, &self.order);
            self.record_move(a, w, pos);
            insert_as_child(w, pos.dom, a.clone());
            self.order.set_in_order(a);
            self.order.set_in_order(&b);
        }

        for child in children_of(w).iter().chain(children_of(x).iter()) {
            self.order.set_in_order(child);
        }
    }

    /// The children of `set1` whose partners are children in `set2`.
    fn sequence(&self, set1: &[NodeRef], set2: &[NodeRef]) -> Vec<NodeRef> {
        let ids: FxHashSet<u64> = set2.iter().map(id_of).collect();
        set1.iter()
            .filter(|n| {
                self.pairs
                    .partner(n)
                    .map(|p| ids.contains(&id_of(&p)))
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    }

    /// Longest common subsequence of two child sequences, where a
    /// node equals its partner. Returns nodes from `s1`.
    fn lcs(&self, s1: &[NodeRef], s2: &[NodeRef]) -> Vec<NodeRef> {
        let equals = |a: &NodeRef, b: &NodeRef| {
            self.pairs
                .partner(a)
                .map(|p| same_node(&p, b))
                .unwrap_or(false)
        };

        let mut table = vec![vec![0usize; s2.len() + 1]; s1.len() + 1];
        for i in 1..=s1.len() {
            for j in 1..=s2.len() {
                table[i][j] = if equals(&s1[i - 1], &s2[j - 1]) {
                    table[i - 1][j - 1] + 1
                } else {
                    table[i - 1][j].max(table[i][j - 1])
                };
            }
        }

        let mut result = Vec::new();
        let (mut i, mut j) = (s1.len(), s2.len());
        while i != 0 && j != 0 {
            if equals(&s1[i - 1], &s2[j - 1]) {
                result.push(s1[i - 1].clone());
                i -= 1;
                j -= 1;
            } else if table[i][j - 1] >= table[i - 1][j] {
                j -= 1;
            } else {
                i -= 1;
            }
        }
        result.reverse();
        result
    }

    /// Deletes unmatched nodes of the working document, children
    /// before parents.
    fn delete_phase(&mut self, node: &NodeRef) {
        for child in children_of(node).iter().rev() {
            self.delete_phase(child);
        }

        let is_doctype = matches!(*node.borrow().content(), NodeContent::DocType(_));
        if !self.pairs.is_matched(node) && !is_doctype && parent_of(node).is_some() {
            self.record_delete(node);
            detach(node);
        }
    }

    fn record_insert(
        &mut self,
        node: &NodeRef,
        parent_path: &str,
        childno: usize,
        charpos: usize,
    ) -> Result<()> {
        let content = node.borrow().content().clone();
        let node_type = NodeTypeCode::of(&content).ok_or_else(|| {
            Error::Diff(format!("cannot insert a {} node", content.kind_name()))
        })?;

        let (name, namespace, value) = match &content {
            NodeContent::Element(data) => match &data.namespace {
                Some(ns) => (Some(data.local_name.clone()), Some(ns.clone()), None),
                None => (Some(data.qname.clone()), None, None),
            },
            NodeContent::Text(t) | NodeContent::Cdata(t) | NodeContent::Comment(t) => {
                (None, None, Some(t.clone()))
            }
            NodeContent::ProcessingInstruction { target, data } => {
                (Some(target.clone()), None, Some(data.clone()))
            }
            NodeContent::Document | NodeContent::DocType(_) => (None, None, None),
        };

        self.ops.push(Operation::Insert {
            parent: parent_path.to_string(),
            node_type,
            childno: Some(childno),
            name,
            namespace,
            charpos: (charpos > 1).then_some(charpos),
            value,
        });

        // An element's attributes follow as separate inserts,
        // addressed through the position it was just given.
        if let NodeContent::Element(data) = &content {
            let owner_path = format!("{parent_path}/node()[{childno}]");
            for attr in &data.attributes {
                self.record_attr_insert(&owner_path, attr);
            }
        }
        Ok(())
    }

    fn record_attr_insert(&mut self, owner_path: &str, attr: &Attribute) {
        let (name, namespace) = match &attr.namespace {
            Some(ns) => (attr.local_name.clone(), Some(ns.clone())),
            None => (attr.qname.clone(), None),
        };
        self.ops.push(Operation::Insert {
            parent: owner_path.to_string(),
            node_type: NodeTypeCode::Attribute,
            childno: None,
            name: Some(name),
            namespace,
            charpos: None,
            value: Some(attr.value.clone()),
        });
    }

    fn record_move(&mut self, node: &NodeRef, parent: &NodeRef, pos: InsertPosition) {
        debug_assert!(pos.charpos >= 1);
        let old_charpos = ChildNumber::new(node).xpath_char_pos();
        self.ops.push(Operation::Move {
            node: xpath_of(node),
            parent: xpath_of(parent),
            childno: pos.xpath,
            old_charpos,
            new_charpos: pos.charpos,
            length: is_text(node).then(|| text_length(node)),
        });
    }

    fn record_delete(&mut self, node: &NodeRef) {
        let (charpos, length) = if is_text(node) {
            (
                Some(ChildNumber::new(node).xpath_char_pos()),
                Some(text_length(node)),
            )
        } else {
            (None, None)
        };
        self.ops.push(Operation::Delete {
            node: xpath_of(node),
            charpos,
            length,
        });
    }
}

/// Attaches `child` under `parent` at `index`, clamping to the end of
/// the child list. Detaches first so the index refers to the list
/// without the child in it.
fn insert_as_child(parent: &NodeRef, index: usize, child: NodeRef) {
    detach(&child);
    let index = index.min(parent.borrow().child_count());
    NodeInner::add_child_at_to_ref(parent, index, child);
}
