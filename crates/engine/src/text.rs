//! Text range edits
//!
//! Offsets are char offsets into a node's text. Every edit is turned into a
//! single [`NodePatch`] (text and/or marks) and sent through the update
//! path, so it is copy-on-write, validated, and logged like any update.
//!
//! Mark adjustment on edits:
//!
//! | Edit | Mark before edit | Mark after edit |
//! |------|------------------|-----------------|
//! | insert at `o` | starts at or after `o` | shifted right |
//! | insert at `o` | spans `o` | extended |
//! | delete `s..e` | after `e` | shifted left |
//! | delete `s..e` | overlaps | clipped, dropped if empty |

use crate::store::DocumentStore;
use folio_core::{Error, Mark, Node, NodeId, NodePatch, Result};

fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map_or(text.len(), |(i, _)| i)
}

fn check_range(node: &Node, start: usize, end: usize) -> Result<()> {
    let len = node.text_len();
    if start > end || end > len {
        return Err(Error::InvalidRange {
            node_id: node.id.clone(),
            start,
            end,
            len,
        });
    }
    Ok(())
}

/// Shift marks for `n` chars inserted at `offset`
fn marks_after_insert(marks: &[Mark], offset: usize, n: usize) -> Vec<Mark> {
    marks
        .iter()
        .cloned()
        .map(|mut m| {
            if m.start >= offset {
                m.start += n;
                m.end += n;
            } else if m.end > offset {
                m.end += n;
            }
            m
        })
        .collect()
}

/// Clip and shift marks for chars `start..end` removed
fn marks_after_delete(marks: &[Mark], start: usize, end: usize) -> Vec<Mark> {
    let removed = end - start;
    let adjust = |p: usize| {
        if p <= start {
            p
        } else if p >= end {
            p - removed
        } else {
            start
        }
    };
    marks
        .iter()
        .filter_map(|m| {
            let mut m = m.clone();
            m.start = adjust(m.start);
            m.end = adjust(m.end);
            (m.end > m.start).then_some(m)
        })
        .collect()
}

/// Remove `start..end` from every mark of `mark_type`, splitting as needed
fn marks_without(marks: &[Mark], mark_type: &str, start: usize, end: usize) -> Vec<Mark> {
    let mut out = Vec::with_capacity(marks.len());
    for m in marks {
        if m.mark_type != mark_type || !m.overlaps(start, end) {
            out.push(m.clone());
            continue;
        }
        if m.start < start {
            let mut left = m.clone();
            left.end = start;
            out.push(left);
        }
        if m.end > end {
            let mut right = m.clone();
            right.start = end;
            out.push(right);
        }
    }
    out
}

impl DocumentStore {
    fn text_target(&self, id: &str) -> Result<(NodeId, Node)> {
        let id = self.resolve(id);
        let node = self.require(&id)?.clone();
        Ok((id, node))
    }

    /// Insert `text` at char `offset`
    pub fn insert_text(&mut self, id: &str, offset: usize, text: &str) -> Result<()> {
        let (id, text) = (id.to_string(), text.to_string());
        self.autocommit(move |store| {
            let (id, node) = store.text_target(&id)?;
            check_range(&node, offset, offset)?;
            if text.is_empty() {
                return Ok(());
            }

            let mut updated = node.text.clone().unwrap_or_default();
            updated.insert_str(byte_offset(&updated, offset), &text);
            let mut patch = NodePatch::new().text(updated);
            if !node.marks.is_empty() {
                patch = patch.marks(marks_after_insert(&node.marks, offset, text.chars().count()));
            }
            store.update_in_txn(&id, patch).map(|_| ())
        })
    }

    /// Delete chars `start..end`
    pub fn delete_text(&mut self, id: &str, start: usize, end: usize) -> Result<()> {
        let id = id.to_string();
        self.autocommit(move |store| {
            let (id, node) = store.text_target(&id)?;
            check_range(&node, start, end)?;
            if start == end {
                return Ok(());
            }

            let mut updated = node.text.clone().unwrap_or_default();
            let (from, to) = (byte_offset(&updated, start), byte_offset(&updated, end));
            updated.replace_range(from..to, "");
            let mut patch = NodePatch::new().text(updated);
            if !node.marks.is_empty() {
                patch = patch.marks(marks_after_delete(&node.marks, start, end));
            }
            store.update_in_txn(&id, patch).map(|_| ())
        })
    }

    /// Add a mark; an identical mark already present makes this a no-op
    pub fn add_mark(&mut self, id: &str, mark: Mark) -> Result<()> {
        let id = id.to_string();
        self.autocommit(move |store| {
            let (id, node) = store.text_target(&id)?;
            check_range(&node, mark.start, mark.end)?;
            if node.marks.contains(&mark) {
                return Ok(());
            }
            let mut marks = node.marks;
            marks.push(mark);
            store
                .update_in_txn(&id, NodePatch::new().marks(marks))
                .map(|_| ())
        })
    }

    /// Remove `mark_type` from chars `start..end`
    ///
    /// Marks extending past the range are split; the parts outside it stay.
    pub fn remove_mark(&mut self, id: &str, mark_type: &str, start: usize, end: usize) -> Result<()> {
        let (id, mark_type) = (id.to_string(), mark_type.to_string());
        self.autocommit(move |store| {
            let (id, node) = store.text_target(&id)?;
            check_range(&node, start, end)?;
            let marks = marks_without(&node.marks, &mark_type, start, end);
            store
                .update_in_txn(&id, NodePatch::new().marks(marks))
                .map(|_| ())
        })
    }
}
