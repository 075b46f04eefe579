//! Commit replay order and the resulting structure

use crate::common::*;
use foliodb::prelude::*;
use parking_lot::Mutex;
use std::sync::Arc;

fn record_kinds(doc: &Folio) -> Arc<Mutex<Vec<(OperationKind, String)>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    doc.on_operation(move |op| {
        sink.lock().push((op.kind(), op.node_id().to_string()));
    });
    seen
}

#[test]
fn operations_replay_grouped_by_kind() {
    let doc = outline_doc();
    let seen = record_kinds(&doc);

    doc.transaction("editor", |txn| {
        txn.delete_node("p1")?;
        txn.move_node("i2", "root", 0)?;
        txn.update_node("i1", NodePatch::new().text("uno"))?;
        txn.insert_node("list", 0, NodeDraft::text("item", "zero").with_id("i0"))?;
        Ok(())
    })
    .unwrap();

    let seen = seen.lock();
    let kinds: Vec<_> = seen.iter().map(|(k, _)| *k).collect();
    let mut sorted = kinds.clone();
    sorted.sort();
    assert_eq!(kinds, sorted);
    assert_eq!(seen.first().unwrap(), &(OperationKind::Create, "i0".to_string()));
    assert_eq!(seen.last().unwrap(), &(OperationKind::Delete, "p1".to_string()));
    assert!(seen.contains(&(OperationKind::Move, "i2".to_string())));
}

#[test]
fn committed_structure_matches_transaction_view() {
    let doc = outline_doc();

    doc.transaction("editor", |txn| {
        txn.delete_node("p1")?;
        txn.move_node("i2", "root", 0)?;
        txn.update_node("i1", NodePatch::new().text("uno"))?;
        txn.insert_node("list", 0, NodeDraft::text("item", "zero").with_id("i0"))?;
        Ok(())
    })
    .unwrap();

    assert!(doc.get_node("p1").is_none());
    assert_eq!(children_of(&doc, "root"), vec!["i2", "list"]);
    assert_eq!(children_of(&doc, "list"), vec!["i0", "i1"]);
    assert_eq!(
        doc.get_node("i2").unwrap().parent_id.as_ref().map(|p| p.as_str()),
        Some("root")
    );
    assert_eq!(text_of(&doc, "i1").as_deref(), Some("uno"));
}

#[test]
fn create_then_delete_in_one_transaction_leaves_nothing() {
    let doc = hello_doc();

    doc.transaction("editor", |txn| {
        let id = txn.insert_node("root", 1, NodeDraft::leaf("image"))?;
        txn.delete_node(id.as_str())?;
        Ok(())
    })
    .unwrap();

    assert_eq!(children_of(&doc, "root"), vec!["p1"]);
    assert_eq!(doc.export_snapshot().unwrap().len(), 2);
}

#[test]
fn move_then_delete_removes_node() {
    let doc = outline_doc();

    doc.transaction("editor", |txn| {
        txn.move_node("i1", "root", 0)?;
        txn.delete_node("i1")?;
        Ok(())
    })
    .unwrap();

    assert!(doc.get_node("i1").is_none());
    assert_eq!(children_of(&doc, "root"), vec!["p1", "list"]);
    assert_eq!(children_of(&doc, "list"), vec!["i2"]);
}

#[test]
fn reorder_within_parent() {
    let doc = outline_doc();

    doc.transaction("editor", |txn| txn.move_node("i1", "list", 5)).unwrap();
    assert_eq!(children_of(&doc, "list"), vec!["i2", "i1"]);

    // Moving to where it already is records nothing
    doc.transaction("editor", |txn| {
        txn.move_node("i1", "list", 1)?;
        assert!(txn.end()?.is_empty());
        Ok(())
    })
    .unwrap();
}

#[test]
fn root_change_applies_at_commit() {
    let doc = outline_doc();

    doc.transaction("editor", |txn| {
        txn.set_root_id("list")?;
        assert_eq!(txn.root_id().as_str(), "list");
        Ok(())
    })
    .unwrap();

    assert_eq!(doc.root_id().as_str(), "list");
}

#[test]
fn root_change_discarded_on_rollback() {
    let doc = outline_doc();

    let _ = doc.transaction("editor", |txn| {
        txn.set_root_id("list")?;
        Err::<(), _>(Error::NodeNotFound("abort".into()))
    });

    assert_eq!(doc.root_id().as_str(), "root");
}
