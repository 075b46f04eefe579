//! Operation subscribers see committed work only

use crate::common::*;
use foliodb::prelude::*;
use parking_lot::Mutex;
use std::sync::Arc;

fn collect(doc: &Folio) -> (SubscriptionId, Arc<Mutex<Vec<Operation>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let id = doc.on_operation(move |op| sink.lock().push(op.clone()));
    (id, seen)
}

#[test]
fn commit_delivers_operations() {
    let doc = hello_doc();
    let (_, seen) = collect(&doc);

    doc.transaction("editor", |txn| {
        txn.update_node("p1", NodePatch::new().text("Hello World"))
    })
    .unwrap();

    let seen = seen.lock();
    assert_eq!(seen.len(), 1);
    match &seen[0] {
        Operation::Update { node_id, patch } => {
            assert_eq!(node_id.as_str(), "p1");
            assert!(!patch.is_structural_only());
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn rollback_delivers_nothing() {
    let doc = hello_doc();
    let (_, seen) = collect(&doc);

    let _ = doc.transaction("editor", |txn| {
        txn.update_node("p1", NodePatch::new().text("lost"))?;
        txn.delete_node("root")
    });

    assert!(seen.lock().is_empty());
}

#[test]
fn every_subscriber_sees_every_operation() {
    let doc = hello_doc();
    let (_, first) = collect(&doc);
    let (_, second) = collect(&doc);

    doc.transaction("editor", |txn| {
        txn.insert_node("root", 1, NodeDraft::leaf("image").with_id("img"))
    })
    .unwrap();

    assert_eq!(first.lock().len(), 2);
    assert_eq!(*first.lock(), *second.lock());
}

#[test]
fn unsubscribe_stops_delivery() {
    let doc = hello_doc();
    let (id, seen) = collect(&doc);

    assert!(doc.unsubscribe(id));
    assert!(!doc.unsubscribe(id));

    doc.transaction("editor", |txn| txn.delete_node("p1")).unwrap();
    assert!(seen.lock().is_empty());
}

#[test]
fn delete_carries_removed_value() {
    let doc = hello_doc();
    let (_, seen) = collect(&doc);

    doc.transaction("editor", |txn| txn.delete_node("p1")).unwrap();

    let deleted: Vec<_> = seen
        .lock()
        .iter()
        .filter_map(|op| match op {
            Operation::Delete { node, .. } => node.text.clone(),
            _ => None,
        })
        .collect();
    assert_eq!(deleted, vec!["Hello".to_string()]);
}
