//! All-or-nothing commit and rollback

use crate::common::*;
use foliodb::prelude::*;

#[test]
fn update_then_commit_is_visible() {
    let doc = hello_doc();

    let ops = doc
        .transaction("editor", |txn| {
            txn.update_node("p1", NodePatch::new().text("Hello World"))?;
            txn.end()
        })
        .unwrap();

    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].kind(), OperationKind::Update);
    assert_eq!(ops[0].node_id().as_str(), "p1");
    assert_eq!(text_of(&doc, "p1").as_deref(), Some("Hello World"));
    assert_eq!(children_of(&doc, "root"), vec!["p1"]);
}

#[test]
fn update_then_rollback_is_discarded() {
    let doc = hello_doc();
    let db = doc.database();

    let lock_id = db.acquire("editor").unwrap();
    {
        let mut store = db.store();
        store.begin().unwrap();
        store.update_node("p1", NodePatch::new().text("Hello World")).unwrap();
        assert_eq!(store.rollback().unwrap(), 1);
    }
    db.release(lock_id).unwrap();

    assert_eq!(text_of(&doc, "p1").as_deref(), Some("Hello"));
}

#[test]
fn failing_closure_rolls_back_earlier_edits() {
    let doc = hello_doc();
    let version = doc.version();

    let err = doc
        .transaction("editor", |txn| {
            txn.update_node("p1", NodePatch::new().text("changed"))?;
            txn.insert_node("root", 1, NodeDraft::leaf("image").with_id("img"))?;
            txn.create_node(NodeDraft::leaf("image").with_id("p1"))
        })
        .unwrap_err();

    assert!(matches!(err, Error::NodeExists(_)));
    assert_eq!(text_of(&doc, "p1").as_deref(), Some("Hello"));
    assert!(doc.get_node("img").is_none());
    assert_eq!(children_of(&doc, "root"), vec!["p1"]);
    assert_eq!(doc.version(), version);
}

#[test]
fn rejected_nested_create_leaves_no_partial_tree() {
    let doc = hello_doc();

    doc.transaction("editor", |txn| {
        let err = txn
            .create_node(
                NodeDraft::element("list")
                    .with_id("list")
                    .with_child(NodeDraft::leaf("image").with_id("ok"))
                    .with_child(NodeDraft::leaf("image").with_id("p1")),
            )
            .unwrap_err();
        assert!(matches!(err, Error::NodeExists(_)));
        assert!(txn.get_node("list").is_none());
        assert!(txn.get_node("ok").is_none());
        assert!(txn.end()?.is_empty());
        Ok(())
    })
    .unwrap();

    assert!(doc.get_node("ok").is_none());
}

#[test]
fn each_commit_bumps_version_once() {
    let doc = hello_doc();
    let before = doc.version();

    doc.transaction("editor", |txn| {
        txn.update_node("p1", NodePatch::new().text("a"))?;
        txn.update_node("p1", NodePatch::new().attr("align", "left"))?;
        txn.insert_node("root", 1, NodeDraft::leaf("rule"))?;
        Ok(())
    })
    .unwrap();

    assert_eq!(doc.version(), before + 1);
}

#[test]
fn writes_outside_a_transaction_commit_immediately() {
    let mut store = DocumentStore::new();
    let before = store.version();

    let id = store
        .insert_node("root", 0, NodeDraft::text("paragraph", "solo"))
        .unwrap();

    assert!(!store.in_transaction());
    assert!(store.overlay().is_empty());
    assert_eq!(store.base().get(id.as_str()).unwrap().text.as_deref(), Some("solo"));
    assert_eq!(store.version(), before + 1);

    // A failed write outside a transaction leaves nothing behind
    assert!(store.delete_node("root").is_err());
    assert_eq!(store.version(), before + 1);
    assert!(!store.in_transaction());
}

#[test]
fn recreating_a_dropped_id_is_rejected() {
    let doc = hello_doc();

    let err = doc
        .transaction("editor", |txn| {
            txn.insert_node("root", 1, NodeDraft::text("paragraph", "a").with_id("x"))?;
            txn.delete_node("x")?;
            txn.insert_node("root", 1, NodeDraft::text("paragraph", "b").with_id("x"))
        })
        .unwrap_err();
    assert!(matches!(err, Error::NodeExists(ref id) if id.as_str() == "x"));
    assert_eq!(children_of(&doc, "root"), vec!["p1"]);

    // Swallowing the error still commits a consistent tree
    doc.transaction("editor", |txn| {
        txn.insert_node("root", 1, NodeDraft::text("paragraph", "a").with_id("x"))?;
        txn.delete_node("x")?;
        let _ = txn.insert_node("root", 1, NodeDraft::text("paragraph", "b").with_id("x"));
        Ok(())
    })
    .unwrap();
    assert!(doc.get_node("x").is_none());
    assert_eq!(children_of(&doc, "root"), vec!["p1"]);
}

#[test]
fn nested_draft_reusing_its_own_id_is_rejected() {
    let doc = hello_doc();
    let version = doc.version();

    let err = doc
        .transaction("editor", |txn| {
            txn.insert_node(
                "root",
                1,
                NodeDraft::element("list")
                    .with_id("x")
                    .with_child(NodeDraft::text("item", "a").with_id("x")),
            )
        })
        .unwrap_err();

    assert!(matches!(err, Error::NodeExists(_)));
    assert!(doc.get_node("x").is_none());
    assert_eq!(children_of(&doc, "root"), vec!["p1"]);
    assert_eq!(doc.version(), version);
}

#[test]
fn panicking_closure_rolls_back_and_frees_the_lock() {
    let doc = hello_doc();
    let version = doc.version();

    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let _ = doc.transaction("editor", |txn| -> Result<()> {
            txn.update_node("p1", NodePatch::new().text("half done"))?;
            panic!("editor crashed");
        });
    }));
    assert!(outcome.is_err());

    assert_eq!(doc.database().store().status(), TransactionStatus::Idle);
    assert_eq!(text_of(&doc, "p1").as_deref(), Some("Hello"));
    assert_eq!(doc.version(), version);
    assert!(!doc.database().lock().is_locked());

    doc.transaction("editor", |txn| {
        txn.update_node("p1", NodePatch::new().text("recovered"))
    })
    .unwrap();
    assert_eq!(text_of(&doc, "p1").as_deref(), Some("recovered"));
}
