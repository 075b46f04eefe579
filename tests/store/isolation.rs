//! Copy-on-write overlay isolation

use crate::common::*;
use foliodb::prelude::*;

#[test]
fn committed_reads_ignore_open_transaction() {
    let doc = hello_doc();
    let db = doc.database();

    let lock_id = db.acquire("editor").unwrap();
    {
        let mut store = db.store();
        store.begin().unwrap();
        store.update_node("p1", NodePatch::new().text("pending")).unwrap();
        assert_eq!(store.get_node("p1").unwrap().text.as_deref(), Some("pending"));
    }

    assert_eq!(text_of(&doc, "p1").as_deref(), Some("Hello"));

    db.store().commit().unwrap();
    db.release(lock_id).unwrap();
    assert_eq!(text_of(&doc, "p1").as_deref(), Some("pending"));
}

#[test]
fn base_untouched_until_commit() {
    let doc = outline_doc();

    doc.transaction("editor", |txn| {
        txn.update_node("i1", NodePatch::new().text("uno"))?;
        txn.delete_node("i2")?;
        txn.insert_node("list", 0, NodeDraft::text("item", "zero").with_id("i0"))?;

        let base = txn.base();
        assert_eq!(base.get("i1").unwrap().text.as_deref(), Some("one"));
        assert!(base.get("i2").is_some());
        assert!(base.get("i0").is_none());
        assert_eq!(base.get("list").unwrap().child_ids().len(), 2);

        assert!(txn.get_node("i2").is_none());
        assert!(txn.overlay().is_deleted("i2"));
        assert_eq!(txn.get_node("i0").unwrap().text.as_deref(), Some("zero"));
        Ok(())
    })
    .unwrap();

    assert_eq!(children_of(&doc, "list"), vec!["i0", "i1"]);
}

#[test]
fn only_touched_nodes_are_copied() {
    let doc = outline_doc();

    doc.transaction("editor", |txn| {
        txn.update_node("i1", NodePatch::new().text("a"))?;
        txn.update_node("i1", NodePatch::new().text("b"))?;
        txn.update_node("i1", NodePatch::new().attr("checked", true))?;

        assert_eq!(txn.overlay().present_len(), 1);
        assert!(txn.overlay().is_present("i1"));
        assert!(!txn.overlay().is_present("list"));
        assert!(!txn.overlay().is_present("root"));
        Ok(())
    })
    .unwrap();
}

#[test]
fn identical_update_records_nothing() {
    let doc = hello_doc();

    doc.transaction("editor", |txn| {
        let changed = txn.update_node("p1", NodePatch::new().text("Hello"))?;
        assert!(!changed);
        assert!(txn.end()?.is_empty());
        assert_eq!(txn.overlay().present_len(), 0);
        Ok(())
    })
    .unwrap();
}

#[test]
fn update_after_delete_in_same_transaction_fails() {
    let doc = hello_doc();

    let err = doc
        .transaction("editor", |txn| {
            txn.delete_node("p1")?;
            txn.update_node("p1", NodePatch::new().text("zombie"))
        })
        .unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(text_of(&doc, "p1").as_deref(), Some("Hello"));
}

#[test]
fn end_does_not_mutate() {
    let doc = hello_doc();

    doc.transaction("editor", |txn| {
        txn.update_node("p1", NodePatch::new().text("x"))?;
        let first = txn.end()?;
        let second = txn.end()?;
        assert_eq!(first, second);
        assert!(txn.in_transaction());
        assert_eq!(txn.base().get("p1").unwrap().text.as_deref(), Some("Hello"));
        Ok(())
    })
    .unwrap();
}
