//! Transaction-scoped aliases

use crate::common::*;
use foliodb::prelude::*;

#[test]
fn alias_round_trip() {
    let doc = hello_doc();

    let id = doc
        .transaction("editor", |txn| {
            let id = txn.create_node(NodeDraft::leaf("image"))?;
            txn.set_alias("new", id.as_str())?;
            assert_eq!(txn.resolve_alias("new"), id);
            Ok(id)
        })
        .unwrap();

    assert!(doc.get_node(id.as_str()).is_some());
    assert_eq!(doc.database().store().resolve_alias("new").as_str(), "new");
}

#[test]
fn aliases_work_as_edit_targets() {
    let doc = hello_doc();

    doc.transaction("editor", |txn| {
        let list = txn.insert_node("root", 1, NodeDraft::element("list"))?;
        txn.set_alias("todo", list.as_str())?;
        txn.insert_node("todo", 0, NodeDraft::text("item", "write tests"))?;
        txn.set_alias("intro", "p1")?;
        txn.insert_text("intro", 5, "!")?;
        Ok(())
    })
    .unwrap();

    let root = doc.get_node("root").unwrap();
    let list = doc.get_node(root.child_ids()[1].as_str()).unwrap();
    assert_eq!(list.child_ids().len(), 1);
    assert_eq!(text_of(&doc, "p1").as_deref(), Some("Hello!"));
}

#[test]
fn rebinding_alias_to_another_node_fails() {
    let doc = hello_doc();

    doc.transaction("editor", |txn| {
        txn.set_alias("x", "p1")?;
        txn.set_alias("x", "p1")?;
        let err = txn.set_alias("x", "root").unwrap_err();
        assert!(matches!(err, Error::DuplicateAlias { .. }));
        assert!(err.is_caller_bug());
        assert_eq!(txn.delete_alias("x").map(|id| id.to_string()).as_deref(), Some("p1"));
        txn.set_alias("x", "root")?;
        Ok(())
    })
    .unwrap();
}

#[test]
fn alias_requires_open_transaction() {
    let mut store = DocumentStore::new();
    let err = store.set_alias("a", "root").unwrap_err();
    assert!(matches!(err, Error::TransactionState { .. }));
}

#[test]
fn unknown_alias_falls_through() {
    let store = DocumentStore::new();
    assert_eq!(store.resolve_alias("root").as_str(), "root");
    assert_eq!(store.resolve_alias("nothing").as_str(), "nothing");
}
