//! Schema validation at the write boundary

use crate::common::*;
use foliodb::prelude::*;

fn schema() -> TypeSchema {
    TypeSchema::new()
        .node("doc", NodeRule::element())
        .node("paragraph", NodeRule::text().allow_marks(["bold", "italic"]))
        .node("image", NodeRule::leaf().require("src"))
}

#[test]
fn invalid_create_is_rejected() {
    init_tracing();
    let doc = Folio::builder().validator(schema()).open().unwrap();

    let err = doc
        .transaction("editor", |txn| txn.insert_node("root", 0, NodeDraft::leaf("image")))
        .unwrap_err();
    assert!(err.is_validation());
    assert!(doc.get_node("root").unwrap().child_ids().is_empty());

    doc.transaction("editor", |txn| {
        txn.insert_node("root", 0, NodeDraft::leaf("image").with_attr("src", "a.png"))
    })
    .unwrap();
}

#[test]
fn unknown_type_is_rejected() {
    let doc = Folio::builder().validator(schema()).open().unwrap();
    let err = doc
        .transaction("editor", |txn| txn.create_node(NodeDraft::element("table")))
        .unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));
}

#[test]
fn invalid_update_is_rejected() {
    let doc = Folio::builder().validator(schema()).open().unwrap();
    doc.transaction("editor", |txn| {
        txn.insert_node(
            "root",
            0,
            NodeDraft::leaf("image").with_id("img").with_attr("src", "a.png"),
        )
    })
    .unwrap();

    let err = doc
        .transaction("editor", |txn| {
            txn.update_node("img", NodePatch::new().remove_attr("src"))
        })
        .unwrap_err();
    assert!(err.is_validation());
    assert!(doc.get_node("img").unwrap().attr("src").is_some());
}

#[test]
fn disallowed_mark_is_rejected() {
    let doc = Folio::builder().validator(schema()).open().unwrap();
    doc.transaction("editor", |txn| {
        txn.insert_node("root", 0, NodeDraft::text("paragraph", "Hello").with_id("p1"))
    })
    .unwrap();

    doc.transaction("editor", |txn| txn.add_mark("p1", Mark::new("bold", 0, 5)))
        .unwrap();
    let err = doc
        .transaction("editor", |txn| txn.add_mark("p1", Mark::new("strike", 0, 5)))
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(doc.get_node("p1").unwrap().marks.len(), 1);
}

#[test]
fn relaxed_skips_update_validation() {
    let doc = Folio::builder()
        .validator(schema())
        .relaxed()
        .open()
        .unwrap();
    doc.transaction("editor", |txn| {
        txn.insert_node(
            "root",
            0,
            NodeDraft::leaf("image").with_id("img").with_attr("src", "a.png"),
        )
    })
    .unwrap();

    doc.transaction("editor", |txn| {
        txn.update_node("img", NodePatch::new().remove_attr("src"))
    })
    .unwrap();
    assert!(doc.get_node("img").unwrap().attr("src").is_none());
}

#[test]
fn closure_validator() {
    let doc = Folio::builder()
        .validator(|node: &Node| {
            if node.text.as_deref().map_or(false, |t| t.contains("forbidden")) {
                ValidationOutcome::invalid(["forbidden word"])
            } else {
                ValidationOutcome::ok()
            }
        })
        .open()
        .unwrap();

    let err = doc
        .transaction("editor", |txn| {
            txn.insert_node("root", 0, NodeDraft::text("paragraph", "a forbidden word"))
        })
        .unwrap_err();
    match err {
        Error::Validation { errors, .. } => assert_eq!(errors, vec!["forbidden word"]),
        other => panic!("unexpected {:?}", other),
    }
}
