//! Shared fixtures for integration tests
//!
//! Every fixture starts from a fresh [`Folio`] so tests never share state.

#![allow(dead_code)]

use foliodb::prelude::*;
use std::sync::Once;

static TRACING: Once = Once::new();

/// Route engine logs to the test writer (`RUST_LOG=folio_engine=debug`)
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// root → [p1 "Hello"]
pub fn hello_doc() -> Folio {
    init_tracing();
    let doc = Folio::open().unwrap();
    doc.transaction("fixture", |txn| {
        txn.insert_node("root", 0, NodeDraft::text("paragraph", "Hello").with_id("p1"))
    })
    .unwrap();
    doc
}

/// root → [p1 "Hello", list → [i1 "one", i2 "two"]]
pub fn outline_doc() -> Folio {
    let doc = hello_doc();
    doc.transaction("fixture", |txn| {
        txn.insert_node(
            "root",
            1,
            NodeDraft::element("list")
                .with_id("list")
                .with_child(NodeDraft::text("item", "one").with_id("i1"))
                .with_child(NodeDraft::text("item", "two").with_id("i2")),
        )
    })
    .unwrap();
    doc
}

/// Committed text of a node
pub fn text_of(doc: &Folio, id: &str) -> Option<String> {
    doc.get_node(id).and_then(|n| n.text)
}

/// Committed child ids of a node, as strings
pub fn children_of(doc: &Folio, id: &str) -> Vec<String> {
    doc.get_node(id)
        .map(|n| n.child_ids().iter().map(|c| c.to_string()).collect())
        .unwrap_or_default()
}
