//! Random transaction sequences through the facade
//!
//! Each script is a list of transactions that either finish or bail out
//! with an error. Only finished ones may move the version or change what
//! readers see.

use crate::common::*;
use foliodb::prelude::*;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Edit {
    Append { text: String },
    Retext { text: String },
    DropLast,
}

#[derive(Debug, Clone)]
struct Txn {
    edits: Vec<Edit>,
    fail: bool,
}

fn edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        "[a-z]{1,5}".prop_map(|text| Edit::Append { text }),
        "[a-z]{0,5}".prop_map(|text| Edit::Retext { text }),
        Just(Edit::DropLast),
    ]
}

fn txn() -> impl Strategy<Value = Txn> {
    (prop::collection::vec(edit(), 0..5), any::<bool>()).prop_map(|(edits, fail)| Txn { edits, fail })
}

fn run(txn: &mut DocumentStore, edits: &[Edit]) -> Result<()> {
    for edit in edits {
        match edit {
            Edit::Append { text } => {
                let at = txn.get_node("root").map(|n| n.child_ids().len()).unwrap_or(0);
                txn.insert_node("root", at, NodeDraft::text("paragraph", text.as_str()))?;
            }
            Edit::Retext { text } => {
                txn.update_node("p1", NodePatch::new().text(text.as_str()))?;
            }
            Edit::DropLast => {
                let last = txn
                    .get_node("root")
                    .and_then(|n| n.child_ids().last().cloned())
                    .filter(|id| id.as_str() != "p1");
                if let Some(id) = last {
                    txn.delete_node(id.as_str())?;
                }
            }
        }
    }
    Ok(())
}

fn committed_state(doc: &Folio) -> Vec<(String, Option<String>)> {
    let mut nodes: Vec<_> = doc
        .export_snapshot()
        .unwrap()
        .nodes
        .into_values()
        .map(|n| (n.id.to_string(), n.text))
        .collect();
    nodes.sort();
    nodes
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn only_finished_transactions_change_committed_state(script in prop::collection::vec(txn(), 1..8)) {
        let doc = hello_doc();
        let mut version = doc.version();

        for t in &script {
            let before = committed_state(&doc);
            let fail = t.fail;
            let result = doc.transaction("prop", |txn| {
                run(txn, &t.edits)?;
                if fail {
                    txn.delete_node("root")?;
                }
                Ok(())
            });

            if fail {
                prop_assert!(matches!(result, Err(Error::RootDeletion(_))));
                prop_assert_eq!(doc.version(), version);
                prop_assert_eq!(committed_state(&doc), before);
            } else {
                prop_assert!(result.is_ok());
                version += 1;
                prop_assert_eq!(doc.version(), version);
            }
            prop_assert!(!doc.database().lock().is_locked());
        }

        let root = doc.get_node("root").unwrap();
        for child in root.child_ids() {
            prop_assert!(doc.get_node(child.as_str()).is_some());
        }
    }
}
