//! FIFO write lock behavior through the facade

use crate::common::*;
use foliodb::prelude::*;
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn wait_for_queue(doc: &Folio, len: usize) {
    for _ in 0..1000 {
        if doc.database().lock().queue_len() >= len {
            return;
        }
        thread::sleep(Duration::from_millis(1));
    }
    panic!("queue never reached {}", len);
}

#[test]
fn writers_are_granted_in_arrival_order() {
    let doc = hello_doc();
    let order = Arc::new(Mutex::new(Vec::new()));
    let holder = doc.database().acquire("holder").unwrap();

    let mut handles = Vec::new();
    for i in 0..4 {
        let worker_doc = doc.clone();
        let order = Arc::clone(&order);
        handles.push(thread::spawn(move || {
            let name = format!("w{}", i);
            worker_doc.transaction(&name, |txn| {
                order.lock().push(name.clone());
                txn.insert_node("root", usize::MAX, NodeDraft::leaf("image"))
            })
        }));
        wait_for_queue(&doc, i + 1);
    }

    doc.database().release(holder).unwrap();
    for h in handles {
        h.join().unwrap().unwrap();
    }

    assert_eq!(*order.lock(), vec!["w0", "w1", "w2", "w3"]);
    assert_eq!(children_of(&doc, "root").len(), 5);
}

#[test]
fn waiting_past_the_budget_times_out() {
    let doc = Folio::builder()
        .lock_timeout(Duration::from_millis(30))
        .open()
        .unwrap();
    let holder = doc.database().acquire("holder").unwrap();

    let err = doc.transaction("late", |_| Ok(())).unwrap_err();
    assert!(matches!(err, Error::LockTimeout { .. }));
    assert!(err.is_retryable());
    assert_eq!(doc.lock_stats().timeouts, 1);

    doc.database().release(holder).unwrap();
    doc.transaction("retry", |_| Ok(())).unwrap();
}

#[test]
fn lock_released_after_failed_transaction() {
    let doc = hello_doc();
    let _ = doc.transaction("editor", |txn| txn.delete_node("root"));

    assert!(!doc.database().lock().is_locked());
    let stats = doc.lock_stats();
    assert_eq!(stats.acquisitions, stats.releases);
}

#[test]
fn concurrent_writers_all_land() {
    let doc = hello_doc();
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let doc = doc.clone();
            thread::spawn(move || {
                doc.transaction(&format!("w{}", i), |txn| {
                    let p = txn.insert_node("root", 0, NodeDraft::text("paragraph", ""))?;
                    txn.insert_text(p.as_str(), 0, &format!("writer {}", i))
                })
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap().unwrap();
    }

    let root = doc.get_node("root").unwrap();
    assert_eq!(root.child_ids().len(), 9);
    let mut texts: Vec<_> = root
        .child_ids()
        .iter()
        .filter_map(|id| text_of(&doc, id.as_str()))
        .collect();
    texts.sort();
    assert_eq!(texts.len(), 9);
    assert_eq!(texts[0], "Hello");
}
