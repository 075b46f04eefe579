//! Document Store Integration Tests
//!
//! Exercises the public facade end to end: transactions, copy-on-write
//! isolation, commit ordering, aliases, the write lock, subscribers,
//! snapshots, schema validation, and random transaction scripts.

#[path = "../common/mod.rs"]
mod common;

mod aliases;
mod atomicity;
mod commit_order;
mod isolation;
mod lock_fairness;
mod properties;
mod subscribers;
mod validation;
