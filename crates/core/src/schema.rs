//! Schema validation boundary
//!
//! The store never interprets node types itself. It hands each new shape to
//! a [`SchemaValidator`] on create and on non-structural updates, and refuses
//! the mutation when the outcome is invalid.
//!
//! Closures `Fn(&Node) -> ValidationOutcome` implement the trait directly.
//! [`TypeSchema`] is a small rule table for callers (and tests) that do not
//! bring their own validator.

use crate::node::{Node, NodeKind};
use std::collections::HashMap;

/// Result of validating one node
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationOutcome {
    /// Whether the shape is acceptable
    pub valid: bool,
    /// Messages describing each problem
    pub errors: Vec<String>,
}

impl ValidationOutcome {
    /// A passing outcome
    pub fn ok() -> Self {
        ValidationOutcome {
            valid: true,
            errors: Vec::new(),
        }
    }

    /// A failing outcome with messages
    pub fn invalid<I, S>(errors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ValidationOutcome {
            valid: false,
            errors: errors.into_iter().map(Into::into).collect(),
        }
    }

    fn from_errors(errors: Vec<String>) -> Self {
        ValidationOutcome {
            valid: errors.is_empty(),
            errors,
        }
    }
}

/// Validates node shapes
///
/// Must be a pure function of the node: the store may call it any number of
/// times for the same value.
pub trait SchemaValidator: Send + Sync {
    /// Validate a node
    fn validate(&self, node: &Node) -> ValidationOutcome;
}

impl<F> SchemaValidator for F
where
    F: Fn(&Node) -> ValidationOutcome + Send + Sync,
{
    fn validate(&self, node: &Node) -> ValidationOutcome {
        self(node)
    }
}

/// Validator that accepts every shape
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl SchemaValidator for AcceptAll {
    fn validate(&self, _node: &Node) -> ValidationOutcome {
        ValidationOutcome::ok()
    }
}

/// Rules for one node type
#[derive(Debug, Clone, Default)]
pub struct NodeRule {
    kind: Option<NodeKind>,
    required: Vec<String>,
    allowed_marks: Option<Vec<String>>,
}

impl NodeRule {
    /// Require an element (has content)
    pub fn element() -> Self {
        NodeRule {
            kind: Some(NodeKind::Element),
            ..Default::default()
        }
    }

    /// Require a text node
    pub fn text() -> Self {
        NodeRule {
            kind: Some(NodeKind::Text),
            ..Default::default()
        }
    }

    /// Require a leaf node
    pub fn leaf() -> Self {
        NodeRule {
            kind: Some(NodeKind::Leaf),
            ..Default::default()
        }
    }

    /// Any structure
    pub fn any() -> Self {
        NodeRule::default()
    }

    /// Require an attribute key
    pub fn require(mut self, key: impl Into<String>) -> Self {
        self.required.push(key.into());
        self
    }

    /// Restrict which mark types may appear
    pub fn allow_marks<I, S>(mut self, marks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_marks = Some(marks.into_iter().map(Into::into).collect());
        self
    }
}

/// Rule-table validator keyed by node type
#[derive(Debug, Clone, Default)]
pub struct TypeSchema {
    rules: HashMap<String, NodeRule>,
    allow_unknown: bool,
}

impl TypeSchema {
    /// Empty schema; unknown types are rejected
    pub fn new() -> Self {
        Self::default()
    }

    /// Register rules for a node type
    pub fn node(mut self, node_type: impl Into<String>, rule: NodeRule) -> Self {
        self.rules.insert(node_type.into(), rule);
        self
    }

    /// Accept node types that have no registered rule
    pub fn allow_unknown(mut self) -> Self {
        self.allow_unknown = true;
        self
    }
}

impl SchemaValidator for TypeSchema {
    fn validate(&self, node: &Node) -> ValidationOutcome {
        let rule = match self.rules.get(&node.node_type) {
            Some(rule) => rule,
            None if self.allow_unknown => return ValidationOutcome::ok(),
            None => {
                return ValidationOutcome::invalid([format!(
                    "unknown node type '{}'",
                    node.node_type
                )])
            }
        };

        let mut errors = Vec::new();

        if let Some(kind) = rule.kind {
            if node.kind() != kind {
                errors.push(format!(
                    "'{}' must be {:?}, found {:?}",
                    node.node_type,
                    kind,
                    node.kind()
                ));
            }
        }

        for key in &rule.required {
            if !node.attributes.contains_key(key) {
                errors.push(format!("missing required attribute '{}'", key));
            }
        }

        let text_len = node.text_len();
        for mark in &node.marks {
            if let Some(allowed) = &rule.allowed_marks {
                if !allowed.contains(&mark.mark_type) {
                    errors.push(format!(
                        "mark '{}' not allowed on '{}'",
                        mark.mark_type, node.node_type
                    ));
                }
            }
            if mark.start > mark.end || mark.end > text_len {
                errors.push(format!(
                    "mark '{}' range {}..{} outside text of length {}",
                    mark.mark_type, mark.start, mark.end, text_len
                ));
            }
        }

        ValidationOutcome::from_errors(errors)
    }
}
