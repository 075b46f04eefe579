//! Document node model
//!
//! This module defines the unit of storage and the shapes used to mutate it:
//! - [`NodeId`]: Unique, immutable node identifier
//! - [`Node`]: Committed or in-flight node value
//! - [`Mark`]: Inline formatting span over a node's text
//! - [`NodeDraft`]: Input to create, may nest child drafts inline
//! - [`NodePatch`]: Partial update, merged field-by-field

use crate::value::{Attributes, Value};
use serde::{Deserialize, Deserializer, Serialize};
use std::borrow::Borrow;

/// Unique identifier for a node
///
/// Ids are opaque strings. Generated ids follow the `session:counter`
/// format (see [`crate::IdGenerator`]) but callers may supply their own.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Create a node id from any string
    pub fn new(id: impl Into<String>) -> Self {
        NodeId(id.into())
    }

    /// Borrow the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the id, returning the inner string
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        NodeId(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        NodeId(s)
    }
}

impl From<&NodeId> for NodeId {
    fn from(id: &NodeId) -> Self {
        id.clone()
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Inline formatting span
///
/// `start..end` is a half-open range of char offsets into the owning node's
/// text. Marks may overlap; the store never merges or splits them on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mark {
    /// Mark type (e.g. "bold", "link")
    #[serde(rename = "type")]
    pub mark_type: String,
    /// First covered char offset
    pub start: usize,
    /// One past the last covered char offset
    pub end: usize,
    /// Mark attributes (e.g. a link's href)
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attrs: Attributes,
}

impl Mark {
    /// Create a mark without attributes
    pub fn new(mark_type: impl Into<String>, start: usize, end: usize) -> Self {
        Mark {
            mark_type: mark_type.into(),
            start,
            end,
            attrs: Attributes::new(),
        }
    }

    /// Add an attribute
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Number of chars covered
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Check if the mark covers nothing
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Check if the mark intersects `start..end`
    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        self.start < end && start < self.end
    }
}

/// Structural classification of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Has a `content` list of children
    Element,
    /// Carries a `text` payload
    Text,
    /// Neither children nor text (e.g. an image or a rule)
    Leaf,
}

/// A document node
///
/// A node is logically owned by its parent through the parent's `content`
/// list; physically it lives in whichever table (base or overlay) currently
/// holds the authoritative copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique id, immutable once assigned
    pub id: NodeId,
    /// Node type, identifies shape and semantics
    #[serde(rename = "type")]
    pub node_type: String,
    /// Owning parent, absent for the root and for detached nodes
    #[serde(default)]
    pub parent_id: Option<NodeId>,
    /// Ordered child ids, absent for text and leaf nodes
    #[serde(default)]
    pub content: Option<Vec<NodeId>>,
    /// Text payload for text nodes
    #[serde(default)]
    pub text: Option<String>,
    /// Attribute bag, validated per schema
    #[serde(default)]
    pub attributes: Attributes,
    /// Inline formatting, overlapping marks permitted
    #[serde(default)]
    pub marks: Vec<Mark>,
}

impl Node {
    fn bare(id: NodeId, node_type: String) -> Self {
        Node {
            id,
            node_type,
            parent_id: None,
            content: None,
            text: None,
            attributes: Attributes::new(),
            marks: Vec::new(),
        }
    }

    /// Create an element node with an empty content list
    pub fn element(id: impl Into<NodeId>, node_type: impl Into<String>) -> Self {
        let mut node = Self::bare(id.into(), node_type.into());
        node.content = Some(Vec::new());
        node
    }

    /// Create a text node
    pub fn text(id: impl Into<NodeId>, node_type: impl Into<String>, text: impl Into<String>) -> Self {
        let mut node = Self::bare(id.into(), node_type.into());
        node.text = Some(text.into());
        node
    }

    /// Create a leaf node (no content, no text)
    pub fn leaf(id: impl Into<NodeId>, node_type: impl Into<String>) -> Self {
        Self::bare(id.into(), node_type.into())
    }

    /// Set the parent id
    pub fn with_parent(mut self, parent: impl Into<NodeId>) -> Self {
        self.parent_id = Some(parent.into());
        self
    }

    /// Set the content list
    pub fn with_content<I, T>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<NodeId>,
    {
        self.content = Some(children.into_iter().map(Into::into).collect());
        self
    }

    /// Add an attribute
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Add a mark
    pub fn with_mark(mut self, mark: Mark) -> Self {
        self.marks.push(mark);
        self
    }

    /// Classify the node by which payload it carries
    pub fn kind(&self) -> NodeKind {
        if self.content.is_some() {
            NodeKind::Element
        } else if self.text.is_some() {
            NodeKind::Text
        } else {
            NodeKind::Leaf
        }
    }

    /// Child ids, empty for text and leaf nodes
    pub fn child_ids(&self) -> &[NodeId] {
        self.content.as_deref().unwrap_or(&[])
    }

    /// Position of `child` within this node's content
    pub fn position_of(&self, child: &NodeId) -> Option<usize> {
        self.child_ids().iter().position(|c| c == child)
    }

    /// Text length in chars (0 when there is no text)
    pub fn text_len(&self) -> usize {
        self.text.as_deref().map_or(0, |t| t.chars().count())
    }

    /// Get an attribute by key
    pub fn attr(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }
}

// ============================================================================
// Drafts (create input)
// ============================================================================

/// A child entry in a [`NodeDraft`]
#[derive(Debug, Clone, PartialEq)]
pub enum Child {
    /// Reference to an existing (or alias-named) node
    Ref(NodeId),
    /// A nested node created together with its parent
    Inline(Box<NodeDraft>),
}

impl From<NodeId> for Child {
    fn from(id: NodeId) -> Self {
        Child::Ref(id)
    }
}

impl From<&str> for Child {
    fn from(id: &str) -> Self {
        Child::Ref(NodeId::from(id))
    }
}

impl From<NodeDraft> for Child {
    fn from(draft: NodeDraft) -> Self {
        Child::Inline(Box::new(draft))
    }
}

/// Input to `create_node`
///
/// The id is optional; when absent the store mints one. Inline children are
/// created first and replaced by plain id references in the final node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeDraft {
    /// Explicit id, or `None` to generate one
    pub id: Option<NodeId>,
    /// Node type
    pub node_type: String,
    /// Parent id (set automatically for inline children)
    pub parent_id: Option<NodeId>,
    /// Children, absent for text and leaf nodes
    pub content: Option<Vec<Child>>,
    /// Text payload
    pub text: Option<String>,
    /// Attribute bag
    pub attributes: Attributes,
    /// Inline formatting
    pub marks: Vec<Mark>,
}

impl NodeDraft {
    fn bare(node_type: String) -> Self {
        NodeDraft {
            id: None,
            node_type,
            parent_id: None,
            content: None,
            text: None,
            attributes: Attributes::new(),
            marks: Vec::new(),
        }
    }

    /// Draft an element node with no children yet
    pub fn element(node_type: impl Into<String>) -> Self {
        let mut draft = Self::bare(node_type.into());
        draft.content = Some(Vec::new());
        draft
    }

    /// Draft a text node
    pub fn text(node_type: impl Into<String>, text: impl Into<String>) -> Self {
        let mut draft = Self::bare(node_type.into());
        draft.text = Some(text.into());
        draft
    }

    /// Draft a leaf node
    pub fn leaf(node_type: impl Into<String>) -> Self {
        Self::bare(node_type.into())
    }

    /// Use an explicit id
    pub fn with_id(mut self, id: impl Into<NodeId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Attach under a parent
    pub fn with_parent(mut self, parent: impl Into<NodeId>) -> Self {
        self.parent_id = Some(parent.into());
        self
    }

    /// Append a child (reference or inline draft)
    pub fn with_child(mut self, child: impl Into<Child>) -> Self {
        self.content.get_or_insert_with(Vec::new).push(child.into());
        self
    }

    /// Add an attribute
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Add a mark
    pub fn with_mark(mut self, mark: Mark) -> Self {
        self.marks.push(mark);
        self
    }
}

impl From<Node> for NodeDraft {
    fn from(node: Node) -> Self {
        NodeDraft {
            id: Some(node.id),
            node_type: node.node_type,
            parent_id: node.parent_id,
            content: node
                .content
                .map(|ids| ids.into_iter().map(Child::Ref).collect()),
            text: node.text,
            attributes: node.attributes,
            marks: node.marks,
        }
    }
}

// ============================================================================
// Patches (update input)
// ============================================================================

fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(de).map(Some)
}

/// Partial update to a node
///
/// Fields left as `None` are untouched. Attributes are merged key-by-key;
/// every other field overwrites. `Some(None)` on an optional field clears it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodePatch {
    /// New node type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    /// New parent
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub parent_id: Option<Option<NodeId>>,
    /// New content list
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub content: Option<Option<Vec<NodeId>>>,
    /// New text payload
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub text: Option<Option<String>>,
    /// Attributes to merge in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Attributes>,
    /// Attribute keys to remove (applied after the merge)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remove_attributes: Vec<String>,
    /// New mark list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marks: Option<Vec<Mark>>,
}

impl NodePatch {
    /// Empty patch
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the node type
    pub fn node_type(mut self, node_type: impl Into<String>) -> Self {
        self.node_type = Some(node_type.into());
        self
    }

    /// Set or clear the parent
    pub fn parent(mut self, parent: Option<NodeId>) -> Self {
        self.parent_id = Some(parent);
        self
    }

    /// Replace the content list
    pub fn content<I, T>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<NodeId>,
    {
        self.content = Some(Some(children.into_iter().map(Into::into).collect()));
        self
    }

    /// Remove the content list entirely
    pub fn clear_content(mut self) -> Self {
        self.content = Some(None);
        self
    }

    /// Replace the text
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(Some(text.into()));
        self
    }

    /// Remove the text entirely
    pub fn clear_text(mut self) -> Self {
        self.text = Some(None);
        self
    }

    /// Merge one attribute
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes
            .get_or_insert_with(Attributes::new)
            .insert(key.into(), value.into());
        self
    }

    /// Remove one attribute
    pub fn remove_attr(mut self, key: impl Into<String>) -> Self {
        self.remove_attributes.push(key.into());
        self
    }

    /// Replace the mark list
    pub fn marks(mut self, marks: Vec<Mark>) -> Self {
        self.marks = Some(marks);
        self
    }

    /// Check if the patch sets nothing
    pub fn is_empty(&self) -> bool {
        self.node_type.is_none()
            && self.parent_id.is_none()
            && self.content.is_none()
            && self.text.is_none()
            && self.attributes.is_none()
            && self.remove_attributes.is_empty()
            && self.marks.is_none()
    }

    /// Check if the patch only rearranges ids (content and/or parent)
    ///
    /// Such patches carry no new shape and skip schema validation.
    pub fn is_structural_only(&self) -> bool {
        (self.content.is_some() || self.parent_id.is_some())
            && self.node_type.is_none()
            && self.text.is_none()
            && self.attributes.is_none()
            && self.remove_attributes.is_empty()
            && self.marks.is_none()
    }

    /// Check whether applying this patch to `node` would change anything
    pub fn changes(&self, node: &Node) -> bool {
        self.node_type.as_ref().is_some_and(|t| *t != node.node_type)
            || self.parent_id.as_ref().is_some_and(|p| *p != node.parent_id)
            || self.content.as_ref().is_some_and(|c| *c != node.content)
            || self.text.as_ref().is_some_and(|t| *t != node.text)
            || self.attributes.as_ref().is_some_and(|attrs| {
                attrs
                    .iter()
                    .any(|(k, v)| node.attributes.get(k) != Some(v))
            })
            || self
                .remove_attributes
                .iter()
                .any(|k| node.attributes.contains_key(k))
            || self.marks.as_ref().is_some_and(|m| *m != node.marks)
    }

    /// Merge this patch into `node`
    pub fn apply_to(&self, node: &mut Node) {
        if let Some(node_type) = &self.node_type {
            node.node_type = node_type.clone();
        }
        if let Some(parent_id) = &self.parent_id {
            node.parent_id = parent_id.clone();
        }
        if let Some(content) = &self.content {
            node.content = content.clone();
        }
        if let Some(text) = &self.text {
            node.text = text.clone();
        }
        if let Some(attrs) = &self.attributes {
            for (k, v) in attrs {
                node.attributes.insert(k.clone(), v.clone());
            }
        }
        for k in &self.remove_attributes {
            node.attributes.remove(k);
        }
        if let Some(marks) = &self.marks {
            node.marks = marks.clone();
        }
    }
}
