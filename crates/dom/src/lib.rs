//! In-memory, browser-independent document tree.
//!
//! Nodes live in an arena; a parent exclusively owns its children, and
//! detaching a child turns it into an independent root. The tree carries
//! no rendering, layout, or live-mutation semantics — it exists so test
//! code can build a synthetic document and query it the way code queries
//! a live one.

#![forbid(unsafe_code)]

mod events;
mod printing;

pub use events::{DispatchedEvent, EventRegistry};
pub use indextree::NodeId;

use core::fmt::{self, Display, Formatter};
use indextree::Arena;
use smallvec::SmallVec;

/// What a node is: an element with a tag, or a text leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element { tag: String },
    Text { text: String },
}

/// One node's payload: its kind plus its attributes (empty for text).
/// Attribute keys are unique; setting an existing key replaces the value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomNode {
    pub kind: NodeKind,
    pub attrs: SmallVec<(String, String), 4>,
}

/// Errors from the document construction API. Read accessors never fail;
/// they return `None` or empty iterators for unknown nodes instead.
#[derive(Debug)]
pub enum DomError {
    /// The node id does not belong to this document.
    UnknownNode,
    /// The operation needs an element, but the node is a text leaf.
    NotAnElement,
    /// The operation needs a text leaf, but the node is an element.
    NotAText,
    /// `remove_child` was given a node that is not a child of the parent.
    NotAChild,
    /// The arena rejected the attachment (for example, a self-append).
    Structure(indextree::NodeError),
}

impl Display for DomError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownNode => write!(formatter, "node does not belong to this document"),
            Self::NotAnElement => write!(formatter, "operation requires an element node"),
            Self::NotAText => write!(formatter, "operation requires a text node"),
            Self::NotAChild => write!(formatter, "node is not a child of the given parent"),
            Self::Structure(inner) => write!(formatter, "invalid tree operation: {inner}"),
        }
    }
}

impl core::error::Error for DomError {}

impl From<indextree::NodeError> for DomError {
    fn from(inner: indextree::NodeError) -> Self {
        Self::Structure(inner)
    }
}

/// An arena-backed document. Nodes are created against the document and
/// addressed by [`NodeId`]; ids stay valid for the document's lifetime.
#[derive(Debug, Default)]
pub struct Document {
    arena: Arena<DomNode>,
    root: Option<NodeId>,
}

impl Document {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// The document root, if one was set.
    #[inline]
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Make `node` the document root.
    pub fn set_root(&mut self, node: NodeId) {
        self.root = Some(node);
    }

    /// Create a detached element node.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.arena.new_node(DomNode {
            kind: NodeKind::Element {
                tag: tag.to_owned(),
            },
            attrs: SmallVec::new(),
        })
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.arena.new_node(DomNode {
            kind: NodeKind::Text {
                text: text.to_owned(),
            },
            attrs: SmallVec::new(),
        })
    }

    /// Append `child` as the last child of `parent`.
    ///
    /// # Errors
    /// Fails if either id is unknown, the parent is a text leaf, or the
    /// arena rejects the attachment.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        if self.arena.get(child).is_none() {
            return Err(DomError::UnknownNode);
        }
        match self.node(parent) {
            None => return Err(DomError::UnknownNode),
            Some(DomNode {
                kind: NodeKind::Text { .. },
                ..
            }) => return Err(DomError::NotAnElement),
            Some(_) => {}
        }
        parent.checked_append(child, &mut self.arena)?;
        log::trace!("appended {child:?} under {parent:?}");
        Ok(())
    }

    /// Detach `node` from its parent; it becomes an independent root and
    /// keeps its whole subtree.
    ///
    /// # Errors
    /// Fails only for an unknown id.
    pub fn detach(&mut self, node: NodeId) -> Result<(), DomError> {
        if self.arena.get(node).is_none() {
            return Err(DomError::UnknownNode);
        }
        node.detach(&mut self.arena);
        Ok(())
    }

    /// Remove `child` from `parent`, validating the relationship first.
    ///
    /// # Errors
    /// Fails for unknown ids or when `child` is not a child of `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        if self.arena.get(parent).is_none() {
            return Err(DomError::UnknownNode);
        }
        if self.parent(child) != Some(parent) {
            return Err(DomError::NotAChild);
        }
        self.detach(child)
    }

    /// The node's payload, if the id belongs to this document.
    #[inline]
    pub fn node(&self, node: NodeId) -> Option<&DomNode> {
        self.arena.get(node).map(indextree::Node::get)
    }

    #[inline]
    pub fn is_element(&self, node: NodeId) -> bool {
        matches!(
            self.node(node),
            Some(DomNode {
                kind: NodeKind::Element { .. },
                ..
            })
        )
    }

    #[inline]
    pub fn is_text(&self, node: NodeId) -> bool {
        matches!(
            self.node(node),
            Some(DomNode {
                kind: NodeKind::Text { .. },
                ..
            })
        )
    }

    /// Tag name for elements; `None` for text nodes and unknown ids.
    pub fn tag_name(&self, node: NodeId) -> Option<&str> {
        match &self.node(node)?.kind {
            NodeKind::Element { tag } => Some(tag),
            NodeKind::Text { .. } => None,
        }
    }

    /// Literal text for text nodes; `None` for elements and unknown ids.
    pub fn text(&self, node: NodeId) -> Option<&str> {
        match &self.node(node)?.kind {
            NodeKind::Text { text } => Some(text),
            NodeKind::Element { .. } => None,
        }
    }

    /// Replace the literal text of a text node.
    ///
    /// # Errors
    /// Fails for unknown ids and element nodes.
    pub fn set_text(&mut self, node: NodeId, text: &str) -> Result<(), DomError> {
        match self.arena.get_mut(node).map(indextree::Node::get_mut) {
            None => Err(DomError::UnknownNode),
            Some(DomNode {
                kind: NodeKind::Element { .. },
                ..
            }) => Err(DomError::NotAText),
            Some(DomNode {
                kind: NodeKind::Text { text: existing },
                ..
            }) => {
                text.clone_into(existing);
                Ok(())
            }
        }
    }

    /// Concatenated text of every descendant text node, in document order.
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        if self.arena.get(node).is_some() {
            for descendant in node.descendants(&self.arena) {
                if let Some(text) = self.text(descendant) {
                    out.push_str(text);
                }
            }
        }
        out
    }

    // --- attributes ---

    /// Set an attribute, replacing any existing value for the same name.
    ///
    /// # Errors
    /// Fails for unknown ids and text nodes.
    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        match self.arena.get_mut(node).map(indextree::Node::get_mut) {
            None => Err(DomError::UnknownNode),
            Some(DomNode {
                kind: NodeKind::Text { .. },
                ..
            }) => Err(DomError::NotAnElement),
            Some(payload) => {
                if let Some(pair) = payload
                    .attrs
                    .iter_mut()
                    .find(|(key, _)| key.as_str() == name)
                {
                    value.clone_into(&mut pair.1);
                } else {
                    payload.attrs.push((name.to_owned(), value.to_owned()));
                }
                Ok(())
            }
        }
    }

    /// Remove an attribute if present.
    ///
    /// # Errors
    /// Fails for unknown ids and text nodes.
    pub fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<(), DomError> {
        match self.arena.get_mut(node).map(indextree::Node::get_mut) {
            None => Err(DomError::UnknownNode),
            Some(DomNode {
                kind: NodeKind::Text { .. },
                ..
            }) => Err(DomError::NotAnElement),
            Some(payload) => {
                payload.attrs.retain(|(key, _)| key.as_str() != name);
                Ok(())
            }
        }
    }

    /// Attribute value by name, if present.
    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.node(node)?
            .attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// All attributes in insertion order.
    pub fn attributes(&self, node: NodeId) -> impl Iterator<Item = (&str, &str)> {
        self.node(node)
            .into_iter()
            .flat_map(|payload| payload.attrs.iter())
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    // --- class and id facades ---

    /// True if the space-separated `class` attribute contains `class`.
    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.attribute(node, "class")
            .is_some_and(|value| value.split_ascii_whitespace().any(|token| token == class))
    }

    /// Add a class token unless already present.
    ///
    /// # Errors
    /// Fails for unknown ids and text nodes.
    pub fn add_class(&mut self, node: NodeId, class: &str) -> Result<(), DomError> {
        if self.has_class(node, class) {
            return Ok(());
        }
        let joined = match self.attribute(node, "class") {
            Some(existing) if !existing.is_empty() => format!("{existing} {class}"),
            _ => class.to_owned(),
        };
        self.set_attribute(node, "class", &joined)
    }

    /// Remove a class token if present.
    ///
    /// # Errors
    /// Fails for unknown ids and text nodes.
    pub fn remove_class(&mut self, node: NodeId, class: &str) -> Result<(), DomError> {
        let Some(existing) = self.attribute(node, "class") else {
            // Nothing to remove, but still reject text nodes and bad ids.
            return match self.node(node) {
                None => Err(DomError::UnknownNode),
                Some(DomNode {
                    kind: NodeKind::Text { .. },
                    ..
                }) => Err(DomError::NotAnElement),
                Some(_) => Ok(()),
            };
        };
        let remaining: Vec<&str> = existing
            .split_ascii_whitespace()
            .filter(|token| *token != class)
            .collect();
        if remaining.is_empty() {
            return self.remove_attribute(node, "class");
        }
        let joined = remaining.join(" ");
        self.set_attribute(node, "class", &joined)
    }

    /// The `id` attribute, if present.
    #[inline]
    pub fn element_id(&self, node: NodeId) -> Option<&str> {
        self.attribute(node, "id")
    }

    /// Set the `id` attribute.
    ///
    /// # Errors
    /// Fails for unknown ids and text nodes.
    #[inline]
    pub fn set_id(&mut self, node: NodeId, id: &str) -> Result<(), DomError> {
        self.set_attribute(node, "id", id)
    }

    // --- traversal ---

    /// Parent node, if attached (the root has none).
    #[inline]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.arena.get(node)?.parent()
    }

    /// All children in document order, elements and text alike.
    pub fn children(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        let attached = self.arena.get(node).is_some();
        attached
            .then(|| node.children(&self.arena))
            .into_iter()
            .flatten()
    }

    /// Element children only, in document order.
    pub fn child_elements(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        self.children(node).filter(|&child| self.is_element(child))
    }

    /// First element child, skipping text nodes.
    pub fn first_child_element(&self, node: NodeId) -> Option<NodeId> {
        self.child_elements(node).next()
    }

    /// Next element sibling, skipping text nodes.
    pub fn next_sibling_element(&self, node: NodeId) -> Option<NodeId> {
        let mut current = self.arena.get(node)?.next_sibling();
        while let Some(sibling) = current {
            if self.is_element(sibling) {
                return Some(sibling);
            }
            current = self.arena.get(sibling)?.next_sibling();
        }
        None
    }

    /// The node and its whole subtree, pre-order.
    pub fn descendants(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        let attached = self.arena.get(node).is_some();
        attached
            .then(|| node.descendants(&self.arena))
            .into_iter()
            .flatten()
    }
}
