//! Query facade over the synthetic document tree.
//!
//! Wires the document layer to the selector engine through a thin
//! adapter and exposes the two calls test code actually wants:
//! [`find_all`] and [`select_first`]. Lexing happens per call; callers
//! holding a hot selector can lex once and drive the matcher themselves
//! through the re-exports.

#![forbid(unsafe_code)]

pub use gossamer_dom::{DispatchedEvent, Document, DomError, EventRegistry, NodeId};
pub use gossamer_selectors::{
    AttributeSelector, ChainLink, Combinator, LexError, LexErrorKind, SelectorToken, TreeAdapter,
    lex, match_chain, match_list,
};

/// Read-only view of a [`Document`] for the matcher.
pub struct DomAdapter<'doc> {
    document: &'doc Document,
}

impl<'doc> DomAdapter<'doc> {
    #[inline]
    pub fn new(document: &'doc Document) -> Self {
        Self { document }
    }
}

impl TreeAdapter for DomAdapter<'_> {
    type Handle = NodeId;

    fn tag_name(&self, element: NodeId) -> &str {
        // The matcher only visits elements, which always carry a tag.
        self.document.tag_name(element).unwrap_or("")
    }

    fn element_id(&self, element: NodeId) -> Option<&str> {
        self.document.element_id(element)
    }

    fn has_class(&self, element: NodeId, class: &str) -> bool {
        self.document.has_class(element, class)
    }

    fn attribute(&self, element: NodeId, name: &str) -> Option<&str> {
        self.document.attribute(element, name)
    }

    fn first_child_element(&self, element: NodeId) -> Option<NodeId> {
        self.document.first_child_element(element)
    }

    fn next_sibling_element(&self, element: NodeId) -> Option<NodeId> {
        self.document.next_sibling_element(element)
    }
}

/// Find every element under the document root matching `selector`, in
/// per-stage document order. A document without a root yields an empty
/// list.
///
/// # Errors
/// Returns the lex error verbatim when the selector string is malformed.
pub fn find_all(document: &Document, selector: &str) -> Result<Vec<NodeId>, LexError> {
    let chains = lex(selector)?;
    Ok(match_list(
        &DomAdapter::new(document),
        &chains,
        document.root(),
    ))
}

/// Find every element under `context` matching `selector`. The context
/// element itself is never part of the result.
///
/// # Errors
/// Returns the lex error verbatim when the selector string is malformed.
pub fn find_all_from(
    document: &Document,
    context: NodeId,
    selector: &str,
) -> Result<Vec<NodeId>, LexError> {
    let chains = lex(selector)?;
    Ok(match_list(
        &DomAdapter::new(document),
        &chains,
        Some(context),
    ))
}

/// First match under the document root, or `None`.
///
/// # Errors
/// Returns the lex error verbatim when the selector string is malformed.
pub fn select_first(document: &Document, selector: &str) -> Result<Option<NodeId>, LexError> {
    Ok(find_all(document, selector)?.into_iter().next())
}

/// First match under `context`, or `None`.
///
/// # Errors
/// Returns the lex error verbatim when the selector string is malformed.
pub fn select_first_from(
    document: &Document,
    context: NodeId,
    selector: &str,
) -> Result<Option<NodeId>, LexError> {
    Ok(find_all_from(document, context, selector)?
        .into_iter()
        .next())
}
