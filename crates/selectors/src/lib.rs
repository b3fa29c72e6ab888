//! Selector engine for a synthetic document tree.
//! Grammar: a CSS-like subset of <https://www.w3.org/TR/selectors-3/>
//!
//! The engine is table-driven. A character classifier maps every input
//! character to a lexical event, a static `(state x event)` grammar table
//! yields the next state plus an ordered action list, and executing the
//! actions builds the selector AST incrementally. A separate matcher
//! interprets the AST against any tree exposed through [`TreeAdapter`].
//!
//! Supported syntax:
//! - Compound selectors: tag, `.class`, `#id`, `[name]`, `[name="value"]`
//! - Combinators: descendant (whitespace), `>`, `+`, `~`
//! - Comma-separated selector lists
//!
//! Pseudo-classes, partial-match attribute operators, and namespaces are
//! not part of the grammar.

#![forbid(unsafe_code)]

mod classify;
mod error;
mod grammar;
mod lexer;
mod matcher;

// Re-export public API
pub use classify::{Event, classify};
pub use error::{LexError, LexErrorKind};
pub use lexer::lex;
pub use matcher::{compound_matches, match_chain, match_list};

/// Combinators relating one compound selector to the next.
/// Spec: Section 11 — Combinators
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Combinator {
    /// Whitespace: matches at any depth below the current matches.
    Descendant,
    /// `>`: matches direct element children only.
    Child,
    /// `+`: matches the single next element sibling.
    AdjacentSibling,
    /// `~`: matches every later element sibling.
    GeneralSibling,
}

/// One attribute constraint inside a compound selector.
///
/// Without a value this is a presence check (`[name]`); with a value the
/// attribute must match exactly (`[name="value"]`).
/// Spec: Section 8 — Attribute selectors
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AttributeSelector {
    pub name: String,
    pub value: Option<String>,
}

/// A link from one compound selector to the next one in its chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainLink {
    pub combinator: Combinator,
    pub token: SelectorToken,
}

/// One compound selector plus at most one outgoing combinator link.
///
/// Compound fields may co-occur (`tag.class#id[attr]`); the tag is stored
/// case-normalized to upper. A full parse result is an ordered list of
/// root tokens, one chain per comma-separated alternative.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectorToken {
    /// Tag constraint, upper-cased (`DIV`); matching is case-insensitive.
    pub tag: Option<String>,
    /// Class constraint, matched against the space-separated `class` attribute.
    pub class: Option<String>,
    /// Id constraint, matched exactly against the `id` attribute.
    pub id: Option<String>,
    /// Attribute constraints, in source order across bracket groups.
    pub attributes: Vec<AttributeSelector>,
    /// Link to the next compound in the chain; `None` for the terminal token.
    pub next: Option<Box<ChainLink>>,
}

impl SelectorToken {
    /// The outgoing link, if this token is not the end of its chain.
    #[inline]
    pub fn link(&self) -> Option<&ChainLink> {
        self.next.as_deref()
    }

    /// The outgoing combinator, if any.
    #[inline]
    pub fn combinator(&self) -> Option<Combinator> {
        self.next.as_deref().map(|link| link.combinator)
    }

    /// True if no combinator leaves this token.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.next.is_none()
    }

    /// The next token when linked via the child combinator.
    #[inline]
    pub fn child(&self) -> Option<&Self> {
        self.linked_via(Combinator::Child)
    }

    /// The next token when linked via the descendant combinator.
    #[inline]
    pub fn descendant(&self) -> Option<&Self> {
        self.linked_via(Combinator::Descendant)
    }

    /// The next token when linked via the adjacent-sibling combinator.
    #[inline]
    pub fn adjacent_sibling(&self) -> Option<&Self> {
        self.linked_via(Combinator::AdjacentSibling)
    }

    /// The next token when linked via the general-sibling combinator.
    #[inline]
    pub fn general_sibling(&self) -> Option<&Self> {
        self.linked_via(Combinator::GeneralSibling)
    }

    #[inline]
    fn linked_via(&self, combinator: Combinator) -> Option<&Self> {
        self.next
            .as_deref()
            .filter(|link| link.combinator == combinator)
            .map(|link| &link.token)
    }
}

/// An adapter that abstracts tree access for selector matching.
/// Implement this for your document layer.
///
/// The matcher only ever walks forward (children and later siblings), so
/// the surface is limited to read-only, document-order primitives.
pub trait TreeAdapter {
    type Handle: Copy + Eq;

    /// Tag name of an element; matched case-insensitively.
    /// Spec: Section 5 — Type selectors
    fn tag_name(&self, element: Self::Handle) -> &str;

    /// Returns Some(id) if the element has an id attribute, else None.
    /// Spec: Section 7 — ID selectors
    fn element_id(&self, element: Self::Handle) -> Option<&str>;

    /// True if the element has the given class token.
    /// Spec: Section 6 — Class selectors
    fn has_class(&self, element: Self::Handle, class: &str) -> bool;

    /// Returns the attribute value if present.
    /// Spec: Section 8 — Attribute selectors
    fn attribute(&self, element: Self::Handle, name: &str) -> Option<&str>;

    /// First child that is an element, skipping text nodes.
    fn first_child_element(&self, element: Self::Handle) -> Option<Self::Handle>;

    /// Next sibling that is an element, skipping text nodes.
    fn next_sibling_element(&self, element: Self::Handle) -> Option<Self::Handle>;
}
