//! Lexer engine: drives the grammar tables over an input string.
//!
//! For each character the engine classifies an event, looks up the
//! `(state, event)` transition, runs its actions in order, and moves to
//! the next state. After the last character one explicit end-of-input
//! event is dispatched so trailing commits (or errors such as an
//! unterminated bracket) happen against the final state. The first error
//! action aborts the remaining input; no partial AST escapes.

use crate::classify::{Event, classify};
use crate::error::LexError;
use crate::grammar::{self, Action, State};
use crate::{AttributeSelector, ChainLink, Combinator, SelectorToken};
use core::mem::take;

/// Lex a selector string into its list of selector chains, one per
/// comma-separated alternative, in declaration order.
///
/// Tags are case-normalized to upper; whitespace is tolerated around
/// every combinator and bracket.
///
/// # Errors
/// Returns a [`LexError`] naming the failing context (and the offending
/// character, where one exists) on the first bad transition.
pub fn lex(selector: &str) -> Result<Vec<SelectorToken>, LexError> {
    let mut engine = LexerEngine::new();
    for character in selector.chars() {
        engine.step(Some(character))?;
    }
    engine.step(None)?;
    let chains = engine.finish();
    log::debug!("lexed {selector:?} into {} selector chain(s)", chains.len());
    Ok(chains)
}

/// Scratch buffers for the label being accumulated.
#[derive(Default)]
struct Buffers {
    tag: String,
    class: String,
    id: String,
    attrib_name: String,
    attrib_value: String,
}

/// Private per-invocation lexer state. Instances never share mutable
/// state; the grammar table they consult is read-only.
struct LexerEngine {
    state: State,
    buffers: Buffers,
    builder: AstBuilder,
}

impl LexerEngine {
    fn new() -> Self {
        Self {
            state: State::AwaitSelector,
            buffers: Buffers::default(),
            builder: AstBuilder::new(),
        }
    }

    /// Dispatch one character (or end of input) through the tables.
    fn step(&mut self, input: Option<char>) -> Result<(), LexError> {
        let event = input.map_or(Event::EndOfInput, classify);
        let transition = grammar::lookup(self.state, event);
        log::trace!(
            "lex {:?} x {event:?} -> {:?} {:?}",
            self.state,
            transition.next,
            transition.actions
        );
        for action in transition.actions.iter().copied() {
            self.apply(action, input)?;
        }
        self.state = transition.next;
        Ok(())
    }

    /// Execute one action. Ordering within a transition matters: a
    /// boundary like `tag.class` saves the tag before clearing the class
    /// buffer.
    fn apply(&mut self, action: Action, input: Option<char>) -> Result<(), LexError> {
        match action {
            Action::ClearTag => self.buffers.tag.clear(),
            Action::AppendTag => push_input(&mut self.buffers.tag, input),
            Action::SaveTag => {
                let label = take(&mut self.buffers.tag);
                self.builder.cursor().tag = Some(label.to_uppercase());
            }
            Action::ClearClass => self.buffers.class.clear(),
            Action::AppendClass => push_input(&mut self.buffers.class, input),
            Action::SaveClass => {
                self.builder.cursor().class = Some(take(&mut self.buffers.class));
            }
            Action::ClearId => self.buffers.id.clear(),
            Action::AppendId => push_input(&mut self.buffers.id, input),
            Action::SaveId => {
                self.builder.cursor().id = Some(take(&mut self.buffers.id));
            }
            Action::OpenAttribute => {
                self.buffers.attrib_name.clear();
                self.builder.cursor().attributes.push(AttributeSelector {
                    name: String::new(),
                    value: None,
                });
            }
            Action::AppendAttribName => push_input(&mut self.buffers.attrib_name, input),
            Action::SaveAttribName => {
                let name = take(&mut self.buffers.attrib_name);
                if let Some(attribute) = self.builder.cursor().attributes.last_mut() {
                    attribute.name = name;
                }
            }
            Action::ClearAttribValue => self.buffers.attrib_value.clear(),
            Action::AppendAttribValue => push_input(&mut self.buffers.attrib_value, input),
            Action::SaveAttribValue => {
                let value = take(&mut self.buffers.attrib_value);
                if let Some(attribute) = self.builder.cursor().attributes.last_mut() {
                    attribute.value = Some(value);
                }
            }
            Action::StartChild => self.builder.start_link(Combinator::Child),
            Action::StartDescendant => self.builder.start_link(Combinator::Descendant),
            Action::StartAdjacentSibling => {
                self.builder.start_link(Combinator::AdjacentSibling);
            }
            Action::StartGeneralSibling => {
                self.builder.start_link(Combinator::GeneralSibling);
            }
            Action::StartAlternative => self.builder.start_alternative(),
            Action::Fail(kind) => return Err(LexError::new(kind, input)),
        }
        Ok(())
    }

    fn finish(self) -> Vec<SelectorToken> {
        self.builder.finish()
    }
}

/// Append actions only fire for real characters; end of input never
/// reaches them through the tables.
#[inline]
fn push_input(buffer: &mut String, input: Option<char>) {
    if let Some(character) = input {
        buffer.push(character);
    }
}

/// Owned, growable AST under construction plus a cursor to the token
/// currently being filled.
///
/// The current chain is kept flat (combinator-into-each-token plus the
/// token itself) and folded into the linked representation when the chain
/// completes; re-pointing the cursor is O(1) that way.
struct AstBuilder {
    /// Completed comma-separated alternatives, in declaration order.
    finished: Vec<SelectorToken>,
    /// Committed earlier tokens of the current chain.
    links: Vec<(Option<Combinator>, SelectorToken)>,
    /// Combinator that led into `current`; `None` for a chain head.
    current_combinator: Option<Combinator>,
    /// The token the actions are filling.
    current: SelectorToken,
}

impl AstBuilder {
    fn new() -> Self {
        Self {
            finished: Vec::new(),
            links: Vec::new(),
            current_combinator: None,
            current: SelectorToken::default(),
        }
    }

    /// The token currently being filled.
    #[inline]
    fn cursor(&mut self) -> &mut SelectorToken {
        &mut self.current
    }

    /// Commit the current token and re-point the cursor at a fresh token
    /// reached through `combinator`.
    fn start_link(&mut self, combinator: Combinator) {
        let committed = take(&mut self.current);
        self.links.push((self.current_combinator.take(), committed));
        self.current_combinator = Some(combinator);
    }

    /// Fold the current chain and open a new top-level alternative.
    fn start_alternative(&mut self) {
        let chain = self.fold_current();
        self.finished.push(chain);
    }

    fn fold_current(&mut self) -> SelectorToken {
        let mut links = take(&mut self.links);
        links.push((self.current_combinator.take(), take(&mut self.current)));
        fold_chain(links)
    }

    fn finish(mut self) -> Vec<SelectorToken> {
        let chain = self.fold_current();
        self.finished.push(chain);
        self.finished
    }
}

/// Fold a flat chain into the linked `SelectorToken` representation.
/// Exactly the first entry carries no inbound combinator.
fn fold_chain(links: Vec<(Option<Combinator>, SelectorToken)>) -> SelectorToken {
    let mut next: Option<Box<ChainLink>> = None;
    let mut head = SelectorToken::default();
    for (combinator, mut token) in links.into_iter().rev() {
        token.next = next.take();
        match combinator {
            Some(inner) => {
                next = Some(Box::new(ChainLink {
                    combinator: inner,
                    token,
                }));
            }
            None => head = token,
        }
    }
    head
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Assertions in tests are expected")]

    use super::{AstBuilder, lex};
    use crate::Combinator;

    #[test]
    fn builder_folds_a_two_token_chain() {
        let mut builder = AstBuilder::new();
        builder.cursor().tag = Some("A".to_owned());
        builder.start_link(Combinator::Child);
        builder.cursor().tag = Some("B".to_owned());
        let chains = builder.finish();
        assert_eq!(chains.len(), 1);
        let head = &chains[0];
        assert_eq!(head.tag.as_deref(), Some("A"));
        assert_eq!(head.combinator(), Some(Combinator::Child));
        assert_eq!(head.child().unwrap().tag.as_deref(), Some("B"));
    }

    #[test]
    fn builder_separates_alternatives() {
        let mut builder = AstBuilder::new();
        builder.cursor().tag = Some("A".to_owned());
        builder.start_alternative();
        builder.cursor().tag = Some("B".to_owned());
        let chains = builder.finish();
        assert_eq!(chains.len(), 2);
        assert_eq!(chains[0].tag.as_deref(), Some("A"));
        assert_eq!(chains[1].tag.as_deref(), Some("B"));
    }

    #[test]
    fn lex_normalizes_tags_to_upper() {
        let chains = lex("body").unwrap();
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].tag.as_deref(), Some("BODY"));
        assert!(chains[0].is_terminal());
    }

    #[test]
    fn lex_builds_compound_tokens() {
        let chains = lex("div.fred#p2").unwrap();
        let head = &chains[0];
        assert_eq!(head.tag.as_deref(), Some("DIV"));
        assert_eq!(head.class.as_deref(), Some("fred"));
        assert_eq!(head.id.as_deref(), Some("p2"));
    }
}
