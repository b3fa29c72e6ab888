//! Static grammar tables for the selector lexer.
//!
//! A complete `(state x event)` function: every pair maps to a next state
//! plus an ordered action list. Each state first declares a uniform
//! default transition (usually an error specific to its context), then
//! overrides the events it actually responds to, so the table is total by
//! construction. Built once behind a `Lazy` and read-only afterwards.

use crate::classify::Event;
use crate::error::LexErrorKind;
use once_cell::sync::Lazy;
use smallvec::SmallVec;

/// Grammatical position of the lexer between two characters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum State {
    /// Before the first compound of the first selector.
    AwaitSelector,
    /// Accumulating a tag name.
    InTag,
    /// Accumulating a class name.
    InClass,
    /// Accumulating an id.
    InId,
    /// Whitespace seen after a committed compound; may still upgrade to
    /// another combinator.
    AwaitDescendant,
    /// `>` seen; the next compound starts a child-linked token.
    AwaitChild,
    /// `+` seen; the next compound starts an adjacent-sibling token.
    AwaitAdjacentSibling,
    /// `~` seen; the next compound starts a general-sibling token.
    AwaitGeneralSibling,
    /// Inside `[`, before the attribute name.
    AwaitAttribName,
    /// Accumulating an attribute name.
    InAttribName,
    /// Attribute name committed; awaiting `=` or `]`.
    AwaitEqualsOrEnd,
    /// `=` seen; awaiting the opening quote.
    AwaitValueQuote,
    /// Inside a quoted attribute value; free-form until the closing quote.
    InAttribValue,
    /// Closing quote seen; awaiting `]`.
    AwaitAttribEnd,
    /// `]` seen; awaiting another `[`, a combinator, `,`, or the end.
    AwaitExtraAttrib,
    /// `,` seen; awaiting the next top-level alternative.
    AwaitNextSelector,
}

impl State {
    pub(crate) const COUNT: usize = 16;

    #[inline]
    fn index(self) -> usize {
        self as usize
    }
}

/// One atomic side effect applied during a transition. Actions compose;
/// their order within a transition matters (e.g. save the tag before
/// clearing the class buffer on a `tag.class` boundary).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Action {
    ClearTag,
    AppendTag,
    SaveTag,
    ClearClass,
    AppendClass,
    SaveClass,
    ClearId,
    AppendId,
    SaveId,
    /// Open a new attribute record on the current token.
    OpenAttribute,
    AppendAttribName,
    SaveAttribName,
    ClearAttribValue,
    AppendAttribValue,
    SaveAttribValue,
    /// Start a child-linked token and re-point the cursor to it.
    StartChild,
    /// Start a descendant-linked token and re-point the cursor to it.
    StartDescendant,
    /// Start an adjacent-sibling token and re-point the cursor to it.
    StartAdjacentSibling,
    /// Start a general-sibling token and re-point the cursor to it.
    StartGeneralSibling,
    /// Start a new top-level alternative in the selector list.
    StartAlternative,
    /// Raise the given error, aborting the remaining input.
    Fail(LexErrorKind),
}

/// Next state plus the ordered actions to run when taking the transition.
#[derive(Clone, Debug)]
pub(crate) struct Transition {
    pub(crate) next: State,
    pub(crate) actions: SmallVec<Action, 4>,
}

impl Transition {
    fn new(next: State, actions: &[Action]) -> Self {
        Self {
            next,
            actions: actions.iter().copied().collect(),
        }
    }

    fn fail(state: State, kind: LexErrorKind) -> Self {
        Self::new(state, &[Action::Fail(kind)])
    }
}

/// The complete transition table, indexed by `(state, event)`.
pub(crate) struct GrammarTable {
    cells: Vec<Transition>,
}

static TABLE: Lazy<GrammarTable> = Lazy::new(GrammarTable::build);

/// Look up the transition for a `(state, event)` pair.
///
/// The table is total, so this never fails for any classified input.
#[inline]
pub(crate) fn lookup(state: State, event: Event) -> &'static Transition {
    TABLE.cell(state, event)
}

impl GrammarTable {
    #[inline]
    fn cell(&self, state: State, event: Event) -> &Transition {
        let index = state.index() * Event::COUNT + event.index();
        // The table is allocated for every (state, event) pair up front.
        self.cells
            .get(index)
            .unwrap_or_else(|| unreachable_cell(state, event))
    }

    /// Declare the uniform default for every event of one state.
    fn default_row(&mut self, state: State, transition: &Transition) {
        let base = state.index() * Event::COUNT;
        for offset in 0..Event::COUNT {
            if let Some(cell) = self.cells.get_mut(base + offset) {
                *cell = transition.clone();
            }
        }
    }

    /// Override one `(state, event)` cell.
    fn on(&mut self, state: State, event: Event, next: State, actions: &[Action]) {
        let index = state.index() * Event::COUNT + event.index();
        if let Some(cell) = self.cells.get_mut(index) {
            *cell = Transition::new(next, actions);
        }
    }

    /// Accept the lead character of a compound selector in `state`,
    /// running `prefix` (cursor re-pointing) before the buffer actions.
    fn compound_starts(&mut self, state: State, prefix: &[Action]) {
        self.on(
            state,
            Event::LabelLead,
            State::InTag,
            &joined(prefix, &[Action::ClearTag, Action::AppendTag]),
        );
        self.on(
            state,
            Event::ClassPrefix,
            State::InClass,
            &joined(prefix, &[Action::ClearClass]),
        );
        self.on(
            state,
            Event::IdPrefix,
            State::InId,
            &joined(prefix, &[Action::ClearId]),
        );
        self.on(state, Event::OpenBracket, State::AwaitAttribName, prefix);
    }

    /// Commit a label buffer on every boundary character common to the
    /// `InTag`/`InClass`/`InId` states.
    fn label_commits(&mut self, state: State, save: Action) {
        self.on(state, Event::Whitespace, State::AwaitDescendant, &[save]);
        self.on(state, Event::ChildSeparator, State::AwaitChild, &[save]);
        self.on(
            state,
            Event::AdjacentSeparator,
            State::AwaitAdjacentSibling,
            &[save],
        );
        self.on(
            state,
            Event::GeneralSeparator,
            State::AwaitGeneralSibling,
            &[save],
        );
        self.on(
            state,
            Event::ClassPrefix,
            State::InClass,
            &[save, Action::ClearClass],
        );
        self.on(state, Event::IdPrefix, State::InId, &[save, Action::ClearId]);
        self.on(state, Event::OpenBracket, State::AwaitAttribName, &[save]);
        self.on(state, Event::Comma, State::AwaitNextSelector, &[save]);
        self.on(state, Event::EndOfInput, state, &[save]);
    }

    /// Transitions shared by the four combinator-await states.
    fn combinator_waits(&mut self, state: State, start: Action, end_of_input: &[Action]) {
        self.default_row(state, &Transition::fail(state, LexErrorKind::BeforeSelector));
        self.on(state, Event::Whitespace, state, &[]);
        self.compound_starts(state, &[start]);
        self.on(state, Event::EndOfInput, state, end_of_input);
    }

    fn build() -> Self {
        let placeholder = Transition::fail(State::AwaitSelector, LexErrorKind::BeforeSelector);
        let mut table = Self {
            cells: vec![placeholder; State::COUNT * Event::COUNT],
        };

        // await-selector: whitespace is ignored, a compound may begin,
        // everything else is a "before selector" error.
        table.default_row(
            State::AwaitSelector,
            &Transition::fail(State::AwaitSelector, LexErrorKind::BeforeSelector),
        );
        table.on(
            State::AwaitSelector,
            Event::Whitespace,
            State::AwaitSelector,
            &[],
        );
        table.compound_starts(State::AwaitSelector, &[]);
        table.on(
            State::AwaitSelector,
            Event::EndOfInput,
            State::AwaitSelector,
            &[Action::Fail(LexErrorKind::UnexpectedEndOfInput)],
        );

        // in-tag: accumulate the label, commit on any boundary.
        table.default_row(
            State::InTag,
            &Transition::fail(State::InTag, LexErrorKind::InTag),
        );
        table.on(State::InTag, Event::LabelLead, State::InTag, &[Action::AppendTag]);
        table.on(State::InTag, Event::LabelDigit, State::InTag, &[Action::AppendTag]);
        table.label_commits(State::InTag, Action::SaveTag);

        // in-class
        table.default_row(
            State::InClass,
            &Transition::fail(State::InClass, LexErrorKind::InClass),
        );
        table.on(
            State::InClass,
            Event::LabelLead,
            State::InClass,
            &[Action::AppendClass],
        );
        table.on(
            State::InClass,
            Event::LabelDigit,
            State::InClass,
            &[Action::AppendClass],
        );
        table.label_commits(State::InClass, Action::SaveClass);

        // in-id
        table.default_row(
            State::InId,
            &Transition::fail(State::InId, LexErrorKind::InId),
        );
        table.on(State::InId, Event::LabelLead, State::InId, &[Action::AppendId]);
        table.on(State::InId, Event::LabelDigit, State::InId, &[Action::AppendId]);
        table.label_commits(State::InId, Action::SaveId);

        // await-descendant: trailing whitespace is legal at end of input,
        // a later combinator upgrades the pending whitespace, and a comma
        // starts the next alternative.
        table.combinator_waits(State::AwaitDescendant, Action::StartDescendant, &[]);
        table.on(
            State::AwaitDescendant,
            Event::ChildSeparator,
            State::AwaitChild,
            &[],
        );
        table.on(
            State::AwaitDescendant,
            Event::AdjacentSeparator,
            State::AwaitAdjacentSibling,
            &[],
        );
        table.on(
            State::AwaitDescendant,
            Event::GeneralSeparator,
            State::AwaitGeneralSibling,
            &[],
        );
        table.on(
            State::AwaitDescendant,
            Event::Comma,
            State::AwaitNextSelector,
            &[],
        );

        // await-child / await-adjacent / await-general: a second separator
        // with nothing between is its own error, and the input may not end
        // while a combinator still awaits its right-hand side.
        for (state, start) in [
            (State::AwaitChild, Action::StartChild),
            (State::AwaitAdjacentSibling, Action::StartAdjacentSibling),
            (State::AwaitGeneralSibling, Action::StartGeneralSibling),
        ] {
            table.combinator_waits(
                state,
                start,
                &[Action::Fail(LexErrorKind::UnexpectedEndOfInput)],
            );
            for separator in [
                Event::ChildSeparator,
                Event::AdjacentSeparator,
                Event::GeneralSeparator,
            ] {
                table.on(
                    state,
                    separator,
                    state,
                    &[Action::Fail(LexErrorKind::RepeatedCombinatorSeparator)],
                );
            }
        }

        // await-attrib-name: the attribute record opens on the name's lead
        // character; end of input inside brackets is always "unclosed".
        table.default_row(
            State::AwaitAttribName,
            &Transition::fail(State::AwaitAttribName, LexErrorKind::InAttribute),
        );
        table.on(
            State::AwaitAttribName,
            Event::Whitespace,
            State::AwaitAttribName,
            &[],
        );
        table.on(
            State::AwaitAttribName,
            Event::LabelLead,
            State::InAttribName,
            &[Action::OpenAttribute, Action::AppendAttribName],
        );
        table.on(
            State::AwaitAttribName,
            Event::EndOfInput,
            State::AwaitAttribName,
            &[Action::Fail(LexErrorKind::UnclosedAttribute)],
        );

        // in-attrib-name
        table.default_row(
            State::InAttribName,
            &Transition::fail(State::InAttribName, LexErrorKind::InAttribute),
        );
        table.on(
            State::InAttribName,
            Event::LabelLead,
            State::InAttribName,
            &[Action::AppendAttribName],
        );
        table.on(
            State::InAttribName,
            Event::LabelDigit,
            State::InAttribName,
            &[Action::AppendAttribName],
        );
        table.on(
            State::InAttribName,
            Event::Equals,
            State::AwaitValueQuote,
            &[Action::SaveAttribName],
        );
        table.on(
            State::InAttribName,
            Event::CloseBracket,
            State::AwaitExtraAttrib,
            &[Action::SaveAttribName],
        );
        table.on(
            State::InAttribName,
            Event::Whitespace,
            State::AwaitEqualsOrEnd,
            &[Action::SaveAttribName],
        );
        table.on(
            State::InAttribName,
            Event::EndOfInput,
            State::InAttribName,
            &[Action::Fail(LexErrorKind::UnclosedAttribute)],
        );

        // await-equals-or-end: `[name ]` or `[name = "value"]`
        table.default_row(
            State::AwaitEqualsOrEnd,
            &Transition::fail(State::AwaitEqualsOrEnd, LexErrorKind::InAttribute),
        );
        table.on(
            State::AwaitEqualsOrEnd,
            Event::Whitespace,
            State::AwaitEqualsOrEnd,
            &[],
        );
        table.on(
            State::AwaitEqualsOrEnd,
            Event::Equals,
            State::AwaitValueQuote,
            &[],
        );
        table.on(
            State::AwaitEqualsOrEnd,
            Event::CloseBracket,
            State::AwaitExtraAttrib,
            &[],
        );
        table.on(
            State::AwaitEqualsOrEnd,
            Event::EndOfInput,
            State::AwaitEqualsOrEnd,
            &[Action::Fail(LexErrorKind::UnclosedAttribute)],
        );

        // await-value-quote: the value must open with a quote.
        table.default_row(
            State::AwaitValueQuote,
            &Transition::fail(State::AwaitValueQuote, LexErrorKind::MissingValueQuote),
        );
        table.on(
            State::AwaitValueQuote,
            Event::Whitespace,
            State::AwaitValueQuote,
            &[],
        );
        table.on(
            State::AwaitValueQuote,
            Event::Quote,
            State::InAttribValue,
            &[Action::ClearAttribValue],
        );
        table.on(
            State::AwaitValueQuote,
            Event::EndOfInput,
            State::AwaitValueQuote,
            &[Action::Fail(LexErrorKind::UnclosedAttribute)],
        );

        // in-attrib-value: free-form (the default appends) until the
        // closing quote; only truly illegal characters reject.
        table.default_row(
            State::InAttribValue,
            &Transition::new(State::InAttribValue, &[Action::AppendAttribValue]),
        );
        table.on(
            State::InAttribValue,
            Event::Quote,
            State::AwaitAttribEnd,
            &[Action::SaveAttribValue],
        );
        table.on(
            State::InAttribValue,
            Event::Illegal,
            State::InAttribValue,
            &[Action::Fail(LexErrorKind::InAttribValue)],
        );
        table.on(
            State::InAttribValue,
            Event::EndOfInput,
            State::InAttribValue,
            &[Action::Fail(LexErrorKind::UnclosedAttribute)],
        );

        // await-attrib-end: only `]` (or padding whitespace) may follow
        // the closing quote.
        table.default_row(
            State::AwaitAttribEnd,
            &Transition::fail(State::AwaitAttribEnd, LexErrorKind::InAttribute),
        );
        table.on(
            State::AwaitAttribEnd,
            Event::Whitespace,
            State::AwaitAttribEnd,
            &[],
        );
        table.on(
            State::AwaitAttribEnd,
            Event::CloseBracket,
            State::AwaitExtraAttrib,
            &[],
        );
        table.on(
            State::AwaitAttribEnd,
            Event::EndOfInput,
            State::AwaitAttribEnd,
            &[Action::Fail(LexErrorKind::UnclosedAttribute)],
        );

        // await-extra-attrib: after `]` the compound is committed; another
        // bracket group, a combinator, a comma, or the end may follow.
        table.default_row(
            State::AwaitExtraAttrib,
            &Transition::fail(State::AwaitExtraAttrib, LexErrorKind::InAttribute),
        );
        table.on(
            State::AwaitExtraAttrib,
            Event::Whitespace,
            State::AwaitDescendant,
            &[],
        );
        table.on(
            State::AwaitExtraAttrib,
            Event::OpenBracket,
            State::AwaitAttribName,
            &[],
        );
        table.on(
            State::AwaitExtraAttrib,
            Event::ChildSeparator,
            State::AwaitChild,
            &[],
        );
        table.on(
            State::AwaitExtraAttrib,
            Event::AdjacentSeparator,
            State::AwaitAdjacentSibling,
            &[],
        );
        table.on(
            State::AwaitExtraAttrib,
            Event::GeneralSeparator,
            State::AwaitGeneralSibling,
            &[],
        );
        table.on(
            State::AwaitExtraAttrib,
            Event::Comma,
            State::AwaitNextSelector,
            &[],
        );
        table.on(
            State::AwaitExtraAttrib,
            Event::EndOfInput,
            State::AwaitExtraAttrib,
            &[],
        );

        // await-next-selector: like await-selector, but the new root is
        // allocated on the lead character and a trailing comma is its own
        // error at end of input.
        table.default_row(
            State::AwaitNextSelector,
            &Transition::fail(State::AwaitNextSelector, LexErrorKind::BeforeSelector),
        );
        table.on(
            State::AwaitNextSelector,
            Event::Whitespace,
            State::AwaitNextSelector,
            &[],
        );
        table.compound_starts(State::AwaitNextSelector, &[Action::StartAlternative]);
        table.on(
            State::AwaitNextSelector,
            Event::EndOfInput,
            State::AwaitNextSelector,
            &[Action::Fail(LexErrorKind::IncompleteSelectorList)],
        );

        table
    }
}

/// Concatenate a cursor-repointing prefix with buffer actions.
fn joined(prefix: &[Action], rest: &[Action]) -> SmallVec<Action, 4> {
    prefix.iter().chain(rest.iter()).copied().collect()
}

/// Out-of-bounds cells cannot occur: the table covers every state and
/// event index. Kept as a cold path rather than a panic.
#[cold]
fn unreachable_cell(state: State, event: Event) -> &'static Transition {
    static FALLBACK: Lazy<Transition> = Lazy::new(|| {
        Transition::fail(State::AwaitSelector, LexErrorKind::BeforeSelector)
    });
    log::error!("grammar table miss for {state:?} x {event:?}");
    &FALLBACK
}

#[cfg(test)]
mod tests {
    use super::{Action, State, lookup};
    use crate::classify::Event;
    use crate::error::LexErrorKind;

    #[test]
    fn table_is_total() {
        let states = [
            State::AwaitSelector,
            State::InTag,
            State::InClass,
            State::InId,
            State::AwaitDescendant,
            State::AwaitChild,
            State::AwaitAdjacentSibling,
            State::AwaitGeneralSibling,
            State::AwaitAttribName,
            State::InAttribName,
            State::AwaitEqualsOrEnd,
            State::AwaitValueQuote,
            State::InAttribValue,
            State::AwaitAttribEnd,
            State::AwaitExtraAttrib,
            State::AwaitNextSelector,
        ];
        let events = [
            Event::LabelLead,
            Event::LabelDigit,
            Event::ClassPrefix,
            Event::IdPrefix,
            Event::ChildSeparator,
            Event::Whitespace,
            Event::AdjacentSeparator,
            Event::GeneralSeparator,
            Event::OpenBracket,
            Event::CloseBracket,
            Event::Equals,
            Event::Quote,
            Event::Comma,
            Event::EndOfInput,
            Event::Illegal,
            Event::OtherSymbol,
        ];
        assert_eq!(states.len(), State::COUNT);
        assert_eq!(events.len(), Event::COUNT);
        for state in states {
            for event in events {
                // Every cell resolves without hitting the fallback.
                let transition = lookup(state, event);
                let _ = transition.next;
            }
        }
    }

    #[test]
    fn tag_boundary_saves_before_clearing() {
        let transition = lookup(State::InTag, Event::ClassPrefix);
        assert_eq!(transition.next, State::InClass);
        assert_eq!(
            &transition.actions[..],
            &[Action::SaveTag, Action::ClearClass]
        );
    }

    #[test]
    fn combinator_before_any_selector_is_an_error() {
        let transition = lookup(State::AwaitSelector, Event::ChildSeparator);
        assert_eq!(
            &transition.actions[..],
            &[Action::Fail(LexErrorKind::BeforeSelector)]
        );
    }

    #[test]
    fn repeated_separators_are_a_dedicated_error() {
        for event in [
            Event::ChildSeparator,
            Event::AdjacentSeparator,
            Event::GeneralSeparator,
        ] {
            let transition = lookup(State::AwaitChild, event);
            assert_eq!(
                &transition.actions[..],
                &[Action::Fail(LexErrorKind::RepeatedCombinatorSeparator)]
            );
        }
    }

    #[test]
    fn pending_descendant_upgrades_to_child() {
        let transition = lookup(State::AwaitDescendant, Event::ChildSeparator);
        assert_eq!(transition.next, State::AwaitChild);
        assert!(transition.actions.is_empty());
    }

    #[test]
    fn attribute_value_default_appends_free_form() {
        for event in [Event::Whitespace, Event::OtherSymbol, Event::Comma] {
            let transition = lookup(State::InAttribValue, event);
            assert_eq!(transition.next, State::InAttribValue);
            assert_eq!(&transition.actions[..], &[Action::AppendAttribValue]);
        }
    }

    #[test]
    fn end_of_input_inside_brackets_is_unclosed() {
        for state in [
            State::AwaitAttribName,
            State::InAttribName,
            State::AwaitEqualsOrEnd,
            State::AwaitValueQuote,
            State::InAttribValue,
            State::AwaitAttribEnd,
        ] {
            let transition = lookup(state, Event::EndOfInput);
            assert_eq!(
                &transition.actions[..],
                &[Action::Fail(LexErrorKind::UnclosedAttribute)]
            );
        }
    }
}
