//! Selector matching over a document tree.
//!
//! A chain is interpreted left to right; each stage's matches become the
//! next stage's search contexts. The first compound of a chain behaves as
//! a descendant search under the context node, so the context itself is
//! never part of a result. Within a stage, results preserve document
//! (pre-order, left-to-right) order; across stages the matcher does not
//! globally re-sort.

use crate::{Combinator, SelectorToken, TreeAdapter};

/// Match a selector list (comma-separated alternatives) against a
/// context element.
///
/// Each chain is evaluated independently against the same context and
/// the results concatenate in declaration order, without deduplication —
/// a node matched by two alternatives appears twice, mirroring how
/// independent queries compose. An absent context yields an empty list,
/// not an error.
pub fn match_list<A: TreeAdapter>(
    adapter: &A,
    selectors: &[SelectorToken],
    context: Option<A::Handle>,
) -> Vec<A::Handle> {
    let Some(root) = context else {
        return Vec::new();
    };
    let mut results = Vec::new();
    for chain in selectors {
        results.extend(match_chain(adapter, chain, root));
    }
    results
}

/// Match one selector chain against a context element, returning every
/// matching element in per-stage document order.
pub fn match_chain<A: TreeAdapter>(
    adapter: &A,
    chain: &SelectorToken,
    context: A::Handle,
) -> Vec<A::Handle> {
    // The leading compound searches the whole subtree under the context.
    let mut matches = expand(adapter, Combinator::Descendant, chain, &[context]);
    let mut token = chain;
    while let Some(link) = token.link() {
        if matches.is_empty() {
            return matches;
        }
        log::debug!(
            "matcher stage {:?}: {} context(s)",
            link.combinator,
            matches.len()
        );
        matches = expand(adapter, link.combinator, &link.token, &matches);
        token = &link.token;
    }
    matches
}

/// One stage: resolve `combinator` from every current match and keep the
/// candidates satisfying the compound test of `token`.
fn expand<A: TreeAdapter>(
    adapter: &A,
    combinator: Combinator,
    token: &SelectorToken,
    contexts: &[A::Handle],
) -> Vec<A::Handle> {
    let mut out = Vec::new();
    for &context in contexts {
        match combinator {
            Combinator::Descendant => collect_descendants(adapter, context, token, &mut out),
            Combinator::Child => {
                let mut child = adapter.first_child_element(context);
                while let Some(element) = child {
                    if compound_matches(adapter, element, token) {
                        out.push(element);
                    }
                    child = adapter.next_sibling_element(element);
                }
            }
            Combinator::AdjacentSibling => {
                if let Some(sibling) = adapter.next_sibling_element(context)
                    && compound_matches(adapter, sibling, token)
                {
                    out.push(sibling);
                }
            }
            Combinator::GeneralSibling => {
                let mut sibling = adapter.next_sibling_element(context);
                while let Some(element) = sibling {
                    if compound_matches(adapter, element, token) {
                        out.push(element);
                    }
                    sibling = adapter.next_sibling_element(element);
                }
            }
        }
    }
    out
}

/// Pre-order walk of the strict subtree below `root`, collecting every
/// element that satisfies the compound test.
fn collect_descendants<A: TreeAdapter>(
    adapter: &A,
    root: A::Handle,
    token: &SelectorToken,
    out: &mut Vec<A::Handle>,
) {
    let mut child = adapter.first_child_element(root);
    while let Some(element) = child {
        if compound_matches(adapter, element, token) {
            out.push(element);
        }
        collect_descendants(adapter, element, token, out);
        child = adapter.next_sibling_element(element);
    }
}

/// The compound-match test, ignoring combinator fields: every present
/// constraint must hold. A token with no constraints matches everything.
pub fn compound_matches<A: TreeAdapter>(
    adapter: &A,
    element: A::Handle,
    token: &SelectorToken,
) -> bool {
    if let Some(tag) = &token.tag
        && !adapter.tag_name(element).eq_ignore_ascii_case(tag)
    {
        return false;
    }
    if let Some(class) = &token.class
        && !adapter.has_class(element, class)
    {
        return false;
    }
    if let Some(id) = &token.id
        && adapter.element_id(element) != Some(id.as_str())
    {
        return false;
    }
    for constraint in &token.attributes {
        match adapter.attribute(element, &constraint.name) {
            None => return false,
            Some(found) => {
                if let Some(expected) = &constraint.value
                    && found != expected
                {
                    return false;
                }
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Assertions in tests are expected")]

    use super::{compound_matches, match_chain, match_list};
    use crate::{TreeAdapter, lex};

    /// A vec-backed element tree, first-child/next-sibling linked.
    struct TestTree {
        nodes: Vec<TestNode>,
    }

    struct TestNode {
        tag: String,
        attrs: Vec<(String, String)>,
        first_child: Option<usize>,
        next_sibling: Option<usize>,
    }

    impl TreeAdapter for TestTree {
        type Handle = usize;

        fn tag_name(&self, element: usize) -> &str {
            &self.nodes[element].tag
        }

        fn element_id(&self, element: usize) -> Option<&str> {
            self.attribute(element, "id")
        }

        fn has_class(&self, element: usize, class: &str) -> bool {
            self.attribute(element, "class")
                .is_some_and(|value| value.split_ascii_whitespace().any(|token| token == class))
        }

        fn attribute(&self, element: usize, name: &str) -> Option<&str> {
            self.nodes[element]
                .attrs
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str())
        }

        fn first_child_element(&self, element: usize) -> Option<usize> {
            self.nodes[element].first_child
        }

        fn next_sibling_element(&self, element: usize) -> Option<usize> {
            self.nodes[element].next_sibling
        }
    }

    /// body(0) > div(1) > [p#p1(2), p#p2.fred(3)], div(4) > span.fred(5)
    fn sample_tree() -> TestTree {
        let node = |tag: &str, attrs: &[(&str, &str)], first_child, next_sibling| TestNode {
            tag: tag.to_owned(),
            attrs: attrs
                .iter()
                .map(|&(key, value)| (key.to_owned(), value.to_owned()))
                .collect(),
            first_child,
            next_sibling,
        };
        TestTree {
            nodes: vec![
                node("body", &[], Some(1), None),
                node("div", &[], Some(2), Some(4)),
                node("p", &[("id", "p1")], None, Some(3)),
                node("p", &[("id", "p2"), ("class", "fred")], None, None),
                node("div", &[], Some(5), None),
                node("span", &[("class", "fred")], None, None),
            ],
        }
    }

    #[test]
    fn child_combinator_matches_in_document_order() {
        let tree = sample_tree();
        let chains = lex("div>p").unwrap();
        let found = match_list(&tree, &chains, Some(0));
        assert_eq!(found, vec![2, 3]);
    }

    #[test]
    fn class_selector_matches_across_the_subtree() {
        let tree = sample_tree();
        let chains = lex(".fred").unwrap();
        assert_eq!(match_list(&tree, &chains, Some(0)), vec![3, 5]);
    }

    #[test]
    fn id_selector_matches_one_element() {
        let tree = sample_tree();
        let chains = lex("#p1").unwrap();
        assert_eq!(match_list(&tree, &chains, Some(0)), vec![2]);
    }

    #[test]
    fn descendant_combinator_searches_any_depth() {
        let tree = sample_tree();
        let chains = lex("body p").unwrap();
        assert_eq!(match_list(&tree, &chains, Some(0)), vec![2, 3]);
    }

    #[test]
    fn adjacent_sibling_matches_only_the_next_element() {
        let tree = sample_tree();
        let chains = lex("p+p").unwrap();
        assert_eq!(match_list(&tree, &chains, Some(0)), vec![3]);
        let chains = lex("div+div").unwrap();
        assert_eq!(match_list(&tree, &chains, Some(0)), vec![4]);
    }

    #[test]
    fn general_sibling_matches_every_later_element() {
        let tree = sample_tree();
        let chains = lex("p~p").unwrap();
        assert_eq!(match_list(&tree, &chains, Some(0)), vec![3]);
        let chains = lex("div~div").unwrap();
        assert_eq!(match_list(&tree, &chains, Some(0)), vec![4]);
    }

    #[test]
    fn alternatives_concatenate_without_dedup() {
        let tree = sample_tree();
        let chains = lex("#p2,.fred").unwrap();
        // p2 matches both alternatives and appears twice.
        assert_eq!(match_list(&tree, &chains, Some(0)), vec![3, 3, 5]);
    }

    #[test]
    fn absent_context_yields_empty_not_error() {
        let tree = sample_tree();
        let chains = lex("div").unwrap();
        assert!(match_list(&tree, &chains, None).is_empty());
    }

    #[test]
    fn context_itself_is_never_matched() {
        let tree = sample_tree();
        let chains = lex("body").unwrap();
        assert!(match_list(&tree, &chains, Some(0)).is_empty());
    }

    #[test]
    fn empty_compound_matches_every_candidate() {
        let tree = sample_tree();
        // Built programmatically: the lexer cannot produce an empty compound.
        let token = crate::SelectorToken::default();
        let found = match_chain(&tree, &token, 0);
        assert_eq!(found, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn attribute_presence_and_exact_value() {
        let tree = sample_tree();
        let chains = lex("[id]").unwrap();
        assert_eq!(match_list(&tree, &chains, Some(0)), vec![2, 3]);
        let chains = lex("[id=\"p2\"]").unwrap();
        assert_eq!(match_list(&tree, &chains, Some(0)), vec![3]);
        let chains = lex("[id=\"nope\"]").unwrap();
        assert!(match_list(&tree, &chains, Some(0)).is_empty());
    }

    #[test]
    fn compound_test_is_case_insensitive_for_tags() {
        let tree = sample_tree();
        let chains = lex("SPAN").unwrap();
        let token = &chains[0];
        assert!(compound_matches(&tree, 5, token));
        assert!(!compound_matches(&tree, 4, token));
    }
}
