//! Property tests over generated patterns, checked against the `regex` crate.

use quickcheck::{Arbitrary, Gen, QuickCheck};
use regex::Regex;

use crate::{
    ast::AstNode,
    dfa::Dfa,
    matching::{Matcher, Recognizer},
    nfa::Nfa,
    parser::run_parse,
    table::{parse_transition_table, to_transition_table},
    utils::CompileFlags,
};

const ALPHABET: [char; 2] = ['a', 'b'];
const MAX_DEPTH: usize = 4;

#[derive(Debug, Clone)]
struct Pattern(AstNode);

#[derive(Debug, Clone)]
struct Word(String);

fn gen_node(g: &mut Gen, depth: usize) -> AstNode {
    let choice = if depth == 0 { 0 } else { u8::arbitrary(g) % 5 };
    match choice {
        0 => AstNode::Literal(*g.choose(&ALPHABET).unwrap()),
        1 => AstNode::seq(gen_node(g, depth - 1), gen_node(g, depth - 1)),
        2 => AstNode::or(gen_node(g, depth - 1), gen_node(g, depth - 1)),
        3 => AstNode::star(gen_node(g, depth - 1)),
        _ => AstNode::plus(gen_node(g, depth - 1)),
    }
}

impl Arbitrary for Pattern {
    fn arbitrary(g: &mut Gen) -> Pattern {
        let depth = usize::arbitrary(g) % (MAX_DEPTH + 1);
        Pattern(gen_node(g, depth))
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Pattern>> {
        let children = match &self.0 {
            AstNode::Literal(_) => vec![],
            AstNode::Seq(left, right) | AstNode::Or(left, right) => {
                vec![(**left).clone(), (**right).clone()]
            }
            AstNode::Star(child) | AstNode::Plus(child) => vec![(**child).clone()],
        };
        Box::new(children.into_iter().map(Pattern))
    }
}

impl Arbitrary for Word {
    fn arbitrary(g: &mut Gen) -> Word {
        let len = usize::arbitrary(g) % 9;
        Word((0..len).map(|_| *g.choose(&ALPHABET).unwrap()).collect())
    }
}

/// Same language in `regex` syntax, every subterm in a non-capturing group.
fn oracle_source(node: &AstNode) -> String {
    match node {
        AstNode::Literal(c) => regex::escape(&c.to_string()),
        AstNode::Seq(left, right) => {
            format!("(?:{})(?:{})", oracle_source(left), oracle_source(right))
        }
        AstNode::Or(left, right) => {
            format!("(?:(?:{})|(?:{}))", oracle_source(left), oracle_source(right))
        }
        AstNode::Star(child) => format!("(?:{})*", oracle_source(child)),
        AstNode::Plus(child) => format!("(?:{})+", oracle_source(child)),
    }
}

fn oracle(node: &AstNode) -> Regex {
    Regex::new(&format!("^(?:{})$", oracle_source(node))).unwrap()
}

fn check<A: Arbitrary + std::fmt::Debug, B: Arbitrary + std::fmt::Debug>(
    prop: fn(A, B) -> bool,
) {
    QuickCheck::new().tests(300).quickcheck(prop);
}

#[test]
fn display_reparses_to_same_tree() {
    fn prop(pattern: Pattern) -> bool {
        run_parse(&pattern.0.to_string()) == Ok(pattern.0)
    }
    QuickCheck::new().tests(500).quickcheck(prop as fn(Pattern) -> bool);
}

#[test]
fn matcher_agrees_with_regex_crate() {
    fn prop(pattern: Pattern, word: Word) -> bool {
        let matcher = Matcher::new(&pattern.0.to_string()).unwrap();
        matcher.accepts(&word.0) == oracle(&pattern.0).is_match(&word.0)
    }
    check(prop);
}

#[test]
fn every_stage_recognizes_the_same_language() {
    fn prop(pattern: Pattern, word: Word) -> bool {
        let nfa = Nfa::from_ast(&pattern.0);
        let dfa = Dfa::from_nfa(&nfa);
        let minimized = dfa.minimize();
        let expected = nfa.accepts(&word.0);
        dfa.accepts(&word.0) == expected && minimized.accepts(&word.0) == expected
    }
    check(prop);
}

#[test]
fn minimization_is_idempotent() {
    fn prop(pattern: Pattern) -> bool {
        let once = Dfa::from_nfa(&Nfa::from_ast(&pattern.0)).minimize();
        let twice = once.minimize();
        once.state_count() <= Dfa::from_nfa(&Nfa::from_ast(&pattern.0)).state_count()
            && once.table() == twice.table()
            && once.accepting() == twice.accepting()
    }
    QuickCheck::new().tests(300).quickcheck(prop as fn(Pattern) -> bool);
}

#[test]
fn unminimized_and_minimized_matchers_agree() {
    fn prop(pattern: Pattern, word: Word) -> bool {
        let source = pattern.0.to_string();
        let raw = Matcher::with_flags(&source, CompileFlags::NO_FLAG).unwrap();
        let minimized = Matcher::new(&source).unwrap();
        raw.accepts(&word.0) == minimized.accepts(&word.0)
            && raw.state_count() >= minimized.state_count()
    }
    check(prop);
}

#[test]
fn alternation_is_union() {
    fn prop(left: Pattern, right: Pattern, word: Word) -> bool {
        let union = Matcher::new(&AstNode::or(left.0.clone(), right.0.clone()).to_string()).unwrap();
        let left = Matcher::new(&left.0.to_string()).unwrap();
        let right = Matcher::new(&right.0.to_string()).unwrap();
        union.accepts(&word.0) == (left.accepts(&word.0) || right.accepts(&word.0))
    }
    QuickCheck::new()
        .tests(200)
        .quickcheck(prop as fn(Pattern, Pattern, Word) -> bool);
}

#[test]
fn concatenation_splits_somewhere() {
    fn prop(left: Pattern, right: Pattern, word: Word) -> bool {
        let joined = Matcher::new(&AstNode::seq(left.0.clone(), right.0.clone()).to_string()).unwrap();
        let left = Matcher::new(&left.0.to_string()).unwrap();
        let right = Matcher::new(&right.0.to_string()).unwrap();
        let split = (0..=word.0.len())
            .any(|at| left.accepts(&word.0[..at]) && right.accepts(&word.0[at..]));
        joined.accepts(&word.0) == split
    }
    QuickCheck::new()
        .tests(200)
        .quickcheck(prop as fn(Pattern, Pattern, Word) -> bool);
}

#[test]
fn repetition_and_the_empty_word() {
    fn prop(pattern: Pattern) -> bool {
        let star = Matcher::new(&AstNode::star(pattern.0.clone()).to_string()).unwrap();
        let plus = Matcher::new(&AstNode::plus(pattern.0.clone()).to_string()).unwrap();
        star.accepts("") && plus.accepts("") == pattern.0.nullable()
    }
    QuickCheck::new().tests(300).quickcheck(prop as fn(Pattern) -> bool);
}

#[test]
fn single_literal_accepts_only_itself() {
    fn prop(c: char) -> bool {
        if "*+|()".contains(c) {
            return true;
        }
        let matcher = Matcher::new(&c.to_string()).unwrap();
        let doubled: String = [c, c].iter().collect();
        matcher.accepts(&c.to_string()) && !matcher.accepts("") && !matcher.accepts(&doubled)
    }
    QuickCheck::new().tests(500).quickcheck(prop as fn(char) -> bool);
}

#[test]
fn table_round_trip_preserves_language() {
    fn prop(pattern: Pattern, word: Word) -> bool {
        let matcher = Matcher::new(&pattern.0.to_string()).unwrap();
        let loaded = parse_transition_table(&to_transition_table(matcher.dfa())).unwrap();
        loaded.table() == matcher.dfa().table() && loaded.accepts(&word.0) == matcher.accepts(&word.0)
    }
    check(prop);
}

#[test]
fn compile_entry_points() {
    let matcher = crate::compile("(a|b)*abb").unwrap();
    assert_eq!(matcher.state_count(), 4);
    assert!(matcher.accepts("babb"));

    let raw = crate::compile_with_flags("(a|b)*abb", CompileFlags::KEEP_STAGES).unwrap();
    assert_eq!(raw.state_count(), 5);
    assert!(raw.stages().is_some());
    assert!(crate::compile("a|").is_err());
}
