use std::collections::BTreeSet;

use log::debug;

use crate::{
    ast::{visitor::Visitor, AstNode, Data},
    fsm::{State, StateGenerator, StateSet, Symbol, TransitionTable},
    matching::Recognizer,
};

/// A self-contained piece of an NFA with one entry and one exit state.
#[derive(Debug, Clone)]
pub struct NfaFragment {
    pub entry: State,
    pub exit: State,
    pub table: TransitionTable,
}

/// Thompson construction over an [`AstNode`]. Owns the state generator of
/// one compilation.
#[derive(Debug, Default)]
pub struct NfaBuilder {
    generator: StateGenerator,
}

impl NfaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(mut self, root: &AstNode) -> Nfa {
        let fragment = root.accept(&mut self);
        let nfa = Nfa {
            table: fragment.table,
            start: fragment.entry,
            accept: fragment.exit,
        };
        debug!(
            "thompson construction produced {} nfa states for {} ast nodes",
            nfa.state_count(),
            root.size()
        );
        nfa
    }

    fn fragment(&mut self) -> (State, State) {
        (self.generator.gen_state(), self.generator.gen_state())
    }

    fn fragment_with(&mut self, table: TransitionTable) -> NfaFragment {
        let (entry, exit) = self.fragment();
        let mut fragment = NfaFragment { entry, exit, table };
        fragment.table.add_state(entry);
        fragment.table.add_state(exit);
        fragment
    }
}

impl Visitor for NfaBuilder {
    type Result = NfaFragment;

    fn visit_literal(&mut self, literal: char) -> NfaFragment {
        let mut fragment = self.fragment_with(TransitionTable::new());
        fragment
            .table
            .add_transition(fragment.entry, Symbol::Char(literal), fragment.exit);
        fragment
    }

    fn visit_seq(&mut self, left: &AstNode, right: &AstNode) -> NfaFragment {
        let mut first = left.accept(self);
        let second = right.accept(self);
        first.table.merge(second.table);
        first.table.epsilon(first.exit, second.entry);
        NfaFragment {
            entry: first.entry,
            exit: second.exit,
            table: first.table,
        }
    }

    fn visit_or(&mut self, left: &AstNode, right: &AstNode) -> NfaFragment {
        let lower = left.accept(self);
        let upper = right.accept(self);
        let mut table = lower.table;
        table.merge(upper.table);

        let mut fragment = self.fragment_with(table);
        fragment.table.epsilon(fragment.entry, lower.entry);
        fragment.table.epsilon(fragment.entry, upper.entry);
        fragment.table.epsilon(lower.exit, fragment.exit);
        fragment.table.epsilon(upper.exit, fragment.exit);
        fragment
    }

    fn visit_star(&mut self, child: &AstNode) -> NfaFragment {
        let inner = child.accept(self);
        let mut fragment = self.fragment_with(inner.table);
        fragment.table.epsilon(fragment.entry, inner.entry);
        fragment.table.epsilon(fragment.entry, fragment.exit);
        fragment.table.epsilon(inner.exit, inner.entry);
        fragment.table.epsilon(inner.exit, fragment.exit);
        fragment
    }

    fn visit_plus(&mut self, child: &AstNode) -> NfaFragment {
        let inner = child.accept(self);
        let mut fragment = self.fragment_with(inner.table);
        fragment.table.epsilon(fragment.entry, inner.entry);
        fragment.table.epsilon(inner.exit, fragment.entry);
        fragment.table.epsilon(inner.exit, fragment.exit);
        fragment
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nfa {
    table: TransitionTable,
    start: State,
    accept: State,
}

impl Nfa {
    pub fn from_ast(root: &AstNode) -> Nfa {
        NfaBuilder::new().build(root)
    }

    pub fn table(&self) -> &TransitionTable {
        &self.table
    }

    pub fn start(&self) -> State {
        self.start
    }

    pub fn accept(&self) -> State {
        self.accept
    }

    pub fn state_count(&self) -> usize {
        self.table.len()
    }

    pub fn alphabet(&self) -> BTreeSet<char> {
        self.table.alphabet()
    }

    /// States reachable from `states` through epsilon transitions alone,
    /// `states` included.
    pub fn epsilon_closure(&self, states: &StateSet) -> StateSet {
        let mut closure = StateSet::new();
        let mut stack: Vec<State> = states.iter().copied().collect();

        while let Some(state) = stack.pop() {
            if closure.insert(state) {
                if let Some(targets) = self.table.targets(state, Symbol::Epsilon) {
                    stack.extend(targets.iter().filter(|s| !closure.contains(*s)));
                }
            }
        }
        closure
    }

    /// Union of the `symbol` successors of `states`, without closing it.
    pub fn step(&self, states: &StateSet, symbol: char) -> StateSet {
        states
            .iter()
            .filter_map(|state| self.table.targets(*state, Symbol::Char(symbol)))
            .flatten()
            .copied()
            .collect()
    }

    /// Convert the automaton to GraphViz Dot code for debugging purposes.
    pub fn to_dot(&self) -> String {
        let mut out = String::new();
        out += "    node [shape = point ]; start;\n";
        for state in self.table.states() {
            let shape = if state == self.accept {
                "doublecircle"
            } else {
                "circle"
            };
            out += &format!("    node [shape = {}]; {};\n", shape, state);
        }
        for (start, symbol, end) in self.table.iter() {
            if symbol.is_epsilon() {
                out += &format!("    {} -> {} [ label = \"ε\" style = dashed ];\n", start, end);
            } else {
                out += &format!("    {} -> {} [ label = \"{}\" ];\n", start, end, symbol);
            }
        }
        out += &format!("    start -> {};\n", self.start);
        format!("digraph NFA {{\n    rankdir=LR;\n{}}}\n", out)
    }
}

impl Recognizer for Nfa {
    fn accepts(&self, input: &str) -> bool {
        let mut current = self.epsilon_closure(&StateSet::from([self.start]));
        for c in input.chars() {
            if current.is_empty() {
                return false;
            }
            current = self.epsilon_closure(&self.step(&current, c));
        }
        current.contains(&self.accept)
    }
}
