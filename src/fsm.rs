use std::{
    collections::{BTreeMap, BTreeSet, VecDeque},
    fmt::Display,
};

use itertools::Itertools;

/// Dense, per-automaton state handle.
#[derive(Hash, Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub struct State(u32);

impl State {
    pub(crate) fn from_index(index: usize) -> State {
        State(index as u32)
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "s{}", self.0)
    }
}

pub type StateSet = BTreeSet<State>;

/// Mints fresh states for one automaton. Never hands out the same state
/// twice, so fragments built from one generator cannot alias.
#[derive(Debug, Default)]
pub struct StateGenerator {
    state_counter: u32,
}

impl StateGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gen_state(&mut self) -> State {
        let state = State(self.state_counter);
        self.state_counter += 1;
        state
    }

    pub fn count(&self) -> usize {
        self.state_counter as usize
    }
}

#[derive(Hash, Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub enum Symbol {
    Epsilon,
    Char(char),
}

impl Symbol {
    pub fn is_epsilon(&self) -> bool {
        matches!(self, Symbol::Epsilon)
    }

    pub fn as_char(&self) -> Option<char> {
        match self {
            Symbol::Epsilon => None,
            Symbol::Char(c) => Some(*c),
        }
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Symbol::Epsilon => write!(f, "ε"),
            Symbol::Char(c) => write!(f, "{}", c),
        }
    }
}

/// `(state, symbol) -> {state}` map shared by the NFA and the DFA.
///
/// Every state mentioned as a source or a destination is a key, even when it
/// has no outgoing transitions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionTable {
    transitions: BTreeMap<State, BTreeMap<Symbol, StateSet>>,
}

impl TransitionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_state(&mut self, state: State) {
        self.transitions.entry(state).or_default();
    }

    pub fn add_transition(&mut self, start: State, symbol: Symbol, end: State) {
        self.add_state(end);
        self.transitions
            .entry(start)
            .or_default()
            .entry(symbol)
            .or_default()
            .insert(end);
    }

    pub fn epsilon(&mut self, start: State, end: State) {
        self.add_transition(start, Symbol::Epsilon, end)
    }

    /// Replaces whatever `start` had on `symbol` with the single destination `end`.
    pub fn set_transition(&mut self, start: State, symbol: Symbol, end: State) {
        self.add_state(end);
        self.transitions
            .entry(start)
            .or_default()
            .insert(symbol, StateSet::from([end]));
    }

    pub fn targets(&self, state: State, symbol: Symbol) -> Option<&StateSet> {
        self.transitions
            .get(&state)
            .and_then(|row| row.get(&symbol))
    }

    /// The single destination of a deterministic row.
    pub fn next(&self, state: State, symbol: Symbol) -> Option<State> {
        self.targets(state, symbol)
            .and_then(|targets| targets.iter().next().copied())
    }

    pub fn row(&self, state: State) -> impl Iterator<Item = (Symbol, &StateSet)> + '_ {
        self.transitions
            .get(&state)
            .into_iter()
            .flat_map(|row| row.iter().map(|(symbol, targets)| (*symbol, targets)))
    }

    pub fn contains_state(&self, state: State) -> bool {
        self.transitions.contains_key(&state)
    }

    pub fn states(&self) -> impl Iterator<Item = State> + '_ {
        self.transitions.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Every `(start, symbol, end)` triple, ordered by start then symbol.
    pub fn iter(&self) -> impl Iterator<Item = (State, Symbol, State)> + '_ {
        self.transitions.iter().flat_map(|(start, row)| {
            row.iter().flat_map(move |(symbol, targets)| {
                targets.iter().map(move |end| (*start, *symbol, *end))
            })
        })
    }

    pub fn alphabet(&self) -> BTreeSet<char> {
        self.transitions
            .values()
            .flat_map(|row| row.keys().filter_map(Symbol::as_char))
            .collect()
    }

    /// Disjoint union with a table built from the same generator.
    pub fn merge(&mut self, other: TransitionTable) {
        for (state, row) in other.transitions {
            let merged = self.transitions.entry(state).or_default();
            for (symbol, targets) in row {
                merged.entry(symbol).or_default().extend(targets);
            }
        }
    }

    pub fn reachable_from(&self, start: State) -> StateSet {
        let mut visited = StateSet::new();
        let mut queue = VecDeque::from([start]);
        while let Some(state) = queue.pop_front() {
            if visited.insert(state) {
                queue.extend(self.row(state).flat_map(|(_, targets)| targets.iter().copied()));
            }
        }
        visited
    }

    /// States from which some member of `targets` can be reached.
    pub fn co_reachable(&self, targets: &StateSet) -> StateSet {
        let mut predecessors: BTreeMap<State, StateSet> = BTreeMap::new();
        for (start, _, end) in self.iter() {
            predecessors.entry(end).or_default().insert(start);
        }
        let mut visited = StateSet::new();
        let mut stack = targets.iter().copied().collect_vec();
        while let Some(state) = stack.pop() {
            if visited.insert(state) {
                if let Some(sources) = predecessors.get(&state) {
                    stack.extend(sources.iter().copied());
                }
            }
        }
        visited
    }

    pub fn is_deterministic(&self) -> bool {
        self.transitions.values().all(|row| {
            row.iter()
                .all(|(symbol, targets)| !symbol.is_epsilon() && targets.len() == 1)
        })
    }
}

pub fn format_state_set(states: &StateSet) -> String {
    format!("{{{}}}", states.iter().join(" "))
}
