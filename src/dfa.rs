use std::collections::{btree_map::Entry, BTreeMap, BTreeSet, VecDeque};

use log::{debug, trace};

use crate::{
    fsm::{format_state_set, State, StateGenerator, StateSet, Symbol, TransitionTable},
    minimize,
    nfa::Nfa,
};

/// A deterministic automaton: no epsilon moves, at most one destination per
/// `(state, symbol)`, every state reachable from `start`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dfa {
    table: TransitionTable,
    start: State,
    accepting: StateSet,
    origins: BTreeMap<State, StateSet>,
}

struct SubsetConstruction<'a> {
    nfa: &'a Nfa,
    generator: StateGenerator,
    // canonical state-set -> dfa state, only alive during construction
    seen: BTreeMap<StateSet, State>,
    unmarked: VecDeque<(State, StateSet)>,
    table: TransitionTable,
    accepting: StateSet,
    origins: BTreeMap<State, StateSet>,
}

impl<'a> SubsetConstruction<'a> {
    fn new(nfa: &'a Nfa) -> Self {
        SubsetConstruction {
            nfa,
            generator: StateGenerator::new(),
            seen: BTreeMap::new(),
            unmarked: VecDeque::new(),
            table: TransitionTable::new(),
            accepting: StateSet::new(),
            origins: BTreeMap::new(),
        }
    }

    fn register(&mut self, members: StateSet) -> State {
        if let Some(state) = self.seen.get(&members) {
            return *state;
        }
        let state = self.generator.gen_state();
        trace!("dfa state {} = {}", state, format_state_set(&members));
        self.table.add_state(state);
        if members.contains(&self.nfa.accept()) {
            self.accepting.insert(state);
        }
        self.seen.insert(members.clone(), state);
        self.origins.insert(state, members.clone());
        self.unmarked.push_back((state, members));
        state
    }

    fn run(mut self) -> Dfa {
        let start_set = self
            .nfa
            .epsilon_closure(&StateSet::from([self.nfa.start()]));
        let start = self.register(start_set);

        while let Some((current, members)) = self.unmarked.pop_front() {
            let mut moves: BTreeMap<char, StateSet> = BTreeMap::new();
            for state in members.iter() {
                for (symbol, targets) in self.nfa.table().row(*state) {
                    if let Symbol::Char(c) = symbol {
                        moves.entry(c).or_default().extend(targets.iter().copied());
                    }
                }
            }
            for (c, targets) in moves {
                let closure = self.nfa.epsilon_closure(&targets);
                let next = self.register(closure);
                self.table.set_transition(current, Symbol::Char(c), next);
            }
        }

        debug!(
            "subset construction produced {} dfa states from {} nfa states",
            self.table.len(),
            self.nfa.state_count()
        );
        Dfa {
            table: self.table,
            start,
            accepting: self.accepting,
            origins: self.origins,
        }
    }
}

impl Dfa {
    /// Subset construction over the epsilon-closures of `nfa`.
    pub fn from_nfa(nfa: &Nfa) -> Dfa {
        SubsetConstruction::new(nfa).run()
    }

    /// Assembles a DFA from parts whose determinism the caller has checked.
    /// Unreachable states are dropped and the rest renumbered.
    pub(crate) fn from_parts(
        table: TransitionTable,
        start: State,
        accepting: StateSet,
        origins: BTreeMap<State, StateSet>,
    ) -> Dfa {
        debug_assert!(table.is_deterministic());
        let mut dfa = Dfa {
            table,
            start,
            accepting,
            origins,
        };
        dfa.table.add_state(start);
        dfa.renumbered()
    }

    pub fn table(&self) -> &TransitionTable {
        &self.table
    }

    pub fn start(&self) -> State {
        self.start
    }

    pub fn accepting(&self) -> &StateSet {
        &self.accepting
    }

    pub fn is_accepting(&self, state: State) -> bool {
        self.accepting.contains(&state)
    }

    pub fn state_count(&self) -> usize {
        self.table.len()
    }

    pub fn alphabet(&self) -> BTreeSet<char> {
        self.table.alphabet()
    }

    /// NFA states a DFA state was built from; `None` for loaded automata.
    pub fn origin(&self, state: State) -> Option<&StateSet> {
        self.origins.get(&state)
    }

    pub fn origins(&self) -> &BTreeMap<State, StateSet> {
        &self.origins
    }

    pub fn next(&self, state: State, symbol: char) -> Option<State> {
        self.table.next(state, Symbol::Char(symbol))
    }

    pub fn minimize(&self) -> Dfa {
        minimize::minimize(self)
    }

    /// Copy keeping only states reachable from `start`, numbered densely in
    /// breadth-first order (symbols ascending), start first.
    pub fn renumbered(&self) -> Dfa {
        let mut generator = StateGenerator::new();
        let mut mapping: BTreeMap<State, State> = BTreeMap::new();
        let mut order: Vec<State> = Vec::new();
        let mut queue = VecDeque::from([self.start]);
        mapping.insert(self.start, generator.gen_state());

        while let Some(state) = queue.pop_front() {
            order.push(state);
            for (_, targets) in self.table.row(state) {
                for target in targets {
                    if let Entry::Vacant(slot) = mapping.entry(*target) {
                        slot.insert(generator.gen_state());
                        queue.push_back(*target);
                    }
                }
            }
        }

        let mut table = TransitionTable::new();
        for state in order {
            let renamed = mapping[&state];
            table.add_state(renamed);
            for (symbol, targets) in self.table.row(state) {
                for target in targets {
                    table.set_transition(renamed, symbol, mapping[target]);
                }
            }
        }
        let accepting = self
            .accepting
            .iter()
            .filter_map(|state| mapping.get(state))
            .copied()
            .collect();
        let origins = self
            .origins
            .iter()
            .filter_map(|(state, members)| mapping.get(state).map(|s| (*s, members.clone())))
            .collect();

        Dfa {
            table,
            start: mapping[&self.start],
            accepting,
            origins,
        }
    }
}
