use std::collections::BTreeMap;

use itertools::Itertools;
use log::{debug, trace};

use crate::{
    dfa::Dfa,
    fsm::{State, StateSet, Symbol, TransitionTable},
};

/// Disjoint, nonempty blocks covering the states being minimized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    blocks: Vec<StateSet>,
    block_of: BTreeMap<State, usize>,
}

impl Partition {
    fn from_blocks(blocks: Vec<StateSet>) -> Partition {
        let blocks = blocks.into_iter().filter(|b| !b.is_empty()).collect_vec();
        let block_of = blocks
            .iter()
            .enumerate()
            .flat_map(|(index, block)| block.iter().map(move |state| (*state, index)))
            .collect();
        Partition { blocks, block_of }
    }

    /// `{accepting, non-accepting}` restricted to `states`, empty block dropped.
    pub fn initial(states: &StateSet, accepting: &StateSet) -> Partition {
        let (accepted, rejected): (StateSet, StateSet) =
            states.iter().partition(|state| accepting.contains(*state));
        Partition::from_blocks(vec![accepted, rejected])
    }

    pub fn blocks(&self) -> &[StateSet] {
        &self.blocks
    }

    pub fn block_of(&self, state: State) -> Option<usize> {
        self.block_of.get(&state).copied()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Outgoing symbols of `state` paired with the block of their
    /// destination. Destinations outside the partition are ignored.
    fn signature(&self, table: &TransitionTable, state: State) -> Vec<(char, usize)> {
        table
            .row(state)
            .filter_map(|(symbol, targets)| {
                let c = symbol.as_char()?;
                let target = targets.iter().next()?;
                Some((c, self.block_of(*target)?))
            })
            .collect()
    }

    /// One Moore round: split every block by signature.
    pub fn refine(&self, table: &TransitionTable) -> Partition {
        let mut blocks = Vec::with_capacity(self.blocks.len());
        for block in &self.blocks {
            let mut groups: BTreeMap<Vec<(char, usize)>, StateSet> = BTreeMap::new();
            for state in block {
                groups
                    .entry(self.signature(table, *state))
                    .or_default()
                    .insert(*state);
            }
            blocks.extend(groups.into_values());
        }
        Partition::from_blocks(blocks)
    }
}

/// States reachable from the start that can still reach an accepting state.
/// The start itself is always kept.
pub fn useful_states(dfa: &Dfa) -> StateSet {
    let reachable = dfa.table().reachable_from(dfa.start());
    let productive = dfa.table().co_reachable(dfa.accepting());
    let mut useful: StateSet = reachable.intersection(&productive).copied().collect();
    useful.insert(dfa.start());
    useful
}

/// Refine `partition` until a round splits nothing.
pub fn refine_to_fixpoint(mut partition: Partition, table: &TransitionTable) -> (Partition, usize) {
    let mut rounds = 0;
    loop {
        rounds += 1;
        let refined = partition.refine(table);
        trace!("round {}: {} -> {} blocks", rounds, partition.len(), refined.len());
        if refined.len() == partition.len() {
            return (refined, rounds);
        }
        partition = refined;
    }
}

/// Moore minimization. The result is renumbered breadth-first, so equivalent
/// automata minimize to identical tables.
pub fn minimize(dfa: &Dfa) -> Dfa {
    let useful = useful_states(dfa);
    let initial = Partition::initial(&useful, dfa.accepting());
    let (partition, rounds) = refine_to_fixpoint(initial, dfa.table());

    let Some(start_block) = partition.block_of(dfa.start()) else {
        return dfa.renumbered();
    };

    let mut table = TransitionTable::new();
    let mut accepting = StateSet::new();
    let mut origins: BTreeMap<State, StateSet> = BTreeMap::new();
    for (index, block) in partition.blocks().iter().enumerate() {
        let merged = State::from_index(index);
        table.add_state(merged);
        let Some(representative) = block.first() else {
            continue;
        };
        for (symbol, targets) in dfa.table().row(*representative) {
            if let (Symbol::Char(_), Some(target)) = (symbol, targets.iter().next()) {
                if let Some(destination) = partition.block_of(*target) {
                    table.set_transition(merged, symbol, State::from_index(destination));
                }
            }
        }
        if dfa.is_accepting(*representative) {
            accepting.insert(merged);
        }
        let members: StateSet = block
            .iter()
            .filter_map(|state| dfa.origin(*state))
            .flatten()
            .copied()
            .collect();
        if !members.is_empty() {
            origins.insert(merged, members);
        }
    }

    let minimized = Dfa::from_parts(table, State::from_index(start_block), accepting, origins);
    debug!(
        "moore minimization converged after {} rounds: {} -> {} states",
        rounds,
        dfa.state_count(),
        minimized.state_count()
    );
    minimized
}
