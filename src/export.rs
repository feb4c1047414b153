//! Read-only view of a DFA for renderers and the table writer.

use std::collections::BTreeMap;

use itertools::Itertools;

use crate::{dfa::Dfa, fsm::format_state_set};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateRow {
    pub state: usize,
    /// NFA states this state was built from, when known.
    pub label: Option<String>,
    pub is_start: bool,
    pub is_accepting: bool,
    pub transitions: BTreeMap<char, usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutomatonExport {
    pub states: Vec<StateRow>,
}

impl Dfa {
    pub fn export(&self) -> AutomatonExport {
        let states = self
            .table()
            .states()
            .map(|state| StateRow {
                state: state.index(),
                label: self.origin(state).map(format_state_set),
                is_start: state == self.start(),
                is_accepting: self.is_accepting(state),
                transitions: self
                    .table()
                    .row(state)
                    .filter_map(|(symbol, targets)| {
                        Some((symbol.as_char()?, targets.iter().next()?.index()))
                    })
                    .collect(),
            })
            .collect();
        AutomatonExport { states }
    }
}

impl AutomatonExport {
    pub fn start(&self) -> Option<usize> {
        self.states.iter().find(|row| row.is_start).map(|row| row.state)
    }

    pub fn accepting(&self) -> Vec<usize> {
        self.states
            .iter()
            .filter(|row| row.is_accepting)
            .map(|row| row.state)
            .collect()
    }

    pub fn transition_count(&self) -> usize {
        self.states.iter().map(|row| row.transitions.len()).sum()
    }

    /// GraphViz Dot code; the start is marked by an edge from a point node.
    pub fn to_dot(&self) -> String {
        let nodes = self
            .states
            .iter()
            .map(|row| {
                let shape = if row.is_accepting {
                    "doublecircle"
                } else {
                    "circle"
                };
                format!("    node [shape = {}]; {};\n", shape, row.state)
            })
            .join("");
        let edges = self
            .states
            .iter()
            .flat_map(|row| {
                row.transitions.iter().map(move |(symbol, next)| {
                    format!(
                        "    {} -> {} [ label = \"{}\" ];\n",
                        row.state,
                        next,
                        symbol.escape_default()
                    )
                })
            })
            .join("");
        let start = self
            .start()
            .map(|state| format!("    startH -> {};\n", state))
            .unwrap_or_default();
        format!(
            "digraph DFA {{\n    rankdir=LR;\n    size=\"8,5\"\n    node [shape = point ]; startH\n{}{}{}}}\n",
            nodes, edges, start
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::matching::Matcher;

    #[test]
    fn rows_describe_the_automaton() {
        let export = Matcher::new("ab*").unwrap().export();
        assert_eq!(export.states.len(), 2);
        assert_eq!(export.start(), Some(0));
        assert_eq!(export.accepting(), vec![1]);

        let start = &export.states[0];
        assert!(start.is_start && !start.is_accepting);
        assert_eq!(start.transitions.get(&'a'), Some(&1));
        assert_eq!(export.states[1].transitions.get(&'b'), Some(&1));
        assert_eq!(export.transition_count(), 2);
        assert!(start.label.as_deref().unwrap().starts_with("{s"));
    }

    #[test]
    fn dot_has_start_marker_and_accepting_shape() {
        let dot = Matcher::new("a|b").unwrap().export().to_dot();
        assert!(dot.starts_with("digraph DFA {"));
        assert!(dot.contains("node [shape = doublecircle]; 1;"));
        assert!(dot.contains("startH -> 0;"));
        assert!(dot.contains("0 -> 1 [ label = \"a\" ];"));
        assert!(dot.contains("0 -> 1 [ label = \"b\" ];"));
    }

    #[test]
    fn dot_escapes_quotes() {
        let dot = Matcher::new("\"").unwrap().export().to_dot();
        assert!(dot.contains("label = \"\\\"\""));
    }
}
