use std::io::BufRead;

use log::debug;

use crate::{
    ast::AstNode,
    dfa::Dfa,
    export::AutomatonExport,
    nfa::Nfa,
    parser::{run_parse, SyntaxError},
    table::{read_transition_table, FormatError},
    utils::CompileFlags,
};

/// Decides membership of a whole input string.
pub trait Recognizer {
    fn accepts(&self, input: &str) -> bool;
}

impl Recognizer for Dfa {
    fn accepts(&self, input: &str) -> bool {
        let mut current = self.start();
        for c in input.chars() {
            match self.next(current, c) {
                Some(next) => current = next,
                None => return false,
            }
        }
        self.is_accepting(current)
    }
}

/// Intermediate results of a compilation, kept with
/// [`CompileFlags::KEEP_STAGES`].
#[derive(Debug, Clone)]
pub struct Stages {
    pub ast: AstNode,
    pub nfa: Nfa,
    pub dfa: Dfa,
}

#[derive(Debug, Clone)]
pub struct Matcher {
    pattern: Option<String>,
    flags: CompileFlags,
    dfa: Dfa,
    stages: Option<Stages>,
}

impl Matcher {
    pub fn new(pattern: &str) -> Result<Matcher, SyntaxError> {
        Matcher::with_flags(pattern, CompileFlags::default())
    }

    pub fn with_flags(pattern: &str, flags: CompileFlags) -> Result<Matcher, SyntaxError> {
        let ast = run_parse(pattern)?;
        let nfa = Nfa::from_ast(&ast);
        let dfa = Dfa::from_nfa(&nfa);
        let compiled = if flags.contains(CompileFlags::MINIMIZE) {
            dfa.minimize()
        } else {
            dfa.clone()
        };
        debug!(
            "compiled {:?}: {} nfa states, {} dfa states, {} final states",
            pattern,
            nfa.state_count(),
            dfa.state_count(),
            compiled.state_count()
        );
        let stages = if flags.contains(CompileFlags::KEEP_STAGES) {
            Some(Stages { ast, nfa, dfa })
        } else {
            None
        };
        Ok(Matcher {
            pattern: Some(String::from(pattern)),
            flags,
            dfa: compiled,
            stages,
        })
    }

    /// Wraps an existing automaton, e.g. one reloaded from its table form.
    pub fn from_dfa(dfa: Dfa) -> Matcher {
        Matcher {
            pattern: None,
            flags: CompileFlags::NO_FLAG,
            dfa,
            stages: None,
        }
    }

    pub fn load<R: BufRead>(reader: R) -> Result<Matcher, FormatError> {
        read_transition_table(reader).map(Matcher::from_dfa)
    }

    pub fn accepts(&self, input: &str) -> bool {
        self.dfa.accepts(input)
    }

    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_deref()
    }

    pub fn flags(&self) -> CompileFlags {
        self.flags
    }

    pub fn dfa(&self) -> &Dfa {
        &self.dfa
    }

    pub fn stages(&self) -> Option<&Stages> {
        self.stages.as_ref()
    }

    pub fn state_count(&self) -> usize {
        self.dfa.state_count()
    }

    pub fn export(&self) -> AutomatonExport {
        self.dfa.export()
    }
}

impl Recognizer for Matcher {
    fn accepts(&self, input: &str) -> bool {
        Matcher::accepts(self, input)
    }
}
