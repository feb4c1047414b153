//! Regular expressions compiled to minimal deterministic automata.
//!
//! A pattern over literal characters with `|`, `*`, `+` and parentheses goes
//! through [`parser`], the Thompson construction in [`nfa`], subset
//! construction in [`dfa`] and Moore refinement in [`minimize`]. The result
//! decides whole-string membership and can be persisted through [`table`].

pub mod ast;
pub mod dfa;
pub mod export;
pub mod fsm;
pub mod lexer;
pub mod matching;
pub mod minimize;
pub mod nfa;
pub mod parser;
pub mod table;
pub mod utils;

pub use dfa::Dfa;
pub use matching::{Matcher, Recognizer};
pub use nfa::Nfa;
pub use parser::SyntaxError;
pub use table::FormatError;
pub use utils::CompileFlags;

/// Compile `pattern` into a minimized matcher.
pub fn compile(pattern: &str) -> Result<Matcher, SyntaxError> {
    Matcher::new(pattern)
}

pub fn compile_with_flags(pattern: &str, flags: CompileFlags) -> Result<Matcher, SyntaxError> {
    Matcher::with_flags(pattern, flags)
}

#[cfg(test)]
mod tests;
