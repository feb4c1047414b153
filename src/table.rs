//! Tabular persistence of a DFA.
//!
//! Two comma separated tables are written: a state numbering table
//! (`state,number`) and a transition table with one row per transition:
//!
//! ```text
//! state,symbol,next_state,is_start,is_accepting
//! 0,a,1,true,false
//! 1,,,false,true
//! ```
//!
//! A state without outgoing transitions gets a single row with empty
//! `symbol` and `next_state` so its flags survive. Only the transition table
//! is needed to rebuild the automaton.

use std::{
    collections::BTreeMap,
    error::Error,
    fmt::Display,
    io::{self, BufRead, Write},
};

use log::debug;
use nom::{
    branch::alt,
    bytes::complete::{tag, take_till},
    character::complete::{char, line_ending, none_of},
    combinator::{map, value},
    multi::{fold_many0, separated_list1},
    sequence::delimited,
    IResult,
};

use crate::{
    dfa::Dfa,
    fsm::{State, StateSet, Symbol, TransitionTable},
};

pub const TRANSITION_HEADER: [&str; 5] = ["state", "symbol", "next_state", "is_start", "is_accepting"];
pub const NUMBERING_HEADER: [&str; 2] = ["state", "number"];

#[derive(Debug)]
pub enum FormatError {
    Io(io::Error),
    MissingHeader,
    InvalidHeader(Vec<String>),
    ColumnCount { row: usize, found: usize },
    InvalidField { row: usize, column: &'static str, value: String },
    MalformedRow { row: usize },
    MissingStart,
    ConflictingStart { row: usize },
    NonDeterministic { row: usize },
}

impl Display for FormatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "could not read table: {}", err),
            Self::MissingHeader => write!(f, "table is empty, expected a header row"),
            Self::InvalidHeader(found) => write!(
                f,
                "invalid header {:?}, expected {:?}",
                found, TRANSITION_HEADER
            ),
            Self::ColumnCount { row, found } => write!(
                f,
                "row {}: expected {} columns, found {}",
                row,
                TRANSITION_HEADER.len(),
                found
            ),
            Self::InvalidField { row, column, value } => {
                write!(f, "row {}: invalid {} {:?}", row, column, value)
            }
            Self::MalformedRow { row } => write!(f, "row {}: malformed field", row),
            Self::MissingStart => write!(f, "no row marks a start state"),
            Self::ConflictingStart { row } => {
                write!(f, "row {}: a different start state was already given", row)
            }
            Self::NonDeterministic { row } => write!(
                f,
                "row {}: state already has a different destination for this symbol",
                row
            ),
        }
    }
}

impl Error for FormatError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for FormatError {
    fn from(err: io::Error) -> Self {
        FormatError::Io(err)
    }
}

fn write_field<W: Write>(writer: &mut W, symbol: char) -> io::Result<()> {
    match symbol {
        '"' => write!(writer, "\"\"\"\""),
        ',' | '\n' | '\r' => write!(writer, "\"{}\"", symbol),
        _ => write!(writer, "{}", symbol),
    }
}

pub fn write_state_numbering<W: Write>(dfa: &Dfa, mut writer: W) -> io::Result<()> {
    writeln!(writer, "{}", NUMBERING_HEADER.join(","))?;
    for row in dfa.export().states {
        match row.label {
            Some(label) => writeln!(writer, "{},{}", label, row.state)?,
            None => writeln!(writer, "{},{}", row.state, row.state)?,
        }
    }
    Ok(())
}

pub fn write_transition_table<W: Write>(dfa: &Dfa, mut writer: W) -> io::Result<()> {
    writeln!(writer, "{}", TRANSITION_HEADER.join(","))?;
    for row in dfa.export().states {
        if row.transitions.is_empty() {
            writeln!(
                writer,
                "{},,,{},{}",
                row.state, row.is_start, row.is_accepting
            )?;
        }
        for (symbol, next) in &row.transitions {
            write!(writer, "{},", row.state)?;
            write_field(&mut writer, *symbol)?;
            writeln!(writer, ",{},{},{}", next, row.is_start, row.is_accepting)?;
        }
    }
    Ok(())
}

pub fn to_transition_table(dfa: &Dfa) -> String {
    let mut buffer = Vec::new();
    // writing into a Vec cannot fail
    let _ = write_transition_table(dfa, &mut buffer);
    String::from_utf8_lossy(&buffer).into_owned()
}

fn quoted_field(input: &str) -> IResult<&str, String> {
    delimited(
        char('"'),
        fold_many0(
            alt((none_of("\""), value('"', tag("\"\"")))),
            String::new,
            |mut acc: String, c: char| {
                acc.push(c);
                acc
            },
        ),
        char('"'),
    )(input)
}

fn plain_field(input: &str) -> IResult<&str, String> {
    map(take_till(|c: char| c == ',' || c == '\n' || c == '\r'), String::from)(input)
}

fn record(input: &str) -> IResult<&str, Vec<String>> {
    separated_list1(char(','), alt((quoted_field, plain_field)))(input)
}

fn records(input: &str) -> IResult<&str, Vec<Vec<String>>> {
    separated_list1(line_ending, record)(input)
}

fn parse_state(row: usize, column: &'static str, field: &str) -> Result<State, FormatError> {
    field
        .parse::<u32>()
        .map(|index| State::from_index(index as usize))
        .map_err(|_| FormatError::InvalidField {
            row,
            column,
            value: String::from(field),
        })
}

fn parse_flag(row: usize, column: &'static str, field: &str) -> Result<bool, FormatError> {
    match field {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(FormatError::InvalidField {
            row,
            column,
            value: String::from(field),
        }),
    }
}

fn parse_transition(
    row: usize,
    symbol: &str,
    next: &str,
) -> Result<Option<(char, State)>, FormatError> {
    let mut chars = symbol.chars();
    match (chars.next(), chars.next(), next.is_empty()) {
        (None, _, true) => Ok(None),
        (Some(c), None, false) => Ok(Some((c, parse_state(row, "next_state", next)?))),
        (None, _, false) | (Some(_), Some(_), _) => Err(FormatError::InvalidField {
            row,
            column: "symbol",
            value: String::from(symbol),
        }),
        (Some(_), None, true) => Err(FormatError::InvalidField {
            row,
            column: "next_state",
            value: String::from(next),
        }),
    }
}

pub fn parse_transition_table(input: &str) -> Result<Dfa, FormatError> {
    let (rest, rows) = records(input).map_err(|_| FormatError::MalformedRow { row: 1 })?;
    if !rest.is_empty() {
        return Err(FormatError::MalformedRow { row: rows.len() });
    }

    let mut rows = rows
        .into_iter()
        .enumerate()
        .map(|(index, fields)| (index + 1, fields))
        .filter(|(_, fields)| !(fields.len() == 1 && fields[0].is_empty()));

    let (header_row, header) = rows.next().ok_or(FormatError::MissingHeader)?;
    if header.len() != TRANSITION_HEADER.len() {
        return Err(FormatError::ColumnCount {
            row: header_row,
            found: header.len(),
        });
    }
    if header.iter().zip(TRANSITION_HEADER).any(|(found, expected)| found != expected) {
        return Err(FormatError::InvalidHeader(header));
    }

    let mut table = TransitionTable::new();
    let mut start: Option<State> = None;
    let mut accepting = StateSet::new();
    let mut count = 0;
    for (row, fields) in rows {
        if fields.len() != TRANSITION_HEADER.len() {
            return Err(FormatError::ColumnCount {
                row,
                found: fields.len(),
            });
        }
        let state = parse_state(row, "state", &fields[0])?;
        let transition = parse_transition(row, &fields[1], &fields[2])?;
        let is_start = parse_flag(row, "is_start", &fields[3])?;
        let is_accepting = parse_flag(row, "is_accepting", &fields[4])?;

        table.add_state(state);
        if let Some((c, next)) = transition {
            match table.next(state, Symbol::Char(c)) {
                Some(existing) if existing != next => {
                    return Err(FormatError::NonDeterministic { row })
                }
                _ => table.set_transition(state, Symbol::Char(c), next),
            }
        }
        if is_start {
            match start {
                Some(existing) if existing != state => {
                    return Err(FormatError::ConflictingStart { row })
                }
                _ => start = Some(state),
            }
        }
        if is_accepting {
            accepting.insert(state);
        }
        count += 1;
    }

    let start = start.ok_or(FormatError::MissingStart)?;
    let dfa = Dfa::from_parts(table, start, accepting, BTreeMap::new());
    debug!("loaded {} table rows into {} dfa states", count, dfa.state_count());
    Ok(dfa)
}

pub fn read_transition_table<R: BufRead>(mut reader: R) -> Result<Dfa, FormatError> {
    let mut input = String::new();
    reader.read_to_string(&mut input)?;
    parse_transition_table(&input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::{Matcher, Recognizer};

    fn minimized(pattern: &str) -> Dfa {
        Matcher::new(pattern).unwrap().dfa().clone()
    }

    #[test]
    fn writes_one_row_per_transition() {
        let text = to_transition_table(&minimized("ab*"));
        assert_eq!(
            text,
            "state,symbol,next_state,is_start,is_accepting\n\
             0,a,1,true,false\n\
             1,b,1,false,true\n"
        );
    }

    #[test]
    fn terminal_states_get_a_flag_row() {
        let text = to_transition_table(&minimized("a"));
        assert!(text.ends_with("1,,,false,true\n"));
    }

    #[test]
    fn numbering_uses_nfa_labels() {
        let mut buffer = Vec::new();
        write_state_numbering(&minimized("a"), &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "state,number");
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("{s") && lines[1].ends_with("},0"));
    }

    #[test]
    fn round_trip_reproduces_canonical_dfa() {
        for pattern in ["(a|b)*abb", "a|b", "(x|y)+z*", "a"] {
            let compiled = minimized(pattern);
            let loaded = parse_transition_table(&to_transition_table(&compiled)).unwrap();
            assert_eq!(loaded.table(), compiled.table(), "{}", pattern);
            assert_eq!(loaded.start(), compiled.start());
            assert_eq!(loaded.accepting(), compiled.accepting());
            assert!(loaded.origins().is_empty());
        }
    }

    #[test]
    fn special_symbols_are_quoted() {
        let compiled = minimized("(,|\")+");
        let text = to_transition_table(&compiled);
        assert!(text.contains("0,\",\",1"));
        assert!(text.contains("0,\"\"\"\",1"));
        let loaded = parse_transition_table(&text).unwrap();
        assert!(loaded.accepts(",\",,"));
        assert!(!loaded.accepts(""));
    }

    #[test]
    fn reader_accepts_crlf_and_blank_lines() {
        let text = "state,symbol,next_state,is_start,is_accepting\r\n\
                    0,a,1,true,false\r\n\
                    \r\n\
                    1,,,false,true\r\n";
        let dfa = read_transition_table(text.as_bytes()).unwrap();
        assert!(dfa.accepts("a"));
        assert!(!dfa.accepts("aa"));
    }

    #[test]
    fn unreachable_rows_are_dropped() {
        let text = "state,symbol,next_state,is_start,is_accepting\n\
                    7,a,3,true,false\n\
                    3,,,false,true\n\
                    9,b,3,false,false\n";
        let dfa = parse_transition_table(text).unwrap();
        assert_eq!(dfa.state_count(), 2);
        assert_eq!(dfa.start().index(), 0);
        assert!(dfa.accepts("a"));
    }

    #[test]
    fn wrong_column_count_is_rejected() {
        let text = "state,symbol,next_state,is_start,is_accepting\n0,a,1,true\n";
        assert!(matches!(
            parse_transition_table(text),
            Err(FormatError::ColumnCount { row: 2, found: 4 })
        ));
        let text = "state,symbol,next_state,is_start,is_accepting\n0,a,1,true,false,x\n";
        assert!(matches!(
            parse_transition_table(text),
            Err(FormatError::ColumnCount { row: 2, found: 6 })
        ));
    }

    #[test]
    fn malformed_tables_are_rejected() {
        assert!(matches!(parse_transition_table(""), Err(FormatError::MissingHeader)));
        assert!(matches!(
            parse_transition_table("\n\nstate,symbol\n"),
            Err(FormatError::ColumnCount { row: 3, found: 2 })
        ));
        assert!(matches!(
            parse_transition_table("a,b,c,d,e\n"),
            Err(FormatError::InvalidHeader(_))
        ));

        let header = "state,symbol,next_state,is_start,is_accepting\n";
        let cases = [
            ("x,a,1,true,false\n", "state"),
            ("0,ab,1,true,false\n", "symbol"),
            ("0,,1,true,false\n", "symbol"),
            ("0,a,,true,false\n", "next_state"),
            ("0,a,1,yes,false\n", "is_start"),
            ("0,a,1,true,no\n", "is_accepting"),
        ];
        for (body, expected) in cases {
            match parse_transition_table(&format!("{}{}", header, body)) {
                Err(FormatError::InvalidField { row: 2, column, .. }) => {
                    assert_eq!(column, expected, "{}", body)
                }
                other => panic!("unexpected result for {:?}: {:?}", body, other),
            }
        }

        assert!(matches!(
            parse_transition_table(&format!("{}0,a,1,false,false\n", header)),
            Err(FormatError::MissingStart)
        ));
        assert!(matches!(
            parse_transition_table(&format!("{}0,a,1,true,false\n1,a,0,true,true\n", header)),
            Err(FormatError::ConflictingStart { row: 3 })
        ));
        assert!(matches!(
            parse_transition_table(&format!("{}0,a,1,true,false\n0,a,2,true,false\n", header)),
            Err(FormatError::NonDeterministic { row: 3 })
        ));
        assert!(matches!(
            parse_transition_table(&format!("{}0,\"a\"b,1,true,false\n", header)),
            Err(FormatError::MalformedRow { row: 2 })
        ));
    }

    #[test]
    fn loaded_matcher_behaves_like_compiled() {
        let compiled = Matcher::new("(a|b)*abb").unwrap();
        let text = to_transition_table(compiled.dfa());
        let loaded = Matcher::load(text.as_bytes()).unwrap();
        for input in ["abb", "babb", "aabbabb", "ab", "", "abbb"] {
            assert_eq!(loaded.accepts(input), compiled.accepts(input), "{}", input);
        }
    }
}
