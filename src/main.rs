use std::fs::File;
use std::io::{self, stdout, BufReader, Write};
use std::process;

use clap::{App, Arg};
use log::info;

use reg_dfa::table::{write_state_numbering, write_transition_table};
use reg_dfa::{CompileFlags, Matcher};

fn fail(code: i32, message: &str) -> ! {
    eprintln!("{}", message);
    process::exit(code)
}

fn main() {
    env_logger::init();

    let matches = App::new("reg_dfa")
        .version("0.1")
        .about("Compile a regular expression to a minimal DFA and test inputs against it.")
        .arg(
            Arg::with_name("no_minimize")
                .long("no-minimize")
                .help("Match with the subset construction output, skipping minimization."),
        )
        .arg(
            Arg::with_name("dot")
                .long("dot")
                .takes_value(true)
                .possible_values(&["ast", "nfa", "dfa", "min"])
                .help("Print the parse tree or an automaton as GraphViz Dot code."),
        )
        .arg(
            Arg::with_name("table")
                .long("table")
                .help("Print the transition table of the matching automaton."),
        )
        .arg(
            Arg::with_name("numbering")
                .long("numbering")
                .help("Print which NFA states every DFA state stands for."),
        )
        .arg(
            Arg::with_name("load")
                .long("load")
                .takes_value(true)
                .value_name("FILE")
                .help("Read a transition table instead of compiling a pattern. \
                       Every positional argument is then an input."),
        )
        .arg(
            Arg::with_name("regex")
                .help("The pattern to compile.")
                .required_unless("load"),
        )
        .arg(
            Arg::with_name("input")
                .multiple(true)
                .help("Strings to test for a whole match."),
        )
        .get_matches();

    let minimize = !matches.is_present("no_minimize");
    let dot = matches.value_of("dot");
    let mut inputs: Vec<&str> = matches.values_of("input").map(|v| v.collect()).unwrap_or_default();

    let matcher = match matches.value_of("load") {
        Some(path) => {
            if let Some(regex) = matches.value_of("regex") {
                inputs.insert(0, regex);
            }
            let file = File::open(path)
                .unwrap_or_else(|err| fail(2, &format!("could not open {}: {}", path, err)));
            let matcher = Matcher::load(BufReader::new(file))
                .unwrap_or_else(|err| fail(2, &format!("{}: {}", path, err)));
            info!("loaded {} states from {}", matcher.state_count(), path);
            matcher
        }
        None => {
            let pattern = matches.value_of("regex").unwrap_or_default();
            let mut flags = CompileFlags::KEEP_STAGES;
            if minimize {
                flags |= CompileFlags::MINIMIZE;
            }
            Matcher::with_flags(pattern, flags).unwrap_or_else(|err| fail(1, &err.render(pattern)))
        }
    };

    let out = stdout();
    let report = Report {
        dot,
        numbering: matches.is_present("numbering"),
        table: matches.is_present("table"),
    };
    if let Err(err) = report.write(&matcher, &inputs, &mut out.lock()) {
        fail(2, &format!("could not write output: {}", err));
    }
}

struct Report<'a> {
    dot: Option<&'a str>,
    numbering: bool,
    table: bool,
}

impl<'a> Report<'a> {
    fn write<W: Write>(&self, matcher: &Matcher, inputs: &[&str], out: &mut W) -> io::Result<()> {
        match (self.dot, matcher.stages()) {
            (None, _) => {}
            (Some("ast"), Some(stages)) => write!(out, "{}", stages.ast.to_dot())?,
            (Some("ast"), None) => fail(2, "a loaded table has no parse tree to draw"),
            (Some("nfa"), Some(stages)) => write!(out, "{}", stages.nfa.to_dot())?,
            (Some("nfa"), None) => fail(2, "a loaded table has no NFA to draw"),
            (Some("dfa"), Some(stages)) => write!(out, "{}", stages.dfa.export().to_dot())?,
            (Some("dfa"), None) => write!(out, "{}", matcher.export().to_dot())?,
            (Some(_), _) => write!(out, "{}", matcher.dfa().minimize().export().to_dot())?,
        }
        if self.numbering {
            write_state_numbering(matcher.dfa(), &mut *out)?;
        }
        if self.table {
            write_transition_table(matcher.dfa(), &mut *out)?;
        }
        for input in inputs {
            if matcher.accepts(input) {
                writeln!(out, "Matched")?;
            } else {
                writeln!(out, "Not Matched")?;
            }
        }
        Ok(())
    }
}
