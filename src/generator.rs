//! The thin coordinating layer: owns a single run's configuration, drives
//! the five analytical stages in their fixed order, and assembles their
//! artifacts plus accumulated diagnostics into one return value.
//!
//! This replaces the source's process-wide singleton struct (see the
//! re-architecture notes) with one owned value constructed per run and
//! dropped normally at scope exit — every stage below receives only an
//! immutable borrow of what the previous stage produced.

use crate::action::{self, ActionTable};
use crate::error::GeneratorError;
use crate::grammar::{Grammar, GrammarInput};
use crate::lalr::{self, LalrTables};
use crate::lr0::{self, Lr0Automaton};
use crate::pack::{self, ParserTables};

/// Ambient configuration for one generation run. Threaded immutably through
/// every stage; no stage mutates it.
///
/// `%expect`/`%expect-rr` are not here: per §6's input contract they are
/// declared in the grammar source, so they travel with `GrammarInput`
/// (`sr_expect`/`rr_expect`) instead of being duplicated as run options.
#[derive(Debug, Clone, Default)]
pub struct GeneratorOptions {
    /// Enables lemon-style precedence-based reduce/reduce resolution
    /// instead of first-listed-wins. See `DESIGN.md` for the resolved
    /// open question on whether this belongs here versus a front-end flag.
    pub lemon_prec_flag: bool,
}

/// Non-fatal record of a completed run: conflict counts, unused rules, and
/// whether the grammar's declared expectations were met. Returned alongside
/// the tables rather than printed; a caller decides how (or whether) to
/// surface it.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    pub sr_total: usize,
    pub rr_total: usize,
    pub sr_per_state: Vec<usize>,
    pub rr_per_state: Vec<usize>,
    pub nunused: usize,
    pub rules_used: Vec<bool>,
    /// `true` iff an `%expect`/`%expect-rr` declaration was present and its
    /// count disagreed with the observed total. Tables are still emitted
    /// when this is set — only the caller's exit code should change.
    pub expectation_mismatch: bool,
}

/// Everything downstream consumers need: the packed tables plus the
/// per-state action rows they were derived from (a code generator wants
/// both — the dense tables to emit, the ordered rows to decide what each
/// state's default action means).
pub struct GeneratorOutput {
    pub grammar: Grammar,
    pub automaton: Lr0Automaton,
    pub lalr: LalrTables,
    pub actions: ActionTable,
    pub tables: ParserTables,
    pub diagnostics: Diagnostics,
}

/// Owns one end-to-end run of the pipeline:
/// `Grammar -> LR0 -> LALR -> ActionBuilder -> TablePacker`.
pub struct Generator {
    options: GeneratorOptions,
}

impl Generator {
    pub fn new(options: GeneratorOptions) -> Self {
        Generator { options }
    }

    pub fn run(&self, input: GrammarInput) -> Result<GeneratorOutput, GeneratorError> {
        let (sr_expect, rr_expect) = (input.sr_expect, input.rr_expect);
        let grammar = Grammar::build(input)?;
        let automaton = lr0::build(&grammar)?;
        let lalr = lalr::compute(&grammar, &automaton);
        let actions = action::build(&grammar, &automaton, &lalr, &self.options);
        let tables = pack::pack(&grammar, &lalr.goto, &actions);

        let expectation_mismatch =
            expectation_mismatch(sr_expect, rr_expect, actions.sr_total, actions.rr_total);

        let diagnostics = Diagnostics {
            sr_total: actions.sr_total,
            rr_total: actions.rr_total,
            sr_per_state: actions.sr_per_state.clone(),
            rr_per_state: actions.rr_per_state.clone(),
            nunused: actions.nunused,
            rules_used: actions.rules_used.clone(),
            expectation_mismatch,
        };

        Ok(GeneratorOutput { grammar, automaton, lalr, actions, tables, diagnostics })
    }
}

fn expectation_mismatch(
    sr_expect: Option<u32>,
    rr_expect: Option<u32>,
    sr_total: usize,
    rr_total: usize,
) -> bool {
    let sr_mismatch = sr_expect.is_some_and(|expected| expected as usize != sr_total);
    let rr_mismatch = rr_expect.is_some_and(|expected| expected as usize != rr_total);
    sr_mismatch || rr_mismatch
}
