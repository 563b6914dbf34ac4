//! Builds each state's action row from its shifts and LALR lookaheads,
//! resolves shift/reduce and reduce/reduce conflicts via precedence and
//! associativity, and computes default reductions and unused-rule counts.
//!
//! Acceptance is not a third action kind: `final_state` already carries a
//! natural `Shift` on `$end` (its kernel item is `$accept -> goal . $end`),
//! and the state that shift targets carries a natural `Reduce` of rule 2.
//! A caller recognizes acceptance the way a generated driver does (byacc's
//! `YYFINAL`): shift on `$end` out of `final_state`, then reduce rule 2.

use crate::generator::GeneratorOptions;
use crate::grammar::Grammar;
use crate::lalr::LalrTables;
use crate::lr0::Lr0Automaton;
use crate::symbol::{Assoc, Sym, ERROR_SYMBOL};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Shift,
    Reduce,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suppressed {
    Live,
    /// A real ambiguity the grammar left to this resolution rule; counted
    /// in `sr_total`/`rr_total`.
    Conflict,
    /// Resolved outright by precedence/associativity; not counted as a
    /// conflict.
    Killed,
}

#[derive(Debug, Clone)]
pub struct Action {
    pub symbol: Sym,
    pub kind: ActionKind,
    /// Shift: target state. Reduce: rule number.
    pub number: usize,
    pub prec: i16,
    pub assoc: Assoc,
    pub suppressed: Suppressed,
}

impl Action {
    pub fn is_live(&self) -> bool {
        self.suppressed == Suppressed::Live
    }
}

pub struct ActionTable {
    pub actions: Vec<Vec<Action>>,
    pub defred: Vec<usize>,
    pub final_state: usize,
    pub rules_used: Vec<bool>,
    pub nunused: usize,
    pub sr_total: usize,
    pub rr_total: usize,
    pub sr_per_state: Vec<usize>,
    pub rr_per_state: Vec<usize>,
}

pub fn build(grammar: &Grammar, lr0: &Lr0Automaton, lalr: &LalrTables, options: &GeneratorOptions) -> ActionTable {
    let final_state = find_final_state(grammar, lr0);
    let nstates = lr0.nstates();

    let mut actions: Vec<Vec<Action>> = Vec::with_capacity(nstates);
    let mut sr_total = 0usize;
    let mut rr_total = 0usize;
    let mut sr_per_state = vec![0usize; nstates];
    let mut rr_per_state = vec![0usize; nstates];

    for state in 0..nstates {
        let mut row: Vec<Action> = Vec::new();

        for &target in &lr0.shifts[state] {
            let sym = lr0.accessing_symbol[target];
            if grammar.is_token(sym) {
                insert_action(&mut row, Action {
                    symbol: sym,
                    kind: ActionKind::Shift,
                    number: target,
                    prec: grammar.symbol_prec(sym),
                    assoc: grammar.symbol_assoc(sym),
                    suppressed: Suppressed::Live,
                });
            }
        }

        for slot in lalr.lookaheads[state]..lalr.lookaheads[state + 1] {
            let rule = lalr.la_rule[slot];
            for token in lalr.la.iter_row(slot) {
                insert_action(&mut row, Action {
                    symbol: token,
                    kind: ActionKind::Reduce,
                    number: rule,
                    prec: grammar.rprec(rule),
                    assoc: grammar.rassoc(rule),
                    suppressed: Suppressed::Live,
                });
            }
        }

        let (sr, rr) = resolve_conflicts(&mut row, options.lemon_prec_flag);
        sr_per_state[state] = sr;
        rr_per_state[state] = rr;
        sr_total += sr;
        rr_total += rr;

        actions.push(row);
    }

    let mut rules_used = vec![false; grammar.nrules()];
    for row in &actions {
        for a in row {
            if a.is_live() && a.kind == ActionKind::Reduce {
                rules_used[a.number] = true;
            }
        }
    }
    let nunused = (3..grammar.nrules()).filter(|&r| !rules_used[r]).count();

    let defred: Vec<usize> = actions.iter().map(|row| sole_reduction(row)).collect();

    ActionTable {
        actions,
        defred,
        final_state,
        rules_used,
        nunused,
        sr_total,
        rr_total,
        sr_per_state,
        rr_per_state,
    }
}

fn find_final_state(grammar: &Grammar, lr0: &Lr0Automaton) -> usize {
    lr0.shifts[0]
        .iter()
        .copied()
        .find(|&t| lr0.accessing_symbol[t] == grammar.goal())
        .expect("state 0 must shift on the goal symbol")
}

/// Inserts `new` keeping the row sorted ascending by symbol; within a
/// symbol, shift/accept sort before reduce, and reduces sort ascending by
/// rule number.
fn insert_action(actions: &mut Vec<Action>, new: Action) {
    let mut pos = 0;
    while pos < actions.len() && actions[pos].symbol < new.symbol {
        pos += 1;
    }
    while pos < actions.len()
        && actions[pos].symbol == new.symbol
        && actions[pos].kind != ActionKind::Reduce
    {
        pos += 1;
    }
    if new.kind == ActionKind::Reduce {
        while pos < actions.len()
            && actions[pos].symbol == new.symbol
            && actions[pos].kind == ActionKind::Reduce
            && actions[pos].number < new.number
        {
            pos += 1;
        }
    }
    actions.insert(pos, new);
}

/// Resolves same-symbol conflicts within one state's action row, returning
/// `(shift/reduce conflicts, reduce/reduce conflicts)` counted in this
/// state.
fn resolve_conflicts(actions: &mut [Action], lemon_prec_flag: bool) -> (usize, usize) {
    let mut sr = 0usize;
    let mut rr = 0usize;
    let mut i = 0;
    while i < actions.len() {
        let symbol = actions[i].symbol;
        let mut pref = i;
        let mut j = i + 1;
        while j < actions.len() && actions[j].symbol == symbol {
            match (actions[pref].kind, actions[j].kind) {
                (ActionKind::Shift, ActionKind::Reduce) => {
                    let (pprec, passoc) = (actions[pref].prec, actions[pref].assoc);
                    let cprec = actions[j].prec;
                    if pprec > 0 && cprec > 0 {
                        if pprec < cprec {
                            actions[pref].suppressed = Suppressed::Killed;
                            pref = j;
                        } else if pprec > cprec {
                            actions[j].suppressed = Suppressed::Killed;
                        } else {
                            match passoc {
                                Assoc::Left => {
                                    actions[pref].suppressed = Suppressed::Killed;
                                    pref = j;
                                }
                                Assoc::Right => {
                                    actions[j].suppressed = Suppressed::Killed;
                                }
                                Assoc::NonAssoc | Assoc::None | Assoc::Precedence => {
                                    actions[pref].suppressed = Suppressed::Killed;
                                    actions[j].suppressed = Suppressed::Killed;
                                }
                            }
                        }
                    } else {
                        sr += 1;
                        actions[j].suppressed = Suppressed::Conflict;
                    }
                }
                (ActionKind::Reduce, ActionKind::Reduce) => {
                    let pprec = actions[pref].prec;
                    let cprec = actions[j].prec;
                    let mut handled = false;
                    if lemon_prec_flag && pprec > 0 && cprec > 0 {
                        if pprec < cprec {
                            actions[pref].suppressed = Suppressed::Killed;
                            pref = j;
                            handled = true;
                        } else if pprec > cprec {
                            actions[j].suppressed = Suppressed::Killed;
                            handled = true;
                        }
                    }
                    if !handled {
                        rr += 1;
                        actions[j].suppressed = Suppressed::Conflict;
                    }
                }
                _ => unreachable!("a shift cannot follow a reduce for the same symbol"),
            }
            j += 1;
        }
        i = j;
    }
    (sr, rr)
}

/// A state defaults to a single reduction when every live action is a
/// reduce of the same rule, and at least one of those reduces is not on
/// the `error` token (an error-only default would swallow recovery).
fn sole_reduction(actions: &[Action]) -> usize {
    let mut count = 0usize;
    let mut ruleno = 0usize;
    for a in actions {
        if !a.is_live() {
            continue;
        }
        match a.kind {
            ActionKind::Shift => return 0,
            ActionKind::Reduce => {
                if ruleno != 0 && a.number != ruleno {
                    return 0;
                }
                if a.symbol != ERROR_SYMBOL {
                    count += 1;
                }
                ruleno = a.number;
            }
        }
    }
    if count == 0 {
        0
    } else {
        ruleno
    }
}
