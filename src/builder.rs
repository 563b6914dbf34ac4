//! Assembles a [`GrammarInput`] from named tokens/nonterminals and flat
//! (already BNF, not EBNF) productions, synthesizing the sentinel rules and
//! the augmented start rule the way a real grammar reader would hand them
//! to this crate.
//!
//! EBNF expansion (`a | b`, `a*`, `a?`, ...) is a front-end concern and not
//! reproduced here — callers pass already-flattened alternatives, one
//! `rule()` call per alternative.

use crate::error::GrammarError;
use crate::grammar::{Grammar, GrammarInput};
use crate::symbol::{Assoc, Sym, END_SYMBOL};

pub struct GrammarBuilder {
    token_names: Vec<String>,
    token_prec: Vec<i16>,
    token_assoc: Vec<Assoc>,
    var_names: Vec<String>,
    tokens_locked: bool,
    rules: Vec<PendingRule>,
}

struct PendingRule {
    lhs: Sym,
    rhs: Vec<Sym>,
    prec_override: Option<i16>,
    assoc_override: Option<Assoc>,
}

impl GrammarBuilder {
    pub fn new() -> Self {
        GrammarBuilder {
            token_names: vec!["$end".to_string(), "error".to_string()],
            token_prec: vec![0, 0],
            token_assoc: vec![Assoc::None, Assoc::None],
            var_names: Vec::new(),
            tokens_locked: false,
            rules: Vec::new(),
        }
    }

    pub fn token(&mut self, name: &str) -> Sym {
        assert!(!self.tokens_locked, "all tokens must be declared before any nonterminal or rule");
        let sym = self.token_names.len();
        self.token_names.push(name.to_string());
        self.token_prec.push(0);
        self.token_assoc.push(Assoc::None);
        sym
    }

    pub fn token_with_prec(&mut self, name: &str, prec: i16, assoc: Assoc) -> Sym {
        let sym = self.token(name);
        self.token_prec[sym] = prec;
        self.token_assoc[sym] = assoc;
        sym
    }

    pub fn nonterm(&mut self, name: &str) -> Sym {
        self.tokens_locked = true;
        let sym = self.token_names.len() + self.var_names.len();
        self.var_names.push(name.to_string());
        sym
    }

    pub fn rule(&mut self, lhs: Sym, rhs: Vec<Sym>) -> usize {
        self.tokens_locked = true;
        self.rules.push(PendingRule { lhs, rhs, prec_override: None, assoc_override: None });
        self.rules.len() - 1
    }

    pub fn rule_with_prec(&mut self, lhs: Sym, rhs: Vec<Sym>, prec: i16, assoc: Assoc) -> usize {
        self.tokens_locked = true;
        self.rules.push(PendingRule {
            lhs,
            rhs,
            prec_override: Some(prec),
            assoc_override: Some(assoc),
        });
        self.rules.len() - 1
    }

    pub fn build(self, goal: Sym) -> Result<Grammar, GrammarError> {
        let ntokens = self.token_names.len();
        let old_nvars = self.var_names.len();
        let nvars = old_nvars + 1; // one reserved slot for `$accept`
        let nsyms = ntokens + nvars;

        // `nonterm()` hands out ids in declaration order starting at
        // `ntokens`, with no slot reserved for `$accept`. Remap so `$accept`
        // gets its own slot (`ntokens`, never aliasing a real nonterminal)
        // and `goal` always lands immediately after it (`ntokens + 1`),
        // mirroring byacc's `pack_symbols`, which renumbers the declared
        // goal to `start_symbol + 1` before the automaton is built. This
        // also guarantees goto index 0 is always state 0's transition on
        // the goal symbol, which `lalr::compute` relies on when seeding
        // `$end` as a direct read there.
        let mut remap = vec![0usize; ntokens + old_nvars];
        for (t, slot) in remap.iter_mut().enumerate().take(ntokens) {
            *slot = t;
        }
        remap[goal] = ntokens + 1;
        let mut next_id = ntokens + 2;
        for old_id in ntokens..ntokens + old_nvars {
            if old_id != goal {
                remap[old_id] = next_id;
                next_id += 1;
            }
        }
        let remap_sym = |s: Sym| if s < ntokens { s } else { remap[s] };
        let goal = remap_sym(goal);

        // Keep external values stable even though we don't vary them here;
        // a real reader would assign these from the lexer's token enum.
        let symbol_value: Vec<i32> = (0..nsyms as i32).collect();
        let mut symbol_prec = self.token_prec.clone();
        let mut symbol_assoc = self.token_assoc.clone();
        symbol_prec.resize(nsyms, 0);
        symbol_assoc.resize(nsyms, Assoc::None);

        let nrules = self.rules.len() + 3;
        let mut rlhs = vec![END_SYMBOL; nrules];
        let mut rrhs = vec![0usize; nrules];
        let mut rprec = vec![0i16; nrules];
        let mut rassoc = vec![Assoc::None; nrules];
        let mut ritem: Vec<i32> = Vec::new();

        // Rules 0 and 1: unused sentinels, empty bodies.
        rrhs[0] = ritem.len();
        ritem.push(-1);
        rrhs[1] = ritem.len();
        ritem.push(-1);

        // Rule 2: the augmented rule `$accept : goal $end`.
        rlhs[2] = ntokens; // start_symbol, reserved, never a user nonterminal
        rrhs[2] = ritem.len();
        ritem.push(goal as i32);
        ritem.push(END_SYMBOL as i32);
        ritem.push(-2);

        for (i, pending) in self.rules.iter().enumerate() {
            let rule_no = i + 3;
            rlhs[rule_no] = remap_sym(pending.lhs);
            rrhs[rule_no] = ritem.len();
            for &sym in &pending.rhs {
                ritem.push(remap_sym(sym) as i32);
            }
            ritem.push(-(rule_no as i32));

            let (prec, assoc) = resolve_rule_prec(pending, &symbol_prec, &symbol_assoc, ntokens);
            rprec[rule_no] = prec;
            rassoc[rule_no] = assoc;
        }

        let input = GrammarInput {
            ntokens,
            nvars,
            symbol_value,
            symbol_prec,
            symbol_assoc,
            ritem,
            rlhs,
            rrhs,
            rprec,
            rassoc,
            goal,
            sr_expect: None,
            rr_expect: None,
        };
        Grammar::build(input)
    }
}

impl Default for GrammarBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn resolve_rule_prec(
    pending: &PendingRule,
    symbol_prec: &[i16],
    symbol_assoc: &[Assoc],
    ntokens: usize,
) -> (i16, Assoc) {
    if let (Some(prec), Some(assoc)) = (pending.prec_override, pending.assoc_override) {
        return (prec, assoc);
    }
    for &sym in pending.rhs.iter().rev() {
        if sym < ntokens && symbol_prec[sym] != 0 {
            return (symbol_prec[sym], symbol_assoc[sym]);
        }
    }
    (0, Assoc::None)
}
