//! Canonicalized grammar: symbol numbering, rule bodies, nullability and
//! the `first_derives` relation used to close item kernels.

use crate::bitset::BitMatrix;
use crate::error::GrammarError;
use crate::symbol::{Assoc, Sym, SymbolClass, END_SYMBOL};

/// The flattened arrays an external reader hands to this crate. Already
/// resolved: no names, no precedence declarations to chase, no EBNF sugar —
/// just rule bodies and per-symbol/per-rule scalars.
///
/// Invariants the caller must uphold (validated in `Grammar::build`):
/// - symbols `0..ntokens` are tokens, `ntokens..ntokens+nvars` are
///   nonterminals; symbol 0 is `$end`, symbol 1 is `error`.
/// - symbol `ntokens` is the synthetic `$accept`, reserved and never a
///   real (user-visible) nonterminal; `goal` is conventionally `ntokens + 1`
///   (`GrammarBuilder` renumbers to guarantee this; a hand-built
///   `GrammarInput` should do the same).
/// - `rlhs[0] == rlhs[1] == 0` (rules 0 and 1 are unused sentinels).
/// - rule 2 is the augmented rule `$accept : goal $end`.
/// - real rules begin at index 3.
/// - `ritem` lists every rule's RHS back to back, each terminated by a
///   single negative entry equal to `-(rule number)`.
/// - `$end` (symbol 0) never appears inside a user rule body (rule 2, the
///   augmented rule, legitimately contains it).
#[derive(Debug, Clone)]
pub struct GrammarInput {
    pub ntokens: usize,
    pub nvars: usize,
    pub symbol_value: Vec<i32>,
    pub symbol_prec: Vec<i16>,
    pub symbol_assoc: Vec<Assoc>,
    pub ritem: Vec<i32>,
    pub rlhs: Vec<Sym>,
    pub rrhs: Vec<usize>,
    pub rprec: Vec<i16>,
    pub rassoc: Vec<Assoc>,
    pub goal: Sym,
    pub sr_expect: Option<u32>,
    pub rr_expect: Option<u32>,
}

impl GrammarInput {
    pub fn nsyms(&self) -> usize {
        self.ntokens + self.nvars
    }

    pub fn nrules(&self) -> usize {
        self.rlhs.len()
    }

    pub fn class(&self, sym: Sym) -> SymbolClass {
        if sym < self.ntokens {
            SymbolClass::Token
        } else {
            SymbolClass::NonTerm
        }
    }
}

/// A canonicalized grammar plus its derived nullability and first-derives
/// relations, ready to seed an LR(0) automaton.
#[derive(Debug)]
pub struct Grammar {
    pub input: GrammarInput,
    nullable: Vec<bool>,
    derives: Vec<Vec<usize>>,
    first_derives: BitMatrix,
}

impl Grammar {
    pub fn build(input: GrammarInput) -> Result<Grammar, GrammarError> {
        validate(&input)?;
        let derives = compute_derives(&input);
        let nullable = compute_nullable(&input);
        let eff = compute_eff(&input, &derives);
        let first_derives = compute_first_derives(&input, &eff, &derives);
        Ok(Grammar { input, nullable, derives, first_derives })
    }

    pub fn ntokens(&self) -> usize {
        self.input.ntokens
    }

    pub fn nvars(&self) -> usize {
        self.input.nvars
    }

    pub fn nsyms(&self) -> usize {
        self.input.nsyms()
    }

    pub fn nrules(&self) -> usize {
        self.input.nrules()
    }

    pub fn goal(&self) -> Sym {
        self.input.goal
    }

    pub fn start_symbol(&self) -> Sym {
        self.input.ntokens
    }

    pub fn is_token(&self, sym: Sym) -> bool {
        sym < self.input.ntokens
    }

    pub fn is_var(&self, sym: Sym) -> bool {
        sym >= self.input.ntokens
    }

    pub fn var_index(&self, sym: Sym) -> usize {
        sym - self.input.ntokens
    }

    pub fn nullable(&self, sym: Sym) -> bool {
        self.nullable[sym]
    }

    pub fn ritem(&self) -> &[i32] {
        &self.input.ritem
    }

    pub fn rrhs(&self, rule: usize) -> usize {
        self.input.rrhs[rule]
    }

    pub fn rlhs(&self, rule: usize) -> Sym {
        self.input.rlhs[rule]
    }

    pub fn rprec(&self, rule: usize) -> i16 {
        self.input.rprec[rule]
    }

    pub fn rassoc(&self, rule: usize) -> Assoc {
        self.input.rassoc[rule]
    }

    pub fn symbol_value(&self, sym: Sym) -> i32 {
        self.input.symbol_value[sym]
    }

    pub fn symbol_prec(&self, sym: Sym) -> i16 {
        self.input.symbol_prec[sym]
    }

    pub fn symbol_assoc(&self, sym: Sym) -> Assoc {
        self.input.symbol_assoc[sym]
    }

    /// Rules deriving the given nonterminal, ascending.
    pub fn derives(&self, sym: Sym) -> &[usize] {
        &self.derives[self.var_index(sym)]
    }

    /// The kernel of state 0: one item per rule deriving the start symbol
    /// (in practice just the augmented rule).
    pub fn start_kernel(&self) -> Vec<i32> {
        let mut items: Vec<i32> = self
            .derives(self.start_symbol())
            .iter()
            .map(|&r| self.rrhs(r) as i32)
            .collect();
        items.sort_unstable();
        items
    }

    /// Computes the closure of an item kernel (sorted `ritem` positions),
    /// returning the full sorted item set including the kernel itself.
    ///
    /// Mirrors the dotted-item closure: every kernel item whose symbol past
    /// the dot is a nonterminal pulls in every rule reachable from it via
    /// `first_derives`, merged back into the kernel in ascending order so
    /// closure is idempotent.
    pub fn closure(&self, nucleus: &[i32]) -> Vec<i32> {
        let mut ruleset = vec![false; self.nrules()];
        for &pos in nucleus {
            let sym = self.input.ritem[pos as usize];
            if sym >= 0 {
                let sym = sym as usize;
                if self.is_var(sym) {
                    let a = self.var_index(sym);
                    for r in self.first_derives.iter_row(a) {
                        ruleset[r] = true;
                    }
                }
            }
        }

        let mut result = Vec::with_capacity(nucleus.len());
        let mut csp = 0usize;
        for (r, &in_set) in ruleset.iter().enumerate() {
            if !in_set {
                continue;
            }
            let itemno = self.rrhs(r) as i32;
            while csp < nucleus.len() && nucleus[csp] < itemno {
                result.push(nucleus[csp]);
                csp += 1;
            }
            result.push(itemno);
            while csp < nucleus.len() && nucleus[csp] == itemno {
                csp += 1;
            }
        }
        while csp < nucleus.len() {
            result.push(nucleus[csp]);
            csp += 1;
        }
        result
    }
}

fn validate(input: &GrammarInput) -> Result<(), GrammarError> {
    if input.nrules() < 3 {
        return Err(GrammarError::NoRules);
    }
    if input.rlhs[0] != END_SYMBOL || input.rlhs[1] != END_SYMBOL {
        return Err(GrammarError::SentinelRuleMismatch);
    }
    if input.rlhs[2] != input.ntokens {
        return Err(GrammarError::AugmentedRuleMismatch);
    }
    if input.class(input.goal) != SymbolClass::NonTerm {
        return Err(GrammarError::GoalNotNonTerm);
    }
    for rule in 0..input.nrules() {
        let mut pos = input.rrhs[rule];
        loop {
            if pos >= input.ritem.len() {
                return Err(GrammarError::RuleNotTerminated(rule));
            }
            let entry = input.ritem[pos];
            if entry < 0 {
                break;
            }
            // Rule 2 is the augmented rule `$accept : goal $end` and is the
            // one legitimate place `$end` appears in a rule body; the check
            // below applies to user rules only.
            if rule != 2 && entry as usize == END_SYMBOL {
                return Err(GrammarError::EndTokenInRuleBody(rule));
            }
            if entry as usize >= input.nsyms() {
                return Err(GrammarError::SymbolOutOfRange { rule, symbol: entry });
            }
            pos += 1;
        }
    }
    Ok(())
}

fn compute_derives(input: &GrammarInput) -> Vec<Vec<usize>> {
    let mut derives = vec![Vec::new(); input.nvars];
    for r in 0..input.nrules() {
        let lhs = input.rlhs[r];
        if input.class(lhs) == SymbolClass::NonTerm {
            derives[lhs - input.ntokens].push(r);
        }
    }
    derives
}

fn compute_nullable(input: &GrammarInput) -> Vec<bool> {
    let mut nullable = vec![false; input.nsyms()];
    loop {
        let mut changed = false;
        for r in 0..input.nrules() {
            let lhs = input.rlhs[r];
            if input.class(lhs) != SymbolClass::NonTerm || nullable[lhs] {
                continue;
            }
            let mut pos = input.rrhs[r];
            let mut all_nullable = true;
            while input.ritem[pos] >= 0 {
                if !nullable[input.ritem[pos] as usize] {
                    all_nullable = false;
                    break;
                }
                pos += 1;
            }
            if all_nullable {
                nullable[lhs] = true;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    nullable
}

/// Epsilon-free firsts: `EFF[A][B]` iff `B` can be the first symbol derived
/// from `A` without going through an intermediate reduction to empty.
fn compute_eff(input: &GrammarInput, derives: &[Vec<usize>]) -> BitMatrix {
    let mut eff = BitMatrix::new(input.nvars, input.nvars);
    for a in 0..input.nvars {
        for &r in &derives[a] {
            let start = input.rrhs[r];
            let first = input.ritem[start];
            if first >= 0 {
                let first = first as usize;
                if input.class(first) == SymbolClass::NonTerm {
                    eff.set(a, first - input.ntokens);
                }
            }
        }
    }
    eff.reflexive_transitive_closure();
    eff
}

fn compute_first_derives(input: &GrammarInput, eff: &BitMatrix, derives: &[Vec<usize>]) -> BitMatrix {
    let mut fd = BitMatrix::new(input.nvars, input.nrules());
    for a in 0..input.nvars {
        for b in eff.iter_row(a) {
            for &r in &derives[b] {
                fd.set(a, r);
            }
        }
    }
    fd
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GrammarBuilder;

    fn expr_grammar() -> Grammar {
        // E -> E + T | T
        // T -> n
        let mut b = GrammarBuilder::new();
        let n = b.token("n");
        let plus = b.token("+");
        let e = b.nonterm("E");
        let t = b.nonterm("T");
        b.rule(e, vec![e, plus, t]);
        b.rule(e, vec![t]);
        b.rule(t, vec![n]);
        b.build(e).expect("valid grammar")
    }

    #[test]
    fn nullable_empty_rule_propagates() {
        let mut b = GrammarBuilder::new();
        let a = b.token("a");
        let s = b.nonterm("S");
        let l = b.nonterm("L");
        b.rule(s, vec![l]);
        b.rule(l, vec![]);
        b.rule(l, vec![l, a]);
        let g = b.build(s).expect("valid grammar");
        assert!(g.nullable(l));
        assert!(g.nullable(s));
        assert!(!g.nullable(a));
    }

    #[test]
    fn closure_is_idempotent() {
        let g = expr_grammar();
        let kernel = g.start_kernel();
        let once = g.closure(&kernel);
        let twice = g.closure(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn closure_includes_augmented_rule_and_its_alternatives() {
        let g = expr_grammar();
        let kernel = g.start_kernel();
        let closed = g.closure(&kernel);
        // Every rule deriving E (E->E+T and E->T) must contribute an item.
        assert!(closed.len() >= kernel.len() + 2);
    }
}
