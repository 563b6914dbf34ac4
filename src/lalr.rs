//! LALR(1) lookahead via the DeRemer-Pennello digraph algorithm: goto-map
//! construction, the `reads`/`includes` relations, lookback edges, and the
//! two digraph solves (direct-reads-closure, then Follow) that feed the
//! final per-reduction lookahead sets.

use crate::bitset::BitMatrix;
use crate::grammar::Grammar;
use crate::lr0::Lr0Automaton;
use crate::symbol::{Sym, END_SYMBOL};

/// `goto(state, A)` entries, bucketed by nonterminal so a `(state, A)` pair
/// can be mapped to its goto index by binary search.
pub struct GotoTable {
    pub from_state: Vec<usize>,
    pub to_state: Vec<usize>,
    goto_map: Vec<usize>, // len nvars + 1, indexed by var_index
}

impl GotoTable {
    pub fn ngotos(&self) -> usize {
        self.from_state.len()
    }

    /// Goto indices `[goto_map[v], goto_map[v + 1])` for nonterminal
    /// `var_index`, used by table packing to build one goto column per
    /// nonterminal.
    pub fn range(&self, var_index: usize) -> std::ops::Range<usize> {
        self.goto_map[var_index]..self.goto_map[var_index + 1]
    }

    /// Binary search for the goto index of `(state, symbol)`. `symbol` must
    /// be a nonterminal that is shifted somewhere out of `state`.
    pub fn map_goto(&self, grammar: &Grammar, state: usize, symbol: Sym) -> usize {
        let v = grammar.var_index(symbol);
        let mut low = self.goto_map[v] as isize;
        let mut high = self.goto_map[v + 1] as isize - 1;
        loop {
            debug_assert!(low <= high, "no goto recorded for ({state}, {symbol})");
            let mid = (low + high) / 2;
            let s = self.from_state[mid as usize];
            if s == state {
                return mid as usize;
            } else if s < state {
                low = mid + 1;
            } else {
                high = mid - 1;
            }
        }
    }
}

pub fn build_goto_table(grammar: &Grammar, lr0: &Lr0Automaton) -> GotoTable {
    let nvars = grammar.nvars();
    let mut counts = vec![0usize; nvars];
    for state in 0..lr0.nstates() {
        for &target in &lr0.shifts[state] {
            let sym = lr0.accessing_symbol[target];
            if grammar.is_var(sym) {
                counts[grammar.var_index(sym)] += 1;
            }
        }
    }
    let mut goto_map = vec![0usize; nvars + 1];
    for v in 0..nvars {
        goto_map[v + 1] = goto_map[v] + counts[v];
    }
    let ngotos = goto_map[nvars];

    let mut from_state = vec![0usize; ngotos];
    let mut to_state = vec![0usize; ngotos];
    let mut cursor = goto_map.clone();
    for state in 0..lr0.nstates() {
        for &target in &lr0.shifts[state] {
            let sym = lr0.accessing_symbol[target];
            if grammar.is_var(sym) {
                let v = grammar.var_index(sym);
                let k = cursor[v];
                from_state[k] = state;
                to_state[k] = target;
                cursor[v] += 1;
            }
        }
    }
    GotoTable { from_state, to_state, goto_map }
}

/// Per-state-reduction lookahead bitsets, flattened: slot `s` in
/// `[lookaheads[state], lookaheads[state + 1])` belongs to rule
/// `la_rule[s]`, with its computed lookahead tokens in `la.row(s)`.
pub struct LalrTables {
    pub goto: GotoTable,
    pub lookaheads: Vec<usize>,
    pub la_rule: Vec<usize>,
    pub la: BitMatrix,
}

pub fn compute(grammar: &Grammar, lr0: &Lr0Automaton) -> LalrTables {
    let goto = build_goto_table(grammar, lr0);
    let ntokens = grammar.ntokens();
    let ngotos = goto.ngotos();

    let nstates = lr0.nstates();
    let mut lookaheads = vec![0usize; nstates + 1];
    let mut la_rule: Vec<usize> = Vec::new();
    for state in 0..nstates {
        lookaheads[state] = la_rule.len();
        let mut reds = lr0.reductions[state].clone();
        reds.sort_unstable();
        la_rule.extend(reds);
    }
    lookaheads[nstates] = la_rule.len();

    // DR relation plus the `reads` edges (goto i reads token t directly, or
    // reads whatever goto j reads when the intervening nonterminal is
    // nullable).
    let mut f = BitMatrix::new(ngotos.max(1), ntokens);
    let mut reads_edges: Vec<Vec<usize>> = vec![Vec::new(); ngotos];
    for i in 0..ngotos {
        let q = goto.to_state[i];
        for &target in &lr0.shifts[q] {
            let sym = lr0.accessing_symbol[target];
            if grammar.is_token(sym) {
                f.set(i, sym);
            } else if grammar.nullable(sym) {
                reads_edges[i].push(goto.map_goto(grammar, q, sym));
            }
        }
    }
    if ngotos > 0 {
        // Goto 0 is always the transition out of state 0 on the start
        // symbol; $end is always a valid lookahead there.
        f.set(0, END_SYMBOL);
    }
    digraph(&reads_edges, &mut f);

    let (raw_includes, lookback) = build_relations(grammar, lr0, &goto, &lookaheads, &la_rule);
    let includes = transpose(&raw_includes);
    digraph(&includes, &mut f);

    let total_slots = lookaheads[nstates];
    let mut la = BitMatrix::new(total_slots, ntokens);
    for (slot, gotos) in lookback.iter().enumerate() {
        for &gi in gotos {
            la.or_row_from(slot, &f, gi);
        }
    }

    LalrTables { goto, lookaheads, la_rule, la }
}

/// For every goto `i = (p, A)`, traces every rule `B -> beta A gamma` that
/// can reach `i` back through the automaton, recording:
/// - a lookback edge from the reduction of that rule (in whatever state the
///   trace ends at) to `i`;
/// - an `includes` edge from `i` to `map_goto(p', B)` for every suffix of
///   nullable nonterminals walking back from the end of the rule body (plus
///   the first non-nullable one, if any).
fn build_relations(
    grammar: &Grammar,
    lr0: &Lr0Automaton,
    goto: &GotoTable,
    lookaheads: &[usize],
    la_rule: &[usize],
) -> (Vec<Vec<usize>>, Vec<Vec<usize>>) {
    let ngotos = goto.ngotos();
    let total_slots = *lookaheads.last().unwrap();
    let mut raw_includes: Vec<Vec<usize>> = vec![Vec::new(); ngotos];
    let mut lookback: Vec<Vec<usize>> = vec![Vec::new(); total_slots];

    for i in 0..ngotos {
        let p = goto.from_state[i];
        let q = goto.to_state[i];
        let a = lr0.accessing_symbol[q];

        for &r in grammar.derives(a) {
            let start = grammar.rrhs(r);
            let mut states_seq = vec![p];
            let mut stateno = p;
            let mut rp = start;
            while grammar.ritem()[rp] >= 0 {
                let symbol2 = grammar.ritem()[rp] as usize;
                let next = lr0.shifts[stateno]
                    .iter()
                    .copied()
                    .find(|&t| lr0.accessing_symbol[t] == symbol2)
                    .expect("rule body symbol must be shiftable from the traced state");
                stateno = next;
                states_seq.push(stateno);
                rp += 1;
            }
            let rhs_len = states_seq.len() - 1;

            let slot = (lookaheads[stateno]..lookaheads[stateno + 1])
                .find(|&s| la_rule[s] == r)
                .expect("reduction slot for traced rule must exist in its final state");
            lookback[slot].push(i);

            let mut k = rhs_len;
            loop {
                if k == 0 {
                    break;
                }
                k -= 1;
                let sym = grammar.ritem()[start + k] as usize;
                if !grammar.is_var(sym) {
                    break;
                }
                let predecessor = states_seq[k];
                raw_includes[i].push(goto.map_goto(grammar, predecessor, sym));
                if !(grammar.nullable(sym) && k > 0) {
                    break;
                }
            }
        }
    }

    (raw_includes, lookback)
}

fn transpose(relation: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let mut result = vec![Vec::new(); relation.len()];
    for (i, edges) in relation.iter().enumerate() {
        for &k in edges {
            result[k].push(i);
        }
    }
    result
}

/// Solves `F := F union (union of F[j] for each edge i->j)` in place, in a
/// single pass per strongly-connected component, using an explicit frame
/// stack in place of recursion.
///
/// This is a direct transliteration of the `traverse`/`digraph` duo: each
/// stack frame remembers the height at which its vertex was pushed (to spot
/// when it is an SCC root) while `index[]` holds the evolving low-link
/// value. Edges into an already-visited vertex fold that vertex's current
/// row into the visitor's immediately; edges into a fresh vertex recurse
/// (here: push a frame) and the fold happens when that frame pops. When an
/// SCC closes, every non-root member's row is overwritten (not merged) with
/// the root's final row, since the root's row by then already reflects the
/// union contributed by every member.
fn digraph(relation: &[Vec<usize>], f: &mut BitMatrix) {
    let n = relation.len();
    if n == 0 {
        return;
    }
    let infinity = n + 2;
    let mut index = vec![0usize; n];

    for start in 0..n {
        if index[start] == 0 && !relation[start].is_empty() {
            traverse(start, relation, f, &mut index, infinity);
        }
    }
}

struct Frame {
    vertex: usize,
    height: usize,
    edge_pos: usize,
}

fn traverse(start: usize, relation: &[Vec<usize>], f: &mut BitMatrix, index: &mut [usize], infinity: usize) {
    let mut vertices: Vec<usize> = Vec::new();

    vertices.push(start);
    index[start] = vertices.len();
    let mut stack = vec![Frame { vertex: start, height: vertices.len(), edge_pos: 0 }];

    while let Some(top) = stack.last_mut() {
        let i = top.vertex;
        if top.edge_pos < relation[i].len() {
            let j = relation[i][top.edge_pos];
            top.edge_pos += 1;
            if index[j] == 0 {
                vertices.push(j);
                let hj = vertices.len();
                index[j] = hj;
                stack.push(Frame { vertex: j, height: hj, edge_pos: 0 });
            } else {
                if index[i] > index[j] {
                    index[i] = index[j];
                }
                f.or_row_into(i, j);
            }
        } else {
            if index[i] == top.height {
                loop {
                    let j = vertices.pop().unwrap();
                    index[j] = infinity;
                    if i == j {
                        break;
                    }
                    f.copy_row_from(j, i);
                }
            }
            let finished_index = index[i];
            stack.pop();
            if let Some(parent) = stack.last() {
                let p = parent.vertex;
                if index[p] > finished_index {
                    index[p] = finished_index;
                }
                f.or_row_into(p, i);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GrammarBuilder;
    use crate::lr0;

    fn expr_grammar() -> Grammar {
        let mut b = GrammarBuilder::new();
        let n = b.token("n");
        let plus = b.token("+");
        let e = b.nonterm("E");
        let t = b.nonterm("T");
        b.rule(e, vec![e, plus, t]);
        b.rule(e, vec![t]);
        b.rule(t, vec![n]);
        b.build(e).unwrap()
    }

    #[test]
    fn reduction_of_t_to_n_looks_ahead_to_plus_or_end() {
        let g = expr_grammar();
        let automaton = lr0::build(&g).unwrap();
        let lalr = compute(&g, &automaton);

        // Find the state whose kernel is the single item `T -> n .`
        let t_to_n_rule = 5; // rules: 0,1 sentinel, 2 augmented, 3: E->E+T, 4: E->T, 5: T->n
        let mut found = false;
        for state in 0..automaton.nstates() {
            let slots = lalr.lookaheads[state]..lalr.lookaheads[state + 1];
            for slot in slots {
                if lalr.la_rule[slot] == t_to_n_rule {
                    found = true;
                    let plus = 1; // token order: n=0, +=1
                    let tokens: Vec<usize> = lalr.la.iter_row(slot).collect();
                    assert!(tokens.contains(&plus));
                    assert!(tokens.contains(&END_SYMBOL));
                }
            }
        }
        assert!(found, "expected to find the T -> n reduction slot");
    }
}
