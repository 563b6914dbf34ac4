//! Packs the per-state shift/reduce action rows and per-nonterminal goto
//! columns into a shared `base/check/table` representation: vectors are
//! sorted by descending width/tally, identical shift-or-reduce vectors are
//! reused instead of re-placed, and everything else is first-fit packed.

use crate::action::{ActionKind, ActionTable};
use crate::grammar::Grammar;
use crate::lalr::GotoTable;

#[derive(Debug)]
pub struct ParserTables {
    pub table: Vec<i32>,
    pub check: Vec<i32>,
    pub sindex: Vec<i32>,
    pub rindex: Vec<i32>,
    pub gindex: Vec<i32>,
    pub dgoto: Vec<usize>,
}

enum VecKind {
    Shift,
    Reduce,
    Goto,
}

struct Vector {
    kind: VecKind,
    owner: usize,
    entries: Vec<(i32, i32)>,
}

impl Vector {
    fn width(&self) -> i32 {
        match (self.entries.first(), self.entries.last()) {
            (Some(&(lo, _)), Some(&(hi, _))) => hi - lo + 1,
            _ => 0,
        }
    }
}

pub fn pack(grammar: &Grammar, goto: &GotoTable, actions: &ActionTable) -> ParserTables {
    let nstates = actions.actions.len();
    let nvars = grammar.nvars();

    let mut vectors: Vec<Vector> = Vec::new();
    let mut sindex_owner = vec![usize::MAX; nstates];
    let mut rindex_owner = vec![usize::MAX; nstates];
    let mut gindex_owner = vec![usize::MAX; nvars];

    for state in 0..nstates {
        let mut shift_entries: Vec<(i32, i32)> = actions.actions[state]
            .iter()
            .filter(|a| a.is_live() && a.kind == ActionKind::Shift)
            .map(|a| (grammar.symbol_value(a.symbol), a.number as i32))
            .collect();
        shift_entries.sort_by_key(|e| e.0);
        if !shift_entries.is_empty() {
            sindex_owner[state] = vectors.len();
            vectors.push(Vector { kind: VecKind::Shift, owner: state, entries: shift_entries });
        }

        let default_rule = actions.defred[state];
        let mut reduce_entries: Vec<(i32, i32)> = actions.actions[state]
            .iter()
            .filter(|a| a.is_live() && a.kind == ActionKind::Reduce && a.number != default_rule)
            .map(|a| (grammar.symbol_value(a.symbol), -(a.number as i32)))
            .collect();
        reduce_entries.sort_by_key(|e| e.0);
        if !reduce_entries.is_empty() {
            rindex_owner[state] = vectors.len();
            vectors.push(Vector { kind: VecKind::Reduce, owner: state, entries: reduce_entries });
        }
    }

    let mut dgoto = vec![0usize; nvars];
    for v in 0..nvars {
        let i0 = goto.range(v);
        if i0.is_empty() {
            continue;
        }
        let default_target = most_frequent_target(goto, i0.clone());
        dgoto[v] = default_target;

        let entries: Vec<(i32, i32)> = i0
            .filter_map(|i| {
                let to = goto.to_state[i];
                if to == default_target {
                    None
                } else {
                    Some((goto.from_state[i] as i32, to as i32))
                }
            })
            .collect();
        if !entries.is_empty() {
            gindex_owner[v] = vectors.len();
            vectors.push(Vector { kind: VecKind::Goto, owner: v, entries });
        }
    }

    let (base, table, check) = pack_vectors(vectors);

    let sindex = sindex_owner.iter().map(|&v| if v == usize::MAX { 0 } else { base[v] }).collect();
    let rindex = rindex_owner.iter().map(|&v| if v == usize::MAX { 0 } else { base[v] }).collect();
    let gindex = gindex_owner.iter().map(|&v| if v == usize::MAX { 0 } else { base[v] }).collect();

    ParserTables { table, check, sindex, rindex, gindex, dgoto }
}

fn most_frequent_target(goto: &GotoTable, range: impl Iterator<Item = usize> + Clone) -> usize {
    use std::collections::BTreeMap;
    let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
    for i in range {
        *counts.entry(goto.to_state[i]).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
        .map(|(state, _)| state)
        .unwrap_or(0)
}

fn pack_vectors(vectors: Vec<Vector>) -> (Vec<i32>, Vec<i32>, Vec<i32>) {
    let mut order: Vec<usize> = (0..vectors.len()).collect();
    order.sort_by(|&a, &b| {
        vectors[b].width().cmp(&vectors[a].width())
            .then(vectors[b].entries.len().cmp(&vectors[a].entries.len()))
    });

    let mut table: Vec<i32> = vec![0; 1000];
    let mut check: Vec<i32> = vec![-1; 1000];
    let mut base = vec![0i32; vectors.len()];
    let mut placements: Vec<i32> = Vec::with_capacity(order.len());
    let mut lowzero: i32 = 0;
    let mut high: i32 = 0;

    for (oi, &vi) in order.iter().enumerate() {
        let reuse = if !matches!(vectors[vi].kind, VecKind::Goto) {
            order[..oi].iter().enumerate().find_map(|(prev_oi, &pvi)| {
                if matches!(vectors[pvi].kind, VecKind::Goto) {
                    return None;
                }
                if vectors[pvi].entries == vectors[vi].entries {
                    Some(placements[prev_oi])
                } else {
                    None
                }
            })
        } else {
            None
        };

        let place = match reuse {
            Some(p) => p,
            None => pack_vector(&vectors[vi], &mut table, &mut check, &mut lowzero, &mut high, &placements),
        };
        placements.push(place);
        base[vi] = place;
    }

    let final_len = (high + 1).max(0) as usize;
    table.truncate(final_len);
    check.truncate(final_len);
    (base, table, check)
}

fn pack_vector(
    v: &Vector,
    table: &mut Vec<i32>,
    check: &mut Vec<i32>,
    lowzero: &mut i32,
    high: &mut i32,
    placed: &[i32],
) -> i32 {
    let from: Vec<i32> = v.entries.iter().map(|(k, _)| *k).collect();
    let to: Vec<i32> = v.entries.iter().map(|(_, val)| *val).collect();

    let mut j = *lowzero - from[0];
    for &f in from.iter().skip(1) {
        if *lowzero - f > j {
            j = *lowzero - f;
        }
    }

    loop {
        if j == 0 {
            j += 1;
            continue;
        }
        ensure_capacity(table, check, (j + from.iter().copied().max().unwrap()).max(0) as usize);

        let mut ok = from.iter().all(|&f| {
            let loc = j + f;
            loc >= 0 && check[loc as usize] == -1
        });
        if ok {
            ok = !placed.contains(&j);
        }
        if ok {
            for k in 0..from.len() {
                let loc = (j + from[k]) as usize;
                table[loc] = to[k];
                check[loc] = from[k];
                if loc as i32 > *high {
                    *high = loc as i32;
                }
            }
            while (*lowzero as usize) < check.len() && check[*lowzero as usize] != -1 {
                *lowzero += 1;
            }
            ensure_capacity(table, check, *lowzero as usize);
            return j;
        }
        j += 1;
    }
}

fn ensure_capacity(table: &mut Vec<i32>, check: &mut Vec<i32>, needed: usize) {
    if needed >= check.len() {
        let new_len = needed + 200;
        table.resize(new_len, 0);
        check.resize(new_len, -1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GrammarBuilder;
    use crate::generator::GeneratorOptions;
    use crate::{action, lalr, lr0};

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
    fn packing_produces_a_nonempty_table_with_matching_check() {
        let g = expr_grammar();
        let automaton = lr0::build(&g).unwrap();
        let lalr_tables = lalr::compute(&g, &automaton);
        let table = action::build(&g, &automaton, &lalr_tables, &GeneratorOptions::default());
        let packed = pack(&g, &lalr_tables.goto, &table);
        assert!(!packed.table.is_empty());
        assert_eq!(packed.table.len(), packed.check.len());
    }

    #[test]
    fn identical_shift_rows_share_a_base() {
        // States reached after shifting `n` from anywhere always reduce
        // `T -> n` on the same lookahead set, so their shift rows (both
        // empty, no shifts out of a pure-reduce state) collapse to one
        // placement rather than two.
        let g = expr_grammar();
        let automaton = lr0::build(&g).unwrap();
        let lalr_tables = lalr::compute(&g, &automaton);
        let table = action::build(&g, &automaton, &lalr_tables, &GeneratorOptions::default());
        let packed = pack(&g, &lalr_tables.goto, &table);
        // Every state with no live shifts leaves sindex at the sentinel 0;
        // this is just a smoke check that indices stay in range.
        for &si in &packed.sindex {
            assert!((si as usize) <= packed.table.len());
        }
    }
}
