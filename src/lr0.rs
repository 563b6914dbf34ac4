//! LR(0) automaton construction: item-set closure, goto, and state
//! deduplication by kernel equality.

use std::collections::{BTreeMap, VecDeque};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction::Outgoing;

use crate::error::GeneratorError;
use crate::grammar::Grammar;
use crate::symbol::Sym;

/// The kernel of one automaton state: its accessing symbol and the sorted
/// `ritem` positions that survive a shift into it (before closure).
#[derive(Debug, Clone)]
pub struct Core {
    pub number: usize,
    pub accessing_symbol: Sym,
    pub items: Vec<i32>,
}

/// The full LR(0) automaton. States and shift transitions live in a
/// `petgraph` graph, same vehicle the teacher's own `ParserGraph` uses for
/// its LR automaton; node indices are assigned in construction order so
/// `NodeIndex::index() == state number` throughout. `shifts` caches each
/// state's outgoing edges sorted by the target's accessing symbol, which
/// every downstream stage (LALR, action synthesis, packing) walks
/// repeatedly and would otherwise have to re-sort out of the graph on every
/// lookup.
#[derive(Debug)]
pub struct Lr0Automaton {
    pub states: Vec<Core>,
    pub graph: DiGraph<(), Sym>,
    pub shifts: Vec<Vec<usize>>,
    pub reductions: Vec<Vec<usize>>,
    pub accessing_symbol: Vec<Sym>,
}

impl Lr0Automaton {
    pub fn nstates(&self) -> usize {
        self.states.len()
    }

    /// The target state reached by shifting `symbol` out of `state`, if any.
    /// Queries the graph directly rather than `shifts[state]`, for callers
    /// that only care about one symbol.
    pub fn goto(&self, state: usize, symbol: Sym) -> Option<usize> {
        self.graph
            .edges_directed(NodeIndex::new(state), Outgoing)
            .find(|e| *e.weight() == symbol)
            .map(|e| e.target().index())
    }
}

/// An upper bound on state count, matched against `Sym::MAX` conceptually;
/// in practice this just guards against runaway construction on malformed
/// input feeding `closure`/`goto` an unbounded fixpoint.
const MAX_STATES: usize = 1_000_000;

pub fn build(grammar: &Grammar) -> Result<Lr0Automaton, GeneratorError> {
    let kernel0 = grammar.start_kernel();

    let mut states: Vec<Core> = vec![Core { number: 0, accessing_symbol: 0, items: kernel0.clone() }];
    let mut index: BTreeMap<Vec<i32>, usize> = BTreeMap::new();
    index.insert(kernel0, 0);

    let mut graph: DiGraph<(), Sym> = DiGraph::new();
    let root = graph.add_node(());
    debug_assert_eq!(root.index(), 0);

    let mut reductions: Vec<Vec<usize>> = vec![Vec::new()];

    let mut worklist: VecDeque<usize> = VecDeque::new();
    worklist.push_back(0);

    while let Some(state_id) = worklist.pop_front() {
        let kernel = states[state_id].items.clone();
        let closed = grammar.closure(&kernel);

        let mut reds = Vec::new();
        let mut buckets: BTreeMap<Sym, Vec<i32>> = BTreeMap::new();
        for &pos in &closed {
            let sym = grammar.ritem()[pos as usize];
            if sym < 0 {
                reds.push((-sym) as usize);
            } else {
                buckets.entry(sym as usize).or_default().push(pos + 1);
            }
        }
        reds.sort_unstable();
        reductions[state_id] = reds;

        for (sym, mut kernel_items) in buckets {
            kernel_items.sort_unstable();
            let target = match index.get(&kernel_items) {
                Some(&id) => id,
                None => {
                    let id = states.len();
                    if id >= MAX_STATES {
                        return Err(GeneratorError::Fatal("state count exceeded the representable limit".into()));
                    }
                    states.push(Core { number: id, accessing_symbol: sym, items: kernel_items.clone() });
                    index.insert(kernel_items, id);
                    let node = graph.add_node(());
                    debug_assert_eq!(node.index(), id);
                    reductions.push(Vec::new());
                    worklist.push_back(id);
                    id
                }
            };
            graph.add_edge(NodeIndex::new(state_id), NodeIndex::new(target), sym);
        }
    }

    let accessing_symbol: Vec<Sym> = states.iter().map(|s| s.accessing_symbol).collect();
    let shifts = (0..states.len())
        .map(|s| {
            let mut targets: Vec<usize> = graph
                .edges_directed(NodeIndex::new(s), Outgoing)
                .map(|e| e.target().index())
                .collect();
            targets.sort_unstable_by_key(|&t| accessing_symbol[t]);
            targets
        })
        .collect();

    Ok(Lr0Automaton { states, graph, shifts, reductions, accessing_symbol })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GrammarBuilder;

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
    fn expr_grammar_has_seven_states() {
        let g = expr_grammar();
        let automaton = build(&g).unwrap();
        assert_eq!(automaton.nstates(), 7);
    }

    #[test]
    fn state_zero_shifts_on_every_nonterminal_and_leading_token() {
        let g = expr_grammar();
        let automaton = build(&g).unwrap();
        // State 0 must have a shift for n, for E and for T.
        let targets: Vec<Sym> = automaton.shifts[0]
            .iter()
            .map(|&s| automaton.accessing_symbol[s])
            .collect();
        assert_eq!(targets.len(), 3);
    }

    #[test]
    fn reductions_are_only_recorded_in_states_with_a_completed_item() {
        let g = expr_grammar();
        let automaton = build(&g).unwrap();
        assert!(automaton.reductions[0].is_empty());
        let has_some_reduction = automaton.reductions.iter().any(|r| !r.is_empty());
        assert!(has_some_reduction);
    }
}
