//! Scenario 6: two states with identical sorted shift vectors must be
//! packed with the same `base[]` displacement rather than being placed
//! twice. `S -> a A | b A ; A -> p | q | r` puts the state reached after
//! shifting `a` and the state reached after shifting `b` through the same
//! closure of `A`'s three alternatives; since LR(0) states are
//! deduplicated by kernel, each alternative lands in the same target state
//! regardless of whether it was reached via `a` or via `b`, so both
//! intermediate states end up with the identical three-entry shift vector
//! `{p, q, r}`.

use lalr_core::builder::GrammarBuilder;
use lalr_core::generator::{Generator, GeneratorOptions};

#[test]
fn identical_three_entry_shift_vectors_share_a_base() {
    let mut b = GrammarBuilder::new();
    let p = b.token("p");
    let q = b.token("q");
    let r = b.token("r");
    let a_tok = b.token("a");
    let b_tok = b.token("b");
    let s = b.nonterm("S");
    let big_a = b.nonterm("A");
    b.rule(s, vec![a_tok, big_a]);
    b.rule(s, vec![b_tok, big_a]);
    b.rule(big_a, vec![p]);
    b.rule(big_a, vec![q]);
    b.rule(big_a, vec![r]);
    let grammar = b.build(s).expect("valid grammar");

    let output = Generator::new(GeneratorOptions::default())
        .run(grammar.input.clone())
        .expect("generation succeeds");

    let state_after_a = output
        .automaton
        .goto(0, a_tok)
        .expect("state 0 must shift on 'a'");
    let state_after_b = output
        .automaton
        .goto(0, b_tok)
        .expect("state 0 must shift on 'b'");
    assert_ne!(state_after_a, state_after_b, "the two intermediate states must be distinct");

    assert_eq!(output.automaton.shifts[state_after_a].len(), 3);
    assert_eq!(output.automaton.shifts[state_after_a], output.automaton.shifts[state_after_b]);

    let sindex_a = output.tables.sindex[state_after_a];
    let sindex_b = output.tables.sindex[state_after_b];
    assert_eq!(sindex_a, sindex_b, "identical shift rows must share a base displacement");
}
