//! Scenario 1 from the testable-properties list: the trivial expression
//! grammar `E : E '+' T | T ; T : 'n' ;` should produce exactly seven LR(0)
//! states, no default reduction in state 0, and the state reached after
//! shifting `n` should reduce `T -> n` with lookahead `{'+', $end}`.

use lalr_core::builder::GrammarBuilder;
use lalr_core::generator::{Generator, GeneratorOptions};
use lalr_core::symbol::END_SYMBOL;

#[test]
fn expression_grammar_has_seven_states_and_expected_lookahead() {
    let mut b = GrammarBuilder::new();
    let n = b.token("n");
    let plus = b.token("+");
    let e = b.nonterm("E");
    let t = b.nonterm("T");
    b.rule(e, vec![e, plus, t]); // rule 3
    b.rule(e, vec![t]); // rule 4
    let t_rule = b.rule(t, vec![n]); // rule 5
    let grammar = b.build(e).expect("valid grammar");
    let t_to_n_rule = t_rule + 3;

    let output = Generator::new(GeneratorOptions::default())
        .run(grammar.input.clone())
        .expect("generation succeeds");

    assert_eq!(output.automaton.nstates(), 7);
    assert_eq!(output.actions.defred[0], 0);

    let mut found = false;
    for state in 0..output.automaton.nstates() {
        let slots = output.lalr.lookaheads[state]..output.lalr.lookaheads[state + 1];
        for slot in slots {
            if output.lalr.la_rule[slot] == t_to_n_rule {
                found = true;
                let tokens: Vec<usize> = output.lalr.la.iter_row(slot).collect();
                assert!(tokens.contains(&plus), "expected '+' in the lookahead set");
                assert!(tokens.contains(&END_SYMBOL), "expected $end in the lookahead set");
                assert_eq!(tokens.len(), 2, "lookahead set should be exactly {{'+', $end}}");
            }
        }
    }
    assert!(found, "expected a state reducing T -> n");
}
