//! Scenario 5: adding a rule unreachable from the goal symbol must be
//! reported as exactly one unused rule, without otherwise perturbing the
//! reachable part of the grammar's tables.

use lalr_core::builder::GrammarBuilder;
use lalr_core::generator::{Generator, GeneratorOptions};

#[test]
fn rule_unreachable_from_goal_is_reported_unused() {
    let mut b = GrammarBuilder::new();
    let a = b.token("a");
    let q = b.token("q");
    let s = b.nonterm("S");
    let junk = b.nonterm("junk");
    b.rule(s, vec![a]);
    let junk_rule = b.rule(junk, vec![q]); // never referenced from `goal`
    let grammar = b.build(s).expect("valid grammar");
    let junk_rule_no = junk_rule + 3;

    let output = Generator::new(GeneratorOptions::default())
        .run(grammar.input.clone())
        .expect("generation succeeds");

    assert_eq!(output.diagnostics.nunused, 1);
    assert!(!output.diagnostics.rules_used[junk_rule_no]);
}
