//! Scenario 3: a left-recursive arithmetic grammar with `%left '+'`,
//! `%left '*'`, and `'*'` binding tighter than `'+'` should report zero
//! conflicts, with the `*` reduction preferred over further shifting and
//! the `+` shift preferred over reducing at equal or lower precedence.

use lalr_core::builder::GrammarBuilder;
use lalr_core::generator::{Generator, GeneratorOptions};
use lalr_core::symbol::Assoc;

#[test]
fn left_assoc_plus_and_star_with_star_tighter_has_no_conflicts() {
    let mut b = GrammarBuilder::new();
    let n = b.token("n");
    let plus = b.token_with_prec("+", 1, Assoc::Left);
    let star = b.token_with_prec("*", 2, Assoc::Left);
    let e = b.nonterm("E");
    b.rule_with_prec(e, vec![e, plus, e], 1, Assoc::Left);
    b.rule_with_prec(e, vec![e, star, e], 2, Assoc::Left);
    b.rule(e, vec![n]);
    let grammar = b.build(e).expect("valid grammar");

    let output = Generator::new(GeneratorOptions::default())
        .run(grammar.input.clone())
        .expect("generation succeeds");

    assert_eq!(output.diagnostics.sr_total, 0);
    assert_eq!(output.diagnostics.rr_total, 0);
}
