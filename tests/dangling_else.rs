//! Scenario 2: the classic dangling-else grammar has exactly one
//! shift/reduce conflict on `else` when no precedence is declared, and
//! none once `%right else`-style precedence resolves it.

use lalr_core::builder::GrammarBuilder;
use lalr_core::generator::{Generator, GeneratorOptions};
use lalr_core::symbol::Assoc;

fn build_grammar(with_precedence: bool) -> lalr_core::Grammar {
    let mut b = GrammarBuilder::new();
    let if_tok = if with_precedence {
        b.token_with_prec("if", 1, Assoc::Right)
    } else {
        b.token("if")
    };
    let then_tok = b.token("then");
    let else_tok = if with_precedence {
        b.token_with_prec("else", 2, Assoc::Right)
    } else {
        b.token("else")
    };
    let other = b.token("other");
    let stmt = b.nonterm("stmt");
    if with_precedence {
        b.rule_with_prec(stmt, vec![if_tok, then_tok, stmt], 1, Assoc::Right);
        b.rule_with_prec(stmt, vec![if_tok, then_tok, stmt, else_tok, stmt], 2, Assoc::Right);
    } else {
        b.rule(stmt, vec![if_tok, then_tok, stmt]);
        b.rule(stmt, vec![if_tok, then_tok, stmt, else_tok, stmt]);
    }
    b.rule(stmt, vec![other]);
    b.build(stmt).expect("valid grammar")
}

#[test]
fn without_precedence_reports_exactly_one_conflict() {
    let grammar = build_grammar(false);
    let output = Generator::new(GeneratorOptions::default())
        .run(grammar.input.clone())
        .expect("generation succeeds");
    assert_eq!(output.diagnostics.sr_total, 1);
    assert_eq!(output.diagnostics.rr_total, 0);
}

#[test]
fn right_assoc_else_resolves_the_conflict() {
    let grammar = build_grammar(true);
    let output = Generator::new(GeneratorOptions::default())
        .run(grammar.input.clone())
        .expect("generation succeeds");
    assert_eq!(output.diagnostics.sr_total, 0);
}
