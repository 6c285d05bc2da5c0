// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Property tests over the compile pipeline: parser totality, grounding
//! cardinalities and artifact determinism.

#![allow(missing_docs)]
#![allow(clippy::expect_used, clippy::unwrap_used)]

use epddl_core::{Compiler, Literal};
use proptest::prelude::*;

fn compile(domain: &str, problem: &str) -> String {
    let mut compiler = Compiler::new();
    compiler.parse_domain(domain).expect("parse domain");
    compiler.parse_problem(problem).expect("parse problem");
    compiler.render().expect("render")
}

/// Domain text with a single predicate `q` of the given arity over `item`.
fn arity_domain(arity: usize, no_duplicates: bool) -> String {
    let vars: Vec<String> = (0..arity).map(|i| format!("?v{i}")).collect();
    let requirements = if no_duplicates {
        "(:requirements :strips :no-duplicates) "
    } else {
        ""
    };
    format!(
        "(define (domain g) {requirements}(:predicates (q {} - item)))",
        vars.join(" ")
    )
}

fn item_problem(n: usize) -> String {
    let objects: Vec<String> = (0..n).map(|i| format!("i{i:02}")).collect();
    format!(
        "(define (problem p) (:domain g) (:objects {} - item))",
        objects.join(" ")
    )
}

proptest! {
    // The lexer and both parser entry points must fail cleanly on garbage,
    // never panic.
    #[test]
    fn scanning_arbitrary_text_never_panics(source in "[a-z0-9 ()\\[\\]?;:\\n-]{0,200}") {
        let _ = epddl_core::scan(&source);
    }

    #[test]
    fn parsing_arbitrary_text_never_panics(source in "[a-z0-9 ()\\[\\]?;:\\n-]{0,200}") {
        let mut compiler = Compiler::new();
        let _ = compiler.parse_domain(&source);
        let _ = compiler.parse_problem(&source);
    }

    // With no bracket groups in play only the nesting-collapse pass can
    // fire, and it runs to fixpoint, so a second normalization is a no-op.
    #[test]
    fn normalizing_bracket_free_text_is_idempotent(source in "[a-z0-9 ()?;\\n]{0,200}") {
        let once = epddl_core::normalize(&source).expect("first pass");
        let twice = epddl_core::normalize(&once).expect("second pass");
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn canonical_fluents_split_back_into_their_tokens(
        tokens in prop::collection::vec("[a-z][a-z0-9]{0,6}", 1..5)
    ) {
        let literal = Literal::from_symbols(tokens.iter().map(String::as_str));
        let rendered = literal.canonical();
        let split: Vec<&str> = rendered.split('_').collect();
        let expected: Vec<&str> = tokens.iter().map(String::as_str).collect();
        prop_assert_eq!(split, expected);
    }

    // With an empty :init every universe fluent lands in the false-fluents
    // statement, so counting `!q_` entries counts the whole expansion.
    #[test]
    fn predicate_expansion_covers_the_full_product(n in 1usize..=4, arity in 1usize..=3) {
        let artifact = compile(&arity_domain(arity, false), &item_problem(n));
        let expected: usize = (0..arity).map(|_| n).product();
        prop_assert_eq!(artifact.matches("!q_").count(), expected);
    }

    #[test]
    fn no_duplicates_expansion_is_the_falling_factorial(n in 1usize..=4, arity in 1usize..=3) {
        let artifact = compile(&arity_domain(arity, true), &item_problem(n));
        let expected: usize = (0..arity).map(|i| n.saturating_sub(i)).product();
        prop_assert_eq!(artifact.matches("!q_").count(), expected);
    }

    #[test]
    fn mixed_type_expansion_multiplies_the_domains(n in 1usize..=3, m in 1usize..=3) {
        let domain = "(define (domain g) (:predicates (q ?x - item ?y - slot)))";
        let items: Vec<String> = (0..n).map(|i| format!("i{i}")).collect();
        let slots: Vec<String> = (0..m).map(|j| format!("s{j}")).collect();
        let problem = format!(
            "(define (problem p) (:domain g) (:objects {} - item {} - slot))",
            items.join(" "),
            slots.join(" ")
        );
        let artifact = compile(domain, &problem);
        prop_assert_eq!(artifact.matches("!q_").count(), n * m);
    }

    #[test]
    fn fluent_lists_wrap_after_every_tenth_entry(n in 1usize..=35) {
        let artifact = compile(&arity_domain(1, false), &item_problem(n));
        prop_assert_eq!(artifact.matches(";\nfluent ").count(), (n - 1) / 10);
    }

    #[test]
    fn rendering_the_same_sources_is_deterministic(
        names in prop::collection::vec("[a-z][a-z0-9]{0,5}", 1..6)
    ) {
        let domain = "(define (domain g) (:predicates (at ?x - item) (on ?x ?y - item)))";
        let problem = format!(
            "(define (problem p) (:domain g) (:objects {} - item))",
            names.join(" ")
        );
        let first = compile(domain, &problem);
        let second = compile(domain, &problem);
        prop_assert_eq!(first, second);
    }
}
