// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! mAp artifact rendering.
//!
//! Rendering is pure: [`Compiler::render`] grounds every action template,
//! assembles the fluent universe and returns the whole artifact as one
//! string. The section banners, statement punctuation and blank-line layout
//! are load-bearing for downstream mAp consumers and are reproduced
//! verbatim, misspellings included.

use std::collections::BTreeSet;

use crate::action::{pairwise_distinct, Assignments, GroundAction};
use crate::compiler::Compiler;
use crate::error::Error;
use crate::fluent::{Literal, Term};
use crate::hierarchy::{resolve_type, AGENT_TYPE};
use crate::logic::Guard;

const HEADER: &str = "%This file is automatically generated from an E-PDDL specification and follows the mAp syntax.\n\n";

// Every banner and separator line is exactly 64 columns.
const SEPARATOR: &str = "%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%\n";
const FLUENTS_BANNER: &str = "%%%%%%%%%%%%%%%%%%%%%%%%%    FLUENTS    %%%%%%%%%%%%%%%%%%%%%%%%\n";
const NAMES_BANNER: &str = "%%%%%%%%%%%%%%%%%%%%%    ACTIONS' NAMES    %%%%%%%%%%%%%%%%%%%%%\n";
const SPECIFICATIONS_BANNER: &str = "%%%%%%%%%%%%%%%%%    ACTIONS' SPECIFICATIONS    %%%%%%%%%%%%%%%%\n";
const INITIAL_FLUENTS_BANNER: &str = "%%%%%%%%%%%%%%%%%%    INITIAL FLUENTS TRUTH   %%%%%%%%%%%%%%%%%%\n";
const BELIEFS_BANNER: &str = "%%%%%%%%%%%%%%%%%%    INITIAL BELIEFS TRUTH   %%%%%%%%%%%%%%%%%%\n";
const GOALS_BANNER: &str = "%%%%%%%%%%%%%%%%%%%%%%%%%%    GOALS   %%%%%%%%%%%%%%%%%%%%%%%%%%\n";

impl Compiler {
    /// File name of the artifact, built from the parsed domain and problem
    /// names.
    #[must_use]
    pub fn artifact_name(&self) -> String {
        format!("{}_{}.txt", self.domain_name, self.problem_name)
    }

    /// Renders the complete mAp artifact.
    ///
    /// Grounds every action template, assembles the fluent universe from
    /// the ground actions, the expanded predicate signatures and the
    /// declared initial and goal literals, then lays out the six artifact
    /// sections in order.
    ///
    /// # Errors
    ///
    /// [`Error::TypeResolution`] when an action or predicate parameter type
    /// cannot be resolved against the declared hierarchy.
    pub fn render(&self) -> Result<String, Error> {
        let mut universe = BTreeSet::new();
        let mut ground_actions = Vec::new();
        for template in &self.actions {
            ground_actions.extend(template.ground(
                &self.types,
                &self.objects,
                self.no_duplicates(),
                &mut universe,
            )?);
        }
        self.collect_declared_fluents(&mut universe)?;

        let mut out = String::with_capacity(4096);
        out.push_str(HEADER);
        write_fluents(&mut out, &universe);
        write_action_names(&mut out, &ground_actions);
        self.write_specifications(&mut out, &ground_actions);
        self.write_initial_fluents(&mut out, &universe);
        self.write_initial_beliefs(&mut out);
        self.write_goals(&mut out);
        Ok(out)
    }

    /// Adds the expanded predicate signatures and the concrete declared
    /// literals to the fluent universe.
    fn collect_declared_fluents(&self, universe: &mut BTreeSet<String>) -> Result<(), Error> {
        for literal in self
            .state
            .iter()
            .chain(self.positive_goals.iter())
            .chain(self.negative_goals.iter())
        {
            if !literal.is_epistemic() {
                universe.insert(literal.canonical());
            }
        }
        for predicate in &self.predicates {
            let mut domains = Vec::with_capacity(predicate.parameters.len());
            for (_, ty) in &predicate.parameters {
                domains.push(resolve_type(ty, &self.types, &self.objects)?);
            }
            for assignment in Assignments::new(&domains) {
                if self.no_duplicates() && !pairwise_distinct(&assignment) {
                    continue;
                }
                let literal = Literal::from_symbols(
                    std::iter::once(predicate.name.as_str()).chain(assignment.iter().copied()),
                );
                universe.insert(literal.canonical());
            }
        }
        Ok(())
    }

    fn write_specifications(&self, out: &mut String, actions: &[GroundAction]) {
        out.push_str(SPECIFICATIONS_BANNER);
        out.push_str(
            "%Actions' specifications generated from EPDDL by grounding each action's definition\n\n",
        );
        for action in actions {
            out.push_str("%%%Action ");
            out.push_str(&action.name);
            out.push_str("\n\n");
            write_executable(out, action);
            write_effects(out, action);
            self.write_observers(out, action, true);
            self.write_observers(out, action, false);
            out.push_str("\n%%%\n\n");
        }
        close_section(out);
    }

    /// Writes the observer statements of one class (`observes` for full,
    /// `aware_of` for partial). An entry carrying quantified placeholders
    /// expands to one statement per registered agent, the agent serving as
    /// subject and bound into the guards; with no registered agent group it
    /// expands to nothing. A concrete entry emits one statement per symbol
    /// token of its literal, that token as subject.
    fn write_observers(&self, out: &mut String, action: &GroundAction, full: bool) {
        let (entries, verb) = if full {
            (&action.observers, "observes")
        } else {
            (&action.p_observers, "aware_of")
        };
        for entry in entries {
            if entry.literal.has_quantified() || entry.guard.has_quantified() {
                let Some(agents) = self.objects.get(AGENT_TYPE) else {
                    continue;
                };
                for agent in agents {
                    push_statement_head(out, agent, verb);
                    out.push_str(&action.name);
                    push_guard(out, &entry.guard.bind_agent(agent));
                    out.push_str(";\n");
                }
            } else {
                for term in entry.literal.terms() {
                    let Term::Sym(subject) = term else { continue };
                    push_statement_head(out, subject, verb);
                    out.push_str(&action.name);
                    push_guard(out, &entry.guard);
                    out.push_str(";\n");
                }
            }
        }
    }

    fn write_initial_fluents(&self, out: &mut String, universe: &BTreeSet<String>) {
        out.push_str(INITIAL_FLUENTS_BANNER);
        out.push_str(
            "%Fluents are considered true when are inserted in :init; otherwise are considered false\n\n",
        );
        out.push_str("%%%True fluents\n");
        let mut truths: Vec<String> = Vec::new();
        for literal in &self.state {
            if literal.is_epistemic() {
                continue;
            }
            let canonical = literal.canonical();
            if !truths.contains(&canonical) {
                truths.push(canonical);
            }
        }
        if !truths.is_empty() {
            out.push_str("initially ");
            out.push_str(&truths.join(", "));
            out.push_str(";\n");
        }
        out.push_str("%%%False fluents\n");
        let falsities: Vec<String> = universe
            .iter()
            .filter(|fluent| !truths.contains(*fluent))
            .map(|fluent| format!("!{fluent}"))
            .collect();
        if !falsities.is_empty() {
            out.push_str("initially ");
            out.push_str(&falsities.join(", "));
            out.push_str(";\n");
        }
        out.push('\n');
        close_section(out);
    }

    fn write_initial_beliefs(&self, out: &mut String) {
        out.push_str(BELIEFS_BANNER);
        out.push_str("%Extracted from the :init field\n\n");
        let mut seen: Vec<String> = Vec::new();
        for literal in &self.state {
            if !literal.is_epistemic() {
                continue;
            }
            let canonical = literal.canonical();
            if seen.contains(&canonical) {
                continue;
            }
            out.push_str("initially ");
            out.push_str(&canonical);
            out.push_str(";\n");
            seen.push(canonical);
        }
        out.push('\n');
        close_section(out);
    }

    fn write_goals(&self, out: &mut String) {
        out.push_str(GOALS_BANNER);
        out.push_str(
            "%The goals of the plan. Each goal is presented separately to ease the reading\n\n",
        );
        for literal in self.positive_goals.iter().chain(self.negative_goals.iter()) {
            out.push_str("goal ");
            out.push_str(&literal.canonical());
            out.push_str(";\n");
        }
        out.push('\n');
        out.push_str(SEPARATOR);
    }
}

fn write_fluents(out: &mut String, universe: &BTreeSet<String>) {
    out.push_str(FLUENTS_BANNER);
    // "cheking" is part of the fixed artifact text.
    out.push_str(
        "%Fluents generated from EPDDL by grounding each predicate (and cheking in :init, :goal and actions for extra predicates)\n",
    );
    out.push_str("%The fluents are lexicographically sorted and printed in sets of 10\n\n");
    let names: Vec<&str> = universe.iter().map(String::as_str).collect();
    write_wrapped(out, "fluent: ", ";\nfluent ", &names);
    close_section(out);
}

fn write_action_names(out: &mut String, actions: &[GroundAction]) {
    out.push_str(NAMES_BANNER);
    out.push_str(
        "%Actions' names generated from EPDDL by adding to each action names its grounded predicates\n\n",
    );
    let names: Vec<&str> = actions.iter().map(|a| a.name.as_str()).collect();
    write_wrapped(out, "action: ", ";\naction ", &names);
    close_section(out);
}

/// Writes a comma-joined declaration list, breaking onto a fresh
/// `continuation` label after every tenth entry. An empty list still
/// prints its bare label.
fn write_wrapped(out: &mut String, label: &str, continuation: &str, names: &[&str]) {
    out.push_str(label);
    for (i, name) in names.iter().enumerate() {
        out.push_str(name);
        if i + 1 < names.len() {
            out.push_str(if (i + 1) % 10 == 0 { continuation } else { ", " });
        }
    }
    out.push_str(";\n\n");
}

fn write_executable(out: &mut String, action: &GroundAction) {
    out.push_str("executable ");
    out.push_str(&action.name);
    if !action.positive_preconditions.is_empty() || !action.negative_preconditions.is_empty() {
        out.push_str(" if ");
        let rendered: Vec<String> = action
            .positive_preconditions
            .iter()
            .map(Literal::canonical)
            .chain(
                action
                    .negative_preconditions
                    .iter()
                    .map(|l| format!("not({})", l.canonical())),
            )
            .collect();
        out.push_str(&rendered.join(", "));
    }
    out.push_str(";\n");
}

fn write_effects(out: &mut String, action: &GroundAction) {
    let verb = action.act_type.verb();
    for entry in &action.add_effects {
        push_statement_head(out, &action.name, verb);
        out.push_str(&entry.literal.canonical());
        push_guard(out, &entry.guard);
        out.push_str(";\n");
    }
    for entry in &action.del_effects {
        push_statement_head(out, &action.name, verb);
        out.push_str("not(");
        out.push_str(&entry.literal.canonical());
        out.push(')');
        push_guard(out, &entry.guard);
        out.push_str(";\n");
    }
}

fn push_statement_head(out: &mut String, subject: &str, verb: &str) {
    out.push_str(subject);
    out.push(' ');
    out.push_str(verb);
    out.push(' ');
}

/// Appends ` if g1, g2, !g3` for a non-empty guard, negatives last.
fn push_guard(out: &mut String, guard: &Guard) {
    if guard.is_empty() {
        return;
    }
    out.push_str(" if ");
    let rendered: Vec<String> = guard
        .pos
        .iter()
        .map(Literal::canonical)
        .chain(guard.neg.iter().map(|l| format!("!{}", l.canonical())))
        .collect();
    out.push_str(&rendered.join(", "));
}

fn close_section(out: &mut String) {
    out.push_str(SEPARATOR);
    out.push_str("\n\n");
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used)]

    use super::*;

    fn render(domain: &str, problem: &str) -> String {
        let mut compiler = Compiler::new();
        compiler.parse_domain(domain).expect("parse domain");
        compiler.parse_problem(problem).expect("parse problem");
        compiler.render().expect("render")
    }

    fn minimal_problem(body: &str) -> String {
        format!("(define (problem p) (:domain d) {body})")
    }

    #[test]
    fn banners_are_all_64_columns() {
        for banner in [
            SEPARATOR,
            FLUENTS_BANNER,
            NAMES_BANNER,
            SPECIFICATIONS_BANNER,
            INITIAL_FLUENTS_BANNER,
            BELIEFS_BANNER,
            GOALS_BANNER,
        ] {
            assert_eq!(banner.len(), 65, "{banner:?}");
            assert!(banner.ends_with('\n'));
        }
    }

    #[test]
    fn artifact_name_joins_parsed_names() {
        let mut compiler = Compiler::new();
        compiler.parse_domain("(define (domain blocks))").expect("domain");
        compiler
            .parse_problem("(define (problem tower) (:domain blocks))")
            .expect("problem");
        assert_eq!(compiler.artifact_name(), "blocks_tower.txt");
    }

    #[test]
    fn header_and_final_separator_frame_the_artifact() {
        let artifact = render("(define (domain d))", &minimal_problem(""));
        assert!(artifact.starts_with(HEADER));
        assert!(artifact.ends_with(&format!("\n{SEPARATOR}")));
        assert!(!artifact.ends_with("\n\n"), "no blank lines after the final separator");
    }

    #[test]
    fn sections_appear_in_fixed_order() {
        let artifact = render("(define (domain d))", &minimal_problem(""));
        let order = [
            FLUENTS_BANNER,
            NAMES_BANNER,
            SPECIFICATIONS_BANNER,
            INITIAL_FLUENTS_BANNER,
            BELIEFS_BANNER,
            GOALS_BANNER,
        ];
        let mut last = 0;
        for banner in order {
            let at = artifact[last..].find(banner).expect("banner present") + last;
            assert!(at >= last);
            last = at + banner.len();
        }
    }

    #[test]
    fn fluent_list_sorts_and_wraps_after_ten() {
        let artifact = render(
            "(define (domain d) (:predicates (p ?x - item)))",
            &minimal_problem("(:objects i01 i02 i03 i04 i05 i06 i07 i08 i09 i10 i11 i12 - item)"),
        );
        assert!(artifact.contains(
            "fluent: p_i01, p_i02, p_i03, p_i04, p_i05, p_i06, p_i07, p_i08, p_i09, p_i10;\nfluent p_i11, p_i12;\n\n"
        ));
    }

    #[test]
    fn empty_fluent_universe_renders_a_bare_list() {
        let artifact = render("(define (domain d))", &minimal_problem(""));
        assert!(artifact.contains("fluent: ;\n\n"));
        assert!(artifact.contains("action: ;\n\n"));
    }

    #[test]
    fn action_names_keep_generation_order() {
        let artifact = render(
            "(define (domain d) (:action move :parameters (?b - block)))",
            &minimal_problem("(:objects b2 b1 - block)"),
        );
        assert!(artifact.contains("action: move_b2, move_b1;\n\n"));
    }

    #[test]
    fn executable_line_is_terminated_without_preconditions() {
        let artifact = render(
            "(define (domain d) (:action wave))",
            &minimal_problem(""),
        );
        assert!(artifact.contains("%%%Action wave\n\nexecutable wave;\n\n%%%\n\n"));
    }

    #[test]
    fn executable_renders_positive_then_negated_preconditions() {
        let artifact = render(
            "(define (domain d) (:action open :precondition (and (has_key) (not (locked)))))",
            &minimal_problem(""),
        );
        assert!(artifact.contains("executable open if has_key, not(locked);\n"));
    }

    #[test]
    fn effect_verbs_follow_the_act_type() {
        let domain = "(define (domain d)
            (:action look :act_type sensing :effect (seen))
            (:action tell :act_type announcement :effect (told))
            (:action nudge :effect (moved)))";
        let artifact = render(domain, &minimal_problem(""));
        assert!(artifact.contains("look determines seen;\n"));
        assert!(artifact.contains("tell announces told;\n"));
        assert!(artifact.contains("nudge causes moved;\n"));
    }

    #[test]
    fn del_effects_wrap_the_fluent_in_not() {
        let artifact = render(
            "(define (domain d) (:action shut :effect (not (opened))))",
            &minimal_problem(""),
        );
        assert!(artifact.contains("shut causes not(opened);\n"));
    }

    #[test]
    fn guarded_effect_appends_the_if_clause() {
        let artifact = render(
            "(define (domain d)
               (:action open
                 :effect (when (and (has_key) (not (jammed))) (opened))))",
            &minimal_problem(""),
        );
        assert!(artifact.contains("open causes opened if has_key, !jammed;\n"));
    }

    #[test]
    fn quantified_observers_expand_over_registered_agents() {
        let artifact = render(
            "(define (domain d) (:action shout :observers (forall (?ag - agent) (watching ?ag))))",
            &minimal_problem("(:agents a1 a2)"),
        );
        assert!(artifact.contains("a1 observes shout;\na2 observes shout;\n"));
    }

    #[test]
    fn quantified_observers_without_agents_expand_to_nothing() {
        let artifact = render(
            "(define (domain d) (:action shout :observers (forall (?ag - agent) (watching ?ag))))",
            &minimal_problem(""),
        );
        assert!(!artifact.contains("observes"));
    }

    #[test]
    fn quantified_observer_guards_bind_the_agent() {
        let artifact = render(
            "(define (domain d)
               (:action shout
                 :observers (forall (?ag - agent) (when (awake ?ag) (watching ?ag)))))",
            &minimal_problem("(:agents a1 a2)"),
        );
        assert!(artifact.contains("a1 observes shout if awake_a1;\n"));
        assert!(artifact.contains("a2 observes shout if awake_a2;\n"));
    }

    #[test]
    fn concrete_observer_entries_use_their_tokens_as_subjects() {
        let artifact = render(
            "(define (domain d) (:action wink :observers (a1) :p_observers (a2)))",
            &minimal_problem("(:agents a1 a2)"),
        );
        assert!(artifact.contains("a1 observes wink;\n"));
        assert!(artifact.contains("a2 aware_of wink;\n"));
    }

    #[test]
    fn true_fluents_dedup_in_declaration_order() {
        let artifact = render(
            "(define (domain d))",
            &minimal_problem("(:init (b) (a) (b))"),
        );
        assert!(artifact.contains("%%%True fluents\ninitially b, a;\n"));
    }

    #[test]
    fn false_fluents_are_the_sorted_complement_of_the_truths() {
        let artifact = render(
            "(define (domain d) (:predicates (p ?x - item)))",
            &minimal_problem("(:objects i1 i2 i3 - item) (:init (p i2))"),
        );
        assert!(artifact.contains("%%%False fluents\ninitially !p_i1, !p_i3;\n"));
    }

    #[test]
    fn empty_truth_bodies_omit_the_statement() {
        let artifact = render("(define (domain d))", &minimal_problem(""));
        assert!(artifact.contains("%%%True fluents\n%%%False fluents\n\n"));
    }

    #[test]
    fn empty_sections_keep_list_labels_but_omit_initially_statements() {
        let artifact = render("(define (domain d))", &minimal_problem(""));
        assert!(artifact.contains("fluent: ;\n\n"));
        assert!(artifact.contains("action: ;\n\n"));
        assert!(artifact.contains("%%%True fluents\n%%%False fluents\n\n"));
        assert!(!artifact.contains("initially"));
    }

    #[test]
    fn beliefs_emit_one_statement_per_distinct_entry() {
        let artifact = render(
            "(define (domain d))",
            &minimal_problem(
                "(:init ([a1](at l1)) ([a1 a2](know_p)) ([a1](at l1)) (plain))",
            ),
        );
        assert!(artifact.contains("initially B(a1,at_l1);\ninitially C([a1,a2],know_p);\n"));
        let occurrences = artifact.matches("initially B(a1,at_l1);").count();
        assert_eq!(occurrences, 1);
    }

    #[test]
    fn goals_render_bare_canonicals_in_declared_order() {
        let artifact = render(
            "(define (domain d))",
            &minimal_problem("(:goal (and (at l2) (not (opened)) ([a1](at l2))))"),
        );
        assert!(artifact.contains("goal at_l2;\ngoal B(a1,at_l2);\ngoal opened;\n"));
    }

    #[test]
    fn no_duplicates_prunes_predicate_expansion() {
        let artifact = render(
            "(define (domain d)
               (:requirements :strips :no-duplicates)
               (:predicates (on ?x ?y - block)))",
            &minimal_problem("(:objects b1 b2 - block)"),
        );
        assert!(artifact.contains("fluent: on_b1_b2, on_b2_b1;\n"));
        assert!(!artifact.contains("on_b1_b1"));
    }

    #[test]
    fn universe_merges_predicates_actions_and_declared_literals() {
        let artifact = render(
            "(define (domain d)
               (:predicates (at ?l - room))
               (:action enter
                 :parameters (?l - room)
                 :precondition (not (at ?l))
                 :effect (at ?l)))",
            &minimal_problem("(:objects r1 - room) (:init (dusty)) (:goal (shiny))"),
        );
        assert!(artifact.contains("fluent: at_r1, dusty, shiny;\n"));
    }
}
