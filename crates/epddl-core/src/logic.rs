// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Logical-expression compiler.
//!
//! Two entry points, mirroring the two classes of clause body:
//!
//! * **split** — preconditions, `:init` and `:goal` are plain conjunctions;
//!   they unwrap an implicit or explicit `and` and route each conjunct to a
//!   positive or negative literal list.
//! * **compile** — `:effect`, `:observers` and `:p_observers` additionally
//!   admit `when` (conditional entries) and, for observers only, `forall`
//!   (agent-quantified entries); they produce [`GuardedLiteral`] lists.
//!
//! Combinator misuse is rejected here rather than surfacing as mangled
//! fluent text later.

use crate::error::Error;
use crate::fluent::Literal;
use crate::token::Node;

/// Conjunctive condition attached to an effect or observer entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Guard {
    /// Fluents that must hold for the entry to apply.
    pub pos: Vec<Literal>,
    /// Fluents that must not hold for the entry to apply.
    pub neg: Vec<Literal>,
}

impl Guard {
    /// True when the entry is unconditional.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pos.is_empty() && self.neg.is_empty()
    }

    /// Copy of this guard with every quantified placeholder bound to
    /// `agent`.
    #[must_use]
    pub fn bind_agent(&self, agent: &str) -> Self {
        Self {
            pos: self.pos.iter().map(|l| l.bind_agent(agent)).collect(),
            neg: self.neg.iter().map(|l| l.bind_agent(agent)).collect(),
        }
    }

    /// True when any guard literal still carries a quantified placeholder.
    #[must_use]
    pub fn has_quantified(&self) -> bool {
        self.pos
            .iter()
            .chain(self.neg.iter())
            .any(Literal::has_quantified)
    }

    /// Marks every occurrence of `var` across the guard literals as a
    /// quantified placeholder.
    pub(crate) fn mark_quantified(&mut self, var: &str) {
        for literal in self.pos.iter_mut().chain(self.neg.iter_mut()) {
            literal.mark_quantified(var);
        }
    }

    /// Rewrites every occurrence of the parameter variable `var` to the
    /// object `value` across the guard literals.
    pub(crate) fn substitute(&mut self, var: &str, value: &str) {
        for literal in self.pos.iter_mut().chain(self.neg.iter_mut()) {
            literal.substitute(var, value);
        }
    }
}

/// A literal paired with the guard under which it applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardedLiteral {
    /// The effect fluent, or the observer subject tokens.
    pub literal: Literal,
    /// Condition for the entry; empty means unconditional.
    pub guard: Guard,
}

impl GuardedLiteral {
    /// Entry with an empty guard.
    pub(crate) fn unconditional(literal: Literal) -> Self {
        Self {
            literal,
            guard: Guard::default(),
        }
    }

    /// Rewrites every occurrence of `var` to `value` in the literal and in
    /// the guard.
    pub(crate) fn substitute(&mut self, var: &str, value: &str) {
        self.literal.substitute(var, value);
        self.guard.substitute(var, value);
    }
}

/// Which clause the compile walk is serving. `forall` is legal only for
/// observer lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ClauseContext {
    /// `:effect` bodies; positives are add effects, negatives del effects.
    Effect,
    /// `:observers` / `:p_observers` bodies; negatives are discarded by the
    /// caller.
    Observer,
}

/// Splits a single conjunctive expression into positive and negative
/// literal lists. Used for `:precondition`.
///
/// # Errors
///
/// [`Error::Syntax`] when the body is not a parenthesized expression or a
/// `not` has the wrong arity; literal-construction errors pass through.
pub(crate) fn split_expression(
    node: &Node,
    what: &str,
    positive: &mut Vec<Literal>,
    negative: &mut Vec<Literal>,
) -> Result<(), Error> {
    if node.as_list().is_none() {
        return Err(Error::syntax(format!("cannot read {what}")));
    }
    route_conjunct(node, what, positive, negative)
}

/// Splits a clause body already known to be an implicit conjunction (the
/// `:init` and `:goal` remainders), routing each item.
///
/// # Errors
///
/// Same conditions as [`split_expression`].
pub(crate) fn split_body(
    items: &[Node],
    what: &str,
    positive: &mut Vec<Literal>,
    negative: &mut Vec<Literal>,
) -> Result<(), Error> {
    for item in items {
        route_conjunct(item, what, positive, negative)?;
    }
    Ok(())
}

/// Routes one conjunct: `and` unwraps recursively, `not` (arity one)
/// appends its operand to the negatives, anything else is a positive
/// literal.
fn route_conjunct(
    node: &Node,
    what: &str,
    positive: &mut Vec<Literal>,
    negative: &mut Vec<Literal>,
) -> Result<(), Error> {
    if let Node::List(items) = node {
        match items.first().and_then(Node::as_atom) {
            Some("and") => {
                for item in &items[1..] {
                    route_conjunct(item, what, positive, negative)?;
                }
                return Ok(());
            }
            Some("not") => {
                if items.len() != 2 {
                    return Err(Error::syntax(format!("unexpected `not` in {what}")));
                }
                negative.push(Literal::from_node(&items[1])?);
                return Ok(());
            }
            _ => {}
        }
        if items.is_empty() {
            return Err(Error::syntax(format!("empty expression in {what}")));
        }
    }
    positive.push(Literal::from_node(node)?);
    Ok(())
}

/// Compiles an `:effect` or observer body into guarded-literal lists.
///
/// # Errors
///
/// [`Error::Syntax`] when the body is not a parenthesized expression;
/// [`Error::MalformedClause`] for combinator misuse (`when` arity or
/// nesting, `forall` outside observers or with a malformed binder or rule,
/// `not` arity).
pub(crate) fn compile_expression(
    node: &Node,
    context: ClauseContext,
    what: &str,
    positive: &mut Vec<GuardedLiteral>,
    negative: &mut Vec<GuardedLiteral>,
) -> Result<(), Error> {
    compile_with_guard(node, context, &Guard::default(), false, what, positive, negative)
}

/// The recursive compile walk. `guard` is the condition inherited from an
/// enclosing `when`; `in_rule` is set while walking a `when` rule, where
/// further combinators are illegal.
fn compile_with_guard(
    node: &Node,
    context: ClauseContext,
    guard: &Guard,
    in_rule: bool,
    what: &str,
    positive: &mut Vec<GuardedLiteral>,
    negative: &mut Vec<GuardedLiteral>,
) -> Result<(), Error> {
    let Some(items) = node.as_list() else {
        return Err(Error::syntax(format!("cannot read {what}")));
    };
    match items.first().and_then(Node::as_atom) {
        Some("and") => {
            for item in &items[1..] {
                compile_with_guard(item, context, guard, in_rule, what, positive, negative)?;
            }
            Ok(())
        }
        Some("when") => {
            if in_rule {
                return Err(Error::malformed(format!(
                    "`when` cannot nest inside another `when` rule in {what}"
                )));
            }
            if items.len() != 3 {
                return Err(Error::malformed(format!(
                    "`when` takes exactly a condition and a rule in {what}"
                )));
            }
            let inner = compile_condition(&items[1], what)?;
            compile_with_guard(&items[2], context, &inner, true, what, positive, negative)
        }
        Some("forall") => {
            if in_rule {
                return Err(Error::malformed(format!(
                    "`forall` cannot nest inside a `when` rule in {what}"
                )));
            }
            if context != ClauseContext::Observer {
                return Err(Error::malformed(format!(
                    "`forall` is only supported for observer lists, not in {what}"
                )));
            }
            compile_forall(items, what, positive, negative)
        }
        Some("not") => {
            if items.len() != 2 {
                return Err(Error::malformed(format!("unexpected `not` in {what}")));
            }
            negative.push(GuardedLiteral {
                literal: Literal::from_node(&items[1])?,
                guard: guard.clone(),
            });
            Ok(())
        }
        _ => {
            if items.is_empty() {
                return Err(Error::syntax(format!("empty expression in {what}")));
            }
            positive.push(GuardedLiteral {
                literal: Literal::from_node(node)?,
                guard: guard.clone(),
            });
            Ok(())
        }
    }
}

/// Compiles a `when` condition into a [`Guard`]. Conditions admit bare
/// literals, `not` literals and `and`s of those; `when` and `forall` are
/// illegal at any depth.
fn compile_condition(node: &Node, what: &str) -> Result<Guard, Error> {
    let mut guard = Guard::default();
    collect_condition(node, what, &mut guard)?;
    Ok(guard)
}

fn collect_condition(node: &Node, what: &str, guard: &mut Guard) -> Result<(), Error> {
    if let Node::List(items) = node {
        match items.first().and_then(Node::as_atom) {
            Some("when") | Some("forall") => {
                return Err(Error::malformed(format!(
                    "only `and` and `not` may appear inside a `when` condition in {what}"
                )));
            }
            Some("and") => {
                for item in &items[1..] {
                    collect_condition(item, what, guard)?;
                }
                return Ok(());
            }
            Some("not") => {
                if items.len() != 2 {
                    return Err(Error::malformed(format!(
                        "unexpected `not` in a `when` condition in {what}"
                    )));
                }
                guard.neg.push(Literal::from_node(&items[1])?);
                return Ok(());
            }
            _ => {}
        }
    }
    guard.pos.push(Literal::from_node(node)?);
    Ok(())
}

/// Compiles `(forall (binder…) rule)` for an observer list.
///
/// Bound variables are the binder atoms containing `?`; other binder tokens
/// are ignored. Two rule shapes are accepted: a plain literal mentioning at
/// least one bound variable, or a `when` whose rule is a literal or a `not`
/// literal. Bound-variable occurrences become quantified placeholders; the
/// expansion over concrete agents happens at emission.
fn compile_forall(
    items: &[Node],
    what: &str,
    positive: &mut Vec<GuardedLiteral>,
    negative: &mut Vec<GuardedLiteral>,
) -> Result<(), Error> {
    if items.len() != 3 {
        return Err(Error::malformed(format!(
            "`forall` takes exactly a binder list and a rule in {what}"
        )));
    }
    let Some(binder) = items[1].as_list() else {
        return Err(Error::malformed(format!(
            "`forall` binder must be a parenthesized variable list in {what}"
        )));
    };
    if matches!(
        binder.first().and_then(Node::as_atom),
        Some("when" | "forall" | "and" | "not")
    ) {
        return Err(Error::malformed(format!(
            "`forall` binder cannot start with a combinator in {what}"
        )));
    }
    let vars: Vec<&str> = binder
        .iter()
        .filter_map(Node::as_atom)
        .filter(|word| word.contains('?'))
        .collect();

    let rule = &items[2];
    if let Some(rule_items) = rule.as_list() {
        if rule_items.first().and_then(Node::as_atom) == Some("when") {
            if rule_items.len() != 3 {
                return Err(Error::malformed(format!(
                    "`when` takes exactly a condition and a rule in {what}"
                )));
            }
            let mut guard = compile_condition(&rule_items[1], what)?;
            let (mut literal, negated) = forall_when_rule(&rule_items[2], what)?;
            for var in &vars {
                literal.mark_quantified(var);
                guard.mark_quantified(var);
            }
            let entry = GuardedLiteral { literal, guard };
            if negated {
                negative.push(entry);
            } else {
                positive.push(entry);
            }
            return Ok(());
        }
        if matches!(
            rule_items.first().and_then(Node::as_atom),
            Some("and" | "forall" | "not")
        ) {
            return Err(Error::malformed(format!(
                "too many nested combinators in an observer `forall` in {what}"
            )));
        }
    }
    let mut literal = Literal::from_node(rule)?;
    let mut any_bound = false;
    for var in &vars {
        any_bound |= literal.mark_quantified(var);
    }
    if !any_bound {
        return Err(Error::malformed(format!(
            "`forall` rule never mentions a bound variable in {what}"
        )));
    }
    positive.push(GuardedLiteral::unconditional(literal));
    Ok(())
}

/// The rule of a `when` nested under an observer `forall`: a literal or a
/// `not` literal, nothing deeper.
fn forall_when_rule(node: &Node, what: &str) -> Result<(Literal, bool), Error> {
    if let Some(items) = node.as_list() {
        match items.first().and_then(Node::as_atom) {
            Some("not") => {
                if items.len() != 2 {
                    return Err(Error::malformed(format!("unexpected `not` in {what}")));
                }
                return Ok((Literal::from_node(&items[1])?, true));
            }
            Some("and" | "when" | "forall") => {
                return Err(Error::malformed(format!(
                    "too many nested combinators in an observer `forall` in {what}"
                )));
            }
            _ => {}
        }
    }
    Ok((Literal::from_node(node)?, false))
}
