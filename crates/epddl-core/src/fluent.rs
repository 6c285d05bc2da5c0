// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Literal terms and canonical fluent rendering.
//!
//! A [`Literal`] is the unit everything downstream trades in: an ordered
//! sequence of terms where any leading [`EpistemicOp`]s scope the rest.
//! Canonicalization turns a ground literal into the flat fluent string the
//! mAp artifact uses (`on_a_b`, `B(a1,at_l1)`, `C([a1,a2],know_p)`).

use crate::error::Error;
use crate::token::Node;

/// Which epistemic operator a bracket group produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpistemicKind {
    /// Single-agent belief, rendered `B(agent,…)`.
    Belief,
    /// Multi-agent common knowledge, rendered `C([a1,a2,…],…)`.
    Common,
}

/// An epistemic scope operator: the typed form of a source bracket group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpistemicOp {
    kind: EpistemicKind,
    agents: Vec<String>,
}

impl EpistemicOp {
    /// Builds an operator from the agents listed in a bracket group. One
    /// agent means belief, several mean common knowledge.
    pub fn new(agents: Vec<String>) -> Self {
        let kind = if agents.len() > 1 {
            EpistemicKind::Common
        } else {
            EpistemicKind::Belief
        };
        Self { kind, agents }
    }

    /// The operator kind.
    #[must_use]
    pub fn kind(&self) -> EpistemicKind {
        self.kind
    }

    /// The agents the operator ranges over, in source order.
    #[must_use]
    pub fn agents(&self) -> &[String] {
        &self.agents
    }

    /// Canonical opening text for this scope. The matching `)` is appended
    /// by [`Literal::canonical`] once all terms are rendered.
    fn prefix(&self) -> String {
        match self.kind {
            EpistemicKind::Belief => format!("B({},", self.agents.join(",")),
            EpistemicKind::Common => format!("C([{}],", self.agents.join(",")),
        }
    }
}

/// One element of a literal's token sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    /// A plain symbol: predicate name, object, `?variable`, or a
    /// `!`-negated head produced by folding a scoped `not`.
    Sym(String),
    /// An epistemic scope operator.
    Op(EpistemicOp),
    /// A `forall`-bound agent variable awaiting late binding; replaced with
    /// a concrete agent name during emission.
    Quantified(String),
}

/// An ordered token sequence: the unit of preconditions, effects, initial
/// state, goals and observer entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
    terms: Vec<Term>,
}

impl Literal {
    /// Builds a literal from raw symbol tokens. Used by grounding when a
    /// predicate signature is instantiated.
    #[must_use]
    pub fn from_symbols<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            terms: symbols.into_iter().map(|s| Term::Sym(s.into())).collect(),
        }
    }

    /// Flattens a token-tree node into a literal.
    ///
    /// Atoms become symbols and markers become operators. A nested list is
    /// spliced in place, which accepts both the merged form
    /// (`[a1]at l1` — marker followed inline by tokens) and the spaced form
    /// (`[a1] (at l1)` — marker followed by one sublist). A `not` heading a
    /// nested list folds into the literal by prefixing the first symbol of
    /// its operand with `!`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedClause`] when a folded `not` has anything
    /// but exactly one operand, when its operand is itself a `not`, or when
    /// its operand opens with another epistemic scope.
    pub fn from_node(node: &Node) -> Result<Self, Error> {
        let mut terms = Vec::new();
        flatten(node, &mut terms)?;
        Ok(Self { terms })
    }

    /// The token sequence.
    #[must_use]
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// True when any term is an epistemic operator. Epistemic literals never
    /// join the fluent universe.
    #[must_use]
    pub fn is_epistemic(&self) -> bool {
        self.terms.iter().any(|t| matches!(t, Term::Op(_)))
    }

    /// True when the literal still carries quantified placeholders and so
    /// cannot be canonicalized into a concrete fluent yet.
    #[must_use]
    pub fn has_quantified(&self) -> bool {
        self.terms.iter().any(|t| matches!(t, Term::Quantified(_)))
    }

    /// Rewrites every top-level occurrence of the parameter variable `var`
    /// to the object `value`. Quantified placeholders are never touched.
    pub fn substitute(&mut self, var: &str, value: &str) {
        for term in &mut self.terms {
            if let Term::Sym(s) = term {
                if s == var {
                    *s = value.to_owned();
                }
            }
        }
    }

    /// Turns every occurrence of `var` into a quantified placeholder.
    /// Returns whether at least one occurrence was found.
    pub fn mark_quantified(&mut self, var: &str) -> bool {
        let mut found = false;
        for term in &mut self.terms {
            if let Term::Sym(s) = term {
                if s == var {
                    let name = std::mem::take(s);
                    *term = Term::Quantified(name);
                    found = true;
                }
            }
        }
        found
    }

    /// Copy of this literal with every quantified placeholder bound to
    /// `agent`. All placeholders in one literal take the same agent.
    #[must_use]
    pub fn bind_agent(&self, agent: &str) -> Self {
        let terms = self
            .terms
            .iter()
            .map(|t| match t {
                Term::Quantified(_) => Term::Sym(agent.to_owned()),
                other => other.clone(),
            })
            .collect();
        Self { terms }
    }

    /// Canonical fluent string: symbols joined with `_`, each epistemic
    /// operator opening a `B(a,`/`C([a,b],` scope closed after the final
    /// symbol. An unbound placeholder renders as its variable text.
    #[must_use]
    pub fn canonical(&self) -> String {
        let mut out = String::new();
        let mut depth = 0usize;
        let last = self.terms.len().saturating_sub(1);
        for (i, term) in self.terms.iter().enumerate() {
            match term {
                Term::Op(op) => {
                    out.push_str(&op.prefix());
                    depth += 1;
                }
                Term::Sym(s) | Term::Quantified(s) => {
                    out.push_str(s);
                    if i != last {
                        out.push('_');
                    }
                }
            }
        }
        for _ in 0..depth {
            out.push(')');
        }
        out
    }
}

/// Splices `node` into `terms`, folding scoped negation.
fn flatten(node: &Node, terms: &mut Vec<Term>) -> Result<(), Error> {
    match node {
        Node::Atom(s) => terms.push(Term::Sym(s.clone())),
        Node::Marker(op) => terms.push(Term::Op(op.clone())),
        Node::List(items) => {
            if let Some(Node::Atom(head)) = items.first() {
                if head == "not" {
                    return fold_negated(&items[1..], terms);
                }
            }
            for item in items {
                flatten(item, terms)?;
            }
        }
    }
    Ok(())
}

/// Folds a scope-nested `(not X)` by `!`-prefixing the first symbol of `X`.
fn fold_negated(operands: &[Node], terms: &mut Vec<Term>) -> Result<(), Error> {
    if operands.len() != 1 {
        return Err(Error::malformed(
            "expected exactly one literal after `not` inside an epistemic scope",
        ));
    }
    if let Node::List(inner) = &operands[0] {
        if matches!(inner.first(), Some(Node::Atom(head)) if head == "not") {
            return Err(Error::malformed(
                "`not` nested inside a scoped `not` is not supported",
            ));
        }
    }
    let start = terms.len();
    flatten(&operands[0], terms)?;
    match terms.get_mut(start) {
        Some(Term::Sym(s)) => {
            s.insert(0, '!');
            Ok(())
        }
        _ => Err(Error::malformed(
            "cannot negate an epistemic formula inside another epistemic scope",
        )),
    }
}
