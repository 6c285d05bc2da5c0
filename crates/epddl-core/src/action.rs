// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Action templates and the grounding engine.
//!
//! A domain file yields schematic [`ActionTemplate`]s; grounding
//! instantiates each one over every type-compatible object assignment and
//! collects the concrete fluents touched along the way into the fluent
//! universe. [`GroundAction`]s only live for the emission pass.

use std::collections::BTreeSet;

use crate::error::Error;
use crate::fluent::Literal;
use crate::hierarchy::{resolve_type, NameTable};
use crate::logic::GuardedLiteral;
use crate::token::Node;

/// The three epistemic action classes, selecting the mAp statement verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActType {
    /// World-changing action, emitted with `causes`.
    #[default]
    Ontic,
    /// Public announcement, emitted with `announces`.
    Announcement,
    /// Sensing action, emitted with `determines`.
    Sensing,
}

impl ActType {
    /// Parses an `:act_type` value for `action`.
    pub(crate) fn parse(action: &str, word: &str) -> Result<Self, Error> {
        match word {
            "ontic" => Ok(Self::Ontic),
            "announcement" => Ok(Self::Announcement),
            "sensing" => Ok(Self::Sensing),
            other => Err(Error::ActionType {
                action: action.to_owned(),
                found: other.to_owned(),
            }),
        }
    }

    /// The mAp effect verb for this class.
    #[must_use]
    pub fn verb(self) -> &'static str {
        match self {
            Self::Ontic => "causes",
            Self::Announcement => "announces",
            Self::Sensing => "determines",
        }
    }
}

/// A schematic action as parsed from the domain file.
#[derive(Debug, Clone, Default)]
pub struct ActionTemplate {
    /// Action name as declared.
    pub name: String,
    /// Statement class; defaults to ontic when `:act_type` is omitted.
    pub act_type: ActType,
    /// Ordered `(variable, type)` parameter pairs.
    pub parameters: Vec<(String, String)>,
    /// Preconditions that must hold.
    pub positive_preconditions: Vec<Literal>,
    /// Preconditions that must not hold.
    pub negative_preconditions: Vec<Literal>,
    /// Fluents the action makes true.
    pub add_effects: Vec<GuardedLiteral>,
    /// Fluents the action makes false.
    pub del_effects: Vec<GuardedLiteral>,
    /// Agents observing the action fully.
    pub observers: Vec<GuardedLiteral>,
    /// Agents observing the action partially.
    pub p_observers: Vec<GuardedLiteral>,
    /// Unrecognized action clauses, kept verbatim for dialect extensions.
    pub extensions: Vec<(String, Option<Node>)>,
}

/// One concrete instantiation of a template under a single
/// variable-to-object assignment.
#[derive(Debug, Clone)]
pub struct GroundAction {
    /// Template name suffixed with `_<object>` per bound parameter.
    pub name: String,
    /// Statement class inherited from the template.
    pub act_type: ActType,
    /// Instantiated positive preconditions.
    pub positive_preconditions: Vec<Literal>,
    /// Instantiated negative preconditions.
    pub negative_preconditions: Vec<Literal>,
    /// Instantiated add effects.
    pub add_effects: Vec<GuardedLiteral>,
    /// Instantiated del effects.
    pub del_effects: Vec<GuardedLiteral>,
    /// Instantiated full-observer entries.
    pub observers: Vec<GuardedLiteral>,
    /// Instantiated partial-observer entries.
    pub p_observers: Vec<GuardedLiteral>,
}

impl ActionTemplate {
    /// Instantiates the template over every type-compatible assignment.
    ///
    /// Parameter domains resolve through the hierarchy in declaration
    /// order; enumeration is the cartesian product with the leftmost
    /// parameter slowest. Under `:no-duplicates`, assignments binding the
    /// same object to two parameters are skipped. Every concrete
    /// non-epistemic literal in the instantiated preconditions, effect
    /// literals and effect guards joins `universe` in canonical form.
    ///
    /// # Errors
    ///
    /// [`Error::TypeResolution`] when a parameter type cannot be resolved.
    pub fn ground(
        &self,
        types: &NameTable,
        objects: &NameTable,
        no_duplicates: bool,
        universe: &mut BTreeSet<String>,
    ) -> Result<Vec<GroundAction>, Error> {
        let mut domains = Vec::with_capacity(self.parameters.len());
        for (_, ty) in &self.parameters {
            domains.push(resolve_type(ty, types, objects)?);
        }
        let mut grounded = Vec::new();
        for assignment in Assignments::new(&domains) {
            if no_duplicates && !pairwise_distinct(&assignment) {
                continue;
            }
            grounded.push(self.instantiate(&assignment, universe));
        }
        Ok(grounded)
    }

    fn instantiate(&self, assignment: &[&str], universe: &mut BTreeSet<String>) -> GroundAction {
        let mut name = self.name.clone();
        for object in assignment {
            name.push('_');
            name.push_str(object);
        }
        let mut act = GroundAction {
            name,
            act_type: self.act_type,
            positive_preconditions: self.positive_preconditions.clone(),
            negative_preconditions: self.negative_preconditions.clone(),
            add_effects: self.add_effects.clone(),
            del_effects: self.del_effects.clone(),
            observers: self.observers.clone(),
            p_observers: self.p_observers.clone(),
        };
        for ((var, _), object) in self.parameters.iter().zip(assignment) {
            act.substitute(var, object);
        }
        act.collect_fluents(universe);
        act
    }
}

impl GroundAction {
    /// Rewrites every occurrence of the parameter variable `var` to the
    /// object `value` across all literal and guard lists.
    fn substitute(&mut self, var: &str, value: &str) {
        for literal in self
            .positive_preconditions
            .iter_mut()
            .chain(self.negative_preconditions.iter_mut())
        {
            literal.substitute(var, value);
        }
        for entry in self
            .add_effects
            .iter_mut()
            .chain(self.del_effects.iter_mut())
            .chain(self.observers.iter_mut())
            .chain(self.p_observers.iter_mut())
        {
            entry.substitute(var, value);
        }
    }

    /// Adds the concrete non-epistemic fluents this action touches to the
    /// universe. Observer entries name agents, not fluents, and stay out.
    fn collect_fluents(&self, universe: &mut BTreeSet<String>) {
        for literal in self
            .positive_preconditions
            .iter()
            .chain(self.negative_preconditions.iter())
        {
            add_concrete(literal, universe);
        }
        for entry in self.add_effects.iter().chain(self.del_effects.iter()) {
            add_concrete(&entry.literal, universe);
            for guard_literal in entry.guard.pos.iter().chain(entry.guard.neg.iter()) {
                add_concrete(guard_literal, universe);
            }
        }
    }
}

fn add_concrete(literal: &Literal, universe: &mut BTreeSet<String>) {
    if !literal.is_epistemic() && !literal.has_quantified() {
        universe.insert(literal.canonical());
    }
}

pub(crate) fn pairwise_distinct(assignment: &[&str]) -> bool {
    assignment
        .iter()
        .enumerate()
        .all(|(i, object)| !assignment[..i].contains(object))
}

/// Odometer over the parameter domains: the rightmost position advances
/// fastest, so assignments come out in lexicographic parameter order. Zero
/// parameters yield exactly one empty assignment; any empty domain yields
/// none.
pub(crate) struct Assignments<'a> {
    domains: &'a [Vec<String>],
    indices: Vec<usize>,
    done: bool,
}

impl<'a> Assignments<'a> {
    pub(crate) fn new(domains: &'a [Vec<String>]) -> Self {
        Self {
            domains,
            indices: vec![0; domains.len()],
            done: domains.iter().any(Vec::is_empty),
        }
    }
}

impl<'a> Iterator for Assignments<'a> {
    type Item = Vec<&'a str>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let current = self
            .domains
            .iter()
            .zip(&self.indices)
            .map(|(domain, &i)| domain[i].as_str())
            .collect();
        let mut pos = self.indices.len();
        loop {
            if pos == 0 {
                self.done = true;
                break;
            }
            pos -= 1;
            self.indices[pos] += 1;
            if self.indices[pos] < self.domains[pos].len() {
                break;
            }
            self.indices[pos] = 0;
        }
        Some(current)
    }
}
